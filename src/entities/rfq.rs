use chrono::{DateTime, Utc};
use oso::PolarClass;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Bid;
use crate::error::{invalid_input_error, invalid_invocation_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfq {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub title: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Open,
    UnderReview,
    BidAccepted {
        #[serde(rename = "bidId")]
        bid_id: Uuid,
    },
    Closed,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Open => "open".into(),
            Self::UnderReview => "under_review".into(),
            Self::BidAccepted { bid_id: _ } => "bid_accepted".into(),
            Self::Closed => "closed".into(),
        }
    }
}

/// Outcome of a customer picking the winning bid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acceptance {
    pub rfq: Rfq,
    pub bid: Bid,
    pub referral_fee: Decimal,
}

impl Rfq {
    pub fn new(customer_id: Uuid, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            title,
            status: Status::Open,
            created_at: Utc::now(),
        }
    }

    pub fn accepts_bids(&self) -> bool {
        match self.status {
            Status::Open => true,
            _ => false,
        }
    }

    fn is_deciding(&self) -> bool {
        match self.status {
            Status::Open | Status::UnderReview => true,
            _ => false,
        }
    }

    #[tracing::instrument(skip(self), fields(rfq_id = %self.id))]
    pub fn begin_review(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::UnderReview;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    /// Accepts `bid_id` and rejects every other pending bid on this RFQ.
    ///
    /// Nothing is mutated unless every precondition holds, so a failed call
    /// leaves both the RFQ and the bids untouched.
    #[tracing::instrument(skip(self, bids), fields(rfq_id = %self.id))]
    pub fn accept_bid(&mut self, bid_id: Uuid, bids: &mut [Bid]) -> Result<(), Error> {
        if !self.is_deciding() {
            return Err(invalid_invocation_error());
        }

        if bids.iter().any(|bid| bid.rfq_id != self.id) {
            return Err(invalid_input_error());
        }

        if bids.iter().any(|bid| bid.is_accepted()) {
            tracing::warn!("rfq already has an accepted bid");
            return Err(invalid_invocation_error());
        }

        let winner = bids
            .iter()
            .position(|bid| bid.id == bid_id)
            .ok_or_else(|| invalid_input_error())?;

        if !bids[winner].is_pending() {
            return Err(invalid_invocation_error());
        }

        for (index, bid) in bids.iter_mut().enumerate() {
            if index == winner {
                bid.accept()?;
            } else if bid.is_pending() {
                bid.reject()?;
            }
        }

        self.status = Status::BidAccepted { bid_id };
        Ok(())
    }

    /// Closes the RFQ without a winner, rejecting every pending bid.
    #[tracing::instrument(skip(self, bids), fields(rfq_id = %self.id))]
    pub fn close(&mut self, bids: &mut [Bid]) -> Result<(), Error> {
        if !self.is_deciding() {
            return Err(invalid_invocation_error());
        }

        for bid in bids.iter_mut().filter(|bid| bid.is_pending()) {
            bid.reject()?;
        }

        self.status = Status::Closed;
        Ok(())
    }
}

impl PolarClass for Rfq {
    fn get_polar_class_builder() -> oso::ClassBuilder<Rfq> {
        oso::Class::builder()
            .name("Rfq")
            .add_attribute_getter("id", |recv: &Rfq| recv.id.clone())
            .add_attribute_getter("customer_id", |recv: &Rfq| recv.customer_id.clone())
            .add_attribute_getter("status", |recv: &Rfq| recv.status.name())
            .add_method("accepts_bids", Rfq::accepts_bids)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Rfq::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
fn rfq_with_bids(amounts: &[i64]) -> (Rfq, Vec<Bid>) {
    let rfq = Rfq::new(Uuid::new_v4(), "Front brakes grinding".into());
    let bids = amounts
        .iter()
        .map(|&amount| Bid::new(rfq.id, Uuid::new_v4(), Decimal::from(amount)))
        .collect();

    (rfq, bids)
}

#[test]
fn accepting_a_bid_rejects_its_siblings() {
    use crate::entities::BidStatus;

    let (mut rfq, mut bids) = rfq_with_bids(&[300, 250, 410]);
    let winner = bids[1].id;

    rfq.accept_bid(winner, &mut bids).unwrap();

    assert_eq!(rfq.status, Status::BidAccepted { bid_id: winner });
    assert_eq!(bids[0].status, BidStatus::Rejected);
    assert_eq!(bids[1].status, BidStatus::Accepted);
    assert_eq!(bids[2].status, BidStatus::Rejected);
    assert!(!rfq.accepts_bids());
}

#[test]
fn only_one_bid_can_win() {
    let (mut rfq, mut bids) = rfq_with_bids(&[300, 250]);
    let first = bids[0].id;
    let second = bids[1].id;

    rfq.accept_bid(first, &mut bids).unwrap();

    let before = bids.clone();
    assert!(rfq.accept_bid(second, &mut bids).is_err());
    assert_eq!(bids, before);
}

#[test]
fn failed_acceptance_leaves_state_untouched() {
    let (mut rfq, mut bids) = rfq_with_bids(&[300, 250]);
    bids[1].reject().unwrap();

    let before = bids.clone();
    let rejected = bids[1].id;

    assert!(rfq.accept_bid(rejected, &mut bids).is_err());
    assert!(rfq.accept_bid(Uuid::new_v4(), &mut bids).unwrap_err().is_invalid_input_error());
    assert_eq!(bids, before);
    assert_eq!(rfq.status, Status::Open);
}

#[test]
fn bids_from_another_rfq_are_refused() {
    let (mut rfq, mut bids) = rfq_with_bids(&[300]);
    bids.push(Bid::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::from(90)));
    let stranger = bids[1].id;

    assert!(rfq.accept_bid(stranger, &mut bids).unwrap_err().is_invalid_input_error());
}

#[test]
fn review_still_allows_acceptance() {
    let (mut rfq, mut bids) = rfq_with_bids(&[300, 250]);

    rfq.begin_review().unwrap();
    assert!(!rfq.accepts_bids());
    assert!(rfq.begin_review().is_err());

    let winner = bids[0].id;
    rfq.accept_bid(winner, &mut bids).unwrap();
}

#[test]
fn closing_rejects_pending_bids() {
    use crate::entities::BidStatus;

    let (mut rfq, mut bids) = rfq_with_bids(&[300, 250]);

    rfq.close(&mut bids).unwrap();

    assert_eq!(rfq.status, Status::Closed);
    assert!(bids.iter().all(|bid| bid.status == BidStatus::Rejected));
    assert!(rfq.close(&mut bids).is_err());

    let winner = bids[0].id;
    assert!(rfq.accept_bid(winner, &mut bids).is_err());
}

#[test]
fn status_is_tagged_on_the_wire() {
    let bid_id = Uuid::new_v4();
    let value = serde_json::to_value(Status::BidAccepted { bid_id }).unwrap();

    assert_eq!(
        value,
        serde_json::json!({ "name": "bid_accepted", "bidId": bid_id })
    );
}
