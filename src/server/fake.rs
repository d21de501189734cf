//! In-memory stand-in for the engine, used to drive handlers in tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::{BidAPI, PricingAPI, RfqAPI, API};
use crate::auth::User;
use crate::entities::{Acceptance, Bid, BidSubmission, DiagnosticPricing, PricingDraft, Rfq};
use crate::error::{invalid_input_error, unimplemented_error, Error};
use crate::pricing::{FeeSchedule, Payout, PricingErrors, PricingValidator};

use super::DynAPI;

pub struct FakeApi {
    rfq: Mutex<Rfq>,
    bids: Mutex<Vec<Bid>>,
    pricing: Mutex<Option<DiagnosticPricing>>,
    validator: PricingValidator,
    fees: FeeSchedule,
}

impl FakeApi {
    pub fn new(rfq: Rfq, bids: Vec<Bid>) -> Self {
        Self {
            rfq: Mutex::new(rfq),
            bids: Mutex::new(bids),
            pricing: Mutex::new(None),
            validator: PricingValidator::default(),
            fees: FeeSchedule::default(),
        }
    }

    pub fn into_dyn(self) -> DynAPI {
        Arc::new(self)
    }
}

#[async_trait]
impl PricingAPI for FakeApi {
    async fn find_pricing(
        &self,
        _user: User,
        mechanic_id: Uuid,
    ) -> Result<DiagnosticPricing, Error> {
        self.pricing
            .lock()
            .unwrap()
            .clone()
            .filter(|pricing| pricing.mechanic_id == mechanic_id)
            .ok_or_else(invalid_input_error)
    }

    async fn update_pricing(
        &self,
        _user: User,
        mechanic_id: Uuid,
        draft: PricingDraft,
    ) -> Result<DiagnosticPricing, Error> {
        let pricing = self.validator.accept(mechanic_id, &draft)?;
        *self.pricing.lock().unwrap() = Some(pricing.clone());

        Ok(pricing)
    }

    fn validate_pricing(&self, draft: &PricingDraft) -> PricingErrors {
        self.validator.validate(draft)
    }

    fn preview_payouts(&self, pricing: &DiagnosticPricing) -> Vec<Payout> {
        self.fees.payouts(pricing)
    }
}

#[async_trait]
impl RfqAPI for FakeApi {
    async fn create_rfq(&self, _user: User, _title: String) -> Result<Rfq, Error> {
        Err(unimplemented_error())
    }

    async fn find_rfq(&self, _user: User, id: Uuid) -> Result<Rfq, Error> {
        let rfq = self.rfq.lock().unwrap().clone();
        if rfq.id != id {
            return Err(invalid_input_error());
        }

        Ok(rfq)
    }

    async fn review_rfq(&self, _user: User, _id: Uuid) -> Result<Rfq, Error> {
        Err(unimplemented_error())
    }

    async fn close_rfq(&self, _user: User, _id: Uuid) -> Result<Rfq, Error> {
        Err(unimplemented_error())
    }
}

#[async_trait]
impl BidAPI for FakeApi {
    async fn submit_bid(
        &self,
        user: User,
        rfq_id: Uuid,
        submission: BidSubmission,
    ) -> Result<Bid, Error> {
        let bid = submission.into_bid(rfq_id, user.id)?;
        self.bids.lock().unwrap().push(bid.clone());

        Ok(bid)
    }

    async fn list_bids(&self, user: User, rfq_id: Uuid) -> Result<Vec<Bid>, Error> {
        self.find_rfq(user, rfq_id).await?;

        Ok(self.bids.lock().unwrap().clone())
    }

    async fn accept_bid(
        &self,
        _user: User,
        rfq_id: Uuid,
        bid_id: Uuid,
    ) -> Result<Acceptance, Error> {
        let mut rfq = self.rfq.lock().unwrap();
        if rfq.id != rfq_id {
            return Err(invalid_input_error());
        }

        let mut bids = self.bids.lock().unwrap();
        rfq.accept_bid(bid_id, &mut bids)?;

        let bid = bids
            .iter()
            .find(|bid| bid.id == bid_id)
            .cloned()
            .ok_or_else(invalid_input_error)?;

        Ok(Acceptance {
            rfq: rfq.clone(),
            referral_fee: self.fees.referral_fee(bid.amount),
            bid,
        })
    }
}

impl API for FakeApi {}
