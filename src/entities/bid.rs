use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_invocation_error, validation_error, Error};
use crate::pricing::{amount_from_f64, round_cents, MAX_AMOUNT};

const MAX_WARRANTY_MONTHS: i64 = 120;
const MAX_COMPLETION_DAYS: i64 = 365;
const MIN_DESCRIPTION_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "pending".into(),
            Self::Accepted => "accepted".into(),
            Self::Rejected => "rejected".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub workshop_id: Uuid,
    pub amount: Decimal,
    pub rating: Option<Decimal>,
    pub warranty_months: u32,
    pub completion_days: Option<u32>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(rfq_id: Uuid, workshop_id: Uuid, amount: Decimal) -> Self {
        Bid {
            id: Uuid::new_v4(),
            rfq_id,
            workshop_id,
            amount,
            rating: None,
            warranty_months: 0,
            completion_days: None,
            status: Status::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_rating(mut self, rating: Decimal) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_warranty_months(mut self, months: u32) -> Self {
        self.warranty_months = months;
        self
    }

    pub fn with_completion_days(mut self, days: u32) -> Self {
        self.completion_days = Some(days);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == Status::Accepted
    }

    #[tracing::instrument(skip(self), fields(bid_id = %self.id))]
    pub fn accept(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Accepted;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    #[tracing::instrument(skip(self), fields(bid_id = %self.id))]
    pub fn reject(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Rejected;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }
}

/// Field name → message for a rejected submission.
pub type SubmissionErrors = BTreeMap<&'static str, String>;

/// A workshop's quote as entered on the bid form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidSubmission {
    pub quote_amount: f64,
    pub parts_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub workshop_rating: Option<f64>,
    pub parts_warranty_months: Option<i64>,
    pub labor_warranty_months: Option<i64>,
    pub estimated_completion_days: Option<i64>,
    #[serde(default)]
    pub description: String,
}

impl BidSubmission {
    pub fn validate(&self) -> SubmissionErrors {
        let mut errors = SubmissionErrors::new();

        // judged on the amount the bid will actually carry, in cents
        let quote = amount_from_f64(self.quote_amount).map(round_cents);
        if self.quote_amount.is_finite() && self.quote_amount > MAX_AMOUNT {
            errors.insert("quoteAmount", "Quote amount exceeds maximum allowed".into());
        } else if quote.map_or(true, |quote| quote <= Decimal::ZERO) {
            errors.insert("quoteAmount", "Total quote amount must be positive".into());
        }

        for (field, label, cost) in [
            ("partsCost", "Parts cost", self.parts_cost),
            ("laborCost", "Labor cost", self.labor_cost),
        ] {
            match cost {
                Some(cost) if !cost.is_finite() || cost < 0.0 => {
                    errors.insert(field, format!("{} cannot be negative", label));
                }
                Some(cost) if cost > MAX_AMOUNT => {
                    errors.insert(field, format!("{} exceeds maximum allowed", label));
                }
                _ => (),
            }
        }

        if let Some(rating) = self.workshop_rating {
            if !(0.0..=5.0).contains(&rating) {
                errors.insert("workshopRating", "Rating must be between 0 and 5".into());
            }
        }

        for (field, label, months) in [
            ("partsWarrantyMonths", "Parts warranty", self.parts_warranty_months),
            ("laborWarrantyMonths", "Labor warranty", self.labor_warranty_months),
        ] {
            match months {
                Some(months) if months < 0 => {
                    errors.insert(field, format!("{} cannot be negative", label));
                }
                Some(months) if months > MAX_WARRANTY_MONTHS => {
                    errors.insert(field, format!("{} cannot exceed 10 years", label));
                }
                _ => (),
            }
        }

        match self.estimated_completion_days {
            Some(days) if days < 1 => {
                errors.insert(
                    "estimatedCompletionDays",
                    "Completion time must be positive".into(),
                );
            }
            Some(days) if days > MAX_COMPLETION_DAYS => {
                errors.insert(
                    "estimatedCompletionDays",
                    "Completion time cannot exceed 365 days".into(),
                );
            }
            _ => (),
        }

        let description_chars = self.description.trim().chars().count();
        if description_chars < MIN_DESCRIPTION_CHARS {
            errors.insert(
                "description",
                "Bid description must be at least 50 characters".into(),
            );
        } else if description_chars > MAX_DESCRIPTION_CHARS {
            errors.insert(
                "description",
                "Bid description must be less than 5000 characters".into(),
            );
        }

        match (self.parts_cost, self.labor_cost) {
            (None, None) => {
                errors.insert(
                    "partsCost",
                    "An itemized breakdown (parts cost or labor cost) is required".into(),
                );
            }
            (Some(parts), Some(labor)) if !errors.contains_key("quoteAmount") => {
                // tax and small discrepancies are tolerated up to a fifth of the total
                let difference = (self.quote_amount - (parts + labor)).abs();
                if difference > self.quote_amount * 0.2 {
                    errors.insert(
                        "quoteAmount",
                        "Quote breakdown does not match total amount".into(),
                    );
                }
            }
            _ => (),
        }

        errors
    }

    /// Turns a clean submission into a pending bid on the given RFQ.
    pub fn into_bid(self, rfq_id: Uuid, workshop_id: Uuid) -> Result<Bid, Error> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(validation_error(&errors));
        }

        let amount = amount_from_f64(self.quote_amount)
            .map(round_cents)
            .unwrap_or_default();

        // the ranges were checked above, so the conversions cannot fail
        let warranty_months = self.parts_warranty_months.unwrap_or(0)
            + self.labor_warranty_months.unwrap_or(0);

        let mut bid = Bid::new(rfq_id, workshop_id, amount)
            .with_warranty_months(u32::try_from(warranty_months).unwrap_or_default());

        bid.rating = self
            .workshop_rating
            .and_then(amount_from_f64)
            .map(|rating| {
                rating.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            });
        bid.completion_days = self
            .estimated_completion_days
            .and_then(|days| u32::try_from(days).ok());

        Ok(bid)
    }
}

#[cfg(test)]
fn submission() -> BidSubmission {
    BidSubmission {
        quote_amount: 480.0,
        parts_cost: Some(300.0),
        labor_cost: Some(150.0),
        workshop_rating: Some(4.5),
        parts_warranty_months: Some(12),
        labor_warranty_months: Some(6),
        estimated_completion_days: Some(3),
        description: "Replace front brake pads and rotors, inspect calipers and flush fluid."
            .into(),
    }
}

#[test]
fn bid_transitions_happen_once() {
    let mut bid = Bid::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::from(100));
    assert!(bid.is_pending());

    bid.accept().unwrap();
    assert!(bid.is_accepted());
    assert!(bid.accept().is_err());
    assert!(bid.reject().is_err());

    let mut bid = Bid::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::from(100));
    bid.reject().unwrap();
    assert_eq!(bid.status, Status::Rejected);
    assert!(bid.accept().is_err());
}

#[test]
fn clean_submission_becomes_pending_bid() {
    use rust_decimal_macros::dec;

    let rfq_id = Uuid::new_v4();
    let workshop_id = Uuid::new_v4();

    assert!(submission().validate().is_empty());

    let bid = submission().into_bid(rfq_id, workshop_id).unwrap();
    assert_eq!(bid.rfq_id, rfq_id);
    assert_eq!(bid.workshop_id, workshop_id);
    assert_eq!(bid.amount, dec!(480));
    assert_eq!(bid.rating, Some(dec!(4.5)));
    assert_eq!(bid.warranty_months, 18);
    assert_eq!(bid.completion_days, Some(3));
    assert!(bid.is_pending());
}

#[test]
fn malformed_numbers_are_rejected_not_coerced() {
    let errors = BidSubmission {
        quote_amount: f64::NAN,
        parts_cost: Some(-1.0),
        workshop_rating: Some(7.0),
        parts_warranty_months: Some(-3),
        labor_warranty_months: Some(240),
        estimated_completion_days: Some(0),
        ..submission()
    }
    .validate();

    assert_eq!(errors["quoteAmount"], "Total quote amount must be positive");
    assert_eq!(errors["partsCost"], "Parts cost cannot be negative");
    assert_eq!(errors["workshopRating"], "Rating must be between 0 and 5");
    assert_eq!(errors["partsWarrantyMonths"], "Parts warranty cannot be negative");
    assert_eq!(
        errors["laborWarrantyMonths"],
        "Labor warranty cannot exceed 10 years"
    );
    assert_eq!(
        errors["estimatedCompletionDays"],
        "Completion time must be positive"
    );
    assert!(!errors.contains_key("description"));
}

#[test]
fn sub_cent_quotes_are_not_positive() {
    use rust_decimal_macros::dec;

    let err = BidSubmission {
        quote_amount: 0.004,
        parts_cost: Some(0.004),
        labor_cost: None,
        ..submission()
    }
    .into_bid(Uuid::new_v4(), Uuid::new_v4())
    .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(
        err.details,
        Some(serde_json::json!({
            "quoteAmount": "Total quote amount must be positive"
        }))
    );

    let bid = BidSubmission {
        quote_amount: 0.005,
        parts_cost: Some(0.005),
        labor_cost: None,
        ..submission()
    }
    .into_bid(Uuid::new_v4(), Uuid::new_v4())
    .unwrap();
    assert_eq!(bid.amount, dec!(0.01));
}

#[test]
fn rating_rounds_half_up() {
    use rust_decimal_macros::dec;

    let bid = BidSubmission {
        workshop_rating: Some(4.25),
        ..submission()
    }
    .into_bid(Uuid::new_v4(), Uuid::new_v4())
    .unwrap();

    assert_eq!(bid.rating, Some(dec!(4.3)));
}

#[test]
fn breakdown_must_roughly_match_total() {
    let errors = BidSubmission {
        quote_amount: 1000.0,
        parts_cost: Some(300.0),
        labor_cost: Some(200.0),
        ..submission()
    }
    .validate();
    assert_eq!(
        errors["quoteAmount"],
        "Quote breakdown does not match total amount"
    );

    let errors = BidSubmission {
        parts_cost: None,
        labor_cost: None,
        ..submission()
    }
    .validate();
    assert!(errors.contains_key("partsCost"));

    let errors = BidSubmission {
        labor_cost: None,
        ..submission()
    }
    .validate();
    assert!(errors.is_empty());
}

#[test]
fn short_description_is_rejected() {
    let err = BidSubmission {
        description: "Brakes.".into(),
        ..submission()
    }
    .into_bid(Uuid::new_v4(), Uuid::new_v4())
    .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(
        err.details,
        Some(serde_json::json!({
            "description": "Bid description must be at least 50 characters"
        }))
    );
}
