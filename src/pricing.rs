use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{DiagnosticPricing, PricingDraft, Tier};
use crate::error::{validation_error, Error};

/// Largest currency amount a form may carry.
pub const MAX_AMOUNT: f64 = 999_999.99;

/// Tier → message, holding only the tiers that break a rule.
pub type PricingErrors = BTreeMap<Tier, String>;

/// Rounds a currency amount to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a raw form value into an exact decimal. Negative, NaN and
/// infinite inputs have no decimal counterpart and yield `None`.
pub fn amount_from_f64(raw: f64) -> Option<Decimal> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }

    Decimal::from_f64(raw)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingFloors {
    pub chat: Decimal,
    pub video: Decimal,
    pub in_person: Decimal,
}

impl PricingFloors {
    pub fn floor(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Chat => self.chat,
            Tier::Video => self.video,
            Tier::InPerson => self.in_person,
        }
    }
}

impl Default for PricingFloors {
    fn default() -> Self {
        Self {
            chat: Decimal::from(19),
            video: Decimal::from(39),
            in_person: Decimal::from(50),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PricingValidator {
    floors: PricingFloors,
}

impl PricingValidator {
    pub fn new(floors: PricingFloors) -> Self {
        Self { floors }
    }

    pub fn floors(&self) -> &PricingFloors {
        &self.floors
    }

    /// Reports every rule the draft breaks, one message per tier.
    ///
    /// Malformed and below-floor prices are flagged on their own tier. The
    /// ordering between two adjacent tiers is only checked once the cheaper
    /// tier has cleared its floor, and a breach replaces whatever floor
    /// message the pricier tier already carries.
    pub fn validate(&self, draft: &PricingDraft) -> PricingErrors {
        let mut errors = PricingErrors::new();

        let mut cleared = BTreeMap::new();
        let mut parsed = BTreeMap::new();

        for tier in Tier::ALL {
            let price = match parse_price(tier, draft.price(tier)) {
                Ok(price) => price,
                Err(message) => {
                    errors.insert(tier, message);
                    continue;
                }
            };
            parsed.insert(tier, price);

            let floor = self.floors.floor(tier);
            if price < floor {
                errors.insert(
                    tier,
                    format!(
                        "Minimum {} diagnostic price is ${}",
                        tier.label(),
                        floor.normalize()
                    ),
                );
                continue;
            }
            cleared.insert(tier, price);
        }

        for (lower, upper) in [(Tier::Chat, Tier::Video), (Tier::Video, Tier::InPerson)] {
            if let (Some(low), Some(high)) = (cleared.get(&lower), parsed.get(&upper)) {
                if high < low {
                    errors.insert(
                        upper,
                        format!(
                            "{} price must be greater than or equal to {} price",
                            upper.title(),
                            lower.label()
                        ),
                    );
                }
            }
        }

        errors
    }

    /// Validates the draft and, when it is clean, produces the record to
    /// persist with every price rounded to cents.
    #[tracing::instrument(skip(self))]
    pub fn accept(
        &self,
        mechanic_id: Uuid,
        draft: &PricingDraft,
    ) -> Result<DiagnosticPricing, Error> {
        let errors = self.validate(draft);
        if !errors.is_empty() {
            tracing::info!(violations = errors.len(), "pricing rejected");
            return Err(validation_error(&errors));
        }

        let price = |tier| {
            amount_from_f64(draft.price(tier))
                .map(round_cents)
                .unwrap_or_default()
        };

        Ok(DiagnosticPricing {
            mechanic_id,
            chat_price: price(Tier::Chat),
            video_price: price(Tier::Video),
            in_person_price: price(Tier::InPerson),
            updated_at: Utc::now(),
        })
    }
}

fn parse_price(tier: Tier, raw: f64) -> Result<Decimal, String> {
    if raw.is_finite() && raw > MAX_AMOUNT {
        return Err(format!("{} price exceeds maximum allowed", tier.title()));
    }

    amount_from_f64(raw).ok_or_else(|| {
        format!(
            "{} price must be a finite, non-negative amount",
            tier.title()
        )
    })
}

/// What the platform keeps from a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub platform_fee_percent: Decimal,
    pub referral_fee_percent: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee_percent: Decimal::from(30),
            referral_fee_percent: Decimal::from(5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub tier: Tier,
    pub price: Decimal,
    pub platform_fee: Decimal,
    pub payout: Decimal,
}

impl FeeSchedule {
    pub fn platform_fee(&self, gross: Decimal) -> Decimal {
        percent_of(gross, self.platform_fee_percent)
    }

    pub fn referral_fee(&self, amount: Decimal) -> Decimal {
        percent_of(amount, self.referral_fee_percent)
    }

    pub fn payouts(&self, pricing: &DiagnosticPricing) -> Vec<Payout> {
        Tier::ALL
            .iter()
            .map(|&tier| {
                let price = pricing.price(tier);
                let platform_fee = self.platform_fee(price);

                Payout {
                    tier,
                    price,
                    platform_fee,
                    payout: price - platform_fee,
                }
            })
            .collect()
    }
}

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_cents(amount * percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
fn validate(chat: f64, video: f64, in_person: f64) -> PricingErrors {
    PricingValidator::default().validate(&PricingDraft::new(chat, video, in_person))
}

#[test]
fn floors_are_inclusive() {
    assert!(validate(19.0, 39.0, 50.0).is_empty());

    let errors = validate(18.99, 39.0, 50.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[&Tier::Chat], "Minimum chat diagnostic price is $19");

    let errors = validate(19.0, 38.5, 50.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[&Tier::Video], "Minimum video diagnostic price is $39");

    let errors = validate(19.0, 39.0, 49.99);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[&Tier::InPerson],
        "Minimum in-person diagnostic price is $50"
    );
}

#[test]
fn every_floor_breach_is_reported() {
    let errors = validate(0.0, 0.0, 0.0);

    assert_eq!(errors.len(), 3);
    assert_eq!(errors[&Tier::Chat], "Minimum chat diagnostic price is $19");
    assert_eq!(errors[&Tier::Video], "Minimum video diagnostic price is $39");
    assert_eq!(
        errors[&Tier::InPerson],
        "Minimum in-person diagnostic price is $50"
    );
}

#[test]
fn monotonic_prices_pass() {
    for (chat, video, in_person) in [
        (19.0, 39.0, 50.0),
        (25.0, 50.0, 75.0),
        (45.0, 45.0, 50.0),
        (60.0, 60.0, 60.0),
        (19.99, 39.99, 149.5),
    ] {
        assert!(validate(chat, video, in_person).is_empty());
    }
}

#[test]
fn ordering_breaches_are_attributed_to_the_pricier_tier() {
    let errors = validate(60.0, 45.0, 80.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[&Tier::Video],
        "Video price must be greater than or equal to chat price"
    );

    let errors = validate(25.0, 90.0, 60.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[&Tier::InPerson],
        "In-person price must be greater than or equal to video price"
    );

    let errors = validate(100.0, 70.0, 55.0);
    assert_eq!(errors.len(), 2);
    assert!(errors.contains_key(&Tier::Video));
    assert!(errors.contains_key(&Tier::InPerson));
}

#[test]
fn ordering_breach_replaces_floor_message() {
    let errors = validate(25.0, 20.0, 75.0);

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[&Tier::Video],
        "Video price must be greater than or equal to chat price"
    );
}

#[test]
fn ordering_is_skipped_against_a_cheaper_tier_below_its_floor() {
    let errors = validate(10.0, 39.0, 50.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[&Tier::Chat], "Minimum chat diagnostic price is $19");

    // video sits below its own floor, so in-person is not compared to it
    let errors = validate(19.0, 30.0, 55.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[&Tier::Video], "Minimum video diagnostic price is $39");
}

#[test]
fn malformed_prices_are_classified() {
    let errors = validate(f64::NAN, f64::INFINITY, -5.0);

    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors[&Tier::Chat],
        "Chat price must be a finite, non-negative amount"
    );
    assert_eq!(
        errors[&Tier::Video],
        "Video price must be a finite, non-negative amount"
    );
    assert_eq!(
        errors[&Tier::InPerson],
        "In-person price must be a finite, non-negative amount"
    );

    let errors = validate(25.0, f64::NEG_INFINITY, 50.0);
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key(&Tier::Video));
}

#[test]
fn oversized_prices_are_capped() {
    let errors = validate(25.0, 50.0, 1e30);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[&Tier::InPerson],
        "In-person price exceeds maximum allowed"
    );

    // an oversized tier takes no part in the ordering check
    let errors = validate(25.0, 1_000_000.0, 75.0);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[&Tier::Video], "Video price exceeds maximum allowed");

    assert!(validate(25.0, 50.0, MAX_AMOUNT).is_empty());
}

#[test]
fn validate_is_idempotent() {
    let validator = PricingValidator::default();
    let draft = PricingDraft::new(25.0, 20.0, 10.0);

    assert_eq!(validator.validate(&draft), validator.validate(&draft));
}

#[test]
fn configured_floors_drive_messages() {
    use rust_decimal_macros::dec;

    let validator = PricingValidator::new(PricingFloors {
        chat: dec!(24.50),
        video: dec!(40),
        in_person: dec!(60),
    });

    let errors = validator.validate(&PricingDraft::new(24.0, 45.0, 60.0));
    assert_eq!(errors[&Tier::Chat], "Minimum chat diagnostic price is $24.5");
}

#[test]
fn errors_serialize_with_tier_keys() {
    let errors = validate(10.0, 39.0, 30.0);

    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        serde_json::json!({
            "chat": "Minimum chat diagnostic price is $19",
            "inPerson": "In-person price must be greater than or equal to video price",
        })
    );
}

#[test]
fn accept_rounds_to_cents() {
    use rust_decimal_macros::dec;

    let mechanic_id = Uuid::new_v4();
    let pricing = PricingValidator::default()
        .accept(mechanic_id, &PricingDraft::new(19.0, 39.5, 75.125))
        .unwrap();

    assert_eq!(pricing.mechanic_id, mechanic_id);
    assert_eq!(pricing.chat_price, dec!(19));
    assert_eq!(pricing.video_price, dec!(39.50));
    assert_eq!(pricing.in_person_price, dec!(75.13));
}

#[test]
fn accept_refuses_invalid_drafts() {
    let err = PricingValidator::default()
        .accept(Uuid::new_v4(), &PricingDraft::new(25.0, 20.0, 75.0))
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(
        err.details,
        Some(serde_json::json!({
            "video": "Video price must be greater than or equal to chat price"
        }))
    );
}

#[test]
fn payouts_deduct_platform_fee() {
    use rust_decimal_macros::dec;

    let pricing = PricingValidator::default()
        .accept(Uuid::new_v4(), &PricingDraft::new(25.0, 50.0, 75.0))
        .unwrap();
    let payouts = FeeSchedule::default().payouts(&pricing);

    assert_eq!(payouts.len(), 3);
    assert_eq!(payouts[0].tier, Tier::Chat);
    assert_eq!(payouts[0].platform_fee, dec!(7.50));
    assert_eq!(payouts[0].payout, dec!(17.50));
    assert_eq!(payouts[2].payout, dec!(52.50));
}

#[test]
fn fees_round_half_up() {
    use rust_decimal_macros::dec;

    let fees = FeeSchedule::default();
    assert_eq!(fees.referral_fee(dec!(0.50)), dec!(0.03));
    assert_eq!(fees.referral_fee(dec!(123.45)), dec!(6.17));
    assert_eq!(fees.platform_fee(dec!(19.99)), dec!(6.00));
}
