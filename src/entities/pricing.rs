use chrono::{DateTime, Utc};
use oso::PolarClass;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three diagnostic modalities a mechanic prices independently,
/// in ascending order of the mandated price ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Chat,
    Video,
    InPerson,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Chat, Tier::Video, Tier::InPerson];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Video => "video",
            Self::InPerson => "in-person",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Video => "Video",
            Self::InPerson => "In-person",
        }
    }
}

/// Tier prices exactly as submitted, before any validation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDraft {
    pub chat_price: f64,
    pub video_price: f64,
    pub in_person_price: f64,
}

impl PricingDraft {
    pub fn new(chat_price: f64, video_price: f64, in_person_price: f64) -> Self {
        Self {
            chat_price,
            video_price,
            in_person_price,
        }
    }

    pub fn price(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Chat => self.chat_price,
            Tier::Video => self.video_price,
            Tier::InPerson => self.in_person_price,
        }
    }
}

/// A mechanic's validated price list. Only `PricingValidator::accept`
/// produces one, so the floor and ordering invariants always hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticPricing {
    pub mechanic_id: Uuid,
    pub chat_price: Decimal,
    pub video_price: Decimal,
    pub in_person_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl DiagnosticPricing {
    pub fn price(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Chat => self.chat_price,
            Tier::Video => self.video_price,
            Tier::InPerson => self.in_person_price,
        }
    }
}

impl PolarClass for DiagnosticPricing {
    fn get_polar_class_builder() -> oso::ClassBuilder<DiagnosticPricing> {
        oso::Class::builder()
            .name("DiagnosticPricing")
            .add_attribute_getter("mechanic_id", |recv: &DiagnosticPricing| {
                recv.mechanic_id.clone()
            })
    }

    fn get_polar_class() -> oso::Class {
        let builder = DiagnosticPricing::get_polar_class_builder();
        builder.build()
    }
}

#[test]
fn tier_names_on_the_wire() {
    assert_eq!(serde_json::to_string(&Tier::InPerson).unwrap(), "\"inPerson\"");
    assert_eq!(serde_json::to_string(&Tier::Chat).unwrap(), "\"chat\"");

    let draft: PricingDraft =
        serde_json::from_str(r#"{"chatPrice":25,"videoPrice":50,"inPersonPrice":75.5}"#).unwrap();
    assert_eq!(draft.price(Tier::InPerson), 75.5);
}
