use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Acceptance, Bid, BidSubmission, DiagnosticPricing, PricingDraft, Rfq};
use crate::error::Error;
use crate::pricing::{Payout, PricingErrors};

#[async_trait]
pub trait PricingAPI {
    async fn find_pricing(&self, user: User, mechanic_id: Uuid)
        -> Result<DiagnosticPricing, Error>;
    async fn update_pricing(
        &self,
        user: User,
        mechanic_id: Uuid,
        draft: PricingDraft,
    ) -> Result<DiagnosticPricing, Error>;
    fn validate_pricing(&self, draft: &PricingDraft) -> PricingErrors;
    fn preview_payouts(&self, pricing: &DiagnosticPricing) -> Vec<Payout>;
}

#[async_trait]
pub trait RfqAPI {
    async fn create_rfq(&self, user: User, title: String) -> Result<Rfq, Error>;
    async fn find_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error>;
    async fn review_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error>;
    async fn close_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error>;
}

#[async_trait]
pub trait BidAPI {
    async fn submit_bid(
        &self,
        user: User,
        rfq_id: Uuid,
        submission: BidSubmission,
    ) -> Result<Bid, Error>;
    /// Bids in the order they were submitted.
    async fn list_bids(&self, user: User, rfq_id: Uuid) -> Result<Vec<Bid>, Error>;
    async fn accept_bid(&self, user: User, rfq_id: Uuid, bid_id: Uuid)
        -> Result<Acceptance, Error>;
}

pub trait API: PricingAPI + RfqAPI + BidAPI {}
