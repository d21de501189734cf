mod bid;
mod pricing;
mod rfq;

pub use bid::{Bid, BidSubmission, Status as BidStatus, SubmissionErrors};
pub use pricing::{DiagnosticPricing, PricingDraft, Tier};
pub use rfq::{Acceptance, Rfq, Status as RfqStatus};
