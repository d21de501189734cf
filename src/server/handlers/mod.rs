pub mod bids;
pub mod pricing;
pub mod rfqs;
