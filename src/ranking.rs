use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Bid, BidStatus};
use crate::error::{invalid_input_error, invalid_sort_field_error, Error};
use crate::pricing::round_cents;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Amount,
    Rating,
    WarrantyMonths,
    CompletionDays,
}

impl SortField {
    fn value(&self, bid: &Bid) -> Option<Decimal> {
        match self {
            Self::Amount => Some(bid.amount),
            Self::Rating => bid.rating,
            Self::WarrantyMonths => Some(Decimal::from(bid.warranty_months)),
            Self::CompletionDays => bid.completion_days.map(Decimal::from),
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amount" => Ok(Self::Amount),
            "rating" => Ok(Self::Rating),
            "warrantyMonths" | "warranty_months" => Ok(Self::WarrantyMonths),
            "completionDays" | "completion_days" => Ok(Self::CompletionDays),
            _ => Err(invalid_sort_field_error(s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn order(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(invalid_input_error()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Orders bids by `sort`, returning a fresh vector.
///
/// Bids without a value for the field go last whichever direction is
/// requested. Ties, including two missing values, keep their input order:
/// every bid is decorated with its original index, which breaks all ties,
/// so the result does not depend on the stability of the sort routine.
pub fn rank(bids: &[Bid], sort: SortSpec) -> Vec<Bid> {
    let mut decorated: Vec<(usize, Option<Decimal>, &Bid)> = bids
        .iter()
        .enumerate()
        .map(|(index, bid)| (index, sort.field.value(bid), bid))
        .collect();

    decorated.sort_unstable_by(|(left_index, left, _), (right_index, right, _)| {
        let by_value = match (left, right) {
            (Some(left), Some(right)) => sort.direction.order(left.cmp(right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_value.then_with(|| left_index.cmp(right_index))
    });

    decorated.into_iter().map(|(_, _, bid)| bid.clone()).collect()
}

/// Aggregates over one RFQ's bids. Amounts are `None` when no bid
/// qualifies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BidSummary {
    pub count: usize,
    pub lowest: Option<Decimal>,
    pub highest: Option<Decimal>,
    pub average: Option<Decimal>,
}

/// Pending bids and the accepted one count towards the summary; rejected
/// bids never do.
pub fn summarize(bids: &[Bid]) -> BidSummary {
    let amounts: Vec<Decimal> = bids
        .iter()
        .filter(|bid| bid.status != BidStatus::Rejected)
        .map(|bid| bid.amount)
        .collect();

    if amounts.is_empty() {
        return BidSummary::default();
    }

    let count = amounts.len();
    let total = amounts
        .iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(*amount));
    if total.is_none() {
        tracing::warn!(count, "bid total overflowed, average unavailable");
    }

    BidSummary {
        count,
        lowest: amounts.iter().min().copied().map(cents),
        highest: amounts.iter().max().copied().map(cents),
        average: total.map(|total| cents(total / Decimal::from(count))),
    }
}

/// Renders a summary amount the way the bid comparison table shows it.
pub fn display_amount(amount: Option<Decimal>) -> String {
    match amount {
        Some(amount) => cents(amount).to_string(),
        None => "N/A".into(),
    }
}

fn cents(amount: Decimal) -> Decimal {
    let mut rounded = round_cents(amount);
    rounded.rescale(2);
    rounded
}

/// A ranked listing together with its summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedBids {
    pub sort: SortSpec,
    pub bids: Vec<Bid>,
    pub summary: BidSummary,
}

impl RankedBids {
    pub fn new(bids: &[Bid], sort: SortSpec) -> Self {
        Self {
            sort,
            bids: rank(bids, sort),
            summary: summarize(bids),
        }
    }
}

#[cfg(test)]
fn bid(amount: Decimal) -> Bid {
    Bid::new(uuid::Uuid::nil(), uuid::Uuid::new_v4(), amount)
}

#[cfg(test)]
fn ids(bids: &[Bid]) -> Vec<uuid::Uuid> {
    bids.iter().map(|bid| bid.id).collect()
}

#[test]
fn ranks_by_amount_in_both_directions() {
    use rust_decimal_macros::dec;

    let bids = vec![bid(dec!(300)), bid(dec!(120.50)), bid(dec!(480))];

    let asc = rank(&bids, SortSpec::new(SortField::Amount, SortDirection::Asc));
    assert_eq!(ids(&asc), vec![bids[1].id, bids[0].id, bids[2].id]);

    let desc = rank(&bids, SortSpec::new(SortField::Amount, SortDirection::Desc));
    assert_eq!(ids(&desc), vec![bids[2].id, bids[0].id, bids[1].id]);
}

#[test]
fn equal_amounts_keep_input_order() {
    use rust_decimal_macros::dec;

    let bids = vec![
        bid(dec!(200)),
        bid(dec!(150.00)),
        bid(dec!(150)),
        bid(dec!(90)),
    ];

    let asc = rank(&bids, SortSpec::new(SortField::Amount, SortDirection::Asc));
    assert_eq!(ids(&asc), vec![bids[3].id, bids[1].id, bids[2].id, bids[0].id]);

    let desc = rank(&bids, SortSpec::new(SortField::Amount, SortDirection::Desc));
    assert_eq!(ids(&desc), vec![bids[0].id, bids[1].id, bids[2].id, bids[3].id]);
}

#[test]
fn missing_ratings_sort_last() {
    use rust_decimal_macros::dec;

    let bids = vec![
        bid(dec!(100)),
        bid(dec!(100)).with_rating(dec!(3.5)),
        bid(dec!(100)),
        bid(dec!(100)).with_rating(dec!(4.8)),
    ];

    let asc = rank(&bids, SortSpec::new(SortField::Rating, SortDirection::Asc));
    assert_eq!(ids(&asc), vec![bids[1].id, bids[3].id, bids[0].id, bids[2].id]);

    let desc = rank(&bids, SortSpec::new(SortField::Rating, SortDirection::Desc));
    assert_eq!(ids(&desc), vec![bids[3].id, bids[1].id, bids[0].id, bids[2].id]);
}

#[test]
fn ranks_by_warranty_and_completion() {
    use rust_decimal_macros::dec;

    let bids = vec![
        bid(dec!(100)).with_warranty_months(12).with_completion_days(5),
        bid(dec!(100)).with_warranty_months(24),
        bid(dec!(100)).with_warranty_months(6).with_completion_days(2),
    ];

    let warranty = rank(
        &bids,
        SortSpec::new(SortField::WarrantyMonths, SortDirection::Desc),
    );
    assert_eq!(ids(&warranty), vec![bids[1].id, bids[0].id, bids[2].id]);

    let completion = rank(
        &bids,
        SortSpec::new(SortField::CompletionDays, SortDirection::Desc),
    );
    assert_eq!(ids(&completion), vec![bids[0].id, bids[2].id, bids[1].id]);
}

#[test]
fn ranking_leaves_input_untouched() {
    use rust_decimal_macros::dec;

    let bids = vec![bid(dec!(300)), bid(dec!(100))];
    let before = bids.clone();

    let ranked = rank(&bids, SortSpec::default());

    assert_eq!(bids, before);
    assert_eq!(ranked.len(), 2);
    assert!(rank(&[], SortSpec::default()).is_empty());
}

#[test]
fn unknown_sort_field_is_reported() {
    let err = "price".parse::<SortField>().unwrap_err();
    assert!(err.is_invalid_sort_field_error());

    assert_eq!("warrantyMonths".parse::<SortField>().unwrap(), SortField::WarrantyMonths);
    assert_eq!("completion_days".parse::<SortField>().unwrap(), SortField::CompletionDays);
    assert!("sideways".parse::<SortDirection>().unwrap_err().is_invalid_input_error());
}

#[test]
fn summary_excludes_rejected_bids() {
    use rust_decimal_macros::dec;

    let mut accepted = bid(dec!(200));
    accepted.accept().unwrap();
    let mut rejected = bid(dec!(50));
    rejected.reject().unwrap();

    let summary = summarize(&[bid(dec!(100)), accepted, rejected]);

    assert_eq!(summary.count, 2);
    assert_eq!(summary.lowest, Some(dec!(100)));
    assert_eq!(summary.highest, Some(dec!(200)));
    assert_eq!(summary.average, Some(dec!(150.00)));
    assert_eq!(display_amount(summary.average), "150.00");
}

#[test]
fn empty_summary_is_unavailable() {
    let summary = summarize(&[]);

    assert_eq!(summary.count, 0);
    assert_eq!(summary.lowest, None);
    assert_eq!(summary.highest, None);
    assert_eq!(summary.average, None);
    assert_eq!(display_amount(summary.lowest), "N/A");
    assert_eq!(display_amount(summary.average), "N/A");
}

#[test]
fn all_rejected_is_unavailable() {
    use rust_decimal_macros::dec;

    let mut rejected = bid(dec!(75));
    rejected.reject().unwrap();

    let summary = summarize(&[rejected]);
    assert_eq!(summary, BidSummary::default());
}

#[test]
fn average_rounds_half_up() {
    use rust_decimal_macros::dec;

    let summary = summarize(&[bid(dec!(10)), bid(dec!(11))]);
    assert_eq!(display_amount(summary.average), "10.50");

    let summary = summarize(&[bid(dec!(10)), bid(dec!(10)), bid(dec!(11))]);
    assert_eq!(display_amount(summary.average), "10.33");

    let summary = summarize(&[bid(dec!(0.01)), bid(dec!(0.02))]);
    assert_eq!(display_amount(summary.average), "0.02");

    let summary = summarize(&[bid(dec!(0.1)), bid(dec!(0.2)), bid(dec!(0.3))]);
    assert_eq!(summary.average, Some(dec!(0.20)));
}

#[test]
fn ranked_bids_bundle_order_and_summary() {
    use rust_decimal_macros::dec;

    let bids = vec![bid(dec!(300)), bid(dec!(100))];
    let ranked = RankedBids::new(&bids, SortSpec::default());

    assert_eq!(ranked.bids[0].id, bids[1].id);
    assert_eq!(ranked.summary.count, 2);
    assert_eq!(display_amount(ranked.summary.lowest), "100.00");
}

#[test]
fn overflowing_total_leaves_average_unavailable() {
    let summary = summarize(&[bid(Decimal::MAX), bid(Decimal::MAX)]);

    assert_eq!(summary.count, 2);
    assert_eq!(summary.average, None);
    assert_eq!(summary.highest, Some(Decimal::MAX));
    assert_eq!(display_amount(summary.average), "N/A");
}
