use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Acceptance, Bid, BidSubmission};
use crate::error::Error;
use crate::ranking::{RankedBids, SortDirection, SortField, SortSpec};
use crate::server::DynAPI;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListParams {
    sort: Option<String>,
    direction: Option<String>,
}

impl ListParams {
    /// An unknown sort field falls back to the default field rather than
    /// failing the listing; the requested direction is kept.
    fn sort_spec(&self) -> Result<SortSpec, Error> {
        let direction = match self.direction.as_deref() {
            Some(direction) => direction.parse::<SortDirection>()?,
            None => SortDirection::default(),
        };

        let field = match self.sort.as_deref().map(str::parse::<SortField>) {
            Some(Ok(field)) => field,
            Some(Err(err)) => {
                tracing::warn!(code = err.code, "{}, using default sort", err.message);
                SortField::default()
            }
            None => SortField::default(),
        };

        Ok(SortSpec::new(field, direction))
    }
}

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(rfq_id): Path<Uuid>,
    Json(submission): Json<BidSubmission>,
) -> Result<Json<Bid>, Error> {
    let bid = api.submit_bid(user, rfq_id, submission).await?;

    Ok(bid.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(rfq_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<RankedBids>, Error> {
    let sort = params.sort_spec()?;
    let bids = api.list_bids(user, rfq_id).await?;

    Ok(RankedBids::new(&bids, sort).into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path((rfq_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Acceptance>, Error> {
    let acceptance = api.accept_bid(user, rfq_id, bid_id).await?;

    Ok(acceptance.into())
}

#[cfg(test)]
fn fixture() -> (DynAPI, uuid::Uuid, Vec<Bid>) {
    use crate::entities::Rfq;
    use crate::server::fake::FakeApi;
    use rust_decimal_macros::dec;

    let rfq = Rfq::new(Uuid::new_v4(), "Suspension clunk over bumps".into());
    let bids = vec![
        Bid::new(rfq.id, Uuid::new_v4(), dec!(640)).with_rating(dec!(4.2)),
        Bid::new(rfq.id, Uuid::new_v4(), dec!(515.25)),
        Bid::new(rfq.id, Uuid::new_v4(), dec!(580)).with_rating(dec!(4.9)),
    ];
    let rfq_id = rfq.id;

    (FakeApi::new(rfq, bids.clone()).into_dyn(), rfq_id, bids)
}

#[cfg(test)]
fn list_with(
    api: DynAPI,
    rfq_id: Uuid,
    sort: Option<&str>,
    direction: Option<&str>,
) -> Result<RankedBids, Error> {
    let params = ListParams {
        sort: sort.map(String::from),
        direction: direction.map(String::from),
    };

    tokio_test::block_on(list(
        Extension(api),
        Extension(User::new_system_user()),
        Path(rfq_id),
        Query(params),
    ))
    .map(|Json(ranked)| ranked)
}

#[test]
fn list_ranks_and_summarizes() {
    use crate::ranking::display_amount;

    let (api, rfq_id, bids) = fixture();

    let ranked = list_with(api, rfq_id, Some("rating"), Some("desc")).unwrap();

    let order: Vec<_> = ranked.bids.iter().map(|bid| bid.id).collect();
    assert_eq!(order, vec![bids[2].id, bids[0].id, bids[1].id]);
    assert_eq!(ranked.summary.count, 3);
    assert_eq!(display_amount(ranked.summary.lowest), "515.25");
    assert_eq!(display_amount(ranked.summary.highest), "640.00");
    assert_eq!(display_amount(ranked.summary.average), "578.42");
}

#[test]
fn unknown_sort_field_falls_back_to_amount() {
    let (api, rfq_id, bids) = fixture();

    let ranked = list_with(api, rfq_id, Some("price"), Some("desc")).unwrap();

    assert_eq!(
        ranked.sort,
        SortSpec::new(SortField::Amount, SortDirection::Desc)
    );
    let order: Vec<_> = ranked.bids.iter().map(|bid| bid.id).collect();
    assert_eq!(order, vec![bids[0].id, bids[2].id, bids[1].id]);
}

#[test]
fn unknown_direction_is_refused() {
    let (api, rfq_id, _) = fixture();

    let err = list_with(api, rfq_id, None, Some("sideways")).unwrap_err();
    assert!(err.is_invalid_input_error());
}

#[test]
fn accept_then_list_excludes_rejected() {
    use crate::entities::BidStatus;
    use crate::ranking::display_amount;
    use rust_decimal_macros::dec;
    use tokio_test::block_on;

    let (api, rfq_id, bids) = fixture();

    let Json(acceptance) = block_on(accept(
        Extension(api.clone()),
        Extension(User::new_system_user()),
        Path((rfq_id, bids[1].id)),
    ))
    .unwrap();

    assert_eq!(acceptance.bid.status, BidStatus::Accepted);
    assert_eq!(acceptance.referral_fee, dec!(25.76));

    let ranked = list_with(api, rfq_id, None, None).unwrap();
    assert_eq!(ranked.summary.count, 1);
    assert_eq!(display_amount(ranked.summary.average), "515.25");
    assert_eq!(ranked.bids.len(), 3);
}
