use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{DiagnosticPricing, PricingDraft};
use crate::error::Error;
use crate::pricing::{Payout, PricingErrors};
use crate::server::DynAPI;

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    valid: bool,
    errors: PricingErrors,
}

pub async fn validate(
    Extension(api): Extension<DynAPI>,
    Json(draft): Json<PricingDraft>,
) -> Json<ValidateResponse> {
    let errors = api.validate_pricing(&draft);

    ValidateResponse {
        valid: errors.is_empty(),
        errors,
    }
    .into()
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<Json<DiagnosticPricing>, Error> {
    let pricing = api.find_pricing(user, mechanic_id).await?;

    Ok(pricing.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(mechanic_id): Path<Uuid>,
    Json(draft): Json<PricingDraft>,
) -> Result<Json<DiagnosticPricing>, Error> {
    let pricing = api.update_pricing(user, mechanic_id, draft).await?;

    Ok(pricing.into())
}

pub async fn payouts(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(mechanic_id): Path<Uuid>,
) -> Result<Json<Vec<Payout>>, Error> {
    let pricing = api.find_pricing(user, mechanic_id).await?;

    Ok(api.preview_payouts(&pricing).into())
}

#[cfg(test)]
fn api() -> DynAPI {
    use crate::entities::Rfq;
    use crate::server::fake::FakeApi;

    FakeApi::new(Rfq::new(Uuid::new_v4(), "Oil leak".into()), vec![]).into_dyn()
}

#[test]
fn validate_reports_tier_messages() {
    use crate::entities::Tier;
    use tokio_test::block_on;

    let Json(response) = block_on(validate(
        Extension(api()),
        Json(PricingDraft::new(25.0, 20.0, 75.0)),
    ));

    assert!(!response.valid);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[&Tier::Video],
        "Video price must be greater than or equal to chat price"
    );

    let Json(response) = block_on(validate(
        Extension(api()),
        Json(PricingDraft::new(25.0, 50.0, 75.0)),
    ));
    assert!(response.valid);
    assert!(response.errors.is_empty());
}

#[test]
fn update_refuses_invalid_pricing() {
    use tokio_test::block_on;

    let api = api();
    let mechanic_id = Uuid::new_v4();

    let err = block_on(update(
        Extension(api.clone()),
        Extension(User::new_system_user()),
        Path(mechanic_id),
        Json(PricingDraft::new(10.0, 39.0, 50.0)),
    ))
    .unwrap_err();
    assert!(err.is_validation_error());

    // nothing was stored
    let err = block_on(find(
        Extension(api),
        Extension(User::new_system_user()),
        Path(mechanic_id),
    ))
    .unwrap_err();
    assert!(err.is_invalid_input_error());
}

#[test]
fn payouts_follow_saved_pricing() {
    use rust_decimal_macros::dec;
    use tokio_test::block_on;

    let api = api();
    let mechanic_id = Uuid::new_v4();

    block_on(update(
        Extension(api.clone()),
        Extension(User::new_system_user()),
        Path(mechanic_id),
        Json(PricingDraft::new(25.0, 50.0, 75.0)),
    ))
    .unwrap();

    let Json(preview) = block_on(payouts(
        Extension(api),
        Extension(User::new_system_user()),
        Path(mechanic_id),
    ))
    .unwrap();

    let amounts: Vec<_> = preview.iter().map(|payout| payout.payout).collect();
    assert_eq!(amounts, vec![dec!(17.50), dec!(35.00), dec!(52.50)]);
}
