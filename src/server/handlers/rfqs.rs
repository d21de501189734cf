use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Rfq;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    title: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Rfq>, Error> {
    let rfq = api.create_rfq(user, params.title).await?;

    Ok(rfq.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Rfq>, Error> {
    let rfq = api.find_rfq(user, id).await?;

    Ok(rfq.into())
}

pub async fn review(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Rfq>, Error> {
    let rfq = api.review_rfq(user, id).await?;

    Ok(rfq.into())
}

pub async fn close(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Rfq>, Error> {
    let rfq = api.close_rfq(user, id).await?;

    Ok(rfq.into())
}
