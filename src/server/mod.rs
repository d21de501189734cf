mod handlers;

#[cfg(test)]
mod fake;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::server::handlers::{bids, pricing, rfqs};
use crate::{
    api::API,
    auth::User,
    error::{server_error, Error},
};

type DynAPI = Arc<dyn API + Send + Sync>;

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/pricing/validate", post(pricing::validate))
        .route(
            "/mechanics/:id/pricing",
            get(pricing::find).put(pricing::update),
        )
        .route("/mechanics/:id/pricing/payouts", get(pricing::payouts))
        .route("/rfqs", post(rfqs::create))
        .route("/rfqs/:id", get(rfqs::find))
        .route("/rfqs/:id/review", patch(rfqs::review))
        .route("/rfqs/:id/close", patch(rfqs::close))
        .route("/rfqs/:id/bids", get(bids::list).post(bids::submit))
        .route("/rfqs/:id/bids/:bid_id/accept", patch(bids::accept))
        .layer(Extension(api))
        .layer(Extension(User::new_system_user()));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(server_error)
}
