use super::helpers::{fetch_bids_for_update, fetch_rfq_for_update, update_bid, update_rfq};
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::RfqAPI,
    auth::{Platform, User},
    entities::Rfq,
    error::{invalid_input_error, Error},
};

#[async_trait]
impl RfqAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_rfq(&self, user: User, title: String) -> Result<Rfq, Error> {
        self.authorize(user.clone(), "create_rfq", Platform::default())?;

        let title = title.trim();
        if title.is_empty() {
            return Err(invalid_input_error());
        }

        let rfq = Rfq::new(user.id, title.into());

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("INSERT INTO rfqs (id, customer_id, status, data) VALUES ($1, $2, $3, $4)")
                .bind(&rfq.id)
                .bind(&rfq.customer_id)
                .bind(rfq.status.name())
                .bind(Json(&rfq)),
        )
        .await?;

        Ok(rfq)
    }

    #[tracing::instrument(skip(self))]
    async fn find_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM rfqs WHERE id = $1").bind(&id))
            .await?;

        let result = maybe_result.ok_or_else(|| invalid_input_error())?;
        let Json(rfq): Json<Rfq> = result.try_get("data")?;

        self.authorize(user.clone(), "read", rfq.clone())?;

        Ok(rfq)
    }

    #[tracing::instrument(skip(self))]
    async fn review_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut rfq = fetch_rfq_for_update(&mut tx, &id).await?;
        self.authorize(user.clone(), "review", rfq.clone())?;

        rfq.begin_review()?;
        update_rfq(&mut tx, &rfq).await?;

        tx.commit().await?;

        Ok(rfq)
    }

    #[tracing::instrument(skip(self))]
    async fn close_rfq(&self, user: User, id: Uuid) -> Result<Rfq, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut rfq = fetch_rfq_for_update(&mut tx, &id).await?;
        self.authorize(user.clone(), "close", rfq.clone())?;

        let mut bids = fetch_bids_for_update(&mut tx, &id).await?;
        rfq.close(&mut bids)?;

        update_rfq(&mut tx, &rfq).await?;
        for bid in bids.iter() {
            update_bid(&mut tx, bid).await?;
        }

        tx.commit().await?;

        tracing::info!(bids = bids.len(), "rfq closed");

        Ok(rfq)
    }
}
