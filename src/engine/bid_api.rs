use super::helpers::{fetch_bids_for_update, fetch_rfq_for_update, update_bid, update_rfq};
use super::Engine;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{BidAPI, RfqAPI},
    auth::User,
    entities::{Acceptance, Bid, BidSubmission},
    error::{invalid_invocation_error, unexpected_error, Error},
};

#[async_trait]
impl BidAPI for Engine {
    #[tracing::instrument(skip(self, submission))]
    async fn submit_bid(
        &self,
        user: User,
        rfq_id: Uuid,
        submission: BidSubmission,
    ) -> Result<Bid, Error> {
        let bid = submission.into_bid(rfq_id, user.id)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        // hold the rfq row so it cannot close while the bid is inserted
        let rfq = fetch_rfq_for_update(&mut tx, &rfq_id).await?;
        self.authorize(user.clone(), "submit_bid", rfq.clone())?;

        if !rfq.accepts_bids() {
            tracing::info!("rfq is no longer open, refusing bid");
            return Err(invalid_invocation_error());
        }

        tx.execute(
            sqlx::query(
                "INSERT INTO bids (id, rfq_id, workshop_id, status, amount, created_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&bid.id)
            .bind(&bid.rfq_id)
            .bind(&bid.workshop_id)
            .bind(bid.status.name())
            .bind(&bid.amount)
            .bind(&bid.created_at)
            .bind(Json(&bid)),
        )
        .await?;

        tx.commit().await?;

        Ok(bid)
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids(&self, user: User, rfq_id: Uuid) -> Result<Vec<Bid>, Error> {
        // authorization is inherited from the rfq
        self.find_rfq(user.clone(), rfq_id).await?;

        let mut conn = self.pool.acquire().await?;

        let mut results = conn.fetch(
            sqlx::query("SELECT data FROM bids WHERE rfq_id = $1 ORDER BY created_at ASC, id ASC")
                .bind(&rfq_id),
        );

        let mut bids = Vec::new();
        while let Some(row) = results.try_next().await? {
            let Json(bid): Json<Bid> = row.try_get("data")?;
            bids.push(bid);
        }

        Ok(bids)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_bid(
        &self,
        user: User,
        rfq_id: Uuid,
        bid_id: Uuid,
    ) -> Result<Acceptance, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut rfq = fetch_rfq_for_update(&mut tx, &rfq_id).await?;
        self.authorize(user.clone(), "accept_bid", rfq.clone())?;

        let mut bids = fetch_bids_for_update(&mut tx, &rfq_id).await?;
        rfq.accept_bid(bid_id, &mut bids)?;

        update_rfq(&mut tx, &rfq).await?;
        for bid in bids.iter() {
            update_bid(&mut tx, bid).await?;
        }

        tx.commit().await?;

        let bid = bids
            .into_iter()
            .find(|bid| bid.id == bid_id)
            .ok_or_else(|| unexpected_error())?;
        let referral_fee = self.fees.referral_fee(bid.amount);

        tracing::info!(%referral_fee, "bid accepted");

        Ok(Acceptance {
            rfq,
            bid,
            referral_fee,
        })
    }
}
