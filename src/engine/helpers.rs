use super::Database;

use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::{Bid, Rfq},
    error::{invalid_input_error, Error},
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_rfq_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Rfq, Error> {
    let Json(rfq): Json<Rfq> = tx
        .fetch_optional(sqlx::query("SELECT data FROM rfqs WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| invalid_input_error())?
        .try_get("data")?;

    Ok(rfq)
}

/// Locks every bid on the RFQ, returned in submission order.
#[tracing::instrument(skip(tx))]
pub async fn fetch_bids_for_update(
    tx: &mut Transaction<'_, Database>,
    rfq_id: &Uuid,
) -> Result<Vec<Bid>, Error> {
    let rows = tx
        .fetch_all(
            sqlx::query(
                "SELECT data FROM bids WHERE rfq_id = $1 ORDER BY created_at ASC, id ASC FOR UPDATE",
            )
            .bind(rfq_id),
        )
        .await?;

    let mut bids = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let Json(bid): Json<Bid> = row.try_get("data")?;
        bids.push(bid);
    }

    Ok(bids)
}

#[tracing::instrument(skip(tx))]
pub async fn update_rfq(tx: &mut Transaction<'_, Database>, rfq: &Rfq) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE rfqs SET status = $2, data = $3 WHERE id = $1")
            .bind(&rfq.id)
            .bind(rfq.status.name())
            .bind(Json(rfq)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn update_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = $2, data = $3 WHERE id = $1")
            .bind(&bid.id)
            .bind(bid.status.name())
            .bind(Json(bid)),
    )
    .await?;

    Ok(())
}
