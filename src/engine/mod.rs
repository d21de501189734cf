mod bid_api;
mod helpers;
mod pricing_api;
mod rfq_api;

use oso::Oso;
use sqlx::{Executor, Pool, Postgres};

use crate::{
    api::API,
    auth::authorizor,
    config::Config,
    error::Error,
    pricing::{FeeSchedule, PricingValidator},
};

type Database = Postgres;

pub struct Engine {
    pool: Pool<Database>,
    authorizor: Oso,
    validator: PricingValidator,
    fees: FeeSchedule,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(pool: Pool<Database>, config: &Config) -> Result<Self, Error> {
        // pricing service (KV store keyed by mechanic)
        pool.execute(
            "CREATE TABLE IF NOT EXISTS diagnostic_pricing (mechanic_id UUID PRIMARY KEY, data JSONB NOT NULL)",
        )
        .await?;

        // rfq service
        pool.execute("CREATE TABLE IF NOT EXISTS rfqs (id UUID PRIMARY KEY, customer_id UUID NOT NULL, status VARCHAR NOT NULL, data JSONB NOT NULL)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS bids (id UUID PRIMARY KEY, rfq_id UUID NOT NULL, workshop_id UUID NOT NULL, status VARCHAR NOT NULL, amount DECIMAL NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL, CONSTRAINT fk_bid_rfq FOREIGN KEY(rfq_id) REFERENCES rfqs(id))")
            .await?;

        pool.execute("CREATE INDEX IF NOT EXISTS bids_rfq_id_idx ON bids (rfq_id, created_at, id)")
            .await?;

        Ok(Self {
            pool,
            authorizor: authorizor::new()?,
            validator: PricingValidator::new(config.floors.clone()),
            fees: config.fees.clone(),
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        authorizor::authorize(&self.authorizor, actor, action, resource)
    }
}

impl API for Engine {}
