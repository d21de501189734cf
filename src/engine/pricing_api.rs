use super::Engine;

use async_trait::async_trait;
use oso::Oso;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::PricingAPI,
    auth::{authorizor, Mechanic, User},
    entities::{DiagnosticPricing, PricingDraft},
    error::{invalid_input_error, Error},
    pricing::{Payout, PricingErrors, PricingValidator},
};

/// Produces the record to store for `mechanic_id`. Callers who may not
/// manage that mechanic's prices are turned away before the draft is read.
fn admit_pricing(
    oso: &Oso,
    validator: &PricingValidator,
    user: User,
    mechanic_id: Uuid,
    draft: &PricingDraft,
) -> Result<DiagnosticPricing, Error> {
    authorizor::authorize(oso, user, "update_pricing", Mechanic::new(mechanic_id))?;

    validator.accept(mechanic_id, draft)
}

#[async_trait]
impl PricingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_pricing(
        &self,
        user: User,
        mechanic_id: Uuid,
    ) -> Result<DiagnosticPricing, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(
                sqlx::query("SELECT data FROM diagnostic_pricing WHERE mechanic_id = $1")
                    .bind(&mechanic_id),
            )
            .await?;

        let result = maybe_result.ok_or_else(|| invalid_input_error())?;
        let Json(pricing): Json<DiagnosticPricing> = result.try_get("data")?;

        self.authorize(user.clone(), "read", pricing.clone())?;

        Ok(pricing)
    }

    #[tracing::instrument(skip(self))]
    async fn update_pricing(
        &self,
        user: User,
        mechanic_id: Uuid,
        draft: PricingDraft,
    ) -> Result<DiagnosticPricing, Error> {
        // nothing reaches storage unless every tier rule holds
        let pricing = admit_pricing(
            &self.authorizor,
            &self.validator,
            user,
            mechanic_id,
            &draft,
        )?;

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO diagnostic_pricing (mechanic_id, data) VALUES ($1, $2)
                 ON CONFLICT (mechanic_id) DO UPDATE SET data = EXCLUDED.data",
            )
            .bind(&pricing.mechanic_id)
            .bind(Json(&pricing)),
        )
        .await?;

        tracing::info!("pricing saved");

        Ok(pricing)
    }

    fn validate_pricing(&self, draft: &PricingDraft) -> PricingErrors {
        self.validator.validate(draft)
    }

    fn preview_payouts(&self, pricing: &DiagnosticPricing) -> Vec<Payout> {
        self.fees.payouts(pricing)
    }
}

#[test]
fn pricing_update_checks_ownership_before_the_draft() {
    let authorizor = authorizor::new().unwrap();
    let validator = PricingValidator::default();

    let mechanic = User::new(Uuid::new_v4(), &["mechanic"]);
    let other_mechanic = User::new(Uuid::new_v4(), &["mechanic"]);
    let below_floor = PricingDraft::new(10.0, 39.0, 50.0);

    let err = admit_pricing(&authorizor, &validator, other_mechanic, mechanic.id, &below_floor)
        .unwrap_err();
    assert!(err.is_unauthorized_error());
    assert_eq!(err.details, None);

    let err = admit_pricing(&authorizor, &validator, mechanic.clone(), mechanic.id, &below_floor)
        .unwrap_err();
    assert!(err.is_validation_error());

    let pricing = admit_pricing(
        &authorizor,
        &validator,
        mechanic.clone(),
        mechanic.id,
        &PricingDraft::new(25.0, 50.0, 75.0),
    )
    .unwrap();
    assert_eq!(pricing.mechanic_id, mechanic.id);
}
