use oso::{Oso, PolarClass, ToPolar};

use crate::auth::{Mechanic, Platform, User};
use crate::entities::{DiagnosticPricing, Rfq};
use crate::error::{unauthorized_error, Error};

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(User::get_polar_class())?;
    o.register_class(Mechanic::get_polar_class())?;
    o.register_class(DiagnosticPricing::get_polar_class())?;
    o.register_class(Rfq::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

pub fn authorize<Actor, Action, Resource>(
    authorizor: &Oso,
    actor: Actor,
    action: Action,
    resource: Resource,
) -> Result<(), Error>
where
    Actor: ToPolar,
    Action: ToPolar,
    Resource: ToPolar,
{
    if authorizor.is_allowed(actor, action, resource)? {
        return Ok(());
    }

    Err(unauthorized_error())
}

#[cfg(test)]
fn pricing_for(mechanic_id: uuid::Uuid) -> DiagnosticPricing {
    use crate::entities::PricingDraft;
    use crate::pricing::PricingValidator;

    PricingValidator::default()
        .accept(mechanic_id, &PricingDraft::new(25.0, 50.0, 75.0))
        .unwrap()
}

#[test]
fn system_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let system = User::new_system_user();
    let unprivileged = User::new(Uuid::new_v4(), &[]);
    let rfq = Rfq::new(Uuid::new_v4(), "Check engine light".into());

    for action in ["read", "accept_bid", "close", "submit_bid"] {
        let result = authorizor.is_allowed(system.clone(), action, rfq.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(unprivileged.clone(), action, rfq.clone());
        assert_eq!(result.unwrap(), false);
    }

    let result = authorizor.is_allowed(system.clone(), "create_rfq", Platform::default());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn mechanic_pricing_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let mechanic = User::new(Uuid::new_v4(), &["mechanic"]);
    let other_mechanic = User::new(Uuid::new_v4(), &["mechanic"]);
    let customer = User::new(Uuid::new_v4(), &["customer"]);
    let account = Mechanic::new(mechanic.id);
    let pricing = pricing_for(mechanic.id);

    let result = authorizor.is_allowed(mechanic.clone(), "update_pricing", account.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other_mechanic.clone(), "update_pricing", account.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(customer.clone(), "update_pricing", account.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(mechanic.clone(), "update", pricing.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(customer.clone(), "read", pricing.clone());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn rfq_customer_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let customer = User::new(Uuid::new_v4(), &["customer"]);
    let other_customer = User::new(Uuid::new_v4(), &["customer"]);
    let rfq = Rfq::new(customer.id, "Transmission slipping".into());

    let result = authorizor.is_allowed(customer.clone(), "create_rfq", Platform::default());
    assert_eq!(result.unwrap(), true);

    for action in ["read", "review", "accept_bid", "close"] {
        let result = authorizor.is_allowed(customer.clone(), action, rfq.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(other_customer.clone(), action, rfq.clone());
        assert_eq!(result.unwrap(), false);
    }

    let result = authorizor.is_allowed(customer.clone(), "submit_bid", rfq.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn rfq_workshop_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let workshop = User::new(Uuid::new_v4(), &["workshop"]);
    let mut rfq = Rfq::new(Uuid::new_v4(), "Transmission slipping".into());

    // while the rfq is open

    let result = authorizor.is_allowed(workshop.clone(), "read", rfq.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(workshop.clone(), "submit_bid", rfq.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(workshop.clone(), "accept_bid", rfq.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(workshop.clone(), "create_rfq", Platform::default());
    assert_eq!(result.unwrap(), false);

    rfq.close(&mut []).unwrap();

    // after the rfq is closed

    let result = authorizor.is_allowed(workshop.clone(), "read", rfq.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(workshop.clone(), "submit_bid", rfq.clone());
    assert_eq!(result.unwrap(), false);
}
