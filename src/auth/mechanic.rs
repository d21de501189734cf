use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mechanic's account, the resource guarding their price list before any
/// price has been accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mechanic {
    pub id: Uuid,
}

impl Mechanic {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

impl PolarClass for Mechanic {
    fn get_polar_class_builder() -> oso::ClassBuilder<Mechanic> {
        oso::Class::builder()
            .name("Mechanic")
            .add_attribute_getter("id", |recv: &Mechanic| recv.id.clone())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Mechanic::get_polar_class_builder();
        builder.build()
    }
}
