pub mod authorizor;
mod mechanic;
mod platform;
mod user;

pub use mechanic::Mechanic;
pub use platform::Platform;
pub use user::User;
