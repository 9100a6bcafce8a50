pub mod registration;

pub use registration::{RegistrationResponse, aliases, form};
