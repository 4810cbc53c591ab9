//! Domain error types.

mod http_error;
mod registration_error;

pub use http_error::HttpError;
pub use registration_error::RegistrationError;
