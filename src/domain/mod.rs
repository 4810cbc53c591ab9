//! Domain layer with resource records, error taxonomy and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{AuthToken, User};
pub use errors::{HttpError, RegistrationError};
pub use ports::HttpBackend;
