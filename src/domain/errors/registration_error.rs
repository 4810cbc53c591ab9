use thiserror::Error;

/// Raised synchronously when subscribing a handler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Exactly one handler per event name; the first registration wins.
    #[error("a handler is already registered for `{name}`")]
    DuplicateHandler { name: String },

    #[error("`{name}` is not a known event handler name")]
    UnknownEvent { name: String },
}
