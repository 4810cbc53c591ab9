//! REST transport.

mod backend;
mod transport;

pub use backend::ReqwestBackend;
pub use transport::{HttpClient, RATE_LIMIT_REMAINING_HEADER, RateLimitState};
