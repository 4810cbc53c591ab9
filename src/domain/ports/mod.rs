mod http_backend;

pub use http_backend::{HttpBackend, HttpMethod, HttpRequest, HttpResponse};
