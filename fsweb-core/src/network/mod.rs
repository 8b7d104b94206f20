pub mod client;
pub mod transport;

pub use client::{DEFAULT_BASE_URL, RequestClient};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
