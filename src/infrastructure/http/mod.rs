//! Outbound HTTP to the hub

mod reqwest_transport;
mod transport;

pub use reqwest_transport::{ReqwestTransport, ReqwestTransportConfig};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError, TransportResult};
