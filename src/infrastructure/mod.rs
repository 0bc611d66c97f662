//! Infrastructure layer - external concerns

pub mod http;
pub mod server;

pub use http::{HttpTransport, ReqwestTransport, ReqwestTransportConfig};
pub use server::{cpo_router, emp_router, Endpoint, ServerError, ShutdownCoordinator, ShutdownSignal};
