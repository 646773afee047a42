//! HTTP plumbing: transport seam and the retrying request engine.

pub mod engine;
pub mod transport;

pub use engine::{BACKOFF_STEP, RequestEngine, RequestOptions, backoff_delay};
pub use transport::{HttpRequest, RawResponse, ReqwestTransport, Transport};
