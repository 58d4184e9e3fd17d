//! Fetch Module
//!
//! Network access for the cache layer: the transport seam, cancellation
//! signals, and the retrying executor.

mod executor;
mod signal;
mod transport;

pub use executor::{FetchExecutor, RetryPolicy, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY};
pub use signal::{AbortController, AbortSignal};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError, DEFAULT_USER_AGENT};
