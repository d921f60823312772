//! Request classification and forwarding.
//!
//! # Data Flow
//! ```text
//! buffered request (method, path, content type, body bytes)
//!     → classifier.rs (pick one of three strategies)
//!     → sparql.rs (query= codec, form strategy only)
//!     → forward.rs (build + send outbound request)
//!     → relayed response or ProxyError
//! ```
//!
//! # Design Decisions
//! - Strategies are a closed enum selected once per request, not a
//!   trait hierarchy
//! - Forwarders never touch the transport stream; they operate on the
//!   bytes buffered by the handler
//! - No retries: an outbound failure is final for the request

pub mod classifier;
pub mod forward;
pub mod sparql;

pub use classifier::{classify, Strategy};
pub use forward::Forwarder;
