//! Authorization gate.
//!
//! # Data Flow
//! ```text
//! inbound headers
//!     → gate.rs (extract Authorization header)
//!     → authorizer.rs (exchange credential for a data address)
//!     → BackendTarget (resolved base URL, never optional)
//! ```
//!
//! # Design Decisions
//! - The authorization exchange is a single injected trait object; tests
//!   substitute it without any HTTP involved
//! - A missing header fails before the collaborator is called
//! - Collaborator rejection and collaborator outage both surface as 403

pub mod authorizer;
pub mod gate;
pub mod remote;

pub use authorizer::{AuthFailure, Authorizer, DataAddress, BASE_URL_PROPERTY, EDC_NAMESPACE};
pub use gate::{authorize_request, BackendTarget};
pub use remote::RemoteAuthorizer;
