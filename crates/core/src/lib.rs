//! Core business logic for enrol-rs.
//!
//! - [`enrol`]: enrolment methods, their registry and the self-enrolment
//!   policy evaluator
//! - [`services`]: the operations behind the HTTP endpoints
//! - [`context`]: the per-request context threaded through both

pub mod context;
pub mod enrol;
pub mod services;

pub use context::RequestContext;
pub use enrol::{EnrolMethod, EnrolRegistry, EnrolmentStore, ManualEnrolMethod, SelfEnrolMethod};
pub use services::*;
