//! Shared vocabulary for the enrolment capture stack.
//!
//! Identifiers, device kinds and states, body-part identifiers, the quality
//! grade table and the caller-owned enrolment progress tracker live here so
//! that the session manager and its callers agree on one set of types.

pub mod constants;
pub mod error;
pub mod progress;
pub mod types;

pub use error::{Error, Result};
pub use progress::{CapturedUnit, EnrollmentProgress, ProgressSummary};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
