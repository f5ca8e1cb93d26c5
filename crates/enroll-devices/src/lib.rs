//! Capture peripheral session management for biometric enrolment stations.
//!
//! This crate owns the registry of capture peripherals attached to an
//! enrolment station (document scanner, fingerprint reader, iris scanner,
//! face camera), drives their connection state and runs captures against
//! them. Peripherals are simulated: latency, success and quality come from
//! the [`SessionConfig`] and an injectable [`RandomSource`].
//!
//! # Design Philosophy
//!
//! - **Explicit instance**: a [`SessionManager`] is built and passed to its
//!   callers. There is no process-wide manager.
//! - **Errors as values**: a missing device, a device that is not connected
//!   and a failed acquisition are all returned as [`CaptureError`] values
//!   inside a [`CaptureResult`]. `connect` reports failure as `false`.
//! - **Per-device serialization**: operations on one device queue behind
//!   each other; different devices never wait on one another.
//! - **Deterministic under test**: every random draw goes through the
//!   injected [`RandomSource`].
//!
//! # Capturing
//!
//! ```
//! use enroll_devices::{SessionConfig, SessionManager};
//! use enroll_devices::random::ScriptedRandom;
//! use enroll_core::QualityGrade;
//!
//! #[tokio::main]
//! async fn main() -> enroll_core::Result<()> {
//!     // connect succeeds, scan succeeds, quality draw lands on 82
//!     let manager = SessionManager::builder()
//!         .config(SessionConfig::default().without_latency())
//!         .random_source(ScriptedRandom::new([0.95, 0.5, 0.41]))
//!         .build()?;
//!
//!     let subscription = manager.subscribe("PER-001", |status| {
//!         println!("scanner ready: {}", status.ready);
//!     });
//!
//!     assert!(manager.connect("PER-001").await);
//!
//!     match manager.scan_document().await {
//!         Ok(payload) => assert_eq!(payload.grade(), QualityGrade::Good),
//!         Err(error) => eprintln!("{error}"),
//!     }
//!
//!     subscription.unsubscribe();
//!     Ok(())
//! }
//! ```
//!
//! [`RandomSource`]: random::RandomSource

pub mod config;
pub mod error;
pub mod listeners;
pub mod manager;
pub mod random;
mod registry;
pub mod types;

pub use config::{CaptureProfile, ConnectProfile, DeviceSeed, SessionConfig, default_devices};
pub use error::CaptureError;
pub use listeners::Subscription;
pub use manager::{SessionManager, SessionManagerBuilder};
pub use types::{CapturePayload, CaptureReport, CaptureResult, Device, DeviceStatus};
