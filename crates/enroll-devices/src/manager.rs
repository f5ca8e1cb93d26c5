//! Device session manager.
//!
//! This module provides the [`SessionManager`], which owns the registry of
//! capture peripherals, drives their connection state machine and runs
//! captures against connected devices.
//!
//! # Architecture
//!
//! Each registered device has its own operation lock. Operations on the same
//! device queue behind each other; operations on different devices run
//! concurrently without interacting. State changes and listener
//! notifications happen while the lock is held, so listeners of one device
//! observe transitions in the order they were applied.
//!
//! ```text
//!  connect ──┐      ┌──────────────┐
//!  capture ──┼─────►│ PER-001 lock │──► state ──► listeners
//!  disconnect┘      └──────────────┘
//!
//!  connect ──┐      ┌──────────────┐
//!  capture ──┼─────►│ PER-002 lock │──► state ──► listeners
//!            ┘      └──────────────┘
//! ```
//!
//! Simulated latency is the only suspension point of every operation.
//!
//! # Examples
//!
//! ```
//! use enroll_devices::{SessionConfig, SessionManager};
//! use enroll_devices::random::FixedRandom;
//! use enroll_core::DeviceKind;
//!
//! #[tokio::main]
//! async fn main() -> enroll_core::Result<()> {
//!     let manager = SessionManager::builder()
//!         .config(SessionConfig::default().without_latency())
//!         .random_source(FixedRandom::always_succeed())
//!         .build()?;
//!
//!     let scanner = manager.get_device_by_kind(DeviceKind::DocumentScanner).unwrap();
//!     assert!(manager.connect(scanner.id.as_str()).await);
//!
//!     let payload = manager.scan_document().await.unwrap();
//!     assert!(payload.quality_score >= 70);
//!     Ok(())
//! }
//! ```

use crate::config::SessionConfig;
use crate::error::CaptureError;
use crate::listeners::{ListenerRegistry, Subscription};
use crate::random::{self, RandomSource, SystemRandom};
use crate::registry::{DeviceSlot, Registry};
use crate::types::{CapturePayload, CaptureResult, Device, DeviceStatus};
use chrono::Utc;
use enroll_core::{BodyPart, DeviceKind, DeviceState, Eye, Finger, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owner of the device registry and mediator of every device operation.
///
/// Create one instance per station and hand it to callers; tests build
/// isolated instances with a deterministic [`RandomSource`].
pub struct SessionManager {
    registry: Registry,
    listeners: ListenerRegistry,
    random: Arc<dyn RandomSource>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a manager with an OS-seeded random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }

    /// Snapshot of every device, in registry order.
    pub fn list_devices(&self) -> Vec<Device> {
        self.registry.iter().map(DeviceSlot::snapshot).collect()
    }

    pub fn get_device(&self, device_id: &str) -> Option<Device> {
        self.registry.get(device_id).map(DeviceSlot::snapshot)
    }

    /// First device of `kind` in registry order, or `None` if no such
    /// device is registered.
    pub fn get_device_by_kind(&self, kind: DeviceKind) -> Option<Device> {
        self.registry.first_of_kind(kind).map(DeviceSlot::snapshot)
    }

    /// Connectivity of `device_id`. Unknown ids report
    /// [`DeviceStatus::not_found`].
    pub fn get_status(&self, device_id: &str) -> DeviceStatus {
        self.registry
            .get(device_id)
            .map_or_else(DeviceStatus::not_found, |slot| {
                DeviceStatus::from_state(slot.state())
            })
    }

    /// Register a listener for state changes of `device_id`.
    ///
    /// The listener is not called with the current state, only with later
    /// transitions. Every listener of a device has run before the operation
    /// that caused the transition completes. Subscribing to an unknown id is
    /// allowed; such a listener never fires.
    pub fn subscribe<F>(&self, device_id: &str, callback: F) -> Subscription
    where
        F: Fn(&DeviceStatus) + Send + Sync + 'static,
    {
        self.listeners.subscribe(device_id, callback)
    }

    /// Number of listeners registered for `device_id`.
    pub fn listener_count(&self, device_id: &str) -> usize {
        self.listeners.listener_count(device_id)
    }

    /// Connect `device_id`.
    ///
    /// Moves the device to `CONNECTING`, waits for the simulated latency and
    /// settles on `CONNECTED` or `ERROR`. Returns whether the connection
    /// succeeded; unknown ids return `false` without any notification.
    ///
    /// If the returned future is dropped while connecting, the device is
    /// moved to `ERROR` and listeners are notified.
    pub async fn connect(&self, device_id: &str) -> bool {
        let Some(slot) = self.registry.get(device_id) else {
            debug!("Connect requested for unknown device {}", device_id);
            return false;
        };

        let _op = slot.acquire().await;

        // armed before CONNECTING is published, so a panicking listener
        // still leaves the device in ERROR
        let pending = PendingConnect {
            manager: self,
            slot,
            settled: false,
        };
        self.transition(slot, DeviceState::Connecting);

        tokio::time::sleep(self.config.connect.latency()).await;

        let success = random::draw_success(self.random.as_ref(), self.config.connect.success_rate);
        pending.settle(if success {
            DeviceState::Connected
        } else {
            DeviceState::Error
        });

        if !success {
            warn!("Connection to {} failed", slot.id);
        }
        success
    }

    /// Disconnect `device_id`. Immediate, always succeeds, and a no-op for
    /// unknown ids.
    pub async fn disconnect(&self, device_id: &str) {
        let Some(slot) = self.registry.get(device_id) else {
            debug!("Disconnect requested for unknown device {}", device_id);
            return;
        };

        let _op = slot.acquire().await;
        self.transition(slot, DeviceState::Disconnected);
    }

    /// Scan an identity document on the document scanner.
    pub async fn scan_document(&self) -> CaptureResult {
        self.capture_with(DeviceKind::DocumentScanner, "document")
            .await
    }

    /// Capture one finger on the fingerprint reader.
    pub async fn capture_fingerprint(&self, finger: Finger) -> CaptureResult {
        self.capture_with(DeviceKind::FingerprintReader, finger.as_str())
            .await
    }

    /// Capture one eye on the iris scanner.
    pub async fn capture_iris(&self, eye: Eye) -> CaptureResult {
        let target = match eye {
            Eye::Left => "LEFT_IRIS",
            Eye::Right => "RIGHT_IRIS",
        };
        self.capture_with(DeviceKind::IrisScanner, target).await
    }

    /// Capture the face on the face camera.
    pub async fn capture_face(&self) -> CaptureResult {
        self.capture_with(DeviceKind::FaceCamera, "FACE").await
    }

    /// Capture any enrolment unit on the device class that handles it.
    pub async fn capture(&self, part: BodyPart) -> CaptureResult {
        match part {
            BodyPart::Finger(finger) => self.capture_fingerprint(finger).await,
            BodyPart::Iris(eye) => self.capture_iris(eye).await,
            BodyPart::Face => self.capture_face().await,
        }
    }

    /// Run one capture against the first device of `kind`.
    ///
    /// A device that is not connected fails immediately, without waiting for
    /// an operation already holding the device. Readiness is checked again
    /// once the device is held. Captures never change device state.
    async fn capture_with(&self, kind: DeviceKind, target: &str) -> CaptureResult {
        let slot = self
            .registry
            .first_of_kind(kind)
            .ok_or_else(|| CaptureError::not_found(kind))?;

        ensure_ready(slot)?;
        let _op = slot.acquire().await;
        ensure_ready(slot)?;

        let profile = self.config.profile(kind);
        debug!("Capturing {} on {}", target, slot.id);

        tokio::time::sleep(profile.latency()).await;

        if !random::draw_success(self.random.as_ref(), profile.success_rate) {
            warn!("Capture of {} on {} failed", target, slot.id);
            return Err(CaptureError::hardware_failure(kind));
        }

        let quality = random::draw_quality(self.random.as_ref(), profile.min_quality);
        debug!("Captured {} on {} with quality {}", target, slot.id, quality);

        Ok(CapturePayload::new(opaque_hash(), quality, Utc::now()))
    }

    /// Apply a transition and notify listeners. Caller holds the slot's
    /// operation lock.
    fn transition(&self, slot: &DeviceSlot, next: DeviceState) {
        let (previous, status) = slot.apply(next);
        info!("Device {} state {} -> {}", slot.id, previous, next);
        self.listeners.notify(slot.id.as_str(), &status);
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("devices", &self.registry.len())
            .field("listeners", &self.listeners)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn ensure_ready(slot: &DeviceSlot) -> std::result::Result<(), CaptureError> {
    let state = slot.state();
    if state.is_capture_eligible() {
        Ok(())
    } else {
        Err(CaptureError::not_ready(slot.kind, slot.id.clone(), state))
    }
}

/// Placeholder for a biometric template digest: 64 lowercase hex chars.
fn opaque_hash() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// A connect holding its device that has not yet settled.
///
/// Dropping it unsettled moves the device to `ERROR`.
struct PendingConnect<'a> {
    manager: &'a SessionManager,
    slot: &'a DeviceSlot,
    settled: bool,
}

impl PendingConnect<'_> {
    fn settle(mut self, state: DeviceState) {
        self.settled = true;
        self.manager.transition(self.slot, state);
    }
}

impl Drop for PendingConnect<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Connect to {} cancelled", self.slot.id);
            self.manager.transition(self.slot, DeviceState::Error);
        }
    }
}

/// Builder for [`SessionManager`].
#[derive(Default)]
pub struct SessionManagerBuilder {
    config: Option<SessionConfig>,
    random: Option<Arc<dyn RandomSource>>,
}

impl SessionManagerBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = Some(Arc::new(source));
        self
    }

    /// Share one random source between several managers or with the test
    /// that scripts it.
    pub fn shared_random_source(mut self, source: Arc<dyn RandomSource>) -> Self {
        self.random = Some(source);
        self
    }

    /// Validate the configuration and seed the registry.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid rates or quality floors and for duplicate
    /// device ids.
    pub fn build(self) -> Result<SessionManager> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = Registry::from_seeds(&config.devices)?;
        info!("Session manager ready with {} devices", registry.len());

        Ok(SessionManager {
            registry,
            listeners: ListenerRegistry::new(),
            random: self
                .random
                .unwrap_or_else(|| Arc::new(SystemRandom::new())),
            config,
        })
    }
}
