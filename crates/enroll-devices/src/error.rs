//! Capture error taxonomy.
//!
//! Every expected failure of a capture is returned as a [`CaptureError`]
//! value inside a [`CaptureResult`](crate::types::CaptureResult). Nothing in
//! the session manager panics or unwinds for a missing device, a device that
//! is not connected, or a simulated hardware failure.

use enroll_core::{DeviceId, DeviceKind, DeviceState};

/// Errors that can end a capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// No device of the required class is registered.
    #[error("{kind} not connected: no device registered")]
    NotFound { kind: DeviceKind },

    /// The device is registered but not in the connected state.
    #[error("{kind} not connected")]
    NotReady {
        kind: DeviceKind,
        device: DeviceId,
        state: DeviceState,
    },

    /// The simulated peripheral reported a failed acquisition.
    #[error("{message}")]
    HardwareFailure { kind: DeviceKind, message: String },
}

impl CaptureError {
    /// Create a new not-found error.
    pub fn not_found(kind: DeviceKind) -> Self {
        Self::NotFound { kind }
    }

    /// Create a new not-ready error.
    pub fn not_ready(kind: DeviceKind, device: DeviceId, state: DeviceState) -> Self {
        Self::NotReady {
            kind,
            device,
            state,
        }
    }

    /// Create a new hardware failure with the default operator message for
    /// the device class.
    pub fn hardware_failure(kind: DeviceKind) -> Self {
        Self::HardwareFailure {
            kind,
            message: failure_message(kind).to_string(),
        }
    }

    /// Device class the failed capture was aimed at.
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::NotFound { kind }
            | Self::NotReady { kind, .. }
            | Self::HardwareFailure { kind, .. } => *kind,
        }
    }

    /// Whether pressing "retry" on the same device can succeed without the
    /// operator reconnecting it first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HardwareFailure { .. })
    }
}

/// Operator guidance shown after a failed acquisition.
pub fn failure_message(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::DocumentScanner => "scan failed, retry",
        DeviceKind::FingerprintReader => "insufficient quality, reposition the finger",
        DeviceKind::IrisScanner => "capture failed, make sure the eye is centered",
        DeviceKind::FaceCamera => "face not detected, look at the camera",
    }
}
