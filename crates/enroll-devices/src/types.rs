//! Values handed out by the session manager.
//!
//! Everything here is a snapshot: callers receive copies and never hold a
//! live reference into the registry.

use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use enroll_core::{CapturedUnit, DeviceId, DeviceKind, DeviceState, QualityGrade};
use serde::{Deserialize, Serialize};

/// Message reported by [`DeviceStatus`] for an id that is not registered.
pub const DEVICE_NOT_FOUND: &str = "device not found";

/// Message reported by [`DeviceStatus`] for a device in the error state.
pub const DEVICE_ERROR: &str = "device error";

/// Outcome of one capture attempt.
pub type CaptureResult = std::result::Result<CapturePayload, CaptureError>;

/// Snapshot of a registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub display_name: String,
    pub state: DeviceState,

    /// Time of the last state transition, `None` until the first one.
    pub last_sync: Option<DateTime<Utc>>,
}

impl Device {
    pub fn new(id: DeviceId, kind: DeviceKind, display_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            display_name: display_name.into(),
            state: DeviceState::default(),
            last_sync: None,
        }
    }

    /// Set the initial state.
    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    pub fn is_capture_eligible(&self) -> bool {
        self.state.is_capture_eligible()
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::from_state(self.state)
    }
}

/// Connectivity summary pushed to listeners and returned by
/// [`SessionManager::get_status`](crate::SessionManager::get_status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub connected: bool,

    /// Capture-eligible. Always equal to `connected`.
    pub ready: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// `None` for an unknown device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DeviceState>,
}

impl DeviceStatus {
    pub fn from_state(state: DeviceState) -> Self {
        let connected = state.is_capture_eligible();
        Self {
            connected,
            ready: connected,
            error_message: (state == DeviceState::Error).then(|| DEVICE_ERROR.to_string()),
            state: Some(state),
        }
    }

    pub fn not_found() -> Self {
        Self {
            connected: false,
            ready: false,
            error_message: Some(DEVICE_NOT_FOUND.to_string()),
            state: None,
        }
    }
}

/// Data produced by a successful capture.
///
/// Only an opaque hash standing in for the biometric template is carried,
/// never the captured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePayload {
    pub opaque_hash: String,

    /// Quality score in `[min_quality, 100)` of the capturing profile.
    pub quality_score: u8,

    pub captured_at: DateTime<Utc>,
}

impl CapturePayload {
    pub fn new(opaque_hash: impl Into<String>, quality_score: u8, captured_at: DateTime<Utc>) -> Self {
        Self {
            opaque_hash: opaque_hash.into(),
            quality_score,
            captured_at,
        }
    }

    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.quality_score)
    }

    /// Convert into a unit for caller-owned enrolment progress.
    pub fn into_unit(self) -> CapturedUnit {
        CapturedUnit::new(self.quality_score, self.opaque_hash, self.captured_at)
    }
}

/// Flat, serializable view of a [`CaptureResult`] for presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReport {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<CapturePayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&CaptureResult> for CaptureReport {
    fn from(result: &CaptureResult) -> Self {
        match result {
            Ok(payload) => Self {
                success: true,
                payload: Some(payload.clone()),
                error_message: None,
            },
            Err(error) => Self {
                success: false,
                payload: None,
                error_message: Some(error.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_states() {
        let connected = DeviceStatus::from_state(DeviceState::Connected);
        assert!(connected.connected && connected.ready);
        assert_eq!(connected.error_message, None);

        let connecting = DeviceStatus::from_state(DeviceState::Connecting);
        assert!(!connecting.connected && !connecting.ready);

        let error = DeviceStatus::from_state(DeviceState::Error);
        assert!(!error.ready);
        assert_eq!(error.error_message.as_deref(), Some(DEVICE_ERROR));
    }

    #[test]
    fn test_status_not_found() {
        let status = DeviceStatus::not_found();
        assert!(!status.connected && !status.ready);
        assert_eq!(status.error_message.as_deref(), Some("device not found"));
        assert_eq!(status.state, None);
    }

    #[test]
    fn test_device_snapshot_defaults() {
        let device = Device::new(
            DeviceId::new("PER-003").unwrap(),
            DeviceKind::IrisScanner,
            "IriShield USB MK2120U",
        );
        assert_eq!(device.state, DeviceState::Disconnected);
        assert_eq!(device.last_sync, None);
        assert!(!device.is_capture_eligible());
        assert!(device.with_state(DeviceState::Connected).is_capture_eligible());
    }

    #[test]
    fn test_capture_report_success() {
        let result: CaptureResult = Ok(CapturePayload::new("ab".repeat(32), 82, Utc::now()));
        let report = CaptureReport::from(&result);

        assert!(report.success);
        assert_eq!(report.payload.as_ref().unwrap().quality_score, 82);
        assert_eq!(report.payload.as_ref().unwrap().grade(), QualityGrade::Good);
        assert_eq!(report.error_message, None);
    }

    #[test]
    fn test_capture_report_failure_serialization() {
        let result: CaptureResult = Err(CaptureError::hardware_failure(DeviceKind::FaceCamera));
        let report = CaptureReport::from(&result);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_message"], "face not detected, look at the camera");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_payload_into_unit() {
        let payload = CapturePayload::new("cd".repeat(32), 91, Utc::now());
        let unit = payload.clone().into_unit();
        assert_eq!(unit.quality, 91);
        assert_eq!(unit.opaque_hash, payload.opaque_hash);
    }
}
