//! Session configuration.
//!
//! Latency, success rate and quality floor of every simulated operation,
//! plus the device seed of the registry. Every field has a default, so an
//! empty TOML document yields [`SessionConfig::default`].
//!
//! ```toml
//! [connect]
//! latency_ms = 500
//! success_rate = 0.9
//!
//! [fingerprint]
//! latency_ms = 1500
//! success_rate = 0.9
//! min_quality = 75
//!
//! [[devices]]
//! id = "PER-002"
//! kind = "FINGERPRINT_READER"
//! name = "Lecteur CrossMatch Guardian"
//! ```
//!
//! A capture profile table, when present, must be complete.

use chrono::{DateTime, Utc};
use enroll_core::constants::*;
use enroll_core::{DeviceId, DeviceKind, DeviceState, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectProfile {
    pub latency_ms: u64,
    pub success_rate: f64,
}

impl Default for ConnectProfile {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_CONNECT_LATENCY_MS,
            success_rate: DEFAULT_CONNECT_SUCCESS_RATE,
        }
    }
}

impl ConnectProfile {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Simulation parameters of one capture operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureProfile {
    pub latency_ms: u64,
    pub success_rate: f64,

    /// Inclusive lower bound of the quality score; the upper bound is 100
    /// exclusive.
    pub min_quality: u8,
}

impl CaptureProfile {
    pub fn new(latency_ms: u64, success_rate: f64, min_quality: u8) -> Self {
        Self {
            latency_ms,
            success_rate,
            min_quality,
        }
    }

    pub fn document() -> Self {
        Self::new(
            DOCUMENT_SCAN_LATENCY_MS,
            DOCUMENT_SCAN_SUCCESS_RATE,
            DOCUMENT_SCAN_MIN_QUALITY,
        )
    }

    pub fn fingerprint() -> Self {
        Self::new(
            FINGERPRINT_LATENCY_MS,
            FINGERPRINT_SUCCESS_RATE,
            FINGERPRINT_MIN_QUALITY,
        )
    }

    pub fn iris() -> Self {
        Self::new(IRIS_LATENCY_MS, IRIS_SUCCESS_RATE, IRIS_MIN_QUALITY)
    }

    pub fn face() -> Self {
        Self::new(FACE_LATENCY_MS, FACE_SUCCESS_RATE, FACE_MIN_QUALITY)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Registry entry created at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSeed {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub name: String,
    #[serde(default)]
    pub state: DeviceState,
    /// Last synchronisation carried over from a previous session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl DeviceSeed {
    pub fn new(id: DeviceId, kind: DeviceKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            state: DeviceState::Disconnected,
            last_sync: None,
        }
    }

    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_last_sync(mut self, last_sync: DateTime<Utc>) -> Self {
        self.last_sync = Some(last_sync);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub connect: ConnectProfile,

    #[serde(default = "CaptureProfile::document")]
    pub document: CaptureProfile,

    #[serde(default = "CaptureProfile::fingerprint")]
    pub fingerprint: CaptureProfile,

    #[serde(default = "CaptureProfile::iris")]
    pub iris: CaptureProfile,

    #[serde(default = "CaptureProfile::face")]
    pub face: CaptureProfile,

    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceSeed>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect: ConnectProfile::default(),
            document: CaptureProfile::document(),
            fingerprint: CaptureProfile::fingerprint(),
            iris: CaptureProfile::iris(),
            face: CaptureProfile::face(),
            devices: default_devices(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: SessionConfig =
            toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("Cannot serialize: {e}")))
    }

    /// Profile used for captures on devices of `kind`.
    pub fn profile(&self, kind: DeviceKind) -> &CaptureProfile {
        match kind {
            DeviceKind::DocumentScanner => &self.document,
            DeviceKind::FingerprintReader => &self.fingerprint,
            DeviceKind::IrisScanner => &self.iris,
            DeviceKind::FaceCamera => &self.face,
        }
    }

    /// Replace the device seed.
    pub fn with_devices(mut self, devices: Vec<DeviceSeed>) -> Self {
        self.devices = devices;
        self
    }

    /// Drop every simulated latency to zero.
    pub fn without_latency(mut self) -> Self {
        self.connect.latency_ms = 0;
        for profile in [
            &mut self.document,
            &mut self.fingerprint,
            &mut self.iris,
            &mut self.face,
        ] {
            profile.latency_ms = 0;
        }
        self
    }

    /// Check rates, quality floors and device id uniqueness.
    ///
    /// # Errors
    /// - `Error::InvalidSuccessRate` for a rate outside `0.0..=1.0`
    /// - `Error::InvalidMinQuality` for a floor that leaves an empty range
    /// - `Error::DuplicateDevice` for a repeated device id
    /// - `Error::Config` for a device seeded mid-connection
    pub fn validate(&self) -> Result<()> {
        check_rate("connect", self.connect.success_rate)?;

        for kind in DeviceKind::ALL {
            let profile = self.profile(kind);
            check_rate(kind.label(), profile.success_rate)?;
            if profile.min_quality >= MAX_QUALITY_SCORE {
                return Err(Error::InvalidMinQuality {
                    operation: kind.label().to_string(),
                    quality: profile.min_quality,
                });
            }
        }

        let mut seen = HashSet::new();
        for seed in &self.devices {
            if !seen.insert(&seed.id) {
                return Err(Error::DuplicateDevice(seed.id.to_string()));
            }
            if seed.state == DeviceState::Connecting {
                return Err(Error::Config(format!(
                    "device {} cannot start in {}",
                    seed.id, seed.state
                )));
            }
        }

        Ok(())
    }
}

fn check_rate(operation: &str, rate: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(Error::InvalidSuccessRate {
            operation: operation.to_string(),
            rate,
        });
    }
    Ok(())
}

/// Enrolment station peripherals, all disconnected at startup.
pub fn default_devices() -> Vec<DeviceSeed> {
    [
        ("PER-001", DeviceKind::DocumentScanner, "Scanner Fujitsu FI-7160"),
        ("PER-002", DeviceKind::FingerprintReader, "Lecteur CrossMatch Guardian"),
        ("PER-003", DeviceKind::IrisScanner, "IriShield USB MK2120U"),
        ("PER-004", DeviceKind::FaceCamera, "Webcam HD Pro"),
    ]
    .into_iter()
    .filter_map(|(id, kind, name)| {
        DeviceId::new(id)
            .ok()
            .map(|id| DeviceSeed::new(id, kind, name))
    })
    .collect()
}
