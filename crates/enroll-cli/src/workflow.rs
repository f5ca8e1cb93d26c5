//! Full enrolment run: connect the station, scan the identity document and
//! capture all thirteen biometric units.
//!
//! Retrying is the caller's job. Each unit is attempted up to `attempts`
//! times; only simulated hardware failures are retried, a device that is
//! missing or not connected ends the attempts for that unit.

use enroll_core::{BodyPart, EnrollmentProgress, ProgressSummary, QualityGrade};
use enroll_devices::{CaptureError, CapturePayload, CaptureResult, SessionManager};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub quality: u8,
    pub grade: QualityGrade,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentReport {
    pub connected: Vec<String>,
    pub unavailable: Vec<String>,
    pub document: Option<UnitReport>,
    pub captures: Vec<UnitReport>,
    pub failures: Vec<String>,
    pub progress: ProgressSummary,
}

/// Connect every registered device, retrying failed connections.
async fn connect_station(manager: &SessionManager, attempts: u32) -> (Vec<String>, Vec<String>) {
    let mut connected = Vec::new();
    let mut unavailable = Vec::new();

    for device in manager.list_devices() {
        let id = device.id.as_str();
        let mut ok = false;
        for attempt in 1..=attempts {
            if manager.connect(id).await {
                ok = true;
                break;
            }
            warn!("{} ({}) connect attempt {} failed", device.display_name, id, attempt);
        }

        if ok {
            connected.push(device.id.to_string());
        } else {
            unavailable.push(device.id.to_string());
        }
    }

    (connected, unavailable)
}

/// Run `capture` until it succeeds, fails for a non-retryable reason, or
/// `attempts` is exhausted.
async fn with_retries<F, Fut>(attempts: u32, mut capture: F) -> (CaptureResult, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CaptureResult>,
{
    let mut attempt = 1;
    loop {
        let result = capture().await;
        match &result {
            Err(error) if error.is_retryable() && attempt < attempts => {
                warn!("Attempt {} failed: {}", attempt, error);
                attempt += 1;
            }
            _ => return (result, attempt),
        }
    }
}

fn unit_report(unit: String, payload: &CapturePayload, attempts: u32) -> UnitReport {
    UnitReport {
        unit,
        quality: payload.quality_score,
        grade: payload.grade(),
        attempts,
    }
}

fn failure(unit: impl std::fmt::Display, error: &CaptureError) -> String {
    format!("{unit}: {error}")
}

pub async fn run_enrollment(manager: &SessionManager, attempts: u32) -> EnrollmentReport {
    let attempts = attempts.max(1);
    let (connected, unavailable) = connect_station(manager, attempts).await;
    let mut failures = Vec::new();

    let (result, used) = with_retries(attempts, || manager.scan_document()).await;
    let document = match result {
        Ok(payload) => Some(unit_report("document".to_string(), &payload, used)),
        Err(error) => {
            failures.push(failure("document", &error));
            None
        }
    };

    let mut progress = EnrollmentProgress::new();
    let mut captures = Vec::new();
    for part in BodyPart::all() {
        let (result, used) = with_retries(attempts, || manager.capture(part)).await;
        match result {
            Ok(payload) => {
                captures.push(unit_report(part.to_string(), &payload, used));
                progress.record(part, payload.into_unit());
            }
            Err(error) => failures.push(failure(part, &error)),
        }
    }

    info!(
        "Enrolment captured {}/{} units",
        progress.done(),
        progress.total()
    );

    EnrollmentReport {
        connected,
        unavailable,
        document,
        captures,
        failures,
        progress: progress.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enroll_devices::SessionConfig;
    use enroll_devices::random::{FixedRandom, RandomSource, ScriptedRandom};

    fn manager(random: impl RandomSource + 'static) -> SessionManager {
        SessionManager::builder()
            .config(SessionConfig::default().without_latency())
            .random_source(random)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_enrollment_succeeds() {
        let report = run_enrollment(&manager(FixedRandom::always_succeed()), 3).await;

        assert_eq!(report.connected.len(), 4);
        assert!(report.unavailable.is_empty());
        assert!(report.document.is_some());
        assert_eq!(report.captures.len(), 13);
        assert!(report.failures.is_empty());
        assert!(report.progress.complete);
        assert!(report.captures.iter().all(|c| c.attempts == 1));
    }

    #[tokio::test]
    async fn test_unavailable_station_fails_without_retrying() {
        let report = run_enrollment(&manager(FixedRandom::always_fail()), 3).await;

        assert!(report.connected.is_empty());
        assert_eq!(report.unavailable.len(), 4);
        assert_eq!(report.failures.len(), 14);
        assert_eq!(report.progress.done, 0);
        assert!(report.failures[0].contains("document scanner not connected"));
    }

    #[tokio::test]
    async fn test_hardware_failures_are_retried() {
        // four connects, document fails once then succeeds
        let random = ScriptedRandom::new([0.99, 0.99, 0.99, 0.99, 0.0, 0.99]);
        let report = run_enrollment(&manager(random), 3).await;

        let document = report.document.unwrap();
        assert_eq!(document.attempts, 2);
        assert!(report.progress.complete);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let random = ScriptedRandom::new([0.99, 0.99, 0.99, 0.99, 0.0]);
        let report = run_enrollment(&manager(random), 2).await;

        assert!(report.document.is_none());
        assert_eq!(report.failures.len(), 14);
        assert!(report.failures.iter().all(|f| !f.is_empty()));
    }
}
