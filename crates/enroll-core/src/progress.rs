//! Caller-owned enrolment progress.
//!
//! The session manager never tracks what has been captured for a citizen.
//! Presentation code keeps an [`EnrollmentProgress`] and records each
//! successful capture into it. A failed capture is simply not recorded, so
//! previously captured units are never erased by a later failure.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use enroll_core::{BodyPart, CapturedUnit, EnrollmentProgress, Eye};
//!
//! let mut progress = EnrollmentProgress::new();
//! progress.record(
//!     BodyPart::Iris(Eye::Left),
//!     CapturedUnit::new(91, "ab".repeat(32), Utc::now()),
//! );
//!
//! assert_eq!(progress.done(), 1);
//! assert_eq!(progress.total(), 13);
//! assert_eq!(progress.percentage(), 8);
//! assert!(!progress.is_complete());
//! ```

use crate::constants::TOTAL_CAPTURE_UNITS;
use crate::types::{BodyPart, QualityGrade};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One successfully captured unit.
///
/// Only the opaque template hash is kept, never the captured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedUnit {
    pub quality: u8,
    pub opaque_hash: String,
    pub captured_at: DateTime<Utc>,
}

impl CapturedUnit {
    pub fn new(quality: u8, opaque_hash: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            quality,
            opaque_hash: opaque_hash.into(),
            captured_at,
        }
    }

    #[must_use]
    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.quality)
    }
}

/// Capture progress of one enrolment: ten fingers, two irises, one face.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentProgress {
    captures: BTreeMap<BodyPart, CapturedUnit>,
}

impl EnrollmentProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful capture, replacing any earlier capture of the
    /// same unit. Other units are left untouched.
    pub fn record(&mut self, part: BodyPart, unit: CapturedUnit) {
        self.captures.insert(part, unit);
    }

    pub fn get(&self, part: BodyPart) -> Option<&CapturedUnit> {
        self.captures.get(&part)
    }

    pub fn is_captured(&self, part: BodyPart) -> bool {
        self.captures.contains_key(&part)
    }

    pub fn fingers_done(&self) -> usize {
        self.count(|part| matches!(part, BodyPart::Finger(_)))
    }

    pub fn irises_done(&self) -> usize {
        self.count(|part| matches!(part, BodyPart::Iris(_)))
    }

    pub fn face_done(&self) -> usize {
        self.count(|part| matches!(part, BodyPart::Face))
    }

    pub fn done(&self) -> usize {
        self.captures.len()
    }

    pub fn total(&self) -> usize {
        TOTAL_CAPTURE_UNITS
    }

    /// Completion percentage, rounded to the nearest integer.
    pub fn percentage(&self) -> u8 {
        let ratio = self.done() as f64 / self.total() as f64;
        (ratio * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.done() == self.total()
    }

    /// Units still to capture, in enrolment order.
    pub fn missing(&self) -> Vec<BodyPart> {
        BodyPart::all()
            .filter(|part| !self.is_captured(*part))
            .collect()
    }

    /// Serializable snapshot for display.
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            fingers: self.fingers_done(),
            irises: self.irises_done(),
            face: self.face_done(),
            done: self.done(),
            total: self.total(),
            percentage: self.percentage(),
            complete: self.is_complete(),
        }
    }

    fn count(&self, predicate: impl Fn(&BodyPart) -> bool) -> usize {
        self.captures.keys().filter(|part| predicate(part)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub fingers: usize,
    pub irises: usize,
    pub face: usize,
    pub done: usize,
    pub total: usize,
    pub percentage: u8,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Eye, Finger};

    fn unit(quality: u8) -> CapturedUnit {
        CapturedUnit::new(quality, "0".repeat(64), Utc::now())
    }

    #[test]
    fn test_empty_progress() {
        let progress = EnrollmentProgress::new();
        assert_eq!(progress.done(), 0);
        assert_eq!(progress.percentage(), 0);
        assert_eq!(progress.missing().len(), 13);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_complete_progress() {
        let mut progress = EnrollmentProgress::new();
        for part in BodyPart::all() {
            progress.record(part, unit(90));
        }

        assert!(progress.is_complete());
        assert_eq!(progress.percentage(), 100);
        assert_eq!(progress.fingers_done(), 10);
        assert_eq!(progress.irises_done(), 2);
        assert_eq!(progress.face_done(), 1);
        assert!(progress.missing().is_empty());
    }

    #[test]
    fn test_recapture_replaces_only_that_unit() {
        let mut progress = EnrollmentProgress::new();
        progress.record(BodyPart::Finger(Finger::LeftThumb), unit(76));
        progress.record(BodyPart::Finger(Finger::LeftIndex), unit(80));
        progress.record(BodyPart::Finger(Finger::LeftThumb), unit(95));

        assert_eq!(progress.done(), 2);
        assert_eq!(
            progress.get(BodyPart::Finger(Finger::LeftThumb)).unwrap().quality,
            95
        );
        assert_eq!(
            progress.get(BodyPart::Finger(Finger::LeftIndex)).unwrap().quality,
            80
        );
    }

    #[test]
    fn test_percentage_rounds() {
        let mut progress = EnrollmentProgress::new();
        progress.record(BodyPart::Face, unit(88));
        progress.record(BodyPart::Iris(Eye::Right), unit(88));
        // 2 / 13 = 15.38%
        assert_eq!(progress.percentage(), 15);
    }

    #[test]
    fn test_summary_and_grade() {
        let mut progress = EnrollmentProgress::new();
        progress.record(BodyPart::Face, unit(88));

        let summary = progress.summary();
        assert_eq!(summary.face, 1);
        assert_eq!(summary.done, 1);
        assert!(!summary.complete);
        assert_eq!(
            progress.get(BodyPart::Face).unwrap().grade(),
            QualityGrade::Good
        );
    }
}
