use crate::{
    Result,
    constants::{GRADE_ACCEPTABLE_MIN, GRADE_EXCELLENT_MIN, GRADE_GOOD_MIN},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a registered device (e.g. `PER-001`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new device ID with validation.
    ///
    /// The identifier is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDeviceId` if the trimmed identifier is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let id = id.trim();

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidDeviceId(format!("{id:?}")));
        }

        Ok(DeviceId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DeviceId::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Class of capture peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceKind {
    DocumentScanner,
    FingerprintReader,
    IrisScanner,
    FaceCamera,
}

impl DeviceKind {
    /// Every kind, in enrolment order.
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::DocumentScanner,
        DeviceKind::FingerprintReader,
        DeviceKind::IrisScanner,
        DeviceKind::FaceCamera,
    ];

    /// Human-readable device class, used in operator-facing messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::DocumentScanner => "document scanner",
            Self::FingerprintReader => "fingerprint reader",
            Self::IrisScanner => "iris scanner",
            Self::FaceCamera => "face camera",
        }
    }

    /// Wire name, as used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentScanner => "DOCUMENT_SCANNER",
            Self::FingerprintReader => "FINGERPRINT_READER",
            Self::IrisScanner => "IRIS_SCANNER",
            Self::FaceCamera => "FACE_CAMERA",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::UnknownDeviceKind(s.to_string()))
    }
}

/// Connection state of a device.
///
/// # Transitions
///
/// ```text
/// DISCONNECTED ──connect──► CONNECTING ──► CONNECTED
///      ▲                        │
///      │                        └────────► ERROR
///      └──────── disconnect (from any state)
/// ```
///
/// A connect attempt may start from any state but always passes through
/// `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl DeviceState {
    /// A device accepts captures if and only if it is connected.
    #[must_use]
    pub fn is_capture_eligible(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(&self, next: DeviceState) -> bool {
        match next {
            Self::Connecting | Self::Disconnected => true,
            Self::Connected | Self::Error => matches!(self, Self::Connecting),
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Hand {
    Left,
    Right,
}

/// One of the ten fingers captured during enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Finger {
    LeftThumb,
    LeftIndex,
    LeftMiddle,
    LeftRing,
    LeftLittle,
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightLittle,
}

impl Finger {
    /// Capture order: left hand thumb to little finger, then right hand.
    pub const ALL: [Finger; 10] = [
        Finger::LeftThumb,
        Finger::LeftIndex,
        Finger::LeftMiddle,
        Finger::LeftRing,
        Finger::LeftLittle,
        Finger::RightThumb,
        Finger::RightIndex,
        Finger::RightMiddle,
        Finger::RightRing,
        Finger::RightLittle,
    ];

    #[must_use]
    pub fn hand(&self) -> Hand {
        match self {
            Self::LeftThumb | Self::LeftIndex | Self::LeftMiddle | Self::LeftRing | Self::LeftLittle => {
                Hand::Left
            }
            _ => Hand::Right,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftThumb => "LEFT_THUMB",
            Self::LeftIndex => "LEFT_INDEX",
            Self::LeftMiddle => "LEFT_MIDDLE",
            Self::LeftRing => "LEFT_RING",
            Self::LeftLittle => "LEFT_LITTLE",
            Self::RightThumb => "RIGHT_THUMB",
            Self::RightIndex => "RIGHT_INDEX",
            Self::RightMiddle => "RIGHT_MIDDLE",
            Self::RightRing => "RIGHT_RING",
            Self::RightLittle => "RIGHT_LITTLE",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const ALL: [Eye; 2] = [Eye::Left, Eye::Right];
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Left => f.write_str("LEFT"),
            Self::Right => f.write_str("RIGHT"),
        }
    }
}

/// A single biometric capture unit of an enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Finger(Finger),
    Iris(Eye),
    Face,
}

impl BodyPart {
    /// All thirteen capture units in enrolment order.
    pub fn all() -> impl Iterator<Item = BodyPart> {
        Finger::ALL
            .into_iter()
            .map(BodyPart::Finger)
            .chain(Eye::ALL.into_iter().map(BodyPart::Iris))
            .chain(std::iter::once(BodyPart::Face))
    }

    /// Device class that captures this unit.
    #[must_use]
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            Self::Finger(_) => DeviceKind::FingerprintReader,
            Self::Iris(_) => DeviceKind::IrisScanner,
            Self::Face => DeviceKind::FaceCamera,
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Finger(finger) => write!(f, "finger {finger}"),
            Self::Iris(eye) => write!(f, "iris {eye}"),
            Self::Face => f.write_str("face"),
        }
    }
}

/// Operator-facing quality label for a capture score.
///
/// | Score   | Grade          |
/// |---------|----------------|
/// | >= 90   | `EXCELLENTE`   |
/// | >= 75   | `BONNE`        |
/// | >= 60   | `ACCEPTABLE`   |
/// | below   | `INSUFFISANTE` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityGrade {
    #[serde(rename = "INSUFFISANTE")]
    Insufficient,
    #[serde(rename = "ACCEPTABLE")]
    Acceptable,
    #[serde(rename = "BONNE")]
    Good,
    #[serde(rename = "EXCELLENTE")]
    Excellent,
}

impl QualityGrade {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= GRADE_EXCELLENT_MIN {
            Self::Excellent
        } else if score >= GRADE_GOOD_MIN {
            Self::Good
        } else if score >= GRADE_ACCEPTABLE_MIN {
            Self::Acceptable
        } else {
            Self::Insufficient
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENTE",
            Self::Good => "BONNE",
            Self::Acceptable => "ACCEPTABLE",
            Self::Insufficient => "INSUFFISANTE",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_device_id_trims() {
        let id = DeviceId::new("  PER-001 ").unwrap();
        assert_eq!(id.as_str(), "PER-001");
        assert_eq!(id.to_string(), "PER-001");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("PER 001")]
    fn test_device_id_invalid(#[case] raw: &str) {
        assert!(matches!(DeviceId::new(raw), Err(Error::InvalidDeviceId(_))));
    }

    #[test]
    fn test_device_id_serde_validates() {
        let id: DeviceId = serde_json::from_str("\"PER-002\"").unwrap();
        assert_eq!(id.as_str(), "PER-002");
        assert!(serde_json::from_str::<DeviceId>("\"\"").is_err());
    }

    #[rstest]
    #[case("DOCUMENT_SCANNER", DeviceKind::DocumentScanner)]
    #[case("fingerprint-reader", DeviceKind::FingerprintReader)]
    #[case("iris scanner", DeviceKind::IrisScanner)]
    #[case("Face_Camera", DeviceKind::FaceCamera)]
    fn test_device_kind_from_str(#[case] raw: &str, #[case] expected: DeviceKind) {
        assert_eq!(raw.parse::<DeviceKind>().unwrap(), expected);
    }

    #[test]
    fn test_device_kind_unknown() {
        assert!(matches!(
            "printer".parse::<DeviceKind>(),
            Err(Error::UnknownDeviceKind(_))
        ));
    }

    #[test]
    fn test_device_kind_serde_name() {
        let json = serde_json::to_string(&DeviceKind::IrisScanner).unwrap();
        assert_eq!(json, "\"IRIS_SCANNER\"");
    }

    #[test]
    fn test_only_connected_is_capture_eligible() {
        assert!(DeviceState::Connected.is_capture_eligible());
        assert!(!DeviceState::Disconnected.is_capture_eligible());
        assert!(!DeviceState::Connecting.is_capture_eligible());
        assert!(!DeviceState::Error.is_capture_eligible());
    }

    #[rstest]
    #[case(DeviceState::Disconnected, DeviceState::Connecting, true)]
    #[case(DeviceState::Connecting, DeviceState::Connected, true)]
    #[case(DeviceState::Connecting, DeviceState::Error, true)]
    #[case(DeviceState::Connected, DeviceState::Disconnected, true)]
    #[case(DeviceState::Error, DeviceState::Connecting, true)]
    #[case(DeviceState::Disconnected, DeviceState::Connected, false)]
    #[case(DeviceState::Disconnected, DeviceState::Error, false)]
    #[case(DeviceState::Connected, DeviceState::Error, false)]
    fn test_state_transitions(
        #[case] from: DeviceState,
        #[case] to: DeviceState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_body_parts_cover_all_units() {
        let parts: Vec<_> = BodyPart::all().collect();
        assert_eq!(parts.len(), crate::constants::TOTAL_CAPTURE_UNITS);
        assert_eq!(parts[0], BodyPart::Finger(Finger::LeftThumb));
        assert_eq!(parts[12], BodyPart::Face);
    }

    #[test]
    fn test_finger_hands() {
        let left = Finger::ALL.iter().filter(|f| f.hand() == Hand::Left).count();
        assert_eq!(left, 5);
    }

    #[rstest]
    #[case(100, QualityGrade::Excellent)]
    #[case(90, QualityGrade::Excellent)]
    #[case(89, QualityGrade::Good)]
    #[case(82, QualityGrade::Good)]
    #[case(75, QualityGrade::Good)]
    #[case(74, QualityGrade::Acceptable)]
    #[case(60, QualityGrade::Acceptable)]
    #[case(59, QualityGrade::Insufficient)]
    #[case(0, QualityGrade::Insufficient)]
    fn test_quality_grade_thresholds(#[case] score: u8, #[case] expected: QualityGrade) {
        assert_eq!(QualityGrade::from_score(score), expected);
    }

    #[test]
    fn test_quality_grade_labels() {
        assert_eq!(QualityGrade::Good.to_string(), "BONNE");
        let json = serde_json::to_string(&QualityGrade::Excellent).unwrap();
        assert_eq!(json, "\"EXCELLENTE\"");
    }
}
