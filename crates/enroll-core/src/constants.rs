//! Default simulation parameters and enrolment constants.
//!
//! The latency and success-rate values describe the simulated peripherals
//! and are the defaults of the session configuration. They are tunable and
//! carry no protocol meaning.
//!
//! | Operation   | Latency | Success | Quality range |
//! |-------------|---------|---------|---------------|
//! | connect     | 1000 ms | 90%     | n/a           |
//! | document    | 2000 ms | 85%     | [70, 100)     |
//! | fingerprint | 1500 ms | 90%     | [75, 100)     |
//! | iris        | 2500 ms | 85%     | [80, 100)     |
//! | face        | 2000 ms | 95%     | [85, 100)     |

// ============================================================================
// Connection
// ============================================================================

/// Simulated connection latency in milliseconds.
pub const DEFAULT_CONNECT_LATENCY_MS: u64 = 1000;

/// Probability that a connection attempt succeeds.
pub const DEFAULT_CONNECT_SUCCESS_RATE: f64 = 0.90;

// ============================================================================
// Captures
// ============================================================================

pub const DOCUMENT_SCAN_LATENCY_MS: u64 = 2000;
pub const DOCUMENT_SCAN_SUCCESS_RATE: f64 = 0.85;
pub const DOCUMENT_SCAN_MIN_QUALITY: u8 = 70;

pub const FINGERPRINT_LATENCY_MS: u64 = 1500;
pub const FINGERPRINT_SUCCESS_RATE: f64 = 0.90;
pub const FINGERPRINT_MIN_QUALITY: u8 = 75;

pub const IRIS_LATENCY_MS: u64 = 2500;
pub const IRIS_SUCCESS_RATE: f64 = 0.85;
pub const IRIS_MIN_QUALITY: u8 = 80;

pub const FACE_LATENCY_MS: u64 = 2000;
pub const FACE_SUCCESS_RATE: f64 = 0.95;
pub const FACE_MIN_QUALITY: u8 = 85;

/// Exclusive upper bound of every quality score.
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Length of the opaque template hash, in hex characters.
pub const OPAQUE_HASH_LEN: usize = 64;

// ============================================================================
// Quality grades
// ============================================================================

pub const GRADE_EXCELLENT_MIN: u8 = 90;
pub const GRADE_GOOD_MIN: u8 = 75;
pub const GRADE_ACCEPTABLE_MIN: u8 = 60;

// ============================================================================
// Enrolment units
// ============================================================================

pub const FINGER_COUNT: usize = 10;
pub const IRIS_COUNT: usize = 2;
pub const FACE_COUNT: usize = 1;

/// Fingers, irises and face captured during one enrolment.
pub const TOTAL_CAPTURE_UNITS: usize = FINGER_COUNT + IRIS_COUNT + FACE_COUNT;
