//! Random sources for the peripheral simulation.
//!
//! Success draws and quality scores come from a [`RandomSource`] injected
//! into the session manager. Production code uses [`SystemRandom`]; tests
//! pin outcomes with [`FixedRandom`] or [`ScriptedRandom`].
//!
//! # Examples
//!
//! ```
//! use enroll_devices::random::{RandomSource, ScriptedRandom};
//!
//! let source = ScriptedRandom::new([0.5, 0.25]);
//! assert_eq!(source.next(), 0.5);
//! assert_eq!(source.next(), 0.25);
//! assert_eq!(source.next(), 0.25); // last value repeats
//! ```

use enroll_core::constants::MAX_QUALITY_SCORE;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Largest value a draw is clamped to.
const MAX_UNIT: f64 = 1.0 - f64::EPSILON;

/// Uniform source of values in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next(&self) -> f64;
}

/// OS-seeded standard generator.
#[derive(Debug)]
pub struct SystemRandom {
    rng: Mutex<StdRng>,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn next(&self) -> f64 {
        lock(&self.rng).random::<f64>()
    }
}

/// Standard generator with a fixed seed, for reproducible simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next(&self) -> f64 {
        lock(&self.rng).random::<f64>()
    }
}

/// Always yields the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    pub fn new(value: f64) -> Self {
        Self(clamp_unit(value))
    }

    /// A source under which every draw with a non-zero success rate succeeds
    /// and quality lands at the top of its range.
    pub fn always_succeed() -> Self {
        Self(MAX_UNIT)
    }

    /// A source under which every draw with a success rate below one fails.
    pub fn always_fail() -> Self {
        Self(0.0)
    }
}

impl RandomSource for FixedRandom {
    fn next(&self) -> f64 {
        self.0
    }
}

/// Yields queued values in order, repeating the last one once exhausted.
#[derive(Debug)]
pub struct ScriptedRandom {
    state: Mutex<Script>,
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<f64>,
    last: f64,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            state: Mutex::new(Script {
                queue: values.into_iter().map(clamp_unit).collect(),
                last: 0.0,
            }),
        }
    }

    /// Append further values to the script.
    pub fn push(&self, value: f64) {
        lock(&self.state).queue.push_back(clamp_unit(value));
    }

    pub fn remaining(&self) -> usize {
        lock(&self.state).queue.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next(&self) -> f64 {
        let mut script = lock(&self.state);
        if let Some(value) = script.queue.pop_front() {
            script.last = value;
        }
        script.last
    }
}

/// Weighted success draw: succeeds with probability `success_rate`.
pub(crate) fn draw_success(source: &dyn RandomSource, success_rate: f64) -> bool {
    clamp_unit(source.next()) >= 1.0 - success_rate
}

/// Quality score uniformly distributed over `[min_quality, 100)`.
pub(crate) fn draw_quality(source: &dyn RandomSource, min_quality: u8) -> u8 {
    let min_quality = min_quality.min(MAX_QUALITY_SCORE - 1);
    let span = MAX_QUALITY_SCORE - min_quality;
    let offset = (clamp_unit(source.next()) * f64::from(span)).floor() as u8;
    min_quality + offset.min(span - 1)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_UNIT)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_system_random_in_unit_range() {
        let source = SystemRandom::new();
        for _ in 0..1000 {
            let value = source.next();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        for _ in 0..16 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_fixed_random_clamps() {
        assert_eq!(FixedRandom::new(-3.0).next(), 0.0);
        assert!(FixedRandom::new(1.0).next() < 1.0);
        assert_eq!(FixedRandom::new(f64::NAN).next(), 0.0);
    }

    #[test]
    fn test_scripted_random_repeats_last() {
        let source = ScriptedRandom::new([0.1, 0.9]);
        assert_eq!(source.next(), 0.1);
        assert_eq!(source.next(), 0.9);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.next(), 0.9);

        source.push(0.3);
        assert_eq!(source.next(), 0.3);
    }

    #[test]
    fn test_scripted_random_empty_yields_zero() {
        assert_eq!(ScriptedRandom::new([]).next(), 0.0);
    }

    #[rstest]
    #[case(0.0, 0.90, false)]
    #[case(0.05, 0.90, false)]
    #[case(0.11, 0.90, true)]
    #[case(0.99, 0.90, true)]
    #[case(0.0, 1.0, true)]
    #[case(0.99, 0.0, false)]
    fn test_draw_success(#[case] value: f64, #[case] rate: f64, #[case] expected: bool) {
        assert_eq!(draw_success(&FixedRandom::new(value), rate), expected);
    }

    #[rstest]
    #[case(0.0, 75, 75)]
    #[case(0.41, 70, 82)]
    #[case(0.5, 80, 90)]
    #[case(1.0, 85, 99)]
    #[case(0.0, 120, 99)]
    fn test_draw_quality(#[case] value: f64, #[case] min: u8, #[case] expected: u8) {
        assert_eq!(draw_quality(&FixedRandom::new(value), min), expected);
    }

    #[test]
    fn test_always_helpers() {
        assert!(draw_success(&FixedRandom::always_succeed(), 0.85));
        assert!(!draw_success(&FixedRandom::always_fail(), 0.95));
        assert_eq!(draw_quality(&FixedRandom::always_succeed(), 75), 99);
    }
}
