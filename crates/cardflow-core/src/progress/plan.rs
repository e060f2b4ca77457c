#![forbid(unsafe_code)]

//! Progress plan generation.
//!
//! A [`ProgressPlan`] is an ordered sequence of positive step magnitudes
//! summing exactly to a target ceiling. Plans simulate
//! indeterminate-duration progress feedback: the bar climbs through the
//! steps with gaps in between, so it looks busy without knowing the real
//! completion time.
//!
//! # Invariants
//!
//! For every `(max, steps)` with `max >= steps >= 1`,
//! [`ProgressPlan::generate`] returns:
//!
//! 1. exactly `steps` values,
//! 2. every value >= 1,
//! 3. values summing exactly to `max`.

use rand::Rng;

/// Inclusive uniform draw.
pub fn random_between<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    if min >= max {
        return min;
    }
    rng.random_range(min..=max)
}

/// An ordered sequence of step magnitudes summing to `max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPlan {
    numbers: Vec<u32>,
    max: u32,
}

impl ProgressPlan {
    /// Build a plan from explicit step magnitudes.
    #[must_use]
    pub fn from_steps(numbers: Vec<u32>) -> Self {
        let max = numbers.iter().sum();
        Self { numbers, max }
    }

    /// Generate `steps` positive integers summing exactly to `max`.
    ///
    /// The first value is drawn from `[10, 50]`, capped so every later
    /// step can still be >= 1. Each middle value is drawn from
    /// `[1, max - remaining_steps - running_sum]`, falling back to 1 when
    /// that bound collapses. The last value is the exact remainder.
    ///
    /// `steps` is clamped to at least 1, and `max` to at least `steps`, so
    /// the invariants hold for any input.
    #[must_use]
    pub fn generate<R: Rng>(rng: &mut R, max: u32, steps: usize) -> Self {
        let steps = steps.max(1);
        let max = max.max(steps as u32);

        let mut numbers = Vec::with_capacity(steps);
        let mut sum: u32 = 0;

        for i in 0..steps - 1 {
            // Leave room for one unit per step still to be drawn.
            let remaining = (steps - 1 - i) as u32;
            let available = max - remaining - sum;
            let hi = if i == 0 { available.min(50) } else { available };
            let num = if hi <= 1 {
                1
            } else {
                let lo = if i == 0 { 10.min(hi) } else { 1 };
                random_between(rng, lo, hi)
            };
            numbers.push(num);
            sum += num;
        }

        numbers.push(max - sum);
        Self { numbers, max }
    }

    #[inline]
    #[must_use]
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// The ceiling the plan climbs to.
    #[inline]
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}
