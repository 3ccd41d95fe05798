use crate::unit;
use derive_more::{Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative slack used when comparing computed step values against user input.
const TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of steps in a range.
pub const MAX_STEPS: usize = 1_000_000;

fn slack(v: f64) -> f64 {
    TOLERANCE * (1.0 + v.abs())
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, Deref, From, Into,
)]
pub struct StepIndex(usize);

impl StepIndex {
    pub fn new(i: usize) -> Self {
        Self(i)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RangeError {
    #[error("Range bounds must be finite (min {min}, max {max}, step {step})")]
    NonFinite { min: f64, max: f64, step: f64 },
    #[error("Range minimum {min} must be below maximum {max}")]
    Empty { min: f64, max: f64 },
    #[error("Step must be greater than zero, got {0}")]
    InvalidStep(f64),
    #[error("Step {step} splits {min}..{max} into more than {MAX_STEPS} steps")]
    TooManySteps { min: f64, max: f64, step: f64 },
}

/// A bounded, evenly stepped range of selectable values.
///
/// Step `i` has the value `min + i * step`. When `max - min` is not an exact
/// multiple of `step` the last partial step is dropped, so `max` itself may not
/// be reachable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: f64,
    max: f64,
    step: f64,
    total_steps: usize,
}

impl ValueRange {
    /// Builds a range, degrading malformed input instead of failing.
    ///
    /// Reversed bounds are swapped. Any other invalid combination collapses to a
    /// single fixed value at `min` (or `0.0` if `min` is not finite).
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        match Self::try_new(min, max, step) {
            Ok(range) => range,
            Err(RangeError::Empty { min, max }) if max < min => {
                log::warn!("Range bounds {min}..{max} are reversed, swapping them");
                Self::new(max, min, step)
            }
            Err(e) => {
                log::warn!("{e}, using a fixed value instead");
                Self::fixed(if min.is_finite() { min } else { 0.0 })
            }
        }
    }

    pub fn try_new(min: f64, max: f64, step: f64) -> Result<Self, RangeError> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(RangeError::NonFinite { min, max, step });
        }
        if step <= 0.0 {
            return Err(RangeError::InvalidStep(step));
        }
        if min >= max {
            return Err(RangeError::Empty { min, max });
        }

        let span = (max - min) / step;
        if !span.is_finite() || span >= MAX_STEPS as f64 {
            return Err(RangeError::TooManySteps { min, max, step });
        }
        let total_steps = (span + slack(span)).floor() as usize + 1;

        Ok(Self {
            min,
            max,
            step,
            total_steps,
        })
    }

    /// A range holding exactly one value. The selector renders it statically.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            step: 1.0,
            total_steps: 1,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Decimals needed to print every step value exactly.
    pub fn decimals(&self) -> usize {
        unit::decimals_for(self.step).max(unit::decimals_for(self.min))
    }

    pub fn format(&self, value: f64) -> String {
        unit::format_value(value, self.decimals())
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn last_index(&self) -> StepIndex {
        StepIndex(self.total_steps.saturating_sub(1))
    }

    /// True when there is nothing to choose between.
    pub fn is_static(&self) -> bool {
        self.total_steps <= 1
    }

    pub fn value_at(&self, index: StepIndex) -> f64 {
        let i = (*index).min(*self.last_index());
        self.min + i as f64 * self.step
    }

    /// Index of the step nearest to `value`, clamped into the range.
    pub fn index_of(&self, value: f64) -> StepIndex {
        if self.is_static() || !value.is_finite() {
            if value.is_nan() {
                log::warn!("Ignoring NaN value, falling back to the range minimum");
            }
            return match value {
                v if v == f64::INFINITY => self.last_index(),
                _ => StepIndex(0),
            };
        }
        let raw = ((value - self.min) / self.step).round();
        self.clamp_index(raw)
    }

    /// Clamps a possibly fractional or negative raw index into `[0, last]`.
    pub fn clamp_index(&self, raw: f64) -> StepIndex {
        if raw.is_nan() || raw <= 0.0 {
            return StepIndex(0);
        }
        StepIndex((raw as usize).min(*self.last_index()))
    }

    /// Snaps `value` to the nearest valid step value.
    pub fn clamp(&self, value: f64) -> f64 {
        self.value_at(self.index_of(value))
    }

    pub fn is_step_value(&self, value: f64) -> bool {
        (self.clamp(value) - value).abs() <= slack(value)
    }

    pub fn values(&self) -> impl Iterator<Item = (StepIndex, f64)> + '_ {
        (0..self.total_steps).map(|i| (StepIndex(i), self.value_at(StepIndex(i))))
    }
}

/// A sub-band of the range highlighted in the tick field. Bounds may be given in
/// either order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct HighlightBand {
    low: f64,
    high: f64,
}

impl HighlightBand {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            low: start.min(end),
            high: start.max(end),
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low - slack(self.low) && value <= self.high + slack(self.high)
    }
}

impl From<(f64, f64)> for HighlightBand {
    fn from((start, end): (f64, f64)) -> Self {
        Self::new(start, end)
    }
}

impl From<HighlightBand> for (f64, f64) {
    fn from(band: HighlightBand) -> Self {
        (band.low, band.high)
    }
}
