//! Control-loop period configuration.
//!
//! Time-dependent operators (integration, differentiation) use the period a
//! node was configured with rather than a clock reading. The evaluator is
//! assumed to tick at that period.

use uom::si::frequency::hertz;

use crate::error::{CoreError, CoreResult};
use crate::units::Frequency;

/// Default loop period in seconds.
pub const DEFAULT_PERIOD: f64 = 0.05;

/// A validated, strictly positive and finite period in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Period(f64);

impl Period {
    /// Create a period from seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPeriod`] if `seconds` is zero, negative or not finite.
    pub fn new(seconds: f64) -> CoreResult<Self> {
        if seconds > 0.0 && seconds.is_finite() {
            Ok(Self(seconds))
        } else {
            Err(CoreError::InvalidPeriod { period: seconds })
        }
    }

    /// Create a period from an update frequency.
    pub fn from_frequency(freq: Frequency) -> CoreResult<Self> {
        let f = freq.get::<hertz>();
        if f > 0.0 && f.is_finite() {
            Self::new(1.0 / f)
        } else {
            Err(CoreError::InvalidPeriod { period: 1.0 / f })
        }
    }

    /// Period in seconds.
    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Update frequency in Hz.
    pub fn frequency(self) -> f64 {
        1.0 / self.0
    }
}

impl Default for Period {
    fn default() -> Self {
        Self(DEFAULT_PERIOD)
    }
}

impl TryFrom<f64> for Period {
    type Error = CoreError;

    fn try_from(seconds: f64) -> CoreResult<Self> {
        Self::new(seconds)
    }
}

impl From<Period> for f64 {
    fn from(period: Period) -> Self {
        period.0
    }
}
