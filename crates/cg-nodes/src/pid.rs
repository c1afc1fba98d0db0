//! PID operator.
//!
//! The PID node consumes an error signal (usually the output of a difference
//! summer) and produces a clamped actuator command. Integral and derivative
//! terms use the node's configured period.
//!
//! Anti-windup: while the output saturates, the integral is not accumulated.

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};

/// PID gains and output limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl PidGains {
    /// Create PID gains with output limits.
    ///
    /// # Errors
    ///
    /// Returns an error if a gain is not finite or `out_min >= out_max`.
    pub fn new(kp: f64, ki: f64, kd: f64, out_min: f64, out_max: f64) -> NodeResult<Self> {
        let gains = Self {
            kp,
            ki,
            kd,
            out_min,
            out_max,
        };
        gains.validate()?;
        Ok(gains)
    }

    /// Unlimited output range.
    pub fn unbounded(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            out_min: f64::NEG_INFINITY,
            out_max: f64::INFINITY,
        }
    }

    pub(crate) fn validate(&self) -> NodeResult<()> {
        for (what, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(NodeError::NonFinite { what, value });
            }
        }
        if !(self.out_min < self.out_max) {
            return Err(NodeError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(())
    }

    /// Compute the next state and output for one period.
    ///
    /// # Arguments
    ///
    /// * `state` - State from the previous epoch
    /// * `error` - Error signal for this epoch
    /// * `dt` - Period (seconds)
    pub fn update(&self, state: &PidState, error: f64, dt: f64) -> (PidState, f64) {
        let p_term = self.kp * error;

        let new_integral = state.integral + error * dt;
        let i_term = self.ki * new_integral;

        let d_term = self.kd * (error - state.previous_error) / dt;

        let output_raw = p_term + i_term + d_term;
        let output = output_raw.clamp(self.out_min, self.out_max);

        let integral = if output == output_raw {
            new_integral
        } else {
            state.integral
        };

        let new_state = PidState {
            integral,
            previous_error: error,
        };

        (new_state, output)
    }
}

/// PID retained state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Integral of the error.
    pub integral: f64,
    /// Error seen in the previous epoch (0 before the first).
    pub previous_error: f64,
}
