//! Operator kinds and their configuration.

use std::fmt;

use cg_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};
use crate::pid::PidGains;
use crate::profile::TrapezoidProfile;

/// Coefficient applied to one summer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// The `±1` coefficient.
    pub fn coefficient(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

impl From<bool> for Sign {
    fn from(positive: bool) -> Self {
        if positive { Sign::Plus } else { Sign::Minus }
    }
}

/// Range of a continuous (wrapping) input such as an angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

/// Settling tolerance tracked by a summer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummerTolerance {
    /// Largest absolute sum still considered settled.
    pub tolerance: f64,
    /// Largest change of the sum between two epochs still considered settled.
    pub delta_tolerance: f64,
}

impl Default for SummerTolerance {
    fn default() -> Self {
        Self {
            tolerance: f64::INFINITY,
            delta_tolerance: f64::INFINITY,
        }
    }
}

/// Summer configuration: one sign per input slot, plus optional extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummerConfig {
    pub signs: Vec<Sign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous: Option<InputRange>,
    #[serde(default)]
    pub tolerance: SummerTolerance,
}

impl SummerConfig {
    pub fn new(signs: impl Into<Vec<Sign>>) -> Self {
        Self {
            signs: signs.into(),
            continuous: None,
            tolerance: SummerTolerance::default(),
        }
    }

    /// Wrap the sum into `(-(max-min)/2, (max-min)/2]`.
    pub fn with_continuous(mut self, min: f64, max: f64) -> Self {
        self.continuous = Some(InputRange { min, max });
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64, delta_tolerance: f64) -> Self {
        self.tolerance = SummerTolerance {
            tolerance,
            delta_tolerance,
        };
        self
    }
}

/// Boxed callable sampled once per epoch by a `Source` node.
pub struct SourceFn(Box<dyn FnMut() -> f64 + Send>);

impl SourceFn {
    pub fn new(f: impl FnMut() -> f64 + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn call(&mut self) -> f64 {
        (self.0)()
    }
}

impl fmt::Debug for SourceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SourceFn(..)")
    }
}

/// Closed set of operator kinds.
#[derive(Debug)]
pub enum OperatorKind {
    /// Fixed value.
    Constant { value: f64 },

    /// Leaf whose value is set from outside the graph (sensor, reference input).
    Input { initial: f64 },

    /// Leaf whose value is the return value of a callable.
    Source(SourceFn),

    /// `k * input`.
    Gain { k: f64 },

    /// Signed sum of all inputs.
    Summer(SummerConfig),

    /// `clamp(input, lo, hi)`.
    Limiter { lo: f64, hi: f64 },

    /// Running sum of `input * period`.
    Integrator { initial: f64 },

    /// `(input - previous) / period`.
    Differentiator { initial_previous: f64 },

    /// Input value from `depth` epochs ago.
    ///
    /// The history starts filled with `initial`, or with the first observed
    /// input when `initial` is `None`.
    Delay { depth: usize, initial: Option<f64> },

    /// PID controller acting on an error input.
    Pid(PidGains),

    /// Trapezoidal motion profile; outputs a position reference.
    Profile(TrapezoidProfile),
}

impl OperatorKind {
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    pub fn input(initial: f64) -> Self {
        Self::Input { initial }
    }

    pub fn source(f: impl FnMut() -> f64 + Send + 'static) -> Self {
        Self::Source(SourceFn::new(f))
    }

    pub fn gain(k: f64) -> Self {
        Self::Gain { k }
    }

    /// Summer with one `+` input per entry of `signs`.
    pub fn summer(signs: impl Into<Vec<Sign>>) -> Self {
        Self::Summer(SummerConfig::new(signs))
    }

    /// `a - b`, the usual error summing junction.
    pub fn difference() -> Self {
        Self::summer([Sign::Plus, Sign::Minus])
    }

    pub fn limiter(lo: f64, hi: f64) -> Self {
        Self::Limiter { lo, hi }
    }

    pub fn integrator() -> Self {
        Self::Integrator { initial: 0.0 }
    }

    pub fn differentiator() -> Self {
        Self::Differentiator {
            initial_previous: 0.0,
        }
    }

    pub fn delay(depth: usize) -> Self {
        Self::Delay {
            depth,
            initial: None,
        }
    }

    /// Trapezoidal profile at rest at 0.
    pub fn profile(max_velocity: f64, time_to_max_velocity: f64) -> Self {
        Self::Profile(TrapezoidProfile::new(max_velocity, time_to_max_velocity))
    }

    /// Short lowercase name, used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::Input { .. } => "input",
            Self::Source(_) => "source",
            Self::Gain { .. } => "gain",
            Self::Summer(_) => "summer",
            Self::Limiter { .. } => "limiter",
            Self::Integrator { .. } => "integrator",
            Self::Differentiator { .. } => "differentiator",
            Self::Delay { .. } => "delay",
            Self::Pid(_) => "pid",
            Self::Profile(_) => "profile",
        }
    }

    /// Number of input slots this kind expects.
    pub fn input_count(&self) -> usize {
        match self {
            Self::Constant { .. } | Self::Input { .. } | Self::Source(_) | Self::Profile(_) => 0,
            Self::Summer(config) => config.signs.len(),
            Self::Gain { .. }
            | Self::Limiter { .. }
            | Self::Integrator { .. }
            | Self::Differentiator { .. }
            | Self::Delay { .. }
            | Self::Pid(_) => 1,
        }
    }

    /// Whether the kind carries memory across epochs.
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            Self::Integrator { .. }
                | Self::Differentiator { .. }
                | Self::Delay { .. }
                | Self::Pid(_)
                | Self::Profile(_)
        )
    }

    /// Check the kind's parameters.
    pub fn validate(&self) -> NodeResult<()> {
        match self {
            Self::Constant { value } => {
                ensure_finite(*value, "constant value")?;
            }
            Self::Input { initial } => {
                ensure_finite(*initial, "input initial value")?;
            }
            Self::Source(_) => {}
            Self::Gain { k } => {
                ensure_finite(*k, "gain")?;
            }
            Self::Summer(config) => {
                if config.signs.is_empty() {
                    return Err(NodeError::InvalidArg {
                        what: "summer needs at least one input",
                    });
                }
                if let Some(range) = config.continuous {
                    ensure_finite(range.min, "continuous range min")?;
                    ensure_finite(range.max, "continuous range max")?;
                    if !(range.min < range.max) {
                        return Err(NodeError::InvalidArg {
                            what: "continuous range min must be less than max",
                        });
                    }
                }
                // Infinite tolerances mean "always settled"; NaN never compares.
                let tol = config.tolerance;
                if !(tol.tolerance >= 0.0 && tol.delta_tolerance >= 0.0) {
                    return Err(NodeError::InvalidArg {
                        what: "summer tolerances must be non-negative",
                    });
                }
            }
            Self::Limiter { lo, hi } => {
                if !(lo <= hi) {
                    return Err(NodeError::InvalidArg {
                        what: "limiter lo must not exceed hi",
                    });
                }
            }
            Self::Integrator { initial } => {
                ensure_finite(*initial, "integrator initial value")?;
            }
            Self::Differentiator { initial_previous } => {
                ensure_finite(*initial_previous, "differentiator initial value")?;
            }
            Self::Delay { depth, initial } => {
                if *depth == 0 {
                    return Err(NodeError::InvalidArg {
                        what: "delay depth must be at least 1",
                    });
                }
                if let Some(v) = initial {
                    ensure_finite(*v, "delay initial value")?;
                }
            }
            Self::Pid(gains) => gains.validate()?,
            Self::Profile(profile) => profile.validate()?,
        }
        Ok(())
    }
}
