//! Retained per-node state.

use crate::kind::OperatorKind;
use crate::pid::PidState;
use crate::profile::ProfileState;

/// Fixed-depth history of past inputs (ring buffer).
#[derive(Debug, Clone, PartialEq)]
pub struct DelayLine {
    buf: Vec<f64>,
    head: usize,
    primed: bool,
}

impl DelayLine {
    /// Create a delay line of `depth` samples.
    ///
    /// With `initial = None` the history is filled with the first pushed value.
    pub fn new(depth: usize, initial: Option<f64>) -> Self {
        Self {
            buf: vec![initial.unwrap_or(0.0); depth],
            head: 0,
            primed: initial.is_some(),
        }
    }

    /// Push this epoch's input and return the value from `depth` epochs ago.
    pub fn push(&mut self, x: f64) -> f64 {
        if !self.primed {
            self.buf.fill(x);
            self.primed = true;
        }
        let out = self.buf[self.head];
        self.buf[self.head] = x;
        self.head = (self.head + 1) % self.buf.len();
        out
    }
}

/// State an operator carries between epochs.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// No retained state.
    Stateless,
    /// Externally set leaf value.
    Input { value: f64 },
    /// Last two sums, for tolerance checks.
    Summer { current: f64, previous: f64 },
    /// Accumulated `input * period`.
    Integrator { sum: f64 },
    /// Input seen in the previous epoch.
    Differentiator { previous: f64 },
    Delay(DelayLine),
    Pid(PidState),
    Profile(ProfileState),
}

impl NodeState {
    /// The state a freshly built node of `kind` starts in.
    pub fn initial(kind: &OperatorKind) -> Self {
        match kind {
            OperatorKind::Input { initial } => NodeState::Input { value: *initial },
            OperatorKind::Summer(_) => NodeState::Summer {
                current: 0.0,
                previous: 0.0,
            },
            OperatorKind::Integrator { initial } => NodeState::Integrator { sum: *initial },
            OperatorKind::Differentiator { initial_previous } => NodeState::Differentiator {
                previous: *initial_previous,
            },
            OperatorKind::Delay { depth, initial } => {
                NodeState::Delay(DelayLine::new(*depth, *initial))
            }
            OperatorKind::Pid(_) => NodeState::Pid(PidState::default()),
            OperatorKind::Profile(profile) => NodeState::Profile(ProfileState::new(profile)),
            OperatorKind::Constant { .. }
            | OperatorKind::Source(_)
            | OperatorKind::Gain { .. }
            | OperatorKind::Limiter { .. } => NodeState::Stateless,
        }
    }
}
