//! Operator update rules.

use cg_core::{Period, wrap_into_range};

use crate::error::NodeResult;
use crate::kind::OperatorKind;
use crate::state::NodeState;

/// A configured operator: kind, period and retained state.
#[derive(Debug)]
pub struct Operator {
    kind: OperatorKind,
    period: Period,
    state: NodeState,
}

impl Operator {
    /// Create an operator, validating the kind's parameters.
    pub fn new(kind: OperatorKind, period: Period) -> NodeResult<Self> {
        kind.validate()?;
        let state = NodeState::initial(&kind);
        Ok(Self {
            kind,
            period,
            state,
        })
    }

    /// Create an operator with a period given in seconds.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidPeriod` for a zero, negative or non-finite period.
    pub fn with_period_seconds(kind: OperatorKind, seconds: f64) -> NodeResult<Self> {
        Self::new(kind, Period::new(seconds)?)
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Compute this epoch's output from the inputs' values, advancing state.
    ///
    /// `inputs` holds one value per input slot. Callers must invoke this at
    /// most once per epoch.
    pub fn step(&mut self, inputs: &[f64]) -> f64 {
        debug_assert_eq!(inputs.len(), self.kind.input_count());
        let dt = self.period.seconds();

        match (&mut self.kind, &mut self.state) {
            (OperatorKind::Constant { value }, _) => *value,
            (OperatorKind::Input { .. }, NodeState::Input { value }) => *value,
            (OperatorKind::Source(f), _) => f.call(),
            (OperatorKind::Gain { k }, _) => *k * inputs[0],
            (OperatorKind::Summer(config), NodeState::Summer { current, previous }) => {
                let raw: f64 = config
                    .signs
                    .iter()
                    .zip(inputs)
                    .map(|(sign, x)| sign.coefficient() * x)
                    .sum();
                let sum = match config.continuous {
                    Some(range) => wrap_into_range(raw, range.min, range.max),
                    None => raw,
                };
                *previous = *current;
                *current = sum;
                sum
            }
            (OperatorKind::Limiter { lo, hi }, _) => inputs[0].clamp(*lo, *hi),
            (OperatorKind::Integrator { .. }, NodeState::Integrator { sum }) => {
                *sum += inputs[0] * dt;
                *sum
            }
            (OperatorKind::Differentiator { .. }, NodeState::Differentiator { previous }) => {
                let rate = (inputs[0] - *previous) / dt;
                *previous = inputs[0];
                rate
            }
            (OperatorKind::Delay { .. }, NodeState::Delay(line)) => line.push(inputs[0]),
            (OperatorKind::Pid(gains), NodeState::Pid(pid)) => {
                let (next, output) = gains.update(pid, inputs[0], dt);
                *pid = next;
                output
            }
            (OperatorKind::Profile(_), NodeState::Profile(profile)) => profile.step(dt),
            (kind, state) => unreachable!("{} operator paired with {state:?}", kind.name()),
        }
    }

    /// Set the value of an `Input` leaf. Returns `false` for any other kind.
    pub fn set_input(&mut self, x: f64) -> bool {
        match &mut self.state {
            NodeState::Input { value } => {
                *value = x;
                true
            }
            _ => false,
        }
    }

    /// Replan a `Profile` node toward `goal`. Returns `false` for any other kind.
    pub fn set_goal(&mut self, goal: f64) -> bool {
        match (&self.kind, &mut self.state) {
            (OperatorKind::Profile(config), NodeState::Profile(profile)) => {
                profile.set_goal(config, goal);
                true
            }
            _ => false,
        }
    }

    /// Whether a summer's output has settled. `None` for other kinds.
    pub fn in_tolerance(&self) -> Option<bool> {
        match (&self.kind, &self.state) {
            (OperatorKind::Summer(config), NodeState::Summer { current, previous }) => {
                let tol = config.tolerance;
                Some(current.abs() < tol.tolerance && (current - previous).abs() < tol.delta_tolerance)
            }
            _ => None,
        }
    }

    /// Return retained state to its initial condition.
    ///
    /// `Input` leaves keep their last set value: they mirror the outside world.
    pub fn reset(&mut self) {
        if matches!(self.state, NodeState::Input { .. }) {
            return;
        }
        self.state = NodeState::initial(&self.kind);
    }
}
