//! Operator nodes for ctrlgraph control loops.
//!
//! Every node in a control graph is an [`Operator`]: a closed [`OperatorKind`]
//! (what the node computes), the loop [`Period`](cg_core::Period) it was
//! configured with, and its retained [`NodeState`].
//!
//! # Operator kinds
//!
//! - **Leaves**: `Constant`, `Input` (externally settable), `Source` (callable)
//! - **Stateless**: `Gain`, `Summer`, `Limiter`
//! - **Stateful**: `Integrator`, `Differentiator`, `Delay`, `Pid`, `Profile`
//!   (trapezoidal motion profile, a leaf driven by its own period)
//!
//! Operators know nothing about wiring or epochs. The graph gathers input
//! values, calls [`Operator::step`] at most once per epoch and caches the result.

pub mod error;
pub mod kind;
pub mod operator;
pub mod pid;
pub mod profile;
pub mod state;

pub use error::{NodeError, NodeResult};
pub use kind::{InputRange, OperatorKind, Sign, SourceFn, SummerConfig, SummerTolerance};
pub use operator::Operator;
pub use pid::{PidGains, PidState};
pub use profile::{ProfilePlan, ProfileSample, ProfileState, TrapezoidProfile};
pub use state::{DelayLine, NodeState};
