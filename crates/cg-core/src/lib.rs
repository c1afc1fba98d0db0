//! cg-core: shared foundation for ctrlgraph.
//!
//! Contains:
//! - ids (compact node handles + evaluation epochs)
//! - numeric (Real + tolerances + float helpers)
//! - period (validated control-loop period, `DEFAULT_PERIOD`)
//! - units (uom SI frequency for loop rates)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod period;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use period::{DEFAULT_PERIOD, Period};
pub use units::*;
