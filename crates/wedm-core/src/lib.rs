//! wedm-core: shared foundation for the wire EDM simulation.
//!
//! Contains:
//! - units (uom SI types + µm/µs/mm constructors and conversions)
//! - numeric (Real, finite checks, probability helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
