//! Metrics Module - Pure calculators over an animal's event history.
//!
//! # Components
//!
//! - `AdgCalculator` - Average daily gain between two weighings
//! - `GestationCalculator` - Estimated birth date from a service date
//! - `weight_trend` - Interval-by-interval gain over a weighing history
//!
//! No store access happens here. Handlers fetch the projections and hand the
//! values in.

mod adg_calculator;
mod errors;
mod gestation;
mod weight_trend;

pub use adg_calculator::AdgCalculator;
pub use errors::MetricError;
pub use gestation::{GestationCalculator, CATTLE_GESTATION_DAYS};
pub use weight_trend::{weight_trend, WeighingPoint, WeightTrend, WeightTrendPoint};
