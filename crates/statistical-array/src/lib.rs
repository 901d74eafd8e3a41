//! Derivation logic behind the statistical report: merging provider tables,
//! the annual per-share array, trailing growth rates, single-quarter
//! reconstruction and the latest-value snapshots.

pub mod annual;
pub mod growth;
pub mod merge;
pub mod quarterly;
pub mod snapshot;

pub use annual::build_statistical_array;
pub use growth::{cagr, calculate_growth_rates, Metric};
pub use merge::{merge_annual, merge_daily, AnnualSources};
pub use quarterly::decompose_quarters;
pub use snapshot::{capital_structure, top_metrics};

/// Hundred-million, the unit used for share counts and quarterly figures.
pub const HUNDRED_MILLION: f64 = 100_000_000.0;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
