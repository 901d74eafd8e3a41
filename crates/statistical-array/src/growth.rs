use report_core::{AnnualEntry, GrowthRates, StatisticalArray};

use crate::round_to;

/// Per-share metric of the annual array a growth rate can be taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    SalesPerShare,
    Eps,
    BookValuePerShare,
}

impl Metric {
    pub fn value(&self, entry: &AnnualEntry) -> Option<f64> {
        match self {
            Metric::SalesPerShare => entry.sales_per_share,
            Metric::Eps => entry.eps,
            Metric::BookValuePerShare => entry.book_value_per_share,
        }
    }
}

/// Trailing compound annual growth rate in percent, rounded to 2 decimals.
///
/// `entries` must be ascending by year. Returns `None` with fewer than
/// `horizon + 1` entries, or when either endpoint is missing or not
/// positive.
pub fn cagr(entries: &[AnnualEntry], metric: Metric, horizon: usize) -> Option<f64> {
    if horizon == 0 || entries.len() < horizon + 1 {
        return None;
    }
    let end = metric.value(&entries[entries.len() - 1])?;
    let start = metric.value(&entries[entries.len() - 1 - horizon])?;
    if start <= 0.0 || end <= 0.0 {
        return None;
    }

    let rate = (end / start).powf(1.0 / horizon as f64) - 1.0;
    if !rate.is_finite() {
        return None;
    }
    Some(round_to(rate * 100.0, 2))
}

/// 5- and 10-year growth of sales, earnings and book value per share.
pub fn calculate_growth_rates(array: &StatisticalArray) -> GrowthRates {
    let mut entries = array.annual_data.clone();
    entries.sort_by_key(|e| e.year);

    GrowthRates {
        sales_5y: cagr(&entries, Metric::SalesPerShare, 5),
        sales_10y: cagr(&entries, Metric::SalesPerShare, 10),
        eps_5y: cagr(&entries, Metric::Eps, 5),
        eps_10y: cagr(&entries, Metric::Eps, 10),
        bvps_5y: cagr(&entries, Metric::BookValuePerShare, 5),
        bvps_10y: cagr(&entries, Metric::BookValuePerShare, 10),
    }
}
