use report_core::ReportError;
use serde::{Deserialize, Serialize};

/// Roughly fifteen years of daily history.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365 * 15;
pub const DEFAULT_QUARTERLY_PERIODS: usize = 8;
pub const MAX_LOOKBACK_YEARS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Calendar days of daily and statement history, ending today
    pub lookback_days: i64,
    /// Cumulative income rows requested for quarterly decomposition
    pub quarterly_periods: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            quarterly_periods: DEFAULT_QUARTERLY_PERIODS,
        }
    }
}

impl ReportConfig {
    pub fn with_lookback_years(years: i64) -> Result<Self, ReportError> {
        let lookback_days = years.checked_mul(365).ok_or_else(|| {
            ReportError::InvalidConfig(format!("lookback of {} years is out of range", years))
        })?;
        Ok(Self {
            lookback_days,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.lookback_days <= 0 {
            return Err(ReportError::InvalidConfig(format!(
                "lookback_days must be positive, got {}",
                self.lookback_days
            )));
        }
        if self.lookback_days > MAX_LOOKBACK_YEARS * 365 {
            return Err(ReportError::InvalidConfig(format!(
                "lookback_days must be at most {} ({} years), got {}",
                MAX_LOOKBACK_YEARS * 365,
                MAX_LOOKBACK_YEARS,
                self.lookback_days
            )));
        }
        // One row alone can never be differenced.
        if self.quarterly_periods < 2 {
            return Err(ReportError::InvalidConfig(format!(
                "quarterly_periods must be at least 2, got {}",
                self.quarterly_periods
            )));
        }
        Ok(())
    }
}
