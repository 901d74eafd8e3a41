use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::{
    BalanceSheetRow, CashflowRow, IncomeRow, IndicatorRow, PriceRow, ReportError, SecurityMeta,
    TsCode, ValuationRow,
};

/// Inclusive calendar window passed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window of `days` calendar days ending at `end`.
    ///
    /// Fails when `days` is negative or reaches past the earliest
    /// representable date.
    pub fn lookback(end: NaiveDate, days: i64) -> Result<Self, ReportError> {
        let start = u64::try_from(days)
            .ok()
            .and_then(|d| end.checked_sub_days(Days::new(d)))
            .ok_or_else(|| {
                ReportError::InvalidConfig(format!("lookback of {} days from {} is out of range", days, end))
            })?;
        Ok(Self { start, end })
    }

    /// Start date as the provider's unpunctuated `YYYYMMDD` parameter
    pub fn start_param(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// How a statement table is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementQuery {
    /// All reporting periods ending inside the window
    Window(DateWindow),
    /// The `n` most recent reporting periods
    Latest(usize),
}

/// Upstream market-data collaborator.
///
/// Implementations own networking, authentication and retries; the report
/// pipeline only sees already-parsed rows.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// `Ok(None)` when the identifier is unknown to the provider.
    async fn security_meta(&self, code: &TsCode) -> Result<Option<SecurityMeta>, ReportError>;

    async fn daily_prices(&self, code: &TsCode, window: DateWindow) -> Result<Vec<PriceRow>, ReportError>;

    async fn daily_valuations(&self, code: &TsCode, window: DateWindow) -> Result<Vec<ValuationRow>, ReportError>;

    async fn income(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<IncomeRow>, ReportError>;

    async fn balance_sheet(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<BalanceSheetRow>, ReportError>;

    async fn cashflow(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<CashflowRow>, ReportError>;

    async fn financial_indicators(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<IndicatorRow>, ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_params_are_unpunctuated() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let window = DateWindow::lookback(end, 365 * 15).unwrap();
        assert_eq!(window.end_param(), "20240305");
        assert_eq!(window.start_param().len(), 8);
        assert!(window.start_param().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_lookback_out_of_range_is_an_error() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert!(matches!(
            DateWindow::lookback(end, 365 * 1_000_000),
            Err(ReportError::InvalidConfig(_))
        ));
        assert!(DateWindow::lookback(end, i64::MAX).is_err());
        assert!(DateWindow::lookback(end, -1).is_err());
        assert_eq!(DateWindow::lookback(end, 0).unwrap().start, end);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        let window = DateWindow::new(start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
    }
}
