//! Provider backed by a recorded snapshot of the provider's tables.
//!
//! The file is one JSON object with a `{fields, items}` table per endpoint.
//! Absent tables are served as empty, which degrades the matching sections.

use anyhow::{Context, Result};
use async_trait::async_trait;
use report_core::table::RawTable;
use report_core::{
    parse_period, BalanceSheetRow, CashflowRow, DateWindow, IncomeRow, IndicatorRow,
    MarketDataProvider, PeriodRow, PriceRow, ReportError, SecurityMeta, StatementQuery, TsCode,
    ValuationRow,
};
use serde::Deserialize;
use std::cmp::Reverse;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SnapshotFile {
    stock_basic: RawTable,
    daily: RawTable,
    daily_basic: RawTable,
    income: RawTable,
    balancesheet: RawTable,
    cashflow: RawTable,
    fina_indicator: RawTable,
}

#[derive(Debug, Default)]
pub struct SnapshotProvider {
    securities: Vec<SecurityMeta>,
    prices: Vec<PriceRow>,
    valuations: Vec<ValuationRow>,
    income: Vec<IncomeRow>,
    balance: Vec<BalanceSheetRow>,
    cashflow: Vec<CashflowRow>,
    indicators: Vec<IndicatorRow>,
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, table: &RawTable) -> Result<Vec<T>, ReportError> {
    if table.has_more {
        tracing::warn!("Snapshot table {} was truncated upstream", name);
    }
    table
        .rows()
        .map_err(|e| ReportError::InvalidData(format!("{}: {}", name, e)))
}

fn in_window<T: PeriodRow + Clone>(rows: &[T], code: &TsCode, window: DateWindow) -> Vec<T> {
    rows.iter()
        .filter(|r| r.ts_code() == code.as_str())
        .filter(|r| parse_period(r.period()).is_some_and(|d| window.contains(d)))
        .cloned()
        .collect()
}

fn statements<T: PeriodRow + Clone>(rows: &[T], code: &TsCode, query: StatementQuery) -> Vec<T> {
    match query {
        StatementQuery::Window(window) => in_window(rows, code, window),
        StatementQuery::Latest(limit) => {
            let mut matched: Vec<T> = rows
                .iter()
                .filter(|r| r.ts_code() == code.as_str())
                .cloned()
                .collect();
            // Undated rows sort last.
            matched.sort_by_key(|r| Reverse(parse_period(r.period())));
            matched.truncate(limit);
            matched
        }
    }
}

impl SnapshotProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read snapshot {}", path.display()))?;
        let provider = Self::from_json(&raw)
            .with_context(|| format!("cannot decode snapshot {}", path.display()))?;
        tracing::info!(
            "Loaded snapshot {}: {} securities, {} trading days",
            path.display(),
            provider.securities.len(),
            provider.prices.len()
        );
        Ok(provider)
    }

    pub fn from_json(raw: &str) -> Result<Self, ReportError> {
        let file: SnapshotFile = serde_json::from_str(raw)?;
        Ok(Self {
            securities: decode("stock_basic", &file.stock_basic)?,
            prices: decode("daily", &file.daily)?,
            valuations: decode("daily_basic", &file.daily_basic)?,
            income: decode("income", &file.income)?,
            balance: decode("balancesheet", &file.balancesheet)?,
            cashflow: decode("cashflow", &file.cashflow)?,
            indicators: decode("fina_indicator", &file.fina_indicator)?,
        })
    }
}

#[async_trait]
impl MarketDataProvider for SnapshotProvider {
    async fn security_meta(&self, code: &TsCode) -> Result<Option<SecurityMeta>, ReportError> {
        Ok(self
            .securities
            .iter()
            .find(|s| s.ts_code == code.as_str())
            .cloned())
    }

    async fn daily_prices(&self, code: &TsCode, window: DateWindow) -> Result<Vec<PriceRow>, ReportError> {
        Ok(in_window(&self.prices, code, window))
    }

    async fn daily_valuations(&self, code: &TsCode, window: DateWindow) -> Result<Vec<ValuationRow>, ReportError> {
        Ok(in_window(&self.valuations, code, window))
    }

    async fn income(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<IncomeRow>, ReportError> {
        Ok(statements(&self.income, code, query))
    }

    async fn balance_sheet(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<BalanceSheetRow>, ReportError> {
        Ok(statements(&self.balance, code, query))
    }

    async fn cashflow(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<CashflowRow>, ReportError> {
        Ok(statements(&self.cashflow, code, query))
    }

    async fn financial_indicators(&self, code: &TsCode, query: StatementQuery) -> Result<Vec<IndicatorRow>, ReportError> {
        Ok(statements(&self.indicators, code, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SNAPSHOT: &str = r#"{
        "stock_basic": {
            "fields": ["ts_code", "name", "industry"],
            "items": [["000001.SZ", "Ping An Bank", "Banking"], ["600000.SH", "SPD Bank", "Banking"]]
        },
        "daily": {
            "fields": ["ts_code", "trade_date", "close"],
            "items": [
                ["000001.SZ", "20181228", 9.38],
                ["000001.SZ", "20240102", 9.21],
                ["600000.SH", "20240102", 6.60]
            ]
        },
        "income": {
            "fields": ["ts_code", "end_date", "total_revenue", "n_income"],
            "items": [
                ["000001.SZ", "20230331", 4.6e10, 1.5e10],
                ["000001.SZ", "20231231", 1.6e11, 4.6e10],
                ["000001.SZ", "20230930", 1.3e11, 4.0e10],
                ["000001.SZ", "20230630", 8.9e10, 2.7e10]
            ]
        }
    }"#;

    fn code(raw: &str) -> TsCode {
        TsCode::normalize(raw)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_meta_lookup() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        let meta = provider.security_meta(&code("000001")).await.unwrap().unwrap();
        assert_eq!(meta.name, "Ping An Bank");
        assert_eq!(meta.industry.as_deref(), Some("Banking"));
        assert!(provider.security_meta(&code("300750")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_daily_rows_filtered_by_code_and_window() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        let window = DateWindow::new(ymd(2019, 1, 1), ymd(2024, 6, 28));
        let prices = provider.daily_prices(&code("000001"), window).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].trade_date, "20240102");
        assert_eq!(prices[0].close, Some(9.21));
    }

    #[tokio::test]
    async fn test_latest_statements_newest_first() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        let rows = provider
            .income(&code("000001"), StatementQuery::Latest(2))
            .await
            .unwrap();
        let ends: Vec<&str> = rows.iter().map(|r| r.end_date.as_str()).collect();
        assert_eq!(ends, vec!["20231231", "20230930"]);
    }

    #[tokio::test]
    async fn test_missing_tables_are_empty() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        let window = DateWindow::new(ymd(2009, 1, 1), ymd(2024, 6, 28));
        assert!(provider.daily_valuations(&code("000001"), window).await.unwrap().is_empty());
        assert!(provider
            .balance_sheet(&code("000001"), StatementQuery::Latest(1))
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_bad_column_type_is_invalid_data() {
        let raw = r#"{"daily": {"fields": ["ts_code", "trade_date", "close"], "items": [["000001.SZ", "20240102", "n/a"]]}}"#;
        let err = SnapshotProvider::from_json(raw).unwrap_err();
        assert!(matches!(err, ReportError::InvalidData(ref msg) if msg.starts_with("daily: ")));
    }

    #[tokio::test]
    async fn test_demo_snapshot_produces_full_report() {
        use report_orchestrator::ReportOrchestrator;

        let raw = include_str!("../../../demos/snapshot_000001.json");
        let provider = SnapshotProvider::from_json(raw).unwrap();
        let report = ReportOrchestrator::new(provider)
            .with_report_date(ymd(2024, 6, 28))
            .generate_report("000001")
            .await
            .unwrap();

        assert!(report.degraded_sections().is_empty());
        let years: Vec<i32> = report
            .statistical_array
            .ready()
            .unwrap()
            .annual_data
            .iter()
            .map(|e| e.year)
            .collect();
        assert_eq!(years, vec![2018, 2019, 2020, 2021, 2022, 2023]);

        let growth = report.growth_rates.ready().unwrap();
        assert!(growth.sales_5y.is_some());
        assert_eq!(growth.sales_10y, None);

        let quarters = &report.quarterly_array.ready().unwrap().quarters;
        assert_eq!(quarters.len(), 5);
        assert_eq!(quarters[0].date, ymd(2024, 3, 31));
        assert_eq!(quarters[0].revenue, Some(387.7));
        assert_eq!(quarters[1].revenue, Some(383.63));

        assert_eq!(report.capital_structure.ready().unwrap().debt, Some(12_500_000_000.0));
        assert_eq!(report.top_metrics.ready().unwrap().recent_price, Some(10.17));
    }

    #[tokio::test]
    async fn test_unnamed_listing_does_not_hide_others() {
        let raw = r#"{"stock_basic": {
            "fields": ["ts_code", "name", "industry"],
            "items": [["830799.BJ", null, null], ["000001.SZ", "Ping An Bank", "Banking"]]
        }}"#;
        let provider = SnapshotProvider::from_json(raw).unwrap();
        let meta = provider.security_meta(&code("000001")).await.unwrap().unwrap();
        assert_eq!(meta.name, "Ping An Bank");
        let unnamed = provider.security_meta(&code("830799")).await.unwrap().unwrap();
        assert_eq!(unnamed.name, "");
    }

    #[test]
    fn test_malformed_json_is_invalid_data() {
        assert!(matches!(
            SnapshotProvider::from_json("{not json"),
            Err(ReportError::InvalidData(_))
        ));
    }
}
