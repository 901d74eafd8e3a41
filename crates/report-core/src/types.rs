use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::section::Section;

/// Parse a provider period marker (`20231231` or `2023-12-31`).
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Provider tables send `null` for blank text cells.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A provider row keyed by (ts_code, period marker).
pub trait PeriodRow {
    fn ts_code(&self) -> &str;
    fn period(&self) -> &str;
}

macro_rules! period_row {
    ($ty:ty, $field:ident) => {
        impl PeriodRow for $ty {
            fn ts_code(&self) -> &str {
                &self.ts_code
            }

            fn period(&self) -> &str {
                &self.$field
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Raw provider rows
// ---------------------------------------------------------------------------

/// Security meta data as returned by the provider's listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityMeta {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    pub fullname: Option<String>,
    pub industry: Option<String>,
    pub market: Option<String>,
    pub list_date: Option<String>,
}

/// Forward-adjusted daily close
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub trade_date: String,
    pub close: Option<f64>,
}

/// Daily valuation ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub trade_date: String,
    pub pe_ttm: Option<f64>,
    pub pb: Option<f64>,
    pub dv_ratio: Option<f64>,
    pub turnover_rate: Option<f64>,
    pub total_mv: Option<f64>,
}

/// Income statement row (cumulative within the fiscal year)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub end_date: String,
    pub total_revenue: Option<f64>,
    pub n_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheetRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub end_date: String,
    pub total_share: Option<f64>,
    /// Shareholders' equity excluding minority interest
    pub total_hldr_eqy_exc_min_int: Option<f64>,
    pub total_liab: Option<f64>,
    pub total_assets: Option<f64>,
    pub money_cap: Option<f64>,
    pub short_loan: Option<f64>,
    pub long_loan: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashflowRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub end_date: String,
    pub n_cashflow_act: Option<f64>,
    pub c_paid_for_fix_assets: Option<f64>,
}

/// Financial indicator ratios (percentages)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub ts_code: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub end_date: String,
    pub roe: Option<f64>,
    pub grossprofit_margin: Option<f64>,
    pub netprofit_margin: Option<f64>,
}

period_row!(PriceRow, trade_date);
period_row!(ValuationRow, trade_date);
period_row!(IncomeRow, end_date);
period_row!(BalanceSheetRow, end_date);
period_row!(CashflowRow, end_date);
period_row!(IndicatorRow, end_date);

// ---------------------------------------------------------------------------
// Merged series
// ---------------------------------------------------------------------------

/// One trading day of the merged price + valuation series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub pb: Option<f64>,
    pub dv_ratio: Option<f64>,
    pub turnover_rate: Option<f64>,
    pub total_mv: Option<f64>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, close: Option<f64>) -> Self {
        Self {
            date,
            close,
            pe_ttm: None,
            pb: None,
            dv_ratio: None,
            turnover_rate: None,
            total_mv: None,
        }
    }
}

/// Fiscal year-end record: union of the four statement sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualFinancials {
    pub ts_code: String,
    pub end_date: NaiveDate,
    // income
    pub total_revenue: Option<f64>,
    pub n_income: Option<f64>,
    // balance sheet
    pub total_share: Option<f64>,
    pub equity: Option<f64>,
    pub total_liab: Option<f64>,
    pub total_assets: Option<f64>,
    // cash flow
    pub n_cashflow_act: Option<f64>,
    pub c_paid_for_fix_assets: Option<f64>,
    // indicators
    pub roe: Option<f64>,
    pub grossprofit_margin: Option<f64>,
    pub netprofit_margin: Option<f64>,
}

impl AnnualFinancials {
    pub fn new(ts_code: &str, end_date: NaiveDate) -> Self {
        Self {
            ts_code: ts_code.to_string(),
            end_date,
            total_revenue: None,
            n_income: None,
            total_share: None,
            equity: None,
            total_liab: None,
            total_assets: None,
            n_cashflow_act: None,
            c_paid_for_fix_assets: None,
            roe: None,
            grossprofit_margin: None,
            netprofit_margin: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report sections
// ---------------------------------------------------------------------------

/// One row of the annual statistical array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualEntry {
    pub year: i32,
    pub sales_per_share: Option<f64>,
    pub eps: Option<f64>,
    pub cash_flow_per_share: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub pe_year_end: Option<f64>,
    pub pb_year_end: Option<f64>,
    pub roe: Option<f64>,
    pub net_margin: Option<f64>,
    /// Shares outstanding in hundred-million units
    pub shares_outstanding: Option<f64>,
    /// Per-share figures were divided by a substituted share count of 1
    pub share_base_substituted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalArray {
    pub annual_data: Vec<AnnualEntry>,
}

/// Trailing CAGR percentages; `None` means not computable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRates {
    pub sales_5y: Option<f64>,
    pub sales_10y: Option<f64>,
    pub eps_5y: Option<f64>,
    pub eps_10y: Option<f64>,
    pub bvps_5y: Option<f64>,
    pub bvps_10y: Option<f64>,
}

/// Reconstructed single-quarter figures in hundred-million units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyEntry {
    pub date: NaiveDate,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyArray {
    /// Newest quarter first
    pub quarters: Vec<QuarterlyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub total_assets: Option<f64>,
    pub total_liab: Option<f64>,
    pub equity: Option<f64>,
    pub cash: Option<f64>,
    pub debt: Option<f64>,
}

/// Header strip taken from the latest trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMetrics {
    pub recent_price: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub pe_10y_median: Option<f64>,
    pub div_yield: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Placeholder ranks; no ranking methodology is implemented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranks {
    pub timeliness: u8,
    pub safety: u8,
    pub technical: u8,
    pub beta: Option<f64>,
}

impl Default for Ranks {
    fn default() -> Self {
        Self {
            timeliness: 3,
            safety: 3,
            technical: 3,
            beta: Some(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub ts_code: String,
    pub name: String,
    pub fullname: Option<String>,
    pub industry: Option<String>,
    pub market: Option<String>,
    pub list_date: Option<String>,
    pub report_date: NaiveDate,
}

impl ReportMeta {
    pub fn from_security(meta: SecurityMeta, report_date: NaiveDate) -> Self {
        Self {
            ts_code: meta.ts_code,
            name: meta.name,
            fullname: meta.fullname,
            industry: meta.industry,
            market: meta.market,
            list_date: meta.list_date,
            report_date,
        }
    }
}

/// Parallel daily series for the price/valuation chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub dates: Vec<NaiveDate>,
    pub price: Vec<Option<f64>>,
    pub pe: Vec<Option<f64>>,
    pub pb: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn from_daily(daily: &[DailyRecord]) -> Self {
        Self {
            dates: daily.iter().map(|d| d.date).collect(),
            price: daily.iter().map(|d| d.close).collect(),
            pe: daily.iter().map(|d| d.pe_ttm).collect(),
            pb: daily.iter().map(|d| d.pb).collect(),
        }
    }
}

/// The assembled single-security statistical report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalReport {
    pub meta: ReportMeta,
    pub ranks: Ranks,
    pub top_metrics: Section<TopMetrics>,
    pub chart: ChartSeries,
    pub statistical_array: Section<StatisticalArray>,
    pub growth_rates: Section<GrowthRates>,
    pub capital_structure: Section<CapitalStructure>,
    pub quarterly_array: Section<QuarterlyArray>,
    pub commentary: String,
}

impl StatisticalReport {
    /// Degraded sections, in report order, with the reason each fell back
    pub fn degraded_reasons(&self) -> Vec<(&'static str, &str)> {
        [
            ("top_metrics", self.top_metrics.reason()),
            ("statistical_array", self.statistical_array.reason()),
            ("growth_rates", self.growth_rates.reason()),
            ("capital_structure", self.capital_structure.reason()),
            ("quarterly_array", self.quarterly_array.reason()),
        ]
        .into_iter()
        .filter_map(|(name, reason)| reason.map(|r| (name, r)))
        .collect()
    }

    /// Names of sections that fell back to an empty result
    pub fn degraded_sections(&self) -> Vec<&'static str> {
        self.degraded_reasons().into_iter().map(|(name, _)| name).collect()
    }
}
