use chrono::{Local, NaiveDate};
use report_core::{
    AnnualFinancials, CapitalStructure, ChartSeries, DailyRecord, DateWindow, MarketDataProvider,
    sanitize_float, QuarterlyArray, Ranks, ReportError, ReportMeta, Sanitize, Section,
    StatementQuery, StatisticalReport, TopMetrics, TsCode,
};
use statistical_array::{
    build_statistical_array, calculate_growth_rates, capital_structure, decompose_quarters,
    merge_annual, merge_daily, top_metrics, AnnualSources,
};
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

pub mod config;
pub use config::ReportConfig;

/// Assembles the statistical report for one security.
///
/// Provider calls are made one after another; nothing is cached between
/// reports, so one orchestrator can serve concurrent callers as long as the
/// provider can.
pub struct ReportOrchestrator<P> {
    provider: P,
    config: ReportConfig,
    /// Subscriber the report is generated under, instead of the global one
    dispatch: Option<Dispatch>,
    /// Fixed report date; today when unset
    report_date: Option<NaiveDate>,
}

/// Rows of an optional source, or nothing when the fetch failed.
fn rows_or_empty<T>(source: &str, result: Result<Vec<T>, ReportError>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(source, error = %e, "source unavailable, continuing without it");
            Vec::new()
        }
    }
}

fn display_or_na(value: Option<f64>) -> String {
    value
        .and_then(sanitize_float)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// One-line summary placed at the bottom of the report.
pub fn commentary(meta: &ReportMeta, top: Option<&TopMetrics>) -> String {
    format!(
        "{} ({}) operates in the {} industry. Recent price {}, PE(TTM) {}.",
        meta.name,
        meta.ts_code,
        meta.industry.as_deref().unwrap_or("unknown"),
        display_or_na(top.and_then(|t| t.recent_price)),
        display_or_na(top.and_then(|t| t.pe_ttm)),
    )
}

impl<P: MarketDataProvider> ReportOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ReportConfig::default())
    }

    pub fn with_config(provider: P, config: ReportConfig) -> Self {
        Self {
            provider,
            config,
            dispatch: None,
            report_date: None,
        }
    }

    /// Route this orchestrator's logs to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Pin "today", which anchors the lookback window.
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    fn report_date(&self) -> NaiveDate {
        self.report_date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Build the sanitized report for `code` (bare or exchange-suffixed).
    ///
    /// Fails when the configuration is invalid or the security cannot be
    /// resolved; every other missing input degrades its own section.
    pub async fn generate_report(&self, code: &str) -> Result<StatisticalReport, ReportError> {
        let span = || tracing::info_span!("statistical_report", code = %code.trim());
        match &self.dispatch {
            Some(dispatch) => {
                // The span must belong to the injected subscriber too.
                let span = tracing::dispatcher::with_default(dispatch, span);
                self.assemble(code)
                    .instrument(span)
                    .with_subscriber(dispatch.clone())
                    .await
            }
            None => self.assemble(code).instrument(span()).await,
        }
    }

    async fn assemble(&self, code: &str) -> Result<StatisticalReport, ReportError> {
        self.config.validate()?;
        let ts_code = TsCode::normalize(code);
        tracing::info!("Generating statistical report for {}", ts_code);

        let security = match self.provider.security_meta(&ts_code).await {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                tracing::warn!("Security {} not found", ts_code);
                return Err(ReportError::NotFound(ts_code.to_string()));
            }
            Err(e) => {
                tracing::error!("Meta lookup for {} failed: {}", ts_code, e);
                return Err(e);
            }
        };

        let report_date = self.report_date();
        let meta = ReportMeta::from_security(security, report_date);
        let window = DateWindow::lookback(report_date, self.config.lookback_days)?;

        let daily = self.fetch_daily(&ts_code, window).await;
        let financials = self.fetch_annual(&ts_code, window).await;

        let statistical_array = if financials.is_empty() {
            Section::degraded("no annual statements")
        } else {
            Section::Ready(build_statistical_array(&financials, &daily))
        };
        let growth_rates = match statistical_array.ready() {
            Some(array) => Section::Ready(calculate_growth_rates(array)),
            None => Section::degraded("no statistical array"),
        };
        let ranks = Ranks::default();
        let top_metrics = Section::from_option(top_metrics(&daily), "no daily market data");
        let quarterly_array = self.fetch_quarterly(&ts_code).await;
        let capital_structure = self.fetch_capital_structure(&ts_code).await;
        let commentary = commentary(&meta, top_metrics.ready());

        let report = StatisticalReport {
            meta,
            ranks,
            top_metrics,
            chart: ChartSeries::from_daily(&daily),
            statistical_array,
            growth_rates,
            capital_structure,
            quarterly_array,
            commentary,
        }
        .sanitize();

        let degraded = report.degraded_reasons();
        for (section, reason) in &degraded {
            tracing::warn!(section, reason, "Report section for {} degraded", ts_code);
        }
        tracing::info!("Report for {} complete, {} degraded sections", ts_code, degraded.len());
        Ok(report)
    }

    /// Price series with valuation ratios attached, ascending by date.
    async fn fetch_daily(&self, code: &TsCode, window: DateWindow) -> Vec<DailyRecord> {
        let prices = rows_or_empty("price", self.provider.daily_prices(code, window).await);
        if prices.is_empty() {
            tracing::warn!("No daily prices for {} between {} and {}", code, window.start_param(), window.end_param());
            return Vec::new();
        }
        let valuations = rows_or_empty("valuation", self.provider.daily_valuations(code, window).await);
        let daily = merge_daily(&prices, &valuations);
        tracing::info!("Daily series for {}: {} days", code, daily.len());
        daily
    }

    async fn fetch_annual(&self, code: &TsCode, window: DateWindow) -> Vec<AnnualFinancials> {
        let query = StatementQuery::Window(window);
        let sources = AnnualSources {
            income: rows_or_empty("income", self.provider.income(code, query).await),
            balance: rows_or_empty("balance_sheet", self.provider.balance_sheet(code, query).await),
            cashflow: rows_or_empty("cashflow", self.provider.cashflow(code, query).await),
            indicators: rows_or_empty("indicators", self.provider.financial_indicators(code, query).await),
        };
        let financials = merge_annual(&sources);
        tracing::info!("Annual statements for {}: {} fiscal years", code, financials.len());
        financials
    }

    async fn fetch_quarterly(&self, code: &TsCode) -> Section<QuarterlyArray> {
        let query = StatementQuery::Latest(self.config.quarterly_periods);
        match self.provider.income(code, query).await {
            Ok(rows) if rows.is_empty() => Section::degraded("no quarterly statements"),
            Ok(rows) => Section::Ready(decompose_quarters(&rows, self.config.quarterly_periods)),
            Err(e) => {
                tracing::warn!("Quarterly statements for {} unavailable: {}", code, e);
                Section::degraded(format!("quarterly fetch failed: {}", e))
            }
        }
    }

    async fn fetch_capital_structure(&self, code: &TsCode) -> Section<CapitalStructure> {
        match self.provider.balance_sheet(code, StatementQuery::Latest(1)).await {
            Ok(rows) => Section::from_option(capital_structure(&rows), "no balance sheet"),
            Err(e) => {
                tracing::warn!("Latest balance sheet for {} unavailable: {}", code, e);
                Section::degraded(format!("balance sheet fetch failed: {}", e))
            }
        }
    }
}
