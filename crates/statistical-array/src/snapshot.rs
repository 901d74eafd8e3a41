use report_core::{parse_period, BalanceSheetRow, CapitalStructure, DailyRecord, TopMetrics};

use crate::round_to;

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Header strip from the latest trading day of an ascending daily series.
///
/// The P/E median runs over every day in the series that carries a P/E.
pub fn top_metrics(daily: &[DailyRecord]) -> Option<TopMetrics> {
    let latest = daily.last()?;
    let mut pe_history: Vec<f64> = daily
        .iter()
        .filter_map(|d| d.pe_ttm)
        .filter(|v| v.is_finite())
        .collect();

    Some(TopMetrics {
        recent_price: latest.close,
        pe_ttm: latest.pe_ttm,
        pe_10y_median: median(&mut pe_history).map(|m| round_to(m, 1)),
        div_yield: latest.dv_ratio,
        market_cap: latest.total_mv,
    })
}

/// Capital structure from the most recent balance sheet.
///
/// Debt is short- plus long-term borrowings, an absent term counting as zero.
pub fn capital_structure(rows: &[BalanceSheetRow]) -> Option<CapitalStructure> {
    // Rows with unparseable dates sort before any dated row.
    let latest = rows
        .iter()
        .enumerate()
        .max_by_key(|(idx, r)| (parse_period(&r.end_date), std::cmp::Reverse(*idx)))
        .map(|(_, r)| r)?;

    Some(CapitalStructure {
        total_assets: latest.total_assets,
        total_liab: latest.total_liab,
        equity: latest.total_hldr_eqy_exc_min_int,
        cash: latest.money_cap,
        debt: Some(latest.short_loan.unwrap_or(0.0) + latest.long_loan.unwrap_or(0.0)),
    })
}
