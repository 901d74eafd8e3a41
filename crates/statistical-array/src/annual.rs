use chrono::Datelike;
use report_core::{AnnualEntry, AnnualFinancials, DailyRecord, StatisticalArray};

use crate::{round_to, HUNDRED_MILLION};

/// Share count used as the per-share divisor.
///
/// Zero or missing counts fall back to 1 so the division never fails; the
/// resulting per-share values equal the raw aggregates and are flagged.
fn share_base(total_share: Option<f64>) -> (f64, bool) {
    match total_share {
        Some(shares) if shares != 0.0 && !shares.is_nan() => (shares, false),
        _ => (1.0, true),
    }
}

fn per_share(aggregate: Option<f64>, shares: f64) -> Option<f64> {
    aggregate.map(|v| round_to(v / shares, 2))
}

/// A valuation ratio of zero carries no information.
fn valuation_ratio(value: Option<f64>, decimals: i32) -> Option<f64> {
    value.filter(|v| *v != 0.0).map(|v| round_to(v, decimals))
}

/// Last trading day's P/E and P/B within `year`.
fn year_end_valuation(daily: &[DailyRecord], year: i32) -> (Option<f64>, Option<f64>) {
    match daily.iter().filter(|d| d.date.year() == year).last() {
        Some(last) => (valuation_ratio(last.pe_ttm, 1), valuation_ratio(last.pb, 2)),
        None => (None, None),
    }
}

fn annual_entry(record: &AnnualFinancials, daily: &[DailyRecord]) -> AnnualEntry {
    let year = record.end_date.year();
    let (shares, substituted) = share_base(record.total_share);
    if substituted {
        tracing::warn!(
            ts_code = %record.ts_code,
            year,
            "shares outstanding missing or zero, per-share figures use a divisor of 1"
        );
    }

    let (pe_year_end, pb_year_end) = year_end_valuation(daily, year);

    AnnualEntry {
        year,
        sales_per_share: per_share(record.total_revenue, shares),
        eps: per_share(record.n_income, shares),
        cash_flow_per_share: per_share(record.n_cashflow_act, shares),
        book_value_per_share: per_share(record.equity, shares),
        pe_year_end,
        pb_year_end,
        roe: record.roe.map(|v| round_to(v, 2)),
        net_margin: record.netprofit_margin.map(|v| round_to(v, 2)),
        shares_outstanding: Some(round_to(shares / HUNDRED_MILLION, 2)),
        share_base_substituted: substituted,
    }
}

/// Convert merged annual statements into the per-share statistical array.
///
/// `daily` must be ascending by date; the output is ascending by year.
#[tracing::instrument(skip_all, fields(years = financials.len()))]
pub fn build_statistical_array(financials: &[AnnualFinancials], daily: &[DailyRecord]) -> StatisticalArray {
    let mut annual_data: Vec<AnnualEntry> = financials.iter().map(|r| annual_entry(r, daily)).collect();
    annual_data.sort_by_key(|e| e.year);
    StatisticalArray { annual_data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year(y: i32, shares: Option<f64>) -> AnnualFinancials {
        let mut r = AnnualFinancials::new("000001.SZ", ymd(y, 12, 31));
        r.total_revenue = Some(2_000_000_000.0);
        r.n_income = Some(300_000_000.0);
        r.n_cashflow_act = Some(450_000_000.0);
        r.equity = Some(5_000_000_000.0);
        r.total_share = shares;
        r.roe = Some(12.3456);
        r.netprofit_margin = Some(15.0);
        r
    }

    fn day(date: NaiveDate, pe: Option<f64>, pb: Option<f64>) -> DailyRecord {
        let mut d = DailyRecord::new(date, Some(10.0));
        d.pe_ttm = pe;
        d.pb = pb;
        d
    }

    #[test]
    fn test_per_share_metrics() {
        let array = build_statistical_array(&[year(2023, Some(1_000_000_000.0))], &[]);
        let entry = &array.annual_data[0];

        assert_eq!(entry.year, 2023);
        assert_relative_eq!(entry.sales_per_share.unwrap(), 2.0);
        assert_relative_eq!(entry.eps.unwrap(), 0.3);
        assert_relative_eq!(entry.cash_flow_per_share.unwrap(), 0.45);
        assert_relative_eq!(entry.book_value_per_share.unwrap(), 5.0);
        assert_relative_eq!(entry.shares_outstanding.unwrap(), 10.0);
        assert_relative_eq!(entry.roe.unwrap(), 12.35);
        assert!(!entry.share_base_substituted);
    }

    #[test]
    fn test_zero_shares_uses_divisor_of_one() {
        // Reproduces the upstream quirk: per-share values equal raw aggregates.
        let array = build_statistical_array(&[year(2023, Some(0.0))], &[]);
        let entry = &array.annual_data[0];

        assert_relative_eq!(entry.sales_per_share.unwrap(), 2_000_000_000.0);
        assert_relative_eq!(entry.eps.unwrap(), 300_000_000.0);
        assert_relative_eq!(entry.book_value_per_share.unwrap(), 5_000_000_000.0);
        assert_eq!(entry.shares_outstanding, Some(0.0));
        assert!(entry.share_base_substituted);
    }

    #[test]
    fn test_missing_shares_uses_divisor_of_one() {
        let array = build_statistical_array(&[year(2023, None)], &[]);
        assert_relative_eq!(array.annual_data[0].cash_flow_per_share.unwrap(), 450_000_000.0);
        assert!(array.annual_data[0].share_base_substituted);
    }

    #[test]
    fn test_missing_aggregate_stays_none() {
        let mut record = year(2023, Some(1.0e9));
        record.n_cashflow_act = None;
        record.roe = None;
        let entry = &build_statistical_array(&[record], &[]).annual_data[0];
        assert_eq!(entry.cash_flow_per_share, None);
        assert_eq!(entry.roe, None);
    }

    #[test]
    fn test_year_end_valuation_uses_last_day_of_year() {
        let daily = vec![
            day(ymd(2023, 6, 30), Some(9.0), Some(1.0)),
            day(ymd(2023, 12, 29), Some(7.46), Some(0.555)),
            day(ymd(2024, 1, 2), Some(8.0), Some(0.7)),
        ];
        let entry = &build_statistical_array(&[year(2023, Some(1.0e9))], &daily).annual_data[0];
        assert_eq!(entry.pe_year_end, Some(7.5));
        assert_eq!(entry.pb_year_end, Some(0.56));
    }

    #[test]
    fn test_no_trading_days_in_year() {
        let daily = vec![day(ymd(2024, 1, 2), Some(8.0), Some(0.7))];
        let entry = &build_statistical_array(&[year(2023, Some(1.0e9))], &daily).annual_data[0];
        assert_eq!(entry.pe_year_end, None);
        assert_eq!(entry.pb_year_end, None);
    }

    #[test]
    fn test_zero_valuation_is_not_available() {
        let daily = vec![day(ymd(2023, 12, 29), Some(0.0), None)];
        let entry = &build_statistical_array(&[year(2023, Some(1.0e9))], &daily).annual_data[0];
        assert_eq!(entry.pe_year_end, None);
        assert_eq!(entry.pb_year_end, None);
    }

    #[test]
    fn test_output_ascending_by_year() {
        let array = build_statistical_array(
            &[year(2022, Some(1.0e9)), year(2020, Some(1.0e9)), year(2021, Some(1.0e9))],
            &[],
        );
        let years: Vec<i32> = array.annual_data.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
    }
}
