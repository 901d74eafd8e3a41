use chrono::{Datelike, NaiveDate};
use report_core::{parse_period, IncomeRow, QuarterlyArray, QuarterlyEntry};

use crate::{round_to, HUNDRED_MILLION};

/// Exclusive bounds, in days, for two end dates to be one quarter apart.
const QUARTER_GAP_DAYS: (i64, i64) = (80, 100);

#[derive(Debug, Clone, Copy)]
struct Cumulative {
    end: NaiveDate,
    revenue: f64,
    net_income: f64,
}

fn parse_row(row: &IncomeRow) -> Option<Cumulative> {
    let Some(end) = parse_period(&row.end_date) else {
        tracing::debug!(end_date = %row.end_date, "skipping quarterly row with malformed end date");
        return None;
    };
    match (row.total_revenue, row.n_income) {
        (Some(revenue), Some(net_income)) => Some(Cumulative { end, revenue, net_income }),
        _ => {
            tracing::debug!(%end, "skipping quarterly row with missing figures");
            None
        }
    }
}

/// Single-quarter figures for `curr`, or `None` when the pair cannot be
/// decomposed (a quarter is missing in between).
fn single_quarter(prev: &Cumulative, curr: &Cumulative) -> Option<(f64, f64)> {
    let gap = (curr.end - prev.end).num_days();
    if curr.end.year() == prev.end.year() && gap > QUARTER_GAP_DAYS.0 && gap < QUARTER_GAP_DAYS.1 {
        Some((curr.revenue - prev.revenue, curr.net_income - prev.net_income))
    } else if curr.end.month() == 3 {
        // First fiscal quarter: the cumulative figure is the quarter.
        Some((curr.revenue, curr.net_income))
    } else {
        None
    }
}

/// Reconstruct single-quarter revenue and net income from year-to-date rows.
///
/// Uses the `periods` most recent parseable rows. Pairs whose gap fits
/// neither a consecutive quarter nor a new fiscal year are skipped rather
/// than interpolated. Output is newest first, in hundred-million units.
#[tracing::instrument(skip_all, fields(rows = rows.len(), periods = periods))]
pub fn decompose_quarters(rows: &[IncomeRow], periods: usize) -> QuarterlyArray {
    let mut cumulative: Vec<Cumulative> = rows.iter().filter_map(parse_row).collect();
    cumulative.sort_by_key(|p| p.end);
    cumulative.dedup_by_key(|p| p.end);
    if cumulative.len() > periods {
        cumulative.drain(..cumulative.len() - periods);
    }

    let mut quarters: Vec<QuarterlyEntry> = cumulative
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            match single_quarter(prev, curr) {
                Some((revenue, net_income)) => Some(QuarterlyEntry {
                    date: curr.end,
                    revenue: Some(round_to(revenue / HUNDRED_MILLION, 2)),
                    net_income: Some(round_to(net_income / HUNDRED_MILLION, 2)),
                }),
                None => {
                    tracing::debug!(prev = %prev.end, curr = %curr.end, "skipping non-consecutive quarter");
                    None
                }
            }
        })
        .collect();

    quarters.reverse();
    QuarterlyArray { quarters }
}
