use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use report_core::{
    parse_period, AnnualFinancials, BalanceSheetRow, CashflowRow, DailyRecord, IncomeRow,
    IndicatorRow, PeriodRow, PriceRow, ValuationRow,
};

/// Join key. Date first so that map order is ascending by period.
type Key = (NaiveDate, String);

/// Statement tables feeding the annual merge. Any of them may be empty.
#[derive(Debug, Clone, Default)]
pub struct AnnualSources {
    pub income: Vec<IncomeRow>,
    pub balance: Vec<BalanceSheetRow>,
    pub cashflow: Vec<CashflowRow>,
    pub indicators: Vec<IndicatorRow>,
}

impl AnnualSources {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty()
            && self.balance.is_empty()
            && self.cashflow.is_empty()
            && self.indicators.is_empty()
    }
}

/// Parse and de-duplicate the keys of one source table.
///
/// Rows with an unparseable period are dropped; the first row wins when a
/// key repeats. Rows rejected by `keep` are discarded before de-duplication.
fn keyed_rows<'a, R, F>(rows: &'a [R], source: &str, keep: F) -> Vec<(Key, &'a R)>
where
    R: PeriodRow,
    F: Fn(NaiveDate) -> bool,
{
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = parse_period(row.period()) else {
            tracing::debug!(source, period = row.period(), "dropping row with malformed period");
            continue;
        };
        if !keep(date) {
            continue;
        }
        let key = (date, row.ts_code().to_string());
        if seen.insert(key.clone()) {
            out.push((key, row));
        }
    }
    out
}

fn is_year_end(date: NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31
}

/// Left-join daily valuations onto the price series.
///
/// The price series decides which dates exist; valuation fields stay `None`
/// where the valuation table has no matching day. Output is ascending by date.
pub fn merge_daily(prices: &[PriceRow], valuations: &[ValuationRow]) -> Vec<DailyRecord> {
    if prices.is_empty() {
        return Vec::new();
    }

    let mut merged: BTreeMap<Key, DailyRecord> = keyed_rows(prices, "price", |_| true)
        .into_iter()
        .map(|(key, row)| {
            let record = DailyRecord::new(key.0, row.close);
            (key, record)
        })
        .collect();

    let mut attached = 0usize;
    for (key, row) in keyed_rows(valuations, "valuation", |_| true) {
        if let Some(record) = merged.get_mut(&key) {
            record.pe_ttm = row.pe_ttm;
            record.pb = row.pb;
            record.dv_ratio = row.dv_ratio;
            record.turnover_rate = row.turnover_rate;
            record.total_mv = row.total_mv;
            attached += 1;
        }
    }

    tracing::debug!(days = merged.len(), with_valuation = attached, "merged daily series");
    merged.into_values().collect()
}

/// Copy one statement row's columns onto the merged annual record.
trait MergeInto {
    fn merge_into(&self, target: &mut AnnualFinancials);
}

impl MergeInto for IncomeRow {
    fn merge_into(&self, target: &mut AnnualFinancials) {
        target.total_revenue = self.total_revenue;
        target.n_income = self.n_income;
    }
}

impl MergeInto for BalanceSheetRow {
    fn merge_into(&self, target: &mut AnnualFinancials) {
        target.total_share = self.total_share;
        target.equity = self.total_hldr_eqy_exc_min_int;
        target.total_liab = self.total_liab;
        target.total_assets = self.total_assets;
    }
}

impl MergeInto for CashflowRow {
    fn merge_into(&self, target: &mut AnnualFinancials) {
        target.n_cashflow_act = self.n_cashflow_act;
        target.c_paid_for_fix_assets = self.c_paid_for_fix_assets;
    }
}

impl MergeInto for IndicatorRow {
    fn merge_into(&self, target: &mut AnnualFinancials) {
        target.roe = self.roe;
        target.grossprofit_margin = self.grossprofit_margin;
        target.netprofit_margin = self.netprofit_margin;
    }
}

fn outer_join<R: PeriodRow + MergeInto>(
    merged: &mut BTreeMap<Key, AnnualFinancials>,
    rows: &[R],
    source: &str,
) {
    for ((date, code), row) in keyed_rows(rows, source, is_year_end) {
        let record = merged
            .entry((date, code.clone()))
            .or_insert_with(|| AnnualFinancials::new(&code, date));
        row.merge_into(record);
    }
}

/// Full outer join of the year-end rows of every statement source.
///
/// A year missing from one source still appears, with that source's fields
/// left `None`. Output is ascending by end date.
pub fn merge_annual(sources: &AnnualSources) -> Vec<AnnualFinancials> {
    if sources.is_empty() {
        return Vec::new();
    }

    let mut merged = BTreeMap::new();
    outer_join(&mut merged, &sources.income, "income");
    outer_join(&mut merged, &sources.balance, "balance_sheet");
    outer_join(&mut merged, &sources.cashflow, "cashflow");
    outer_join(&mut merged, &sources.indicators, "indicators");

    tracing::debug!(years = merged.len(), "merged annual statements");
    merged.into_values().collect()
}
