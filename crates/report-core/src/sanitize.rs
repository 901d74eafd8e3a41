use std::collections::BTreeMap;

use crate::{
    AnnualEntry, CapitalStructure, ChartSeries, GrowthRates, QuarterlyArray, QuarterlyEntry, Ranks,
    Section, StatisticalArray, StatisticalReport, TopMetrics,
};

/// `None` for NaN and +/-Infinity, the value otherwise.
pub fn sanitize_float(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Replace non-finite floats with an explicit missing value, recursively.
///
/// Only `Option<f64>` slots are rewritten; every other leaf is left alone.
pub trait Sanitize {
    fn sanitize_in_place(&mut self);

    fn sanitize(mut self) -> Self
    where
        Self: Sized,
    {
        self.sanitize_in_place();
        self
    }
}

impl Sanitize for Option<f64> {
    fn sanitize_in_place(&mut self) {
        if let Some(v) = *self {
            *self = sanitize_float(v);
        }
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize_in_place(&mut self) {
        for item in self.iter_mut() {
            item.sanitize_in_place();
        }
    }
}

impl<K: Ord, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize_in_place(&mut self) {
        for value in self.values_mut() {
            value.sanitize_in_place();
        }
    }
}

impl<T: Sanitize> Sanitize for Section<T> {
    fn sanitize_in_place(&mut self) {
        if let Section::Ready(v) = self {
            v.sanitize_in_place();
        }
    }
}

macro_rules! sanitize_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl Sanitize for $ty {
            fn sanitize_in_place(&mut self) {
                $( self.$field.sanitize_in_place(); )*
            }
        }
    };
}

sanitize_fields!(AnnualEntry {
    sales_per_share,
    eps,
    cash_flow_per_share,
    book_value_per_share,
    pe_year_end,
    pb_year_end,
    roe,
    net_margin,
    shares_outstanding,
});
sanitize_fields!(StatisticalArray { annual_data });
sanitize_fields!(GrowthRates { sales_5y, sales_10y, eps_5y, eps_10y, bvps_5y, bvps_10y });
sanitize_fields!(QuarterlyEntry { revenue, net_income });
sanitize_fields!(QuarterlyArray { quarters });
sanitize_fields!(CapitalStructure { total_assets, total_liab, equity, cash, debt });
sanitize_fields!(TopMetrics { recent_price, pe_ttm, pe_10y_median, div_yield, market_cap });
sanitize_fields!(Ranks { beta });
sanitize_fields!(ChartSeries { price, pe, pb });
sanitize_fields!(StatisticalReport {
    ranks,
    top_metrics,
    chart,
    statistical_array,
    growth_rates,
    capital_structure,
    quarterly_array,
});
