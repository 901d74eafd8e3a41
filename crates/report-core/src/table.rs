//! Column-oriented tables as returned by the data provider.
//!
//! The provider answers every query with `{"fields": [...], "items": [[...]]}`.
//! Rows are decoded by column name into explicit record types so that a
//! missing column becomes `None` on the record rather than a failed lookup.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ReportError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
    #[serde(default)]
    pub has_more: bool,
}

impl RawTable {
    /// Decode every item into `T`, matching columns by name.
    pub fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>, ReportError> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let object: Map<String, Value> = self
                    .fields
                    .iter()
                    .cloned()
                    .zip(item.iter().cloned())
                    .collect();
                serde_json::from_value(Value::Object(object)).map_err(|e| {
                    ReportError::InvalidData(format!("row {}: {}", idx, e))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BalanceSheetRow, IncomeRow};
    use serde_json::json;

    fn income_table() -> RawTable {
        serde_json::from_value(json!({
            "fields": ["ts_code", "end_date", "total_revenue", "n_income", "unused_col"],
            "items": [
                ["000001.SZ", "20231231", 1.5e11, 4.6e10, "x"],
                ["000001.SZ", "20221231", null, 4.5e10, "y"]
            ],
            "has_more": false
        }))
        .unwrap()
    }

    #[test]
    fn test_rows_decode_by_column_name() {
        let rows: Vec<IncomeRow> = income_table().rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].end_date, "20231231");
        assert_eq!(rows[0].total_revenue, Some(1.5e11));
        assert_eq!(rows[1].total_revenue, None);
    }

    #[test]
    fn test_missing_columns_become_none() {
        let rows: Vec<BalanceSheetRow> = income_table().rows().unwrap();
        assert_eq!(rows[0].ts_code, "000001.SZ");
        assert_eq!(rows[0].total_share, None);
        assert_eq!(rows[0].short_loan, None);
    }

    #[test]
    fn test_wrong_type_reports_row_index() {
        let table: RawTable = serde_json::from_value(json!({
            "fields": ["ts_code", "end_date", "total_revenue"],
            "items": [["000001.SZ", "20231231", "not a number"]]
        }))
        .unwrap();
        let err = table.rows::<IncomeRow>().unwrap_err();
        assert!(matches!(err, ReportError::InvalidData(ref msg) if msg.starts_with("row 0")));
    }
}
