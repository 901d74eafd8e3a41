use anyhow::{Context, Result};
use chrono::NaiveDate;
use report_orchestrator::ReportConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// JSON file holding the recorded provider tables
    pub snapshot_path: PathBuf,
    pub report: ReportConfig,
    /// Pins the report date so a recorded snapshot gives the same window
    pub report_date: Option<NaiveDate>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let snapshot_path = var("STATREPORT_SNAPSHOT")
            .map(PathBuf::from)
            .context("STATREPORT_SNAPSHOT must point to a provider snapshot file")?;

        let mut report = ReportConfig::default();
        if let Some(years) = var("STATREPORT_LOOKBACK_YEARS") {
            let years: i64 = years
                .parse()
                .with_context(|| format!("invalid STATREPORT_LOOKBACK_YEARS: {}", years))?;
            report = ReportConfig::with_lookback_years(years)?;
        }
        if let Some(periods) = var("STATREPORT_QUARTERLY_PERIODS") {
            report.quarterly_periods = periods
                .parse()
                .with_context(|| format!("invalid STATREPORT_QUARTERLY_PERIODS: {}", periods))?;
        }
        report.validate()?;

        let report_date = var("STATREPORT_REPORT_DATE")
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("invalid STATREPORT_REPORT_DATE: {}", raw))
            })
            .transpose()?;

        Ok(Self {
            snapshot_path,
            report,
            report_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_lookup(lookup(&[("STATREPORT_SNAPSHOT", "snap.json")])).unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("snap.json"));
        assert_eq!(config.report, ReportConfig::default());
        assert_eq!(config.report_date, None);
    }

    #[test]
    fn test_overrides() {
        let config = CliConfig::from_lookup(lookup(&[
            ("STATREPORT_SNAPSHOT", "snap.json"),
            ("STATREPORT_LOOKBACK_YEARS", "10"),
            ("STATREPORT_QUARTERLY_PERIODS", "12"),
            ("STATREPORT_REPORT_DATE", "2024-06-28"),
        ]))
        .unwrap();
        assert_eq!(config.report.lookback_days, 3650);
        assert_eq!(config.report.quarterly_periods, 12);
        assert_eq!(config.report_date, NaiveDate::from_ymd_opt(2024, 6, 28));
    }

    #[test]
    fn test_missing_snapshot_is_an_error() {
        assert!(CliConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let snap = ("STATREPORT_SNAPSHOT", "snap.json");
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_LOOKBACK_YEARS", "ten")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_LOOKBACK_YEARS", "0")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_LOOKBACK_YEARS", "1000000")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_LOOKBACK_YEARS", "9223372036854775807")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_QUARTERLY_PERIODS", "1")])).is_err());
        assert!(CliConfig::from_lookup(lookup(&[snap, ("STATREPORT_REPORT_DATE", "20240628")])).is_err());
    }
}
