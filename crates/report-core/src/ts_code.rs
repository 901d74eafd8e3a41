use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange a listed A-share trades on, identified by the suffix of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    Shenzhen,
    Shanghai,
    Beijing,
}

impl Exchange {
    pub const ALL: [Exchange; 3] = [Exchange::Shenzhen, Exchange::Shanghai, Exchange::Beijing];

    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Shenzhen => ".SZ",
            Exchange::Shanghai => ".SH",
            Exchange::Beijing => ".BJ",
        }
    }

    /// Infer the exchange from the leading digit of a bare six-digit code.
    pub fn infer(bare_code: &str) -> Self {
        match bare_code.chars().next() {
            Some('6') => Exchange::Shanghai,
            Some('8') | Some('4') => Exchange::Beijing,
            _ => Exchange::Shenzhen,
        }
    }
}

/// Normalised security identifier, e.g. `000001.SZ`.
///
/// Every provider call receives this form; constructing one through
/// [`TsCode::normalize`] is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TsCode(String);

impl TsCode {
    pub fn normalize(code: &str) -> Self {
        let code = code.trim();
        if Exchange::ALL.iter().any(|ex| code.ends_with(ex.suffix())) {
            return TsCode(code.to_string());
        }
        let exchange = Exchange::infer(code);
        TsCode(format!("{}{}", code, exchange.suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TsCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
