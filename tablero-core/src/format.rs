//! Money and number formatting for reports.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SymbolPosition {
    #[default]
    #[serde(rename = "antes")]
    Before,
    #[serde(rename = "despues", alias = "después")]
    After,
}

/// `formato_moneda` section of the category config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrencyFormat {
    #[serde(rename = "simbolo")]
    pub symbol: String,
    #[serde(rename = "separador_miles")]
    pub thousands_separator: String,
    #[serde(rename = "separador_decimal")]
    pub decimal_separator: String,
    #[serde(rename = "decimales")]
    pub decimals: usize,
    #[serde(rename = "posicion_simbolo")]
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            decimals: 2,
            symbol_position: SymbolPosition::Before,
        }
    }
}

impl CurrencyFormat {
    /// Format an amount, e.g. `-$1,234.50` or `+1.234,50€`.
    pub fn format(&self, amount: f64, with_sign: bool) -> String {
        let sign = if with_sign && amount != 0.0 {
            if amount > 0.0 { "+" } else { "-" }
        } else {
            ""
        };

        let fixed = format!("{:.*}", self.decimals, amount.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut body = group_thousands(int_part, &self.thousands_separator);
        if let Some(frac) = frac_part {
            body.push_str(&self.decimal_separator);
            body.push_str(frac);
        }

        match self.symbol_position {
            SymbolPosition::Before => format!("{sign}{}{body}", self.symbol),
            SymbolPosition::After => format!("{sign}{body}{}", self.symbol),
        }
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Abbreviate large values: 1500 → "1.5K", -2_300_000 → "-2.3M".
pub fn abbreviate(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let v = value.abs();
    if v >= 1_000_000_000.0 {
        format!("{sign}{:.1}B", v / 1_000_000_000.0)
    } else if v >= 1_000_000.0 {
        format!("{sign}{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{sign}{:.1}K", v / 1_000.0)
    } else {
        format!("{sign}{v:.0}")
    }
}
