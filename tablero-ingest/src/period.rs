//! Period headers of the wide sheet.
//!
//! Headers look like `1/3/2024-31/3/2024` (day first). Only the start date
//! matters: it places the column on the calendar.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tablero_core::PeriodInfo;

const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS_ES.get(month.checked_sub(1)? as usize).copied()
}

/// Inverse of [`month_name`].
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS_ES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name.trim()))
        .map(|i| i as u32 + 1)
}

pub struct PeriodParser {
    start_re: Regex,
}

impl PeriodParser {
    pub fn new() -> Result<Self> {
        // D/M/YYYY (also D.M.YYYY and two-digit years), before the range dash
        let start_re = Regex::new(
            r"^\s*(?P<day>\d{1,2})[/.](?P<month>\d{1,2})[/.](?P<year>\d{4}|\d{2})\s*(?:-|$)",
        )?;
        Ok(Self { start_re })
    }

    pub fn start_date(&self, period: &str) -> Option<NaiveDate> {
        let caps = self.start_re.captures(period)?;
        let day: u32 = caps["day"].parse().ok()?;
        let month: u32 = caps["month"].parse().ok()?;
        let mut year: i32 = caps["year"].parse().ok()?;
        if caps["year"].len() == 2 {
            year += 2000;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Calendar fields for a period header; unknown fields when unparsable.
    pub fn parse(&self, period: &str) -> PeriodInfo {
        let Some(date) = self.start_date(period) else {
            tracing::warn!(period = %period, "could not parse period header");
            return PeriodInfo::unknown();
        };

        let month = month_name(date.month()).unwrap_or("Desconocido");
        PeriodInfo {
            date: Some(date),
            month_name: month.to_string(),
            year: date.year(),
            month_year: format!("{month} {}", date.year()),
            sort_key: date.year() * 100 + date.month() as i32,
        }
    }
}
