//! Caller-owned filter over a classified transaction log.
//!
//! Every field left at its default means "no constraint". Filters are plain
//! data so they can be saved by name and re-applied later.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::transaction::ClassifiedTransaction;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AmountKind {
    #[default]
    All,
    Expenses,
    Income,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TransactionFilter {
    /// Inclusive range on the period start date
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub years: Vec<i32>,
    /// Spanish month names ("Enero", ...)
    pub months: Vec<String>,
    /// Group display names
    pub groups: Vec<String>,
    /// Principal categories
    pub categories: Vec<String>,
    /// Inclusive range on the signed amount
    pub amount_range: Option<(f64, f64)>,
    pub min_abs_amount: Option<f64>,
    pub kind: AmountKind,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, tx: &ClassifiedTransaction) -> bool {
        let cal = &tx.record.calendar;
        let amount = tx.record.amount;

        if let Some((from, to)) = self.date_range {
            match cal.date {
                Some(d) if d >= from && d <= to => {}
                _ => return false,
            }
        }
        if !self.years.is_empty() && !self.years.contains(&cal.year) {
            return false;
        }
        if !self.months.is_empty() && !self.months.contains(&cal.month_name) {
            return false;
        }
        if !self.groups.is_empty() && !self.groups.iter().any(|g| g == tx.group()) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| c == tx.principal()) {
            return false;
        }
        if let Some((lo, hi)) = self.amount_range {
            if amount < lo || amount > hi {
                return false;
            }
        }
        if let Some(min) = self.min_abs_amount {
            if amount.abs() < min {
                return false;
            }
        }
        match self.kind {
            AmountKind::All => true,
            AmountKind::Expenses => amount < 0.0,
            AmountKind::Income => amount > 0.0,
        }
    }

    /// Rows that pass the filter, in their original order.
    pub fn apply<'a>(&self, rows: &'a [ClassifiedTransaction]) -> Vec<&'a ClassifiedTransaction> {
        rows.iter().filter(|tx| self.matches(tx)).collect()
    }
}
