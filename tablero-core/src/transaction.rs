//! Transaction log records: one per (category, period) cell of the source sheet.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar fields derived from a period header such as "1/3/2024-31/3/2024".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodInfo {
    /// First day of the period, if the header could be parsed
    pub date: Option<NaiveDate>,
    /// Spanish month name ("Marzo"), or "Desconocido"
    pub month_name: String,
    /// 0 when unknown
    pub year: i32,
    /// "Marzo 2024"
    pub month_year: String,
    /// `year * 100 + month`, 0 when unknown
    pub sort_key: i32,
}

impl PeriodInfo {
    pub fn unknown() -> Self {
        Self {
            date: None,
            month_name: "Desconocido".to_string(),
            year: 0,
            month_year: "Desconocido".to_string(),
            sort_key: 0,
        }
    }
}

/// A single amount for one category label in one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    /// Raw label as found in the source sheet
    pub label: String,
    /// Raw period header
    pub period: String,
    /// Positive = inflow, negative = outflow
    pub amount: f64,
    pub calendar: PeriodInfo,
}

impl TransactionRecord {
    pub fn new(
        label: impl Into<String>,
        period: impl Into<String>,
        amount: f64,
        calendar: PeriodInfo,
    ) -> Self {
        Self {
            label: label.into(),
            period: period.into(),
            amount,
            calendar,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}

/// Where a label landed in the group/category hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Classification {
    pub group: String,
    pub principal: String,
    pub subcategory: Option<String>,
}

impl Classification {
    pub fn new(
        group: impl Into<String>,
        principal: impl Into<String>,
        subcategory: Option<String>,
    ) -> Self {
        Self {
            group: group.into(),
            principal: principal.into(),
            subcategory,
        }
    }
}

/// A transaction with its classification appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    #[serde(flatten)]
    pub classification: Classification,
}

impl ClassifiedTransaction {
    pub fn group(&self) -> &str {
        &self.classification.group
    }

    pub fn principal(&self) -> &str {
        &self.classification.principal
    }

    pub fn amount(&self) -> f64 {
        self.record.amount
    }
}
