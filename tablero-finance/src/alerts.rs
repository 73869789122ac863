//! Budget usage alerts: how much of each category budget is already spent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tablero_core::CurrencyFormat;

use crate::stats::round_to;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    /// Under 70% used
    Safe,
    /// 70% to under 90%
    Warning,
    /// 90% to under 100%
    Danger,
    Exceeded,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Safe,
        AlertLevel::Warning,
        AlertLevel::Danger,
        AlertLevel::Exceeded,
    ];

    pub fn from_usage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            AlertLevel::Exceeded
        } else if percentage >= 90.0 {
            AlertLevel::Danger
        } else if percentage >= 70.0 {
            AlertLevel::Warning
        } else {
            AlertLevel::Safe
        }
    }

    pub fn evaluate(spent: f64, budget: f64) -> Self {
        Self::from_usage(usage_percentage(spent, budget))
    }

    pub fn color(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "#28a745",
            AlertLevel::Warning => "#ffc107",
            AlertLevel::Danger => "#fd7e14",
            AlertLevel::Exceeded => "#dc3545",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "SAFE",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Danger => "DANGER",
            AlertLevel::Exceeded => "EXCEEDED",
        }
    }

    /// Human readable line for one category.
    pub fn message(&self, category: &str, spent: f64, budget: f64, fmt: &CurrencyFormat) -> String {
        let spent = spent.abs();
        let remaining = budget - spent;
        let pct = usage_percentage(spent, budget);
        let (s, b, r) = (fmt.format(spent, false), fmt.format(budget, false), fmt.format(remaining.abs(), false));
        match self {
            AlertLevel::Safe => {
                format!("{category}: on track. Spent {s} of {b} ({pct:.1}%), {r} left.")
            }
            AlertLevel::Warning => {
                format!("{category}: approaching the limit. Spent {s} of {b} ({pct:.1}%), only {r} left.")
            }
            AlertLevel::Danger => {
                format!("{category}: budget almost used up. Spent {s} of {b} ({pct:.1}%), {r} left.")
            }
            AlertLevel::Exceeded => {
                format!("{category}: budget exceeded. Spent {s} against {b} ({pct:.1}%), {r} over.")
            }
        }
    }
}

/// `|spent| / budget * 100`, or 0 for a non-positive budget.
pub fn usage_percentage(spent: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    spent.abs() / budget * 100.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertSummary {
    pub total_budget: f64,
    pub total_spent: f64,
    /// Overall usage across all budgeted categories
    pub usage_percentage: f64,
    pub safe: usize,
    pub warning: usize,
    pub danger: usize,
    pub exceeded: usize,
    pub categories: usize,
}

impl AlertSummary {
    pub fn available(&self) -> f64 {
        self.total_budget - self.total_spent
    }

    pub fn count(&self, level: AlertLevel) -> usize {
        match level {
            AlertLevel::Safe => self.safe,
            AlertLevel::Warning => self.warning,
            AlertLevel::Danger => self.danger,
            AlertLevel::Exceeded => self.exceeded,
        }
    }
}

/// Aggregate usage over `budgets`. Categories missing from `expenses`
/// count as nothing spent.
pub fn summary_metrics(budgets: &[(String, f64)], expenses: &HashMap<String, f64>) -> AlertSummary {
    let mut summary = AlertSummary {
        categories: budgets.len(),
        ..Default::default()
    };

    for (category, budget) in budgets {
        let spent = expenses.get(category).copied().unwrap_or(0.0);
        summary.total_budget += budget;
        summary.total_spent += spent.abs();
        match AlertLevel::evaluate(spent, *budget) {
            AlertLevel::Safe => summary.safe += 1,
            AlertLevel::Warning => summary.warning += 1,
            AlertLevel::Danger => summary.danger += 1,
            AlertLevel::Exceeded => summary.exceeded += 1,
        }
    }

    summary.usage_percentage = usage_percentage(summary.total_spent, summary.total_budget);
    summary
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRow {
    pub category: String,
    pub budget: f64,
    pub spent: f64,
    pub available: f64,
    /// Rounded to one decimal
    pub percent_used: f64,
    pub level: AlertLevel,
}

/// Budget vs. spend table, one row per budget in input order.
pub fn comparison_rows(budgets: &[(String, f64)], expenses: &HashMap<String, f64>) -> Vec<ComparisonRow> {
    budgets
        .iter()
        .map(|(category, budget)| {
            let spent = expenses.get(category).copied().unwrap_or(0.0).abs();
            ComparisonRow {
                category: category.clone(),
                budget: *budget,
                spent,
                available: budget - spent,
                percent_used: round_to(usage_percentage(spent, *budget), 1),
                level: AlertLevel::evaluate(spent, *budget),
            }
        })
        .collect()
}
