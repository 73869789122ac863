//! Pick a budgeting methodology for a user profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncomeStability {
    Stable,
    Variable,
    Irregular,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    FiftyThirtyTwenty,
    EnvelopeSystem,
    ZeroBased,
    PayYourselfFirst,
    PercentileMethod,
}

impl Methodology {
    pub fn name(&self) -> &'static str {
        match self {
            Methodology::FiftyThirtyTwenty => "50/30/20",
            Methodology::EnvelopeSystem => "Envelope system",
            Methodology::ZeroBased => "Zero-based",
            Methodology::PayYourselfFirst => "Pay yourself first",
            Methodology::PercentileMethod => "Percentile method",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Methodology::FiftyThirtyTwenty => {
                "50% needs, 30% wants, 20% savings. Suits steady incomes."
            }
            Methodology::EnvelopeSystem => {
                "A fixed envelope per category with a hard limit on each."
            }
            Methodology::ZeroBased => {
                "Every unit of income gets a job: income minus allocations equals zero."
            }
            Methodology::PayYourselfFirst => {
                "Move 20-30% of income to savings on payday and live on the rest."
            }
            Methodology::PercentileMethod => {
                "Budget each category at a percentile of its history: P50 for steady costs, P75 for most, P90 for volatile or critical ones."
            }
        }
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn recommend(income: IncomeStability, control: ControlLevel) -> Methodology {
    match (income, control) {
        (IncomeStability::Stable, ControlLevel::High) => Methodology::ZeroBased,
        (IncomeStability::Stable, ControlLevel::Medium) => Methodology::FiftyThirtyTwenty,
        (IncomeStability::Stable, ControlLevel::Low) => Methodology::PayYourselfFirst,
        (IncomeStability::Variable, ControlLevel::High) => Methodology::EnvelopeSystem,
        (IncomeStability::Variable, _) | (IncomeStability::Irregular, _) => Methodology::PercentileMethod,
    }
}

impl FromStr for IncomeStability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stable" | "estable" => Ok(IncomeStability::Stable),
            "variable" => Ok(IncomeStability::Variable),
            "irregular" => Ok(IncomeStability::Irregular),
            other => Err(format!("unknown income stability '{other}'")),
        }
    }
}

impl FromStr for ControlLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "alto" => Ok(ControlLevel::High),
            "medium" | "medio" => Ok(ControlLevel::Medium),
            "low" | "bajo" => Ok(ControlLevel::Low),
            other => Err(format!("unknown control level '{other}'")),
        }
    }
}
