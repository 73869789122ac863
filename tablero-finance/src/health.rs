//! Financial health: savings rate, emergency runway, spending balance across
//! groups, and a 0-100 score combining the three.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tablero_core::{ClassifiedTransaction, SUMMARY_GROUP};

pub const NECESSARY_GROUP: &str = "Necesario";
pub const BASIC_GROUP: &str = "Básico";
pub const DISCRETIONARY_GROUP: &str = "Discrecional";

/// `(income - |expenses|) / income * 100`, 0 without income.
pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    (income - expenses.abs()) / income * 100.0
}

/// Months the balance covers the necessary monthly spend.
pub fn emergency_runway(monthly_needs: f64, balance: f64) -> f64 {
    if monthly_needs <= 0.0 {
        return 0.0;
    }
    balance / monthly_needs.abs()
}

/// Share of outflow per expense group, in percent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupRatios {
    pub necessary: f64,
    pub basic: f64,
    pub discretionary: f64,
}

pub fn group_ratios(rows: &[ClassifiedTransaction]) -> GroupRatios {
    let expenses: Vec<&ClassifiedTransaction> = rows.iter().filter(|r| r.amount() < 0.0).collect();
    let total: f64 = expenses.iter().map(|r| r.amount()).sum::<f64>().abs();
    if total == 0.0 {
        return GroupRatios::default();
    }

    let share = |group: &str| {
        let sum: f64 = expenses
            .iter()
            .filter(|r| r.group() == group)
            .map(|r| r.amount())
            .sum();
        sum.abs() / total * 100.0
    };

    GroupRatios {
        necessary: share(NECESSARY_GROUP),
        basic: share(BASIC_GROUP),
        discretionary: share(DISCRETIONARY_GROUP),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthRating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl HealthRating {
    pub fn label(&self) -> &'static str {
        match self {
            HealthRating::Excellent => "Excellent",
            HealthRating::Good => "Good",
            HealthRating::Fair => "Fair",
            HealthRating::NeedsImprovement => "Needs improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthScore {
    /// 0-100
    pub score: u8,
    pub rating: HealthRating,
}

/// Savings (40 pts) + runway (30 pts) + closeness to a 50/30/20
/// necessary/basic/discretionary split (30 pts).
pub fn health_score(savings_rate: f64, runway: f64, ratios: &GroupRatios) -> HealthScore {
    let savings_points = if savings_rate >= 30.0 {
        40.0
    } else if savings_rate >= 20.0 {
        30.0
    } else if savings_rate >= 10.0 {
        20.0
    } else {
        savings_rate.max(0.0)
    };

    let runway_points = if runway >= 6.0 {
        30.0
    } else if runway >= 3.0 {
        20.0
    } else if runway >= 1.0 {
        10.0
    } else {
        (runway * 5.0).max(0.0)
    };

    let deviation = (ratios.necessary - 50.0).abs()
        + (ratios.basic - 30.0).abs()
        + (ratios.discretionary - 20.0).abs();
    let balance_points = (30.0 - deviation / 3.0).max(0.0);

    let score = savings_points + runway_points + balance_points;
    let rating = if score >= 80.0 {
        HealthRating::Excellent
    } else if score >= 60.0 {
        HealthRating::Good
    } else if score >= 40.0 {
        HealthRating::Fair
    } else {
        HealthRating::NeedsImprovement
    };

    HealthScore {
        score: score.round().clamp(0.0, 100.0) as u8,
        rating,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// Principal category with the largest total outflow.
pub fn top_expense(rows: &[ClassifiedTransaction]) -> Option<(String, f64)> {
    let mut per_principal: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.amount() < 0.0) {
        *per_principal.entry(row.principal()).or_default() += row.amount();
    }

    let mut best: Option<(&str, f64)> = None;
    for (principal, sum) in per_principal {
        let spent = sum.abs();
        if best.is_none_or(|(_, b)| spent > b) {
            best = Some((principal, spent));
        }
    }
    best.map(|(p, s)| (p.to_string(), s))
}

pub fn insights(rows: &[ClassifiedTransaction], savings_rate: f64, ratios: &GroupRatios) -> Vec<Insight> {
    let mut out = Vec::new();

    out.push(if savings_rate >= 30.0 {
        Insight::new(
            InsightKind::Success,
            format!("Savings rate is {savings_rate:.1}%, well above the recommended 20%"),
        )
    } else if savings_rate >= 20.0 {
        Insight::new(
            InsightKind::Success,
            format!("Savings rate is {savings_rate:.1}%, meeting the recommended minimum"),
        )
    } else if savings_rate >= 10.0 {
        Insight::new(
            InsightKind::Warning,
            format!("Savings rate is {savings_rate:.1}%. Aim for 20% for a safer margin"),
        )
    } else {
        Insight::new(
            InsightKind::Warning,
            format!("Low savings rate ({savings_rate:.1}%). Consider cutting discretionary spending"),
        )
    });

    if ratios.necessary > 60.0 {
        out.push(Insight::new(
            InsightKind::Warning,
            format!(
                "Necessary expenses are {:.1}% of all spending. Look for ways to lower essential costs",
                ratios.necessary
            ),
        ));
    }
    if ratios.discretionary > 30.0 {
        out.push(Insight::new(
            InsightKind::Info,
            format!(
                "Discretionary expenses are {:.1}% of the total. There is room to save here",
                ratios.discretionary
            ),
        ));
    }

    if let Some((principal, spent)) = top_expense(rows) {
        out.push(Insight::new(
            InsightKind::Info,
            format!("Largest expense is \"{principal}\" with {spent:.0}"),
        ));
    }

    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    pub income: f64,
    /// Negative
    pub expenses: f64,
    pub balance: f64,
    pub savings_rate: f64,
    pub months: usize,
    pub monthly_necessary: f64,
    pub emergency_runway: f64,
    pub ratios: GroupRatios,
    pub score: HealthScore,
    pub insights: Vec<Insight>,
}

impl HealthReport {
    /// Summary rows (`Resumen` group) are aggregates and are left out.
    pub fn from_transactions(rows: &[ClassifiedTransaction]) -> Self {
        let rows: Vec<ClassifiedTransaction> = rows
            .iter()
            .filter(|r| r.group() != SUMMARY_GROUP)
            .cloned()
            .collect();

        let income: f64 = rows.iter().map(|r| r.amount()).filter(|a| *a > 0.0).sum();
        let expenses: f64 = rows.iter().map(|r| r.amount()).filter(|a| *a < 0.0).sum();
        let balance = income + expenses;
        let rate = savings_rate(income, expenses);

        let necessary: f64 = rows
            .iter()
            .filter(|r| r.amount() < 0.0 && r.group() == NECESSARY_GROUP)
            .map(|r| r.amount())
            .sum();
        let months = rows
            .iter()
            .map(|r| r.record.calendar.month_year.as_str())
            .collect::<HashSet<_>>()
            .len();
        let monthly_necessary = necessary.abs() / months.max(1) as f64;
        let runway = emergency_runway(monthly_necessary, balance);

        let ratios = group_ratios(&rows);
        let score = health_score(rate, runway, &ratios);
        let insights = insights(&rows, rate, &ratios);

        tracing::debug!(score = score.score, rows = rows.len(), months, "health report computed");

        Self {
            income,
            expenses,
            balance,
            savings_rate: rate,
            months,
            monthly_necessary,
            emergency_runway: runway,
            ratios,
            score,
            insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablero_core::{Classification, PeriodInfo, TransactionRecord};

    fn tx(label: &str, group: &str, amount: f64, month_year: &str) -> ClassifiedTransaction {
        let calendar = PeriodInfo {
            month_year: month_year.to_string(),
            ..PeriodInfo::unknown()
        };
        ClassifiedTransaction {
            record: TransactionRecord::new(label, "p", amount, calendar),
            classification: Classification::new(group, label, None),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_savings_rate() {
        assert_eq!(savings_rate(0.0, -100.0), 0.0);
        assert_eq!(savings_rate(1000.0, -700.0), 30.0);
        assert_eq!(savings_rate(1000.0, 700.0), 30.0);
        assert_eq!(savings_rate(1000.0, -1500.0), -50.0);
    }

    #[test]
    fn test_emergency_runway() {
        assert_eq!(emergency_runway(0.0, 5000.0), 0.0);
        assert_eq!(emergency_runway(500.0, 3000.0), 6.0);
        assert_eq!(emergency_runway(-500.0, 3000.0), 6.0);
    }

    #[test]
    fn test_group_ratios() {
        let rows = vec![
            tx("Alquiler", "Necesario", -500.0, "Enero 2024"),
            tx("Super", "Básico", -300.0, "Enero 2024"),
            tx("Cine", "Discrecional", -200.0, "Enero 2024"),
            tx("Sueldo", "Ingreso Regular", 2000.0, "Enero 2024"),
        ];
        let r = group_ratios(&rows);
        assert_close(r.necessary, 50.0);
        assert_close(r.basic, 30.0);
        assert_close(r.discretionary, 20.0);

        let none = group_ratios(&rows[3..]);
        assert_eq!(none, GroupRatios::default());
    }

    #[test]
    fn test_health_score_components() {
        let ideal = GroupRatios { necessary: 50.0, basic: 30.0, discretionary: 20.0 };
        let top = health_score(35.0, 7.0, &ideal);
        assert_eq!(top.score, 100);
        assert_eq!(top.rating, HealthRating::Excellent);

        // 20 + 10 + (30 - 30/3) = 50
        let skewed = GroupRatios { necessary: 65.0, basic: 30.0, discretionary: 5.0 };
        let fair = health_score(12.0, 1.5, &skewed);
        assert_eq!(fair.score, 50);
        assert_eq!(fair.rating, HealthRating::Fair);

        // 5 + 0.5*5 + 0
        let broke = GroupRatios { necessary: 100.0, basic: 0.0, discretionary: 0.0 };
        let poor = health_score(5.0, 0.5, &broke);
        assert_eq!(poor.score, 8);
        assert_eq!(poor.rating, HealthRating::NeedsImprovement);

        let negative = health_score(-40.0, -2.0, &broke);
        assert_eq!(negative.score, 0);
    }

    #[test]
    fn test_rating_boundaries() {
        let ideal = GroupRatios { necessary: 50.0, basic: 30.0, discretionary: 20.0 };
        // 30 + 20 + 30
        assert_eq!(health_score(20.0, 3.0, &ideal).rating, HealthRating::Excellent);
        // 20 + 10 + 30
        assert_eq!(health_score(10.0, 1.0, &ideal).rating, HealthRating::Good);
    }

    #[test]
    fn test_insights() {
        let rows = vec![
            tx("Alquiler", "Necesario", -700.0, "Enero 2024"),
            tx("Cine", "Discrecional", -300.0, "Enero 2024"),
        ];
        let ratios = group_ratios(&rows);
        let found = insights(&rows, 5.0, &ratios);
        assert_eq!(found.len(), 3, "{found:?}");
        assert_eq!(found[0].kind, InsightKind::Warning);
        assert!(found[0].message.contains("5.0%"));
        assert!(found[1].message.starts_with("Necessary expenses are 70.0%"));
        assert_eq!(found[2].kind, InsightKind::Info);
        assert!(found[2].message.contains("\"Alquiler\" with 700"));

        let ok = insights(&[], 32.0, &GroupRatios::default());
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].kind, InsightKind::Success);
    }

    #[test]
    fn test_top_expense_sums_per_principal() {
        let rows = vec![
            tx("Super", "Básico", -100.0, "Enero 2024"),
            tx("Super", "Básico", -100.0, "Febrero 2024"),
            tx("Luz", "Necesario", -150.0, "Enero 2024"),
            tx("Sueldo", "Ingreso Regular", 900.0, "Enero 2024"),
        ];
        assert_eq!(top_expense(&rows), Some(("Super".to_string(), 200.0)));
        assert_eq!(top_expense(&rows[3..]), None);
    }

    #[test]
    fn test_report_excludes_summary_rows() {
        let rows = vec![
            tx("Sueldo", "Ingreso Regular", 3000.0, "Enero 2024"),
            tx("Sueldo", "Ingreso Regular", 3000.0, "Febrero 2024"),
            tx("Alquiler", "Necesario", -1000.0, "Enero 2024"),
            tx("Alquiler", "Necesario", -1000.0, "Febrero 2024"),
            tx("Super", "Básico", -600.0, "Enero 2024"),
            tx("Cine", "Discrecional", -400.0, "Febrero 2024"),
            tx("Gastos", SUMMARY_GROUP, -3000.0, "Enero 2024"),
            tx("Ingresos", SUMMARY_GROUP, 6000.0, "Enero 2024"),
        ];
        let report = HealthReport::from_transactions(&rows);
        assert_eq!(report.income, 6000.0);
        assert_eq!(report.expenses, -3000.0);
        assert_eq!(report.balance, 3000.0);
        assert_eq!(report.savings_rate, 50.0);
        assert_eq!(report.months, 2);
        assert_eq!(report.monthly_necessary, 1000.0);
        assert_eq!(report.emergency_runway, 3.0);
        assert_close(report.ratios.necessary, 2000.0 / 3000.0 * 100.0);
        assert!(!report.insights.is_empty());
    }
}
