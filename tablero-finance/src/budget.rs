//! Budget suggestions from a category's history.
//!
//! Every statistic works on the non-zero, absolute values of a category's
//! periods. A zero cell means "nothing happened that period", not "spent
//! nothing", so it never drags an average down.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tablero_core::GROUP_PREFIXES;
use tablero_ingest::{WideTimeline, read_timeline_csv};

use crate::stats::{self, round_to};

/// Aggregate rows of the sheet that are never budgeted on their own.
pub const DEFAULT_EXCLUDED: [&str; 6] = [
    "Gastos",
    "Ingresos",
    "Ganancia Neta",
    "Inversiones",
    "Préstamos",
    "TrabajoClientes",
];

const LOW_CV: f64 = 15.0;
const HIGH_CV: f64 = 40.0;
const VOLATILITY_WINDOW: usize = 6;
const MIN_TREND_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetMethod {
    /// Pick the statistic from the measured volatility
    #[default]
    Auto,
    /// Always the 90th percentile
    Conservative,
    /// Weighted blend of recent averages and the 75th percentile
    Moderate,
    /// The 3-period moving average
    Aggressive,
}

impl BudgetMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetMethod::Auto => "auto",
            BudgetMethod::Conservative => "conservative",
            BudgetMethod::Moderate => "moderate",
            BudgetMethod::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for BudgetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BudgetMethod::Auto),
            "conservative" => Ok(BudgetMethod::Conservative),
            "moderate" => Ok(BudgetMethod::Moderate),
            "aggressive" => Ok(BudgetMethod::Aggressive),
            other => Err(format!(
                "unknown budget method '{other}' (expected auto, conservative, moderate or aggressive)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Low,
    Medium,
    High,
    Unknown,
}

impl Volatility {
    /// Bucket a coefficient of variation given in percent.
    pub fn from_cv(cv: f64) -> Self {
        if cv < LOW_CV {
            Volatility::Low
        } else if cv < HIGH_CV {
            Volatility::Medium
        } else {
            Volatility::High
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetSuggestion {
    pub category: String,
    pub suggested: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub moving_avg_3: f64,
    pub moving_avg_6: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
    pub trend_forecast: f64,
    /// Method name, or "N/A" for a category with no history
    pub method: String,
    pub volatility: Volatility,
    /// 0-100
    pub confidence: u8,
}

impl BudgetSuggestion {
    fn unknown(category: &str) -> Self {
        Self {
            category: category.to_string(),
            suggested: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            moving_avg_3: 0.0,
            moving_avg_6: 0.0,
            percentile_75: 0.0,
            percentile_90: 0.0,
            trend_forecast: 0.0,
            method: "N/A".to_string(),
            volatility: Volatility::Unknown,
            confidence: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpendingTrend {
    Growing,
    Shrinking,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendingPattern {
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub periods_with_spend: usize,
    pub periods_without_spend: usize,
    /// Share of periods with any movement, in percent
    pub frequency: f64,
    pub trend: SpendingTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpendingAnalysis {
    /// Unknown category, or no period with movement
    NoData,
    Observed(SpendingPattern),
}

fn non_zero_abs(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.abs()).filter(|v| *v > 0.0).collect()
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// Historical per-category series plus the budgeting statistics over them.
pub struct BudgetCalculator {
    timeline: WideTimeline,
}

impl BudgetCalculator {
    pub fn new(timeline: WideTimeline) -> Self {
        Self { timeline }
    }

    /// Build from text cells ("-1.234,50", "80"), parsed with the locale
    /// amount rules.
    pub fn from_raw_rows<L, C>(periods: Vec<String>, rows: Vec<(L, Vec<C>)>) -> Self
    where
        L: Into<String>,
        C: AsRef<str>,
    {
        Self::new(WideTimeline::from_text_rows(periods, rows))
    }

    pub fn timeline(&self) -> &WideTimeline {
        &self.timeline
    }

    fn series(&self, category: &str) -> Option<&[f64]> {
        self.timeline.row(category).map(|r| r.values.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.timeline.labels()
    }

    /// Absolute amount of the most recent period, 0 for unknown categories.
    pub fn latest_amount(&self, category: &str) -> f64 {
        self.series(category)
            .and_then(|s| s.last())
            .map(|v| v.abs())
            .unwrap_or(0.0)
    }

    /// Mean of the last `periods` slots, zeros dropped.
    pub fn moving_average(&self, category: &str, periods: usize) -> f64 {
        self.series(category)
            .and_then(|s| stats::mean(&non_zero_abs(tail(s, periods))))
            .unwrap_or(0.0)
    }

    /// `p`-th percentile of all non-zero history.
    pub fn percentile(&self, category: &str, p: f64) -> f64 {
        self.series(category)
            .and_then(|s| stats::percentile(&non_zero_abs(s), p))
            .unwrap_or(0.0)
    }

    /// Linear trend extrapolated `ahead` periods past the last column.
    /// With fewer than three data points this is the 3-period moving average.
    pub fn trend_forecast(&self, category: &str, ahead: usize) -> f64 {
        let Some(series) = self.series(category) else {
            return 0.0;
        };

        let (xs, ys): (Vec<f64>, Vec<f64>) = series
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v.abs()))
            .filter(|(_, v)| *v > 0.0)
            .unzip();

        if xs.len() < MIN_TREND_POINTS {
            return self.moving_average(category, 3);
        }

        match stats::linear_regression(&xs, &ys) {
            Some(fit) => {
                let next_index = (series.len() + ahead) as f64 - 1.0;
                fit.predict(next_index).max(0.0)
            }
            None => self.moving_average(category, 3),
        }
    }

    /// Coefficient of variation of the last six periods, bucketed.
    pub fn volatility(&self, category: &str) -> Volatility {
        let Some(series) = self.series(category) else {
            return Volatility::Unknown;
        };
        let recent = non_zero_abs(tail(series, VOLATILITY_WINDOW));
        if recent.len() < 2 {
            return Volatility::Unknown;
        }

        let (Some(mean), Some(std)) = (stats::mean(&recent), stats::std_dev(&recent)) else {
            return Volatility::Unknown;
        };
        let cv = if mean > 0.0 { std * 100.0 / mean } else { 0.0 };
        Volatility::from_cv(cv)
    }

    pub fn suggest_budget(&self, category: &str, method: BudgetMethod) -> BudgetSuggestion {
        if self.series(category).is_none() {
            return BudgetSuggestion::unknown(category);
        }

        let ma_3 = self.moving_average(category, 3);
        let ma_6 = self.moving_average(category, 6);
        let p75 = self.percentile(category, 75.0);
        let p90 = self.percentile(category, 90.0);
        let trend = self.trend_forecast(category, 1);
        let volatility = self.volatility(category);

        let (suggested, confidence) = match method {
            BudgetMethod::Auto => match volatility {
                Volatility::Low => (ma_3, 85),
                Volatility::Medium => (p75, 70),
                Volatility::High | Volatility::Unknown => (p90, 60),
            },
            BudgetMethod::Conservative => (p90, 90),
            BudgetMethod::Moderate => (ma_3 * 0.4 + ma_6 * 0.3 + p75 * 0.3, 75),
            BudgetMethod::Aggressive => (ma_3, 50),
        };
        tracing::debug!(category, %method, ?volatility, suggested, "budget suggested");

        BudgetSuggestion {
            category: category.to_string(),
            suggested: round_to(suggested, 2),
            minimum: round_to(ma_3 * 0.8, 2),
            maximum: round_to(p90 * 1.1, 2),
            moving_avg_3: round_to(ma_3, 2),
            moving_avg_6: round_to(ma_6, 2),
            percentile_75: round_to(p75, 2),
            percentile_90: round_to(p90, 2),
            trend_forecast: round_to(trend, 2),
            method: method.as_str().to_string(),
            volatility,
            confidence,
        }
    }

    /// Suggestions for every category except `exclude` (defaults to
    /// [`DEFAULT_EXCLUDED`]) and group-prefixed parent rows, largest first.
    pub fn all_budgets(&self, method: BudgetMethod, exclude: Option<&[&str]>) -> Vec<BudgetSuggestion> {
        let exclude = exclude.unwrap_or(&DEFAULT_EXCLUDED);
        let mut budgets: Vec<BudgetSuggestion> = self
            .categories()
            .filter(|c| !exclude.contains(c))
            .filter(|c| !GROUP_PREFIXES.iter().any(|(prefix, _)| c.starts_with(prefix)))
            .map(|c| self.suggest_budget(c, method))
            .collect();

        budgets.sort_by(|a, b| b.suggested.total_cmp(&a.suggested));
        tracing::info!(categories = budgets.len(), %method, "budgets computed");
        budgets
    }

    pub fn analyze_spending_pattern(&self, category: &str) -> SpendingAnalysis {
        let Some(series) = self.series(category) else {
            return SpendingAnalysis::NoData;
        };
        let values: Vec<f64> = series.iter().map(|v| v.abs()).collect();
        let non_zero = non_zero_abs(&values);

        let (Some(mean), Some(median), Some(std_dev)) = (
            stats::mean(&non_zero),
            stats::median(&non_zero),
            stats::std_dev(&non_zero),
        ) else {
            return SpendingAnalysis::NoData;
        };
        let min = non_zero.iter().copied().fold(f64::INFINITY, f64::min);
        let max = non_zero.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let trend = if non_zero.len() >= MIN_TREND_POINTS {
            let old = stats::mean(&non_zero_abs(&values[..values.len().min(3)]));
            let recent = stats::mean(&non_zero_abs(tail(&values, 3)));
            match (recent, old) {
                (Some(r), Some(o)) if r > o * 1.15 => SpendingTrend::Growing,
                (Some(r), Some(o)) if r < o * 0.85 => SpendingTrend::Shrinking,
                _ => SpendingTrend::Stable,
            }
        } else {
            SpendingTrend::InsufficientData
        };

        SpendingAnalysis::Observed(SpendingPattern {
            total: round_to(non_zero.iter().sum(), 2),
            mean: round_to(mean, 2),
            median: round_to(median, 2),
            std_dev: round_to(std_dev, 2),
            min: round_to(min, 2),
            max: round_to(max, 2),
            periods_with_spend: non_zero.len(),
            periods_without_spend: values.iter().filter(|v| **v == 0.0).count(),
            frequency: round_to(non_zero.len() as f64 / values.len() as f64 * 100.0, 1),
            trend,
        })
    }
}

/// Load a calculator straight from a timeline CSV.
pub fn load_calculator(path: impl AsRef<Path>) -> Result<BudgetCalculator> {
    Ok(BudgetCalculator::new(read_timeline_csv(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablero_ingest::TimelineRow;

    fn calc(rows: &[(&str, &[f64])]) -> BudgetCalculator {
        let width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        BudgetCalculator::new(WideTimeline {
            periods: (1..=width).map(|m| format!("1/{m}/2024")).collect(),
            rows: rows
                .iter()
                .map(|(label, values)| TimelineRow {
                    label: label.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
        })
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_moving_average_drops_zeros() {
        let c = calc(&[("A", &[0.0, 0.0, 100.0, 200.0, 0.0]), ("B", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0])]);
        assert_close(c.moving_average("A", 3), 150.0);
        assert_close(c.moving_average("B", 3), 250.0 / 3.0);
        // Window wider than the history uses all of it.
        assert_close(c.moving_average("B", 12), 87.5);
        assert_eq!(c.moving_average("Nope", 3), 0.0);
        assert_eq!(c.moving_average("A", 1), 0.0);
    }

    #[test]
    fn test_from_raw_rows_parses_locale_cells() {
        let c = BudgetCalculator::from_raw_rows(
            vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
            vec![("Super", vec!["-1.200,00", "-800", "\"-1.000,00\""])],
        );
        assert_close(c.moving_average("Super", 3), 1000.0);
    }

    #[test]
    fn test_from_raw_rows_reads_dotted_thousands() {
        let c = BudgetCalculator::from_raw_rows(
            vec!["p1".to_string(), "p2".to_string()],
            vec![("Alquiler", vec!["-12.500", "\"-13.500\""])],
        );
        assert_close(c.moving_average("Alquiler", 3), 13000.0);
        assert_close(c.latest_amount("Alquiler"), 13500.0);
    }

    #[test]
    fn test_moving_average_uses_absolute_values() {
        let c = calc(&[("Gasto", &[-100.0, -200.0, -300.0])]);
        assert_close(c.moving_average("Gasto", 3), 200.0);
    }

    #[test]
    fn test_percentile() {
        let c = calc(&[("B", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0]), ("Z", &[0.0, 0.0])]);
        assert_close(c.percentile("B", 75.0), 105.0);
        assert_close(c.percentile("B", 90.0), 114.0);
        assert_eq!(c.percentile("Z", 90.0), 0.0);
    }

    #[test]
    fn test_volatility_boundaries() {
        let c = calc(&[
            ("cv10", &[90.0, 110.0, 90.0, 110.0, 90.0, 110.0]),
            ("cv15", &[85.0, 115.0, 85.0, 115.0, 85.0, 115.0]),
            ("cv40", &[60.0, 140.0, 60.0, 140.0, 60.0, 140.0]),
            ("one", &[0.0, 0.0, 0.0, 0.0, 0.0, 70.0]),
        ]);
        assert_eq!(c.volatility("cv10"), Volatility::Low);
        assert_eq!(c.volatility("cv15"), Volatility::Medium);
        assert_eq!(c.volatility("cv40"), Volatility::High);
        assert_eq!(c.volatility("one"), Volatility::Unknown);
        assert_eq!(c.volatility("Nope"), Volatility::Unknown);
    }

    #[test]
    fn test_volatility_only_looks_at_last_six_periods() {
        // Wild early history, flat recent history.
        let c = calc(&[("A", &[10.0, 900.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0])]);
        assert_eq!(c.volatility("A"), Volatility::Low);
    }

    #[test]
    fn test_trend_regression() {
        let c = calc(&[
            ("up", &[100.0, 200.0, 300.0]),
            ("down", &[500.0, 300.0, 100.0]),
            ("gaps", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0]),
        ]);
        assert_close(c.trend_forecast("up", 1), 400.0);
        assert_close(c.trend_forecast("up", 2), 500.0);
        // Negative extrapolation floors at zero.
        assert_eq!(c.trend_forecast("down", 1), 0.0);
        // x = [0, 3, 4, 5]: slope 20/14, predicted at index 6
        assert_close(c.trend_forecast("gaps", 1), 87.5 - 3.0 * 20.0 / 14.0 + 6.0 * 20.0 / 14.0);
    }

    #[test]
    fn test_trend_falls_back_to_moving_average() {
        let c = calc(&[("two", &[0.0, 0.0, 100.0, 0.0, 200.0])]);
        // A regression through (2, 100) and (4, 200) would predict 250.
        assert_close(c.trend_forecast("two", 1), 150.0);
    }

    #[test]
    fn test_suggest_budget_auto_medium() {
        let c = calc(&[("B", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0])]);
        let s = c.suggest_budget("B", BudgetMethod::Auto);
        assert_eq!(s.volatility, Volatility::Medium);
        assert_eq!(s.confidence, 70);
        assert_close(s.suggested, 105.0);
        assert_close(s.moving_avg_3, 83.33);
        assert_close(s.moving_avg_6, 87.5);
        assert_close(s.minimum, 66.67);
        assert_close(s.maximum, 125.4);
        assert_close(s.trend_forecast, 91.79);
        assert_eq!(s.method, "auto");
    }

    #[test]
    fn test_suggest_budget_methods() {
        let c = calc(&[("B", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0])]);

        let cons = c.suggest_budget("B", BudgetMethod::Conservative);
        assert_close(cons.suggested, 114.0);
        assert_eq!(cons.confidence, 90);

        let moderate = c.suggest_budget("B", BudgetMethod::Moderate);
        assert_close(moderate.suggested, 91.08);
        assert_eq!(moderate.confidence, 75);

        let aggressive = c.suggest_budget("B", BudgetMethod::Aggressive);
        assert_close(aggressive.suggested, 83.33);
        assert_eq!(aggressive.confidence, 50);
    }

    #[test]
    fn test_auto_low_and_high_volatility() {
        let c = calc(&[
            ("flat", &[100.0, 100.0, 100.0, 100.0]),
            ("wild", &[10.0, 300.0, 20.0, 250.0]),
            ("single", &[0.0, 0.0, 0.0, 40.0]),
        ]);
        let flat = c.suggest_budget("flat", BudgetMethod::Auto);
        assert_eq!((flat.volatility, flat.confidence), (Volatility::Low, 85));
        assert_close(flat.suggested, 100.0);

        let wild = c.suggest_budget("wild", BudgetMethod::Auto);
        assert_eq!((wild.volatility, wild.confidence), (Volatility::High, 60));
        assert_close(wild.suggested, wild.percentile_90);

        // Unknown volatility takes the high-volatility branch.
        let single = c.suggest_budget("single", BudgetMethod::Auto);
        assert_eq!((single.volatility, single.confidence), (Volatility::Unknown, 60));
        assert_close(single.suggested, 40.0);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let c = calc(&[("B", &[1.0])]);
        let s = c.suggest_budget("Nope", BudgetMethod::Conservative);
        assert_eq!(s.suggested, 0.0);
        assert_eq!(s.maximum, 0.0);
        assert_eq!(s.method, "N/A");
        assert_eq!(s.volatility, Volatility::Unknown);
        assert_eq!(s.confidence, 0);
    }

    #[test]
    fn test_aggressive_never_below_minimum() {
        let c = calc(&[
            ("a", &[100.0, 0.0, 0.0, 50.0, 80.0, 120.0]),
            ("b", &[-33.3, -12.7, -999.99]),
            ("c", &[0.0, 0.0, 0.01]),
            ("d", &[5.0, 0.0, 0.0, 0.0]),
        ]);
        for cat in ["a", "b", "c", "d"] {
            let s = c.suggest_budget(cat, BudgetMethod::Aggressive);
            assert!(s.suggested >= s.minimum, "{cat}: {} < {}", s.suggested, s.minimum);
        }
    }

    #[test]
    fn test_all_budgets_excludes_and_sorts() {
        let c = calc(&[
            ("Gastos", &[-5000.0, -5000.0]),
            ("N-Vivienda", &[-900.0, -900.0]),
            ("Combustible", &[-100.0, -120.0]),
            ("Alquiler", &[-800.0, -800.0]),
            ("Cine", &[0.0, -20.0]),
        ]);
        let all = c.all_budgets(BudgetMethod::Aggressive, None);
        let names: Vec<_> = all.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(names, vec!["Alquiler", "Combustible", "Cine"]);

        let custom = c.all_budgets(BudgetMethod::Aggressive, Some(&["Alquiler"]));
        let names: Vec<_> = custom.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(names, vec!["Gastos", "Combustible", "Cine"]);
    }

    #[test]
    fn test_spending_pattern_growing() {
        let c = calc(&[("A", &[0.0, 100.0, 0.0, 200.0, 300.0, 0.0])]);
        let SpendingAnalysis::Observed(p) = c.analyze_spending_pattern("A") else {
            panic!("expected data");
        };
        assert_close(p.total, 600.0);
        assert_close(p.mean, 200.0);
        assert_close(p.median, 200.0);
        assert_close(p.std_dev, 81.65);
        assert_close(p.min, 100.0);
        assert_close(p.max, 300.0);
        assert_eq!(p.periods_with_spend, 3);
        assert_eq!(p.periods_without_spend, 3);
        assert_close(p.frequency, 50.0);
        assert_eq!(p.trend, SpendingTrend::Growing);
    }

    #[test]
    fn test_spending_pattern_trends() {
        let c = calc(&[
            ("down", &[400.0, 400.0, 400.0, 100.0, 100.0, 100.0]),
            ("flat", &[100.0, 100.0, 100.0, 105.0, 100.0, 100.0]),
            ("few", &[0.0, 100.0, 0.0, 200.0]),
        ]);
        let trend = |cat| match c.analyze_spending_pattern(cat) {
            SpendingAnalysis::Observed(p) => p.trend,
            SpendingAnalysis::NoData => panic!("no data for {cat}"),
        };
        assert_eq!(trend("down"), SpendingTrend::Shrinking);
        assert_eq!(trend("flat"), SpendingTrend::Stable);
        assert_eq!(trend("few"), SpendingTrend::InsufficientData);
    }

    #[test]
    fn test_spending_pattern_no_data() {
        let c = calc(&[("zeros", &[0.0, 0.0, 0.0])]);
        assert_eq!(c.analyze_spending_pattern("zeros"), SpendingAnalysis::NoData);
        assert_eq!(c.analyze_spending_pattern("Nope"), SpendingAnalysis::NoData);
    }

    #[test]
    fn test_analysis_serializes_with_status_tag() {
        let c = calc(&[("zeros", &[0.0])]);
        let json = serde_json::to_value(c.analyze_spending_pattern("zeros")).unwrap();
        assert_eq!(json["status"], "no_data");
    }
}
