//! tablero-finance: budget suggestions, usage alerts and financial health
//! over the category timeline.

pub mod alerts;
pub mod budget;
pub mod health;
pub mod methodology;
pub mod stats;

pub use alerts::{AlertLevel, AlertSummary, ComparisonRow, comparison_rows, summary_metrics, usage_percentage};
pub use budget::{
    BudgetCalculator, BudgetMethod, BudgetSuggestion, DEFAULT_EXCLUDED, SpendingAnalysis, SpendingPattern,
    SpendingTrend, Volatility, load_calculator,
};
pub use health::{GroupRatios, HealthRating, HealthReport, HealthScore, Insight, InsightKind};
pub use methodology::{ControlLevel, IncomeStability, Methodology, recommend};
