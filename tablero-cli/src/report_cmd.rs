//! Report subcommands over the configured timeline and category config.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tablero_core::{
    CategoryClassifier, CategoryConfig, ClassifiedTransaction, CurrencyFormat, GroupKind, SUMMARY_GROUP,
    TransactionFilter,
};
use tablero_finance::{
    AlertLevel, BudgetCalculator, BudgetMethod, BudgetSuggestion, ControlLevel, HealthReport, IncomeStability,
    DEFAULT_EXCLUDED, SpendingAnalysis, comparison_rows, recommend, summary_metrics,
};
use tablero_ingest::{build_transaction_log, read_timeline_csv, summarize, validate_duplicates};

/// Resolved input files for one invocation.
pub struct Inputs {
    pub categories: PathBuf,
    pub timeline: PathBuf,
}

impl Inputs {
    pub fn classifier(&self) -> Result<CategoryClassifier> {
        let config = CategoryConfig::load(&self.categories)
            .with_context(|| format!("loading category config {}", self.categories.display()))?;
        Ok(CategoryClassifier::new(config))
    }

    pub fn calculator(&self) -> Result<BudgetCalculator> {
        Ok(BudgetCalculator::new(read_timeline_csv(&self.timeline)?))
    }

    pub fn classified_log(&self, classifier: &CategoryClassifier) -> Result<Vec<ClassifiedTransaction>> {
        let timeline = read_timeline_csv(&self.timeline)?;
        let log = build_transaction_log(&timeline)?;
        Ok(classifier.classify_transactions(&log))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn parse_method(raw: &str) -> Result<BudgetMethod> {
    raw.parse::<BudgetMethod>().map_err(|e| anyhow!(e))
}

/// Sheet rows never budgeted on their own: the fixed aggregates plus the
/// total rows of principal categories with subcategories.
pub fn budget_exclusions(classifier: &CategoryClassifier) -> Vec<String> {
    let mut out: Vec<String> = DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect();
    for parent in classifier.categories_with_subcategories() {
        if !out.contains(&parent) {
            out.push(parent);
        }
    }
    out
}

fn budgets_for(calc: &BudgetCalculator, classifier: &CategoryClassifier, method: BudgetMethod) -> Vec<BudgetSuggestion> {
    let exclusions = budget_exclusions(classifier);
    let exclude: Vec<&str> = exclusions.iter().map(String::as_str).collect();
    calc.all_budgets(method, Some(exclude.as_slice()))
}

pub fn run_log(inputs: &Inputs, filter: Option<&TransactionFilter>, json: bool, limit: usize) -> Result<()> {
    let classifier = inputs.classifier()?;
    let classified = inputs.classified_log(&classifier)?;
    let rows: Vec<&ClassifiedTransaction> = match filter {
        Some(f) => f.apply(&classified),
        None => classified.iter().collect(),
    };

    if json {
        return print_json(&rows);
    }

    // Totals only over rows that do not double count their children.
    let records: Vec<_> = rows
        .iter()
        .filter(|t| classifier.is_additive(t))
        .map(|t| t.record.clone())
        .collect();
    let summary = summarize(&records);
    let fmt = &classifier.config().currency;

    println!("Transaction log: {}", inputs.timeline.display());
    println!("Records: {} | labels: {} | periods: {}", summary.records, summary.unique_labels, summary.unique_periods);
    if let Some((from, to)) = summary.date_range {
        println!("Range: {from} .. {to}");
    }
    println!("Income: {}", fmt.format(summary.total_income, false));
    println!("Expenses: {}\n", fmt.format(summary.total_expenses, true));

    for t in rows.iter().filter(|t| t.group() != SUMMARY_GROUP).take(limit) {
        println!(
            "{:<14} {:<24} {:>16} | {} / {}{}",
            t.record.calendar.month_year,
            t.record.label,
            fmt.format(t.amount(), true),
            t.group(),
            t.principal(),
            t.classification
                .subcategory
                .as_deref()
                .map(|s| format!(" / {s}"))
                .unwrap_or_default()
        );
    }

    let unclassified = classifier.warned_labels();
    if !unclassified.is_empty() {
        println!("\nUnclassified labels: {}", unclassified.join(", "));
    }
    Ok(())
}

pub fn run_duplicates(inputs: &Inputs, json: bool) -> Result<()> {
    let timeline = read_timeline_csv(&inputs.timeline)?;
    let dups = validate_duplicates(timeline.labels());
    if json {
        return print_json(&dups);
    }
    if dups.is_empty() {
        println!("No colliding category labels.");
        return Ok(());
    }
    println!("{} normalized names shared by several labels:\n", dups.len());
    for d in &dups {
        println!("- {}: {}", d.normalized, d.variants.join(" | "));
    }
    Ok(())
}

fn print_suggestion(s: &BudgetSuggestion, fmt: &CurrencyFormat) {
    println!(
        "{:<24} {:>16}  [{} .. {}]  {:?} vol, {}% conf, method={}",
        s.category,
        fmt.format(s.suggested, false),
        fmt.format(s.minimum, false),
        fmt.format(s.maximum, false),
        s.volatility,
        s.confidence,
        s.method
    );
}

pub fn run_budget(inputs: &Inputs, category: Option<&str>, method: BudgetMethod, json: bool) -> Result<()> {
    let calc = inputs.calculator()?;
    let classifier = inputs.classifier()?;
    let fmt = &classifier.config().currency;

    match category {
        Some(cat) => {
            let s = calc.suggest_budget(cat, method);
            if json {
                return print_json(&s);
            }
            print_suggestion(&s, fmt);
            println!(
                "  MA3 {} | MA6 {} | P75 {} | P90 {} | trend {}",
                fmt.format(s.moving_avg_3, false),
                fmt.format(s.moving_avg_6, false),
                fmt.format(s.percentile_75, false),
                fmt.format(s.percentile_90, false),
                fmt.format(s.trend_forecast, false),
            );
        }
        None => {
            let all = budgets_for(&calc, &classifier, method);
            if json {
                return print_json(&all);
            }
            println!("Suggested budgets ({method}), {} categories\n", all.len());
            for s in &all {
                print_suggestion(s, fmt);
            }
            let total: f64 = all.iter().map(|s| s.suggested).sum();
            println!("\nTotal: {}", fmt.format(total, false));
        }
    }
    Ok(())
}

pub fn run_pattern(inputs: &Inputs, category: &str, json: bool) -> Result<()> {
    let calc = inputs.calculator()?;
    let analysis = calc.analyze_spending_pattern(category);
    if json {
        return print_json(&analysis);
    }
    match analysis {
        SpendingAnalysis::NoData => println!("{category}: no data"),
        SpendingAnalysis::Observed(p) => {
            println!("{category}");
            println!("  total {:.2} | mean {:.2} | median {:.2} | std {:.2}", p.total, p.mean, p.median, p.std_dev);
            println!("  min {:.2} | max {:.2}", p.min, p.max);
            println!(
                "  periods with spend {} / without {} ({:.1}% frequency)",
                p.periods_with_spend, p.periods_without_spend, p.frequency
            );
            println!("  trend: {:?}", p.trend);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct AlertsOutput<'a> {
    period: Option<&'a str>,
    summary: tablero_finance::AlertSummary,
    rows: Vec<tablero_finance::ComparisonRow>,
}

/// Compare suggested budgets of expense categories with the latest period.
pub fn run_alerts(inputs: &Inputs, method: BudgetMethod, json: bool) -> Result<()> {
    let classifier = inputs.classifier()?;
    let calc = inputs.calculator()?;
    let config = classifier.config();

    let income_or_summary = |category: &str| {
        let group = classifier.classify(category, -1.0).group;
        group == SUMMARY_GROUP
            || config
                .groups
                .iter()
                .any(|g| g.display_name == group && g.kind == GroupKind::Income)
    };

    let budgets: Vec<(String, f64)> = budgets_for(&calc, &classifier, method)
        .into_iter()
        .filter(|s| !income_or_summary(&s.category))
        .map(|s| (s.category, s.suggested))
        .collect();
    let spent: HashMap<String, f64> = budgets
        .iter()
        .map(|(c, _)| (c.clone(), calc.latest_amount(c)))
        .collect();

    let out = AlertsOutput {
        period: calc.timeline().periods.last().map(String::as_str),
        summary: summary_metrics(&budgets, &spent),
        rows: comparison_rows(&budgets, &spent),
    };
    if json {
        return print_json(&out);
    }

    let fmt = &config.currency;
    println!("Budget alerts for {}\n", out.period.unwrap_or("latest period"));
    println!(
        "Budget {} | spent {} | available {} | {:.1}% used",
        fmt.format(out.summary.total_budget, false),
        fmt.format(out.summary.total_spent, false),
        fmt.format(out.summary.available(), true),
        out.summary.usage_percentage
    );
    for level in AlertLevel::ALL {
        println!("  {:<9} {}", level.as_str(), out.summary.count(level));
    }
    println!();

    let mut rows = out.rows.clone();
    rows.sort_by(|a, b| b.percent_used.total_cmp(&a.percent_used));
    for r in rows.iter().filter(|r| r.level != AlertLevel::Safe) {
        println!("[{}] {}", r.level.as_str(), r.level.message(&r.category, r.spent, r.budget, fmt));
    }
    Ok(())
}

pub fn run_health(inputs: &Inputs, filter: Option<&TransactionFilter>, json: bool) -> Result<()> {
    let classifier = inputs.classifier()?;
    let classified = inputs.classified_log(&classifier)?;
    let rows: Vec<ClassifiedTransaction> = match filter {
        Some(f) => f.apply(&classified).into_iter().cloned().collect(),
        None => classified,
    };
    let rows = classifier.analysis_rows(&rows);

    let report = HealthReport::from_transactions(&rows);
    if json {
        return print_json(&report);
    }

    let fmt = &classifier.config().currency;
    println!("Financial health: {}/100 ({})\n", report.score.score, report.score.rating.label());
    println!(
        "Income {} | expenses {} | balance {}",
        fmt.format(report.income, false),
        fmt.format(report.expenses, true),
        fmt.format(report.balance, true),
    );
    println!(
        "Savings rate {:.1}% | emergency runway {:.1} months ({} months of data)",
        report.savings_rate, report.emergency_runway, report.months
    );
    println!(
        "Spending split: necessary {:.1}% | basic {:.1}% | discretionary {:.1}%\n",
        report.ratios.necessary, report.ratios.basic, report.ratios.discretionary
    );
    for i in &report.insights {
        println!("- [{:?}] {}", i.kind, i.message);
    }
    Ok(())
}

pub fn run_recommend(income: IncomeStability, control: ControlLevel) {
    let m = recommend(income, control);
    println!("{m}: {}", m.description());
}
