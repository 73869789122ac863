use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tablero_core::{AmountKind, TransactionFilter};
use tablero_finance::{ControlLevel, IncomeStability};

mod classify_cmd;
mod config;
mod report_cmd;
mod state;

use config::AppConfig;
use report_cmd::Inputs;
use state::FilterStore;

#[derive(Parser, Debug)]
#[command(name = "tablero", version, about = "Category classification and budget estimation over a spending timeline")]
struct Cli {
    /// Category config YAML (default from ~/.tablero/config.toml)
    #[arg(long, global = true)]
    categories: Option<PathBuf>,

    /// Wide category x period CSV (default from ~/.tablero/config.toml)
    #[arg(long, global = true)]
    timeline: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset, e.g. "debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a long-format CSV and append Grupo / Categoria_Principal / Subcategoria
    Classify {
        /// Input CSV with one row per transaction
        input: PathBuf,

        /// Output CSV (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "Categoria")]
        label_column: String,

        #[arg(long, default_value = "Monto")]
        amount_column: String,
    },

    /// Build the classified transaction log from the timeline
    Log {
        /// Apply a saved filter
        #[arg(long)]
        filter: Option<String>,

        /// Rows printed (default: 20)
        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Report labels that collide after case/accent normalization
    Duplicates {
        #[arg(long)]
        json: bool,
    },

    /// Suggest budgets for one category or all of them
    Budget {
        #[arg(long)]
        category: Option<String>,

        /// auto, conservative, moderate or aggressive (default from config)
        #[arg(long)]
        method: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Spending pattern statistics for one category
    Pattern {
        category: String,

        #[arg(long)]
        json: bool,
    },

    /// Compare suggested budgets with spend in the latest period
    Alerts {
        #[arg(long)]
        method: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Savings rate, emergency runway and health score
    Health {
        #[arg(long)]
        filter: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Recommend a budgeting methodology
    Recommend {
        /// stable, variable or irregular
        income: String,
        /// high, medium or low
        control: String,
    },

    /// Manage saved filters
    Filters {
        #[command(subcommand)]
        command: FiltersCommand,
    },

    /// Write ~/.tablero/config.toml with default values
    InitConfig,
}

#[derive(Subcommand, Debug)]
enum FiltersCommand {
    /// Save (or overwrite) a named filter
    Save {
        name: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
    List,
    Show {
        name: String,
    },
    Delete {
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    All,
    Expenses,
    Income,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// First period start date to keep (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last period start date to keep (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    #[arg(long = "year")]
    years: Vec<i32>,

    /// Spanish month name, e.g. Marzo
    #[arg(long = "month")]
    months: Vec<String>,

    /// Group display name, e.g. Necesario
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Principal category
    #[arg(long = "category")]
    categories: Vec<String>,

    #[arg(long, allow_hyphen_values = true)]
    min_amount: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_amount: Option<f64>,

    #[arg(long)]
    min_abs: Option<f64>,

    #[arg(long, value_enum, default_value_t = KindArg::All)]
    kind: KindArg,
}

fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn latest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

impl FilterArgs {
    fn into_filter(self) -> Result<TransactionFilter> {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(earliest_date()), to.unwrap_or(latest_date()))),
        };
        if let Some((from, to)) = date_range {
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
        }
        let amount_range = match (self.min_amount, self.max_amount) {
            (None, None) => None,
            (lo, hi) => Some((lo.unwrap_or(f64::MIN), hi.unwrap_or(f64::MAX))),
        };

        Ok(TransactionFilter {
            date_range,
            years: self.years,
            months: self.months,
            groups: self.groups,
            categories: self.categories,
            amount_range,
            min_abs_amount: self.min_abs,
            kind: match self.kind {
                KindArg::All => AmountKind::All,
                KindArg::Expenses => AmountKind::Expenses,
                KindArg::Income => AmountKind::Income,
            },
        })
    }
}

fn init_tracing(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

fn filter_store(cfg: &AppConfig) -> Result<FilterStore> {
    let path = match &cfg.paths.saved_filters {
        Some(p) => p.clone(),
        None => state::default_filters_path()?,
    };
    FilterStore::open(path)
}

fn saved_filter(cfg: &AppConfig, name: Option<&str>) -> Result<Option<TransactionFilter>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let store = filter_store(cfg)?;
    let saved = store
        .get(name)
        .with_context(|| format!("no saved filter named '{name}' in {}", store.path().display()))?;
    Ok(Some(saved.filter.clone()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&cfg.logging.level));

    let inputs = Inputs {
        categories: cli.categories.clone().unwrap_or_else(|| cfg.paths.categories.clone()),
        timeline: cli.timeline.clone().unwrap_or_else(|| cfg.paths.timeline.clone()),
    };
    let method_or_default = |m: Option<String>| report_cmd::parse_method(m.as_deref().unwrap_or(&cfg.budget.method));

    match cli.command {
        Command::Classify {
            input,
            output,
            label_column,
            amount_column,
        } => {
            let classifier = inputs.classifier()?;
            let reader = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
            let count = match output {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                    classify_cmd::classify_csv(&classifier, reader, BufWriter::new(file), &label_column, &amount_column)?
                }
                None => classify_cmd::classify_csv(&classifier, reader, io::stdout().lock(), &label_column, &amount_column)?,
            };
            let unclassified = classifier.warned_labels();
            eprintln!("Classified {count} rows ({} unclassified labels)", unclassified.len());
        }

        Command::Log { filter, limit, json } => {
            let filter = saved_filter(&cfg, filter.as_deref())?;
            report_cmd::run_log(&inputs, filter.as_ref(), json, limit)?;
        }

        Command::Duplicates { json } => report_cmd::run_duplicates(&inputs, json)?,

        Command::Budget { category, method, json } => {
            report_cmd::run_budget(&inputs, category.as_deref(), method_or_default(method)?, json)?;
        }

        Command::Pattern { category, json } => report_cmd::run_pattern(&inputs, &category, json)?,

        Command::Alerts { method, json } => {
            report_cmd::run_alerts(&inputs, method_or_default(method)?, json)?;
        }

        Command::Health { filter, json } => {
            let filter = saved_filter(&cfg, filter.as_deref())?;
            report_cmd::run_health(&inputs, filter.as_ref(), json)?;
        }

        Command::Recommend { income, control } => {
            let income: IncomeStability = income.parse().map_err(|e: String| anyhow!(e))?;
            let control: ControlLevel = control.parse().map_err(|e: String| anyhow!(e))?;
            report_cmd::run_recommend(income, control);
        }

        Command::Filters { command } => {
            let mut store = filter_store(&cfg)?;
            match command {
                FiltersCommand::Save { name, filter } => {
                    store.save(&name, filter.into_filter()?, Utc::now())?;
                    println!("Saved filter '{name}' to {}", store.path().display());
                }
                FiltersCommand::List => {
                    if store.is_empty() {
                        println!("No saved filters in {}", store.path().display());
                    }
                    for (name, saved) in store.iter() {
                        println!("{name}  (modified {})", saved.modified_at.format("%Y-%m-%d %H:%M"));
                    }
                }
                FiltersCommand::Show { name } => {
                    let saved = store.get(&name).with_context(|| format!("no saved filter named '{name}'"))?;
                    println!("{}", serde_json::to_string_pretty(saved)?);
                }
                FiltersCommand::Delete { name } => {
                    if !store.delete(&name)? {
                        bail!("no saved filter named '{name}'");
                    }
                    println!("Deleted filter '{name}'");
                }
            }
        }

        Command::InitConfig => config::init_config()?,
    }

    Ok(())
}
