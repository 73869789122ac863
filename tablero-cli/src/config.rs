use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_tablero_home;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsSection,
    pub budget: BudgetSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsSection {
    /// Category hierarchy YAML
    pub categories: PathBuf,
    /// Wide category x period CSV
    pub timeline: PathBuf,
    /// Saved filter store; `None` means `~/.tablero/filters.json`
    pub saved_filters: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetSection {
    /// auto, conservative, moderate or aggressive
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// Default tracing filter when RUST_LOG is not set
    pub level: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            categories: PathBuf::from("config/categories_config.yaml"),
            timeline: PathBuf::from("data/categories_timeline.csv"),
            saved_filters: None,
        }
    }
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            method: "auto".to_string(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tablero_home()?.join("config.toml"))
}

/// Defaults when the file does not exist.
pub fn load_config_from(p: &Path) -> Result<AppConfig> {
    if !p.exists() {
        return Ok(AppConfig::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

pub fn save_config_to(cfg: &AppConfig, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&AppConfig::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.budget.method, "auto");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[budget]\nmethod = \"moderate\"\n").unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.budget.method, "moderate");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.paths.timeline, PathBuf::from("data/categories_timeline.csv"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.paths.saved_filters = Some(dir.path().join("f.json"));
        cfg.logging.level = "debug".to_string();
        save_config_to(&cfg, &p).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[budget\n").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
