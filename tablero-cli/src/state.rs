use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tablero_core::TransactionFilter;

pub fn tablero_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tablero"))
}

pub fn ensure_tablero_home() -> Result<PathBuf> {
    let dir = tablero_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_filters_path() -> Result<PathBuf> {
    Ok(ensure_tablero_home()?.join("filters.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedFilter {
    pub filter: TransactionFilter,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Named filters persisted as one JSON object.
#[derive(Debug)]
pub struct FilterStore {
    path: PathBuf,
    filters: BTreeMap<String, SavedFilter>,
}

impl FilterStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let filters = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, filters })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.filters)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    /// Insert or replace. Replacing keeps the original `created_at`.
    pub fn save(&mut self, name: &str, filter: TransactionFilter, now: DateTime<Utc>) -> Result<()> {
        if name.trim().is_empty() {
            bail!("filter name must not be empty");
        }
        let created_at = self.filters.get(name).map(|f| f.created_at).unwrap_or(now);
        self.filters.insert(
            name.to_string(),
            SavedFilter {
                filter,
                created_at,
                modified_at: now,
            },
        );
        self.persist()
    }

    pub fn get(&self, name: &str) -> Option<&SavedFilter> {
        self.filters.get(name)
    }

    /// Returns whether a filter was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        if self.filters.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SavedFilter)> {
        self.filters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
