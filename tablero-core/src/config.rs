//! Category configuration: groups, the category hierarchy, sign-dependent
//! ("contextual") categories and the summary rows of the source sheet.
//!
//! The YAML layout keeps the Spanish keys of the spreadsheet it describes:
//!
//! ```yaml
//! grupos:
//!   necesario: { nombre: Necesario, tipo: gasto, color: "#BD10E0" }
//! jerarquia_categorias:
//!   Necesario:
//!     Transporte: { grupo: necesario, subcategorias: [Combustible, Mantenimiento] }
//! categorias_contextuales:
//!   Otros:
//!     clasificar_por: signo_monto
//!     si_positivo: { grupo: ingreso_ocasional, categoria_principal: Otros Ingresos }
//!     si_negativo: { grupo: discrecional, categoria_principal: Otros Gastos }
//! filas_resumen: [Gastos, Ingresos, Ganancia Neta]
//! ```
//!
//! Entries that are structurally broken (a category whose info is not a
//! mapping, a contextual rule without both sign mappings) are dropped while
//! loading. Only a missing top-level key is a hard error.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::CurrencyFormat;

pub const DEFAULT_GROUP_COLOR: &str = "#95A5A6";

const REQUIRED_KEYS: [&str; 3] = ["grupos", "jerarquia_categorias", "filas_resumen"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing category config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("category config must be a mapping at the top level")]
    NotAMapping,
    #[error("missing required key in category config: {0}")]
    MissingKey(&'static str),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GroupKind {
    #[serde(rename = "gasto")]
    Expense,
    #[serde(rename = "ingreso")]
    Income,
    #[serde(rename = "mixto")]
    Mixed,
}

impl GroupKind {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ingreso" | "income" => GroupKind::Income,
            "mixto" | "mixed" => GroupKind::Mixed,
            _ => GroupKind::Expense,
        }
    }
}

/// Top-level classification bucket (Necesario, Básico, Discrecional, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub code: String,
    pub display_name: String,
    pub kind: GroupKind,
    pub color: String,
}

/// One principal category of the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HierarchyEntry {
    /// Section of `jerarquia_categorias` the entry was declared under.
    pub section: String,
    /// Code of the owning group; `None` when the entry omitted `grupo`.
    pub group_code: Option<String>,
    pub principal: String,
    pub subcategories: Vec<String>,
}

impl HierarchyEntry {
    /// A principal with subcategories is a parent/total row in the sheet.
    pub fn is_parent(&self) -> bool {
        !self.subcategories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discriminator {
    SignOfAmount,
    Other(String),
}

/// Target of a contextual rule for one sign of the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualMapping {
    pub group_code: String,
    pub principal: String,
}

/// A label whose group depends on whether money came in or went out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualRule {
    pub key: String,
    pub discriminator: Discriminator,
    pub positive: ContextualMapping,
    pub negative: ContextualMapping,
}

/// In-memory category configuration, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CategoryConfig {
    pub version: String,
    pub groups: Vec<Group>,
    pub hierarchy: Vec<HierarchyEntry>,
    pub contextual: Vec<ContextualRule>,
    pub summary_labels: Vec<String>,
    pub currency: CurrencyFormat,
}

impl CategoryConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            version = %config.version,
            groups = config.groups.len(),
            categories = config.hierarchy.len(),
            "category config loaded"
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(text)?;
        let root = root.as_mapping().ok_or(ConfigError::NotAMapping)?;

        for key in REQUIRED_KEYS {
            if !root.contains_key(key) {
                return Err(ConfigError::MissingKey(key));
            }
        }

        let currency = match root.get("formato_moneda") {
            Some(v) if v.is_mapping() => serde_yaml::from_value(v.clone())?,
            _ => CurrencyFormat::default(),
        };

        Ok(Self {
            version: root
                .get("version")
                .and_then(scalar_string)
                .unwrap_or_else(|| "unknown".to_string()),
            groups: root.get("grupos").map(parse_groups).unwrap_or_default(),
            hierarchy: root
                .get("jerarquia_categorias")
                .map(parse_hierarchy)
                .unwrap_or_default(),
            contextual: root
                .get("categorias_contextuales")
                .map(parse_contextual)
                .unwrap_or_default(),
            summary_labels: root
                .get("filas_resumen")
                .map(string_list)
                .unwrap_or_default(),
            currency,
        })
    }

    pub fn group_by_code(&self, code: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.code == code)
    }

    /// Colour of a group by display name, or the neutral default.
    pub fn group_color(&self, display_name: &str) -> &str {
        self.groups
            .iter()
            .find(|g| g.display_name == display_name)
            .map(|g| g.color.as_str())
            .unwrap_or(DEFAULT_GROUP_COLOR)
    }
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_sequence()
        .map(|seq| seq.iter().filter_map(scalar_string).collect())
        .unwrap_or_default()
}

fn entries(v: &Value) -> impl Iterator<Item = (String, &Mapping)> {
    v.as_mapping()
        .into_iter()
        .flat_map(|m| m.iter())
        .filter_map(|(k, v)| Some((scalar_string(k)?, v.as_mapping()?)))
}

fn parse_groups(v: &Value) -> Vec<Group> {
    entries(v)
        .filter_map(|(code, info)| {
            let display_name = info.get("nombre").and_then(scalar_string)?;
            Some(Group {
                code,
                display_name,
                kind: info
                    .get("tipo")
                    .and_then(Value::as_str)
                    .map(GroupKind::parse)
                    .unwrap_or(GroupKind::Expense),
                color: info
                    .get("color")
                    .and_then(scalar_string)
                    .unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
            })
        })
        .collect()
}

fn parse_hierarchy(v: &Value) -> Vec<HierarchyEntry> {
    let mut out = Vec::new();
    for (section, categories) in entries(v) {
        for (principal, info) in categories.iter() {
            let (Some(principal), Some(info)) = (scalar_string(principal), info.as_mapping())
            else {
                continue;
            };
            if info.is_empty() {
                continue;
            }
            out.push(HierarchyEntry {
                section: section.clone(),
                group_code: info.get("grupo").and_then(scalar_string),
                principal,
                subcategories: info.get("subcategorias").map(string_list).unwrap_or_default(),
            });
        }
    }
    out
}

fn parse_mapping(info: &Mapping, key: &str, fallback_principal: &str) -> Option<ContextualMapping> {
    let target = info.get(key)?.as_mapping()?;
    Some(ContextualMapping {
        group_code: target.get("grupo").and_then(scalar_string)?,
        principal: target
            .get("categoria_principal")
            .and_then(scalar_string)
            .unwrap_or_else(|| fallback_principal.to_string()),
    })
}

fn parse_contextual(v: &Value) -> Vec<ContextualRule> {
    entries(v)
        .filter_map(|(key, info)| {
            let discriminator = match info.get("clasificar_por").and_then(scalar_string) {
                Some(d) if d == "signo_monto" => Discriminator::SignOfAmount,
                Some(d) => Discriminator::Other(d),
                None => Discriminator::Other(String::new()),
            };
            Some(ContextualRule {
                positive: parse_mapping(info, "si_positivo", &key)?,
                negative: parse_mapping(info, "si_negativo", &key)?,
                discriminator,
                key,
            })
        })
        .collect()
}
