//! Map raw category labels from the sheet onto the configured hierarchy.
//!
//! Resolution order, first match wins:
//! 1. summary rows ("Gastos", "Ganancia Neta", ...) → `Resumen`
//! 2. exact lookup of the normalized label in the hierarchy index
//! 3. contextual rules decided by the sign of the amount
//! 4. the two-character group prefix of the raw label (`N-Vivienda`)
//! 5. `Sin Clasificar`, warned once per raw label

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::config::{CategoryConfig, ContextualRule, Discriminator};
use crate::normalize::normalize;
use crate::transaction::{Classification, ClassifiedTransaction, TransactionRecord};

pub const SUMMARY_GROUP: &str = "Resumen";
pub const UNCLASSIFIED_GROUP: &str = "Sin Clasificar";

/// Raw label prefixes that name their group directly.
pub const GROUP_PREFIXES: [(&str, &str); 5] = [
    ("B-", "basico"),
    ("D-", "discrecional"),
    ("N-", "necesario"),
    ("R-", "ingreso_regular"),
    ("O-", "ingreso_ocasional"),
];

pub struct CategoryClassifier {
    config: CategoryConfig,
    /// normalized label → classification; later hierarchy entries overwrite earlier ones
    index: HashMap<String, Classification>,
    summary_norm: HashSet<String>,
    contextual_norm: Vec<(String, ContextualRule)>,
    /// principals with subcategories; their sheet rows are totals
    parents: HashSet<String>,
    warned: Mutex<HashSet<String>>,
}

impl CategoryClassifier {
    pub fn new(config: CategoryConfig) -> Self {
        let index = build_index(&config);
        let summary_norm = config.summary_labels.iter().map(|s| normalize(s)).collect();
        let contextual_norm = config
            .contextual
            .iter()
            .map(|r| (normalize(&r.key), r.clone()))
            .collect();
        let parents = config
            .hierarchy
            .iter()
            .filter(|e| e.is_parent())
            .map(|e| e.principal.clone())
            .collect();

        tracing::debug!(entries = index.len(), "classification index built");

        Self {
            config,
            index,
            summary_norm,
            contextual_norm,
            parents,
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    pub fn classify(&self, label: &str, amount: f64) -> Classification {
        let label_norm = normalize(label);

        if self.summary_norm.contains(&label_norm) {
            return Classification::new(SUMMARY_GROUP, label, None);
        }

        if let Some(hit) = self.index.get(&label_norm) {
            return hit.clone();
        }

        if let Some(hit) = self.classify_contextual(label, &label_norm, amount) {
            return hit;
        }

        if let Some(hit) = self.classify_by_prefix(label) {
            return hit;
        }

        if self.note_unclassified(label) {
            tracing::warn!(label = %label, "unclassified category");
        }
        Classification::new(UNCLASSIFIED_GROUP, label, None)
    }

    fn classify_contextual(&self, label: &str, label_norm: &str, amount: f64) -> Option<Classification> {
        for (key_norm, rule) in &self.contextual_norm {
            if rule.discriminator != Discriminator::SignOfAmount {
                continue;
            }
            let matches = label_norm == key_norm
                || label_norm
                    .strip_prefix(key_norm.as_str())
                    .is_some_and(|rest| rest.starts_with(" - "));
            if !matches {
                continue;
            }

            let target = if amount > 0.0 { &rule.positive } else { &rule.negative };
            let Some(group) = self.config.group_by_code(&target.group_code) else {
                continue;
            };
            let subcategory = label.split_once(" - ").map(|(_, sub)| sub.to_string());
            return Some(Classification::new(
                group.display_name.as_str(),
                target.principal.as_str(),
                subcategory,
            ));
        }
        None
    }

    fn classify_by_prefix(&self, label: &str) -> Option<Classification> {
        GROUP_PREFIXES
            .iter()
            .find(|(prefix, _)| label.starts_with(prefix))
            .and_then(|(_, code)| self.config.group_by_code(code))
            .map(|group| Classification::new(group.display_name.as_str(), label, None))
    }

    /// Record an unclassified label; true the first time it is seen.
    fn note_unclassified(&self, label: &str) -> bool {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        warned.insert(label.to_string())
    }

    /// Raw labels that fell through every tier so far, sorted.
    pub fn warned_labels(&self) -> Vec<String> {
        let warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        let mut labels: Vec<String> = warned.iter().cloned().collect();
        labels.sort();
        labels
    }

    /// Classify every row of a table. `label_of` and `amount_of` pick the
    /// label and amount columns; row order is preserved.
    pub fn classify_table<T, L, A>(&self, rows: Vec<T>, label_of: L, amount_of: A) -> Vec<(T, Classification)>
    where
        L: Fn(&T) -> &str,
        A: Fn(&T) -> f64,
    {
        rows.into_iter()
            .map(|row| {
                let classification = self.classify(label_of(&row), amount_of(&row));
                (row, classification)
            })
            .collect()
    }

    pub fn classify_transactions(&self, records: &[TransactionRecord]) -> Vec<ClassifiedTransaction> {
        records
            .iter()
            .map(|record| ClassifiedTransaction {
                classification: self.classify(&record.label, record.amount),
                record: record.clone(),
            })
            .collect()
    }

    /// Principal categories that own subcategories. Their rows in the sheet
    /// are totals and must not be summed alongside their children.
    pub fn categories_with_subcategories(&self) -> Vec<String> {
        self.config
            .hierarchy
            .iter()
            .filter(|e| e.is_parent())
            .map(|e| e.principal.clone())
            .collect()
    }

    /// Whether a row may be summed with others: not a summary row and not
    /// the total row of a principal category with subcategories.
    pub fn is_additive(&self, tx: &ClassifiedTransaction) -> bool {
        tx.group() != SUMMARY_GROUP && !self.parents.contains(tx.record.label.trim())
    }

    /// The rows that totals, ratios and budgets are computed over.
    pub fn analysis_rows(&self, rows: &[ClassifiedTransaction]) -> Vec<ClassifiedTransaction> {
        let out: Vec<ClassifiedTransaction> = rows.iter().filter(|tx| self.is_additive(tx)).cloned().collect();
        tracing::debug!(kept = out.len(), dropped = rows.len() - out.len(), "analysis rows selected");
        out
    }

    pub fn subcategories(&self, principal: &str) -> Vec<String> {
        self.config
            .hierarchy
            .iter()
            .find(|e| e.principal == principal)
            .map(|e| e.subcategories.clone())
            .unwrap_or_default()
    }

    /// Distinct group display names, in config order.
    pub fn group_names(&self, include_summary: bool) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for g in &self.config.groups {
            if !names.contains(&g.display_name) {
                names.push(g.display_name.clone());
            }
        }
        if include_summary {
            names.push(SUMMARY_GROUP.to_string());
        }
        names
    }

    /// Sorted principal categories, optionally limited to one hierarchy section.
    pub fn principal_categories(&self, section: Option<&str>) -> Vec<String> {
        let mut out: Vec<String> = self
            .config
            .hierarchy
            .iter()
            .filter(|e| section.is_none_or(|s| e.section == s))
            .map(|e| e.principal.clone())
            .collect();
        out.sort();
        out
    }
}

fn build_index(config: &CategoryConfig) -> HashMap<String, Classification> {
    let mut index = HashMap::new();
    for entry in &config.hierarchy {
        let Some(group) = entry
            .group_code
            .as_deref()
            .and_then(|code| config.group_by_code(code))
        else {
            continue;
        };

        index.insert(
            normalize(&entry.principal),
            Classification::new(group.display_name.as_str(), entry.principal.as_str(), None),
        );
        for sub in &entry.subcategories {
            index.insert(
                normalize(sub),
                Classification::new(
                    group.display_name.as_str(),
                    entry.principal.as_str(),
                    Some(sub.clone()),
                ),
            );
        }
    }
    index
}
