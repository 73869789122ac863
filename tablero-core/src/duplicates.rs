//! Detect raw labels that collapse onto the same normalized key.
//!
//! The classification index keeps only the last variant of such a key, so
//! every collision loses data. Callers report these before classifying.

use serde::Serialize;

use crate::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateLabel {
    pub normalized: String,
    /// Distinct raw spellings, in order of first appearance
    pub variants: Vec<String>,
}

/// Group distinct raw labels by normalized form and return every group
/// with more than one spelling. Order follows first appearance.
pub fn find_duplicate_labels<'a, I>(labels: I) -> Vec<DuplicateLabel>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<DuplicateLabel> = Vec::new();
    for raw in labels {
        let key = normalize(raw);
        match groups.iter_mut().find(|g| g.normalized == key) {
            Some(group) => {
                if !group.variants.iter().any(|v| v == raw) {
                    group.variants.push(raw.to_string());
                }
            }
            None => groups.push(DuplicateLabel {
                normalized: key,
                variants: vec![raw.to_string()],
            }),
        }
    }
    groups.retain(|g| g.variants.len() > 1);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_each_collision_with_variants() {
        let labels = [
            "Mantenimiento",
            "Combustible",
            "mantenimiento",
            "Educación",
            "Mantenimiento",
            "Educacion ",
        ];
        let dups = find_duplicate_labels(labels);
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].normalized, "mantenimiento");
        assert_eq!(dups[0].variants, vec!["Mantenimiento", "mantenimiento"]);
        assert_eq!(dups[1].normalized, "educacion");
        assert_eq!(dups[1].variants, vec!["Educación", "Educacion "]);
    }

    #[test]
    fn test_repeated_identical_label_is_not_a_duplicate() {
        assert!(find_duplicate_labels(["Sueldo", "Sueldo", "Sueldo"]).is_empty());
        assert!(find_duplicate_labels(Vec::<&str>::new()).is_empty());
    }
}
