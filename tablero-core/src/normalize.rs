//! Label normalization shared by the classifier and the ingest duplicate pass.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Trim, lowercase and strip accents so "Básico ", "basico" and "BÁSICO"
/// all compare equal.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.to_lowercase().trim().to_string()
}
