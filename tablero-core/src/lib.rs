//! tablero-core: label normalization, category configuration and the classifier

pub mod amount;
pub mod classifier;
pub mod config;
pub mod duplicates;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod transaction;

pub use amount::{parse_locale_amount, try_parse_locale_amount};
pub use classifier::{CategoryClassifier, GROUP_PREFIXES, SUMMARY_GROUP, UNCLASSIFIED_GROUP};
pub use config::{
    CategoryConfig, ConfigError, ContextualMapping, ContextualRule, Discriminator, Group,
    GroupKind, HierarchyEntry,
};
pub use duplicates::{DuplicateLabel, find_duplicate_labels};
pub use filter::{AmountKind, TransactionFilter};
pub use format::{CurrencyFormat, SymbolPosition, abbreviate};
pub use normalize::normalize;
pub use transaction::{Classification, ClassifiedTransaction, PeriodInfo, TransactionRecord};
