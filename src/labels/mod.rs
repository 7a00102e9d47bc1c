//! Label canonicalization and conflict resolution.

mod labelmap;
mod priority;

pub use labelmap::LabelMap;
pub use priority::{LabelPair, PriorityRule, PriorityRuleSet, resolve_or_drop};
