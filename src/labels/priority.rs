//! Label priority rules.
//!
//! A rule file holds one `winner > loser` rule per line. `*` on one side
//! expands to every other known label, so `* > empty` means every label beats
//! `empty`. At most one rule may exist per unordered label pair.

use crate::constants::{MAX_LOGGED_PATHS, RULE_SEPARATOR, WILDCARD};
use crate::error::{Error, Result};
use crate::pipeline::{Report, RuleApplication};
use crate::table::{Labelled, Table, is_asserted};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

/// An unordered pair of labels, stored in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelPair {
    first: String,
    second: String,
}

impl LabelPair {
    /// Create a pair; argument order does not matter.
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// The member of the pair that is not `label`.
    fn other(&self, label: &str) -> &str {
        if self.first == label {
            &self.second
        } else {
            &self.first
        }
    }
}

/// A concrete rule: on rows asserting both labels, `loser` is cleared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriorityRule {
    /// Label that is kept.
    pub winner: String,
    /// Label that is cleared.
    pub loser: String,
}

/// Set of concrete priority rules keyed by unordered label pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityRuleSet {
    rules: BTreeMap<LabelPair, String>,
}

impl PriorityRuleSet {
    /// Read the lines of a priority rules file.
    pub fn read_rule_file(path: &Path) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::PriorityRulesRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(contents.lines().map(ToString::to_string).collect())
    }

    /// Parse rule lines against the full set of canonical labels.
    ///
    /// Blank lines are skipped. Labels outside `all_labels` only warn; a
    /// rule may name a label that this slice of the dataset lacks.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPriorityRule`] when a line lacks exactly one `>` or
    ///   a side is empty
    /// - [`Error::WildcardBothSides`] for `* > *`
    /// - [`Error::SelfReferentialRule`] when both sides name the same label
    /// - [`Error::DuplicatePriorityRule`] when two rules, after wildcard
    ///   expansion, target the same pair
    pub fn parse<I, S>(rule_lines: I, all_labels: &BTreeSet<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();

        for line in rule_lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let (winner, loser) = split_rule(line)?;
            set.add_rule(line, winner, loser, all_labels)?;
        }

        info!("{} priority rule(s) loaded", set.len());
        Ok(set)
    }

    fn add_rule(
        &mut self,
        line: &str,
        winner: &str,
        loser: &str,
        all_labels: &BTreeSet<String>,
    ) -> Result<()> {
        if winner == WILDCARD && loser == WILDCARD {
            return Err(Error::WildcardBothSides {
                rule: line.to_string(),
            });
        }
        if winner == loser {
            return Err(Error::SelfReferentialRule {
                label: winner.to_string(),
            });
        }
        for label in [winner, loser] {
            if label != WILDCARD && !all_labels.contains(label) {
                warn!("Label {label} in priority rules is not in the dataset");
            }
        }

        if winner == WILDCARD {
            for label in all_labels.iter().filter(|l| l.as_str() != loser) {
                self.insert(label, loser)?;
            }
        } else if loser == WILDCARD {
            for label in all_labels.iter().filter(|l| l.as_str() != winner) {
                self.insert(winner, label)?;
            }
        } else {
            self.insert(winner, loser)?;
        }

        Ok(())
    }

    /// Insert one concrete rule.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicatePriorityRule`] if a rule for the pair exists.
    pub fn insert(&mut self, winner: &str, loser: &str) -> Result<()> {
        if winner == loser {
            return Err(Error::SelfReferentialRule {
                label: winner.to_string(),
            });
        }

        let pair = LabelPair::new(winner, loser);
        if self.rules.contains_key(&pair) {
            return Err(Error::DuplicatePriorityRule {
                first: winner.to_string(),
                second: loser.to_string(),
            });
        }
        self.rules.insert(pair, winner.to_string());
        Ok(())
    }

    /// Winner for a pair of labels, if a rule covers them.
    pub fn winner_of(&self, a: &str, b: &str) -> Option<&str> {
        self.rules.get(&LabelPair::new(a, b)).map(String::as_str)
    }

    /// Concrete rules, ordered by label pair.
    pub fn rules(&self) -> impl Iterator<Item = PriorityRule> + '_ {
        self.rules.iter().map(|(pair, winner)| PriorityRule {
            winner: winner.clone(),
            loser: pair.other(winner).to_string(),
        })
    }

    /// Number of concrete rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Clear the loser of every rule whose two labels are both asserted.
    ///
    /// Conflicts are detected against each row's labels as they were before
    /// any rule ran, so the result does not depend on rule order even when
    /// rules share a label. Rules naming a label the table lacks are skipped.
    pub fn apply<R: Labelled + Clone>(&self, table: &Table<R>, report: &mut Report) -> Table<R> {
        struct ActiveRule<'a> {
            winner: &'a str,
            loser: &'a str,
            winner_col: usize,
            loser_col: usize,
        }

        let active: Vec<ActiveRule<'_>> = self
            .rules
            .iter()
            .filter_map(|(pair, winner)| {
                let loser = pair.other(winner);
                Some(ActiveRule {
                    winner,
                    loser,
                    winner_col: table.label_index(winner)?,
                    loser_col: table.label_index(loser)?,
                })
            })
            .collect();

        let mut affected: Vec<Vec<&str>> = vec![Vec::new(); active.len()];
        let mut rows = Vec::with_capacity(table.len());

        for row in table.rows() {
            let snapshot = row.label_values();
            let mut resolved = row.clone();
            for (rule, paths) in active.iter().zip(affected.iter_mut()) {
                if is_asserted(snapshot[rule.winner_col]) && is_asserted(snapshot[rule.loser_col])
                {
                    resolved.label_values_mut()[rule.loser_col] = Some(0);
                    paths.push(row.file_path());
                }
            }
            rows.push(resolved);
        }

        for (rule, paths) in active.iter().zip(&affected) {
            if paths.is_empty() {
                continue;
            }
            warn!(
                "label {} conflicted with {} and is being dropped from {} row(s): {}",
                rule.loser,
                rule.winner,
                paths.len(),
                example_paths(paths)
            );
            report.rule_applications.push(RuleApplication {
                winner: rule.winner.to_string(),
                loser: rule.loser.to_string(),
                rows: paths.len(),
            });
        }

        table.with_rows(rows)
    }
}

/// Split `winner > loser` into trimmed sides.
fn split_rule(line: &str) -> Result<(&str, &str)> {
    let invalid = |reason: &str| Error::InvalidPriorityRule {
        rule: line.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = line.split(RULE_SEPARATOR);
    let (Some(winner), Some(loser), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected exactly one '>'"));
    };

    let (winner, loser) = (winner.trim(), loser.trim());
    if winner.is_empty() || loser.is_empty() {
        return Err(invalid("both sides must name a label"));
    }
    Ok((winner, loser))
}

fn example_paths(paths: &[&str]) -> String {
    let shown = paths
        .iter()
        .take(MAX_LOGGED_PATHS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if paths.len() > MAX_LOGGED_PATHS {
        format!("{shown} (and {} more)", paths.len() - MAX_LOGGED_PATHS)
    } else {
        shown
    }
}

/// Drop rows that still assert more than one label, unless `keep_unresolved`.
///
/// Null cells count as not asserted.
pub fn resolve_or_drop<R: Labelled + Clone>(
    table: &Table<R>,
    keep_unresolved: bool,
    report: &mut Report,
) -> Table<R> {
    let unresolved = table
        .rows()
        .iter()
        .filter(|row| row.asserted_count() > 1)
        .count();

    if keep_unresolved {
        if unresolved > 0 {
            info!("{unresolved} images have multiple labels and are being kept");
        }
        report.unresolved_kept += unresolved;
        return table.clone();
    }

    if unresolved > 0 {
        warn!("{unresolved} images have multiple labels and are being dropped");
    }
    report.unresolved_dropped += unresolved;

    let rows = table
        .rows()
        .iter()
        .filter(|row| row.asserted_count() <= 1)
        .cloned()
        .collect();
    table.with_rows(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::table::{DetectionRow, DetectionTable};

    fn labels(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn table(label_names: &[&str], rows: Vec<(&str, Vec<Option<u8>>)>) -> DetectionTable {
        DetectionTable::new(
            label_names.iter().map(ToString::to_string).collect(),
            rows.into_iter()
                .map(|(path, values)| DetectionRow {
                    file_path: path.to_string(),
                    capture_date: "01-Jan-20".to_string(),
                    labels: values,
                })
                .collect(),
        )
    }

    #[test]
    fn test_split_rule_trims_whitespace() {
        assert_eq!(split_rule("  deer >  fox ").unwrap(), ("deer", "fox"));
    }

    #[test]
    fn test_split_rule_rejects_malformed() {
        assert!(matches!(split_rule("deer fox"), Err(Error::InvalidPriorityRule { .. })));
        assert!(matches!(split_rule("a > b > c"), Err(Error::InvalidPriorityRule { .. })));
        assert!(matches!(split_rule(" > fox"), Err(Error::InvalidPriorityRule { .. })));
    }

    #[test]
    fn test_label_pair_is_unordered() {
        assert_eq!(LabelPair::new("fox", "deer"), LabelPair::new("deer", "fox"));
        assert_eq!(LabelPair::new("fox", "deer").other("deer"), "fox");
    }

    #[test]
    fn test_left_wildcard_expansion() {
        let rules =
            PriorityRuleSet::parse(["* > empty"], &labels(&["deer", "empty", "fox"])).unwrap();
        let concrete: Vec<_> = rules.rules().collect();
        assert_eq!(
            concrete,
            vec![
                PriorityRule {
                    winner: "deer".to_string(),
                    loser: "empty".to_string()
                },
                PriorityRule {
                    winner: "fox".to_string(),
                    loser: "empty".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_right_wildcard_expansion() {
        let rules =
            PriorityRuleSet::parse(["human > *"], &labels(&["deer", "fox", "human"])).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.winner_of("deer", "human"), Some("human"));
        assert_eq!(rules.winner_of("human", "fox"), Some("human"));
    }

    #[test]
    fn test_both_wildcards_rejected() {
        let result = PriorityRuleSet::parse(["* > *"], &labels(&["a", "b"]));
        assert!(matches!(result, Err(Error::WildcardBothSides { .. })));
    }

    #[test]
    fn test_self_rule_rejected() {
        let result = PriorityRuleSet::parse(["deer > deer"], &labels(&["deer"]));
        assert!(matches!(result, Err(Error::SelfReferentialRule { .. })));
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let result = PriorityRuleSet::parse(["a > b", "b > a"], &labels(&["a", "b"]));
        assert!(matches!(result, Err(Error::DuplicatePriorityRule { .. })));
    }

    #[test]
    fn test_wildcard_overlap_rejected() {
        let result =
            PriorityRuleSet::parse(["* > empty", "empty > deer"], &labels(&["deer", "empty"]));
        assert!(matches!(result, Err(Error::DuplicatePriorityRule { .. })));
    }

    #[test]
    fn test_unknown_label_is_not_fatal() {
        let rules = PriorityRuleSet::parse(["wolf > deer", ""], &labels(&["deer"])).unwrap();
        assert_eq!(rules.winner_of("wolf", "deer"), Some("wolf"));
    }

    #[test]
    fn test_apply_clears_loser() {
        let rules = PriorityRuleSet::parse(["deer > fox"], &labels(&["deer", "fox"])).unwrap();
        let input = table(
            &["deer", "fox"],
            vec![
                ("a.jpg", vec![Some(1), Some(1)]),
                ("b.jpg", vec![Some(0), Some(1)]),
            ],
        );

        let mut report = Report::default();
        let applied = rules.apply(&input, &mut report);
        assert_eq!(applied.rows()[0].labels, vec![Some(1), Some(0)]);
        assert_eq!(applied.rows()[1].labels, vec![Some(0), Some(1)]);
        assert_eq!(
            report.rule_applications,
            vec![RuleApplication {
                winner: "deer".to_string(),
                loser: "fox".to_string(),
                rows: 1
            }]
        );
        assert_eq!(input.rows()[0].labels, vec![Some(1), Some(1)]);
    }

    #[test]
    fn test_apply_uses_row_snapshot() {
        // fox beats empty but loses to deer; both clears come from the row before any rule ran.
        let rules =
            PriorityRuleSet::parse(["deer > fox", "fox > empty"], &labels(&["deer", "empty", "fox"]))
                .unwrap();
        let input = table(&["deer", "empty", "fox"], vec![("a.jpg", vec![Some(1), Some(1), Some(1)])]);

        let mut report = Report::default();
        let applied = rules.apply(&input, &mut report);
        assert_eq!(applied.rows()[0].labels, vec![Some(1), Some(0), Some(0)]);
        assert_eq!(report.labels_cleared(), 2);
    }

    #[test]
    fn test_apply_skips_rules_for_absent_columns() {
        let rules = PriorityRuleSet::parse(["wolf > deer"], &labels(&["deer"])).unwrap();
        let input = table(&["deer"], vec![("a.jpg", vec![Some(1)])]);

        let mut report = Report::default();
        let applied = rules.apply(&input, &mut report);
        assert_eq!(applied, input);
        assert!(report.rule_applications.is_empty());
    }

    #[test]
    fn test_resolve_or_drop() {
        let input = table(
            &["deer", "fox"],
            vec![
                ("a.jpg", vec![Some(1), Some(1)]),
                ("b.jpg", vec![Some(1), None]),
                ("c.jpg", vec![None, None]),
            ],
        );

        let mut report = Report::default();
        let dropped = resolve_or_drop(&input, false, &mut report);
        assert_eq!(dropped.len(), 2);
        assert_eq!(report.unresolved_dropped, 1);

        let mut report = Report::default();
        let kept = resolve_or_drop(&input, true, &mut report);
        assert_eq!(kept, input);
        assert_eq!(report.unresolved_kept, 1);
        assert_eq!(report.unresolved_dropped, 0);
    }

    #[test]
    fn test_example_paths_truncates() {
        let paths: Vec<String> = (0..12).map(|i| format!("{i}.jpg")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let shown = example_paths(&refs);
        assert!(shown.starts_with("0.jpg, 1.jpg"));
        assert!(shown.ends_with("(and 2 more)"));
    }
}
