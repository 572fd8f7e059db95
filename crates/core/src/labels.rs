//! Labeler (C9): derives the set of labels a PR's changed files earn from
//! the repository's [`crate::config::LabelConfiguration`].

use crate::config::LabelConfiguration;
use regex::Regex;
use std::collections::BTreeSet;

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;

/// Evaluates `label_configuration` against `changed_files`, returning the
/// labels whose path regexes matched at least one file.
///
/// Invalid regexes in the configuration are skipped rather than failing
/// the whole evaluation — one project's typo shouldn't break labeling for
/// every other label.
pub fn labels_for_changed_files(
    label_configuration: &LabelConfiguration,
    changed_files: &[String],
) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();

    for (label, patterns) in label_configuration {
        let matches = patterns.iter().any(|pattern| {
            Regex::new(pattern)
                .map(|re| changed_files.iter().any(|file| re.is_match(file)))
                .unwrap_or(false)
        });
        if matches {
            labels.insert(label.clone());
        }
    }

    labels
}

/// The set difference the state machine (C5) needs to converge a PR's
/// current labels with the desired set: labels to add, labels to remove.
pub fn label_diff(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    let to_add: Vec<String> = desired.difference(current).cloned().collect();
    let to_remove: Vec<String> = current.difference(desired).cloned().collect();
    (to_add, to_remove)
}
