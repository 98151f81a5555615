//! Expansion of changed package directories into the set to rebuild.

use std::collections::BTreeSet;

use crate::graph::Graph;

/// Whether `key` names a single directory below the packages root.
pub fn is_dir_key(key: &str) -> bool {
    !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\'])
}

/// Keep the keys accepted by [`is_dir_key`], logging every rejected one.
pub fn valid_dir_keys(changed: &BTreeSet<String>) -> BTreeSet<String> {
    changed
        .iter()
        .filter(|key| {
            let valid = is_dir_key(key);
            if !valid {
                tracing::warn!(
                    package = %key,
                    "Ignoring changed directory that is not a package directory key"
                );
            }
            valid
        })
        .cloned()
        .collect()
}

/// Expand `changed` with the direct dependents of every changed package.
///
/// Only one hop is followed: dependents of dependents are not included.
/// Every changed directory stays in the result, including directories the
/// graph knows nothing about.
pub fn expand(changed: &BTreeSet<String>, graph: &Graph) -> BTreeSet<String> {
    let mut impacted = changed.clone();

    for dir in changed {
        let Some(name) = graph.name_for_dir(dir) else {
            tracing::warn!(
                package = %dir,
                "Changed directory is not a known package; keeping it without expansion"
            );
            continue;
        };

        for dependent in graph.children(name) {
            match graph.dir_for_name(dependent) {
                Some(dependent_dir) => {
                    if impacted.insert(dependent_dir.to_string()) {
                        tracing::debug!(package = %dependent_dir, via = %dir, "Dependent impacted");
                    }
                }
                None => {
                    tracing::debug!(dependent = %dependent, "Dependent has no directory; ignoring");
                }
            }
        }
    }

    impacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_keys_are_single_segments() {
        assert!(is_dir_key("api"));
        assert!(is_dir_key(".config"));
        for key in ["", ".", "..", "api/src", "..\\api"] {
            assert!(!is_dir_key(key), "{key:?} accepted");
        }
    }
}
