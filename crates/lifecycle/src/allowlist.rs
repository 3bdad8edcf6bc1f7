//! Sub-agent allowlist maintenance.
//!
//! Both operations are idempotent and accept an empty id slice.

use std::collections::HashSet;

use crate::shared_config::SharedConfig;

/// Append every id not yet on the allowlist, keeping existing order.
/// Returns how many ids were added.
pub fn add_subagent_allowlist(doc: &mut SharedConfig, ids: &[String]) -> usize {
    let allow = &mut doc.agents.defaults.subagents.allow_agents;
    let mut seen: HashSet<String> = allow.iter().cloned().collect();
    let before = allow.len();
    for id in ids {
        if seen.insert(id.clone()) {
            allow.push(id.clone());
        }
    }
    allow.len() - before
}

/// Drop the given ids from the allowlist. Returns how many were removed.
pub fn remove_subagent_allowlist(doc: &mut SharedConfig, ids: &[String]) -> usize {
    if ids.is_empty() {
        return 0;
    }
    let drop: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let allow = &mut doc.agents.defaults.subagents.allow_agents;
    let before = allow.len();
    allow.retain(|id| !drop.contains(id.as_str()));
    before - allow.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_is_idempotent_and_ordered() {
        let mut doc = SharedConfig::default();
        assert_eq!(add_subagent_allowlist(&mut doc, &ids(&["a/x", "a/y"])), 2);
        assert_eq!(add_subagent_allowlist(&mut doc, &ids(&["a/y", "a/x", "b/z"])), 1);
        assert_eq!(doc.allowlist(), ids(&["a/x", "a/y", "b/z"]).as_slice());
    }

    #[test]
    fn add_dedups_within_input() {
        let mut doc = SharedConfig::default();
        assert_eq!(add_subagent_allowlist(&mut doc, &ids(&["a/x", "a/x"])), 1);
        assert_eq!(doc.allowlist().len(), 1);
    }

    #[test]
    fn remove_only_named_ids() {
        let mut doc = SharedConfig::default();
        add_subagent_allowlist(&mut doc, &ids(&["main", "a/x", "a/y"]));
        assert_eq!(remove_subagent_allowlist(&mut doc, &ids(&["a/x", "a/y", "a/gone"])), 2);
        assert_eq!(doc.allowlist(), ids(&["main"]).as_slice());
        assert_eq!(remove_subagent_allowlist(&mut doc, &ids(&["a/x"])), 0);
    }

    #[test]
    fn empty_inputs_are_no_ops() {
        let mut doc = SharedConfig::default();
        assert_eq!(add_subagent_allowlist(&mut doc, &[]), 0);
        assert_eq!(remove_subagent_allowlist(&mut doc, &[]), 0);
        assert_eq!(doc, SharedConfig::default());
    }
}
