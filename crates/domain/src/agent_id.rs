use std::fmt;

/// Separator between the workflow and local parts of a qualified agent id.
pub const SEPARATOR: char = '/';

/// A workflow-qualified agent identifier, rendered as `workflow/local`.
///
/// Registered agents are attributed to a workflow structurally through this
/// type. An id with no separator (for instance a hand-configured `main`
/// agent) does not parse and therefore never belongs to any workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId {
    pub workflow_id: String,
    pub local_id: String,
}

impl AgentId {
    pub fn new(workflow_id: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            local_id: local_id.into(),
        }
    }

    /// Split a qualified id on its first separator.
    ///
    /// Returns `None` when the separator is missing or either side is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (workflow_id, local_id) = raw.split_once(SEPARATOR)?;
        if workflow_id.is_empty() || local_id.is_empty() {
            return None;
        }
        Some(Self::new(workflow_id, local_id))
    }

    pub fn belongs_to(&self, workflow_id: &str) -> bool {
        self.workflow_id == workflow_id
    }
}

/// Whether the raw id string is qualified with `workflow_id`.
pub fn is_owned_by(raw: &str, workflow_id: &str) -> bool {
    AgentId::parse(raw).is_some_and(|id| id.belongs_to(workflow_id))
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.workflow_id, self.local_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id = AgentId::parse("bugfix/developer").unwrap();
        assert_eq!(id.workflow_id, "bugfix");
        assert_eq!(id.local_id, "developer");
        assert_eq!(id.to_string(), "bugfix/developer");
    }

    #[test]
    fn parse_splits_on_first_separator() {
        let id = AgentId::parse("feature/dev/extra").unwrap();
        assert_eq!(id.workflow_id, "feature");
        assert_eq!(id.local_id, "dev/extra");
    }

    #[test]
    fn unqualified_ids_do_not_parse() {
        assert!(AgentId::parse("main").is_none());
        assert!(AgentId::parse("/developer").is_none());
        assert!(AgentId::parse("bugfix/").is_none());
        assert!(AgentId::parse("").is_none());
    }

    #[test]
    fn ownership_is_exact_on_workflow_part() {
        assert!(is_owned_by("bugfix/developer", "bugfix"));
        assert!(!is_owned_by("bugfix-extra/developer", "bugfix"));
        assert!(!is_owned_by("bugfixdeveloper", "bugfix"));
        assert!(!is_owned_by("main", "main"));
    }
}
