//! Which stages count as "closed" for a deal.
//!
//! The policy is data: a table from stage name to flags, built once at
//! startup and shared read-only. The transition service consults it with the
//! *target* stage name only; no stage history is kept.

use std::collections::HashMap;

pub const DEFAULT_CLOSED_STAGES: &[&str] = &["onboarding", "active", "renewal", "archive"];
pub const DEFAULT_EXCLUDED_STAGES: &[&str] = &["archive"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    /// Entering this stage stamps `closed_at`; leaving the set clears it.
    pub closed: bool,
    /// Left out of the dashboard's open pipeline value.
    pub excluded_from_totals: bool,
}

#[derive(Debug, Clone)]
pub struct ClosedStagePolicy {
    stages: HashMap<String, StageFlags>,
}

impl ClosedStagePolicy {
    pub fn new<C, E>(closed: C, excluded: E) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut stages: HashMap<String, StageFlags> = HashMap::new();
        for name in closed {
            stages.entry(normalize(name.as_ref())).or_default().closed = true;
        }
        for name in excluded {
            stages
                .entry(normalize(name.as_ref()))
                .or_default()
                .excluded_from_totals = true;
        }
        stages.retain(|name, _| !name.is_empty());
        Self { stages }
    }

    pub fn flags(&self, stage_name: &str) -> StageFlags {
        self.stages
            .get(&normalize(stage_name))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_closed(&self, stage_name: &str) -> bool {
        self.flags(stage_name).closed
    }

    pub fn is_excluded_from_totals(&self, stage_name: &str) -> bool {
        self.flags(stage_name).excluded_from_totals
    }

    pub fn closed_stage_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .stages
            .iter()
            .filter(|(_, flags)| flags.closed)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn excluded_stage_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .stages
            .iter()
            .filter(|(_, flags)| flags.excluded_from_totals)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for ClosedStagePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSED_STAGES, DEFAULT_EXCLUDED_STAGES)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_closes_commercial_stages() {
        let policy = ClosedStagePolicy::default();
        for name in ["onboarding", "active", "renewal", "archive"] {
            assert!(policy.is_closed(name), "{} should be closed", name);
        }
        for name in ["lead", "contacted", "proposal", "negotiation", "unknown"] {
            assert!(!policy.is_closed(name), "{} should be open", name);
        }
    }

    #[test]
    fn only_archive_is_excluded_by_default() {
        let policy = ClosedStagePolicy::default();
        assert!(policy.is_excluded_from_totals("archive"));
        assert!(!policy.is_excluded_from_totals("active"));
        assert_eq!(policy.excluded_stage_names(), vec!["archive"]);
    }

    #[test]
    fn names_are_matched_case_insensitively() {
        let policy = ClosedStagePolicy::new([" Won "], Vec::<String>::new());
        assert!(policy.is_closed("won"));
        assert!(policy.is_closed("WON"));
        assert_eq!(policy.closed_stage_names(), vec!["won"]);
    }

    #[test]
    fn blank_entries_are_ignored() {
        let policy = ClosedStagePolicy::new(["", "active"], [""]);
        assert_eq!(policy.closed_stage_names(), vec!["active"]);
        assert!(policy.excluded_stage_names().is_empty());
    }
}
