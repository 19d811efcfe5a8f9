use gamewatch_types::ServerId;
use std::collections::{BTreeSet, HashMap};

/// Names that joined and left between two rosters, both sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterChange {
    pub joined: Vec<String>,
    pub left: Vec<String>,
}

impl RosterChange {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// Last seen roster per server, owned by the processor.
#[derive(Debug, Default)]
pub struct RosterTracker {
    rosters: HashMap<ServerId, BTreeSet<String>>,
}

impl RosterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster of `server_id` and report the difference.
    /// Duplicate and blank names collapse.
    pub fn update(&mut self, server_id: ServerId, names: &[String]) -> RosterChange {
        let next: BTreeSet<String> = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        let previous = self.rosters.insert(server_id, next.clone()).unwrap_or_default();

        RosterChange {
            joined: next.difference(&previous).cloned().collect(),
            left: previous.difference(&next).cloned().collect(),
        }
    }

    /// Forget the roster of `server_id`, returning who was on it.
    pub fn clear(&mut self, server_id: ServerId) -> Vec<String> {
        self.rosters
            .remove(&server_id)
            .map(|names| names.into_iter().collect())
            .unwrap_or_default()
    }

    /// Undo the parts of the last change that were not persisted, so the
    /// next roster reports them again: failed joins are dropped from the
    /// roster and failed leaves are put back.
    pub fn revert(&mut self, server_id: ServerId, joined: &[String], left: &[String]) {
        if joined.is_empty() && left.is_empty() {
            return;
        }
        let roster = self.rosters.entry(server_id).or_default();
        for name in joined {
            roster.remove(name);
        }
        roster.extend(left.iter().cloned());
    }

    #[cfg(test)]
    pub fn players(&self, server_id: ServerId) -> Vec<String> {
        self.rosters
            .get(&server_id)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }
}
