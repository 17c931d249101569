use crate::status::EntityStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-entity status map for one scope.
///
/// Absent ids read as [`EntityStatus::LOCKED`], so an absent entry and an
/// explicit `{unlocked: false, completed: false}` behave identically.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CompletionRecord {
    entries: BTreeMap<String, EntityStatus>,
}

impl CompletionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, id: &str) -> EntityStatus {
        self.entries.get(id).copied().unwrap_or_default()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.status(id).completed
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.status(id).unlocked
    }

    pub fn set(&mut self, id: impl Into<String>, status: EntityStatus) {
        self.entries.insert(id.into(), status);
    }

    /// Mutable access to an entry, inserting the locked default first.
    pub fn entry_mut(&mut self, id: &str) -> &mut EntityStatus {
        self.entries.entry(id.to_string()).or_default()
    }

    /// Field-level upsert: each entry of `other` is OR-ed into this record.
    pub fn merge(&mut self, other: &CompletionRecord) {
        for (id, status) in &other.entries {
            let current = self.entries.entry(id.clone()).or_default();
            *current = current.merge(status);
        }
    }

    pub fn normalized(&self) -> CompletionRecord {
        CompletionRecord {
            entries: self
                .entries
                .iter()
                .map(|(id, status)| (id.clone(), status.normalized()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityStatus)> {
        self.entries.iter().map(|(id, status)| (id.as_str(), status))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, EntityStatus)> for CompletionRecord {
    fn from_iter<I: IntoIterator<Item = (K, EntityStatus)>>(iter: I) -> Self {
        CompletionRecord {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
