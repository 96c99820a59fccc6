//! Process-wide table of live groups.

use std::sync::Arc;

use dashmap::DashMap;
use troupe_domain::GroupId;

use crate::groups::group::Group;

/// Live groups keyed by identifier.
///
/// Only the lifecycle manager mutates this table; everyone else reads.
/// The map is internally synchronized, so reads never block the manager.
#[derive(Default)]
pub struct GroupRegistry {
    groups: DashMap<GroupId, Arc<Group>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &str) -> Option<Arc<Group>> {
        self.groups.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn groups(&self) -> Vec<Arc<Group>> {
        self.groups
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn insert(&self, group: Arc<Group>) {
        self.groups.insert(group.id().clone(), group);
    }

    pub(crate) fn remove(&self, id: &str) -> Option<Arc<Group>> {
        self.groups.remove(id).map(|(_, group)| group)
    }
}
