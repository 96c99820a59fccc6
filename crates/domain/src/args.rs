//! Caller-argument bag for a single create-group call.

use std::fmt;

use crate::value::Value;

/// Reserved argument-bag keys seeded by the engine on every create call.
pub mod keys {
    /// The enclosing application handle.
    pub const APPLICATION: &str = "application";
    /// The group's type name.
    pub const GROUP_TYPE: &str = "groupType";
    /// The group's resolved identifier.
    pub const GROUP_ID: &str = "groupId";
    /// The group itself, once constructed.
    pub const GROUP: &str = "group";
    /// The configuration the group was instantiated from.
    pub const CONFIGURATION: &str = "configuration";
    /// Caller-supplied parent group.
    pub const PARENT_GROUP: &str = "parentGroup";
}

/// Derive the conventional `parent<Member>` key under which a parent
/// group's member is exposed to its children.
pub fn parent_key(member: &str) -> String {
    let mut key = String::with_capacity(member.len() + 6);
    key.push_str("parent");
    let mut chars = member.chars();
    if let Some(first) = chars.next() {
        key.extend(first.to_uppercase());
        key.push_str(chars.as_str());
    }
    key
}

/// Transient, ordered, null-aware mapping from name to value.
///
/// Scoped to a single create-group call. Entries keep insertion order;
/// re-inserting a key keeps its original position and replaces the value.
/// A key can be present with no value, which is distinct from the key
/// being absent: a present null tells the engine "this member/argument is
/// intentionally omitted".
#[derive(Clone, Default)]
pub struct ArgumentBag {
    entries: Vec<(String, Option<Value>)>,
}

impl ArgumentBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, preserving the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| *name == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Insert a non-null value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.insert(key, Some(value));
    }

    /// Mark a key present with an explicit null.
    pub fn set_null(&mut self, key: impl Into<String>) {
        self.insert(key, None);
    }

    /// Builder-style [`Self::set`] for call sites assembling a bag inline.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style [`Self::set_null`].
    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.set_null(key);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    /// The stored entry: `None` = absent, `Some(None)` = present-but-null.
    pub fn entry(&self, key: &str) -> Option<&Option<Value>> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// The stored value, flattening away the absent/null distinction.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.entry(key).and_then(|value| value.clone())
    }

    /// Overlay `other` onto this bag: existing keys are replaced in
    /// place, new keys are appended in `other`'s order.
    pub fn extend(&mut self, other: ArgumentBag) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Option<Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ArgumentBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}
