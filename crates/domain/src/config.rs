//! Group configuration descriptors and flags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Behaviour flags read from a group's declared configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GroupFlags {
    /// Disposable component instance: many live instances per type, each
    /// with a synthesized identifier.
    pub component: bool,
    /// Publish group-level creation/destruction events.
    pub lifecycle_events: bool,
    /// Publish events emitted while members are being constructed.
    pub instantiation_events: bool,
    /// Publish per-member destroy-instance events.
    pub destruction_events: bool,
    /// Register the controller-role member as a process-wide event
    /// listener.
    pub listener_events: bool,
}

impl Default for GroupFlags {
    fn default() -> Self {
        Self {
            component: false,
            lifecycle_events: true,
            instantiation_events: true,
            destruction_events: true,
            listener_events: true,
        }
    }
}

/// What to do when a new group resolves to an identifier that is already
/// live. Application-scoped, not per-configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Refuse the new group and keep the old one.
    #[default]
    Exception,
    /// Destroy the old group first, then proceed with the new one.
    Warning,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Exception => write!(f, "exception"),
            CollisionPolicy::Warning => write!(f, "warning"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exception" => Ok(CollisionPolicy::Exception),
            "warning" => Ok(CollisionPolicy::Warning),
            other => Err(ConfigError::parse(format!(
                "unknown collision policy '{other}'"
            ))),
        }
    }
}

/// One declared member: its name within the group and the implementation
/// reference handed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    pub implementation: String,
}

impl MemberSpec {
    pub fn new(name: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            implementation: implementation.into(),
        }
    }
}

/// Immutable descriptor a group is instantiated from.
///
/// Created once when group types are discovered and shared for process
/// duration; many live groups may be instantiated from one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfiguration {
    group_type: String,
    members: Vec<MemberSpec>,
    #[serde(default)]
    flags: GroupFlags,
}

impl GroupConfiguration {
    /// Validated constructor: non-blank type name, unique member names.
    pub fn new(
        group_type: impl Into<String>,
        members: Vec<MemberSpec>,
        flags: GroupFlags,
    ) -> Result<Self, ConfigError> {
        let group_type = group_type.into();
        if group_type.trim().is_empty() {
            return Err(ConfigError::BlankType);
        }
        for (index, member) in members.iter().enumerate() {
            if members[..index].iter().any(|prior| prior.name == member.name) {
                return Err(ConfigError::DuplicateMember(member.name.clone()));
            }
        }
        Ok(Self {
            group_type,
            members,
            flags,
        })
    }

    pub fn group_type(&self) -> &str {
        &self.group_type
    }

    /// Declared members, in declaration order.
    pub fn members(&self) -> &[MemberSpec] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberSpec> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn flags(&self) -> GroupFlags {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults() {
        let flags = GroupFlags::default();
        assert!(!flags.component);
        assert!(flags.lifecycle_events);
        assert!(flags.instantiation_events);
        assert!(flags.destruction_events);
        assert!(flags.listener_events);
    }

    #[test]
    fn test_flags_deserialize_with_defaults() {
        let flags: GroupFlags = serde_json::from_str(r#"{"component": true}"#).unwrap();
        assert!(flags.component);
        assert!(flags.lifecycle_events);

        let flags: GroupFlags =
            serde_json::from_str(r#"{"lifecycle_events": false, "destruction_events": false}"#)
                .unwrap();
        assert!(!flags.component);
        assert!(!flags.lifecycle_events);
        assert!(!flags.destruction_events);
        assert!(flags.instantiation_events);
    }

    #[test]
    fn test_collision_policy_round_trip() {
        assert_eq!(
            "warning".parse::<CollisionPolicy>().unwrap(),
            CollisionPolicy::Warning
        );
        assert_eq!(
            "Exception".parse::<CollisionPolicy>().unwrap(),
            CollisionPolicy::Exception
        );
        assert!("retry".parse::<CollisionPolicy>().is_err());
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Exception);
        assert_eq!(CollisionPolicy::Warning.to_string(), "warning");
    }

    #[test]
    fn test_configuration_validation() {
        let config = GroupConfiguration::new(
            "editor",
            vec![
                MemberSpec::new("model", "editor.model"),
                MemberSpec::new("view", "editor.view"),
            ],
            GroupFlags::default(),
        )
        .unwrap();
        assert_eq!(config.group_type(), "editor");
        assert_eq!(config.members().len(), 2);
        assert!(config.member("view").is_some());
        assert!(config.member("controller").is_none());

        assert_eq!(
            GroupConfiguration::new("  ", vec![], GroupFlags::default()),
            Err(ConfigError::BlankType)
        );
        let dup = GroupConfiguration::new(
            "editor",
            vec![
                MemberSpec::new("view", "a"),
                MemberSpec::new("view", "b"),
            ],
            GroupFlags::default(),
        );
        assert_eq!(dup, Err(ConfigError::DuplicateMember("view".into())));
    }

    #[test]
    fn test_configuration_deserializes_from_declared_form() {
        let json = r#"{
            "group_type": "browser",
            "members": [
                {"name": "model", "implementation": "browser.model"},
                {"name": "controller", "implementation": "browser.controller"}
            ],
            "flags": {"component": true, "listener_events": false}
        }"#;
        let config: GroupConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(config.group_type(), "browser");
        assert!(config.flags().component);
        assert!(!config.flags().listener_events);
        assert!(config.flags().lifecycle_events);
    }
}
