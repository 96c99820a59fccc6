//! Lifecycle events broadcast by the engine.
//!
//! Events carry identifiers rather than references so they serialize
//! cleanly and can be persisted or forwarded at an adapter boundary.

use serde::{Deserialize, Serialize};

/// Coarse-grained lifecycle notifications for group create/destroy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// A group's members are built and about to be wired and initialized.
    GroupInitializing {
        group_type: String,
        group_id: String,
    },
    /// A group finished creation: wired, registered, and initialized.
    GroupCreated {
        group_type: String,
        group_id: String,
    },
    /// An instance was produced by a member container. Published by
    /// construction collaborators, not by the lifecycle itself; the
    /// lifecycle only gates it through the instantiation-events flag.
    InstanceCreated { type_name: String },
    /// A member artifact is about to run its destroy callback.
    InstanceDestroyed { group_id: String, member: String },
    /// A group was torn down and removed from the registry.
    GroupDestroyed {
        group_type: String,
        group_id: String,
    },
}

/// Receiver of lifecycle events.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent);
}
