//! A live, wired group of member instances.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use troupe_domain::{Artifact, ContextChain, GroupConfiguration, GroupId, MemberRole, Value};

/// A named bundle of member instances with a shared lifecycle.
///
/// Constructed by the lifecycle manager and owned by the registry while
/// live. Holds the group's context node and the instances the injection
/// scope reported during creation, for release on destroy.
pub struct Group {
    id: GroupId,
    configuration: Arc<GroupConfiguration>,
    members: Vec<(String, Option<Value>)>,
    context: Arc<ContextChain>,
    parent: Option<Arc<Group>>,
    injected_instances: Mutex<Vec<Value>>,
}

impl Group {
    /// Build a group. Its context node parents to the parent group's
    /// context when a parent is given, else to `root_context`.
    pub(crate) fn new(
        configuration: Arc<GroupConfiguration>,
        id: GroupId,
        members: Vec<(String, Option<Value>)>,
        parent: Option<Arc<Group>>,
        root_context: &Arc<ContextChain>,
    ) -> Arc<Self> {
        let parent_context = parent
            .as_ref()
            .map(|group| Arc::clone(group.context()))
            .unwrap_or_else(|| Arc::clone(root_context));
        Arc::new(Self {
            id,
            configuration,
            members,
            context: Arc::new(ContextChain::with_parent(parent_context)),
            parent,
            injected_instances: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn group_type(&self) -> &str {
        self.configuration.group_type()
    }

    pub fn configuration(&self) -> &Arc<GroupConfiguration> {
        &self.configuration
    }

    pub fn context(&self) -> &Arc<ContextChain> {
        &self.context
    }

    pub fn parent(&self) -> Option<&Arc<Group>> {
        self.parent.as_ref()
    }

    /// Members in declaration order. A slot may hold no instance when the
    /// caller supplied an explicit null for it.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Option<Value>)> {
        self.members
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// A member's instance, flattening away the empty-slot distinction.
    pub fn member(&self, name: &str) -> Option<Value> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .and_then(|(_, value)| value.clone())
    }

    /// Artifact members in declaration order.
    pub fn artifact_members(&self) -> impl Iterator<Item = (&str, &Arc<dyn Artifact>)> {
        self.members().filter_map(|(name, value)| {
            value
                .as_ref()
                .and_then(Value::as_artifact)
                .map(|artifact| (name, artifact))
        })
    }

    /// The first member with the given role.
    pub fn find_by_role(&self, role: MemberRole) -> Option<Arc<dyn Artifact>> {
        self.artifact_members()
            .find(|(_, artifact)| artifact.role() == role)
            .map(|(_, artifact)| Arc::clone(artifact))
    }

    /// The controller-role member, when the group has one.
    pub fn controller(&self) -> Option<Arc<dyn Artifact>> {
        self.find_by_role(MemberRole::Controller)
    }

    pub(crate) fn record_injected(&self, instances: Vec<Value>) {
        self.injected_instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(instances);
    }

    pub(crate) fn take_injected(&self) -> Vec<Value> {
        std::mem::take(
            &mut *self
                .injected_instances
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Sever the group context's parent link.
    pub(crate) fn destroy(&self) {
        self.context.destroy();
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("group_type", &self.group_type())
            .field(
                "members",
                &self
                    .members
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
