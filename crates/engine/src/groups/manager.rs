//! Group lifecycle orchestration.
//!
//! Owns the create -> wire -> init sequence and its symmetric
//! destroy -> unwire mirror, the live-group registry, and the table of
//! declared configurations. Creation and destruction are expected to be
//! invoked from one logical thread at a time, or externally
//! synchronized; there is no internal locking beyond the registry map.

use std::error::Error;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use troupe_domain::{
    args::keys, parent_key, ArgumentBag, CallbackError, CollisionPolicy, ContextChain,
    GroupConfiguration, GroupFlags, GroupId, LifecycleEvent, MemberRole, Value,
};

use crate::groups::builder::ObjectBuilder;
use crate::groups::error::GroupError;
use crate::groups::group::Group;
use crate::groups::registry::GroupRegistry;
use crate::groups::wiring;
use crate::infrastructure::ports::{ClockPort, EventBus, Injector, MemberResolver, UiThreadPort};
use crate::infrastructure::settings::AppSettings;

/// Reserved member-reference points cleared on every artifact during
/// teardown, whether or not the member declares them.
const PARENT_REFERENCE_POINTS: [&str; 4] =
    ["parentModel", "parentView", "parentController", "parentGroup"];

/// Orchestrates the full lifecycle of component groups.
pub struct GroupManager {
    configurations: DashMap<String, Arc<GroupConfiguration>>,
    registry: GroupRegistry,
    builder: ObjectBuilder,
    injector: Arc<dyn Injector>,
    events: Arc<dyn EventBus>,
    ui: Arc<dyn UiThreadPort>,
    clock: Arc<dyn ClockPort>,
    settings: AppSettings,
    root_context: Arc<ContextChain>,
    application: Value,
    last_stamp: AtomicI64,
}

impl GroupManager {
    /// Wire a manager from its collaborators. `application` is the
    /// opaque handle seeded into every argument bag.
    pub fn new(
        settings: AppSettings,
        resolver: Arc<dyn MemberResolver>,
        injector: Arc<dyn Injector>,
        events: Arc<dyn EventBus>,
        ui: Arc<dyn UiThreadPort>,
        clock: Arc<dyn ClockPort>,
        application: Value,
    ) -> Self {
        Self {
            configurations: DashMap::new(),
            registry: GroupRegistry::new(),
            builder: ObjectBuilder::new(resolver, Arc::clone(&injector)),
            injector,
            events,
            ui,
            clock,
            settings,
            root_context: Arc::new(ContextChain::new()),
            application,
            last_stamp: AtomicI64::new(0),
        }
    }

    // =========================================================================
    // Configuration table
    // =========================================================================

    /// Register the configurations discovered at startup.
    pub fn initialize(&self, configurations: Vec<GroupConfiguration>) {
        for configuration in configurations {
            self.add_configuration(configuration);
        }
    }

    pub fn add_configuration(&self, configuration: GroupConfiguration) {
        self.configurations.insert(
            configuration.group_type().to_owned(),
            Arc::new(configuration),
        );
    }

    pub fn remove_configuration(&self, group_type: &str) {
        self.configurations.remove(group_type);
    }

    pub fn find_configuration(&self, group_type: &str) -> Option<Arc<GroupConfiguration>> {
        self.configurations
            .get(group_type)
            .map(|entry| Arc::clone(entry.value()))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn find_group(&self, group_id: &str) -> Option<Arc<Group>> {
        self.registry.find(group_id)
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// The context every group chains to when it has no parent group.
    pub fn root_context(&self) -> &Arc<ContextChain> {
        &self.root_context
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a group of a registered type.
    pub fn create_group(
        &self,
        group_type: &str,
        group_id: Option<&str>,
        args: ArgumentBag,
    ) -> Result<Arc<Group>, GroupError> {
        let configuration =
            self.find_configuration(group_type)
                .ok_or_else(|| GroupError::UnknownGroupType {
                    group_type: group_type.to_owned(),
                })?;
        self.create_group_from(&configuration, group_id, args)
    }

    /// Create a group from an explicit configuration.
    pub fn create_group_from(
        &self,
        configuration: &Arc<GroupConfiguration>,
        group_id: Option<&str>,
        args: ArgumentBag,
    ) -> Result<Arc<Group>, GroupError> {
        let flags = configuration.flags();
        let group_id = self.resolve_group_id(configuration, group_id, flags);
        self.check_id_is_unique(&group_id, configuration)?;

        tracing::debug!(
            group_type = configuration.group_type(),
            group_id = %group_id,
            "building group"
        );
        let mut args_copy = self.copy_and_configure_arguments(args, configuration, &group_id);

        // Classify before constructing anything; a bad reference aborts
        // the call with nothing to clean up.
        let classified = self.builder.classify(configuration)?;

        let publishing_was_enabled = self.events.is_publishing_enabled();
        self.events
            .set_publishing_enabled(flags.instantiation_events);
        if let Err(scope_failure) = self.injector.open_scope() {
            self.events.set_publishing_enabled(publishing_was_enabled);
            return Err(instantiation_error(configuration, &group_id, scope_failure));
        }

        let built = self.builder.instantiate(&classified, &mut args_copy);
        let closed = self.injector.close_scope();
        self.events.set_publishing_enabled(publishing_was_enabled);

        let members = match built {
            Ok(members) => members,
            Err(build_failure) => {
                if let Err(scope_failure) = &closed {
                    tracing::error!(%scope_failure, "injection scope failed to close after a build failure");
                }
                return Err(instantiation_error(configuration, &group_id, build_failure));
            }
        };
        let injected_instances =
            closed.map_err(|scope_failure| instantiation_error(configuration, &group_id, scope_failure))?;

        let parent = parent_group_argument(&args_copy);
        let group = Group::new(
            Arc::clone(configuration),
            group_id,
            members,
            parent,
            &self.root_context,
        );
        self.adjust_group_arguments(&group, &mut args_copy);

        if flags.lifecycle_events {
            self.events.publish(LifecycleEvent::GroupInitializing {
                group_type: group.group_type().to_owned(),
                group_id: group.id().to_string(),
            });
        }

        // Controllers double as application-wide event listeners.
        if flags.listener_events {
            if let Some(controller) = group.controller() {
                if let Some(listener) = controller.as_event_listener() {
                    self.events.add_listener(listener);
                }
            }
        }

        wiring::fill_referenced_properties(&group, &args_copy)?;

        self.registry.insert(Arc::clone(&group));

        self.initialize_members(&group, &args_copy)?;
        group.record_injected(injected_instances);

        if flags.lifecycle_events {
            self.events.publish(LifecycleEvent::GroupCreated {
                group_type: group.group_type().to_owned(),
                group_id: group.id().to_string(),
            });
        }

        Ok(group)
    }

    /// Create a group, hand it to `action`, then destroy it
    /// symmetrically. Teardown failures surface as the call's error; if
    /// `action` panics the group is still destroyed, best-effort.
    pub fn with_group<R>(
        &self,
        group_type: &str,
        group_id: Option<&str>,
        args: ArgumentBag,
        action: impl FnOnce(&Arc<Group>) -> R,
    ) -> Result<R, GroupError> {
        let group = self.create_group(group_type, group_id, args)?;
        let mut guard = DestroyGuard {
            manager: self,
            group_id: group.id().clone(),
            armed: true,
        };
        let result = action(&group);
        guard.armed = false;
        drop(guard);
        self.destroy_group(group.id().as_str())?;
        Ok(result)
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    /// Destroy a live group. A no-op when no group owns `group_id`.
    pub fn destroy_group(&self, group_id: &str) -> Result<(), GroupError> {
        let Some(group) = self.registry.find(group_id) else {
            tracing::debug!(group_id, "no live group to destroy");
            return Ok(());
        };
        tracing::debug!(group_id = %group.id(), "destroying group");
        let flags = group.configuration().flags();

        if flags.listener_events {
            if let Some(controller) = group.controller() {
                if let Some(listener) = controller.as_event_listener() {
                    self.events.remove_listener(&listener);
                }
            }
        }

        let failures = self.destroy_members(&group, flags.destruction_events);

        for instance in group.take_injected() {
            self.injector.release(&instance);
        }

        self.registry.remove(group.id().as_str());
        group.destroy();

        if flags.lifecycle_events {
            self.events.publish(LifecycleEvent::GroupDestroyed {
                group_type: group.group_type().to_owned(),
                group_id: group.id().to_string(),
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            for (member, failure) in &failures {
                tracing::warn!(member = %member, failure = %failure, "member teardown failed");
            }
            Err(GroupError::Teardown {
                group_id: group.id().to_string(),
                failures,
            })
        }
    }

    /// Best-effort member teardown; failures are collected, never halting
    /// the remaining members.
    fn destroy_members(
        &self,
        group: &Arc<Group>,
        fire_destruction_events: bool,
    ) -> Vec<(String, CallbackError)> {
        let mut failures = Vec::new();
        for (name, member) in group.members() {
            let Some(artifact) = member.as_ref().and_then(Value::as_artifact) else {
                continue;
            };
            if fire_destruction_events {
                self.events.publish(LifecycleEvent::InstanceDestroyed {
                    group_id: group.id().to_string(),
                    member: name.to_owned(),
                });
            }

            let destroyed = match artifact.role() {
                MemberRole::View => {
                    let view = Arc::clone(artifact);
                    self.ui.run_sync(Box::new(move || view.group_destroy()))
                }
                MemberRole::Model | MemberRole::Controller | MemberRole::Other => {
                    artifact.group_destroy()
                }
            };
            if let Err(failure) = destroyed {
                failures.push((name.to_owned(), failure));
            }

            // Reserved parent references go first, best-effort: members
            // that never declared them simply refuse the assignment.
            for point in PARENT_REFERENCE_POINTS {
                let _ = artifact.assign(point, None);
            }
            for failure in wiring::clear_contextual_fields(artifact) {
                failures.push((name.to_owned(), CallbackError::new(failure.to_string())));
            }
        }
        failures
    }

    // =========================================================================
    // Creation internals
    // =========================================================================

    /// Caller identifier verbatim when non-blank; otherwise the type
    /// name, or `<type>-<stamp>` for component-style groups so many can
    /// coexist.
    fn resolve_group_id(
        &self,
        configuration: &Arc<GroupConfiguration>,
        group_id: Option<&str>,
        flags: GroupFlags,
    ) -> GroupId {
        match group_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => GroupId::from(id),
            None if flags.component => GroupId::new(format!(
                "{}-{}",
                configuration.group_type(),
                self.next_instance_stamp()
            )),
            None => GroupId::from(configuration.group_type()),
        }
    }

    /// Strictly monotonic stamp: clock nanoseconds, bumped past the
    /// previous stamp whenever the clock has not advanced.
    fn next_instance_stamp(&self) -> i64 {
        let now = self.clock.now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self.last_stamp.compare_exchange(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }

    fn check_id_is_unique(
        &self,
        group_id: &GroupId,
        configuration: &Arc<GroupConfiguration>,
    ) -> Result<(), GroupError> {
        if self.registry.find(group_id.as_str()).is_none() {
            return Ok(());
        }
        match self.settings.collision_policy {
            CollisionPolicy::Warning => {
                tracing::warn!(
                    group_type = configuration.group_type(),
                    group_id = %group_id,
                    "a previous group instance owns this id; destroying the old instance first"
                );
                self.destroy_group(group_id.as_str())
            }
            CollisionPolicy::Exception => Err(GroupError::IdCollision {
                group_type: configuration.group_type().to_owned(),
                group_id: group_id.to_string(),
            }),
        }
    }

    /// Seed the standard entries, expose the parent group's members
    /// under their `parent<Member>` convention keys, then overlay the
    /// caller's bag.
    fn copy_and_configure_arguments(
        &self,
        mut args: ArgumentBag,
        configuration: &Arc<GroupConfiguration>,
        group_id: &GroupId,
    ) -> ArgumentBag {
        let mut seeded = ArgumentBag::new()
            .with(keys::APPLICATION, self.application.clone())
            .with(
                keys::GROUP_TYPE,
                Value::object(configuration.group_type().to_owned()),
            )
            .with(keys::GROUP_ID, Value::object(group_id.to_string()))
            .with(
                keys::CONFIGURATION,
                Value::from_arc(Arc::clone(configuration)),
            );

        if let Some(parent_group) = parent_group_argument(&args) {
            for (name, member) in parent_group.members() {
                args.insert(parent_key(name), member.clone());
            }
        }

        seeded.extend(args);
        seeded
    }

    /// Refresh the entries that gain their final values only once the
    /// group exists.
    fn adjust_group_arguments(&self, group: &Arc<Group>, args: &mut ArgumentBag) {
        args.set(keys::GROUP_ID, Value::object(group.id().to_string()));
        args.set(keys::GROUP, Value::from_arc(Arc::clone(group)));
        args.set(keys::APPLICATION, self.application.clone());
    }

    /// Per-member initialization: view-role members build their UI and
    /// run `group_init` on the designated thread; other artifacts run
    /// `group_init` on the calling thread; plain members get nothing.
    fn initialize_members(&self, group: &Arc<Group>, args: &ArgumentBag) -> Result<(), GroupError> {
        tracing::debug!(group_id = %group.id(), "initializing group members");
        for (name, member) in group.members() {
            let Some(artifact) = member.as_ref().and_then(Value::as_artifact) else {
                continue;
            };
            let initialized = match artifact.role() {
                MemberRole::View => {
                    let view = Arc::clone(artifact);
                    let init_args = args.clone();
                    self.ui.run_sync(Box::new(move || {
                        view.init_ui()?;
                        view.group_init(&init_args)
                    }))
                }
                MemberRole::Model | MemberRole::Controller | MemberRole::Other => {
                    artifact.group_init(args)
                }
            };
            initialized.map_err(|source| GroupError::Callback {
                group_type: group.group_type().to_owned(),
                group_id: group.id().to_string(),
                member: name.to_owned(),
                phase: "init",
                source,
            })?;
        }
        Ok(())
    }
}

/// Destroys the group if `with_group`'s action unwinds.
struct DestroyGuard<'a> {
    manager: &'a GroupManager,
    group_id: GroupId,
    armed: bool,
}

impl Drop for DestroyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(failure) = self.manager.destroy_group(self.group_id.as_str()) {
                tracing::warn!(group_id = %self.group_id, %failure, "teardown after panic failed");
            }
        }
    }
}

fn parent_group_argument(args: &ArgumentBag) -> Option<Arc<Group>> {
    args.value(keys::PARENT_GROUP)
        .and_then(|value| value.downcast_arc::<Group>())
}

fn instantiation_error(
    configuration: &Arc<GroupConfiguration>,
    group_id: &GroupId,
    source: impl Error + Send + Sync + 'static,
) -> GroupError {
    GroupError::Instantiation {
        group_type: configuration.group_type().to_owned(),
        group_id: group_id.to_string(),
        reason: source.to_string(),
        source: Some(Box::new(source)),
    }
}
