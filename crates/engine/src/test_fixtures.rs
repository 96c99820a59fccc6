//! Probe artifacts and recording adapters for lifecycle tests.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use troupe_domain::{
    AnyObject, ArgumentBag, Artifact, CallbackError, EventListener, LifecycleEvent, MemberRole,
    MemberSchema, SetPointError, Value,
};

use crate::infrastructure::ports::{
    BuildError, EventBus, InjectError, Injector, PlainFactory, ScopeError,
};

// =============================================================================
// Lifecycle Probe
// =============================================================================

/// Shared recorder for everything a probe artifact observes.
#[derive(Default)]
pub struct Probe {
    init_count: AtomicUsize,
    destroy_count: AtomicUsize,
    ui_init_count: AtomicUsize,
    ui_thread: Mutex<Option<ThreadId>>,
    events: Mutex<Vec<LifecycleEvent>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inits(&self) -> usize {
        self.init_count.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroy_count.load(Ordering::SeqCst)
    }

    pub fn ui_inits(&self) -> usize {
        self.ui_init_count.load(Ordering::SeqCst)
    }

    /// Thread the last `init_ui` ran on.
    pub fn ui_thread(&self) -> Option<ThreadId> {
        *self.ui_thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Events seen through the listener upgrade.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// =============================================================================
// Probe Artifact
// =============================================================================

/// Schema-driven artifact that stores assigned points in named slots and
/// reports lifecycle callbacks to its [`Probe`].
pub struct ProbeArtifact {
    role: MemberRole,
    schema: MemberSchema,
    probe: Arc<Probe>,
    slots: RwLock<HashMap<String, Option<Value>>>,
    assignments: Mutex<Vec<String>>,
    listen: bool,
    fail_init: Option<String>,
    fail_destroy: Option<String>,
}

impl ProbeArtifact {
    pub fn new(role: MemberRole, schema: MemberSchema, probe: Arc<Probe>) -> Arc<Self> {
        Self::build(role, schema, probe, false, None, None)
    }

    /// Variant that upgrades to an event listener.
    pub fn listening(role: MemberRole, schema: MemberSchema, probe: Arc<Probe>) -> Arc<Self> {
        Self::build(role, schema, probe, true, None, None)
    }

    pub fn failing_init(
        role: MemberRole,
        schema: MemberSchema,
        probe: Arc<Probe>,
        message: &str,
    ) -> Arc<Self> {
        Self::build(role, schema, probe, false, Some(message.to_owned()), None)
    }

    pub fn failing_destroy(
        role: MemberRole,
        schema: MemberSchema,
        probe: Arc<Probe>,
        message: &str,
    ) -> Arc<Self> {
        Self::build(role, schema, probe, false, None, Some(message.to_owned()))
    }

    fn build(
        role: MemberRole,
        schema: MemberSchema,
        probe: Arc<Probe>,
        listen: bool,
        fail_init: Option<String>,
        fail_destroy: Option<String>,
    ) -> Arc<Self> {
        let slots = schema
            .points()
            .iter()
            .map(|point| (point.name().to_owned(), None))
            .collect();
        Arc::new(Self {
            role,
            schema,
            probe,
            slots: RwLock::new(slots),
            assignments: Mutex::new(Vec::new()),
            listen,
            fail_init,
            fail_destroy,
        })
    }

    /// Current value of a slot, `None` when never assigned or cleared.
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.slots
            .read()
            .ok()
            .and_then(|slots| slots.get(name).cloned().flatten())
    }

    /// Point names assigned so far, in order, clears included.
    pub fn assignments(&self) -> Vec<String> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Artifact for ProbeArtifact {
    fn role(&self) -> MemberRole {
        self.role
    }

    fn schema(&self) -> &MemberSchema {
        &self.schema
    }

    fn assign(&self, point: &str, value: Option<Value>) -> Result<(), SetPointError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| SetPointError::new(point, "slot storage poisoned"))?;
        match slots.get_mut(point) {
            Some(slot) => {
                *slot = value;
                self.assignments
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(point.to_owned());
                Ok(())
            }
            None => Err(SetPointError::unknown(point)),
        }
    }

    fn init_ui(&self) -> Result<(), CallbackError> {
        self.probe.ui_init_count.fetch_add(1, Ordering::SeqCst);
        *self
            .probe
            .ui_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Ok(())
    }

    fn group_init(&self, _args: &ArgumentBag) -> Result<(), CallbackError> {
        if let Some(message) = &self.fail_init {
            return Err(CallbackError::new(message.clone()));
        }
        self.probe.init_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn group_destroy(&self) -> Result<(), CallbackError> {
        if let Some(message) = &self.fail_destroy {
            return Err(CallbackError::new(message.clone()));
        }
        self.probe.destroy_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_event_listener(self: Arc<Self>) -> Option<Arc<dyn EventListener>> {
        if self.listen {
            Some(self)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl EventListener for ProbeArtifact {
    fn on_event(&self, event: &LifecycleEvent) {
        self.probe
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// =============================================================================
// Recording Adapters
// =============================================================================

/// Standalone listener capturing every published event.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Scope-tracking injector that also records releases.
#[derive(Default)]
pub struct RecordingInjector {
    scope: Mutex<Option<Vec<Value>>>,
    released: Mutex<Vec<Value>>,
}

impl RecordingInjector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn released_count(&self) -> usize {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Injector for RecordingInjector {
    fn open_scope(&self) -> Result<(), ScopeError> {
        let mut scope = self.scope.lock().unwrap_or_else(PoisonError::into_inner);
        if scope.is_some() {
            return Err(ScopeError::AlreadyOpen);
        }
        *scope = Some(Vec::new());
        Ok(())
    }

    fn close_scope(&self) -> Result<Vec<Value>, ScopeError> {
        self.scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ScopeError::NotOpen)
    }

    fn inject_members(&self, instance: &AnyObject) -> Result<(), InjectError> {
        let mut scope = self.scope.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tracked) = scope.as_mut() {
            tracked.push(Value::Object(AnyObject::clone(instance)));
        }
        Ok(())
    }

    fn release(&self, instance: &Value) {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instance.clone());
    }
}

/// Plain factory that publishes a construction event, the way a member
/// container would.
pub struct NoisyPlainFactory {
    bus: Arc<dyn EventBus>,
}

impl NoisyPlainFactory {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }
}

impl PlainFactory for NoisyPlainFactory {
    fn construct(&self) -> Result<AnyObject, BuildError> {
        self.bus.publish(LifecycleEvent::InstanceCreated {
            type_name: "noisy".to_owned(),
        });
        Ok(Arc::new(0u8))
    }
}
