//! Port traits for the engine's collaborator boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Member resolution (what a declared implementation reference means)
//! - Instance construction (artifact container, plain constructors)
//! - The injection container and its instance-tracking scope
//! - The event bus (could swap in-process -> external broker)
//! - UI-thread marshaling (headless hosts run inline)
//! - Clock (for testing identifier synthesis)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use troupe_domain::{AnyObject, Artifact, CallbackError, EventListener, LifecycleEvent, Value};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no artifact or plain type registered for reference '{reference}'")]
    NotFound { reference: String },
    #[error("cannot load implementation '{reference}': {reason}")]
    LoadFailed { reference: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot construct instance of '{type_name}': {reason}")]
    Construction { type_name: String, reason: String },
}

impl BuildError {
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("an injection scope is already open")]
    AlreadyOpen,
    #[error("no injection scope is open")]
    NotOpen,
}

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("member injection failed: {0}")]
    Failed(String),
}

// =============================================================================
// Member Resolution & Construction
// =============================================================================

/// Classification of one member's implementation reference.
#[derive(Clone)]
pub enum MemberClass {
    /// A managed-artifact type with lifecycle callbacks.
    Artifact(Arc<dyn ArtifactFactory>),
    /// A plain type the engine constructs and otherwise leaves alone.
    Plain(Arc<dyn PlainFactory>),
}

impl std::fmt::Debug for MemberClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberClass::Artifact(_) => f.write_str("Artifact"),
            MemberClass::Plain(_) => f.write_str("Plain"),
        }
    }
}

/// Constructor for a managed-artifact type.
pub trait ArtifactFactory: Send + Sync {
    fn new_instance(&self) -> Result<Arc<dyn Artifact>, BuildError>;
}

/// Constructor for a plain type.
pub trait PlainFactory: Send + Sync {
    fn construct(&self) -> Result<AnyObject, BuildError>;
}

/// Maps a member's implementation reference to a concrete factory.
pub trait MemberResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<MemberClass, ResolveError>;
}

// =============================================================================
// Event Bus
// =============================================================================

/// Process-wide lifecycle event bus.
pub trait EventBus: Send + Sync {
    /// Deliver to all listeners, unless publishing is disabled.
    fn publish(&self, event: LifecycleEvent);

    fn add_listener(&self, listener: Arc<dyn EventListener>);

    /// Remove by identity; unknown listeners are ignored.
    fn remove_listener(&self, listener: &Arc<dyn EventListener>);

    /// Process-wide toggle the lifecycle flips around bulk member
    /// construction.
    fn set_publishing_enabled(&self, enabled: bool);

    fn is_publishing_enabled(&self) -> bool;
}

// =============================================================================
// UI Thread Marshal
// =============================================================================

/// A callback marshalled to the designated UI thread.
pub type UiTask = Box<dyn FnOnce() -> Result<(), CallbackError> + Send>;

/// Thread-affinity marshal for view callbacks.
pub trait UiThreadPort: Send + Sync {
    /// Run `task` on the designated thread and block until it completes.
    /// A panic over there is captured and surfaced as an error here, on
    /// the calling thread.
    fn run_sync(&self, task: UiTask) -> Result<(), CallbackError>;
}

// =============================================================================
// Injection Container
// =============================================================================

/// Dependency-injection container boundary.
pub trait Injector: Send + Sync {
    /// Open the instance-tracking scope. Scopes never nest; opening while
    /// one is active is a programming error surfaced immediately.
    fn open_scope(&self) -> Result<(), ScopeError>;

    /// Close the scope, reporting the instances created while it was
    /// open. Must restore closeable state even when building failed.
    fn close_scope(&self) -> Result<Vec<Value>, ScopeError>;

    /// Inject dependencies into a freshly constructed plain instance.
    fn inject_members(&self, instance: &AnyObject) -> Result<(), InjectError>;

    /// Release an instance previously reported by a scope.
    fn release(&self, instance: &Value);
}

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
