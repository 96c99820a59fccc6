//! Troupe domain types.
//!
//! Pure data structures and contracts for composite component groups:
//! the dynamic [`Value`] representation, the managed-member [`Artifact`]
//! contract with its static injection schemas, the parent-delegating
//! [`ContextChain`], argument bags, group configurations, and lifecycle
//! events. Nothing here performs orchestration; that lives in
//! `troupe-engine`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod args;
pub mod artifact;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod ids;
pub mod schema;
pub mod value;

pub use args::{parent_key, ArgumentBag};
pub use artifact::{Artifact, MemberRole};
pub use config::{CollisionPolicy, GroupConfiguration, GroupFlags, MemberSpec};
pub use context::{ContextChain, ContextStorage, MapStorage};
pub use error::{CallbackError, ConfigError, SetPointError};
pub use events::{EventListener, LifecycleEvent};
pub use ids::GroupId;
pub use schema::{InjectionKind, InjectionPoint, InjectionTarget, MemberSchema};
pub use value::{AnyObject, Value};
