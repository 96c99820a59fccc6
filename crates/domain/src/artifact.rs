//! Managed-member contract.
//!
//! Members that participate fully in group lifecycle implement
//! [`Artifact`]: they expose a static injection-point schema, accept
//! dynamic point assignment, and receive `group_init`/`group_destroy`
//! callbacks. Plain members carry none of this; the engine constructs
//! them and otherwise leaves them alone.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::args::ArgumentBag;
use crate::error::{CallbackError, SetPointError};
use crate::events::EventListener;
use crate::schema::MemberSchema;
use crate::value::Value;

/// Role a member plays within its group.
///
/// Every dispatch on this enum in the engine is exhaustive; views are the
/// only role with UI-thread affinity, controllers the only role eligible
/// for process-wide listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    Model,
    View,
    Controller,
    Other,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::View => write!(f, "view"),
            Self::Controller => write!(f, "controller"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Contract for managed group members.
pub trait Artifact: Send + Sync {
    /// Role used for lifecycle dispatch.
    fn role(&self) -> MemberRole {
        MemberRole::Other
    }

    /// Static descriptor of this member's injection points.
    fn schema(&self) -> &MemberSchema {
        MemberSchema::empty()
    }

    /// Assign an injection point. `None` clears it. Unknown point names
    /// are an error; callers that clear best-effort ignore the result.
    fn assign(&self, point: &str, value: Option<Value>) -> Result<(), SetPointError>;

    /// Build UI resources. Called for [`MemberRole::View`] members only,
    /// on the designated UI thread, before [`Artifact::group_init`].
    fn init_ui(&self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called once after the group is wired and registered.
    fn group_init(&self, _args: &ArgumentBag) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called once while the group is being destroyed.
    fn group_destroy(&self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Upgrade to a process-wide event listener. Controller members that
    /// return `Some` are kept registered on the bus while their group
    /// lives.
    fn as_event_listener(self: Arc<Self>) -> Option<Arc<dyn EventListener>> {
        None
    }

    /// Concrete-type access for downcasting.
    fn as_any(&self) -> &dyn Any;
}
