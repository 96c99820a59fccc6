//! Error taxonomy for group creation and destruction.

use thiserror::Error;
use troupe_domain::{CallbackError, InjectionTarget};

use crate::infrastructure::ports::ResolveError;

/// Fatal failure of a create or destroy call.
///
/// Creation failures abort the whole call; except for the post-register
/// `Callback` case, nothing partially built stays visible in the
/// registry. `Teardown` is the one best-effort variant: destruction ran
/// to completion and this reports what broke along the way.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Construction-phase failure: scope open/close, member
    /// construction, or a property-set failure during wiring.
    #[error("cannot instantiate group '{group_type}' with id '{group_id}': {reason}")]
    Instantiation {
        group_type: String,
        group_id: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The resolved identifier is already live under the `exception`
    /// collision policy.
    #[error("cannot instantiate group '{group_type}' with id '{group_id}': a previous instance with that id exists and was not disposed of")]
    IdCollision {
        group_type: String,
        group_id: String,
    },

    /// No configuration is registered for the requested type.
    #[error("unknown group type '{group_type}'")]
    UnknownGroupType { group_type: String },

    /// A member implementation reference could not be resolved.
    #[error("cannot resolve member implementation '{reference}'")]
    Resolution {
        reference: String,
        #[source]
        source: ResolveError,
    },

    /// A non-nullable plain injection point had no argument value.
    #[error("could not inject argument '{point}' on {target} of member '{member}' in group '{group_type}:{group_id}': the {target} does not accept null values")]
    MissingArgument {
        point: String,
        target: InjectionTarget,
        member: String,
        group_type: String,
        group_id: String,
    },

    /// A non-nullable contextual injection point resolved to nothing
    /// anywhere in the group's context chain.
    #[error("could not find a context value under keys {keys:?} for {target} '{point}' of member '{member}' in group '{group_type}:{group_id}': the {target} does not accept null values")]
    MissingContextValue {
        keys: Vec<String>,
        point: String,
        target: InjectionTarget,
        member: String,
        group_type: String,
        group_id: String,
    },

    /// A lifecycle callback failed.
    #[error("member '{member}' of group '{group_type}:{group_id}' failed during {phase}: {source}")]
    Callback {
        group_type: String,
        group_id: String,
        member: String,
        phase: &'static str,
        #[source]
        source: CallbackError,
    },

    /// Best-effort teardown finished with member failures.
    #[error("teardown of group '{group_id}' completed with {} member failure(s)", failures.len())]
    Teardown {
        group_id: String,
        failures: Vec<(String, CallbackError)>,
    },
}
