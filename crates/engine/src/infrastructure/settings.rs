//! Application-scoped settings.

use serde::{Deserialize, Serialize};
use troupe_domain::CollisionPolicy;

/// Settings the lifecycle consults for every group, regardless of which
/// configuration it was instantiated from.
///
/// The identifier-collision policy deliberately lives here rather than on
/// individual group configurations: two configurations must not disagree
/// about what happens when their instances contend for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub collision_policy: CollisionPolicy,
}

impl AppSettings {
    pub fn new(collision_policy: CollisionPolicy) -> Self {
        Self { collision_policy }
    }
}
