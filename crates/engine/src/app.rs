//! Application state and composition.

use std::sync::Arc;

use troupe_domain::{GroupConfiguration, Value};

use crate::groups::GroupManager;
use crate::infrastructure::ports::{ClockPort, EventBus, Injector, MemberResolver, UiThreadPort};
use crate::infrastructure::settings::AppSettings;

/// Composition root holding the wired lifecycle services.
///
/// Embedders construct concrete adapters once, hand them here, and pass
/// the `App` (or just its manager) around.
pub struct App {
    pub settings: AppSettings,
    pub events: Arc<dyn EventBus>,
    pub groups: Arc<GroupManager>,
}

impl App {
    /// Wire a manager from the given collaborators and register the
    /// declared group configurations. `application` is the opaque handle
    /// seeded into every argument bag.
    pub fn new(
        settings: AppSettings,
        resolver: Arc<dyn MemberResolver>,
        injector: Arc<dyn Injector>,
        events: Arc<dyn EventBus>,
        ui: Arc<dyn UiThreadPort>,
        clock: Arc<dyn ClockPort>,
        application: Value,
        configurations: Vec<GroupConfiguration>,
    ) -> Self {
        let groups = Arc::new(GroupManager::new(
            settings.clone(),
            resolver,
            injector,
            Arc::clone(&events),
            ui,
            clock,
            application,
        ));
        groups.initialize(configurations);
        Self {
            settings,
            events,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_domain::{ArgumentBag, GroupFlags, MemberSpec};

    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::event_bus::InProcessEventBus;
    use crate::infrastructure::injector::TrackingInjector;
    use crate::infrastructure::resolver::StaticMemberResolver;
    use crate::infrastructure::ui::CallerThreadUi;

    #[test]
    fn test_app_wires_manager_with_configurations() {
        let resolver = Arc::new(StaticMemberResolver::new());
        resolver.register_plain("board.state", || Arc::new(0u8));
        let app = App::new(
            AppSettings::default(),
            resolver,
            Arc::new(TrackingInjector::new()),
            Arc::new(InProcessEventBus::new()),
            Arc::new(CallerThreadUi::new()),
            Arc::new(SystemClock::new()),
            Value::object("embedder"),
            vec![GroupConfiguration::new(
                "board",
                vec![MemberSpec::new("state", "board.state")],
                GroupFlags::default(),
            )
            .expect("valid configuration")],
        );

        assert!(app.groups.find_configuration("board").is_some());
        let group = app
            .groups
            .create_group("board", None, ArgumentBag::new())
            .unwrap();
        assert_eq!(group.id().as_str(), "board");
    }
}
