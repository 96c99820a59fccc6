//! In-process lifecycle event bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use troupe_domain::{EventListener, LifecycleEvent};

use crate::infrastructure::ports::EventBus;

/// Synchronous in-process bus: listeners are invoked on the publishing
/// thread, in registration order.
pub struct InProcessEventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
    publishing: AtomicBool,
}

impl InProcessEventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            publishing: AtomicBool::new(true),
        }
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InProcessEventBus {
    fn publish(&self, event: LifecycleEvent) {
        if !self.publishing.load(Ordering::SeqCst) {
            return;
        }
        // Snapshot so a listener may add/remove listeners while handling.
        let snapshot: Vec<Arc<dyn EventListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener.on_event(&event);
        }
    }

    fn add_listener(&self, listener: Arc<dyn EventListener>) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(listener);
        }
    }

    fn remove_listener(&self, listener: &Arc<dyn EventListener>) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
        }
    }

    fn set_publishing_enabled(&self, enabled: bool) {
        self.publishing.store(enabled, Ordering::SeqCst);
    }

    fn is_publishing_enabled(&self) -> bool {
        self.publishing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<LifecycleEvent>>);

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn count(&self) -> usize {
            self.0.lock().map(|events| events.len()).unwrap_or(0)
        }
    }

    impl EventListener for Recorder {
        fn on_event(&self, event: &LifecycleEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    fn created() -> LifecycleEvent {
        LifecycleEvent::GroupCreated {
            group_type: "editor".into(),
            group_id: "editor".into(),
        }
    }

    #[test]
    fn test_publish_reaches_listeners() {
        let bus = InProcessEventBus::new();
        let recorder = Recorder::new();
        bus.add_listener(recorder.clone());
        bus.publish(created());
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn test_disabled_bus_drops_events() {
        let bus = InProcessEventBus::new();
        let recorder = Recorder::new();
        bus.add_listener(recorder.clone());

        bus.set_publishing_enabled(false);
        bus.publish(created());
        assert_eq!(recorder.count(), 0);

        bus.set_publishing_enabled(true);
        bus.publish(created());
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn test_remove_listener_by_identity() {
        let bus = InProcessEventBus::new();
        let kept = Recorder::new();
        let removed = Recorder::new();
        bus.add_listener(kept.clone());
        bus.add_listener(removed.clone());

        let handle: Arc<dyn EventListener> = removed.clone();
        bus.remove_listener(&handle);
        bus.publish(created());

        assert_eq!(kept.count(), 1);
        assert_eq!(removed.count(), 0);
    }
}
