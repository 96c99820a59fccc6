//! Default injection container: instance tracking only.

use std::sync::{Mutex, PoisonError};

use troupe_domain::{AnyObject, Value};

use crate::infrastructure::ports::{InjectError, Injector, ScopeError};

/// Injector that tracks instances passed through member injection while
/// a scope is open. Construction and release of dependencies belong to a
/// real container plugged in through the [`Injector`] port; this default
/// keeps the scope bookkeeping honest for hosts without one.
#[derive(Default)]
pub struct TrackingInjector {
    scope: Mutex<Option<Vec<Value>>>,
}

impl TrackingInjector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Injector for TrackingInjector {
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

    fn release(&self, _instance: &Value) {
        tracing::debug!("releasing injected instance");
    }
}
