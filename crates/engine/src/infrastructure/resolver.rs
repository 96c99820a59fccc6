//! Named-factory member resolver.
//!
//! The explicit replacement for dynamic class loading: every
//! implementation reference a configuration may name is registered up
//! front as a constructor function or factory object.

use std::sync::Arc;

use dashmap::DashMap;
use troupe_domain::{AnyObject, Artifact};

use crate::infrastructure::ports::{
    ArtifactFactory, BuildError, MemberClass, MemberResolver, PlainFactory, ResolveError,
};

struct FnArtifactFactory(Box<dyn Fn() -> Arc<dyn Artifact> + Send + Sync>);

impl ArtifactFactory for FnArtifactFactory {
    fn new_instance(&self) -> Result<Arc<dyn Artifact>, BuildError> {
        Ok((self.0)())
    }
}

struct FnPlainFactory(Box<dyn Fn() -> AnyObject + Send + Sync>);

impl PlainFactory for FnPlainFactory {
    fn construct(&self) -> Result<AnyObject, BuildError> {
        Ok((self.0)())
    }
}

/// Resolver backed by an explicit registry of named factories.
///
/// Artifact registrations take precedence over plain registrations when
/// a reference is present in both tables.
#[derive(Default)]
pub struct StaticMemberResolver {
    artifacts: DashMap<String, Arc<dyn ArtifactFactory>>,
    plains: DashMap<String, Arc<dyn PlainFactory>>,
}

impl StaticMemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible managed-artifact constructor.
    pub fn register_artifact<A, F>(&self, reference: impl Into<String>, factory: F)
    where
        A: Artifact + 'static,
        F: Fn() -> Arc<A> + Send + Sync + 'static,
    {
        let erased = move || factory() as Arc<dyn Artifact>;
        self.register_artifact_factory(reference, Arc::new(FnArtifactFactory(Box::new(erased))));
    }

    /// Register an infallible plain constructor.
    pub fn register_plain<T, F>(&self, reference: impl Into<String>, factory: F)
    where
        T: std::any::Any + Send + Sync,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let erased = move || factory() as AnyObject;
        self.register_plain_factory(reference, Arc::new(FnPlainFactory(Box::new(erased))));
    }

    pub fn register_artifact_factory(
        &self,
        reference: impl Into<String>,
        factory: Arc<dyn ArtifactFactory>,
    ) {
        self.artifacts.insert(reference.into(), factory);
    }

    pub fn register_plain_factory(
        &self,
        reference: impl Into<String>,
        factory: Arc<dyn PlainFactory>,
    ) {
        self.plains.insert(reference.into(), factory);
    }
}

impl MemberResolver for StaticMemberResolver {
    fn resolve(&self, reference: &str) -> Result<MemberClass, ResolveError> {
        if let Some(factory) = self.artifacts.get(reference) {
            return Ok(MemberClass::Artifact(Arc::clone(factory.value())));
        }
        if let Some(factory) = self.plains.get(reference) {
            return Ok(MemberClass::Plain(Arc::clone(factory.value())));
        }
        Err(ResolveError::NotFound {
            reference: reference.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_reference_is_an_error() {
        let resolver = StaticMemberResolver::new();
        let err = resolver.resolve("ghost").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { reference } if reference == "ghost"));
    }

    #[test]
    fn test_artifact_registration_takes_precedence() {
        struct NullArtifact;
        impl Artifact for NullArtifact {
            fn assign(
                &self,
                point: &str,
                _value: Option<troupe_domain::Value>,
            ) -> Result<(), troupe_domain::SetPointError> {
                Err(troupe_domain::SetPointError::unknown(point))
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let resolver = StaticMemberResolver::new();
        resolver.register_plain("widget", || Arc::new(0u32));
        resolver.register_artifact("widget", || Arc::new(NullArtifact));
        assert!(matches!(
            resolver.resolve("widget").unwrap(),
            MemberClass::Artifact(_)
        ));
    }

    #[test]
    fn test_plain_factory_constructs_fresh_values() {
        let resolver = StaticMemberResolver::new();
        resolver.register_plain("counter", || Arc::new(41u32));
        let MemberClass::Plain(factory) = resolver.resolve("counter").unwrap() else {
            panic!("expected a plain classification");
        };
        let a = factory.construct().unwrap();
        let b = factory.construct().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.downcast_ref::<u32>(), Some(&41));
    }
}
