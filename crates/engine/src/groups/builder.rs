//! Member classification and instantiation.

use std::sync::Arc;

use troupe_domain::{ArgumentBag, GroupConfiguration, Value};

use crate::groups::error::GroupError;
use crate::infrastructure::ports::{BuildError, Injector, MemberClass, MemberResolver};

/// One declared member with its resolved classification.
#[derive(Debug)]
pub(crate) struct ClassifiedMember {
    pub name: String,
    pub class: MemberClass,
}

/// Constructs one group's member set, honoring caller-supplied values.
pub(crate) struct ObjectBuilder {
    resolver: Arc<dyn MemberResolver>,
    injector: Arc<dyn Injector>,
}

impl ObjectBuilder {
    pub fn new(resolver: Arc<dyn MemberResolver>, injector: Arc<dyn Injector>) -> Self {
        Self { resolver, injector }
    }

    /// Ask the resolver to classify every declared member, in order.
    pub fn classify(
        &self,
        configuration: &GroupConfiguration,
    ) -> Result<Vec<ClassifiedMember>, GroupError> {
        configuration
            .members()
            .iter()
            .map(|spec| {
                self.resolver
                    .resolve(&spec.implementation)
                    .map(|class| ClassifiedMember {
                        name: spec.name.clone(),
                        class,
                    })
                    .map_err(|source| GroupError::Resolution {
                        reference: spec.implementation.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Instantiate members in declaration order.
    ///
    /// A value already present in the bag is used verbatim, even an
    /// explicit null, so callers can pre-construct or intentionally omit
    /// a member. Fresh instances are placed back into the bag so later
    /// members' construction and wiring can reference earlier ones.
    pub fn instantiate(
        &self,
        members: &[ClassifiedMember],
        args: &mut ArgumentBag,
    ) -> Result<Vec<(String, Option<Value>)>, BuildError> {
        let mut instances = Vec::with_capacity(members.len());
        for member in members {
            if args.contains_key(&member.name) {
                instances.push((member.name.clone(), args.value(&member.name)));
                continue;
            }
            let value = match &member.class {
                MemberClass::Artifact(factory) => {
                    Value::Artifact(factory.new_instance().inspect_err(|error| {
                        tracing::error!(member = %member.name, %error, "cannot create artifact member");
                    })?)
                }
                MemberClass::Plain(factory) => {
                    let object = factory.construct().inspect_err(|error| {
                        tracing::error!(member = %member.name, %error, "cannot create plain member");
                    })?;
                    self.injector.inject_members(&object).map_err(|error| {
                        BuildError::construction(member.name.clone(), error.to_string())
                    })?;
                    Value::Object(object)
                }
            };
            args.set(member.name.clone(), value.clone());
            instances.push((member.name.clone(), Some(value)));
        }
        Ok(instances)
    }
}
