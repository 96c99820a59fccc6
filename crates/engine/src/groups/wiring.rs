//! Two-pass property injection and its teardown mirror.
//!
//! After all members of a group exist, each member gets a plain-property
//! pass (values from the argument bag) followed by a contextual pass
//! (values resolved through the group's context chain). The contextual
//! pass runs for every member kind; it is a no-op for plain members,
//! which publish no schema.

use std::sync::Arc;

use troupe_domain::{
    ArgumentBag, Artifact, InjectionPoint, InjectionTarget, SetPointError, Value,
};

use crate::groups::error::GroupError;
use crate::groups::group::Group;

/// Run both injection passes over every member of the group.
pub(crate) fn fill_referenced_properties(
    group: &Group,
    args: &ArgumentBag,
) -> Result<(), GroupError> {
    for (name, member) in group.members() {
        if let Some(artifact) = member.as_ref().and_then(Value::as_artifact) {
            fill_artifact_member(group, name, artifact, args)?;
        }
        fill_contextual_member(group, name, member)?;
    }
    Ok(())
}

/// Plain-property pass: properties first, then fields not already
/// satisfied by a property of the same name.
fn fill_artifact_member(
    group: &Group,
    member_name: &str,
    artifact: &Arc<dyn Artifact>,
    args: &ArgumentBag,
) -> Result<(), GroupError> {
    let schema = artifact.schema();
    let mut already_set: Vec<&str> = Vec::new();

    for point in schema.plain_properties() {
        match args.value(point.name()) {
            None => {
                if !point.nullable() {
                    return Err(missing_argument(group, member_name, point));
                }
                already_set.push(point.name());
            }
            Some(value) => {
                artifact
                    .assign(point.name(), Some(value))
                    .map_err(|failure| set_failure(group, failure))?;
                already_set.push(point.name());
            }
        }
    }

    for point in schema.plain_fields() {
        if already_set.contains(&point.name()) {
            continue;
        }
        let value = args.value(point.name());
        if point.skips_when_absent() && value.is_none() {
            continue;
        }
        match value {
            None => {
                if !point.nullable() {
                    return Err(missing_argument(group, member_name, point));
                }
                // Nullable field with no argument keeps its default.
            }
            Some(value) => {
                artifact
                    .assign(point.name(), Some(value))
                    .map_err(|failure| set_failure(group, failure))?;
            }
        }
    }

    Ok(())
}

/// Contextual pass. Properties resolve a single derived key; fields try
/// every candidate key in order and the last one present in the chain
/// wins.
fn fill_contextual_member(
    group: &Group,
    member_name: &str,
    member: &Option<Value>,
) -> Result<(), GroupError> {
    let Some(artifact) = member.as_ref().and_then(Value::as_artifact) else {
        return Ok(());
    };
    let context = group.context();

    for point in artifact.schema().contextual_points() {
        match point.target() {
            InjectionTarget::Property => {
                let key = point.derived_key();
                let resolved = context.get(key);
                if resolved.is_none() && !point.nullable() {
                    return Err(missing_context(
                        group,
                        member_name,
                        point,
                        vec![key.to_owned()],
                    ));
                }
                artifact
                    .assign(point.name(), resolved)
                    .map_err(|failure| set_failure(group, failure))?;
            }
            InjectionTarget::Field => {
                let keys = point.lookup_keys();
                let mut resolved = None;
                for key in &keys {
                    if context.contains_key(key) {
                        resolved = context.get(key);
                    }
                }
                if resolved.is_none() && !point.nullable() {
                    return Err(missing_context(
                        group,
                        member_name,
                        point,
                        keys.iter().map(|key| (*key).to_owned()).collect(),
                    ));
                }
                artifact
                    .assign(point.name(), resolved)
                    .map_err(|failure| set_failure(group, failure))?;
            }
        }
    }

    Ok(())
}

/// Teardown mirror: reset every contextual field to null. Plain points
/// are left untouched; they die with the member.
pub(crate) fn clear_contextual_fields(artifact: &Arc<dyn Artifact>) -> Vec<SetPointError> {
    let mut failures = Vec::new();
    for point in artifact.schema().contextual_fields() {
        if let Err(failure) = artifact.assign(point.name(), None) {
            failures.push(failure);
        }
    }
    failures
}

fn missing_argument(group: &Group, member_name: &str, point: &InjectionPoint) -> GroupError {
    GroupError::MissingArgument {
        point: point.name().to_owned(),
        target: point.target(),
        member: member_name.to_owned(),
        group_type: group.group_type().to_owned(),
        group_id: group.id().to_string(),
    }
}

fn missing_context(
    group: &Group,
    member_name: &str,
    point: &InjectionPoint,
    keys: Vec<String>,
) -> GroupError {
    GroupError::MissingContextValue {
        keys,
        point: point.name().to_owned(),
        target: point.target(),
        member: member_name.to_owned(),
        group_type: group.group_type().to_owned(),
        group_id: group.id().to_string(),
    }
}

fn set_failure(group: &Group, failure: SetPointError) -> GroupError {
    GroupError::Instantiation {
        group_type: group.group_type().to_owned(),
        group_id: group.id().to_string(),
        reason: failure.to_string(),
        source: Some(Box::new(failure)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use troupe_domain::{
        ContextChain, GroupConfiguration, GroupFlags, GroupId, InjectionPoint, MemberRole,
        MemberSchema, MemberSpec,
    };

    use crate::test_fixtures::{Probe, ProbeArtifact};

    fn group_with(schema: MemberSchema, probe: &Arc<Probe>) -> (Arc<Group>, Arc<ProbeArtifact>) {
        let artifact = ProbeArtifact::new(MemberRole::Other, schema, Arc::clone(probe));
        let configuration = Arc::new(
            GroupConfiguration::new(
                "fixture",
                vec![MemberSpec::new("subject", "fixture.subject")],
                GroupFlags::default(),
            )
            .expect("valid configuration"),
        );
        let members = vec![(
            "subject".to_owned(),
            Some(Value::artifact(artifact.clone() as Arc<dyn Artifact>)),
        )];
        let root = Arc::new(ContextChain::new());
        let group = Group::new(configuration, GroupId::new("fixture"), members, None, &root);
        (group, artifact)
    }

    #[test]
    fn test_plain_property_wired_from_args() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(InjectionPoint::property("title"));
        let (group, artifact) = group_with(schema, &probe);
        let args = ArgumentBag::new().with("title", Value::object("hello"));

        fill_referenced_properties(&group, &args).unwrap();
        assert_eq!(
            artifact.slot("title").unwrap().downcast_ref::<&str>(),
            Some(&"hello")
        );
    }

    #[test]
    fn test_nullable_property_skipped_when_absent() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(InjectionPoint::property("title"));
        let (group, artifact) = group_with(schema, &probe);

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
        assert!(artifact.assignments().is_empty());
    }

    #[test]
    fn test_non_nullable_property_fails_when_absent() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(InjectionPoint::property("title").non_nullable());
        let (group, _) = group_with(schema, &probe);

        let err = fill_referenced_properties(&group, &ArgumentBag::new()).unwrap_err();
        match err {
            GroupError::MissingArgument { point, member, .. } => {
                assert_eq!(point, "title");
                assert_eq!(member, "subject");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_skipped_when_property_satisfied_it() {
        let probe = Probe::new();
        let schema = MemberSchema::new()
            .with(InjectionPoint::property("title"))
            .with(InjectionPoint::field("title"));
        let (group, artifact) = group_with(schema, &probe);
        let args = ArgumentBag::new().with("title", Value::object("once"));

        fill_referenced_properties(&group, &args).unwrap();
        assert_eq!(artifact.assignments(), vec!["title"]);
    }

    #[test]
    fn test_skip_when_absent_beats_nullability() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(
            InjectionPoint::field("retries")
                .non_nullable()
                .skip_when_absent(),
        );
        let (group, artifact) = group_with(schema, &probe);

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
        assert!(artifact.assignments().is_empty());
    }

    #[test]
    fn test_contextual_property_uses_single_derived_key() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(InjectionPoint::property("theme").contextual());
        let (group, artifact) = group_with(schema, &probe);
        group.context().put("theme", Value::object("dark"));

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
        assert_eq!(
            artifact.slot("theme").unwrap().downcast_ref::<&str>(),
            Some(&"dark")
        );
    }

    #[test]
    fn test_contextual_field_last_found_key_wins() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(
            InjectionPoint::field("session")
                .contextual()
                .key("fallbackSession")
                .key("session"),
        );
        let (group, artifact) = group_with(schema, &probe);
        group.context().put("fallbackSession", Value::object(1u8));
        group.context().put("session", Value::object(2u8));

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
        assert_eq!(
            artifact.slot("session").unwrap().downcast_ref::<u8>(),
            Some(&2)
        );
    }

    #[test]
    fn test_contextual_field_falls_back_to_earlier_key() {
        let probe = Probe::new();
        let schema = MemberSchema::new().with(
            InjectionPoint::field("session")
                .contextual()
                .key("fallbackSession")
                .key("session"),
        );
        let (group, artifact) = group_with(schema, &probe);
        group.context().put("fallbackSession", Value::object(1u8));

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
        assert_eq!(
            artifact.slot("session").unwrap().downcast_ref::<u8>(),
            Some(&1)
        );
    }

    #[test]
    fn test_non_nullable_contextual_fails_on_stored_null() {
        let probe = Probe::new();
        let schema =
            MemberSchema::new().with(InjectionPoint::field("session").contextual().non_nullable());
        let (group, _) = group_with(schema, &probe);
        group.context().put_null("session");

        let err = fill_referenced_properties(&group, &ArgumentBag::new()).unwrap_err();
        assert!(matches!(err, GroupError::MissingContextValue { .. }));
    }

    #[test]
    fn test_contextual_pass_ignores_plain_members() {
        let configuration = Arc::new(
            GroupConfiguration::new(
                "fixture",
                vec![MemberSpec::new("data", "fixture.data")],
                GroupFlags::default(),
            )
            .expect("valid configuration"),
        );
        let members = vec![("data".to_owned(), Some(Value::object(5u8)))];
        let root = Arc::new(ContextChain::new());
        let group = Group::new(configuration, GroupId::new("fixture"), members, None, &root);

        fill_referenced_properties(&group, &ArgumentBag::new()).unwrap();
    }

    #[test]
    fn test_clear_contextual_fields_leaves_plain_points_alone() {
        let probe = Probe::new();
        let schema = MemberSchema::new()
            .with(InjectionPoint::property("title"))
            .with(InjectionPoint::property("theme").contextual())
            .with(InjectionPoint::field("session").contextual());
        let (group, artifact) = group_with(schema, &probe);
        group.context().put("theme", Value::object("dark"));
        group.context().put("session", Value::object(2u8));
        let args = ArgumentBag::new().with("title", Value::object("kept"));
        fill_referenced_properties(&group, &args).unwrap();

        let failures = clear_contextual_fields(&(artifact.clone() as Arc<dyn Artifact>));
        assert!(failures.is_empty());
        assert!(artifact.slot("session").is_none());
        // Contextual properties and plain points survive the mirror pass.
        assert!(artifact.slot("theme").is_some());
        assert!(artifact.slot("title").is_some());
    }
}
