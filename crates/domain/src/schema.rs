//! Static injection-point descriptors.
//!
//! The engine never inspects member internals. Each artifact publishes a
//! [`MemberSchema`] up front listing its injectable points, each tagged
//! plain or contextual, property or field, nullable or required. This is
//! the explicit replacement for runtime reflection over setters and
//! annotated fields.

/// Where an injection point's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    /// Resolved from the per-call argument bag.
    Plain,
    /// Resolved through the group's context chain.
    Contextual,
}

/// Whether a point is backed by a setter-style property or a bare field.
///
/// The two follow different resolution rules: contextual properties use a
/// single derived key, contextual fields try every candidate key and the
/// last one found wins; only fields honor `skip_when_absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionTarget {
    Property,
    Field,
}

impl std::fmt::Display for InjectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property => write!(f, "property"),
            Self::Field => write!(f, "field"),
        }
    }
}

/// One injectable point on a member type.
#[derive(Debug, Clone)]
pub struct InjectionPoint {
    name: String,
    target: InjectionTarget,
    kind: InjectionKind,
    keys: Vec<String>,
    nullable: bool,
    skip_when_absent: bool,
}

impl InjectionPoint {
    /// A plain, nullable property point. Refine with the builder methods.
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(name, InjectionTarget::Property)
    }

    /// A plain, nullable field point.
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, InjectionTarget::Field)
    }

    fn new(name: impl Into<String>, target: InjectionTarget) -> Self {
        Self {
            name: name.into(),
            target,
            kind: InjectionKind::Plain,
            keys: Vec::new(),
            nullable: true,
            skip_when_absent: false,
        }
    }

    /// Resolve through the context chain instead of the argument bag.
    pub fn contextual(mut self) -> Self {
        self.kind = InjectionKind::Contextual;
        self
    }

    /// A missing value is an injection failure instead of a skip.
    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Add an explicit context lookup key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Leave the current value untouched when no argument is supplied,
    /// before any nullability check. Models fields whose default must
    /// survive an absent argument.
    pub fn skip_when_absent(mut self) -> Self {
        self.skip_when_absent = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> InjectionTarget {
        self.target
    }

    pub fn kind(&self) -> InjectionKind {
        self.kind
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn skips_when_absent(&self) -> bool {
        self.skip_when_absent
    }

    /// Candidate context keys in declaration order, falling back to a
    /// single key derived from the point name.
    pub fn lookup_keys(&self) -> Vec<&str> {
        if self.keys.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.keys.iter().map(String::as_str).collect()
        }
    }

    /// The single lookup key used for contextual properties.
    pub fn derived_key(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or(&self.name)
    }
}

/// Ordered collection of a member type's injection points.
#[derive(Debug, Clone, Default)]
pub struct MemberSchema {
    points: Vec<InjectionPoint>,
}

impl MemberSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared schema for members with no injection points.
    pub fn empty() -> &'static MemberSchema {
        static EMPTY: MemberSchema = MemberSchema { points: Vec::new() };
        &EMPTY
    }

    pub fn with(mut self, point: InjectionPoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn push(&mut self, point: InjectionPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[InjectionPoint] {
        &self.points
    }

    pub fn plain_properties(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points.iter().filter(|p| {
            p.kind() == InjectionKind::Plain && p.target() == InjectionTarget::Property
        })
    }

    pub fn plain_fields(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points
            .iter()
            .filter(|p| p.kind() == InjectionKind::Plain && p.target() == InjectionTarget::Field)
    }

    pub fn contextual_points(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points
            .iter()
            .filter(|p| p.kind() == InjectionKind::Contextual)
    }

    pub fn contextual_fields(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.contextual_points()
            .filter(|p| p.target() == InjectionTarget::Field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_defaults() {
        let point = InjectionPoint::property("model");
        assert_eq!(point.kind(), InjectionKind::Plain);
        assert_eq!(point.target(), InjectionTarget::Property);
        assert!(point.nullable());
        assert!(!point.skips_when_absent());
    }

    #[test]
    fn test_lookup_keys_fall_back_to_name() {
        let point = InjectionPoint::field("session").contextual();
        assert_eq!(point.lookup_keys(), vec!["session"]);
        assert_eq!(point.derived_key(), "session");

        let keyed = InjectionPoint::field("session")
            .contextual()
            .key("sessionId")
            .key("session");
        assert_eq!(keyed.lookup_keys(), vec!["sessionId", "session"]);
        assert_eq!(keyed.derived_key(), "sessionId");
    }

    #[test]
    fn test_schema_pass_partitions() {
        let schema = MemberSchema::new()
            .with(InjectionPoint::property("model"))
            .with(InjectionPoint::field("counter").skip_when_absent())
            .with(InjectionPoint::property("theme").contextual())
            .with(InjectionPoint::field("session").contextual().non_nullable());

        assert_eq!(schema.plain_properties().count(), 1);
        assert_eq!(schema.plain_fields().count(), 1);
        assert_eq!(schema.contextual_points().count(), 2);
        assert_eq!(schema.contextual_fields().count(), 1);
    }

    #[test]
    fn test_empty_schema_is_shared() {
        assert!(MemberSchema::empty().points().is_empty());
    }
}
