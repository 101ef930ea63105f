//! Schema record and member definitions.

use indexmap::IndexMap;
use metagen_core::flags::FlagSet;
use serde::Serialize;

use crate::flags::{MemberDefFlags, RecordDefFlags};

/// The type of a schema member: a single named type, or a union of record
/// types the member may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Named(String),
    Union(Vec<String>),
}

impl TypeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSpec::Named(name.into())
    }

    pub fn union<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeSpec::Union(names.into_iter().map(Into::into).collect())
    }

    pub fn is_union(&self) -> bool {
        matches!(self, TypeSpec::Union(_))
    }

    /// The single name of a non-union spec.
    pub fn single(&self) -> Option<&str> {
        match self {
            TypeSpec::Named(name) => Some(name),
            TypeSpec::Union(_) => None,
        }
    }

    /// The candidate type names of a union spec.
    pub fn candidates(&self) -> &[String] {
        match self {
            TypeSpec::Named(_) => &[],
            TypeSpec::Union(names) => names,
        }
    }
}

/// A member of a schema record or enum definition.
#[derive(Debug, Clone, Serialize)]
pub struct MemberDef {
    pub name: String,
    /// Absent for enum members, which have values instead of types.
    pub ty: Option<TypeSpec>,
    pub flags: FlagSet<MemberDefFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, ty: TypeSpec, flags: FlagSet<MemberDefFlags>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            flags,
            value: None,
            comment: None,
        }
    }

    /// An enum member, optionally with an explicit value.
    pub fn enum_value(name: impl Into<String>, value: Option<u64>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            flags: FlagSet::EMPTY,
            value,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn plus(mut self, extra: FlagSet<MemberDefFlags>) -> Self {
        self.flags |= extra;
        self
    }

    pub fn is_collection(&self) -> bool {
        self.flags.intersects(MemberDefFlags::COLLECTION)
    }

    pub fn is_record_ref(&self) -> bool {
        self.flags.intersects(MemberDefFlags::REF)
    }
}

/// A schema record or enum definition.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDef {
    pub name: String,
    /// Underlying type for enums; unused for records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub flags: FlagSet<RecordDefFlags>,
    pub members: Vec<MemberDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RecordDef {
    pub fn new(
        name: impl Into<String>,
        flags: FlagSet<RecordDefFlags>,
        members: Vec<MemberDef>,
    ) -> Self {
        Self {
            name: name.into(),
            base: None,
            flags,
            members,
            comment: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_enum(&self) -> bool {
        self.flags.intersects(RecordDefFlags::ENUM)
    }
}

/// The complete metadata schema consumed by the generators.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    /// C# keyword to framework name (`int` to `Int32`), sorted by keyword.
    pub primitives: IndexMap<String, String>,
    /// Pre-existing enum types and their underlying types, sorted by name.
    pub enum_types: IndexMap<String, String>,
    /// Enum definitions introduced by this schema.
    pub enums: Vec<RecordDef>,
    /// Record definitions in emission order.
    pub records: Vec<RecordDef>,
    /// Records that require string-specific handling.
    pub string_records: Vec<String>,
}

impl Schema {
    /// The compiled-in NativeFormat metadata schema.
    pub fn native_format() -> Schema {
        crate::native_format::build()
    }

    /// Look up a record definition by name.
    pub fn record(&self, name: &str) -> Option<&RecordDef> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Record names in schema order. Every record has a corresponding
    /// handle type.
    pub fn handle_records(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn is_string_record(&self, name: &str) -> bool {
        self.string_records.iter().any(|s| s == name)
    }

    /// The friendly framework name of a primitive (`int` to `Int32`).
    pub fn friendly_name(&self, keyword: &str) -> Option<&str> {
        self.primitives.get(keyword).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_collection_and_ref_queries() {
        let m = MemberDef::new(
            "Methods",
            TypeSpec::named("Method"),
            MemberDefFlags::LIST | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
        );
        assert!(m.is_collection());
        assert!(m.is_record_ref());

        let m = MemberDef::new("Size", TypeSpec::named("uint"), FlagSet::EMPTY);
        assert!(!m.is_collection());
        assert!(!m.is_record_ref());
    }

    #[test]
    fn union_specs_expose_candidates() {
        let spec = TypeSpec::union(["TypeDefinition", "TypeReference"]);
        assert!(spec.is_union());
        assert_eq!(spec.candidates().len(), 2);
        assert_eq!(spec.single(), None);

        let spec = TypeSpec::named("Method");
        assert_eq!(spec.single(), Some("Method"));
    }
}
