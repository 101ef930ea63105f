//! Shared state for building a scenario's symbol table.

use indexmap::IndexMap;
use metagen_codegen::EmitError;
use metagen_codegen::model::{SymbolTable, TypeDef, TypeExpr, TypeId};
use metagen_schema::{MemberDef, MemberDefFlags, TypeSpec};

/// Owns the symbol table of one scenario and interns type entries by name, so
/// every mention of `MethodHandle` or `IEnumerable` resolves to the same
/// [`TypeId`].
pub struct BuildContext {
    pub table: SymbolTable,
    ids: IndexMap<String, TypeId>,
}

impl BuildContext {
    /// A context pre-seeded with the generic framework types the generators
    /// instantiate.
    pub fn new() -> Self {
        let mut ctx = Self {
            table: SymbolTable::new(),
            ids: IndexMap::new(),
        };
        for (name, arity) in [
            ("IEnumerable", 1),
            ("IEnumerator", 1),
            ("IEquatable", 1),
            ("List", 1),
            ("Dictionary", 2),
            ("ThreadLocal", 1),
        ] {
            let id = ctx.table.add_generic_ref(name, arity);
            ctx.ids.insert(name.to_owned(), id);
        }
        ctx
    }

    /// Look up or create a plain reference to `name`.
    pub fn type_ref(&mut self, name: &str) -> TypeId {
        match self.ids.get(name) {
            Some(&id) => id,
            None => {
                let id = self.table.add_ref(name);
                self.ids.insert(name.to_owned(), id);
                id
            }
        }
    }

    /// Add a definition to the table and register it under its display name.
    pub fn define(&mut self, def: TypeDef) -> TypeId {
        let name = def.display_name();
        let id = self.table.add_def(def);
        self.ids.insert(name, id);
        id
    }

    /// The id previously registered for `name`, if any.
    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.ids.get(name).copied()
    }

    /// Instantiate a registered generic type.
    pub fn generic(&mut self, name: &str, args: Vec<TypeExpr>) -> Result<TypeExpr, EmitError> {
        let id = self.type_ref(name);
        self.table.instantiate(id.into(), args)
    }

    pub fn enumerable_of(&mut self, elem: TypeExpr) -> Result<TypeExpr, EmitError> {
        self.generic("IEnumerable", vec![elem])
    }

    pub fn display(&self, expr: &TypeExpr) -> Result<String, EmitError> {
        self.table.display(expr)
    }

    /// The element type of a schema member as the reader side sees it:
    /// unions collapse to the generic `Handle`, record references become the
    /// referenced record's handle type, everything else keeps its spelling.
    pub fn handle_element(&mut self, member: &MemberDef) -> TypeExpr {
        let Some(spec) = &member.ty else {
            return TypeExpr::text("int");
        };
        match spec {
            TypeSpec::Union(_) => self.type_ref("Handle").into(),
            TypeSpec::Named(name) => {
                if member.is_record_ref() && name != "Handle" {
                    self.type_ref(&handle_name(name)).into()
                } else if member.is_record_ref() {
                    self.type_ref("Handle").into()
                } else {
                    TypeExpr::text(name.clone())
                }
            }
        }
    }

    /// The serialized field type of a member on the reader side: collections
    /// become arrays of the element type.
    pub fn reader_field_type(&mut self, member: &MemberDef) -> Result<TypeExpr, EmitError> {
        let elem = self.handle_element(member);
        if member.is_collection() {
            let elem = self.display(&elem)?;
            Ok(TypeExpr::text(format!("{elem}[]")))
        } else {
            Ok(elem)
        }
    }

    /// The field type of a member on the writer side: unions and the generic
    /// `Handle` collapse to `MetadataRecord`, record references use the
    /// record class directly, maps and lists become `List<T>`, arrays stay
    /// arrays.
    pub fn writer_member_type(&mut self, member: &MemberDef) -> Result<TypeExpr, EmitError> {
        let Some(spec) = &member.ty else {
            return Ok(TypeExpr::text("int"));
        };
        let base: TypeExpr = match spec {
            TypeSpec::Union(_) => self.type_ref("MetadataRecord").into(),
            TypeSpec::Named(name) => {
                if member.is_record_ref() {
                    let name = if name == "Handle" {
                        "MetadataRecord"
                    } else {
                        name
                    };
                    self.type_ref(name).into()
                } else {
                    TypeExpr::text(name.clone())
                }
            }
        };
        if member
            .flags
            .intersects(MemberDefFlags::MAP | MemberDefFlags::LIST)
        {
            self.generic("List", vec![base])
        } else if member.flags.intersects(MemberDefFlags::ARRAY) {
            let base = self.display(&base)?;
            Ok(TypeExpr::text(format!("{base}[]")))
        } else {
            Ok(base)
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The handle type paired with a record. The generic `Handle` is its own
/// handle.
pub fn handle_name(record: &str) -> String {
    if record == "Handle" {
        record.to_owned()
    } else {
        format!("{record}Handle")
    }
}

/// The comment attached to union-typed members.
pub fn union_comment(member: &MemberDef) -> Option<String> {
    let spec = member.ty.as_ref()?;
    if spec.is_union() {
        Some(format!("One of: {}", spec.candidates().join(", ")))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use metagen_schema::MemberDefFlags;

    use super::*;

    #[test]
    fn references_are_interned() {
        let mut ctx = BuildContext::new();
        let a = ctx.type_ref("MethodHandle");
        let b = ctx.type_ref("MethodHandle");
        assert_eq!(a, b);
    }

    #[test]
    fn unions_collapse_to_the_generic_handle() {
        let mut ctx = BuildContext::new();
        let m = MemberDef::new(
            "Signature",
            TypeSpec::union(["TypeDefinition", "TypeReference"]),
            MemberDefFlags::RECORD_REF,
        );
        let ty = ctx.reader_field_type(&m).unwrap();
        assert_eq!(ctx.display(&ty).unwrap(), "Handle");
        assert_eq!(
            union_comment(&m).as_deref(),
            Some("One of: TypeDefinition, TypeReference")
        );
    }

    #[test]
    fn reader_collections_become_arrays_of_handles() {
        let mut ctx = BuildContext::new();
        let m = MemberDef::new(
            "Methods",
            TypeSpec::named("Method"),
            MemberDefFlags::LIST | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
        );
        let ty = ctx.reader_field_type(&m).unwrap();
        assert_eq!(ctx.display(&ty).unwrap(), "MethodHandle[]");
        let elem = ctx.handle_element(&m);
        assert_eq!(ctx.display(&elem).unwrap(), "MethodHandle");
    }

    #[test]
    fn writer_lists_use_record_classes() {
        let mut ctx = BuildContext::new();
        let m = MemberDef::new(
            "Methods",
            TypeSpec::named("Method"),
            MemberDefFlags::LIST | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
        );
        let ty = ctx.writer_member_type(&m).unwrap();
        assert_eq!(ctx.display(&ty).unwrap(), "List<Method>");

        let m = MemberDef::new("Value", TypeSpec::named("bool"), MemberDefFlags::ARRAY);
        let ty = ctx.writer_member_type(&m).unwrap();
        assert_eq!(ctx.display(&ty).unwrap(), "bool[]");
    }
}
