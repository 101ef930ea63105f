//! In-memory model of C# declarations.
//!
//! Types live in a [`SymbolTable`] arena and refer to each other through
//! [`TypeId`] handles, so cross-references (a record's handle type, a member's
//! element type) never need back-pointers into the owning scope.

mod member;

pub use member::{
    Accessor, CodeBlock, Ctor, EnumValue, Event, Field, Member, MemberSet, Method, Param, Property,
};

use metagen_core::flags::FlagSet;

use crate::error::EmitError;
use crate::flags::{AccessFlags, EnumFlags, TypeFlags};

/// Handle to a type entry in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// Handle to a namespace in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NsId(usize);

/// A reference to or definition of a type.
#[derive(Debug, Clone)]
pub enum TypeEntry {
    Ref(TypeRef),
    Def(TypeDef),
}

/// A reference to a type defined elsewhere. Only its spelling and generic
/// arity are known.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub name: String,
    pub arity: usize,
}

/// A type definition owned by the model.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub flags: FlagSet<EnumFlags>,
    pub comment: Option<String>,
    pub base: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    pub type_params: Vec<String>,
    /// Storage type of an enum; rendered as its base clause.
    pub underlying: Option<TypeExpr>,
    pub members: MemberSet,
}

impl TypeDef {
    /// A definition with the given kind and access flags. A definition with
    /// no visibility flag defaults to public.
    pub fn new(name: impl Into<String>, flags: FlagSet<EnumFlags>) -> Self {
        let flags = if flags.intersects(EnumFlags::VISIBILITY) {
            flags
        } else {
            flags | EnumFlags::PUBLIC
        };
        Self {
            name: name.into(),
            flags,
            comment: None,
            base: None,
            interfaces: Vec::new(),
            type_params: Vec::new(),
            underlying: None,
            members: MemberSet::new(),
        }
    }

    pub fn class(name: impl Into<String>, flags: FlagSet<EnumFlags>) -> Self {
        Self::new(name, Self::rekind(flags, EnumFlags::CLASS))
    }

    pub fn strukt(name: impl Into<String>, flags: FlagSet<EnumFlags>) -> Self {
        Self::new(name, Self::rekind(flags, EnumFlags::STRUCT))
    }

    pub fn interface(name: impl Into<String>, flags: FlagSet<EnumFlags>) -> Self {
        Self::new(name, Self::rekind(flags, EnumFlags::INTERFACE))
    }

    pub fn enumeration(name: impl Into<String>, flags: FlagSet<EnumFlags>) -> Self {
        Self::new(name, Self::rekind(flags, EnumFlags::ENUM))
    }

    fn rekind(flags: FlagSet<EnumFlags>, kind: FlagSet<EnumFlags>) -> FlagSet<EnumFlags> {
        (flags & !EnumFlags::KIND) | kind
    }

    pub fn is_interface(&self) -> bool {
        self.flags.intersects(EnumFlags::INTERFACE)
    }

    pub fn is_struct(&self) -> bool {
        self.flags.intersects(EnumFlags::STRUCT)
    }

    pub fn is_enum(&self) -> bool {
        self.flags.intersects(EnumFlags::ENUM)
    }

    /// The display name: interfaces gain an `I` prefix unless the name
    /// already starts with `I` followed by an uppercase letter.
    pub fn display_name(&self) -> String {
        if self.is_interface() && !has_interface_prefix(&self.name) {
            format!("I{}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Derive an internal interface carrying this definition's interface
    /// list and members. The partial and visibility flags are stripped.
    pub fn as_interface(&self) -> TypeDef {
        let flags = Self::rekind(
            (self.flags & !EnumFlags::PARTIAL & !EnumFlags::VISIBILITY) | EnumFlags::INTERNAL,
            EnumFlags::INTERFACE,
        );
        let mut interface = TypeDef::new(self.name.clone(), flags);
        interface.interfaces = self.interfaces.clone();
        interface.members = self.members.clone();
        interface
    }
}

pub(crate) fn has_interface_prefix(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// A use of a type: a table entry, a generic instantiation, or literal
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(TypeId),
    Inst(TypeInst),
    /// Verbatim type text, for spellings the model does not track
    /// (`ref uint`, `byte[]`, ...).
    Text(String),
}

impl TypeExpr {
    pub fn text(s: impl Into<String>) -> Self {
        TypeExpr::Text(s.into())
    }
}

impl From<TypeId> for TypeExpr {
    fn from(id: TypeId) -> Self {
        TypeExpr::Named(id)
    }
}

/// A generic type applied to arguments. Argument count is only checked when
/// the instantiation is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInst {
    pub target: TypeId,
    pub args: Vec<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub full: String,
    pub parent: Option<NsId>,
    pub children: Vec<NsId>,
    pub types: Vec<TypeId>,
}

/// Arena of type entries and namespaces.
#[derive(Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeEntry>,
    namespaces: Vec<Namespace>,
    roots: Vec<NsId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ref(&mut self, name: impl Into<String>) -> TypeId {
        self.add_entry(TypeEntry::Ref(TypeRef {
            name: name.into(),
            arity: 0,
        }))
    }

    pub fn add_generic_ref(&mut self, name: impl Into<String>, arity: usize) -> TypeId {
        self.add_entry(TypeEntry::Ref(TypeRef {
            name: name.into(),
            arity,
        }))
    }

    pub fn add_def(&mut self, def: TypeDef) -> TypeId {
        self.add_entry(TypeEntry::Def(def))
    }

    fn add_entry(&mut self, entry: TypeEntry) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(entry);
        id
    }

    pub fn entry(&self, id: TypeId) -> &TypeEntry {
        &self.types[id.0]
    }

    /// The definition behind `id`.
    ///
    /// # Panics
    ///
    /// Panics when `id` names a reference; definitions and references are
    /// never interchangeable at the call sites that use this.
    pub fn def(&self, id: TypeId) -> &TypeDef {
        match &self.types[id.0] {
            TypeEntry::Def(def) => def,
            TypeEntry::Ref(r) => panic!("type `{}` is a reference, not a definition", r.name),
        }
    }

    pub fn def_mut(&mut self, id: TypeId) -> &mut TypeDef {
        match &mut self.types[id.0] {
            TypeEntry::Def(def) => def,
            TypeEntry::Ref(r) => panic!("type `{}` is a reference, not a definition", r.name),
        }
    }

    /// Number of generic parameters of the entry behind `id`.
    pub fn arity(&self, id: TypeId) -> usize {
        match &self.types[id.0] {
            TypeEntry::Ref(r) => r.arity,
            TypeEntry::Def(d) => d.type_params.len(),
        }
    }

    /// The bare display name of a type entry.
    pub fn type_name(&self, id: TypeId) -> String {
        match &self.types[id.0] {
            TypeEntry::Ref(r) => r.name.clone(),
            TypeEntry::Def(d) => d.display_name(),
        }
    }

    /// Apply type arguments to `target`.
    ///
    /// Applying arguments to a non-generic type fails immediately; applying
    /// them to an existing instantiation accumulates, and the final argument
    /// count is checked when the expression is rendered.
    pub fn instantiate(
        &self,
        target: TypeExpr,
        args: Vec<TypeExpr>,
    ) -> Result<TypeExpr, EmitError> {
        match target {
            TypeExpr::Named(id) => {
                if self.arity(id) == 0 {
                    return Err(EmitError::NotGeneric {
                        name: self.type_name(id),
                    });
                }
                Ok(TypeExpr::Inst(TypeInst { target: id, args }))
            }
            TypeExpr::Inst(mut inst) => {
                inst.args.extend(args);
                Ok(TypeExpr::Inst(inst))
            }
            TypeExpr::Text(name) => Err(EmitError::NotGeneric { name }),
        }
    }

    /// Render a type expression to its C# spelling.
    pub fn display(&self, expr: &TypeExpr) -> Result<String, EmitError> {
        match expr {
            TypeExpr::Named(id) => Ok(self.type_name(*id)),
            TypeExpr::Text(text) => Ok(text.clone()),
            TypeExpr::Inst(inst) => {
                let expected = self.arity(inst.target);
                if inst.args.len() != expected {
                    return Err(EmitError::IncompleteInstantiation {
                        name: self.type_name(inst.target),
                        expected,
                        got: inst.args.len(),
                    });
                }
                let args = inst
                    .args
                    .iter()
                    .map(|a| self.display(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!(
                    "{}<{}>",
                    self.type_name(inst.target),
                    args.join(", ")
                ))
            }
        }
    }

    /// Look up or create the namespace chain for a dotted path, returning the
    /// leaf.
    pub fn namespace(&mut self, dotted: &str) -> NsId {
        let mut parent: Option<NsId> = None;
        let mut full = String::new();
        for segment in dotted.split('.') {
            if !full.is_empty() {
                full.push('.');
            }
            full.push_str(segment);

            let siblings = match parent {
                Some(p) => &self.namespaces[p.0].children,
                None => &self.roots,
            };
            let existing = siblings
                .iter()
                .copied()
                .find(|&id| self.namespaces[id.0].name == segment);

            let id = match existing {
                Some(id) => id,
                None => {
                    let id = NsId(self.namespaces.len());
                    self.namespaces.push(Namespace {
                        name: segment.to_owned(),
                        full: full.clone(),
                        parent,
                        children: Vec::new(),
                        types: Vec::new(),
                    });
                    match parent {
                        Some(p) => self.namespaces[p.0].children.push(id),
                        None => self.roots.push(id),
                    }
                    id
                }
            };
            parent = Some(id);
        }
        // `split` yields at least one segment, so `parent` is always set.
        parent.unwrap_or(NsId(0))
    }

    pub fn ns(&self, id: NsId) -> &Namespace {
        &self.namespaces[id.0]
    }

    /// Place a type into a namespace.
    pub fn add_to_namespace(&mut self, ns: NsId, id: TypeId) {
        self.namespaces[ns.0].types.push(id);
    }

    pub fn roots(&self) -> &[NsId] {
        &self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_display_name_gains_prefix() {
        let def = TypeDef::interface("Handle", EnumFlags::INTERNAL);
        assert_eq!(def.display_name(), "IHandle");

        let def = TypeDef::interface("IMetadataReader", EnumFlags::PUBLIC);
        assert_eq!(def.display_name(), "IMetadataReader");

        // `I` followed by lowercase is not treated as a prefix.
        let def = TypeDef::interface("Index", EnumFlags::PUBLIC);
        assert_eq!(def.display_name(), "IIndex");
    }

    #[test]
    fn definitions_default_to_public() {
        let def = TypeDef::class("A", FlagSet::EMPTY);
        assert!(def.flags.intersects(EnumFlags::PUBLIC));

        let def = TypeDef::class("A", EnumFlags::INTERNAL);
        assert!(!def.flags.intersects(EnumFlags::PUBLIC));
    }

    #[test]
    fn instantiating_a_non_generic_type_fails_immediately() {
        let mut table = SymbolTable::new();
        let plain = table.add_ref("Handle");
        let err = table
            .instantiate(plain.into(), vec![TypeExpr::text("int")])
            .unwrap_err();
        assert_eq!(
            err,
            EmitError::NotGeneric {
                name: "Handle".into()
            }
        );
    }

    #[test]
    fn arity_mismatch_is_only_detected_at_render_time() {
        let mut table = SymbolTable::new();
        let list = table.add_generic_ref("List", 1);
        let inst = table.instantiate(list.into(), vec![]).unwrap();
        assert_eq!(
            table.display(&inst),
            Err(EmitError::IncompleteInstantiation {
                name: "List".into(),
                expected: 1,
                got: 0,
            })
        );
    }

    #[test]
    fn repeated_instantiation_accumulates_arguments() {
        let mut table = SymbolTable::new();
        let map = table.add_generic_ref("Dictionary", 2);
        let partial = table
            .instantiate(map.into(), vec![TypeExpr::text("string")])
            .unwrap();
        let full = table
            .instantiate(partial, vec![TypeExpr::text("int")])
            .unwrap();
        assert_eq!(table.display(&full).unwrap(), "Dictionary<string, int>");
    }

    #[test]
    fn namespace_chain_is_created_once() {
        let mut table = SymbolTable::new();
        let leaf = table.namespace("Internal.Metadata.NativeFormat");
        assert_eq!(table.ns(leaf).full, "Internal.Metadata.NativeFormat");
        assert_eq!(table.ns(leaf).name, "NativeFormat");

        let again = table.namespace("Internal.Metadata.NativeFormat");
        assert_eq!(leaf, again);

        let sibling = table.namespace("Internal.Metadata.Writer");
        assert_eq!(table.ns(sibling).parent, table.ns(leaf).parent);
        assert_eq!(table.roots().len(), 1);
    }

    #[test]
    fn as_interface_strips_partial_and_visibility() {
        let mut def = TypeDef::strukt("Handle", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
        def.members.add(Member::Field(Field::new(
            "_value",
            TypeExpr::text("int"),
            crate::flags::MemberFlags::PRIVATE,
        )));

        let iface = def.as_interface();
        assert!(iface.is_interface());
        assert!(!iface.flags.intersects(EnumFlags::PARTIAL));
        assert!(iface.flags.intersects(EnumFlags::INTERNAL));
        assert!(!iface.flags.intersects(EnumFlags::PUBLIC));
        assert_eq!(iface.members.len(), 1);
        assert_eq!(iface.display_name(), "IHandle");
    }
}
