//! Type members.

use indexmap::IndexMap;
use metagen_core::flags::FlagSet;

use crate::flags::MemberFlags;
use crate::model::TypeExpr;

/// Key under which constructors group in a [`MemberSet`].
const CTOR_KEY: &str = ".ctor";

/// A member of a type definition.
#[derive(Debug, Clone)]
pub enum Member {
    Field(Field),
    Property(Property),
    Method(Method),
    Ctor(Ctor),
    Event(Event),
    EnumValue(EnumValue),
    Code(CodeBlock),
}

impl Member {
    /// The name this member declares, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Field(f) => Some(&f.name),
            Member::Property(p) => Some(&p.name),
            Member::Method(m) => Some(&m.name),
            Member::Event(e) => Some(&e.name),
            Member::EnumValue(v) => Some(&v.name),
            Member::Ctor(_) | Member::Code(_) => None,
        }
    }

    pub fn flags(&self) -> FlagSet<MemberFlags> {
        match self {
            Member::Field(f) => f.flags,
            Member::Property(p) => p.flags,
            Member::Method(m) => m.flags,
            Member::Ctor(c) => c.flags,
            Member::Event(e) => e.flags,
            Member::EnumValue(_) | Member::Code(_) => FlagSet::EMPTY,
        }
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub flags: FlagSet<MemberFlags>,
    pub comment: Option<String>,
    /// Initializer expression rendered as ` = <init>`.
    pub init: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeExpr, flags: FlagSet<MemberFlags>) -> Self {
        Self {
            name: name.into(),
            ty,
            flags,
            comment: None,
            init: None,
        }
    }

    pub fn with_init(mut self, init: impl Into<String>) -> Self {
        self.init = Some(init.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A property accessor (`get` or `set`).
#[derive(Debug, Clone)]
pub struct Accessor {
    pub flags: FlagSet<MemberFlags>,
    pub body: Option<String>,
}

impl Accessor {
    pub fn new() -> Self {
        Self {
            flags: MemberFlags::PUBLIC,
            body: None,
        }
    }

    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            flags: MemberFlags::PUBLIC,
            body: Some(body.into()),
        }
    }
}

impl Default for Accessor {
    fn default() -> Self {
        Self::new()
    }
}

/// A property declaration.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub ty: TypeExpr,
    pub flags: FlagSet<MemberFlags>,
    pub comment: Option<String>,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
}

impl Property {
    /// A property with bodiless `get` and `set` accessors.
    pub fn new(name: impl Into<String>, ty: TypeExpr, flags: FlagSet<MemberFlags>) -> Self {
        Self {
            name: name.into(),
            ty,
            flags,
            comment: None,
            getter: Some(Accessor::new()),
            setter: Some(Accessor::new()),
        }
    }

    /// A property whose accessors delegate to a backing field.
    pub fn backed_by(
        name: impl Into<String>,
        ty: TypeExpr,
        flags: FlagSet<MemberFlags>,
        field: &str,
    ) -> Self {
        let mut p = Self::new(name, ty, flags);
        p.getter = Some(Accessor::with_body(format!("return {field};")));
        p.setter = Some(Accessor::with_body(format!("{field} = value;")));
        p
    }

    /// A read-only property with the given getter body.
    pub fn getter_only(
        name: impl Into<String>,
        ty: TypeExpr,
        flags: FlagSet<MemberFlags>,
        body: impl Into<String>,
    ) -> Self {
        let mut p = Self::new(name, ty, flags);
        p.getter = Some(Accessor::with_body(body));
        p.setter = None;
        p
    }

    /// An abstract read-only property (bodiless `get`, no `set`).
    pub fn abstract_getter(
        name: impl Into<String>,
        ty: TypeExpr,
        flags: FlagSet<MemberFlags>,
    ) -> Self {
        let mut p = Self::new(name, ty, flags);
        p.setter = None;
        p
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeExpr,
    pub name: String,
}

impl Param {
    pub fn new(ty: impl Into<TypeExpr>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// A parameter whose type is given as literal source text.
    pub fn text(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: TypeExpr::Text(ty.into()),
            name: name.into(),
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub flags: FlagSet<MemberFlags>,
    pub comment: Option<String>,
    /// `None` renders as `void`.
    pub returns: Option<TypeExpr>,
    pub params: Vec<Param>,
    pub type_params: Vec<String>,
    /// `where` clauses as `(parameter, bound)` pairs.
    pub constraints: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Method {
    /// A public void method with a placeholder body. Extension methods are
    /// implicitly static.
    pub fn new(name: impl Into<String>, flags: FlagSet<MemberFlags>) -> Self {
        let flags = if flags.intersects(MemberFlags::EXTENSION) {
            flags | MemberFlags::STATIC
        } else {
            flags
        };
        Self {
            name: name.into(),
            flags,
            comment: None,
            returns: None,
            params: Vec::new(),
            type_params: Vec::new(),
            constraints: Vec::new(),
            body: Some("throw new NotImplementedException();".to_owned()),
        }
    }

    pub fn returning(mut self, ty: impl Into<TypeExpr>) -> Self {
        self.returns = Some(ty.into());
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Declaration-only method: no body is emitted.
    pub fn bodiless(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A constructor. Its declared name is always the owning type's name.
#[derive(Debug, Clone)]
pub struct Ctor {
    pub flags: FlagSet<MemberFlags>,
    pub comment: Option<String>,
    pub params: Vec<Param>,
    /// Arguments of a `: this(...)` delegation clause.
    pub delegation: Option<Vec<String>>,
    pub body: Option<String>,
}

impl Ctor {
    pub fn new(flags: FlagSet<MemberFlags>) -> Self {
        Self {
            flags,
            comment: None,
            params: Vec::new(),
            delegation: None,
            body: Some("throw new NotImplementedException();".to_owned()),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn bodiless(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn delegating_to(mut self, args: Vec<String>) -> Self {
        self.delegation = Some(args);
        self
    }
}

/// An event declaration.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub ty: TypeExpr,
    pub flags: FlagSet<MemberFlags>,
    pub comment: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, ty: TypeExpr, flags: FlagSet<MemberFlags>) -> Self {
        Self {
            name: name.into(),
            ty,
            flags,
            comment: None,
        }
    }
}

/// A single enum member.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub value: Option<u64>,
    pub comment: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            comment: None,
        }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A verbatim block of member-position source text.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub text: String,
}

impl CodeBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// An insertion-ordered set of members that groups overloads.
///
/// Members share a group when they declare the same name; all constructors
/// share one group. Iteration yields groups in first-insertion order and
/// members within a group in insertion order, so a late-added overload sits
/// next to its siblings rather than at the end of the type.
#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    groups: IndexMap<String, Vec<Member>>,
    anonymous: usize,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, member: Member) {
        let key = match &member {
            Member::Ctor(_) => CTOR_KEY.to_owned(),
            Member::Code(_) => {
                self.anonymous += 1;
                format!("#code{}", self.anonymous)
            }
            other => match other.name() {
                Some(name) => name.to_owned(),
                None => String::new(),
            },
        };
        self.groups.entry(key).or_default().push(member);
    }

    pub fn extend(&mut self, members: impl IntoIterator<Item = Member>) {
        for m in members {
            self.add(m);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.groups.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.groups.values_mut().flatten()
    }

    /// Members grouped under `name`.
    pub fn get(&self, name: &str) -> Option<&[Member]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Number of member groups (overloads count once).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

impl Extend<Member> for MemberSet {
    fn extend<T: IntoIterator<Item = Member>>(&mut self, iter: T) {
        for m in iter {
            self.add(m);
        }
    }
}
