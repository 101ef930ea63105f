//! Rendering of the symbol model to C# source text.

use crate::error::EmitError;
use crate::flags::{EnumFlags, MemberFlags, access_keyword};
use crate::model::{
    Accessor, Ctor, EnumValue, Event, Field, Member, Method, NsId, Property, SymbolTable, TypeDef,
    TypeEntry, TypeExpr, TypeId, has_interface_prefix,
};
use crate::writer::SourceWriter;

/// Assign values to the unvalued members of an enum definition.
///
/// Values are chosen left to right: the first free candidate starting at `1`
/// (doubling) for flag enums, or at `0` (incrementing) otherwise, skipping
/// every value already present on any member. The search fails rather than
/// wrapping when the 64-bit value space is exhausted.
pub fn assign_enum_values(def: &mut TypeDef) -> Result<(), EmitError> {
    let flag_values = def.flags.intersects(EnumFlags::HAS_FLAG_VALUES);
    let name = def.display_name();
    let mut taken: Vec<u64> = def
        .members
        .iter()
        .filter_map(|m| match m {
            Member::EnumValue(v) => v.value,
            _ => None,
        })
        .collect();

    for member in def.members.iter_mut() {
        let Member::EnumValue(value) = member else {
            continue;
        };
        if value.value.is_some() {
            continue;
        }
        let mut candidate: u64 = if flag_values { 1 } else { 0 };
        while taken.contains(&candidate) {
            let next = if flag_values {
                candidate.checked_mul(2)
            } else {
                candidate.checked_add(1)
            };
            candidate = next.ok_or_else(|| EmitError::EnumValueSpace { name: name.clone() })?;
        }
        value.value = Some(candidate);
        taken.push(candidate);
    }
    Ok(())
}

/// Renders namespaces and type definitions from a [`SymbolTable`].
pub struct Emitter<'a> {
    table: &'a SymbolTable,
}

impl<'a> Emitter<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Emit a namespace, its types, and its child namespaces.
    ///
    /// Types are ordered enums first, then everything else, alphabetically
    /// within each group; interface names sort without their `I` prefix.
    /// Child namespaces follow the closing brace at the same indentation,
    /// each introduced by its full dotted name.
    pub fn emit_namespace(&self, w: &mut SourceWriter, ns: NsId) -> Result<(), EmitError> {
        let ns = self.table.ns(ns);

        let mut ids = ns.types.clone();
        ids.sort_by_key(|&id| self.sort_key(id));

        if !ids.is_empty() {
            w.write_line(&format!("namespace {}\n{{", ns.full));
            w.indent();
            for id in ids {
                self.emit_type(w, id)?;
                w.pad();
            }
            w.outdent();
            w.write_line(&format!("}} // {}", ns.full));
        }

        for &child in &ns.children {
            self.emit_namespace(w, child)?;
            w.pad();
        }
        Ok(())
    }

    fn sort_key(&self, id: TypeId) -> (u8, String) {
        match self.table.entry(id) {
            TypeEntry::Def(def) => {
                let mut name = def.display_name();
                if def.is_interface() && has_interface_prefix(&name) {
                    name.remove(0);
                }
                (if def.is_enum() { 1 } else { 2 }, name)
            }
            TypeEntry::Ref(r) => (2, r.name.clone()),
        }
    }

    /// Emit a single type definition. References produce no output.
    pub fn emit_type(&self, w: &mut SourceWriter, id: TypeId) -> Result<(), EmitError> {
        match self.table.entry(id) {
            TypeEntry::Ref(_) => Ok(()),
            TypeEntry::Def(def) => self.emit_type_def(w, def),
        }
    }

    fn emit_type_def(&self, w: &mut SourceWriter, def: &TypeDef) -> Result<(), EmitError> {
        let display = def.display_name();

        let comment = match &def.comment {
            Some(c) => format!(" : {c}"),
            None => String::new(),
        };
        w.write_line(&format!(
            "/// <summary>\n/// {display}{comment}\n/// </summary>"
        ));
        if def.is_enum() && def.flags.intersects(EnumFlags::HAS_FLAG_VALUES) {
            w.write_line("[Flags]");
        }

        // A struct's base type is folded into the struct rather than
        // declared: its non-constructor members come first, and the base
        // clause is dropped.
        let folded = if def.is_struct() {
            self.base_members(def)
        } else {
            Vec::new()
        };

        w.write(&self.type_declaration(def, &display));
        if def.flags.intersects(EnumFlags::ARRAY) {
            w.append("[]");
        }
        if !def.type_params.is_empty() {
            w.append(&format!("<{}>", def.type_params.join(", ")));
        }
        let bases = self.base_clause(def)?;
        if !bases.is_empty() {
            w.append(&format!(" : {}", bases.join(", ")));
        }
        w.newline();
        w.write_line("{");

        w.indent();
        if def.is_enum() {
            for member in def.members.iter() {
                match member {
                    Member::EnumValue(v) => self.emit_enum_value(w, v),
                    other => {
                        return Err(EmitError::NonEnumMember {
                            name: display.clone(),
                            member: other.name().unwrap_or("<code>").to_owned(),
                        });
                    }
                }
            }
        } else {
            let members = folded
                .into_iter()
                .chain(def.members.iter())
                .filter(|m| !(def.is_interface() && matches!(m, Member::Field(_))));
            for member in members {
                self.emit_member(w, def, member)?;
                let plain = matches!(member, Member::Field(_) | Member::Event(_))
                    || member.flags().intersects(MemberFlags::ABSTRACT);
                if !plain {
                    w.pad();
                }
            }
        }
        w.outdent();

        w.write_line(&format!("}} // {display}"));
        Ok(())
    }

    /// Non-constructor members of a definition's base type, when the base
    /// resolves to a definition in the table.
    fn base_members(&self, def: &TypeDef) -> Vec<&'a Member> {
        let Some(TypeExpr::Named(base)) = &def.base else {
            return Vec::new();
        };
        match self.table.entry(*base) {
            TypeEntry::Def(base_def) => base_def
                .members
                .iter()
                .filter(|m| !matches!(m, Member::Ctor(_)))
                .collect(),
            TypeEntry::Ref(_) => Vec::new(),
        }
    }

    fn type_declaration(&self, def: &TypeDef, display: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let access = access_keyword(def.flags);
        if !access.is_empty() {
            parts.push(access);
        }
        if !def.is_interface() {
            if def.flags.intersects(EnumFlags::ABSTRACT) {
                parts.push("abstract");
            }
            if def.flags.intersects(EnumFlags::STATIC) {
                parts.push("static");
            }
        }
        if def.flags.intersects(EnumFlags::PARTIAL) {
            parts.push("partial");
        }
        let kind = def.flags & EnumFlags::KIND;
        if kind == EnumFlags::CLASS {
            parts.push("class");
        } else if kind == EnumFlags::STRUCT {
            parts.push("struct");
        } else if kind == EnumFlags::INTERFACE {
            parts.push("interface");
        } else if kind == EnumFlags::ENUM {
            parts.push("enum");
        }
        parts.push(display);
        parts.join(" ")
    }

    /// The `: base, interfaces` list. An interface's base type folds into
    /// its interface list; an enum's base clause is its underlying type; a
    /// struct's base is dropped because its members are folded in.
    fn base_clause(&self, def: &TypeDef) -> Result<Vec<String>, EmitError> {
        let mut exprs: Vec<&TypeExpr> = Vec::new();
        if def.is_enum() {
            if let Some(underlying) = &def.underlying {
                exprs.push(underlying);
            }
        } else if def.is_interface() {
            exprs.extend(&def.interfaces);
            exprs.extend(&def.base);
        } else {
            if !def.is_struct() {
                exprs.extend(&def.base);
            }
            exprs.extend(&def.interfaces);
        }
        exprs.iter().map(|e| self.table.display(e)).collect()
    }

    fn emit_member(
        &self,
        w: &mut SourceWriter,
        owner: &TypeDef,
        member: &Member,
    ) -> Result<(), EmitError> {
        match member {
            Member::Field(f) => self.emit_field(w, f),
            Member::Property(p) => self.emit_property(w, owner, p),
            Member::Method(m) => self.emit_method(w, owner, m),
            Member::Ctor(c) => self.emit_ctor(w, owner, c),
            Member::Event(e) => self.emit_event(w, owner, e),
            Member::EnumValue(v) => {
                self.emit_enum_value(w, v);
                Ok(())
            }
            Member::Code(code) => {
                w.write_line(&code.text);
                Ok(())
            }
        }
    }

    /// A member's leading comment: a blank line, then a `///` line.
    fn emit_comment(&self, w: &mut SourceWriter, comment: &Option<String>) {
        if let Some(comment) = comment {
            w.write_line(&format!("\n/// {comment}"));
        }
    }

    fn emit_field(&self, w: &mut SourceWriter, field: &Field) -> Result<(), EmitError> {
        self.emit_comment(w, &field.comment);
        let mut parts: Vec<String> = Vec::new();
        if !field.name.contains('.') {
            let access = access_keyword(field.flags);
            if !access.is_empty() {
                parts.push(access.to_owned());
            }
        }
        if field.flags.intersects(MemberFlags::STATIC) {
            parts.push("static".to_owned());
        }
        parts.push(self.table.display(&field.ty)?);
        parts.push(field.name.clone());
        let mut decl = parts.join(" ");
        if let Some(init) = &field.init {
            decl.push_str(&format!(" = {init}"));
        }
        decl.push(';');
        w.write_line(&decl);
        Ok(())
    }

    fn emit_property(
        &self,
        w: &mut SourceWriter,
        owner: &TypeDef,
        prop: &Property,
    ) -> Result<(), EmitError> {
        self.emit_comment(w, &prop.comment);

        let decl = join_nonempty(&[
            member_modifiers(owner, &prop.name, prop.flags),
            self.table.display(&prop.ty)?,
            prop.name.clone(),
        ]);
        w.write_line(&decl);
        w.write_line("{");

        let ops = [("get", &prop.getter), ("set", &prop.setter)];
        for (name, op) in ops {
            let Some(op) = op else { continue };
            let vis = accessor_visibility(prop, op);
            w.write_indented(1, &join_nonempty(&[vis.to_owned(), name.to_owned()]));
            if let (Some(body), true) = (&op.body, should_emit_body(owner, prop.flags)) {
                w.append("\n");
                w.write_line_indented(1, "{");
                w.write_line_indented(2, body.trim());
                w.write_line_indented(1, "}");
            } else {
                w.append(";\n");
            }
        }
        w.write_line(&format!("}} // {}", prop.name));
        Ok(())
    }

    /// Documentation header shared by methods and constructors: a summary,
    /// one param tag per parameter, and a returns tag for non-void methods.
    fn emit_doc_header(
        &self,
        w: &mut SourceWriter,
        name: &str,
        params: &[crate::model::Param],
        returns: Option<&TypeExpr>,
    ) {
        w.write_line(&format!("/// <summary>\n/// {name}\n/// </summary>"));
        for p in params {
            w.write_line(&format!("/// <param name=\"{}\"></param>", p.name));
        }
        if returns.is_some() {
            w.write_line("/// <returns></returns>");
        }
    }

    fn emit_method(
        &self,
        w: &mut SourceWriter,
        owner: &TypeDef,
        method: &Method,
    ) -> Result<(), EmitError> {
        self.emit_comment(w, &method.comment);
        self.emit_doc_header(w, &method.name, &method.params, method.returns.as_ref());
        if method.flags.intersects(MemberFlags::DEBUG_ONLY) {
            w.write_line("[System.Diagnostics.Conditional(\"DEBUG\")]");
        }

        // Conversion operators name the target type instead of returning it.
        let returns = match &method.returns {
            Some(ty) => Some(self.table.display(ty)?),
            None if method.flags.intersects(MemberFlags::OPERATOR) => None,
            None => Some("void".to_owned()),
        };
        let mut name = method.name.clone();
        if !method.type_params.is_empty() {
            name.push_str(&format!("<{}>", method.type_params.join(", ")));
        }
        let mut parts = vec![member_modifiers(owner, &method.name, method.flags)];
        parts.extend(returns);
        parts.push(name);
        for (param, bound) in &method.constraints {
            parts.push(format!("where {param} : {bound}"));
        }
        let decl = join_nonempty(&parts);
        w.write(&format!(
            "{decl}{}",
            self.param_list(&method.params, method.flags)?
        ));

        if let (Some(body), true) = (&method.body, should_emit_body(owner, method.flags)) {
            w.append("\n");
            w.write_line("{");
            w.write_line_indented(1, body.trim());
            w.write_line(&format!("}} // {}", method.name));
        } else {
            w.append(";\n");
        }
        Ok(())
    }

    fn emit_ctor(
        &self,
        w: &mut SourceWriter,
        owner: &TypeDef,
        ctor: &Ctor,
    ) -> Result<(), EmitError> {
        // A public constructor with no body is the implicit default one.
        if ctor.flags.intersects(MemberFlags::PUBLIC) && ctor.body.is_none() {
            return Ok(());
        }
        self.emit_comment(w, &ctor.comment);
        let display = owner.display_name();
        self.emit_doc_header(w, &display, &ctor.params, None);

        let decl = join_nonempty(&[member_modifiers(owner, &display, ctor.flags), display.clone()]);
        let mut line = format!("{decl}{}", self.param_list(&ctor.params, ctor.flags)?);
        if let Some(args) = &ctor.delegation {
            line.push_str(&format!(" : this({})", args.join(", ")));
        }
        w.write(&line);

        if let (Some(body), true) = (&ctor.body, should_emit_body(owner, ctor.flags)) {
            w.append("\n");
            w.write_line("{");
            w.write_line_indented(1, body.trim());
            w.write_line("}");
        } else {
            w.append(";\n");
        }
        Ok(())
    }

    fn emit_event(&self, w: &mut SourceWriter, owner: &TypeDef, event: &Event) -> Result<(), EmitError> {
        self.emit_comment(w, &event.comment);
        let decl = join_nonempty(&[
            member_modifiers(owner, &event.name, event.flags),
            "event".to_owned(),
            self.table.display(&event.ty)?,
            event.name.clone(),
        ]);
        w.write_line(&format!("{decl};"));
        Ok(())
    }

    fn emit_enum_value(&self, w: &mut SourceWriter, value: &EnumValue) {
        if let Some(comment) = &value.comment {
            w.pad();
            w.write_line(&format!("/// {comment}"));
        }
        match value.value {
            Some(v) => w.write_line(&format!("{} = {:#x},", value.name, v)),
            None => w.write_line(&format!("{},", value.name)),
        }
    }

    fn param_list(
        &self,
        params: &[crate::model::Param],
        flags: metagen_core::flags::FlagSet<MemberFlags>,
    ) -> Result<String, EmitError> {
        let rendered = params
            .iter()
            .map(|p| Ok(format!("{} {}", self.table.display(&p.ty)?, p.name)))
            .collect::<Result<Vec<_>, EmitError>>()?;
        let this = if flags.intersects(MemberFlags::EXTENSION) {
            "this "
        } else {
            ""
        };
        Ok(format!("({this}{})", rendered.join(", ")))
    }
}

/// The modifier keywords that precede a member declaration.
///
/// A partial member is just `partial`. Visibility is omitted for explicit
/// interface implementations (dotted names) and inside interfaces; the
/// override/abstract/sealed group is likewise suppressed inside interfaces.
fn member_modifiers(
    owner: &TypeDef,
    name: &str,
    flags: metagen_core::flags::FlagSet<MemberFlags>,
) -> String {
    if flags.intersects(MemberFlags::PARTIAL) {
        return "partial".to_owned();
    }
    let mut parts: Vec<&str> = Vec::new();
    if !name.contains('.') && !owner.is_interface() {
        let access = access_keyword(flags);
        if !access.is_empty() {
            parts.push(access);
        }
    }
    let keywords: [(metagen_core::flags::FlagSet<MemberFlags>, &str); 6] = [
        (MemberFlags::STATIC, "static"),
        (MemberFlags::EXPLICIT, "explicit"),
        (MemberFlags::IMPLICIT, "implicit"),
        (MemberFlags::VIRTUAL, "virtual"),
        (MemberFlags::OPERATOR, "operator"),
        (MemberFlags::NEW, "new"),
    ];
    for (flag, keyword) in keywords {
        if flags.intersects(flag) {
            parts.push(keyword);
        }
    }
    if !owner.is_interface() {
        if flags.intersects(MemberFlags::OVERRIDE) {
            parts.push("override");
        }
        if flags.intersects(MemberFlags::ABSTRACT) {
            parts.push("abstract");
        }
        if flags.intersects(MemberFlags::SEALED) {
            parts.push("sealed");
        }
    }
    parts.join(" ")
}

/// An accessor's visibility keyword is shown only when the property itself
/// is public and the accessor narrows it.
fn accessor_visibility(prop: &Property, op: &Accessor) -> &'static str {
    if !prop.flags.intersects(MemberFlags::PUBLIC) {
        ""
    } else if (op.flags & MemberFlags::VISIBILITY) != (prop.flags & MemberFlags::VISIBILITY) {
        access_keyword(op.flags)
    } else {
        ""
    }
}

/// Bodies are suppressed for abstract and partial members and everywhere
/// inside interfaces.
fn should_emit_body(owner: &TypeDef, flags: metagen_core::flags::FlagSet<MemberFlags>) -> bool {
    !(flags.intersects(MemberFlags::ABSTRACT)
        || flags.intersects(MemberFlags::PARTIAL)
        || owner.is_interface())
}

fn join_nonempty(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}
