//! The generated half of the metadata writer.
//!
//! Each record becomes a mutable class holding its member values, with
//! structural equality, a cached hash code, a visitor hook for graph
//! traversal, and a `Save` method that serializes the members in schema
//! order. Union-typed members are stored as the record base class and
//! checked against their candidate set before serialization.

use eyre::Result;
use metagen_codegen::flags::{EnumFlags, MemberFlags};
use metagen_codegen::model::{
    Ctor, Field, Member, Method, Param, Property, TypeDef, TypeExpr, TypeId,
};
use metagen_schema::{MemberDef, MemberDefFlags, RecordDef, RecordDefFlags, Schema, TypeSpec};

use crate::context::{BuildContext, handle_name};
use crate::scenario::{GeneratedSource, Scenario, render_unit};

const NAMESPACE: &str = "Internal.Metadata.NativeFormat.Writer";

const PREAMBLE: &[&str] = &[
    "#pragma warning disable 649",
    "",
    "using System;",
    "using System.Linq;",
    "using System.IO;",
    "using System.Collections.Generic;",
    "using System.Reflection;",
    "using System.Threading;",
    "using Internal.Metadata.NativeFormat.Writer;",
    "using Internal.NativeFormat;",
    "using HandleType = Internal.Metadata.NativeFormat.HandleType;",
    "using Debug = System.Diagnostics.Debug;",
];

pub struct WriterGen;

impl Scenario for WriterGen {
    fn name(&self) -> &'static str {
        "writer"
    }

    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>> {
        let content = build(schema)?;
        Ok(vec![GeneratedSource::new(
            "NativeFormatWriterGen.cs",
            content,
        )])
    }
}

fn build(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(NAMESPACE);

    for record in &schema.records {
        let rec = define_record(&mut ctx, schema, record)?;
        ctx.table.add_to_namespace(ns, rec);
    }

    let writer = ctx.define(TypeDef::class(
        "MetadataWriter",
        EnumFlags::PUBLIC | EnumFlags::PARTIAL,
    ));
    ctx.table.add_to_namespace(ns, writer);

    Ok(render_unit(&ctx.table, ns, PREAMBLE)?)
}

fn define_record(ctx: &mut BuildContext, schema: &Schema, record: &RecordDef) -> Result<TypeId> {
    let name = &record.name;
    let hnd_name = handle_name(name);
    let hnd = ctx.type_ref(&hnd_name);
    let rec_ref = ctx.type_ref(name);
    let handle_type = ctx.type_ref("HandleType");
    let reentrant = record.flags.intersects(RecordDefFlags::REENTRANT_EQUALS);

    let mut def = TypeDef::class(name, EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    let base = record.base.as_deref().unwrap_or("MetadataRecord");
    def.base = Some(ctx.type_ref(base).into());

    if reentrant {
        def.members.add(Member::Ctor(
            Ctor::new(MemberFlags::PUBLIC).with_body(
                "_equalsReentrancyGuard = new ThreadLocal<ReentrancyGuardStack>(() => new ReentrancyGuardStack());",
            ),
        ));
    }

    def.members.add(Member::Property(Property::getter_only(
        "HandleType",
        handle_type.into(),
        MemberFlags::PUBLIC | MemberFlags::OVERRIDE,
        format!("return HandleType.{name};"),
    )));

    let visitor = ctx.type_ref("IRecordVisitor");
    def.members.add(Member::Method(
        Method::new("Visit", MemberFlags::INTERNAL | MemberFlags::OVERRIDE)
            .with_params(vec![Param::new(visitor, "visitor")])
            .with_body(visit_body(record)),
    ));

    def.members.add(Member::Method(
        Method::new(
            "Equals",
            MemberFlags::PUBLIC | MemberFlags::OVERRIDE | MemberFlags::SEALED,
        )
        .returning(TypeExpr::text("bool"))
        .with_params(vec![Param::text("Object", "obj")])
        .with_body(equals_body(schema, record)),
    ));
    if reentrant {
        let stack = ctx.type_ref("ReentrancyGuardStack");
        let guard = ctx.generic("ThreadLocal", vec![stack.into()])?;
        def.members.add(Member::Field(Field::new(
            "_equalsReentrancyGuard",
            guard,
            MemberFlags::PRIVATE,
        )));
    }

    def.members.add(Member::Method(
        Method::new(
            "GetHashCode",
            MemberFlags::PUBLIC | MemberFlags::OVERRIDE | MemberFlags::SEALED,
        )
        .returning(TypeExpr::text("int"))
        .with_body(hash_code_body(schema, record)),
    ));

    let native_writer = ctx.type_ref("NativeWriter");
    def.members.add(Member::Method(
        Method::new("Save", MemberFlags::INTERNAL | MemberFlags::OVERRIDE)
            .with_params(vec![Param::new(native_writer, "writer")])
            .with_body(save_body(schema, record)),
    ));

    def.members.add(Member::Method(
        Method::new("AsHandle", MemberFlags::INTERNAL | MemberFlags::STATIC)
            .returning(hnd)
            .with_params(vec![Param::new(rec_ref, "record")])
            .with_body(format!(
                "if (record == null)\n\
                 {{\n    \
                 return new {hnd_name}(0);\n\
                 }}\n\
                 else\n\
                 {{\n    \
                 return record.Handle;\n\
                 }}"
            )),
    ));

    // Null string record values serialize as the null handle, so the empty
    // and null strings stay distinguishable.
    let handle_body = if schema.is_string_record(name) {
        format!(
            "if (Value == null)\n    \
             return new {hnd_name}(0);\n\
             else\n    \
             return new {hnd_name}(HandleOffset);"
        )
    } else {
        format!("return new {hnd_name}(HandleOffset);")
    };
    def.members.add(Member::Property(Property::getter_only(
        "Handle",
        hnd.into(),
        MemberFlags::INTERNAL | MemberFlags::NEW,
        handle_body,
    )));

    for member in &record.members {
        if member.flags.intersects(MemberDefFlags::NOT_PERSISTED) {
            continue;
        }
        let ty = ctx.writer_member_type(member)?;
        let mut field = Field::new(
            &member.name,
            ty.clone(),
            MemberFlags::PUBLIC | MemberFlags::SERIALIZE,
        );
        if member
            .flags
            .intersects(MemberDefFlags::MAP | MemberDefFlags::LIST)
        {
            field = field.with_init(format!("new {}()", ctx.display(&ty)?));
        }
        def.members.add(Member::Field(field));
    }

    Ok(ctx.define(def))
}

/// The writer-side element type name of a member. Unions and the generic
/// handle collapse to the record base class.
fn element_name(member: &MemberDef) -> &str {
    match &member.ty {
        None => "int",
        Some(TypeSpec::Union(_)) => "MetadataRecord",
        Some(TypeSpec::Named(name)) => {
            if member.is_record_ref() && name == "Handle" {
                "MetadataRecord"
            } else {
                name
            }
        }
    }
}

/// Primitives and enums compare and hash by value.
fn is_value_type(schema: &Schema, name: &str) -> bool {
    schema.primitives.contains_key(name)
        || schema.enum_types.contains_key(name)
        || schema.enums.iter().any(|e| e.name == name)
}

fn compared_members<'a>(
    schema: &'a Schema,
    record: &'a RecordDef,
) -> impl Iterator<Item = &'a MemberDef> {
    let custom = record.flags.intersects(RecordDefFlags::CUSTOM_COMPARE);
    record.members.iter().filter(move |m| {
        !m.flags.intersects(MemberDefFlags::NOT_PERSISTED)
            && (m.flags.intersects(MemberDefFlags::COMPARE) || !custom)
    })
}

/// Child members are rewritten first so the visitor sees owned records
/// before cross-references to them.
fn visit_body(record: &RecordDef) -> String {
    let mut members: Vec<&MemberDef> = record.members.iter().collect();
    members.sort_by_key(|m| !m.flags.intersects(MemberDefFlags::CHILD));

    let mut lines = Vec::new();
    for member in members {
        if !member.is_record_ref() {
            continue;
        }
        let n = &member.name;
        let child = member.flags.intersects(MemberDefFlags::CHILD);
        let line = if member.is_collection() {
            if child {
                format!("{n} = visitor.Visit(this, {n}.AsEnumerable());")
            } else {
                format!("{n} = {n}.Select(value => visitor.Visit(this, value)).ToList();")
            }
        } else if child {
            format!("{n} = visitor.Visit(this, {n}.AsSingleEnumerable()).FirstOrDefault();")
        } else {
            format!("{n} = visitor.Visit(this, {n});")
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn equals_body(schema: &Schema, record: &RecordDef) -> String {
    let name = &record.name;
    let reentrant = record.flags.intersects(RecordDefFlags::REENTRANT_EQUALS);
    let mut body = format!(
        "if (Object.ReferenceEquals(this, obj)) return true;\n\
         var other = obj as {name};\n\
         if (other == null) return false;"
    );
    if reentrant {
        body.push_str(
            "\nif (_equalsReentrancyGuard.Value.Contains(other))\n    \
             return true;\n\
             _equalsReentrancyGuard.Value.Push(other);\n\
             try\n{",
        );
    }
    for member in compared_members(schema, record) {
        let n = &member.name;
        if member.is_collection() {
            body.push_str(&format!("\nif (!{n}.SequenceEqual(other.{n})) return false;"));
        } else if is_value_type(schema, element_name(member)) {
            body.push_str(&format!("\nif ({n} != other.{n}) return false;"));
        } else {
            body.push_str(&format!("\nif (!Object.Equals({n}, other.{n})) return false;"));
        }
    }
    if reentrant {
        body.push_str(
            "\n}\nfinally\n{\n    \
             var popped = _equalsReentrancyGuard.Value.Pop();\n    \
             Debug.Assert(Object.ReferenceEquals(other, popped));\n}",
        );
    }
    body.push_str("\nreturn true;");
    body
}

/// Stable per-record hash seed. The seed only has to be deterministic and
/// well spread; the record name is as good a source as any.
fn hash_seed(name: &str) -> i32 {
    let mut h: i32 = 0;
    for b in name.bytes() {
        h = h.wrapping_mul(31).wrapping_add(b as i32);
    }
    h
}

fn hash_code_body(schema: &Schema, record: &RecordDef) -> String {
    let mut body = format!(
        "if (_hash != 0)\n    \
         return _hash;\n\
         EnterGetHashCode();\n\
         int hash = {};",
        hash_seed(&record.name)
    );
    // Hash contributions are chosen so GetHashCode never re-enters through
    // a record cycle.
    for member in compared_members(schema, record) {
        let n = &member.name;
        let elem = element_name(member);
        if !member.is_collection() {
            if is_value_type(schema, elem) && !schema.is_string_record(elem) && elem != "string" {
                body.push_str(&format!(
                    "\nhash = ((hash << 13) - (hash >> 19)) ^ {n}.GetHashCode();"
                ));
            } else {
                body.push_str(&format!(
                    "\nhash = ((hash << 13) - (hash >> 19)) ^ ({n} == null ? 0 : {n}.GetHashCode());"
                ));
            }
        } else if member.flags.intersects(MemberDefFlags::ARRAY) && schema.primitives.contains_key(elem)
        {
            body.push_str(&format!(
                "\nif ({n} != null)\n\
                 {{\n    \
                 for (int i = 0; i < {n}.Length; i++)\n    \
                 {{\n        \
                 hash = ((hash << 13) - (hash >> 19)) ^ {n}[i].GetHashCode();\n    \
                 }}\n\
                 }}"
            ));
        } else if member.flags.intersects(MemberDefFlags::LIST)
            && member
                .flags
                .intersects(MemberDefFlags::ENUMERATE_FOR_HASH_CODE)
        {
            body.push_str(&format!(
                "\nif ({n} != null)\n\
                 {{\n    \
                 for (int i = 0; i < {n}.Count; i++)\n    \
                 {{\n        \
                 hash = ((hash << 13) - (hash >> 19)) ^ ({n}[i] == null ? 0 : {n}[i].GetHashCode());\n    \
                 }}\n\
                 }}"
            ));
        }
    }
    body.push_str("\nLeaveGetHashCode();\n_hash = hash;\nreturn _hash;");
    body
}

fn save_body(schema: &Schema, record: &RecordDef) -> String {
    let mut lines = Vec::new();
    if schema.is_string_record(&record.name) {
        lines.push("if (Value == null)\n    return;".to_owned());
    }
    for member in &record.members {
        if member.flags.intersects(MemberDefFlags::NOT_PERSISTED) {
            continue;
        }
        let n = &member.name;
        if let Some(TypeSpec::Union(candidates)) = &member.ty {
            if member.is_record_ref() {
                lines.push(union_assert(n, candidates, member));
            }
        }
        lines.push(format!("writer.Write({n});"));
    }
    lines.join("\n")
}

/// Union members store the record base class; assert the value really is
/// one of the candidates before serializing its handle.
fn union_assert(name: &str, candidates: &[String], member: &MemberDef) -> String {
    let sequence = member.flags.intersects(MemberDefFlags::SEQUENCE);
    let value = if sequence { "handle" } else { name };
    let mut checks = vec![format!("{value} == null")];
    checks.extend(
        candidates
            .iter()
            .map(|c| format!("{value}.HandleType == HandleType.{c}")),
    );
    let joined = checks.join(" ||\n    ");
    if sequence {
        format!("Debug.Assert({name}.TrueForAll(handle => {joined}));")
    } else {
        format!("Debug.Assert({joined});")
    }
}
