//! The generated half of the metadata reader.
//!
//! Emits the partial structs that satisfy the contract interfaces: records
//! with their serialized fields and surfacing properties, handles with
//! equality, validation and conversion members, and the decode methods on
//! `MetadataReader` that walk a record's fields off the byte stream.

use eyre::Result;
use metagen_codegen::flags::{EnumFlags, MemberFlags};
use metagen_codegen::model::{
    Ctor, Field, Member, Method, Param, Property, TypeDef, TypeExpr, TypeId,
};
use metagen_core::private_name;
use metagen_schema::{MemberDefFlags, RecordDef, Schema};

use crate::context::{BuildContext, handle_name, union_comment};
use crate::scenario::{GeneratedSource, Scenario, render_unit};

const NAMESPACE: &str = "Internal.Metadata.NativeFormat";

const PREAMBLE: &[&str] = &[
    "#pragma warning disable 649",
    "#pragma warning disable 169",
    "#pragma warning disable 282 // There is no defined ordering between fields in multiple declarations of partial class or struct",
    "",
    "using System;",
    "using System.Reflection;",
    "using System.Collections.Generic;",
];

pub struct ReaderGen;

impl Scenario for ReaderGen {
    fn name(&self) -> &'static str {
        "reader"
    }

    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>> {
        let content = build(schema)?;
        Ok(vec![GeneratedSource::new(
            "NativeFormatReaderGen.cs",
            content,
        )])
    }
}

fn build(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(NAMESPACE);

    let imetadata_reader = ctx.type_ref("IMetadataReader");
    let mut reader_def = TypeDef::class("MetadataReader", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    reader_def.interfaces.push(imetadata_reader.into());
    let reader = ctx.define(reader_def);
    ctx.table.add_to_namespace(ns, reader);

    // Handle structs first so record fields can name them.
    let mut handle_ids = Vec::new();
    for record in &schema.records {
        let hnd = ctx.define(TypeDef::strukt(
            handle_name(&record.name),
            EnumFlags::PUBLIC | EnumFlags::PARTIAL,
        ));
        handle_ids.push(hnd);
        ctx.table.add_to_namespace(ns, hnd);
    }

    for (record, &hnd) in schema.records.iter().zip(&handle_ids) {
        let rec = define_record(&mut ctx, record, reader, hnd)?;
        ctx.table.add_to_namespace(ns, rec);
        fill_handle_members(&mut ctx, &record.name, hnd, reader);
    }

    let base_handle = define_base_handle(&mut ctx, schema, reader);
    ctx.table.add_to_namespace(ns, base_handle);

    fill_reader_members(&mut ctx, schema, reader)?;

    Ok(render_unit(&ctx.table, ns, PREAMBLE)?)
}

/// The partial record struct: reader back-pointer, handle, and one
/// (property, serialized field) pair per persisted member.
fn define_record(
    ctx: &mut BuildContext,
    record: &RecordDef,
    reader: TypeId,
    hnd: TypeId,
) -> Result<TypeId> {
    let mut def = TypeDef::strukt(&record.name, EnumFlags::PUBLIC | EnumFlags::PARTIAL);

    def.members.add(Member::Field(Field::new(
        "_reader",
        reader.into(),
        MemberFlags::INTERNAL,
    )));
    def.members.add(Member::Field(Field::new(
        "_handle",
        hnd.into(),
        MemberFlags::INTERNAL,
    )));
    def.members.add(Member::Property(Property::getter_only(
        "Handle",
        hnd.into(),
        MemberFlags::PUBLIC,
        "return _handle;",
    )));

    for member in &record.members {
        if member.flags.intersects(MemberDefFlags::NOT_PERSISTED) {
            continue;
        }
        let field_name = private_name(&member.name);
        let field_ty = ctx.reader_field_type(member)?;

        let mut prop = if member.is_collection() {
            let elem = ctx.handle_element(member);
            let surface = ctx.enumerable_of(elem)?;
            let cast = ctx.display(&surface)?;
            Property::getter_only(
                &member.name,
                surface,
                MemberFlags::PUBLIC,
                format!("return ({cast}){field_name};"),
            )
        } else {
            Property::getter_only(
                &member.name,
                field_ty.clone(),
                MemberFlags::PUBLIC,
                format!("return {field_name};"),
            )
        };
        prop.comment = union_comment(member);
        def.members.add(Member::Property(prop));
        def.members.add(Member::Field(Field::new(
            field_name,
            field_ty,
            MemberFlags::INTERNAL | MemberFlags::SERIALIZE,
        )));
    }

    Ok(ctx.define(def))
}

/// Equality, construction, validation and conversion members of one handle
/// struct.
fn fill_handle_members(ctx: &mut BuildContext, record: &str, hnd: TypeId, reader: TypeId) {
    let name = handle_name(record);
    let base_handle = ctx.type_ref("Handle");
    let rec = ctx.type_ref(record);
    let mut members: Vec<Member> = Vec::new();

    members.push(Member::Method(
        Method::new("Equals", MemberFlags::PUBLIC | MemberFlags::OVERRIDE)
            .returning(TypeExpr::text("bool"))
            .with_params(vec![Param::text("object", "obj")])
            .with_body(format!(
                "if (obj is {name})\n    \
                 return _value == (({name})obj)._value;\n\
                 else if (obj is Handle)\n    \
                 return _value == ((Handle)obj)._value;\n\
                 else\n    \
                 return false;"
            )),
    ));
    members.push(Member::Method(
        Method::new("Equals", MemberFlags::PUBLIC)
            .returning(TypeExpr::text("bool"))
            .with_params(vec![Param::new(hnd, "handle")])
            .with_body("return _value == handle._value;"),
    ));
    members.push(Member::Method(
        Method::new("Equals", MemberFlags::PUBLIC)
            .returning(TypeExpr::text("bool"))
            .with_params(vec![Param::new(base_handle, "handle")])
            .with_body("return _value == handle._value;"),
    ));
    members.push(Member::Method(
        Method::new("GetHashCode", MemberFlags::PUBLIC | MemberFlags::OVERRIDE)
            .returning(TypeExpr::text("int"))
            .with_body("return (int)_value;"),
    ));
    members.push(Member::Field(Field::new(
        "_value",
        TypeExpr::text("int"),
        MemberFlags::INTERNAL,
    )));

    members.push(Member::Ctor(
        Ctor::new(MemberFlags::INTERNAL)
            .with_params(vec![Param::new(base_handle, "handle")])
            .delegating_to(vec!["handle._value".to_owned()])
            .with_body(""),
    ));
    members.push(Member::Ctor(
        Ctor::new(MemberFlags::INTERNAL)
            .with_params(vec![Param::text("int", "value")])
            .with_body(format!(
                "HandleType hType = (HandleType)(value >> 24);\n\
                 if (!(hType == 0 || hType == HandleType.{record} || hType == HandleType.Null))\n    \
                 throw new ArgumentException();\n\
                 _value = (value & 0x00FFFFFF) | (((int)HandleType.{record}) << 24);\n\
                 _Validate();"
            )),
    ));

    members.push(Member::Method(
        Method::new(
            "Handle",
            MemberFlags::PUBLIC
                | MemberFlags::STATIC
                | MemberFlags::IMPLICIT
                | MemberFlags::OPERATOR,
        )
        .with_params(vec![Param::new(hnd, "handle")])
        .with_body("return new Handle(handle._value);"),
    ));

    members.push(Member::Property(Property::getter_only(
        "Offset",
        TypeExpr::text("int"),
        MemberFlags::INTERNAL,
        "return (this._value & 0x00FFFFFF);",
    )));

    members.push(Member::Method(
        Method::new(format!("Get{record}"), MemberFlags::PUBLIC)
            .returning(rec)
            .with_params(vec![Param::new(reader, "reader")])
            .with_body(format!("return reader.Get{record}(this);")),
    ));
    members.push(Member::Method(
        Method::new("IsNull", MemberFlags::PUBLIC)
            .returning(TypeExpr::text("bool"))
            .with_params(vec![Param::new(reader, "reader")])
            .with_body("return reader.IsNull(this);"),
    ));
    members.push(Member::Method(
        Method::new("ToHandle", MemberFlags::PUBLIC)
            .returning(base_handle)
            .with_params(vec![Param::new(reader, "reader")])
            .with_body("return reader.ToHandle(this);"),
    ));
    members.push(Member::Method(
        Method::new("_Validate", MemberFlags::INTERNAL | MemberFlags::DEBUG_ONLY).with_body(
            format!(
                "if ((HandleType)((_value & 0xFF000000) >> 24) != HandleType.{record})\n    \
                 throw new ArgumentException();"
            ),
        ),
    ));
    members.push(Member::Method(
        Method::new("ToString", MemberFlags::PUBLIC | MemberFlags::OVERRIDE)
            .returning(TypeExpr::text("string"))
            .with_body("return String.Format(\"{0:X8}\", _value);"),
    ));

    ctx.table.def_mut(hnd).members.extend(members);
}

/// The generic handle's typed conversion helpers.
fn define_base_handle(ctx: &mut BuildContext, schema: &Schema, reader: TypeId) -> TypeId {
    let mut def = TypeDef::strukt("Handle", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    for record in schema.handle_records() {
        let name = handle_name(record);
        let hnd = ctx.type_ref(&name);
        def.members.add(Member::Method(
            Method::new(format!("To{name}"), MemberFlags::PUBLIC)
                .returning(hnd)
                .with_params(vec![Param::new(reader, "reader")])
                .with_body(format!("return new {name}(this);")),
        ));
    }
    ctx.define(def)
}

/// Decode and conversion members of `MetadataReader`.
fn fill_reader_members(ctx: &mut BuildContext, schema: &Schema, reader: TypeId) -> Result<()> {
    let base_handle = ctx.type_ref("Handle");
    let mut members: Vec<Member> = Vec::new();

    for record in &schema.records {
        let rec = ctx.type_ref(&record.name);
        let hnd = ctx.type_ref(&handle_name(&record.name));
        members.push(Member::Method(
            Method::new(format!("Get{}", record.name), MemberFlags::PUBLIC)
                .returning(rec)
                .with_params(vec![Param::new(hnd, "handle")])
                .with_body(decode_body(schema, record)),
        ));
    }

    for record in schema.handle_records() {
        let name = handle_name(record);
        let hnd = ctx.type_ref(&name);
        members.push(Member::Method(
            Method::new(format!("To{name}"), MemberFlags::INTERNAL)
                .returning(hnd)
                .with_params(vec![Param::new(base_handle, "handle")])
                .with_body(format!("return new {name}(handle._value);")),
        ));
        members.push(Member::Method(
            Method::new("ToHandle", MemberFlags::INTERNAL)
                .returning(base_handle)
                .with_params(vec![Param::new(hnd, "handle")])
                .with_body("return new Handle(handle._value);"),
        ));
    }

    for record in schema.handle_records() {
        let hnd = ctx.type_ref(&handle_name(record));
        members.push(Member::Method(
            Method::new("IsNull", MemberFlags::INTERNAL)
                .returning(TypeExpr::text("bool"))
                .with_params(vec![Param::new(hnd, "handle")])
                .with_body("return (handle._value & 0x00FFFFFF) == 0;"),
        ));
    }

    ctx.table.def_mut(reader).members.extend(members);
    Ok(())
}

/// The offset-walking body of `Get{Record}`. Null handles of string records
/// promote to a record whose `Value` is null.
fn decode_body(schema: &Schema, record: &RecordDef) -> String {
    let name = &record.name;
    let mut body = String::new();
    if schema.is_string_record(name) {
        body.push_str(&format!("if (IsNull(handle))\n    return new {name}();\n"));
    }
    body.push_str(&format!(
        "var record = new {name}() {{ _reader = this, _handle = handle }};\n\
         var offset = (uint)handle.Offset;"
    ));
    for member in &record.members {
        if member.flags.intersects(MemberDefFlags::NOT_PERSISTED) {
            continue;
        }
        body.push_str(&format!(
            "\noffset = _streamReader.Read(offset, out record.{});",
            private_name(&member.name)
        ));
    }
    body.push_str("\nreturn record;");
    body
}

#[cfg(test)]
mod tests {
    use metagen_core::flags::FlagSet;
    use metagen_schema::{MemberDef, TypeSpec};

    use super::*;

    fn schema() -> Schema {
        Schema {
            primitives: [("string".to_owned(), "String".to_owned())]
                .into_iter()
                .collect(),
            enum_types: Default::default(),
            enums: Vec::new(),
            records: vec![
                RecordDef::new(
                    "ConstantStringValue",
                    FlagSet::EMPTY,
                    vec![MemberDef::new(
                        "Value",
                        TypeSpec::named("string"),
                        FlagSet::EMPTY,
                    )],
                ),
                RecordDef::new(
                    "Method",
                    FlagSet::EMPTY,
                    vec![
                        MemberDef::new(
                            "Name",
                            TypeSpec::named("ConstantStringValue"),
                            MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD | MemberDefFlags::NAME,
                        ),
                        MemberDef::new(
                            "Parameters",
                            TypeSpec::named("Parameter"),
                            MemberDefFlags::LIST | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
                        ),
                        MemberDef::new("Cached", TypeSpec::named("bool"), MemberDefFlags::NOT_PERSISTED),
                    ],
                ),
            ],
            string_records: vec!["ConstantStringValue".to_owned()],
        }
    }

    #[test]
    fn decode_methods_walk_serialized_fields() {
        let out = build(&schema()).unwrap();
        assert!(out.contains("public Method GetMethod(MethodHandle handle)"));
        assert!(out.contains("offset = _streamReader.Read(offset, out record._name);"));
        assert!(out.contains("offset = _streamReader.Read(offset, out record._parameters);"));
        // NotPersisted members never hit the stream.
        assert!(!out.contains("record._cached"));
    }

    #[test]
    fn string_records_promote_null_handles() {
        let out = build(&schema()).unwrap();
        assert!(out.contains("if (IsNull(handle))\n                return new ConstantStringValue();"));
    }

    #[test]
    fn collections_surface_as_enumerables() {
        let out = build(&schema()).unwrap();
        assert!(out.contains("internal ParameterHandle[] _parameters;"));
        assert!(out.contains("IEnumerable<ParameterHandle> Parameters"));
        assert!(out.contains("return (IEnumerable<ParameterHandle>)_parameters;"));
    }

    #[test]
    fn handles_carry_equality_and_validation() {
        let out = build(&schema()).unwrap();
        assert!(out.contains("public static implicit operator Handle(MethodHandle handle)"));
        assert!(out.contains("[System.Diagnostics.Conditional(\"DEBUG\")]"));
        assert!(out.contains("internal MethodHandle(Handle handle) : this(handle._value)"));
        assert!(out.contains("!= HandleType.Method)"));
        assert!(out.contains("public override string ToString()"));
    }

    #[test]
    fn base_handle_offers_typed_conversions() {
        let out = build(&schema()).unwrap();
        assert!(out.contains("public MethodHandle ToMethodHandle(MetadataReader reader)"));
        assert!(out.contains("return new MethodHandle(this);"));
        assert!(out.contains("internal Handle ToHandle(MethodHandle handle)"));
        assert!(out.contains("return (handle._value & 0x00FFFFFF) == 0;"));
    }
}
