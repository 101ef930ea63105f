//! The public reader contract.
//!
//! For every schema record this emits an (interface, partial struct) pair for
//! the record itself and another pair for the handle that references it. The
//! interfaces are internal and exist to force the hand-written reader to
//! supply every declared member; the structs stay empty here. The file also
//! carries the schema's enums, the `HandleType` discriminator, and the
//! `IMetadataReader` surface.

use eyre::Result;
use metagen_codegen::emit::assign_enum_values;
use metagen_codegen::flags::{EnumFlags, MemberFlags};
use metagen_codegen::model::{
    EnumValue, Field, Member, Method, NsId, Param, Property, TypeDef, TypeExpr, TypeId,
};
use metagen_core::private_name;
use metagen_schema::{RecordDefFlags, Schema};

use crate::context::{BuildContext, handle_name, union_comment};
use crate::scenario::{GeneratedSource, Scenario, render_unit};

const NAMESPACE: &str = "Internal.Metadata.NativeFormat";

const PREAMBLE: &[&str] = &[
    "using System;",
    "using System.Reflection;",
    "using System.Collections.Generic;",
    "",
    "#pragma warning disable 108",
    "#pragma warning disable 3009",
    "#pragma warning disable 282",
];

pub struct ContractGen;

impl Scenario for ContractGen {
    fn name(&self) -> &'static str {
        "contract"
    }

    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>> {
        let content = build(schema)?;
        Ok(vec![GeneratedSource::new(
            "NativeFormatReaderCommonGen.cs",
            content,
        )])
    }
}

fn build(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(NAMESPACE);

    define_schema_enums(&mut ctx, schema, ns)?;
    define_handle_type_enum(&mut ctx, schema, ns)?;

    // Reader surface and the generic handle come first so the per-record
    // types can reference them.
    let imetadata_reader = ctx.define(TypeDef::interface("IMetadataReader", EnumFlags::PUBLIC));
    let mut reader = TypeDef::class("MetadataReader", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    reader.interfaces.push(imetadata_reader.into());
    let reader = ctx.define(reader);

    let ihandle = ctx.define(TypeDef::interface("Handle", EnumFlags::INTERNAL));
    let mut handle = TypeDef::strukt("Handle", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    handle.interfaces.push(ihandle.into());
    let handle = ctx.define(handle);

    let eq_handle = ctx.generic("IEquatable", vec![handle.into()])?;
    let eq_object = ctx.generic("IEquatable", vec![TypeExpr::text("Object")])?;
    ctx.table.def_mut(ihandle).interfaces = vec![eq_handle.clone(), eq_object.clone()];

    for id in [imetadata_reader, reader, ihandle, handle] {
        ctx.table.add_to_namespace(ns, id);
    }

    let mut handles = Vec::new();
    for record in &schema.records {
        let pair = define_handle_pair(&mut ctx, &record.name, handle, reader)?;
        handles.push((record, pair));
    }
    for &(record, (_, hnd)) in &handles {
        define_record_pair(&mut ctx, ns, record, hnd)?;
    }
    let ids: Vec<TypeId> = handles
        .iter()
        .flat_map(|&(_, (ihnd, hnd))| [ihnd, hnd])
        .collect();
    for id in ids {
        ctx.table.add_to_namespace(ns, id);
    }

    fill_base_handle_members(&mut ctx, schema, ihandle, reader)?;
    fill_reader_members(&mut ctx, schema, imetadata_reader, handle)?;

    Ok(render_unit(&ctx.table, ns, PREAMBLE)?)
}

fn define_schema_enums(
    ctx: &mut BuildContext,
    schema: &Schema,
    ns: NsId,
) -> Result<()> {
    for e in &schema.enums {
        let mut flags = EnumFlags::PUBLIC;
        if e.flags.intersects(RecordDefFlags::FLAGS) {
            flags = flags | EnumFlags::HAS_FLAG_VALUES;
        }
        let mut def = TypeDef::enumeration(&e.name, flags);
        def.underlying = e.base.clone().map(TypeExpr::text);
        def.comment = e.comment.clone();
        for m in &e.members {
            let mut value = EnumValue::new(&m.name);
            value.value = m.value;
            value.comment = m.comment.clone();
            def.members.add(Member::EnumValue(value));
        }
        assign_enum_values(&mut def)?;
        let id = ctx.define(def);
        ctx.table.add_to_namespace(ns, id);
    }
    Ok(())
}

/// `HandleType`: `Null` plus one value per record, sorted by name.
fn define_handle_type_enum(
    ctx: &mut BuildContext,
    schema: &Schema,
    ns: NsId,
) -> Result<()> {
    let mut def = TypeDef::enumeration("HandleType", EnumFlags::PUBLIC);
    def.underlying = Some(TypeExpr::text("byte"));
    def.members.add(Member::EnumValue(EnumValue::new("Null")));
    let mut names: Vec<&str> = schema.handle_records().collect();
    names.sort_unstable();
    for name in names {
        def.members.add(Member::EnumValue(EnumValue::new(name)));
    }
    assign_enum_values(&mut def)?;
    let id = ctx.define(def);
    ctx.table.add_to_namespace(ns, id);
    Ok(())
}

/// The internal handle interface and the public partial handle struct of one
/// record.
fn define_handle_pair(
    ctx: &mut BuildContext,
    record: &str,
    base_handle: TypeId,
    reader: TypeId,
) -> Result<(TypeId, TypeId)> {
    let name = handle_name(record);

    let hnd = ctx.define(TypeDef::strukt(
        &name,
        EnumFlags::PUBLIC | EnumFlags::PARTIAL,
    ));

    let mut ihnd = TypeDef::interface(&name, EnumFlags::INTERNAL);
    ihnd.interfaces = vec![
        ctx.generic("IEquatable", vec![hnd.into()])?,
        ctx.generic("IEquatable", vec![base_handle.into()])?,
        ctx.generic("IEquatable", vec![TypeExpr::text("Object")])?,
    ];
    ihnd.members.add(Member::Method(
        Method::new("ToHandle", MemberFlags::PUBLIC | MemberFlags::ABSTRACT)
            .returning(base_handle)
            .with_params(vec![Param::new(reader, "reader")])
            .bodiless(),
    ));
    ihnd.members.add(Member::Method(
        Method::new("GetHashCode", MemberFlags::PUBLIC | MemberFlags::ABSTRACT)
            .returning(TypeExpr::text("int"))
            .bodiless(),
    ));
    let ihnd = ctx.define(ihnd);
    ctx.table.def_mut(hnd).interfaces.push(ihnd.into());

    Ok((ihnd, hnd))
}

/// The internal record interface and the public partial record struct.
fn define_record_pair(
    ctx: &mut BuildContext,
    ns: NsId,
    record: &metagen_schema::RecordDef,
    hnd: TypeId,
) -> Result<()> {
    let mut irec = TypeDef::interface(&record.name, EnumFlags::INTERNAL);

    for member in &record.members {
        let field_ty = ctx.reader_field_type(member)?;
        irec.members.add(Member::Field(Field::new(
            private_name(&member.name),
            field_ty,
            MemberFlags::INTERNAL | MemberFlags::SERIALIZE,
        )));
        let surface = if member.is_collection() {
            let elem = ctx.handle_element(member);
            ctx.enumerable_of(elem)?
        } else {
            ctx.handle_element(member)
        };
        let mut prop = Property::abstract_getter(&member.name, surface, MemberFlags::PUBLIC);
        prop.comment = union_comment(member);
        irec.members.add(Member::Property(prop));
    }
    irec.members.add(Member::Property(Property::abstract_getter(
        "Handle",
        hnd.into(),
        MemberFlags::PUBLIC,
    )));
    let irec = ctx.define(irec);

    let mut rec = TypeDef::strukt(&record.name, EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    rec.interfaces.push(irec.into());
    let rec = ctx.define(rec);

    ctx.table.add_to_namespace(ns, irec);
    ctx.table.add_to_namespace(ns, rec);
    Ok(())
}

/// Conversion and discrimination members of the generic handle interface.
fn fill_base_handle_members(
    ctx: &mut BuildContext,
    schema: &Schema,
    ihandle: TypeId,
    reader: TypeId,
) -> Result<()> {
    let handle_type = ctx.type_ref("HandleType");
    let mut members = vec![Member::Method(
        Method::new("GetHandleType", MemberFlags::PUBLIC | MemberFlags::ABSTRACT)
            .returning(handle_type)
            .with_params(vec![Param::new(reader, "reader")])
            .bodiless(),
    )];
    for record in schema.handle_records() {
        let hnd = ctx.type_ref(&handle_name(record));
        members.push(Member::Method(
            Method::new(
                format!("To{}", handle_name(record)),
                MemberFlags::PUBLIC | MemberFlags::ABSTRACT,
            )
            .returning(hnd)
            .with_params(vec![Param::new(reader, "reader")])
            .bodiless(),
        ));
    }
    ctx.table.def_mut(ihandle).members.extend(members);
    Ok(())
}

/// Per-record decode methods and the reader's root properties.
fn fill_reader_members(
    ctx: &mut BuildContext,
    schema: &Schema,
    imetadata_reader: TypeId,
    handle: TypeId,
) -> Result<()> {
    let mut members = Vec::new();
    for record in schema.handle_records() {
        let rec = ctx.type_ref(record);
        let hnd = ctx.type_ref(&handle_name(record));
        members.push(Member::Method(
            Method::new(
                format!("Get{record}"),
                MemberFlags::PUBLIC | MemberFlags::ABSTRACT,
            )
            .returning(rec)
            .with_params(vec![Param::new(hnd, "handle")])
            .bodiless(),
        ));
    }
    if schema.record("ScopeDefinition").is_some() {
        let hnd = ctx.type_ref("ScopeDefinitionHandle");
        let ty = ctx.enumerable_of(hnd.into())?;
        members.push(Member::Property(Property::abstract_getter(
            "ScopeDefinitions",
            ty,
            MemberFlags::PUBLIC | MemberFlags::ABSTRACT,
        )));
    }
    members.push(Member::Property(Property::abstract_getter(
        "NullHandle",
        handle.into(),
        MemberFlags::PUBLIC | MemberFlags::ABSTRACT,
    )));
    ctx.table.def_mut(imetadata_reader).members.extend(members);
    Ok(())
}

#[cfg(test)]
mod tests {
    use metagen_core::flags::FlagSet;
    use metagen_schema::{MemberDef, MemberDefFlags, RecordDef, TypeSpec};

    use super::*;

    fn point_schema() -> Schema {
        Schema {
            primitives: [("int".to_owned(), "Int32".to_owned())].into_iter().collect(),
            enum_types: Default::default(),
            enums: Vec::new(),
            records: vec![RecordDef::new(
                "Point",
                FlagSet::EMPTY,
                vec![
                    MemberDef::new("X", TypeSpec::named("int"), FlagSet::EMPTY),
                    MemberDef::new("Y", TypeSpec::named("int"), FlagSet::EMPTY),
                ],
            )],
            string_records: Vec::new(),
        }
    }

    #[test]
    fn emits_record_and_handle_pairs() {
        let out = build(&point_schema()).unwrap();
        assert!(out.contains("internal interface IPoint"));
        assert!(out.contains("public partial struct Point : IPoint"));
        assert!(out.contains(
            "internal interface IPointHandle : IEquatable<PointHandle>, IEquatable<Handle>, IEquatable<Object>"
        ));
        assert!(out.contains("public partial struct PointHandle : IPointHandle"));
        // Interfaces carry properties but never serialized fields.
        assert!(out.contains("int X\n"));
        assert!(!out.contains("_x;"));
    }

    #[test]
    fn handle_type_enum_lists_null_first() {
        let out = build(&point_schema()).unwrap();
        let e = out
            .find("public enum HandleType : byte")
            .expect("HandleType enum");
        let body = &out[e..out[e..].find("} // HandleType").unwrap() + e];
        assert!(body.contains("Null = 0x0,"));
        assert!(body.contains("Point = 0x1,"));
    }

    #[test]
    fn reader_surface_declares_decode_methods() {
        let out = build(&point_schema()).unwrap();
        assert!(out.contains("public interface IMetadataReader"));
        assert!(out.contains("Point GetPoint(PointHandle handle);"));
        assert!(out.contains("Handle NullHandle\n"));
        assert!(out.contains("public partial class MetadataReader : IMetadataReader"));
        // No ScopeDefinition record, no ScopeDefinitions property.
        assert!(!out.contains("ScopeDefinitions"));
    }

    #[test]
    fn output_is_deterministic() {
        let a = build(&point_schema()).unwrap();
        let b = build(&point_schema()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn starts_with_banner_and_preamble() {
        let out = build(&point_schema()).unwrap();
        assert!(out.starts_with(
            "// NOTE: This is a generated file - do not manually edit!\n\nusing System;\n"
        ));
        assert!(out.contains("#pragma warning disable 108\n"));
    }
}
