//! Extension-method codecs for the low-level byte stream.
//!
//! Two files come out of this scenario: `MdBinaryReader` decodes primitive
//! arrays, enums and handles off a `NativeReader`, and `MdBinaryWriter`
//! encodes the corresponding values onto a `NativeWriter`. Record handles
//! serialize as their unsigned offset; empty handle arrays decode to shared
//! instances.

use eyre::Result;
use metagen_codegen::flags::{EnumFlags, MemberFlags};
use metagen_codegen::model::{Field, Member, Method, Param, TypeDef, TypeExpr};
use metagen_schema::Schema;

use crate::context::{BuildContext, handle_name};
use crate::scenario::{GeneratedSource, Scenario, render_unit};

const READER_NAMESPACE: &str = "Internal.Metadata.NativeFormat";
const WRITER_NAMESPACE: &str = "Internal.Metadata.NativeFormat.Writer";

const READER_PREAMBLE: &[&str] = &[
    "#pragma warning disable 649",
    "",
    "using System;",
    "using System.IO;",
    "using System.Collections.Generic;",
    "using System.Reflection;",
    "using Internal.NativeFormat;",
    "using Debug = System.Diagnostics.Debug;",
];

const WRITER_PREAMBLE: &[&str] = &[
    "#pragma warning disable 649",
    "",
    "using System;",
    "using System.IO;",
    "using System.Collections.Generic;",
    "using System.Reflection;",
    "using Internal.LowLevelLinq;",
    "using Internal.NativeFormat;",
    "using Debug = System.Diagnostics.Debug;",
];

pub struct BinaryGen;

impl Scenario for BinaryGen {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>> {
        Ok(vec![
            GeneratedSource::new("MdBinaryReaderGen.cs", build_reader(schema)?),
            GeneratedSource::new("MdBinaryWriterGen.cs", build_writer(schema)?),
        ])
    }
}

/// Enum type names handled by the codec, sorted the way overload resolution
/// lists them.
fn enum_names(schema: &Schema) -> Vec<&str> {
    let mut names: Vec<&str> = schema
        .enum_types
        .keys()
        .map(String::as_str)
        .chain(schema.enums.iter().map(|e| e.name.as_str()))
        .collect();
    names.sort_by_key(|n| n.to_lowercase());
    names
}

fn record_names(schema: &Schema) -> Vec<&str> {
    let mut names: Vec<&str> = schema.records.iter().map(|r| r.name.as_str()).collect();
    names.sort_by_key(|n| n.to_lowercase());
    names
}

fn build_reader(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(READER_NAMESPACE);
    let native_reader = ctx.type_ref("NativeReader");

    let mut def = TypeDef::class(
        "MdBinaryReader",
        EnumFlags::INTERNAL | EnumFlags::STATIC | EnumFlags::PARTIAL,
    );

    let read = |params: Vec<Param>, body: String| {
        Method::new("Read", MemberFlags::PUBLIC | MemberFlags::EXTENSION)
            .returning(TypeExpr::text("uint"))
            .with_params(params)
            .with_body(body)
    };

    for ty in schema.primitives.keys() {
        def.members.add(Member::Method(read(
            vec![
                Param::new(native_reader, "reader"),
                Param::text("uint", "offset"),
                Param::text(format!("out {ty}[]"), "values"),
            ],
            format!(
                "uint count;\n\
                 offset = reader.DecodeUnsigned(offset, out count);\n\
                 values = new {ty}[count];\n\
                 for (uint i = 0; i < count; ++i)\n\
                 {{\n    \
                 {ty} tmp;\n    \
                 offset = reader.Read(offset, out tmp);\n    \
                 values[i] = tmp;\n\
                 }}\n\
                 return offset;"
            ),
        )));
    }

    for name in enum_names(schema) {
        def.members.add(Member::Method(read(
            vec![
                Param::new(native_reader, "reader"),
                Param::text("uint", "offset"),
                Param::text(format!("out {name}"), "value"),
            ],
            format!(
                "uint ivalue;\n\
                 offset = reader.DecodeUnsigned(offset, out ivalue);\n\
                 value = ({name})ivalue;\n\
                 return offset;"
            ),
        )));
    }

    def.members.add(Member::Method(read(
        vec![
            Param::new(native_reader, "reader"),
            Param::text("uint", "offset"),
            Param::text("out Handle[]", "values"),
        ],
        handle_array_body("Handle"),
    )));

    for record in record_names(schema) {
        let hnd = handle_name(record);
        def.members.add(Member::Method(read(
            vec![
                Param::new(native_reader, "reader"),
                Param::text("uint", "offset"),
                Param::text(format!("out {hnd}"), "handle"),
            ],
            format!(
                "uint value;\n\
                 offset = reader.DecodeUnsigned(offset, out value);\n\
                 handle = new {hnd}((int)value);\n\
                 handle._Validate();\n\
                 return offset;"
            ),
        )));
        def.members.add(Member::Method(read(
            vec![
                Param::new(native_reader, "reader"),
                Param::text("uint", "offset"),
                Param::text(format!("out {hnd}[]"), "values"),
            ],
            handle_array_body(&hnd),
        )));
    }

    def.members.add(Member::Field(empty_array_field("Handle")));
    for record in record_names(schema) {
        def.members
            .add(Member::Field(empty_array_field(&handle_name(record))));
    }

    let id = ctx.define(def);
    ctx.table.add_to_namespace(ns, id);
    Ok(render_unit(&ctx.table, ns, READER_PREAMBLE)?)
}

fn handle_array_body(ty: &str) -> String {
    format!(
        "uint count;\n\
         offset = reader.DecodeUnsigned(offset, out count);\n\
         if (count == 0)\n\
         {{\n    \
         values = s_empty{ty}Array;\n\
         }}\n\
         else\n\
         {{\n    \
         values = new {ty}[count];\n    \
         for (uint i = 0; i < count; ++i)\n    \
         {{\n        \
         {ty} tmp;\n        \
         offset = reader.Read(offset, out tmp);\n        \
         values[i] = tmp;\n    \
         }}\n\
         }}\n\
         return offset;"
    )
}

fn empty_array_field(ty: &str) -> Field {
    Field::new(
        format!("s_empty{ty}Array"),
        TypeExpr::text(format!("{ty}[]")),
        MemberFlags::PRIVATE | MemberFlags::STATIC,
    )
    .with_init(format!("new {ty}[0]"))
}

fn build_writer(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(WRITER_NAMESPACE);
    let native_writer = ctx.type_ref("NativeWriter");

    let mut def = TypeDef::class(
        "MdBinaryWriter",
        EnumFlags::INTERNAL | EnumFlags::STATIC | EnumFlags::PARTIAL,
    );

    let write = |params: Vec<Param>, body: String| {
        Method::new("Write", MemberFlags::PUBLIC | MemberFlags::EXTENSION)
            .with_params(params)
            .with_body(body)
    };

    for ty in schema.primitives.keys() {
        def.members.add(Member::Method(write(
            vec![
                Param::new(native_writer, "writer"),
                Param::text(format!("IEnumerable<{ty}>"), "values"),
            ],
            sequence_body(ty),
        )));
    }

    for name in enum_names(schema) {
        def.members.add(Member::Method(write(
            vec![
                Param::new(native_writer, "writer"),
                Param::text(name, "value"),
            ],
            "writer.WriteUnsigned((uint)value);".to_owned(),
        )));
    }

    def.members.add(Member::Method(write(
        vec![
            Param::new(native_writer, "writer"),
            Param::text("IEnumerable<MetadataRecord>", "values"),
        ],
        sequence_body("MetadataRecord"),
    )));

    for record in record_names(schema) {
        def.members.add(Member::Method(write(
            vec![
                Param::new(native_writer, "writer"),
                Param::text(record, "record"),
            ],
            "if (record != null)\n    \
             writer.WriteUnsigned((uint)record.Handle.Offset);\n\
             else\n    \
             writer.WriteUnsigned(0);"
                .to_owned(),
        )));
        def.members.add(Member::Method(write(
            vec![
                Param::new(native_writer, "writer"),
                Param::text(format!("IEnumerable<{record}>"), "values"),
            ],
            sequence_body(record),
        )));
    }

    let id = ctx.define(def);
    ctx.table.add_to_namespace(ns, id);
    Ok(render_unit(&ctx.table, ns, WRITER_PREAMBLE)?)
}

fn sequence_body(ty: &str) -> String {
    format!(
        "if (values == null)\n\
         {{\n    \
         writer.WriteUnsigned(0);\n    \
         return;\n\
         }}\n\
         writer.WriteUnsigned((uint)values.Count());\n\
         foreach ({ty} value in values)\n\
         {{\n    \
         writer.Write(value);\n\
         }}"
    )
}

#[cfg(test)]
mod tests {
    use metagen_core::flags::FlagSet;
    use metagen_schema::{MemberDef, RecordDef, TypeSpec};

    use super::*;

    fn schema() -> Schema {
        Schema {
            primitives: [
                ("bool".to_owned(), "Boolean".to_owned()),
                ("int".to_owned(), "Int32".to_owned()),
            ]
            .into_iter()
            .collect(),
            enum_types: [
                ("ParameterAttributes".to_owned(), "uint".to_owned()),
                ("PInvokeAttributes".to_owned(), "uint".to_owned()),
            ]
            .into_iter()
            .collect(),
            enums: Vec::new(),
            records: vec![
                RecordDef::new(
                    "Parameter",
                    FlagSet::EMPTY,
                    vec![MemberDef::new(
                        "Flags",
                        TypeSpec::named("ParameterAttributes"),
                        FlagSet::EMPTY,
                    )],
                ),
                RecordDef::new("ArraySignature", FlagSet::EMPTY, Vec::new()),
            ],
            string_records: Vec::new(),
        }
    }

    #[test]
    fn reader_decodes_primitive_arrays() {
        let out = build_reader(&schema()).unwrap();
        assert!(out.contains(
            "public static uint Read(this NativeReader reader, uint offset, out bool[] values)"
        ));
        assert!(out.contains("values = new bool[count];"));
    }

    #[test]
    fn enum_overloads_sort_case_insensitively() {
        let out = build_reader(&schema()).unwrap();
        let parameter = out.find("out ParameterAttributes value").unwrap();
        let pinvoke = out.find("out PInvokeAttributes value").unwrap();
        assert!(parameter < pinvoke);
        assert!(out.contains("value = (PInvokeAttributes)ivalue;"));
    }

    #[test]
    fn empty_handle_arrays_are_shared() {
        let out = build_reader(&schema()).unwrap();
        assert!(out.contains("values = s_emptyHandleArray;"));
        assert!(out.contains(
            "private static ParameterHandle[] s_emptyParameterHandleArray = new ParameterHandle[0];"
        ));
    }

    #[test]
    fn handle_reads_validate() {
        let out = build_reader(&schema()).unwrap();
        assert!(out.contains("handle = new ArraySignatureHandle((int)value);"));
        assert!(out.contains("handle._Validate();"));
    }

    #[test]
    fn writer_encodes_records_as_offsets() {
        let out = build_writer(&schema()).unwrap();
        assert!(out.contains("public static void Write(this NativeWriter writer, Parameter record)"));
        assert!(out.contains("writer.WriteUnsigned((uint)record.Handle.Offset);"));
        assert!(out.contains("foreach (Parameter value in values)"));
    }

    #[test]
    fn writer_handles_null_sequences() {
        let out = build_writer(&schema()).unwrap();
        assert!(out.contains("if (values == null)"));
        assert!(out.contains("writer.WriteUnsigned((uint)values.Count());"));
        assert!(out.contains("IEnumerable<MetadataRecord> values"));
    }

    #[test]
    fn record_overloads_sort_alphabetically() {
        let out = build_writer(&schema()).unwrap();
        let array_sig = out.find(", ArraySignature record)").unwrap();
        let parameter = out.find(", Parameter record)").unwrap();
        assert!(array_sig < parameter);
    }
}
