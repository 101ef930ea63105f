//! End-to-end checks over every scenario generator.

use std::collections::BTreeSet;

use insta::assert_snapshot;
use metagen_core::GENERATED_FILE_BANNER;
use metagen_core::flags::FlagSet;
use metagen_csharp::scenarios;
use metagen_schema::{MemberDef, RecordDef, Schema, TypeSpec};

fn point_schema() -> Schema {
    Schema {
        primitives: [("int".to_owned(), "Int32".to_owned())]
            .into_iter()
            .collect(),
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

fn empty_schema() -> Schema {
    Schema {
        primitives: Default::default(),
        enum_types: Default::default(),
        enums: Vec::new(),
        records: Vec::new(),
        string_records: Vec::new(),
    }
}

#[test]
fn every_scenario_renders_the_builtin_schema() {
    let schema = Schema::native_format();
    for scenario in scenarios() {
        let sources = scenario.render(&schema).unwrap();
        assert!(!sources.is_empty(), "{} produced nothing", scenario.name());
        for source in sources {
            assert!(
                source.content.starts_with(GENERATED_FILE_BANNER),
                "{} lacks the banner",
                source.file_name
            );
        }
    }
}

#[test]
fn rendering_is_deterministic() {
    let schema = Schema::native_format();
    for scenario in scenarios() {
        let first = scenario.render(&schema).unwrap();
        let second = scenario.render(&schema).unwrap();
        assert_eq!(first, second, "{} is not stable", scenario.name());
    }
}

#[test]
fn output_file_names_are_unique() {
    let schema = Schema::native_format();
    let mut names = BTreeSet::new();
    let mut count = 0;
    for scenario in scenarios() {
        for source in scenario.render(&schema).unwrap() {
            names.insert(source.file_name);
            count += 1;
        }
    }
    assert_eq!(names.len(), count);
    assert_eq!(
        names.into_iter().collect::<Vec<_>>(),
        [
            "MdBinaryReaderGen.cs",
            "MdBinaryWriterGen.cs",
            "MdWalkerGen.cs",
            "NativeFormatReaderCommonGen.cs",
            "NativeFormatReaderGen.cs",
            "NativeFormatWriterGen.cs",
        ]
    );
}

#[test]
fn point_record_flows_through_contract_and_reader() {
    let schema = point_schema();
    let mut by_name = std::collections::HashMap::new();
    for scenario in scenarios() {
        by_name.insert(scenario.name(), scenario.render(&schema).unwrap());
    }

    let contract = &by_name["contract"][0].content;
    assert!(contract.contains("internal interface IPoint"));
    assert!(contract.contains("public partial struct Point : IPoint"));
    assert!(contract.contains("Point = 0x1,"));
    assert!(contract.contains("Point GetPoint(PointHandle handle);"));

    let reader = &by_name["reader"][0].content;
    assert!(reader.contains("internal int _x;"));
    assert!(reader.contains("offset = _streamReader.Read(offset, out record._y);"));
    assert!(reader.contains("public static implicit operator Handle(PointHandle handle)"));

    let writer = &by_name["writer"][0].content;
    assert!(writer.contains("public partial class Point : MetadataRecord"));
    assert!(writer.contains("if (X != other.X) return false;"));
    assert!(writer.contains("internal new PointHandle Handle"));
}

#[test]
fn empty_schema_binary_writer_keeps_the_record_base_overload() {
    let schema = empty_schema();
    let binary = scenarios()
        .into_iter()
        .find(|s| s.name() == "binary")
        .unwrap();
    let sources = binary.render(&schema).unwrap();
    assert_eq!(sources[1].file_name, "MdBinaryWriterGen.cs");

    assert_snapshot!(sources[1].content, @r###"
    // NOTE: This is a generated file - do not manually edit!

    #pragma warning disable 649

    using System;
    using System.IO;
    using System.Collections.Generic;
    using System.Reflection;
    using Internal.LowLevelLinq;
    using Internal.NativeFormat;
    using Debug = System.Diagnostics.Debug;

    namespace Internal.Metadata.NativeFormat.Writer
    {
        /// <summary>
        /// MdBinaryWriter
        /// </summary>
        internal static partial class MdBinaryWriter
        {
            /// <summary>
            /// Write
            /// </summary>
            /// <param name="writer"></param>
            /// <param name="values"></param>
            public static void Write(this NativeWriter writer, IEnumerable<MetadataRecord> values)
            {
                if (values == null)
                {
                    writer.WriteUnsigned(0);
                    return;
                }
                writer.WriteUnsigned((uint)values.Count());
                foreach (MetadataRecord value in values)
                {
                    writer.Write(value);
                }
            } // Write
        } // MdBinaryWriter
    } // Internal.Metadata.NativeFormat.Writer
    "###);
}
