//! The generated half of the metadata graph walker.
//!
//! `Walker` dispatches an untyped handle to its record's visit method,
//! raises a per-record event, and queues referenced handles for later
//! visits. Child members recurse immediately; cross-references go through
//! the pending set so each record is visited once.

use eyre::Result;
use metagen_codegen::flags::{EnumFlags, MemberFlags};
use metagen_codegen::model::{Event, Member, Method, Param, TypeDef};
use metagen_schema::{MemberDefFlags, RecordDef, Schema};

use crate::context::{BuildContext, handle_name};
use crate::scenario::{GeneratedSource, Scenario, render_unit};

const NAMESPACE: &str = "MdWalker";

const PREAMBLE: &[&str] = &[
    "using System;",
    "using System.Linq;",
    "using System.IO;",
    "using System.Collections.Generic;",
    "using System.Reflection;",
    "using Internal.Metadata.NativeFormat;",
    "using Debug = System.Diagnostics.Debug;",
];

pub struct WalkerGen;

impl Scenario for WalkerGen {
    fn name(&self) -> &'static str {
        "walker"
    }

    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>> {
        let content = build(schema)?;
        Ok(vec![GeneratedSource::new("MdWalkerGen.cs", content)])
    }
}

fn build(schema: &Schema) -> Result<String> {
    let mut ctx = BuildContext::new();
    let ns = ctx.table.namespace(NAMESPACE);
    let handler = ctx.table.add_generic_ref("VisitHandler", 1);

    let mut records: Vec<&RecordDef> = schema.records.iter().collect();
    records.sort_by_key(|r| r.name.to_lowercase());

    let mut def = TypeDef::class("Walker", EnumFlags::PUBLIC | EnumFlags::PARTIAL);
    let base_handle = ctx.type_ref("Handle");

    def.members.add(Member::Method(
        Method::new("Visit", MemberFlags::PROTECTED)
            .with_params(vec![
                Param::new(base_handle, "handle"),
                Param::text("bool", "recurse"),
            ])
            .with_body(dispatch_body(&records)),
    ));

    for record in &records {
        let name = &record.name;
        let hnd = ctx.type_ref(&handle_name(name));
        def.members.add(Member::Method(
            Method::new("Visit", MemberFlags::PROTECTED | MemberFlags::VIRTUAL)
                .with_params(vec![Param::new(hnd, "handle"), Param::text("bool", "recurse")])
                .with_body(format!(
                    "_visiting.Push(handle);\n\
                     _visited.Add(handle);\n\
                     Visit(handle.Get{name}(_reader), recurse);\n\
                     _visiting.Pop();"
                )),
        ));
        let enumerable = ctx.enumerable_of(hnd.into())?;
        def.members.add(Member::Method(
            Method::new("Visit", MemberFlags::PROTECTED | MemberFlags::VIRTUAL)
                .with_params(vec![
                    Param::new(enumerable, "handles"),
                    Param::text("bool", "recurse"),
                ])
                .with_body("foreach (var handle in handles) Visit(handle, recurse);"),
        ));
    }

    for record in &records {
        let rec = ctx.type_ref(&record.name);
        def.members.add(Member::Method(
            Method::new("Visit", MemberFlags::PROTECTED | MemberFlags::VIRTUAL)
                .with_params(vec![
                    Param::new(rec, "record"),
                    Param::text("bool", "recurse"),
                ])
                .with_body(record_visit_body(record)),
        ));
    }

    for record in &records {
        let rec = ctx.type_ref(&record.name);
        let ty = ctx.table.instantiate(handler.into(), vec![rec.into()])?;
        def.members.add(Member::Event(Event::new(
            format!("{}Event", record.name),
            ty,
            MemberFlags::PUBLIC,
        )));
    }

    let id = ctx.define(def);
    ctx.table.add_to_namespace(ns, id);
    Ok(render_unit(&ctx.table, ns, PREAMBLE)?)
}

fn dispatch_body(records: &[&RecordDef]) -> String {
    let mut body = "switch (handle.GetHandleType(_reader))\n{".to_owned();
    for record in records {
        let name = &record.name;
        body.push_str(&format!(
            "\ncase HandleType.{name}:\n    \
             Visit(handle.To{name}Handle(_reader), recurse);\n    \
             break;"
        ));
    }
    body.push_str("\ndefault:\n    throw new ArgumentException();\n}");
    body
}

/// Member handles visit in name order with `Name` pulled to the front, so a
/// record's identity is established before its other references.
fn record_visit_body(record: &RecordDef) -> String {
    let name = &record.name;
    let mut stmts = vec![
        format!("if ({name}Event != null)\n{{\n    {name}Event(record);\n}}"),
        "if (!recurse) return;".to_owned(),
    ];

    let mut members: Vec<_> = record.members.iter().collect();
    members.sort_by_key(|m| {
        if m.name == "Name" {
            format!("0{}", m.name)
        } else {
            m.name.clone()
        }
    });

    for member in members {
        if !member.is_record_ref() {
            continue;
        }
        let n = &member.name;
        if member.flags.intersects(MemberDefFlags::CHILD) {
            stmts.push(format!("Visit(record.{n}, recurse);"));
        } else if member.flags.intersects(MemberDefFlags::SEQUENCE) {
            stmts.push(format!(
                "foreach (var handle in record.{n})\n\
                 {{\n    \
                 if (!_visited.Contains(handle))\n        \
                 _pending.Add(handle);\n\
                 }}"
            ));
        } else {
            stmts.push(format!(
                "if (!record.{n}.IsNull(_reader) && !_visited.Contains(record.{n}))\n\
                 {{\n    \
                 _pending.Add(record.{n});\n\
                 }}"
            ));
        }
    }

    stmts.join("\n")
}
