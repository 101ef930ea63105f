//! The scenario abstraction shared by all generators.

use eyre::Result;
use metagen_codegen::model::{NsId, SymbolTable};
use metagen_codegen::{Emitter, SourceWriter};
use metagen_core::GENERATED_FILE_BANNER;
use metagen_schema::Schema;

use crate::files::{BinaryGen, ContractGen, ReaderGen, WalkerGen, WriterGen};

/// One rendered compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    pub file_name: String,
    pub content: String,
}

impl GeneratedSource {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// A generator that turns a schema into C# source files.
///
/// Scenarios are pure: rendering the same schema twice yields byte-identical
/// output, and a failed render produces no partial file.
pub trait Scenario {
    /// Short name used to select the scenario from the command line.
    fn name(&self) -> &'static str;

    /// Render every compilation unit this scenario produces.
    fn render(&self, schema: &Schema) -> Result<Vec<GeneratedSource>>;
}

/// All scenarios, in generation order.
pub fn scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(ContractGen),
        Box::new(ReaderGen),
        Box::new(WriterGen),
        Box::new(BinaryGen),
        Box::new(WalkerGen),
    ]
}

/// Render a compilation unit: the generated-file banner, the scenario's
/// preamble lines (`using` directives and `#pragma` suppressions, with empty
/// strings rendering as blank lines), and the namespace tree.
pub(crate) fn render_unit(
    table: &SymbolTable,
    ns: NsId,
    preamble: &[&str],
) -> Result<String, metagen_codegen::EmitError> {
    let mut w = SourceWriter::new();
    w.write(GENERATED_FILE_BANNER);
    w.newline();
    for line in preamble {
        if line.is_empty() {
            w.newline();
        } else {
            w.write_line(line);
        }
    }
    w.newline();
    Emitter::new(table).emit_namespace(&mut w, ns)?;
    Ok(w.into_string())
}
