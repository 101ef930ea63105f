//! C# symbol model and code emission.
//!
//! Generators build an in-memory model of C# declarations (namespaces, types,
//! members) in a [`model::SymbolTable`], then render it through [`emit`] into
//! a [`writer::SourceWriter`]. The writer owns indentation and the blank-line
//! bookkeeping that keeps member separation consistent across generated files.

pub mod emit;
pub mod error;
pub mod flags;
pub mod model;
pub mod writer;

pub use emit::Emitter;
pub use error::EmitError;
pub use flags::{AccessFlags, EnumFlags, MemberFlags, TypeFlags, access_keyword};
pub use writer::SourceWriter;
