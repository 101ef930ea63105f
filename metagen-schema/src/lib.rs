//! Metadata schema vocabulary.
//!
//! The schema describes the record types of the native metadata format: which
//! members each record has, how members are stored (scalar, handle reference,
//! collection), and which members participate in equality. Generators consume
//! the schema through [`Schema`]; the concrete NativeFormat schema is compiled
//! in via [`Schema::native_format`].

pub mod def;
pub mod flags;
mod native_format;

pub use def::{MemberDef, RecordDef, Schema, TypeSpec};
pub use flags::{MemberDefFlags, RecordDefFlags};
