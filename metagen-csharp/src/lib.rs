//! C# source generators for the native metadata format.
//!
//! Each generator is a [`Scenario`]: it builds a namespace tree out of the
//! symbol model in `metagen-codegen`, driven by a [`Schema`], and renders it
//! to one or more C# compilation units. The five scenarios cover the public
//! reader contract, the reader implementation, the writer object model, the
//! binary codec helpers, and a diagnostic walker.
//!
//! ```ignore
//! use metagen_csharp::{Scenario, scenarios};
//! use metagen_schema::Schema;
//!
//! let schema = Schema::native_format();
//! for scenario in scenarios() {
//!     for file in scenario.render(&schema)? {
//!         println!("{}: {} bytes", file.file_name, file.content.len());
//!     }
//! }
//! ```
//!
//! [`Schema`]: metagen_schema::Schema

mod context;
mod scenario;

pub mod files;

pub use context::BuildContext;
pub use files::{BinaryGen, ContractGen, ReaderGen, WalkerGen, WriterGen};
pub use scenario::{GeneratedSource, Scenario, scenarios};
