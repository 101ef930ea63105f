//! Shared utilities for the metagen source generator.
//!
//! This crate provides the building blocks the rest of the workspace leans on:
//!
//! - [`flags`] - Typed bit-flag families (`FlagSet`, `flag_family!`)
//! - [`naming`] - C#-flavored naming conventions and a small inflector
//! - [`file`] - Atomic output-file handling (write to temp, rename on success)

pub mod file;
pub mod flags;
pub mod naming;

pub use file::{OutputFile, write_atomic};
pub use flags::{FlagError, FlagFamily, FlagSet, Refines, verify_family};
pub use naming::{argument_name, plural, private_name, singular};

/// Banner placed at the top of every generated source file.
pub const GENERATED_FILE_BANNER: &str = "// NOTE: This is a generated file - do not manually edit!\n";
