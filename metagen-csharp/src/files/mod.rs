//! One module per generated compilation unit family.

mod binary;
mod contract;
mod reader;
mod walker;
mod writer;

pub use binary::BinaryGen;
pub use contract::ContractGen;
pub use reader::ReaderGen;
pub use walker::WalkerGen;
pub use writer::WriterGen;
