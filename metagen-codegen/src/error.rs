use thiserror::Error;

/// Errors raised while rendering the symbol model to source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("type `{name}` is not generic and cannot be instantiated")]
    NotGeneric { name: String },

    #[error("incomplete instantiation of `{name}`: expected {expected} type arguments, got {got}")]
    IncompleteInstantiation {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("enum `{name}` has no remaining distinct values to assign")]
    EnumValueSpace { name: String },

    #[error("enum `{name}` contains non-value member `{member}`")]
    NonEnumMember { name: String, member: String },
}
