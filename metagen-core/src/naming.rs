//! C# naming conventions.
//!
//! These helpers are intentionally naive. They only understand the handful of
//! shapes that occur in the metadata schema, and schema authors rely on their
//! exact output, so keep the rules as they are rather than swapping in a real
//! inflector.

/// Derive a private field name: `Value` becomes `_value`.
///
/// Names that do not start with an uppercase letter followed by a lowercase
/// letter, digit, or underscore (e.g. `ABI`) keep their casing and only gain
/// the underscore prefix.
pub fn private_name(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second))
            if first.is_ascii_uppercase()
                && (second.is_ascii_lowercase() || second.is_ascii_digit() || second == '_') =>
        {
            format!("_{}{}", first.to_ascii_lowercase(), &name[1..])
        }
        _ => format!("_{name}"),
    }
}

/// Derive an argument name: `Handle` becomes `handle`, and an interface name
/// like `IRecord` drops its `I` prefix to become `record`.
pub fn argument_name(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('I'), Some(second), Some(third))
            if second.is_ascii_uppercase()
                && (third.is_ascii_lowercase() || third.is_ascii_digit() || third == '_') =>
        {
            format!("{}{}", second.to_ascii_lowercase(), &name[2..])
        }
        (Some(first), _, _) => format!("{}{}", first.to_ascii_lowercase(), &name[1..]),
        (None, _, _) => String::new(),
    }
}

/// Singularize a plural member name.
///
/// `MethodSemantics` is both singular and plural and passes through unchanged.
pub fn singular(name: &str) -> String {
    if name == "MethodSemantics" {
        name.to_owned()
    } else if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = name.strip_suffix("ses") {
        stem.to_owned()
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_owned()
    } else {
        name.to_owned()
    }
}

/// Pluralize a member name. Singularizes first so the result is stable under
/// repeated application.
pub fn plural(name: &str) -> String {
    let name = singular(name);
    if name == "MethodSemantics" {
        name
    } else if let Some(stem) = name.strip_suffix('y') {
        format!("{stem}ies")
    } else if name.ends_with('s') {
        format!("{name}ses")
    } else {
        format!("{name}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_names() {
        assert_eq!(private_name("Value"), "_value");
        assert_eq!(private_name("Offset"), "_offset");
        assert_eq!(private_name("ABI"), "_ABI");
        assert_eq!(private_name("X"), "_X");
        assert_eq!(private_name("T1"), "_t1");
    }

    #[test]
    fn argument_names() {
        assert_eq!(argument_name("Handle"), "handle");
        assert_eq!(argument_name("IRecordVisitor"), "recordVisitor");
        assert_eq!(argument_name("Int32"), "int32");
        // `II` followed by lowercase drops one I; bare `IX` just lowercases.
        assert_eq!(argument_name("IIndex"), "index");
        assert_eq!(argument_name("IO"), "iO");
    }

    #[test]
    fn singular_forms() {
        assert_eq!(singular("Parameters"), "Parameter");
        assert_eq!(singular("Properties"), "Property");
        assert_eq!(singular("ReturnTypeSignature"), "ReturnTypeSignature");
        assert_eq!(singular("MethodSemantics"), "MethodSemantics");
        assert_eq!(singular("Classes"), "Clas");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural("Parameter"), "Parameters");
        assert_eq!(plural("Property"), "Properties");
        assert_eq!(plural("MethodSemantics"), "MethodSemantics");
        // A trailing `s` is treated as an existing plural and round-trips.
        assert_eq!(plural("Alias"), "Alias");
    }

    #[test]
    fn plural_is_idempotent() {
        for name in ["Parameters", "Properties", "GenericParameters"] {
            assert_eq!(plural(name), name);
            assert_eq!(plural(&plural(name)), name);
        }
    }
}
