//! The NativeFormat metadata schema, largely based on ECMA-335.

use indexmap::IndexMap;
use metagen_core::flags::FlagSet;

use crate::def::{MemberDef, RecordDef, Schema, TypeSpec};
use crate::flags::{MemberDefFlags, RecordDefFlags};

/// A scalar member with no flags.
fn scalar(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(name, TypeSpec::named(ty), FlagSet::EMPTY)
}

/// A handle reference to a shared record.
fn record_ref(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(name, TypeSpec::named(ty), MemberDefFlags::RECORD_REF)
}

/// A handle reference to a record owned by this one.
fn child_ref(name: &str, ty: &str) -> MemberDef {
    record_ref(name, ty).plus(MemberDefFlags::CHILD)
}

/// A list of handles to owned records.
fn child_list(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(
        name,
        TypeSpec::named(ty),
        MemberDefFlags::LIST | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
    )
}

/// A list of handles to shared records.
fn ref_list(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(
        name,
        TypeSpec::named(ty),
        MemberDefFlags::LIST | MemberDefFlags::RECORD_REF,
    )
}

/// A name-keyed map of handles to owned records.
fn child_map(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(
        name,
        TypeSpec::named(ty),
        MemberDefFlags::MAP | MemberDefFlags::RECORD_REF | MemberDefFlags::CHILD,
    )
}

/// A handle reference constrained to a union of record types.
fn union_ref(name: &str, candidates: &[&str]) -> MemberDef {
    MemberDef::new(
        name,
        TypeSpec::union(candidates.iter().copied()),
        MemberDefFlags::RECORD_REF,
    )
}

fn array(name: &str, ty: &str) -> MemberDef {
    MemberDef::new(name, TypeSpec::named(ty), MemberDefFlags::ARRAY)
}

fn value(name: &str, v: u64) -> MemberDef {
    MemberDef::enum_value(name, Some(v))
}

fn auto(name: &str) -> MemberDef {
    MemberDef::enum_value(name, None)
}

fn type_def_or_ref() -> Vec<&'static str> {
    vec!["TypeDefinition", "TypeReference"]
}

fn type_def_or_ref_or_spec() -> Vec<&'static str> {
    let mut v = type_def_or_ref();
    v.push("TypeSpecification");
    v
}

fn type_sig() -> Vec<&'static str> {
    vec![
        "TypeInstantiationSignature",
        "SZArraySignature",
        "ArraySignature",
        "PointerSignature",
        "ByReferenceSignature",
        "TypeVariableSignature",
        "MethodTypeVariableSignature",
    ]
}

/// Primitive C# keywords and their framework names, sorted by keyword.
fn primitives() -> IndexMap<String, String> {
    [
        ("bool", "Boolean"),
        ("byte", "Byte"),
        ("char", "Char"),
        ("double", "Double"),
        ("float", "Single"),
        ("int", "Int32"),
        ("long", "Int64"),
        ("sbyte", "SByte"),
        ("short", "Int16"),
        ("string", "String"),
        ("uint", "UInt32"),
        ("ulong", "UInt64"),
        ("ushort", "UInt16"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// Pre-existing enum types (mostly System.Reflection.Primitives) and their
/// underlying types, sorted by name.
fn enum_types() -> IndexMap<String, String> {
    [
        ("AssemblyFlags", "uint"),
        ("AssemblyHashAlgorithm", "uint"),
        ("CallingConventions", "ushort"),
        ("EventAttributes", "ushort"),
        ("FieldAttributes", "ushort"),
        ("FixedArgumentAttributes", "byte"),
        ("GenericParameterAttributes", "ushort"),
        ("GenericParameterKind", "byte"),
        ("MethodAttributes", "ushort"),
        ("MethodImplAttributes", "ushort"),
        ("MethodSemanticsAttributes", "ushort"),
        ("NamedArgumentMemberKind", "byte"),
        ("ParameterAttributes", "ushort"),
        ("PInvokeAttributes", "ushort"),
        ("PropertyAttributes", "ushort"),
        ("TypeAttributes", "uint"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// Enum definitions that supplement System.Reflection.Primitives.
fn enums() -> Vec<RecordDef> {
    vec![
        // As defined in ECMA-335.
        RecordDef::new(
            "AssemblyFlags",
            RecordDefFlags::ENUM | RecordDefFlags::FLAGS,
            vec![
                value("PublicKey", 0x0001)
                    .with_comment("The assembly reference holds the full (unhashed) public key."),
                value("Retargetable", 0x0100).with_comment(
                    "The implementation of this assembly used at runtime is not expected to match the version seen at compile time.",
                ),
                value("DisableJITcompileOptimizer", 0x4000).with_comment("Reserved."),
                value("EnableJITcompileTracking", 0x8000).with_comment("Reserved."),
            ],
        )
        .with_base("uint"),
        // As defined in ECMA-335.
        RecordDef::new(
            "AssemblyHashAlgorithm",
            RecordDefFlags::ENUM,
            vec![
                value("None", 0x0000),
                value("Reserved", 0x8003),
                value("SHA1", 0x8004),
            ],
        )
        .with_base("uint"),
        // Indicates whether a fixed argument of a custom attribute
        // instantiation should be boxed.
        RecordDef::new(
            "FixedArgumentAttributes",
            RecordDefFlags::ENUM | RecordDefFlags::FLAGS,
            vec![
                value("None", 0),
                auto("Boxed").with_comment("Values should be boxed as Object"),
            ],
        )
        .with_base("byte"),
        // Disambiguates the referenced members of the named arguments to a
        // custom attribute instance.
        RecordDef::new(
            "NamedArgumentMemberKind",
            RecordDefFlags::ENUM,
            vec![
                auto("Property").with_comment("Specifies the name of a property"),
                auto("Field").with_comment("Specifies the name of a field"),
            ],
        )
        .with_base("byte"),
        // Distinguishes generic type parameters from generic method type
        // parameters.
        RecordDef::new(
            "GenericParameterKind",
            RecordDefFlags::ENUM,
            vec![
                auto("GenericTypeParameter")
                    .with_comment("Represents a type parameter for a generic type."),
                auto("GenericMethodParameter")
                    .with_comment("Represents a type parameter from a generic method."),
            ],
        )
        .with_base("byte"),
    ]
}

/// Records representing constant primitive values and arrays, plus the
/// constant managed reference (always null, hence not persisted) and the
/// constant handle array. Sorted by record name.
fn constant_records(primitives: &IndexMap<String, String>) -> Vec<RecordDef> {
    let mut records = Vec::new();
    for (keyword, friendly) in primitives {
        records.push(RecordDef::new(
            format!("Constant{friendly}Value"),
            FlagSet::EMPTY,
            vec![scalar("Value", keyword)],
        ));
        records.push(RecordDef::new(
            format!("Constant{friendly}Array"),
            FlagSet::EMPTY,
            vec![array("Value", keyword)],
        ));
    }
    records.push(RecordDef::new(
        "ConstantReferenceValue",
        FlagSet::EMPTY,
        vec![MemberDef::new(
            "Value",
            TypeSpec::named("Object"),
            MemberDefFlags::NOT_PERSISTED,
        )],
    ));
    records.push(RecordDef::new(
        "ConstantHandleArray",
        FlagSet::EMPTY,
        vec![MemberDef::new(
            "Value",
            TypeSpec::named("Handle"),
            MemberDefFlags::RECORD_REF | MemberDefFlags::LIST,
        )],
    ));
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

pub(crate) fn build() -> Schema {
    let primitives = primitives();
    let constants = constant_records(&primitives);

    // TypeDefOrRefOrSpec extended with every constant record type.
    let mut def_ref_spec_or_constant: Vec<String> = type_def_or_ref_or_spec()
        .into_iter()
        .map(str::to_owned)
        .collect();
    def_ref_spec_or_constant.extend(constants.iter().map(|r| r.name.clone()));
    let constant_union: Vec<&str> = def_ref_spec_or_constant.iter().map(String::as_str).collect();

    let mut sig_union = type_def_or_ref();
    sig_union.extend(type_sig());

    let mut records = vec![
        RecordDef::new(
            "TypeDefinition",
            RecordDefFlags::CUSTOM_COMPARE,
            vec![
                scalar("Flags", "TypeAttributes"),
                union_ref("BaseType", &type_def_or_ref_or_spec()),
                record_ref("NamespaceDefinition", "NamespaceDefinition")
                    .plus(MemberDefFlags::COMPARE),
                child_ref("Name", "ConstantStringValue").plus(MemberDefFlags::COMPARE),
                scalar("Size", "uint"),
                scalar("PackingSize", "uint"),
                record_ref("EnclosingType", "TypeDefinition").plus(MemberDefFlags::COMPARE),
                child_list("NestedTypes", "TypeDefinition"),
                child_list("Methods", "Method"),
                child_map("Fields", "Field"),
                child_map("Properties", "Property"),
                child_map("Events", "Event"),
                child_list("GenericParameters", "GenericParameter"),
                union_ref("Interfaces", &type_def_or_ref_or_spec()).plus(MemberDefFlags::LIST),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "TypeReference",
            FlagSet::EMPTY,
            vec![
                union_ref(
                    "ParentNamespaceOrType",
                    &["NamespaceReference", "TypeReference"],
                ),
                child_ref("TypeName", "ConstantStringValue").plus(MemberDefFlags::NAME),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "TypeSpecification",
            FlagSet::EMPTY,
            vec![
                union_ref("Signature", &sig_union).plus(MemberDefFlags::CHILD),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "ScopeDefinition",
            RecordDefFlags::CUSTOM_COMPARE,
            vec![
                scalar("Flags", "AssemblyFlags").plus(MemberDefFlags::COMPARE),
                child_ref("Name", "ConstantStringValue").plus(MemberDefFlags::COMPARE),
                scalar("HashAlgorithm", "AssemblyHashAlgorithm").plus(MemberDefFlags::COMPARE),
                scalar("MajorVersion", "ushort").plus(MemberDefFlags::COMPARE),
                scalar("MinorVersion", "ushort").plus(MemberDefFlags::COMPARE),
                scalar("BuildNumber", "ushort").plus(MemberDefFlags::COMPARE),
                scalar("RevisionNumber", "ushort").plus(MemberDefFlags::COMPARE),
                array("PublicKey", "byte").plus(MemberDefFlags::COMPARE),
                child_ref("Culture", "ConstantStringValue").plus(MemberDefFlags::COMPARE),
                child_ref("RootNamespaceDefinition", "NamespaceDefinition"),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "ScopeReference",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "AssemblyFlags"),
                child_ref("Name", "ConstantStringValue"),
                scalar("MajorVersion", "ushort"),
                scalar("MinorVersion", "ushort"),
                scalar("BuildNumber", "ushort"),
                scalar("RevisionNumber", "ushort"),
                array("PublicKeyOrToken", "byte"),
                child_ref("Culture", "ConstantStringValue"),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "NamespaceDefinition",
            RecordDefFlags::CUSTOM_COMPARE,
            vec![
                union_ref(
                    "ParentScopeOrNamespace",
                    &["NamespaceDefinition", "ScopeDefinition"],
                )
                .plus(MemberDefFlags::COMPARE),
                child_ref("Name", "ConstantStringValue").plus(MemberDefFlags::COMPARE),
                child_map("TypeDefinitions", "TypeDefinition"),
                child_map("TypeForwarders", "TypeForwarder"),
                child_map("NamespaceDefinitions", "NamespaceDefinition"),
            ],
        ),
        RecordDef::new(
            "NamespaceReference",
            FlagSet::EMPTY,
            vec![
                union_ref(
                    "ParentScopeOrNamespace",
                    &["NamespaceReference", "ScopeReference"],
                ),
                child_ref("Name", "ConstantStringValue"),
            ],
        ),
        RecordDef::new(
            "Method",
            FlagSet::EMPTY,
            vec![
                scalar("RVA", "uint"),
                scalar("Flags", "MethodAttributes"),
                scalar("ImplFlags", "MethodImplAttributes"),
                child_ref("Name", "ConstantStringValue"),
                child_ref("Signature", "MethodSignature"),
                child_list("Parameters", "Parameter")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                child_list("GenericParameters", "GenericParameter")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                child_list("MethodImpls", "MethodImpl"),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "MethodInstantiation",
            FlagSet::EMPTY,
            vec![
                union_ref("Method", &["Method", "MemberReference"]),
                record_ref("Instantiation", "MethodSignature"),
            ],
        ),
        RecordDef::new(
            "MemberReference",
            FlagSet::EMPTY,
            vec![
                {
                    let mut parent = vec!["Method"];
                    parent.extend(type_def_or_ref_or_spec());
                    union_ref("Parent", &parent)
                },
                child_ref("Name", "ConstantStringValue"),
                union_ref("Signature", &["MethodSignature", "FieldSignature"])
                    .plus(MemberDefFlags::CHILD),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "Field",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "FieldAttributes"),
                child_ref("Name", "ConstantStringValue"),
                child_ref("Signature", "FieldSignature"),
                union_ref("DefaultValue", &constant_union),
                scalar("Offset", "uint"),
                child_list("CustomAttributes", "CustomAttribute")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "Property",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "PropertyAttributes"),
                child_ref("Name", "ConstantStringValue"),
                child_ref("Signature", "PropertySignature"),
                child_list("MethodSemantics", "MethodSemantics")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                union_ref("DefaultValue", &constant_union),
                child_list("CustomAttributes", "CustomAttribute")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "Event",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "EventAttributes"),
                child_ref("Name", "ConstantStringValue"),
                union_ref("Type", &type_def_or_ref_or_spec()),
                child_list("MethodSemantics", "MethodSemantics")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                child_list("CustomAttributes", "CustomAttribute")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "CustomAttribute",
            RecordDefFlags::REENTRANT_EQUALS,
            vec![
                union_ref("Type", &type_def_or_ref()),
                union_ref("Constructor", &["Method", "MemberReference"]),
                child_list("FixedArguments", "FixedArgument")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                child_list("NamedArguments", "NamedArgument")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "FixedArgument",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "FixedArgumentAttributes"),
                union_ref("Type", &type_def_or_ref_or_spec()),
                union_ref("Value", &constant_union),
            ],
        ),
        RecordDef::new(
            "NamedArgument",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "NamedArgumentMemberKind"),
                child_ref("Name", "ConstantStringValue"),
                child_ref("Value", "FixedArgument"),
            ],
        ),
        RecordDef::new(
            "GenericParameter",
            FlagSet::EMPTY,
            vec![
                scalar("Number", "ushort"),
                scalar("Flags", "GenericParameterAttributes"),
                scalar("Kind", "GenericParameterKind"),
                child_ref("Name", "ConstantStringValue"),
                union_ref("Constraints", &type_def_or_ref_or_spec())
                    .plus(MemberDefFlags::LIST | MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "MethodImpl",
            FlagSet::EMPTY,
            vec![
                union_ref("MethodDeclaration", &["Method", "MemberReference"]),
                child_list("CustomAttributes", "CustomAttribute")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "Parameter",
            FlagSet::EMPTY,
            vec![
                scalar("Flags", "ParameterAttributes"),
                scalar("Sequence", "ushort"),
                child_ref("Name", "ConstantStringValue"),
                union_ref("DefaultValue", &constant_union),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "MethodSemantics",
            FlagSet::EMPTY,
            vec![
                scalar("Attributes", "MethodSemanticsAttributes"),
                record_ref("Method", "Method"),
                child_list("CustomAttributes", "CustomAttribute")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "TypeInstantiationSignature",
            FlagSet::EMPTY,
            vec![
                union_ref("GenericType", &type_def_or_ref_or_spec()),
                union_ref("GenericTypeArguments", &type_def_or_ref_or_spec())
                    .plus(MemberDefFlags::LIST),
            ],
        ),
        RecordDef::new(
            "SZArraySignature",
            FlagSet::EMPTY,
            vec![union_ref("ElementType", &type_def_or_ref_or_spec())],
        ),
        RecordDef::new(
            "ArraySignature",
            FlagSet::EMPTY,
            vec![
                union_ref("ElementType", &type_def_or_ref_or_spec()),
                scalar("Rank", "int"),
                array("Sizes", "int"),
                array("LowerBounds", "int"),
            ],
        ),
        RecordDef::new(
            "ByReferenceSignature",
            FlagSet::EMPTY,
            vec![union_ref("Type", &type_def_or_ref_or_spec())],
        ),
        RecordDef::new(
            "PointerSignature",
            FlagSet::EMPTY,
            vec![union_ref("Type", &type_def_or_ref_or_spec())],
        ),
        RecordDef::new(
            "TypeVariableSignature",
            FlagSet::EMPTY,
            vec![scalar("Number", "int")],
        ),
        RecordDef::new(
            "MethodTypeVariableSignature",
            FlagSet::EMPTY,
            vec![scalar("Number", "int")],
        ),
        RecordDef::new(
            "FieldSignature",
            FlagSet::EMPTY,
            vec![
                union_ref("Type", &type_def_or_ref_or_spec()),
                ref_list("CustomModifiers", "CustomModifier"),
            ],
        ),
        RecordDef::new(
            "PropertySignature",
            FlagSet::EMPTY,
            vec![
                scalar("CallingConvention", "CallingConventions"),
                ref_list("CustomModifiers", "CustomModifier"),
                union_ref("Type", &type_def_or_ref_or_spec()),
                ref_list("Parameters", "ParameterTypeSignature")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "MethodSignature",
            FlagSet::EMPTY,
            vec![
                scalar("CallingConvention", "CallingConventions"),
                scalar("GenericParameterCount", "int"),
                record_ref("ReturnType", "ReturnTypeSignature"),
                ref_list("Parameters", "ParameterTypeSignature")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
                ref_list("VarArgParameters", "ParameterTypeSignature")
                    .plus(MemberDefFlags::ENUMERATE_FOR_HASH_CODE),
            ],
        ),
        RecordDef::new(
            "ReturnTypeSignature",
            FlagSet::EMPTY,
            vec![
                ref_list("CustomModifiers", "CustomModifier"),
                union_ref("Type", &type_def_or_ref_or_spec()),
            ],
        ),
        RecordDef::new(
            "ParameterTypeSignature",
            FlagSet::EMPTY,
            vec![
                ref_list("CustomModifiers", "CustomModifier"),
                union_ref("Type", &type_def_or_ref_or_spec()),
            ],
        ),
        RecordDef::new(
            "TypeForwarder",
            FlagSet::EMPTY,
            vec![
                record_ref("Scope", "ScopeReference"),
                child_ref("Name", "ConstantStringValue").plus(MemberDefFlags::NAME),
                child_list("NestedTypes", "TypeForwarder"),
                child_list("CustomAttributes", "CustomAttribute"),
            ],
        ),
        RecordDef::new(
            "CustomModifier",
            FlagSet::EMPTY,
            vec![
                scalar("IsOptional", "bool"),
                union_ref("Type", &type_def_or_ref_or_spec()),
            ],
        ),
    ];
    records.extend(constants);

    Schema {
        primitives,
        enum_types: enum_types(),
        enums: enums(),
        records,
        string_records: vec!["ConstantStringValue".to_owned()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_well_formed() {
        let schema = Schema::native_format();

        assert_eq!(schema.primitives.len(), 13);
        assert_eq!(schema.enum_types.len(), 16);
        assert_eq!(schema.enums.len(), 5);

        // 13 primitives each contribute a Value and an Array record, plus
        // the reference value and handle array.
        let constants = schema
            .records
            .iter()
            .filter(|r| r.name.starts_with("Constant"))
            .count();
        assert_eq!(constants, 28);
        assert!(schema.is_string_record("ConstantStringValue"));
    }

    #[test]
    fn constant_records_are_sorted_and_last() {
        let schema = Schema::native_format();
        let first_constant = schema
            .records
            .iter()
            .position(|r| r.name.starts_with("Constant"))
            .unwrap();
        let tail: Vec<_> = schema.records[first_constant..]
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        let mut sorted = tail.clone();
        sorted.sort_unstable();
        assert_eq!(tail, sorted);
        assert!(tail.contains(&"ConstantHandleArray"));
        assert!(tail.contains(&"ConstantReferenceValue"));
    }

    #[test]
    fn every_record_ref_target_resolves() {
        let schema = Schema::native_format();
        let known: Vec<&str> = schema.handle_records().collect();
        for record in &schema.records {
            for member in &record.members {
                let Some(ty) = &member.ty else { continue };
                if !member.is_record_ref() {
                    continue;
                }
                match ty {
                    TypeSpec::Named(name) => {
                        // `Handle` is the untyped handle, not a record.
                        assert!(
                            name == "Handle" || known.contains(&name.as_str()),
                            "{}.{} references unknown record `{name}`",
                            record.name,
                            member.name
                        );
                    }
                    TypeSpec::Union(names) => {
                        for name in names {
                            assert!(
                                known.contains(&name.as_str()),
                                "{}.{} references unknown record `{name}`",
                                record.name,
                                member.name
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn union_members_are_marked_record_ref() {
        let schema = Schema::native_format();
        for record in &schema.records {
            for member in &record.members {
                if member.ty.as_ref().is_some_and(TypeSpec::is_union) {
                    assert!(
                        member.is_record_ref(),
                        "{}.{} is a union without RecordRef",
                        record.name,
                        member.name
                    );
                }
            }
        }
    }

    #[test]
    fn type_definition_uses_custom_compare() {
        let schema = Schema::native_format();
        let td = schema.record("TypeDefinition").unwrap();
        assert!(td.flags.intersects(RecordDefFlags::CUSTOM_COMPARE));
        let compared: Vec<_> = td
            .members
            .iter()
            .filter(|m| m.flags.intersects(MemberDefFlags::COMPARE))
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(compared, ["NamespaceDefinition", "Name", "EnclosingType"]);
    }
}
