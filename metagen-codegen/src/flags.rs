//! Flag families of the C# symbol model.

use metagen_core::flag_family;
use metagen_core::flags::{FlagSet, Refines};

flag_family! {
    /// Accessibility flags shared by types and members.
    pub family AccessFlags {
        flags {
            "Public" => PUBLIC,
            "Internal" => INTERNAL,
            "Protected" => PROTECTED,
            "Private" => PRIVATE,
            "CsExclude" => CS_EXCLUDE,
        }
        masks {
            "Visibility" => VISIBILITY = PUBLIC | INTERNAL | PROTECTED | PRIVATE,
        }
    }
}

flag_family! {
    /// Flags applicable to type members.
    pub family MemberFlags: AccessFlags {
        inherit { PUBLIC, INTERNAL, PROTECTED, PRIVATE, CS_EXCLUDE, VISIBILITY }
        flags {
            "Static" => STATIC,
            "Method" => METHOD,
            "Property" => PROPERTY,
            "Override" => OVERRIDE,
            "Serialize" => SERIALIZE,
            "Explicit" => EXPLICIT,
            "Implicit" => IMPLICIT,
            "Operator" => OPERATOR,
            "Abstract" => ABSTRACT,
            "Partial" => PARTIAL,
            "Virtual" => VIRTUAL,
            "Extension" => EXTENSION,
            "New" => NEW,
            "DebugOnly" => DEBUG_ONLY,
            "Sealed" => SEALED,
        }
        masks {
            "Kind" => KIND = METHOD | PROPERTY,
        }
    }
}

flag_family! {
    /// Flags applicable to type definitions.
    pub family TypeFlags: AccessFlags {
        inherit { PUBLIC, INTERNAL, PROTECTED, PRIVATE, CS_EXCLUDE, VISIBILITY }
        flags {
            "Class" => CLASS,
            "Struct" => STRUCT,
            "Interface" => INTERFACE,
            "Enum" => ENUM,
            "Abstract" => ABSTRACT,
            "Partial" => PARTIAL,
            "Static" => STATIC,
            "Array" => ARRAY,
        }
        masks {
            "Kind" => KIND = CLASS | STRUCT | INTERFACE | ENUM,
        }
    }
}

flag_family! {
    /// Type flags extended with enum-specific behavior.
    pub family EnumFlags: TypeFlags {
        inherit {
            PUBLIC, INTERNAL, PROTECTED, PRIVATE, CS_EXCLUDE, VISIBILITY,
            CLASS, STRUCT, INTERFACE, ENUM, ABSTRACT, PARTIAL, STATIC, ARRAY, KIND,
        }
        flags {
            "HasFlagValues" => HAS_FLAG_VALUES,
        }
    }
}

impl Refines<AccessFlags> for EnumFlags {}

/// The C# access keyword for a flag set, or `""` when no visibility is set.
pub fn access_keyword<F: Refines<AccessFlags>>(flags: FlagSet<F>) -> &'static str {
    if flags.intersects(AccessFlags::PUBLIC.widen()) {
        "public"
    } else if flags.intersects(AccessFlags::INTERNAL.widen()) {
        "internal"
    } else if flags.intersects(AccessFlags::PROTECTED.widen()) {
        "protected"
    } else if flags.intersects(AccessFlags::PRIVATE.widen()) {
        "private"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use metagen_core::flags::verify_family;

    use super::*;

    #[test]
    fn families_verify_clean() {
        assert_eq!(verify_family::<AccessFlags>(), Ok(()));
        assert_eq!(verify_family::<MemberFlags>(), Ok(()));
        assert_eq!(verify_family::<TypeFlags>(), Ok(()));
        assert_eq!(verify_family::<EnumFlags>(), Ok(()));
    }

    #[test]
    fn inherited_flags_keep_their_positions() {
        assert_eq!(MemberFlags::PUBLIC.bits(), AccessFlags::PUBLIC.bits());
        assert_eq!(TypeFlags::PRIVATE.bits(), AccessFlags::PRIVATE.bits());
        assert_eq!(EnumFlags::ENUM.bits(), TypeFlags::ENUM.bits());
    }

    #[test]
    fn own_flags_start_after_inherited_ones() {
        assert_eq!(MemberFlags::STATIC.bits(), 1 << 5);
        assert_eq!(TypeFlags::CLASS.bits(), 1 << 5);
        assert_eq!(EnumFlags::HAS_FLAG_VALUES.bits(), 1 << 13);
    }

    #[test]
    fn visibility_mask_covers_exactly_the_access_flags() {
        let expected = AccessFlags::PUBLIC
            | AccessFlags::INTERNAL
            | AccessFlags::PROTECTED
            | AccessFlags::PRIVATE;
        assert_eq!(AccessFlags::VISIBILITY, expected);
        assert!(!AccessFlags::VISIBILITY.intersects(AccessFlags::CS_EXCLUDE));
    }

    #[test]
    fn access_keyword_prefers_the_widest_visibility() {
        assert_eq!(access_keyword(MemberFlags::PUBLIC), "public");
        assert_eq!(
            access_keyword(MemberFlags::PUBLIC | MemberFlags::PRIVATE),
            "public"
        );
        assert_eq!(access_keyword(TypeFlags::INTERNAL), "internal");
        assert_eq!(access_keyword(MemberFlags::STATIC), "");
    }
}
