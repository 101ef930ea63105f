//! Flag families of the schema vocabulary.

use metagen_core::flag_family;

flag_family! {
    /// Flags applicable to a schema record definition.
    pub family RecordDefFlags {
        flags {
            // The record is an enum definition.
            "Enum" => ENUM,
            // `[Flags]` should be applied to the enum definition.
            "Flags" => FLAGS,
            // Only members flagged Compare participate in equality; otherwise
            // every member does.
            "CustomCompare" => CUSTOM_COMPARE,
            // The generated Equals is potentially reentrant on the same
            // instance and needs a fast exit path.
            "ReentrantEquals" => REENTRANT_EQUALS,
        }
    }
}

flag_family! {
    /// Flags applicable to a member of a schema record.
    pub family MemberDefFlags {
        flags {
            // Dictionary<string, T> for the writer, List<T> for the reader.
            "Map" => MAP,
            "List" => LIST,
            "Array" => ARRAY,
            // The member holds a handle to another record.
            "RecordRef" => RECORD_REF,
            // The referenced record is logically owned by this one;
            // otherwise it may be shared (such as a TypeReference).
            "Child" => CHILD,
            // Usable as the record's simple name for diagnostics.
            "Name" => NAME,
            // Not written to or read from metadata.
            "NotPersisted" => NOT_PERSISTED,
            // Participates in equality when the record is CustomCompare.
            "Compare" => COMPARE,
            // The collection is safe to enumerate in GetHashCode without
            // reentrancy.
            "EnumerateForHashCode" => ENUMERATE_FOR_HASH_CODE,
        }
        masks {
            "Collection" => COLLECTION = MAP | LIST | ARRAY,
            "Sequence" => SEQUENCE = LIST | ARRAY,
            "Ref" => REF = RECORD_REF,
        }
    }
}

#[cfg(test)]
mod tests {
    use metagen_core::flags::verify_family;

    use super::*;

    #[test]
    fn families_verify_clean() {
        assert_eq!(verify_family::<RecordDefFlags>(), Ok(()));
        assert_eq!(verify_family::<MemberDefFlags>(), Ok(()));
    }

    #[test]
    fn collection_masks_cover_the_expected_flags() {
        assert!(MemberDefFlags::MAP.intersects(MemberDefFlags::COLLECTION));
        assert!(MemberDefFlags::ARRAY.intersects(MemberDefFlags::SEQUENCE));
        assert!(!MemberDefFlags::MAP.intersects(MemberDefFlags::SEQUENCE));
        assert!(MemberDefFlags::RECORD_REF.intersects(MemberDefFlags::REF));
    }
}
