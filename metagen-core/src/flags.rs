//! Typed bit-flag families.
//!
//! The symbol model and the record schema both describe policy through small
//! sets of named bit flags. Each set of flags belongs to a *family*: a marker
//! type carrying the ordered list of flag names, their bit positions, and any
//! named masks. A family may refine another family, inheriting every ancestor
//! flag at its ancestor-assigned bit position and appending its own flags at
//! the next free bits.
//!
//! Combining sets from unrelated families is a compile error: the only way to
//! move a set across families is [`FlagSet::widen`], which is bounded by the
//! [`Refines`] marker trait, so family compatibility is settled at compile
//! time rather than checked on every bitwise operation.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors detected while verifying a flag family's declaration tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("duplicate flag name `{name}` in family {family}")]
    DuplicateFlagName {
        family: &'static str,
        name: &'static str,
    },
    #[error("flags `{first}` and `{second}` in family {family} share bit {bits:#x}")]
    DuplicateFlagBit {
        family: &'static str,
        first: &'static str,
        second: &'static str,
        bits: u32,
    },
    #[error("flag `{name}` in family {family} is not a single bit ({bits:#x})")]
    NotSingleBit {
        family: &'static str,
        name: &'static str,
        bits: u32,
    },
    #[error("mask `{name}` in family {family} covers no declared flag")]
    EmptyMask {
        family: &'static str,
        name: &'static str,
    },
}

/// A family of named bit flags.
///
/// Implemented by the marker types the [`flag_family!`] macro generates.
pub trait FlagFamily: Copy + Eq + std::hash::Hash + 'static {
    /// Family name, for diagnostics.
    const NAME: &'static str;

    /// Number of flags declared by this family and its ancestors.
    const FLAG_COUNT: u32;

    /// Named flags in bit order, inherited entries first.
    fn flags() -> Vec<(&'static str, u32)>;

    /// Named masks, inherited entries first.
    fn masks() -> Vec<(&'static str, u32)>;
}

/// Marker trait: `Self` inherits every flag of family `P`.
///
/// Reflexive; the `flag_family!` macro adds one impl per declared parent.
pub trait Refines<P: FlagFamily>: FlagFamily {}

impl<F: FlagFamily> Refines<F> for F {}

/// A set of flags belonging to family `F`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagSet<F: FlagFamily> {
    bits: u32,
    _family: PhantomData<F>,
}

impl<F: FlagFamily> FlagSet<F> {
    /// The empty set.
    pub const EMPTY: Self = Self::from_bits(0);

    /// Construct a set from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits,
            _family: PhantomData,
        }
    }

    /// The raw bit pattern.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// True when every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// True when `self` and `other` share at least one flag.
    pub const fn intersects(self, other: Self) -> bool {
        self.bits & other.bits != 0
    }

    /// Reinterpret this set in a descendant family.
    ///
    /// Bit positions are stable across refinement, so this is a pure
    /// type-level conversion.
    pub const fn widen<C: Refines<F>>(self) -> FlagSet<C> {
        FlagSet::from_bits(self.bits)
    }
}

impl<F: FlagFamily> Default for FlagSet<F> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<F: FlagFamily> BitOr for FlagSet<F> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::from_bits(self.bits | rhs.bits)
    }
}

impl<F: FlagFamily> BitOrAssign for FlagSet<F> {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl<F: FlagFamily> BitAnd for FlagSet<F> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::from_bits(self.bits & rhs.bits)
    }
}

impl<F: FlagFamily> BitAndAssign for FlagSet<F> {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits &= rhs.bits;
    }
}

impl<F: FlagFamily> BitXor for FlagSet<F> {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self::from_bits(self.bits ^ rhs.bits)
    }
}

impl<F: FlagFamily> Not for FlagSet<F> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_bits(!self.bits)
    }
}

impl<F: FlagFamily> fmt::Display for FlagSet<F> {
    /// Renders the set flag names joined by `|`, e.g. `(Public|Static)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for (name, bits) in F::flags() {
            if self.bits & bits != 0 {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, ")")
    }
}

impl<F: FlagFamily> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", F::NAME, self)
    }
}

impl<F: FlagFamily> Serialize for FlagSet<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check a family's declaration tables for collisions.
///
/// A duplicate flag or mask name is an explicit configuration error rather
/// than a silent overwrite.
pub fn verify_family<F: FlagFamily>() -> Result<(), FlagError> {
    let flags = F::flags();
    let masks = F::masks();

    for (i, &(name, bits)) in flags.iter().enumerate() {
        if bits.count_ones() != 1 {
            return Err(FlagError::NotSingleBit {
                family: F::NAME,
                name,
                bits,
            });
        }
        for &(other_name, other_bits) in &flags[i + 1..] {
            if name == other_name {
                return Err(FlagError::DuplicateFlagName {
                    family: F::NAME,
                    name,
                });
            }
            if bits == other_bits {
                return Err(FlagError::DuplicateFlagBit {
                    family: F::NAME,
                    first: name,
                    second: other_name,
                    bits,
                });
            }
        }
    }

    let all_flag_bits = flags.iter().fold(0u32, |acc, &(_, bits)| acc | bits);
    for (i, &(name, bits)) in masks.iter().enumerate() {
        if bits & all_flag_bits == 0 {
            return Err(FlagError::EmptyMask {
                family: F::NAME,
                name,
            });
        }
        if flags.iter().any(|&(fname, _)| fname == name) {
            return Err(FlagError::DuplicateFlagName {
                family: F::NAME,
                name,
            });
        }
        for &(other_name, _) in &masks[i + 1..] {
            if name == other_name {
                return Err(FlagError::DuplicateFlagName {
                    family: F::NAME,
                    name,
                });
            }
        }
    }

    Ok(())
}

/// Declare a flag family: a marker type, its ordered flags, and named masks.
///
/// Bits are assigned in declaration order. A derived family
/// (`family Child: Parent`) starts after the parent's last bit and re-exposes
/// inherited constants listed in its `inherit` block.
///
/// ```
/// use metagen_core::flag_family;
/// use metagen_core::flags::FlagSet;
///
/// flag_family! {
///     pub family Toppings {
///         flags {
///             "Cheese" => CHEESE,
///             "Basil" => BASIL,
///         }
///         masks {
///             "Green" => GREEN = BASIL,
///         }
///     }
/// }
///
/// assert_eq!((Toppings::CHEESE | Toppings::BASIL).to_string(), "(Cheese|Basil)");
/// ```
#[macro_export]
macro_rules! flag_family {
    // Root family.
    (
        $(#[$meta:meta])*
        $vis:vis family $name:ident {
            flags { $($fname:literal => $fconst:ident),+ $(,)? }
            $(masks { $($mname:literal => $mconst:ident = $($mpart:ident)|+),+ $(,)? })?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $name {
            $crate::flag_family!(@flags $name, 0u32, [], $($fname => $fconst,)+);
            $($crate::flag_family!(@masks $name, $($mname => $mconst = $($mpart)|+,)+);)?
        }

        impl $crate::flags::FlagFamily for $name {
            const NAME: &'static str = stringify!($name);
            const FLAG_COUNT: u32 = 0u32 $(+ $crate::flag_family!(@one $fconst))+;

            fn flags() -> Vec<(&'static str, u32)> {
                vec![$(($fname, Self::$fconst.bits())),+]
            }

            fn masks() -> Vec<(&'static str, u32)> {
                [$($(($mname, Self::$mconst.bits())),+)?].to_vec()
            }
        }
    };

    // Derived family.
    (
        $(#[$meta:meta])*
        $vis:vis family $name:ident : $parent:ident {
            $(inherit { $($iconst:ident),+ $(,)? })?
            flags { $($fname:literal => $fconst:ident),+ $(,)? }
            $(masks { $($mname:literal => $mconst:ident = $($mpart:ident)|+),+ $(,)? })?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::flags::Refines<$parent> for $name {}

        impl $name {
            $($(pub const $iconst: $crate::flags::FlagSet<$name> = $parent::$iconst.widen();)+)?
            $crate::flag_family!(@flags $name, <$parent as $crate::flags::FlagFamily>::FLAG_COUNT, [], $($fname => $fconst,)+);
            $($crate::flag_family!(@masks $name, $($mname => $mconst = $($mpart)|+,)+);)?
        }

        impl $crate::flags::FlagFamily for $name {
            const NAME: &'static str = stringify!($name);
            const FLAG_COUNT: u32 = <$parent as $crate::flags::FlagFamily>::FLAG_COUNT
                $(+ $crate::flag_family!(@one $fconst))+;

            fn flags() -> Vec<(&'static str, u32)> {
                let mut all = <$parent as $crate::flags::FlagFamily>::flags();
                all.extend([$(($fname, Self::$fconst.bits())),+]);
                all
            }

            fn masks() -> Vec<(&'static str, u32)> {
                let mut all = <$parent as $crate::flags::FlagFamily>::masks();
                let own: &[(&'static str, u32)] = &[$($(($mname, Self::$mconst.bits())),+)?];
                all.extend_from_slice(own);
                all
            }
        }
    };

    (@one $x:ident) => { 1u32 };

    (@flags $fam:ident, $base:expr, [$($done:ident)*],) => {};
    (@flags $fam:ident, $base:expr, [$($done:ident)*], $fname:literal => $fconst:ident, $($rest:tt)*) => {
        pub const $fconst: $crate::flags::FlagSet<$fam> = $crate::flags::FlagSet::from_bits(
            1u32 << ($base + (0u32 $(+ $crate::flag_family!(@one $done))*)),
        );
        $crate::flag_family!(@flags $fam, $base, [$($done)* $fconst], $($rest)*);
    };

    (@masks $fam:ident, $($mname:literal => $mconst:ident = $($mpart:ident)|+,)+) => {
        $(pub const $mconst: $crate::flags::FlagSet<$fam> =
            $crate::flags::FlagSet::from_bits(0u32 $(| $fam::$mpart.bits())+);)+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    flag_family! {
        pub family Base {
            flags {
                "Alpha" => ALPHA,
                "Beta" => BETA,
                "Gamma" => GAMMA,
            }
            masks {
                "Greek" => GREEK = ALPHA | BETA | GAMMA,
            }
        }
    }

    flag_family! {
        pub family Derived: Base {
            inherit { ALPHA, BETA, GAMMA, GREEK }
            flags {
                "Delta" => DELTA,
                "Epsilon" => EPSILON,
            }
            masks {
                "Late" => LATE = DELTA | EPSILON,
            }
        }
    }

    #[test]
    fn bits_are_assigned_in_declaration_order() {
        assert_eq!(Base::ALPHA.bits(), 0b001);
        assert_eq!(Base::BETA.bits(), 0b010);
        assert_eq!(Base::GAMMA.bits(), 0b100);
    }

    #[test]
    fn derived_family_continues_after_parent_bits() {
        assert_eq!(Derived::DELTA.bits(), 0b01000);
        assert_eq!(Derived::EPSILON.bits(), 0b10000);
        // Inherited flags keep their ancestor-assigned positions.
        assert_eq!(Derived::ALPHA.bits(), Base::ALPHA.bits());
    }

    #[test]
    fn no_two_flags_share_a_bit() {
        let flags = Derived::flags();
        for (i, &(_, a)) in flags.iter().enumerate() {
            assert_eq!(a.count_ones(), 1);
            for &(_, b) in &flags[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
    }

    #[test]
    fn mask_intersects_iff_a_member_flag_is_set() {
        assert!((Derived::ALPHA | Derived::DELTA).intersects(Derived::GREEK));
        assert!(!Derived::DELTA.intersects(Derived::GREEK));
        assert!(Derived::EPSILON.intersects(Derived::LATE));
    }

    #[test]
    fn widen_preserves_bits() {
        let widened: FlagSet<Derived> = Base::BETA.widen();
        assert_eq!(widened, Derived::BETA);
    }

    #[test]
    fn set_operations() {
        let set = Base::ALPHA | Base::GAMMA;
        assert!(set.contains(Base::ALPHA));
        assert!(!set.contains(Base::BETA));
        assert_eq!(set & Base::GAMMA, Base::GAMMA);
        assert_eq!(set ^ Base::ALPHA, Base::GAMMA);
        assert!((set & !Base::ALPHA & !Base::GAMMA).is_empty());
    }

    #[test]
    fn display_joins_set_flag_names() {
        assert_eq!((Base::ALPHA | Base::BETA).to_string(), "(Alpha|Beta)");
        assert_eq!(FlagSet::<Base>::EMPTY.to_string(), "()");
        assert_eq!(format!("{:?}", Base::GAMMA), "Base(Gamma)");
    }

    #[test]
    fn families_verify_clean() {
        assert_eq!(verify_family::<Base>(), Ok(()));
        assert_eq!(verify_family::<Derived>(), Ok(()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        struct Broken;
        impl FlagFamily for Broken {
            const NAME: &'static str = "Broken";
            const FLAG_COUNT: u32 = 2;
            fn flags() -> Vec<(&'static str, u32)> {
                vec![("Same", 1), ("Same", 2)]
            }
            fn masks() -> Vec<(&'static str, u32)> {
                Vec::new()
            }
        }
        assert_eq!(
            verify_family::<Broken>(),
            Err(FlagError::DuplicateFlagName {
                family: "Broken",
                name: "Same",
            })
        );
    }
}
