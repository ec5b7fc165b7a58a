//! Opaque ID newtypes for the two memoised instance graphs.

use crate::arena::ArenaId;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a monomorphised module instance, addressed by
    /// `(declaration-name, parameter-tuple)` memoisation key.
    ModuleInstanceId
);

define_id!(
    /// Opaque, copyable ID for a monomorphised interface instance, addressed
    /// by `(declaration-name, parameter-tuple)` memoisation key.
    InterfaceInstanceId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = ModuleInstanceId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
    }

    #[test]
    fn id_equality_and_hash() {
        let a = InterfaceInstanceId::from_raw(3);
        let b = InterfaceInstanceId::from_raw(3);
        let c = InterfaceInstanceId::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
    }
}
