//! Handles for TESSERA entities.
//!
//! Model entities live in arenas and are addressed by small integer
//! handles. Handles are only meaningful together with the arena that issued
//! them; a handle of one model must never be used to index another model.

use serde::{Deserialize, Serialize};

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create from a raw arena index
            #[must_use]
            #[allow(clippy::cast_possible_truncation)]
            pub const fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            /// Get the raw arena index
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

arena_handle!(
    /// Module identifier - identifies a module of a model
    ModuleId,
    "mod"
);

arena_handle!(
    /// Type identifier - identifies a class, enumeration, primitive or association
    TypeId,
    "type"
);

arena_handle!(
    /// Part identifier - identifies a property, reference or association end
    PartId,
    "part"
);

arena_handle!(
    /// Object reference - an instance created by an external factory
    ObjectRef,
    "obj"
);

arena_handle!(
    /// Role reference - a security role created by an external factory
    RoleRef,
    "role"
);

arena_handle!(
    /// Group reference - a group known to an external factory
    GroupRef,
    "group"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip_index() {
        let id = TypeId::from_index(17);
        assert_eq!(id.index(), 17);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(ModuleId::from_index(0).to_string(), "mod_0");
        assert_eq!(PartId::from_index(3).to_string(), "part_3");
        assert_eq!(RoleRef::from_index(9).to_string(), "role_9");
    }

    #[test]
    fn test_handle_ordering() {
        assert!(TypeId::from_index(1) < TypeId::from_index(2));
    }

    #[test]
    fn test_handle_debug() {
        let id = ObjectRef::from_index(5);
        assert_eq!(format!("{:?}", id), "ObjectRef(5)");
    }
}
