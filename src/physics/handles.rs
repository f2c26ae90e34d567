use crate::utilities::ArenaHandle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// Carries the slot index and the slot generation, so a handle kept past the removal of
        /// its entity is rejected rather than resolving to whatever reuses the slot.
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            #[inline(always)]
            pub const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            #[inline(always)]
            pub const fn index(self) -> u32 {
                self.index
            }

            #[inline(always)]
            pub const fn generation(self) -> u32 {
                self.generation
            }
        }

        impl ArenaHandle for $name {
            #[inline(always)]
            fn from_parts(index: u32, generation: u32) -> Self {
                $name::new(index, generation)
            }

            #[inline(always)]
            fn index(self) -> u32 {
                self.index
            }

            #[inline(always)]
            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "<{}v{}>"), self.index, self.generation)
            }
        }
    };
}

define_handle!(
    /// Identifies a body owned by a world.
    BodyHandle
);
define_handle!(
    /// Identifies a fixture attached to a body.
    FixtureHandle
);
define_handle!(
    /// Identifies a live contact between two fixture children.
    ContactHandle
);
define_handle!(
    /// Identifies a joint owned by a world.
    JointHandle
);
define_handle!(
    /// Identifies a controller registered with a world.
    ControllerHandle
);
