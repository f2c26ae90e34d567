mod tree;

pub use self::tree::{Tree, NULL_NODE};
