mod bounding_box;
pub use self::bounding_box::BoundingBox;

pub mod collections;
pub use self::collections::{Arena, ArenaHandle};

pub mod math_helper;

mod matrix;
pub use self::matrix::{Mat22, Mat33};

pub mod memory;

mod rotation;
pub use self::rotation::Rot;
