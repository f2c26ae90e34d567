mod circle;
pub use self::circle::CircleShape;

mod edge;
pub use self::edge::EdgeShape;

mod polygon;
pub use self::polygon::PolygonShape;

mod ray;
pub use self::ray::{RayCastInput, RayCastOutput};

mod shape;
pub use self::shape::{ConvexShape, Shape, ShapeType};
