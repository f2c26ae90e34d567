use glam::Vec2;

use super::circle::CircleShape;
use super::edge::EdgeShape;
use super::polygon::PolygonShape;
use super::ray::{RayCastInput, RayCastOutput};
use crate::physics::body_properties::{MassData, Transform};
use crate::physics::collision_detection::DistanceProxy;
use crate::utilities::BoundingBox;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines functions available on all convex shapes.
/// Convex shapes have no hollowed out regions; any line passing through a convex shape
/// will never enter and exit more than once.
pub trait ConvexShape {
    /// Skin radius around the shape's core. For circles this is the circle radius.
    fn radius(&self) -> f32;

    /// Computes the bounding box of the shape under the given transform.
    fn compute_bounds(&self, transform: &Transform) -> BoundingBox;

    /// Computes mass, centroid and inertia about the shape origin for a given density.
    fn compute_mass(&self, density: f32) -> MassData;

    /// Tests whether a world point lies inside the shape.
    fn test_point(&self, transform: &Transform, point: Vec2) -> bool;

    /// Casts a segment against the shape.
    fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput>;

    /// Core geometry used by distance and time of impact queries.
    fn distance_proxy(&self) -> DistanceProxy<'_>;
}

/// Discriminates the supported shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeType {
    Circle,
    Edge,
    Polygon,
}

/// Geometry attached to a fixture.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Circle(CircleShape),
    Edge(EdgeShape),
    Polygon(PolygonShape),
}

impl Shape {
    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Edge(_) => ShapeType::Edge,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// Number of broad-phase children. Every supported shape is a single convex piece.
    #[inline]
    pub fn child_count(&self) -> usize {
        1
    }

    #[inline]
    fn as_convex(&self) -> &dyn ConvexShape {
        match self {
            Shape::Circle(s) => s,
            Shape::Edge(s) => s,
            Shape::Polygon(s) => s,
        }
    }
}

impl ConvexShape for Shape {
    fn radius(&self) -> f32 {
        self.as_convex().radius()
    }

    fn compute_bounds(&self, transform: &Transform) -> BoundingBox {
        self.as_convex().compute_bounds(transform)
    }

    fn compute_mass(&self, density: f32) -> MassData {
        self.as_convex().compute_mass(density)
    }

    fn test_point(&self, transform: &Transform, point: Vec2) -> bool {
        self.as_convex().test_point(transform, point)
    }

    fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput> {
        self.as_convex().ray_cast(input, transform)
    }

    fn distance_proxy(&self) -> DistanceProxy<'_> {
        self.as_convex().distance_proxy()
    }
}

impl From<CircleShape> for Shape {
    fn from(shape: CircleShape) -> Self {
        Shape::Circle(shape)
    }
}

impl From<EdgeShape> for Shape {
    fn from(shape: EdgeShape) -> Self {
        Shape::Edge(shape)
    }
}

impl From<PolygonShape> for Shape {
    fn from(shape: PolygonShape) -> Self {
        Shape::Polygon(shape)
    }
}
