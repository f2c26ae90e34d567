//! Error types for world mutation and shape construction.

use thiserror::Error;

use super::handles::{BodyHandle, ControllerHandle, FixtureHandle, JointHandle};

/// Result type for world operations.
pub type WorldResult<T> = std::result::Result<T, WorldError>;

/// Errors reported when a world rejects a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// The handle does not name a body owned by this world.
    #[error("unknown body: {0}")]
    UnknownBody(BodyHandle),

    /// The handle does not name a fixture owned by this world.
    #[error("unknown fixture: {0}")]
    UnknownFixture(FixtureHandle),

    /// The handle does not name a joint owned by this world.
    #[error("unknown joint: {0}")]
    UnknownJoint(JointHandle),

    /// The handle does not name a controller registered with this world.
    #[error("unknown controller: {0}")]
    UnknownController(ControllerHandle),

    /// The body is already queued for removal.
    #[error("{0} is already pending removal")]
    BodyPendingRemoval(BodyHandle),

    /// The joint is already queued for removal.
    #[error("{0} is already pending removal")]
    JointPendingRemoval(JointHandle),

    /// The controller is already queued for removal.
    #[error("{0} is already pending removal")]
    ControllerPendingRemoval(ControllerHandle),

    /// A joint description could not be turned into a joint.
    #[error("invalid joint: {reason}")]
    InvalidJoint {
        /// Why the joint was rejected.
        reason: &'static str,
    },

    /// World settings failed validation.
    #[error("invalid settings: {reason}")]
    InvalidSettings {
        /// The offending setting.
        reason: String,
    },
}

/// Errors reported when a shape cannot be built from its input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    /// A polygon needs at least three distinct points that are not collinear.
    #[error("degenerate polygon: {0} usable vertices")]
    DegeneratePolygon(usize),

    /// More points than the narrow phase supports.
    #[error("polygon has {count} vertices, the maximum is {max}")]
    TooManyVertices {
        /// Number of points supplied.
        count: usize,
        /// Supported maximum.
        max: usize,
    },

    /// Radii and extents must be positive and finite.
    #[error("invalid dimension: {0}")]
    InvalidDimension(f32),

    /// An edge needs two distinct endpoints.
    #[error("degenerate edge")]
    DegenerateEdge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_handle() {
        let err = WorldError::UnknownBody(BodyHandle::new(7, 0));
        assert_eq!(err.to_string(), "unknown body: BodyHandle<7v0>");
        let err = WorldError::JointPendingRemoval(JointHandle::new(2, 0));
        assert_eq!(err.to_string(), "JointHandle<2v0> is already pending removal");
    }
}
