mod broad_phase;
mod collide_circle;
mod collide_edge;
mod collide_polygon;
mod contact;
mod contact_manager;
mod contact_manifold;
mod distance;
mod narrow_phase_callbacks;
mod time_of_impact;

pub use self::broad_phase::{BroadPhase, DynamicTreeBroadPhase, ProxyData, ProxyId};
pub use self::collide_circle::{collide_circles, collide_polygon_and_circle};
pub use self::collide_edge::{collide_edge_and_circle, collide_edge_and_polygon};
pub use self::collide_polygon::collide_polygons;
pub use self::contact::{mix_friction, mix_restitution, Contact};
pub(crate) use self::contact_manager::ContactSinks;
pub use self::contact_manager::ContactManager;
pub use self::contact_manifold::{
    ContactId, FeatureType, Manifold, ManifoldPoint, ManifoldType, WorldManifold,
};
pub use self::distance::{distance, test_overlap, DistanceOutput, DistanceProxy};
pub use self::narrow_phase_callbacks::{
    ContactFilter, ContactImpulse, ContactListener, NoopContactListener,
};
pub use self::time_of_impact::{time_of_impact, ToiInput, ToiOutput, ToiState, MAX_TOI_ITERATIONS};
