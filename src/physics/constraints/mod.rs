mod distance_joint;
mod joint;
mod motor_settings;
mod mouse_joint;
mod revolute_joint;
mod spring_settings;
mod weld_joint;

pub use self::distance_joint::DistanceJoint;
pub use self::joint::{Joint, JointDescription, JointKind, JointSolver, SolverBody, SolverData};
pub use self::motor_settings::MotorSettings;
pub use self::mouse_joint::MouseJoint;
pub use self::revolute_joint::{AngleLimits, RevoluteJoint};
pub use self::spring_settings::SpringSettings;
pub use self::weld_joint::WeldJoint;
