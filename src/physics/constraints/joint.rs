use glam::Vec2;

use super::distance_joint::DistanceJoint;
use super::mouse_joint::MouseJoint;
use super::revolute_joint::RevoluteJoint;
use super::weld_joint::WeldJoint;
use crate::physics::body_properties::{Position, Velocity};
use crate::physics::handles::BodyHandle;
use crate::physics::solve_description::TimeStep;

/// Per-solve view of one side of a joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverBody {
    /// Index into the island's position and velocity arrays. `None` for the world anchor.
    pub index: Option<usize>,
    pub local_center: Vec2,
    pub inv_mass: f32,
    pub inv_i: f32,
}

impl SolverBody {
    /// The immovable world frame, used when a joint has no second body.
    pub const WORLD: Self = Self {
        index: None,
        local_center: Vec2::ZERO,
        inv_mass: 0.0,
        inv_i: 0.0,
    };
}

impl Default for SolverBody {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Island state handed to joint solvers.
pub struct SolverData<'a> {
    pub step: TimeStep,
    pub positions: &'a mut [Position],
    pub velocities: &'a mut [Velocity],
}

impl SolverData<'_> {
    /// Position of a solver body. The world frame sits at the origin.
    #[inline]
    pub fn position(&self, body: &SolverBody) -> Position {
        body.index.map_or_else(Position::default, |i| self.positions[i])
    }

    #[inline]
    pub fn set_position(&mut self, body: &SolverBody, position: Position) {
        if let Some(i) = body.index {
            self.positions[i] = position;
        }
    }

    #[inline]
    pub fn velocity(&self, body: &SolverBody) -> Velocity {
        body.index.map_or_else(Velocity::default, |i| self.velocities[i])
    }

    #[inline]
    pub fn set_velocity(&mut self, body: &SolverBody, velocity: Velocity) {
        if let Some(i) = body.index {
            self.velocities[i] = velocity;
        }
    }
}

/// Lifecycle every joint implements, driven once per island solve.
pub trait JointSolver {
    /// Computes effective masses at the current pose and applies warm starting impulses,
    /// scaled by the ratio of the previous step's `dt` to this one's.
    fn init_velocity_constraints(&mut self, a: SolverBody, b: SolverBody, data: &mut SolverData);

    /// Runs once per velocity iteration.
    fn solve_velocity_constraints(&mut self, data: &mut SolverData);

    /// Runs once per position iteration. Returns true when the joint error is within tolerance.
    fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool;

    /// Reaction force on body B at its anchor, from the last accumulated impulse.
    fn reaction_force(&self, inv_dt: f32) -> Vec2;

    /// Reaction torque on body B.
    fn reaction_torque(&self, inv_dt: f32) -> f32;

    /// Moves anchors expressed in world coordinates when the world origin shifts.
    fn shift_origin(&mut self, _new_origin: Vec2, _world_anchored: bool) {}
}

/// The supported joint types.
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    Revolute(RevoluteJoint),
    Distance(DistanceJoint),
    Weld(WeldJoint),
    Mouse(MouseJoint),
}

impl JointKind {
    fn solver(&self) -> &dyn JointSolver {
        match self {
            JointKind::Revolute(j) => j,
            JointKind::Distance(j) => j,
            JointKind::Weld(j) => j,
            JointKind::Mouse(j) => j,
        }
    }

    pub(crate) fn solver_mut(&mut self) -> &mut dyn JointSolver {
        match self {
            JointKind::Revolute(j) => j,
            JointKind::Distance(j) => j,
            JointKind::Weld(j) => j,
            JointKind::Mouse(j) => j,
        }
    }

    /// Checks the parameters of the joint, given whether it has a second body.
    pub(crate) fn validate(&self, has_body_b: bool) -> Result<(), &'static str> {
        match self {
            JointKind::Revolute(j) => j.validate(),
            JointKind::Distance(j) => j.validate(),
            JointKind::Weld(_) => Ok(()),
            JointKind::Mouse(j) => {
                if has_body_b {
                    return Err("a mouse joint drags a single body toward a world target");
                }
                j.validate()
            }
        }
    }
}

impl From<RevoluteJoint> for JointKind {
    fn from(joint: RevoluteJoint) -> Self {
        JointKind::Revolute(joint)
    }
}

impl From<DistanceJoint> for JointKind {
    fn from(joint: DistanceJoint) -> Self {
        JointKind::Distance(joint)
    }
}

impl From<WeldJoint> for JointKind {
    fn from(joint: WeldJoint) -> Self {
        JointKind::Weld(joint)
    }
}

impl From<MouseJoint> for JointKind {
    fn from(joint: MouseJoint) -> Self {
        JointKind::Mouse(joint)
    }
}

/// Describes a joint to add to the world.
#[derive(Debug, Clone, PartialEq)]
pub struct JointDescription {
    pub body_a: BodyHandle,
    /// `None` anchors the second side of the joint to the world.
    pub body_b: Option<BodyHandle>,
    /// Whether the connected bodies still collide with each other.
    pub collide_connected: bool,
    /// Reaction force or torque above which the joint disables itself.
    pub breakpoint: Option<f32>,
    pub kind: JointKind,
    pub user_data: u64,
}

impl JointDescription {
    pub fn new(body_a: BodyHandle, body_b: Option<BodyHandle>, kind: impl Into<JointKind>) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
            breakpoint: None,
            kind: kind.into(),
            user_data: 0,
        }
    }

    #[must_use]
    pub fn with_collide_connected(mut self, flag: bool) -> Self {
        self.collide_connected = flag;
        self
    }

    #[must_use]
    pub fn with_breakpoint(mut self, breakpoint: f32) -> Self {
        self.breakpoint = Some(breakpoint);
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.body_b == Some(self.body_a) {
            return Err("a joint cannot connect a body to itself");
        }
        if let Some(breakpoint) = self.breakpoint {
            if !breakpoint.is_finite() || breakpoint <= 0.0 {
                return Err("breakpoint must be finite and positive");
            }
        }
        self.kind.validate(self.body_b.is_some())
    }
}

/// A constraint between one body and either a second body or the world.
#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: Option<BodyHandle>,
    pub(crate) collide_connected: bool,
    pub(crate) enabled: bool,
    pub(crate) breakpoint: Option<f32>,
    pub(crate) island_flag: bool,
    pub(crate) in_world: bool,
    pub(crate) kind: JointKind,
    pub user_data: u64,
}

impl Joint {
    pub(crate) fn new(description: JointDescription) -> Self {
        Self {
            body_a: description.body_a,
            body_b: description.body_b,
            collide_connected: description.collide_connected,
            enabled: true,
            breakpoint: description.breakpoint,
            island_flag: false,
            in_world: false,
            kind: description.kind,
            user_data: description.user_data,
        }
    }

    #[inline]
    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    #[inline]
    pub fn body_b(&self) -> Option<BodyHandle> {
        self.body_b
    }

    #[inline]
    pub fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    /// Disabled joints are skipped by island building and the solver.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_in_world(&self) -> bool {
        self.in_world
    }

    #[inline]
    pub fn breakpoint(&self) -> Option<f32> {
        self.breakpoint
    }

    pub fn set_breakpoint(&mut self, breakpoint: Option<f32>) {
        debug_assert!(breakpoint.map_or(true, |b| b.is_finite() && b > 0.0));
        self.breakpoint = breakpoint;
    }

    #[inline]
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    /// Mutable access to the joint parameters. Sleeping bodies are not woken; wake them if
    /// the change should take effect immediately.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut JointKind {
        &mut self.kind
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.kind.solver().reaction_force(inv_dt)
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.kind.solver().reaction_torque(inv_dt)
    }

    /// Whether the reaction at `inv_dt` exceeds the breakpoint.
    pub(crate) fn exceeds_breakpoint(&self, inv_dt: f32) -> bool {
        let Some(breakpoint) = self.breakpoint else {
            return false;
        };
        let force = self.reaction_force(inv_dt);
        let torque = self.reaction_torque(inv_dt);
        force.length_squared() > breakpoint * breakpoint || torque * torque > breakpoint * breakpoint
    }

    /// The body on the other side of the joint from `body`.
    #[inline]
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if body == self.body_a {
            self.body_b
        } else {
            Some(self.body_a)
        }
    }

    pub(crate) fn shift_origin(&mut self, new_origin: Vec2) {
        let world_anchored = self.body_b.is_none();
        self.kind.solver_mut().shift_origin(new_origin, world_anchored);
    }
}
