//! Per-body ground state.
//!
//! [`GroundState`] is rebuilt from scratch every tick. [`ProbeMemory`] is the only
//! thing carried from one tick to the next: the previous tick's ground state (whose
//! `is_grounded` is "last grounded" for edge detection and step arbitration) and the
//! one-shot `leave_ground` request.

use crate::types::{Point3, UnitVec3, Vec3};

/// Result of one tick of ground classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundState<B> {
    pub is_grounded: bool,
    /// Unit surface normal, or "up" when nothing was hit.
    pub normal: UnitVec3,
    pub contact_point: Point3,
    /// Moving body the contact surface belongs to.
    pub carrier: Option<B>,
    /// Position correction applied this tick when grounded.
    pub step_offset: Vec3,
}

impl<B> GroundState<B> {
    /// Nothing underfoot.
    pub fn airborne(up: UnitVec3) -> Self {
        Self {
            is_grounded: false,
            normal: up,
            contact_point: Point3::origin(),
            carrier: None,
            step_offset: Vec3::zeros(),
        }
    }
}

/// Cross-tick state of one body's ground probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeMemory<B> {
    pub ground: GroundState<B>,
    /// Force the next evaluation to classify the body as airborne.
    pub leave_ground: bool,
}

impl<B> ProbeMemory<B> {
    pub fn new(up: UnitVec3) -> Self {
        Self {
            ground: GroundState::airborne(up),
            leave_ground: false,
        }
    }

    #[inline]
    pub fn last_grounded(&self) -> bool {
        self.ground.is_grounded
    }

    /// Skip ground snapping for exactly one evaluation, e.g. on the tick of a jump.
    #[inline]
    pub fn request_leave_ground(&mut self) {
        self.leave_ground = true;
    }
}

impl<B> Default for ProbeMemory<B> {
    fn default() -> Self {
        Self::new(Vec3::y_axis())
    }
}
