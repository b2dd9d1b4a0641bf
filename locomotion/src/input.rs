//! Control input snapshots and view-relative direction mapping.
//!
//! The controller polls an [`InputSource`] exactly once per step and works
//! off the copied snapshot for the rest of the step, so a host feeding input
//! from another thread or an event queue can never tear a step's view of the
//! controls.

use crate::constants::{NORM_EPS_SQ, speed_scale};
use crate::types::{Vec2, Vec3};

/// One step's worth of control input.
///
/// `direction` axes are in `[-1, 1]` with `+y` meaning view-forward; device
/// glue owns any axis flips. `jump` and `attack` are held levels, not edges;
/// the controller edge-detects attacks itself.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub direction: Vec2,
    pub jump: bool,
    pub attack: bool,
}

impl InputSnapshot {
    /// The same snapshot with the direction clamped to the unit disc.
    #[inline]
    pub fn clamped(mut self) -> Self {
        let len = self.direction.norm();
        if len > 1.0 {
            self.direction /= len;
        }
        self
    }
}

/// Source of control input, polled exactly once per step.
pub trait InputSource {
    fn sample(&mut self) -> InputSnapshot;
}

/// A snapshot is its own (constant) source; convenient for held inputs in
/// tests and scripted sequences.
impl InputSource for InputSnapshot {
    fn sample(&mut self) -> InputSnapshot {
        *self
    }
}

/// Horizontal basis of the active viewpoint, used to turn 2-D input into a
/// world-space direction.
///
/// Both vectors must be unit length and horizontal (zero `y`).
pub trait ViewBasis {
    fn forward(&self) -> Vec3;
    fn right(&self) -> Vec3;
}

/// A fixed horizontal basis, rebuilt by the host whenever its camera moves.
#[derive(Clone, Copy, Debug)]
pub struct FixedViewBasis {
    forward: Vec3,
    right: Vec3,
}

impl FixedViewBasis {
    /// Build a basis from any viewpoint forward vector.
    ///
    /// The vector is flattened to the horizontal plane and normalized; a
    /// degenerate input (straight up or down) falls back to [`world_axes`](Self::world_axes).
    pub fn from_forward(forward: Vec3) -> Self {
        let flat = Vec3::new(forward.x, 0.0, forward.z);
        let len_sq = flat.norm_squared();
        if len_sq <= NORM_EPS_SQ {
            return Self::world_axes();
        }
        let forward = flat / len_sq.sqrt();
        // Y-up right-handed: right = forward x up.
        let right = Vec3::new(-forward.z, 0.0, forward.x);
        Self { forward, right }
    }

    /// The identity basis: forward is world `-Z`, right is world `+X`.
    pub fn world_axes() -> Self {
        Self {
            forward: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

impl Default for FixedViewBasis {
    fn default() -> Self {
        Self::world_axes()
    }
}

impl ViewBasis for FixedViewBasis {
    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn right(&self) -> Vec3 {
        self.right
    }
}

/// Map an input direction into a scaled world-space horizontal direction.
///
/// The direction is expressed in the view basis, flattened to the horizontal
/// plane, normalized, then scaled by the analog remap (deflection 0 maps to
/// the minimum controller speed scale, full deflection to the maximum). The
/// returned vector's norm is that speed scale. Returns `None` when the input
/// or the flattened direction is degenerate.
pub fn world_direction(view: &impl ViewBasis, direction: Vec2) -> Option<Vec3> {
    let magnitude_sq = direction.norm_squared();
    if magnitude_sq <= NORM_EPS_SQ {
        return None;
    }

    let world = view.right() * direction.x + view.forward() * direction.y;
    let flat = Vec3::new(world.x, 0.0, world.z);
    let flat_len_sq = flat.norm_squared();
    if flat_len_sq <= NORM_EPS_SQ {
        return None;
    }

    Some(flat / flat_len_sq.sqrt() * speed_scale(magnitude_sq.sqrt()))
}
