//! Sliding collision resolution.
//!
//! Converts a desired per-step displacement into a collision-safe one by
//! sweeping the character volume and redirecting the blocked remainder along
//! each contact's sliding plane. The redirect keeps at most
//! `friction * (1 - fraction)` of the incoming speed, so iteration never
//! amplifies motion and head-on contacts bleed out within the iteration cap.

use crate::constants::{
    CONTACT_FRICTION, GLANCING_FRICTION, GLANCING_OFFSET, GLANCING_THRESHOLD,
    MAX_SLIDE_ITERATIONS, NORM_EPS_SQ, stop_speed_sq,
};
use crate::mask::CollisionFilter;
use crate::query::SupportQuery;
use crate::types::{SweepContact, SweepShape, Transform, Vec3};

/// Parameters for a single sliding resolution.
#[derive(Clone, Copy, Debug)]
pub struct SlideRequest {
    /// Starting world position of the swept shape's pivot.
    pub start: Vec3,
    /// Desired world-space displacement for this step (meters).
    pub velocity: Vec3,
    /// Volume swept through the world.
    pub shape: SweepShape,
    /// Geometry layers the sweep collides with.
    pub filter: CollisionFilter,
    /// Max redirect iterations (for corners).
    pub max_iterations: u32,
}

impl SlideRequest {
    #[inline]
    pub fn with_defaults(
        start: Vec3,
        velocity: Vec3,
        shape: SweepShape,
        filter: CollisionFilter,
    ) -> Self {
        Self {
            start,
            velocity,
            shape,
            filter,
            max_iterations: MAX_SLIDE_ITERATIONS,
        }
    }
}

/// Result of a sliding resolution.
#[derive(Clone, Copy, Debug)]
pub struct SlideResult {
    /// Final pivot position after consuming or redirecting the displacement.
    pub end_pos: Vec3,
    /// The last contact processed, if any.
    pub last_contact: Option<SweepContact>,
    /// Displacement still unconsumed when the iteration cap cut resolution
    /// short (zero otherwise).
    pub remaining: Vec3,
}

/// Resolve `req.velocity` against the world by iterative sweep-and-redirect.
///
/// Behavior:
/// - A displacement at or below the stop speed returns `start` untouched and
///   issues no queries at all.
/// - An unobstructed sweep consumes the whole displacement exactly.
/// - On contact, the pivot advances to the impact position and the leftover
///   displacement is redirected along the contact plane, scaled by the
///   contact's friction; resolution stops once the redirected remainder
///   drops to the stop speed or the iteration cap is reached.
pub fn slide_along_surfaces(world: &impl SupportQuery, req: SlideRequest) -> SlideResult {
    let mut start = req.start;
    let mut velocity = req.velocity;

    // Negligible steps resolve in place without touching the world.
    if velocity.norm_squared() <= stop_speed_sq() {
        return SlideResult {
            end_pos: start,
            last_contact: None,
            remaining: velocity,
        };
    }

    let mut last_contact = None;

    for _ in 0..req.max_iterations {
        if velocity.norm_squared() <= stop_speed_sq() {
            break;
        }

        let from = Transform::from_translation(start);
        let to = Transform::from_translation(start + velocity);
        let contacts = world.convex_sweep(&req.shape, &from, &to, req.filter);

        let Some(&closest) = contacts.first() else {
            // Clear path: consume the whole displacement and finish.
            return SlideResult {
                end_pos: start + velocity,
                last_contact,
                remaining: Vec3::zeros(),
            };
        };

        let (redirected, contact_pos) = redirect_at_contact(&closest, start, velocity);
        start = contact_pos;
        velocity = redirected;
        last_contact = Some(closest);
    }

    SlideResult {
        end_pos: start,
        last_contact,
        remaining: velocity,
    }
}

/// Redirect a blocked displacement along the contact's sliding plane.
///
/// Returns `(redirected_velocity, position_at_contact)`. The caller must
/// guarantee `velocity` is non-negligible.
///
/// The new displacement points from `start` toward the original destination
/// projected onto the plane through the contact point, carries
/// `friction * (1 - fraction)` of the incoming speed, and for glancing
/// contacts is nudged just off the surface so the next sweep does not
/// immediately re-hit it.
fn redirect_at_contact(contact: &SweepContact, start: Vec3, velocity: Vec3) -> (Vec3, Vec3) {
    let original_distance = velocity.norm();

    let mut fraction = contact.fraction;
    if !(0.0..=1.0).contains(&fraction) {
        log::debug!("sweep contact fraction {fraction} outside [0, 1]; clamping");
        fraction = fraction.clamp(0.0, 1.0);
    }

    let contact_pos = start + velocity * fraction;

    let n_len_sq = contact.normal.norm_squared();
    if n_len_sq <= NORM_EPS_SQ {
        // No usable plane; kill the motion at the contact.
        return (Vec3::zeros(), contact_pos);
    }
    let normal = contact.normal / n_len_sq.sqrt();

    // Sliding plane through the reported contact point. The pivot is offset
    // from that point by whatever part of the volume touched first.
    let plane_origin = contact.point;
    let center_offset = plane_origin - contact_pos;

    // Take the destination relative to the contact point and project it back
    // onto the sliding plane.
    let destination = plane_origin + velocity;
    let plane_dist = plane_origin.dot(&normal);
    let mut t = plane_intersect(normal, plane_dist, destination, normal);

    let angle = normal.dot(&(velocity / original_distance));
    let mut friction = CONTACT_FRICTION;
    if angle.abs() < GLANCING_THRESHOLD {
        t += GLANCING_OFFSET;
        friction = GLANCING_FRICTION;
    }

    let new_destination = destination + normal * t - center_offset;

    let dir = new_destination - start;
    let dir_len_sq = dir.norm_squared();
    if dir_len_sq <= NORM_EPS_SQ {
        return (Vec3::zeros(), contact_pos);
    }

    let redirected = (dir / dir_len_sq.sqrt()) * (friction * (1.0 - fraction) * original_distance);
    (redirected, contact_pos)
}

/// Signed distance along `ray_dir` from `ray_origin` to the plane
/// `normal . x = dist`.
#[inline]
fn plane_intersect(normal: Vec3, dist: f32, ray_origin: Vec3, ray_dir: Vec3) -> f32 {
    let denom = normal.dot(&ray_dir);
    if denom.abs() <= 1.0e-12 {
        return 0.0;
    }
    (dist - normal.dot(&ray_origin)) / denom
}
