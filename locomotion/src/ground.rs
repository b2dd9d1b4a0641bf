//! Ground detection: a vertical probe around the character pivot plus the
//! support decision and altitude bookkeeping built on it.
//!
//! The probe is a segment ray test, not a sweep: it looks for the walkable
//! surface closest to the pivot's altitude, and the controller then decides
//! whether the character is near enough to count as supported.

use crate::constants::ALTITUDE_SMOOTHING;
use crate::mask::CollisionFilter;
use crate::query::SupportQuery;
use crate::types::{RayHit, Vec3};

/// Probe vertically around `position` for level geometry.
///
/// Casts a segment from `probe_range` above the pivot down to `probe_range`
/// below it and returns the closest hit, if any. The caller combines this
/// with [`is_supported`] to decide groundedness.
pub fn probe_ground(
    world: &impl SupportQuery,
    position: Vec3,
    probe_range: f32,
    filter: CollisionFilter,
) -> Option<RayHit> {
    let range = probe_range.max(0.0);
    let from = Vec3::new(position.x, position.y + range, position.z);
    let to = Vec3::new(position.x, position.y - range, position.z);
    world.ray_test(from, to, filter)
}

/// Round-off slack for the support comparison. A supported pivot sits
/// exactly at `hit + margin`, and the next probe recomputes `hit` from a
/// shifted ray origin, so the comparison must tolerate ulp-scale wobble.
const SUPPORT_SLACK: f32 = 1.0e-5;

/// Whether a pivot at `position_y` counts as supported by a surface at
/// `hit_y`.
///
/// Support means the pivot sits at most `margin` above the surface; higher
/// than that and the character is airborne even though the probe sees ground.
#[inline]
pub fn is_supported(position_y: f32, hit_y: f32, margin: f32) -> bool {
    position_y <= hit_y + margin + SUPPORT_SLACK
}

/// Altitude a supported pivot rides at above a surface hit at `hit_y`.
#[inline]
pub fn supported_altitude(hit_y: f32, margin: f32) -> f32 {
    hit_y + margin
}

/// One step of the base-altitude low-pass filter.
///
/// `base` trails `target` with weight [`ALTITUDE_SMOOTHING`] per step, giving
/// camera and animation collaborators a jitter-free ground height.
#[inline]
pub fn smooth_altitude(base: f64, target: f64) -> f64 {
    base * ALTITUDE_SMOOTHING + target * (1.0 - ALTITUDE_SMOOTHING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COLLISION_MARGIN, GROUND_PROBE_RANGE};
    use crate::mask::{CollisionLayer, filter_of};
    use crate::types::{NodeShape, Transform};
    use crate::world::NodeWorld;

    fn world_with_ground(y: f32) -> NodeWorld {
        let mut world = NodeWorld::new();
        world.add_node(
            NodeShape::Plane {
                normal: Vec3::new(0.0, 1.0, 0.0),
            },
            Transform::from_translation(Vec3::new(0.0, y, 0.0)),
            filter_of(&[CollisionLayer::Level]),
        );
        world
    }

    #[test]
    fn probe_finds_ground_within_range_and_supports_the_pivot() {
        let world = world_with_ground(5.0);
        let position = Vec3::new(0.0, 5.03, 0.0);

        let hit = probe_ground(
            &world,
            position,
            GROUND_PROBE_RANGE,
            filter_of(&[CollisionLayer::Level]),
        )
        .unwrap();

        assert!((hit.point.y - 5.0).abs() <= 1.0e-4);
        assert!(is_supported(position.y, hit.point.y, COLLISION_MARGIN));
        assert!(
            (supported_altitude(hit.point.y, COLLISION_MARGIN) - 5.04).abs() <= 1.0e-4
        );
    }

    #[test]
    fn probe_misses_ground_outside_range() {
        let world = world_with_ground(5.0);

        // Pivot half a meter up; the probe segment bottoms out at 5.3.
        let hit = probe_ground(
            &world,
            Vec3::new(0.0, 5.5, 0.0),
            GROUND_PROBE_RANGE,
            filter_of(&[CollisionLayer::Level]),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn support_holds_exactly_up_to_the_margin() {
        assert!(is_supported(5.04, 5.0, 0.04));
        assert!(is_supported(4.99, 5.0, 0.04));
        assert!(!is_supported(5.05, 5.0, 0.04));
    }

    #[test]
    fn smoothed_altitude_trails_the_target() {
        let mut base = 0.0;
        base = smooth_altitude(base, 10.0);
        assert!((base - 0.5).abs() <= 1.0e-9);

        // Repeated steps close the remaining gap geometrically.
        for _ in 0..200 {
            base = smooth_altitude(base, 10.0);
        }
        assert!((base - 10.0).abs() <= 1.0e-3);
    }
}
