//! Query seams between the locomotion core and the host's collision world.
//!
//! The controller is written against these traits, never against a concrete
//! world, so hosts can route queries into their own engine and tests can
//! script exact contact sequences. The bundled [`crate::world::NodeWorld`]
//! implements both.

use crate::mask::CollisionFilter;
use crate::types::{NodeHandle, RayHit, SweepContact, SweepShape, Transform, Vec3};

/// Read-only ray and sweep queries against level geometry.
///
/// Implementations must:
/// - return the closest hit for [`ray_test`](Self::ray_test), or `None` when
///   the segment is clear;
/// - return sweep contacts ordered by increasing fraction (closest first),
///   with normals opposing the swept motion;
/// - restrict results to nodes whose category intersects `filter`.
pub trait SupportQuery {
    /// Closest hit along the segment `from -> to`, if any.
    fn ray_test(&self, from: Vec3, to: Vec3, filter: CollisionFilter) -> Option<RayHit>;

    /// Contacts produced by sweeping `shape` from `from` to `to`.
    ///
    /// An empty vector means the motion is unobstructed.
    fn convex_sweep(
        &self,
        shape: &SweepShape,
        from: &Transform,
        to: &Transform,
        filter: CollisionFilter,
    ) -> Vec<SweepContact>;
}

/// Resolve the current world position of a geometry node.
///
/// Ground references held by the controller are weak handles; this lookup is
/// the only way they are dereferenced, so a despawned platform simply reports
/// `None` and the rider stops inheriting its motion.
pub trait NodeLookup {
    fn node_position(&self, node: NodeHandle) -> Option<Vec3>;
}
