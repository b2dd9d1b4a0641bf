//! Bundled collision world backed by parry3d narrow-phase queries.
//!
//! [`NodeWorld`] stores level geometry as nodes (shape + pose + category
//! mask) addressed by opaque handles. Nodes can be repositioned between steps
//! so platforms, doors, and other movers work without a dynamics pipeline;
//! the controller picks the motion up through [`NodeLookup`].
//!
//! Hosts with their own physics engine can ignore this type entirely and
//! implement the query traits directly.

use nalgebra as na;
use parry3d::{
    query::{self, Ray, RayCast, ShapeCastOptions},
    shape as pshape,
};

use crate::constants::NORM_EPS_SQ;
use crate::mask::CollisionFilter;
use crate::query::{NodeLookup, SupportQuery};
use crate::types::{Iso, NodeHandle, NodeShape, RayHit, SweepContact, SweepShape, Transform, Vec3};

struct LevelNode {
    shape: NodeShape,
    transform: Transform,
    category: CollisionFilter,
}

impl LevelNode {
    /// Cast `ray` against this node. Returns `(time_of_impact, world_normal)`.
    fn cast_ray(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        let iso = self.transform.iso();
        match self.shape {
            NodeShape::Plane { normal } => {
                let plane = pshape::HalfSpace {
                    normal: na::Unit::new_normalize(normal),
                };
                ray_hit(&plane, &iso, ray)
            }
            NodeShape::Cuboid { half_extents } => {
                ray_hit(&pshape::Cuboid::new(half_extents), &iso, ray)
            }
            NodeShape::Ball { radius } => ray_hit(&pshape::Ball::new(radius), &iso, ray),
            NodeShape::Capsule {
                radius,
                half_height,
            } => ray_hit(&pshape::Capsule::new_y(half_height, radius), &iso, ray),
        }
    }

    /// Sweep `moving` along `vel` against this node and return the earliest
    /// parry hit, if any.
    fn cast_swept(
        &self,
        moving: &dyn pshape::Shape,
        from: &Iso,
        vel: &Vec3,
    ) -> Option<query::ShapeCastHit> {
        let iso = self.transform.iso();
        match self.shape {
            NodeShape::Plane { normal } => {
                let plane = pshape::HalfSpace {
                    normal: na::Unit::new_normalize(normal),
                };
                swept_hit(moving, from, vel, &plane, &iso)
            }
            NodeShape::Cuboid { half_extents } => {
                swept_hit(moving, from, vel, &pshape::Cuboid::new(half_extents), &iso)
            }
            NodeShape::Ball { radius } => {
                swept_hit(moving, from, vel, &pshape::Ball::new(radius), &iso)
            }
            NodeShape::Capsule {
                radius,
                half_height,
            } => swept_hit(
                moving,
                from,
                vel,
                &pshape::Capsule::new_y(half_height, radius),
                &iso,
            ),
        }
    }
}

fn ray_hit<S: RayCast>(shape: &S, iso: &Iso, ray: &Ray) -> Option<(f32, Vec3)> {
    shape
        .cast_ray_and_get_normal(iso, ray, 1.0, true)
        .map(|hit| (hit.time_of_impact, hit.normal))
}

fn swept_hit(
    moving: &dyn pshape::Shape,
    from: &Iso,
    vel: &Vec3,
    target: &dyn pshape::Shape,
    target_iso: &Iso,
) -> Option<query::ShapeCastHit> {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
    opts.stop_at_penetration = true;
    query::cast_shapes(from, vel, moving, target_iso, &na::Vector3::zeros(), target, opts)
        .ok()
        .flatten()
}

/// Collision world holding level geometry as mask-tagged, repositionable nodes.
///
/// Handles index into the node table and are never reused, so a handle held
/// across a removal stays unambiguous and simply resolves to nothing.
#[derive(Default)]
pub struct NodeWorld {
    nodes: Vec<Option<LevelNode>>,
}

impl NodeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a geometry node and return its handle.
    pub fn add_node(
        &mut self,
        shape: NodeShape,
        transform: Transform,
        category: CollisionFilter,
    ) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(Some(LevelNode {
            shape,
            transform,
            category,
        }));
        handle
    }

    /// Remove a node. Its handle keeps resolving to `None` afterwards.
    pub fn remove_node(&mut self, node: NodeHandle) {
        match self.nodes.get_mut(node.0 as usize) {
            Some(slot) => *slot = None,
            None => log::warn!("remove_node: unknown node {node:?}"),
        }
    }

    /// Reposition a node (platforms, doors). No sweep is performed for the
    /// node's own motion; riders pick the delta up on their next step.
    pub fn set_node_transform(&mut self, node: NodeHandle, transform: Transform) {
        match self.nodes.get_mut(node.0 as usize) {
            Some(Some(existing)) => existing.transform = transform,
            _ => log::warn!("set_node_transform: unknown node {node:?}"),
        }
    }

    pub fn node_transform(&self, node: NodeHandle) -> Option<Transform> {
        self.node(node).map(|n| n.transform)
    }

    fn node(&self, node: NodeHandle) -> Option<&LevelNode> {
        self.nodes.get(node.0 as usize).and_then(|slot| slot.as_ref())
    }

    fn live_nodes(&self) -> impl Iterator<Item = (NodeHandle, &LevelNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|n| (NodeHandle(index as u32), n)))
    }
}

impl SupportQuery for NodeWorld {
    fn ray_test(&self, from: Vec3, to: Vec3, filter: CollisionFilter) -> Option<RayHit> {
        let dir = to - from;
        if dir.norm_squared() <= NORM_EPS_SQ {
            return None;
        }
        let ray = Ray::new(na::Point3::from(from), dir);

        let mut best: Option<(f32, RayHit)> = None;
        for (handle, node) in self.live_nodes() {
            if !node.category.intersects(&filter) {
                continue;
            }
            let Some((toi, normal)) = node.cast_ray(&ray) else {
                continue;
            };
            if best.map_or(true, |(t, _)| toi < t) {
                // Report the normal opposing the ray, whichever face was hit.
                let normal = if normal.dot(&dir) > 0.0 { -normal } else { normal };
                best = Some((
                    toi,
                    RayHit {
                        point: ray.point_at(toi).coords,
                        normal,
                        node: handle,
                    },
                ));
            }
        }

        best.map(|(_, hit)| hit)
    }

    fn convex_sweep(
        &self,
        shape: &SweepShape,
        from: &Transform,
        to: &Transform,
        filter: CollisionFilter,
    ) -> Vec<SweepContact> {
        let vel = to.translation - from.translation;
        if vel.norm_squared() <= NORM_EPS_SQ {
            return Vec::new();
        }

        let from_iso = from.iso();
        let capsule;
        let ball;
        let moving: &dyn pshape::Shape = match *shape {
            SweepShape::Capsule {
                radius,
                half_height,
            } => {
                capsule = pshape::Capsule::new_y(half_height, radius);
                &capsule
            }
            SweepShape::Ball { radius } => {
                ball = pshape::Ball::new(radius);
                &ball
            }
        };

        let mut contacts = Vec::new();
        for (_, node) in self.live_nodes() {
            if !node.category.intersects(&filter) {
                continue;
            }
            let Some(hit) = node.cast_swept(moving, &from_iso, &vel) else {
                continue;
            };

            // Witnesses and normals come back in each shape's local space.
            let point = node.transform.iso().transform_point(&hit.witness2).coords;
            let mut normal = from.rotation * hit.normal1.into_inner();
            if normal.dot(&vel) > 0.0 {
                normal = -normal;
            }
            contacts.push(SweepContact {
                point,
                normal,
                fraction: hit.time_of_impact,
            });
        }

        contacts.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));
        contacts
    }
}

impl NodeLookup for NodeWorld {
    fn node_position(&self, node: NodeHandle) -> Option<Vec3> {
        self.node(node).map(|n| n.transform.translation)
    }
}
