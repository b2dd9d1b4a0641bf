/*!
Core math aliases and the data types exchanged between the locomotion modules.

This module intentionally contains no algorithms. It defines the values that
cross the seams between:
- the support query adapter (ray tests and convex sweeps)
- the ground probe
- the sliding resolver
- the character controller

Conventions:
- World units are meters, +Y is up.
- Sweep fractions are unitless in `[0, 1]` along the tested translation.
- Normals returned by queries oppose the tested motion.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Transform with the given translation and identity rotation.
    ///
    /// Sweeps are translation-only, so this covers most call sites.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    /// Convert to nalgebra `Isometry3` for use with parry3d narrow-phase queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }
}

/// Opaque reference to a piece of level geometry registered with a collision
/// world.
///
/// Handles are weak: the holder never controls the node's lifetime, and every
/// dereference goes through [`crate::query::NodeLookup`], which may report the
/// node as gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub(crate) u32);

/// Convex volumes a character can sweep through the world.
///
/// half_height is the half-length of the cylinder section (aligned with +Y),
/// so the total capsule height is 2*half_height + 2*radius.
#[derive(Clone, Copy, Debug)]
pub enum SweepShape {
    Capsule {
        /// Radius of the spherical caps and cylinder.
        radius: f32,
        /// Half of the cylinder length along the local +Y axis.
        half_height: f32,
    },
    Ball {
        /// Radius of the sphere in meters.
        radius: f32,
    },
}

impl SweepShape {
    /// Vertical capsule; dimensions are clamped to non-negative.
    #[inline]
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule {
            radius: radius.max(0.0),
            half_height: half_height.max(0.0),
        }
    }

    /// Sphere; the radius is clamped to non-negative.
    #[inline]
    pub fn ball(radius: f32) -> Self {
        Self::Ball {
            radius: radius.max(0.0),
        }
    }
}

/// Level geometry shapes supported by the bundled collision world.
///
/// The owning node supplies the world-space pose; `Plane` is the one variant
/// that also encodes orientation itself (its world normal), with the node's
/// translation giving a point on the plane.
#[derive(Clone, Copy, Debug)]
pub enum NodeShape {
    Plane {
        /// World-space unit normal of the plane.
        normal: Vec3,
    },
    Cuboid {
        /// Local-space half-extents (hx, hy, hz).
        half_extents: Vec3,
    },
    Ball {
        /// Radius of the sphere in meters.
        radius: f32,
    },
    Capsule {
        /// Radius of the spherical caps and cylinder.
        radius: f32,
        /// Half of the cylinder length along the local +Y axis.
        half_height: f32,
    },
}

/// Closest hit returned by a segment ray test.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// World-space point where the segment meets the surface.
    pub point: Vec3,
    /// World-space surface normal at the hit, opposing the ray direction.
    pub normal: Vec3,
    /// The geometry node that was hit.
    pub node: NodeHandle,
}

/// A single contact returned by a convex sweep.
#[derive(Clone, Copy, Debug)]
pub struct SweepContact {
    /// World-space contact point on the obstacle surface.
    pub point: Vec3,
    /// World-space contact normal, opposing the swept motion.
    pub normal: Vec3,
    /// Fraction (0..1) of the tested translation where the contact occurs.
    pub fraction: f32,
}
