//! Kinematic character locomotion on top of parry queries: ground
//! detection, jump integration, collide-and-slide resolution, and a
//! fixed-order controller step that ties them together.

pub mod constants;
pub mod controller;
pub mod events;
pub mod ground;
pub mod input;
pub mod mask;
pub mod query;
pub mod slide;
pub mod types;
pub mod vertical;
pub mod world;

pub use constants::{
    COLLISION_MARGIN, GRAVITY, GROUND_PROBE_RANGE, JUMP_IMPULSE, MIN_ALTITUDE, SPEED_FACTOR,
    VIRTUAL_FRAME_SECONDS, speed_scale, virtual_frames,
};
pub use controller::{CharacterConfig, CharacterController, CharacterState, normalize_turn};
pub use events::{CharacterEvent, EventQueue};
pub use ground::{is_supported, probe_ground, smooth_altitude, supported_altitude};
pub use input::{FixedViewBasis, InputSnapshot, InputSource, ViewBasis, world_direction};
pub use mask::{BitmaskFlags, CollisionFilter, CollisionLayer, FlagBitmask, filter_of};
pub use query::{NodeLookup, SupportQuery};
pub use slide::{SlideRequest, SlideResult, slide_along_surfaces};
pub use types::{
    Iso, NodeHandle, NodeShape, Quat, RayHit, SweepContact, SweepShape, Transform, Vec2, Vec3,
};
pub use vertical::{JumpState, VerticalParams, VerticalResult, integrate_vertical};
pub use world::NodeWorld;
