/*!
Character controller: one fixed-order step that turns an input snapshot
and the collision world into a new character transform plus events.

Every step runs the same phases:

1. sample the input source once,
2. consume a queued spawn teleport (and stop there if one was pending),
3. probe for ground support and snap onto it,
4. build the horizontal intent from the input direction,
5. integrate the vertical accumulator,
6. compose ground motion + horizontal intent + vertical motion and
   resolve the sum against the world by sliding,
7. commit the result and tick the attack windows.

All collision access goes through the [`SupportQuery`] and [`NodeLookup`]
traits, so the controller itself never touches an engine scene graph.
*/

use std::f32::consts::{PI, TAU};

use crate::constants::{
    ATTACK_WINDOW_SECONDS, COLLISION_MARGIN, GROUND_PROBE_RANGE, MAX_SLIDE_ITERATIONS,
    MIN_ALTITUDE, SPEED_FACTOR, virtual_frames,
};
use crate::events::{CharacterEvent, EventQueue};
use crate::ground;
use crate::input::{InputSource, ViewBasis, world_direction};
use crate::mask::{CollisionFilter, CollisionLayer, filter_of};
use crate::query::{NodeLookup, SupportQuery};
use crate::slide::{SlideRequest, slide_along_surfaces};
use crate::types::{NodeHandle, SweepShape, Transform, Vec3};
use crate::vertical::{JumpState, VerticalParams, integrate_vertical};

/// Tuning knobs for a controller instance.
///
/// The defaults reproduce the reference character: a capsule whose bottom
/// rests on the pivot, probing and colliding against [`CollisionLayer::Level`].
#[derive(Clone, Copy, Debug)]
pub struct CharacterConfig {
    /// Volume swept through the world when moving.
    pub shape: SweepShape,
    /// Offset from the character pivot (its feet) to the swept volume's
    /// center. The default places the capsule bottom at the pivot.
    pub shape_offset: Vec3,
    /// Pose the character teleports to after falling out of the world.
    pub spawn: Transform,
    /// Half-length of the vertical ground probe.
    pub probe_range: f32,
    /// Hover distance kept between the pivot and the ground hit.
    pub collision_margin: f32,
    /// Below this altitude, with no ground hit, the character is considered
    /// lost and a spawn teleport is queued.
    pub min_altitude: f32,
    /// Iteration cap for the sliding resolver.
    pub max_slide_iterations: u32,
    /// Base horizontal speed in units per second at full stick deflection.
    pub speed_factor: f64,
    /// Categories the ground probe ray may hit.
    pub ground_filter: CollisionFilter,
    /// Categories the swept volume collides with.
    pub collision_filter: CollisionFilter,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        let radius = 0.3;
        let half_height = 0.5;
        Self {
            shape: SweepShape::capsule(radius, half_height),
            shape_offset: Vec3::new(0.0, half_height + radius, 0.0),
            spawn: Transform::from_translation(Vec3::zeros()),
            probe_range: GROUND_PROBE_RANGE,
            collision_margin: COLLISION_MARGIN,
            min_altitude: MIN_ALTITUDE,
            max_slide_iterations: MAX_SLIDE_ITERATIONS,
            speed_factor: SPEED_FACTOR,
            ground_filter: filter_of(&[CollisionLayer::Level]),
            collision_filter: filter_of(&[CollisionLayer::Level]),
        }
    }
}

impl CharacterConfig {
    pub fn with_spawn(spawn: Transform) -> Self {
        Self { spawn, ..Self::default() }
    }
}

/// Read-only view of the character after a step.
#[derive(Clone, Copy, Debug)]
pub struct CharacterState {
    /// World position of the pivot (the feet).
    pub position: Vec3,
    /// Yaw of the last walk direction, `atan2(dir.x, dir.z)`.
    pub facing_angle: f32,
    pub jump_state: JumpState,
    /// True when supported by ground and in the grounded phase.
    pub is_grounded: bool,
    /// True while the input direction is non-zero.
    pub is_walking: bool,
    /// True while at least one attack window is open.
    pub is_attacking: bool,
    /// Analog speed scale of the current input, zero when idle. Multiply by
    /// `speed_multiplier` for an animation playback rate.
    pub walk_speed: f32,
    pub speed_multiplier: f64,
    /// Smoothed ground altitude for camera rigs.
    pub base_altitude: f64,
    /// Raw altitude of the last supporting hit.
    pub target_altitude: f64,
}

/// Owns the character state and advances it one step at a time.
pub struct CharacterController {
    config: CharacterConfig,
    position: Vec3,
    facing_angle: f32,
    jump_state: JumpState,
    downward_acceleration: f64,
    ground_node: Option<NodeHandle>,
    ground_last: Option<(NodeHandle, Vec3)>,
    base_altitude: f64,
    target_altitude: f64,
    speed_multiplier: f64,
    walk_speed: f32,
    is_walking: bool,
    attack_windows: Vec<f64>,
    attack_was_held: bool,
    reset_queued: bool,
    events: EventQueue,
}

impl CharacterController {
    pub fn new(config: CharacterConfig) -> Self {
        let spawn = config.spawn;
        Self {
            config,
            position: spawn.translation,
            facing_angle: facing_of(&spawn),
            jump_state: JumpState::Grounded,
            downward_acceleration: 0.0,
            ground_node: None,
            ground_last: None,
            base_altitude: spawn.translation.y as f64,
            target_altitude: spawn.translation.y as f64,
            speed_multiplier: 1.0,
            walk_speed: 0.0,
            is_walking: false,
            attack_windows: Vec::new(),
            attack_was_held: false,
            reset_queued: false,
            events: EventQueue::default(),
        }
    }

    /// Advance the character by `dt_seconds` and return the new state.
    ///
    /// Events raised during the step are staged in the controller and
    /// delivered through [`CharacterController::drain_events`].
    pub fn step(
        &mut self,
        world: &impl SupportQuery,
        nodes: &impl NodeLookup,
        view: &impl ViewBasis,
        input: &mut impl InputSource,
        dt_seconds: f64,
    ) -> CharacterState {
        // 1) One input snapshot for the whole step.
        let input = input.sample().clamped();
        let dt = if dt_seconds.is_finite() { dt_seconds.max(0.0) } else { 0.0 };

        // 2) A teleport queued last step replaces the whole step.
        if self.reset_queued {
            self.teleport_to_spawn();
            return self.state();
        }

        // 3) Ground detection at the position the last step committed.
        self.ground_node = None;
        let probe = ground::probe_ground(
            world,
            self.position,
            self.config.probe_range,
            self.config.ground_filter,
        );
        let mut grounded = false;
        match probe {
            Some(hit) => {
                if ground::is_supported(self.position.y, hit.point.y, self.config.collision_margin)
                {
                    grounded = true;
                    self.ground_node = Some(hit.node);
                    self.target_altitude = hit.point.y as f64;
                    self.downward_acceleration = self.downward_acceleration.max(0.0);
                    self.position.y =
                        ground::supported_altitude(hit.point.y, self.config.collision_margin);
                }
            }
            None => {
                if self.position.y < self.config.min_altitude {
                    // Lost below the world: raise the event now, teleport at
                    // the start of the next step, touch nothing else.
                    log::info!(
                        "character fell below min altitude {} at y {}; resetting to spawn",
                        self.config.min_altitude,
                        self.position.y
                    );
                    self.queue_reset();
                    return self.state();
                }
            }
        }
        self.base_altitude = ground::smooth_altitude(self.base_altitude, self.target_altitude);

        // Motion inherited from the supporting node, valid only while the
        // node stays the same between steps.
        let mut ground_move = Vec3::zeros();
        if let (Some(node), Some((last_node, last_position))) = (self.ground_node, self.ground_last)
        {
            if node == last_node {
                if let Some(current) = nodes.node_position(node) {
                    let delta = current - last_position;
                    ground_move = Vec3::new(delta.x, 0.0, delta.z);
                }
            }
        }

        // 4) Horizontal intent.
        let mut horizontal = Vec3::zeros();
        match world_direction(view, input.direction) {
            Some(direction) => {
                let speed = (dt * self.config.speed_factor * self.speed_multiplier) as f32;
                horizontal = direction * speed;
                self.facing_angle = direction.x.atan2(direction.z);
                self.walk_speed = direction.norm();
                self.is_walking = true;
            }
            None => {
                self.walk_speed = 0.0;
                self.is_walking = false;
            }
        }

        // 5) Vertical integration.
        let vertical = integrate_vertical(VerticalParams {
            state: self.jump_state,
            downward_acceleration: self.downward_acceleration,
            grounded,
            jump_held: input.jump,
            virtual_frames: virtual_frames(dt),
        });
        self.jump_state = vertical.state;
        self.downward_acceleration = vertical.downward_acceleration;
        if vertical.landed {
            self.events.push(CharacterEvent::Landed);
        }
        if vertical.left_ground {
            self.events.push(CharacterEvent::LeftGround);
        }
        if vertical.jumped {
            self.events.push(CharacterEvent::Jumped);
        }
        // Airborne characters reference no ground node.
        if self.jump_state != JumpState::Grounded {
            self.ground_node = None;
        }

        // 6) Compose the step displacement and resolve it against the world.
        let velocity =
            ground_move + horizontal + Vec3::new(0.0, self.downward_acceleration as f32, 0.0);
        let slide = slide_along_surfaces(
            world,
            SlideRequest {
                start: self.position + self.config.shape_offset,
                velocity,
                shape: self.config.shape,
                filter: self.config.collision_filter,
                max_iterations: self.config.max_slide_iterations,
            },
        );
        self.position = slide.end_pos - self.config.shape_offset;

        // 7) Bookkeeping for the next step.
        self.ground_last = match self.ground_node {
            Some(node) => nodes.node_position(node).map(|position| (node, position)),
            None => None,
        };
        self.tick_attacks(dt, input.attack);

        self.state()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CharacterState {
        CharacterState {
            position: self.position,
            facing_angle: self.facing_angle,
            jump_state: self.jump_state,
            is_grounded: self.ground_node.is_some(),
            is_walking: self.is_walking,
            is_attacking: self.is_attacking(),
            walk_speed: self.walk_speed,
            speed_multiplier: self.speed_multiplier,
            base_altitude: self.base_altitude,
            target_altitude: self.target_altitude,
        }
    }

    /// Remove and return the events staged since the last drain, in
    /// delivery order.
    pub fn drain_events(&mut self) -> Vec<CharacterEvent> {
        self.events.drain()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn facing_angle(&self) -> f32 {
        self.facing_angle
    }

    pub fn jump_state(&self) -> JumpState {
        self.jump_state
    }

    /// Node currently standing on, if any.
    pub fn ground_node(&self) -> Option<NodeHandle> {
        self.ground_node
    }

    pub fn is_attacking(&self) -> bool {
        !self.attack_windows.is_empty()
    }

    /// Open an attack window unconditionally. Windows opened while another
    /// is still running stack; the character attacks until all expire.
    pub fn attack(&mut self) {
        self.attack_windows.push(ATTACK_WINDOW_SECONDS);
    }

    /// Scales horizontal speed; the burning power-up sets this to 2.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.speed_multiplier = multiplier.max(0.0);
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Ask for a spawn teleport at the start of the next step. Also raised
    /// internally when the character falls below the minimum altitude.
    pub fn queue_reset(&mut self) {
        self.reset_queued = true;
        self.events.push(CharacterEvent::PositionReset);
    }

    fn teleport_to_spawn(&mut self) {
        let spawn = self.config.spawn;
        self.position = spawn.translation;
        self.facing_angle = facing_of(&spawn);
        self.downward_acceleration = 0.0;
        // Falling, not grounded: the next probe decides, without a spurious
        // left-ground transition when the spawn floats above the floor.
        self.jump_state = JumpState::Falling;
        self.ground_node = None;
        self.ground_last = None;
        self.reset_queued = false;
    }

    /// Age open attack windows and open a new one on a fresh press, but only
    /// when no window is currently running.
    fn tick_attacks(&mut self, dt: f64, attack_held: bool) {
        for window in &mut self.attack_windows {
            *window -= dt;
        }
        self.attack_windows.retain(|window| *window > 0.0);

        let pressed = attack_held && !self.attack_was_held;
        self.attack_was_held = attack_held;
        if pressed && self.attack_windows.is_empty() {
            self.attack();
        }
    }
}

fn facing_of(transform: &Transform) -> f32 {
    let forward = transform.rotation * Vec3::z();
    forward.x.atan2(forward.z)
}

/// Shortest signed arc from `from` to `to`, in `[-PI, PI]`.
///
/// Hosts tween the rendered model towards `facing_angle` over a fraction of
/// a second; this picks the turn direction that avoids winding the long way
/// around.
#[inline]
pub fn normalize_turn(from: f32, to: f32) -> f32 {
    let mut delta = (to - from) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DIST_EPS;
    use crate::input::{FixedViewBasis, InputSnapshot};
    use crate::types::{NodeShape, Vec2};
    use crate::world::NodeWorld;

    const DT: f64 = 1.0 / 60.0;

    fn flat_world(altitude: f32) -> NodeWorld {
        let mut world = NodeWorld::new();
        world.add_node(
            NodeShape::Plane { normal: Vec3::y() },
            Transform::from_translation(Vec3::new(0.0, altitude, 0.0)),
            filter_of(&[CollisionLayer::Level]),
        );
        world
    }

    // Spawn inside the support band; the first step snaps onto the margin.
    fn controller_on(altitude: f32) -> CharacterController {
        let spawn = Transform::from_translation(Vec3::new(
            0.0,
            altitude + 0.5 * COLLISION_MARGIN,
            0.0,
        ));
        CharacterController::new(CharacterConfig::with_spawn(spawn))
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    fn walk(direction: Vec2) -> InputSnapshot {
        InputSnapshot { direction, ..InputSnapshot::default() }
    }

    fn jump_held() -> InputSnapshot {
        InputSnapshot { jump: true, ..InputSnapshot::default() }
    }

    #[test]
    fn grounded_character_snaps_to_the_margin() {
        let world = flat_world(5.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = CharacterController::new(CharacterConfig::with_spawn(
            Transform::from_translation(Vec3::new(0.0, 5.03, 0.0)),
        ));

        let state = controller.step(&world, &world, &view, &mut idle(), DT);

        assert!(state.is_grounded);
        assert_eq!(state.jump_state, JumpState::Grounded);
        assert!((state.position.y - 5.04).abs() <= 1.0e-4);
        assert!((state.target_altitude - 5.0).abs() <= 1.0e-4);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn repeated_idle_steps_are_idempotent() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);

        let first = controller.step(&world, &world, &view, &mut idle(), DT);
        for _ in 0..50 {
            let state = controller.step(&world, &world, &view, &mut idle(), DT);
            assert!((state.position - first.position).norm() <= DIST_EPS);
            assert_eq!(state.jump_state, JumpState::Grounded);
        }
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn walking_moves_along_the_camera_forward() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);

        let state =
            controller.step(&world, &world, &view, &mut walk(Vec2::new(0.0, 1.0)), DT);

        // Full deflection covers speed_factor * dt along -Z.
        let expected = -(DT * SPEED_FACTOR) as f32;
        assert!((state.position.z - expected).abs() <= 1.0e-4);
        assert!(state.position.x.abs() <= DIST_EPS);
        assert!(state.is_walking);
        assert!((state.walk_speed - 1.0).abs() <= 1.0e-5);
        assert!(normalize_turn(state.facing_angle, PI).abs() <= 1.0e-4);
        assert!(state.is_grounded);
    }

    #[test]
    fn partial_deflection_remaps_the_walk_speed() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);

        let state =
            controller.step(&world, &world, &view, &mut walk(Vec2::new(0.0, 0.5)), DT);

        // Half deflection remaps to 0.6 of the full pace.
        let expected = -(DT * SPEED_FACTOR * 0.6) as f32;
        assert!((state.position.z - expected).abs() <= 1.0e-4);
        assert!((state.walk_speed - 0.6).abs() <= 1.0e-5);
    }

    #[test]
    fn speed_multiplier_scales_the_pace() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();

        let mut plain = controller_on(0.0);
        let baseline =
            plain.step(&world, &world, &view, &mut walk(Vec2::new(0.0, 1.0)), DT);

        let mut burning = controller_on(0.0);
        burning.set_speed_multiplier(2.0);
        let doubled =
            burning.step(&world, &world, &view, &mut walk(Vec2::new(0.0, 1.0)), DT);

        assert!((doubled.position.z - 2.0 * baseline.position.z).abs() <= 1.0e-5);
    }

    #[test]
    fn jump_rises_then_lands_once() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);

        let state = controller.step(&world, &world, &view, &mut jump_held(), DT);
        assert_eq!(state.jump_state, JumpState::Rising);
        assert!((state.position.y - 0.14).abs() <= 1.0e-4);
        assert_eq!(controller.drain_events(), vec![CharacterEvent::Jumped]);

        // Hold the button a few more steps, then release and fall back down.
        for _ in 0..5 {
            controller.step(&world, &world, &view, &mut jump_held(), DT);
        }
        let mut landings = 0;
        for _ in 0..600 {
            let state = controller.step(&world, &world, &view, &mut idle(), DT);
            for event in controller.drain_events() {
                if event == CharacterEvent::Landed {
                    landings += 1;
                }
            }
            if state.jump_state == JumpState::Grounded {
                break;
            }
        }
        assert_eq!(landings, 1);
        let settled = controller.state();
        assert_eq!(settled.jump_state, JumpState::Grounded);
        assert!((settled.position.y - COLLISION_MARGIN).abs() <= 1.0e-3);
    }

    #[test]
    fn walking_off_a_ledge_emits_left_ground() {
        let mut world = NodeWorld::new();
        world.add_node(
            NodeShape::Cuboid { half_extents: Vec3::new(1.0, 0.1, 1.0) },
            Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            filter_of(&[CollisionLayer::Level]),
        );
        let view = FixedViewBasis::world_axes();
        let spawn =
            Transform::from_translation(Vec3::new(0.0, 2.1 + 0.5 * COLLISION_MARGIN, -0.7));
        let mut controller = CharacterController::new(CharacterConfig::with_spawn(spawn));

        let mut left_ground = 0;
        let mut airborne = false;
        for _ in 0..120 {
            let state =
                controller.step(&world, &world, &view, &mut walk(Vec2::new(0.0, 1.0)), DT);
            for event in controller.drain_events() {
                assert_ne!(event, CharacterEvent::Jumped);
                if event == CharacterEvent::LeftGround {
                    left_ground += 1;
                }
            }
            if state.jump_state == JumpState::Falling {
                airborne = true;
                break;
            }
        }
        assert!(airborne);
        assert_eq!(left_ground, 1);
        assert!(controller.position().z < -1.0);
    }

    #[test]
    fn falling_out_of_the_world_resets_to_spawn() {
        let world = NodeWorld::new();
        let view = FixedViewBasis::world_axes();
        let spawn = Transform::from_translation(Vec3::zeros());
        let mut controller = CharacterController::new(CharacterConfig::with_spawn(spawn));

        let mut reset_seen = false;
        let mut position_before_reset = Vec3::zeros();
        for _ in 0..600 {
            let before = controller.position();
            let state = controller.step(&world, &world, &view, &mut idle(), DT);
            let events = controller.drain_events();
            if events.contains(&CharacterEvent::PositionReset) {
                assert_eq!(events.len(), 1);
                // The reset step itself moves nothing.
                assert_eq!(state.position, before);
                assert!(state.position.y < MIN_ALTITUDE);
                reset_seen = true;
                position_before_reset = state.position;
                break;
            }
        }
        assert!(reset_seen);
        assert!(position_before_reset.y < MIN_ALTITUDE);

        // The next step teleports back to the spawn with a clean accumulator.
        let state = controller.step(&world, &world, &view, &mut idle(), DT);
        assert_eq!(state.position, spawn.translation);
        assert_eq!(state.jump_state, JumpState::Falling);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn moving_platform_carries_its_rider() {
        let mut world = NodeWorld::new();
        let platform = world.add_node(
            NodeShape::Cuboid { half_extents: Vec3::new(1.0, 0.1, 1.0) },
            Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            filter_of(&[CollisionLayer::Level]),
        );
        let view = FixedViewBasis::world_axes();
        let spawn =
            Transform::from_translation(Vec3::new(0.0, 2.1 + 0.5 * COLLISION_MARGIN, 0.0));
        let mut controller = CharacterController::new(CharacterConfig::with_spawn(spawn));

        // Settle on the platform and record its position.
        let state = controller.step(&world, &world, &view, &mut idle(), DT);
        assert!(state.is_grounded);
        assert_eq!(controller.ground_node(), Some(platform));

        // The platform shifts sideways between steps; the rider follows.
        world.set_node_transform(
            platform,
            Transform::from_translation(Vec3::new(0.5, 2.0, 0.0)),
        );
        let state = controller.step(&world, &world, &view, &mut idle(), DT);
        assert!((state.position.x - 0.5).abs() <= 1.0e-4);
        assert!(state.is_grounded);

        // A stationary platform imparts no further motion.
        let state = controller.step(&world, &world, &view, &mut idle(), DT);
        assert!((state.position.x - 0.5).abs() <= 1.0e-4);
    }

    #[test]
    fn attack_windows_open_and_expire() {
        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);

        let mut attack = InputSnapshot { attack: true, ..InputSnapshot::default() };
        let state = controller.step(&world, &world, &view, &mut attack, DT);
        assert!(state.is_attacking);

        // Holding the button does not retrigger; the window runs out after
        // half a second of steps.
        for _ in 0..35 {
            controller.step(&world, &world, &view, &mut attack, DT);
        }
        assert!(!controller.is_attacking());

        // Release, press again: a fresh window opens.
        controller.step(&world, &world, &view, &mut idle(), DT);
        let state = controller.step(&world, &world, &view, &mut attack, DT);
        assert!(state.is_attacking);
    }

    #[test]
    fn explicit_attacks_stack() {
        let mut controller = controller_on(0.0);
        controller.attack();
        controller.attack();
        assert!(controller.is_attacking());
    }

    #[test]
    fn input_is_sampled_once_per_step() {
        struct Counting {
            snapshot: InputSnapshot,
            samples: u32,
        }
        impl InputSource for Counting {
            fn sample(&mut self) -> InputSnapshot {
                self.samples += 1;
                self.snapshot
            }
        }

        let world = flat_world(0.0);
        let view = FixedViewBasis::world_axes();
        let mut controller = controller_on(0.0);
        let mut source = Counting { snapshot: InputSnapshot::default(), samples: 0 };

        controller.step(&world, &world, &view, &mut source, DT);
        assert_eq!(source.samples, 1);
    }

    #[test]
    fn normalize_turn_takes_the_short_way() {
        assert!((normalize_turn(0.0, 1.5 * PI) - (-0.5 * PI)).abs() <= 1.0e-6);
        assert!((normalize_turn(-0.75 * PI, 0.75 * PI) - (-0.5 * PI)).abs() <= 1.0e-6);
        assert!((normalize_turn(0.2, 0.7) - 0.5).abs() <= 1.0e-6);
    }
}
