//! Vertical motion: gravity, jump impulses, and the jump state machine.
//!
//! The vertical accumulator is a per-step displacement in meters, not a
//! velocity; gravity and damping apply once per whole virtual frame
//! (see [`crate::constants::VIRTUAL_FRAME_SECONDS`]). The accumulator stays
//! in `f64` so repeated damping reproduces bit-for-bit across platforms.

use crate::constants::{FALLING_DAMPING, GRAVITY, JUMP_IMPULSE, RISING_DAMPING};

/// Phase of the jump cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JumpState {
    /// Supported by walkable ground.
    #[default]
    Grounded,
    /// Airborne with the jump input still held.
    Rising,
    /// Airborne past the peak, or with the jump input released.
    Falling,
}

/// Inputs to one vertical integration step.
#[derive(Clone, Copy, Debug)]
pub struct VerticalParams {
    /// Jump phase carried over from the previous step.
    pub state: JumpState,
    /// Vertical displacement accumulator carried over from the previous step.
    pub downward_acceleration: f64,
    /// Ground detector verdict for this step.
    pub grounded: bool,
    /// Whether the jump input is held this step (level, not edge).
    pub jump_held: bool,
    /// Whole virtual frames elapsed this step.
    pub virtual_frames: u32,
}

/// Result of one vertical integration step.
#[derive(Clone, Copy, Debug)]
pub struct VerticalResult {
    pub state: JumpState,
    pub downward_acceleration: f64,
    /// A jump started this step.
    pub jumped: bool,
    /// The character settled onto the ground this step.
    pub landed: bool,
    /// Ground support was lost this step without a jump (ledge walk-off).
    pub left_ground: bool,
}

/// Advance the jump state machine and the vertical accumulator by one step.
///
/// Order matters and is fixed:
/// 1. While airborne, integrate per virtual frame: damp a positive
///    accumulator (0.99 rising, 0.2 otherwise), then subtract gravity.
///    Damping uses the phase carried into the step, so one rising frame from
///    an impulse of 0.1 yields exactly `0.1 * 0.99 - 0.004`.
/// 2. Apply transitions: grounded jump starts a rise, support loss starts a
///    fall, releasing the jump turns a rise into a fall, and touching ground
///    with the jump released lands (clamping the accumulator to >= 0).
/// 3. While grounded, a residual positive accumulator bleeds off by gravity
///    per virtual frame, floored at zero, so settled steps are idempotent.
#[inline]
pub fn integrate_vertical(params: VerticalParams) -> VerticalResult {
    let mut state = params.state;
    let mut accumulator = params.downward_acceleration;
    let mut jumped = false;
    let mut landed = false;
    let mut left_ground = false;

    // 1) Airborne integration, before any transition.
    if !params.grounded {
        let damping = if state == JumpState::Rising {
            RISING_DAMPING
        } else {
            FALLING_DAMPING
        };
        for _ in 0..params.virtual_frames {
            if accumulator > 0.0 {
                accumulator *= damping;
            }
            accumulator -= GRAVITY;
        }
    }

    // 2) Transitions.
    match state {
        JumpState::Grounded => {
            if params.jump_held && params.grounded {
                accumulator += JUMP_IMPULSE;
                state = JumpState::Rising;
                jumped = true;
            } else if !params.grounded {
                state = JumpState::Falling;
                left_ground = true;
            }
        }
        JumpState::Rising | JumpState::Falling => {
            if state == JumpState::Rising && !params.jump_held {
                state = JumpState::Falling;
            }
            if params.grounded && !params.jump_held {
                state = JumpState::Grounded;
                landed = true;
                accumulator = accumulator.max(0.0);
            }
        }
    }

    // 3) Grounded residual bleed-off.
    if params.grounded && state == JumpState::Grounded && accumulator > 0.0 {
        for _ in 0..params.virtual_frames {
            accumulator = (accumulator - GRAVITY).max(0.0);
            if accumulator == 0.0 {
                break;
            }
        }
    }

    VerticalResult {
        state,
        downward_acceleration: accumulator,
        jumped,
        landed,
        left_ground,
    }
}
