/*!
Locomotion tuning constants and tolerances.

These constants centralize the parameters used by the ground probe, the
vertical integrator, and the sliding resolver. Keeping them together makes
tuning easier and helps ensure deterministic behavior across platforms.

Notes
- Distances are in meters; the integrator constants are per-virtual-frame
  displacement deltas, not per-second accelerations.
- The damping/impulse values are calibrated feel constants for a 60 Hz
  virtual frame and should be tuned as a set, not re-derived.
- Per-character overrides live in `CharacterConfig`; these are its defaults.
*/

/// Fixed discretization unit for the vertical integrator (seconds).
/// A step of `dt` seconds advances `floor(dt / VIRTUAL_FRAME_SECONDS)` frames.
pub const VIRTUAL_FRAME_SECONDS: f64 = 1.0 / 60.0;

/// Downward displacement added to the vertical accumulator each virtual frame.
pub const GRAVITY: f64 = 0.004;

/// Upward displacement added to the vertical accumulator when a jump starts.
pub const JUMP_IMPULSE: f64 = 0.1;

/// Per-virtual-frame damping of a positive accumulator while rising.
pub const RISING_DAMPING: f64 = 0.99;

/// Per-virtual-frame damping of a positive accumulator while falling.
/// Much stronger than [`RISING_DAMPING`] so released jumps die quickly.
pub const FALLING_DAMPING: f64 = 0.2;

/// Half-length of the vertical ground probe segment (meters).
/// The probe runs from `y + GROUND_PROBE_RANGE` down to `y - GROUND_PROBE_RANGE`.
pub const GROUND_PROBE_RANGE: f32 = 0.2;

/// Separation kept between the character pivot and the ground surface (meters).
/// The character counts as supported while within this margin of the hit, and
/// its committed altitude rides exactly this far above it.
pub const COLLISION_MARGIN: f32 = 0.04;

/// Altitude below which a character with no ground in probe range is reset
/// to its spawn transform (meters).
pub const MIN_ALTITUDE: f32 = -10.0;

/// Weight of the previous smoothed altitude in the per-step low-pass filter.
/// `base = base * ALTITUDE_SMOOTHING + target * (1 - ALTITUDE_SMOOTHING)`.
pub const ALTITUDE_SMOOTHING: f64 = 0.95;

/// Maximum number of redirect iterations per sliding resolution.
/// Higher values help with tight corners at the cost of more sweeps.
pub const MAX_SLIDE_ITERATIONS: u32 = 4;

/// Speed below which a step is treated as no motion (meters per step).
/// The resolver compares squared lengths against the square of this value.
pub const STOP_SPEED: f32 = 1.0e-3;

/// Velocity fraction kept after a non-glancing contact (wall-like hits).
pub const CONTACT_FRICTION: f32 = 0.3;

/// Velocity fraction kept after a glancing contact (surface-parallel hits).
pub const GLANCING_FRICTION: f32 = 1.0;

/// |velocity . normal| threshold separating glancing from head-on contacts.
pub const GLANCING_THRESHOLD: f32 = 0.9;

/// Extra plane offset applied to glancing contacts (meters).
/// Pushes the redirected destination just off the surface to avoid re-hitting
/// it on the next iteration.
pub const GLANCING_OFFSET: f32 = 1.0e-3;

/// Base conversion from input direction to horizontal speed.
/// Horizontal displacement per step is `dt * SPEED_FACTOR * speed_multiplier`
/// scaled by the analog magnitude remap.
pub const SPEED_FACTOR: f64 = 2.0;

/// Horizontal speed scale at the analog stick's deflection limits.
/// A magnitude of 0 maps to `MIN_SPEED_SCALE`, a magnitude of 1 to
/// `MAX_SPEED_SCALE`, linearly in between.
pub const MIN_SPEED_SCALE: f32 = 0.2;
pub const MAX_SPEED_SCALE: f32 = 1.0;

/// Duration of one attack window (seconds).
pub const ATTACK_WINDOW_SECONDS: f64 = 0.5;

/// Duration the host's orientation tween should take to reach a newly
/// committed facing angle (seconds).
pub const FACING_TURN_SECONDS: f32 = 0.1;

/// Practical small distance for comparisons (meters).
/// Use for dot-product guards, equality checks in world space, etc.
pub const DIST_EPS: f32 = 1.0e-6;

/// Squared-norm floor below which a vector has no usable direction.
pub const NORM_EPS_SQ: f32 = 1.0e-12;

/// Helper: squared stop-speed threshold for squared-length comparisons.
#[inline]
pub const fn stop_speed_sq() -> f32 {
    STOP_SPEED * STOP_SPEED
}

/// Helper: number of whole virtual frames contained in a step of `dt` seconds.
/// Negative or NaN inputs yield zero frames.
#[inline]
pub fn virtual_frames(dt_seconds: f64) -> u32 {
    let frames = (dt_seconds / VIRTUAL_FRAME_SECONDS).floor();
    if frames.is_finite() && frames > 0.0 {
        frames as u32
    } else {
        0
    }
}

/// Helper: horizontal speed scale for an input direction magnitude in `[0, 1]`.
#[inline]
pub fn speed_scale(input_magnitude: f32) -> f32 {
    let m = input_magnitude.clamp(0.0, 1.0);
    m * (MAX_SPEED_SCALE - MIN_SPEED_SCALE) + MIN_SPEED_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_frames_floor_the_frame_ratio() {
        // Just under one frame is zero frames; exact multiples count fully.
        assert_eq!(virtual_frames(1.0 / 60.0 - 1.0e-6), 0);
        assert_eq!(virtual_frames(1.0 / 60.0), 1);
        assert_eq!(virtual_frames(3.0 / 60.0), 3);
        assert_eq!(virtual_frames(0.0), 0);
        assert_eq!(virtual_frames(-0.25), 0);
    }

    #[test]
    fn speed_scale_spans_min_to_max() {
        assert!((speed_scale(0.0) - MIN_SPEED_SCALE).abs() <= 1.0e-6);
        assert!((speed_scale(1.0) - MAX_SPEED_SCALE).abs() <= 1.0e-6);
        assert!((speed_scale(0.5) - 0.6).abs() <= 1.0e-6);
        // Out-of-range magnitudes clamp instead of extrapolating.
        assert!((speed_scale(2.0) - MAX_SPEED_SCALE).abs() <= 1.0e-6);
    }
}
