//! Driver-side safety checks.
//!
//! The pre-check gates `run()` on body orientation; the post-checks clamp
//! the commands `run()` just wrote. Each post-check returns whether it
//! changed anything so the driver can flag and count it.

use quad_common::leg::LegCommand;

use crate::context::StateEstimate;

/// Body is near level: |roll| and |pitch| below `max_orientation`.
///
/// Non-finite estimates are unsafe.
#[inline]
pub fn orientation_is_safe(estimate: &StateEstimate, max_orientation: f64) -> bool {
    estimate.rpy.x.abs() < max_orientation && estimate.rpy.y.abs() < max_orientation
}

#[inline]
fn clamp_axis(value: &mut f64, bound: f64) -> bool {
    let clamped = if value.is_finite() {
        value.clamp(-bound, bound)
    } else {
        0.0
    };
    if clamped != *value {
        *value = clamped;
        true
    } else {
        false
    }
}

/// Clamp desired foot x/y into `±max_p_des`. Returns true if any leg changed.
pub fn clamp_p_des_foot(commands: &mut [LegCommand], max_p_des: f64) -> bool {
    let mut clamped = false;
    for cmd in commands.iter_mut() {
        clamped |= clamp_axis(&mut cmd.p_des.x, max_p_des);
        clamped |= clamp_axis(&mut cmd.p_des.y, max_p_des);
    }
    clamped
}

/// Clamp feed-forward force: x/y to `±max_lateral`, z to `±max_vertical`.
pub fn clamp_force_feed_forward(
    commands: &mut [LegCommand],
    max_lateral: f64,
    max_vertical: f64,
) -> bool {
    let mut clamped = false;
    for cmd in commands.iter_mut() {
        clamped |= clamp_axis(&mut cmd.force_feed_forward.x, max_lateral);
        clamped |= clamp_axis(&mut cmd.force_feed_forward.y, max_lateral);
        clamped |= clamp_axis(&mut cmd.force_feed_forward.z, max_vertical);
    }
    clamped
}
