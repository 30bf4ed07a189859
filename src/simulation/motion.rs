//! Movement primitives shared by the foraging states.
//!
//! Two flavours exist: a constant-speed hop (`move_towards`) used for the
//! short flights around the hive, and a critically damped approach
//! (`smooth_damp`) used for open flight, paired with `turn_towards` so the
//! bee faces where it is going.

use glam::{Quat, Vec3};

/// Velocity magnitude below which a bee keeps its current heading.
pub const TURN_THRESHOLD: f32 = 0.01;

const MIN_SMOOTH_TIME: f32 = 0.0001;

/// Moves `current` towards `target` by at most `max_step`, landing exactly on
/// the target when it is within reach.
pub fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let to_target = target - current;
    let distance = to_target.length();
    if distance <= max_step || distance == 0.0 {
        return target;
    }
    current + to_target / distance * max_step
}

/// Critically damped spring towards `target`.
///
/// `velocity` is carried between calls by the caller. `smooth_time` is the
/// approximate time to reach the target and `max_speed` bounds the response.
/// Never overshoots: if the step would pass the target, the result is the
/// target and the velocity is zeroed.
pub fn smooth_damp(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    max_speed: f32,
    dt: f32,
) -> Vec3 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let original_target = target;
    let max_change = max_speed * smooth_time;
    let change = (current - target).clamp_length_max(max_change);
    let target = current - change;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (original_target - current).dot(output - original_target) > 0.0 {
        output = original_target;
        *velocity = Vec3::ZERO;
    }

    output
}

/// Rotates `rotation` towards facing along `velocity`, at `rotation_speed`
/// (fraction per second, clamped to a full turn per call).
pub fn turn_towards(rotation: Quat, velocity: Vec3, rotation_speed: f32, dt: f32) -> Quat {
    if velocity.length() <= TURN_THRESHOLD {
        return rotation;
    }
    let facing = Quat::from_rotation_arc(Vec3::Z, velocity.normalize());
    let t = (rotation_speed * dt).clamp(0.0, 1.0);
    rotation.slerp(facing, t).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_snaps_when_in_reach() {
        let p = move_towards(Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0), 0.1);
        assert_eq!(p, Vec3::new(0.05, 0.0, 0.0));
    }

    #[test]
    fn move_towards_respects_step() {
        let p = move_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 0.5);
        assert!((p.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let target = Vec3::new(3.0, 1.0, -2.0);
        let mut pos = Vec3::ZERO;
        let mut vel = Vec3::ZERO;
        for _ in 0..600 {
            let next = smooth_damp(pos, target, &mut vel, 0.1, 8.0, 1.0 / 60.0);
            // Distance never increases.
            assert!(next.distance(target) <= pos.distance(target) + 1e-5);
            pos = next;
        }
        assert!(pos.distance(target) < 0.01);
    }

    #[test]
    fn smooth_damp_is_speed_limited() {
        let target = Vec3::new(100.0, 0.0, 0.0);
        let mut vel = Vec3::ZERO;
        let dt = 0.02;
        let next = smooth_damp(Vec3::ZERO, target, &mut vel, 0.1, 8.0, dt);
        assert!(next.length() <= 8.0 * 0.1 + 1e-4);
    }

    #[test]
    fn turn_ignores_tiny_velocity() {
        let r = turn_towards(Quat::IDENTITY, Vec3::new(0.001, 0.0, 0.0), 5.0, 0.1);
        assert_eq!(r, Quat::IDENTITY);
    }

    #[test]
    fn turn_faces_velocity_eventually() {
        let mut r = Quat::IDENTITY;
        let v = Vec3::new(1.0, 0.0, 0.0);
        for _ in 0..200 {
            r = turn_towards(r, v, 5.0, 0.05);
        }
        let forward = r * Vec3::Z;
        assert!(forward.distance(Vec3::X) < 1e-3);
    }
}
