//! Cloth friction model.
//!
//! Pure function of a ball's kinematics: decides whether the ball slides or
//! rolls on the cloth and updates linear velocity, roll spin and z-spin for
//! one sub-step. Collision response is left to the rigid-body solver.

use glam::Vec2;

use crate::components::ball::Ball;
use crate::config::PhysicsTuning;
use crate::core::math::blend_toward;

/// Contact state of a ball on the cloth after a sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClothPhase {
    Sliding,
    Rolling,
    Stopped,
}

/// Sliding friction coefficient for a given slip speed: constant up to the
/// knee, then rising linearly, clamped to the maximum.
pub fn slide_coefficient(slip_speed: f32, tuning: &PhysicsTuning) -> f32 {
    let extra = (slip_speed - tuning.high_slip_knee).max(0.0) * tuning.high_slip_slope;
    (tuning.slide_friction + extra).min(tuning.slide_friction_max)
}

fn decay_spin(spin_z: f32, decay: f32, dt: f32) -> f32 {
    let step = decay * dt;
    if spin_z.abs() <= step {
        0.0
    } else {
        spin_z - spin_z.signum() * step
    }
}

/// Advance `ball` through one sub-step of cloth contact.
pub fn apply_cloth(ball: &mut Ball, tuning: &PhysicsTuning, dt: f32) -> ClothPhase {
    ball.spin_z = decay_spin(ball.spin_z, tuning.spin_decay, dt);

    let slip = ball.slip_velocity();
    let slip_speed = slip.length();

    if slip_speed > tuning.slip_threshold {
        let decel = slide_coefficient(slip_speed, tuning) * tuning.gravity;
        let mut dv = -slip / slip_speed * decel * dt;

        let speed = ball.vel.length();
        if speed > f32::EPSILON {
            let dir = ball.vel / speed;
            let along = dv.dot(dir);
            // A small residual forward slip must not keep pushing the ball.
            if along > 0.0 && slip_speed < tuning.forward_kick_slip {
                dv -= dir * along * (1.0 - tuning.forward_kick_attenuation);
            }
            // Object balls do not swerve.
            if !ball.is_cue_ball() {
                dv = dir * dv.dot(dir);
            }
        }
        // Friction can at most cancel the slip it opposes.
        if dv.length() > slip_speed {
            dv = dv.normalize_or_zero() * slip_speed;
        }

        ball.vel += dv;
        ball.roll = blend_toward(ball.roll, ball.natural_roll(), tuning.slide_blend_rate, dt);
        ClothPhase::Sliding
    } else {
        let speed = ball.vel.length();
        let decel = tuning.roll_friction * tuning.gravity * dt;
        if speed < tuning.stop_speed || decel >= speed {
            ball.stop();
            return ClothPhase::Stopped;
        }
        ball.vel -= ball.vel / speed * decel;
        ball.roll = blend_toward(ball.roll, ball.natural_roll(), tuning.roll_blend_rate, dt);
        ClothPhase::Rolling
    }
}

/// Whether a ball is still moving by the rest thresholds.
pub fn is_moving(ball: &Ball, tuning: &PhysicsTuning) -> bool {
    ball.vel.length_squared() >= tuning.rest_speed_sq
        || ball.spin_z.abs() >= tuning.rest_spin
        || ball.roll.length() >= tuning.rest_spin
}

/// Zero a ball that has fallen under every rest threshold. Returns whether
/// the ball is now at rest.
pub fn settle(ball: &mut Ball, tuning: &PhysicsTuning) -> bool {
    if is_moving(ball, tuning) {
        return false;
    }
    ball.vel = Vec2::ZERO;
    ball.spin_z = 0.0;
    ball.roll = Vec2::ZERO;
    true
}
