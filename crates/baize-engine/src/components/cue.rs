//! Shot translation: aim, power and tip offset into initial cue-ball state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::{Ball, ForceSync};
use crate::config::PhysicsTuning;

/// A cue stroke as the player describes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Aim direction. Normalized on use.
    pub direction: Vec2,
    /// Cue-ball speed in m/s, clamped to the configured maximum.
    pub power: f32,
    /// Tip offset in [-1, 1]²: x is english (negative = left),
    /// y is follow (positive) or draw (negative).
    #[serde(default)]
    pub spin: Vec2,
}

impl Shot {
    pub fn new(direction: Vec2, power: f32) -> Self {
        Self {
            direction,
            power,
            spin: Vec2::ZERO,
        }
    }

    pub fn with_spin(mut self, spin: Vec2) -> Self {
        self.spin = spin;
        self
    }

    /// Whether the stroke would move the ball at all.
    pub fn is_valid(&self) -> bool {
        self.direction.length_squared() > 1e-8 && self.power > 0.0 && self.power.is_finite()
    }

    /// Initial state of `ball` after being struck. Left english produces
    /// positive z-spin; a centred hit produces no roll (stun).
    pub fn strike(&self, ball: &Ball, tuning: &PhysicsTuning) -> ForceSync {
        let dir = self.direction.normalize_or_zero();
        let speed = self.power.clamp(0.0, tuning.max_shot_speed);
        let spin = self.spin.clamp(Vec2::splat(-1.0), Vec2::ONE);
        let natural_rate = speed / ball.radius;

        ForceSync {
            ball: ball.number,
            position: ball.pos,
            velocity: dir * speed,
            spin_z: -spin.x * natural_rate * tuning.english_scale,
            roll: dir.perp() * natural_rate * spin.y,
        }
    }
}
