use serde::{Deserialize, Serialize};

use crate::components::table::TableStyle;
use crate::extensions::easing::Easing;

/// Empirically tuned constants of the cloth model and the rigid-body solver.
///
/// None of these are derived from first principles; they are the knobs that
/// make trajectories look right. Every field can be overridden from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Gravitational acceleration (m/s²).
    pub gravity: f32,
    /// Ball mass (kg).
    pub ball_mass: f32,
    /// Contact-point slip speed above which a ball is sliding (m/s).
    pub slip_threshold: f32,
    /// Base sliding friction coefficient.
    pub slide_friction: f32,
    /// Slip speed above which sliding friction starts to grow (m/s).
    pub high_slip_knee: f32,
    /// Extra friction coefficient per m/s of slip above the knee.
    pub high_slip_slope: f32,
    /// Upper clamp on the sliding friction coefficient.
    pub slide_friction_max: f32,
    /// Rolling resistance coefficient.
    pub roll_friction: f32,
    /// Below this slip speed an accelerating friction component is attenuated (m/s).
    pub forward_kick_slip: f32,
    /// Fraction of the accelerating component kept under `forward_kick_slip`.
    pub forward_kick_attenuation: f32,
    /// Rate at which roll spin blends toward natural roll while sliding (1/s).
    pub slide_blend_rate: f32,
    /// Rate at which roll spin snaps toward natural roll while rolling (1/s).
    pub roll_blend_rate: f32,
    /// Linear decay of z-spin (english) on the cloth (rad/s²).
    pub spin_decay: f32,
    /// Rolling balls slower than this are stopped outright (m/s).
    pub stop_speed: f32,
    /// Speed squared below which a ball counts as at rest (m²/s²).
    pub rest_speed_sq: f32,
    /// Spin magnitude below which a ball counts as not spinning (rad/s).
    pub rest_spin: f32,
    /// Ball-ball restitution.
    pub ball_restitution: f32,
    /// Ball-ball friction (drives throw and spin transfer).
    pub ball_friction: f32,
    /// Ball-rail restitution.
    pub rail_restitution: f32,
    /// Ball-rail friction (drives running/check side off cushions).
    pub rail_friction: f32,
    /// Fraction of the ball radius subtracted from a pocket's capture radius.
    pub pocket_capture_fraction: f32,
    /// Seconds a captured ball spends in the sinking animation.
    pub sink_duration: f32,
    /// Easing of the sinking animation.
    pub sink_easing: Easing,
    /// Upper bound on shot power (m/s).
    pub max_shot_speed: f32,
    /// Scale from horizontal tip offset to z-spin, relative to natural roll.
    pub english_scale: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            ball_mass: 0.17,
            slip_threshold: 0.15,
            slide_friction: 0.2,
            high_slip_knee: 2.0,
            high_slip_slope: 0.02,
            slide_friction_max: 0.3,
            roll_friction: 0.05,
            forward_kick_slip: 1.0,
            forward_kick_attenuation: 0.1,
            slide_blend_rate: 2.5,
            roll_blend_rate: 12.0,
            spin_decay: 25.0,
            stop_speed: 0.01,
            rest_speed_sq: 1e-4,
            rest_spin: 0.05,
            ball_restitution: 0.95,
            ball_friction: 0.05,
            rail_restitution: 0.75,
            rail_friction: 0.2,
            pocket_capture_fraction: 0.25,
            sink_duration: 0.3,
            sink_easing: Easing::QuadIn,
            max_shot_speed: 8.0,
            english_scale: 0.5,
        }
    }
}

/// Configuration for a session, provided by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed physics sub-step in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Simulation speed multiplier (default: 1.0).
    pub speed: f32,
    /// Maximum physics sub-steps per render frame (default: 3).
    pub max_substeps: u32,
    /// Frames in a match; the first to win more than half takes it (default: 1).
    pub best_of: u32,
    /// Seed for coin flips (default: 42).
    pub seed: u64,
    /// Force a table style instead of the mode's default.
    pub table_style: Option<TableStyle>,
    pub tuning: PhysicsTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            speed: 1.0,
            max_substeps: 3,
            best_of: 1,
            seed: 42,
            table_style: None,
            tuning: PhysicsTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Frames needed to win the match.
    pub fn frames_to_win(&self) -> u32 {
        self.best_of.max(1) / 2 + 1
    }
}
