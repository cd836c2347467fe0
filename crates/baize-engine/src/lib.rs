pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod rules;
pub mod extensions;
pub mod config;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::session::Session;
pub use config::{EngineConfig, PhysicsTuning};
pub use error::{RulesError, SnapshotError};
pub use components::ball::{
    Ball, BallClassification, BallLifecycle, ForceSync, Group, SnookerColor, UkGroup, CUE_BALL,
};
pub use components::cue::Shot;
pub use components::table::{Cushion, PlacementZone, Pocket, Table, TableStyle};
pub use crate::core::time::FixedTimestep;
pub use crate::core::rng::Rng;
pub use systems::integrator::{Integrator, PhysicsEvent};
pub use systems::prediction::{predict, PredictedHit, Prediction};
pub use rules::{
    FoulDecision, FoulReason, Game, GameInfo, GameMode, GameOutcome, GameSnapshot, GameState,
    MatchScore, PendingDecision, Player, PushOutChoice, PushOutResponse, RulesEvent, WinReason,
};
pub use extensions::Easing;
