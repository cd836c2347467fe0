//! Rules engine: turn, foul, scoring and frame logic for every game mode.
//!
//! `Game` owns the balls and runs the shared shot lifecycle; the per-mode
//! evaluators behind [`ShotEvaluator`] only decide fouls, scoring and turn
//! continuation.

pub mod decision;
pub mod eight_ball;
pub mod evaluator;
pub mod events;
pub mod free_play;
pub mod game;
pub mod groups;
pub mod info;
pub mod nine_ball;
pub mod respot;
pub mod shot;
pub mod snapshot;
pub mod snooker;
pub mod uk_eight_ball;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::ball::{self, Ball};
use crate::components::table::{PlacementZone, Table, TableStyle};

pub use decision::{FoulDecision, PendingDecision, PushOutChoice, PushOutResponse};
pub use evaluator::{Rules, RulesCtx, ShotEvaluator};
pub use events::RulesEvent;
pub use game::{Game, MatchScore};
pub use info::GameInfo;
pub use shot::{Foul, FoulConsequence, FoulReason, GameOutcome, ShotRecord, ShotVerdict, WinReason};
pub use snapshot::GameSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// 0 for player one, 1 for player two.
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => f.write_str("Player 1"),
            Player::Two => f.write_str("Player 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    EightBall,
    NineBall,
    UkEightBall,
    Snooker,
    FreePlay,
}

impl GameMode {
    pub fn default_style(self) -> TableStyle {
        match self {
            GameMode::EightBall | GameMode::NineBall | GameMode::FreePlay => TableStyle::AmericanNineFoot,
            GameMode::UkEightBall => TableStyle::EnglishSevenFoot,
            GameMode::Snooker => TableStyle::SnookerTwelveFoot,
        }
    }

    pub fn ball_set(self, radius: f32) -> Vec<Ball> {
        match self {
            GameMode::EightBall | GameMode::FreePlay => ball::american_set(radius),
            GameMode::NineBall => ball::nine_ball_set(radius),
            GameMode::UkEightBall => ball::uk_set(radius),
            GameMode::Snooker => ball::snooker_set(radius),
        }
    }

    pub fn rack(self, table: &Table, balls: &mut [Ball]) {
        match self {
            GameMode::EightBall | GameMode::FreePlay => table.rack_eight_ball(balls),
            GameMode::NineBall => table.rack_nine_ball(balls),
            GameMode::UkEightBall => table.rack_uk(balls),
            GameMode::Snooker => table.rack_snooker(balls),
        }
    }

    /// Where the cue ball goes for the break.
    pub fn break_zone(self) -> PlacementZone {
        match self {
            GameMode::EightBall | GameMode::NineBall | GameMode::FreePlay => PlacementZone::Kitchen,
            GameMode::UkEightBall => PlacementZone::Baulk,
            GameMode::Snooker => PlacementZone::D,
        }
    }
}

/// Shared lifecycle states. `AwaitingDecision` is only entered by snooker
/// foul remedies and the 9-ball push-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Menu,
    BallInHand,
    Playing,
    BallsMoving,
    AwaitingDecision,
    GameOver,
}
