use serde::{Deserialize, Serialize};

use crate::components::ball::SnookerColor;
use crate::rules::shot::{FoulReason, GameOutcome};
use crate::rules::{GameState, Player};

/// Notifications for the UI and audio layers, queued by the rules engine
/// and drained by the caller once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RulesEvent {
    StateChanged { from: GameState, to: GameState },
    Foul { player: Player, reason: FoulReason, miss: bool, penalty: u32 },
    BallPocketed { ball: u8, pocket: usize },
    GameOver { outcome: GameOutcome, frames: [u32; 2], match_over: bool },
    PushOutOffered { player: Player },
    PushOutResponseRequired { player: Player },
    FoulDecisionRequired { player: Player, penalty: u32, miss: bool, free_ball_eligible: bool },
    ColorNominationRequired { player: Player },
    FreeBallAwarded { player: Player },
    MissWarning { player: Player, misses: u8 },
    /// Snooker frame tied on the black: the black is re-spotted.
    BlackRespotted { starting: Player },
    RespotFailed { ball: u8 },
    Potted { player: Player, color: Option<SnookerColor>, points: u32 },
}
