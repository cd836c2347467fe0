use thiserror::Error;

use crate::rules::GameState;

/// Rejection of an external call into the rules engine. A rejected call
/// never changes game state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulesError {
    #[error("not allowed in state {0:?}")]
    WrongState(GameState),

    #[error("no decision is pending")]
    NoDecisionPending,

    #[error("decision not available: {0}")]
    DecisionUnavailable(&'static str),

    #[error("illegal cue ball placement: {0}")]
    IllegalPlacement(&'static str),

    #[error("not applicable in this game mode")]
    NotApplicable,

    #[error("unknown ball {0}")]
    UnknownBall(u8),

    #[error("no free position to respot ball {0}")]
    RespotExhausted(u8),

    #[error("shot has no direction or power")]
    InvalidShot,

    #[error("the match is already decided")]
    MatchDecided,
}

/// Failure to restore a saved game.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot ball set does not match game mode: {0}")]
    BallSetMismatch(String),
}
