//! The single pending-decision slot of `AwaitingDecision`, and the choices
//! an external decision-maker can send back.

use serde::{Deserialize, Serialize};

use crate::rules::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingDecision {
    #[default]
    None,
    /// 9-ball: `player` may push out with the first shot after the break.
    PushOutOffer { player: Player },
    /// 9-ball: `player` decides whether to play after a push-out.
    PushOutResponse { player: Player },
    /// Snooker: the incoming player chooses a remedy for `offender`'s foul.
    SnookerFoulDecision {
        penalty: u32,
        miss: bool,
        free_ball_eligible: bool,
        offender: Player,
    },
    /// Snooker: `player` took a free ball and must nominate it.
    FreeBallNomination { player: Player },
}

impl PendingDecision {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingDecision::None)
    }

    /// Player who has to answer.
    pub fn decider(&self) -> Option<Player> {
        match *self {
            PendingDecision::None => None,
            PendingDecision::PushOutOffer { player }
            | PendingDecision::PushOutResponse { player }
            | PendingDecision::FreeBallNomination { player } => Some(player),
            PendingDecision::SnookerFoulDecision { offender, .. } => Some(offender.opponent()),
        }
    }
}

/// Snooker foul remedies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoulDecision {
    /// Take the table as it lies.
    Play,
    /// Take the table and nominate a free ball.
    FreeBall,
    /// Make the offender play again from where the balls lie.
    Replay,
    /// After a miss: put the balls back and make the offender play again.
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOutChoice {
    PushOut,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOutResponse {
    /// Shoot from the pushed-out position.
    Play,
    /// Hand the shot back to the player who pushed out.
    Pass,
}
