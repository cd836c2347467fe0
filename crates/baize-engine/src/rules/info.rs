//! Flattened, pull-based view of the game for renderers and UIs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::SnookerColor;
use crate::components::table::{PlacementZone, TableStyle};
use crate::rules::decision::PendingDecision;
use crate::rules::evaluator::Rules;
use crate::rules::game::Game;
use crate::rules::shot::GameOutcome;
use crate::rules::snooker::{self, Target};
use crate::rules::{GameMode, GameState, Player};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallInfo {
    pub number: u8,
    pub pos: Vec2,
    pub on_table: bool,
    pub sinking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NineBallInfo {
    pub lowest: u8,
    pub consecutive_fouls: [u8; 2],
    pub push_out_declared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UkInfo {
    pub shots_remaining: u8,
    pub free_shot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnookerInfo {
    pub target: Target,
    pub scores: [u32; 2],
    pub current_break: u32,
    pub highest_break: [u32; 2],
    pub misses: [u8; 2],
    pub reds_remaining: u32,
    pub points_remaining: u32,
    pub nominated: Option<SnookerColor>,
    pub free_ball: Option<u8>,
    pub respotted_black: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub mode: GameMode,
    pub style: TableStyle,
    pub state: GameState,
    pub current: Player,
    pub is_break: bool,
    /// Group label per player ("solids", "reds", ...) once assigned.
    pub groups: [Option<String>; 2],
    /// Object balls of each player's group still on the table.
    pub group_remaining: [u32; 2],
    pub foul: bool,
    pub foul_reason: Option<String>,
    pub turn_continues: bool,
    pub ball_in_hand: Option<PlacementZone>,
    pub pending: PendingDecision,
    pub outcome: Option<GameOutcome>,
    pub frames: [u32; 2],
    pub best_of: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nine_ball: Option<NineBallInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uk: Option<UkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snooker: Option<SnookerInfo>,
    pub balls: Vec<BallInfo>,
}

impl Game {
    pub fn info(&self) -> GameInfo {
        let (groups, group_remaining) = match &self.rules {
            Rules::EightBall(r) => (r.groups.labels(), r.groups.remaining(&self.balls)),
            Rules::UkEightBall(r) => (r.groups.labels(), r.groups.remaining(&self.balls)),
            _ => ([None, None], [0, 0]),
        };
        let nine_ball = match &self.rules {
            Rules::NineBall(r) => Some(NineBallInfo {
                lowest: r.lowest,
                consecutive_fouls: r.consecutive_fouls,
                push_out_declared: r.push_out_declared,
            }),
            _ => None,
        };
        let uk = match &self.rules {
            Rules::UkEightBall(r) => Some(UkInfo {
                shots_remaining: r.shots_remaining,
                free_shot: r.free_shot,
            }),
            _ => None,
        };
        let snooker = match &self.rules {
            Rules::Snooker(r) => Some(SnookerInfo {
                target: r.target,
                scores: r.scores,
                current_break: r.current_break,
                highest_break: r.highest_break,
                misses: r.misses,
                reds_remaining: snooker::reds_on_table(&self.balls) as u32,
                points_remaining: r.points_remaining(&self.balls),
                nominated: r.nominated,
                free_ball: r.free_ball,
                respotted_black: r.respotted_black,
            }),
            _ => None,
        };

        GameInfo {
            mode: self.mode,
            style: self.table.style,
            state: self.state,
            current: self.current,
            is_break: self.is_break,
            groups,
            group_remaining,
            foul: self.last_foul.is_some(),
            foul_reason: self.last_foul.as_ref().map(|f| f.reason.to_string()),
            turn_continues: self.turn_continues,
            ball_in_hand: self.ball_in_hand,
            pending: self.pending,
            outcome: self.outcome.clone(),
            frames: self.match_score.frames,
            best_of: self.match_score.best_of,
            nine_ball,
            uk,
            snooker,
            balls: self
                .balls
                .iter()
                .map(|b| BallInfo {
                    number: b.number,
                    pos: b.pos,
                    on_table: b.on_table(),
                    sinking: b.is_sinking(),
                })
                .collect(),
        }
    }
}
