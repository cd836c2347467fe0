//! Save/resume record of a whole game.

use serde::{Deserialize, Serialize};

use crate::components::ball::{Ball, ForceSync};
use crate::components::table::{PlacementZone, Table, TableStyle};
use crate::core::rng::Rng;
use crate::error::SnapshotError;
use crate::rules::decision::PendingDecision;
use crate::rules::evaluator::Rules;
use crate::rules::game::{Game, MatchScore};
use crate::rules::shot::{Foul, GameOutcome, ShotRecord};
use crate::rules::{GameMode, GameState, Player};

/// Everything needed to resume a frame exactly, including the rule state of
/// the active mode and the pre-shot position kept for a snooker restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub mode: GameMode,
    pub style: TableStyle,
    pub state: GameState,
    pub current: Player,
    pub breaker: Player,
    pub balls: Vec<Ball>,
    pub rules: Rules,
    #[serde(default)]
    pub pending: PendingDecision,
    pub last_foul: Option<Foul>,
    pub turn_continues: bool,
    pub ball_in_hand: Option<PlacementZone>,
    pub match_score: MatchScore,
    pub outcome: Option<GameOutcome>,
    #[serde(default)]
    pub record: ShotRecord,
    pub is_break: bool,
    pub rng: Rng,
    #[serde(default)]
    pub pre_shot: Option<Box<GameSnapshot>>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The ball set must be exactly the one `mode` plays with.
    fn validate(&self) -> Result<(), SnapshotError> {
        if self.rules.mode() != self.mode {
            return Err(SnapshotError::BallSetMismatch(format!(
                "rules are for {:?}, game is {:?}",
                self.rules.mode(),
                self.mode
            )));
        }
        let expected = self.mode.ball_set(1.0);
        if expected.len() != self.balls.len() {
            return Err(SnapshotError::BallSetMismatch(format!(
                "{:?} uses {} balls, snapshot has {}",
                self.mode,
                expected.len(),
                self.balls.len()
            )));
        }
        for (want, got) in expected.iter().zip(&self.balls) {
            if want.number != got.number || want.classification != got.classification {
                return Err(SnapshotError::BallSetMismatch(format!(
                    "ball {} is not part of the {:?} set",
                    got.number, self.mode
                )));
            }
        }
        Ok(())
    }
}

impl Game {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            mode: self.mode,
            style: self.table.style,
            state: self.state,
            current: self.current,
            breaker: self.breaker,
            balls: self.balls.clone(),
            rules: self.rules.clone(),
            pending: self.pending,
            last_foul: self.last_foul.clone(),
            turn_continues: self.turn_continues,
            ball_in_hand: self.ball_in_hand,
            match_score: self.match_score.clone(),
            outcome: self.outcome.clone(),
            record: self.record.clone(),
            is_break: self.is_break,
            rng: self.rng.clone(),
            pre_shot: self.pre_shot.as_ref().map(|s| {
                let mut inner = (**s).clone();
                inner.pre_shot = None;
                Box::new(inner)
            }),
        }
    }

    /// Resume from a saved record. Physics bodies are rebuilt from the
    /// restored positions on the next step.
    pub fn restore(&mut self, snapshot: GameSnapshot) -> Result<(), SnapshotError> {
        snapshot.validate()?;
        log::info!("Restoring {:?} game in state {:?}", snapshot.mode, snapshot.state);
        self.apply_snapshot(snapshot);
        Ok(())
    }

    pub fn save_json(&self) -> Result<String, SnapshotError> {
        self.snapshot().to_json()
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot = GameSnapshot::from_json(json)?;
        self.restore(snapshot)
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        if snapshot.style != self.table.style {
            self.table = Table::new(snapshot.style);
        }
        self.mode = snapshot.mode;
        self.state = snapshot.state;
        self.current = snapshot.current;
        self.breaker = snapshot.breaker;
        self.balls = snapshot.balls;
        self.rules = snapshot.rules;
        self.pending = snapshot.pending;
        self.last_foul = snapshot.last_foul;
        self.turn_continues = snapshot.turn_continues;
        self.ball_in_hand = snapshot.ball_in_hand;
        self.match_score = snapshot.match_score;
        self.outcome = snapshot.outcome;
        self.record = snapshot.record;
        self.is_break = snapshot.is_break;
        self.rng = snapshot.rng;
        self.pre_shot = snapshot.pre_shot;
        self.physics_reset = true;
        self.syncs = self
            .balls
            .iter()
            .filter(|b| b.on_table())
            .map(ForceSync::from_ball)
            .collect();
    }
}
