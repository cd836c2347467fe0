//! Per-shot bookkeeping and the verdict an evaluator returns for it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::ball::CUE_BALL;
use crate::components::table::PlacementZone;
use crate::rules::decision::PendingDecision;
use crate::rules::Player;

/// Everything observed between `shoot` and the balls coming to rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotRecord {
    pub shooter: Option<Player>,
    pub is_break: bool,
    /// First object ball the cue ball touched. Never overwritten.
    pub first_hit: Option<u8>,
    /// Any ball reached a cushion after the first hit.
    pub rail_after_hit: bool,
    /// Balls pocketed this shot, in capture order, cue ball included.
    pub pocketed: Vec<u8>,
    pub cue_pocketed: bool,
    /// Object balls on the table when the shot was taken.
    pub on_table_before: Vec<u8>,
    /// Object balls that were driven past the centre line.
    pub crossed_center: Vec<u8>,
}

impl ShotRecord {
    pub fn new(shooter: Player, is_break: bool, on_table_before: Vec<u8>) -> Self {
        Self {
            shooter: Some(shooter),
            is_break,
            on_table_before,
            ..Self::default()
        }
    }

    /// Object balls pocketed this shot.
    pub fn potted(&self) -> impl Iterator<Item = u8> + '_ {
        self.pocketed.iter().copied().filter(|&n| n != CUE_BALL)
    }

    pub fn potted_any(&self) -> bool {
        self.potted().next().is_some()
    }

    pub fn was_potted(&self, number: u8) -> bool {
        self.pocketed.contains(&number)
    }

    pub fn was_on_table(&self, number: u8) -> bool {
        self.on_table_before.contains(&number)
    }

    /// Object balls pocketed or driven past the centre line (break rule).
    pub fn break_count(&self) -> usize {
        let mut count = self.crossed_center.len();
        count += self.potted().filter(|n| !self.crossed_center.contains(n)).count();
        count
    }

    pub fn record_hit(&mut self, a: u8, b: u8) {
        if self.first_hit.is_some() {
            return;
        }
        if a == CUE_BALL && b != CUE_BALL {
            self.first_hit = Some(b);
        } else if b == CUE_BALL && a != CUE_BALL {
            self.first_hit = Some(a);
        }
    }

    pub fn record_rail(&mut self) {
        if self.first_hit.is_some() {
            self.rail_after_hit = true;
        }
    }

    pub fn record_pocket(&mut self, ball: u8) {
        if !self.pocketed.contains(&ball) {
            self.pocketed.push(ball);
        }
        if ball == CUE_BALL {
            self.cue_pocketed = true;
        }
    }

    pub fn record_crossing(&mut self, ball: u8) {
        if ball != CUE_BALL && !self.crossed_center.contains(&ball) {
            self.crossed_center.push(ball);
        }
    }
}

/// Why a shot was a foul.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoulReason {
    CueBallPocketed,
    NoBallHit,
    MustHitLowest { ball: u8 },
    MustHitOwnGroup,
    MustHitEight,
    /// Snooker: the first ball struck was not on.
    MustHitBallOn { on: String },
    NoCushionAfterContact,
    WeakBreak,
    IllegalPot { ball: u8 },
}

impl fmt::Display for FoulReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoulReason::CueBallPocketed => f.write_str("Cue ball pocketed"),
            FoulReason::NoBallHit => f.write_str("No ball hit"),
            FoulReason::MustHitLowest { ball } => write!(f, "Must hit {}-ball first", ball),
            FoulReason::MustHitOwnGroup => f.write_str("Must hit own group first"),
            FoulReason::MustHitEight => f.write_str("Must hit the 8-ball first"),
            FoulReason::MustHitBallOn { on } => write!(f, "Must hit {} first", on),
            FoulReason::NoCushionAfterContact => f.write_str("No ball reached a cushion after contact"),
            FoulReason::WeakBreak => f.write_str("Fewer than 3 balls pocketed or past the centre line on the break"),
            FoulReason::IllegalPot { ball } => write!(f, "Ball {} potted illegally", ball),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Foul {
    pub reason: FoulReason,
    /// Points awarded to the opponent (snooker); 0 elsewhere.
    pub penalty: u32,
    /// Snooker: the ball on was not hit.
    pub miss: bool,
}

impl Foul {
    pub fn new(reason: FoulReason) -> Self {
        Self {
            reason,
            penalty: 0,
            miss: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WinReason {
    EightBallPotted,
    /// The loser potted the 8-ball (or black) illegally.
    EightBallFoul,
    NineBallPotted,
    ThreeConsecutiveFouls,
    /// Snooker frame decided on points.
    Points { winner: u32, loser: u32 },
    /// Snooker: three consecutive misses while not snookered.
    MissForfeit,
    TableCleared,
    Conceded,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::EightBallPotted => f.write_str("Potted the 8-ball"),
            WinReason::EightBallFoul => f.write_str("Opponent potted the 8-ball illegally"),
            WinReason::NineBallPotted => f.write_str("Potted the 9-ball"),
            WinReason::ThreeConsecutiveFouls => f.write_str("Opponent fouled three times in a row"),
            WinReason::Points { winner, loser } => write!(f, "Won the frame {}-{}", winner, loser),
            WinReason::MissForfeit => f.write_str("Opponent missed three times in a row"),
            WinReason::TableCleared => f.write_str("Table cleared"),
            WinReason::Conceded => f.write_str("Opponent conceded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Player,
    pub reason: WinReason,
}

/// Who plays next and from where, when an evaluator overrides the usual
/// continue/switch rule (snooker re-spotted black, free-play scratch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOverride {
    pub player: Player,
    pub ball_in_hand: Option<PlacementZone>,
}

/// Result of evaluating one shot. Built fresh for every shot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShotVerdict {
    pub foul: Option<Foul>,
    pub turn_continues: bool,
    pub outcome: Option<GameOutcome>,
    /// Decision to request from the next shooter after a foul-free shot.
    pub decision: Option<PendingDecision>,
    pub turn_override: Option<TurnOverride>,
}

impl ShotVerdict {
    pub fn foul(foul: Foul) -> Self {
        Self {
            foul: Some(foul),
            ..Self::default()
        }
    }

    pub fn continues(turn_continues: bool) -> Self {
        Self {
            turn_continues,
            ..Self::default()
        }
    }

    pub fn game_over(winner: Player, reason: WinReason) -> Self {
        Self {
            outcome: Some(GameOutcome { winner, reason }),
            ..Self::default()
        }
    }
}

/// What happens to the table and the turn after a foul.
#[derive(Debug, Clone, PartialEq)]
pub enum FoulConsequence {
    /// Opponent takes over with the cue ball in hand.
    BallInHand { zone: PlacementZone },
    /// Opponent takes over and plays the cue ball from where it lies.
    PlayFromPosition,
    /// Park until the incoming player chooses a remedy.
    AwaitDecision(PendingDecision),
}
