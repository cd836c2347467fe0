//! The per-mode strategy seam of the rules engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::{Ball, ForceSync, SnookerColor, CUE_BALL};
use crate::components::table::{PlacementZone, Table};
use crate::core::rng::Rng;
use crate::rules::eight_ball::EightBallRules;
use crate::rules::events::RulesEvent;
use crate::rules::free_play::FreePlayRules;
use crate::rules::nine_ball::NineBallRules;
use crate::rules::respot;
use crate::rules::shot::{Foul, FoulConsequence, ShotRecord, ShotVerdict};
use crate::rules::snooker::SnookerRules;
use crate::rules::uk_eight_ball::UkEightBallRules;
use crate::rules::{GameMode, Player};

/// What an evaluator may touch while judging a shot.
pub struct RulesCtx<'a> {
    pub table: &'a Table,
    pub balls: &'a mut [Ball],
    pub shooter: Player,
    pub events: &'a mut Vec<RulesEvent>,
    pub syncs: &'a mut Vec<ForceSync>,
    pub rng: &'a mut Rng,
}

impl<'a> RulesCtx<'a> {
    pub fn balls(&self) -> &[Ball] {
        &*self.balls
    }

    pub fn ball(&self, number: u8) -> Option<&Ball> {
        self.balls.iter().find(|b| b.number == number)
    }

    pub fn color_of(&self, number: u8) -> Option<SnookerColor> {
        self.ball(number).and_then(Ball::snooker_color)
    }

    /// Object balls currently on the table.
    pub fn object_balls(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(|b| b.number != CUE_BALL && b.on_table())
    }

    pub fn cue_ball(&self) -> Option<&Ball> {
        self.ball(CUE_BALL)
    }

    pub fn emit(&mut self, event: RulesEvent) {
        self.events.push(event);
    }

    /// Respot a pool ball at `preferred` (or the nearest free point on the
    /// long axis). Failure is logged and reported, the ball stays down.
    pub fn respot_at(&mut self, number: u8, preferred: Vec2) -> bool {
        let result = respot::respot_pool_ball(self.table, self.balls, number, preferred);
        self.finish_respot(number, result)
    }

    /// Respot a snooker colour using the spot priority.
    pub fn respot_color(&mut self, number: u8) -> bool {
        let result = respot::respot_color(self.table, self.balls, number);
        self.finish_respot(number, result)
    }

    fn finish_respot(&mut self, number: u8, result: Result<Vec2, crate::error::RulesError>) -> bool {
        match result {
            Ok(pos) => {
                log::debug!("Respotted ball {} at {:?}", number, pos);
                if let Some(ball) = self.ball(number) {
                    let sync = ForceSync::from_ball(ball);
                    self.syncs.push(sync);
                }
                true
            }
            Err(err) => {
                log::error!("{}", err);
                self.emit(RulesEvent::RespotFailed { ball: number });
                false
            }
        }
    }
}

/// Mode-specific judgement of a finished shot. The shared lifecycle in
/// [`Game`](crate::rules::Game) handles state, turn switching and ball in
/// hand; an evaluator only decides fouls, scoring and continuation.
pub trait ShotEvaluator {
    /// Called when the cue ball is struck, before any motion.
    fn on_shot_taken(&mut self, _ctx: &mut RulesCtx<'_>, _record: &ShotRecord) {}

    /// Judge a shot once every ball is at rest.
    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict;

    /// How play continues after `foul`.
    fn foul_consequence(&mut self, _ctx: &mut RulesCtx<'_>, _foul: &Foul, _record: &ShotRecord) -> FoulConsequence {
        FoulConsequence::BallInHand {
            zone: PlacementZone::Anywhere,
        }
    }
}

/// Rule state of the active mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Rules {
    EightBall(EightBallRules),
    NineBall(NineBallRules),
    UkEightBall(UkEightBallRules),
    Snooker(SnookerRules),
    FreePlay(FreePlayRules),
}

impl Rules {
    pub fn new(mode: GameMode) -> Self {
        match mode {
            GameMode::EightBall => Rules::EightBall(EightBallRules::default()),
            GameMode::NineBall => Rules::NineBall(NineBallRules::default()),
            GameMode::UkEightBall => Rules::UkEightBall(UkEightBallRules::default()),
            GameMode::Snooker => Rules::Snooker(SnookerRules::default()),
            GameMode::FreePlay => Rules::FreePlay(FreePlayRules::default()),
        }
    }

    pub fn mode(&self) -> GameMode {
        match self {
            Rules::EightBall(_) => GameMode::EightBall,
            Rules::NineBall(_) => GameMode::NineBall,
            Rules::UkEightBall(_) => GameMode::UkEightBall,
            Rules::Snooker(_) => GameMode::Snooker,
            Rules::FreePlay(_) => GameMode::FreePlay,
        }
    }

    fn evaluator(&mut self) -> &mut dyn ShotEvaluator {
        match self {
            Rules::EightBall(r) => r,
            Rules::NineBall(r) => r,
            Rules::UkEightBall(r) => r,
            Rules::Snooker(r) => r,
            Rules::FreePlay(r) => r,
        }
    }
}

impl ShotEvaluator for Rules {
    fn on_shot_taken(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) {
        self.evaluator().on_shot_taken(ctx, record)
    }

    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        self.evaluator().evaluate(ctx, record)
    }

    fn foul_consequence(&mut self, ctx: &mut RulesCtx<'_>, foul: &Foul, record: &ShotRecord) -> FoulConsequence {
        self.evaluator().foul_consequence(ctx, foul, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_round_trip_their_mode() {
        for mode in [
            GameMode::EightBall,
            GameMode::NineBall,
            GameMode::UkEightBall,
            GameMode::Snooker,
            GameMode::FreePlay,
        ] {
            assert_eq!(Rules::new(mode).mode(), mode);
        }
    }

    #[test]
    fn rules_serialize_with_mode_tag() {
        let json = serde_json::to_value(Rules::new(GameMode::FreePlay)).unwrap();
        assert_eq!(json["mode"], "free_play");
    }
}
