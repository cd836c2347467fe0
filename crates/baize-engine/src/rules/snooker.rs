//! Snooker: ball-on targets, scoring, foul penalties, the miss rule and the
//! free ball.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::ball::{Ball, SnookerColor, CUE_BALL};
use crate::components::table::PlacementZone;
use crate::core::math::segment_point_distance;
use crate::error::RulesError;
use crate::rules::decision::PendingDecision;
use crate::rules::evaluator::{RulesCtx, ShotEvaluator};
use crate::rules::events::RulesEvent;
use crate::rules::shot::{Foul, FoulConsequence, FoulReason, ShotRecord, ShotVerdict, TurnOverride, WinReason};
use crate::rules::Player;

/// Minimum foul penalty.
const MIN_PENALTY: u32 = 4;
/// Counted misses in a row that forfeit the frame.
const MISSES_TO_FORFEIT: u8 = 3;
const MISS_WARNING_AT: u8 = 2;
/// Keeps a thin-contact aim line just inside the target ball.
const THIN_CONTACT_EPSILON: f32 = 1e-4;

/// What the striker must hit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "color", rename_all = "snake_case")]
pub enum Target {
    Red,
    /// Any colour after a red; the nominated (or first struck) colour is on.
    AnyColor,
    /// A specific colour of the final clearance.
    Color(SnookerColor),
}

impl Target {
    /// Points of the ball on. `AnyColor` counts the nominated colour.
    pub fn value(self, nominated: Option<SnookerColor>) -> u32 {
        match self {
            Target::Red => SnookerColor::Red.value(),
            Target::AnyColor => nominated.map_or(0, SnookerColor::value),
            Target::Color(c) => c.value(),
        }
    }

    fn accepts(self, color: SnookerColor, nominated: Option<SnookerColor>) -> bool {
        match self {
            Target::Red => color.is_red(),
            Target::AnyColor => !color.is_red() && nominated.map_or(true, |n| n == color),
            Target::Color(c) => color == c,
        }
    }

    fn describe(self, nominated: Option<SnookerColor>) -> String {
        match (self, nominated) {
            (Target::Red, _) => "a red".to_string(),
            (Target::AnyColor, Some(c)) | (Target::Color(c), _) => format!("the {}", c),
            (Target::AnyColor, None) => "a colour".to_string(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Red => f.write_str("red"),
            Target::AnyColor => f.write_str("colour"),
            Target::Color(c) => write!(f, "{}", c),
        }
    }
}

fn color_of(balls: &[Ball], number: u8) -> Option<SnookerColor> {
    balls.iter().find(|b| b.number == number).and_then(Ball::snooker_color)
}

pub fn reds_on_table(balls: &[Ball]) -> usize {
    balls.iter().filter(|b| b.on_table() && b.is_red()).count()
}

pub fn lowest_color_on_table(balls: &[Ball]) -> Option<SnookerColor> {
    balls
        .iter()
        .filter(|b| b.on_table() && b.is_color())
        .filter_map(Ball::snooker_color)
        .min()
}

/// Ball on at the start of a visit: red while reds remain, else the lowest
/// colour left.
pub fn visit_target(balls: &[Ball]) -> Target {
    if reds_on_table(balls) > 0 {
        Target::Red
    } else {
        Target::Color(lowest_color_on_table(balls).unwrap_or(SnookerColor::Black))
    }
}

/// Numbers of the balls on the table that are on for `target`.
pub fn balls_on(balls: &[Ball], target: Target, free_ball: Option<u8>) -> Vec<u8> {
    balls
        .iter()
        .filter(|b| b.on_table())
        .filter(|b| {
            Some(b.number) == free_ball || b.snooker_color().is_some_and(|c| target.accepts(c, None))
        })
        .map(|b| b.number)
        .collect()
}

fn line_is_clear(balls: &[Ball], cue: &Ball, target: &Ball, end: glam::Vec2) -> bool {
    balls
        .iter()
        .filter(|b| b.on_table() && b.number != cue.number && b.number != target.number)
        .all(|b| segment_point_distance(cue.pos, end, b.pos) >= cue.radius + b.radius)
}

/// The cue ball can strike `target` along the centre line or either
/// thin-contact line without touching another ball first.
fn has_direct_path(balls: &[Ball], cue: &Ball, target: &Ball) -> bool {
    let normal = (target.pos - cue.pos).perp().normalize_or_zero();
    let offset = cue.radius + target.radius - THIN_CONTACT_EPSILON;
    [target.pos, target.pos + normal * offset, target.pos - normal * offset]
        .into_iter()
        .any(|end| line_is_clear(balls, cue, target, end))
}

/// Whether no ball in `on` can be hit directly from the cue ball.
pub fn is_snookered(balls: &[Ball], on: &[u8]) -> bool {
    let Some(cue) = balls.iter().find(|b| b.number == CUE_BALL && b.on_table()) else {
        return false;
    };
    let mut targets = balls.iter().filter(|b| b.on_table() && on.contains(&b.number)).peekable();
    if targets.peek().is_none() {
        return false;
    }
    targets.all(|t| !has_direct_path(balls, cue, t))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnookerRules {
    pub target: Target,
    pub scores: [u32; 2],
    pub current_break: u32,
    pub highest_break: [u32; 2],
    /// Consecutive counted misses per player.
    pub misses: [u8; 2],
    /// Colour nominated for the coming shot while any colour is on.
    pub nominated: Option<SnookerColor>,
    /// Ball nominated as a free ball for the coming shot.
    pub free_ball: Option<u8>,
    /// The striker had no direct line to a ball on when the shot was taken.
    pub snookered_at_start: bool,
    /// Frame tied on the black, now on a re-spotted black.
    pub respotted_black: bool,
}

impl Default for SnookerRules {
    fn default() -> Self {
        Self {
            target: Target::Red,
            scores: [0; 2],
            current_break: 0,
            highest_break: [0; 2],
            misses: [0; 2],
            nominated: None,
            free_ball: None,
            snookered_at_start: false,
            respotted_black: false,
        }
    }
}

impl SnookerRules {
    /// Nominate the colour for the next shot.
    pub fn nominate(&mut self, color: SnookerColor) -> Result<(), RulesError> {
        if self.target != Target::AnyColor {
            return Err(RulesError::DecisionUnavailable("no colour is on"));
        }
        if color.is_red() {
            return Err(RulesError::DecisionUnavailable("a red cannot be nominated"));
        }
        self.nominated = Some(color);
        Ok(())
    }

    /// Whether `number` may be nominated as a free ball.
    pub fn can_free_ball(&self, balls: &[Ball], number: u8) -> bool {
        number != CUE_BALL
            && balls.iter().any(|b| b.number == number && b.on_table())
            && !balls_on(balls, self.target, None).contains(&number)
    }

    /// Total still available to be scored by one player.
    pub fn points_remaining(&self, balls: &[Ball]) -> u32 {
        let reds = reds_on_table(balls) as u32;
        let colors: u32 = balls
            .iter()
            .filter(|b| b.on_table() && b.is_color())
            .filter_map(Ball::snooker_color)
            .map(SnookerColor::value)
            .sum();
        let pending_color = if self.target == Target::AnyColor {
            SnookerColor::Black.value()
        } else {
            0
        };
        reds * (1 + SnookerColor::Black.value()) + colors + pending_color
    }

    /// Keep scores and miss counts from `latest` over a restored position.
    pub fn carry_counters(&mut self, latest: &SnookerRules) {
        self.scores = latest.scores;
        self.highest_break = latest.highest_break;
        self.misses = latest.misses;
        self.current_break = 0;
        self.nominated = None;
        self.free_ball = None;
    }

    fn add_points(&mut self, player: Player, points: u32) {
        self.scores[player.index()] += points;
        self.current_break += points;
        let best = &mut self.highest_break[player.index()];
        *best = (*best).max(self.current_break);
    }

    fn penalty(&self, balls: &[Ball], target: Target, nominated: Option<SnookerColor>, record: &ShotRecord) -> u32 {
        let value = |n: u8| color_of(balls, n).map_or(0, SnookerColor::value);
        let first = record.first_hit.map_or(0, value);
        let potted = record.potted().map(value).max().unwrap_or(0);
        MIN_PENALTY
            .max(target.value(nominated))
            .max(first)
            .max(potted)
    }

    /// Frame over on the black: points decide, a tie re-spots the black.
    fn end_of_frame(&mut self, ctx: &mut RulesCtx<'_>) -> ShotVerdict {
        let [one, two] = self.scores;
        self.current_break = 0;
        if one != two {
            let (winner, high, low) = if one > two {
                (Player::One, one, two)
            } else {
                (Player::Two, two, one)
            };
            return ShotVerdict::game_over(winner, WinReason::Points { winner: high, loser: low });
        }

        let black = ctx
            .balls()
            .iter()
            .find(|b| b.snooker_color() == Some(SnookerColor::Black))
            .map(|b| b.number);
        if let Some(black) = black {
            ctx.respot_color(black);
        }
        self.respotted_black = true;
        self.target = Target::Color(SnookerColor::Black);
        let starting = if ctx.rng.coin_flip() { Player::One } else { Player::Two };
        log::info!("Frame tied at {}, black re-spotted, {} to play", one, starting);
        ctx.emit(RulesEvent::BlackRespotted { starting });
        ShotVerdict {
            turn_override: Some(TurnOverride {
                player: starting,
                ball_in_hand: Some(PlacementZone::D),
            }),
            ..ShotVerdict::default()
        }
    }

    fn apply_foul(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord, foul: Foul, target: Target) -> ShotVerdict {
        let offender = ctx.shooter;
        let receiver = offender.opponent();
        self.scores[receiver.index()] += foul.penalty;
        self.current_break = 0;
        log::debug!("{} fouls ({}), {} points to {}", offender, foul.reason, foul.penalty, receiver);

        let colors: Vec<u8> = record
            .potted()
            .filter(|&n| color_of(ctx.balls(), n).is_some_and(|c| !c.is_red()))
            .collect();
        for n in colors {
            ctx.respot_color(n);
        }

        let slot = &mut self.misses[offender.index()];
        if !foul.miss {
            *slot = 0;
        } else if self.snookered_at_start {
            log::debug!("{} missed while snookered, not counted", offender);
        } else {
            *slot += 1;
            let misses = *slot;
            if misses >= MISSES_TO_FORFEIT {
                log::info!("{} forfeits the frame after {} misses", offender, misses);
                let mut verdict = ShotVerdict::game_over(receiver, WinReason::MissForfeit);
                verdict.foul = Some(foul);
                return verdict;
            }
            if misses >= MISS_WARNING_AT {
                ctx.emit(RulesEvent::MissWarning { player: offender, misses });
            }
        }

        if target == Target::Color(SnookerColor::Black) {
            let mut verdict = self.end_of_frame(ctx);
            verdict.foul = Some(foul);
            return verdict;
        }

        self.target = visit_target(ctx.balls());
        ShotVerdict::foul(foul)
    }
}

impl ShotEvaluator for SnookerRules {
    fn on_shot_taken(&mut self, ctx: &mut RulesCtx<'_>, _record: &ShotRecord) {
        let on = balls_on(ctx.balls(), self.target, self.free_ball);
        self.snookered_at_start = is_snookered(ctx.balls(), &on);
    }

    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        let shooter = ctx.shooter;
        let target = self.target;
        let free_ball = self.free_ball.take();
        let nominated = match target {
            Target::AnyColor => self.nominated.take().or_else(|| {
                record
                    .first_hit
                    .and_then(|n| color_of(ctx.balls(), n))
                    .filter(|c| !c.is_red())
            }),
            _ => {
                self.nominated = None;
                None
            }
        };
        let is_on = |balls: &[Ball], n: u8| {
            Some(n) == free_ball || color_of(balls, n).is_some_and(|c| target.accepts(c, nominated))
        };

        let first_on = record.first_hit.is_some_and(|n| is_on(ctx.balls(), n));
        let illegal_pot = record.potted().find(|&n| !is_on(ctx.balls(), n));
        let reason = if record.cue_pocketed {
            Some(FoulReason::CueBallPocketed)
        } else if record.first_hit.is_none() {
            Some(FoulReason::NoBallHit)
        } else if !first_on {
            Some(FoulReason::MustHitBallOn {
                on: target.describe(nominated),
            })
        } else {
            illegal_pot.map(|ball| FoulReason::IllegalPot { ball })
        };

        if let Some(reason) = reason {
            let foul = Foul {
                reason,
                penalty: self.penalty(ctx.balls(), target, nominated, record),
                miss: !first_on,
            };
            return self.apply_foul(ctx, record, foul, target);
        }

        self.misses[shooter.index()] = 0;
        let potted: Vec<u8> = record.potted().collect();
        if potted.is_empty() {
            self.current_break = 0;
            self.target = visit_target(ctx.balls());
            return ShotVerdict::continues(false);
        }

        let (points, color) = match target {
            Target::Red => (potted.len() as u32, SnookerColor::Red),
            Target::AnyColor => {
                let c = nominated.unwrap_or(SnookerColor::Yellow);
                (c.value(), c)
            }
            Target::Color(c) => (c.value(), c),
        };
        self.add_points(shooter, points);
        ctx.emit(RulesEvent::Potted {
            player: shooter,
            color: Some(color),
            points,
        });

        if let Some(fb) = free_ball.filter(|&n| record.was_potted(n)) {
            if color_of(ctx.balls(), fb).is_some_and(|c| !c.is_red()) {
                ctx.respot_color(fb);
            }
        }

        match target {
            Target::Red => {
                self.target = Target::AnyColor;
                ctx.emit(RulesEvent::ColorNominationRequired { player: shooter });
            }
            Target::AnyColor => {
                for &n in &potted {
                    ctx.respot_color(n);
                }
                self.target = visit_target(ctx.balls());
            }
            Target::Color(c) => {
                let potted_on = potted.iter().any(|&n| color_of(ctx.balls(), n) == Some(c));
                if potted_on {
                    if c == SnookerColor::Black {
                        return self.end_of_frame(ctx);
                    }
                    self.target = visit_target(ctx.balls());
                }
            }
        }
        ShotVerdict::continues(true)
    }

    fn foul_consequence(&mut self, ctx: &mut RulesCtx<'_>, foul: &Foul, record: &ShotRecord) -> FoulConsequence {
        let on = balls_on(ctx.balls(), self.target, None);
        let free_ball_eligible = !record.cue_pocketed && is_snookered(ctx.balls(), &on);
        FoulConsequence::AwaitDecision(PendingDecision::SnookerFoulDecision {
            penalty: foul.penalty,
            miss: foul.miss,
            free_ball_eligible,
            offender: ctx.shooter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ball::{snooker_set, ForceSync};
    use crate::components::table::{Table, TableStyle};
    use crate::core::rng::Rng;
    use glam::Vec2;
    use proptest::prelude::*;

    const YELLOW: u8 = 16;
    const GREEN: u8 = 17;
    const BLUE: u8 = 19;
    const PINK: u8 = 20;
    const BLACK: u8 = 21;

    struct Fixture {
        table: Table,
        balls: Vec<Ball>,
        events: Vec<RulesEvent>,
        syncs: Vec<ForceSync>,
        rng: Rng,
    }

    struct Shot {
        shooter: Player,
        first_hit: Option<u8>,
        pots: Vec<u8>,
        scratch: bool,
    }

    impl Shot {
        fn by(shooter: Player) -> Self {
            Self {
                shooter,
                first_hit: None,
                pots: Vec::new(),
                scratch: false,
            }
        }

        fn hit(mut self, n: u8) -> Self {
            self.first_hit = Some(n);
            self
        }

        fn pot(mut self, n: u8) -> Self {
            self.pots.push(n);
            self
        }
    }

    impl Fixture {
        fn new() -> Self {
            let table = Table::new(TableStyle::SnookerTwelveFoot);
            let mut balls = snooker_set(table.ball_radius);
            table.rack_snooker(&mut balls);
            balls[0].place(table.default_cue_position(PlacementZone::D));
            Self {
                table,
                balls,
                events: Vec::new(),
                syncs: Vec::new(),
                rng: Rng::new(5),
            }
        }

        fn clear_reds(&mut self) {
            for n in 1..=15 {
                self.balls[n].pocket();
            }
        }

        fn play(&mut self, rules: &mut SnookerRules, shot: Shot) -> (ShotVerdict, Option<FoulConsequence>) {
            let before = self.balls.iter().filter(|b| b.number != 0 && b.on_table()).map(|b| b.number).collect();
            let mut record = ShotRecord::new(shot.shooter, false, before);
            let mut ctx = RulesCtx {
                table: &self.table,
                balls: &mut self.balls,
                shooter: shot.shooter,
                events: &mut self.events,
                syncs: &mut self.syncs,
                rng: &mut self.rng,
            };
            rules.on_shot_taken(&mut ctx, &record);
            record.first_hit = shot.first_hit;
            record.rail_after_hit = true;
            let mut pots = shot.pots;
            if shot.scratch {
                pots.push(CUE_BALL);
            }
            for p in pots {
                record.record_pocket(p);
                if let Some(b) = ctx.balls.iter_mut().find(|b| b.number == p) {
                    b.pocket();
                }
            }
            let verdict = rules.evaluate(&mut ctx, &record);
            let consequence = match (&verdict.foul, &verdict.outcome, &verdict.turn_override) {
                (Some(foul), None, None) => Some(rules.foul_consequence(&mut ctx, foul, &record)),
                _ => None,
            };
            (verdict, consequence)
        }
    }

    #[test]
    fn potting_a_red_scores_and_puts_colours_on() {
        let mut fx = Fixture::new();
        let mut rules = SnookerRules::default();
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(3).pot(3));
        assert!(v.foul.is_none());
        assert!(v.turn_continues);
        assert_eq!(rules.scores, [1, 0]);
        assert_eq!(rules.current_break, 1);
        assert_eq!(rules.target, Target::AnyColor);
        assert!(fx.events.contains(&RulesEvent::ColorNominationRequired { player: Player::One }));
    }

    #[test]
    fn colour_in_reds_phase_is_respotted_and_reds_come_back_on() {
        let mut fx = Fixture::new();
        let mut rules = SnookerRules {
            target: Target::AnyColor,
            ..SnookerRules::default()
        };
        rules.nominate(SnookerColor::Pink).unwrap();
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(PINK).pot(PINK));
        assert!(v.turn_continues);
        assert_eq!(rules.scores[0], 6);
        assert!(fx.balls[PINK as usize].on_table());
        assert_eq!(rules.target, Target::Red);
    }

    #[test]
    fn hitting_a_different_colour_than_nominated_is_a_foul() {
        let mut fx = Fixture::new();
        let mut rules = SnookerRules {
            target: Target::AnyColor,
            ..SnookerRules::default()
        };
        rules.nominate(SnookerColor::Blue).unwrap();
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(BLACK));
        let foul = v.foul.unwrap();
        assert_eq!(foul.penalty, 7);
        assert!(foul.miss);
        assert_eq!(rules.scores, [0, 7]);
    }

    #[test]
    fn last_red_then_colour_starts_clearance() {
        let mut fx = Fixture::new();
        for n in 2..=15 {
            fx.balls[n].pocket();
        }
        let mut rules = SnookerRules::default();
        fx.play(&mut rules, Shot::by(Player::One).hit(1).pot(1));
        assert_eq!(rules.target, Target::AnyColor);
        fx.play(&mut rules, Shot::by(Player::One).hit(BLUE).pot(BLUE));
        assert!(fx.balls[BLUE as usize].on_table());
        assert_eq!(rules.target, Target::Color(SnookerColor::Yellow));
        assert_eq!(rules.current_break, 6);
    }

    #[test]
    fn clearance_colours_stay_down_in_order() {
        let mut fx = Fixture::new();
        fx.clear_reds();
        let mut rules = SnookerRules {
            target: Target::Color(SnookerColor::Yellow),
            ..SnookerRules::default()
        };
        fx.play(&mut rules, Shot::by(Player::Two).hit(YELLOW).pot(YELLOW));
        assert!(fx.balls[YELLOW as usize].is_pocketed());
        assert_eq!(rules.target, Target::Color(SnookerColor::Green));
        let (v, _) = fx.play(&mut rules, Shot::by(Player::Two).hit(GREEN).pot(BLUE));
        assert_eq!(v.foul.map(|f| f.reason), Some(FoulReason::IllegalPot { ball: BLUE }));
        assert!(fx.balls[BLUE as usize].on_table(), "foul-potted colour is respotted");
        assert_eq!(rules.scores, [5, 2]);
        assert_eq!(rules.target, Target::Color(SnookerColor::Green));
    }

    #[test]
    fn scratch_is_a_foul_worth_at_least_four() {
        let mut fx = Fixture::new();
        let mut rules = SnookerRules::default();
        let mut shot = Shot::by(Player::One).hit(4);
        shot.scratch = true;
        let (v, consequence) = fx.play(&mut rules, shot);
        let foul = v.foul.unwrap();
        assert_eq!(foul.reason, FoulReason::CueBallPocketed);
        assert_eq!(foul.penalty, 4);
        assert!(!foul.miss);
        match consequence {
            Some(FoulConsequence::AwaitDecision(PendingDecision::SnookerFoulDecision { free_ball_eligible, .. })) => {
                assert!(!free_ball_eligible)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Only red 1 left, with the blue dead in line between it and the cue ball.
    fn snookered_on_the_last_red(fx: &mut Fixture) {
        for n in 2..=15 {
            fx.balls[n].pocket();
        }
        let mid = fx.table.width / 2.0;
        let blue = fx.table.spot(SnookerColor::Blue).unwrap();
        fx.balls[0].place(Vec2::new(blue.x - 0.5, mid));
        fx.balls[1].place(Vec2::new(blue.x + 0.5, mid));
    }

    #[test]
    fn foul_leaving_opponent_snookered_offers_free_ball() {
        let mut fx = Fixture::new();
        snookered_on_the_last_red(&mut fx);
        let mut rules = SnookerRules::default();
        let (v, consequence) = fx.play(&mut rules, Shot::by(Player::One));
        assert_eq!(v.foul.as_ref().map(|f| f.miss), Some(true));
        assert_eq!(
            consequence,
            Some(FoulConsequence::AwaitDecision(PendingDecision::SnookerFoulDecision {
                penalty: 4,
                miss: true,
                free_ball_eligible: true,
                offender: Player::One,
            }))
        );
        assert!(rules.can_free_ball(&fx.balls, BLUE));
        assert!(!rules.can_free_ball(&fx.balls, 1));
    }

    #[test]
    fn open_table_is_not_a_snooker() {
        let fx = Fixture::new();
        let on = balls_on(&fx.balls, Target::Red, None);
        assert_eq!(on.len(), 15);
        assert!(!is_snookered(&fx.balls, &on));
    }

    #[test]
    fn free_ball_scores_as_the_ball_on() {
        let mut fx = Fixture::new();
        snookered_on_the_last_red(&mut fx);
        let mut rules = SnookerRules {
            free_ball: Some(BLUE),
            ..SnookerRules::default()
        };
        let (v, _) = fx.play(&mut rules, Shot::by(Player::Two).hit(BLUE).pot(BLUE));
        assert!(v.foul.is_none());
        assert_eq!(rules.scores, [0, 1]);
        assert!(fx.balls[BLUE as usize].on_table(), "free ball is respotted");
        assert_eq!(rules.target, Target::AnyColor);
    }

    /// Only red 1 left, in open view of the cue ball.
    fn open_last_red(fx: &mut Fixture) {
        for n in 2..=15 {
            fx.balls[n].pocket();
        }
        let blue = fx.table.spot(SnookerColor::Blue).unwrap();
        let y = fx.table.width / 2.0 + 0.5;
        fx.balls[0].place(Vec2::new(blue.x - 0.3, y));
        fx.balls[1].place(Vec2::new(blue.x + 0.3, y));
    }

    #[test]
    fn three_counted_misses_forfeit() {
        let mut fx = Fixture::new();
        open_last_red(&mut fx);
        let mut rules = SnookerRules::default();
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(PINK));
        assert!(v.outcome.is_none());
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(PINK));
        assert!(v.outcome.is_none());
        assert!(fx.events.contains(&RulesEvent::MissWarning { player: Player::One, misses: 2 }));
        let (v, _) = fx.play(&mut rules, Shot::by(Player::One).hit(PINK));
        assert_eq!(v.outcome.map(|o| (o.winner, o.reason)), Some((Player::Two, WinReason::MissForfeit)));
    }

    #[test]
    fn snookered_misses_neither_count_nor_reset() {
        let mut fx = Fixture::new();
        snookered_on_the_last_red(&mut fx);
        let mut rules = SnookerRules {
            misses: [1, 0],
            ..SnookerRules::default()
        };
        fx.play(&mut rules, Shot::by(Player::One).hit(BLUE));
        fx.play(&mut rules, Shot::by(Player::One));
        assert_eq!(rules.misses, [1, 0]);
    }

    #[test]
    fn non_miss_foul_resets_the_count() {
        let mut fx = Fixture::new();
        let mut rules = SnookerRules {
            misses: [2, 0],
            ..SnookerRules::default()
        };
        let mut shot = Shot::by(Player::One).hit(5);
        shot.scratch = true;
        fx.play(&mut rules, shot);
        assert_eq!(rules.misses, [0, 0]);
    }

    #[test]
    fn black_decides_the_frame() {
        let mut fx = Fixture::new();
        fx.clear_reds();
        for n in YELLOW..BLACK {
            fx.balls[n as usize].pocket();
        }
        let mut rules = SnookerRules {
            target: Target::Color(SnookerColor::Black),
            scores: [60, 50],
            ..SnookerRules::default()
        };
        let (v, _) = fx.play(&mut rules, Shot::by(Player::Two).hit(BLACK).pot(BLACK));
        let outcome = v.outcome.unwrap();
        assert_eq!(outcome.winner, Player::One);
        assert_eq!(outcome.reason, WinReason::Points { winner: 60, loser: 57 });
    }

    #[test]
    fn tie_on_the_black_respots_it() {
        let mut fx = Fixture::new();
        fx.clear_reds();
        for n in YELLOW..BLACK {
            fx.balls[n as usize].pocket();
        }
        let mut rules = SnookerRules {
            target: Target::Color(SnookerColor::Black),
            scores: [57, 50],
            ..SnookerRules::default()
        };
        let (v, _) = fx.play(&mut rules, Shot::by(Player::Two).hit(BLACK).pot(BLACK));
        assert!(v.outcome.is_none());
        let ovr = v.turn_override.unwrap();
        assert_eq!(ovr.ball_in_hand, Some(PlacementZone::D));
        assert!(fx.balls[BLACK as usize].on_table());
        assert_eq!(Some(fx.balls[BLACK as usize].pos), fx.table.spot(SnookerColor::Black));
        assert!(rules.respotted_black);
        assert_eq!(rules.target, Target::Color(SnookerColor::Black));
        assert!(fx.events.contains(&RulesEvent::BlackRespotted { starting: ovr.player }));
    }

    #[test]
    fn foul_on_the_last_black_ends_the_frame() {
        let mut fx = Fixture::new();
        fx.clear_reds();
        for n in YELLOW..BLACK {
            fx.balls[n as usize].pocket();
        }
        let mut rules = SnookerRules {
            target: Target::Color(SnookerColor::Black),
            scores: [40, 40],
            ..SnookerRules::default()
        };
        let (v, consequence) = fx.play(&mut rules, Shot::by(Player::One));
        assert!(consequence.is_none());
        assert_eq!(v.outcome.map(|o| o.winner), Some(Player::Two));
        assert_eq!(rules.scores, [40, 47]);
    }

    #[test]
    fn nomination_only_while_a_colour_is_on() {
        let mut rules = SnookerRules::default();
        assert!(rules.nominate(SnookerColor::Blue).is_err());
        rules.target = Target::AnyColor;
        assert!(rules.nominate(SnookerColor::Red).is_err());
        assert!(rules.nominate(SnookerColor::Blue).is_ok());
    }

    #[test]
    fn points_remaining_at_the_start() {
        let fx = Fixture::new();
        assert_eq!(SnookerRules::default().points_remaining(&fx.balls), 147);
    }

    proptest! {
        #[test]
        fn every_point_is_accounted_for(
            shots in prop::collection::vec((0u8..22, prop::collection::vec(1u8..22, 0..3), prop::bool::weighted(0.1)), 1..40)
        ) {
            let mut fx = Fixture::new();
            let mut rules = SnookerRules::default();
            let mut awarded = 0u32;
            let mut shooter = Player::One;
            for (hit, pots, scratch) in shots {
                let mut shot = Shot::by(shooter);
                if hit != 0 && fx.balls[hit as usize].on_table() {
                    shot.first_hit = Some(hit);
                }
                for p in pots {
                    if fx.balls[p as usize].on_table() && !shot.pots.contains(&p) {
                        shot.pots.push(p);
                    }
                }
                shot.scratch = scratch;
                fx.events.clear();
                let (v, _) = fx.play(&mut rules, shot);
                awarded += v.foul.as_ref().map_or(0, |f| f.penalty);
                awarded += fx.events.iter().map(|e| match e {
                    RulesEvent::Potted { points, .. } => *points,
                    _ => 0,
                }).sum::<u32>();
                prop_assert_eq!(rules.scores[0] + rules.scores[1], awarded);
                if v.outcome.is_some() {
                    break;
                }
                if !v.turn_continues {
                    shooter = shooter.opponent();
                }
                if !fx.balls[0].on_table() {
                    fx.balls[0].place(fx.table.default_cue_position(PlacementZone::D));
                }
            }
        }
    }
}
