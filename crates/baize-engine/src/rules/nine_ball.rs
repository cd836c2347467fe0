//! 9-ball: lowest ball first, the 9 wins, three fouls lose, push-out after
//! the break.

use serde::{Deserialize, Serialize};

use crate::components::table::PlacementZone;
use crate::rules::decision::PendingDecision;
use crate::rules::evaluator::{RulesCtx, ShotEvaluator};
use crate::rules::shot::{Foul, FoulConsequence, FoulReason, ShotRecord, ShotVerdict, WinReason};

const NINE_BALL: u8 = 9;
const FOULS_TO_LOSE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NineBallRules {
    /// Lowest-numbered object ball on the table. Never decreases in a frame.
    pub lowest: u8,
    pub consecutive_fouls: [u8; 2],
    /// The next shot was declared a push-out.
    pub push_out_declared: bool,
    /// The shot in flight is a push-out.
    pub push_out_shot: bool,
}

impl Default for NineBallRules {
    fn default() -> Self {
        Self {
            lowest: 1,
            consecutive_fouls: [0; 2],
            push_out_declared: false,
            push_out_shot: false,
        }
    }
}

impl NineBallRules {
    fn refresh_lowest(&mut self, ctx: &RulesCtx<'_>) {
        if let Some(n) = ctx.object_balls().map(|b| b.number).min() {
            self.lowest = self.lowest.max(n);
        }
    }

    /// Declare (or decline) a push-out for the coming shot.
    pub fn declare_push_out(&mut self, push_out: bool) {
        self.push_out_declared = push_out;
    }

    fn respot_nine(ctx: &mut RulesCtx<'_>) {
        let spot = ctx.table.foot_spot();
        log::info!("9-ball respotted");
        ctx.respot_at(NINE_BALL, spot);
    }

    fn judge_push_out(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        if record.was_potted(NINE_BALL) {
            Self::respot_nine(ctx);
        }
        if record.cue_pocketed {
            return self.foul(ctx, Foul::new(FoulReason::CueBallPocketed));
        }
        self.consecutive_fouls[ctx.shooter.index()] = 0;
        let responder = ctx.shooter.opponent();
        ShotVerdict {
            decision: Some(PendingDecision::PushOutResponse { player: responder }),
            ..ShotVerdict::default()
        }
    }

    fn foul(&mut self, ctx: &RulesCtx<'_>, foul: Foul) -> ShotVerdict {
        let count = &mut self.consecutive_fouls[ctx.shooter.index()];
        *count += 1;
        log::debug!("{} foul #{}: {}", ctx.shooter, count, foul.reason);
        let mut verdict = if *count >= FOULS_TO_LOSE {
            ShotVerdict::game_over(ctx.shooter.opponent(), WinReason::ThreeConsecutiveFouls)
        } else {
            ShotVerdict::default()
        };
        verdict.foul = Some(foul);
        verdict
    }
}

impl ShotEvaluator for NineBallRules {
    fn on_shot_taken(&mut self, ctx: &mut RulesCtx<'_>, _record: &ShotRecord) {
        self.refresh_lowest(ctx);
        self.push_out_shot = std::mem::take(&mut self.push_out_declared);
    }

    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        let verdict = if std::mem::take(&mut self.push_out_shot) {
            self.judge_push_out(ctx, record)
        } else {
            self.judge(ctx, record)
        };
        self.refresh_lowest(ctx);
        verdict
    }

    fn foul_consequence(&mut self, _ctx: &mut RulesCtx<'_>, _foul: &Foul, _record: &ShotRecord) -> FoulConsequence {
        FoulConsequence::BallInHand {
            zone: PlacementZone::Anywhere,
        }
    }
}

impl NineBallRules {
    fn judge(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        let reason = if record.cue_pocketed {
            Some(FoulReason::CueBallPocketed)
        } else {
            match record.first_hit {
                None => Some(FoulReason::NoBallHit),
                Some(n) if n != self.lowest => Some(FoulReason::MustHitLowest { ball: self.lowest }),
                Some(_) if !record.potted_any() && !record.rail_after_hit => Some(FoulReason::NoCushionAfterContact),
                Some(_) => None,
            }
        };

        if let Some(reason) = reason {
            if record.was_potted(NINE_BALL) {
                Self::respot_nine(ctx);
            }
            return self.foul(ctx, Foul::new(reason));
        }

        self.consecutive_fouls[ctx.shooter.index()] = 0;
        if record.was_potted(NINE_BALL) {
            return ShotVerdict::game_over(ctx.shooter, WinReason::NineBallPotted);
        }

        let mut verdict = ShotVerdict::continues(record.potted_any());
        if record.is_break {
            let next = if verdict.turn_continues {
                ctx.shooter
            } else {
                ctx.shooter.opponent()
            };
            verdict.decision = Some(PendingDecision::PushOutOffer { player: next });
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ball::{nine_ball_set, Ball, ForceSync};
    use crate::components::table::{Table, TableStyle};
    use crate::core::rng::Rng;
    use crate::rules::events::RulesEvent;
    use crate::rules::Player;
    use proptest::prelude::*;

    struct Fixture {
        table: Table,
        balls: Vec<Ball>,
        events: Vec<RulesEvent>,
        syncs: Vec<ForceSync>,
        rng: Rng,
    }

    impl Fixture {
        fn new() -> Self {
            let table = Table::new(TableStyle::AmericanNineFoot);
            let mut balls = nine_ball_set(table.ball_radius);
            table.rack_nine_ball(&mut balls);
            balls[0].place(table.head_spot());
            Self {
                table,
                balls,
                events: Vec::new(),
                syncs: Vec::new(),
                rng: Rng::new(9),
            }
        }

        fn shoot(
            &mut self,
            rules: &mut NineBallRules,
            shooter: Player,
            is_break: bool,
            first_hit: Option<u8>,
            pots: &[u8],
        ) -> ShotVerdict {
            let before = self.balls.iter().filter(|b| b.number != 0 && b.on_table()).map(|b| b.number).collect();
            let mut record = ShotRecord::new(shooter, is_break, before);
            let mut ctx = RulesCtx {
                table: &self.table,
                balls: &mut self.balls,
                shooter,
                events: &mut self.events,
                syncs: &mut self.syncs,
                rng: &mut self.rng,
            };
            rules.on_shot_taken(&mut ctx, &record);
            record.first_hit = first_hit;
            record.rail_after_hit = true;
            for &p in pots {
                record.record_pocket(p);
                if let Some(b) = ctx.balls.iter_mut().find(|b| b.number == p) {
                    b.pocket();
                }
            }
            rules.evaluate(&mut ctx, &record)
        }
    }

    #[test]
    fn must_hit_lowest_ball_first() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        for n in [1, 2] {
            fx.balls[n].pocket();
        }
        let verdict = fx.shoot(&mut rules, Player::One, false, Some(5), &[]);
        let foul = verdict.foul.unwrap();
        assert_eq!(foul.reason, FoulReason::MustHitLowest { ball: 3 });
        assert_eq!(foul.reason.to_string(), "Must hit 3-ball first");
        assert!(!verdict.turn_continues);
        assert_eq!(rules.lowest, 3);
    }

    #[test]
    fn legal_nine_wins_even_on_a_combination() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        let verdict = fx.shoot(&mut rules, Player::Two, false, Some(1), &[9]);
        assert_eq!(verdict.outcome.map(|o| (o.winner, o.reason)), Some((Player::Two, WinReason::NineBallPotted)));
    }

    #[test]
    fn illegal_nine_is_respotted() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        let verdict = fx.shoot(&mut rules, Player::One, false, Some(4), &[9]);
        assert!(verdict.outcome.is_none());
        assert!(verdict.foul.is_some());
        assert!(fx.balls[9].on_table());
    }

    #[test]
    fn three_consecutive_fouls_lose() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        for _ in 0..2 {
            let v = fx.shoot(&mut rules, Player::One, false, None, &[]);
            assert!(v.outcome.is_none());
        }
        let v = fx.shoot(&mut rules, Player::One, false, None, &[]);
        assert_eq!(v.outcome.map(|o| (o.winner, o.reason)), Some((Player::Two, WinReason::ThreeConsecutiveFouls)));
    }

    #[test]
    fn legal_shot_resets_the_foul_count() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        fx.shoot(&mut rules, Player::One, false, None, &[]);
        fx.shoot(&mut rules, Player::One, false, None, &[]);
        fx.shoot(&mut rules, Player::One, false, Some(1), &[]);
        assert_eq!(rules.consecutive_fouls, [0, 0]);
    }

    #[test]
    fn clean_break_offers_push_out_to_next_shooter() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        let v = fx.shoot(&mut rules, Player::One, true, Some(1), &[]);
        assert_eq!(v.decision, Some(PendingDecision::PushOutOffer { player: Player::Two }));

        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        let v = fx.shoot(&mut rules, Player::One, true, Some(1), &[4]);
        assert!(v.turn_continues);
        assert_eq!(v.decision, Some(PendingDecision::PushOutOffer { player: Player::One }));
    }

    #[test]
    fn push_out_suspends_fouls_except_scratch() {
        let mut fx = Fixture::new();
        let mut rules = NineBallRules::default();
        rules.declare_push_out(true);
        let v = fx.shoot(&mut rules, Player::Two, false, Some(6), &[3, 9]);
        assert!(v.foul.is_none());
        assert_eq!(v.decision, Some(PendingDecision::PushOutResponse { player: Player::One }));
        assert!(fx.balls[9].on_table(), "9 comes back");
        assert!(fx.balls[3].is_pocketed(), "other pots stay down");

        rules.declare_push_out(true);
        let v = fx.shoot(&mut rules, Player::Two, false, None, &[0]);
        assert_eq!(v.foul.map(|f| f.reason), Some(FoulReason::CueBallPocketed));
    }

    proptest! {
        #[test]
        fn lowest_never_decreases(pots in prop::collection::vec(1u8..=9, 0..20), hits in prop::collection::vec(0u8..=9, 20)) {
            let mut fx = Fixture::new();
            let mut rules = NineBallRules::default();
            let mut previous = rules.lowest;
            for (i, pot) in pots.into_iter().enumerate() {
                let shooter = if i % 2 == 0 { Player::One } else { Player::Two };
                let hit = if hits[i] == 0 { None } else { Some(hits[i]) };
                let on_table = fx.balls[pot as usize].on_table();
                let list: Vec<u8> = if on_table { vec![pot] } else { vec![] };
                let verdict = fx.shoot(&mut rules, shooter, false, hit, &list);
                prop_assert!(rules.lowest >= previous);
                previous = rules.lowest;
                if verdict.outcome.is_some() {
                    break;
                }
            }
        }
    }
}
