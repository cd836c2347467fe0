//! American 8-ball, plus the group-game judgement UK 8-ball reuses.

use serde::{Deserialize, Serialize};

use crate::components::ball::Group;
use crate::rules::evaluator::{RulesCtx, ShotEvaluator};
use crate::rules::groups::{group_from_pots, group_of, BallGroup, GroupAssignment};
use crate::rules::shot::{Foul, FoulReason, ShotRecord, ShotVerdict, WinReason};

const EIGHT_BALL: u8 = 8;
/// Object balls that must be pocketed or cross the centre line on a break.
const MIN_BREAK_BALLS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EightBallRules {
    pub groups: GroupAssignment<Group>,
}

impl ShotEvaluator for EightBallRules {
    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        judge_group_shot(ctx, record, &mut self.groups, false)
    }
}

/// First foul of a group-game shot, checked in order.
fn detect_foul<G: BallGroup>(
    ctx: &RulesCtx<'_>,
    record: &ShotRecord,
    groups: &GroupAssignment<G>,
    cleared_before: bool,
    waive_group_first: bool,
) -> Option<Foul> {
    if record.cue_pocketed {
        return Some(Foul::new(FoulReason::CueBallPocketed));
    }
    let Some(first) = record.first_hit else {
        return Some(Foul::new(FoulReason::NoBallHit));
    };
    if let Some(own) = groups.get(ctx.shooter) {
        if !waive_group_first {
            if cleared_before {
                if first != EIGHT_BALL {
                    return Some(Foul::new(FoulReason::MustHitEight));
                }
            } else if group_of::<G>(ctx.balls(), first) != Some(own) {
                return Some(Foul::new(FoulReason::MustHitOwnGroup));
            }
        }
    }
    if !record.is_break && !record.potted_any() && !record.rail_after_hit {
        return Some(Foul::new(FoulReason::NoCushionAfterContact));
    }
    if record.is_break && record.break_count() < MIN_BREAK_BALLS {
        return Some(Foul::new(FoulReason::WeakBreak));
    }
    None
}

/// Shared judgement of American and UK 8-ball. `waive_group_first` lifts the
/// own-group-first rule for a UK free shot.
pub(crate) fn judge_group_shot<G: BallGroup>(
    ctx: &mut RulesCtx<'_>,
    record: &ShotRecord,
    groups: &mut GroupAssignment<G>,
    waive_group_first: bool,
) -> ShotVerdict {
    let shooter = ctx.shooter;
    let cleared_before = groups.cleared_before(shooter, ctx.balls(), record);
    let foul = detect_foul(ctx, record, groups, cleared_before, waive_group_first);

    if record.was_potted(EIGHT_BALL) {
        if record.is_break {
            let spot = ctx.table.foot_spot();
            log::info!("8-ball potted on the break, respotting");
            ctx.respot_at(EIGHT_BALL, spot);
        } else if foul.is_none() && cleared_before {
            return ShotVerdict::game_over(shooter, WinReason::EightBallPotted);
        } else {
            let mut verdict = ShotVerdict::game_over(shooter.opponent(), WinReason::EightBallFoul);
            verdict.foul = foul;
            return verdict;
        }
    }

    if let Some(foul) = foul {
        return ShotVerdict::foul(foul);
    }

    if !groups.is_assigned() {
        if let Some(group) = group_from_pots::<G>(ctx.balls(), record) {
            groups.assign(shooter, group);
        }
    }

    let own = groups.get(shooter);
    let own_potted = own.is_some_and(|g| record.potted().any(|n| group_of::<G>(ctx.balls(), n) == Some(g)));
    ShotVerdict::continues(own_potted || (record.is_break && record.potted_any()))
}
