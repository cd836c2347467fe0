//! UK 8-ball (reds/yellows): 8-ball fouls with the two-shot penalty.

use serde::{Deserialize, Serialize};

use crate::components::ball::UkGroup;
use crate::components::table::PlacementZone;
use crate::rules::eight_ball::judge_group_shot;
use crate::rules::evaluator::{RulesCtx, ShotEvaluator};
use crate::rules::groups::GroupAssignment;
use crate::rules::shot::{Foul, FoulConsequence, ShotRecord, ShotVerdict};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UkEightBallRules {
    pub groups: GroupAssignment<UkGroup>,
    /// Visits owed to the player at the table: 2 after an opponent's foul.
    pub shots_remaining: u8,
    /// The current shot is the first of two and cannot lose the turn.
    pub free_shot: bool,
}

impl Default for UkEightBallRules {
    fn default() -> Self {
        Self {
            groups: GroupAssignment::default(),
            shots_remaining: 1,
            free_shot: false,
        }
    }
}

impl UkEightBallRules {
    fn reset_visit(&mut self) {
        self.shots_remaining = 1;
        self.free_shot = false;
    }
}

impl ShotEvaluator for UkEightBallRules {
    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        let free = self.free_shot;
        let mut verdict = judge_group_shot(ctx, record, &mut self.groups, free);
        if verdict.outcome.is_some() || verdict.foul.is_some() {
            return verdict;
        }
        if free {
            // Pot or miss, the free shot is spent and one normal visit remains.
            log::debug!("{} used the free shot", ctx.shooter);
            verdict.turn_continues = true;
        }
        self.reset_visit();
        verdict
    }

    fn foul_consequence(&mut self, _ctx: &mut RulesCtx<'_>, _foul: &Foul, record: &ShotRecord) -> FoulConsequence {
        self.shots_remaining = 2;
        self.free_shot = true;
        if record.cue_pocketed {
            FoulConsequence::BallInHand {
                zone: PlacementZone::Baulk,
            }
        } else {
            FoulConsequence::PlayFromPosition
        }
    }
}
