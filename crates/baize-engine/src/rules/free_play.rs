use serde::{Deserialize, Serialize};

use crate::components::table::PlacementZone;
use crate::rules::evaluator::{RulesCtx, ShotEvaluator};
use crate::rules::shot::{ShotRecord, ShotVerdict, TurnOverride, WinReason};

/// Practice mode: no fouls, the shooter keeps the table until it is cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreePlayRules {
    pub shots_taken: u32,
    pub balls_potted: u32,
}

impl ShotEvaluator for FreePlayRules {
    fn evaluate(&mut self, ctx: &mut RulesCtx<'_>, record: &ShotRecord) -> ShotVerdict {
        self.shots_taken += 1;
        self.balls_potted += record.potted().count() as u32;

        if ctx.object_balls().next().is_none() {
            log::info!("Table cleared in {} shots", self.shots_taken);
            return ShotVerdict::game_over(ctx.shooter, WinReason::TableCleared);
        }

        let mut verdict = ShotVerdict::continues(true);
        if record.cue_pocketed {
            verdict.turn_override = Some(TurnOverride {
                player: ctx.shooter,
                ball_in_hand: Some(PlacementZone::Anywhere),
            });
        }
        verdict
    }
}
