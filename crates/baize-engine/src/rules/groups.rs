//! Group assignment shared by American and UK 8-ball.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::components::ball::{Ball, Group, UkGroup};
use crate::rules::shot::ShotRecord;
use crate::rules::Player;

/// A seven-ball group that can be owned by one player.
pub trait BallGroup: Copy + Eq + Debug + Serialize + DeserializeOwned {
    fn of(ball: &Ball) -> Option<Self>;
    fn complement(self) -> Self;
    fn label(self) -> &'static str;
}

impl BallGroup for Group {
    fn of(ball: &Ball) -> Option<Self> {
        ball.group()
    }

    fn complement(self) -> Self {
        match self {
            Group::Solid => Group::Stripe,
            Group::Stripe => Group::Solid,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Group::Solid => "solids",
            Group::Stripe => "stripes",
        }
    }
}

impl BallGroup for UkGroup {
    fn of(ball: &Ball) -> Option<Self> {
        ball.uk_group()
    }

    fn complement(self) -> Self {
        match self {
            UkGroup::Reds => UkGroup::Yellows,
            UkGroup::Yellows => UkGroup::Reds,
        }
    }

    fn label(self) -> &'static str {
        match self {
            UkGroup::Reds => "reds",
            UkGroup::Yellows => "yellows",
        }
    }
}

pub(crate) fn group_of<G: BallGroup>(balls: &[Ball], number: u8) -> Option<G> {
    balls.iter().find(|b| b.number == number).and_then(G::of)
}

/// Both players' groups. Either both are set (to complementary groups) or
/// neither is; once set they never change for the rest of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "G: BallGroup")]
pub struct GroupAssignment<G> {
    groups: [Option<G>; 2],
}

impl<G> Default for GroupAssignment<G> {
    fn default() -> Self {
        Self { groups: [None, None] }
    }
}

impl<G: BallGroup> GroupAssignment<G> {
    pub fn get(&self, player: Player) -> Option<G> {
        self.groups[player.index()]
    }

    pub fn is_assigned(&self) -> bool {
        self.groups[0].is_some()
    }

    /// Give `group` to `player` and its complement to the opponent. Returns
    /// false (and changes nothing) if groups were already decided.
    pub fn assign(&mut self, player: Player, group: G) -> bool {
        if self.is_assigned() {
            return false;
        }
        self.groups[player.index()] = Some(group);
        self.groups[player.opponent().index()] = Some(group.complement());
        log::info!("{} takes {}", player, group.label());
        true
    }

    pub fn labels(&self) -> [Option<String>; 2] {
        self.groups.map(|g| g.map(|g| g.label().to_string()))
    }

    /// Balls of each player's group still on the table (0 while open).
    pub fn remaining(&self, balls: &[Ball]) -> [u32; 2] {
        self.groups.map(|g| match g {
            Some(g) => balls
                .iter()
                .filter(|b| b.on_table() && G::of(b) == Some(g))
                .count() as u32,
            None => 0,
        })
    }

    /// Whether `player`'s group had no balls on the table when the shot began.
    pub fn cleared_before(&self, player: Player, balls: &[Ball], record: &ShotRecord) -> bool {
        match self.get(player) {
            Some(g) => !record
                .on_table_before
                .iter()
                .any(|&n| group_of::<G>(balls, n) == Some(g)),
            None => false,
        }
    }
}

/// Group earned by the pots of a foul-free shot on an open table: the only
/// group potted, or the first-hit ball's group when both were potted.
pub fn group_from_pots<G: BallGroup>(balls: &[Ball], record: &ShotRecord) -> Option<G> {
    let mut potted = record.potted().filter_map(|n| group_of::<G>(balls, n));
    let first = potted.next()?;
    if potted.all(|g| g == first) {
        return Some(first);
    }
    record
        .first_hit
        .and_then(|n| group_of::<G>(balls, n))
        .or(Some(first))
}
