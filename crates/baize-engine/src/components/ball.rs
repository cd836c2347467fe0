//! Ball entity: identity, kinematics, and the on-table / sinking / pocketed lifecycle.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ball number of the cue ball in every ball set.
pub const CUE_BALL: u8 = 0;

/// American 8-ball groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// Balls 1-7.
    Solid,
    /// Balls 9-15.
    Stripe,
}

/// UK 8-ball groups: two fixed sets of seven plain balls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UkGroup {
    Reds,
    Yellows,
}

/// Snooker ball colours, in clearance order after the reds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnookerColor {
    Red,
    Yellow,
    Green,
    Brown,
    Blue,
    Pink,
    Black,
}

impl SnookerColor {
    /// The six colours in clearance order.
    pub const COLORS: [SnookerColor; 6] = [
        SnookerColor::Yellow,
        SnookerColor::Green,
        SnookerColor::Brown,
        SnookerColor::Blue,
        SnookerColor::Pink,
        SnookerColor::Black,
    ];

    pub fn value(self) -> u32 {
        match self {
            SnookerColor::Red => 1,
            SnookerColor::Yellow => 2,
            SnookerColor::Green => 3,
            SnookerColor::Brown => 4,
            SnookerColor::Blue => 5,
            SnookerColor::Pink => 6,
            SnookerColor::Black => 7,
        }
    }

    /// Next colour in the clearance sequence; `None` after the black.
    pub fn next(self) -> Option<SnookerColor> {
        match self {
            SnookerColor::Red => Some(SnookerColor::Yellow),
            SnookerColor::Yellow => Some(SnookerColor::Green),
            SnookerColor::Green => Some(SnookerColor::Brown),
            SnookerColor::Brown => Some(SnookerColor::Blue),
            SnookerColor::Blue => Some(SnookerColor::Pink),
            SnookerColor::Pink => Some(SnookerColor::Black),
            SnookerColor::Black => None,
        }
    }

    pub fn is_red(self) -> bool {
        self == SnookerColor::Red
    }

    pub fn name(self) -> &'static str {
        match self {
            SnookerColor::Red => "red",
            SnookerColor::Yellow => "yellow",
            SnookerColor::Green => "green",
            SnookerColor::Brown => "brown",
            SnookerColor::Blue => "blue",
            SnookerColor::Pink => "pink",
            SnookerColor::Black => "black",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "red" => Some(SnookerColor::Red),
            "yellow" => Some(SnookerColor::Yellow),
            "green" => Some(SnookerColor::Green),
            "brown" => Some(SnookerColor::Brown),
            "blue" => Some(SnookerColor::Blue),
            "pink" => Some(SnookerColor::Pink),
            "black" => Some(SnookerColor::Black),
            _ => None,
        }
    }
}

impl fmt::Display for SnookerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a ball is, fixed when the ball set is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BallClassification {
    Cue,
    /// The 8-ball in American pool, the black in UK 8-ball.
    EightBall,
    Standard { group: Group },
    Uk { group: UkGroup },
    Snooker { color: SnookerColor },
}

/// Transient state between pocket capture and removal from play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sinking {
    /// Index into the table's pocket list.
    pub pocket: usize,
    /// Animation progress, 0 at capture and 1 when fully pocketed.
    pub progress: f32,
    /// Speed at capture.
    pub speed: f32,
    /// Ball centre at capture.
    pub from: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BallLifecycle {
    OnTable,
    Sinking(Sinking),
    Pocketed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub number: u8,
    pub classification: BallClassification,
    pub radius: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation about the vertical axis (english), rad/s.
    pub spin_z: f32,
    /// Rotation about the horizontal x/y axes, rad/s.
    pub roll: Vec2,
    pub lifecycle: BallLifecycle,
}

impl Ball {
    pub fn new(number: u8, classification: BallClassification, radius: f32) -> Self {
        Self {
            number,
            classification,
            radius,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            spin_z: 0.0,
            roll: Vec2::ZERO,
            lifecycle: BallLifecycle::OnTable,
        }
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn is_cue_ball(&self) -> bool {
        self.classification == BallClassification::Cue
    }

    pub fn is_eight_ball(&self) -> bool {
        self.classification == BallClassification::EightBall
    }

    pub fn group(&self) -> Option<Group> {
        match self.classification {
            BallClassification::Standard { group } => Some(group),
            _ => None,
        }
    }

    pub fn uk_group(&self) -> Option<UkGroup> {
        match self.classification {
            BallClassification::Uk { group } => Some(group),
            _ => None,
        }
    }

    pub fn snooker_color(&self) -> Option<SnookerColor> {
        match self.classification {
            BallClassification::Snooker { color } => Some(color),
            _ => None,
        }
    }

    pub fn is_red(&self) -> bool {
        self.snooker_color().is_some_and(SnookerColor::is_red)
    }

    /// Snooker colour other than red.
    pub fn is_color(&self) -> bool {
        self.snooker_color().is_some_and(|c| !c.is_red())
    }

    pub fn on_table(&self) -> bool {
        matches!(self.lifecycle, BallLifecycle::OnTable)
    }

    pub fn is_sinking(&self) -> bool {
        matches!(self.lifecycle, BallLifecycle::Sinking(_))
    }

    pub fn is_pocketed(&self) -> bool {
        matches!(self.lifecycle, BallLifecycle::Pocketed)
    }

    /// Velocity of the cloth contact point: linear velocity plus the
    /// rotational contribution of the roll spin at the bottom of the ball.
    pub fn slip_velocity(&self) -> Vec2 {
        self.vel + self.radius * self.roll.perp()
    }

    /// Roll spin for pure rolling at the current velocity.
    pub fn natural_roll(&self) -> Vec2 {
        self.vel.perp() / self.radius
    }

    pub fn is_sliding(&self, slip_threshold: f32) -> bool {
        self.slip_velocity().length() > slip_threshold
    }

    pub fn stop(&mut self) {
        self.vel = Vec2::ZERO;
        self.spin_z = 0.0;
        self.roll = Vec2::ZERO;
    }

    /// Enter the sinking animation toward `pocket`.
    pub fn start_sinking(&mut self, pocket: usize, speed: f32) {
        let from = self.pos;
        self.stop();
        self.lifecycle = BallLifecycle::Sinking(Sinking {
            pocket,
            progress: 0.0,
            speed,
            from,
        });
    }

    /// Remove from play. Kinematics are zeroed in the same step.
    pub fn pocket(&mut self) {
        self.stop();
        self.lifecycle = BallLifecycle::Pocketed;
    }

    /// Return to the table at `pos`, at rest.
    pub fn place(&mut self, pos: Vec2) {
        self.stop();
        self.pos = pos;
        self.lifecycle = BallLifecycle::OnTable;
    }
}

/// Command overwriting a ball's rigid body with authoritative state on the
/// next physics sub-step (shots, placements, respots, restores).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSync {
    pub ball: u8,
    pub position: Vec2,
    pub velocity: Vec2,
    pub spin_z: f32,
    pub roll: Vec2,
}

impl ForceSync {
    pub fn from_ball(ball: &Ball) -> Self {
        Self {
            ball: ball.number,
            position: ball.pos,
            velocity: ball.vel,
            spin_z: ball.spin_z,
            roll: ball.roll,
        }
    }

    /// Write the commanded state into `ball`.
    pub fn apply_to(&self, ball: &mut Ball) {
        ball.pos = self.position;
        ball.vel = self.velocity;
        ball.spin_z = self.spin_z;
        ball.roll = self.roll;
    }
}

/// Cue ball plus 1-15: 1-7 solids, 8, 9-15 stripes.
pub fn american_set(radius: f32) -> Vec<Ball> {
    (0..=15u8)
        .map(|n| {
            let class = match n {
                0 => BallClassification::Cue,
                8 => BallClassification::EightBall,
                1..=7 => BallClassification::Standard { group: Group::Solid },
                _ => BallClassification::Standard { group: Group::Stripe },
            };
            Ball::new(n, class, radius)
        })
        .collect()
}

/// Cue ball plus 1-9.
pub fn nine_ball_set(radius: f32) -> Vec<Ball> {
    american_set(radius).into_iter().take(10).collect()
}

/// Cue ball, reds 1-7, black 8, yellows 9-15.
pub fn uk_set(radius: f32) -> Vec<Ball> {
    (0..=15u8)
        .map(|n| {
            let class = match n {
                0 => BallClassification::Cue,
                8 => BallClassification::EightBall,
                1..=7 => BallClassification::Uk { group: UkGroup::Reds },
                _ => BallClassification::Uk { group: UkGroup::Yellows },
            };
            Ball::new(n, class, radius)
        })
        .collect()
}

/// Number of reds in a snooker set.
pub const SNOOKER_REDS: u8 = 15;

/// Cue ball, reds 1-15, then yellow through black as 16-21.
pub fn snooker_set(radius: f32) -> Vec<Ball> {
    let mut balls = vec![Ball::new(CUE_BALL, BallClassification::Cue, radius)];
    for n in 1..=SNOOKER_REDS {
        balls.push(Ball::new(
            n,
            BallClassification::Snooker { color: SnookerColor::Red },
            radius,
        ));
    }
    for (i, color) in SnookerColor::COLORS.iter().enumerate() {
        balls.push(Ball::new(
            SNOOKER_REDS + 1 + i as u8,
            BallClassification::Snooker { color: *color },
            radius,
        ));
    }
    balls
}
