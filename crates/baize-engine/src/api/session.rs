use glam::Vec2;

use crate::components::ball::CUE_BALL;
use crate::components::cue::Shot;
use crate::config::EngineConfig;
use crate::error::{RulesError, SnapshotError};
use crate::rules::{Game, GameInfo, GameMode, GameState, RulesEvent};
use crate::systems::integrator::{Integrator, PhysicsEvent};
use crate::systems::prediction::{predict, Prediction};

/// Single-threaded frame driver: physics sub-steps, event draining, rules
/// mutation and settle detection, in that order, once per render frame.
pub struct Session {
    game: Game,
    integrator: Integrator,
    /// Events of the most recent physics update.
    physics_events: Vec<PhysicsEvent>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let game = Game::new(&config);
        let integrator = Integrator::new(game.table(), &config);
        Self {
            game,
            integrator,
            physics_events: Vec::new(),
        }
    }

    /// Build from a (possibly partial) JSON configuration.
    pub fn from_config_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn info(&self) -> GameInfo {
        self.game.info()
    }

    pub fn start_game(&mut self, mode: GameMode) {
        self.game.start_game(mode);
    }

    /// Advance one render frame.
    pub fn tick(&mut self, frame_dt: f32) {
        if self.game.take_physics_reset() {
            self.integrator.set_table(self.game.table());
            self.integrator.reset();
        }
        // Shot, placement and respot state must reach the bodies before the
        // step, or the bodies would overwrite it.
        self.integrator.queue_syncs(self.game.take_sync_commands());

        self.physics_events = self.integrator.update(self.game.balls_mut(), frame_dt);
        self.game.handle_events(&self.physics_events);

        if self.game.state() == GameState::BallsMoving && !self.integrator.are_balls_moving(self.game.balls()) {
            if let Err(err) = self.game.on_balls_stopped() {
                log::warn!("Settle ignored: {}", err);
            }
        }
    }

    pub fn place_cue_ball(&mut self, pos: Vec2) -> Result<(), RulesError> {
        self.game.place_cue_ball(pos)
    }

    pub fn shoot(&mut self, shot: Shot) -> Result<(), RulesError> {
        self.game.shoot(shot)
    }

    /// Aim assistance for the cue ball.
    pub fn predict(&self, direction: Vec2, power: f32) -> Prediction {
        predict(self.game.table(), self.game.balls(), CUE_BALL, direction, power)
    }

    pub fn physics_events(&self) -> &[PhysicsEvent] {
        &self.physics_events
    }

    pub fn take_events(&mut self) -> Vec<RulesEvent> {
        self.game.take_events()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.integrator.set_speed(speed);
    }

    /// Nothing moving, nothing sinking.
    pub fn is_settled(&self) -> bool {
        !self.integrator.are_balls_moving(self.game.balls())
    }

    pub fn save(&self) -> Result<String, SnapshotError> {
        self.game.save_json()
    }

    pub fn load(&mut self, json: &str) -> Result<(), SnapshotError> {
        self.game.load_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::table::{PlacementZone, TableStyle};

    const FRAME: f32 = 1.0 / 60.0;

    fn run_until_settled(session: &mut Session) -> usize {
        for frame in 0..60 * 40 {
            session.tick(FRAME);
            if session.game().state() != GameState::BallsMoving {
                return frame;
            }
        }
        panic!("shot never settled");
    }

    fn break_ready(mode: GameMode) -> Session {
        let mut session = Session::new(EngineConfig::default());
        session.start_game(mode);
        let pos = session.game().table().default_cue_position(PlacementZone::Kitchen);
        session.place_cue_ball(pos).unwrap();
        session.tick(FRAME);
        session
    }

    #[test]
    fn break_shot_runs_to_a_verdict() {
        let mut session = break_ready(GameMode::EightBall);
        session.shoot(Shot::new(Vec2::X, 6.0)).unwrap();
        run_until_settled(&mut session);
        let game = session.game();
        assert_eq!(game.record.first_hit, Some(1));
        assert!(!game.is_break());
        assert!(matches!(
            game.state(),
            GameState::Playing | GameState::BallInHand | GameState::GameOver
        ));
        for ball in game.balls().iter().filter(|b| b.is_pocketed()) {
            assert_eq!(ball.vel, Vec2::ZERO);
            assert_eq!(ball.spin_z, 0.0);
            assert_eq!(ball.roll, Vec2::ZERO);
        }
    }

    #[test]
    fn shot_velocity_is_not_lost_to_stale_bodies() {
        let mut session = break_ready(GameMode::FreePlay);
        let start = session.game().ball(CUE_BALL).unwrap().pos;
        session.shoot(Shot::new(Vec2::Y, 1.0)).unwrap();
        for _ in 0..10 {
            session.tick(FRAME);
        }
        assert_eq!(session.game().state(), GameState::BallsMoving);
        assert!(session.game().ball(CUE_BALL).unwrap().pos.y > start.y);
    }

    #[test]
    fn quiet_table_drains_to_no_events() {
        let mut session = break_ready(GameMode::NineBall);
        session.tick(FRAME);
        session.tick(FRAME);
        assert!(session.physics_events().is_empty());
        assert!(session.is_settled());
    }

    #[test]
    fn mode_change_rebuilds_table() {
        let mut session = break_ready(GameMode::EightBall);
        session.start_game(GameMode::Snooker);
        session.tick(FRAME);
        assert_eq!(session.integrator().table().style, TableStyle::SnookerTwelveFoot);
        assert_eq!(session.integrator().body_count(), 22);
    }

    #[test]
    fn save_and_load_resume_the_frame() {
        let mut session = break_ready(GameMode::EightBall);
        session.shoot(Shot::new(Vec2::X, 6.0)).unwrap();
        run_until_settled(&mut session);
        let json = session.save().unwrap();

        let mut other = Session::new(EngineConfig::default());
        other.load(&json).unwrap();
        assert_eq!(other.info(), session.info());
        other.tick(FRAME);
        let on_table = other.game().balls().iter().filter(|b| b.on_table()).count();
        assert_eq!(other.integrator().body_count(), on_table);
    }

    #[test]
    fn partial_config_json() {
        let session = Session::from_config_json(r#"{ "best_of": 7 }"#).unwrap();
        assert_eq!(session.game().match_score().best_of, 7);
    }
}
