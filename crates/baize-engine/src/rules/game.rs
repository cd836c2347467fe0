//! The shared shot lifecycle: state machine, turn transitions, ball in hand,
//! pending decisions and match bookkeeping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::{Ball, ForceSync, SnookerColor, CUE_BALL};
use crate::components::cue::Shot;
use crate::components::table::{PlacementZone, Table};
use crate::config::EngineConfig;
use crate::core::rng::Rng;
use crate::error::RulesError;
use crate::rules::decision::{FoulDecision, PendingDecision, PushOutChoice, PushOutResponse};
use crate::rules::evaluator::{Rules, RulesCtx, ShotEvaluator};
use crate::rules::events::RulesEvent;
use crate::rules::shot::{Foul, FoulConsequence, GameOutcome, ShotRecord, ShotVerdict, WinReason};
use crate::rules::snapshot::GameSnapshot;
use crate::rules::{GameMode, GameState, Player};
use crate::systems::integrator::PhysicsEvent;

/// Frames won per player over a best-of-N match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub frames: [u32; 2],
    pub best_of: u32,
}

impl MatchScore {
    pub fn new(best_of: u32) -> Self {
        Self {
            frames: [0; 2],
            best_of: best_of.max(1),
        }
    }

    pub fn frames_to_win(&self) -> u32 {
        self.best_of.max(1) / 2 + 1
    }

    pub fn winner(&self) -> Option<Player> {
        let need = self.frames_to_win();
        [Player::One, Player::Two]
            .into_iter()
            .find(|p| self.frames[p.index()] >= need)
    }

    pub fn is_decided(&self) -> bool {
        self.winner().is_some()
    }

    fn record(&mut self, winner: Player) {
        self.frames[winner.index()] += 1;
    }
}

pub struct Game {
    pub(crate) config: EngineConfig,
    pub(crate) mode: GameMode,
    pub(crate) table: Table,
    pub(crate) balls: Vec<Ball>,
    pub(crate) state: GameState,
    pub(crate) current: Player,
    pub(crate) breaker: Player,
    pub(crate) rules: Rules,
    pub(crate) record: ShotRecord,
    pub(crate) is_break: bool,
    pub(crate) last_foul: Option<Foul>,
    pub(crate) turn_continues: bool,
    pub(crate) pending: PendingDecision,
    pub(crate) ball_in_hand: Option<PlacementZone>,
    pub(crate) match_score: MatchScore,
    pub(crate) outcome: Option<GameOutcome>,
    /// Position before the shot in flight, for the snooker restore remedy.
    pub(crate) pre_shot: Option<Box<GameSnapshot>>,
    pub(crate) events: Vec<RulesEvent>,
    pub(crate) syncs: Vec<ForceSync>,
    pub(crate) rng: Rng,
    /// Ball bodies must be rebuilt from scratch (new frame, restore).
    pub(crate) physics_reset: bool,
}

impl Game {
    pub fn new(config: &EngineConfig) -> Self {
        let mode = GameMode::default();
        let table = Table::new(config.table_style.unwrap_or(mode.default_style()));
        let mut balls = mode.ball_set(table.ball_radius);
        mode.rack(&table, &mut balls);
        Self {
            config: config.clone(),
            mode,
            table,
            balls,
            state: GameState::Menu,
            current: Player::One,
            breaker: Player::One,
            rules: Rules::new(mode),
            record: ShotRecord::default(),
            is_break: true,
            last_foul: None,
            turn_continues: false,
            pending: PendingDecision::None,
            ball_in_hand: None,
            match_score: MatchScore::new(config.best_of),
            outcome: None,
            pre_shot: None,
            events: Vec::new(),
            syncs: Vec::new(),
            rng: Rng::new(config.seed),
            physics_reset: true,
        }
    }

    // ---- accessors ----

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    pub fn ball(&self, number: u8) -> Option<&Ball> {
        self.balls.iter().find(|b| b.number == number)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn pending(&self) -> PendingDecision {
        self.pending
    }

    pub fn last_foul(&self) -> Option<&Foul> {
        self.last_foul.as_ref()
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn match_score(&self) -> &MatchScore {
        &self.match_score
    }

    pub fn ball_in_hand(&self) -> Option<PlacementZone> {
        self.ball_in_hand
    }

    pub fn is_break(&self) -> bool {
        self.is_break
    }

    pub fn turn_continues(&self) -> bool {
        self.turn_continues
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drain queued notifications.
    pub fn take_events(&mut self) -> Vec<RulesEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain physics re-sync commands (shot, placement, respots, restore).
    pub fn take_sync_commands(&mut self) -> Vec<ForceSync> {
        std::mem::take(&mut self.syncs)
    }

    /// Whether physics must drop every ball body before the next step.
    pub fn take_physics_reset(&mut self) -> bool {
        std::mem::replace(&mut self.physics_reset, false)
    }

    // ---- lifecycle ----

    /// Start a new match in `mode`.
    pub fn start_game(&mut self, mode: GameMode) {
        let style = self.config.table_style.unwrap_or(mode.default_style());
        if style != self.table.style {
            self.table = Table::new(style);
        }
        self.mode = mode;
        self.match_score = MatchScore::new(self.config.best_of);
        self.breaker = Player::One;
        log::info!("Starting {:?} on {:?}, best of {}", mode, style, self.match_score.best_of);
        self.start_frame();
    }

    /// Rack and hand the cue ball to the breaker.
    fn start_frame(&mut self) {
        self.rules = Rules::new(self.mode);
        self.balls = self.mode.ball_set(self.table.ball_radius);
        self.mode.rack(&self.table, &mut self.balls);
        let zone = self.mode.break_zone();
        let start = self.table.default_cue_position(zone);
        if let Some(cue) = self.balls.iter_mut().find(|b| b.number == CUE_BALL) {
            cue.place(start);
        }
        self.current = self.breaker;
        self.record = ShotRecord::default();
        self.is_break = true;
        self.last_foul = None;
        self.turn_continues = false;
        self.pending = PendingDecision::None;
        self.outcome = None;
        self.pre_shot = None;
        self.syncs.clear();
        self.physics_reset = true;
        log::info!(
            "Frame {} begins, {} to break",
            self.match_score.frames[0] + self.match_score.frames[1] + 1,
            self.breaker
        );
        self.enter_ball_in_hand(zone);
    }

    /// Rack the next frame of the match. The break alternates.
    pub fn start_next_frame(&mut self) -> Result<(), RulesError> {
        if self.state != GameState::GameOver {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        if self.match_score.is_decided() {
            return Err(self.reject(RulesError::MatchDecided));
        }
        self.breaker = self.breaker.opponent();
        self.start_frame();
        Ok(())
    }

    /// End the frame in the opponent's favour.
    pub fn concede(&mut self, player: Player) -> Result<(), RulesError> {
        if matches!(self.state, GameState::Menu | GameState::GameOver) {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        log::info!("{} concedes", player);
        self.finish_frame(GameOutcome {
            winner: player.opponent(),
            reason: WinReason::Conceded,
        });
        Ok(())
    }

    /// Put the cue ball down while in hand.
    pub fn place_cue_ball(&mut self, pos: Vec2) -> Result<(), RulesError> {
        if self.state != GameState::BallInHand {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        let zone = self.ball_in_hand.unwrap_or(PlacementZone::Anywhere);
        if !self.table.contains_ball(pos) {
            return Err(self.reject(RulesError::IllegalPlacement("outside the cushions")));
        }
        if !self.table.in_zone(zone, pos) {
            return Err(self.reject(RulesError::IllegalPlacement("outside the placement zone")));
        }
        if !self.table.is_free(pos, &self.balls, Some(CUE_BALL)) {
            return Err(self.reject(RulesError::IllegalPlacement("touching another ball")));
        }
        let cue = self
            .balls
            .iter_mut()
            .find(|b| b.number == CUE_BALL)
            .ok_or(RulesError::UnknownBall(CUE_BALL))?;
        cue.place(pos);
        self.syncs.push(ForceSync::from_ball(cue));
        self.ball_in_hand = None;
        self.set_state(GameState::Playing);
        Ok(())
    }

    /// Strike the cue ball.
    pub fn shoot(&mut self, shot: Shot) -> Result<(), RulesError> {
        if self.state != GameState::Playing {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        if !shot.is_valid() {
            return Err(self.reject(RulesError::InvalidShot));
        }
        if !self.ball(CUE_BALL).is_some_and(Ball::on_table) {
            return Err(self.reject(RulesError::UnknownBall(CUE_BALL)));
        }

        self.pre_shot = if self.mode == GameMode::Snooker {
            Some(Box::new(self.snapshot()))
        } else {
            None
        };
        let before = self
            .balls
            .iter()
            .filter(|b| b.number != CUE_BALL && b.on_table())
            .map(|b| b.number)
            .collect();
        self.record = ShotRecord::new(self.current, self.is_break, before);
        self.last_foul = None;
        self.with_rules(|rules, ctx, record| rules.on_shot_taken(ctx, record));

        let tuning = &self.config.tuning;
        if let Some(cue) = self.balls.iter_mut().find(|b| b.number == CUE_BALL) {
            let sync = shot.strike(cue, tuning);
            sync.apply_to(cue);
            self.syncs.push(sync);
        }
        log::debug!("{} shoots at {:.2} m/s", self.current, shot.power);
        self.set_state(GameState::BallsMoving);
        Ok(())
    }

    /// Feed one physics update's events into the current shot record.
    pub fn handle_events(&mut self, events: &[PhysicsEvent]) {
        if self.state != GameState::BallsMoving {
            return;
        }
        for event in events {
            match *event {
                PhysicsEvent::Ball { a, b, .. } => self.record.record_hit(a, b),
                PhysicsEvent::Rail { .. } => self.record.record_rail(),
                PhysicsEvent::Pocket { ball, pocket, .. } => {
                    self.record.record_pocket(ball);
                    self.events.push(RulesEvent::BallPocketed { ball, pocket });
                }
            }
        }
        if self.record.is_break {
            let centre = self.table.center_line_x();
            for ball in self.balls.iter().filter(|b| b.number != CUE_BALL && b.on_table()) {
                if ball.pos.x < centre {
                    self.record.record_crossing(ball.number);
                }
            }
        }
    }

    /// Judge the shot once physics reports every ball at rest.
    pub fn on_balls_stopped(&mut self) -> Result<(), RulesError> {
        if self.state != GameState::BallsMoving {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        for ball in self.balls.iter_mut().filter(|b| b.on_table()) {
            ball.stop();
        }
        let verdict = self.with_rules(|rules, ctx, record| rules.evaluate(ctx, record));
        self.apply_verdict(verdict);
        Ok(())
    }

    fn apply_verdict(&mut self, verdict: ShotVerdict) {
        let shooter = self.current;
        self.is_break = false;
        self.turn_continues = verdict.turn_continues && verdict.foul.is_none();
        self.last_foul = verdict.foul.clone();
        if let Some(foul) = &verdict.foul {
            log::debug!("Foul by {}: {}", shooter, foul.reason);
            self.events.push(RulesEvent::Foul {
                player: shooter,
                reason: foul.reason.clone(),
                miss: foul.miss,
                penalty: foul.penalty,
            });
        }

        if let Some(outcome) = verdict.outcome {
            self.finish_frame(outcome);
            return;
        }

        if let Some(ovr) = verdict.turn_override {
            self.current = ovr.player;
            match ovr.ball_in_hand {
                Some(zone) => self.enter_ball_in_hand(zone),
                None => self.set_state(GameState::Playing),
            }
            return;
        }

        if let Some(foul) = verdict.foul {
            let consequence = self.with_rules(|rules, ctx, record| rules.foul_consequence(ctx, &foul, record));
            match consequence {
                FoulConsequence::BallInHand { zone } => {
                    self.current = shooter.opponent();
                    self.enter_ball_in_hand(zone);
                }
                FoulConsequence::PlayFromPosition => {
                    self.current = shooter.opponent();
                    self.set_state(GameState::Playing);
                }
                FoulConsequence::AwaitDecision(decision) => self.await_decision(decision),
            }
            return;
        }

        if !self.turn_continues {
            self.current = shooter.opponent();
        }
        match verdict.decision {
            Some(decision) if !decision.is_none() => self.await_decision(decision),
            _ => self.set_state(GameState::Playing),
        }
    }

    fn finish_frame(&mut self, outcome: GameOutcome) {
        self.match_score.record(outcome.winner);
        let match_over = self.match_score.is_decided();
        log::info!(
            "{} wins the frame ({}), frames {}-{}",
            outcome.winner,
            outcome.reason,
            self.match_score.frames[0],
            self.match_score.frames[1]
        );
        self.events.push(RulesEvent::GameOver {
            outcome: outcome.clone(),
            frames: self.match_score.frames,
            match_over,
        });
        self.outcome = Some(outcome);
        self.pending = PendingDecision::None;
        self.ball_in_hand = None;
        self.set_state(GameState::GameOver);
    }

    fn enter_ball_in_hand(&mut self, zone: PlacementZone) {
        self.ball_in_hand = Some(zone);
        self.set_state(GameState::BallInHand);
    }

    fn await_decision(&mut self, decision: PendingDecision) {
        if let Some(player) = decision.decider() {
            self.current = player;
        }
        self.pending = decision;
        match decision {
            PendingDecision::PushOutOffer { player } => {
                self.events.push(RulesEvent::PushOutOffered { player });
            }
            PendingDecision::PushOutResponse { player } => {
                self.events.push(RulesEvent::PushOutResponseRequired { player });
            }
            PendingDecision::SnookerFoulDecision {
                penalty,
                miss,
                free_ball_eligible,
                offender,
            } => {
                self.events.push(RulesEvent::FoulDecisionRequired {
                    player: offender.opponent(),
                    penalty,
                    miss,
                    free_ball_eligible,
                });
            }
            PendingDecision::FreeBallNomination { .. } | PendingDecision::None => {}
        }
        self.set_state(GameState::AwaitingDecision);
    }

    /// Continue after a foul remedy: in hand if the cue ball went down.
    fn resume_after_foul(&mut self) {
        self.pending = PendingDecision::None;
        if self.ball(CUE_BALL).is_some_and(Ball::on_table) {
            self.set_state(GameState::Playing);
        } else {
            self.enter_ball_in_hand(PlacementZone::D);
        }
    }

    pub(crate) fn set_state(&mut self, to: GameState) {
        let from = self.state;
        if from == to {
            return;
        }
        log::debug!("State {:?} -> {:?}", from, to);
        self.state = to;
        self.events.push(RulesEvent::StateChanged { from, to });
    }

    fn with_rules<R>(&mut self, f: impl FnOnce(&mut Rules, &mut RulesCtx<'_>, &ShotRecord) -> R) -> R {
        let mut ctx = RulesCtx {
            table: &self.table,
            balls: &mut self.balls,
            shooter: self.current,
            events: &mut self.events,
            syncs: &mut self.syncs,
            rng: &mut self.rng,
        };
        f(&mut self.rules, &mut ctx, &self.record)
    }

    fn reject(&self, err: RulesError) -> RulesError {
        log::warn!("Rejected in {:?}: {}", self.state, err);
        err
    }

    fn require_decision(&self) -> Result<PendingDecision, RulesError> {
        if self.state != GameState::AwaitingDecision {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        if self.pending.is_none() {
            return Err(self.reject(RulesError::NoDecisionPending));
        }
        Ok(self.pending)
    }

    // ---- decisions ----

    /// 9-ball: take (or decline) the push-out after the break.
    pub fn apply_push_out_choice(&mut self, choice: PushOutChoice) -> Result<(), RulesError> {
        if self.mode != GameMode::NineBall {
            return Err(self.reject(RulesError::NotApplicable));
        }
        let PendingDecision::PushOutOffer { player } = self.require_decision()? else {
            return Err(self.reject(RulesError::DecisionUnavailable("no push-out offer pending")));
        };
        if let Rules::NineBall(rules) = &mut self.rules {
            rules.declare_push_out(choice == PushOutChoice::PushOut);
        }
        log::debug!("{} chooses {:?}", player, choice);
        self.pending = PendingDecision::None;
        self.current = player;
        self.set_state(GameState::Playing);
        Ok(())
    }

    /// 9-ball: play from the pushed-out position or pass it back.
    pub fn apply_push_out_response(&mut self, response: PushOutResponse) -> Result<(), RulesError> {
        if self.mode != GameMode::NineBall {
            return Err(self.reject(RulesError::NotApplicable));
        }
        let PendingDecision::PushOutResponse { player } = self.require_decision()? else {
            return Err(self.reject(RulesError::DecisionUnavailable("no push-out response pending")));
        };
        self.current = match response {
            PushOutResponse::Play => player,
            PushOutResponse::Pass => player.opponent(),
        };
        self.pending = PendingDecision::None;
        self.set_state(GameState::Playing);
        Ok(())
    }

    /// Snooker: the incoming player's remedy for a foul.
    pub fn apply_foul_decision(&mut self, decision: FoulDecision) -> Result<(), RulesError> {
        if self.mode != GameMode::Snooker {
            return Err(self.reject(RulesError::NotApplicable));
        }
        let PendingDecision::SnookerFoulDecision {
            miss,
            free_ball_eligible,
            offender,
            ..
        } = self.require_decision()?
        else {
            return Err(self.reject(RulesError::DecisionUnavailable("no foul decision pending")));
        };
        let receiver = offender.opponent();
        log::debug!("{} chooses {:?} after {}'s foul", receiver, decision, offender);

        match decision {
            FoulDecision::Play => {
                self.current = receiver;
                self.resume_after_foul();
            }
            FoulDecision::Replay => {
                self.current = offender;
                self.resume_after_foul();
            }
            FoulDecision::FreeBall => {
                if !free_ball_eligible {
                    return Err(self.reject(RulesError::DecisionUnavailable("free ball not available")));
                }
                self.current = receiver;
                self.pending = PendingDecision::FreeBallNomination { player: receiver };
                self.events.push(RulesEvent::FreeBallAwarded { player: receiver });
            }
            FoulDecision::Restore => {
                if !miss {
                    return Err(self.reject(RulesError::DecisionUnavailable("restore is only available after a miss")));
                }
                let Some(position) = self.pre_shot.take() else {
                    return Err(self.reject(RulesError::DecisionUnavailable("no position to restore")));
                };
                self.restore_position(*position, offender);
            }
        }
        Ok(())
    }

    /// Put the balls back where they were before the foul, keeping the
    /// scores, miss counts and the random stream, and make `offender` play
    /// again.
    fn restore_position(&mut self, position: GameSnapshot, offender: Player) {
        let latest = match &self.rules {
            Rules::Snooker(rules) => Some(rules.clone()),
            _ => None,
        };
        let from = self.state;
        let foul = self.last_foul.clone();
        let match_score = self.match_score.clone();
        let rng = self.rng.clone();
        self.apply_snapshot(position);
        if let (Rules::Snooker(rules), Some(latest)) = (&mut self.rules, latest) {
            rules.carry_counters(&latest);
        }
        // The saved position was taken in Playing; report the real transition.
        self.state = from;
        self.match_score = match_score;
        self.rng = rng;
        self.last_foul = foul;
        self.current = offender;
        self.pending = PendingDecision::None;
        self.ball_in_hand = None;
        log::info!("Position restored, {} to play again", offender);
        self.set_state(GameState::Playing);
    }

    /// Snooker: name the colour for the next shot while any colour is on.
    /// Accepted while the cue ball is in hand as well as in `Playing`, so the
    /// nomination can be made before placing.
    pub fn set_nominated_color(&mut self, color: SnookerColor) -> Result<(), RulesError> {
        if self.mode != GameMode::Snooker {
            return Err(self.reject(RulesError::NotApplicable));
        }
        if !matches!(self.state, GameState::Playing | GameState::BallInHand) {
            return Err(self.reject(RulesError::WrongState(self.state)));
        }
        let on_table = self
            .balls
            .iter()
            .any(|b| b.on_table() && b.snooker_color() == Some(color));
        if !on_table {
            return Err(self.reject(RulesError::DecisionUnavailable("that colour is not on the table")));
        }
        let result = match &mut self.rules {
            Rules::Snooker(rules) => rules.nominate(color),
            _ => Err(RulesError::NotApplicable),
        };
        result.map_err(|err| self.reject(err))
    }

    /// Snooker: nominate the free ball after choosing `FoulDecision::FreeBall`.
    pub fn set_free_ball_nomination(&mut self, number: u8) -> Result<(), RulesError> {
        if self.mode != GameMode::Snooker {
            return Err(self.reject(RulesError::NotApplicable));
        }
        let PendingDecision::FreeBallNomination { player } = self.require_decision()? else {
            return Err(self.reject(RulesError::DecisionUnavailable("no free ball to nominate")));
        };
        if self.ball(number).is_none() {
            return Err(self.reject(RulesError::UnknownBall(number)));
        }
        let allowed = match &self.rules {
            Rules::Snooker(rules) => rules.can_free_ball(&self.balls, number),
            _ => false,
        };
        if !allowed {
            return Err(self.reject(RulesError::DecisionUnavailable("that ball cannot be the free ball")));
        }
        if let Rules::Snooker(rules) = &mut self.rules {
            rules.free_ball = Some(number);
        }
        log::debug!("{} nominates ball {} as the free ball", player, number);
        self.current = player;
        self.resume_after_foul();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ball::Group;
    use crate::rules::shot::FoulReason;
    use crate::rules::snooker::Target;

    const BLUE: u8 = 19;

    fn game(mode: GameMode) -> Game {
        let mut game = Game::new(&EngineConfig::default());
        game.start_game(mode);
        game
    }

    fn place_default(game: &mut Game) {
        let zone = game.ball_in_hand().unwrap_or(PlacementZone::Anywhere);
        let pos = game.table().default_cue_position(zone);
        game.place_cue_ball(pos).unwrap();
    }

    /// Shoot, pocket `pots` the way physics would, feed `events`, settle.
    fn play(game: &mut Game, events: &[PhysicsEvent], pots: &[u8]) {
        game.shoot(Shot::new(Vec2::X, 3.0)).unwrap();
        for &n in pots {
            if let Some(b) = game.balls_mut().iter_mut().find(|b| b.number == n) {
                b.pocket();
            }
        }
        let mut all = events.to_vec();
        all.extend(pots.iter().map(|&ball| PhysicsEvent::Pocket { ball, pocket: 0, speed: 1.0 }));
        game.handle_events(&all);
        game.on_balls_stopped().unwrap();
    }

    fn hit(b: u8) -> PhysicsEvent {
        PhysicsEvent::Ball { a: CUE_BALL, b, speed: 2.0 }
    }

    fn rail() -> PhysicsEvent {
        PhysicsEvent::Rail {
            ball: CUE_BALL,
            cushion: crate::components::table::Cushion::Foot,
            speed: 1.0,
        }
    }

    #[test]
    fn new_game_waits_for_break_placement() {
        let mut g = game(GameMode::EightBall);
        assert_eq!(g.state(), GameState::BallInHand);
        assert_eq!(g.ball_in_hand(), Some(PlacementZone::Kitchen));
        assert!(g.take_physics_reset());
        assert!(!g.take_physics_reset());
        assert_eq!(
            g.shoot(Shot::new(Vec2::X, 2.0)),
            Err(RulesError::WrongState(GameState::BallInHand))
        );
    }

    #[test]
    fn placement_outside_zone_or_on_a_ball_is_rejected() {
        let mut g = game(GameMode::EightBall);
        let foot = g.table().foot_spot();
        assert!(matches!(g.place_cue_ball(Vec2::new(2.0, 0.6)), Err(RulesError::IllegalPlacement(_))));
        assert!(matches!(g.place_cue_ball(foot), Err(RulesError::IllegalPlacement(_))));
        assert!(matches!(g.place_cue_ball(Vec2::new(-1.0, 0.6)), Err(RulesError::IllegalPlacement(_))));
        assert_eq!(g.state(), GameState::BallInHand);
        place_default(&mut g);
        assert_eq!(g.state(), GameState::Playing);
        assert_eq!(g.take_sync_commands().len(), 1);
    }

    #[test]
    fn invalid_shot_is_rejected() {
        let mut g = game(GameMode::EightBall);
        place_default(&mut g);
        assert_eq!(g.shoot(Shot::new(Vec2::ZERO, 2.0)), Err(RulesError::InvalidShot));
        assert_eq!(g.shoot(Shot::new(Vec2::X, 0.0)), Err(RulesError::InvalidShot));
        assert_eq!(g.state(), GameState::Playing);
    }

    #[test]
    fn break_with_only_a_stripe_potted_assigns_stripes() {
        let mut g = game(GameMode::EightBall);
        place_default(&mut g);
        // Two balls driven back past the centre line plus one pot.
        let centre = g.table().center_line_x();
        for n in [2u8, 5] {
            g.balls_mut()[n as usize].pos.x = centre - 0.2;
        }
        play(&mut g, &[hit(1)], &[10]);
        assert!(g.last_foul().is_none());
        assert!(g.turn_continues());
        assert_eq!(g.current_player(), Player::One);
        assert_eq!(g.state(), GameState::Playing);
        let Rules::EightBall(rules) = g.rules() else {
            panic!("expected 8-ball rules");
        };
        assert_eq!(rules.groups.get(Player::One), Some(Group::Stripe));
        assert_eq!(rules.groups.get(Player::Two), Some(Group::Solid));
        assert!(!g.is_break());
    }

    #[test]
    fn scratch_gives_opponent_ball_in_hand_anywhere() {
        let mut g = game(GameMode::EightBall);
        place_default(&mut g);
        g.is_break = false;
        play(&mut g, &[hit(3), rail()], &[CUE_BALL]);
        assert_eq!(g.last_foul().map(|f| f.reason.clone()), Some(FoulReason::CueBallPocketed));
        assert_eq!(g.current_player(), Player::Two);
        assert_eq!(g.state(), GameState::BallInHand);
        assert_eq!(g.ball_in_hand(), Some(PlacementZone::Anywhere));
        let events = g.take_events();
        assert!(events.iter().any(|e| matches!(e, RulesEvent::Foul { player: Player::One, .. })));
        assert!(events.contains(&RulesEvent::BallPocketed { ball: CUE_BALL, pocket: 0 }));
        g.place_cue_ball(Vec2::new(2.2, 0.3)).unwrap();
        assert!(g.ball(CUE_BALL).unwrap().on_table());
    }

    #[test]
    fn nine_ball_push_out_flow() {
        let mut g = game(GameMode::NineBall);
        place_default(&mut g);
        let centre = g.table().center_line_x();
        for n in [2u8, 3, 4] {
            g.balls_mut()[n as usize].pos.x = centre - 0.2;
        }
        play(&mut g, &[hit(1), rail()], &[]);
        assert_eq!(g.state(), GameState::AwaitingDecision);
        assert_eq!(g.pending(), PendingDecision::PushOutOffer { player: Player::Two });
        assert_eq!(g.current_player(), Player::Two);

        assert_eq!(
            g.apply_push_out_response(PushOutResponse::Play),
            Err(RulesError::DecisionUnavailable("no push-out response pending"))
        );
        g.apply_push_out_choice(PushOutChoice::PushOut).unwrap();
        assert_eq!(g.state(), GameState::Playing);

        play(&mut g, &[hit(6)], &[]);
        assert!(g.last_foul().is_none());
        assert_eq!(g.pending(), PendingDecision::PushOutResponse { player: Player::One });
        assert_eq!(g.current_player(), Player::One);

        g.apply_push_out_response(PushOutResponse::Pass).unwrap();
        assert_eq!(g.current_player(), Player::Two);
        assert_eq!(g.state(), GameState::Playing);
    }

    #[test]
    fn nine_ball_wrong_first_contact_passes_the_turn() {
        let mut g = game(GameMode::NineBall);
        place_default(&mut g);
        g.is_break = false;
        for n in [1usize, 2] {
            g.balls_mut()[n].pocket();
        }
        play(&mut g, &[hit(5), rail()], &[]);
        let foul = g.last_foul().unwrap();
        assert_eq!(foul.reason.to_string(), "Must hit 3-ball first");
        assert_eq!(g.current_player(), Player::Two);
        assert_eq!(g.state(), GameState::BallInHand);
        let Rules::NineBall(rules) = g.rules() else {
            panic!("expected 9-ball rules");
        };
        assert_eq!(rules.lowest, 3);
    }

    #[test]
    fn uk_foul_hands_over_two_shots_from_position() {
        let mut g = game(GameMode::UkEightBall);
        place_default(&mut g);
        g.is_break = false;
        play(&mut g, &[], &[]);
        assert_eq!(g.state(), GameState::Playing);
        assert_eq!(g.current_player(), Player::Two);
        let Rules::UkEightBall(rules) = g.rules() else {
            panic!("expected UK rules");
        };
        assert_eq!((rules.shots_remaining, rules.free_shot), (2, true));
    }

    #[test]
    fn decisions_are_rejected_outside_awaiting_decision() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        assert_eq!(
            g.apply_foul_decision(FoulDecision::Play),
            Err(RulesError::WrongState(GameState::Playing))
        );
        assert_eq!(g.apply_push_out_choice(PushOutChoice::Normal), Err(RulesError::NotApplicable));
        assert_eq!(g.state(), GameState::Playing);
    }

    #[test]
    fn snooker_red_then_nomination() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        play(&mut g, &[hit(3)], &[3]);
        let Rules::Snooker(rules) = g.rules() else {
            panic!("expected snooker rules");
        };
        assert_eq!(rules.scores, [1, 0]);
        assert_eq!(rules.target, Target::AnyColor);
        assert_eq!(g.current_player(), Player::One);
        assert!(g.take_events().contains(&RulesEvent::ColorNominationRequired { player: Player::One }));

        assert!(g.set_nominated_color(SnookerColor::Red).is_err());
        g.set_nominated_color(SnookerColor::Pink).unwrap();
    }

    #[test]
    fn snooker_foul_waits_for_a_remedy() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        play(&mut g, &[], &[]);
        assert_eq!(g.state(), GameState::AwaitingDecision);
        assert_eq!(g.current_player(), Player::Two);
        assert!(matches!(
            g.pending(),
            PendingDecision::SnookerFoulDecision { penalty: 4, miss: true, offender: Player::One, .. }
        ));

        g.apply_foul_decision(FoulDecision::Replay).unwrap();
        assert_eq!(g.current_player(), Player::One);
        assert_eq!(g.state(), GameState::Playing);
    }

    #[test]
    fn snooker_restore_after_miss_puts_balls_back() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        let before: Vec<Vec2> = g.balls().iter().map(|b| b.pos).collect();
        g.shoot(Shot::new(Vec2::X, 3.0)).unwrap();
        g.balls_mut()[0].pos += Vec2::new(0.8, 0.1);
        g.balls_mut()[BLUE as usize].pos += Vec2::new(0.1, 0.1);
        g.on_balls_stopped().unwrap();
        g.take_physics_reset();

        g.apply_foul_decision(FoulDecision::Restore).unwrap();
        let after: Vec<Vec2> = g.balls().iter().map(|b| b.pos).collect();
        assert_eq!(before, after);
        assert_eq!(g.current_player(), Player::One);
        assert_eq!(g.state(), GameState::Playing);
        assert!(g.take_physics_reset());
        let Rules::Snooker(rules) = g.rules() else {
            panic!("expected snooker rules");
        };
        assert_eq!(rules.scores, [0, 4], "penalty stands");
        assert!(g.last_foul().is_some());
    }

    #[test]
    fn restore_reports_the_state_change_and_keeps_the_rng() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        g.shoot(Shot::new(Vec2::X, 3.0)).unwrap();
        g.balls_mut()[0].pos += Vec2::new(0.8, 0.1);
        g.on_balls_stopped().unwrap();
        assert_eq!(g.state(), GameState::AwaitingDecision);
        g.take_events();
        g.rng.coin_flip();
        let rng = g.rng.clone();

        g.apply_foul_decision(FoulDecision::Restore).unwrap();
        assert_eq!(g.state(), GameState::Playing);
        let events = g.take_events();
        assert!(events.contains(&RulesEvent::StateChanged {
            from: GameState::AwaitingDecision,
            to: GameState::Playing,
        }));
        assert_eq!(g.rng, rng, "the coin is not rewound with the balls");
    }

    #[test]
    fn blocked_respot_leaves_the_colour_down() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        // Short table so twelve reds cover the whole centre line.
        g.table.length = 1.2;
        let mid = g.table.width / 2.0;
        for i in 0..12u8 {
            let x = 0.05 + f32::from(i) * 0.1;
            g.balls_mut()[usize::from(i) + 1].place(Vec2::new(x, mid));
        }
        let (baulk, d) = (g.table.baulk_x(), g.table.d_radius());
        g.balls_mut()[13].place(Vec2::new(baulk, mid + d));
        g.balls_mut()[14].place(Vec2::new(baulk, mid - d));

        play(&mut g, &[hit(BLUE)], &[BLUE]);
        assert!(g.take_events().contains(&RulesEvent::RespotFailed { ball: BLUE }));
        assert!(g.ball(BLUE).unwrap().is_pocketed());
        assert_eq!(g.state(), GameState::AwaitingDecision);
        assert!(g.last_foul().is_some());
    }

    #[test]
    fn colour_can_be_nominated_with_the_cue_ball_in_hand() {
        let mut g = game(GameMode::Snooker);
        assert_eq!(g.state(), GameState::BallInHand);
        if let Rules::Snooker(rules) = &mut g.rules {
            rules.target = Target::AnyColor;
        }
        g.set_nominated_color(SnookerColor::Green).unwrap();

        place_default(&mut g);
        g.shoot(Shot::new(Vec2::X, 3.0)).unwrap();
        assert_eq!(
            g.set_nominated_color(SnookerColor::Pink),
            Err(RulesError::WrongState(GameState::BallsMoving))
        );
        let Rules::Snooker(rules) = g.rules() else {
            panic!("expected snooker rules");
        };
        assert_eq!(rules.nominated, Some(SnookerColor::Green));
    }

    #[test]
    fn restore_needs_a_miss_and_play_after_scratch_is_in_hand() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        play(&mut g, &[hit(5)], &[CUE_BALL]);
        assert!(matches!(g.pending(), PendingDecision::SnookerFoulDecision { miss: false, .. }));
        assert!(g.apply_foul_decision(FoulDecision::Restore).is_err());
        assert!(g.apply_foul_decision(FoulDecision::FreeBall).is_err());
        assert_eq!(g.state(), GameState::AwaitingDecision);

        g.apply_foul_decision(FoulDecision::Play).unwrap();
        assert_eq!(g.state(), GameState::BallInHand);
        assert_eq!(g.ball_in_hand(), Some(PlacementZone::D));
        assert_eq!(g.current_player(), Player::Two);
    }

    #[test]
    fn free_ball_flow() {
        let mut g = game(GameMode::Snooker);
        place_default(&mut g);
        // Last red hidden behind the blue.
        for n in 2..=15usize {
            g.balls_mut()[n].pocket();
        }
        let mid = g.table().width / 2.0;
        let blue = g.ball(BLUE).unwrap().pos;
        g.balls_mut()[0].place(Vec2::new(blue.x - 0.5, mid));
        g.balls_mut()[1].place(Vec2::new(blue.x + 0.5, mid));

        play(&mut g, &[], &[]);
        assert!(matches!(
            g.pending(),
            PendingDecision::SnookerFoulDecision { free_ball_eligible: true, .. }
        ));
        g.apply_foul_decision(FoulDecision::FreeBall).unwrap();
        assert_eq!(g.pending(), PendingDecision::FreeBallNomination { player: Player::Two });
        assert_eq!(g.set_free_ball_nomination(1), Err(RulesError::DecisionUnavailable("that ball cannot be the free ball")));
        g.set_free_ball_nomination(BLUE).unwrap();
        assert_eq!(g.state(), GameState::Playing);
        assert_eq!(g.current_player(), Player::Two);
        let Rules::Snooker(rules) = g.rules() else {
            panic!("expected snooker rules");
        };
        assert_eq!(rules.free_ball, Some(BLUE));
    }

    #[test]
    fn concede_and_match_progress() {
        let mut g = Game::new(&EngineConfig {
            best_of: 3,
            ..EngineConfig::default()
        });
        g.start_game(GameMode::FreePlay);
        assert!(g.start_next_frame().is_err());

        g.concede(Player::Two).unwrap();
        assert_eq!(g.state(), GameState::GameOver);
        assert_eq!(g.outcome().map(|o| o.winner), Some(Player::One));
        assert!(g.concede(Player::Two).is_err());

        g.start_next_frame().unwrap();
        assert_eq!(g.current_player(), Player::Two, "break alternates");
        g.concede(Player::Two).unwrap();
        assert!(g.match_score().is_decided());
        assert_eq!(g.start_next_frame(), Err(RulesError::MatchDecided));
        let events = g.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, RulesEvent::GameOver { match_over: true, frames: [2, 0], .. })));
    }

    #[test]
    fn match_score_thresholds() {
        let mut score = MatchScore::new(5);
        assert_eq!(score.frames_to_win(), 3);
        score.record(Player::Two);
        score.record(Player::Two);
        assert!(!score.is_decided());
        score.record(Player::Two);
        assert_eq!(score.winner(), Some(Player::Two));
    }
}
