use baize_engine::{
    BallLifecycle, EngineConfig, FoulDecision, GameMode, Player, PushOutChoice, PushOutResponse,
    RulesEvent, Session, Shot, SnookerColor,
};
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::de::DeserializeOwned;

/// Per-ball render record, read by the host as a flat `f32` buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BallInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub number: f32,
    /// 0 on the table, 1 sinking, 2 pocketed.
    pub state: f32,
    /// Accumulated roll angle about the table's x and y axes (radians).
    pub roll_x: f32,
    pub roll_y: f32,
    /// Accumulated z rotation from english (radians).
    pub spin: f32,
}

pub const INSTANCE_FLOATS: usize = std::mem::size_of::<BallInstance>() / std::mem::size_of::<f32>();

/// Rate at which the displayed roll rate follows the physical one (1/s).
const ROLL_SMOOTHING: f32 = 20.0;

/// Owns the session and the host-facing buffers.
///
/// The `#[wasm_bindgen]` exports in `lib.rs` keep one runner in a
/// `thread_local!`, because wasm-bindgen cannot export a struct that owns
/// the whole engine by value.
pub struct GameRunner {
    session: Session,
    instances: Vec<BallInstance>,
    /// Smoothed roll rate per ball, indexed like `instances`.
    roll_rates: Vec<Vec2>,
    events: Vec<RulesEvent>,
}

impl GameRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            session: Session::new(config),
            instances: Vec::new(),
            roll_rates: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Physics, rules, then the visual roll smoothing, in that order.
    pub fn tick(&mut self, dt: f32) {
        self.session.tick(dt);
        self.events.extend(self.session.take_events());
        self.rebuild_instances(dt);
    }

    fn rebuild_instances(&mut self, dt: f32) {
        let balls = self.session.game().balls();
        if self.instances.len() != balls.len() {
            self.instances = vec![BallInstance::default(); balls.len()];
            self.roll_rates = vec![Vec2::ZERO; balls.len()];
        }
        let blend = (ROLL_SMOOTHING * dt).clamp(0.0, 1.0);
        for ((ball, inst), rate) in balls.iter().zip(&mut self.instances).zip(&mut self.roll_rates) {
            // Rolling without slip: angular rate about the axis perpendicular
            // to travel is speed / radius.
            let target = if ball.on_table() {
                Vec2::new(-ball.vel.y, ball.vel.x) / ball.radius
            } else {
                Vec2::ZERO
            };
            *rate = rate.lerp(target, blend);
            inst.x = ball.pos.x;
            inst.y = ball.pos.y;
            inst.radius = ball.radius;
            inst.number = ball.number as f32;
            inst.state = match ball.lifecycle {
                BallLifecycle::OnTable => 0.0,
                BallLifecycle::Sinking(_) => 1.0,
                BallLifecycle::Pocketed => 2.0,
            };
            inst.roll_x = (inst.roll_x + rate.x * dt) % std::f32::consts::TAU;
            inst.roll_y = (inst.roll_y + rate.y * dt) % std::f32::consts::TAU;
            inst.spin = (inst.spin + ball.spin_z * dt) % std::f32::consts::TAU;
        }
    }

    // ---- buffers ----

    pub fn instances(&self) -> &[BallInstance] {
        &self.instances
    }

    pub fn instance_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.instance_floats().as_ptr()
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Drain queued rules events as a JSON array.
    pub fn take_events_json(&mut self) -> String {
        let events = std::mem::take(&mut self.events);
        to_json(&events)
    }

    pub fn physics_events_json(&self) -> String {
        to_json(self.session.physics_events())
    }

    pub fn info_json(&self) -> String {
        to_json(&self.session.info())
    }

    pub fn predict_json(&self, dx: f32, dy: f32, power: f32) -> String {
        to_json(&self.session.predict(Vec2::new(dx, dy), power))
    }

    // ---- commands ----

    pub fn start_game(&mut self, mode: &str) -> bool {
        let Some(mode) = parse::<GameMode>(mode) else {
            return false;
        };
        self.session.start_game(mode);
        self.instances.clear();
        true
    }

    pub fn start_next_frame(&mut self) -> bool {
        report(self.session.game_mut().start_next_frame())
    }

    pub fn concede(&mut self, player: u32) -> bool {
        let player = if player == 2 { Player::Two } else { Player::One };
        report(self.session.game_mut().concede(player))
    }

    pub fn place_cue_ball(&mut self, x: f32, y: f32) -> bool {
        report(self.session.place_cue_ball(Vec2::new(x, y)))
    }

    pub fn shoot(&mut self, dx: f32, dy: f32, power: f32, spin_x: f32, spin_y: f32) -> bool {
        let shot = Shot::new(Vec2::new(dx, dy), power).with_spin(Vec2::new(spin_x, spin_y));
        report(self.session.shoot(shot))
    }

    pub fn apply_foul_decision(&mut self, decision: &str) -> bool {
        match parse::<FoulDecision>(decision) {
            Some(d) => report(self.session.game_mut().apply_foul_decision(d)),
            None => false,
        }
    }

    pub fn apply_push_out_choice(&mut self, choice: &str) -> bool {
        match parse::<PushOutChoice>(choice) {
            Some(c) => report(self.session.game_mut().apply_push_out_choice(c)),
            None => false,
        }
    }

    pub fn apply_push_out_response(&mut self, response: &str) -> bool {
        match parse::<PushOutResponse>(response) {
            Some(r) => report(self.session.game_mut().apply_push_out_response(r)),
            None => false,
        }
    }

    pub fn set_nominated_color(&mut self, name: &str) -> bool {
        match SnookerColor::from_name(name) {
            Some(color) => report(self.session.game_mut().set_nominated_color(color)),
            None => {
                log::warn!("Unknown colour {:?}", name);
                false
            }
        }
    }

    pub fn set_free_ball_nomination(&mut self, ball: u32) -> bool {
        let Ok(ball) = u8::try_from(ball) else {
            return false;
        };
        report(self.session.game_mut().set_free_ball_nomination(ball))
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.session.set_speed(speed);
    }

    pub fn save(&self) -> String {
        match self.session.save() {
            Ok(json) => json,
            Err(err) => {
                log::error!("Save failed: {}", err);
                String::new()
            }
        }
    }

    pub fn load(&mut self, json: &str) -> bool {
        match self.session.load(json) {
            Ok(()) => {
                self.instances.clear();
                true
            }
            Err(err) => {
                log::warn!("Load failed: {}", err);
                false
            }
        }
    }
}

/// Rejections are already logged by the engine; the host only needs a flag.
fn report<E>(result: Result<(), E>) -> bool {
    result.is_ok()
}

/// Parse a bare snake_case name into a unit enum.
fn parse<T: DeserializeOwned>(name: &str) -> Option<T> {
    match serde_json::from_value(serde_json::Value::String(name.to_string())) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Unrecognised value {:?}: {}", name, err);
            None
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::error!("Serialization failed: {}", err);
        String::from("null")
    })
}
