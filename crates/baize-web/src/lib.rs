pub mod runner;

pub use runner::{BallInstance, GameRunner, INSTANCE_FLOATS};

use std::cell::RefCell;

use baize_engine::EngineConfig;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<GameRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the live runner. Calls made before `game_init` are
/// logged and answered with `None`.
fn with_runner<R>(f: impl FnOnce(&mut GameRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("Game not initialized. Call game_init() first.");
                None
            }
        }
    })
}

/// Create the session. `config_json` may be empty or a partial
/// configuration; an unparsable one falls back to the defaults.
#[wasm_bindgen]
pub fn game_init(config_json: &str) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = if config_json.trim().is_empty() {
        EngineConfig::default()
    } else {
        EngineConfig::from_json(config_json).unwrap_or_else(|err| {
            log::warn!("Bad config, using defaults: {}", err);
            EngineConfig::default()
        })
    };
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(GameRunner::new(config));
    });
    log::info!("baize: initialized");
}

#[wasm_bindgen]
pub fn game_tick(dt: f32) {
    with_runner(|r| r.tick(dt));
}

// ---- Commands ----

#[wasm_bindgen]
pub fn game_start(mode: &str) -> bool {
    with_runner(|r| r.start_game(mode)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_start_next_frame() -> bool {
    with_runner(|r| r.start_next_frame()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_concede(player: u32) -> bool {
    with_runner(|r| r.concede(player)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_place_cue_ball(x: f32, y: f32) -> bool {
    with_runner(|r| r.place_cue_ball(x, y)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_shoot(dx: f32, dy: f32, power: f32, spin_x: f32, spin_y: f32) -> bool {
    with_runner(|r| r.shoot(dx, dy, power, spin_x, spin_y)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_foul_decision(decision: &str) -> bool {
    with_runner(|r| r.apply_foul_decision(decision)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_push_out_choice(choice: &str) -> bool {
    with_runner(|r| r.apply_push_out_choice(choice)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_push_out_response(response: &str) -> bool {
    with_runner(|r| r.apply_push_out_response(response)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_nominate_color(color: &str) -> bool {
    with_runner(|r| r.set_nominated_color(color)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_nominate_free_ball(ball: u32) -> bool {
    with_runner(|r| r.set_free_ball_nomination(ball)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_set_speed(speed: f32) {
    with_runner(|r| r.set_speed(speed));
}

#[wasm_bindgen]
pub fn game_save() -> String {
    with_runner(|r| r.save()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn game_load(json: &str) -> bool {
    with_runner(|r| r.load(json)).unwrap_or(false)
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_instances_ptr() -> *const f32 {
    with_runner(|r| r.instances_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_instance_count() -> u32 {
    with_runner(|r| r.instance_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_instance_floats() -> u32 {
    INSTANCE_FLOATS as u32
}

/// Copy of the instance buffer, for hosts that cannot read wasm memory
/// directly.
#[wasm_bindgen]
pub fn get_instance_data() -> js_sys::Float32Array {
    with_runner(|r| js_sys::Float32Array::from(r.instance_floats()))
        .unwrap_or_else(|| js_sys::Float32Array::new_with_length(0))
}

#[wasm_bindgen]
pub fn get_info() -> String {
    with_runner(|r| r.info_json()).unwrap_or_default()
}

/// Rules events since the last call, as a JSON array.
#[wasm_bindgen]
pub fn get_events() -> String {
    with_runner(|r| r.take_events_json()).unwrap_or_else(|| String::from("[]"))
}

#[wasm_bindgen]
pub fn get_physics_events() -> String {
    with_runner(|r| r.physics_events_json()).unwrap_or_else(|| String::from("[]"))
}

#[wasm_bindgen]
pub fn get_prediction(dx: f32, dy: f32, power: f32) -> String {
    with_runner(|r| r.predict_json(dx, dy, power)).unwrap_or_default()
}
