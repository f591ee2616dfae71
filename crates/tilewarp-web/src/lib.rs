pub mod runner;

pub use runner::StageRunner;

use std::cell::RefCell;

use tilewarp_engine::{Buttons, InputEvent, SimConfig, StageCatalog, StageError};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<StageRunner>> = const { RefCell::new(None) };
    static ON_COMPLETE: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

/// Run `f` against the runner. Before `game_init` every call is a no-op
/// returning `R::default()`.
fn with_runner<R: Default>(f: impl FnOnce(&mut StageRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            log::warn!("runner not initialized; call game_init() first");
            R::default()
        }
    })
}

fn into_js(loaded: Option<Result<u32, StageError>>) -> Result<u32, JsValue> {
    match loaded {
        Some(Ok(stage)) => Ok(stage),
        Some(Err(err)) => Err(JsValue::from_str(&err.to_string())),
        None => Err(JsValue::from_str("runner not initialized")),
    }
}

fn notify_complete(stage: u32) {
    ON_COMPLETE.with(|cell| {
        if let Some(callback) = cell.borrow().as_ref() {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from(stage)) {
                web_sys::console::error_2(&"stage-complete callback failed:".into(), &err);
            }
        }
    });
}

/// Set up logging and load the bundled default stage. `config_json` may
/// override any simulation tunable; pass an empty string for defaults.
#[wasm_bindgen]
pub fn game_init(config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = if config_json.trim().is_empty() {
        SimConfig::default()
    } else {
        SimConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let runner = StageRunner::new(StageCatalog::builtin(), config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    RUNNER.with(|cell| *cell.borrow_mut() = Some(runner));
    log::info!("tilewarp: initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn game_add_stage(number: u32, json: &str) {
    with_runner(|r| r.add_stage(number, json));
}

/// Load a stage; returns the stage number actually running.
#[wasm_bindgen]
pub fn game_load_stage(number: u32) -> Result<u32, JsValue> {
    into_js(with_runner(|r| Some(r.load_stage(number))))
}

#[wasm_bindgen]
pub fn game_restart() -> Result<u32, JsValue> {
    into_js(with_runner(|r| Some(r.restart())))
}

/// Advance by one display frame of `dt` seconds.
#[wasm_bindgen]
pub fn game_tick(dt: f32) {
    let completed = with_runner(|r| r.tick(dt).then(|| r.stage()));
    if let Some(stage) = completed {
        notify_complete(stage);
    }
}

/// `callback(stage)` fires once when the last Player leaves the map.
#[wasm_bindgen]
pub fn game_set_on_complete(callback: js_sys::Function) {
    ON_COMPLETE.with(|cell| *cell.borrow_mut() = Some(callback));
}

// ---- Input ----

#[wasm_bindgen]
pub fn game_key_down(key: &str) {
    if let Some(b) = Buttons::from_key_name(key) {
        with_runner(|r| r.push_input(InputEvent::KeyDown(b)));
    }
}

#[wasm_bindgen]
pub fn game_key_up(key: &str) {
    if let Some(b) = Buttons::from_key_name(key) {
        with_runner(|r| r.push_input(InputEvent::KeyUp(b)));
    }
}

/// On-screen arrow pressed: 0 up, 1 down, 2 left, 3 right.
#[wasm_bindgen]
pub fn game_button_down(index: u32) {
    if let Some(b) = Buttons::from_index(index) {
        with_runner(|r| r.push_input(InputEvent::TouchDown(b)));
    }
}

#[wasm_bindgen]
pub fn game_button_up(index: u32) {
    if let Some(b) = Buttons::from_index(index) {
        with_runner(|r| r.push_input(InputEvent::TouchUp(b)));
    }
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn game_hint() -> Option<String> {
    with_runner(|r| r.hint().map(str::to_string))
}

#[wasm_bindgen]
pub fn game_stage() -> u32 {
    with_runner(|r| r.stage())
}

#[wasm_bindgen]
pub fn game_is_complete() -> bool {
    with_runner(|r| r.is_complete())
}

#[wasm_bindgen]
pub fn get_instances_ptr() -> *const f32 {
    RUNNER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |r| r.instances_ptr())
    })
}

#[wasm_bindgen]
pub fn get_instance_count() -> u32 {
    with_runner(|r| r.instance_count())
}

#[wasm_bindgen]
pub fn get_instance_floats() -> u32 {
    tilewarp_engine::SpriteInstance::FLOATS as u32
}

#[wasm_bindgen]
pub fn get_mover_split() -> u32 {
    with_runner(|r| r.mover_split())
}

#[wasm_bindgen]
pub fn get_events_ptr() -> *const f32 {
    RUNNER.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |r| r.events_ptr())
    })
}

#[wasm_bindgen]
pub fn get_events_len() -> u32 {
    with_runner(|r| r.events_len())
}

#[wasm_bindgen]
pub fn get_map_len() -> f32 {
    with_runner(|r| r.map_len())
}
