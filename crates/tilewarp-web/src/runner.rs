use log::{error, info};
use tilewarp_engine::{
    build_sprite_buffer, FixedTimestep, InputEvent, InputQueue, InputState, RenderBuffer, SimConfig,
    SimEvent, Simulation, StageCatalog, StageError,
};

/// Floats per packed event: kind, a, b, c (wire format).
pub const EVENT_FLOATS: usize = 4;

/// Event kind codes in the packed event buffer.
pub mod event_kind {
    pub const KEY_COLLECTED: f32 = 1.0;
    pub const LEVER_TOGGLED: f32 = 2.0;
    pub const BUTTON_CHANGED: f32 = 3.0;
    pub const ACTIVATED: f32 = 4.0;
    pub const TELEPORTED: f32 = 5.0;
    pub const REMOVED: f32 = 6.0;
    pub const STAGE_COMPLETE: f32 = 7.0;
}

fn pack_event(event: &SimEvent) -> [f32; EVENT_FLOATS] {
    let rgb = |c: &tilewarp_engine::Color| c.packed_rgb().map_or(-1.0, |v| v as f32);
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    match event {
        SimEvent::KeyCollected { key, color } => [event_kind::KEY_COLLECTED, key.0 as f32, rgb(color), 0.0],
        SimEvent::LeverToggled { lever, on } => [event_kind::LEVER_TOGGLED, lever.0 as f32, flag(*on), 0.0],
        SimEvent::ButtonChanged { button, pressed } => {
            [event_kind::BUTTON_CHANGED, button.0 as f32, flag(*pressed), 0.0]
        }
        SimEvent::Activated { color } => [event_kind::ACTIVATED, rgb(color), 0.0, 0.0],
        SimEvent::Teleported { entity, from, to } => {
            [event_kind::TELEPORTED, entity.0 as f32, from.0 as f32, to.0 as f32]
        }
        SimEvent::Removed { entity } => [event_kind::REMOVED, entity.0 as f32, 0.0, 0.0],
        SimEvent::StageComplete => [event_kind::STAGE_COMPLETE, 0.0, 0.0, 0.0],
    }
}

/// Frame driver for one stage at a time.
///
/// Owns the simulation and everything around it: the stage catalog, the
/// fixed-step accumulator, pending input and the per-frame output buffers.
/// `lib.rs` keeps one in a `thread_local!` and exports free functions,
/// because wasm-bindgen cannot export a struct holding a JS callback.
pub struct StageRunner {
    sim: Simulation,
    catalog: StageCatalog,
    config: SimConfig,
    timestep: FixedTimestep,
    input: InputQueue,
    held: InputState,
    stage: u32,
    sprites: RenderBuffer,
    /// Flat buffer of this frame's events, `EVENT_FLOATS` per event.
    event_buffer: Vec<f32>,
    completion_reported: bool,
}

impl StageRunner {
    /// A runner with the catalog's default stage loaded.
    pub fn new(catalog: StageCatalog, config: SimConfig) -> Result<Self, StageError> {
        let (stage, sim) = catalog.load(catalog.default_stage(), &config)?;
        Ok(Self {
            sim,
            timestep: FixedTimestep::new(config.fixed_dt, config.max_frame_dt),
            catalog,
            config,
            input: InputQueue::new(),
            held: InputState::new(),
            stage,
            sprites: RenderBuffer::new(),
            event_buffer: Vec::with_capacity(64),
            completion_reported: false,
        })
    }

    /// Register (or replace) a stage's JSON.
    pub fn add_stage(&mut self, number: u32, json: &str) {
        self.catalog.insert(number, json);
    }

    /// Switch to stage `number`, falling back to the default stage when its
    /// data is unusable. On a construction error the current stage keeps
    /// running. Returns the stage actually loaded.
    pub fn load_stage(&mut self, number: u32) -> Result<u32, StageError> {
        let (stage, sim) = self.catalog.load(number, &self.config).map_err(|err| {
            error!("stage {number} failed to load: {err}");
            err
        })?;
        self.sim = sim;
        self.stage = stage;
        self.held.clear();
        self.input.drain();
        self.timestep.reset();
        self.event_buffer.clear();
        self.completion_reported = false;
        build_sprite_buffer(&self.sim.scene, &mut self.sprites);
        info!("stage {stage} running");
        Ok(stage)
    }

    /// Reload the current stage from scratch.
    pub fn restart(&mut self) -> Result<u32, StageError> {
        self.load_stage(self.stage)
    }

    /// Queue an input event for the next frame.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one display frame: apply queued input, step the simulation as
    /// often as the accumulator allows and rebuild the output buffers.
    ///
    /// Returns `true` on the one frame where the stage became complete.
    pub fn tick(&mut self, frame_dt: f32) -> bool {
        self.sim.clear_frame_data();
        for event in self.input.drain() {
            self.held.apply(event);
        }

        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.sim.tick(&self.held);
            self.held.end_tick();
        }

        build_sprite_buffer(&self.sim.scene, &mut self.sprites);
        self.event_buffer.clear();
        for event in self.sim.events() {
            self.event_buffer.extend_from_slice(&pack_event(event));
        }

        let newly_complete = self.sim.is_complete() && !self.completion_reported;
        if newly_complete {
            self.completion_reported = true;
            info!("stage {} complete", self.stage);
        }
        newly_complete
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn hint(&self) -> Option<&str> {
        self.sim.hint()
    }

    pub fn is_complete(&self) -> bool {
        self.sim.is_complete()
    }

    // ---- Pointer accessors for reads from wasm memory ----

    pub fn instances_ptr(&self) -> *const f32 {
        self.sprites.instances_ptr()
    }

    pub fn instance_count(&self) -> u32 {
        self.sprites.instance_count()
    }

    pub fn mover_split(&self) -> u32 {
        self.sprites.mover_split
    }

    pub fn events_ptr(&self) -> *const f32 {
        self.event_buffer.as_ptr()
    }

    pub fn events_len(&self) -> u32 {
        (self.event_buffer.len() / EVENT_FLOATS) as u32
    }

    pub fn map_len(&self) -> f32 {
        self.config.map_len
    }
}
