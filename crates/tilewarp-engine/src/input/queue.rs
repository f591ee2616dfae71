bitflags::bitflags! {
    /// Held direction flags.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const UP    = 1 << 0;
        const DOWN  = 1 << 1;
        const LEFT  = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Buttons {
    /// Map a DOM `KeyboardEvent.key` value to a direction.
    pub fn from_key_name(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" | " " => Some(Buttons::UP),
            "ArrowDown" | "s" | "S" => Some(Buttons::DOWN),
            "ArrowLeft" | "a" | "A" => Some(Buttons::LEFT),
            "ArrowRight" | "d" | "D" => Some(Buttons::RIGHT),
            _ => None,
        }
    }

    /// Map an on-screen arrow button index (0 up, 1 down, 2 left, 3 right).
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Buttons::UP),
            1 => Some(Buttons::DOWN),
            2 => Some(Buttons::LEFT),
            3 => Some(Buttons::RIGHT),
            _ => None,
        }
    }
}

/// Input events the driver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A keyboard key went down. Auto-repeat arrives as repeated key-downs.
    KeyDown(Buttons),
    KeyUp(Buttons),
    /// An on-screen arrow button was pressed.
    TouchDown(Buttons),
    TouchUp(Buttons),
}

/// A queue of input events.
/// JS writes events into the queue; Rust reads and drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Push a new input event (called from JS via wasm-bindgen).
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Check if there are pending events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction flags the simulation reads each tick.
///
/// The simulation only ever borrows this immutably; the driver applies
/// events and clears `just_pressed` after every executed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub held: Buttons,
    pub just_pressed: Buttons,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(b) => {
                // Auto-repeat must not re-trigger a jump.
                self.just_pressed |= b - self.held;
                self.held |= b;
            }
            InputEvent::TouchDown(b) => {
                self.just_pressed |= b;
                self.held |= b;
            }
            InputEvent::KeyUp(b) | InputEvent::TouchUp(b) => self.held -= b,
        }
    }

    pub fn is_held(&self, b: Buttons) -> bool {
        self.held.contains(b)
    }

    pub fn was_just_pressed(&self, b: Buttons) -> bool {
        self.just_pressed.contains(b)
    }

    /// Clear the single-tick flags.
    pub fn end_tick(&mut self) {
        self.just_pressed = Buttons::empty();
    }

    /// Release everything, e.g. on stage reload or focus loss.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
