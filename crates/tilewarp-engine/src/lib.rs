pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;
pub mod assets;

// Re-export key types at crate root for convenience
pub use api::config::SimConfig;
pub use api::error::StageError;
pub use api::game::Simulation;
pub use api::types::{Angle, Color, Direction, EntityId, Side, SimEvent};
pub use assets::stage::{SpawnRecord, StageCatalog, StageData};
pub use components::entity::{Entity, EntityKind, VisualState};
pub use components::hitbox::{BoxKey, BoxRect, BoxRole, BoxSet, PortalSplit};
pub use components::strength::Strength;
pub use core::geometry::{Aabb, Rect};
pub use core::physics::{apply_contact, Contact, Resolver};
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use input::queue::{Buttons, InputEvent, InputQueue, InputState};
pub use renderer::instance::{RenderBuffer, SpriteInstance};
pub use systems::render::build_sprite_buffer;
pub use systems::triggers::activate;
