pub mod movement;
pub mod portal;
pub mod render;
pub mod triggers;
pub mod update;
