pub mod instance;

pub use instance::{RenderBuffer, SpriteInstance};
