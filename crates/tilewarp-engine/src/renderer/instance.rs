use bytemuck::{Pod, Zeroable};

/// Per-sprite-box render data read by the TypeScript renderer.
/// Must match the TypeScript protocol: 13 floats = 52 bytes stride.
///
/// Rectangles are absolute grid units. A box cut by a portal arrives as
/// two instances whose UV sub-rectangles together cover the full texture.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Texture sub-rectangle, 0..1 over the undistorted sprite.
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
    /// `EntityKind::code`.
    pub kind: f32,
    /// `VisualState::code`.
    pub state: f32,
    /// Rotation in degrees.
    pub angle: f32,
    /// 1.0 when the sprite is drawn mirrored horizontally.
    pub mirror: f32,
    /// Packed `0xRRGGBB` tint, or -1.0 for none.
    pub tint: f32,
}

impl SpriteInstance {
    pub const FLOATS: usize = 13;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Sprite instances for one frame.
pub struct RenderBuffer {
    /// Static tiles first, then movers from `mover_split` on, so moving
    /// sprites always draw over the stage.
    pub instances: Vec<SpriteInstance>,
    /// Index of the first mover instance.
    pub mover_split: u32,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(256),
            mover_split: 0,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.mover_split = 0;
    }

    pub fn push(&mut self, instance: SpriteInstance) {
        self.instances.push(instance);
    }

    pub fn set_mover_split(&mut self, split: u32) {
        self.mover_split = split;
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw pointer to instance data for zero-copy reads from wasm memory.
    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    /// The instances as one flat float slice.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_instance_is_13_floats() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), SpriteInstance::STRIDE_BYTES);
        assert_eq!(SpriteInstance::FLOATS, 13);
    }

    #[test]
    fn render_buffer_push_and_flatten() {
        let mut buf = RenderBuffer::new();
        buf.push(SpriteInstance {
            x: 2.0,
            ..Default::default()
        });
        buf.push(SpriteInstance::default());
        assert_eq!(buf.instance_count(), 2);
        assert_eq!(buf.as_floats().len(), 26);
        assert_eq!(buf.as_floats()[0], 2.0);

        buf.clear();
        assert_eq!(buf.instance_count(), 0);
        assert_eq!(buf.mover_split, 0);
    }
}
