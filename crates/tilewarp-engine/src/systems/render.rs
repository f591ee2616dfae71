use crate::components::entity::Entity;
use crate::core::scene::Scene;
use crate::renderer::instance::{RenderBuffer, SpriteInstance};

/// One instance per visible sprite box of `entity`.
fn push_sprites(entity: &Entity, buffer: &mut RenderBuffer) {
    let tint = entity
        .color
        .as_ref()
        .and_then(|c| c.packed_rgb())
        .map_or(-1.0, |rgb| rgb as f32);

    for (_, sprite) in entity.boxes.sprites() {
        let r = sprite.at(entity.pos);
        if r.width() <= 0.0 || r.height() <= 0.0 {
            continue;
        }
        let [u0, v0, u1, v1] = sprite.uv();
        buffer.push(SpriteInstance {
            x: r.l,
            y: r.t,
            w: r.width(),
            h: r.height(),
            u0,
            v0,
            u1,
            v1,
            kind: entity.kind.code() as f32,
            state: entity.visual.code() as f32,
            angle: entity.angle.degrees() as f32,
            mirror: if entity.facing_left { 1.0 } else { 0.0 },
            tint,
        });
    }
}

/// Build the sprite buffer from the scene.
/// Static entities first, then movers; `mover_split` marks the boundary.
pub fn build_sprite_buffer(scene: &Scene, buffer: &mut RenderBuffer) {
    buffer.clear();

    for entity in scene.iter().filter(|e| !e.kind.is_mover()) {
        push_sprites(entity, buffer);
    }
    buffer.set_mover_split(buffer.instance_count());
    for entity in scene.iter().filter(|e| e.kind.is_mover()) {
        push_sprites(entity, buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::game::Simulation;
    use crate::api::types::{Angle, Color, EntityId};
    use crate::components::entity::{EntityKind, VisualState};
    use crate::systems::portal::update_portals;
    use glam::Vec2;

    #[test]
    fn movers_draw_after_static_tiles() {
        let mut sim = Simulation::default();
        sim.spawn_kind(EntityKind::Player, Vec2::new(2.0, 3.0), Vec2::ONE, Angle::Deg0);
        let block = sim.spawn_kind(EntityKind::Block, Vec2::new(0.0, 4.0), Vec2::new(16.0, 1.0), Angle::Deg0);
        sim.entity_mut(block).unwrap().color = Some(Color::new("#e04040"));

        let mut buffer = RenderBuffer::new();
        build_sprite_buffer(&sim.scene, &mut buffer);

        assert_eq!(buffer.instance_count(), 2);
        assert_eq!(buffer.mover_split, 1);
        let tile = buffer.instances[0];
        assert_eq!((tile.x, tile.y, tile.w, tile.h), (0.0, 4.0, 16.0, 1.0));
        assert_eq!(tile.tint, 0xe04040 as f32);
        assert_eq!(tile.kind, EntityKind::Block.code() as f32);
        let player = buffer.instances[1];
        assert_eq!([player.u0, player.v0, player.u1, player.v1], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(player.tint, -1.0);
        assert_eq!(player.state, VisualState::Idle.code() as f32);
    }

    #[test]
    fn split_sprite_covers_the_texture_once() {
        let mut sim = Simulation::default();
        let config = sim.config.clone();
        for (id, pos) in [(1, Vec2::new(4.0, 10.0)), (2, Vec2::new(10.0, 4.0))] {
            sim.spawn(
                Entity::new(EntityId(id), EntityKind::Portal, pos, Vec2::ONE, Angle::Deg0, &config)
                    .with_pair_id("a"),
            );
        }
        sim.link_portals().unwrap();
        let player = sim.spawn_kind(EntityKind::Player, Vec2::new(4.0, 9.25), Vec2::ONE, Angle::Deg0);
        update_portals(&mut sim);

        let mut buffer = RenderBuffer::new();
        build_sprite_buffer(&sim.scene, &mut buffer);
        let pieces: Vec<SpriteInstance> = buffer.instances[buffer.mover_split as usize..].to_vec();
        assert_eq!(pieces.len(), 2);
        assert!(sim.entity(player).unwrap().moving_in_portals.contains(&EntityId(1)));

        let covered: f32 = pieces.iter().map(|p| p.v1 - p.v0).sum();
        assert!((covered - 1.0).abs() < 1e-4);
        let heights: f32 = pieces.iter().map(|p| p.h).sum();
        assert!((heights - 1.0).abs() < 1e-4);
    }
}
