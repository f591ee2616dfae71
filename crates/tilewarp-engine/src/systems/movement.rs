//! Velocity sources: gravity, ladders, walking, MoveBlock drive and jumps,
//! plus the Player's animation tag.

use crate::api::config::SimConfig;
use crate::api::types::EntityId;
use crate::components::entity::{Entity, EntityKind, VisualState};
use crate::core::scene::Scene;
use crate::input::queue::{Buttons, InputState};

/// Reset strength to base and forget last tick's support.
pub fn begin_tick(scene: &mut Scene) {
    for e in scene.iter_mut().filter(|e| e.kind.is_mover()) {
        e.reset_strength();
        e.on_block = None;
    }
}

pub fn apply_gravity(scene: &mut Scene, config: &SimConfig) {
    for e in scene.iter_mut().filter(|e| e.kind.has_gravity()) {
        e.vel.y += config.gravity;
    }
}

/// First ladder whose hitbox overlaps the entity.
fn overlapped_ladder(scene: &Scene, entity: &Entity) -> Option<(EntityId, f32)> {
    scene
        .iter()
        .filter(|l| l.kind == EntityKind::Ladder)
        .find(|l| entity.overlaps(l))
        .map(|l| (l.id, l.bounds().t))
}

/// Ladder handling and horizontal input for Players, ladder pinning for
/// PushBlocks.
pub fn apply_ladders_and_input(scene: &mut Scene, config: &SimConfig, input: &InputState) {
    let ids: Vec<EntityId> = scene
        .iter()
        .filter(|e| e.kind.has_gravity())
        .map(|e| e.id)
        .collect();

    for id in ids {
        let Some(entity) = scene.get(id) else {
            continue;
        };
        let ladder = overlapped_ladder(scene, entity);
        let Some(e) = scene.get_mut(id) else {
            continue;
        };
        e.in_ladder = ladder.map(|(ladder_id, _)| ladder_id);

        match e.kind {
            EntityKind::Player => {
                if let Some((_, ladder_top)) = ladder {
                    climb(e, config, input, ladder_top);
                }
                walk(e, config, input);
            }
            EntityKind::PushBlock => {
                if ladder.is_some() {
                    e.vel.y = 0.0;
                }
            }
            _ => {}
        }
    }
}

fn climb(e: &mut Entity, config: &SimConfig, input: &InputState, ladder_top: f32) {
    let up = input.is_held(Buttons::UP);
    let down = input.is_held(Buttons::DOWN);
    e.vel.y = match (up, down) {
        (true, true) | (false, false) => 0.0,
        (false, true) => config.climb_speed,
        (true, false) => {
            let bottom = e.bounds().b;
            if bottom - config.climb_speed <= ladder_top {
                // Step off onto the ladder top.
                e.pos.y = ladder_top - (bottom - e.pos.y);
                0.0
            } else {
                -config.climb_speed
            }
        }
    };
}

fn walk(e: &mut Entity, config: &SimConfig, input: &InputState) {
    let left = input.is_held(Buttons::LEFT);
    let right = input.is_held(Buttons::RIGHT);
    e.vel.x = match (left, right) {
        (true, false) => {
            e.facing_left = true;
            -config.walk_speed
        }
        (false, true) => {
            e.facing_left = false;
            config.walk_speed
        }
        _ => 0.0,
    };
}

/// MoveBlocks travel along their facing while activated.
pub fn drive_move_blocks(scene: &mut Scene, config: &SimConfig) {
    for e in scene.iter_mut().filter(|e| e.kind == EntityKind::MoveBlock) {
        let activated = e.drive.is_some_and(|d| d.activated);
        e.vel = if activated {
            e.angle.facing().unit() * config.move_block_speed
        } else {
            glam::Vec2::ZERO
        };
    }
}

/// Apply the jump impulse if the Player stands on something and up was
/// just pressed. Returns whether it jumped.
pub fn try_jump(e: &mut Entity, config: &SimConfig, input: &InputState) -> bool {
    if e.kind != EntityKind::Player || e.on_block.is_none() || !input.was_just_pressed(Buttons::UP) {
        return false;
    }
    e.vel.y = config.jump_speed;
    e.strength.top = e.init_strength;
    e.on_block = None;
    true
}

/// Pick the Player's animation tag from this tick's state.
pub fn update_player_visual(e: &mut Entity, input: &InputState) {
    e.visual = if e.in_ladder.is_some() {
        if input.is_held(Buttons::UP) || input.is_held(Buttons::DOWN) {
            VisualState::LadderMove
        } else {
            VisualState::LadderIdle
        }
    } else if e.on_block.is_none() {
        if e.vel.y < 0.0 {
            VisualState::Jump
        } else {
            VisualState::Fall
        }
    } else if e.vel.x != 0.0 {
        VisualState::Walk
    } else {
        VisualState::Idle
    };
}
