use log::{debug, warn};

use crate::api::game::Simulation;
use crate::api::types::{Color, Direction, EntityId, SimEvent};
use crate::components::entity::{Entity, EntityKind, VisualState};

const PLATE_TOLERANCE: f32 = 1e-6;

/// Keys, levers and buttons, in that order.
pub fn update_triggers(sim: &mut Simulation) {
    collect_keys(sim);
    update_levers(sim);
    update_buttons(sim);
}

fn touched_by_player(sim: &Simulation, trigger: &Entity) -> bool {
    sim.scene
        .iter()
        .filter(|e| e.kind == EntityKind::Player)
        .any(|p| p.overlaps(trigger))
}

/// A Key overlapped by any Player is consumed and fires its colour.
pub fn collect_keys(sim: &mut Simulation) {
    let taken: Vec<(EntityId, Option<Color>)> = sim
        .scene
        .iter()
        .filter(|k| k.kind == EntityKind::Key)
        .filter(|k| touched_by_player(sim, k))
        .map(|k| (k.id, k.color.clone()))
        .collect();

    for (key, color) in taken {
        sim.despawn(key);
        debug!("key {} collected", key.0);
        match color {
            Some(color) => {
                sim.emit(SimEvent::KeyCollected {
                    key,
                    color: color.clone(),
                });
                activate(sim, &color);
            }
            None => {
                warn!("key {} has no colour; removed without effect", key.0);
                sim.emit(SimEvent::Removed { entity: key });
            }
        }
    }
}

/// Levers flip once per continuous Player overlap.
pub fn update_levers(sim: &mut Simulation) {
    let levers: Vec<(EntityId, bool)> = sim
        .scene
        .iter()
        .filter(|l| l.kind == EntityKind::Lever)
        .map(|l| (l.id, touched_by_player(sim, l)))
        .collect();

    for (id, touching) in levers {
        let Some(lever) = sim.scene.get_mut(id) else {
            continue;
        };
        let state = lever.trigger.get_or_insert_with(Default::default);
        let fired = touching && !state.contacting;
        state.contacting = touching;
        if !fired {
            continue;
        }
        state.on = !state.on;
        let on = state.on;
        lever.visual = if on { VisualState::On } else { VisualState::Off };
        let color = lever.color.clone();
        debug!("lever {} switched {}", id.0, if on { "on" } else { "off" });
        sim.emit(SimEvent::LeverToggled { lever: id, on });
        if let Some(color) = color {
            activate(sim, &color);
        }
    }
}

/// Whether `mover` rests against the plate of `button`.
///
/// The mover travels against the button's facing; its leading edge must lie
/// between the plate face and the button's back edge, with inner lateral
/// overlap.
fn presses(button: &Entity, mover: &Entity) -> bool {
    let facing = button.angle.facing();
    let travel = facing.opposite();
    let tile = button.tile();
    let back = tile.edge(travel.leading_side());
    button.boxes.hitboxes().any(|(_, plate)| {
        let plate = plate.at(button.pos);
        let face = plate.edge(facing.leading_side());
        let (lo, hi) = (face.min(back) - PLATE_TOLERANCE, face.max(back) + PLATE_TOLERANCE);
        mover.boxes.hitboxes().any(|(_, m)| {
            let outer = m.at(mover.pos);
            let inner = m.inner_at(mover.pos);
            let edge = outer.edge(travel.leading_side());
            let lateral = match travel {
                Direction::Up | Direction::Down => inner.l < plate.r && inner.r > plate.l,
                Direction::Left | Direction::Right => inner.t < plate.b && inner.b > plate.t,
            };
            lateral && edge >= lo && edge <= hi
        })
    })
}

/// Buttons follow whether any mover rests on them, firing on each change.
pub fn update_buttons(sim: &mut Simulation) {
    let changes: Vec<(EntityId, bool)> = sim
        .scene
        .iter()
        .filter(|b| b.kind == EntityKind::Button)
        .filter_map(|b| {
            let pressed = sim
                .scene
                .iter()
                .filter(|m| m.kind.is_mover())
                .any(|m| presses(b, m));
            let was = b.trigger.is_some_and(|t| t.on);
            (pressed != was).then_some((b.id, pressed))
        })
        .collect();

    for (id, pressed) in changes {
        let Some(button) = sim.scene.get_mut(id) else {
            continue;
        };
        button.trigger.get_or_insert_with(Default::default).on = pressed;
        button.visual = if pressed { VisualState::Pressed } else { VisualState::Released };
        let color = button.color.clone();
        debug!("button {} {}", id.0, if pressed { "pressed" } else { "released" });
        sim.emit(SimEvent::ButtonChanged { button: id, pressed });
        if let Some(color) = color {
            activate(sim, &color);
        }
    }
}

/// Toggle everything of `color`: Blocks flip solidity, Oneways swap their
/// passable face, MoveBlocks start or stop.
pub fn activate(sim: &mut Simulation, color: &Color) {
    debug!("activate {}", color.0);
    for e in sim.scene.iter_mut().filter(|e| e.has_color(color)) {
        match e.kind {
            EntityKind::Block => {
                let solid = !e.solid;
                e.set_solid(solid);
            }
            EntityKind::Oneway => {
                // Shift by the surface's own thickness so it stays on the
                // same tile edge, then turn it around.
                match e.angle.facing() {
                    Direction::Up => e.pos.y -= e.size.y,
                    Direction::Down => e.pos.y += e.size.y,
                    Direction::Right => e.pos.x += e.size.x,
                    Direction::Left => e.pos.x -= e.size.x,
                }
                e.angle = e.angle.reversed();
            }
            EntityKind::MoveBlock => {
                let drive = e.drive.get_or_insert_with(Default::default);
                drive.activated = !drive.activated;
            }
            _ => {}
        }
    }
    sim.emit(SimEvent::Activated { color: color.clone() });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Angle;
    use glam::Vec2;

    fn red() -> Color {
        Color::new("#e04040")
    }

    fn spawn(sim: &mut Simulation, kind: EntityKind, pos: Vec2, size: Vec2, angle: Angle) -> EntityId {
        sim.spawn_kind(kind, pos, size, angle)
    }

    fn paint(sim: &mut Simulation, id: EntityId) {
        sim.entity_mut(id).unwrap().color = Some(red());
    }

    #[test]
    fn key_is_consumed_and_toggles_block() {
        let mut sim = Simulation::default();
        spawn(&mut sim, EntityKind::Player, Vec2::new(3.0, 3.0), Vec2::ONE, Angle::Deg0);
        let key = spawn(&mut sim, EntityKind::Key, Vec2::new(3.5, 3.0), Vec2::ONE, Angle::Deg0);
        let block = spawn(&mut sim, EntityKind::Block, Vec2::new(8.0, 3.0), Vec2::ONE, Angle::Deg0);
        paint(&mut sim, key);
        paint(&mut sim, block);

        update_triggers(&mut sim);
        assert!(sim.entity(key).is_none());
        assert!(!sim.entity(block).unwrap().solid);
        assert_eq!(sim.entity(block).unwrap().visual, VisualState::Inactive);
        assert!(sim
            .events()
            .contains(&SimEvent::KeyCollected { key, color: red() }));
    }

    #[test]
    fn key_out_of_reach_stays() {
        let mut sim = Simulation::default();
        spawn(&mut sim, EntityKind::Player, Vec2::new(3.0, 3.0), Vec2::ONE, Angle::Deg0);
        // Touches the tile but not the inset trigger box.
        let key = spawn(&mut sim, EntityKind::Key, Vec2::new(3.9, 3.0), Vec2::ONE, Angle::Deg0);
        update_triggers(&mut sim);
        assert!(sim.entity(key).is_some());
    }

    #[test]
    fn colourless_key_reports_its_removal() {
        let mut sim = Simulation::default();
        spawn(&mut sim, EntityKind::Player, Vec2::new(3.0, 3.0), Vec2::ONE, Angle::Deg0);
        let key = spawn(&mut sim, EntityKind::Key, Vec2::new(3.5, 3.0), Vec2::ONE, Angle::Deg0);
        let block = spawn(&mut sim, EntityKind::Block, Vec2::new(8.0, 3.0), Vec2::ONE, Angle::Deg0);
        paint(&mut sim, block);

        update_triggers(&mut sim);
        assert!(sim.entity(key).is_none());
        assert!(sim.entity(block).unwrap().solid);
        assert_eq!(sim.events(), &[SimEvent::Removed { entity: key }]);
    }

    #[test]
    fn lever_is_edge_triggered() {
        let mut sim = Simulation::default();
        let player = spawn(&mut sim, EntityKind::Player, Vec2::new(3.0, 3.0), Vec2::ONE, Angle::Deg0);
        let lever = spawn(&mut sim, EntityKind::Lever, Vec2::new(3.0, 3.0), Vec2::ONE, Angle::Deg0);
        let block = spawn(&mut sim, EntityKind::Block, Vec2::new(8.0, 3.0), Vec2::ONE, Angle::Deg0);
        paint(&mut sim, lever);
        paint(&mut sim, block);

        update_triggers(&mut sim);
        assert_eq!(sim.entity(lever).unwrap().visual, VisualState::On);
        assert!(!sim.entity(block).unwrap().solid);

        // Standing still on the lever does nothing more.
        update_triggers(&mut sim);
        assert!(!sim.entity(block).unwrap().solid);

        sim.entity_mut(player).unwrap().pos.x = 6.0;
        update_triggers(&mut sim);
        sim.entity_mut(player).unwrap().pos.x = 3.0;
        update_triggers(&mut sim);
        assert_eq!(sim.entity(lever).unwrap().visual, VisualState::Off);
        assert!(sim.entity(block).unwrap().solid);
    }

    #[test]
    fn button_fires_on_press_and_release() {
        let mut sim = Simulation::default();
        let button = spawn(&mut sim, EntityKind::Button, Vec2::new(5.0, 10.0), Vec2::ONE, Angle::Deg0);
        let mover = spawn(&mut sim, EntityKind::PushBlock, Vec2::new(5.0, 9.75), Vec2::ONE, Angle::Deg0);
        let gate = spawn(&mut sim, EntityKind::MoveBlock, Vec2::new(1.0, 1.0), Vec2::ONE, Angle::Deg90);
        paint(&mut sim, button);
        paint(&mut sim, gate);

        update_triggers(&mut sim);
        assert_eq!(sim.entity(button).unwrap().visual, VisualState::Pressed);
        assert!(sim.entity(gate).unwrap().drive.unwrap().activated);

        update_triggers(&mut sim);
        assert!(sim.entity(gate).unwrap().drive.unwrap().activated);

        sim.entity_mut(mover).unwrap().pos.x = 7.0;
        update_triggers(&mut sim);
        assert_eq!(sim.entity(button).unwrap().visual, VisualState::Released);
        assert!(!sim.entity(gate).unwrap().drive.unwrap().activated);
        let changes = sim
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::ButtonChanged { .. }))
            .count();
        assert_eq!(changes, 2);
    }

    #[test]
    fn hovering_above_the_plate_does_not_press() {
        let mut sim = Simulation::default();
        let button = spawn(&mut sim, EntityKind::Button, Vec2::new(5.0, 10.0), Vec2::ONE, Angle::Deg0);
        spawn(&mut sim, EntityKind::Player, Vec2::new(5.0, 9.5), Vec2::ONE, Angle::Deg0);
        update_triggers(&mut sim);
        assert_eq!(sim.entity(button).unwrap().visual, VisualState::Released);
    }

    #[test]
    fn oneway_swaps_side_on_activate() {
        let mut sim = Simulation::default();
        let oneway = spawn(&mut sim, EntityKind::Oneway, Vec2::new(4.0, 6.0), Vec2::new(1.0, 0.25), Angle::Deg0);
        paint(&mut sim, oneway);
        activate(&mut sim, &red());
        let e = sim.entity(oneway).unwrap();
        assert_eq!(e.angle, Angle::Deg180);
        assert_eq!(e.pos, Vec2::new(4.0, 5.75));

        activate(&mut sim, &red());
        let e = sim.entity(oneway).unwrap();
        assert_eq!(e.angle, Angle::Deg0);
        assert_eq!(e.pos, Vec2::new(4.0, 6.0));
    }

    #[test]
    fn other_colours_are_untouched() {
        let mut sim = Simulation::default();
        let block = spawn(&mut sim, EntityKind::Block, Vec2::new(4.0, 6.0), Vec2::ONE, Angle::Deg0);
        sim.entity_mut(block).unwrap().color = Some(Color::new("#4040e0"));
        activate(&mut sim, &red());
        assert!(sim.entity(block).unwrap().solid);
        assert_eq!(sim.events(), &[SimEvent::Activated { color: red() }]);
    }
}
