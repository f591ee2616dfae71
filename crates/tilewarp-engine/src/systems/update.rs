//! One fixed simulation tick.

use log::{debug, info};

use crate::api::game::Simulation;
use crate::api::types::{Direction, EntityId, SimEvent};
use crate::components::entity::EntityKind;
use crate::core::physics::{apply_contact, Resolver};
use crate::input::queue::{Buttons, InputState};
use crate::systems::{movement, portal, triggers};

impl Simulation {
    /// Advance the stage by one fixed tick.
    ///
    /// `input` is only read; clearing its just-pressed flags is the caller's
    /// job once the tick has run.
    pub fn tick(&mut self, input: &InputState) {
        if self.is_complete() {
            return;
        }
        movement::begin_tick(&mut self.scene);
        movement::apply_gravity(&mut self.scene, &self.config);
        movement::apply_ladders_and_input(&mut self.scene, &self.config, input);
        portal::update_portals(self);
        movement::drive_move_blocks(&mut self.scene, &self.config);
        self.relax(input);
        self.final_player_pass(input);
        self.integrate();
        triggers::update_triggers(self);
        self.advance_tick_count();
    }

    /// Resolve one mover in one direction and write the result back.
    fn resolve_and_apply(&mut self, id: EntityId, dir: Direction, down_held: bool) {
        let contact = Resolver::new(&self.scene, &self.config, down_held).resolve(id, dir);
        if let (Some(contact), Some(entity)) = (contact, self.scene.get_mut(id)) {
            apply_contact(entity, &contact);
        }
    }

    /// Fixed-point relaxation over all movers. The pass count equals the
    /// mover count; longer push chains may not fully settle.
    fn relax(&mut self, input: &InputState) {
        let movers = self.scene.mover_ids();
        let down_held = input.is_held(Buttons::DOWN);
        let mut jumped: Vec<EntityId> = Vec::new();

        for _ in 0..movers.len() {
            for &id in &movers {
                self.resolve_and_apply(id, Direction::Down, down_held);
                if !jumped.contains(&id) {
                    let config = &self.config;
                    if let Some(e) = self.scene.get_mut(id) {
                        if movement::try_jump(e, config, input) {
                            jumped.push(id);
                        }
                    }
                }
                for dir in [Direction::Up, Direction::Left, Direction::Right] {
                    self.resolve_and_apply(id, dir, down_held);
                }
            }
        }
    }

    /// Last ceiling check for Players, then their animation tag.
    fn final_player_pass(&mut self, input: &InputState) {
        let down_held = input.is_held(Buttons::DOWN);
        for id in self.scene.ids_of(EntityKind::Player) {
            self.resolve_and_apply(id, Direction::Up, down_held);
            if let Some(e) = self.scene.get_mut(id) {
                movement::update_player_visual(e, input);
            }
        }
    }

    /// Move every mover by its velocity and drop those that left the map.
    fn integrate(&mut self) {
        let map_len = self.config.map_len;
        let mut gone: Vec<(EntityId, EntityKind)> = Vec::new();
        for e in self.scene.iter_mut().filter(|e| e.kind.is_mover()) {
            e.pos += e.vel;
            if e.bounds().outside_square(map_len) {
                gone.push((e.id, e.kind));
            }
        }

        for (id, kind) in gone {
            self.despawn(id);
            debug!("entity {} left the map", id.0);
            self.emit(SimEvent::Removed { entity: id });
            if kind == EntityKind::Player && self.players_remaining() == 0 && !self.is_complete() {
                info!("stage complete after {} ticks", self.tick_count() + 1);
                self.mark_complete();
                self.emit(SimEvent::StageComplete);
            }
        }
    }
}
