use std::collections::BTreeMap;

use glam::Vec2;
use log::info;

use crate::api::config::SimConfig;
use crate::api::error::StageError;
use crate::api::types::{Angle, EntityId, SimEvent};
use crate::assets::stage::StageData;
use crate::components::entity::{Entity, EntityKind};
use crate::core::scene::Scene;

/// The simulation context: everything one loaded stage needs between ticks.
///
/// Owned by the caller; input is passed into [`Simulation::tick`] by shared
/// reference, and the renderer reads the scene after each tick.
pub struct Simulation {
    pub config: SimConfig,
    pub scene: Scene,
    events: Vec<SimEvent>,
    hint: Option<String>,
    complete: bool,
    tick_count: u64,
    next_id: u32,
}

impl Simulation {
    /// An empty map.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            scene: Scene::new(),
            events: Vec::new(),
            hint: None,
            complete: false,
            tick_count: 0,
            next_id: 1,
        }
    }

    /// Build a stage from decoded spawn records. Any bad record aborts the
    /// whole load; no partial stage is returned.
    pub fn from_stage(stage: &StageData, config: SimConfig) -> Result<Self, StageError> {
        let mut sim = Self::new(config);
        sim.hint = stage.hint.clone();
        for (index, record) in stage.entities.iter().enumerate() {
            let id = sim.next_id();
            let entity = record.to_entity(id, index, &sim.config)?;
            sim.scene.spawn(entity);
        }
        sim.link_portals()?;
        info!(
            "stage loaded: {} entities, {} players, {} portals",
            sim.scene.len(),
            sim.scene.count(EntityKind::Player),
            sim.scene.count(EntityKind::Portal),
        );
        Ok(sim)
    }

    /// Pair every portal with the one other portal sharing its id.
    pub fn link_portals(&mut self) -> Result<(), StageError> {
        let mut pairs: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for e in self.scene.iter().filter(|e| e.kind == EntityKind::Portal) {
            if let Some(link) = &e.portal {
                pairs.entry(link.pair_id.clone()).or_default().push(e.id);
            }
        }
        for (pair_id, ids) in pairs {
            let &[a, b] = ids.as_slice() else {
                return Err(StageError::PortalPairing {
                    pair_id,
                    count: ids.len(),
                });
            };
            for (id, partner) in [(a, b), (b, a)] {
                if let Some(link) = self.scene.get_mut(id).and_then(|e| e.portal.as_mut()) {
                    link.partner = Some(partner);
                }
            }
        }
        Ok(())
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn an already-built entity.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.scene.spawn(entity);
        id
    }

    /// Spawn an entity of `kind` with default capabilities.
    pub fn spawn_kind(&mut self, kind: EntityKind, pos: Vec2, size: Vec2, angle: Angle) -> EntityId {
        let id = self.next_id();
        let entity = Entity::new(id, kind, pos, size, angle, &self.config);
        self.scene.spawn(entity);
        id
    }

    /// Remove an entity immediately. Its boxes go with it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.scene.despawn(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.scene.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.scene.get_mut(id)
    }

    /// Record an event for the UI/audio collaborators.
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events since the last [`Simulation::clear_frame_data`].
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Clear per-frame transient data.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Whether the last Player has left the map.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn players_remaining(&self) -> usize {
        self.scene.count(EntityKind::Player)
    }

    /// Ticks simulated since load.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub(crate) fn advance_tick_count(&mut self) {
        self.tick_count += 1;
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
