use std::collections::BTreeMap;

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::config::SimConfig;
use crate::api::error::StageError;
use crate::api::game::Simulation;
use crate::api::types::{Angle, Color, EntityId};
use crate::components::entity::{Entity, EntityKind};

/// A decoded stage: the ordered spawn list plus an optional hint line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageData {
    /// Text the UI shows while the stage is played.
    #[serde(default)]
    pub hint: Option<String>,
    pub entities: Vec<SpawnRecord>,
}

/// One stage object in grid units, already converted from the tile editor
/// format (top-left corner, size after rotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Degrees; one of 0, 90, 180, -90 (270 is accepted).
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub color: Option<String>,
    /// Portal pair identifier.
    #[serde(default)]
    pub pair_id: Option<String>,
    /// Overrides the kind's default solidity (a Block that starts open).
    #[serde(default)]
    pub solid: Option<bool>,
}

impl SpawnRecord {
    pub fn new(kind: impl Into<String>, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            kind: kind.into(),
            x,
            y,
            w,
            h,
            rotation: 0,
            color: None,
            pair_id: None,
            solid: None,
        }
    }

    /// Build the entity for this record. `index` is the record's position in
    /// the stage list, for error reporting.
    pub fn to_entity(&self, id: EntityId, index: usize, config: &SimConfig) -> Result<Entity, StageError> {
        let kind: EntityKind = self.kind.parse()?;
        let angle = Angle::from_degrees(self.rotation).ok_or(StageError::InvalidRotation {
            rotation: self.rotation,
        })?;
        let mut entity = Entity::new(
            id,
            kind,
            Vec2::new(self.x, self.y),
            Vec2::new(self.w, self.h),
            angle,
            config,
        );
        if kind.is_colored() {
            if let Some(color) = &self.color {
                entity = entity.with_color(Color::new(color.clone()));
            }
        }
        if kind == EntityKind::Portal {
            let pair_id = self.pair_id.as_ref().ok_or(StageError::MissingPairId { index })?;
            entity = entity.with_pair_id(pair_id.clone());
        }
        if let Some(solid) = self.solid {
            entity = entity.with_solid(solid);
        }
        Ok(entity)
    }
}

impl StageData {
    /// Parse a stage from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Stage number → stage JSON. Loading falls back to the default stage when
/// the requested one is missing or does not parse.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    stages: BTreeMap<u32, String>,
    default_stage: u32,
}

impl StageCatalog {
    /// An empty catalog whose fallback is `default_stage`.
    pub fn new(default_stage: u32) -> Self {
        Self {
            stages: BTreeMap::new(),
            default_stage,
        }
    }

    /// A catalog holding the bundled first stage.
    pub fn builtin() -> Self {
        let mut catalog = Self::new(1);
        catalog.insert(1, include_str!("../../stages/stage1.json"));
        catalog
    }

    pub fn insert(&mut self, number: u32, json: impl Into<String>) {
        self.stages.insert(number, json.into());
    }

    pub fn contains(&self, number: u32) -> bool {
        self.stages.contains_key(&number)
    }

    pub fn default_stage(&self) -> u32 {
        self.default_stage
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Decode one stage without falling back.
    pub fn stage_data(&self, number: u32) -> Result<StageData, StageError> {
        let json = self
            .stages
            .get(&number)
            .ok_or(StageError::MissingStage { index: number })?;
        Ok(StageData::from_json(json)?)
    }

    /// Load stage `number`, or the default stage if its data is missing or
    /// malformed. Returns the stage number actually loaded.
    ///
    /// Construction errors (unknown kind, bad portal pairing) are never
    /// papered over by the fallback.
    pub fn load(&self, number: u32, config: &SimConfig) -> Result<(u32, Simulation), StageError> {
        let (loaded, data) = match self.stage_data(number) {
            Ok(data) => (number, data),
            Err(err) => {
                warn!("stage {number} unavailable ({err}), loading stage {}", self.default_stage);
                (self.default_stage, self.stage_data(self.default_stage)?)
            }
        };
        let sim = Simulation::from_stage(&data, config.clone())?;
        Ok((loaded, sim))
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
