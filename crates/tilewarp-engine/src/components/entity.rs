use std::str::FromStr;

use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::error::StageError;
use crate::api::types::{Angle, Color, Direction, EntityId};
use crate::components::hitbox::BoxSet;
use crate::components::strength::Strength;
use crate::core::geometry::{Aabb, Rect};

/// Every kind of stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Block,
    Ladder,
    Key,
    Oneway,
    Lever,
    Portal,
    PushBlock,
    Button,
    MoveBlock,
}

impl EntityKind {
    /// Kinds that take part in the relaxation passes.
    pub fn is_mover(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::PushBlock | EntityKind::MoveBlock)
    }

    pub fn has_gravity(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::PushBlock)
    }

    /// Kinds whose colour ties them into `activate`.
    pub fn is_colored(self) -> bool {
        matches!(
            self,
            EntityKind::Block
                | EntityKind::Key
                | EntityKind::Oneway
                | EntityKind::Lever
                | EntityKind::Button
                | EntityKind::MoveBlock
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Block => "block",
            EntityKind::Ladder => "ladder",
            EntityKind::Key => "key",
            EntityKind::Oneway => "oneway",
            EntityKind::Lever => "lever",
            EntityKind::Portal => "portal",
            EntityKind::PushBlock => "push_block",
            EntityKind::Button => "button",
            EntityKind::MoveBlock => "move_block",
        }
    }

    /// Stable numeric code for the flat render buffer.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Base strength from the config tier of this kind.
    pub fn base_strength(self, config: &SimConfig) -> f32 {
        match self {
            EntityKind::Player => config.player_strength,
            EntityKind::Block | EntityKind::Ladder | EntityKind::Oneway => config.block_strength,
            EntityKind::PushBlock => config.push_block_strength,
            EntityKind::MoveBlock => config.move_block_strength,
            EntityKind::Key | EntityKind::Lever | EntityKind::Portal | EntityKind::Button => {
                config.trigger_strength
            }
        }
    }

    fn solid_by_default(self) -> bool {
        matches!(
            self,
            EntityKind::Player
                | EntityKind::Block
                | EntityKind::Oneway
                | EntityKind::PushBlock
                | EntityKind::MoveBlock
        )
    }
}

impl FromStr for EntityKind {
    type Err = StageError;

    /// Case-insensitive; `push_block`, `PushBlock` and `pushblock` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let kind = match normalized.as_str() {
            "player" => EntityKind::Player,
            "block" => EntityKind::Block,
            "ladder" => EntityKind::Ladder,
            "key" => EntityKind::Key,
            "oneway" => EntityKind::Oneway,
            "lever" => EntityKind::Lever,
            "portal" => EntityKind::Portal,
            "pushblock" => EntityKind::PushBlock,
            "button" => EntityKind::Button,
            "moveblock" => EntityKind::MoveBlock,
            _ => return Err(StageError::UnknownKind { kind: s.to_string() }),
        };
        Ok(kind)
    }
}

/// Texture/animation tag a renderer selects frames by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisualState {
    #[default]
    Default,
    /// A Block that is currently not solid.
    Inactive,
    Idle,
    Walk,
    Jump,
    Fall,
    LadderMove,
    LadderIdle,
    On,
    Off,
    Pressed,
    Released,
}

impl VisualState {
    /// Stable numeric code for the flat render buffer.
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Portal pairing. `partner` is resolved once all portals are spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalLink {
    pub pair_id: String,
    pub partner: Option<EntityId>,
}

/// Lever and Button state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerState {
    /// Lever: a Player overlapped it last tick.
    pub contacting: bool,
    /// Lever: switched on. Button: pressed.
    pub on: bool,
}

/// MoveBlock drive toggle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Drive {
    pub activated: bool,
}

/// One stage object: a kind tag plus the capability records that kind uses.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Top-left corner in grid units.
    pub pos: Vec2,
    /// Tile footprint. Never changes after spawn.
    pub size: Vec2,
    pub angle: Angle,
    /// Grid units per tick.
    pub vel: Vec2,
    pub boxes: BoxSet,
    pub solid: bool,
    pub init_strength: f32,
    pub strength: Strength,
    pub on_block: Option<EntityId>,
    pub in_ladder: Option<EntityId>,
    pub in_portal: Option<EntityId>,
    /// Portals whose planes this entity currently straddles.
    pub moving_in_portals: Vec<EntityId>,
    pub color: Option<Color>,
    pub portal: Option<PortalLink>,
    pub trigger: Option<TriggerState>,
    pub drive: Option<Drive>,
    /// Player facing, flipped by horizontal input.
    pub facing_left: bool,
    pub visual: VisualState,
}

impl Entity {
    /// Build an entity with the default boxes, strength and capabilities of `kind`.
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, size: Vec2, angle: Angle, config: &SimConfig) -> Self {
        let init_strength = kind.base_strength(config);
        let mut entity = Self {
            id,
            kind,
            pos,
            size,
            angle,
            vel: Vec2::ZERO,
            boxes: BoxSet::new(),
            solid: kind.solid_by_default(),
            init_strength,
            strength: Strength::uniform(init_strength),
            on_block: None,
            in_ladder: None,
            in_portal: None,
            moving_in_portals: Vec::new(),
            color: None,
            portal: None,
            trigger: None,
            drive: None,
            facing_left: false,
            visual: VisualState::Default,
        };
        entity.boxes.add_hitbox(entity.default_hitbox(config), entity.default_corner_len(config));
        entity.boxes.add_sprite(Rect::from_size(size));
        match kind {
            EntityKind::Player => entity.visual = VisualState::Idle,
            EntityKind::Lever => {
                entity.trigger = Some(TriggerState::default());
                entity.visual = VisualState::Off;
            }
            EntityKind::Button => {
                entity.trigger = Some(TriggerState::default());
                entity.visual = VisualState::Released;
            }
            EntityKind::MoveBlock => entity.drive = Some(Drive::default()),
            _ => {}
        }
        entity
    }

    // -- Builder pattern --

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.set_solid(solid);
        self
    }

    pub fn with_pair_id(mut self, pair_id: impl Into<String>) -> Self {
        self.portal = Some(PortalLink {
            pair_id: pair_id.into(),
            partner: None,
        });
        self
    }

    fn default_corner_len(&self, config: &SimConfig) -> f32 {
        if self.kind.is_mover() {
            config.mover_corner_len
        } else {
            0.0
        }
    }

    fn default_hitbox(&self, config: &SimConfig) -> Rect {
        let (w, h) = (self.size.x, self.size.y);
        match self.kind {
            EntityKind::Key | EntityKind::Lever => {
                let inset = config.trigger_inset;
                Rect::new(inset, inset, w - 2.0 * inset, h - 2.0 * inset)
            }
            // The core trigger: a point at the tile centre.
            EntityKind::Portal => Rect::new(w * 0.5, h * 0.5, 0.0, 0.0),
            // The plate sits on the side opposite the facing.
            EntityKind::Button => {
                let p = config.button_plate;
                match self.angle.facing() {
                    Direction::Up => Rect::new(0.0, h - p, w, p),
                    Direction::Down => Rect::new(0.0, 0.0, w, p),
                    Direction::Left => Rect::new(w - p, 0.0, p, h),
                    Direction::Right => Rect::new(0.0, 0.0, p, h),
                }
            }
            _ => Rect::from_size(self.size),
        }
    }

    pub fn set_solid(&mut self, solid: bool) {
        self.solid = solid;
        if self.kind == EntityKind::Block {
            self.visual = if solid { VisualState::Default } else { VisualState::Inactive };
        }
    }

    /// The full tile rectangle in absolute coordinates.
    pub fn tile(&self) -> Aabb {
        Rect::from_size(self.size).at(self.pos)
    }

    /// Union of the active hitboxes, falling back to the tile.
    pub fn bounds(&self) -> Aabb {
        self.boxes.bounds(self.pos).unwrap_or_else(|| self.tile())
    }

    /// Strict overlap between any pair of active hitboxes.
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.boxes.hitboxes().any(|(_, a)| {
            let a = a.at(self.pos);
            other.boxes.hitboxes().any(|(_, b)| a.overlaps(&b.at(other.pos)))
        })
    }

    pub fn has_color(&self, color: &Color) -> bool {
        self.color.as_ref() == Some(color)
    }

    /// Paired portal, once resolved.
    pub fn partner(&self) -> Option<EntityId> {
        self.portal.as_ref().and_then(|p| p.partner)
    }

    pub fn reset_strength(&mut self) {
        self.strength = Strength::uniform(self.init_strength);
    }
}
