//! Per-entity box arena.
//!
//! Every entity owns its collision boxes, its portal marker boxes and its
//! sprite cut-outs in one [`BoxSet`]. Boxes refer to each other only through
//! [`BoxKey`] handles, so the counterpart links the portal system creates
//! (original ↔ counterpart, plus the marker pair) never form owning cycles.

use glam::Vec2;
use slotmap::{new_key_type, SlotMap};

use crate::api::types::{Direction, EntityId};
use crate::core::geometry::{Aabb, Rect};

new_key_type! {
    /// Handle to a box inside one entity's [`BoxSet`].
    pub struct BoxKey;
}

/// What a box is used for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxRole {
    /// Physical collision box with a corner-correction shrink.
    Hit { corner_len: f32 },
    /// Zero-size portal bookkeeping anchor. Invisible to ordinary solids.
    Marker,
    /// Visual clip region. `origin` is the undistorted source rectangle the
    /// texture is sampled against.
    Sprite { origin: Rect },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxRect {
    /// Owner-relative rectangle.
    pub rel: Rect,
    pub role: BoxRole,
    /// Portal twin in each travel direction, indexed by [`Direction::index`].
    pub counterpart: [Option<BoxKey>; 4],
}

impl BoxRect {
    fn new(rel: Rect, role: BoxRole) -> Self {
        Self {
            rel,
            role,
            counterpart: [None; 4],
        }
    }

    pub fn at(&self, owner: Vec2) -> Aabb {
        self.rel.at(owner)
    }

    pub fn corner_len(&self) -> f32 {
        match self.role {
            BoxRole::Hit { corner_len } => corner_len,
            _ => 0.0,
        }
    }

    /// Absolute rectangle shrunk by the corner length.
    pub fn inner_at(&self, owner: Vec2) -> Aabb {
        self.at(owner).inner(self.corner_len())
    }

    pub fn counterpart(&self, dir: Direction) -> Option<BoxKey> {
        self.counterpart[dir.index()]
    }

    pub fn is_linked(&self) -> bool {
        self.counterpart.iter().any(Option::is_some)
    }

    /// Texture sub-rectangle `[u0, v0, u1, v1]` of a sprite box, relative to
    /// its origin. Non-sprite boxes map to the full texture.
    pub fn uv(&self) -> [f32; 4] {
        let BoxRole::Sprite { origin } = self.role else {
            return [0.0, 0.0, 1.0, 1.0];
        };
        if origin.w <= 0.0 || origin.h <= 0.0 {
            return [0.0, 0.0, 1.0, 1.0];
        }
        [
            (self.rel.x - origin.x) / origin.w,
            (self.rel.y - origin.y) / origin.h,
            (self.rel.right() - origin.x) / origin.w,
            (self.rel.bottom() - origin.y) / origin.h,
        ]
    }
}

/// An active portal split of one box.
///
/// `base` is the box's rectangle before splitting; the original box holds
/// the part still on the entrance side and `counterpart` the part that has
/// crossed, translated to the exit side.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSplit {
    pub portal: EntityId,
    pub exit: EntityId,
    /// Travel direction through the entrance mouth.
    pub direction: Direction,
    pub original: BoxKey,
    pub counterpart: BoxKey,
    pub base: Rect,
    /// Entrance and exit plane markers. Only hitbox splits carry them.
    pub markers: Option<[BoxKey; 2]>,
}

#[derive(Debug, Clone, Default)]
pub struct BoxSet {
    arena: SlotMap<BoxKey, BoxRect>,
    hitboxes: Vec<BoxKey>,
    hidden: Vec<BoxKey>,
    sprites: Vec<BoxKey>,
    splits: Vec<PortalSplit>,
}

impl BoxSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hitbox(&mut self, rel: Rect, corner_len: f32) -> BoxKey {
        let key = self.arena.insert(BoxRect::new(rel, BoxRole::Hit { corner_len }));
        self.hitboxes.push(key);
        key
    }

    pub fn add_marker(&mut self, rel: Rect) -> BoxKey {
        let key = self.arena.insert(BoxRect::new(rel, BoxRole::Marker));
        self.hidden.push(key);
        key
    }

    pub fn add_sprite(&mut self, rel: Rect) -> BoxKey {
        self.add_sprite_with_origin(rel, rel)
    }

    pub fn add_sprite_with_origin(&mut self, rel: Rect, origin: Rect) -> BoxKey {
        let key = self.arena.insert(BoxRect::new(rel, BoxRole::Sprite { origin }));
        self.sprites.push(key);
        key
    }

    /// Add a box of the same role as `source`, for a portal counterpart.
    /// Sprite origins are shifted along with the box.
    pub fn add_twin(&mut self, source: BoxKey, rel: Rect, offset: Vec2) -> Option<BoxKey> {
        let role = self.arena.get(source)?.role;
        let key = match role {
            BoxRole::Hit { corner_len } => self.add_hitbox(rel, corner_len),
            BoxRole::Marker => self.add_marker(rel),
            BoxRole::Sprite { origin } => self.add_sprite_with_origin(rel, origin.translated(offset)),
        };
        Some(key)
    }

    pub fn get(&self, key: BoxKey) -> Option<&BoxRect> {
        self.arena.get(key)
    }

    pub fn get_mut(&mut self, key: BoxKey) -> Option<&mut BoxRect> {
        self.arena.get_mut(key)
    }

    /// Remove a box from the arena and every list, and null any link to it.
    pub fn remove(&mut self, key: BoxKey) -> Option<BoxRect> {
        let removed = self.arena.remove(key)?;
        self.hitboxes.retain(|k| *k != key);
        self.hidden.retain(|k| *k != key);
        self.sprites.retain(|k| *k != key);
        for other in removed.counterpart.iter().flatten() {
            if let Some(b) = self.arena.get_mut(*other) {
                for link in b.counterpart.iter_mut() {
                    if *link == Some(key) {
                        *link = None;
                    }
                }
            }
        }
        Some(removed)
    }

    /// Link `original` to `counterpart` for travel in `dir`. Linking an
    /// already linked pair is a no-op.
    pub fn link(&mut self, original: BoxKey, counterpart: BoxKey, dir: Direction) {
        if let Some(b) = self.arena.get_mut(original) {
            b.counterpart[dir.index()] = Some(counterpart);
        }
        if let Some(b) = self.arena.get_mut(counterpart) {
            b.counterpart[dir.opposite().index()] = Some(original);
        }
    }

    pub fn unlink(&mut self, key: BoxKey) {
        let Some(links) = self.arena.get(key).map(|b| b.counterpart) else {
            return;
        };
        for other in links.iter().flatten() {
            if let Some(b) = self.arena.get_mut(*other) {
                for link in b.counterpart.iter_mut() {
                    if *link == Some(key) {
                        *link = None;
                    }
                }
            }
        }
        if let Some(b) = self.arena.get_mut(key) {
            b.counterpart = [None; 4];
        }
    }

    pub fn hitbox_keys(&self) -> &[BoxKey] {
        &self.hitboxes
    }

    pub fn hidden_keys(&self) -> &[BoxKey] {
        &self.hidden
    }

    pub fn sprite_keys(&self) -> &[BoxKey] {
        &self.sprites
    }

    pub fn hitboxes(&self) -> impl Iterator<Item = (BoxKey, &BoxRect)> {
        self.hitboxes.iter().filter_map(|k| self.arena.get(*k).map(|b| (*k, b)))
    }

    pub fn hidden(&self) -> impl Iterator<Item = (BoxKey, &BoxRect)> {
        self.hidden.iter().filter_map(|k| self.arena.get(*k).map(|b| (*k, b)))
    }

    pub fn sprites(&self) -> impl Iterator<Item = (BoxKey, &BoxRect)> {
        self.sprites.iter().filter_map(|k| self.arena.get(*k).map(|b| (*k, b)))
    }

    /// Union of the active hitboxes, or `None` when the entity has none.
    pub fn bounds(&self, owner: Vec2) -> Option<Aabb> {
        self.hitboxes()
            .map(|(_, b)| b.at(owner))
            .reduce(|acc, a| acc.union(&a))
    }

    pub fn splits(&self) -> &[PortalSplit] {
        &self.splits
    }

    pub fn split_of(&self, original: BoxKey) -> Option<&PortalSplit> {
        self.splits.iter().find(|s| s.original == original)
    }

    pub fn push_split(&mut self, split: PortalSplit) {
        self.splits.push(split);
    }

    /// Remove and return the split record of `original`.
    pub fn take_split(&mut self, original: BoxKey) -> Option<PortalSplit> {
        let idx = self.splits.iter().position(|s| s.original == original)?;
        Some(self.splits.remove(idx))
    }

    /// Undo a split: the original gets its base rectangle back and the
    /// counterpart and markers are dropped.
    pub fn rejoin(&mut self, original: BoxKey) -> bool {
        let Some(split) = self.take_split(original) else {
            return false;
        };
        if let Some(b) = self.arena.get_mut(split.original) {
            b.rel = split.base;
        }
        self.remove(split.counterpart);
        for marker in split.markers.into_iter().flatten() {
            self.remove(marker);
        }
        self.unlink(split.original);
        true
    }

    /// Rejoin every split.
    pub fn rejoin_all(&mut self) {
        let originals: Vec<BoxKey> = self.splits.iter().map(|s| s.original).collect();
        for key in originals {
            self.rejoin(key);
        }
    }
}
