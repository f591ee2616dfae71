//! Portal box splitting and teleport.
//!
//! A portal's mouth is the edge of its tile on the side it faces; movers
//! enter travelling against the facing. While a mover's box straddles a
//! mouth, the part that has crossed is mirrored at the paired portal by pure
//! translation (`exit mouth centre - entrance mouth centre`) as a linked
//! counterpart box. Touching a portal's core point re-homes the whole entity
//! to the paired portal and rejoins every split.

use glam::Vec2;
use log::{debug, trace};

use crate::api::config::SimConfig;
use crate::api::game::Simulation;
use crate::api::types::{Direction, EntityId, SimEvent};
use crate::components::entity::{Entity, EntityKind};
use crate::components::hitbox::{BoxKey, BoxRole, PortalSplit};
use crate::core::geometry::{Aabb, Rect};
use crate::core::scene::Scene;

/// Snapshot of one paired portal for this tick.
#[derive(Debug, Clone, Copy)]
struct PortalView {
    id: EntityId,
    partner: EntityId,
    pos: Vec2,
    facing: Direction,
    tile: Aabb,
    core: Aabb,
}

impl PortalView {
    /// Travel direction of a mover entering this mouth.
    fn approach(&self) -> Direction {
        self.facing.opposite()
    }

    fn plane(&self) -> f32 {
        self.tile.edge(self.facing.leading_side())
    }

    fn mouth_centre(&self) -> Vec2 {
        let c = self.tile.center();
        match self.facing {
            Direction::Up => Vec2::new(c.x, self.tile.t),
            Direction::Down => Vec2::new(c.x, self.tile.b),
            Direction::Left => Vec2::new(self.tile.l, c.y),
            Direction::Right => Vec2::new(self.tile.r, c.y),
        }
    }

    /// `r` lies across the mouth's lateral span.
    fn spans(&self, r: &Aabb) -> bool {
        if self.approach().is_vertical() {
            r.l < self.tile.r && r.r > self.tile.l
        } else {
            r.t < self.tile.b && r.b > self.tile.t
        }
    }
}

fn portal_views(scene: &Scene) -> Vec<PortalView> {
    scene
        .iter()
        .filter(|e| e.kind == EntityKind::Portal)
        .filter_map(|e| {
            Some(PortalView {
                id: e.id,
                partner: e.partner()?,
                pos: e.pos,
                facing: e.angle.facing(),
                tile: e.tile(),
                core: e.bounds(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Split geometry
// ---------------------------------------------------------------------------

/// Signed depth of `r` past `plane` when travelling `dir`.
fn crossed_depth(dir: Direction, plane: f32, r: &Aabb) -> f32 {
    match dir {
        Direction::Down => r.b - plane,
        Direction::Up => plane - r.t,
        Direction::Right => r.r - plane,
        Direction::Left => plane - r.l,
    }
}

fn extent(dir: Direction, rect: &Rect) -> f32 {
    if dir.is_vertical() {
        rect.h
    } else {
        rect.w
    }
}

/// The part of `base` still on the entrance side.
fn near_part(dir: Direction, base: &Rect, depth: f32) -> Rect {
    match dir {
        Direction::Down => Rect::new(base.x, base.y, base.w, base.h - depth),
        Direction::Up => Rect::new(base.x, base.y + depth, base.w, base.h - depth),
        Direction::Right => Rect::new(base.x, base.y, base.w - depth, base.h),
        Direction::Left => Rect::new(base.x + depth, base.y, base.w - depth, base.h),
    }
}

/// The part of `base` that has crossed, still in entrance coordinates.
fn crossed_part(dir: Direction, base: &Rect, depth: f32) -> Rect {
    match dir {
        Direction::Down => Rect::new(base.x, base.bottom() - depth, base.w, depth),
        Direction::Up => Rect::new(base.x, base.y, base.w, depth),
        Direction::Right => Rect::new(base.right() - depth, base.y, depth, base.h),
        Direction::Left => Rect::new(base.x, base.y, depth, base.h),
    }
}

/// Zero-thickness marker on the entrance plane, owner-relative.
fn plane_marker(dir: Direction, base: &Rect, plane: f32, owner: Vec2) -> Rect {
    if dir.is_vertical() {
        Rect::new(base.x, plane - owner.y, base.w, 0.0)
    } else {
        Rect::new(plane - owner.x, base.y, 0.0, base.h)
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Run teleport and box splitting for every mover.
pub fn update_portals(sim: &mut Simulation) {
    let portals = portal_views(&sim.scene);
    if portals.is_empty() {
        return;
    }
    for id in sim.scene.mover_ids() {
        teleport(sim, &portals, id);
        let config = &sim.config;
        if let Some(entity) = sim.scene.get_mut(id) {
            update_splits(entity, &portals, config);
        }
    }
}

/// Hitboxes as they would be without any split: split originals at their
/// base, linked counterparts left out.
fn whole_hitboxes(entity: &Entity) -> Vec<Aabb> {
    let counterparts: Vec<BoxKey> = entity.boxes.splits().iter().map(|s| s.counterpart).collect();
    entity
        .boxes
        .hitboxes()
        .filter(|(key, _)| !counterparts.contains(key))
        .map(|(key, b)| {
            let rel = entity.boxes.split_of(key).map_or(b.rel, |s| s.base);
            rel.at(entity.pos)
        })
        .collect()
}

/// Re-home the entity on the first tick its body touches a portal core.
fn teleport(sim: &mut Simulation, portals: &[PortalView], id: EntityId) {
    let Some(entity) = sim.scene.get_mut(id) else {
        return;
    };
    let whole = whole_hitboxes(entity);
    let touched = portals
        .iter()
        .find(|p| whole.iter().any(|a| a.overlaps(&p.core)));
    let was_in = entity.in_portal;
    entity.in_portal = touched.map(|p| p.id);

    let Some(entrance) = touched else {
        return;
    };
    if was_in.is_some() {
        return;
    }
    let Some(exit) = portals.iter().find(|p| p.id == entrance.partner) else {
        return;
    };

    entity.pos = exit.pos;
    entity.vel = Vec2::ZERO;
    entity.in_portal = Some(exit.id);
    entity.boxes.rejoin_all();
    entity.moving_in_portals.clear();
    debug!("entity {} teleported from portal {} to {}", id.0, entrance.id.0, exit.id.0);
    sim.emit(SimEvent::Teleported {
        entity: id,
        from: entrance.id,
        to: exit.id,
    });
}

/// Bring every split of `entity` up to date with its position, then split
/// boxes that newly straddle a mouth.
fn update_splits(entity: &mut Entity, portals: &[PortalView], config: &SimConfig) {
    for split in entity.boxes.splits().to_vec() {
        let entrance = portals.iter().find(|p| p.id == split.portal);
        let exit = portals.iter().find(|p| p.id == split.exit);
        let (Some(entrance), Some(exit)) = (entrance, exit) else {
            entity.boxes.rejoin(split.original);
            continue;
        };
        let r = split.base.at(entity.pos);
        let depth = crossed_depth(split.direction, entrance.plane(), &r);
        if depth <= 0.0 || !entrance.spans(&r) {
            trace!("entity {}: split at portal {} rejoined", entity.id.0, entrance.id.0);
            entity.boxes.rejoin(split.original);
        } else if depth >= extent(split.direction, &split.base) {
            arrive(entity, &split, entrance, exit, config);
        } else {
            reshape(entity, &split, entrance, exit, depth);
        }
    }

    let candidates: Vec<BoxKey> = entity
        .boxes
        .hitbox_keys()
        .iter()
        .chain(entity.boxes.sprite_keys())
        .copied()
        .collect();
    for key in candidates {
        let Some(rel) = entity
            .boxes
            .get(key)
            .filter(|b| !b.is_linked())
            .map(|b| b.rel)
        else {
            continue;
        };
        if entity.boxes.split_of(key).is_some() {
            continue;
        }
        let r = rel.at(entity.pos);
        let entering = portals.iter().find(|p| {
            if entity.in_portal == Some(p.id) || !p.spans(&r) {
                return false;
            }
            let depth = crossed_depth(p.approach(), p.plane(), &r);
            depth > 0.0 && depth < extent(p.approach(), &rel)
        });
        let Some(entrance) = entering else {
            continue;
        };
        let Some(exit) = portals.iter().find(|p| p.id == entrance.partner) else {
            continue;
        };
        split_box(entity, key, rel, entrance, exit);
    }

    let mut straddled: Vec<EntityId> = entity.boxes.splits().iter().map(|s| s.portal).collect();
    straddled.sort();
    straddled.dedup();
    entity.moving_in_portals = straddled;
}

fn split_box(entity: &mut Entity, key: BoxKey, base: Rect, entrance: &PortalView, exit: &PortalView) {
    let dir = entrance.approach();
    let offset = exit.mouth_centre() - entrance.mouth_centre();
    let depth = crossed_depth(dir, entrance.plane(), &base.at(entity.pos));
    let near = near_part(dir, &base, depth);
    let far = crossed_part(dir, &base, depth).translated(offset);

    let boxes = &mut entity.boxes;
    let Some(counterpart) = boxes.add_twin(key, far, offset) else {
        return;
    };
    if let Some(b) = boxes.get_mut(key) {
        b.rel = near;
    }
    let is_hitbox = matches!(boxes.get(key).map(|b| b.role), Some(BoxRole::Hit { .. }));
    let markers = is_hitbox.then(|| {
        let marker = plane_marker(dir, &base, entrance.plane(), entity.pos);
        [boxes.add_marker(marker), boxes.add_marker(marker.translated(offset))]
    });
    boxes.link(key, counterpart, dir);
    boxes.push_split(PortalSplit {
        portal: entrance.id,
        exit: exit.id,
        direction: dir,
        original: key,
        counterpart,
        base,
        markers,
    });
    trace!(
        "entity {}: box split at portal {} (depth {:.3})",
        entity.id.0,
        entrance.id.0,
        depth
    );
}

/// Move the existing linked pair and its markers to the new depth.
fn reshape(entity: &mut Entity, split: &PortalSplit, entrance: &PortalView, exit: &PortalView, depth: f32) {
    let dir = split.direction;
    let offset = exit.mouth_centre() - entrance.mouth_centre();
    let marker = plane_marker(dir, &split.base, entrance.plane(), entity.pos);
    let boxes = &mut entity.boxes;
    if let Some(b) = boxes.get_mut(split.original) {
        b.rel = near_part(dir, &split.base, depth);
    }
    if let Some(b) = boxes.get_mut(split.counterpart) {
        b.rel = crossed_part(dir, &split.base, depth).translated(offset);
    }
    if let Some([entry, exit_marker]) = split.markers {
        if let Some(b) = boxes.get_mut(entry) {
            b.rel = marker;
        }
        if let Some(b) = boxes.get_mut(exit_marker) {
            b.rel = marker.translated(offset);
        }
    }
}

/// The whole box has crossed: drop the original and keep the counterpart as
/// an ordinary box.
fn arrive(entity: &mut Entity, split: &PortalSplit, entrance: &PortalView, exit: &PortalView, config: &SimConfig) {
    let dir = split.direction;
    let offset = exit.mouth_centre() - entrance.mouth_centre();
    let full = crossed_part(dir, &split.base, extent(dir, &split.base)).translated(offset);
    let boxes = &mut entity.boxes;
    boxes.take_split(split.original);
    boxes.remove(split.original);
    for marker in split.markers.into_iter().flatten() {
        boxes.remove(marker);
    }
    boxes.unlink(split.counterpart);
    if let Some(b) = boxes.get_mut(split.counterpart) {
        b.rel = Rect::new(full.x, full.y, config.round_split(full.w), config.round_split(full.h));
    }
    trace!("entity {}: box arrived through portal {}", entity.id.0, entrance.id.0);
}
