use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::types::{Direction, EntityId};
use crate::components::entity::{Entity, EntityKind};
use crate::components::hitbox::BoxRect;
use crate::components::strength::Strength;
use crate::core::geometry::Aabb;
use crate::core::scene::Scene;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The winning contact of one directional resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub direction: Direction,
    pub other: EntityId,
    /// New owner `y` for a downward contact (the box bottom snapped onto the
    /// support's top). `None` for the other directions, which correct
    /// velocity only.
    pub position: Option<f32>,
    /// Resulting velocity component along the contact axis.
    pub velocity: f32,
    /// The candidate's live strength, copied onto the mover's trailing side.
    pub other_strength: Strength,
}

/// Per-direction nearest-contact search against the solids of a scene.
///
/// Holds only shared borrows: a resolution is computed against the scene as
/// it is now and applied afterwards with [`apply_contact`].
pub struct Resolver<'a> {
    scene: &'a Scene,
    config: &'a SimConfig,
    /// Holding down lets a Player drop through a ladder top.
    down_held: bool,
}

/// One mover box in absolute coordinates.
struct MoverBox {
    outer: Aabb,
    inner: Aabb,
    /// Bottom edge relative to the owner, for snapping onto a support.
    rel_bottom: f32,
}

/// An eligible contact before selection.
struct Candidate {
    other: EntityId,
    /// Selection key: resulting `y` for down, resulting velocity otherwise.
    key: f32,
    velocity: f32,
    other_velocity: f32,
    other_strength: Strength,
}

impl<'a> Resolver<'a> {
    pub fn new(scene: &'a Scene, config: &'a SimConfig, down_held: bool) -> Self {
        Self {
            scene,
            config,
            down_held,
        }
    }

    /// Find the contact the mover `id` commits to when travelling `dir`
    /// this tick, if any.
    pub fn resolve(&self, id: EntityId, dir: Direction) -> Option<Contact> {
        let mover = self.scene.get(id)?;
        let mut best: Option<Candidate> = None;

        for other in self.scene.iter() {
            if !self.is_candidate(mover, other, dir) {
                continue;
            }
            let stop = self.mutual_stop(mover, other);
            for mb in self.mover_boxes(mover, other) {
                for (_, ob) in other.boxes.hitboxes() {
                    let c = ob.at(other.pos);
                    if let Some(found) = self.eligible(mover, &mb, &c, other, stop, dir) {
                        if better(dir, &found, best.as_ref()) {
                            best = Some(found);
                        }
                    }
                }
            }
        }

        let best = best?;
        if !commits(dir, mover.vel, best.other_velocity) {
            return None;
        }
        Some(Contact {
            direction: dir,
            other: best.other,
            position: (dir == Direction::Down).then_some(best.key),
            velocity: best.velocity,
            other_strength: best.other_strength,
        })
    }

    fn is_candidate(&self, mover: &Entity, other: &Entity, dir: Direction) -> bool {
        if other.id == mover.id {
            return false;
        }
        let ladder_support = dir == Direction::Down
            && other.kind == EntityKind::Ladder
            && !(mover.kind == EntityKind::Player && self.down_held);
        if !other.solid && !ladder_support {
            return false;
        }
        if other.kind == EntityKind::Oneway && other.angle.facing() != dir.opposite() {
            return false;
        }
        !mover.strength.passes_through(dir, &other.strength)
    }

    /// Two MoveBlocks stop each other dead instead of carrying each other.
    /// Their real velocities still decide whether they meet this tick.
    fn mutual_stop(&self, mover: &Entity, other: &Entity) -> bool {
        let tier = self.config.move_block_strength;
        mover.init_strength == tier && other.init_strength == tier
    }

    fn mover_boxes(&self, mover: &Entity, other: &Entity) -> Vec<MoverBox> {
        let to_box = |b: &BoxRect| MoverBox {
            outer: b.at(mover.pos),
            inner: b.inner_at(mover.pos),
            rel_bottom: b.rel.bottom(),
        };
        let mut boxes: Vec<MoverBox> = mover.boxes.hitboxes().map(|(_, b)| to_box(b)).collect();
        // Portal markers only ever meet portals.
        if other.kind == EntityKind::Portal {
            boxes.extend(mover.boxes.hidden().map(|(_, b)| to_box(b)));
        }
        boxes
    }

    fn eligible(
        &self,
        mover: &Entity,
        m: &MoverBox,
        c: &Aabb,
        other: &Entity,
        stop: bool,
        dir: Direction,
    ) -> Option<Candidate> {
        let mv = mover.vel;
        let cv = other.vel;
        let mi = &m.inner;
        let mo = &m.outer;

        let (reachable, lateral, key, velocity) = match dir {
            Direction::Down => {
                let ladder_ok = other.kind != EntityKind::Ladder || mo.b <= c.t;
                (
                    ladder_ok && mi.b <= c.t && mo.b + mv.y >= c.t + cv.y,
                    lateral_x(mi, c, mv, cv),
                    c.t - m.rel_bottom,
                    cv.y,
                )
            }
            Direction::Up => {
                let v = c.b + cv.y - mo.t;
                (mi.t >= c.b && mo.t + mv.y <= c.b + cv.y, lateral_x(mi, c, mv, cv), v, v)
            }
            Direction::Left => {
                let v = c.r + cv.x - mo.l;
                (mi.l >= c.r && mo.l + mv.x <= c.r + cv.x, lateral_y(mi, c, mv, cv), v, v)
            }
            Direction::Right => {
                let v = c.l + cv.x - mo.r;
                (mi.r <= c.l && mo.r + mv.x >= c.l + cv.x, lateral_y(mi, c, mv, cv), v, v)
            }
        };

        if !(reachable && lateral) {
            return None;
        }
        let other_velocity = if dir.is_vertical() { cv.y } else { cv.x };
        Some(Candidate {
            other: other.id,
            key,
            velocity: if stop { 0.0 } else { velocity },
            other_velocity,
            other_strength: other.strength,
        })
    }
}

// ---------------------------------------------------------------------------
// Selection helpers (private)
// ---------------------------------------------------------------------------

/// Horizontal spans overlap now, or after projecting both velocities.
fn lateral_x(mi: &Aabb, c: &Aabb, mv: Vec2, cv: Vec2) -> bool {
    let apart_now = mi.r <= c.l || mi.l >= c.r;
    let apart_next = mi.r + mv.x <= c.l + cv.x || mi.l + mv.x >= c.r + cv.x;
    !(apart_now && apart_next)
}

/// Vertical spans overlap now, or after projecting both velocities.
fn lateral_y(mi: &Aabb, c: &Aabb, mv: Vec2, cv: Vec2) -> bool {
    let apart_now = mi.b <= c.t || mi.t >= c.b;
    let apart_next = mi.b + mv.y <= c.t + cv.y || mi.t + mv.y >= c.b + cv.y;
    !(apart_now && apart_next)
}

fn better(dir: Direction, found: &Candidate, best: Option<&Candidate>) -> bool {
    let Some(best) = best else {
        return true;
    };
    match dir {
        // First surface met; on a tie the support that arrests motion more.
        Direction::Down => {
            found.key < best.key || (found.key == best.key && found.velocity < best.velocity)
        }
        Direction::Up | Direction::Left => found.key > best.key,
        Direction::Right => found.key < best.key,
    }
}

/// The mover must be closing on the candidate, not already receding.
fn commits(dir: Direction, mv: Vec2, other_velocity: f32) -> bool {
    match dir {
        Direction::Down => mv.y - other_velocity >= 0.0,
        Direction::Up => mv.y - other_velocity <= 0.0,
        Direction::Left => mv.x - other_velocity <= 0.0,
        Direction::Right => mv.x - other_velocity >= 0.0,
    }
}

/// Write a committed contact into the mover.
pub fn apply_contact(entity: &mut Entity, contact: &Contact) {
    let backed = contact.direction.leading_side().opposite();
    match contact.direction {
        Direction::Down => {
            if let Some(y) = contact.position {
                entity.pos.y = y;
            }
            entity.vel.y = contact.velocity;
            entity.on_block = Some(contact.other);
        }
        Direction::Up => entity.vel.y = contact.velocity,
        Direction::Left | Direction::Right => entity.vel.x = contact.velocity,
    }
    entity
        .strength
        .set(backed, contact.other_strength.get(backed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Angle;

    fn spawn(scene: &mut Scene, id: u32, kind: EntityKind, x: f32, y: f32, angle: Angle) {
        let config = SimConfig::default();
        scene.spawn(Entity::new(EntityId(id), kind, Vec2::new(x, y), Vec2::ONE, angle, &config));
    }

    fn set_vel(scene: &mut Scene, id: u32, vel: Vec2) {
        scene.get_mut(EntityId(id)).unwrap().vel = vel;
    }

    fn resolve(scene: &Scene, id: u32, dir: Direction) -> Option<Contact> {
        let config = SimConfig::default();
        Resolver::new(scene, &config, false).resolve(EntityId(id), dir)
    }

    #[test]
    fn landing_snaps_onto_block_top() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 3.95, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 5.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.1));

        let contact = resolve(&scene, 1, Direction::Down).unwrap();
        assert_eq!(contact.other, EntityId(2));
        assert_eq!(contact.position, Some(4.0));
        assert_eq!(contact.velocity, 0.0);

        let player = scene.get_mut(EntityId(1)).unwrap();
        apply_contact(player, &contact);
        assert_eq!(player.pos.y, 4.0);
        assert_eq!(player.vel.y, 0.0);
        assert_eq!(player.on_block, Some(EntityId(2)));
        assert_eq!(player.strength.top, 20000.0);
    }

    #[test]
    fn falling_short_of_the_surface_is_no_contact() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 3.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 5.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.1));
        assert!(resolve(&scene, 1, Direction::Down).is_none());
    }

    #[test]
    fn lands_on_first_surface_met() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 2.5, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 4.0, Angle::Deg0);
        spawn(&mut scene, 3, EntityKind::Block, 3.5, 3.6, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, 1.6));
        let contact = resolve(&scene, 1, Direction::Down).unwrap();
        assert_eq!(contact.other, EntityId(3));
        assert!((contact.position.unwrap() - 2.6).abs() < 1e-6);
    }

    #[test]
    fn corner_graze_is_not_a_side_hit() {
        let mut scene = Scene::new();
        // Player bottom 0.1 below the block top: inside the corner tolerance.
        spawn(&mut scene, 1, EntityKind::Player, 2.0, 4.1, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 5.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        assert!(resolve(&scene, 1, Direction::Right).is_none());
    }

    #[test]
    fn wall_stops_horizontal_motion_at_its_face() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 1.95, 4.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 4.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        let contact = resolve(&scene, 1, Direction::Right).unwrap();
        assert!((contact.velocity - 0.05).abs() < 1e-5);

        let player = scene.get_mut(EntityId(1)).unwrap();
        apply_contact(player, &contact);
        assert_eq!(player.strength.left, 20000.0);
        let inner_right = player.pos.x + player.vel.x + 1.0 - 0.2;
        assert!(inner_right <= 3.0);
    }

    #[test]
    fn ceiling_caps_upward_velocity() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 2.1, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Block, 3.0, 1.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, -0.2));
        let contact = resolve(&scene, 1, Direction::Up).unwrap();
        assert!((contact.velocity + 0.1).abs() < 1e-5);
        assert_eq!(contact.position, None);
    }

    #[test]
    fn receding_mover_does_not_commit() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::PushBlock, 3.0, 4.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::MoveBlock, 3.0, 5.0, Angle::Deg180);
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.0));
        set_vel(&mut scene, 2, Vec2::new(0.0, 0.08));
        // The support drops away faster than the mover falls.
        assert!(resolve(&scene, 1, Direction::Down).is_none());
    }

    #[test]
    fn stronger_mover_skips_weaker_candidate() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 2.0, 4.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::PushBlock, 3.0, 4.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        assert!(resolve(&scene, 1, Direction::Right).is_none());

        // Backed by a wall, the block resists.
        scene.get_mut(EntityId(2)).unwrap().strength.left = 20000.0;
        assert!(resolve(&scene, 1, Direction::Right).is_some());
    }

    #[test]
    fn oneway_blocks_only_from_its_open_side() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 3.95, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Oneway, 3.0, 5.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.1));
        assert!(resolve(&scene, 1, Direction::Down).is_some());

        scene.get_mut(EntityId(2)).unwrap().angle = Angle::Deg180;
        assert!(resolve(&scene, 1, Direction::Down).is_none());
    }

    #[test]
    fn ladder_top_supports_unless_down_is_held() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 3.95, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Ladder, 3.0, 5.0, Angle::Deg0);
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.1));
        let config = SimConfig::default();
        assert!(Resolver::new(&scene, &config, false)
            .resolve(EntityId(1), Direction::Down)
            .is_some());
        assert!(Resolver::new(&scene, &config, true)
            .resolve(EntityId(1), Direction::Down)
            .is_none());
        // Ladders never block sideways.
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        assert!(resolve(&scene, 1, Direction::Right).is_none());
    }

    #[test]
    fn oneway_facing_left_blocks_only_rightward_movers() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 2.0, 4.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Oneway, 3.05, 4.0, Angle::DegNeg90);
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        assert_eq!(resolve(&scene, 1, Direction::Right).map(|c| c.other), Some(EntityId(2)));

        scene.get_mut(EntityId(2)).unwrap().angle = Angle::Deg90;
        assert!(resolve(&scene, 1, Direction::Right).is_none());
    }

    #[test]
    fn oneway_facing_right_blocks_only_leftward_movers() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 4.05, 4.0, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Oneway, 3.0, 4.0, Angle::Deg90);
        set_vel(&mut scene, 1, Vec2::new(-0.08, 0.0));
        let contact = resolve(&scene, 1, Direction::Left).unwrap();
        assert!((contact.velocity + 0.05).abs() < 1e-5);

        scene.get_mut(EntityId(2)).unwrap().angle = Angle::DegNeg90;
        assert!(resolve(&scene, 1, Direction::Left).is_none());
    }

    #[test]
    fn oneway_facing_down_blocks_only_rising_movers() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 6.05, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Oneway, 3.0, 5.0, Angle::Deg180);
        set_vel(&mut scene, 1, Vec2::new(0.0, -0.1));
        let contact = resolve(&scene, 1, Direction::Up).unwrap();
        assert!((contact.velocity + 0.05).abs() < 1e-5);

        scene.get_mut(EntityId(2)).unwrap().angle = Angle::Deg0;
        assert!(resolve(&scene, 1, Direction::Up).is_none());
    }

    #[test]
    fn head_on_move_blocks_stop_dead() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::MoveBlock, 2.0, 4.0, Angle::Deg90);
        spawn(&mut scene, 2, EntityKind::MoveBlock, 3.1, 4.0, Angle::DegNeg90);
        set_vel(&mut scene, 1, Vec2::new(0.08, 0.0));
        set_vel(&mut scene, 2, Vec2::new(-0.08, 0.0));

        // The gap exceeds one block's step but not the closing speed.
        let contact = resolve(&scene, 1, Direction::Right).unwrap();
        assert_eq!(contact.other, EntityId(2));
        assert_eq!(contact.velocity, 0.0);
        let contact = resolve(&scene, 2, Direction::Left).unwrap();
        assert_eq!(contact.other, EntityId(1));
        assert_eq!(contact.velocity, 0.0);

        // Driving the same way, the leader stays out of reach.
        set_vel(&mut scene, 2, Vec2::new(0.08, 0.0));
        assert!(resolve(&scene, 1, Direction::Right).is_none());
    }

    #[test]
    fn move_block_landing_on_move_block_stops() {
        let support = |kind: EntityKind| {
            let mut scene = Scene::new();
            spawn(&mut scene, 1, kind, 3.0, 3.98, Angle::Deg0);
            spawn(&mut scene, 2, EntityKind::MoveBlock, 3.0, 5.0, Angle::Deg180);
            set_vel(&mut scene, 1, Vec2::new(0.0, 0.08));
            set_vel(&mut scene, 2, Vec2::new(0.0, 0.04));
            resolve(&scene, 1, Direction::Down).unwrap()
        };

        let contact = support(EntityKind::MoveBlock);
        assert_eq!(contact.position, Some(4.0));
        assert_eq!(contact.velocity, 0.0);

        // Anything weaker rides along instead.
        let contact = support(EntityKind::Player);
        assert_eq!(contact.position, Some(4.0));
        assert!((contact.velocity - 0.04).abs() < 1e-6);
    }

    #[test]
    fn non_solid_entities_are_ignored() {
        let mut scene = Scene::new();
        spawn(&mut scene, 1, EntityKind::Player, 3.0, 3.95, Angle::Deg0);
        spawn(&mut scene, 2, EntityKind::Key, 3.0, 5.0, Angle::Deg0);
        let config = SimConfig::default();
        scene.spawn(
            Entity::new(EntityId(3), EntityKind::Block, Vec2::new(3.0, 5.0), Vec2::ONE, Angle::Deg0, &config)
                .with_solid(false),
        );
        set_vel(&mut scene, 1, Vec2::new(0.0, 0.1));
        assert!(resolve(&scene, 1, Direction::Down).is_none());
    }
}
