//! Box geometry: owner-relative rectangles and the absolute edges derived from them.
//!
//! Absolute edges are always computed from the owner position, never cached,
//! so mutating a relative rectangle moves the box immediately.

use glam::Vec2;

use crate::api::types::Side;

/// Owner-relative rectangle (`relX, relY, w, h`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering `size` from the owner origin.
    pub fn from_size(size: Vec2) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Absolute edges for an owner at `owner`.
    pub fn at(&self, owner: Vec2) -> Aabb {
        Aabb {
            l: owner.x + self.x,
            r: owner.x + self.x + self.w,
            t: owner.y + self.y,
            b: owner.y + self.y + self.h,
        }
    }
}

/// Absolute box edges: left, right, top, bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub l: f32,
    pub r: f32,
    pub t: f32,
    pub b: f32,
}

impl Aabb {
    pub fn new(l: f32, r: f32, t: f32, b: f32) -> Self {
        Self { l, r, t, b }
    }

    pub fn width(&self) -> f32 {
        self.r - self.l
    }

    pub fn height(&self) -> f32 {
        self.b - self.t
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.l + self.r) * 0.5, (self.t + self.b) * 0.5)
    }

    pub fn edge(&self, side: Side) -> f32 {
        match side {
            Side::Top => self.t,
            Side::Bottom => self.b,
            Side::Left => self.l,
            Side::Right => self.r,
        }
    }

    /// Shrink every side by `corner_len`. Used to tolerate corner grazing.
    pub fn inner(&self, corner_len: f32) -> Self {
        Self {
            l: self.l + corner_len,
            r: self.r - corner_len,
            t: self.t + corner_len,
            b: self.b - corner_len,
        }
    }

    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.l < other.r && self.r > other.l && self.t < other.b && self.b > other.t
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            l: self.l.min(other.l),
            r: self.r.max(other.r),
            t: self.t.min(other.t),
            b: self.b.max(other.b),
        }
    }

    /// Entirely outside the square `[0, len]²`.
    pub fn outside_square(&self, len: f32) -> bool {
        self.r < 0.0 || self.l > len || self.b < 0.0 || self.t > len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_edges_follow_owner() {
        let rect = Rect::new(0.25, 0.5, 1.0, 2.0);
        let a = rect.at(Vec2::new(3.0, 4.0));
        assert_eq!(a, Aabb::new(3.25, 4.25, 4.5, 6.5));
    }

    #[test]
    fn inner_shrinks_all_sides() {
        let a = Aabb::new(0.0, 1.0, 0.0, 1.0).inner(0.2);
        assert!((a.l - 0.2).abs() < 1e-6);
        assert!((a.r - 0.8).abs() < 1e-6);
        assert!((a.t - 0.2).abs() < 1e-6);
        assert!((a.b - 0.8).abs() < 1e-6);
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::new(0.0, 1.0, 0.0, 1.0);
        let b = Aabb::new(1.0, 2.0, 0.0, 1.0);
        assert!(!a.overlaps(&b));
        let c = Aabb::new(0.9, 2.0, 0.5, 0.6);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn zero_size_point_overlaps_only_when_strictly_inside() {
        let body = Aabb::new(0.0, 1.0, 0.0, 1.0);
        let inside = Aabb::new(0.5, 0.5, 0.5, 0.5);
        let on_edge = Aabb::new(1.0, 1.0, 0.5, 0.5);
        assert!(body.overlaps(&inside));
        assert!(!body.overlaps(&on_edge));
    }

    #[test]
    fn outside_square_needs_full_exit() {
        assert!(!Aabb::new(15.5, 16.5, 3.0, 4.0).outside_square(16.0));
        assert!(Aabb::new(16.1, 17.1, 3.0, 4.0).outside_square(16.0));
        assert!(Aabb::new(3.0, 4.0, -2.0, -0.5).outside_square(16.0));
    }
}
