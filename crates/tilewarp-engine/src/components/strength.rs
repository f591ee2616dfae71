//! Per-side push priority.
//!
//! A mover starts every tick at its base strength on all four sides. Each
//! committed contact copies the supporting body's strength onto the side of
//! the mover facing away from the contact, so whoever pushes that side next
//! is resisted by the whole chain behind it.

use crate::api::types::{Direction, Side};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strength {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Strength {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }

    pub fn get(&self, side: Side) -> f32 {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: f32) {
        match side {
            Side::Top => self.top = value,
            Side::Bottom => self.bottom = value,
            Side::Left => self.left = value,
            Side::Right => self.right = value,
        }
    }

    /// Whether a mover travelling `dir` wins outright against `other` and
    /// ignores it as a blocker.
    pub fn passes_through(&self, dir: Direction, other: &Strength) -> bool {
        let leading = dir.leading_side();
        self.get(leading) > other.get(leading.opposite())
    }
}
