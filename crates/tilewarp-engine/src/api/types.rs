use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Trigger colour shared by keys, levers and buttons and the objects they toggle.
/// Stored as the stage's tint string (e.g. `"#ff4040"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `0xRRGGBB` from a `#rrggbb` or `#rgb` string.
    pub fn packed_rgb(&self) -> Option<u32> {
        let hex = self.0.strip_prefix('#').unwrap_or(&self.0);
        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok(),
            3 => {
                let short = u32::from_str_radix(hex, 16).ok()?;
                let (r, g, b) = ((short >> 8) & 0xf, (short >> 4) & 0xf, short & 0xf);
                Some((r * 0x11) << 16 | (g * 0x11) << 8 | b * 0x11)
            }
            _ => None,
        }
    }
}

/// Axis-aligned travel direction. Screen space, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The side of a moving box that leads in this direction.
    pub fn leading_side(self) -> Side {
        match self {
            Direction::Up => Side::Top,
            Direction::Down => Side::Bottom,
            Direction::Left => Side::Left,
            Direction::Right => Side::Right,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Unit vector pointing in this direction.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Stable slot index, used for per-direction link tables.
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// One face of an axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Quarter-turn orientation of a stage object.
///
/// The orientation decides which way an object faces: a Oneway's passable
/// surface, a MoveBlock's drive direction, a Portal's mouth, a Button's plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Angle {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    /// Written as either `-90` or `270` in stage data.
    DegNeg90,
}

impl Angle {
    /// Parse a rotation in degrees. Only quarter turns are valid.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Angle::Deg0),
            90 => Some(Angle::Deg90),
            180 => Some(Angle::Deg180),
            270 => Some(Angle::DegNeg90),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Angle::Deg0 => 0,
            Angle::Deg90 => 90,
            Angle::Deg180 => 180,
            Angle::DegNeg90 => -90,
        }
    }

    /// Direction the object faces: 0 faces up, 90 right, 180 down, -90 left.
    pub fn facing(self) -> Direction {
        match self {
            Angle::Deg0 => Direction::Up,
            Angle::Deg90 => Direction::Right,
            Angle::Deg180 => Direction::Down,
            Angle::DegNeg90 => Direction::Left,
        }
    }

    /// Half turn.
    pub fn reversed(self) -> Self {
        match self {
            Angle::Deg0 => Angle::Deg180,
            Angle::Deg90 => Angle::DegNeg90,
            Angle::Deg180 => Angle::Deg0,
            Angle::DegNeg90 => Angle::Deg90,
        }
    }
}

/// Something that happened during a tick, for the UI/audio collaborators.
/// Cleared by the driver at the start of every displayed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    KeyCollected { key: EntityId, color: Color },
    LeverToggled { lever: EntityId, on: bool },
    ButtonChanged { button: EntityId, pressed: bool },
    /// `activate(color)` fired.
    Activated { color: Color },
    Teleported { entity: EntityId, from: EntityId, to: EntityId },
    Removed { entity: EntityId },
    /// The last Player left the map. Emitted once per stage.
    StageComplete,
}
