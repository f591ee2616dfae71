use serde::{Deserialize, Serialize};

/// Simulation tunables. Lengths are in grid units, velocities in grid units
/// per tick, accelerations in grid units per tick².
///
/// Every field has a default, so a JSON override only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed tick length in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Longest wall-clock frame delta fed into the accumulator, in seconds.
    pub max_frame_dt: f32,
    /// Side length of the square map.
    pub map_len: f32,
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up).
    pub jump_speed: f32,
    pub walk_speed: f32,
    pub climb_speed: f32,
    pub move_block_speed: f32,
    pub player_strength: f32,
    /// Strength of static solids: Block, Ladder, Oneway.
    pub block_strength: f32,
    pub push_block_strength: f32,
    pub move_block_strength: f32,
    /// Strength of Key, Lever, Portal and Button. Loses every contest.
    pub trigger_strength: f32,
    /// Corner shrink of Player, PushBlock and MoveBlock hitboxes.
    pub mover_corner_len: f32,
    /// Inset of Key and Lever hitboxes from their tile.
    pub trigger_inset: f32,
    /// Thickness of a Button's plate.
    pub button_plate: f32,
    /// Rounding step applied to a counterpart box once it fully arrives.
    pub split_precision: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_frame_dt: 0.1,
            map_len: 16.0,
            gravity: 0.01,
            jump_speed: -0.2,
            walk_speed: 0.08,
            climb_speed: 0.08,
            move_block_speed: 0.08,
            player_strength: 10000.0,
            block_strength: 20000.0,
            push_block_strength: 5000.0,
            move_block_strength: 15000.0,
            trigger_strength: -1.0,
            mover_corner_len: 0.2,
            trigger_inset: 0.2,
            button_plate: 0.25,
            split_precision: 1e-3,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Round `value` to the configured split precision.
    pub fn round_split(&self, value: f32) -> f32 {
        if self.split_precision <= 0.0 {
            return value;
        }
        (value / self.split_precision).round() * self.split_precision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "gravity": 0.02, "map_len": 20 }"#).unwrap();
        assert_eq!(config.gravity, 0.02);
        assert_eq!(config.map_len, 20.0);
        assert_eq!(config.jump_speed, SimConfig::default().jump_speed);
    }

    #[test]
    fn strength_tiers_are_ordered() {
        let c = SimConfig::default();
        assert!(c.trigger_strength < c.push_block_strength);
        assert!(c.push_block_strength < c.player_strength);
        assert!(c.player_strength < c.move_block_strength);
        assert!(c.move_block_strength < c.block_strength);
    }

    #[test]
    fn round_split_snaps_to_precision() {
        let c = SimConfig::default();
        assert!((c.round_split(0.99996) - 1.0).abs() < 1e-6);
        assert!((c.round_split(0.4204) - 0.42).abs() < 1e-6);
    }
}
