//! Per-instance movement configuration.
//!
//! Everything a level or game mode is expected to override lives here; the
//! defaults carry the shipped tuning. Values that are not meant to vary
//! per character stay in [`crate::tuning`].

use serde::{Deserialize, Serialize};

/// Tunable parameters for one character instance.
///
/// Units: world units (tiles) for distances, seconds for times, degrees for
/// angles. Torque values are tuned against the unit-box inertia in
/// [`crate::tuning::ROTATIONAL_INERTIA`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverConfig {
    /// One-shot rotational impulse applied when movement starts on the ground.
    pub impulse_torque: f32,
    /// Smaller rotational impulse used for airborne corrections.
    pub impulse_air_torque: f32,
    /// Continuous roll torque while supported by ground or wall.
    pub ground_torque: f32,
    /// Continuous roll torque while airborne.
    pub air_torque: f32,
    /// Horizontal air-control force scale.
    pub air_speed: f32,
    /// Speed above which horizontal input no longer accelerates.
    pub max_move_speed: f32,

    /// Probe shapes shrink by this much and casts start this far inside the
    /// collider, so grazing contacts still produce clean normals.
    pub cast_offset: f32,
    /// Downward contact probe distance.
    pub ground_test_distance: f32,
    /// Sideways wall probe distance.
    pub wall_test_distance: f32,
    /// Upward ceiling probe distance.
    pub ceiling_test_distance: f32,

    /// Apex height of an unheld ground jump.
    pub jump_height: f32,
    /// Extra upward force while the jump button extends a ground jump.
    pub jump_extra_strength: f32,
    /// Minimum duration of the jump extension window.
    pub jump_min_time: f32,
    /// Maximum duration of the jump extension window while held.
    pub jump_max_time: f32,

    /// Fixed impulse magnitude of a wall jump.
    pub walljump_strength: f32,
    /// Extra gravity applied when jump is released early during a wall jump.
    pub walljump_short_gravity_boost: f32,
    /// Velocity decay rate of the short-hop penalty (per second).
    pub walljump_short_drag: f32,
    /// Short-hop penalty window bounds.
    pub walljump_min_time: f32,
    pub walljump_max_time: f32,

    /// Impulse of a ceiling jump, pushed along gravity.
    pub ceilingjump_strength: f32,
    /// Peak force of the super jump.
    pub superjump_strength: f32,

    /// How long a wall roll keeps assisting before the wall turns slippery.
    pub wall_roll_time: f32,
    /// Grace window after losing ground contact during which the character
    /// still counts as grounded.
    pub coyote_time: f32,

    /// Ability toggles.
    pub wall_roll_enabled: bool,
    pub fast_fall_enabled: bool,
    pub downward_wall_jump_enabled: bool,

    /// Accessibility: stretches the wall-roll assist window.
    pub wall_roll_time_mult: f32,
    /// Accessibility: ground jumps available without touching down (1 = the
    /// standard single jump).
    pub max_ground_jumps: u32,
    /// Accessibility: hazards are ignored and only forced kills apply.
    pub invincible: bool,

    /// Whether reset/suicide triggers are honored.
    pub resettable: bool,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            impulse_torque: 3.0,
            impulse_air_torque: 0.3,
            ground_torque: 100.0,
            air_torque: 200.0,
            air_speed: 60.0,
            max_move_speed: 8.0,

            cast_offset: 0.1,
            ground_test_distance: 0.1,
            wall_test_distance: 0.3,
            ceiling_test_distance: 0.3,

            jump_height: 1.4,
            jump_extra_strength: 1.45,
            jump_min_time: 0.1,
            jump_max_time: 0.25,

            walljump_strength: 20.0,
            walljump_short_gravity_boost: 0.75,
            walljump_short_drag: 2.4,
            walljump_min_time: 0.1,
            walljump_max_time: 0.15,

            ceilingjump_strength: 2.4,
            superjump_strength: 50.0,

            wall_roll_time: 0.3,
            coyote_time: 0.075,

            wall_roll_enabled: true,
            fast_fall_enabled: true,
            downward_wall_jump_enabled: false,

            wall_roll_time_mult: 1.0,
            max_ground_jumps: 1,
            invincible: false,

            resettable: true,
        }
    }
}

impl MoverConfig {
    /// Validate structural preconditions once, at construction time.
    ///
    /// The per-tick path never checks these again; a broken config is a
    /// programming error, not a runtime condition.
    pub fn validate(&self) {
        assert!(
            self.jump_height > 1.0,
            "jump_height must exceed 1.0 (the closed-form strength divides by its excess)"
        );
        assert!(self.max_move_speed > 0.0, "max_move_speed must be positive");
        assert!(
            self.cast_offset > 0.0 && self.cast_offset < crate::tuning::ROUND_RADIUS_SQUARE,
            "cast_offset must leave a positive probe radius"
        );
        assert!(
            self.jump_min_time <= self.jump_max_time
                && self.walljump_min_time <= self.walljump_max_time,
            "jump hold windows must be ordered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        MoverConfig::default().validate();
    }

    #[test]
    #[should_panic(expected = "jump_height")]
    fn degenerate_jump_height_is_rejected() {
        let cfg = MoverConfig {
            jump_height: 1.0,
            ..Default::default()
        };
        cfg.validate();
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = MoverConfig {
            air_speed: 45.0,
            fast_fall_enabled: false,
            ..Default::default()
        };
        let text = serde_json::to_string(&cfg).unwrap();
        let back: MoverConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.air_speed, 45.0);
        assert!(!back.fast_fall_enabled);
        assert_eq!(back.max_move_speed, cfg.max_move_speed);
    }
}
