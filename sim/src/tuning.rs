/*!
Feel-tuned constants for the movement core.

These values were tuned by play, not derived; treat them as part of the
game's identity and change them together with a retuning pass. Per-character
values that levels are expected to override live in [`crate::config::MoverConfig`]
instead.

Notes
- Distances are in world units (one tile = 1.0), time in seconds.
- Angles and spin are in degrees / degrees per second to match the tuning.
*/

/// Analog stick deadzone; below this horizontal input reads as zero,
/// above it snaps to the unit sign.
pub const INPUT_DEADZONE: f32 = 0.4;

/// How long an early jump press is remembered and auto-fired on landing.
pub const JUMP_BUFFER_WINDOW: f32 = 0.1;

/// Minimum alignment (cosine) between a candidate wall normal and the pure
/// horizontal axis. Rejects near-45-degree ledges that would otherwise read
/// as walls.
pub const WALL_NORMAL_MIN_ALIGNMENT: f32 = 0.8;

/// Looser alignment used when choosing a wall-jump direction from an
/// already-accepted wall normal.
pub const WALL_ENGAGE_MIN_ALIGNMENT: f32 = 0.5;

/// How long a deliberately-left surface is ignored by the debounced contact
/// set, preventing an immediate re-snap after a jump departure.
pub const SURFACE_SUPPRESS_TIME: f32 = 0.25;

/// Refractory window after any jump of a given type before that type can
/// fire again; also the window after which the has-jumped flags clear on
/// re-confirmed contact.
pub const JUMP_REFRACTORY: f32 = 0.2;

/// Overlap margin for the tight "near geometry" proximity flag.
pub const NEAR_MARGIN: f32 = 0.1;

/// Overlap margin for the loose "almost near geometry" proximity flag.
pub const ALMOST_NEAR_MARGIN: f32 = 0.25;

/// Horizontal offset of the two whisker rays probing toward gravity.
pub const WHISKER_OFFSET: f32 = 0.4;

/// Length of the whisker rays.
pub const WHISKER_RANGE: f32 = 1.5;

/// Immersion fraction above which the fluid simulation applies forces.
pub const FLUID_ACTIVATION: f32 = 0.2;

/// Buoyancy density range; the blend factor favors the high end when input
/// opposes a detected downward fluid boundary.
pub const FLUID_DENSITY_MIN: f32 = 70.0;
pub const FLUID_DENSITY_MAX: f32 = 90.0;

/// Exponential velocity and spin decay inside fluid (per second).
pub const FLUID_DAMPING: f32 = 2.0;

/// Grace window so brief dips don't toggle the in-fluid state every tick.
pub const FLUID_COYOTE_TIME: f32 = 0.05;

/// Grace window after leaving a localized fluid blob, blocking fast/slow
/// fall while the exit trajectory settles.
pub const BLOB_EXIT_GRACE: f32 = 0.5;

/// Grace window after detaching from a wire during which the ride still
/// counts for jump eligibility.
pub const WIRE_COYOTE_TIME: f32 = 0.125;

/// Air-control attenuation window following a wire jump.
pub const WIRE_JUMP_WINDOW: f32 = 1.0;

/// Window after a gravity flip during which wall jumps aim with the old
/// gravity, keeping them usable mid-flip.
pub const GRAVITY_FLIP_GRACE: f32 = 0.2;

/// Window after touching a speed rail during which the ledge roll-over
/// boost is blocked.
pub const RAIL_GRACE: f32 = 0.05;

/// Duration of one 90-degree tip maneuver.
pub const TIP_DURATION: f32 = 0.3;

/// Nominal tip time used to size the tip torque (kept separate from the
/// timer duration on purpose; the maneuver is tuned slightly overlong).
pub const TIP_TIME: f32 = 0.25;

/// Window during which a tip and a ground jump arm the super jump if they
/// start within this long of each other.
pub const SUPERJUMP_SYNC: f32 = 0.04;

/// How long the super-jump opportunity stays armed after a qualifying tip.
pub const SUPERJUMP_WINDOW: f32 = 0.3;

/// Seconds airborne before contact friction starts drifting back to the
/// maximum, restoring control after long ice jumps.
pub const FRICTION_RECOVERY_DELAY: f32 = 2.0;

/// Drift rate of the friction recovery (friction units per second).
pub const FRICTION_RECOVERY_RATE: f32 = 10.0 / 3.0;

/// Speed ceiling when moving laterally / against gravity.
pub const MAX_SPEED_LATERAL: f32 = 25.0;

/// Speed ceiling when falling straight along gravity.
pub const MAX_SPEED_FALLING: f32 = 75.0;

/// Collision probe radii for the round profile of the character, blended by
/// the shape interpolation phase: 0 = precise square, 1 = cornering round.
pub const ROUND_RADIUS_SQUARE: f32 = 0.445;
pub const ROUND_RADIUS_ROUND: f32 = 0.707;

/// Full side length of the square profile at the two blend extremes.
pub const SQUARE_SIZE_SQUARE: f32 = 0.95;
pub const SQUARE_SIZE_ROUND: f32 = 0.89;

/// Rotational inertia of the character body (uniform unit box).
pub const ROTATIONAL_INERTIA: f32 = 1.0 / 6.0;

/// World gravity magnitude (units per second squared).
pub const GRAVITY: f32 = 9.81;

/// Friction assigned to surfaces that don't specify one.
pub const DEFAULT_SURFACE_FRICTION: f32 = 10.0;
