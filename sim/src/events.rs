//! Outward notifications emitted by the movement core.
//!
//! The core never calls into collaborators; everything a host needs to react
//! to (audio, visuals, statistics, level logic) is queued during the tick
//! and returned in the [`TickReport`]. Draining the report is the host's
//! job, once per tick.

use crate::world::{SurfaceId, WireHandle};

/// Which jump path fired. Carried on [`Event::Jump`] so the host can bucket
/// session counters per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Air,
    Wall,
    Ceiling,
}

/// One discrete notification from the tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Character (re)spawned via reset.
    Spawn,
    /// Character died. `suicide` marks deaths from the player's own reset
    /// trigger.
    Death { suicide: bool },
    /// A jump fired.
    Jump { kind: JumpKind },
    /// A jump fired while immersed in fluid (in addition to `Jump`).
    WaterJump,
    /// The surface the character jumped from should be poked (buttons,
    /// crumbling tiles).
    SurfaceContact { surface: SurfaceId },
    /// The character jumped off the wire it was riding; the wire system
    /// owns the detach.
    WireExit { wire: WireHandle },
}

/// Travel-distance accumulated over one tick, split the way the statistics
/// sink wants it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TravelDelta {
    pub total: f32,
    /// Distance covered while grounded with active horizontal input.
    pub grounded: f32,
    /// Distance covered while inside fluid.
    pub fluid: f32,
}

/// Everything one `advance` call hands back to the host.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub events: Vec<Event>,
    pub travel: TravelDelta,
    /// Effective surface friction for this tick, in `[0, 10]`. The physics
    /// layer applies it through its own material assignment.
    pub effective_friction: f32,
    /// True when `effective_friction` differs from the previous tick; the
    /// physics layer only needs to touch its material on change.
    pub friction_changed: bool,
}
