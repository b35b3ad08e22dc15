/*!
Movement state machine and force integrator.

[`Mover::advance`] is the single per-tick entry point. Its phases run in a
fixed order and each consumes the previous phase's output; the order is a
correctness requirement, not a style choice, since reordering changes
observable physics:

 1. input intake (buffering, purge, gravity-inverted axis flip)
 2. sensing refresh (contact tracker, fluid simulator)
 3. support/coyote resolution
 4. horizontal intent (deadzone, sharp turn, movement-start roll request)
 5. jump-flag clearing
 6. wall-roll gating
 7. friction derivation and situational overrides
 8. roll torque
 9. jump resolution (ground/air, wall, ceiling; mutually exclusive)
10. air control
11. fast-fall / slow-fall / wiggle assist
12. 90-degree tip maneuver
13. super jump
14. ledge roll-over boost
15. shape interpolation
16. clamp, drag, statistics, one-shot resets

The mover is the sole mutator of the body's kinematic state and the sole
emitter of outward notifications; collaborators talk to it through the
override calls below, and everything it wants to tell the outside world
comes back in the [`TickReport`].
*/

mod air;
mod friction;
mod jump;
mod support;
mod tip;

use crate::body::Body;
use crate::config::MoverConfig;
use crate::contact::ContactTracker;
use crate::events::{Event, TickReport, TravelDelta};
use crate::fluid::FluidSim;
use crate::input::{Recorder, TickInput};
use crate::timer::{TimerBank, TimerId};
use crate::tuning::{GRAVITY_FLIP_GRACE, INPUT_DEADZONE, RAIL_GRACE, WIRE_COYOTE_TIME};
use crate::utils::remap;
use crate::world::{FluidBlobHandle, Vec2, WireHandle, World};

/// Sign with Unity's `Mathf.Sign` convention: zero counts as positive.
/// Several tuned comparisons depend on this exact behavior.
#[inline]
pub(crate) fn sign(v: f32) -> f32 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

/// Apply the analog deadzone: below the threshold reads as zero, above it
/// snaps to the unit sign.
#[inline]
pub(crate) fn deadzoned(h: f32) -> f32 {
    if h.abs() >= INPUT_DEADZONE { sign(h) } else { 0.0 }
}

/// An active wire ride, handed in by the wire system.
#[derive(Clone, Copy, Debug)]
pub struct WireRide {
    pub handle: WireHandle,
    /// Whether the wire currently permits jumping off.
    pub can_jump_out: bool,
}

/// One character's movement state machine.
#[derive(Clone, Debug)]
pub struct Mover {
    pub config: MoverConfig,
    pub body: Body,
    pub timers: TimerBank,
    pub contacts: ContactTracker,
    pub fluid: FluidSim,
    pub recorder: Recorder,

    // This tick's processed input.
    pub(crate) input_h: f32,
    pub(crate) input_v: f32,
    pub(crate) jump: bool,
    pub(crate) jump_held: bool,
    pub(crate) has_no_input: bool,

    /// Debounced support state (frame contact filtered through coyote time).
    pub grounded: bool,
    pub(crate) has_spawned: bool,
    pub dead: bool,

    pub has_ground_jumped: bool,
    pub ground_jump_count: u32,
    pub has_wall_jumped: bool,
    pub walljump_dir: i32,
    pub has_ceiling_jumped: bool,
    /// Remaining air-jump budget (granted by pickups).
    pub air_jumps: u32,

    pub(crate) requested_flip: i32,
    pub(crate) queued_flip: i32,
    pub can_wall_roll: bool,
    pub(crate) wall_roll_side: i32,

    /// Physical friction sampled from contacts, in `[0, 10]`.
    pub contact_friction: f32,
    /// Collision-shape blend: 0 = precise square, 1 = cornering round.
    pub shape_blend: f32,
    pub(crate) prev_effective_friction: f32,

    pub(crate) ledge_boost_armed: bool,

    // Override one-shots and levels, consumed once per tick.
    pub(crate) outside_force_active: bool,
    pub(crate) jump_allowed: bool,
    pub(crate) jump_disallowed: bool,
    pub(crate) consume_jump: bool,
    pub(crate) air_control_limited: bool,
    pub(crate) jump_queued: bool,
    pub(crate) jump_everywhere: bool,

    pub(crate) wire: Option<WireRide>,
    pub(crate) fluid_blob: Option<FluidBlobHandle>,

    /// Velocity at the top of this tick, before any forces.
    pub(crate) frame_velocity: Vec2,
    /// `frame_velocity` of the previous tick.
    pub(crate) last_velocity: Vec2,

    spawn_position: Vec2,
    pub(crate) dt: f32,
    pub(crate) events: Vec<Event>,
}

impl Mover {
    /// Build a character at its spawn position. Config preconditions are
    /// validated here, once; the per-tick path assumes them.
    pub fn new(config: MoverConfig, spawn_position: Vec2) -> Self {
        config.validate();
        let mut mover = Self {
            config,
            body: Body::new(spawn_position),
            timers: TimerBank::new(),
            contacts: ContactTracker::new(),
            fluid: FluidSim::new(),
            recorder: Recorder::new(),

            input_h: 0.0,
            input_v: 0.0,
            jump: false,
            jump_held: false,
            has_no_input: true,

            grounded: false,
            has_spawned: false,
            dead: false,

            has_ground_jumped: false,
            ground_jump_count: 0,
            has_wall_jumped: false,
            walljump_dir: 0,
            has_ceiling_jumped: false,
            air_jumps: 0,

            requested_flip: 0,
            queued_flip: 0,
            can_wall_roll: false,
            wall_roll_side: 0,

            contact_friction: 10.0,
            shape_blend: 0.0,
            prev_effective_friction: 10.0,

            ledge_boost_armed: false,

            outside_force_active: false,
            jump_allowed: true,
            jump_disallowed: false,
            consume_jump: false,
            air_control_limited: false,
            jump_queued: false,
            jump_everywhere: false,

            wire: None,
            fluid_blob: None,

            frame_velocity: Vec2::zeros(),
            last_velocity: Vec2::zeros(),

            spawn_position,
            dt: 0.0,
            events: Vec::new(),
        };
        mover.reset();
        mover
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Not in contact with ground or walls.
    #[inline]
    pub fn is_not_supported(&self) -> bool {
        !self.grounded && !self.contacts.is_left_supported() && !self.contacts.is_right_supported()
    }

    /// Hanging under a ceiling in a state that counts as support (inside
    /// fluid, or with the jump-everywhere override).
    #[inline]
    pub fn is_ceiling_grounded(&self) -> bool {
        !self.grounded
            && (self.fluid.inside || self.jump_everywhere)
            && self.contacts.has_ceiling_contact()
            && !self.contacts.is_wall_supported()
    }

    #[inline]
    pub fn has_jumped(&self) -> bool {
        self.has_ground_jumped || self.has_wall_jumped || self.has_ceiling_jumped
    }

    /// Elapsed time of whichever jump window is active.
    pub(crate) fn any_jump_time(&self) -> f32 {
        if self.timers.is_running(TimerId::WallJump) {
            return self.timers.elapsed(TimerId::WallJump);
        }
        if self.timers.is_running(TimerId::CeilingJump) {
            return self.timers.elapsed(TimerId::CeilingJump);
        }
        self.timers.elapsed(TimerId::GroundJump)
    }

    pub(crate) fn has_left_surface_after_jump(&self) -> bool {
        (self.has_ground_jumped && self.timers.elapsed(TimerId::GroundJump) >= 0.1)
            || (self.has_wall_jumped && self.timers.elapsed(TimerId::WallJump) >= 0.1)
            || (self.has_ceiling_jumped && self.timers.elapsed(TimerId::CeilingJump) >= 0.1)
    }

    /// Normalized friction response in `[0, 1]`; the 0.4 exponent keeps
    /// mid-range surfaces grippy.
    #[inline]
    pub fn friction_coefficient(&self) -> f32 {
        if self.timers.is_running(TimerId::FrictionReset) {
            1.0
        } else {
            remap(0.0, 10.0, 0.0, 1.0, self.contact_friction).powf(0.4)
        }
    }

    #[inline]
    pub fn slippery_movement(&self) -> bool {
        self.contact_friction < 1.0
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reinitialize everything for a (re)spawn at the spawn position.
    /// Calling this twice without an intervening tick is the same as
    /// calling it once (modulo the duplicate spawn notification).
    pub fn reset(&mut self) {
        self.input_h = 0.0;
        self.input_v = 0.0;
        self.jump = false;
        self.jump_held = false;
        self.has_no_input = true;

        self.grounded = false;
        self.contacts.reset();
        self.fluid.reset();
        self.timers.clear_all();
        self.has_spawned = true;
        self.dead = false;

        self.has_ground_jumped = false;
        self.ground_jump_count = 0;
        self.has_wall_jumped = false;
        self.walljump_dir = 0;
        self.has_ceiling_jumped = false;

        self.requested_flip = 0;
        self.queued_flip = 0;
        self.can_wall_roll = false;
        self.wall_roll_side = 0;

        self.contact_friction = 10.0;
        self.shape_blend = 0.0;

        self.ledge_boost_armed = false;
        self.outside_force_active = false;
        self.jump_allowed = true;
        self.jump_disallowed = false;
        self.consume_jump = false;
        self.air_control_limited = false;
        self.jump_queued = false;
        self.jump_everywhere = false;

        self.wire = None;
        self.fluid_blob = None;

        self.frame_velocity = Vec2::zeros();
        self.last_velocity = Vec2::zeros();

        self.body = Body::new(self.spawn_position);

        if !self.recorder.is_playback() {
            self.recorder.start_recording();
        }

        log::debug!("spawn at {:?}", self.spawn_position);
        self.events.push(Event::Spawn);
    }

    /// Kill the character. `force` bypasses invincibility, `silent`
    /// suppresses the death notification (scripted transitions).
    pub fn kill(&mut self, force: bool, silent: bool) {
        self.kill_internal(force, silent, false);
    }

    fn kill_internal(&mut self, force: bool, silent: bool, suicide: bool) {
        if self.config.invincible && !force {
            return;
        }
        if self.dead || !self.config.resettable {
            return;
        }

        self.dead = true;
        self.wire = None;
        self.body.stop();
        self.shape_blend = 0.0;

        log::debug!("death (suicide: {suicide}, silent: {silent})");
        if !silent {
            self.events.push(Event::Death { suicide });
        }
    }

    /// Player-initiated reset. Honored only for resettable characters.
    pub fn try_suicide(&mut self) {
        if !self.config.resettable {
            return;
        }
        self.kill_internal(true, false, true);
    }

    // ------------------------------------------------------------------
    // Override calls (collaborator interface). Misuse is a silent no-op.
    // ------------------------------------------------------------------

    pub fn allow_jump(&mut self, allow: bool) {
        self.jump_allowed = allow;
    }

    pub fn disallow_jump(&mut self, disallow: bool) {
        self.jump_disallowed = disallow;
    }

    /// Suppress jumping for a fixed window.
    pub fn disallow_jump_for(&mut self, time: f32) {
        self.timers.restart_for(TimerId::JumpLockout, time);
    }

    /// Consume a buffered jump press without acting on it.
    pub fn use_jump(&mut self) {
        self.consume_jump = true;
    }

    /// Suppress this tick's air control.
    pub fn limit_air_movement(&mut self) {
        self.air_control_limited = true;
    }

    /// Mark the velocity as externally driven, relaxing frictional
    /// correction this tick.
    pub fn outside_force(&mut self) {
        self.outside_force_active = true;
    }

    /// Let the next jump fire regardless of support (ceiling runs).
    pub fn allow_jump_everywhere(&mut self) {
        self.jump_everywhere = true;
    }

    /// Fire a jump on the next tick without any press.
    pub fn jump_immediate(&mut self) {
        self.jump_queued = true;
    }

    /// Zero the input axes for a fixed window. Re-requesting extends but
    /// never shortens the window.
    pub fn purge_input(&mut self, time: f32) {
        if !self.timers.is_running(TimerId::InputPurge)
            || self.timers.remaining(TimerId::InputPurge) < time
        {
            self.timers.restart_for(TimerId::InputPurge, time);
        }
    }

    /// Force full surface friction for a short window.
    pub fn reset_friction(&mut self, time: f32) {
        self.timers.restart_for(TimerId::FrictionReset, time);
    }

    /// Speed rails block the ledge roll-over boost briefly.
    pub fn on_speed_rail(&mut self) {
        self.timers.start_for(TimerId::RailGrace, RAIL_GRACE);
    }

    /// External arming/disarming of the ledge roll-over assist.
    pub fn allow_ledge_assist(&mut self, allow: bool) {
        self.ledge_boost_armed = allow;
    }

    pub fn invert_gravity(&mut self) {
        self.set_gravity(!self.body.is_gravity_inverted());
    }

    pub fn set_gravity(&mut self, inverted: bool) {
        if self.body.is_gravity_inverted() != inverted {
            self.timers
                .restart_for(TimerId::GravityFlip, GRAVITY_FLIP_GRACE);
            self.body.gravity_scale = if inverted { -1.0 } else { 1.0 };
            log::debug!("gravity inverted: {inverted}");
        }
    }

    pub fn set_spawn_position(&mut self, position: Vec2) {
        self.spawn_position = position;
    }

    /// Checkpoint variant taking a full pose; only the translation matters,
    /// respawns always stand upright.
    pub fn set_spawn(&mut self, pose: crate::world::Pose) {
        self.spawn_position = pose.translation;
    }

    pub fn spawn_position(&self) -> Vec2 {
        self.spawn_position
    }

    /// Attach to (`Some`) or detach from (`None`) a wire. Detaching starts
    /// a coyote window during which the ride still counts for jumps.
    pub fn ride_wire(&mut self, wire: Option<WireRide>) {
        match wire {
            Some(ride) => {
                self.wire = Some(ride);
                self.timers.clear(TimerId::WireJump);
            }
            None => {
                self.timers
                    .restart_for(TimerId::WireCoyote, WIRE_COYOTE_TIME);
            }
        }
        self.reset_jump();
    }

    /// The wire launched the character. The wire owns the trajectory; only
    /// the timing windows react here, so the character doesn't regain air
    /// control for a few frames. No-op while not riding.
    pub fn wire_jump(&mut self, _direction: Vec2) {
        if self.wire.is_none() {
            return;
        }
        self.has_ground_jumped = false;
        self.timers.clear(TimerId::WallJump);
        self.has_wall_jumped = true;
        self.timers.clear(TimerId::GroundJump);
        self.timers
            .restart_for(TimerId::WireJump, crate::tuning::WIRE_JUMP_WINDOW);
    }

    /// Localized fluid blob override: while set, the effective friction is
    /// left untouched; clearing it starts the blob-exit grace window.
    pub fn set_fluid_blob(&mut self, blob: Option<FluidBlobHandle>) {
        if blob.is_none() && self.fluid_blob.is_some() {
            self.timers
                .start_for(TimerId::BlobExit, crate::tuning::BLOB_EXIT_GRACE);
        }
        self.fluid_blob = blob;
    }

    /// Generic jump-state reset shared by fluid entry and wire attachment.
    pub fn reset_jump(&mut self) {
        self.has_ground_jumped = false;
        self.has_wall_jumped = false;
    }

    pub fn set_air_jumps(&mut self, count: u32) {
        self.air_jumps = count;
    }

    pub fn stop_movement(&mut self) {
        self.body.stop();
    }

    // ------------------------------------------------------------------
    // The tick
    // ------------------------------------------------------------------

    /// Run one fixed-timestep update and return everything the host needs
    /// to act on.
    pub fn advance(&mut self, world: &World, raw: TickInput, dt: f32) -> TickReport {
        self.dt = dt;
        self.timers.tick(dt);

        // Wire coyote expiry cleans up a pending detach.
        if self.timers.just_expired(TimerId::WireCoyote) {
            self.wire = None;
        }

        if self.dead {
            return self.finish_report(TravelDelta::default(), self.prev_effective_friction);
        }

        // Phase 1: intake (the recorder sees the raw sample).
        let input = self.recorder.filter(raw);
        if input.reset {
            self.try_suicide();
            if self.dead {
                return self.finish_report(TravelDelta::default(), self.prev_effective_friction);
            }
        }
        self.intake(input);

        // Phase 2: sensing refresh.
        self.sense(world);

        // Phase 3: support/coyote resolution.
        self.resolve_support();

        // Phase 4: horizontal intent.
        self.horizontal_intent();

        // Phase 5: jump-flag clearing.
        self.clear_jump_flags();

        // Phase 6: wall-roll gating.
        self.update_wall_roll();

        // Phase 7: friction derivation.
        let effective_friction = self.derive_friction();

        // Phase 8: roll torque.
        self.apply_roll_torque();

        // Phase 9: jump resolution.
        self.resolve_jumps();

        // Phase 10: air control.
        self.air_control();

        // Phase 11: fast fall / slow fall / wiggle assist.
        self.vertical_assists();

        // Phase 12: 90-degree tip maneuver.
        self.tip_maneuver();

        // Phase 13: super jump.
        self.super_jump();

        // Phase 14: ledge roll-over boost.
        self.ledge_rollover(world);

        // Phase 15: shape interpolation.
        self.update_shape_blend();

        // Phase 16: clamp, drag, statistics, one-shot resets.
        let travel = self.clamp_and_finish();

        self.body.apply_accumulated_forces(dt);
        self.support_constraints();
        self.body.move_pose(dt);
        self.recorder.commit_pose(&self.body);

        self.finish_report(travel, effective_friction)
    }

    fn finish_report(&mut self, travel: TravelDelta, effective_friction: f32) -> TickReport {
        let friction_changed = effective_friction != self.prev_effective_friction;
        self.prev_effective_friction = effective_friction;
        TickReport {
            events: std::mem::take(&mut self.events),
            travel,
            effective_friction,
            friction_changed,
        }
    }

    /// Velocity-level support projection: remove the velocity component
    /// into each sensed contact so resting states are stable. Position
    /// level resolution stays with the host physics layer.
    fn support_constraints(&mut self) {
        let normals = [
            if self.contacts.frame_grounded {
                self.contacts.surface_normal
            } else {
                Vec2::zeros()
            },
            self.contacts.frame_left_normal,
            self.contacts.frame_right_normal,
            self.contacts.ceiling_normal,
        ];
        for normal in normals {
            if normal == Vec2::zeros() {
                continue;
            }
            let into = self.body.velocity.dot(&normal);
            if into < 0.0 {
                self.body.velocity -= normal * into;
            }
        }
    }
}

#[cfg(test)]
mod tests;
