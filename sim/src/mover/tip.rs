//! Phases 12 and 14-16: the 90-degree tip maneuver, the ledge roll-over
//! boost, shape interpolation, and the final clamp/drag/statistics pass.

use parry2d::shape as pshape;

use super::{Mover, sign};
use crate::events::TravelDelta;
use crate::timer::TimerId;
use crate::tuning::{
    MAX_SPEED_FALLING, MAX_SPEED_LATERAL, SUPERJUMP_WINDOW, TIP_DURATION, TIP_TIME,
};
use crate::utils::{damp, remap};
use crate::world::{Iso, Vec2, World};

/// Rotate a vector by an angle in radians.
#[inline]
fn rotated(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate a vector into the frame whose +Y axis is `up` (unit).
#[inline]
fn aligned_to(up: Vec2, v: Vec2) -> Vec2 {
    // Columns of the rotation: right = (up.y, -up.x), up.
    Vec2::new(v.x * up.y + v.y * up.x, -v.x * up.x + v.y * up.y)
}

impl Mover {
    /// Phase 12: once per jump window, snap the rotation toward the next
    /// 90-degree increment with a combined off-center impulse and torque.
    pub(crate) fn tip_maneuver(&mut self) {
        let tip = self.timers.get(TimerId::Tip);
        let tip_idle = !tip.is_running() && !tip.is_paused() && !tip.just_expired();

        if tip_idle
            && self.timers.elapsed(TimerId::GroundJump) < 0.1
            && self.requested_flip != 0
            && self.contacts.frame_grounded
            && !self.slippery_movement()
        {
            self.timers.start_for(TimerId::Tip, TIP_DURATION);

            // Slow spin on settled ground arms the super-jump opportunity.
            if self.body.angular_velocity.abs() < 100.0
                && self.timers.elapsed(TimerId::GroundDwell) > 0.25
                && !self.jump_everywhere
            {
                self.timers
                    .start_for(TimerId::SuperJumpWindow, SUPERJUMP_WINDOW);
            }

            let flip = self.requested_flip as f32;
            let up_sign = self.body.gravity_sign();
            let ceiling_flip = if self.is_ceiling_grounded() { -1.0 } else { 1.0 };
            let friction = self.friction_coefficient();

            // Off-center pivot, expressed against the next stable rotation
            // so the impulse grabs the leading corner.
            let pivot_local = rotated(
                Vec2::new(0.5 * flip, 0.5),
                -self.body.nearest_stable_rotation(0.0).to_radians(),
            ) * friction;
            let pivot_world =
                self.body.position + rotated(pivot_local, self.body.rotation_deg.to_radians());

            // Push direction follows the surface frame; slope steepness on
            // the movement side scales both the push and the torque.
            let surface_up = self.contacts.surface_normal * up_sign * ceiling_flip;
            let push_dir = aligned_to(
                surface_up,
                Vec2::new(flip, 0.25 * up_sign * ceiling_flip).normalize(),
            );
            let slope_scale = remap(
                -0.707,
                0.707,
                0.5,
                1.75,
                -self.contacts.surface_normal.x * flip,
            );

            self.body
                .apply_impulse_at(push_dir * 5.0 * slope_scale * friction, pivot_world);

            let torque_amount = 90.0 / TIP_TIME * 0.15 * slope_scale;
            self.body.apply_torque_impulse(
                torque_amount * self.dt * -flip * friction * up_sign * ceiling_flip,
            );
            self.body.angular_velocity *= 0.5 * friction * up_sign * ceiling_flip;
            self.body
                .apply_impulse(Vec2::new(1.0, 0.0) * self.input_h * 2.025);

            self.body.velocity.x *= remap(0.0, 10.0, 1.0, 0.7, self.body.velocity.x.abs());
        }

        // Airborne cancels the request and parks the maneuver.
        if !self.grounded {
            self.requested_flip = 0;
            self.queued_flip = 0;
            self.timers.stop(TimerId::Tip);
        }

        // Maneuver over (expired or parked): settle spin; a queued opposite
        // flip replaces the finished one.
        let tip = self.timers.get(TimerId::Tip);
        if tip.is_paused() || tip.just_expired() {
            self.body.angular_velocity *= 0.5;
            if self.queued_flip != 0 {
                self.requested_flip = self.queued_flip;
                self.queued_flip = 0;
            } else {
                self.requested_flip = 0;
            }
            self.timers.clear(TimerId::Tip);
        }
    }

    /// Phase 14: the ledge roll-over boost.
    pub(crate) fn ledge_rollover(&mut self, world: &World) {
        let up_sign = self.body.gravity_sign();

        // Arm while cleanly airborne (or in the first grounded instant);
        // settling on ground, fluid, or a rail grace disarms.
        if (self.timers.elapsed(TimerId::Airborne) > 0.02 && !self.grounded
            || self.timers.elapsed(TimerId::Airborne) == 0.0 && self.grounded)
            && self.friction_coefficient() >= 1.0
        {
            self.ledge_boost_armed = true;
        }
        if self.timers.elapsed(TimerId::GroundDwell) > 0.04
            || self.fluid.inside
            || self.timers.is_running(TimerId::RailGrace)
        {
            self.ledge_boost_armed = false;
        }

        // Trigger: wall support lost on the side we're still pushing
        // toward, near geometry, with the jump state not fighting it.
        let any_jump_time = self.any_jump_time();
        let lost_wall_toward_input = self.contacts.was_left_supported()
            && !self.contacts.is_left_supported()
            && self.input_h < 0.0
            || self.contacts.was_right_supported()
                && !self.contacts.is_right_supported()
                && self.input_h > 0.0;

        if (any_jump_time > 0.5
            || self.jump_held
            || !self.has_jumped()
            || self.has_left_surface_after_jump())
            && lost_wall_toward_input
            && self.friction_coefficient() > 0.25
            && self.timers.elapsed(TimerId::InputHold) > 0.08
            && (self.ledge_boost_armed || self.jump_held && any_jump_time > 0.1)
            && self.contacts.near_geometry
        {
            // Hazard check: if something lethal waits past the ledge and
            // we're rising fast, push further up instead of over.
            let mut hazard_past_edge = false;
            if !self.config.invincible && self.body.velocity.y * up_sign > 4.0 {
                let origin = self.body.position + Vec2::new(0.0, 0.333 * self.body.gravity_scale);
                let probe = pshape::Ball::new(0.1);
                if world.hazard_cast(
                    &probe,
                    Iso::new(origin, 0.0),
                    Vec2::new(self.input_h, 0.0) * 1.15,
                ) {
                    hazard_past_edge = true;
                    let vy = self.body.velocity.y;
                    let boosted = (vy.abs() + self.body.velocity.x.abs() * 0.25).max(11.5);
                    self.body.velocity = Vec2::new(0.0, sign(vy) * boosted);
                }
            }

            if !hazard_past_edge {
                if self.body.velocity.y * up_sign > 0.0 {
                    // Rising: grant the roll-over correction window.
                    self.body.velocity = Vec2::new(
                        self.input_h * 5.0,
                        self.body.velocity.y * self.friction_coefficient(),
                    );
                    self.timers.clear(TimerId::LedgeBoost);
                    self.timers.start(TimerId::LedgeBoost);
                }
                if self.body.velocity.y * up_sign < 0.0 {
                    // Falling off instead: cancel the wall-roll carry.
                    self.body.velocity = Vec2::new(0.0, self.body.velocity.y);
                }
            }
        }

        // The correction decays over ~0.2s, then ends with a final nudge.
        if self.timers.is_running(TimerId::LedgeBoost) {
            let mut boost =
                Vec2::new(self.input_h * 50.0, 0.0) + self.body.gravity_dir() * 10.0;
            boost *= remap(0.0, 0.2, 1.0, 0.0, self.timers.elapsed(TimerId::LedgeBoost));
            self.body.apply_force(boost);

            let vy = self.body.velocity.y;
            self.body.velocity.y = vy.abs().min(5.0) * sign(vy) * 0.5;

            if self.timers.get(TimerId::LedgeBoost).has_elapsed(0.2) {
                self.body
                    .apply_impulse(Vec2::new(self.input_h, 0.0) + self.body.gravity_dir());
                self.timers.clear(TimerId::LedgeBoost);
            }
        }
    }

    /// Phase 15: blend the collision profile between square and round as a
    /// function of sustained input and spin.
    pub(crate) fn update_shape_blend(&mut self) {
        self.shape_blend = remap(0.1, 0.175, 0.0, 1.0, self.timers.elapsed(TimerId::InputHold));

        // Wedged between wall and ground while barely rotating: stay square
        // so the character doesn't hover on its rounded corner.
        if self.grounded
            && (self.input_h > 0.0 && self.contacts.is_right_supported()
                || self.input_h < 0.0 && self.contacts.is_left_supported())
            && self.body.angular_velocity.abs() < 50.0
        {
            self.shape_blend *= remap(3.0, 4.0, 0.0, 1.0, self.last_velocity.norm());
        }
        if !self.contacts.is_wall_supported() {
            self.shape_blend *= remap(270.0, 360.0, 0.0, 1.0, self.body.angular_velocity.abs());
        }
    }

    /// Phase 16: speed ceiling, low-speed drag, travel statistics, one-shot
    /// resets. Returns the tick's travel deltas.
    pub(crate) fn clamp_and_finish(&mut self) -> TravelDelta {
        let up_sign = self.body.gravity_sign();

        // Direction-dependent speed ceiling: falling along gravity is
        // allowed much more speed than lateral movement.
        let vel = self.body.velocity;
        if vel.norm_squared() > 0.0 {
            let falling_dot = vel.normalize().dot(&Vec2::new(0.0, -up_sign));
            let max_speed = remap(0.0, 1.0, MAX_SPEED_LATERAL, MAX_SPEED_FALLING, falling_dot);
            if vel.norm() > max_speed {
                let eased = damp(vel.norm(), max_speed, 0.99, self.dt * 20.0);
                self.body.velocity = vel.normalize() * eased;
            }
        }

        // Light horizontal drag at low speeds.
        self.body.velocity.x *= remap(2.0, 4.0, 0.9975, 1.0, self.body.velocity.x.abs());

        // Travel statistics for the external sink.
        let frame_travel = self.body.velocity.norm() * self.dt;
        let travel = TravelDelta {
            total: frame_travel,
            grounded: if self.input_h != 0.0 && self.grounded {
                frame_travel
            } else {
                0.0
            },
            fluid: if self.fluid.inside { frame_travel } else { 0.0 },
        };

        // One-shot resets.
        if self.contacts.frame_grounded
            || self.contacts.is_wall_supported()
            || self.contacts.has_ceiling_contact()
        {
            self.outside_force_active = false;
        }
        self.air_control_limited = false;
        self.jump = false;
        self.jump_allowed = true;
        self.jump_disallowed = false;
        self.consume_jump = false;
        self.jump_everywhere = false;

        // Revert the vertical axis for external readers under inverted
        // gravity.
        if self.body.is_gravity_inverted() {
            self.input_v = -self.input_v;
        }

        self.last_velocity = self.frame_velocity;
        travel
    }
}
