//! Phases 7-8: effective friction derivation and roll torque.
//!
//! The physical friction sample stays in `contact_friction`; what this
//! phase produces is the *effective* friction the physics layer should use
//! this tick. Situational overrides push it toward 0 (ice slides, wall
//! hangs, tube wedges, ceiling glides) or 10 (explicit reset); the value is
//! reported each tick and the host re-applies it only when it changed.

use super::{Mover, sign};
use crate::timer::TimerId;
use crate::tuning::{FRICTION_RECOVERY_DELAY, FRICTION_RECOVERY_RATE};
use crate::utils::{move_toward, remap};
use crate::world::Vec2;

impl Mover {
    /// Phase 7. Returns this tick's effective friction in `[0, 10]`.
    pub(crate) fn derive_friction(&mut self) -> f32 {
        let cfg = self.config;
        let left = self.contacts.is_left_supported();
        let right = self.contacts.is_right_supported();
        let wall = left || right;
        let frame_grounded = self.contacts.frame_grounded;

        // Long airtime drifts the sampled friction back toward full grip,
        // restoring control after extended ice jumps.
        if self.timers.elapsed(TimerId::Airborne) > FRICTION_RECOVERY_DELAY {
            self.contact_friction = move_toward(
                self.contact_friction,
                10.0,
                FRICTION_RECOVERY_RATE * self.dt,
            );
        }

        let mut effective = self.contact_friction;

        if self.grounded
            && self.body.velocity.norm_squared() < 1.0
            && wall
            && self.input_h != 0.0
        {
            // Pressed into a wall while barely moving: almost frictionless
            // so the push can win.
            effective = 0.1;
        }
        if self.contact_friction < 1.0
            && self.frame_velocity.x.abs() > cfg.max_move_speed
            && self.input_h == sign(self.frame_velocity.x)
        {
            // Committed ice slide.
            effective = 0.01;
        }
        if wall && self.body.velocity.y > 0.0 && self.input_h == 0.0
            || wall && self.contacts.has_ceiling_contact() && self.input_h != 0.0
        {
            // Stationary wall hang.
            effective = 0.0;
        }
        if !wall && !self.grounded && !frame_grounded {
            effective = 0.0;
            // Freshly airborne and slow: settle the rotation toward the
            // nearest quarter turn.
            if self.timers.elapsed(TimerId::Airborne) < 0.15 && self.body.velocity.norm() < 0.5 {
                let stable_angle = self.body.nearest_stable_rotation(0.0) - self.body.rotation_deg;
                self.body.apply_torque(stable_angle * 10.0);
            }
        }
        if self.body.velocity.x.abs() < 0.1
            && self.input_h != 0.0
            && (right && self.input_h < 0.0 || left && self.input_h > 0.0)
        {
            // Stuck against geometry: drop friction and nudge free.
            effective = 0.0;
            self.body.velocity.x = self.input_h * 0.5;
            if self.grounded {
                self.body.velocity -= self.body.gravity_dir() * 0.1;
            }
            if self.contacts.has_ceiling_contact() {
                self.body.velocity += self.body.gravity_dir() * 0.1;
            }
        }
        if self.timers.is_running(TimerId::FrictionReset) {
            effective = 10.0;
        }
        let wall_roll_window = cfg.wall_roll_time * cfg.wall_roll_time_mult;
        if self.timers.elapsed(TimerId::WallRoll) >= wall_roll_window + 0.05
            || self.timers.elapsed(TimerId::WallRoll) == 0.0
                && wall
                && !self.grounded
                && self.input_h != 0.0
        {
            // The wall turns slippery once the roll assist is spent.
            effective = 0.0;
        }
        if self.contacts.has_ceiling_contact()
            && !self.grounded
            && !wall
            && !self.outside_force_active
            && !self.air_control_limited
        {
            // Ceiling glide.
            effective = 0.0;
        }
        if self.contacts.has_ceiling_contact() && self.fluid.inside {
            effective = 0.01;
        }

        // Neutral input against walls: keep wall contact stable with a
        // gentle push, and once the wall is gone, zero the residual motion
        // so the fall continues cleanly.
        if self.input_h == 0.0 && !self.grounded && self.body.velocity.x.abs() < 5.0 {
            if wall {
                effective = 0.0;
                if right {
                    self.body.apply_impulse(Vec2::new(0.1, 0.0));
                }
                if left {
                    self.body.apply_impulse(Vec2::new(-0.1, 0.0));
                }
            } else if self.contacts.was_wall_supported() && self.body.velocity.x.abs() < 0.25 {
                let shift = (if self.contacts.was_right_supported() { -1.0 } else { 0.0 })
                    + (if self.contacts.was_left_supported() { 1.0 } else { 0.0 });
                self.body.position += Vec2::new(shift, 0.0) * 0.01;
                self.body.velocity.x = 0.0;
                self.body.angular_velocity = 0.0;
            }
        }

        // A localized fluid blob owns the material while it is attached.
        if self.fluid_blob.is_some() {
            effective = self.prev_effective_friction;
        }

        // Ice-slide entry boost: landing on ice with neutral input keeps
        // the approach speed consistent by converting some vertical speed.
        if frame_grounded
            && effective < 1.0
            && self.timers.elapsed(TimerId::GroundDwell) < 0.05
            && self.input_h == 0.0
            && self.contacts.surface_normal.x.abs() < 0.1
        {
            let carried = self
                .frame_velocity
                .x
                .abs()
                .max(self.body.velocity.x.abs())
                * sign(self.body.velocity.x);
            if carried.abs() > 4.0 {
                self.body.velocity += Vec2::new(1.0, 0.0) * self.body.velocity.y.abs() * 0.1;
            }
        }

        effective
    }

    /// Phase 8: continuous roll torque plus the wall-squeeze exit spin fix.
    pub(crate) fn apply_roll_torque(&mut self) {
        let cfg = self.config;

        let mut torque = -self.input_h;
        // Torque ramps in over input hold time; much faster on ice where
        // grip can't be relied on.
        if self.slippery_movement() {
            torque *= remap(0.025, 0.05, 0.0, 1.0, self.timers.elapsed(TimerId::InputHold));
        } else {
            torque *= remap(0.1, 0.15, 0.0, 1.0, self.timers.elapsed(TimerId::InputHold));
        }
        if self.grounded || self.contacts.is_left_supported() || self.contacts.is_right_supported()
        {
            torque *= cfg.ground_torque;
        } else {
            torque *= cfg.air_torque;
        }
        if self.is_ceiling_grounded() {
            torque = -torque;
        }
        if self.body.is_gravity_inverted() {
            torque = -torque;
        }
        self.body.apply_torque(torque);

        // Leaving a dual-wall squeeze: jumping out gets a small spin kick,
        // falling out gets the spin zeroed.
        if self.contacts.was_left_supported()
            && self.contacts.was_frame_left_supported()
            && self.contacts.was_frame_right_supported()
            && !self.contacts.is_frame_left_supported()
            && !self.contacts.is_frame_right_supported()
        {
            if self.timers.is_running(TimerId::GroundJump)
                && self.body.velocity.y * self.body.gravity_scale > 0.0
            {
                self.body.apply_torque_impulse(cfg.impulse_air_torque);
            } else {
                self.body.angular_velocity = 0.0;
            }
        }
    }
}
