//! Phases 10-11: air control, descent shaping and the vertical assists.

use super::{Mover, sign};
use crate::timer::TimerId;
use crate::utils::{clamp01, inverse_lerp, lerp, remap};
use crate::world::Vec2;

impl Mover {
    /// Phase 10: horizontal force while airborne, plus wall-descent drag
    /// and the angular drag schedule.
    pub(crate) fn air_control(&mut self) {
        let cfg = self.config;
        let left = self.contacts.is_left_supported();
        let right = self.contacts.is_right_supported();
        let up_sign = self.body.gravity_sign();
        let wall_roll_window = cfg.wall_roll_time * cfg.wall_roll_time_mult;

        let vel = self.body.velocity;
        let rolling_up_wall = |on_wall: bool| {
            on_wall && self.can_wall_roll && self.timers.elapsed(TimerId::WallRoll) < wall_roll_window
        };
        let steerable = self.input_h > 0.0
            && (!right && vel.x < cfg.max_move_speed || rolling_up_wall(right))
            || self.input_h < 0.0 && (!left && vel.x > -cfg.max_move_speed || rolling_up_wall(left));

        if !self.grounded && !self.air_control_limited && steerable {
            let mut mult = 1.0;

            // Falling into an engaged wall: strong push helps clear the
            // edge; on grippy walls the fall itself is eased instead.
            if self.input_h > 0.0 && right || self.input_h < 0.0 && left {
                if self.friction_coefficient() >= 1.0 {
                    mult = lerp(10.0, 2.0, clamp01(vel.x.abs()));
                    if vel.y * up_sign < 0.0 {
                        self.body.velocity = vel.lerp(&Vec2::new(vel.x, 0.0), self.dt * 4.0);
                    }
                } else {
                    let assist = if self.has_wall_jumped { 0.85 } else { 0.3 };
                    self.body.apply_force(-self.body.gravity() * assist);
                }
            }

            // Jumping on the spot: ramp control in so precise rotations
            // stay possible.
            if self.has_ground_jumped && vel.x.abs() < 0.5 {
                mult *= remap(0.06, 0.2, 0.0, 1.0, self.timers.elapsed(TimerId::InputHold));
            }

            // Recent wall/wire jumps get consistent arcs.
            let wall_or_wire = self.timers.elapsed(TimerId::WallJump).max(
                if self.timers.is_running(TimerId::WireJump) {
                    self.timers.elapsed(TimerId::WireJump)
                } else {
                    0.0
                },
            );
            if wall_or_wire > 0.0 {
                mult *= remap(0.1, 0.2, 0.0, 1.0, wall_or_wire);
            }

            // Sloped ceilings: no running up the ceiling.
            if self.contacts.has_ceiling_contact()
                && sign(-self.contacts.ceiling_normal.x) == self.input_h
                && !self.outside_force_active
            {
                mult = 0.0;
            }
            // Unless a force pushed us up there to start a ceiling run.
            if self.outside_force_active && self.contacts.has_ceiling_contact() {
                mult *= remap(0.1, 0.15, 0.0, 1.0, self.timers.elapsed(TimerId::InputHold));
            }

            // Rolling over an edge without a jump handles better with a
            // little extra control at first.
            if !self.has_jumped() && self.friction_coefficient() >= 1.0 {
                mult *= remap(0.2, 0.4, 1.6, 1.0, self.timers.elapsed(TimerId::Airborne));
            }

            self.body.apply_force(
                Vec2::new(self.input_h, 0.0) * cfg.air_speed * mult * self.friction_coefficient(),
            );
        }

        // Pressing into a wall while descending eases the fall toward a
        // capped slide speed.
        let vel = self.body.velocity;
        if vel.y * up_sign < 0.0
            && (right && self.input_h > 0.0 || left && self.input_h < 0.0)
        {
            let capped = if self.body.is_gravity_inverted() {
                vel.y.min(4.0)
            } else {
                vel.y.max(-4.0)
            };
            self.body.velocity = vel.lerp(&Vec2::new(vel.x, capped), self.dt * 4.0);
        }

        // Angular drag schedule: resting on a surface damps spin by slope;
        // everything else coasts.
        if self.grounded && self.input_h == 0.0 {
            let normal_y = self.contacts.surface_normal.y;
            self.body.angular_drag = if normal_y < 0.8 {
                remap(0.8, 0.72, 10.0, 0.0, normal_y)
            } else {
                remap(1.0, 0.8, 0.0, 10.0, normal_y)
            };
        } else {
            self.body.angular_drag = 0.2;
        }
    }

    /// Phase 11: fast fall, slow fall, and the wiggle assist.
    pub(crate) fn vertical_assists(&mut self) {
        let gravity = self.body.gravity();
        let speed = self.body.velocity.norm();

        // Fast fall: hard down input scales gravity up, less so at speed.
        if self.config.fast_fall_enabled
            && self.input_v < -0.85
            && speed < 30.0
            && self.is_not_supported()
            && !self.contacts.has_ceiling_contact()
            && !self.timers.is_running(TimerId::BlobExit)
        {
            let mut boost = lerp(2.0, 0.5, clamp01(inverse_lerp(0.0, 30.0, speed)).powf(0.25));
            if self.fluid.inside {
                boost *= 0.25;
            }
            if self.timers.is_running(TimerId::WallJump) {
                boost *= remap(0.1, 0.2, 0.0, 1.0, self.timers.elapsed(TimerId::WallJump));
            }
            self.body.apply_force(gravity * boost);
        }

        // Slow fall: hard up input counters gravity a little, only while
        // already moving with it.
        if self.input_v > 0.85
            && self.body.velocity.dot(&gravity) > 0.0
            && self.is_not_supported()
            && !self.contacts.has_ceiling_contact()
            && (!self.timers.is_running(TimerId::WallJump)
                || self.timers.elapsed(TimerId::WallJump) > 0.7)
            && !self.timers.is_running(TimerId::BlobExit)
        {
            self.body.apply_force(-gravity * 0.2);
        }

        // Wiggle assist: alternating direction flips right after a ground
        // jump are rewarded with a nudge of extra height.
        if self.is_not_supported()
            && sign(self.body.velocity.x) != sign(self.last_velocity.x)
            && sign(self.body.velocity.x) == self.input_h
            && sign(self.last_velocity.x) != self.input_h
            && self.has_ground_jumped
            && self.body.velocity.dot(&gravity) < 0.0
        {
            self.body.apply_impulse(-gravity * 0.025);
        }
    }
}
