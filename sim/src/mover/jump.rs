//! Phase 9: jump resolution, and phase 13: the super jump.
//!
//! Three jump paths evaluate per tick with strict mutual exclusion:
//! triggering one clears the others' active flags, while each re-arms
//! independently once its own refractory timer lapses.

use super::{Mover, sign};
use crate::events::{Event, JumpKind};
use crate::timer::TimerId;
use crate::tuning::{SUPERJUMP_SYNC, SURFACE_SUPPRESS_TIME, WALL_ENGAGE_MIN_ALIGNMENT};
use crate::utils::remap;
use crate::world::Vec2;

impl Mover {
    /// Phase 9.
    pub(crate) fn resolve_jumps(&mut self) {
        let cfg = self.config;
        let gravity = self.body.gravity();
        let gravity_up = -gravity.normalize();

        // External conditions that stand in for ground support: pushing off
        // a fluid surface, or a wire that allows jumping out.
        let fluid_edge_jump = self.fluid.inside
            && self.timers.elapsed(TimerId::FluidDwell) > 0.05
            && (self.fluid.on_edge == 0
                || self.input_h == 0.0
                || self.fluid.on_edge as f32 == -self.input_h);
        let external_jump =
            fluid_edge_jump || self.wire.map(|w| w.can_jump_out).unwrap_or(false);

        let wedged = self.contacts.is_wedged();

        // Air-jump eligibility: airborne with budget, away from walls and
        // ceiling. Moving hard against the input direction converts the
        // attempt into a directional wall-style launch instead.
        let mut air_jump = false;
        let mut budgeted_air_jump = false;
        let mut redirected_air_jump = false;
        if self.jump
            && !self.grounded
            && (self.ground_jump_count + (if self.has_ground_jumped { 0 } else { 1 })
                < cfg.max_ground_jumps
                || self.air_jumps > 0)
            && !self.contacts.is_left_supported()
            && !self.contacts.is_right_supported()
            && !self.is_ceiling_grounded()
        {
            if self.air_jumps > 0 {
                budgeted_air_jump = true;
                self.air_jumps -= 1;
            }
            air_jump = true;

            if self.body.velocity.x * sign(self.input_h) < -2.0 {
                budgeted_air_jump = false;
                air_jump = false;
                redirected_air_jump = true;
            }
        }

        // --- Ground / air jump -----------------------------------------
        let ground_jump_ready = self.timers.elapsed(TimerId::GroundJump) > 0.2
            || !self.timers.is_running(TimerId::GroundJump);
        if (self.jump_queued || air_jump)
            || (self.grounded || external_jump || wedged)
                && self.jump
                && self.jump_allowed
                && !self.jump_disallowed
                && !self.timers.is_running(TimerId::JumpLockout)
                && (!self.has_jumped()
                    || wedged
                    || self.has_jumped() && self.timers.is_running(TimerId::WireCoyote))
                && ground_jump_ready
        {
            let wire_exit = self.wire.take();
            let in_fluid = self.fluid.inside;

            let mut new_vx = self.body.velocity.x;
            // Trim excess speed when jumping off after a long grounded run
            // (keeps vertically-moving-platform launches sane).
            if !external_jump
                && self.input_h != 0.0
                && self.input_h == sign(self.body.velocity.x)
                && self.timers.elapsed(TimerId::GroundDwell) > 0.25
            {
                new_vx *= remap(
                    cfg.max_move_speed * 1.5,
                    cfg.max_move_speed * 2.0,
                    1.0,
                    0.8,
                    self.body.velocity.x.abs(),
                );
            }

            // Vertical velocity surgery depends on what we jump from.
            if self.timers.is_running(TimerId::Tip) {
                self.body.velocity = Vec2::new(new_vx, 0.0);
            }
            if in_fluid {
                self.body.velocity = Vec2::new(new_vx, self.body.velocity.y * 0.3);
                self.events.push(Event::WaterJump);
            } else if wire_exit.is_some() {
                self.body.velocity = Vec2::new(new_vx, self.body.velocity.y * 0.25);
            } else {
                self.body.velocity = Vec2::new(
                    new_vx,
                    self.body.velocity.y * self.contacts.surface_normal.y.abs(),
                );
            }
            if budgeted_air_jump {
                self.body.velocity = Vec2::new(new_vx, 0.0);
            }

            // Closed-form impulse from configured jump height and gravity.
            let excess = 2.0 * (cfg.jump_height - 1.0);
            let mut strength = excess / (excess / gravity.norm()).sqrt();

            // Remove any remaining downward component along the jump axis.
            let along = self.body.velocity.dot(&gravity_up);
            if along < 0.0 {
                self.body.velocity -= gravity_up * along;
            }

            // Up-slope boost: jumping into a slope converts approach speed
            // into extra height.
            let up_sign = self.body.gravity_sign();
            let normal_y = self.contacts.surface_normal.y * up_sign;
            if !self.timers.is_running(TimerId::SharpTurn)
                && self.contacts.surface_normal != Vec2::zeros()
                && normal_y < 0.95
                && self.input_h != 0.0
                && sign(-self.contacts.surface_normal.x) == self.input_h
            {
                strength += remap(1.0, 0.707, 0.5, 1.5, normal_y);
                self.body.velocity = Vec2::new(
                    self.body.velocity.x * remap(0.8, 0.707, 1.0, 0.5, normal_y),
                    0.0,
                );
            }
            if in_fluid {
                strength += remap(1.75, 1.25, 0.0, 2.0, self.body.velocity.y);
            }

            self.body.apply_impulse(gravity_up * strength);
            if self.timers.is_running(TimerId::HopAssist) {
                self.body.apply_impulse(Vec2::new(self.input_h, 0.0));
            }

            if let Some(surface) = self.contacts.ground_surface {
                self.events.push(Event::SurfaceContact { surface });
            }

            if !air_jump {
                self.has_ground_jumped = true;
            }
            if !budgeted_air_jump {
                self.ground_jump_count += 1;
            }
            // Mutual exclusion: this path owns the jump flags for the tick.
            self.has_wall_jumped = false;
            self.walljump_dir = 0;
            self.has_ceiling_jumped = false;

            self.jump_queued = false;
            self.timers.clear(TimerId::GroundJump);
            self.timers.start(TimerId::GroundJump);
            self.timers.clear(TimerId::LedgeBoost);
            self.ledge_boost_armed = false;
            self.timers.stop(TimerId::JumpBuffer);

            if let Some(ride) = wire_exit {
                self.events.push(Event::WireExit { wire: ride.handle });
            }
            let kind = if air_jump { JumpKind::Air } else { JumpKind::Ground };
            log::debug!("jump: {kind:?}");
            self.events.push(Event::Jump { kind });
        }

        // Ceiling contact cancels the hold-extension window outright.
        if self.timers.is_running(TimerId::GroundJump) && self.contacts.has_ceiling_contact() {
            self.timers.clear(TimerId::GroundJump);
        }

        // Variable jump height: holding extends the upward force, up to the
        // max window; the minimum window applies regardless.
        let jump_elapsed = self.timers.elapsed(TimerId::GroundJump);
        if self.timers.is_running(TimerId::GroundJump)
            && (jump_elapsed < cfg.jump_min_time
                || jump_elapsed < cfg.jump_max_time && self.jump_held)
        {
            let mut mult = 1.0;
            if self.fluid.inside {
                mult *= 0.5;
            }
            self.body
                .apply_force(gravity_up * cfg.jump_extra_strength * mult * gravity.norm());
        }

        // --- Wall jump --------------------------------------------------
        if !self.grounded
            && self.jump
            && self.jump_allowed
            && !self.jump_disallowed
            && !self.timers.is_running(TimerId::JumpLockout)
            && (!self.timers.is_running(TimerId::GroundJump)
                || self.timers.elapsed(TimerId::GroundJump) > 0.01)
            && !(self.contacts.is_frame_right_supported() && self.contacts.is_frame_left_supported())
        {
            let in_fluid = self.fluid.inside;
            self.walljump_dir = 0;
            let mut jump_valid = false;

            if self.contacts.left_normal.dot(&Vec2::new(1.0, 0.0)) > WALL_ENGAGE_MIN_ALIGNMENT
                && !in_fluid
                || self.fluid.on_edge > 0
                    && self.input_h >= 0.0
                    && (!in_fluid || self.input_h > 0.0)
            {
                self.walljump_dir += 1;
                jump_valid = true;
                self.timers
                    .start_for(TimerId::LeftWallSuppress, SURFACE_SUPPRESS_TIME);
            } else if self.contacts.right_normal.dot(&Vec2::new(-1.0, 0.0))
                > WALL_ENGAGE_MIN_ALIGNMENT
                && !in_fluid
                || self.fluid.on_edge < 0
                    && self.input_h <= 0.0
                    && (!in_fluid || self.input_h < 0.0)
            {
                self.walljump_dir -= 1;
                jump_valid = true;
                self.timers
                    .start_for(TimerId::RightWallSuppress, SURFACE_SUPPRESS_TIME);
            }
            if redirected_air_jump {
                self.walljump_dir = sign(self.input_h) as i32;
                jump_valid = true;
            }

            if jump_valid {
                // Diagonal launch: away from the wall plus anti-gravity.
                // During a gravity flip the old axis still applies.
                let anti_gravity = -sign(gravity.y)
                    * (if self.timers.is_running(TimerId::GravityFlip) {
                        -1.0
                    } else {
                        1.0
                    });
                let mut trajectory =
                    Vec2::new(self.walljump_dir as f32, anti_gravity).normalize();
                if cfg.downward_wall_jump_enabled && self.input_v < -0.995 {
                    trajectory = Vec2::new(trajectory.x, -trajectory.y * 0.25);
                }

                self.body.velocity = Vec2::zeros();
                self.body.apply_impulse(trajectory * cfg.walljump_strength);

                let surface = if self.walljump_dir > 0 {
                    self.contacts.left_surface
                } else {
                    self.contacts.right_surface
                };
                if let Some(surface) = surface {
                    self.events.push(Event::SurfaceContact { surface });
                }

                self.body.angular_velocity = 0.0;
                self.body
                    .apply_torque_impulse(-(self.walljump_dir as f32) * cfg.impulse_torque * 0.25);

                self.has_wall_jumped = true;
                self.has_ground_jumped = false;
                self.ground_jump_count = 0;
                self.has_ceiling_jumped = false;
                self.timers.clear(TimerId::WallJump);
                self.timers.start(TimerId::WallJump);
                self.timers.start(TimerId::HopAssist);
                self.timers.clear(TimerId::WallRoll);
                self.timers.clear(TimerId::LedgeBoost);
                self.ledge_boost_armed = false;
                self.timers.clear(TimerId::WireJump);
                self.timers.stop(TimerId::JumpBuffer);

                log::debug!("jump: Wall (dir {})", self.walljump_dir);
                self.events.push(Event::Jump { kind: JumpKind::Wall });
            }
        }

        // Short-hop penalty: releasing jump early in the wall-jump window
        // pulls the arc down with extra gravity and velocity decay.
        if self.timers.is_running(TimerId::WallJump)
            && self.timers.elapsed(TimerId::WallJump) < cfg.walljump_max_time
            && !self.jump_held
        {
            self.body
                .apply_force(gravity * cfg.walljump_short_gravity_boost);
            self.body.velocity = self
                .body
                .velocity
                .lerp(&Vec2::zeros(), cfg.walljump_short_drag * self.dt);
        }

        // --- Ceiling jump -----------------------------------------------
        let ceiling_ready = self.timers.elapsed(TimerId::CeilingJump) > 0.2
            || !self.timers.is_running(TimerId::CeilingJump);
        if self.jump_queued
            || (self.contacts.has_ceiling_contact() && self.jump_everywhere)
                && self.jump
                && self.jump_allowed
                && !self.jump_disallowed
                && !self.timers.is_running(TimerId::JumpLockout)
                && ceiling_ready
        {
            // Remove any component toward the ceiling, then push along
            // gravity, away from it.
            let along = self.body.velocity.dot(&gravity);
            if along < 0.0 {
                let n = gravity.normalize();
                let toward = self.body.velocity.dot(&n);
                self.body.velocity -= n * toward;
            }
            self.body
                .apply_impulse(gravity.normalize() * cfg.ceilingjump_strength);

            self.has_ceiling_jumped = true;
            self.timers.clear(TimerId::CeilingJump);
            self.timers.start(TimerId::CeilingJump);

            self.has_wall_jumped = false;
            self.has_ground_jumped = false;
            self.timers.clear(TimerId::WallJump);
            self.ledge_boost_armed = false;

            log::debug!("jump: Ceiling");
            self.events.push(Event::Jump { kind: JumpKind::Ceiling });
        }
    }

    /// Phase 13: the super jump arms when a tip and a ground jump start
    /// nearly together inside an armed window; it thrusts through the first
    /// half of the max-hold window and dies the moment jump is released.
    pub(crate) fn super_jump(&mut self) {
        if self.timers.is_running(TimerId::SuperJumpWindow)
            && !self.timers.is_running(TimerId::SuperJump)
            && self.timers.is_running(TimerId::GroundJump)
            && self.timers.is_running(TimerId::Tip)
            && self.timers.elapsed(TimerId::GroundJump) < SUPERJUMP_SYNC
            && self.timers.elapsed(TimerId::Tip) < SUPERJUMP_SYNC
        {
            self.timers
                .start_for(TimerId::SuperJump, self.config.jump_max_time * 0.5);
            log::debug!("super jump armed");
        }
        if self.timers.is_running(TimerId::SuperJump) {
            let thrust = -self.body.gravity().normalize()
                * self.config.superjump_strength
                * self.timers.progress(TimerId::SuperJump);
            self.body.apply_force(thrust);
        }
        if !self.jump_held {
            self.timers.clear(TimerId::SuperJump);
        }
    }
}
