//! Phases 1-6: input intake, sensing refresh, support resolution,
//! horizontal intent, jump-flag clearing and wall-roll gating.

use super::{Mover, deadzoned, sign};
use crate::input::TickInput;
use crate::timer::TimerId;
use crate::tuning::JUMP_BUFFER_WINDOW;
use crate::utils::{lerp, remap};
use crate::world::World;

impl Mover {
    /// Phase 1: fold the raw sample into this tick's working input.
    pub(crate) fn intake(&mut self, input: TickInput) {
        self.input_h = input.h;
        self.input_v = input.v;
        self.jump_held = input.jump_held;

        // Jump buffering: a press is remembered briefly and keeps reading
        // as pressed until something consumes it or the window lapses.
        if input.jump_pressed {
            self.timers.start_for(TimerId::JumpBuffer, JUMP_BUFFER_WINDOW);
        }
        self.jump = input.jump_pressed || self.timers.is_running(TimerId::JumpBuffer);

        // A collaborator already acted on the press.
        if self.consume_jump {
            self.timers.clear(TimerId::JumpBuffer);
            self.jump = false;
        }

        if self.timers.is_running(TimerId::InputPurge) {
            self.input_h = 0.0;
            self.input_v = 0.0;
        }

        // Under inverted gravity "up" means toward the floor above.
        if self.body.is_gravity_inverted() {
            self.input_v = -self.input_v;
        }
    }

    /// Phase 2: contact and fluid sensing.
    pub(crate) fn sense(&mut self, world: &World) {
        let suppress_left = self.timers.is_running(TimerId::LeftWallSuppress);
        let suppress_right = self.timers.is_running(TimerId::RightWallSuppress);
        let has_jumped = self.has_jumped();
        let result = self.contacts.trace(
            world,
            &self.body,
            &self.config,
            self.shape_blend,
            suppress_left,
            suppress_right,
            has_jumped,
        );
        if let Some(friction) = result.friction_sample {
            self.contact_friction = friction.clamp(0.0, 10.0);
        }

        self.frame_velocity = self.body.velocity;

        let h_intent = deadzoned(self.input_h);
        let was_inside = self.fluid.inside;
        let effects = self
            .fluid
            .simulate(world, &mut self.body, &mut self.timers, h_intent, self.dt);
        if effects.reset_jump {
            self.reset_jump();
        }
        if effects.outside_force {
            self.outside_force_active = true;
        }
        if self.fluid.inside != was_inside {
            log::trace!("fluid state: {}", self.fluid.inside);
        }
    }

    /// Phase 3: airborne clock and coyote-time support resolution.
    pub(crate) fn resolve_support(&mut self) {
        if self.is_not_supported() {
            self.timers.start(TimerId::Airborne);
        } else {
            self.timers.clear(TimerId::Airborne);
        }

        // The ledge roll-over window counts as ground contact so the boost
        // doesn't fight the support logic.
        if self.timers.is_running(TimerId::LedgeBoost) {
            self.contacts.frame_grounded = true;
        }

        let frame_grounded = self.contacts.frame_grounded;
        if frame_grounded {
            self.has_spawned = false;
            self.timers.clear(TimerId::Coyote);
            if !self.grounded {
                self.timers.start(TimerId::GroundDwell);
            }
            self.grounded = true;
        } else if !self.timers.is_running(TimerId::Coyote) && !self.has_spawned {
            self.timers.start(TimerId::Coyote);
        }

        // Past the coyote window, support follows the frame contact; the
        // grounded flag drops exactly once and stays down until re-contact.
        if self.timers.elapsed(TimerId::Coyote) >= self.config.coyote_time {
            if frame_grounded && !self.grounded {
                self.timers.start(TimerId::GroundDwell);
            }
            if !frame_grounded && self.grounded {
                self.timers.clear(TimerId::GroundDwell);
            }
            self.grounded = frame_grounded;
        }
    }

    /// Phase 4: horizontal intent. Slope stick, wedge input cut, deadzone,
    /// movement-start roll request, sharp-turn damping.
    pub(crate) fn horizontal_intent(&mut self) {
        let frame_grounded = self.contacts.frame_grounded;

        // Stick to the ground when rolling from a flat stretch onto a
        // slope: the whisker on the movement side still sees ground, so a
        // small push along gravity keeps the roll attached.
        if !frame_grounded
            && self.grounded
            && !self.has_jumped()
            && self.input_h != 0.0
            && self.timers.elapsed(TimerId::GroundDwell) > 0.25
            && (self.contacts.whisker_right && self.input_h > 0.0
                || self.contacts.whisker_left && self.input_h < 0.0)
        {
            self.body.apply_impulse(self.body.gravity_dir() * 1.0);
        }

        // Sliding down a narrow tube: kill horizontal input so the
        // character can't wedge itself against both walls.
        if self.contacts.is_left_supported()
            && self.contacts.is_right_supported()
            && (self.body.rotation_deg % 90.0).abs() < 10.0
        {
            self.input_h = 0.0;
        }

        if self.input_h.abs() >= crate::tuning::INPUT_DEADZONE {
            self.input_h = sign(self.input_h);

            if !self.timers.is_running(TimerId::InputHold) {
                self.timers.start(TimerId::InputHold);
            }

            if self.has_no_input {
                // Movement just started: request a roll direction (or queue
                // it if a tip is mid-flight), and kick the rotation while
                // airborne.
                if self.grounded
                    && self.shape_blend < 0.1
                    && !self.has_spawned
                    && (self.contacts.is_right_supported() && self.input_h < 0.0
                        || self.contacts.is_left_supported() && self.input_h > 0.0
                        || !self.contacts.is_wall_supported()
                        || self.is_ceiling_grounded())
                {
                    if self.requested_flip == 0 {
                        self.requested_flip = sign(self.input_h) as i32;
                    } else if self.timers.elapsed(TimerId::Tip) > 0.15 {
                        self.queued_flip = sign(self.input_h) as i32;
                    }
                }

                if !self.grounded && !self.is_ceiling_grounded() {
                    let mut torque_mult = 1.0;
                    if self.fluid.inside && self.contacts.has_ceiling_contact() {
                        torque_mult = -1.0;
                    }
                    self.body
                        .apply_torque_impulse(-self.input_h * torque_mult * self.config.impulse_torque);
                }
            }

            // Sharp turn: input opposing the current roll within a speed
            // band arms a short delay, then damps velocity and spin.
            let vel = self.body.velocity;
            if frame_grounded
                && self.timers.elapsed(TimerId::GroundDwell) > 0.4
                && vel.x.abs() > 4.0
                && vel.x.abs() < 15.0
                && sign(vel.x) != self.input_h
                && (self.contacts.whisker_right && self.input_h < 0.0
                    || self.contacts.whisker_left && self.input_h > 0.0)
                && !self.timers.is_running(TimerId::FrictionReset)
                && !self.timers.is_running(TimerId::SharpTurn)
            {
                self.timers.start_for(TimerId::SharpTurn, 0.05);
            }
            if self.timers.just_expired(TimerId::SharpTurn) {
                let mut spring = remap(self.config.max_move_speed, 11.0, 0.5, 0.25, vel.x.abs());
                spring = lerp(1.0, spring, self.friction_coefficient());
                self.body.velocity.x *= spring;
                self.body.angular_velocity *= spring;
                self.timers.clear(TimerId::SharpTurn);
            }

            self.has_no_input = false;
            self.timers.clear(TimerId::InputIdle);
        } else {
            if self.timers.elapsed(TimerId::InputIdle) > 0.05 {
                self.timers.clear(TimerId::InputHold);
            }
            self.input_h = 0.0;
            if !self.timers.is_running(TimerId::InputIdle) {
                self.timers.start(TimerId::InputIdle);
            }
            self.has_no_input = true;
        }
    }

    /// Phase 5: clear has-jumped flags once their refractory window lapsed
    /// and contact is re-confirmed, re-arming the next jump of that type.
    pub(crate) fn clear_jump_flags(&mut self) {
        let refractory = crate::tuning::JUMP_REFRACTORY;

        if self.contacts.frame_grounded
            && (self.timers.elapsed(TimerId::GroundJump) > refractory
                || !self.timers.is_running(TimerId::GroundJump))
        {
            self.has_ground_jumped = false;
            self.ground_jump_count = 0;
            self.has_wall_jumped = false;
            self.walljump_dir = 0;
            self.has_ceiling_jumped = false;
            self.timers.clear(TimerId::GroundJump);
        }

        if self.contacts.has_ceiling_contact()
            && (self.timers.elapsed(TimerId::CeilingJump) > refractory
                || !self.timers.is_running(TimerId::CeilingJump))
        {
            self.has_ceiling_jumped = false;
            self.timers.clear(TimerId::CeilingJump);
        }

        // The hop-assist window dies on opposing input or once the
        // character has settled on the ground without jumping.
        if self.input_h == sign(-self.body.velocity.x)
            || self.timers.elapsed(TimerId::GroundDwell) > 0.02 && !self.has_jumped()
        {
            self.timers.clear(TimerId::HopAssist);
        }
    }

    /// Phase 6: arm/disarm the wall roll.
    pub(crate) fn update_wall_roll(&mut self) {
        let left = self.contacts.is_left_supported();
        let right = self.contacts.is_right_supported();

        if self.contacts.frame_grounded {
            self.can_wall_roll = false;
        }
        if self.config.wall_roll_enabled
            && (self.is_not_supported() || self.grounded && self.contacts.is_wall_supported())
            && self.wall_roll_side as f32 != self.input_h
        {
            self.can_wall_roll = true;
        }

        if self.can_wall_roll {
            if !self.contacts.is_wall_supported()
                && self.timers.elapsed(TimerId::WallRoll) > 0.1
                && (self.timers.is_running(TimerId::LeftWallSuppress)
                    || self.timers.is_running(TimerId::RightWallSuppress))
            {
                self.can_wall_roll = false;
            } else if self.contacts.is_wall_supported() && !(left && right) {
                // Start (or restart, when switching sides) the roll clock.
                if self.wall_roll_side < 0 && right || self.wall_roll_side > 0 && left {
                    self.timers.clear(TimerId::WallRoll);
                }
                self.timers.start(TimerId::WallRoll);
                self.wall_roll_side = if right { 1 } else { -1 };
            }
        }

        if self.timers.is_running(TimerId::WallRoll) || self.timers.get(TimerId::WallRoll).is_paused()
        {
            if self.contacts.is_wall_supported() && !(left && right) {
                self.timers.start(TimerId::WallRoll);
                self.wall_roll_side = if right { 1 } else { -1 };
            }
            if self.input_h != self.wall_roll_side as f32 {
                self.timers.stop(TimerId::WallRoll);
                self.timers.clear(TimerId::WallRoll);
                self.can_wall_roll = false;
            }
        }

        if self.timers.elapsed(TimerId::Airborne) > 0.25 {
            self.timers.clear(TimerId::WallRoll);
            self.wall_roll_side = 0;
        }
        if self.grounded {
            self.timers.clear(TimerId::WallRoll);
            self.timers.clear(TimerId::WallJump);
            self.timers.clear(TimerId::WireJump);
            self.timers.clear(TimerId::CeilingJump);
            self.wall_roll_side = 0;
        }
    }
}
