/*!
Fluid immersion sensing and buoyancy.

A fixed grid of 24 interior sample points (body-local offsets up to +/-0.5
on each axis) plus 8 exterior points at +/-0.6 is tested against the fluid
layer every tick. If the body center itself is submerged the character
counts as fully immersed; otherwise immersion follows a square-root ramp of
the hit fraction so partial coverage registers buoyancy quickly, and the
buoyancy center is the centroid of the hit points pulled toward the body
center by the immersion fraction.

Four short directional probes relative to gravity detect whether the
character sits at a fluid-surface edge; a signed edge direction feeds the
boundary-pushoff jump in the state machine. Entry/exit of the debounced
in-fluid state runs through a short coyote timer so grazing the surface
doesn't toggle it every tick.
*/

use crate::body::Body;
use crate::timer::{TimerBank, TimerId};
use crate::tuning::{
    FLUID_ACTIVATION, FLUID_COYOTE_TIME, FLUID_DAMPING, FLUID_DENSITY_MAX, FLUID_DENSITY_MIN,
};
use crate::utils::{clamp01, inverse_lerp, remap};
use crate::world::{FluidHit, Vec2, World};

/// Interior grid: rows at local y in {0.5, 0.25, 0, -0.25, -0.5}; the
/// center row skips the body center itself (tested separately).
const INTERIOR_POINTS: [[f32; 2]; 24] = [
    [0.5, 0.5], [0.25, 0.5], [0.0, 0.5], [-0.25, 0.5], [-0.5, 0.5],
    [0.5, 0.25], [0.25, 0.25], [0.0, 0.25], [-0.25, 0.25], [-0.5, 0.25],
    [0.5, 0.0], [0.25, 0.0], [-0.25, 0.0], [-0.5, 0.0],
    [0.5, -0.25], [0.25, -0.25], [0.0, -0.25], [-0.25, -0.25], [-0.5, -0.25],
    [0.5, -0.5], [0.25, -0.5], [0.0, -0.5], [-0.25, -0.5], [-0.5, -0.5],
];

const EXTERIOR_POINTS: [[f32; 2]; 8] = [
    [0.6, 0.6], [-0.6, 0.6], [0.6, -0.6], [-0.6, -0.6],
    [0.0, 0.6], [0.0, -0.6], [0.6, 0.0], [-0.6, 0.0],
];

/// Effects the state machine applies on the fluid simulator's behalf.
#[derive(Clone, Copy, Debug, Default)]
pub struct FluidEffects {
    /// Fluid contact performs the generic jump-state reset (shared with
    /// wire attachment).
    pub reset_jump: bool,
    /// Buoyancy counts as an outside force for the friction logic.
    pub outside_force: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FluidSim {
    /// Debounced in-fluid state.
    pub inside: bool,
    /// Immersion fraction in `[0, 1]`.
    pub immersion: f32,
    /// Buoyancy center offset from the body center.
    pub center_offset: Vec2,
    /// Signed fluid-surface edge: +1 fluid to the left, -1 to the right,
    /// 0 not on an edge.
    pub on_edge: i8,
    /// Force applied this tick (zero when out of fluid).
    force: Vec2,
}

impl FluidSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Run one tick of fluid sensing and force application.
    ///
    /// `h_intent` is the post-deadzone horizontal intent; the ground-jump
    /// timer scales buoyancy down during recent jump windows so jumps can
    /// actually leave the water.
    pub fn simulate(
        &mut self,
        world: &World,
        body: &mut Body,
        timers: &mut TimerBank,
        h_intent: f32,
        dt: f32,
    ) -> FluidEffects {
        let mut effects = FluidEffects::default();
        if world.fluids.is_empty() {
            self.inside = false;
            self.immersion = 0.0;
            self.on_edge = 0;
            self.force = Vec2::zeros();
            return effects;
        }

        let pos = body.position;
        let right = body.local_right();
        let up = body.local_up();
        let mut around = false;

        // Immersion from the sample grid.
        let mut centroid = Vec2::zeros();
        if world.fluid_at_point(pos) {
            self.immersion = 1.0;
            centroid = pos;
        } else {
            let mut hits = 0u32;
            let mut sum = Vec2::zeros();
            for [x, y] in INTERIOR_POINTS {
                let p = pos + right * x + up * y;
                if world.fluid_at_point(p) {
                    hits += 1;
                    sum += p;
                }
            }
            if hits > 0 {
                centroid = sum / hits as f32;
            }
            self.immersion = (hits as f32 / INTERIOR_POINTS.len() as f32).sqrt();
            centroid = centroid.lerp(&pos, self.immersion);

            if self.immersion > 0.0 {
                for [x, y] in EXTERIOR_POINTS {
                    let p = pos + right * x + up * y;
                    if world.fluid_at_point(p) {
                        around = true;
                        break;
                    }
                }
            }
        }

        // Directional boundary probes, in world axes relative to gravity.
        let g = body.gravity_sign();
        let side_half = Vec2::new(0.05, 0.5);
        let flat_half = Vec2::new(0.5, 0.05);
        let probe = |start: Vec2, dir: Vec2, half: Vec2, dist: f32| -> Option<FluidHit> {
            if world.fluid_at_point(start) {
                return None;
            }
            world.fluid_cast(start, half, dir, dist)
        };

        let right_hit = probe(pos - Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0), side_half, 1.25);
        let left_hit = probe(pos + Vec2::new(0.5, 0.0), Vec2::new(-1.0, 0.0), side_half, 1.25);
        let up_hit = probe(
            pos - Vec2::new(0.0, 0.5 * g),
            Vec2::new(0.0, g),
            flat_half,
            1.0,
        );
        let down_hit = probe(
            pos + Vec2::new(0.0, 0.707 * g),
            Vec2::new(0.0, -g),
            flat_half,
            1.414,
        );

        // A sideways boundary with no fluid overhead reads as a surface
        // edge the character can push off laterally.
        self.on_edge = 0;
        if up_hit.is_none() {
            if let Some(hit) = right_hit {
                if hit.distance != 0.0 && hit.normal.y.abs() < 0.707 {
                    self.on_edge -= 1;
                }
            }
            if let Some(hit) = left_hit {
                if hit.distance != 0.0 && hit.normal.y.abs() < 0.707 {
                    self.on_edge += 1;
                }
            }
        }

        if self.immersion > FLUID_ACTIVATION {
            // Buoyancy blend: pushing along the surface toward a downward
            // boundary keeps the character heavy, recent jumps lighten it.
            let mut buoy = if down_hit.is_none() { h_intent.abs() } else { 0.0 };
            buoy += remap(0.0, 0.75, 0.75, 0.0, timers.elapsed(TimerId::GroundJump));
            let buoy = clamp01(buoy);

            let gravity = body.gravity();
            let mut density = crate::utils::lerp(FLUID_DENSITY_MIN, FLUID_DENSITY_MAX, buoy);
            density *= crate::utils::lerp(remap(-10.0, 0.0, 0.85, 1.0, body.velocity.y), 1.0, buoy);

            self.center_offset = centroid - pos;

            let mut target = Vec2::new(-self.center_offset.x, 0.0) * 20.0 - gravity;
            if target.norm_squared() > 0.0 {
                target.normalize_mut();
            }
            target *= density;
            if let Some(hit) = down_hit {
                if hit.distance > 0.0 {
                    // Close to a downward boundary: ramp the updraft off so
                    // the character can settle onto the fluid floor.
                    let t = inverse_lerp(0.25, 0.666, hit.distance + h_intent.abs() * 0.15);
                    target = target.lerp(&(-gravity * 0.8), t);
                }
            }

            self.force = target;
            body.apply_force_at(self.force, pos + self.center_offset * 0.5);

            // Exponential velocity and spin decay.
            let damping = (1.0 - FLUID_DAMPING * dt).max(0.0);
            body.velocity *= damping;
            body.angular_velocity *= damping;
            effects.outside_force = true;

            around = true;
        } else {
            self.inside = timers.is_running(TimerId::FluidCoyote);
            if !self.inside {
                timers.clear(TimerId::FluidDwell);
            }
            self.force = Vec2::zeros();
        }

        if around {
            timers.start(TimerId::FluidDwell);
            self.inside = true;
            timers.restart_for(TimerId::FluidCoyote, FLUID_COYOTE_TIME);
            effects.reset_jump = true;
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{FluidVolume, Pose, StaticShape};
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    fn pool(center: Vec2, half: Vec2) -> World {
        World::new(
            Vec::new(),
            vec![FluidVolume {
                id: 1,
                shape: StaticShape::Cuboid {
                    half_extents: half,
                    pose: Pose::axis_aligned(center),
                },
            }],
        )
    }

    fn step(world: &World, body: &mut Body, sim: &mut FluidSim, timers: &mut TimerBank) -> FluidEffects {
        timers.tick(DT);
        sim.simulate(world, body, timers, 0.0, DT)
    }

    #[test]
    fn submerged_center_means_full_immersion() {
        let world = pool(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
        let mut body = Body::new(Vec2::zeros());
        let mut sim = FluidSim::new();
        let mut timers = TimerBank::new();
        step(&world, &mut body, &mut sim, &mut timers);

        assert_relative_eq!(sim.immersion, 1.0);
        assert!(sim.inside);
        assert_relative_eq!(sim.center_offset.x, 0.0);
    }

    #[test]
    fn six_of_twentyfour_points_read_half_immersion() {
        // Pool occupies x >= -0.1 below y = -0.2: exactly the six interior
        // points with local y <= -0.25 and x >= -0.1 are submerged.
        let world = pool(Vec2::new(4.9, -5.2), Vec2::new(5.0, 5.0));
        let mut body = Body::new(Vec2::zeros());
        let mut sim = FluidSim::new();
        let mut timers = TimerBank::new();
        step(&world, &mut body, &mut sim, &mut timers);

        assert_relative_eq!(sim.immersion, (6.0f32 / 24.0).sqrt(), epsilon = 1.0e-5);
    }

    #[test]
    fn immersion_is_monotonic_in_coverage() {
        // Lowering the body into the pool strictly widens coverage.
        let world = pool(Vec2::new(0.0, -5.0), Vec2::new(10.0, 5.0));
        let mut last = 0.0;
        for i in 0..8 {
            let y = 0.7 - 0.2 * i as f32;
            let mut body = Body::new(Vec2::new(0.0, y));
            let mut sim = FluidSim::new();
            let mut timers = TimerBank::new();
            step(&world, &mut body, &mut sim, &mut timers);
            assert!(
                sim.immersion >= last - 1.0e-6,
                "immersion dropped from {last} to {} at y={y}",
                sim.immersion
            );
            last = sim.immersion;
        }
        assert_relative_eq!(last, 1.0);
    }

    #[test]
    fn buoyancy_pushes_against_gravity() {
        let world = pool(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
        let mut body = Body::new(Vec2::zeros());
        let mut sim = FluidSim::new();
        let mut timers = TimerBank::new();
        let effects = step(&world, &mut body, &mut sim, &mut timers);
        body.integrate(DT);

        assert!(effects.outside_force);
        assert!(effects.reset_jump);
        // Net acceleration (buoyancy in [70, 90] minus gravity) points up.
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn entry_and_exit_are_debounced() {
        let world = pool(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
        let mut body = Body::new(Vec2::zeros());
        let mut sim = FluidSim::new();
        let mut timers = TimerBank::new();

        step(&world, &mut body, &mut sim, &mut timers);
        assert!(sim.inside);

        // One tick out: the coyote window keeps the state alive. The world
        // with no fluids takes the early-out, so emulate "out of water" with
        // a far-away pool instead.
        let far = pool(Vec2::new(100.0, 0.0), Vec2::new(1.0, 1.0));
        step(&far, &mut body, &mut sim, &mut timers);
        assert!(sim.inside);

        // After the window passes, the state drops.
        for _ in 0..5 {
            step(&far, &mut body, &mut sim, &mut timers);
        }
        assert!(!sim.inside);
    }

    #[test]
    fn lateral_pool_edge_reports_signed_direction() {
        // Pool entirely to the left of the body; its right boundary sits
        // between the body and the pool.
        let world = pool(Vec2::new(-3.0, 0.0), Vec2::new(2.4, 3.0));
        let mut body = Body::new(Vec2::zeros());
        let mut sim = FluidSim::new();
        let mut timers = TimerBank::new();
        step(&world, &mut body, &mut sim, &mut timers);

        assert_eq!(sim.on_edge, 1);
    }
}
