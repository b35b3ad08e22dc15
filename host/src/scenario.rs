//! Demo world and scripted input for the host harness.
//!
//! The world is a small obstacle room: a main floor with an ice patch, two
//! walls to jump between, a spike strip past the right ledge, and a pool on
//! the far side. The input script walks through it deterministically so a
//! recorded tape is reproducible run over run.

use nalgebra::Vector2;
use sim::{FluidVolume, Pose, StaticShape, Surface, TickInput, Vec2, World};

fn slab(id: u32, center: [f32; 2], half: [f32; 2], friction: f32, lethal: bool) -> Surface {
    Surface {
        id,
        shape: StaticShape::Cuboid {
            half_extents: Vector2::new(half[0], half[1]),
            pose: Pose::axis_aligned(Vector2::new(center[0], center[1])),
        },
        friction,
        lethal,
    }
}

/// Build the demo room. Floor top sits at y = 0.
pub fn demo_world() -> World {
    let surfaces = vec![
        // Main floor.
        slab(1, [0.0, -1.0], [14.0, 1.0], 10.0, false),
        // Ice patch flush with the floor.
        slab(2, [6.0, 0.05], [2.0, 0.05], 0.3, false),
        // Left boundary wall.
        slab(3, [-14.7, 4.0], [1.0, 6.0], 10.0, false),
        // Mid-room wall for wall jumps.
        slab(4, [4.0, 2.5], [0.4, 2.5], 10.0, false),
        // Ceiling slab over the left half.
        slab(5, [-8.0, 7.0], [7.0, 1.0], 10.0, false),
        // Spike strip past the right ledge.
        slab(6, [12.0, 0.15], [1.0, 0.15], 10.0, true),
        // Round boulder resting on the floor.
        Surface {
            id: 7,
            shape: StaticShape::Ball {
                radius: 0.8,
                pose: Pose::axis_aligned(Vector2::new(-6.0, 0.8)),
            },
            friction: 10.0,
            lethal: false,
        },
    ];
    let fluids = vec![FluidVolume {
        id: 1,
        shape: StaticShape::Cuboid {
            half_extents: Vector2::new(3.0, 2.0),
            pose: Pose::axis_aligned(Vector2::new(-10.0, -2.0)),
        },
    }];
    World::new(surfaces, fluids)
}

/// Spawn point on the main floor.
pub fn spawn_position() -> Vec2 {
    Vector2::new(-4.0, 0.5)
}

/// Deterministic input script: roll right, buffer a jump at the wall,
/// wall-jump back, fast-fall, then idle out the rest.
pub fn scripted_input(tick: u64) -> TickInput {
    let t = tick as f32 * 0.02;
    let mut input = TickInput::default();
    match t {
        t if t < 1.0 => {
            input.h = 1.0;
        }
        t if t < 1.4 => {
            input.h = 1.0;
            input.jump_pressed = t < 1.02;
            input.jump_held = true;
        }
        t if t < 2.2 => {
            input.h = -1.0;
            input.jump_pressed = (1.6..1.62).contains(&t);
            input.jump_held = t >= 1.6;
        }
        t if t < 3.0 => {
            input.h = -0.2; // inside the deadzone on purpose
            input.v = -1.0;
        }
        t if t < 4.0 => {
            input.h = -1.0;
        }
        _ => {}
    }
    input
}
