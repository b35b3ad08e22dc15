use super::*;
use crate::events::{Event, JumpKind};
use crate::tuning::DEFAULT_SURFACE_FRICTION;
use crate::world::{FluidVolume, Pose, StaticShape, Surface};
use approx::assert_relative_eq;

const DT: f32 = 0.02;

fn surface(id: u32, center: Vec2, half: Vec2) -> Surface {
    Surface {
        id,
        shape: StaticShape::Cuboid {
            half_extents: half,
            pose: Pose::axis_aligned(center),
        },
        friction: DEFAULT_SURFACE_FRICTION,
        lethal: false,
    }
}

/// A 40-unit floor slab with its top face at y = 0.
fn flat_world() -> World {
    World::new(
        vec![surface(1, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0))],
        Vec::new(),
    )
}

/// Flat floor plus a tall wall whose left face sits at x = 0.7.
fn wall_world() -> World {
    let mut world = flat_world();
    world
        .surfaces
        .push(surface(2, Vec2::new(1.7, 2.0), Vec2::new(1.0, 4.0)));
    world
}

/// Flat floor plus two opposing walls, faces at x = -0.7 and x = 0.7.
fn wedge_world() -> World {
    let mut world = wall_world();
    world
        .surfaces
        .push(surface(3, Vec2::new(-1.7, 2.0), Vec2::new(1.0, 4.0)));
    world
}

fn neutral() -> TickInput {
    TickInput::default()
}

fn jump_press() -> TickInput {
    TickInput {
        jump_pressed: true,
        jump_held: true,
        ..Default::default()
    }
}

fn rested_mover(world: &World) -> Mover {
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.5));
    for _ in 0..5 {
        mover.advance(world, neutral(), DT);
    }
    assert!(mover.grounded, "mover should settle on the floor");
    mover
}

/// The closed-form vertical speed one tick after a flat-ground jump:
/// the impulse from jump height and gravity, plus one tick of the hold
/// extension net of gravity.
fn expected_jump_speed(cfg: &MoverConfig) -> f32 {
    let excess = 2.0 * (cfg.jump_height - 1.0);
    let strength = excess / (excess / crate::tuning::GRAVITY).sqrt();
    strength + (cfg.jump_extra_strength - 1.0) * crate::tuning::GRAVITY * DT
}

fn jump_events(report: &TickReport) -> Vec<JumpKind> {
    report
        .events
        .iter()
        .filter_map(|event| match event {
            Event::Jump { kind } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn resting_on_flat_ground_is_stable() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    let start = mover.body.position;
    for _ in 0..50 {
        mover.advance(&world, neutral(), DT);
    }
    assert!(mover.grounded);
    assert_relative_eq!(mover.body.position.y, start.y, epsilon = 1.0e-4);
    assert!(mover.body.velocity.norm() < 1.0e-3);
}

#[test]
fn ground_jump_speed_is_closed_form() {
    let world = flat_world();
    let mut mover = rested_mover(&world);

    let report = mover.advance(&world, jump_press(), DT);

    assert!(mover.has_ground_jumped);
    assert_eq!(mover.ground_jump_count, 1);
    assert_eq!(jump_events(&report), vec![JumpKind::Ground]);
    assert!(
        report
            .events
            .contains(&Event::SurfaceContact { surface: 1 })
    );
    assert_relative_eq!(
        mover.body.velocity.y,
        expected_jump_speed(&mover.config),
        epsilon = 1.0e-3
    );
}

#[test]
fn ground_jump_ignores_prior_horizontal_velocity() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.body.velocity.x = 3.0;

    mover.advance(&world, jump_press(), DT);

    assert_relative_eq!(
        mover.body.velocity.y,
        expected_jump_speed(&mover.config),
        epsilon = 1.0e-3
    );
    assert!(mover.body.velocity.x > 2.5, "horizontal speed is kept");
}

#[test]
fn coyote_time_keeps_grounded_then_drops_once() {
    let world = flat_world();
    let mut mover = rested_mover(&world);

    // Teleport past the floor edge; contact is lost this instant.
    mover.body.position.x = 25.0;

    let mut states = Vec::new();
    for _ in 0..10 {
        mover.advance(&world, neutral(), DT);
        states.push(mover.grounded);
    }

    // Grounded survives the coyote window (75ms at 20ms ticks), then
    // drops exactly once and stays down.
    assert!(states[0] && states[1] && states[2] && states[3]);
    assert!(states[4..].iter().all(|grounded| !grounded));
    let transitions = states.windows(2).filter(|w| w[0] != w[1]).count();
    assert_eq!(transitions, 1);
}

#[test]
fn buffered_press_fires_exactly_one_jump_on_landing() {
    let world = flat_world();
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.7));
    mover.body.velocity.y = -3.0;

    // Press while still too high to be grounded.
    let first = mover.advance(&world, jump_press(), DT);
    assert!(jump_events(&first).is_empty());
    assert!(!mover.grounded);

    let mut fired = jump_events(&first).len();
    for _ in 0..6 {
        let report = mover.advance(&world, neutral(), DT);
        fired += jump_events(&report).len();
    }

    assert_eq!(fired, 1, "the buffered press fires exactly once");
    assert!(mover.has_ground_jumped);
    assert!(mover.body.velocity.y > 2.0);
}

#[test]
fn air_jump_consumes_budget_without_ground_flag() {
    let world = flat_world();
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 5.0));
    mover.advance(&world, neutral(), DT);
    mover.set_air_jumps(1);

    let report = mover.advance(&world, jump_press(), DT);

    assert_eq!(mover.air_jumps, 0);
    assert!(!mover.has_ground_jumped);
    assert_eq!(mover.ground_jump_count, 0);
    assert_eq!(jump_events(&report), vec![JumpKind::Air]);
    assert!(mover.body.velocity.y > 2.0);
}

#[test]
fn wall_jump_clears_ground_jump_bookkeeping() {
    let world = wall_world();
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 2.0));
    mover.advance(&world, neutral(), DT);
    assert!(mover.contacts.is_right_supported());
    assert!(!mover.grounded);

    // Pretend a ground jump is still live.
    mover.has_ground_jumped = true;
    mover.ground_jump_count = 1;

    let report = mover.advance(&world, jump_press(), DT);

    assert_eq!(jump_events(&report), vec![JumpKind::Wall]);
    assert!(mover.has_wall_jumped);
    assert!(!mover.has_ground_jumped);
    assert_eq!(mover.ground_jump_count, 0);
    assert_eq!(mover.walljump_dir, -1);
    assert!(mover.body.velocity.x < -10.0);
    assert!(mover.body.velocity.y > 10.0);
    assert!(report.events.contains(&Event::SurfaceContact { surface: 2 }));

    // The departed wall is debounced: the frame contact may linger but the
    // filtered contact must not re-latch immediately.
    mover.advance(&world, neutral(), DT);
    assert!(!mover.contacts.is_right_supported());
}

#[test]
fn wedge_blocks_wall_jump_but_allows_ground_path() {
    let world = wedge_world();
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 2.0));
    mover.advance(&world, neutral(), DT);
    assert!(mover.contacts.is_wedged());

    let report = mover.advance(&world, jump_press(), DT);

    assert_eq!(jump_events(&report), vec![JumpKind::Ground]);
    assert!(mover.has_ground_jumped);
    assert!(!mover.has_wall_jumped);
    assert_eq!(mover.walljump_dir, 0);
}

#[test]
fn reset_twice_equals_reset_once() {
    let world = flat_world();
    let mut a = rested_mover(&world);
    let mut b = a.clone();

    a.reset();
    b.reset();
    b.reset();

    // Notifications aside, the state must be identical.
    a.events.clear();
    b.events.clear();
    assert_eq!(format!("{a:?}"), format!("{b:?}"));
}

#[test]
fn contact_friction_and_coefficient_stay_in_bounds() {
    let mut world = flat_world();
    world.surfaces[0].friction = 25.0; // hostile data; the sample clamps
    let mut mover = rested_mover(&world);

    for _ in 0..20 {
        mover.advance(&world, neutral(), DT);
        assert!(mover.contact_friction >= 0.0 && mover.contact_friction <= 10.0);
        let coefficient = mover.friction_coefficient();
        assert!((0.0..=1.0).contains(&coefficient));
    }
}

#[test]
fn ice_reports_low_effective_friction_once() {
    let mut world = flat_world();
    world.surfaces[0].friction = 0.5;
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.5));

    let first = mover.advance(&world, neutral(), DT);
    assert_relative_eq!(first.effective_friction, 0.5);
    assert!(first.friction_changed);

    let second = mover.advance(&world, neutral(), DT);
    assert_relative_eq!(second.effective_friction, 0.5);
    assert!(!second.friction_changed);
}

#[test]
fn jump_in_fluid_reports_water_jump() {
    let mut world = flat_world();
    world.fluids.push(FluidVolume {
        id: 1,
        shape: StaticShape::Cuboid {
            half_extents: Vec2::new(10.0, 3.0),
            pose: Pose::axis_aligned(Vec2::new(0.0, 2.0)),
        },
    });
    let mut mover = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.5));
    for _ in 0..5 {
        mover.advance(&world, neutral(), DT);
    }
    assert!(mover.fluid.inside);

    let report = mover.advance(&world, jump_press(), DT);

    assert!(report.events.contains(&Event::WaterJump));
    assert_eq!(jump_events(&report), vec![JumpKind::Ground]);
}

#[test]
fn purge_window_silences_input() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.purge_input(0.2);

    mover.advance(
        &world,
        TickInput {
            h: 1.0,
            v: -1.0,
            ..Default::default()
        },
        DT,
    );

    assert_eq!(mover.input_h, 0.0);
    assert_eq!(mover.input_v, 0.0);
}

#[test]
fn jump_lockout_window_blocks_ground_jump() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.disallow_jump_for(1.0);

    let report = mover.advance(&world, jump_press(), DT);

    assert!(jump_events(&report).is_empty());
    assert!(!mover.has_ground_jumped);
}

#[test]
fn use_jump_consumes_the_buffered_press() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.use_jump();

    let report = mover.advance(&world, jump_press(), DT);

    assert!(jump_events(&report).is_empty());
    assert!(!mover.has_ground_jumped);
}

#[test]
fn kill_freezes_and_reset_respawns() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.body.velocity.x = 5.0;
    mover.kill(false, false);

    let report = mover.advance(&world, jump_press(), DT);
    assert!(mover.dead);
    assert!(report.events.contains(&Event::Death { suicide: false }));
    assert_eq!(mover.body.velocity, Vec2::zeros());

    mover.reset();
    let report = mover.advance(&world, neutral(), DT);
    assert!(!mover.dead);
    assert!(report.events.contains(&Event::Spawn));
    assert_relative_eq!(mover.body.position.x, mover.spawn_position().x);
}

#[test]
fn invincible_ignores_soft_kills() {
    let world = flat_world();
    let config = MoverConfig {
        invincible: true,
        ..Default::default()
    };
    let mut mover = Mover::new(config, Vec2::new(0.0, 0.5));
    mover.kill(false, false);
    assert!(!mover.dead);
    mover.kill(true, false);
    assert!(mover.dead);
}

#[test]
fn wire_jump_without_wire_is_a_noop() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    let before = format!("{:?}", mover.timers);

    mover.wire_jump(Vec2::new(1.0, 0.0));

    assert!(!mover.has_wall_jumped);
    assert_eq!(before, format!("{:?}", mover.timers));
}

#[test]
fn travel_statistics_split_by_support() {
    let world = flat_world();
    let mut mover = rested_mover(&world);
    mover.body.velocity.x = 3.0;

    let moving = mover.advance(
        &world,
        TickInput {
            h: 1.0,
            ..Default::default()
        },
        DT,
    );
    assert!(moving.travel.total > 0.0);
    assert!(moving.travel.grounded > 0.0);
    assert_eq!(moving.travel.fluid, 0.0);

    let mut idle = mover.advance(&world, neutral(), DT);
    for _ in 0..20 {
        idle = mover.advance(&world, neutral(), DT);
    }
    // Neutral input never counts as grounded travel.
    assert_eq!(idle.travel.grounded, 0.0);
}

#[test]
fn recorded_run_replays_bit_exactly() {
    let world = wall_world();
    let script = |i: usize| -> TickInput {
        TickInput {
            h: if i % 20 < 10 { 1.0 } else { -0.8 },
            v: if i % 7 == 0 { -1.0 } else { 0.0 },
            jump_pressed: i == 15 || i == 31,
            jump_held: (15..20).contains(&i) || (31..40).contains(&i),
            reset: false,
        }
    };

    let mut original = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.5));
    for i in 0..40 {
        original.advance(&world, script(i), DT);
    }
    let tape = original.recorder.frames().to_vec();
    assert_eq!(tape.len(), 40);

    // Replay on a fresh mover; live input is garbage and must be ignored.
    let mut replayed = Mover::new(MoverConfig::default(), Vec2::new(0.0, 0.5));
    replayed.recorder.start_playback(tape.clone());
    for i in 0..40 {
        replayed.advance(&world, jump_press(), DT);
        let expected = tape[i];
        assert_eq!(
            replayed.body.position.x, expected.position[0],
            "diverged at tick {i}"
        );
        assert_eq!(
            replayed.body.position.y, expected.position[1],
            "diverged at tick {i}"
        );
    }
    assert_eq!(replayed.body.velocity, original.body.velocity);
    assert_eq!(replayed.body.angular_velocity, original.body.angular_velocity);
}
