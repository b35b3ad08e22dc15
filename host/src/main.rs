//! Fixed-tick host harness for the movement core.
//!
//! Drives a [`sim::Mover`] through the demo room at a fixed rate, collects
//! its outward events into session statistics, and can dump or replay input
//! tapes for deterministic debugging.

mod scenario;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sim::{Event, JumpKind, Mover, MoverConfig, TapeFrame, TickInput, World};

#[derive(Parser, Debug)]
#[command(name = "host", version, about = "Fixed-tick host for the character movement core")]
struct Opts {
    /// Tick rate in Hz.
    #[arg(long, default_value_t = 50)]
    tick_hz: u32,

    /// Optional JSON config overriding the default movement tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scripted demo scenario and print a session summary.
    Run {
        /// Number of ticks to simulate.
        #[arg(long, default_value_t = 400)]
        ticks: u64,
    },
    /// Run the scripted scenario and save the input tape.
    Record {
        /// Output tape file.
        tape: PathBuf,
        #[arg(long, default_value_t = 400)]
        ticks: u64,
    },
    /// Replay a recorded tape and verify the simulation reproduces it.
    Replay {
        /// Input tape file.
        tape: PathBuf,
    },
}

/// Session statistics fed by the core's outward events; this is the
/// external statistics sink of the simulation.
#[derive(Debug, Default)]
struct Session {
    jumps: u64,
    air_jumps: u64,
    wall_jumps: u64,
    ceiling_jumps: u64,
    water_jumps: u64,
    deaths: u64,
    suicides: u64,
    travel_total: f32,
    travel_ground: f32,
    travel_fluid: f32,
}

impl Session {
    fn absorb(&mut self, report: &sim::TickReport) {
        self.travel_total += report.travel.total;
        self.travel_ground += report.travel.grounded;
        self.travel_fluid += report.travel.fluid;
        for event in &report.events {
            match event {
                Event::Jump { kind } => {
                    self.jumps += 1;
                    match kind {
                        JumpKind::Air => self.air_jumps += 1,
                        JumpKind::Wall => self.wall_jumps += 1,
                        JumpKind::Ceiling => self.ceiling_jumps += 1,
                        JumpKind::Ground => {}
                    }
                }
                Event::WaterJump => self.water_jumps += 1,
                Event::Death { suicide } => {
                    self.deaths += 1;
                    if *suicide {
                        self.suicides += 1;
                    }
                }
                Event::Spawn => log::info!("spawned"),
                Event::SurfaceContact { surface } => {
                    log::debug!("contact poke on surface {surface}");
                }
                Event::WireExit { wire } => log::debug!("left wire {wire}"),
            }
        }
    }

    fn print(&self) {
        println!("jumps:         {}", self.jumps);
        println!("  air:         {}", self.air_jumps);
        println!("  wall:        {}", self.wall_jumps);
        println!("  ceiling:     {}", self.ceiling_jumps);
        println!("  water:       {}", self.water_jumps);
        println!("deaths:        {} ({} suicides)", self.deaths, self.suicides);
        println!("travel:        {:.2}", self.travel_total);
        println!("  on ground:   {:.2}", self.travel_ground);
        println!("  in fluid:    {:.2}", self.travel_fluid);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<MoverConfig> {
    let Some(path) = path else {
        return Ok(MoverConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: MoverConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Respawn delay after a death, matching the presentation timing the core
/// itself does not own.
const RESPAWN_TIME: f32 = 0.75;

/// Drive the mover for `ticks` steps with inputs from `input_for`.
fn drive(
    mover: &mut Mover,
    world: &World,
    dt: f32,
    ticks: u64,
    mut input_for: impl FnMut(u64) -> TickInput,
) -> Session {
    let mut session = Session::default();
    let mut dead_for = 0.0f32;

    for tick in 0..ticks {
        let report = mover.advance(world, input_for(tick), dt);
        session.absorb(&report);

        // Host-side respawn presentation.
        if mover.dead {
            dead_for += dt;
            if dead_for >= RESPAWN_TIME {
                mover.reset();
                dead_for = 0.0;
            }
        } else {
            dead_for = 0.0;
        }
    }
    session
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let dt = 1.0 / opts.tick_hz as f32;
    let config = load_config(opts.config.as_ref())?;
    let world = scenario::demo_world();

    match opts.command {
        Command::Run { ticks } => {
            let mut mover = Mover::new(config, scenario::spawn_position());
            let session = drive(&mut mover, &world, dt, ticks, scenario::scripted_input);
            println!(
                "final pose: {:.2?} rot {:.1} deg",
                mover.body.position, mover.body.rotation_deg
            );
            session.print();
        }
        Command::Record { tape, ticks } => {
            let mut mover = Mover::new(config, scenario::spawn_position());
            let session = drive(&mut mover, &world, dt, ticks, scenario::scripted_input);
            session.print();

            let bytes =
                bincode::encode_to_vec(mover.recorder.frames(), bincode::config::standard())?;
            fs::write(&tape, &bytes).with_context(|| format!("writing {}", tape.display()))?;
            println!(
                "wrote {} frames ({} bytes) to {}",
                mover.recorder.len(),
                bytes.len(),
                tape.display()
            );
        }
        Command::Replay { tape } => {
            let bytes =
                fs::read(&tape).with_context(|| format!("reading {}", tape.display()))?;
            let (frames, _): (Vec<TapeFrame>, _) =
                bincode::decode_from_slice(&bytes, bincode::config::standard())?;
            let ticks = frames.len() as u64;

            let mut mover = Mover::new(config, scenario::spawn_position());
            mover.recorder.start_playback(frames.clone());

            // Step tick by tick, comparing the replayed pose against the
            // recorded one; live input is irrelevant, the tape wins.
            let mut session = Session::default();
            let mut worst: f32 = 0.0;
            let mut first_divergence = None;
            for (i, frame) in frames.iter().enumerate() {
                let report = mover.advance(&world, TickInput::default(), dt);
                session.absorb(&report);

                let delta = (mover.body.position - frame.position_vec()).norm();
                worst = worst.max(delta);
                if first_divergence.is_none() && delta > 1.0e-4 {
                    first_divergence = Some(i);
                }
            }
            session.print();
            match first_divergence {
                None => println!("replay ok: {ticks} ticks, max divergence {worst:.6}"),
                Some(tick) => {
                    println!("replay DIVERGED from tick {tick} (max {worst:.6})");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
