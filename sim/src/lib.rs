pub mod body;
pub mod config;
pub mod contact;
pub mod events;
pub mod fluid;
pub mod input;
pub mod mover;
pub mod timer;
pub mod tuning;
pub mod utils;
pub mod world;

pub use body::Body;
pub use config::MoverConfig;
pub use contact::ContactTracker;
pub use events::{Event, JumpKind, TickReport, TravelDelta};
pub use fluid::FluidSim;
pub use input::{Recorder, TapeFrame, TickInput};
pub use mover::{Mover, WireRide};
pub use timer::{Timer, TimerBank, TimerId};
pub use world::{
    FluidBlobHandle, FluidVolume, Pose, StaticShape, Surface, SurfaceId, Vec2, WireHandle, World,
};
