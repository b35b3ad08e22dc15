//! Per-tick input samples and the deterministic input recorder.
//!
//! The recorder stores, for every tick, the raw input plus the pose the
//! body ended the tick in. Played back against the same world and config it
//! reproduces the run exactly; the stored poses let a replay detect the
//! first tick where the simulation diverged.

use bincode::{Decode, Encode};

use crate::body::Body;
use crate::world::Vec2;

/// Raw input for one tick, as delivered by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub struct TickInput {
    /// Horizontal analog axis in `[-1, 1]`.
    pub h: f32,
    /// Vertical analog axis in `[-1, 1]`.
    pub v: f32,
    /// Jump edge: pressed this tick.
    pub jump_pressed: bool,
    /// Jump level: currently held.
    pub jump_held: bool,
    /// Reset/suicide trigger.
    pub reset: bool,
}

/// One recorded tick: the input that went in and the pose that came out.
#[derive(Clone, Copy, Debug, Default, Encode, Decode)]
pub struct TapeFrame {
    pub input: TickInput,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub angular_velocity: f32,
}

impl TapeFrame {
    #[inline]
    pub fn position_vec(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    #[inline]
    pub fn velocity_vec(&self) -> Vec2 {
        Vec2::new(self.velocity[0], self.velocity[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Record,
    Playback,
}

/// Records (input, resulting pose) samples, or replays a previously
/// recorded tape.
#[derive(Clone, Debug)]
pub struct Recorder {
    frames: Vec<TapeFrame>,
    cursor: usize,
    mode: Mode,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            cursor: 0,
            mode: Mode::Record,
        }
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any tape and start recording from scratch.
    pub fn start_recording(&mut self) {
        self.frames.clear();
        self.cursor = 0;
        self.mode = Mode::Record;
    }

    /// Replay the given tape from the beginning.
    pub fn start_playback(&mut self, frames: Vec<TapeFrame>) {
        self.frames = frames;
        self.cursor = 0;
        self.mode = Mode::Playback;
    }

    /// Rewind the current tape and replay it.
    pub fn replay_current(&mut self) {
        self.cursor = 0;
        self.mode = Mode::Playback;
    }

    #[inline]
    pub fn is_playback(&self) -> bool {
        self.mode == Mode::Playback
    }

    /// Resolve this tick's input: in record mode the live input is stored
    /// and passed through; in playback the next taped input replaces it.
    /// A tape that runs out yields neutral input.
    pub fn filter(&mut self, live: TickInput) -> TickInput {
        match self.mode {
            Mode::Record => {
                self.frames.push(TapeFrame {
                    input: live,
                    ..Default::default()
                });
                live
            }
            Mode::Playback => {
                if let Some(frame) = self.frames.get(self.cursor) {
                    self.cursor += 1;
                    frame.input
                } else {
                    TickInput::default()
                }
            }
        }
    }

    /// Store the post-integration pose on the frame recorded this tick.
    pub fn commit_pose(&mut self, body: &Body) {
        if self.mode != Mode::Record {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.position = [body.position.x, body.position.y];
            frame.velocity = [body.velocity.x, body.velocity.y];
            frame.angular_velocity = body.angular_velocity;
        }
    }

    #[inline]
    pub fn frames(&self) -> &[TapeFrame] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed_right() -> TickInput {
        TickInput {
            h: 1.0,
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        }
    }

    #[test]
    fn recording_stores_input_and_pose() {
        let mut rec = Recorder::new();
        let mut body = Body::new(Vec2::new(1.0, 2.0));
        body.velocity = Vec2::new(3.0, 0.0);

        let out = rec.filter(pressed_right());
        assert_eq!(out, pressed_right());
        rec.commit_pose(&body);

        assert_eq!(rec.len(), 1);
        let frame = rec.frames()[0];
        assert_eq!(frame.position, [1.0, 2.0]);
        assert_eq!(frame.velocity, [3.0, 0.0]);
    }

    #[test]
    fn playback_returns_taped_inputs_then_neutral() {
        let mut rec = Recorder::new();
        rec.filter(pressed_right());
        rec.filter(TickInput::default());
        rec.replay_current();

        assert_eq!(rec.filter(TickInput { h: -1.0, ..Default::default() }), pressed_right());
        assert_eq!(rec.filter(TickInput::default()), TickInput::default());
        // Tape exhausted: neutral regardless of live input.
        assert_eq!(rec.filter(pressed_right()), TickInput::default());
    }

    #[test]
    fn commit_pose_is_a_noop_during_playback() {
        let mut rec = Recorder::new();
        rec.filter(pressed_right());
        rec.replay_current();
        rec.filter(TickInput::default());
        rec.commit_pose(&Body::new(Vec2::new(9.0, 9.0)));
        assert_eq!(rec.frames()[0].position, [0.0, 0.0]);
    }

    #[test]
    fn tape_round_trips_through_bincode() {
        let mut rec = Recorder::new();
        rec.filter(pressed_right());
        rec.commit_pose(&Body::new(Vec2::new(4.0, 5.0)));

        let bytes =
            bincode::encode_to_vec(rec.frames(), bincode::config::standard()).unwrap();
        let (frames, _): (Vec<TapeFrame>, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].position, [4.0, 5.0]);
        assert!(frames[0].input.jump_pressed);
    }
}
