//! Named countdown/elapsed timers advanced once per tick.
//!
//! Every windowed behavior in the movement core (coyote time, jump buffers,
//! refractory windows, debounce suppression) reads from this table. All
//! timers belonging to one character live in a single [`TimerBank`] advanced
//! by one `tick(dt)` call at the start of the character's update; expiry is
//! polled synchronously via [`Timer::just_expired`], never delivered through
//! a callback.

/// Lifecycle of a single timer. `Running` and `Paused` are mutually
/// exclusive; `JustExpired` lasts exactly one tick before falling back to
/// `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    JustExpired,
}

/// One countdown or stopwatch timer.
///
/// A timer started with [`Timer::start`] counts up without a target and
/// never expires; one started with [`Timer::start_for`] expires when its
/// elapsed time reaches the target duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    state: TimerState,
    elapsed: f32,
    duration: Option<f32>,
}

impl Timer {
    /// Start as an open-ended stopwatch. No-op while already running, so a
    /// caller may assert "should be running" every tick without resetting
    /// the elapsed time.
    pub fn start(&mut self) {
        if self.state != TimerState::Running {
            self.state = TimerState::Running;
            self.elapsed = 0.0;
            self.duration = None;
        }
    }

    /// Start as a countdown that expires after `duration` seconds. Same
    /// no-op-while-running rule as [`Timer::start`]; call [`Timer::clear`]
    /// first to restart or extend.
    pub fn start_for(&mut self, duration: f32) {
        if self.state != TimerState::Running {
            self.state = TimerState::Running;
            self.elapsed = 0.0;
            self.duration = Some(duration.max(0.0));
        }
    }

    /// Pause, preserving the elapsed time. Only affects a running timer.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Force idle from any state.
    pub fn clear(&mut self) {
        self.state = TimerState::Idle;
        self.elapsed = 0.0;
        self.duration = None;
    }

    /// Advance by one fixed step. Expired timers hold `JustExpired` for the
    /// tick on which they expire and become idle on the next advance.
    pub fn tick(&mut self, dt: f32) {
        match self.state {
            TimerState::Running => {
                self.elapsed += dt;
                if let Some(duration) = self.duration {
                    if self.elapsed >= duration {
                        self.elapsed = duration;
                        self.state = TimerState::JustExpired;
                    }
                }
            }
            TimerState::JustExpired => {
                self.state = TimerState::Idle;
                self.elapsed = 0.0;
                self.duration = None;
            }
            TimerState::Idle | TimerState::Paused => {}
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    /// True for exactly one tick after the countdown reaches its target.
    #[inline]
    pub fn just_expired(&self) -> bool {
        self.state == TimerState::JustExpired
    }

    /// Elapsed seconds since the last start. Never negative; zero while idle
    /// and on the tick the timer was started.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds until expiry, or zero for stopwatches and idle timers.
    #[inline]
    pub fn remaining(&self) -> f32 {
        match (self.state, self.duration) {
            (TimerState::Running | TimerState::Paused, Some(d)) => (d - self.elapsed).max(0.0),
            _ => 0.0,
        }
    }

    /// Elapsed over duration, clamped to `[0, 1]`; zero with no target set.
    #[inline]
    pub fn progress(&self) -> f32 {
        match self.duration {
            Some(d) if d > 0.0 => (self.elapsed / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Has at least `t` seconds elapsed since the last start?
    #[inline]
    pub fn has_elapsed(&self, t: f32) -> bool {
        self.elapsed >= t
    }
}

/// Every timer owned by one character. The discriminants index the bank's
/// backing array; iteration order is fixed, which keeps ticks deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerId {
    /// How long horizontal input has been held.
    InputHold,
    /// How long input has been neutral.
    InputIdle,
    /// Early jump press remembered until landing.
    JumpBuffer,
    /// Time since ground contact was (re)gained.
    GroundDwell,
    /// Time spent without any support.
    Airborne,
    /// Time since the last ground/air jump; doubles as its refractory clock.
    GroundJump,
    /// Grace after losing ground contact during which support persists.
    Coyote,
    /// Time since the last wall jump.
    WallJump,
    /// Time since the last ceiling jump.
    CeilingJump,
    /// Active super-jump thrust window.
    SuperJump,
    /// Window during which a super jump may be armed.
    SuperJumpWindow,
    /// Delay before a detected sharp turn triggers the damping spring.
    SharpTurn,
    /// Time spent rolling up the current wall.
    WallRoll,
    /// Hop-assist window armed by a wall jump.
    HopAssist,
    /// Active 90-degree tip maneuver.
    Tip,
    /// Ledge roll-over correction window.
    LedgeBoost,
    /// Window forcing full friction after an external reset.
    FrictionReset,
    /// Jump suppression requested by a collaborator.
    JumpLockout,
    /// Input purge window requested by a collaborator.
    InputPurge,
    /// Debounce: left wall deliberately left, ignore re-contact.
    LeftWallSuppress,
    /// Debounce: right wall deliberately left, ignore re-contact.
    RightWallSuppress,
    /// Grace after a gravity flip keeping wall jumps aimed with the old axis.
    GravityFlip,
    /// Grace after a speed rail blocking the ledge boost.
    RailGrace,
    /// Time spent continuously around fluid.
    FluidDwell,
    /// Short grace so brief dips don't toggle the in-fluid state.
    FluidCoyote,
    /// Grace after leaving a fluid blob, blocking fast/slow fall.
    BlobExit,
    /// Grace after detaching from a wire.
    WireCoyote,
    /// Air-control attenuation window after a wire jump.
    WireJump,
}

impl TimerId {
    pub const COUNT: usize = TimerId::WireJump as usize + 1;
}

/// Per-character timer table. Advancing the bank advances every member once.
#[derive(Clone, Debug)]
pub struct TimerBank {
    timers: [Timer; TimerId::COUNT],
}

impl Default for TimerBank {
    fn default() -> Self {
        Self {
            timers: [Timer::default(); TimerId::COUNT],
        }
    }
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every timer by one fixed step.
    pub fn tick(&mut self, dt: f32) {
        for timer in &mut self.timers {
            timer.tick(dt);
        }
    }

    /// Force every timer idle (character reset).
    pub fn clear_all(&mut self) {
        for timer in &mut self.timers {
            timer.clear();
        }
    }

    #[inline]
    pub fn get(&self, id: TimerId) -> &Timer {
        &self.timers[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TimerId) -> &mut Timer {
        &mut self.timers[id as usize]
    }

    // Convenience passthroughs; these keep the state-machine code close to
    // prose ("start the coyote timer", "has the jump window elapsed").

    #[inline]
    pub fn start(&mut self, id: TimerId) {
        self.get_mut(id).start();
    }

    #[inline]
    pub fn start_for(&mut self, id: TimerId, duration: f32) {
        self.get_mut(id).start_for(duration);
    }

    /// Clear-then-start: restarts a countdown even if it is running.
    #[inline]
    pub fn restart_for(&mut self, id: TimerId, duration: f32) {
        let timer = self.get_mut(id);
        timer.clear();
        timer.start_for(duration);
    }

    #[inline]
    pub fn stop(&mut self, id: TimerId) {
        self.get_mut(id).stop();
    }

    #[inline]
    pub fn clear(&mut self, id: TimerId) {
        self.get_mut(id).clear();
    }

    #[inline]
    pub fn is_running(&self, id: TimerId) -> bool {
        self.get(id).is_running()
    }

    #[inline]
    pub fn just_expired(&self, id: TimerId) -> bool {
        self.get(id).just_expired()
    }

    #[inline]
    pub fn elapsed(&self, id: TimerId) -> f32 {
        self.get(id).elapsed()
    }

    #[inline]
    pub fn remaining(&self, id: TimerId) -> f32 {
        self.get(id).remaining()
    }

    #[inline]
    pub fn progress(&self, id: TimerId) -> f32 {
        self.get(id).progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    #[test]
    fn countdown_expires_for_exactly_one_tick() {
        let mut t = Timer::default();
        t.start_for(0.05);
        assert!(t.is_running());

        t.tick(DT);
        t.tick(DT);
        assert!(t.is_running());
        assert!(!t.just_expired());

        t.tick(DT); // 0.06 >= 0.05
        assert!(t.just_expired());
        assert!(!t.is_running());

        t.tick(DT);
        assert!(!t.just_expired());
        assert_eq!(t.elapsed(), 0.0);
    }

    #[test]
    fn stopwatch_counts_up_without_expiring() {
        let mut t = Timer::default();
        t.start();
        for _ in 0..500 {
            t.tick(DT);
        }
        assert!(t.is_running());
        assert!(t.has_elapsed(9.9));
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn start_while_running_preserves_elapsed() {
        let mut t = Timer::default();
        t.start();
        t.tick(DT);
        t.tick(DT);
        t.start();
        assert!(t.elapsed() > DT);
    }

    #[test]
    fn stop_pauses_and_preserves_elapsed() {
        let mut t = Timer::default();
        t.start_for(1.0);
        t.tick(DT);
        t.stop();
        assert!(t.is_paused());
        let frozen = t.elapsed();
        t.tick(DT);
        t.tick(DT);
        assert_eq!(t.elapsed(), frozen);

        // Restarting from paused begins a fresh run.
        t.start_for(1.0);
        assert_eq!(t.elapsed(), 0.0);
        assert!(t.is_running());
    }

    #[test]
    fn clear_forces_idle_from_any_state() {
        let mut t = Timer::default();
        t.start_for(0.02);
        t.tick(DT); // expired
        assert!(t.just_expired());
        t.clear();
        assert!(!t.just_expired());
        assert!(!t.is_running());
        assert_eq!(t.remaining(), 0.0);
    }

    #[test]
    fn progress_clamps_and_handles_missing_duration() {
        let mut t = Timer::default();
        t.start_for(0.1);
        t.tick(0.25);
        assert_eq!(t.progress(), 1.0);

        let mut s = Timer::default();
        s.start();
        s.tick(0.25);
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn elapsed_is_never_negative() {
        let mut t = Timer::default();
        t.start_for(-0.5);
        assert!(t.elapsed() >= 0.0);
        t.tick(DT);
        assert!(t.elapsed() >= 0.0);
    }

    #[test]
    fn bank_ticks_every_member() {
        let mut bank = TimerBank::new();
        bank.start(TimerId::Airborne);
        bank.start_for(TimerId::Coyote, 0.075);
        bank.tick(DT);
        assert!(bank.elapsed(TimerId::Airborne) > 0.0);
        assert!(bank.elapsed(TimerId::Coyote) > 0.0);
        assert!(!bank.is_running(TimerId::JumpBuffer));
    }

    #[test]
    fn restart_for_extends_a_running_countdown() {
        let mut bank = TimerBank::new();
        bank.start_for(TimerId::InputPurge, 0.05);
        bank.tick(DT);
        bank.restart_for(TimerId::InputPurge, 0.2);
        assert_eq!(bank.elapsed(TimerId::InputPurge), 0.0);
        assert!(bank.remaining(TimerId::InputPurge) > 0.15);
    }
}
