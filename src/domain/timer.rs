use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u32 = 60;
const FINISHING_TICKS: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

/// Outcome of a single one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is paused; nothing changed.
    Idle,
    /// Decremented without reaching a phase boundary.
    Counting,
    /// A work phase just finished; carries its configured duration.
    WorkComplete { work_minutes: u32 },
    /// A break phase just finished.
    BreakComplete,
}

/// Countdown state machine alternating between work and break phases.
///
/// The phase transition happens atomically inside the tick that reaches
/// zero: the outcome is emitted, the phase flips, the new phase's duration
/// is loaded and the timer auto-pauses. `time_left_seconds` is therefore
/// never observable at zero between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    phase: Phase,
    running: bool,
    time_left_seconds: u32,
    work_minutes: u32,
    break_minutes: u32,
    finishing_ticks: u8,
}

impl FocusTimer {
    /// Durations are in whole minutes and must be positive; the command
    /// boundary validates them.
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            phase: Phase::Work,
            running: false,
            time_left_seconds: work_minutes * SECONDS_PER_MINUTE,
            work_minutes,
            break_minutes,
            finishing_ticks: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time_left_seconds(&self) -> u32 {
        self.time_left_seconds
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    /// True for a short window after a phase boundary so the presentation
    /// layer can flash a completion cue. Carries no state-machine weight.
    pub fn is_finishing(&self) -> bool {
        self.finishing_ticks > 0
    }

    /// Updates configured durations. While paused the countdown immediately
    /// reflects the new duration of the current phase; while running the
    /// in-progress countdown stays untouched until the next boundary or a
    /// reset.
    pub fn configure(&mut self, work_minutes: u32, break_minutes: u32) {
        self.work_minutes = work_minutes;
        self.break_minutes = break_minutes;
        if !self.running {
            self.time_left_seconds = self.phase_duration_seconds(self.phase);
        }
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Discards any in-progress countdown and returns to a paused work
    /// phase at the full configured duration.
    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.running = false;
        self.time_left_seconds = self.work_minutes * SECONDS_PER_MINUTE;
        self.finishing_ticks = 0;
    }

    /// Advances the countdown by one second. Invoked once per elapsed
    /// second while running; a tick while paused is a no-op apart from
    /// draining the finishing flag.
    pub fn tick(&mut self) -> TickOutcome {
        self.finishing_ticks = self.finishing_ticks.saturating_sub(1);
        if !self.running {
            return TickOutcome::Idle;
        }

        self.time_left_seconds = self.time_left_seconds.saturating_sub(1);
        if self.time_left_seconds > 0 {
            return TickOutcome::Counting;
        }

        let outcome = match self.phase {
            Phase::Work => TickOutcome::WorkComplete {
                work_minutes: self.work_minutes,
            },
            Phase::Break => TickOutcome::BreakComplete,
        };
        self.phase = self.phase.other();
        self.time_left_seconds = self.phase_duration_seconds(self.phase);
        self.running = false;
        self.finishing_ticks = FINISHING_TICKS;
        outcome
    }

    fn phase_duration_seconds(&self, phase: Phase) -> u32 {
        let minutes = match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        };
        minutes * SECONDS_PER_MINUTE
    }
}
