//! Pure round / session core.
//!
//! Everything here is browser-free and runs under plain `cargo test`: the
//! [`Session`] ledger (score, chain, clock, speed ratchet), the round phase
//! machine and the [`Game`] controller. The controller consumes events fed by
//! the glue layer (option click, 100ms countdown tick, 1s session tick,
//! scheduled resume / mask one-shots) and emits typed [`Command`]s the glue
//! interprets against the DOM, the audio cues and the browser timers. Exactly
//! one resolution happens per round: whichever of {answer, timeout} arrives
//! first flips the phase to `Resolving`, and the phase guard swallows anything
//! that fires late in the same event queue.

use rand::rngs::StdRng;

use crate::game::task::{self, Task};

// --- Tuning constants --------------------------------------------------------

/// Total session length in seconds (5 minutes).
pub const SESSION_SECONDS: u32 = 300;
/// Per-task countdown at session start.
pub const BASE_TASK_SECONDS: f64 = 8.0;
/// Floor the per-task countdown never drops below.
pub const MIN_TASK_SECONDS: f64 = 4.0;
/// Per-task countdown tick interval.
pub const TASK_TICK_MS: u32 = 100;
const TASK_TICK_SECS: f64 = 0.1;
/// Every this many completed tasks the countdown shrinks by [`SPEEDUP_STEP`].
pub const SPEEDUP_EVERY: u32 = 5;
pub const SPEEDUP_STEP: f64 = 0.2;
/// Base points per correct answer; multiplied by the current chain length.
pub const POINTS_PER_LINK: u64 = 10;
/// How long a memory task's sequence stays visible before it is masked.
pub const MEMORY_REVEAL_MS: u32 = 2000;
/// Delay before the next round after each outcome.
pub const RESUME_AFTER_CORRECT_MS: u32 = 500;
pub const RESUME_AFTER_INCORRECT_MS: u32 = 800;
pub const RESUME_AFTER_TIMEOUT_MS: u32 = 1000;

// --- Session ledger ----------------------------------------------------------

/// How a round ended. Timeout is a first-class outcome, not an error: it
/// breaks the chain like a wrong answer but stays silent (no failure cue) and
/// resumes on its own, slightly longer delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Timeout,
}

/// Mutable per-session bookkeeping, owned by the [`Game`] controller and
/// reset wholesale by constructing a fresh instance on session start.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub score: u64,
    /// Current streak of consecutive correct answers.
    pub chain_length: u32,
    /// Highest streak reached this session; monotonic non-decreasing.
    pub longest_chain: u32,
    pub seconds_remaining: u32,
    pub task_duration_secs: f64,
    pub tasks_completed: u32,
    pub active: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            score: 0,
            chain_length: 0,
            longest_chain: 0,
            seconds_remaining: SESSION_SECONDS,
            task_duration_secs: BASE_TASK_SECONDS,
            tasks_completed: 0,
            active: true,
        }
    }

    /// Apply the ledger mutation rules for one resolved round.
    pub fn resolve(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => {
                self.chain_length += 1;
                self.longest_chain = self.longest_chain.max(self.chain_length);
                self.tasks_completed += 1;
                self.score += POINTS_PER_LINK * u64::from(self.chain_length);
                // Time pressure ratchets up every 5th completed task.
                if self.tasks_completed % SPEEDUP_EVERY == 0 {
                    self.task_duration_secs =
                        (self.task_duration_secs - SPEEDUP_STEP).max(MIN_TASK_SECONDS);
                }
            }
            Outcome::Incorrect | Outcome::Timeout => {
                // Chain breaks; longest_chain is untouched.
                self.chain_length = 0;
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Format whole seconds as `m:ss` for the HUD and the final screen.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// --- Phase machine & commands ------------------------------------------------

/// Round controller phase. `Resolving` covers the short pause between an
/// outcome and the next round; `Ended` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingAnswer,
    Resolving,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Start,
    Task,
    GameOver,
}

/// Effects the glue layer executes on the core's behalf. The core never
/// touches the DOM, audio or timers directly; it only emits these.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    ShowScreen(Screen),
    Render(Task),
    /// Hide a memory task's sequence and show the recall prompt instead.
    MaskDisplay,
    DisableOptions,
    Highlight { value: String, correct: bool },
    UpdateHud { score: u64, chain_length: u32, seconds_remaining: u32 },
    UpdateCountdown { remaining_secs: f64, fraction: f64 },
    AppendChainLink(u32),
    ClearChain { animated: bool },
    PlaySuccess,
    PlayFailure,
    PlayChainTick(u32),
    ArmTaskTimer,
    ClearTaskTimer,
    ArmSessionTimer,
    ClearSessionTimer,
    ScheduleMask { delay_ms: u32, round: u64 },
    ScheduleResume { delay_ms: u32 },
    ShowFinal { score: u64, longest_chain: u32, seconds_survived: u32 },
}

// --- Game controller ---------------------------------------------------------

/// Round/session controller: owns the [`Session`], the live [`Task`] and the
/// task generator RNG. One instance per page; restarted in place by
/// [`Game::start`].
pub struct Game {
    session: Session,
    phase: Phase,
    task: Option<Task>,
    countdown_secs: f64,
    /// Countdown the current round was armed with (denominator for the bar).
    round_duration_secs: f64,
    /// Bumped on every round start. One-shots scheduled for a round carry its
    /// number back in, so a mask from an already-resolved memory round cannot
    /// hide the round that replaced it.
    round: u64,
    rng: StdRng,
}

impl Game {
    pub fn new(rng: StdRng) -> Self {
        Self {
            session: Session::new(),
            phase: Phase::Idle,
            task: None,
            countdown_secs: 0.0,
            round_duration_secs: BASE_TASK_SECONDS,
            round: 0,
            rng,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Number of the live round, as carried by its scheduled one-shots.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Start (or restart) a session: fresh ledger, cleared timers, first round.
    /// Emitting the timer clears before the arms is what keeps a previous
    /// session's intervals from mutating the new one.
    pub fn start(&mut self) -> Vec<Command> {
        self.session = Session::new();
        self.task = None;
        self.phase = Phase::Idle;
        let mut cmds = vec![
            Command::ClearTaskTimer,
            Command::ClearSessionTimer,
            Command::ClearChain { animated: false },
            Command::ShowScreen(Screen::Task),
            self.hud(),
            Command::ArmSessionTimer,
        ];
        cmds.extend(self.begin_round());
        cmds
    }

    fn begin_round(&mut self) -> Vec<Command> {
        let task = task::generate(&mut self.rng);
        self.countdown_secs = self.session.task_duration_secs;
        self.round_duration_secs = self.session.task_duration_secs;
        self.phase = Phase::AwaitingAnswer;
        self.round += 1;
        let mut cmds = vec![Command::Render(task.clone()), Command::ArmTaskTimer];
        if task.hides_display() {
            cmds.push(Command::ScheduleMask { delay_ms: MEMORY_REVEAL_MS, round: self.round });
        }
        cmds.push(Command::UpdateCountdown {
            remaining_secs: self.countdown_secs,
            fraction: 1.0,
        });
        self.task = Some(task);
        cmds
    }

    /// Player picked an option. Ignored outside `AwaitingAnswer`, so a click
    /// landing after a timeout (or a double click) cannot double-resolve.
    pub fn option_selected(&mut self, value: &str) -> Vec<Command> {
        if self.phase != Phase::AwaitingAnswer {
            return Vec::new();
        }
        let correct = self.task.as_ref().map(|t| t.correct == value).unwrap_or(false);
        let mut cmds = vec![
            Command::DisableOptions,
            Command::ClearTaskTimer,
            Command::Highlight { value: value.to_string(), correct },
        ];
        if correct {
            cmds.push(Command::PlaySuccess);
            cmds.extend(self.resolve(Outcome::Correct));
        } else {
            cmds.push(Command::PlayFailure);
            cmds.extend(self.resolve(Outcome::Incorrect));
        }
        cmds
    }

    /// 100ms countdown tick. No-op unless a round is awaiting an answer.
    pub fn countdown_tick(&mut self) -> Vec<Command> {
        if self.phase != Phase::AwaitingAnswer {
            return Vec::new();
        }
        self.countdown_secs -= TASK_TICK_SECS;
        if self.countdown_secs > 0.0 {
            let fraction = (self.countdown_secs / self.round_duration_secs).clamp(0.0, 1.0);
            return vec![Command::UpdateCountdown {
                remaining_secs: self.countdown_secs,
                fraction,
            }];
        }
        let mut cmds = vec![Command::DisableOptions, Command::ClearTaskTimer];
        cmds.extend(self.resolve(Outcome::Timeout));
        cmds
    }

    fn resolve(&mut self, outcome: Outcome) -> Vec<Command> {
        self.phase = Phase::Resolving;
        self.session.resolve(outcome);
        self.task = None;
        let mut cmds = Vec::new();
        match outcome {
            Outcome::Correct => {
                cmds.push(Command::AppendChainLink(self.session.chain_length));
                cmds.push(Command::PlayChainTick(self.session.chain_length));
                cmds.push(self.hud());
                cmds.push(Command::ScheduleResume { delay_ms: RESUME_AFTER_CORRECT_MS });
            }
            Outcome::Incorrect | Outcome::Timeout => {
                cmds.push(Command::ClearChain { animated: true });
                cmds.push(self.hud());
                let delay_ms = if outcome == Outcome::Incorrect {
                    RESUME_AFTER_INCORRECT_MS
                } else {
                    // Timeout resolves silently: the failure cue only plays on
                    // an explicit wrong click (see option_selected).
                    RESUME_AFTER_TIMEOUT_MS
                };
                cmds.push(Command::ScheduleResume { delay_ms });
            }
        }
        cmds
    }

    /// Scheduled continuation after a resolution delay. Ignored once the
    /// session clock has ended the game, or if it arrives from a stale round.
    pub fn resume(&mut self) -> Vec<Command> {
        if self.phase != Phase::Resolving || !self.session.active {
            return Vec::new();
        }
        self.begin_round()
    }

    /// The 2-second memory reveal window elapsed for `round`. Only masks while
    /// that same round is still the live one and awaiting an answer; a memory
    /// round answered inside its reveal window leaves a one-shot in flight
    /// that must not touch whatever round is showing when it fires.
    pub fn mask_elapsed(&mut self, round: u64) -> Vec<Command> {
        if round != self.round {
            return Vec::new();
        }
        match (&self.phase, &self.task) {
            (Phase::AwaitingAnswer, Some(t)) if t.hides_display() => vec![Command::MaskDisplay],
            _ => Vec::new(),
        }
    }

    /// 1Hz session clock tick. Ends the whole machine at exactly zero,
    /// regardless of round phase: a round in progress is abandoned.
    pub fn session_tick(&mut self) -> Vec<Command> {
        if !self.session.active {
            return Vec::new();
        }
        self.session.seconds_remaining = self.session.seconds_remaining.saturating_sub(1);
        let mut cmds = vec![self.hud()];
        if self.session.seconds_remaining == 0 {
            cmds.extend(self.end());
        }
        cmds
    }

    fn end(&mut self) -> Vec<Command> {
        self.phase = Phase::Ended;
        self.session.active = false;
        self.task = None;
        vec![
            Command::ClearTaskTimer,
            Command::ClearSessionTimer,
            Command::ShowScreen(Screen::GameOver),
            Command::ShowFinal {
                score: self.session.score,
                longest_chain: self.session.longest_chain,
                seconds_survived: SESSION_SECONDS - self.session.seconds_remaining,
            },
        ]
    }

    fn hud(&self) -> Command {
        Command::UpdateHud {
            score: self.session.score,
            chain_length: self.session.chain_length,
            seconds_remaining: self.session.seconds_remaining,
        }
    }
}
