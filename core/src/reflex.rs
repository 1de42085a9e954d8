use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl ReflexConfig {
    pub fn clamped(self) -> Self {
        if self.min_delay_ms > self.max_delay_ms {
            log::warn!(
                "reflex delay range {}..={} reversed",
                self.min_delay_ms,
                self.max_delay_ms
            );
            return Self {
                min_delay_ms: self.max_delay_ms,
                max_delay_ms: self.min_delay_ms,
            };
        }
        self
    }
}

impl Default for ReflexConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2000,
            max_delay_ms: 5000,
        }
    }
}

/// Valid transitions:
/// - Idle | Result | Early -> Waiting
/// - Waiting -> Ready (cue fires)
/// - Waiting -> Early (triggered before the cue)
/// - Ready -> Result
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReflexPhase {
    #[default]
    Idle,
    Waiting,
    Ready,
    Result,
    Early,
}

impl ReflexPhase {
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Result | Self::Early)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionRating {
    Peak,
    WithinLimits,
    Slow,
}

impl ReactionRating {
    pub const fn from_millis(millis: u64) -> Self {
        match millis {
            0..200 => Self::Peak,
            200..300 => Self::WithinLimits,
            _ => Self::Slow,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ReadyCue;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReflexInput {
    Start,
    Trigger,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReflexSnapshot {
    pub phase: ReflexPhase,
    pub reaction_ms: Option<u64>,
    pub rating: Option<ReactionRating>,
}

#[derive(Clone, Debug)]
pub struct ReflexTimer {
    config: ReflexConfig,
    phase: ReflexPhase,
    ready_at: Option<Duration>,
    reaction_ms: Option<u64>,
    pending: Option<TimerHandle>,
    timers: Scheduler<ReadyCue>,
    rng: GameRng,
}

impl ReflexTimer {
    pub fn phase(&self) -> ReflexPhase {
        self.phase
    }

    pub fn reaction_ms(&self) -> Option<u64> {
        self.reaction_ms
    }

    pub fn rating(&self) -> Option<ReactionRating> {
        self.reaction_ms.map(ReactionRating::from_millis)
    }

    /// Arms the cue after a random delay. Only from a resting phase.
    pub fn start(&mut self) -> bool {
        if !self.phase.can_start() {
            return false;
        }
        self.teardown();

        let delay_ms = self
            .rng
            .random_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        self.pending = Some(
            self.timers
                .schedule(Duration::from_millis(delay_ms), ReadyCue),
        );
        self.phase = ReflexPhase::Waiting;
        self.ready_at = None;
        self.reaction_ms = None;
        log::debug!("reflex armed, cue in {} ms", delay_ms);
        true
    }

    pub fn trigger(&mut self) {
        match self.phase {
            ReflexPhase::Waiting => {
                self.teardown();
                self.phase = ReflexPhase::Early;
                log::debug!("reflex triggered early");
            }
            ReflexPhase::Ready => {
                let ready_at = self.ready_at.unwrap_or_else(|| self.timers.now());
                let elapsed = self.timers.now().saturating_sub(ready_at);
                let millis = elapsed.as_millis() as u64;
                self.reaction_ms = Some(millis);
                self.phase = ReflexPhase::Result;
                log::debug!("reaction time {} ms", millis);
            }
            ReflexPhase::Idle | ReflexPhase::Result | ReflexPhase::Early => {
                self.start();
            }
        }
    }

    fn on_cue(&mut self, fired: Fired<ReadyCue>) {
        if self.phase != ReflexPhase::Waiting || self.pending != Some(fired.handle) {
            log::trace!("dropping stale cue {:?}", fired.handle);
            return;
        }
        self.pending = None;
        self.phase = ReflexPhase::Ready;
        self.ready_at = Some(fired.at);
    }
}

impl Simulator for ReflexTimer {
    type Config = ReflexConfig;
    type Input = ReflexInput;
    type Snapshot = ReflexSnapshot;

    fn new(config: ReflexConfig, seed: u64) -> Self {
        Self {
            config: config.clamped(),
            phase: ReflexPhase::Idle,
            ready_at: None,
            reaction_ms: None,
            pending: None,
            timers: Scheduler::new(),
            rng: seeded_rng(seed),
        }
    }

    fn apply(&mut self, input: ReflexInput) {
        match input {
            ReflexInput::Start => {
                self.start();
            }
            ReflexInput::Trigger => self.trigger(),
        }
    }

    fn advance(&mut self, dt: Duration) {
        let deadline = self.timers.deadline_after(dt);
        while let Some(fired) = self.timers.pop_due(deadline) {
            self.on_cue(fired);
        }
        self.timers.catch_up(deadline);
    }

    /// A session can always be re-armed.
    fn is_terminal(&self) -> bool {
        false
    }

    fn snapshot(&self) -> ReflexSnapshot {
        ReflexSnapshot {
            phase: self.phase,
            reaction_ms: self.reaction_ms,
            rating: self.rating(),
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.pending = None;
    }

    fn reset(&mut self) {
        self.teardown();
        self.phase = ReflexPhase::Idle;
        self.ready_at = None;
        self.reaction_ms = None;
    }
}
