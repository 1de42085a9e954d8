use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardOutcome {
    #[default]
    InProgress,
    Won {
        mark: Mark,
        line: [usize; 3],
    },
    Draw,
}

impl BoardOutcome {
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Squares numbered row by row, 0 top-left to 8 bottom-right.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicTacToeBoard([Option<Mark>; 9]);

impl TicTacToeBoard {
    pub const fn from_squares(squares: [Option<Mark>; 9]) -> Self {
        Self(squares)
    }

    pub const fn squares(&self) -> &[Option<Mark>; 9] {
        &self.0
    }

    pub fn empty_squares(&self) -> impl Iterator<Item = usize> + '_ {
        (0..9).filter(|&i| self.0[i].is_none())
    }

    pub fn outcome(&self) -> BoardOutcome {
        for line in WINNING_LINES {
            let [a, b, c] = line.map(|i| self.0[i]);
            if let Some(mark) = a
                && b == a
                && c == a
            {
                return BoardOutcome::Won { mark, line };
            }
        }
        if self.0.iter().all(Option::is_some) {
            BoardOutcome::Draw
        } else {
            BoardOutcome::InProgress
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicTacToeConfig {
    pub opponent_delay_ms: u64,
}

impl Default for TicTacToeConfig {
    fn default() -> Self {
        Self {
            opponent_delay_ms: 500,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct OpponentMove;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    NoChange,
    Placed,
    Finished(BoardOutcome),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TicTacToeInput {
    Place(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicTacToeSnapshot {
    pub board: TicTacToeBoard,
    pub outcome: BoardOutcome,
    pub opponent_thinking: bool,
}

/// Human plays X, a random opponent answers with O after a short delay.
#[derive(Clone, Debug)]
pub struct TicTacToe {
    config: TicTacToeConfig,
    board: TicTacToeBoard,
    outcome: BoardOutcome,
    pending: Option<TimerHandle>,
    timers: Scheduler<OpponentMove>,
    rng: GameRng,
}

impl TicTacToe {
    pub fn board(&self) -> &TicTacToeBoard {
        &self.board
    }

    pub fn outcome(&self) -> BoardOutcome {
        self.outcome
    }

    pub fn is_opponent_thinking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn place(&mut self, index: usize) -> Result<PlaceOutcome> {
        let square = *self.board.0.get(index).ok_or(GameError::InvalidIndex(index))?;
        if square.is_some() || self.outcome.is_finished() || self.pending.is_some() {
            return Ok(PlaceOutcome::NoChange);
        }

        self.board.0[index] = Some(Mark::X);
        self.outcome = self.board.outcome();
        if self.outcome.is_finished() {
            log::debug!("board finished on human move: {:?}", self.outcome);
            return Ok(PlaceOutcome::Finished(self.outcome));
        }

        self.pending = Some(self.timers.schedule(
            Duration::from_millis(self.config.opponent_delay_ms),
            OpponentMove,
        ));
        Ok(PlaceOutcome::Placed)
    }

    fn play_opponent(&mut self, fired: Fired<OpponentMove>) {
        if self.pending != Some(fired.handle) {
            log::trace!("dropping stale opponent move {:?}", fired.handle);
            return;
        }
        self.pending = None;
        if self.outcome.is_finished() {
            return;
        }

        let empty: Vec<usize> = self.board.empty_squares().collect();
        if empty.is_empty() {
            return;
        }
        let index = empty[self.rng.random_range(0..empty.len())];
        self.board.0[index] = Some(Mark::O);
        self.outcome = self.board.outcome();
        log::trace!("opponent took square {}", index);
        if self.outcome.is_finished() {
            log::debug!("board finished on opponent move: {:?}", self.outcome);
        }
    }
}

impl Simulator for TicTacToe {
    type Config = TicTacToeConfig;
    type Input = TicTacToeInput;
    type Snapshot = TicTacToeSnapshot;

    fn new(config: TicTacToeConfig, seed: u64) -> Self {
        Self {
            config,
            board: TicTacToeBoard::default(),
            outcome: BoardOutcome::InProgress,
            pending: None,
            timers: Scheduler::new(),
            rng: seeded_rng(seed),
        }
    }

    fn apply(&mut self, input: TicTacToeInput) {
        let TicTacToeInput::Place(index) = input;
        if let Err(err) = self.place(index) {
            log::warn!("ignored {:?}: {}", input, err);
        }
    }

    fn advance(&mut self, dt: Duration) {
        let deadline = self.timers.deadline_after(dt);
        while let Some(fired) = self.timers.pop_due(deadline) {
            self.play_opponent(fired);
        }
        self.timers.catch_up(deadline);
    }

    fn is_terminal(&self) -> bool {
        self.outcome.is_finished()
    }

    fn snapshot(&self) -> TicTacToeSnapshot {
        TicTacToeSnapshot {
            board: self.board,
            outcome: self.outcome,
            opponent_thinking: self.is_opponent_thinking(),
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.pending = None;
    }

    fn reset(&mut self) {
        self.teardown();
        self.board = TicTacToeBoard::default();
        self.outcome = BoardOutcome::InProgress;
    }
}
