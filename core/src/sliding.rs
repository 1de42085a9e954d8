use alloc::vec::Vec;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

pub const GRID_SIDE: usize = 4;

/// Largest tile `u32` can hold. Two of them never merge.
pub const MAX_TILE: u32 = 1 << 31;

type Row = [u32; GRID_SIDE];

/// 4×4 tile grid, indexed `[row][column]`. Zero is an empty cell, every other
/// value is a power of two.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid([Row; GRID_SIDE]);

impl Grid {
    pub const EMPTY: Grid = Grid([[0; GRID_SIDE]; GRID_SIDE]);

    pub const fn from_rows(rows: [Row; GRID_SIDE]) -> Self {
        Self(rows)
    }

    /// Like [`Grid::from_rows`], rejecting tiles that are neither empty nor a power of two.
    pub fn try_from_rows(rows: [Row; GRID_SIDE]) -> Result<Self> {
        Self(rows).validate()
    }

    pub fn validate(self) -> Result<Self> {
        match self.0.iter().flatten().find(|&&v| v != 0 && !v.is_power_of_two()) {
            Some(&tile) => Err(GameError::InvalidTile(tile)),
            None => Ok(self),
        }
    }

    pub const fn rows(&self) -> &[Row; GRID_SIDE] {
        &self.0
    }

    pub const fn get(&self, row: usize, col: usize) -> u32 {
        self.0[row][col]
    }

    pub fn tile_count(&self) -> usize {
        self.0.iter().flatten().filter(|&&v| v != 0).count()
    }

    pub fn max_tile(&self) -> u32 {
        self.0.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GRID_SIDE)
            .flat_map(|row| (0..GRID_SIDE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.0[row][col] == 0)
    }

    /// Quarter turn clockwise.
    fn rotate_cw(self) -> Self {
        let mut rotated = Self::EMPTY;
        for (row, values) in self.0.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                rotated.0[col][GRID_SIDE - 1 - row] = value;
            }
        }
        rotated
    }

    fn rotate_cw_times(self, turns: usize) -> Self {
        (0..turns % 4).fold(self, |grid, _| grid.rotate_cw())
    }

    /// Slides and merges every line toward `direction`, returning the new grid and
    /// the sum of the merged values. Does not spawn anything.
    pub fn slide(self, direction: Direction) -> (Grid, u64) {
        let turns = canonical_turns(direction);
        let mut canonical = self.rotate_cw_times(turns);
        let mut gained = 0;
        for row in canonical.0.iter_mut() {
            let (merged, row_score) = slide_row(*row);
            *row = merged;
            gained += row_score;
        }
        (canonical.rotate_cw_times(4 - turns), gained)
    }

    /// Whether any direction changes the grid. A full grid can still have merges.
    pub fn has_legal_move(&self) -> bool {
        Direction::ALL
            .into_iter()
            .any(|direction| self.slide(direction).0 != *self)
    }
}

/// Clockwise quarter turns that bring `direction` to "toward column 0".
///
/// `Left` needs none; a clockwise turn maps downward motion onto leftward motion,
/// so `Down` needs one, `Right` two and `Up` three. Undoing takes `4 - turns`.
const fn canonical_turns(direction: Direction) -> usize {
    match direction {
        Direction::Left => 0,
        Direction::Down => 1,
        Direction::Right => 2,
        Direction::Up => 3,
    }
}

/// Compress, merge each tile at most once, compress again.
fn slide_row(row: Row) -> (Row, u64) {
    let tiles: Vec<u32> = row.into_iter().filter(|&v| v != 0).collect();
    let mut out = [0; GRID_SIDE];
    let mut gained = 0;
    let mut write = 0;
    let mut read = 0;
    while read < tiles.len() {
        let value = tiles[read];
        let doubled = value.checked_mul(2).filter(|_| tiles.get(read + 1) == Some(&value));
        if let Some(doubled) = doubled {
            out[write] = doubled;
            gained += u64::from(doubled);
            read += 2;
        } else {
            out[write] = value;
            read += 1;
        }
        write += 1;
    }
    (out, gained)
}

/// Places a 2 (or a 4 with `four_probability`) on a uniformly chosen empty cell.
pub fn spawn_tile(grid: Grid, rng: &mut GameRng, four_probability: f64) -> Option<Grid> {
    let empty: Vec<(usize, usize)> = grid.empty_cells().collect();
    if empty.is_empty() {
        return None;
    }
    let (row, col) = empty[rng.random_range(0..empty.len())];
    let value = if rng.random_bool(four_probability) { 4 } else { 2 };
    let mut next = grid;
    next.0[row][col] = value;
    Some(next)
}

/// Pure move: returns the next grid, the next score and whether a tile spawned.
/// An unchanged grid is a no-op: same score, no spawn.
pub fn apply_move(
    grid: Grid,
    score: u64,
    direction: Direction,
    rng: &mut GameRng,
    four_probability: f64,
) -> (Grid, u64, bool) {
    let (slid, gained) = grid.slide(direction);
    if slid == grid {
        return (grid, score, false);
    }
    let score = score.saturating_add(gained);
    match spawn_tile(slid, rng, four_probability) {
        Some(spawned) => (spawned, score, true),
        None => (slid, score, false),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingConfig {
    pub four_probability: f64,
    pub start_tiles: u8,
}

impl SlidingConfig {
    pub fn new(four_probability: f64, start_tiles: u8) -> Self {
        Self {
            four_probability,
            start_tiles,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        let four_probability = if self.four_probability.is_nan() {
            log::warn!("four_probability is NaN, using default");
            Self::default().four_probability
        } else {
            self.four_probability.clamp(0.0, 1.0)
        };
        let start_tiles = self.start_tiles.clamp(1, (GRID_SIDE * GRID_SIDE) as u8);
        Self {
            four_probability,
            start_tiles,
        }
    }
}

impl Default for SlidingConfig {
    fn default() -> Self {
        Self {
            four_probability: 0.1,
            start_tiles: 2,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlidingState {
    #[default]
    Playing,
    GameOver,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    NoChange,
    Moved { gained: u64, spawned: bool },
    GameOver { gained: u64 },
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlidingInput {
    Move(Direction),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlidingSnapshot {
    pub grid: Grid,
    pub score: u64,
    pub best_tile: u32,
    pub state: SlidingState,
}

#[derive(Clone, Debug)]
pub struct SlidingMerge {
    config: SlidingConfig,
    grid: Grid,
    score: u64,
    state: SlidingState,
    rng: GameRng,
}

impl SlidingMerge {
    /// Starts from a fixed grid instead of a random deal.
    pub fn with_grid(config: SlidingConfig, grid: Grid, seed: u64) -> Result<Self> {
        let grid = grid.validate()?;
        let mut game = Self::blank(config, seed);
        game.grid = grid;
        game.refresh_state();
        Ok(game)
    }

    fn blank(config: SlidingConfig, seed: u64) -> Self {
        Self {
            config: config.clamped(),
            grid: Grid::EMPTY,
            score: 0,
            state: SlidingState::Playing,
            rng: seeded_rng(seed),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn state(&self) -> SlidingState {
        self.state
    }

    pub fn apply_move(&mut self, direction: Direction) -> MoveOutcome {
        if self.state == SlidingState::GameOver {
            return MoveOutcome::NoChange;
        }

        let (grid, score, spawned) = apply_move(
            self.grid,
            self.score,
            direction,
            &mut self.rng,
            self.config.four_probability,
        );
        if grid == self.grid {
            return MoveOutcome::NoChange;
        }

        let gained = score - self.score;
        self.grid = grid;
        self.score = score;
        self.refresh_state();
        if self.state == SlidingState::GameOver {
            MoveOutcome::GameOver { gained }
        } else {
            MoveOutcome::Moved { gained, spawned }
        }
    }

    fn deal(&mut self) {
        self.grid = Grid::EMPTY;
        self.score = 0;
        for _ in 0..self.config.start_tiles {
            if let Some(grid) = spawn_tile(self.grid, &mut self.rng, self.config.four_probability) {
                self.grid = grid;
            }
        }
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        self.state = if self.grid.has_legal_move() {
            SlidingState::Playing
        } else {
            log::debug!("no legal move left, final score {}", self.score);
            SlidingState::GameOver
        };
    }
}

impl Simulator for SlidingMerge {
    type Config = SlidingConfig;
    type Input = SlidingInput;
    type Snapshot = SlidingSnapshot;

    fn new(config: SlidingConfig, seed: u64) -> Self {
        let mut game = Self::blank(config, seed);
        game.deal();
        game
    }

    fn apply(&mut self, input: SlidingInput) {
        match input {
            SlidingInput::Move(direction) => {
                self.apply_move(direction);
            }
        }
    }

    fn is_terminal(&self) -> bool {
        self.state == SlidingState::GameOver
    }

    fn snapshot(&self) -> SlidingSnapshot {
        SlidingSnapshot {
            grid: self.grid,
            score: self.score,
            best_tile: self.grid.max_tile(),
            state: self.state,
        }
    }

    fn reset(&mut self) {
        self.deal();
    }
}
