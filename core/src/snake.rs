use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

pub const FOOD_SCORE: u32 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Side of the square torus.
    pub size: Coord,
    pub step_interval_ms: u64,
}

impl SnakeConfig {
    pub fn new(size: Coord, step_interval_ms: u64) -> Self {
        Self {
            size,
            step_interval_ms,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        // the starting body hangs three cells below the middle row
        let size = self.size.max(5);
        let step_interval_ms = self.step_interval_ms.max(1);
        if size != self.size {
            log::warn!("snake board size {} raised to {}", self.size, size);
        }
        Self {
            size,
            step_interval_ms,
        }
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    fn start_body(&self) -> [Coord2; 3] {
        let mid = self.size / 2;
        [(mid, mid), (mid, mid + 1), (mid, mid + 2)]
    }

    fn start_food(&self) -> Coord2 {
        let quarter = self.size / 4;
        (quarter, quarter)
    }
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            size: 20,
            step_interval_ms: 150,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeState {
    #[default]
    Alive,
    Lost,
    /// The body covers every cell, no food can spawn.
    Won,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Frozen,
    Moved,
    Ate,
    Collided,
    Filled,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnakeInput {
    Turn(Direction),
    TogglePause,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnakeSnapshot {
    pub size: Coord,
    /// Head first.
    pub body: Vec<Coord2>,
    pub food: Option<Coord2>,
    pub direction: Direction,
    pub score: u32,
    pub state: SnakeState,
    pub paused: bool,
}

#[derive(Clone, Debug)]
pub struct Snake {
    config: SnakeConfig,
    body: VecDeque<Coord2>,
    /// Direction applied on the last step.
    direction: Direction,
    queued: Option<Direction>,
    food: Option<Coord2>,
    score: u32,
    state: SnakeState,
    paused: bool,
    since_step: Duration,
    rng: GameRng,
}

impl Snake {
    /// Starts from an explicit body (head first), heading and food.
    pub fn with_body(
        config: SnakeConfig,
        body: impl IntoIterator<Item = Coord2>,
        direction: Direction,
        food: Option<Coord2>,
        seed: u64,
    ) -> Self {
        Self {
            config: config.clamped(),
            body: body.into_iter().collect(),
            direction,
            queued: None,
            food,
            score: 0,
            state: SnakeState::Alive,
            paused: false,
            since_step: Duration::ZERO,
            rng: seeded_rng(seed),
        }
    }

    pub fn body(&self) -> &VecDeque<Coord2> {
        &self.body
    }

    pub fn head(&self) -> Option<Coord2> {
        self.body.front().copied()
    }

    pub fn food(&self) -> Option<Coord2> {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> SnakeState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Buffers a turn for the next step. Reversing onto the neck is rejected.
    pub fn turn(&mut self, direction: Direction) -> bool {
        if self.state != SnakeState::Alive || direction == self.direction.opposite() {
            return false;
        }
        self.queued = Some(direction);
        true
    }

    pub fn toggle_pause(&mut self) {
        if self.state == SnakeState::Alive {
            self.paused = !self.paused;
            log::debug!("snake paused: {}", self.paused);
        }
    }

    /// One movement tick.
    pub fn step(&mut self) -> StepOutcome {
        if self.state != SnakeState::Alive || self.paused {
            return StepOutcome::Frozen;
        }
        let Some(head) = self.head() else {
            return StepOutcome::Frozen;
        };

        if let Some(direction) = self.queued.take() {
            self.direction = direction;
        }
        let size = self.config.size;
        let next = wrapping_step(head, self.direction, (size, size));

        if self.body.contains(&next) {
            self.state = SnakeState::Lost;
            log::debug!("snake hit itself at {:?}, score {}", next, self.score);
            return StepOutcome::Collided;
        }

        self.body.push_front(next);
        if self.food != Some(next) {
            self.body.pop_back();
            return StepOutcome::Moved;
        }

        self.score += FOOD_SCORE;
        self.food = self.spawn_food();
        if self.food.is_none() {
            self.state = SnakeState::Won;
            log::debug!("snake fills the board, score {}", self.score);
            return StepOutcome::Filled;
        }
        StepOutcome::Ate
    }

    /// Uniform over cells the body does not occupy.
    fn spawn_food(&mut self) -> Option<Coord2> {
        let occupied: BTreeSet<Coord2> = self.body.iter().copied().collect();
        let size = self.config.size;
        let free: Vec<Coord2> = (0..size)
            .flat_map(|x| (0..size).map(move |y| (x, y)))
            .filter(|coords| !occupied.contains(coords))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }

    fn deal(&mut self) {
        self.body = self.config.start_body().into_iter().collect();
        self.direction = Direction::Up;
        self.queued = None;
        self.food = Some(self.config.start_food());
        self.score = 0;
        self.state = SnakeState::Alive;
        self.paused = false;
        self.since_step = Duration::ZERO;
    }
}

impl Simulator for Snake {
    type Config = SnakeConfig;
    type Input = SnakeInput;
    type Snapshot = SnakeSnapshot;

    fn new(config: SnakeConfig, seed: u64) -> Self {
        let mut game = Self::with_body(config, core::iter::empty(), Direction::Up, None, seed);
        game.deal();
        game
    }

    fn apply(&mut self, input: SnakeInput) {
        match input {
            SnakeInput::Turn(direction) => {
                if !self.turn(direction) {
                    log::trace!("turn {:?} rejected", direction);
                }
            }
            SnakeInput::TogglePause => self.toggle_pause(),
        }
    }

    /// Steps once per elapsed interval; time spent paused or finished is dropped.
    fn advance(&mut self, dt: Duration) {
        if self.state != SnakeState::Alive || self.paused {
            return;
        }
        let interval = self.config.step_interval();
        self.since_step += dt;
        while self.since_step >= interval {
            self.since_step -= interval;
            self.step();
            if self.state != SnakeState::Alive {
                break;
            }
        }
    }

    fn is_terminal(&self) -> bool {
        self.state != SnakeState::Alive
    }

    fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            size: self.config.size,
            body: self.body.iter().copied().collect(),
            food: self.food,
            direction: self.direction,
            score: self.score,
            state: self.state,
            paused: self.paused,
        }
    }

    fn reset(&mut self) {
        self.deal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_duplicates(body: &VecDeque<Coord2>) -> bool {
        let unique: BTreeSet<_> = body.iter().collect();
        unique.len() != body.len()
    }

    #[test]
    fn new_game_matches_starting_layout() {
        let snapshot = Snake::init(1).snapshot();

        assert_eq!(snapshot.body, [(10, 10), (10, 11), (10, 12)]);
        assert_eq!(snapshot.direction, Direction::Up);
        assert_eq!(snapshot.food, Some((5, 5)));
        assert_eq!(snapshot.state, SnakeState::Alive);
    }

    #[test]
    fn moving_off_edge_wraps() {
        let body = [(19, 5), (18, 5), (17, 5)];
        let mut snake = Snake::with_body(SnakeConfig::default(), body, Direction::Right, None, 0);

        assert_eq!(snake.step(), StepOutcome::Moved);
        assert_eq!(snake.head(), Some((0, 5)));
        assert_eq!(snake.body().len(), 3);
        assert_eq!(snake.body().back(), Some(&(18, 5)));
    }

    #[test]
    fn eating_grows_by_one_and_respawns_food_off_body() {
        let body = [(3, 3), (3, 4), (3, 5)];
        let mut snake =
            Snake::with_body(SnakeConfig::default(), body, Direction::Up, Some((3, 2)), 4);

        assert_eq!(snake.step(), StepOutcome::Ate);
        assert_eq!(snake.body().len(), 4);
        assert_eq!(snake.score(), FOOD_SCORE);
        let food = snake.food().unwrap();
        assert!(!snake.body().contains(&food));
    }

    #[test]
    fn reversal_is_rejected() {
        let mut snake = Snake::init(0);

        assert!(!snake.turn(Direction::Down));
        snake.step();
        assert_eq!(snake.head(), Some((10, 9)));
    }

    #[test]
    fn turn_is_buffered_until_next_step() {
        let mut snake = Snake::init(0);

        assert!(snake.turn(Direction::Left));
        assert_eq!(snake.direction(), Direction::Up);
        // still relative to the applied direction, not the buffered one
        assert!(snake.turn(Direction::Right));

        snake.step();
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.head(), Some((11, 10)));
    }

    #[test]
    fn collision_loses_without_moving_body() {
        // head at (1,1) heading left into its own body at (0,1)
        let body = [(1, 1), (1, 0), (0, 0), (0, 1), (0, 2)];
        let mut snake = Snake::with_body(SnakeConfig::default(), body, Direction::Left, None, 0);
        let before = snake.body().clone();

        assert_eq!(snake.step(), StepOutcome::Collided);
        assert_eq!(snake.state(), SnakeState::Lost);
        assert_eq!(snake.body(), &before);
        assert_eq!(snake.step(), StepOutcome::Frozen);
    }

    #[test]
    fn filling_the_board_wins() {
        let config = SnakeConfig::new(5, 150);
        // boustrophedon over every cell but (0,4), head at (0,3) facing the food
        let mut body = Vec::new();
        for x in 0..5u8 {
            let column: Vec<Coord2> = (0..5u8).map(|y| (x, y)).collect();
            if x % 2 == 0 {
                body.extend(column.into_iter().rev());
            } else {
                body.extend(column);
            }
        }
        body.retain(|&c| c != (0, 4));
        let mut snake = Snake::with_body(config, body, Direction::Down, Some((0, 4)), 0);

        assert_eq!(snake.head(), Some((0, 3)));
        assert_eq!(snake.step(), StepOutcome::Filled);
        assert_eq!(snake.state(), SnakeState::Won);
        assert_eq!(snake.food(), None);
    }

    #[test]
    fn advance_steps_per_interval_and_respects_pause() {
        let mut snake = Snake::init(0);

        snake.advance(Duration::from_millis(149));
        assert_eq!(snake.head(), Some((10, 10)));
        snake.advance(Duration::from_millis(1));
        assert_eq!(snake.head(), Some((10, 9)));
        snake.advance(Duration::from_millis(300));
        assert_eq!(snake.head(), Some((10, 7)));

        snake.apply(SnakeInput::TogglePause);
        snake.advance(Duration::from_secs(5));
        assert_eq!(snake.head(), Some((10, 7)));
    }

    #[test]
    fn body_stays_unique_while_alive() {
        let mut snake = Snake::init(99);
        let turns = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
        for i in 0..500 {
            if i % 7 == 0 {
                snake.turn(turns[(i / 7) % 4]);
            }
            snake.step();
            if snake.state() != SnakeState::Alive {
                break;
            }
            assert!(!has_duplicates(snake.body()));
        }
    }
}
