use core::time::Duration;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Per-instance random source. Seeded, so a seed plus an input sequence replays a game.
pub type GameRng = SmallRng;

pub fn seeded_rng(seed: u64) -> GameRng {
    GameRng::seed_from_u64(seed)
}

/// Uniform contract every mini-game implements so a host can drive any of them.
///
/// `apply`/`advance` mutate in place; `handle_input`/`tick` are the by-value forms
/// that hand back the next state.
pub trait Simulator: Sized {
    type Config: Default;
    type Input;
    type Snapshot;

    fn new(config: Self::Config, seed: u64) -> Self;

    fn init(seed: u64) -> Self {
        Self::new(Self::Config::default(), seed)
    }

    /// Game-rule violations are no-ops, never errors.
    fn apply(&mut self, input: Self::Input);

    fn advance(&mut self, _dt: Duration) {}

    fn is_terminal(&self) -> bool;

    fn snapshot(&self) -> Self::Snapshot;

    /// Cancels every outstanding scheduled transition.
    fn teardown(&mut self) {}

    /// Tears down and deals a fresh game with the same configuration.
    fn reset(&mut self);

    fn handle_input(mut self, input: Self::Input) -> Self {
        self.apply(input);
        self
    }

    fn tick(mut self, dt: Duration) -> Self {
        self.advance(dt);
        self
    }
}
