use core::time::Duration;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

/// Any engine behind one type, so a host can swap games without generics.
#[derive(Clone, Debug)]
pub enum AnyGame {
    SlidingMerge(SlidingMerge),
    Minesweeper(Minesweeper),
    Snake(Snake),
    MemoryMatch(MemoryMatch),
    Reflex(ReflexTimer),
    Economy(IncrementalEconomy),
    TicTacToe(TicTacToe),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum AnySnapshot {
    SlidingMerge(SlidingSnapshot),
    Minesweeper(SweeperSnapshot),
    Snake(SnakeSnapshot),
    MemoryMatch(MemorySnapshot),
    Reflex(ReflexSnapshot),
    Economy(EconomySnapshot),
    TicTacToe(TicTacToeSnapshot),
}

macro_rules! each_game {
    ($value:expr, $game:ident => $body:expr) => {
        match $value {
            AnyGame::SlidingMerge($game) => $body,
            AnyGame::Minesweeper($game) => $body,
            AnyGame::Snake($game) => $body,
            AnyGame::MemoryMatch($game) => $body,
            AnyGame::Reflex($game) => $body,
            AnyGame::Economy($game) => $body,
            AnyGame::TicTacToe($game) => $body,
        }
    };
}

fn arrow_direction(key: Key) -> Option<Direction> {
    match key {
        Key::ArrowUp => Some(Direction::Up),
        Key::ArrowDown => Some(Direction::Down),
        Key::ArrowLeft => Some(Direction::Left),
        Key::ArrowRight => Some(Direction::Right),
        Key::Space | Key::Enter => None,
    }
}

fn is_press(event: &HostEvent) -> bool {
    matches!(
        event,
        HostEvent::Action
            | HostEvent::Key {
                key: Key::Space | Key::Enter
            }
    )
}

impl AnyGame {
    pub fn mount(kind: GameKind, config: &ArcadeConfig, seed: u64) -> Self {
        match kind {
            GameKind::SlidingMerge => Self::SlidingMerge(SlidingMerge::new(config.sliding, seed)),
            GameKind::Minesweeper => Self::Minesweeper(Minesweeper::new(config.sweeper, seed)),
            GameKind::Snake => Self::Snake(Snake::new(config.snake, seed)),
            GameKind::MemoryMatch => Self::MemoryMatch(MemoryMatch::new(config.memory, seed)),
            GameKind::Reflex => Self::Reflex(ReflexTimer::new(config.reflex, seed)),
            GameKind::Economy => Self::Economy(IncrementalEconomy::new(config.economy.clone(), seed)),
            GameKind::TicTacToe => Self::TicTacToe(TicTacToe::new(config.tictactoe, seed)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Self::SlidingMerge(_) => GameKind::SlidingMerge,
            Self::Minesweeper(_) => GameKind::Minesweeper,
            Self::Snake(_) => GameKind::Snake,
            Self::MemoryMatch(_) => GameKind::MemoryMatch,
            Self::Reflex(_) => GameKind::Reflex,
            Self::Economy(_) => GameKind::Economy,
            Self::TicTacToe(_) => GameKind::TicTacToe,
        }
    }

    /// Translates a raw host event into the mounted engine's input and applies it.
    /// Returns `false` when the event means nothing to this engine.
    pub fn dispatch(&mut self, event: &HostEvent) -> bool {
        let handled = match (&mut *self, *event) {
            (Self::SlidingMerge(game), HostEvent::Key { key }) => match arrow_direction(key) {
                Some(direction) => {
                    game.apply(SlidingInput::Move(direction));
                    true
                }
                None => false,
            },

            (Self::Minesweeper(game), HostEvent::Cell { x, y }) => {
                game.apply(SweeperInput::Reveal((x, y)));
                true
            }
            (Self::Minesweeper(game), HostEvent::AltCell { x, y }) => {
                game.apply(SweeperInput::ToggleFlag((x, y)));
                true
            }

            (Self::Snake(game), HostEvent::Key { key: Key::Space }) => {
                game.apply(SnakeInput::TogglePause);
                true
            }
            (Self::Snake(game), HostEvent::Key { key }) => match arrow_direction(key) {
                Some(direction) => {
                    game.apply(SnakeInput::Turn(direction));
                    true
                }
                None => false,
            },

            (Self::MemoryMatch(game), HostEvent::Select { index }) => {
                game.apply(MemoryInput::Flip(index));
                true
            }

            (Self::Reflex(game), HostEvent::Select { .. }) => {
                game.apply(ReflexInput::Trigger);
                true
            }
            (Self::Reflex(game), event) if is_press(&event) => {
                game.apply(ReflexInput::Trigger);
                true
            }

            (Self::Economy(game), HostEvent::Select { index }) => {
                match game.upgrades().get(index).map(|upgrade| upgrade.id) {
                    Some(id) => game.apply(EconomyInput::Purchase(id)),
                    None => log::warn!("no upgrade at catalog position {}", index),
                }
                true
            }
            (Self::Economy(game), event) if is_press(&event) => {
                game.apply(EconomyInput::Gain);
                true
            }

            (Self::TicTacToe(game), HostEvent::Select { index }) => {
                game.apply(TicTacToeInput::Place(index));
                true
            }
            (Self::TicTacToe(game), HostEvent::Cell { x, y }) if x < 3 && y < 3 => {
                game.apply(TicTacToeInput::Place(usize::from(y) * 3 + usize::from(x)));
                true
            }

            _ => false,
        };
        if !handled {
            log::trace!("{} ignores {:?}", self.kind().name(), event);
        }
        handled
    }

    pub fn advance(&mut self, dt: Duration) {
        each_game!(self, game => game.advance(dt))
    }

    pub fn is_terminal(&self) -> bool {
        each_game!(self, game => game.is_terminal())
    }

    pub fn snapshot(&self) -> AnySnapshot {
        match self {
            Self::SlidingMerge(game) => AnySnapshot::SlidingMerge(game.snapshot()),
            Self::Minesweeper(game) => AnySnapshot::Minesweeper(game.snapshot()),
            Self::Snake(game) => AnySnapshot::Snake(game.snapshot()),
            Self::MemoryMatch(game) => AnySnapshot::MemoryMatch(game.snapshot()),
            Self::Reflex(game) => AnySnapshot::Reflex(game.snapshot()),
            Self::Economy(game) => AnySnapshot::Economy(game.snapshot()),
            Self::TicTacToe(game) => AnySnapshot::TicTacToe(game.snapshot()),
        }
    }

    pub fn teardown(&mut self) {
        each_game!(self, game => game.teardown())
    }

    pub fn reset(&mut self) {
        each_game!(self, game => game.reset())
    }
}

/// Host-facing shell holding at most one mounted game.
///
/// Each mount gets its own seed derived from the cabinet seed, so remounting the
/// same kind deals a different game while a whole session stays reproducible.
#[derive(Clone, Debug)]
pub struct Cabinet {
    config: ArcadeConfig,
    seed: u64,
    mounts: u64,
    game: Option<AnyGame>,
    last_pump: Option<Instant>,
}

impl Cabinet {
    pub fn new(config: ArcadeConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            mounts: 0,
            game: None,
            last_pump: None,
        }
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn game(&self) -> Option<&AnyGame> {
        self.game.as_ref()
    }

    pub fn kind(&self) -> Option<GameKind> {
        self.game.as_ref().map(AnyGame::kind)
    }

    /// Replaces the mounted game. The previous one is torn down first so none of its
    /// scheduled transitions can land afterwards.
    pub fn mount(&mut self, kind: GameKind) -> &mut AnyGame {
        self.unmount();
        let seed = self
            .seed
            .wrapping_add(self.mounts.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        self.mounts += 1;
        log::debug!("mounting {} (mount #{})", kind.name(), self.mounts);
        self.game.insert(AnyGame::mount(kind, &self.config, seed))
    }

    pub fn unmount(&mut self) -> Option<AnyGame> {
        let mut game = self.game.take()?;
        log::debug!("unmounting {}", game.kind().name());
        game.teardown();
        self.last_pump = None;
        Some(game)
    }

    pub fn reset(&mut self) {
        if let Some(game) = &mut self.game {
            game.reset();
        }
    }

    /// Forwards a host event. Once [`Cabinet::pump`] has started the clock, the game is
    /// first brought up to the current wall-clock time so the event lands when it
    /// happened, not at the previous pump.
    pub fn dispatch(&mut self, event: &HostEvent) -> bool {
        if self.last_pump.is_some() {
            self.pump();
        }
        match &mut self.game {
            Some(game) => game.dispatch(event),
            None => {
                log::warn!("no game mounted for {:?}", event);
                false
            }
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        if let Some(game) = &mut self.game {
            game.advance(dt);
        }
    }

    /// Advances by the wall-clock time since the previous pump. The first pump after
    /// a mount only starts the clock.
    pub fn pump(&mut self) -> Duration {
        let now = Instant::now();
        let dt = self
            .last_pump
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_pump = Some(now);
        self.advance(dt);
        dt
    }

    pub fn is_terminal(&self) -> bool {
        self.game.as_ref().is_some_and(AnyGame::is_terminal)
    }

    pub fn snapshot(&self) -> Option<AnySnapshot> {
        self.game.as_ref().map(AnyGame::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key) -> HostEvent {
        HostEvent::Key { key }
    }

    fn mounted(kind: GameKind) -> AnyGame {
        AnyGame::mount(kind, &ArcadeConfig::default(), 1)
    }

    #[test]
    fn every_kind_mounts_as_itself() {
        for kind in GameKind::ALL {
            let game = mounted(kind);
            assert_eq!(game.kind(), kind);
            assert!(!game.is_terminal());
        }
    }

    #[test]
    fn sliding_ignores_non_arrow_keys() {
        let mut game = mounted(GameKind::SlidingMerge);
        assert!(!game.dispatch(&key(Key::Space)));
        assert!(!game.dispatch(&HostEvent::Select { index: 0 }));
        assert!(game.dispatch(&key(Key::ArrowLeft)));
    }

    #[test]
    fn snake_space_pauses() {
        let mut game = mounted(GameKind::Snake);
        assert!(game.dispatch(&key(Key::Space)));

        let AnySnapshot::Snake(before) = game.snapshot() else {
            panic!("expected snake snapshot");
        };
        game.advance(Duration::from_secs(2));
        assert_eq!(game.snapshot(), AnySnapshot::Snake(before));
    }

    #[test]
    fn sweeper_alt_click_flags() {
        let mut game = mounted(GameKind::Minesweeper);
        assert!(game.dispatch(&HostEvent::AltCell { x: 0, y: 0 }));

        let AnySnapshot::Minesweeper(snapshot) = game.snapshot() else {
            panic!("expected sweeper snapshot");
        };
        assert!(snapshot.cells[[0, 0]].is_flagged);
        assert_eq!(snapshot.mines_left, 14);
    }

    #[test]
    fn economy_action_gains_and_select_buys() {
        let mut game = mounted(GameKind::Economy);
        for _ in 0..15 {
            assert!(game.dispatch(&HostEvent::Action));
        }
        assert!(game.dispatch(&HostEvent::Select { index: 0 }));

        let AnySnapshot::Economy(snapshot) = game.snapshot() else {
            panic!("expected economy snapshot");
        };
        assert_eq!(snapshot.balance, 0.0);
        assert_eq!(snapshot.rate, 1.0);
        assert_eq!(snapshot.upgrades[0].owned, 1);
        assert_eq!(snapshot.upgrades[0].cost, 17);
    }

    #[test]
    fn tictactoe_cell_maps_row_major() {
        let mut game = mounted(GameKind::TicTacToe);
        assert!(game.dispatch(&HostEvent::Cell { x: 2, y: 1 }));
        assert!(!game.dispatch(&HostEvent::Cell { x: 3, y: 0 }));

        let AnySnapshot::TicTacToe(snapshot) = game.snapshot() else {
            panic!("expected tic-tac-toe snapshot");
        };
        assert_eq!(snapshot.board.squares()[5], Some(Mark::X));
        assert!(snapshot.opponent_thinking);
    }

    #[test]
    fn remount_tears_down_previous_game() {
        let mut cabinet = Cabinet::new(ArcadeConfig::default(), 9);
        cabinet.mount(GameKind::MemoryMatch);
        cabinet.dispatch(&HostEvent::Select { index: 0 });
        cabinet.dispatch(&HostEvent::Select { index: 1 });

        let old = cabinet.unmount().unwrap();
        let AnyGame::MemoryMatch(old) = old else {
            panic!("expected memory game");
        };
        assert!(!old.is_resolving());
        assert_eq!(cabinet.kind(), None);
        assert!(!cabinet.dispatch(&HostEvent::Action));
    }

    #[test]
    fn remounting_deals_a_fresh_seed() {
        let mut cabinet = Cabinet::new(ArcadeConfig::default(), 4);
        let first = cabinet.mount(GameKind::MemoryMatch).snapshot();
        let second = cabinet.mount(GameKind::MemoryMatch).snapshot();
        assert_ne!(first, second);

        let mut replay = Cabinet::new(ArcadeConfig::default(), 4);
        assert_eq!(replay.mount(GameKind::MemoryMatch).snapshot(), first);
    }

    #[test]
    fn first_pump_only_starts_the_clock() {
        let mut cabinet = Cabinet::new(ArcadeConfig::default(), 0);
        cabinet.mount(GameKind::Economy);
        assert_eq!(cabinet.pump(), Duration::ZERO);
    }

    #[test]
    fn snapshot_serializes_with_kind_tag() {
        let mut cabinet = Cabinet::new(ArcadeConfig::default(), 0);
        assert_eq!(cabinet.snapshot(), None);
        cabinet.mount(GameKind::Reflex);

        let json = serde_json::to_value(cabinet.snapshot().unwrap()).unwrap();
        assert_eq!(json["kind"], "reflex");
        assert_eq!(json["state"]["phase"], "Idle");
    }
}
