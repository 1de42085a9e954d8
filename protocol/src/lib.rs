use serde::{Deserialize, Serialize};

pub use history::*;

mod history;

/// Engines a host shell can mount.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    SlidingMerge,
    Minesweeper,
    Snake,
    MemoryMatch,
    Reflex,
    Economy,
    TicTacToe,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        Self::SlidingMerge,
        Self::Minesweeper,
        Self::Snake,
        Self::MemoryMatch,
        Self::Reflex,
        Self::Economy,
        Self::TicTacToe,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::SlidingMerge => "sliding-merge",
            Self::Minesweeper => "minesweeper",
            Self::Snake => "snake",
            Self::MemoryMatch => "memory-match",
            Self::Reflex => "reflex",
            Self::Economy => "economy",
            Self::TicTacToe => "tic-tac-toe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Keys the host forwards, everything else is dropped before it reaches an engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(Self::ArrowUp),
            "ArrowDown" => Some(Self::ArrowDown),
            "ArrowLeft" => Some(Self::ArrowLeft),
            "ArrowRight" => Some(Self::ArrowRight),
            " " | "Spacebar" => Some(Self::Space),
            "Enter" => Some(Self::Enter),
            _ => None,
        }
    }
}

/// Raw input event as produced by the host shell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Key { key: Key },
    /// The game's primary button (reaction pad, resource generator).
    Action,
    /// Primary click/tap on a linear element: card, square or button.
    Select { index: usize },
    /// Primary click/tap on a grid cell.
    Cell { x: u8, y: u8 },
    /// Secondary click on a grid cell (context menu / long press).
    AltCell { x: u8, y: u8 },
}
