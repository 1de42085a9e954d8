use thiserror::Error;

use crate::UpgradeId;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Index {0} is out of range")]
    InvalidIndex(usize),
    #[error("Unknown upgrade {0}")]
    UnknownUpgrade(UpgradeId),
    #[error("Too many mines")]
    TooManyMines,
    #[error("Tile {0} is not a power of two")]
    InvalidTile(u32),
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
}
