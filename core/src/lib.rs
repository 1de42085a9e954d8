#![no_std]

extern crate alloc;

pub use arcadia_protocol::{GameKind, HostEvent, Key};

pub use arcade::*;
pub use config::*;
pub use economy::*;
pub use error::*;
pub use memory::*;
pub use reflex::*;
pub use schedule::*;
pub use simulator::*;
pub use sliding::*;
pub use snake::*;
pub use sweeper::*;
pub use tictactoe::*;
pub use types::*;

mod arcade;
mod config;
mod economy;
mod error;
mod memory;
mod reflex;
mod schedule;
mod simulator;
mod sliding;
mod snake;
mod sweeper;
mod tictactoe;
mod types;
