pub mod analyzer;
mod bot;
pub mod config;
mod economy;
mod element;
mod engine;
mod map;
mod occupancy;
mod path;
mod players;
mod rng;
pub mod search;
pub mod selfplay;
mod stats;
mod store;

pub use crate::bot::run_bot_turn;
pub use crate::economy::*;
pub use crate::element::*;
pub use crate::engine::*;
pub use crate::map::*;
pub use crate::occupancy::*;
pub use crate::path::*;
pub use crate::players::*;
pub use crate::rng::*;
pub use crate::stats::*;
pub use crate::store::*;
