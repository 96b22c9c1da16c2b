mod command;
mod event;
mod ids;
mod snapshot;
mod types;
pub mod wire;

pub use crate::command::*;
pub use crate::event::*;
pub use crate::ids::*;
pub use crate::snapshot::*;
pub use crate::types::*;
