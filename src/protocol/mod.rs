mod message;
mod command;
mod control;
pub mod constants;

pub use message::*;
pub use command::*;
pub use control::*;
pub use constants::*;
