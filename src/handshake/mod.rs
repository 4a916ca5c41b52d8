mod packet;
mod state;
mod negotiator;

pub use packet::*;
pub use state::*;
pub use negotiator::*;
