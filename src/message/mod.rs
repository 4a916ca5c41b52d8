mod dispatcher;
mod types;

pub use dispatcher::*;
pub use types::*;
