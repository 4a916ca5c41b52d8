mod connection;
mod io;
mod state;
mod transport;

pub use connection::*;
pub use io::*;
pub use state::*;
pub use transport::*;
