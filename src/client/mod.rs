mod client;
mod config;
mod state;
mod target;

pub use client::*;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use state::*;
pub use target::*;
