pub mod config;
pub mod error;
pub mod process;
pub mod protocol;
pub mod session;
pub mod shared;
pub mod state;
pub mod transport;
