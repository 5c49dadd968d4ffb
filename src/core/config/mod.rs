pub mod data;
pub mod io;

pub use data::{Config, DEFAULT_SERVER_URL};
pub use io::ConfigError;
