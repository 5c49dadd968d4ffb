//! The interactive ritual: terminal setup, input routing and the main loop.

mod event_loop;
mod executors;
pub mod keys;
pub mod lifecycle;

pub use event_loop::run_ritual;
