//! Full-screen terminal front end.
//!
//! - [`ritual_loop`]: owns the [`crate::core::app::App`], routes keys and
//!   runs the commands the reducer emits.
//! - [`renderer`]: draws the step panels, the result dialog and alerts.
//!
//! State transitions live in [`crate::core`]; this layer only presents them
//! and turns terminal input into actions.

pub mod renderer;
pub mod ritual_loop;
