//! Ritual state and the temple backend.
//!
//! - [`step`], [`blocks`], [`lot`]: the ritual's vocabulary.
//! - [`client`], [`frame`], [`chat_stream`]: talking to the backend.
//! - [`app`]: the state owner and its action reducer.
//! - [`config`]: the persisted settings file.

pub mod app;
pub mod blocks;
pub mod chat_stream;
pub mod client;
pub mod config;
pub mod frame;
pub mod lot;
pub mod message;
pub mod step;
