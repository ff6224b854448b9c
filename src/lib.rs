//! Vocabulary and idiom drills in the terminal.
//!
//! The drill core (`bank`, `engine`, `session`, `store`) has no terminal
//! dependencies; `app` and `ui` wrap it in a ratatui front end.

pub mod app;
pub mod bank;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod session;
pub mod speech;
pub mod store;
pub mod ui;
