//! The PageLingo gateway — HTTP surface over the translation scheduler.

pub mod api;
pub mod cli;
pub mod state;
