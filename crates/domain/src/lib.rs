//! Shared types for all PageLingo crates: configuration, the common
//! error enum, and the batch event stream vocabulary.

pub mod config;
pub mod error;
pub mod stream;

pub use error::{Error, Result};
