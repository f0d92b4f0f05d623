//! Driftbot: a long-running persona-driven agent that drafts and publishes
//! social posts on a randomized cadence.

pub mod agent;
pub mod clients;
pub mod config;
pub mod error;
pub mod persona;
pub mod prompt;
pub mod selector;
pub mod store;

pub use error::{Error, Result};
