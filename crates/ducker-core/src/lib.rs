//! # ducker-core
//!
//! Core types, collaborator traits, configuration, and error handling for the
//! Ducker agent.

pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod sanitize;
pub mod traits;

pub use config::shellexpand;
