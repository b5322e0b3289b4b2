//! # ducker-channels
//!
//! Messaging transports for Ducker.

pub mod console;
