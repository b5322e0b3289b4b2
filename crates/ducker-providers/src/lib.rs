//! # ducker-providers
//!
//! AI backend implementations for Ducker.

pub mod gemini;
