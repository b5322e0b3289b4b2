//! # ducker-memory
//!
//! Append-only conversation and joke history for Ducker (SQLite-backed).

pub mod store;

pub use store::Store;
