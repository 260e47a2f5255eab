//! # Hardware Testing Library
//!
//! Central entry point for the hardware crate's integration tests —
//! properties and scenarios that exercise the public API across module
//! boundaries, as distinct from the `#[cfg(test)]` unit tests colocated
//! with small self-contained types (`queue.rs`, `row_table.rs`, ...).

/// Cross-module property and scenario tests for the core simulator.
pub mod unit;
