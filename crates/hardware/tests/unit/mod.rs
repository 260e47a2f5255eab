//! Integration tests for the `dramsim-core` public API.

/// Round-trip/idempotence property (§8): replaying the same input trace
/// against a fresh device must reproduce the same command sequence.
pub mod round_trip;
