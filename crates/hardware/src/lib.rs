//! Cycle-accurate DRAM memory-controller and timing simulator.
//!
//! This crate implements the core described in the design: a per-channel
//! [`controller::Controller`] and its request queues, a tree of
//! [`node::HierarchyNode`]s (Channel → Rank → Bank-group → Bank → Subarray
//! → Row) each driven entirely by tables in an immutable
//! [`spec::DeviceSpec`], a [`scheduler::Scheduler`], a [`row_policy::RowPolicy`],
//! and a [`refresh::Refresh`] generator, all multiplexed behind
//! [`memory::Memory`]. Supporting modules ([`config`], [`trace`],
//! [`stats`], [`cpu_driver`]) make the core runnable end to end without
//! adding any timing logic of their own.

/// Common types and constants (error handling).
pub mod common;
/// Simulator configuration (standard/org/speed selection, controller policy).
pub mod config;
/// Command enum and per-command trace/scope properties.
pub mod command;
/// CPU-trace front-end collaborator (§9 supplement, multi-core trace driving).
pub mod cpu_driver;
/// Hierarchy level enum (Channel..Column) and traversal helpers.
pub mod level;
/// Address mapping and per-channel controller multiplexing.
pub mod memory;
/// The hierarchy-node tree: state, timing counters, check/decode/update.
pub mod node;
/// Bounded request queue with O(1) mid-sequence removal.
pub mod queue;
/// Refresh request generator.
pub mod refresh;
/// The memory controller: request admission and the per-cycle tick loop.
pub mod controller;
/// Memory access requests and their lifecycle.
pub mod request;
/// Per-(rank, bank-group, bank) open-row tracking.
pub mod row_table;
/// Speculative row-buffer precharge policies.
pub mod row_policy;
/// Request scheduling policies.
pub mod scheduler;
/// Per-standard device specification: organization, timing, command tables.
pub mod spec;
/// Statistics collection and reporting.
pub mod stats;
/// Trace file parsing and command-trace output.
pub mod trace;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Address mapping and per-channel controller multiplexing.
pub use crate::memory::Memory;
/// Statistics registry, passed by reference to every component that records counters.
pub use crate::stats::StatsRegistry;
