//! Configuration for the DRAM simulator.
//!
//! Supplied as JSON (`serde_json`) by the CLI's `--config` flag, or use
//! `Config::default()` to get a reasonable single-channel DDR3 run with no
//! command-trace output. This module is a thin deserialization layer — it
//! carries no timing logic of its own; [`Config::build_spec`] is the only
//! place it touches [`crate::spec::DeviceSpec`].

use std::path::PathBuf;

use serde::Deserialize;

use crate::common::Result;
use crate::memory::{AddressMapping, RowPolicyKind, SchedulerPolicy};
use crate::spec::DeviceSpec;

/// Which trace format drives the simulation (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    /// Raw `<addr_hex> <R|W>` DRAM command trace.
    Dram,
    /// `<bubble_count> <read_addr> [<write_addr>]` single-core CPU trace.
    Cpu,
    /// One CPU trace per core, `cores` of them, sharing one `Memory`.
    Multicores,
}

/// Scheduler policy names accepted from configuration (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulerConfig {
    /// First-come-first-served.
    Fcfs,
    /// First-ready, first-come-first-served.
    FrFcfs,
    /// FR-FCFS capped at `k` consecutive column accesses per open row.
    FrFcfsCap {
        /// Maximum consecutive column accesses to one open row.
        k: u32,
    },
    /// FR-FCFS where any ready hit strictly beats any non-ready request.
    FrFcfsPriorHit,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::FrFcfs
    }
}

impl From<SchedulerConfig> for SchedulerPolicy {
    fn from(cfg: SchedulerConfig) -> Self {
        match cfg {
            SchedulerConfig::Fcfs => Self::Fcfs,
            SchedulerConfig::FrFcfs => Self::FrFcfs,
            SchedulerConfig::FrFcfsCap { k } => Self::FrFcfsCap(k),
            SchedulerConfig::FrFcfsPriorHit => Self::FrFcfsPriorHit,
        }
    }
}

/// Row-buffer policy names accepted from configuration (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowPolicyConfig {
    /// Eagerly precharge idle open banks with no pending hit.
    Closed,
    /// Never speculatively precharge.
    Open,
    /// Precharge a bank idle for at least `cycles` with no pending hit.
    Timeout {
        /// Idle threshold, in cycles.
        cycles: u64,
    },
}

impl Default for RowPolicyConfig {
    fn default() -> Self {
        Self::Closed
    }
}

impl From<RowPolicyConfig> for RowPolicyKind {
    fn from(cfg: RowPolicyConfig) -> Self {
        match cfg {
            RowPolicyConfig::Closed => Self::Closed,
            RowPolicyConfig::Open => Self::Open,
            RowPolicyConfig::Timeout { cycles } => Self::Timeout(cycles),
        }
    }
}

/// Address mapping scheme (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMappingConfig {
    /// `[Channel, Rank, (BankGroup), Bank, Row, Column]`, least-significant-first.
    ChRaBaRoCo,
    /// Channel lowest, Column highest, the rest filled low-to-high up through Row.
    RoBaRaCoCh,
}

impl Default for AddressMappingConfig {
    fn default() -> Self {
        Self::ChRaBaRoCo
    }
}

impl From<AddressMappingConfig> for AddressMapping {
    fn from(cfg: AddressMappingConfig) -> Self {
        match cfg {
            AddressMappingConfig::ChRaBaRoCo => Self::ChRaBaRoCo,
            AddressMappingConfig::RoBaRaCoCh => Self::RoBaRaCoCh,
        }
    }
}

/// Per-channel controller configuration: scheduling, row policy, and queue
/// sizing (§4.4, §4.5, §3).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ControllerConfig {
    /// Scheduling policy for the read/write/other queues.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Speculative-precharge policy applied when the scheduler finds nothing ready.
    #[serde(default)]
    pub row_policy: RowPolicyConfig,
    /// Bound on each of readq/writeq/otherq.
    #[serde(default = "ControllerConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ControllerConfig {
    const fn default_queue_capacity() -> usize {
        64
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            row_policy: RowPolicyConfig::default(),
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

/// Root configuration structure (§6).
///
/// # Examples
///
/// ```
/// use dramsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.standard, "ddr3");
/// assert_eq!(config.channels, None);
/// ```
///
/// Deserializing from JSON (the shape the CLI's `--config` flag reads):
///
/// ```
/// use dramsim_core::config::{Config, TraceType};
///
/// let json = r#"{
///     "standard": "ddr4",
///     "org": "4Gb_x4",
///     "speed": "2400R",
///     "trace_type": "dram",
///     "controller": {
///         "scheduler": { "kind": "fr_fcfs_cap", "k": 4 },
///         "row_policy": { "kind": "timeout", "cycles": 100 }
///     }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.standard, "ddr4");
/// assert_eq!(config.trace_type, TraceType::Dram);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JEDEC/research standard name, lowercase (`"ddr3"`, `"hbm"`, ...).
    #[serde(default = "Config::default_standard")]
    pub standard: String,
    /// Named organization preset for the chosen standard.
    #[serde(default = "Config::default_org")]
    pub org: String,
    /// Named speed preset for the chosen standard.
    #[serde(default = "Config::default_speed")]
    pub speed: String,
    /// Channel count override (must be a power of two).
    #[serde(default)]
    pub channels: Option<u32>,
    /// Per-channel rank count override (must be a power of two).
    #[serde(default)]
    pub ranks: Option<u32>,
    /// Per-bank subarray count override (SALP/DSARP).
    #[serde(default)]
    pub subarrays: Option<u32>,
    /// Linear-address-to-hierarchy mapping scheme.
    #[serde(default)]
    pub address_mapping: AddressMappingConfig,

    /// Which trace format to drive the simulation from.
    #[serde(default = "Config::default_trace_type")]
    pub trace_type: TraceType,
    /// CPU-to-memory clock ratio: the memory clock ticks once per `cpu_tick`
    /// CPU ticks, `mem_tick` times per such tick.
    #[serde(default = "Config::default_cpu_tick")]
    pub cpu_tick: u64,
    /// See `cpu_tick`.
    #[serde(default = "Config::default_mem_tick")]
    pub mem_tick: u64,
    /// Core count for `trace_type = multicores`.
    #[serde(default = "Config::default_cores")]
    pub cores: u32,

    /// Treat a malformed trace line as fatal instead of logging and skipping it.
    #[serde(default)]
    pub early_exit: bool,
    /// Write per-(channel, rank) command-trace files.
    #[serde(default)]
    pub record_cmd_trace: bool,
    /// Echo every issued command via `tracing::debug!`.
    #[serde(default)]
    pub print_cmd_trace: bool,
    /// Path prefix for command-trace files when `record_cmd_trace` is set.
    #[serde(default = "Config::default_cmd_trace_prefix")]
    pub cmd_trace_prefix: PathBuf,

    /// Per-channel controller configuration.
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl Config {
    fn default_standard() -> String {
        "ddr3".to_string()
    }

    fn default_org() -> String {
        "1Gb_x8".to_string()
    }

    fn default_speed() -> String {
        "1600K".to_string()
    }

    const fn default_trace_type() -> TraceType {
        TraceType::Dram
    }

    const fn default_cpu_tick() -> u64 {
        1
    }

    const fn default_mem_tick() -> u64 {
        1
    }

    const fn default_cores() -> u32 {
        1
    }

    fn default_cmd_trace_prefix() -> PathBuf {
        PathBuf::from("cmd_trace")
    }

    /// Resolves this configuration's standard/org/speed/overrides into a
    /// [`DeviceSpec`] (§4.1). Fails the same way `DeviceSpec::build` does:
    /// unknown standard/preset names or a non-power-of-two channel/rank
    /// count are fatal configuration errors (§7).
    pub fn build_spec(&self) -> Result<DeviceSpec> {
        DeviceSpec::build_with_subarrays(&self.standard, &self.org, &self.speed, self.channels, self.ranks, self.subarrays)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            standard: Self::default_standard(),
            org: Self::default_org(),
            speed: Self::default_speed(),
            channels: None,
            ranks: None,
            subarrays: None,
            address_mapping: AddressMappingConfig::default(),
            trace_type: Self::default_trace_type(),
            cpu_tick: Self::default_cpu_tick(),
            mem_tick: Self::default_mem_tick(),
            cores: Self::default_cores(),
            early_exit: false,
            record_cmd_trace: false,
            print_cmd_trace: false,
            cmd_trace_prefix: Self::default_cmd_trace_prefix(),
            controller: ControllerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_spec() {
        let config = Config::default();
        let spec = config.build_spec().unwrap();
        assert_eq!(spec.standard_name, "ddr3");
    }

    #[test]
    fn deserializes_scheduler_and_row_policy_variants() {
        let json = r#"{
            "standard": "hbm",
            "org": "4Gb",
            "speed": "1000",
            "controller": {
                "scheduler": { "kind": "fr_fcfs_cap", "k": 4 },
                "row_policy": { "kind": "timeout", "cycles": 200 }
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.controller.scheduler, SchedulerConfig::FrFcfsCap { k: 4 }));
        assert!(matches!(config.controller.row_policy, RowPolicyConfig::Timeout { cycles: 200 }));
    }
}
