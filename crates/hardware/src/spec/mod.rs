//! The device specification: one data-driven table per configured standard
//! that governs every [`crate::node::HierarchyNode`] in the simulation.
//!
//! There is exactly one Rust type here, `DeviceSpec`; DDR3 and HBM differ
//! only in the values a `DeviceSpec` holds (organization shape, timing
//! constants, row-buffer level, refresh granularity), never in a
//! per-standard `impl`. New standards are new preset functions in
//! `presets.rs`, not new types.

mod presets;
mod timing;

pub use timing::{Organization, SpeedTable, TimingRule};

use crate::command::Command;
use crate::common::Result;
use crate::level::Level;
use crate::request::RequestType;

/// Whether refresh targets a whole rank at once or one subarray at a time.
///
/// Kept as a switch on the single [`crate::refresh::Refresh`] type rather
/// than a second refresh type, the same data-driven choice as `DeviceSpec`
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshGranularity {
    /// `REF`: all banks in the rank refresh together.
    AllBank,
    /// `REFSB`: subarrays refresh independently (DSARP).
    PerSubarray,
}

/// The complete, immutable timing/organization model for one configured
/// standard. Built once at startup by [`DeviceSpec::build`] and shared
/// (read-only) by every [`crate::controller::Controller`] on that channel.
#[derive(Debug, Clone)]
pub struct DeviceSpec {
    /// The standard name this spec was built for (`"ddr4"`, `"hbm"`, ...), for
    /// diagnostics and stats labeling.
    pub standard_name: String,
    /// Device counts at each hierarchy level.
    pub org: Organization,
    /// Timing constants in DRAM cycles.
    pub speed: SpeedTable,
    /// The level that owns row-buffer state (`Bank`, or `Subarray` for
    /// SALP/DSARP).
    pub row_buffer_level: Level,
    /// Whole-rank or per-subarray refresh.
    pub refresh_granularity: RefreshGranularity,
    /// Fixed read latency in cycles, issue to data-ready (§4.3).
    pub read_latency: u64,
    /// Burst length in beats, for bandwidth accounting.
    pub prefetch_size: u64,
    /// Data bus width per channel, bits.
    pub channel_width_bits: u64,
    /// The generic timing rule set derived from `speed`/`row_buffer_level`.
    pub timing_rules: Vec<TimingRule>,
}

impl DeviceSpec {
    /// Resolves `standard`/`org_preset`/`speed_preset` into a complete spec,
    /// then overrides the channel/rank/subarray counts from `channels`/
    /// `ranks`/`subarrays` if given (channels and ranks must stay powers of
    /// two; §4.8).
    pub fn build(
        standard: &str,
        org_preset: &str,
        speed_preset: &str,
        channels_override: Option<u32>,
        ranks_override: Option<u32>,
    ) -> Result<Self> {
        Self::build_with_subarrays(standard, org_preset, speed_preset, channels_override, ranks_override, None)
    }

    /// As [`DeviceSpec::build`], additionally overriding the per-bank
    /// subarray count (§6 `subarrays` configuration key).
    pub fn build_with_subarrays(
        standard: &str,
        org_preset: &str,
        speed_preset: &str,
        channels_override: Option<u32>,
        ranks_override: Option<u32>,
        subarrays_override: Option<u32>,
    ) -> Result<Self> {
        let preset = presets::resolve(standard, org_preset, speed_preset)?;
        let mut org = preset.org;
        if let Some(channels) = channels_override {
            org.channels = channels;
        }
        if let Some(ranks) = ranks_override {
            org.ranks = ranks;
        }
        if let Some(subarrays) = subarrays_override {
            org.subarrays = subarrays;
        }
        check_power_of_two(Level::Channel, org.channels)?;
        check_power_of_two(Level::Rank, org.ranks)?;

        let timing_rules = timing::standard_timing_rules(&preset.speed, preset.row_buffer_level);
        Ok(Self {
            standard_name: standard.to_string(),
            org,
            speed: preset.speed,
            row_buffer_level: preset.row_buffer_level,
            refresh_granularity: preset.refresh_granularity,
            read_latency: preset.read_latency,
            prefetch_size: preset.prefetch_size,
            channel_width_bits: preset.channel_width_bits,
            timing_rules,
        })
    }

    /// Maps a request type onto the command that services it directly.
    #[must_use]
    pub fn translate(&self, req_type: RequestType) -> Command {
        match req_type {
            RequestType::Read => Command::Rd,
            RequestType::Write => Command::Wr,
            RequestType::Refresh => match self.refresh_granularity {
                RefreshGranularity::AllBank => Command::Ref,
                RefreshGranularity::PerSubarray => Command::RefSb,
            },
            RequestType::Other => Command::Rd,
        }
    }

    /// The hierarchy level a command's state effect and timing rules apply at.
    #[must_use]
    pub fn command_scope(&self, cmd: Command) -> Level {
        match cmd {
            Command::Act | Command::Pre | Command::Rd | Command::Wr | Command::Rda | Command::Wra | Command::RefSb => {
                self.row_buffer_level
            }
            Command::PreA | Command::Ref | Command::Pde | Command::Pdx | Command::Sre | Command::Srx => Level::Rank,
        }
    }
}

fn check_power_of_two(level: Level, value: u32) -> Result<()> {
    if value == 0 || !value.is_power_of_two() {
        return Err(crate::common::Error::NonPowerOfTwo { level, value });
    }
    Ok(())
}
