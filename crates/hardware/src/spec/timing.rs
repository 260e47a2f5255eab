//! Timing rule tables and the speed/organization presets a [`super::DeviceSpec`]
//! is built from.

use crate::command::Command;
use crate::level::Level;

/// One timing constraint: issuing `to` at a node of level `scope` must wait
/// until `gap` cycles after `from` was issued there.
///
/// `distance == 1` is a simple constraint, tracked as a single earliest-legal
/// cycle per command (`next[to]`). `distance > 1` is a windowed constraint
/// (e.g. tFAW: no 5th `ACT` within a 4-activate window), tracked as a ring
/// buffer of the last `distance` issue cycles of `from` at that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingRule {
    /// The command that starts the clock.
    pub from: Command,
    /// The command the constraint gates.
    pub to: Command,
    /// The hierarchy level the rule is tracked at.
    pub scope: Level,
    /// Window size; `1` for a simple gap, `>1` for a windowed rule.
    pub distance: u32,
    /// Minimum cycle gap once the window/counter condition is met.
    pub gap: u64,
}

/// Per-standard organization shape: device counts at each hierarchy level.
#[derive(Debug, Clone, Copy)]
pub struct Organization {
    /// Channels.
    pub channels: u32,
    /// Ranks per channel.
    pub ranks: u32,
    /// Bank groups per rank (`1` for standards without bank groups).
    pub bank_groups: u32,
    /// Banks per bank group.
    pub banks: u32,
    /// Subarrays per bank (`1` for standards without SALP/DSARP).
    pub subarrays: u32,
    /// Rows per subarray.
    pub rows: u32,
    /// Columns per row.
    pub columns: u32,
}

impl Organization {
    /// Returns the device count at `level`.
    #[must_use]
    pub const fn count(&self, level: Level) -> u32 {
        match level {
            Level::Channel => self.channels,
            Level::Rank => self.ranks,
            Level::BankGroup => self.bank_groups,
            Level::Bank => self.banks,
            Level::Subarray => self.subarrays,
            Level::Row => self.rows,
            Level::Column => self.columns,
        }
    }
}

/// Per-standard timing in DRAM cycles (one `t_ck_ns` period each), plus the
/// clock period itself for latency-to-time conversions in stats output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedTable {
    /// DRAM clock period, nanoseconds. Used only to report bandwidth/latency
    /// in physical units; the timing engine itself works entirely in cycles.
    pub t_ck_ns: f64,
    /// RAS-to-CAS delay: `ACT` to `RD`/`WR` on the same bank.
    pub t_rcd: u64,
    /// Row precharge time: `PRE` to `ACT` on the same bank.
    pub t_rp: u64,
    /// Row active time: `ACT` to `PRE` on the same bank (minimum row-open hold).
    pub t_ras: u64,
    /// Row cycle time: `ACT` to `ACT` on the same bank.
    pub t_rc: u64,
    /// Activate-to-activate delay across different banks in a rank.
    pub t_rrd: u64,
    /// Four-activate window: minimum span for any 4 consecutive `ACT`s in a rank.
    pub t_faw: u64,
    /// Column-to-column delay (back-to-back `RD`/`WR`).
    pub t_ccd: u64,
    /// Write-to-read turnaround.
    pub t_wtr: u64,
    /// Read-to-write turnaround.
    pub t_rtw: u64,
    /// Refresh cycle time: `REF` to the next `ACT` in the refreshed rank.
    pub t_rfc: u64,
    /// Average refresh interval, cycles (paces the refresh generator).
    pub t_refi: u64,
    /// Per-pin data rate, megatransfers/second, for the max-bandwidth stat.
    pub rate_mts: f64,
}

/// Builds the generic timing rule set shared by every standard: only the
/// constants and `row_buffer_level` vary, never the rule shape itself.
#[must_use]
pub fn standard_timing_rules(speed: &SpeedTable, row_buffer_level: Level) -> Vec<TimingRule> {
    vec![
        TimingRule { from: Command::Pre, to: Command::Act, scope: row_buffer_level, distance: 1, gap: speed.t_rp },
        TimingRule { from: Command::Act, to: Command::Pre, scope: row_buffer_level, distance: 1, gap: speed.t_ras },
        TimingRule { from: Command::Act, to: Command::Act, scope: row_buffer_level, distance: 1, gap: speed.t_rc },
        TimingRule { from: Command::Act, to: Command::Rd, scope: row_buffer_level, distance: 1, gap: speed.t_rcd },
        TimingRule { from: Command::Act, to: Command::Wr, scope: row_buffer_level, distance: 1, gap: speed.t_rcd },
        TimingRule { from: Command::Rd, to: Command::Rd, scope: Level::Rank, distance: 1, gap: speed.t_ccd },
        TimingRule { from: Command::Wr, to: Command::Wr, scope: Level::Rank, distance: 1, gap: speed.t_ccd },
        TimingRule { from: Command::Wr, to: Command::Rd, scope: Level::Rank, distance: 1, gap: speed.t_wtr },
        TimingRule { from: Command::Rd, to: Command::Wr, scope: Level::Rank, distance: 1, gap: speed.t_rtw },
        TimingRule { from: Command::Act, to: Command::Act, scope: Level::Rank, distance: 1, gap: speed.t_rrd },
        TimingRule { from: Command::Act, to: Command::Act, scope: Level::Rank, distance: 4, gap: speed.t_faw },
        TimingRule { from: Command::Ref, to: Command::Act, scope: Level::Rank, distance: 1, gap: speed.t_rfc },
        TimingRule { from: Command::RefSb, to: Command::Act, scope: row_buffer_level, distance: 1, gap: speed.t_rfc },
    ]
}
