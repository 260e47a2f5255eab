//! Per-standard organization and speed presets.
//!
//! Each standard contributes one function that resolves an org/speed preset
//! name pair into concrete tables. The shapes these tables feed
//! ([`super::Organization`], [`super::SpeedTable`], [`super::DeviceSpec`])
//! are identical across standards; only the numbers and which preset names
//! are recognized differ, so there is exactly one code path in `node.rs`,
//! `controller.rs`, etc. that has to understand all of them.

use crate::common::Error;
use crate::common::Result;
use crate::level::Level;

use super::timing::{Organization, SpeedTable};
use super::RefreshGranularity;

/// Bundles everything a preset lookup produces besides the timing rules
/// (which are always derived the same way from `speed` + `row_buffer_level`).
pub struct Preset {
    pub org: Organization,
    pub speed: SpeedTable,
    pub row_buffer_level: Level,
    pub refresh_granularity: RefreshGranularity,
    pub read_latency: u64,
    pub prefetch_size: u64,
    pub channel_width_bits: u64,
}

fn unknown_org(standard: &str, preset: &str) -> Error {
    Error::UnknownOrgPreset { standard: standard.to_string(), preset: preset.to_string() }
}

fn unknown_speed(standard: &str, preset: &str) -> Error {
    Error::UnknownSpeedPreset { standard: standard.to_string(), preset: preset.to_string() }
}

pub fn resolve(standard: &str, org_preset: &str, speed_preset: &str) -> Result<Preset> {
    match standard {
        "ddr3" => ddr3(org_preset, speed_preset),
        "ddr4" => ddr4(org_preset, speed_preset),
        "lpddr3" => lpddr3(org_preset, speed_preset),
        "lpddr4" => lpddr4(org_preset, speed_preset),
        "gddr5" => gddr5(org_preset, speed_preset),
        "hbm" => hbm(org_preset, speed_preset),
        "wideio" => wideio(org_preset, speed_preset),
        "wideio2" => wideio2(org_preset, speed_preset),
        "salp_masa" => salp(org_preset, speed_preset),
        "dsarp" => dsarp(org_preset, speed_preset),
        "aldram" => aldram(org_preset, speed_preset),
        "tldram" => tldram(org_preset, speed_preset),
        other => Err(Error::UnknownStandard(other.to_string())),
    }
}

fn ddr3(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "1Gb_x8" => Organization { channels: 1, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 16384, columns: 1024 },
        "2Gb_x8" => Organization { channels: 1, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 32768, columns: 1024 },
        other => return Err(unknown_org("ddr3", other)),
    };
    let speed_table = match speed {
        "1600K" => SpeedTable { t_ck_ns: 1.25, t_rcd: 11, t_rp: 11, t_ras: 28, t_rc: 39, t_rrd: 5, t_faw: 20, t_ccd: 4, t_wtr: 6, t_rtw: 5, t_rfc: 160, t_refi: 6240, rate_mts: 1600.0 },
        "2133N" => SpeedTable { t_ck_ns: 0.9375, t_rcd: 14, t_rp: 14, t_ras: 32, t_rc: 46, t_rrd: 6, t_faw: 27, t_ccd: 4, t_wtr: 8, t_rtw: 6, t_rfc: 214, t_refi: 8320, rate_mts: 2133.0 },
        other => return Err(unknown_speed("ddr3", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 14,
        prefetch_size: 8,
        channel_width_bits: 64,
    })
}

fn ddr4(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "4Gb_x4" => Organization { channels: 1, ranks: 1, bank_groups: 4, banks: 4, subarrays: 1, rows: 65536, columns: 1024 },
        "8Gb_x8" => Organization { channels: 1, ranks: 1, bank_groups: 4, banks: 4, subarrays: 1, rows: 65536, columns: 1024 },
        other => return Err(unknown_org("ddr4", other)),
    };
    let speed_table = match speed {
        "2400R" => SpeedTable { t_ck_ns: 0.833, t_rcd: 16, t_rp: 16, t_ras: 39, t_rc: 55, t_rrd: 6, t_faw: 26, t_ccd: 4, t_wtr: 9, t_rtw: 7, t_rfc: 420, t_refi: 9360, rate_mts: 2400.0 },
        "3200AA" => SpeedTable { t_ck_ns: 0.625, t_rcd: 22, t_rp: 22, t_ras: 52, t_rc: 74, t_rrd: 8, t_faw: 32, t_ccd: 4, t_wtr: 12, t_rtw: 9, t_rfc: 560, t_refi: 12480, rate_mts: 3200.0 },
        other => return Err(unknown_speed("ddr4", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 16,
        prefetch_size: 8,
        channel_width_bits: 64,
    })
}

fn lpddr3(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "4Gb_x16" => Organization { channels: 1, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 32768, columns: 512 },
        other => return Err(unknown_org("lpddr3", other)),
    };
    let speed_table = match speed {
        "1600" => SpeedTable { t_ck_ns: 1.25, t_rcd: 11, t_rp: 11, t_ras: 28, t_rc: 39, t_rrd: 5, t_faw: 32, t_ccd: 4, t_wtr: 6, t_rtw: 5, t_rfc: 175, t_refi: 6240, rate_mts: 1600.0 },
        other => return Err(unknown_speed("lpddr3", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 14,
        prefetch_size: 8,
        channel_width_bits: 32,
    })
}

fn lpddr4(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "8Gb_x16" => Organization { channels: 2, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 65536, columns: 1024 },
        other => return Err(unknown_org("lpddr4", other)),
    };
    let speed_table = match speed {
        "3200" => SpeedTable { t_ck_ns: 0.625, t_rcd: 18, t_rp: 18, t_ras: 42, t_rc: 60, t_rrd: 7, t_faw: 40, t_ccd: 4, t_wtr: 10, t_rtw: 8, t_rfc: 280, t_refi: 6240, rate_mts: 3200.0 },
        other => return Err(unknown_speed("lpddr4", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 18,
        prefetch_size: 16,
        channel_width_bits: 16,
    })
}

fn gddr5(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "2Gb_x32" => Organization { channels: 1, ranks: 1, bank_groups: 4, banks: 4, subarrays: 1, rows: 16384, columns: 512 },
        other => return Err(unknown_org("gddr5", other)),
    };
    let speed_table = match speed {
        "6000" => SpeedTable { t_ck_ns: 0.333, t_rcd: 12, t_rp: 12, t_ras: 28, t_rc: 40, t_rrd: 5, t_faw: 23, t_ccd: 2, t_wtr: 5, t_rtw: 4, t_rfc: 65, t_refi: 1950, rate_mts: 6000.0 },
        other => return Err(unknown_speed("gddr5", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 10,
        prefetch_size: 8,
        channel_width_bits: 32,
    })
}

fn hbm(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "4Gb" => Organization { channels: 8, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 16384, columns: 64 },
        other => return Err(unknown_org("hbm", other)),
    };
    let speed_table = match speed {
        "1000" => SpeedTable { t_ck_ns: 1.0, t_rcd: 14, t_rp: 14, t_ras: 33, t_rc: 47, t_rrd: 4, t_faw: 16, t_ccd: 2, t_wtr: 4, t_rtw: 3, t_rfc: 160, t_refi: 3900, rate_mts: 1000.0 },
        other => return Err(unknown_speed("hbm", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 10,
        prefetch_size: 2,
        channel_width_bits: 128,
    })
}

fn wideio(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "1Gb" => Organization { channels: 4, ranks: 1, bank_groups: 1, banks: 4, subarrays: 1, rows: 8192, columns: 512 },
        other => return Err(unknown_org("wideio", other)),
    };
    let speed_table = match speed {
        "266" => SpeedTable { t_ck_ns: 3.75, t_rcd: 9, t_rp: 9, t_ras: 21, t_rc: 30, t_rrd: 3, t_faw: 12, t_ccd: 1, t_wtr: 3, t_rtw: 2, t_rfc: 64, t_refi: 3900, rate_mts: 266.0 },
        other => return Err(unknown_speed("wideio", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 8,
        prefetch_size: 4,
        channel_width_bits: 128,
    })
}

fn wideio2(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "8Gb" => Organization { channels: 4, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 16384, columns: 512 },
        other => return Err(unknown_org("wideio2", other)),
    };
    let speed_table = match speed {
        "800" => SpeedTable { t_ck_ns: 1.25, t_rcd: 11, t_rp: 11, t_ras: 26, t_rc: 37, t_rrd: 4, t_faw: 16, t_ccd: 2, t_wtr: 4, t_rtw: 3, t_rfc: 130, t_refi: 3900, rate_mts: 800.0 },
        other => return Err(unknown_speed("wideio2", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 9,
        prefetch_size: 4,
        channel_width_bits: 64,
    })
}

/// SALP-MASA: subarray-level parallelism. Each subarray independently tracks
/// its own open row, so `row_buffer_level` moves one level deeper than a
/// stock DDR3 bank and per-subarray refresh becomes meaningful.
fn salp(org: &str, speed: &str) -> Result<Preset> {
    let mut preset = ddr3(org, speed)?;
    preset.org.subarrays = 8;
    preset.row_buffer_level = Level::Subarray;
    Ok(preset)
}

/// DSARP: SALP plus fine-grained (per-subarray) refresh.
fn dsarp(org: &str, speed: &str) -> Result<Preset> {
    let mut preset = salp(org, speed)?;
    preset.refresh_granularity = RefreshGranularity::PerSubarray;
    Ok(preset)
}

/// ALDRAM: adaptive-latency DRAM. Same organization as DDR3; the relaxed
/// `tRCD`/`tRAS`/`tRP` this standard is known for is a matter of which speed
/// preset the config picks, not a structural difference.
fn aldram(org: &str, speed: &str) -> Result<Preset> {
    ddr3(org, speed)
}

/// TL-DRAM: tiered-latency DRAM (a near/far segment within each bank).
/// Modeled as a DDR3 device with a faster `tRAS`/`tRCD` on the near segment;
/// approximated here by a dedicated speed preset rather than two segments,
/// since the scheduler/row-policy layer has no notion of segments.
fn tldram(org: &str, speed: &str) -> Result<Preset> {
    let org_table = match org {
        "2Gb_x8" => Organization { channels: 1, ranks: 1, bank_groups: 1, banks: 8, subarrays: 1, rows: 32768, columns: 1024 },
        other => return Err(unknown_org("tldram", other)),
    };
    let speed_table = match speed {
        "near" => SpeedTable { t_ck_ns: 1.25, t_rcd: 6, t_rp: 6, t_ras: 14, t_rc: 20, t_rrd: 5, t_faw: 20, t_ccd: 4, t_wtr: 6, t_rtw: 5, t_rfc: 160, t_refi: 6240, rate_mts: 1600.0 },
        other => return Err(unknown_speed("tldram", other)),
    };
    Ok(Preset {
        org: org_table,
        speed: speed_table,
        row_buffer_level: Level::Bank,
        refresh_granularity: RefreshGranularity::AllBank,
        read_latency: speed_table.t_rcd + 14,
        prefetch_size: 8,
        channel_width_bits: 64,
    })
}
