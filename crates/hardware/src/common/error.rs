//! Fatal configuration errors.
//!
//! Per the error handling design, only configuration problems reach this
//! type: unknown standards/presets, organizations that violate the
//! power-of-two requirement, and I/O failures opening command-trace files.
//! Malformed trace lines are not errors — they are logged and skipped by
//! the trace reader (§7) — and internal invariant violations are fatal
//! assertions, not `Result`s, since they indicate a simulator bug rather
//! than a modelable condition.

use crate::level::Level;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal configuration error, surfaced before simulation starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `config.standard` did not name a known DRAM standard.
    #[error("unknown standard {0:?}")]
    UnknownStandard(String),

    /// `config.org` did not name a known organization preset for the standard.
    #[error("unknown organization preset {preset:?} for standard {standard:?}")]
    UnknownOrgPreset {
        /// The standard the preset was requested for.
        standard: String,
        /// The unrecognized preset name.
        preset: String,
    },

    /// `config.speed` did not name a known speed-table preset for the standard.
    #[error("unknown speed preset {preset:?} for standard {standard:?}")]
    UnknownSpeedPreset {
        /// The standard the preset was requested for.
        standard: String,
        /// The unrecognized preset name.
        preset: String,
    },

    /// `channels`/`ranks` must be a power of two (§4.8); some other count was configured.
    #[error("{level:?} count {value} is not a power of two")]
    NonPowerOfTwo {
        /// The offending hierarchy level.
        level: Level,
        /// The configured count.
        value: u32,
    },

    /// A command-trace output file could not be opened for writing.
    #[error("command trace I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A trace line could not be parsed; only raised when `early_exit` is
    /// set (§7) — otherwise the reader logs a warning and skips the line.
    #[error("malformed trace line {line_no}: {text:?}")]
    InvalidTraceLine {
        /// 1-based line number within the trace file.
        line_no: usize,
        /// The offending line, verbatim.
        text: String,
    },
}

impl Error {
    /// Returns a short, user-facing label for the error kind, used by the
    /// CLI to distinguish a config problem from an internal bug in its exit
    /// message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownStandard(_) => "unknown_standard",
            Error::UnknownOrgPreset { .. } => "unknown_org_preset",
            Error::UnknownSpeedPreset { .. } => "unknown_speed_preset",
            Error::NonPowerOfTwo { .. } => "non_power_of_two",
            Error::Io(_) => "io",
            Error::InvalidTraceLine { .. } => "invalid_trace_line",
        }
    }
}
