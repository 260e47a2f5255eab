//! Trace file parsing and command-trace output (§6).
//!
//! Out of the core's *timing* budget per §1, but required for the
//! workspace to run end to end; kept thin and free of any DRAM timing
//! logic of its own.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::command::Command;
use crate::common::{Error, Result};
use crate::level::Level;
use crate::request::AddrVec;
use crate::spec::DeviceSpec;

/// One line of a DRAM-level trace: a raw `<addr_hex> <R|W>` access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramTraceLine {
    /// Linear byte address.
    pub addr: u64,
    /// `true` for a write, `false` for a read.
    pub is_write: bool,
}

/// One line of a CPU-level trace: a bubble count plus a read and an
/// optional write-back (evicted dirty cacheline) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTraceLine {
    /// Non-memory instructions preceding this access.
    pub bubble_count: u64,
    /// The load address.
    pub read_addr: u64,
    /// An evicted dirty cacheline's address, if one accompanies this access.
    pub write_addr: Option<u64>,
}

/// Parses one DRAM trace line (`<addr_hex> <R|W>`), or logs a warning and
/// returns `None` if malformed (§7) — unless `early_exit` is set, in which
/// case malformed lines are a fatal [`Error::InvalidTraceLine`].
pub fn parse_dram_line(line_no: usize, line: &str, early_exit: bool) -> Result<Option<DramTraceLine>> {
    let mut parts = line.split_whitespace();
    let (Some(addr_str), Some(kind_str), None) = (parts.next(), parts.next(), parts.next()) else {
        return reject_line(line_no, line, early_exit);
    };
    let Ok(addr) = u64::from_str_radix(addr_str.trim_start_matches("0x"), 16) else {
        return reject_line(line_no, line, early_exit);
    };
    let is_write = match kind_str {
        "R" => false,
        "W" => true,
        _ => return reject_line(line_no, line, early_exit),
    };
    Ok(Some(DramTraceLine { addr, is_write }))
}

/// Parses one CPU trace line (`<bubble_count> <read_addr> [<write_addr>]`),
/// or logs a warning and returns `None` if malformed (§7).
pub fn parse_cpu_line(line_no: usize, line: &str, early_exit: bool) -> Result<Option<CpuTraceLine>> {
    let mut parts = line.split_whitespace();
    let Some(bubble_str) = parts.next() else { return reject_line(line_no, line, early_exit) };
    let Some(read_str) = parts.next() else { return reject_line(line_no, line, early_exit) };
    let write_str = parts.next();
    if parts.next().is_some() {
        return reject_line(line_no, line, early_exit);
    }

    let (Ok(bubble_count), Ok(read_addr)) = (bubble_str.parse::<u64>(), parse_hex(read_str)) else {
        return reject_line(line_no, line, early_exit);
    };
    let write_addr = match write_str {
        Some(s) => match parse_hex(s) {
            Ok(a) => Some(a),
            Err(()) => return reject_line(line_no, line, early_exit),
        },
        None => None,
    };

    Ok(Some(CpuTraceLine { bubble_count, read_addr, write_addr }))
}

fn parse_hex(s: &str) -> std::result::Result<u64, ()> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|_| ())
}

fn reject_line<T>(line_no: usize, line: &str, early_exit: bool) -> Result<Option<T>> {
    if early_exit {
        return Err(Error::InvalidTraceLine { line_no, text: line.to_string() });
    }
    warn!(line_no, line, "skipping malformed trace line");
    Ok(None)
}

/// A buffered line reader shared by both trace formats; owns nothing about
/// *what* the lines mean.
pub struct TraceReader {
    lines: std::io::Lines<BufReader<File>>,
    line_no: usize,
}

impl TraceReader {
    /// Opens `path` for line-oriented reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self { lines: BufReader::new(file).lines(), line_no: 0 })
    }

    /// Reads and returns the next non-empty raw line, or `None` at EOF.
    pub fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        loop {
            let Some(line) = self.lines.next() else { return Ok(None) };
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some((self.line_no, line)));
        }
    }
}

/// Writes per-`(channel, rank)` command-trace files (§6): one line per
/// issued command, `<cycle>,<CMD_NAME>[,<bank_id>]`.
///
/// Files are opened lazily, the first time a rank is addressed, so a
/// channel with ranks that never issue anything produces no empty file.
#[derive(Debug)]
pub struct CommandTraceSink {
    channel: usize,
    prefix: PathBuf,
    record: bool,
    print: bool,
    files: Vec<Option<File>>,
}

impl CommandTraceSink {
    /// Creates a sink for one channel with `ranks` ranks. `record` enables
    /// file output under `prefix`; `print` enables `tracing::debug!` echo of
    /// every issued command (both may be enabled independently, per §6).
    #[must_use]
    pub fn new(channel: usize, ranks: u32, prefix: PathBuf, record: bool, print: bool) -> Self {
        Self { channel, prefix, record, print, files: (0..ranks).map(|_| None).collect() }
    }

    /// Emits one command-trace line for `cmd` issued against `addr` at `clk`.
    pub fn emit(&mut self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec, clk: u64) -> Result<()> {
        if self.print {
            tracing::debug!(channel = self.channel, cycle = clk, cmd = cmd.trace_name(), "issued");
        }
        if !self.record {
            return Ok(());
        }

        let rank = addr[Level::Rank.index()] as usize;
        if self.files[rank].is_none() {
            let path = PathBuf::from(format!("{}_ch{}_rank{}.trace", self.prefix.display(), self.channel, rank));
            self.files[rank] = Some(File::create(path)?);
        }
        let Some(file) = self.files[rank].as_mut() else { unreachable!("just populated above") };

        if cmd.omits_bank_field() {
            writeln!(file, "{clk},{}", cmd.trace_name())?;
        } else {
            let bank_id = bank_id(spec, addr);
            writeln!(file, "{clk},{},{bank_id}", cmd.trace_name())?;
        }
        Ok(())
    }
}

/// Flattens bank-group/bank into one id, per §6: `bank + bankgroup *
/// banks_per_group`. Degenerates to plain `bank` on standards without bank
/// groups (`bank_groups == 1`).
fn bank_id(spec: &DeviceSpec, addr: &AddrVec) -> i64 {
    let bank = i64::from(addr[Level::Bank.index()]);
    let bank_group = i64::from(addr[Level::BankGroup.index()]);
    bank + bank_group * i64::from(spec.org.count(Level::Bank))
}

/// Ensures the parent directory of a configured trace-output prefix exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_dram_line() {
        let parsed = parse_dram_line(1, "0x1000 R", false).unwrap();
        assert_eq!(parsed, Some(DramTraceLine { addr: 0x1000, is_write: false }));
    }

    #[test]
    fn skips_malformed_dram_line_by_default() {
        let parsed = parse_dram_line(1, "not a line", false).unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn early_exit_rejects_malformed_line() {
        let err = parse_dram_line(1, "garbage", true).unwrap_err();
        assert!(matches!(err, Error::InvalidTraceLine { line_no: 1, .. }));
    }

    #[test]
    fn parses_cpu_line_with_optional_write() {
        let parsed = parse_cpu_line(1, "12 0x1000 0x2000", false).unwrap().unwrap();
        assert_eq!(parsed.bubble_count, 12);
        assert_eq!(parsed.read_addr, 0x1000);
        assert_eq!(parsed.write_addr, Some(0x2000));
    }

    #[test]
    fn parses_cpu_line_without_write() {
        let parsed = parse_cpu_line(1, "3 0x1000", false).unwrap().unwrap();
        assert_eq!(parsed.write_addr, None);
    }
}
