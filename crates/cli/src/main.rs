//! DRAM simulator CLI.
//!
//! A single `run` subcommand drives one of three trace formats (§6) against
//! a configured [`DeviceSpec`] and flushes a flat statistics report at the
//! end. All the logic here is thin glue over `dramsim-core` — trace
//! reading, CPU-clock/memory-clock ratio bookkeeping, and config/stats
//! file I/O; no DRAM timing decision is made in this crate.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dramsim_core::common::Result;
use dramsim_core::config::Config;
use dramsim_core::cpu_driver::CpuTraceDriver;
use dramsim_core::memory::Memory;
use dramsim_core::request::{Request, RequestType};
use dramsim_core::spec::DeviceSpec;
use dramsim_core::stats::StatsRegistry;
use dramsim_core::trace::{ensure_parent_dir, parse_dram_line, CommandTraceSink, TraceReader};

#[derive(Parser, Debug)]
#[command(name = "dramsim", author, version, about = "Cycle-accurate DRAM memory controller simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation against one or more trace files.
    Run {
        /// JSON configuration file; omitted means `Config::default()`.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Trace format driving this run.
        #[arg(long, value_enum)]
        mode: Mode,
        /// Output path for the final statistics flush; stdout if omitted.
        #[arg(long)]
        stats: Option<PathBuf>,
        /// One trace file (`dram`/`cpu` mode) or one per core (`multicores`).
        #[arg(required = true)]
        traces: Vec<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// Raw `<addr_hex> <R|W>` DRAM command trace.
    Dram,
    /// Single-core `<bubble_count> <read_addr> [<write_addr>]` trace.
    Cpu,
    /// One CPU trace per core, sharing one `Memory`.
    Multicores,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let Commands::Run { config, mode, stats, traces } = Cli::parse().command;
    if let Err(err) = run(config, mode, stats, &traces) {
        eprintln!("dramsim: {err} ({})", err.kind());
        process::exit(1);
    }
}

fn run(config_path: Option<PathBuf>, mode: Mode, stats_path: Option<PathBuf>, traces: &[PathBuf]) -> Result<()> {
    let config = load_config(config_path);
    let spec = Arc::new(config.build_spec()?);

    let cmd_trace = build_cmd_trace_sinks(&config, &spec)?;
    let mut memory = Memory::new(
        Arc::clone(&spec),
        config.address_mapping.into(),
        config.controller.queue_capacity,
        config.controller.scheduler.into(),
        config.controller.row_policy.into(),
        cmd_trace,
    );
    let mut stats = StatsRegistry::new(memory.num_channels());

    match mode {
        Mode::Dram => run_dram(first_trace(traces), config.early_exit, &mut memory, &mut stats)?,
        Mode::Cpu => {
            let mut drivers = vec![CpuTraceDriver::open(first_trace(traces), 0, config.early_exit)?];
            run_cpu_like(&mut drivers, config.cpu_tick, config.mem_tick, &mut memory, &mut stats)?;
        }
        Mode::Multicores => {
            let mut drivers = traces
                .iter()
                .enumerate()
                .map(|(core_id, path)| CpuTraceDriver::open(path, core_id as i32, config.early_exit))
                .collect::<Result<Vec<_>>>()?;
            run_cpu_like(&mut drivers, config.cpu_tick, config.mem_tick, &mut memory, &mut stats)?;
        }
    }

    flush_stats(&stats, &spec, stats_path)
}

fn first_trace(traces: &[PathBuf]) -> &PathBuf {
    traces.first().unwrap_or_else(|| {
        eprintln!("dramsim: this mode takes exactly one trace file");
        process::exit(1);
    })
}

fn load_config(path: Option<PathBuf>) -> Config {
    let Some(path) = path else { return Config::default() };
    let text = fs::read_to_string(&path).unwrap_or_else(|err| {
        eprintln!("dramsim: reading {}: {err}", path.display());
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|err| {
        eprintln!("dramsim: parsing {}: {err}", path.display());
        process::exit(1);
    })
}

fn build_cmd_trace_sinks(config: &Config, spec: &DeviceSpec) -> Result<Option<Vec<CommandTraceSink>>> {
    if !config.record_cmd_trace && !config.print_cmd_trace {
        return Ok(None);
    }
    if config.record_cmd_trace {
        ensure_parent_dir(&config.cmd_trace_prefix)?;
    }
    let sinks = (0..spec.org.channels)
        .map(|channel| {
            CommandTraceSink::new(
                channel as usize,
                spec.org.ranks,
                config.cmd_trace_prefix.clone(),
                config.record_cmd_trace,
                config.print_cmd_trace,
            )
        })
        .collect();
    Ok(Some(sinks))
}

/// Drives a raw DRAM trace: one request per line, retried every cycle until
/// the channel admits it, then ticks once per admitted or stalled attempt.
fn run_dram(path: &PathBuf, early_exit: bool, memory: &mut Memory, stats: &mut StatsRegistry) -> Result<()> {
    let mut reader = TraceReader::open(path)?;
    let mut stalled: Option<Request> = None;

    loop {
        let req = match stalled.take() {
            Some(req) => req,
            None => match reader.next_line()? {
                Some((line_no, text)) => match parse_dram_line(line_no, &text, early_exit)? {
                    Some(parsed) => {
                        let req_type = if parsed.is_write { RequestType::Write } else { RequestType::Read };
                        Request::new(parsed.addr, req_type, 0)
                    }
                    None => continue,
                },
                None => {
                    if memory.pending_requests() == 0 {
                        return Ok(());
                    }
                    memory.tick(stats)?;
                    continue;
                }
            },
        };

        if !memory.send(req.clone(), stats) {
            stalled = Some(req);
        }
        memory.tick(stats)?;
    }
}

/// Drives one or more CPU traces at the configured CPU-to-memory clock
/// ratio: `cpu_tick` CPU steps for every `mem_tick` memory ticks.
fn run_cpu_like(drivers: &mut [CpuTraceDriver], cpu_tick: u64, mem_tick: u64, memory: &mut Memory, stats: &mut StatsRegistry) -> Result<()> {
    loop {
        for _ in 0..cpu_tick.max(1) {
            for driver in drivers.iter_mut() {
                driver.step(memory, stats)?;
            }
        }
        for _ in 0..mem_tick.max(1) {
            memory.tick(stats)?;
        }
        if drivers.iter().all(CpuTraceDriver::is_done) && memory.pending_requests() == 0 {
            return Ok(());
        }
    }
}

fn flush_stats(stats: &StatsRegistry, spec: &DeviceSpec, path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = fs::File::create(&path)?;
            stats.flush(spec, &mut file)?;
        }
        None => stats.flush(spec, &mut std::io::stdout())?,
    }
    Ok(())
}
