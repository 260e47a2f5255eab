//! Statistics collection and reporting.
//!
//! Every component that wants to publish a counter does so through an
//! explicit [`StatsRegistry`] reference rather than a module-level
//! accumulator (the redesign mandated in the design notes): a
//! [`crate::controller::Controller`] is handed a `&mut ChannelStats` for
//! its own channel at construction and never reaches for global state.

use std::io::{self, Write};

use crate::request::RequestType;
use crate::spec::DeviceSpec;

/// Row-buffer outcome of a request's first command, classified once per
/// request at issue time (§4.7 step 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// The targeted bank was already open on the requested row.
    Hit,
    /// The targeted bank was closed.
    Miss,
    /// The targeted bank was open on a different row.
    Conflict,
}

/// Per-channel counters. One instance per [`crate::controller::Controller`].
#[derive(Debug, Clone, Default)]
pub struct ChannelStats {
    pub(crate) read_hits: u64,
    pub(crate) read_misses: u64,
    pub(crate) read_conflicts: u64,
    pub(crate) write_hits: u64,
    pub(crate) write_misses: u64,
    pub(crate) write_conflicts: u64,

    pub(crate) incoming_reads: u64,
    pub(crate) incoming_writes: u64,
    pub(crate) incoming_requests: u64,
    /// Reads short-circuited by write-forwarding (§4.7); excluded from
    /// row-hit/miss/conflict classification (§9 open question, resolved).
    pub(crate) forwarded_reads: u64,

    pub(crate) read_latency_sum: u64,
    pub(crate) completed_reads: u64,

    pub(crate) readq_len_sum: u64,
    pub(crate) writeq_len_sum: u64,
    pub(crate) otherq_len_sum: u64,
    pub(crate) samples: u64,

    pub(crate) active_cycles: u64,
}

impl ChannelStats {
    /// Records a newly-enqueued request (§8 Conservation is checked against
    /// this counter, minus write-forwarded reads, which never call this).
    pub fn record_incoming(&mut self, req_type: RequestType) {
        self.incoming_requests += 1;
        match req_type {
            RequestType::Read => self.incoming_reads += 1,
            RequestType::Write => self.incoming_writes += 1,
            RequestType::Refresh | RequestType::Other => {}
        }
    }

    /// Records the row-buffer classification of a request's first issued
    /// command.
    pub fn record_outcome(&mut self, req_type: RequestType, outcome: RowOutcome) {
        match (req_type, outcome) {
            (RequestType::Read, RowOutcome::Hit) => self.read_hits += 1,
            (RequestType::Read, RowOutcome::Miss) => self.read_misses += 1,
            (RequestType::Read, RowOutcome::Conflict) => self.read_conflicts += 1,
            (RequestType::Write, RowOutcome::Hit) => self.write_hits += 1,
            (RequestType::Write, RowOutcome::Miss) => self.write_misses += 1,
            (RequestType::Write, RowOutcome::Conflict) => self.write_conflicts += 1,
            (RequestType::Refresh | RequestType::Other, _) => {}
        }
    }

    /// Records a completed read's total latency (`depart - arrive`).
    pub fn record_read_latency(&mut self, latency: u64) {
        self.read_latency_sum += latency;
        self.completed_reads += 1;
    }

    /// Samples instantaneous queue lengths; called once per
    /// [`crate::controller::Controller::tick`].
    pub fn sample_queues(&mut self, readq: usize, writeq: usize, otherq: usize) {
        self.readq_len_sum += readq as u64;
        self.writeq_len_sum += writeq as u64;
        self.otherq_len_sum += otherq as u64;
        self.samples += 1;
    }

    /// Records whether the channel was serving at least one request this cycle.
    pub fn record_active(&mut self, serving: bool) {
        if serving {
            self.active_cycles += 1;
        }
    }

    /// Total row-hit + row-miss + row-conflict count across reads and writes,
    /// for the Conservation property (§8).
    #[must_use]
    pub fn total_classified(&self) -> u64 {
        self.read_hits
            + self.read_misses
            + self.read_conflicts
            + self.write_hits
            + self.write_misses
            + self.write_conflicts
    }

    /// Incoming reads and writes that actually reached the array, i.e.
    /// excluding write-forwarded reads — the operand side of the
    /// Conservation property (§8, §9 open question, resolved: excluded).
    #[must_use]
    pub fn reached_dram(&self) -> u64 {
        (self.incoming_reads - self.forwarded_reads) + self.incoming_writes
    }
}

/// A single named statistic ready for flat output (§6): `name description
/// value precision`.
struct Stat {
    name: String,
    description: &'static str,
    value: f64,
    precision: usize,
}

/// Registry of per-channel statistics plus the global cycle count, flushed
/// once at the end of a run.
#[derive(Debug, Clone)]
pub struct StatsRegistry {
    channels: Vec<ChannelStats>,
    cycles: u64,
}

impl StatsRegistry {
    /// Creates a registry with one zeroed [`ChannelStats`] per channel.
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Self { channels: vec![ChannelStats::default(); num_channels], cycles: 0 }
    }

    /// Mutable access to one channel's counters.
    pub fn channel_mut(&mut self, channel: usize) -> &mut ChannelStats {
        &mut self.channels[channel]
    }

    /// Read-only access to one channel's counters.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &ChannelStats {
        &self.channels[channel]
    }

    /// Advances the global cycle counter; called once per
    /// [`crate::memory::Memory::tick`].
    pub fn advance_cycle(&mut self) {
        self.cycles += 1;
    }

    /// Total simulated cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn stats(&self, spec: &DeviceSpec) -> Vec<Stat> {
        let mut out = vec![
            Stat { name: "cycles".into(), description: "total simulated cycles", value: self.cycles as f64, precision: 0 },
            Stat {
                name: "capacity_bytes".into(),
                description: "total device capacity in bytes",
                value: capacity_bytes(spec) as f64,
                precision: 0,
            },
            Stat {
                name: "max_bandwidth_gbps".into(),
                description: "theoretical peak bandwidth, GB/s",
                value: max_bandwidth_gbps(spec),
                precision: 3,
            },
        ];

        for (ch, c) in self.channels.iter().enumerate() {
            let avg_latency = if c.completed_reads > 0 {
                c.read_latency_sum as f64 / c.completed_reads as f64
            } else {
                0.0
            };
            let avg = |sum: u64| if c.samples > 0 { sum as f64 / c.samples as f64 } else { 0.0 };

            out.extend([
                Stat { name: format!("ch{ch}.read_row_hits"), description: "read row-buffer hits", value: c.read_hits as f64, precision: 0 },
                Stat { name: format!("ch{ch}.read_row_misses"), description: "read row-buffer misses", value: c.read_misses as f64, precision: 0 },
                Stat { name: format!("ch{ch}.read_row_conflicts"), description: "read row-buffer conflicts", value: c.read_conflicts as f64, precision: 0 },
                Stat { name: format!("ch{ch}.write_row_hits"), description: "write row-buffer hits", value: c.write_hits as f64, precision: 0 },
                Stat { name: format!("ch{ch}.write_row_misses"), description: "write row-buffer misses", value: c.write_misses as f64, precision: 0 },
                Stat { name: format!("ch{ch}.write_row_conflicts"), description: "write row-buffer conflicts", value: c.write_conflicts as f64, precision: 0 },
                Stat { name: format!("ch{ch}.incoming_requests"), description: "total enqueued requests", value: c.incoming_requests as f64, precision: 0 },
                Stat { name: format!("ch{ch}.incoming_reads"), description: "enqueued reads", value: c.incoming_reads as f64, precision: 0 },
                Stat { name: format!("ch{ch}.incoming_writes"), description: "enqueued writes", value: c.incoming_writes as f64, precision: 0 },
                Stat { name: format!("ch{ch}.read_latency_sum"), description: "sum of completed read latencies, cycles", value: c.read_latency_sum as f64, precision: 0 },
                Stat { name: format!("ch{ch}.read_latency_avg"), description: "average completed read latency, cycles", value: avg_latency, precision: 3 },
                Stat { name: format!("ch{ch}.readq_len_sum"), description: "sum of sampled read-queue lengths", value: c.readq_len_sum as f64, precision: 0 },
                Stat { name: format!("ch{ch}.readq_len_avg"), description: "average read-queue length", value: avg(c.readq_len_sum), precision: 3 },
                Stat { name: format!("ch{ch}.writeq_len_avg"), description: "average write-queue length", value: avg(c.writeq_len_sum), precision: 3 },
                Stat { name: format!("ch{ch}.otherq_len_avg"), description: "average other-queue length", value: avg(c.otherq_len_sum), precision: 3 },
                Stat { name: format!("ch{ch}.active_cycles"), description: "cycles with at least one request in service", value: c.active_cycles as f64, precision: 0 },
            ]);
        }
        out
    }

    /// Writes every statistic as one `name description value` line.
    pub fn flush(&self, spec: &DeviceSpec, out: &mut dyn Write) -> io::Result<()> {
        for stat in self.stats(spec) {
            writeln!(out, "{} {} {:.*}", stat.name, stat.description, stat.precision, stat.value)?;
        }
        Ok(())
    }
}

fn capacity_bytes(spec: &DeviceSpec) -> u64 {
    let o = &spec.org;
    let bits_per_device = u64::from(o.banks)
        * u64::from(o.bank_groups)
        * u64::from(o.subarrays)
        * u64::from(o.rows)
        * u64::from(o.columns)
        * spec.channel_width_bits;
    (u64::from(o.channels) * u64::from(o.ranks) * bits_per_device) / 8
}

fn max_bandwidth_gbps(spec: &DeviceSpec) -> f64 {
    let bytes_per_transfer = f64::from(spec.channel_width_bits as u32) / 8.0;
    spec.speed.rate_mts * bytes_per_transfer * f64::from(spec.org.channels) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conservation_tracks_classified_total() {
        let mut stats = StatsRegistry::new(1);
        let c = stats.channel_mut(0);
        c.record_incoming(RequestType::Read);
        c.record_outcome(RequestType::Read, RowOutcome::Miss);
        c.record_incoming(RequestType::Read);
        c.record_outcome(RequestType::Read, RowOutcome::Hit);
        assert_eq!(stats.channel(0).total_classified(), 2);
        assert_eq!(stats.channel(0).incoming_requests, 2);
    }
}
