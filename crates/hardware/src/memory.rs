//! Address mapping and channel multiplexing.
//!
//! `Memory` is the only component that knows how a linear address splits
//! into a hierarchy path; every [`Controller`] downstream only ever sees
//! an already-decoded [`crate::request::AddrVec`].

use std::sync::Arc;

use crate::common::Result;
use crate::controller::Controller;
use crate::level::{Level, ALL_LEVELS};
use crate::request::{AddrVec, Request, RequestType};
use crate::row_policy::{Closed, Open, RowPolicy, Timeout};
use crate::scheduler::{Fcfs, FrFcfs, FrFcfsCap, FrFcfsPriorHit, Scheduler};
use crate::spec::DeviceSpec;
use crate::stats::StatsRegistry;
use crate::trace::CommandTraceSink;

/// Which bits of a linear address map to which hierarchy level, and in
/// what order (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMapping {
    /// Channel, Rank, (BankGroup), Bank, Row, Column — consumed top-down,
    /// least-significant-first.
    ChRaBaRoCo,
    /// Channel lowest, Column highest, the remaining levels filled
    /// low-to-high up through Row.
    RoBaRaCoCh,
}

/// Scheduler policy names accepted from configuration (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPolicy {
    /// First-come-first-served.
    Fcfs,
    /// First-ready, first-come-first-served.
    FrFcfs,
    /// FR-FCFS capped at `K` consecutive column accesses per open row.
    FrFcfsCap(u32),
    /// FR-FCFS where any ready hit strictly beats any non-ready request.
    FrFcfsPriorHit,
}

impl SchedulerPolicy {
    fn build(self) -> Box<dyn Scheduler + Send> {
        match self {
            SchedulerPolicy::Fcfs => Box::new(Fcfs),
            SchedulerPolicy::FrFcfs => Box::new(FrFcfs),
            SchedulerPolicy::FrFcfsCap(k) => Box::new(FrFcfsCap::new(k)),
            SchedulerPolicy::FrFcfsPriorHit => Box::new(FrFcfsPriorHit),
        }
    }
}

/// Row-buffer policy names accepted from configuration (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicyKind {
    /// Eagerly precharge idle open banks with no pending hit.
    Closed,
    /// Never speculatively precharge.
    Open,
    /// Precharge a bank idle for at least this many cycles with no pending hit.
    Timeout(u64),
}

impl RowPolicyKind {
    fn build(self) -> Box<dyn RowPolicy + Send> {
        match self {
            RowPolicyKind::Closed => Box::new(Closed),
            RowPolicyKind::Open => Box::new(Open),
            RowPolicyKind::Timeout(t) => Box::new(Timeout::new(t)),
        }
    }
}

/// Multiplexes many per-channel [`Controller`]s behind one linear address
/// space; owns the shared [`DeviceSpec`] and the number of "tx bits" a
/// single burst consumes.
#[derive(Debug)]
pub struct Memory {
    spec: Arc<DeviceSpec>,
    mapping: AddressMapping,
    tx_bits: u32,
    controllers: Vec<Controller>,
}

impl Memory {
    /// Builds channel controllers from `spec` and the given scheduling
    /// policy, row policy, queue capacity, and address mapping.
    ///
    /// `cmd_trace` supplies one [`CommandTraceSink`] per channel (index =
    /// channel id), or `None` if command-trace output is disabled.
    #[must_use]
    pub fn new(
        spec: Arc<DeviceSpec>,
        mapping: AddressMapping,
        queue_capacity: usize,
        scheduler_policy: SchedulerPolicy,
        row_policy: RowPolicyKind,
        mut cmd_trace: Option<Vec<CommandTraceSink>>,
    ) -> Self {
        let tx_bits = ((spec.prefetch_size * spec.channel_width_bits / 8) as f64).log2().round() as u32;

        let controllers = (0..spec.org.channels)
            .map(|_| {
                let sink = cmd_trace.as_mut().map(|v| v.remove(0));
                Controller::new(
                    Arc::clone(&spec),
                    queue_capacity,
                    scheduler_policy.build(),
                    row_policy.build(),
                    sink,
                )
            })
            .collect();

        Self { spec, mapping, tx_bits, controllers }
    }

    /// Translates a linear byte address into a hierarchy [`AddrVec`] per
    /// the configured [`AddressMapping`] (§4.8), clearing the low
    /// `tx_bits` first so every address within one burst maps identically.
    #[must_use]
    pub fn decode_address(&self, addr: u64) -> AddrVec {
        let cleared = (addr >> self.tx_bits) << self.tx_bits;
        let mut remaining = cleared >> self.tx_bits;
        let mut out: AddrVec = [0; crate::level::LEVEL_COUNT];

        match self.mapping {
            AddressMapping::ChRaBaRoCo => {
                for level in ALL_LEVELS.iter().rev() {
                    let count = u64::from(self.spec.org.count(*level).max(1));
                    out[level.index()] = (remaining % count) as i32;
                    remaining /= count;
                }
            }
            AddressMapping::RoBaRaCoCh => {
                let channel_count = u64::from(self.spec.org.channels.max(1));
                out[Level::Channel.index()] = (remaining % channel_count) as i32;
                remaining /= channel_count;

                let column_count = u64::from(self.spec.org.columns.max(1));
                out[Level::Column.index()] = (remaining % column_count) as i32;
                remaining /= column_count;

                for level in [Level::Rank, Level::BankGroup, Level::Bank, Level::Subarray, Level::Row] {
                    let count = u64::from(self.spec.org.count(level).max(1));
                    out[level.index()] = (remaining % count) as i32;
                    remaining /= count;
                }
            }
        }
        out
    }

    /// Routes `req` to its owning channel's controller and attempts to
    /// enqueue it, recording the attempt in `stats` and returning whether
    /// admission succeeded (queue-full is ordinary backpressure, §7).
    pub fn send(&mut self, mut req: Request, stats: &mut StatsRegistry) -> bool {
        req.addr_vec = self.decode_address(req.addr);
        let channel = req.addr_vec[Level::Channel.index()] as usize;
        self.controllers[channel].enqueue(req, stats.channel_mut(channel))
    }

    /// Advances every channel's controller by one cycle, in channel-index
    /// order (deterministic, no cross-channel semantic effect — each
    /// channel owns a disjoint subtree, §5).
    pub fn tick(&mut self, stats: &mut StatsRegistry) -> Result<()> {
        stats.advance_cycle();
        for (idx, ctrl) in self.controllers.iter_mut().enumerate() {
            ctrl.tick(stats.channel_mut(idx))?;
        }
        Ok(())
    }

    /// Sum of every channel's queue depths and in-flight `pending` requests.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.controllers.iter().map(Controller::pending_requests).sum()
    }

    /// Number of channels this memory multiplexes.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.controllers.len()
    }

    /// The shared device specification.
    #[must_use]
    pub fn spec(&self) -> &Arc<DeviceSpec> {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_channels_and_ranks_required() {
        let err = DeviceSpec::build("ddr3", "1Gb_x8", "1600K", Some(3), None).unwrap_err();
        assert!(matches!(err, crate::common::Error::NonPowerOfTwo { .. }));
    }

    #[test]
    fn decode_address_clears_burst_bits() {
        let spec = Arc::new(DeviceSpec::build("ddr3", "1Gb_x8", "1600K", None, None).unwrap());
        let mem = Memory::new(spec, AddressMapping::ChRaBaRoCo, 16, SchedulerPolicy::FrFcfs, RowPolicyKind::Closed, None);
        let a = mem.decode_address(0x1000);
        let b = mem.decode_address(0x1001);
        assert_eq!(a, b, "addresses within one burst must decode identically");
    }
}
