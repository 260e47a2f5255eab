//! Refresh request generation.
//!
//! Paces itself against `tREFI` and hands the controller fully-formed
//! [`Request`]s to push into `otherq`; it does not touch `HierarchyNode`
//! state directly — refresh requests flow through the same
//! `check`/`decode`/`update` path as any other request; see
//! [`crate::spec::DeviceSpec::translate`].

use crate::level::Level;
use crate::request::{AddrVec, Request, RequestType};
use crate::spec::{DeviceSpec, RefreshGranularity};

/// Per-rank (or per-subarray, for [`RefreshGranularity::PerSubarray`])
/// refresh request generator.
///
/// One instance per channel, owned by its [`crate::controller::Controller`];
/// tracks, per rank, the next cycle a refresh is due and (for per-subarray
/// interleaving) which subarray is due next.
#[derive(Debug, Clone)]
pub struct Refresh {
    ranks: u32,
    subarrays: u32,
    t_refi: u64,
    granularity: RefreshGranularity,
    /// Next cycle each rank is due for refresh, indexed by rank.
    next_due: Vec<u64>,
    /// Next subarray to refresh for each rank, indexed by rank (only
    /// advances under [`RefreshGranularity::PerSubarray`]).
    next_subarray: Vec<u32>,
}

impl Refresh {
    /// Creates a refresh generator for a channel with `spec.org.ranks` ranks,
    /// each due for its first refresh at `spec.speed.t_refi`.
    #[must_use]
    pub fn new(spec: &DeviceSpec) -> Self {
        let ranks = spec.org.ranks;
        Self {
            ranks,
            subarrays: spec.org.subarrays,
            t_refi: spec.speed.t_refi,
            granularity: spec.refresh_granularity,
            next_due: vec![spec.speed.t_refi; ranks as usize],
            next_subarray: vec![0; ranks as usize],
        }
    }

    /// Advances refresh for this cycle: for every rank whose `tREFI` has
    /// elapsed, returns a freshly-stamped refresh [`Request`] to enqueue
    /// into `otherq`, and reschedules that rank's next refresh.
    ///
    /// At most one refresh request is generated per rank per cycle; with a
    /// sane `tREFI` (always far larger than 1 cycle) this never produces
    /// more than `ranks` requests in a single call.
    pub fn tick(&mut self, clk: u64) -> Vec<Request> {
        let mut due = Vec::new();
        for rank in 0..self.ranks {
            let idx = rank as usize;
            if clk < self.next_due[idx] {
                continue;
            }
            self.next_due[idx] += self.t_refi;

            let mut addr_vec: AddrVec = [0; crate::level::LEVEL_COUNT];
            addr_vec[Level::Rank.index()] = rank as i32;
            if self.granularity == RefreshGranularity::PerSubarray {
                addr_vec[Level::Subarray.index()] = self.next_subarray[idx] as i32;
                self.next_subarray[idx] = (self.next_subarray[idx] + 1) % self.subarrays.max(1);
            }

            let mut req = Request::new(0, RequestType::Refresh, -1);
            req.addr_vec = addr_vec;
            due.push(req);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_trefi() {
        let spec = DeviceSpec::build("ddr3", "1Gb_x8", "1600K", None, None).unwrap();
        let mut refresh = Refresh::new(&spec);
        for clk in 0..spec.speed.t_refi {
            assert!(refresh.tick(clk).is_empty());
        }
        let due = refresh.tick(spec.speed.t_refi);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].req_type, RequestType::Refresh);
    }
}
