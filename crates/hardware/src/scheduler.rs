//! Request schedulers: pick one ready request out of a queue each cycle.
//!
//! Every policy answers the same question — "which queued request, if any,
//! should [`crate::controller::Controller::tick`] try to advance this
//! cycle?" — over the same inputs (the queue, the hierarchy tree, the
//! spec, and the current cycle), so they share one trait rather than one
//! type per policy (the data-driven approach described in the design
//! notes, applied to scheduling as well as timing).

use std::collections::HashMap;

use crate::command::Command;
use crate::node::HierarchyNode;
use crate::queue::RequestQueue;
use crate::request::{AddrVec, Request};
use crate::spec::DeviceSpec;

/// `true` iff `req`'s next sub-command is its terminal column access and
/// that command is legal to issue this cycle — i.e. it is a row hit (or an
/// already-open row on this standard's row-buffer level) ready for `RD`/`WR`.
fn is_ready(spec: &DeviceSpec, tree: &HierarchyNode, req: &Request, clk: u64) -> bool {
    let terminal = spec.translate(req.req_type);
    let decoded = tree.decode(spec, terminal, &req.addr_vec);
    decoded == terminal && tree.check(spec, decoded, &req.addr_vec, clk)
}

/// Bank+row path a request addresses, used by [`FrFcfsCap`] to count
/// consecutive accesses served by the same open row (column index masked
/// off — only the row identity matters for the streak count).
fn bank_key(addr: &AddrVec) -> AddrVec {
    let mut key = *addr;
    key[crate::level::Level::Column.index()] = 0;
    key
}

/// Picks the best ready request in a queue, or `None` if none should be
/// serviced this cycle.
pub trait Scheduler: std::fmt::Debug {
    /// Returns the index (into `queue`, oldest = 0) of the request to issue
    /// against next, if any.
    fn select(
        &mut self,
        spec: &DeviceSpec,
        tree: &HierarchyNode,
        queue: &RequestQueue,
        clk: u64,
    ) -> Option<usize>;

    /// Called by the controller right after a request's terminal command
    /// issues, so policies that track per-row state (e.g. [`FrFcfsCap`]) can
    /// update it. Default no-op.
    fn on_issue(&mut self, _req: &Request, _is_terminal: bool) {}
}

/// First-come-first-served: always the head of the queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl Scheduler for Fcfs {
    fn select(&mut self, _spec: &DeviceSpec, _tree: &HierarchyNode, queue: &RequestQueue, _clk: u64) -> Option<usize> {
        if queue.is_empty() { None } else { Some(0) }
    }
}

/// First-ready, first-come-first-served: prefer the oldest request whose
/// next command is a ready column access; otherwise the oldest request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrFcfs;

impl Scheduler for FrFcfs {
    fn select(&mut self, spec: &DeviceSpec, tree: &HierarchyNode, queue: &RequestQueue, clk: u64) -> Option<usize> {
        if queue.is_empty() {
            return None;
        }
        let ready = queue.iter().position(|req| is_ready(spec, tree, req, clk));
        Some(ready.unwrap_or(0))
    }
}

/// FR-FCFS with a cap: a given open row may serve at most `cap` consecutive
/// ready column accesses before falling back to plain FCFS, bounding
/// row-hit starvation of other banks.
#[derive(Debug, Clone)]
pub struct FrFcfsCap {
    cap: u32,
    /// Consecutive ready column accesses served for the currently
    /// "streaking" bank, keyed by bank path.
    streak: HashMap<AddrVec, u32>,
    last_bank: Option<AddrVec>,
}

impl FrFcfsCap {
    /// Creates a capped FR-FCFS scheduler allowing at most `cap` consecutive
    /// column accesses to the same open row.
    #[must_use]
    pub fn new(cap: u32) -> Self {
        Self { cap, streak: HashMap::new(), last_bank: None }
    }
}

impl Scheduler for FrFcfsCap {
    fn select(&mut self, spec: &DeviceSpec, tree: &HierarchyNode, queue: &RequestQueue, clk: u64) -> Option<usize> {
        if queue.is_empty() {
            return None;
        }
        let ready = queue.iter().enumerate().find(|(_, req)| {
            if !is_ready(spec, tree, req, clk) {
                return false;
            }
            let key = bank_key(&req.addr_vec);
            *self.streak.get(&key).unwrap_or(&0) < self.cap
        });
        Some(ready.map_or(0, |(idx, _)| idx))
    }

    fn on_issue(&mut self, req: &Request, is_terminal: bool) {
        if !is_terminal {
            return;
        }
        let key = bank_key(&req.addr_vec);
        if self.last_bank == Some(key) {
            *self.streak.entry(key).or_insert(0) += 1;
        } else {
            self.streak.clear();
            self.streak.insert(key, 1);
            self.last_bank = Some(key);
        }
    }
}

/// FR-FCFS-PriorHit: a ready column access always beats any non-ready
/// request, even an older one; among ready requests, oldest wins (same as
/// plain [`FrFcfs`]), and likewise among non-ready requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrFcfsPriorHit;

impl Scheduler for FrFcfsPriorHit {
    fn select(&mut self, spec: &DeviceSpec, tree: &HierarchyNode, queue: &RequestQueue, clk: u64) -> Option<usize> {
        if queue.is_empty() {
            return None;
        }
        if let Some(idx) = queue.iter().position(|req| is_ready(spec, tree, req, clk)) {
            return Some(idx);
        }
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestType;
    use crate::spec::DeviceSpec;

    fn spec() -> DeviceSpec {
        DeviceSpec::build("ddr3", "1Gb_x8", "1600K", None, None).unwrap()
    }

    #[test]
    fn fcfs_always_picks_head() {
        let spec = spec();
        let tree = HierarchyNode::new_tree(&spec);
        let mut q = RequestQueue::new(4);
        q.push(Request::new(0, RequestType::Read, 0));
        q.push(Request::new(1, RequestType::Read, 0));
        let mut sched = Fcfs;
        assert_eq!(sched.select(&spec, &tree, &q, 0), Some(0));
    }

    #[test]
    fn frfcfs_prefers_ready_hit_over_older_miss() {
        let spec = spec();
        let mut tree = HierarchyNode::new_tree(&spec);
        let mut q = RequestQueue::new(4);

        let mut older = Request::new(0x1000, RequestType::Read, 0);
        older.addr_vec = [0, 0, 0, 1, 0, 5, 0];
        q.push(older);

        let mut newer = Request::new(0x2000, RequestType::Read, 0);
        newer.addr_vec = [0, 0, 0, 0, 0, 3, 0];
        q.push(newer);

        tree.update(&spec, Command::Act, &[0, 0, 0, 0, 0, 3, 0], 0);

        let mut sched = FrFcfs;
        let clk = spec.speed.t_rcd + 1;
        assert_eq!(sched.select(&spec, &tree, &q, clk), Some(1));
    }
}
