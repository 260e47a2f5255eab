//! Row-buffer management policies: decide whether to speculatively
//! precharge an open bank when the scheduler has nothing ready to issue.
//!
//! Consulted only on an otherwise-idle cycle (§4.7 step 6): the
//! [`crate::controller::Controller`] asks for a *victim* [`crate::command::Command`],
//! and issues it if [`crate::node::HierarchyNode::check`] allows.

use crate::command::Command;
use crate::node::HierarchyNode;
use crate::queue::RequestQueue;
use crate::request::AddrVec;
use crate::row_table::RowTable;
use crate::spec::DeviceSpec;

/// Chooses a speculative `PRE` victim, or declines.
pub trait RowPolicy: std::fmt::Debug {
    /// Returns an address vector identifying a bank to precharge this idle
    /// cycle, or `None` to leave every open bank alone.
    fn get_victim(
        &self,
        spec: &DeviceSpec,
        tree: &HierarchyNode,
        table: &RowTable,
        queue: &RequestQueue,
        clk: u64,
    ) -> Option<AddrVec>;
}

/// `true` iff some queued request's decoded bank path matches `addr`'s bank
/// path — i.e. a pending request would be a hit on the row this policy is
/// considering precharging.
fn has_pending_hit(queue: &RequestQueue, addr: &AddrVec) -> bool {
    let target = bank_path(addr);
    queue.iter().any(|req| bank_path(&req.addr_vec) == target)
}

fn bank_path(addr: &AddrVec) -> AddrVec {
    let mut path = *addr;
    path[crate::level::Level::Row.index()] = 0;
    path[crate::level::Level::Column.index()] = 0;
    path
}

/// Every bank the row-buffer table currently reports open, as an address
/// vector suitable for `HierarchyNode::check(Pre, ..)`.
fn open_banks(tree: &HierarchyNode, spec: &DeviceSpec) -> Vec<AddrVec> {
    let mut out = Vec::new();
    collect_open(tree, spec, &mut [0; crate::level::LEVEL_COUNT], &mut out);
    out
}

fn collect_open(node: &HierarchyNode, spec: &DeviceSpec, path: &mut AddrVec, out: &mut Vec<AddrVec>) {
    if node.level() == spec.row_buffer_level {
        if node.is_open() {
            out.push(*path);
        }
        return;
    }
    let Some(child_level) = node.level().child() else { return };
    for (idx, child) in node.children().iter().enumerate() {
        path[child_level.index()] = idx as i32;
        collect_open(child, spec, path, out);
    }
}

/// Closed-row policy: eagerly precharge any open bank that no queued
/// request is about to hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Closed;

impl RowPolicy for Closed {
    fn get_victim(
        &self,
        spec: &DeviceSpec,
        tree: &HierarchyNode,
        _table: &RowTable,
        queue: &RequestQueue,
        _clk: u64,
    ) -> Option<AddrVec> {
        open_banks(tree, spec).into_iter().find(|addr| !has_pending_hit(queue, addr))
    }
}

/// Open-row policy: never speculatively close a bank; rely entirely on
/// demand-driven precharge when a conflicting request arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Open;

impl RowPolicy for Open {
    fn get_victim(
        &self,
        _spec: &DeviceSpec,
        _tree: &HierarchyNode,
        _table: &RowTable,
        _queue: &RequestQueue,
        _clk: u64,
    ) -> Option<AddrVec> {
        None
    }
}

/// Timeout policy: precharge a bank that has sat open for at least `timeout`
/// cycles with no queued request hitting it.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    timeout: u64,
}

impl Timeout {
    /// Creates a timeout-based row policy: a bank open for `timeout` cycles
    /// or more with no pending hit becomes a precharge victim.
    #[must_use]
    pub fn new(timeout: u64) -> Self {
        Self { timeout }
    }
}

impl RowPolicy for Timeout {
    fn get_victim(
        &self,
        spec: &DeviceSpec,
        tree: &HierarchyNode,
        table: &RowTable,
        queue: &RequestQueue,
        clk: u64,
    ) -> Option<AddrVec> {
        open_banks(tree, spec).into_iter().find(|addr| {
            let since = table.open_since(spec, addr).unwrap_or(clk);
            clk >= since + self.timeout && !has_pending_hit(queue, addr)
        })
    }
}

/// The `PRE` command used to precharge a victim bank returned by any
/// [`RowPolicy`] — a single constant since every policy names the same
/// command, only the target bank differs.
pub const VICTIM_COMMAND: Command = Command::Pre;
