//! Row-open bookkeeping, duplicated from the hierarchy tree into a flat
//! table keyed by bank path.
//!
//! [`crate::node::HierarchyNode`] is the authority on timing legality and
//! row-hit/conflict classification (`check_row_hit`/`check_row_open`);
//! `RowTable` exists alongside it only to answer one question the tree
//! doesn't expose directly — *when* a bank's currently open row was
//! activated, keyed by bank path rather than a node reference, for
//! [`crate::row_policy::Timeout`]. It is kept in lockstep with the tree's
//! own open-row state by receiving the same `update` calls.

use std::collections::HashMap;

use crate::command::Command;
use crate::level::{Level, LEVEL_COUNT};
use crate::request::AddrVec;
use crate::spec::DeviceSpec;

type BankPath = [i32; LEVEL_COUNT];

fn bank_path(addr: &AddrVec) -> BankPath {
    let mut path = *addr;
    for level in [Level::Row, Level::Column] {
        path[level.index()] = 0;
    }
    path
}

/// Mirrors open-row state across every row-buffer-level node, keyed by bank
/// path rather than requiring a tree walk.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    open: HashMap<BankPath, (i32, u64)>,
}

impl RowTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { open: HashMap::new() }
    }

    /// Cycle the currently open row (if any) at `addr`'s bank/subarray was
    /// activated, for `RowPolicy::Timeout`.
    #[must_use]
    pub fn open_since(&self, spec: &DeviceSpec, addr: &AddrVec) -> Option<u64> {
        self.open.get(&bank_path(addr)).map(|&(_, since)| since)
    }

    /// Applies `cmd`'s effect on open-row bookkeeping, mirroring
    /// [`crate::node::HierarchyNode::update`].
    pub fn update(&mut self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec, clk: u64) {
        match cmd {
            Command::Act => {
                self.open.insert(bank_path(addr), (addr[Level::Row.index()], clk));
            }
            Command::Pre | Command::Rda | Command::Wra | Command::RefSb => {
                self.open.remove(&bank_path(addr));
            }
            Command::PreA | Command::Ref => {
                let prefix = rank_prefix(addr);
                self.open.retain(|path, _| rank_prefix(path) != prefix);
            }
            _ => {}
        }
    }
}

fn rank_prefix(path: &BankPath) -> (i32, i32) {
    (path[Level::Channel.index()], path[Level::Rank.index()])
}
