//! The DRAM hierarchy node tree: one concrete type, entirely governed by
//! the tables carried in a [`crate::spec::DeviceSpec`] value.
//!
//! A node is materialized for every level from `Channel` down to the
//! row-buffer-owning level (`Bank`, or `Subarray` for SALP/DSARP-style
//! standards); `Row` and `Column` are never materialized as nodes; a row
//! number is just an `i32` compared against the owning node's `open_row`.
//! This mirrors how row state is tracked in practice: there is no
//! meaningful per-row state below "is this the currently open row".

use std::collections::{HashMap, VecDeque};

use crate::command::{Command, State};
use crate::level::Level;
use crate::request::AddrVec;
use crate::spec::DeviceSpec;

/// Outcome of resolving whether a command is directly issuable at a leaf's
/// current state, or needs a precursor command first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    /// `cmd` may be issued as-is.
    Issue(Command),
    /// `cmd` cannot be issued yet; issue this command first.
    Precursor(Command),
    /// `cmd` has no modeled precursor in this state; `check` will reject it.
    Blocked,
}

/// One node of the DRAM hierarchy tree.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    level: Level,
    state: State,
    /// Valid only when `level` is the spec's row-buffer level and `state == Opened`.
    open_row: Option<i32>,
    /// Cycle the currently open row was activated, for `RowPolicy::Timeout`.
    open_since: u64,
    /// Earliest legal cycle for each command at this node (monotone non-decreasing).
    next: HashMap<Command, u64>,
    /// Ring buffers of recent issue cycles, for windowed rules like tFAW, keyed
    /// by the rule's `from` command.
    prev: HashMap<Command, VecDeque<u64>>,
    children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Builds a fresh hierarchy tree rooted at `Channel`, shaped by `spec.org`
    /// down to `spec.row_buffer_level`.
    #[must_use]
    pub fn new_tree(spec: &DeviceSpec) -> Self {
        Self::new_level(spec, Level::Channel)
    }

    fn new_level(spec: &DeviceSpec, level: Level) -> Self {
        let children = if level == spec.row_buffer_level {
            Vec::new()
        } else {
            let Some(child_level) = level.child() else {
                unreachable!("row_buffer_level must be reached before the leaf level")
            };
            let count = spec.org.count(child_level);
            (0..count).map(|_| Self::new_level(spec, child_level)).collect()
        };
        Self {
            level,
            state: initial_state(level),
            open_row: None,
            open_since: 0,
            next: HashMap::new(),
            prev: HashMap::new(),
            children,
        }
    }

    /// `true` iff `cmd` may legally be issued against `addr` this cycle:
    /// every earliest-legal-cycle counter and windowed rule along the
    /// addressed path is satisfied, and the gating level's state permits it.
    #[must_use]
    pub fn check(&self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec, clk: u64) -> bool {
        let mut node = self;
        loop {
            if clk < node.next_cycle(cmd) {
                return false;
            }
            if !node.windowed_ok(spec, cmd, clk) {
                return false;
            }

            if node.level == Level::Rank && rank_scoped(cmd) {
                return matches!(rank_decode(node.state, cmd), Decode::Issue(c) if c == cmd);
            }

            if node.level == spec.row_buffer_level {
                if bank_scoped(cmd) {
                    let requested_row = addr[Level::Row.index()];
                    return matches!(
                        bank_decode(node.state, node.open_row, requested_row, cmd),
                        Decode::Issue(c) if c == cmd
                    );
                }
                return true;
            }

            let Some(child_level) = node.level.child() else {
                unreachable!("row-buffer level reached before the leaf level")
            };
            let idx = addr[child_level.index()] as usize;
            node = &node.children[idx];
        }
    }

    /// Returns `cmd` if the row-buffer leaf's current state permits it as-is;
    /// otherwise returns the precursor command the precondition table
    /// prescribes (e.g. `ACT` while `Closed`, `PRE` while `Opened` on a
    /// different row). Commands that never have a precursor in this model
    /// (refresh and power-state commands) are returned unchanged.
    #[must_use]
    pub fn decode(&self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec) -> Command {
        if !bank_scoped(cmd) {
            return cmd;
        }
        let node = self.node_at(spec.row_buffer_level, addr);
        let requested_row = addr[Level::Row.index()];
        match bank_decode(node.state, node.open_row, requested_row, cmd) {
            Decode::Issue(c) | Decode::Precursor(c) => c,
            Decode::Blocked => cmd,
        }
    }

    /// Applies `cmd`'s effect (state transition) and every timing rule whose
    /// `from` matches `cmd`, bumping `next`/`prev` at each rule's scope node.
    pub fn update(&mut self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec, clk: u64) {
        self.apply_effect(spec, cmd, addr, clk);
        for rule in &spec.timing_rules {
            if rule.from != cmd {
                continue;
            }
            let node = self.node_at_mut(rule.scope, addr);
            if rule.distance <= 1 {
                let existing = *node.next.get(&rule.to).unwrap_or(&0);
                node.next.insert(rule.to, existing.max(clk + rule.gap));
            } else {
                let deque = node.prev.entry(rule.from).or_default();
                deque.push_back(clk);
                while deque.len() > rule.distance as usize {
                    deque.pop_front();
                }
            }
        }
    }

    /// `true` iff the row-buffer leaf addressed by `addr` is open on exactly
    /// the requested row.
    #[must_use]
    pub fn check_row_hit(&self, spec: &DeviceSpec, addr: &AddrVec) -> bool {
        let node = self.node_at(spec.row_buffer_level, addr);
        node.state == State::Opened && node.open_row == Some(addr[Level::Row.index()])
    }

    /// `true` iff the row-buffer leaf addressed by `addr` has any row open
    /// (regardless of which one).
    #[must_use]
    pub fn check_row_open(&self, spec: &DeviceSpec, addr: &AddrVec) -> bool {
        self.node_at(spec.row_buffer_level, addr).state == State::Opened
    }

    /// Cycle the row-buffer leaf addressed by `addr` last activated a row.
    #[must_use]
    pub fn open_since(&self, spec: &DeviceSpec, addr: &AddrVec) -> u64 {
        self.node_at(spec.row_buffer_level, addr).open_since
    }

    /// This node's hierarchy level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// `true` iff this node (expected to be a row-buffer-level node) has a
    /// row open. Used by [`crate::row_policy`] to enumerate victims.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == State::Opened
    }

    /// This node's children, root-to-leaf order matching the address vector
    /// index at the child level.
    #[must_use]
    pub fn children(&self) -> &[HierarchyNode] {
        &self.children
    }

    fn apply_effect(&mut self, spec: &DeviceSpec, cmd: Command, addr: &AddrVec, clk: u64) {
        match cmd {
            Command::Act => {
                let node = self.node_at_mut(spec.row_buffer_level, addr);
                node.state = State::Opened;
                node.open_row = Some(addr[Level::Row.index()]);
                node.open_since = clk;
            }
            Command::Pre | Command::Rda | Command::Wra | Command::RefSb => {
                let node = self.node_at_mut(spec.row_buffer_level, addr);
                node.state = State::Closed;
                node.open_row = None;
            }
            Command::PreA | Command::Ref => {
                self.node_at_mut(Level::Rank, addr).close_all_row_buffers(spec);
            }
            Command::Pde => {
                let has_open = self.node_at(Level::Rank, addr).any_row_open(spec);
                self.node_at_mut(Level::Rank, addr).state = if has_open {
                    State::ActPowerDown
                } else {
                    State::PrePowerDown
                };
            }
            Command::Pdx | Command::Srx => {
                self.node_at_mut(Level::Rank, addr).state = State::PowerUp;
            }
            Command::Sre => {
                self.node_at_mut(Level::Rank, addr).state = State::SelfRefresh;
            }
            Command::Rd | Command::Wr => {}
        }
    }

    fn close_all_row_buffers(&mut self, spec: &DeviceSpec) {
        if self.level == spec.row_buffer_level {
            self.state = State::Closed;
            self.open_row = None;
            return;
        }
        for child in &mut self.children {
            child.close_all_row_buffers(spec);
        }
    }

    fn any_row_open(&self, spec: &DeviceSpec) -> bool {
        if self.level == spec.row_buffer_level {
            return self.state == State::Opened;
        }
        self.children.iter().any(|c| c.any_row_open(spec))
    }

    fn node_at(&self, target: Level, addr: &AddrVec) -> &HierarchyNode {
        let mut node = self;
        while node.level != target {
            let Some(child_level) = node.level.child() else {
                unreachable!("target level not reached before the leaf level")
            };
            let idx = addr[child_level.index()] as usize;
            node = &node.children[idx];
        }
        node
    }

    fn node_at_mut(&mut self, target: Level, addr: &AddrVec) -> &mut HierarchyNode {
        let mut node = self;
        while node.level != target {
            let Some(child_level) = node.level.child() else {
                unreachable!("target level not reached before the leaf level")
            };
            let idx = addr[child_level.index()] as usize;
            node = &mut node.children[idx];
        }
        node
    }

    fn next_cycle(&self, cmd: Command) -> u64 {
        *self.next.get(&cmd).unwrap_or(&0)
    }

    fn windowed_ok(&self, spec: &DeviceSpec, cmd: Command, clk: u64) -> bool {
        for rule in &spec.timing_rules {
            if rule.scope != self.level || rule.to != cmd || rule.distance <= 1 {
                continue;
            }
            if let Some(deque) = self.prev.get(&rule.from) {
                if deque.len() >= rule.distance as usize {
                    if let Some(&oldest) = deque.front() {
                        if clk < oldest + rule.gap {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

fn initial_state(level: Level) -> State {
    if level == Level::Rank {
        State::PowerUp
    } else {
        State::Closed
    }
}

const fn bank_scoped(cmd: Command) -> bool {
    matches!(
        cmd,
        Command::Act | Command::Pre | Command::Rd | Command::Wr | Command::Rda | Command::Wra
    )
}

const fn rank_scoped(cmd: Command) -> bool {
    matches!(
        cmd,
        Command::PreA | Command::Ref | Command::Pde | Command::Pdx | Command::Sre | Command::Srx
    )
}

fn bank_decode(state: State, open_row: Option<i32>, requested_row: i32, cmd: Command) -> Decode {
    match cmd {
        Command::Act => match state {
            State::Closed => Decode::Issue(Command::Act),
            _ if open_row == Some(requested_row) => Decode::Issue(Command::Act),
            _ => Decode::Precursor(Command::Pre),
        },
        Command::Pre => match state {
            State::Opened => Decode::Issue(Command::Pre),
            _ => Decode::Blocked,
        },
        Command::Rd | Command::Wr | Command::Rda | Command::Wra => match state {
            State::Closed => Decode::Precursor(Command::Act),
            _ if open_row == Some(requested_row) => Decode::Issue(cmd),
            _ => Decode::Precursor(Command::Pre),
        },
        _ => Decode::Issue(cmd),
    }
}

fn rank_decode(state: State, cmd: Command) -> Decode {
    match cmd {
        Command::Sre => match state {
            State::PowerUp | State::PrePowerDown => Decode::Issue(Command::Sre),
            _ => Decode::Blocked,
        },
        Command::Srx => match state {
            State::SelfRefresh => Decode::Issue(Command::Srx),
            _ => Decode::Blocked,
        },
        Command::Pde => match state {
            State::PowerUp => Decode::Issue(Command::Pde),
            _ => Decode::Blocked,
        },
        Command::Pdx => match state {
            State::ActPowerDown | State::PrePowerDown => Decode::Issue(Command::Pdx),
            _ => Decode::Blocked,
        },
        Command::PreA | Command::Ref => match state {
            State::PowerUp => Decode::Issue(cmd),
            _ => Decode::Blocked,
        },
        _ => Decode::Issue(cmd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DeviceSpec;

    fn addr_for_bank(bank: i32) -> AddrVec {
        let mut addr = [0; crate::level::LEVEL_COUNT];
        addr[Level::Bank.index()] = bank;
        addr
    }

    /// Four `ACT`s to four banks in the same rank, each as soon as `tRRD`
    /// allows; the fifth may not issue before `first_ACT + tFAW`, even
    /// though `tRRD` alone would have allowed it much sooner (§8 scenario 6).
    #[test]
    fn tfaw_bounds_the_fifth_activation_in_a_rank() {
        let spec = DeviceSpec::build("lpddr3", "4Gb_x16", "1600", None, None).unwrap();
        let mut tree = HierarchyNode::new_tree(&spec);

        let mut clk = 1;
        let mut first_act = None;
        for bank in 0..4 {
            let addr = addr_for_bank(bank);
            while !tree.check(&spec, Command::Act, &addr, clk) {
                clk += 1;
            }
            first_act.get_or_insert(clk);
            tree.update(&spec, Command::Act, &addr, clk);
        }
        let first_act = first_act.unwrap_or_else(|| unreachable!("loop ran at least once"));

        let fifth_addr = addr_for_bank(4);
        assert!(!tree.check(&spec, Command::Act, &fifth_addr, first_act + spec.speed.t_faw - 1));
        assert!(tree.check(&spec, Command::Act, &fifth_addr, first_act + spec.speed.t_faw));
    }
}
