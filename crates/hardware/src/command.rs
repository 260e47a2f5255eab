//! DRAM command set and hierarchy node state.

/// A DRAM command, as issued by a [`crate::controller::Controller`] against
/// the [`crate::node::HierarchyNode`] tree.
///
/// The full set is carried by every [`crate::spec::DeviceSpec`] even when a
/// given standard never issues some of them (e.g. `Refsb` is only used by
/// the per-subarray refresh granularity); this keeps `Command` one type
/// shared by all standards, per the data-driven redesign in the design
/// notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Activate: open a row into the row buffer.
    Act,
    /// Precharge one bank (or subarray, for SALP/DSARP).
    Pre,
    /// Precharge all banks in a rank.
    PreA,
    /// Column read from the currently open row.
    Rd,
    /// Column read with automatic precharge afterward.
    Rda,
    /// Column write to the currently open row.
    Wr,
    /// Column write with automatic precharge afterward.
    Wra,
    /// Refresh all banks in a rank.
    Ref,
    /// Refresh a single subarray (fine-grained refresh).
    RefSb,
    /// Enter active power-down.
    Pde,
    /// Exit active power-down.
    Pdx,
    /// Enter self-refresh.
    Sre,
    /// Exit self-refresh.
    Srx,
}

impl Command {
    /// Returns the command's name as it appears in command-trace output (§6).
    #[must_use]
    pub const fn trace_name(self) -> &'static str {
        match self {
            Command::Act => "ACT",
            Command::Pre => "PRE",
            Command::PreA => "PREA",
            Command::Rd => "RD",
            Command::Rda => "RDA",
            Command::Wr => "WR",
            Command::Wra => "WRA",
            Command::Ref => "REF",
            Command::RefSb => "REFSB",
            Command::Pde => "PDE",
            Command::Pdx => "PDX",
            Command::Sre => "SRE",
            Command::Srx => "SRX",
        }
    }

    /// Bank-field is omitted in the command trace for these commands (§6):
    /// they address a whole rank, not one bank.
    #[must_use]
    pub const fn omits_bank_field(self) -> bool {
        matches!(self, Command::PreA | Command::Ref)
    }
}

/// Finite state of one [`crate::node::HierarchyNode`].
///
/// The meaning of a state depends on the node's level: `Opened`/`Closed`
/// describe the row-buffer-owning level (Bank, or Subarray for SALP/DSARP);
/// the power states describe Rank-level nodes. All other levels stay in
/// `Closed` permanently and it is never inspected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No row open (row-buffer level) / default reset state (other levels).
    Closed,
    /// A row is open; see the owning node's `open_row`.
    Opened,
    /// Rank is powered up and not in any power-down/self-refresh state.
    PowerUp,
    /// Rank is in active power-down (a row may still be open).
    ActPowerDown,
    /// Rank is in precharge power-down (no row open anywhere in the rank).
    PrePowerDown,
    /// Rank is in self-refresh.
    SelfRefresh,
}
