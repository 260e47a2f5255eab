//! DRAM hierarchy levels.
//!
//! Every standard is described by the same six levels; a standard that
//! doesn't use a given level (e.g. DDR3 has no bank groups) simply sets its
//! count to one, so the level is present in the address vector but never
//! contributes addressing bits or independent state.

/// One level of the DRAM hierarchy, root (Channel) to leaf (Column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum Level {
    /// The memory channel; owns one [`crate::controller::Controller`].
    Channel = 0,
    /// A rank within a channel; shares the data bus with its sibling ranks.
    Rank = 1,
    /// Bank group, present on DDR4/GDDR5; disabled (count 1) elsewhere.
    BankGroup = 2,
    /// A bank; the usual row-buffer granularity.
    Bank = 3,
    /// Subarray, present on SALP/DSARP variants; disabled (count 1) elsewhere.
    Subarray = 4,
    /// A row within the row-buffer-owning level.
    Row = 5,
    /// A column within an open row.
    Column = 6,
}

/// Total number of levels in the fixed hierarchy, used to size address vectors.
pub const LEVEL_COUNT: usize = 7;

/// All levels in root-to-leaf order, for iteration.
pub const ALL_LEVELS: [Level; LEVEL_COUNT] = [
    Level::Channel,
    Level::Rank,
    Level::BankGroup,
    Level::Bank,
    Level::Subarray,
    Level::Row,
    Level::Column,
];

impl Level {
    /// Returns the level's index into a fixed-size address vector.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the level one step closer to the root, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Level> {
        match self {
            Level::Channel => None,
            Level::Rank => Some(Level::Channel),
            Level::BankGroup => Some(Level::Rank),
            Level::Bank => Some(Level::BankGroup),
            Level::Subarray => Some(Level::Bank),
            Level::Row => Some(Level::Subarray),
            Level::Column => Some(Level::Row),
        }
    }

    /// Returns the level one step closer to the leaf, if any.
    #[must_use]
    pub const fn child(self) -> Option<Level> {
        match self {
            Level::Channel => Some(Level::Rank),
            Level::Rank => Some(Level::BankGroup),
            Level::BankGroup => Some(Level::Bank),
            Level::Bank => Some(Level::Subarray),
            Level::Subarray => Some(Level::Row),
            Level::Row => Some(Level::Column),
            Level::Column => None,
        }
    }
}
