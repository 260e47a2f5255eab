//! Memory access requests.

use crate::level::LEVEL_COUNT;

/// The kind of access a [`Request`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// A load.
    Read,
    /// A store.
    Write,
    /// A refresh request, generated internally by [`crate::refresh::Refresh`].
    Refresh,
    /// Anything else routed through `otherq` (reserved for future command types).
    Other,
}

/// Address vector: one index per hierarchy [`crate::level::Level`], root to
/// leaf. Levels a standard doesn't use (count 1) always carry index 0.
pub type AddrVec = [i32; LEVEL_COUNT];

/// A single memory access request flowing through a [`crate::controller::Controller`].
///
/// Requests are value-copied into and out of queues; nothing is shared
/// between the copy living in a queue and any copy the caller still holds.
#[derive(Debug, Clone)]
pub struct Request {
    /// Linear byte address as presented by the caller.
    pub addr: u64,
    /// Decoded hierarchy path, filled in by [`crate::memory::Memory::send`].
    pub addr_vec: AddrVec,
    /// Read, write, refresh, or other.
    pub req_type: RequestType,
    /// Cycle the request was enqueued (stamped by `Controller::enqueue`).
    pub arrive: u64,
    /// Cycle the request is considered complete and safe to retire.
    pub depart: u64,
    /// Whether this request has not yet had its first command issued.
    ///
    /// Used once, at issue time, to classify the access as a row hit/miss/
    /// conflict without double-counting on every sub-command of a multi-
    /// command sequence (e.g. `PRE` then `ACT` then `RD`).
    pub is_first_command: bool,
    /// Core that generated this request (stats/trace-driver bookkeeping only;
    /// the timing core never branches on it).
    pub core_id: i32,
    /// Invoked once, when the request completes (read: on retire from
    /// `pending`; write: when its terminal command issues). `None` for
    /// internally-generated refresh requests.
    pub callback: Option<fn(&Request)>,
}

impl Request {
    /// Creates a new read or write request for `addr`, arriving this cycle.
    #[must_use]
    pub fn new(addr: u64, req_type: RequestType, core_id: i32) -> Self {
        Self {
            addr,
            addr_vec: [0; LEVEL_COUNT],
            req_type,
            arrive: 0,
            depart: 0,
            is_first_command: true,
            core_id,
            callback: None,
        }
    }

    /// Builder: attaches a completion callback.
    #[must_use]
    pub fn with_callback(mut self, callback: fn(&Request)) -> Self {
        self.callback = Some(callback);
        self
    }
}
