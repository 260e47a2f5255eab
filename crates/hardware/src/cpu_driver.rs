//! CPU-trace front-end collaborator (§6, §9 "Multi-core trace driving").
//!
//! Out of the core's timing budget — this module never touches a
//! [`crate::node::HierarchyNode`] or a [`crate::controller::Controller`]
//! directly, only [`Memory::send`]. One driver per core; `cores` of them
//! share one [`Memory`], which is all the multi-core support the core
//! itself needs to know about.

use std::collections::VecDeque;
use std::path::Path;

use crate::common::Result;
use crate::memory::Memory;
use crate::request::{Request, RequestType};
use crate::stats::StatsRegistry;
use crate::trace::{parse_cpu_line, TraceReader};

/// Drives one core's CPU-level trace: consumes `<bubble_count> <read_addr>
/// [<write_addr>]` lines and feeds [`Memory::send`] at the right cadence.
#[derive(Debug)]
pub struct CpuTraceDriver {
    core_id: i32,
    reader: TraceReader,
    early_exit: bool,
    bubbles_remaining: u64,
    outgoing: VecDeque<Request>,
    done: bool,
}

impl CpuTraceDriver {
    /// Opens `path` as this core's CPU trace.
    pub fn open(path: &Path, core_id: i32, early_exit: bool) -> Result<Self> {
        Ok(Self {
            core_id,
            reader: TraceReader::open(path)?,
            early_exit,
            bubbles_remaining: 0,
            outgoing: VecDeque::new(),
            done: false,
        })
    }

    /// Advances this core by one CPU-clock tick: retries a backpressured
    /// send, counts down a bubble, or consumes the next trace line.
    /// Returns `false` once the trace is exhausted and nothing is left to
    /// send.
    pub fn step(&mut self, memory: &mut Memory, stats: &mut StatsRegistry) -> Result<bool> {
        if let Some(req) = self.outgoing.front().cloned() {
            if memory.send(req, stats) {
                self.outgoing.pop_front();
            }
            return Ok(true);
        }

        if self.bubbles_remaining > 0 {
            self.bubbles_remaining -= 1;
            return Ok(true);
        }

        loop {
            let Some((line_no, text)) = self.reader.next_line()? else {
                self.done = true;
                return Ok(false);
            };
            let Some(parsed) = parse_cpu_line(line_no, &text, self.early_exit)? else {
                continue;
            };
            self.bubbles_remaining = parsed.bubble_count;
            self.outgoing.push_back(Request::new(parsed.read_addr, RequestType::Read, self.core_id));
            if let Some(write_addr) = parsed.write_addr {
                self.outgoing.push_back(Request::new(write_addr, RequestType::Write, self.core_id));
            }
            return Ok(true);
        }
    }

    /// `true` once the trace is exhausted and every pending send has drained.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done && self.outgoing.is_empty()
    }
}
