//! Scheduler transition log.
//!
//! Every state change of a process produces a [`TransitionRecord`]. Records
//! are written as JSON lines to an optional sink, kept in a bounded in-memory
//! ring, and echoed to stdout in trace mode.

use std::collections::VecDeque;
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};
use types::{PageTableEntry, Pid};

use crate::task::{Pcb, ProcessState};

const RECENT_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Created,
    Dispatched,
    QuantumEnd,
    BlockedIo,
    BlockedVm,
    UnblockedIo,
    UnblockedVm,
    Stopped,
    InvalidAddress,
    InvalidInstruction,
    Overflow,
    Removed,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Created => "created",
            Reason::Dispatched => "dispatched",
            Reason::QuantumEnd => "quantum end",
            Reason::BlockedIo => "blocked on console",
            Reason::BlockedVm => "blocked on page transfer",
            Reason::UnblockedIo => "console transfer done",
            Reason::UnblockedVm => "page transfer done",
            Reason::Stopped => "stopped",
            Reason::InvalidAddress => "invalid address",
            Reason::InvalidInstruction => "invalid instruction",
            Reason::Overflow => "overflow",
            Reason::Removed => "removed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PteSnapshot {
    pub frame: usize,
    pub valid: bool,
    pub dirty: bool,
    pub on_disk: bool,
    pub disk_address: usize,
}

impl From<&PageTableEntry> for PteSnapshot {
    fn from(e: &PageTableEntry) -> Self {
        Self {
            frame: e.frame,
            valid: e.valid,
            dirty: e.dirty,
            on_disk: e.on_disk,
            disk_address: e.disk_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub pid: Pid,
    pub program: String,
    pub reason: Reason,
    pub from: Option<ProcessState>,
    pub to: ProcessState,
    /// Saved program counter at the time of the transition.
    pub pc: i32,
    pub page_table: Vec<PteSnapshot>,
}

impl TransitionRecord {
    pub fn new(pcb: &Pcb, reason: Reason, from: Option<ProcessState>) -> Self {
        Self {
            pid: pcb.id,
            program: pcb.name.clone(),
            reason,
            from,
            to: pcb.state,
            pc: pcb.tf.pc,
            page_table: pcb.page_table.iter().map(PteSnapshot::from).collect(),
        }
    }
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            Some(from) => write!(
                f,
                "P{} ({}) {} -> {}: {} [pc={}]",
                self.pid, self.program, from, self.to, self.reason, self.pc
            ),
            None => write!(f, "P{} ({}) -> {}: {}", self.pid, self.program, self.to, self.reason),
        }
    }
}

pub struct Journal {
    sink: Option<Box<dyn Write + Send>>,
    recent: VecDeque<TransitionRecord>,
    pub verbose: bool,
}

impl Journal {
    pub fn new(verbose: bool) -> Self {
        Self {
            sink: None,
            recent: VecDeque::new(),
            verbose,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.sink = Some(sink);
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.verbose {
            println!("{}", record);
        }
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = write_line(sink.as_mut(), &record) {
                eprintln!("journal: dropping log sink: {}", e);
                self.sink = None;
            }
        }
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(record);
    }

    /// Free-form kernel message, shown only in trace mode.
    pub fn note(&self, message: impl fmt::Display) {
        if self.verbose {
            println!("{}", message);
        }
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.recent.iter().cloned().collect()
    }
}

fn write_line(sink: &mut dyn Write, record: &TransitionRecord) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, record)?;
    writeln!(sink)?;
    sink.flush()
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("records", &self.recent.len())
            .field("verbose", &self.verbose)
            .finish()
    }
}
