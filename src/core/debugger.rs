// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Debug and trace hooks
//!
//! Every processor owns a [`Debugger`]. While it is inactive the per
//! instruction cost is a single branch; once a tracer, a remote bridge or a
//! breakpoint is attached, the processor stops using recompiled blocks and
//! reports each instruction and each fault through here.

use crate::core::error::Result;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Observer of the instruction stream
pub trait Tracer {
    /// Called before the instruction at `address` executes
    fn instruction(&mut self, address: u64, opcode: u32);

    /// Called when an exception is raised, with a symbolic reason
    fn exception(&mut self, reason: &str);
}

/// Signal numbers reported to a remote debugger, using the POSIX values a
/// gdb stub expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Signal {
    Illegal = 4,
    Trap = 5,
    Bus = 7,
    FloatingPoint = 8,
    Segmentation = 11,
}

/// Bridge to an external debugger front end
pub trait RemoteDebugger {
    /// Report the program counter of the instruction about to execute
    fn report_pc(&mut self, pc: u64);

    /// Report a fault or breakpoint stop
    fn report_signal(&mut self, signal: Signal, pc: u64);
}

/// Set of code breakpoints
#[derive(Debug, Default, Clone)]
pub struct Breakpoints {
    addresses: BTreeSet<u64>,
}

impl Breakpoints {
    pub fn insert(&mut self, address: u64) -> bool {
        self.addresses.insert(address)
    }

    pub fn remove(&mut self, address: u64) -> bool {
        self.addresses.remove(&address)
    }

    pub fn contains(&self, address: u64) -> bool {
        self.addresses.contains(&address)
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.addresses.iter().copied()
    }
}

/// Per-processor hook dispatcher
#[derive(Default)]
pub struct Debugger {
    tracer: Option<Box<dyn Tracer>>,
    remote: Option<Box<dyn RemoteDebugger>>,
    breakpoints: Breakpoints,
    halted: bool,
    resume_from: Option<u64>,
}

impl Debugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any hook is attached
    #[inline(always)]
    pub fn active(&self) -> bool {
        self.tracer.is_some() || self.remote.is_some() || !self.breakpoints.is_empty()
    }

    pub fn set_tracer(&mut self, tracer: Option<Box<dyn Tracer>>) {
        self.tracer = tracer;
    }

    pub fn set_remote(&mut self, remote: Option<Box<dyn RemoteDebugger>>) {
        self.remote = remote;
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    /// Whether execution is stopped at a breakpoint
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Leave the halted state; the breakpoint that stopped execution is
    /// stepped over once
    pub fn resume(&mut self, pc: u64) {
        if self.halted {
            self.halted = false;
            self.resume_from = Some(pc);
        }
    }

    /// Breakpoint check made before the instruction at `address` is fetched
    ///
    /// Returns `true` when execution must stop here.
    pub fn check_breakpoint(&mut self, address: u64) -> bool {
        if self.halted {
            return true;
        }
        if self.breakpoints.contains(address) && self.resume_from.take() != Some(address) {
            self.halted = true;
            log::info!("Debugger: breakpoint hit at 0x{:016X}", address);
            if let Some(remote) = self.remote.as_mut() {
                remote.report_signal(Signal::Trap, address);
            }
            return true;
        }
        self.resume_from = None;
        false
    }

    /// Per-instruction hook, called once the opcode is known
    pub fn instruction(&mut self, address: u64, opcode: u32) {
        if let Some(remote) = self.remote.as_mut() {
            remote.report_pc(address);
        }
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.instruction(address, opcode);
        }
    }

    /// Per-fault hook
    pub fn exception(&mut self, reason: &str, signal: Option<Signal>, pc: u64) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.exception(reason);
        }
        if let (Some(remote), Some(signal)) = (self.remote.as_mut(), signal) {
            remote.report_signal(signal, pc);
        }
    }
}

/// Tracer writing one line per event to a file
///
/// # Example
/// ```no_run
/// use cpux::core::debugger::{FileTracer, Tracer};
///
/// let mut tracer = FileTracer::create("trace.log").unwrap();
/// tracer.instruction(0xBFC0_0000, 0x3C08_0000);
/// ```
pub struct FileTracer {
    output: BufWriter<File>,
}

impl FileTracer {
    /// Create (or truncate) the trace file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let output = BufWriter::new(File::create(path)?);
        Ok(Self { output })
    }
}

impl Tracer for FileTracer {
    fn instruction(&mut self, address: u64, opcode: u32) {
        if let Err(e) = writeln!(self.output, "PC: 0x{:016X}  INSTR: 0x{:08X}", address, opcode) {
            log::warn!("Tracer: write failed: {}", e);
        }
    }

    fn exception(&mut self, reason: &str) {
        if let Err(e) = writeln!(self.output, "EXCEPTION: {}", reason) {
            log::warn!("Tracer: write failed: {}", e);
        }
    }
}

/// One recorded trace event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Instruction { address: u64, opcode: u32 },
    Exception(String),
}

/// In-memory tracer
///
/// The log is shared through an `Rc` so the caller can keep a handle after
/// boxing the tracer into a processor.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: std::rc::Rc<std::cell::RefCell<Vec<TraceEvent>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl Tracer for TraceLog {
    fn instruction(&mut self, address: u64, opcode: u32) {
        self.events
            .borrow_mut()
            .push(TraceEvent::Instruction { address, opcode });
    }

    fn exception(&mut self, reason: &str) {
        self.events
            .borrow_mut()
            .push(TraceEvent::Exception(reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        pcs: Rc<RefCell<Vec<u64>>>,
        signals: Rc<RefCell<Vec<(Signal, u64)>>>,
    }

    impl RemoteDebugger for Recorder {
        fn report_pc(&mut self, pc: u64) {
            self.pcs.borrow_mut().push(pc);
        }
        fn report_signal(&mut self, signal: Signal, pc: u64) {
            self.signals.borrow_mut().push((signal, pc));
        }
    }

    #[test]
    fn test_inactive_by_default() {
        let debugger = Debugger::new();
        assert!(!debugger.active());
    }

    #[test]
    fn test_trace_log_records_events() {
        let log = TraceLog::new();
        let mut debugger = Debugger::new();
        debugger.set_tracer(Some(Box::new(log.clone())));

        assert!(!debugger.check_breakpoint(0x100));
        debugger.instruction(0x100, 0xDEAD_BEEF);
        debugger.exception("reserved instruction", Some(Signal::Illegal), 0x100);

        assert_eq!(
            log.events(),
            vec![
                TraceEvent::Instruction {
                    address: 0x100,
                    opcode: 0xDEAD_BEEF
                },
                TraceEvent::Exception("reserved instruction".into()),
            ]
        );
    }

    #[test]
    fn test_breakpoint_halts_and_resumes() {
        let recorder = Recorder::default();
        let mut debugger = Debugger::new();
        debugger.set_remote(Some(Box::new(recorder.clone())));
        debugger.breakpoints_mut().insert(0x200);

        assert!(!debugger.check_breakpoint(0x1FC));
        debugger.instruction(0x1FC, 0);
        assert!(debugger.check_breakpoint(0x200));
        assert!(debugger.halted());
        assert!(debugger.check_breakpoint(0x200));

        debugger.resume(0x200);
        assert!(!debugger.check_breakpoint(0x200));
        debugger.instruction(0x200, 0);
        assert_eq!(*recorder.signals.borrow(), vec![(Signal::Trap, 0x200)]);
        assert_eq!(*recorder.pcs.borrow(), vec![0x1FC, 0x200]);
    }

    #[test]
    fn test_breakpoint_hits_again_on_next_visit() {
        let mut debugger = Debugger::new();
        debugger.breakpoints_mut().insert(0x10);
        assert!(debugger.check_breakpoint(0x10));
        debugger.resume(0x10);
        assert!(!debugger.check_breakpoint(0x10));
        assert!(!debugger.check_breakpoint(0x14));
        assert!(debugger.check_breakpoint(0x10));
    }

    #[test]
    fn test_file_tracer_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        {
            let mut tracer = FileTracer::create(&path).unwrap();
            tracer.instruction(0xBFC0_0000, 0x3C08_0000);
            tracer.exception("syscall");
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("PC: 0x00000000BFC00000  INSTR: 0x3C080000"));
        assert!(text.contains("EXCEPTION: syscall"));
    }
}
