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

//! NEC VR4300 (MIPS III) core
//!
//! # Specifications
//! - Architecture: MIPS III, 64-bit registers, big-endian
//! - Pipeline: one branch delay slot, 2 cycles per instruction
//! - Caches: 16 KiB instruction (32-byte lines), 8 KiB write-back data
//!   (16-byte lines)
//! - MMU: 32-entry software-managed TLB with paired even/odd pages
//!
//! # Example
//! ```
//! use cpux::core::bus::{Endian, Ram};
//! use cpux::core::processor::Processor;
//! use cpux::core::vr4300::Vr4300;
//!
//! let mut ram = Ram::new(0x1000, Endian::Big);
//! // lui $t0, 0x1234 ; ori $t0, $t0, 0x5678
//! ram.load_words(0, &[0x3C08_1234, 0x3508_5678]).unwrap();
//!
//! let mut cpu = Vr4300::new();
//! cpu.set_pc(0xFFFF_FFFF_A000_0000);
//! cpu.step(&mut ram);
//! cpu.step(&mut ram);
//! assert_eq!(cpu.reg(8), 0x1234_5678);
//! ```

pub mod context;
pub mod dcache;
pub mod decoder;
pub mod exception;
pub mod icache;
mod instructions;
mod memory;
pub mod pipeline;
mod recompiler;
pub mod scc;
pub mod state;
pub mod tlb;

#[cfg(test)]
mod tests;

use crate::core::bus::Bus;
use crate::core::coprocessor::Coprocessor;
use crate::core::debugger::Debugger;
use crate::core::error::Result;
use crate::core::processor::{Isa, Processor};
use crate::core::recompiler::BlockCache;
use crate::core::save_state::ProcessorState;
use dcache::DCache;
use decoder::decode;
use exception::{Exception, ExceptionCode};
use icache::ICache;
use pipeline::Branch;
use scc::Scc;
use tlb::Tlb;

pub use memory::{Access, Resolved};

/// Base cost of one instruction in processor cycles
pub const CYCLES_PER_INSTRUCTION: u32 = 2;

/// Reset vector
pub const RESET_VECTOR: u64 = 0xFFFF_FFFF_BFC0_0000;

/// Default size of the recompiled code arena
pub const DEFAULT_CODE_BUFFER: usize = 8 * 1024 * 1024;

/// External interrupt inputs Int0-Int4 drive Cause.IP2-IP6
const FIRST_EXTERNAL_IP: u8 = 2;
const EXTERNAL_LINES: u8 = 5;

pub struct Vr4300 {
    /// General purpose registers; r0 is cleared after every instruction
    r: [u64; 32],
    lo: u64,
    hi: u64,

    /// Address of the instruction being executed
    pc: u64,
    branch: Branch,

    /// System control coprocessor (COP0)
    scc: Scc,
    tlb: Tlb,
    icache: ICache,
    dcache: DCache,

    /// Floating point unit, when attached
    cop1: Option<Box<dyn Coprocessor>>,

    debugger: Debugger,

    /// Cycles since reset
    clock: u64,

    /// Physical address of the most recent data load (for LL)
    last_physical: u32,

    blocks: BlockCache,
    recompiler: bool,
    /// Block code copied out of the cache for the duration of a dispatch
    scratch: Vec<u8>,
}

impl Vr4300 {
    pub fn new() -> Self {
        Self::with_code_buffer(DEFAULT_CODE_BUFFER)
    }

    /// Create a processor whose recompiler arena holds `capacity` bytes
    pub fn with_code_buffer(capacity: usize) -> Self {
        Self {
            r: [0; 32],
            lo: 0,
            hi: 0,
            pc: RESET_VECTOR,
            branch: Branch::default(),
            scc: Scc::new(),
            tlb: Tlb::new(),
            icache: ICache::new(),
            dcache: DCache::new(),
            cop1: None,
            debugger: Debugger::new(),
            clock: 0,
            last_physical: 0,
            blocks: recompiler::block_cache(capacity),
            recompiler: false,
            scratch: Vec::new(),
        }
    }

    /// Attach (or detach) the floating point unit on COP1
    pub fn set_coprocessor(&mut self, cop1: Option<Box<dyn Coprocessor>>) {
        self.cop1 = cop1;
    }

    /// General purpose register `index`
    pub fn reg(&self, index: u8) -> u64 {
        self.r[(index & 31) as usize]
    }

    /// Write register `index`; writes to r0 are ignored
    pub fn set_reg(&mut self, index: u8, value: u64) {
        if index & 31 != 0 {
            self.r[(index & 31) as usize] = value;
        }
    }

    pub fn hi(&self) -> u64 {
        self.hi
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    /// Continue at `pc`, dropping any pending branch
    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
        self.branch.reset();
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn scc(&self) -> &Scc {
        &self.scc
    }

    pub fn scc_mut(&mut self) -> &mut Scc {
        &mut self.scc
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn tlb_mut(&mut self) -> &mut Tlb {
        &mut self.tlb
    }

    pub fn icache(&self) -> &ICache {
        &self.icache
    }

    pub fn dcache(&self) -> &DCache {
        &self.dcache
    }

    /// Recompiled block cache
    pub fn blocks(&self) -> &BlockCache {
        &self.blocks
    }

    /// Advance the clock and the Count register
    ///
    /// Count increments every other cycle; reaching Compare sets IP7.
    pub(crate) fn charge(&mut self, cycles: u32) {
        self.clock += cycles as u64;
        let total = self.scc.count_phase + cycles;
        self.scc.count_phase = total & 1;
        let ticks = total >> 1;
        if ticks == 0 {
            return;
        }
        let before = self.scc.count;
        self.scc.count = before.wrapping_add(ticks);
        if self.scc.compare.wrapping_sub(before).wrapping_sub(1) < ticks {
            self.scc.cause.set_interrupt_pending(7, true);
        }
    }

    /// Per-instruction epilogue shared by the interpreter and recompiled
    /// blocks
    ///
    /// Returns `true` when a block must be left: control flow changed or
    /// an interrupt is now pending.
    pub(crate) fn epilogue(&mut self) -> bool {
        self.r[0] = 0;
        self.scc.tick_random();
        let (pc, changed) = self.branch.advance(self.pc);
        self.pc = pc;
        changed || self.interrupt_pending()
    }

    /// Interpret one instruction
    fn interpret(&mut self, bus: &mut dyn Bus) {
        if self.interrupt_pending() {
            self.raise(Exception::new(ExceptionCode::Interrupt));
            self.charge(CYCLES_PER_INSTRUCTION);
            self.epilogue();
            return;
        }
        let Some(word) = self.fetch_instruction(bus) else {
            self.epilogue();
            return;
        };
        self.debugger.instruction(self.pc, word);
        self.execute_opcode(bus, decode(word), word);
        self.charge(CYCLES_PER_INSTRUCTION);
        self.epilogue();
    }
}

impl Default for Vr4300 {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Vr4300 {
    fn isa(&self) -> Isa {
        Isa::Vr4300
    }

    /// Cold reset
    ///
    /// Caches and TLB contents are undefined after power-on; they are
    /// cleared to invalid here.
    fn reset(&mut self) {
        self.r = [0; 32];
        self.lo = 0;
        self.hi = 0;
        self.pc = RESET_VECTOR;
        self.branch = Branch::default();
        self.scc = Scc::new();
        self.tlb = Tlb::new();
        self.icache = ICache::new();
        self.dcache = DCache::new();
        self.clock = 0;
        self.last_physical = 0;
        self.blocks.flush();
        log::info!("VR4300: reset, PC=0x{:016X}", self.pc);
    }

    fn pc(&self) -> u64 {
        self.pc
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn step(&mut self, bus: &mut dyn Bus) -> u32 {
        if self.debugger.check_breakpoint(self.pc) {
            return 0;
        }
        let start = self.clock;
        self.interpret(bus);
        (self.clock - start) as u32
    }

    fn execute(&mut self, bus: &mut dyn Bus) -> u32 {
        if !self.recompiler || self.debugger.active() || self.interrupt_pending() {
            return self.step(bus);
        }
        let start = self.clock;
        let mut code = std::mem::take(&mut self.scratch);
        let ready = self.prepare_block(bus, &mut code);
        if ready {
            crate::core::recompiler::execute(self, bus, &code);
        }
        self.scratch = code;
        if !ready {
            return self.step(bus);
        }
        (self.clock - start) as u32
    }

    fn set_interrupt(&mut self, line: u8, asserted: bool) {
        if line >= EXTERNAL_LINES {
            log::warn!("VR4300: no external interrupt line {}", line);
            return;
        }
        self.scc
            .cause
            .set_interrupt_pending(FIRST_EXTERNAL_IP + line, asserted);
    }

    fn set_recompiler(&mut self, enabled: bool) {
        self.recompiler = enabled;
    }

    fn invalidate_blocks(&mut self) {
        self.blocks.flush();
    }

    fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    fn registers(&self) -> Vec<u64> {
        self.r.to_vec()
    }

    fn save_state(&self) -> ProcessorState {
        ProcessorState::Vr4300(Box::new(self.snapshot()))
    }

    fn load_state(&mut self, state: &ProcessorState) -> Result<()> {
        match state {
            ProcessorState::Vr4300(state) => {
                self.restore(state);
                Ok(())
            }
            other => Err(crate::core::error::EmulatorError::StateIsa {
                expected: Isa::Vr4300.name(),
                found: other.isa().name(),
            }),
        }
    }
}
