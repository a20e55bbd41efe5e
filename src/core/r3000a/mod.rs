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
//! MIPS R3000A core
//!
//! # Specifications
//! - Architecture: MIPS I, 32-bit, little-endian
//! - Pipeline: one branch delay slot and one load delay slot
//! - Cache: 4 KiB direct-mapped instruction cache, 1 KiB scratchpad in
//!   place of a data cache
//! - No MMU: fixed kuseg/kseg0/kseg1 segments
//!
//! # Example
//! ```
//! use cpux::core::bus::{Endian, Ram};
//! use cpux::core::processor::Processor;
//! use cpux::core::r3000a::R3000a;
//!
//! let mut ram = Ram::new(0x1000, Endian::Little);
//! // lui $t0, 0x1234 ; ori $t0, $t0, 0x5678
//! ram.load_words(0, &[0x3C08_1234, 0x3508_5678]).unwrap();
//!
//! let mut cpu = R3000a::new();
//! cpu.set_pc(0xA000_0000);
//! cpu.step(&mut ram);
//! cpu.step(&mut ram);
//! assert_eq!(cpu.reg(8), 0x1234_5678);
//! ```

mod breakpoint;
pub mod cop0;
pub mod decoder;
pub mod exception;
pub mod icache;
mod instructions;
pub mod memory;
mod recompiler;
pub mod state;

#[cfg(test)]
mod tests;

use crate::core::bus::Bus;
use crate::core::coprocessor::Coprocessor;
use crate::core::debugger::Debugger;
use crate::core::error::{EmulatorError, Result};
use crate::core::processor::{Isa, Processor};
use crate::core::recompiler::BlockCache;
use crate::core::save_state::ProcessorState;
use bincode::{Decode, Encode};
use cop0::{Cop0, Dcic};
use decoder::decode;
use exception::{Exception, ExceptionCode};
use icache::ICache;
use memory::{CacheControl, SCRATCHPAD_SIZE};
use serde::{Deserialize, Serialize};

/// Base cost of one instruction in processor cycles
pub const CYCLES_PER_INSTRUCTION: u32 = 1;

/// Reset vector
pub const RESET_VECTOR: u32 = 0xBFC0_0000;

/// Default size of the recompiled code arena
pub const DEFAULT_CODE_BUFFER: usize = 4 * 1024 * 1024;

/// Interrupt inputs 0-5 drive Cause.IP2-IP7
const FIRST_EXTERNAL_IP: u8 = 2;
const EXTERNAL_LINES: u8 = 6;

/// A load waiting for its delay slot to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct LoadDelay {
    pub register: u8,
    pub value: u32,
}

/// Control transfer decided by the instruction being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Jump {
    pub taken: bool,
    pub target: u32,
}

pub struct R3000a {
    /// General purpose registers; r0 is cleared after every instruction
    r: [u32; 32],
    hi: u32,
    lo: u32,

    /// Address of the instruction being executed
    pc: u32,
    /// Address of the instruction after it
    next_pc: u32,
    /// Executing a branch delay slot
    delay_slot: bool,
    /// The branch owning the delay slot was taken
    taken: bool,
    jump: Option<Jump>,
    /// An exception moved the program counter this instruction
    redirected: bool,

    /// Load issued by the previous instruction, visible after this one
    delayed: Option<LoadDelay>,
    /// Load issued by this instruction
    loading: Option<LoadDelay>,

    cop0: Cop0,
    icache: ICache,
    cache_control: CacheControl,
    scratchpad: Vec<u8>,

    /// Geometry transformation engine, when attached
    cop2: Option<Box<dyn Coprocessor>>,

    debugger: Debugger,

    /// Cycles since reset
    clock: u64,

    blocks: BlockCache,
    recompiler: bool,
    /// Block code copied out of the cache for the duration of a dispatch
    block_code: Vec<u8>,
    /// A store hit recompiled code or the cache control register; the
    /// running block must be left
    code_written: bool,
}

impl R3000a {
    pub fn new() -> Self {
        Self::with_code_buffer(DEFAULT_CODE_BUFFER)
    }

    /// Create a processor whose recompiler arena holds `capacity` bytes
    pub fn with_code_buffer(capacity: usize) -> Self {
        Self {
            r: [0; 32],
            hi: 0,
            lo: 0,
            pc: RESET_VECTOR,
            next_pc: RESET_VECTOR.wrapping_add(4),
            delay_slot: false,
            taken: false,
            jump: None,
            redirected: false,
            delayed: None,
            loading: None,
            cop0: Cop0::new(),
            icache: ICache::new(),
            cache_control: CacheControl::empty(),
            scratchpad: vec![0; SCRATCHPAD_SIZE],
            cop2: None,
            debugger: Debugger::new(),
            clock: 0,
            blocks: recompiler::block_cache(capacity),
            recompiler: false,
            block_code: Vec::new(),
            code_written: false,
        }
    }

    /// Attach (or detach) the geometry engine on COP2
    pub fn set_coprocessor(&mut self, cop2: Option<Box<dyn Coprocessor>>) {
        self.cop2 = cop2;
    }

    /// General purpose register `index`
    ///
    /// A load still in its delay slot is not visible here.
    pub fn reg(&self, index: u8) -> u32 {
        self.r[(index & 31) as usize]
    }

    /// Write register `index`; writes to r0 are ignored
    pub fn set_reg(&mut self, index: u8, value: u32) {
        if index & 31 != 0 {
            self.r[(index & 31) as usize] = value;
        }
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    /// Continue at `pc`, dropping any pending branch
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.delay_slot = false;
        self.jump = None;
    }

    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// Load waiting to be written back
    pub fn pending_load(&self) -> Option<LoadDelay> {
        self.delayed
    }

    pub fn cop0(&self) -> &Cop0 {
        &self.cop0
    }

    pub fn cop0_mut(&mut self) -> &mut Cop0 {
        &mut self.cop0
    }

    pub fn icache(&self) -> &ICache {
        &self.icache
    }

    pub fn cache_control(&self) -> CacheControl {
        self.cache_control
    }

    pub fn set_cache_control(&mut self, control: CacheControl) {
        self.cache_control = control;
    }

    /// Recompiled block cache
    pub fn blocks(&self) -> &BlockCache {
        &self.blocks
    }

    #[inline(always)]
    pub(crate) fn charge(&mut self, cycles: u32) {
        self.clock += cycles as u64;
    }

    /// Per-instruction epilogue shared by the interpreter and recompiled
    /// blocks
    ///
    /// Retires the load delay slot and advances the program counter.
    /// Returns `true` when a block must be left: a delay slot or exception
    /// changed control flow, an interrupt is pending, or a store hit
    /// recompiled code.
    pub(crate) fn epilogue(&mut self) -> bool {
        self.r[0] = 0;
        if let Some(load) = self.delayed.take() {
            self.r[load.register as usize] = load.value;
            self.r[0] = 0;
        }
        self.delayed = self.loading.take();

        if self.redirected {
            self.redirected = false;
            self.delay_slot = false;
            self.jump = None;
            return true;
        }

        let leaving_slot = self.delay_slot;
        self.pc = self.next_pc;
        match self.jump.take() {
            Some(jump) => {
                self.delay_slot = true;
                self.taken = jump.taken;
                self.next_pc = if jump.taken {
                    jump.target
                } else {
                    self.pc.wrapping_add(4)
                };
            }
            None => {
                self.delay_slot = false;
                self.next_pc = self.pc.wrapping_add(4);
            }
        }
        leaving_slot || self.interrupt_pending() || std::mem::take(&mut self.code_written)
    }

    /// Interpret one instruction
    fn interpret(&mut self, bus: &mut dyn Bus) {
        if self.interrupt_pending() {
            self.raise(Exception::new(ExceptionCode::Interrupt));
            self.charge(CYCLES_PER_INSTRUCTION);
            self.epilogue();
            return;
        }
        if self.code_breakpoint() {
            self.epilogue();
            return;
        }
        let Some(word) = self.fetch_instruction(bus) else {
            self.epilogue();
            return;
        };
        self.debugger.instruction(self.pc as u64, word);
        self.execute_opcode(bus, decode(word), word);
        self.charge(CYCLES_PER_INSTRUCTION);
        self.epilogue();
    }
}

impl Default for R3000a {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for R3000a {
    fn isa(&self) -> Isa {
        Isa::R3000a
    }

    /// Cold reset
    ///
    /// The instruction cache and scratchpad come up invalid and zeroed.
    fn reset(&mut self) {
        self.r = [0; 32];
        self.hi = 0;
        self.lo = 0;
        self.set_pc(RESET_VECTOR);
        self.taken = false;
        self.redirected = false;
        self.delayed = None;
        self.loading = None;
        self.cop0 = Cop0::new();
        self.icache = ICache::new();
        self.cache_control = CacheControl::empty();
        self.scratchpad.fill(0);
        self.clock = 0;
        self.code_written = false;
        self.blocks.flush();
        log::info!("R3000A: reset, PC=0x{:08X}", self.pc);
    }

    fn pc(&self) -> u64 {
        self.pc as u64
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn step(&mut self, bus: &mut dyn Bus) -> u32 {
        if self.debugger.check_breakpoint(self.pc as u64) {
            return 0;
        }
        let start = self.clock;
        self.interpret(bus);
        (self.clock - start) as u32
    }

    /// Run one recompiled block
    ///
    /// The hardware breakpoint unit is only checked by the interpreter, so
    /// an enabled DCIC keeps execution there.
    fn execute(&mut self, bus: &mut dyn Bus) -> u32 {
        if !self.recompiler
            || self.debugger.active()
            || self.interrupt_pending()
            || self.cop0.dcic.contains(Dcic::MASTER)
        {
            return self.step(bus);
        }
        let start = self.clock;
        let mut code = std::mem::take(&mut self.block_code);
        let ready = self.prepare_block(bus, &mut code);
        if ready {
            crate::core::recompiler::execute(self, bus, &code);
        }
        self.block_code = code;
        if !ready {
            return self.step(bus);
        }
        (self.clock - start) as u32
    }

    fn set_interrupt(&mut self, line: u8, asserted: bool) {
        if line >= EXTERNAL_LINES {
            log::warn!("R3000A: no interrupt line {}", line);
            return;
        }
        self.cop0
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
        self.r.iter().map(|&r| r as u64).collect()
    }

    fn save_state(&self) -> ProcessorState {
        ProcessorState::R3000a(Box::new(self.snapshot()))
    }

    fn load_state(&mut self, state: &ProcessorState) -> Result<()> {
        match state {
            ProcessorState::R3000a(state) => {
                self.restore(state);
                Ok(())
            }
            other => Err(EmulatorError::StateIsa {
                expected: Isa::R3000a.name(),
                found: other.isa().name(),
            }),
        }
    }
}
