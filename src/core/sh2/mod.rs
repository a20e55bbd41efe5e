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
//! Hitachi SH-2 (SH7604) core
//!
//! # Specifications
//! - Architecture: SuperH 2, 32-bit, big-endian, 16-bit instructions
//! - Sixteen general registers; R15 is the stack pointer for exceptions
//! - Delayed branches with one slot; BT and BF branch immediately
//! - 4 KiB unified write-through cache, optionally half RAM
//! - No MMU: address bits 31:29 select the access area
//!
//! # Example
//! ```
//! use cpux::core::bus::{Endian, Ram};
//! use cpux::core::processor::Processor;
//! use cpux::core::sh2::Sh2;
//!
//! let mut ram = Ram::new(0x1000, Endian::Big);
//! // mov #18,r1 ; add #24,r1
//! ram.load_halves(0x100, &[0xE112, 0x7118]).unwrap();
//!
//! let mut cpu = Sh2::new();
//! cpu.set_pc(0x2000_0100);
//! cpu.step(&mut ram);
//! cpu.step(&mut ram);
//! assert_eq!(cpu.reg(1), 42);
//! ```

pub mod cache;
pub mod decoder;
pub mod exception;
mod instructions;
pub mod memory;
mod recompiler;
pub mod state;
pub mod status;

#[cfg(test)]
mod tests;

use crate::core::bus::{Bus, Size};
use crate::core::debugger::Debugger;
use crate::core::error::{EmulatorError, Result};
use crate::core::processor::{Isa, Processor};
use crate::core::recompiler::BlockCache;
use crate::core::save_state::ProcessorState;
use bincode::{Decode, Encode};
use cache::Cache;
use decoder::decode;
use exception::{auto_vector, VECTOR_POWER_ON_PC, VECTOR_POWER_ON_SP};
use serde::{Deserialize, Serialize};
use status::Status;

/// Base cost of one instruction in processor cycles
pub const CYCLES_PER_INSTRUCTION: u32 = 1;

/// Default size of the recompiled code arena
pub const DEFAULT_CODE_BUFFER: usize = 4 * 1024 * 1024;

/// Highest IRL priority level
pub const MAX_LEVEL: u8 = 15;

/// Where the current instruction sits in a control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum Branch {
    /// Continue with the next instruction
    Step,
    /// A delayed branch ran; its slot is next
    Slot,
    /// Transfer to `target` after this instruction
    Take,
}

pub struct Sh2 {
    r: [u32; 16],
    /// Address of the instruction being executed
    pc: u32,
    pr: u32,
    gbr: u32,
    vbr: u32,
    mach: u32,
    macl: u32,
    sr: Status,

    branch: Branch,
    target: u32,
    /// Executing a delay slot
    delay_slot: bool,
    /// The previous instruction blocks interrupt acceptance for one
    /// instruction (LDC, LDS, STC, STS)
    inhibit: bool,
    /// Halted in SLEEP until an interrupt arrives
    sleeping: bool,
    /// An exception moved the program counter this instruction
    redirected: bool,

    cache: Cache,

    /// Asserted IRL levels, one bit per level
    irl: u16,
    /// Vector number fetched for each level
    vectors: [u8; 16],
    /// NMI edge waiting to be accepted
    nmi: bool,

    debugger: Debugger,

    /// Cycles since reset
    clock: u64,

    blocks: BlockCache,
    recompiler: bool,
    /// Block code copied out of the cache for the duration of a dispatch
    block_code: Vec<u8>,
    /// A cache purge dropped recompiled code or CCR changed
    code_written: bool,
}

const fn default_vectors() -> [u8; 16] {
    let mut vectors = [0u8; 16];
    let mut level = 0;
    while level < 16 {
        vectors[level] = auto_vector(level as u8);
        level += 1;
    }
    vectors
}

impl Sh2 {
    pub fn new() -> Self {
        Self::with_code_buffer(DEFAULT_CODE_BUFFER)
    }

    /// Create a processor whose recompiler arena holds `capacity` bytes
    pub fn with_code_buffer(capacity: usize) -> Self {
        Self {
            r: [0; 16],
            pc: 0,
            pr: 0,
            gbr: 0,
            vbr: 0,
            mach: 0,
            macl: 0,
            sr: Status::RESET,
            branch: Branch::Step,
            target: 0,
            delay_slot: false,
            inhibit: false,
            sleeping: false,
            redirected: false,
            cache: Cache::new(),
            irl: 0,
            vectors: default_vectors(),
            nmi: false,
            debugger: Debugger::new(),
            clock: 0,
            blocks: recompiler::block_cache(capacity),
            recompiler: false,
            block_code: Vec::new(),
            code_written: false,
        }
    }

    /// Power-on reset sequence: PC and R15 come from vectors 0 and 1
    pub fn boot(&mut self, bus: &mut dyn Bus) -> Result<()> {
        self.reset();
        let pc = bus.read(Size::Word, VECTOR_POWER_ON_PC as u32 * 4)? as u32;
        let sp = bus.read(Size::Word, VECTOR_POWER_ON_SP as u32 * 4)? as u32;
        self.set_pc(pc);
        self.r[15] = sp;
        log::info!("SH-2: boot, PC=0x{:08X} SP=0x{:08X}", pc, sp);
        Ok(())
    }

    pub fn reg(&self, index: u8) -> u32 {
        self.r[(index & 15) as usize]
    }

    pub fn set_reg(&mut self, index: u8, value: u32) {
        self.r[(index & 15) as usize] = value;
    }

    /// Continue at `pc`, dropping any pending branch
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.branch = Branch::Step;
        self.delay_slot = false;
        self.sleeping = false;
    }

    pub fn pr(&self) -> u32 {
        self.pr
    }

    pub fn gbr(&self) -> u32 {
        self.gbr
    }

    pub fn vbr(&self) -> u32 {
        self.vbr
    }

    pub fn set_vbr(&mut self, vbr: u32) {
        self.vbr = vbr;
    }

    /// MACH and MACL
    pub fn mac(&self) -> (u32, u32) {
        (self.mach, self.macl)
    }

    pub fn sr(&self) -> Status {
        self.sr
    }

    pub fn set_sr(&mut self, sr: Status) {
        self.sr = Status::from_bits(sr.0);
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot
    }

    pub fn sleeping(&self) -> bool {
        self.sleeping
    }

    /// Signal an NMI edge; accepted whatever the interrupt mask
    pub fn nmi(&mut self) {
        self.nmi = true;
    }

    /// Vector number supplied for IRL `level` instead of its auto-vector
    pub fn set_interrupt_vector(&mut self, level: u8, vector: u8) {
        if level == 0 || level > MAX_LEVEL {
            log::warn!("SH-2: no interrupt level {}", level);
            return;
        }
        self.vectors[level as usize] = vector;
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
    /// Advances the program counter through any delay slot. Returns `true`
    /// when a block must be left: control moved, an interrupt can be
    /// taken, or recompiled code was dropped.
    pub(crate) fn epilogue(&mut self) -> bool {
        if self.redirected {
            self.redirected = false;
            self.branch = Branch::Step;
            self.delay_slot = false;
            return true;
        }

        let transfer = match self.branch {
            Branch::Step => {
                self.pc = self.pc.wrapping_add(2);
                self.delay_slot = false;
                false
            }
            Branch::Slot => {
                self.pc = self.pc.wrapping_add(2);
                self.branch = Branch::Take;
                self.delay_slot = true;
                false
            }
            Branch::Take => {
                self.pc = self.target;
                self.branch = Branch::Step;
                self.delay_slot = false;
                true
            }
        };
        transfer || self.interrupt_pending() || std::mem::take(&mut self.code_written)
    }

    /// Interpret one instruction
    fn interpret(&mut self, bus: &mut dyn Bus) {
        if self.take_interrupt(bus) {
            self.charge(CYCLES_PER_INSTRUCTION);
            self.epilogue();
            return;
        }
        let Some(word) = self.fetch_instruction(bus) else {
            self.epilogue();
            return;
        };
        self.debugger.instruction(self.pc as u64, word as u32);
        self.execute_opcode(bus, decode(word), word);
        self.charge(CYCLES_PER_INSTRUCTION);
        self.epilogue();
    }
}

impl Default for Sh2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Sh2 {
    fn isa(&self) -> Isa {
        Isa::Sh2
    }

    /// Manual reset
    ///
    /// SR masks every level and VBR returns to zero. The program counter
    /// is left at zero; [`Sh2::boot`] runs the vector fetch.
    fn reset(&mut self) {
        self.r = [0; 16];
        self.pr = 0;
        self.gbr = 0;
        self.vbr = 0;
        self.mach = 0;
        self.macl = 0;
        self.sr = Status::RESET;
        self.set_pc(0);
        self.inhibit = false;
        self.redirected = false;
        self.cache = Cache::new();
        self.nmi = false;
        self.clock = 0;
        self.code_written = false;
        self.blocks.flush();
        log::info!("SH-2: reset");
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
    /// Blocks always start outside a delay slot.
    fn execute(&mut self, bus: &mut dyn Bus) -> u32 {
        if !self.recompiler
            || self.debugger.active()
            || self.interrupt_pending()
            || self.branch != Branch::Step
            || self.delay_slot
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

    /// Assert or release IRL priority `line` (1-15)
    fn set_interrupt(&mut self, line: u8, asserted: bool) {
        if line == 0 || line > MAX_LEVEL {
            log::warn!("SH-2: no interrupt level {}", line);
            return;
        }
        if asserted {
            self.irl |= 1 << line;
        } else {
            self.irl &= !(1 << line);
        }
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

    /// R0-R15, then PC, PR, GBR, VBR, MACH, MACL and SR
    fn registers(&self) -> Vec<u64> {
        self.r
            .iter()
            .chain(&[
                self.pc, self.pr, self.gbr, self.vbr, self.mach, self.macl, self.sr.0,
            ])
            .map(|&r| r as u64)
            .collect()
    }

    fn save_state(&self) -> ProcessorState {
        ProcessorState::Sh2(Box::new(self.snapshot()))
    }

    fn load_state(&mut self, state: &ProcessorState) -> Result<()> {
        match state {
            ProcessorState::Sh2(state) => {
                self.restore(state);
                Ok(())
            }
            other => Err(EmulatorError::StateIsa {
                expected: Isa::Sh2.name(),
                found: other.isa().name(),
            }),
        }
    }
}
