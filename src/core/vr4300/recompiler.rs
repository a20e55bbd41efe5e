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

//! VR4300 block translation
//!
//! Blocks are keyed by the physical address of their first instruction and
//! by the addressing mode they were translated under. Instruction words are
//! read from memory at translation time; a block is only built while the
//! instruction cache holds no stale copy of those words.

use super::decoder::{decode, Opcode};
use super::memory::Access;
use super::{Vr4300, CYCLES_PER_INSTRUCTION};
use crate::core::bus::{Bus, Size};
use crate::core::recompiler::{BlockCache, BlockTarget, Emitter, Geometry};

/// 64 blocks of 4-byte instructions per 256-byte pool
const GEOMETRY: Geometry = Geometry {
    pool_shift: 8,
    slot_shift: 2,
};

/// Largest block the emitter can produce, with room to spare
const BLOCK_THRESHOLD: usize = 4096;

const ICACHE_LINE: u32 = super::icache::LINE_SIZE;

pub(super) fn block_cache(capacity: usize) -> BlockCache {
    BlockCache::new(GEOMETRY, capacity, BLOCK_THRESHOLD)
}

/// A finished translation
struct Translation {
    code: Vec<u8>,
    length: u32,
    branch_exit: bool,
}

impl Vr4300 {
    /// Mode bits a block depends on
    pub(super) fn block_state(&self, cached: bool) -> u32 {
        let cop1 = self.scc.status.coprocessor_usable(1) as u32;
        self.context().bits() | cop1 << 4 | (cached as u32) << 5
    }

    /// Copy the block at the program counter into `code`, translating it
    /// first if needed
    ///
    /// Returns `false` when the instruction must go through the
    /// interpreter instead (fetch fault, unreadable or incoherent code).
    pub(super) fn prepare_block(&mut self, bus: &mut dyn Bus, code: &mut Vec<u8>) -> bool {
        if self.pc & 3 != 0 {
            return false;
        }
        let Ok(resolved) = self.resolve(self.pc, Access::Fetch) else {
            return false;
        };
        let address = resolved.physical as u64;
        let state = self.block_state(resolved.cached);

        if self.blocks.lookup(address, state).is_none() {
            self.blocks.reserve();
            let Some(block) = self.translate_block(bus, resolved.physical, resolved.cached) else {
                return false;
            };
            log::trace!(
                "VR4300: translated 0x{:08X} ({} bytes, state {:#x})",
                resolved.physical,
                block.length,
                state
            );
            if self
                .blocks
                .insert(address, state, block.length, block.branch_exit, &block.code)
                .is_none()
            {
                return false;
            }
        }

        match self.blocks.lookup(address, state) {
            Some(block) => {
                code.clear();
                code.extend_from_slice(self.blocks.code(block));
                true
            }
            None => false,
        }
    }

    fn translate_block(
        &self,
        bus: &mut dyn Bus,
        start: u32,
        cached: bool,
    ) -> Option<Translation> {
        let mut emitter = Emitter::new();
        let exit = emitter.label();
        let mut address = start;
        let mut delay_slot = false;
        let mut branch_exit = false;

        loop {
            let Ok(word) = bus.read(Size::Word, address) else {
                break;
            };
            let word = word as u32;
            if cached && self.icache.peek(address).is_some_and(|line| line != word) {
                break;
            }
            let opcode = decode(word);
            // A delay slot past the pool may sit on another page; the branch
            // is left to the interpreter
            if !delay_slot && opcode.is_branch() && GEOMETRY.boundary(address as u64 + 4) {
                break;
            }
            // Cached code only refetches when crossing into a new line
            if !cached || address == start || address % ICACHE_LINE == 0 {
                emitter.fetch(address as u64, exit);
            }
            emitter.call(opcode.index(), word);
            emitter.step(CYCLES_PER_INSTRUCTION);
            emitter.epilogue(exit);
            address = address.wrapping_add(4);

            if delay_slot {
                branch_exit = true;
                break;
            }
            if opcode.is_branch() {
                delay_slot = true;
                continue;
            }
            if opcode.ends_block() || GEOMETRY.boundary(address as u64) {
                break;
            }
        }

        if address == start {
            return None;
        }
        emitter.bind(exit);
        emitter.exit();
        let code = emitter.finish().ok()?;
        Some(Translation {
            code,
            length: address.wrapping_sub(start),
            branch_exit,
        })
    }
}

impl BlockTarget for Vr4300 {
    fn call(&mut self, bus: &mut dyn Bus, opcode: u16, word: u32) {
        let opcode = Opcode::from_index(opcode).unwrap_or(Opcode::Invalid);
        self.execute_opcode(bus, opcode, word);
    }

    /// Fetch through the live program counter
    ///
    /// A fault runs the epilogue here, as the interpreter does, before the
    /// block is left.
    fn fetch(&mut self, bus: &mut dyn Bus, _address: u64) -> bool {
        if self.fetch_instruction(bus).is_some() {
            return false;
        }
        self.epilogue();
        true
    }

    fn step(&mut self, cycles: u32) {
        self.charge(cycles);
    }

    fn epilogue(&mut self) -> bool {
        Vr4300::epilogue(self)
    }
}
