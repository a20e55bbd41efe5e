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
//! SH-2 block translation
//!
//! Blocks are keyed by the address they start at and by whether their
//! instructions come through the cache. The cache is unified, so every
//! instruction in a block performs its fetch: data accesses can evict the
//! lines a block is running from, and the fill cost must land where the
//! interpreter would charge it.

use super::decoder::{decode, Opcode};
use super::memory::{area, Area};
use super::{Sh2, CYCLES_PER_INSTRUCTION};
use crate::core::bus::{Bus, Size};
use crate::core::recompiler::{BlockCache, BlockTarget, Emitter, Geometry};

/// 128 blocks of 2-byte instructions per 256-byte pool
const GEOMETRY: Geometry = Geometry {
    pool_shift: 8,
    slot_shift: 1,
};

const BLOCK_THRESHOLD: usize = 4096;

pub(super) fn block_cache(capacity: usize) -> BlockCache {
    BlockCache::new(GEOMETRY, capacity, BLOCK_THRESHOLD)
}

struct Translation {
    code: Vec<u8>,
    length: u32,
    branch_exit: bool,
}

impl Sh2 {
    /// Drop recompiled code overlapping a purge of `physical`
    pub(super) fn invalidate_code(&mut self, physical: u32) {
        if self.blocks.invalidate(physical as u64) {
            log::trace!("SH-2: purge of 0x{:08X} dropped a code pool", physical);
            self.code_written = true;
        }
    }

    /// Copy the block at the program counter into `code`, translating it
    /// first if needed
    ///
    /// Returns `false` when the instruction must go through the
    /// interpreter instead.
    pub(super) fn prepare_block(&mut self, bus: &mut dyn Bus, code: &mut Vec<u8>) -> bool {
        if self.pc & 1 != 0 {
            return false;
        }
        let (physical, cached) = match area(self.pc) {
            Area::Cached(physical) => (physical, self.cache.enabled()),
            Area::Uncached(physical) => (physical, false),
            _ => return false,
        };
        // Cached and uncached views of the same memory translate apart
        let address = self.pc as u64;
        let state = cached as u32;

        if self.blocks.lookup(address, state).is_none() {
            self.blocks.reserve();
            let Some(block) = self.translate_block(bus, physical, cached) else {
                return false;
            };
            log::trace!(
                "SH-2: translated 0x{:08X} ({} bytes, state {:#x})",
                self.pc,
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

    fn translate_block(&self, bus: &mut dyn Bus, start: u32, cached: bool) -> Option<Translation> {
        let mut emitter = Emitter::new();
        let exit = emitter.label();
        let mut address = start;
        let mut delay_slot = false;
        let mut branch_exit = false;

        loop {
            let Ok(word) = bus.read(Size::Half, address) else {
                break;
            };
            let word = word as u16;
            // Memory written behind a resident line; the interpreter runs
            // the stale copy
            if cached
                && self
                    .cache
                    .peek(Size::Half, address)
                    .is_some_and(|line| line != word as u32)
            {
                break;
            }
            let opcode = decode(word);
            emitter.fetch(address as u64, exit);
            emitter.call(opcode.index(), word as u32);
            emitter.step(CYCLES_PER_INSTRUCTION);
            emitter.epilogue(exit);
            address = address.wrapping_add(2);

            if delay_slot {
                branch_exit = true;
                break;
            }
            if opcode.is_delayed_branch() {
                delay_slot = true;
                continue;
            }
            if opcode.is_branch() {
                branch_exit = true;
                break;
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

impl BlockTarget for Sh2 {
    fn call(&mut self, bus: &mut dyn Bus, opcode: u16, word: u32) {
        let opcode = Opcode::from_index(opcode).unwrap_or(Opcode::Invalid);
        self.execute_opcode(bus, opcode, word as u16);
    }

    /// Fetch through the live program counter
    ///
    /// The word was decoded at translation time; this keeps cache state and
    /// timing in step with the interpreter. A fault runs the epilogue here
    /// before the block is left.
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
        Sh2::epilogue(self)
    }
}
