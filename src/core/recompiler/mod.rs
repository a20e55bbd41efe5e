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

//! Shared recompiler infrastructure
//!
//! Each processor translates runs of guest instructions into threaded code
//! (see [`emitter`]) that calls back into the same semantic routines the
//! interpreter uses. This module holds the pieces every processor shares:
//!
//! - [`BlockCache`]: two-level pool/slot index over translated blocks,
//!   backed by a [`BumpAllocator`] that is flushed wholesale when it runs low
//! - [`BlockTarget`] and [`execute`]: the loop that replays a block against
//!   a processor

pub mod allocator;
pub mod emitter;

pub use allocator::BumpAllocator;
pub use emitter::{Emitter, Label, Op, Reader};

use crate::core::bus::Bus;
use std::collections::HashMap;
use std::ops::Range;

/// A translated block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Guest address of the first instruction (the cache key)
    pub address: u64,
    /// Processor mode bits the block was translated under
    pub state: u32,
    /// Number of guest bytes covered
    pub length: u32,
    /// Whether the block ends with a control-flow instruction
    pub branch_exit: bool,
    code: Range<usize>,
}

#[derive(Debug)]
struct Pool {
    blocks: Vec<Option<Block>>,
}

/// Block cache geometry
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// log2 of the bytes covered by one pool
    pub pool_shift: u32,
    /// log2 of the guest instruction width
    pub slot_shift: u32,
}

impl Geometry {
    pub const fn blocks_per_pool(&self) -> usize {
        1 << (self.pool_shift - self.slot_shift)
    }

    #[inline(always)]
    pub const fn pool(&self, address: u64) -> u64 {
        address >> self.pool_shift
    }

    #[inline(always)]
    pub const fn slot(&self, address: u64) -> usize {
        ((address >> self.slot_shift) as usize) & (self.blocks_per_pool() - 1)
    }

    /// Whether `address` starts a new pool-aligned region
    #[inline(always)]
    pub const fn boundary(&self, address: u64) -> bool {
        address & ((1 << self.pool_shift) - 1) == 0
    }
}

/// Two-level block index plus its code arena
#[derive(Debug)]
pub struct BlockCache {
    geometry: Geometry,
    pools: HashMap<u64, Pool>,
    allocator: BumpAllocator,
    threshold: usize,
    flushes: u64,
}

impl BlockCache {
    /// Create a cache with a code arena of `capacity` bytes
    ///
    /// The arena is flushed once fewer than `threshold` bytes remain, so
    /// `threshold` must exceed the largest block the caller emits.
    pub fn new(geometry: Geometry, capacity: usize, threshold: usize) -> Self {
        Self {
            geometry,
            pools: HashMap::new(),
            allocator: BumpAllocator::new(capacity),
            threshold: threshold.min(capacity),
            flushes: 0,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Number of wholesale flushes since creation
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Number of cached blocks
    pub fn len(&self) -> usize {
        self.pools
            .values()
            .map(|pool| pool.blocks.iter().filter(|b| b.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn available(&self) -> usize {
        self.allocator.available()
    }

    /// Cached block for `address` translated under `state`
    pub fn lookup(&self, address: u64, state: u32) -> Option<&Block> {
        let pool = self.pools.get(&self.geometry.pool(address))?;
        pool.blocks[self.geometry.slot(address)]
            .as_ref()
            .filter(|block| block.address == address && block.state == state)
    }

    /// Flush the whole cache if the arena is running low
    ///
    /// Called before translating so that no block handle obtained for the
    /// current dispatch is invalidated by the insert that follows.
    pub fn reserve(&mut self) {
        if self.allocator.available() < self.threshold {
            self.flush();
            log::info!("Recompiler: code buffer exhausted, allocator flush");
        }
    }

    /// Store a translated block
    ///
    /// Returns `None` when the code does not fit even in an empty arena.
    pub fn insert(
        &mut self,
        address: u64,
        state: u32,
        length: u32,
        branch_exit: bool,
        code: &[u8],
    ) -> Option<Block> {
        let range = match self.allocator.store(code) {
            Some(range) => range,
            None => {
                self.flush();
                self.allocator.store(code)?
            }
        };
        let block = Block {
            address,
            state,
            length,
            branch_exit,
            code: range,
        };
        let blocks_per_pool = self.geometry.blocks_per_pool();
        let pool = self
            .pools
            .entry(self.geometry.pool(address))
            .or_insert_with(|| Pool {
                blocks: vec![None; blocks_per_pool],
            });
        pool.blocks[self.geometry.slot(address)] = Some(block.clone());
        Some(block)
    }

    /// Code bytes of `block`
    pub fn code(&self, block: &Block) -> &[u8] {
        self.allocator.get(block.code.clone())
    }

    /// Drop every block in the pool containing `address`
    ///
    /// Returns whether the pool held any blocks.
    pub fn invalidate(&mut self, address: u64) -> bool {
        self.pools.remove(&self.geometry.pool(address)).is_some()
    }

    /// Drop every block whose pool overlaps `range`
    pub fn invalidate_range(&mut self, range: Range<u64>) {
        let first = self.geometry.pool(range.start);
        let last = self.geometry.pool(range.end.saturating_sub(1).max(range.start));
        self.pools.retain(|&pool, _| pool < first || pool > last);
    }

    /// Drop every block and release the whole arena
    pub fn flush(&mut self) {
        self.pools.clear();
        self.allocator.reset();
        self.flushes += 1;
    }
}

/// Processor side of block execution
///
/// Implemented by each processor with the same methods its interpreter
/// step uses.
pub trait BlockTarget {
    /// Execute the semantic routine for `opcode` on `word`
    fn call(&mut self, bus: &mut dyn Bus, opcode: u16, word: u32);

    /// Instruction fetch side effects for `address`; `true` means a fault
    /// was raised and the block must be left
    fn fetch(&mut self, bus: &mut dyn Bus, address: u64) -> bool;

    /// Charge cycles
    fn step(&mut self, cycles: u32);

    /// Per-instruction epilogue; `true` means leave the block
    fn epilogue(&mut self) -> bool;
}

/// Replay `code` against `target`
///
/// Returns the number of guest instructions executed.
pub fn execute<T: BlockTarget + ?Sized>(target: &mut T, bus: &mut dyn Bus, code: &[u8]) -> u32 {
    let mut reader = Reader::new(code);
    let mut instructions = 0;
    while let Some(op) = reader.next() {
        match op {
            Op::Call { opcode, word } => {
                target.call(bus, opcode, word);
                instructions += 1;
            }
            Op::Fetch { address, exit } => {
                if target.fetch(bus, address) {
                    reader.seek(exit);
                }
            }
            Op::Step { cycles } => target.step(cycles),
            Op::Epilogue { exit } => {
                if target.epilogue() {
                    reader.seek(exit);
                }
            }
            Op::Exit => break,
        }
    }
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::{Endian, Ram};

    const GEOMETRY: Geometry = Geometry {
        pool_shift: 8,
        slot_shift: 2,
    };

    #[test]
    fn test_geometry() {
        assert_eq!(GEOMETRY.blocks_per_pool(), 64);
        assert_eq!(GEOMETRY.pool(0x8000_0104), 0x80_0001);
        assert_eq!(GEOMETRY.slot(0x8000_0104), 1);
        assert!(GEOMETRY.boundary(0x8000_0200));
        assert!(!GEOMETRY.boundary(0x8000_0204));
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = BlockCache::new(GEOMETRY, 1024, 64);
        let block = cache.insert(0x100, 3, 8, true, &[5]).unwrap();
        assert_eq!(cache.lookup(0x100, 3), Some(&block));
        assert_eq!(cache.lookup(0x100, 2), None);
        assert_eq!(cache.lookup(0x104, 3), None);
        assert_eq!(cache.code(&block), &[5]);
    }

    #[test]
    fn test_invalidate_drops_pool() {
        let mut cache = BlockCache::new(GEOMETRY, 1024, 64);
        cache.insert(0x100, 0, 4, false, &[5]);
        cache.insert(0x1F0, 0, 4, false, &[5]);
        cache.insert(0x200, 0, 4, false, &[5]);
        cache.invalidate(0x1FC);
        assert_eq!(cache.lookup(0x100, 0), None);
        assert_eq!(cache.lookup(0x1F0, 0), None);
        assert!(cache.lookup(0x200, 0).is_some());
    }

    #[test]
    fn test_invalidate_range() {
        let mut cache = BlockCache::new(GEOMETRY, 1024, 64);
        cache.insert(0x000, 0, 4, false, &[5]);
        cache.insert(0x100, 0, 4, false, &[5]);
        cache.insert(0x300, 0, 4, false, &[5]);
        cache.invalidate_range(0x0F0..0x110);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(0x300, 0).is_some());
    }

    #[test]
    fn test_reserve_flushes_when_low() {
        let mut cache = BlockCache::new(GEOMETRY, 64, 16);
        cache.insert(0x100, 0, 4, false, &[5; 50]);
        cache.reserve();
        assert_eq!(cache.flushes(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.available(), 64);
    }

    #[test]
    fn test_insert_flushes_when_full() {
        let mut cache = BlockCache::new(GEOMETRY, 64, 0);
        cache.insert(0x100, 0, 4, false, &[5; 40]);
        let block = cache.insert(0x200, 0, 4, false, &[6; 40]).unwrap();
        assert_eq!(cache.flushes(), 1);
        assert_eq!(cache.lookup(0x100, 0), None);
        assert_eq!(cache.code(&block), &[6; 40][..]);
        assert!(cache.insert(0x300, 0, 4, false, &[0; 65]).is_none());
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(u16, u32)>,
        cycles: u32,
        leave_after: usize,
        fault_fetch: bool,
    }

    impl BlockTarget for Recorder {
        fn call(&mut self, _bus: &mut dyn Bus, opcode: u16, word: u32) {
            self.calls.push((opcode, word));
        }
        fn fetch(&mut self, _bus: &mut dyn Bus, _address: u64) -> bool {
            self.fault_fetch
        }
        fn step(&mut self, cycles: u32) {
            self.cycles += cycles;
        }
        fn epilogue(&mut self) -> bool {
            self.calls.len() >= self.leave_after
        }
    }

    fn three_instruction_block() -> Vec<u8> {
        let mut emitter = Emitter::new();
        let exit = emitter.label();
        emitter.fetch(0, exit);
        for i in 0..3 {
            emitter.call(i, i as u32);
            emitter.step(2);
            emitter.epilogue(exit);
        }
        emitter.bind(exit);
        emitter.exit();
        emitter.finish().unwrap()
    }

    #[test]
    fn test_execute_runs_to_exit() {
        let code = three_instruction_block();
        let mut bus = Ram::new(16, Endian::Little);
        let mut target = Recorder {
            leave_after: usize::MAX,
            ..Default::default()
        };
        assert_eq!(execute(&mut target, &mut bus, &code), 3);
        assert_eq!(target.calls, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(target.cycles, 6);
    }

    #[test]
    fn test_epilogue_leaves_early() {
        let code = three_instruction_block();
        let mut bus = Ram::new(16, Endian::Little);
        let mut target = Recorder {
            leave_after: 1,
            ..Default::default()
        };
        assert_eq!(execute(&mut target, &mut bus, &code), 1);
        assert_eq!(target.cycles, 2);
    }

    #[test]
    fn test_fetch_fault_leaves_before_call() {
        let code = three_instruction_block();
        let mut bus = Ram::new(16, Endian::Little);
        let mut target = Recorder {
            leave_after: usize::MAX,
            fault_fetch: true,
            ..Default::default()
        };
        assert_eq!(execute(&mut target, &mut bus, &code), 0);
        assert!(target.calls.is_empty());
    }
}
