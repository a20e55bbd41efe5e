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
//! Instruction cache: 4 KiB, direct mapped, 256 lines of four words
//!
//! Filled a whole line at a time on a miss. While the data side is
//! isolated (SR.IsC), stores invalidate lines instead of reaching memory.

use crate::core::bus::{Bus, Size};
use crate::core::error::Result;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub const LINES: usize = 256;
pub const LINE_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ICacheLine {
    pub valid: bool,
    /// Physical address bits 31:12
    pub tag: u32,
    pub words: [u32; 4],
}

impl ICacheLine {
    #[inline(always)]
    pub fn hit(&self, physical: u32) -> bool {
        self.valid && self.tag == physical & !0xFFF
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ICache {
    lines: Vec<ICacheLine>,
}

impl ICache {
    pub fn new() -> Self {
        Self {
            lines: vec![ICacheLine::default(); LINES],
        }
    }

    #[inline(always)]
    fn index(address: u32) -> usize {
        ((address >> 4) as usize) & (LINES - 1)
    }

    #[inline(always)]
    fn word(address: u32) -> usize {
        ((address >> 2) & 3) as usize
    }

    pub fn line(&self, address: u32) -> &ICacheLine {
        &self.lines[Self::index(address)]
    }

    /// Fetch the word at `physical`, filling the line on a miss
    ///
    /// Returns the word and the cycles spent on the fill.
    pub fn fetch(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<(u32, u32)> {
        let mut cycles = 0;
        if !self.line(physical).hit(physical) {
            let base = physical & !(LINE_SIZE - 1);
            let mut words = [0u32; 4];
            for (i, word) in words.iter_mut().enumerate() {
                *word = bus.read(Size::Word, base + (i as u32) * 4)? as u32;
            }
            let line = &mut self.lines[Self::index(physical)];
            line.words = words;
            line.tag = physical & !0xFFF;
            line.valid = true;
            cycles = bus.timing(base).burst(LINE_SIZE);
        }
        Ok((self.line(physical).words[Self::word(physical)], cycles))
    }

    /// Cached word at `physical`, without filling
    pub fn peek(&self, physical: u32) -> Option<u32> {
        let line = self.line(physical);
        line.hit(physical).then(|| line.words[Self::word(physical)])
    }

    /// Isolated load: the data word at the line index, whatever the tag
    pub fn read(&self, address: u32) -> u32 {
        self.line(address).words[Self::word(address)]
    }

    /// Isolated store: drop the line at `address`'s index
    pub fn invalidate(&mut self, address: u32) {
        self.lines[Self::index(address)].valid = false;
    }

    pub fn invalidate_all(&mut self) {
        for line in &mut self.lines {
            line.valid = false;
        }
    }
}

impl Default for ICache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::{Endian, Ram};

    #[test]
    fn test_line_fill() {
        let mut ram = Ram::new(0x2000, Endian::Little);
        ram.load_words(0x40, &[10, 11, 12, 13]).unwrap();
        let mut cache = ICache::new();

        let (word, cycles) = cache.fetch(&mut ram, 0x44).unwrap();
        assert_eq!(word, 11);
        assert_eq!(cycles, 4 * Ram::DEFAULT_LATENCY);

        let (word, cycles) = cache.fetch(&mut ram, 0x4C).unwrap();
        assert_eq!(word, 13);
        assert_eq!(cycles, 0);
    }

    #[test]
    fn test_aliasing_lines_evict() {
        let mut ram = Ram::new(0x2000, Endian::Little);
        ram.load_words(0x1040, &[7]).unwrap();
        let mut cache = ICache::new();
        cache.fetch(&mut ram, 0x40).unwrap();
        assert_eq!(cache.peek(0x40), Some(0));
        cache.fetch(&mut ram, 0x1040).unwrap();
        assert_eq!(cache.peek(0x40), None);
        assert_eq!(cache.peek(0x1040), Some(7));
    }

    #[test]
    fn test_invalidate() {
        let mut ram = Ram::new(0x1000, Endian::Little);
        let mut cache = ICache::new();
        cache.fetch(&mut ram, 0x100).unwrap();
        cache.invalidate(0x8000_0108);
        assert_eq!(cache.peek(0x100), None);
    }
}
