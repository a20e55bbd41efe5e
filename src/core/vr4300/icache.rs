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

//! Instruction cache: 16 KiB, direct mapped, 512 lines of 32 bytes

use crate::core::bus::{Bus, Size};
use crate::core::error::Result;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub const LINES: usize = 512;
pub const LINE_SIZE: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ICacheLine {
    pub valid: bool,
    /// Physical address bits 31:12
    pub tag: u32,
    pub words: [u32; 8],
}

impl ICacheLine {
    #[inline(always)]
    pub fn hit(&self, physical: u32) -> bool {
        self.valid && self.tag == physical & !0xFFF
    }

    fn base(&self, index: usize) -> u32 {
        self.tag | (index as u32) << 5
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
        ((address >> 5) as usize) & (LINES - 1)
    }

    pub fn line(&self, address: u32) -> &ICacheLine {
        &self.lines[Self::index(address)]
    }

    pub fn line_mut(&mut self, address: u32) -> &mut ICacheLine {
        &mut self.lines[Self::index(address)]
    }

    /// Fetch the word at `physical`, filling the line on a miss
    ///
    /// Returns the word and the cycles spent.
    pub fn fetch(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<(u32, u32)> {
        let mut cycles = 0;
        if !self.line(physical).hit(physical) {
            cycles = self.fill(bus, physical)?;
        }
        let line = self.line(physical);
        Ok((line.words[((physical >> 2) & 7) as usize], cycles))
    }

    /// Load the line containing `physical` from memory
    pub fn fill(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<u32> {
        let base = physical & !(LINE_SIZE - 1);
        let mut words = [0u32; 8];
        for (i, word) in words.iter_mut().enumerate() {
            *word = bus.read(Size::Word, base + (i as u32) * 4)? as u32;
        }
        let line = self.line_mut(physical);
        line.words = words;
        line.tag = physical & !0xFFF;
        line.valid = true;
        Ok(bus.timing(base).burst(LINE_SIZE))
    }

    /// Write the line at `physical`'s index back to memory
    pub fn write_back(&self, bus: &mut dyn Bus, physical: u32) -> Result<u32> {
        let index = Self::index(physical);
        let line = &self.lines[index];
        let base = line.base(index);
        for (i, word) in line.words.iter().enumerate() {
            bus.write(Size::Word, base + (i as u32) * 4, *word as u64)?;
        }
        Ok(bus.timing(base).burst(LINE_SIZE))
    }

    /// Cached word at `physical`, without filling
    pub fn peek(&self, physical: u32) -> Option<u32> {
        let line = self.line(physical);
        line.hit(physical)
            .then(|| line.words[((physical >> 2) & 7) as usize])
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
    fn test_miss_fills_then_hits() {
        let mut ram = Ram::new(0x4000, Endian::Big);
        ram.load_words(0x100, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let mut cache = ICache::new();

        let (word, cycles) = cache.fetch(&mut ram, 0x104).unwrap();
        assert_eq!(word, 2);
        assert_eq!(cycles, 8 * Ram::DEFAULT_LATENCY);

        let (word, cycles) = cache.fetch(&mut ram, 0x11C).unwrap();
        assert_eq!(word, 8);
        assert_eq!(cycles, 0);
    }

    #[test]
    fn test_peek_does_not_fill() {
        let mut ram = Ram::new(0x4000, Endian::Big);
        let mut cache = ICache::new();
        assert_eq!(cache.peek(0x200), None);
        cache.fetch(&mut ram, 0x200).unwrap();
        assert_eq!(cache.peek(0x200), Some(0));
        assert_eq!(cache.peek(0x1200), None);
    }

    #[test]
    fn test_bus_error_leaves_line_invalid() {
        let mut ram = Ram::new(0x100, Endian::Big);
        let mut cache = ICache::new();
        assert!(cache.fetch(&mut ram, 0x1000).is_err());
        assert!(!cache.line(0x1000).valid);
    }
}
