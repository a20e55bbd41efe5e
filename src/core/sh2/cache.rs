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
//! SH7604 on-chip cache
//!
//! 4 KiB unified, 4-way set associative: 64 entries of four 16-byte lines.
//! Writes go through to memory and update a resident line without
//! allocating. Replacement follows a 6-bit pseudo-LRU code per entry.
//!
//! In two-way mode ways 2 and 3 keep caching while ways 0 and 1 are left
//! to software as 2 KiB of RAM through the data array.

use crate::core::bus::{Bus, Size};
use crate::core::error::Result;
use bincode::{Decode, Encode};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const WAYS: usize = 4;
pub const ENTRIES: usize = 64;
pub const LINE_SIZE: u32 = 16;

/// Tag bit marking a line invalid
const INVALID: u32 = 1 << 19;
const TAG_MASK: u32 = 0x7FFFF;

bitflags! {
    /// Cache control register (CCR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Ccr: u8 {
        /// Cache enable
        const CE = 1 << 0;
        /// Instruction replacement disable
        const ID = 1 << 1;
        /// Data replacement disable
        const OD = 1 << 2;
        /// Two-way mode
        const TW = 1 << 3;
        /// Purge every line; write-only
        const CP = 1 << 4;
        /// Way selected by the address array
        const W = 3 << 6;
    }
}

/// Way replaced on a miss, indexed by LRU code
const LRU_SELECT: [u8; 64] = {
    let mut t = [3u8; 64];
    let mut n = 0;
    while n < 64 {
        t[n] = if n & 0x38 == 0x38 {
            0
        } else if n & 0x26 == 0x06 {
            1
        } else if n & 0x15 == 0x01 {
            2
        } else {
            3
        };
        n += 1;
    }
    t
};

/// LRU code after an access to each way
const LRU_UPDATE: [[u8; 64]; WAYS] = {
    let mut t = [[0u8; 64]; WAYS];
    let mut n = 0;
    while n < 64 {
        let code = n as u8;
        t[0][n] = code & !0x38;
        t[1][n] = (code | 0x20) & !0x06;
        t[2][n] = (code | 0x14) & !0x01;
        t[3][n] = code | 0x0B;
        n += 1;
    }
    t
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Cache {
    /// LRU code per entry
    lrus: Vec<u8>,
    /// Tag (address bits 28:10) per line, plus [`INVALID`]; index is
    /// `way << 6 | entry`
    tags: Vec<u32>,
    lines: Vec<[u8; LINE_SIZE as usize]>,
    #[bincode(with_serde)]
    control: Ccr,
}

impl Cache {
    pub fn new() -> Self {
        Self {
            lrus: vec![0; ENTRIES],
            tags: vec![INVALID; WAYS * ENTRIES],
            lines: vec![[0; LINE_SIZE as usize]; WAYS * ENTRIES],
            control: Ccr::empty(),
        }
    }

    #[inline(always)]
    fn entry(address: u32) -> usize {
        (address >> 4) as usize & (ENTRIES - 1)
    }

    #[inline(always)]
    fn tag(address: u32) -> u32 {
        (address >> 10) & TAG_MASK
    }

    pub fn enabled(&self) -> bool {
        self.control.contains(Ccr::CE)
    }

    /// First way used for caching
    fn first_way(&self) -> usize {
        if self.control.contains(Ccr::TW) {
            2
        } else {
            0
        }
    }

    fn lookup(&self, address: u32) -> Option<usize> {
        let entry = Self::entry(address);
        let tag = Self::tag(address);
        (self.first_way()..WAYS)
            .rev()
            .find(|&way| self.tags[way << 6 | entry] == tag)
    }

    fn touch(&mut self, entry: usize, way: usize) {
        self.lrus[entry] = LRU_UPDATE[way][self.lrus[entry] as usize & 63];
    }

    fn extract(line: &[u8; LINE_SIZE as usize], size: Size, address: u32) -> u32 {
        let offset = (address & (LINE_SIZE - 1) & !(size.bytes() - 1)) as usize;
        line[offset..offset + size.bytes() as usize]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32)
    }

    fn insert(line: &mut [u8; LINE_SIZE as usize], size: Size, address: u32, value: u32) {
        let count = size.bytes() as usize;
        let offset = (address & (LINE_SIZE - 1) & !(size.bytes() - 1)) as usize;
        for (i, byte) in line[offset..offset + count].iter_mut().enumerate() {
            *byte = (value >> (8 * (count - 1 - i))) as u8;
        }
    }

    /// Cached read of `size` bytes at `physical`
    ///
    /// `code` selects which replacement disable bit applies to a miss.
    /// Returns the value and the cycles spent on a fill or uncached access.
    pub fn read(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        physical: u32,
        code: bool,
    ) -> Result<(u32, u32)> {
        let entry = Self::entry(physical);
        if let Some(way) = self.lookup(physical) {
            self.touch(entry, way);
            return Ok((Self::extract(&self.lines[way << 6 | entry], size, physical), 0));
        }

        let disabled = if code { Ccr::ID } else { Ccr::OD };
        if self.control.contains(disabled) {
            let cycles = bus.timing(physical).cycles;
            return Ok((bus.read(size, physical)? as u32, cycles));
        }

        let base = physical & !(LINE_SIZE - 1);
        let mut line = [0u8; LINE_SIZE as usize];
        for (i, chunk) in line.chunks_exact_mut(4).enumerate() {
            let word = bus.read(Size::Word, base + i as u32 * 4)? as u32;
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        let select = LRU_SELECT[self.lrus[entry] as usize & 63] as usize;
        let way = select | self.first_way();
        self.tags[way << 6 | entry] = Self::tag(physical);
        self.lines[way << 6 | entry] = line;
        self.touch(entry, way);
        log::trace!("SH-2: cache fill 0x{:08X} way {}", base, way);
        Ok((Self::extract(&line, size, physical), bus.timing(base).burst(LINE_SIZE)))
    }

    /// Write-through side: update the line holding `physical`, if any
    pub fn write(&mut self, size: Size, physical: u32, value: u32) {
        let entry = Self::entry(physical);
        if let Some(way) = self.lookup(physical) {
            self.touch(entry, way);
            Self::insert(&mut self.lines[way << 6 | entry], size, physical, value);
        }
    }

    /// Resident value at `physical`, without touching LRU state
    pub fn peek(&self, size: Size, physical: u32) -> Option<u32> {
        let way = self.lookup(physical)?;
        Some(Self::extract(
            &self.lines[way << 6 | Self::entry(physical)],
            size,
            physical,
        ))
    }

    /// Associative purge: invalidate every way holding `physical`
    pub fn purge(&mut self, physical: u32) {
        let entry = Self::entry(physical);
        let tag = Self::tag(physical);
        for way in 0..WAYS {
            if self.tags[way << 6 | entry] == tag {
                self.tags[way << 6 | entry] |= INVALID;
            }
        }
    }

    /// Invalidate ways `0..ways` and reset every LRU code
    pub fn purge_ways(&mut self, ways: usize) {
        self.lrus.fill(0);
        for tag in &mut self.tags[..ways.min(WAYS) * ENTRIES] {
            *tag |= INVALID;
        }
    }

    /// Address array read: tag in bits 28:10, LRU code in 9:4, valid in 2
    pub fn read_address(&self, address: u32) -> u32 {
        let entry = Self::entry(address);
        let way = self.control.bits() as usize >> 6;
        let tag = self.tags[way << 6 | entry];
        let valid = tag & INVALID == 0;
        (tag & TAG_MASK) << 10 | (self.lrus[entry] as u32) << 4 | (valid as u32) << 2
    }

    /// Address array write: tag and valid bit come from the address, the
    /// LRU code from the data
    pub fn write_address(&mut self, address: u32, data: u32) {
        let entry = Self::entry(address);
        let way = self.control.bits() as usize >> 6;
        let invalid = if address & 4 == 0 { INVALID } else { 0 };
        self.lrus[entry] = (data >> 4) as u8 & 63;
        self.tags[way << 6 | entry] = Self::tag(address) | invalid;
    }

    /// Data array read; address bits 11:4 pick the line
    pub fn read_data(&self, size: Size, address: u32) -> u32 {
        Self::extract(&self.lines[(address >> 4) as usize & 0xFF], size, address)
    }

    pub fn write_data(&mut self, size: Size, address: u32, value: u32) {
        Self::insert(&mut self.lines[(address >> 4) as usize & 0xFF], size, address, value);
    }

    /// CCR as read by software; CP always reads zero
    pub fn control(&self) -> Ccr {
        self.control
    }

    pub fn set_control(&mut self, value: u8) {
        let control = Ccr::from_bits_truncate(value);
        self.control = control - Ccr::CP;
        if control.contains(Ccr::TW) {
            self.purge_ways(2);
        }
        if control.contains(Ccr::CP) {
            self.purge_ways(WAYS);
        }
        log::trace!("SH-2: CCR = 0x{:02X}", self.control.bits());
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
