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

//! Data cache: 8 KiB, direct mapped, 512 lines of 16 bytes, write-back
//!
//! Lines hold bytes in memory order (big-endian). A miss writes the victim
//! back if it is dirty, then fills; stores allocate and mark the line dirty.

use crate::core::bus::{Bus, Size};
use crate::core::error::Result;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub const LINES: usize = 512;
pub const LINE_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct DCacheLine {
    pub valid: bool,
    pub dirty: bool,
    /// Physical address bits 31:12
    pub tag: u32,
    pub data: [u8; 16],
}

impl DCacheLine {
    #[inline(always)]
    pub fn hit(&self, physical: u32) -> bool {
        self.valid && self.tag == physical & !0xFFF
    }

    fn get(&self, size: Size, physical: u32) -> u64 {
        let offset = (physical & (LINE_SIZE - 1)) as usize;
        self.data[offset..offset + size.bytes() as usize]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }

    fn set(&mut self, size: Size, physical: u32, value: u64) {
        let offset = (physical & (LINE_SIZE - 1)) as usize;
        let count = size.bytes() as usize;
        for (i, byte) in self.data[offset..offset + count].iter_mut().enumerate() {
            *byte = (value >> ((count - 1 - i) * 8)) as u8;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DCache {
    lines: Vec<DCacheLine>,
}

impl DCache {
    pub fn new() -> Self {
        Self {
            lines: vec![DCacheLine::default(); LINES],
        }
    }

    #[inline(always)]
    fn index(address: u32) -> usize {
        ((address >> 4) as usize) & (LINES - 1)
    }

    pub fn line(&self, address: u32) -> &DCacheLine {
        &self.lines[Self::index(address)]
    }

    pub fn line_mut(&mut self, address: u32) -> &mut DCacheLine {
        &mut self.lines[Self::index(address)]
    }

    /// Load `size` bytes at `physical`
    ///
    /// Returns the value and the cycles spent on writeback and fill.
    pub fn read(&mut self, bus: &mut dyn Bus, size: Size, physical: u32) -> Result<(u64, u32)> {
        let cycles = self.ensure(bus, physical)?;
        Ok((self.line(physical).get(size, physical), cycles))
    }

    /// Store `size` bytes at `physical`, allocating the line
    pub fn write(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        physical: u32,
        value: u64,
    ) -> Result<u32> {
        let cycles = self.ensure(bus, physical)?;
        let line = self.line_mut(physical);
        line.set(size, physical, value);
        line.dirty = true;
        Ok(cycles)
    }

    /// Make the line for `physical` resident
    fn ensure(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<u32> {
        if self.line(physical).hit(physical) {
            return Ok(0);
        }
        let mut cycles = 0;
        let line = *self.line(physical);
        if line.valid && line.dirty {
            cycles += self.write_back(bus, physical)?;
        }
        cycles += self.fill(bus, physical)?;
        Ok(cycles)
    }

    fn fill(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<u32> {
        let base = physical & !(LINE_SIZE - 1);
        let mut data = [0u8; 16];
        for (i, chunk) in data.chunks_exact_mut(4).enumerate() {
            let word = bus.read(Size::Word, base + (i as u32) * 4)? as u32;
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        let line = self.line_mut(physical);
        line.data = data;
        line.tag = physical & !0xFFF;
        line.valid = true;
        line.dirty = false;
        Ok(bus.timing(base).burst(LINE_SIZE))
    }

    /// Write the line at `address`'s index back to memory and mark it clean
    pub fn write_back(&mut self, bus: &mut dyn Bus, address: u32) -> Result<u32> {
        let index = Self::index(address);
        let line = &self.lines[index];
        let base = line.tag | (index as u32) << 4;
        for (i, chunk) in line.data.chunks_exact(4).enumerate() {
            let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            bus.write(Size::Word, base + (i as u32) * 4, word as u64)?;
        }
        self.lines[index].dirty = false;
        log::trace!("VR4300: dcache writeback 0x{:08X}", base);
        Ok(bus.timing(base).burst(LINE_SIZE))
    }

    /// Cached value at `physical`, without filling
    pub fn peek(&self, size: Size, physical: u32) -> Option<u64> {
        let line = self.line(physical);
        line.hit(physical).then(|| line.get(size, physical))
    }

    /// CACHE create dirty exclusive: claim the line without reading memory
    pub fn create_dirty(&mut self, bus: &mut dyn Bus, physical: u32) -> Result<u32> {
        let line = *self.line(physical);
        let mut cycles = 0;
        if !line.hit(physical) && line.valid && line.dirty {
            cycles = self.write_back(bus, physical)?;
        }
        let line = self.line_mut(physical);
        line.tag = physical & !0xFFF;
        line.valid = true;
        line.dirty = true;
        Ok(cycles)
    }
}

impl Default for DCache {
    fn default() -> Self {
        Self::new()
    }
}
