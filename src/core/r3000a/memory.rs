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
//! Memory access path
//!
//! ```text
//! 0000_0000 kuseg  cached     (user and kernel; 2000_0000-7FFF_FFFF unmapped)
//! 8000_0000 kseg0  cached     (kernel)
//! A000_0000 kseg1  uncached   (kernel)
//! C000_0000 kseg2             (kernel; only the cache control register)
//! ```
//!
//! Physical addresses are the low 29 bits. The 1 KiB scratchpad answers at
//! 1F80_0000 through the cached segments. Every helper that can fault raises
//! the exception itself and returns `None`.

use super::breakpoint::DataAccess;
use super::exception::{Exception, ExceptionCode};
use super::R3000a;
use crate::core::bus::{Bus, Size};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Cache control register address
pub const CACHE_CONTROL: u32 = 0xFFFE_0130;

pub const SCRATCHPAD_BASE: u32 = 0x1F80_0000;
pub const SCRATCHPAD_SIZE: usize = 1024;

bitflags! {
    /// Cache control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CacheControl: u32 {
        /// Isolated accesses reach the instruction cache
        const TAG_TEST = 1 << 2;
        /// Both scratchpad enable bits
        const SCRATCHPAD = (1 << 3) | (1 << 7);
        const CODE = 1 << 11;
    }
}

/// Route of a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// kuseg or kseg0
    Cached(u32),
    /// kseg1
    Uncached(u32),
    /// The cache control register
    Control,
    /// Nothing answers; bus error
    Unmapped,
}

/// Segment lookup; privilege is checked separately
pub const fn segment(vaddr: u32) -> Segment {
    let physical = vaddr & 0x1FFF_FFFF;
    match vaddr >> 29 {
        0 | 4 => Segment::Cached(physical),
        5 => Segment::Uncached(physical),
        _ if vaddr == CACHE_CONTROL => Segment::Control,
        _ => Segment::Unmapped,
    }
}

impl R3000a {
    /// User mode may only touch the low half of the address space
    #[inline(always)]
    pub(super) fn privileged(&self, vaddr: u32) -> bool {
        vaddr >= 0x8000_0000 && self.cop0.status.user_mode()
    }

    fn scratchpad_offset(&self, physical: u32) -> Option<usize> {
        let offset = physical.wrapping_sub(SCRATCHPAD_BASE) as usize;
        (offset < SCRATCHPAD_SIZE && self.cache_control.contains(CacheControl::SCRATCHPAD))
            .then_some(offset)
    }

    fn scratchpad_read(&self, size: Size, offset: usize) -> u32 {
        let mut value = 0u32;
        for i in (0..size.bytes() as usize).rev() {
            value = (value << 8) | self.scratchpad[(offset + i) % SCRATCHPAD_SIZE] as u32;
        }
        value
    }

    fn scratchpad_write(&mut self, size: Size, offset: usize, value: u32) {
        for i in 0..size.bytes() as usize {
            self.scratchpad[(offset + i) % SCRATCHPAD_SIZE] = (value >> (8 * i)) as u8;
        }
    }

    /// Fetch the instruction word at the program counter
    pub(super) fn fetch_instruction(&mut self, bus: &mut dyn Bus) -> Option<u32> {
        let vaddr = self.pc;
        if vaddr & 3 != 0 || self.privileged(vaddr) {
            self.raise_address(ExceptionCode::AddressLoad, vaddr);
            return None;
        }
        let result = match segment(vaddr) {
            Segment::Cached(physical) if self.cache_control.contains(CacheControl::CODE) => {
                self.icache.fetch(bus, physical).ok()
            }
            Segment::Cached(physical) | Segment::Uncached(physical) => {
                let cycles = bus.timing(physical).cycles;
                bus.read(Size::Word, physical)
                    .ok()
                    .map(|word| (word as u32, cycles))
            }
            Segment::Control | Segment::Unmapped => None,
        };
        match result {
            Some((word, cycles)) => {
                self.charge(cycles);
                Some(word)
            }
            None => {
                self.raise(Exception::new(ExceptionCode::InstructionBus));
                None
            }
        }
    }

    /// Load `size` bytes from `vaddr`, zero-extended
    pub(super) fn read(&mut self, bus: &mut dyn Bus, size: Size, vaddr: u32) -> Option<u32> {
        if self.data_breakpoint(vaddr, DataAccess::Read) {
            return None;
        }
        if !size.aligned(vaddr as u64) || self.privileged(vaddr) {
            self.raise_address(ExceptionCode::AddressLoad, vaddr);
            return None;
        }
        let physical = match segment(vaddr) {
            Segment::Control => return Some(self.cache_control.bits()),
            Segment::Unmapped => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                return None;
            }
            Segment::Cached(physical) => {
                if self.cop0.status.isolate_cache() {
                    return Some(self.isolated_read(size, physical));
                }
                if let Some(offset) = self.scratchpad_offset(physical) {
                    return Some(self.scratchpad_read(size, offset));
                }
                physical
            }
            Segment::Uncached(physical) => physical,
        };
        let cycles = bus.timing(physical).cycles;
        match bus.read(size, physical) {
            Ok(value) => {
                self.charge(cycles);
                Some(value as u32)
            }
            Err(_) => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                None
            }
        }
    }

    /// Store the low `size` bytes of `value` at `vaddr`
    ///
    /// Stores that reach the bus drop the recompiled blocks covering the
    /// written address.
    pub(super) fn write(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        vaddr: u32,
        value: u32,
    ) -> Option<()> {
        if self.data_breakpoint(vaddr, DataAccess::Write) {
            return None;
        }
        if !size.aligned(vaddr as u64) || self.privileged(vaddr) {
            self.raise_address(ExceptionCode::AddressStore, vaddr);
            return None;
        }
        let value = value & size.mask() as u32;
        let physical = match segment(vaddr) {
            Segment::Control => {
                self.cache_control = CacheControl::from_bits_retain(value);
                log::trace!("R3000A: cache control = 0x{:08X}", value);
                // Fetch timing and scratchpad mapping change under the block
                self.code_written = true;
                return Some(());
            }
            Segment::Unmapped => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                return None;
            }
            Segment::Cached(physical) => {
                if self.cop0.status.isolate_cache() {
                    self.isolated_write(size, physical, value);
                    return Some(());
                }
                if let Some(offset) = self.scratchpad_offset(physical) {
                    self.scratchpad_write(size, offset, value);
                    return Some(());
                }
                physical
            }
            Segment::Uncached(physical) => physical,
        };
        let cycles = bus.timing(physical).cycles;
        match bus.write(size, physical, value as u64) {
            Ok(()) => {
                self.charge(cycles);
                self.invalidate_code(physical);
                Some(())
            }
            Err(_) => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                None
            }
        }
    }

    /// Load while SR.IsC cuts the data path off from memory
    fn isolated_read(&self, size: Size, physical: u32) -> u32 {
        let control = self.cache_control;
        if control.contains(CacheControl::TAG_TEST | CacheControl::CODE) {
            self.icache.read(physical)
        } else if !control.contains(CacheControl::TAG_TEST) {
            match self.scratchpad_offset(physical & 0x3FF | SCRATCHPAD_BASE) {
                Some(offset) => self.scratchpad_read(size, offset),
                None => 0,
            }
        } else {
            0
        }
    }

    /// Store while SR.IsC is set: invalidates the instruction cache line
    fn isolated_write(&mut self, size: Size, physical: u32, value: u32) {
        let control = self.cache_control;
        if control.contains(CacheControl::TAG_TEST | CacheControl::CODE) {
            log::trace!("R3000A: icache invalidate 0x{:08X}", physical);
            self.icache.invalidate(physical);
        } else if !control.contains(CacheControl::TAG_TEST) {
            if let Some(offset) = self.scratchpad_offset(physical & 0x3FF | SCRATCHPAD_BASE) {
                self.scratchpad_write(size, offset, value);
            }
        }
    }

    /// Debugger read: no exceptions, breakpoints or cycle cost
    pub fn peek(&self, bus: &mut dyn Bus, size: Size, vaddr: u32) -> Option<u32> {
        match segment(vaddr) {
            Segment::Control => Some(self.cache_control.bits()),
            Segment::Cached(physical) => match self.scratchpad_offset(physical) {
                Some(offset) => Some(self.scratchpad_read(size, offset)),
                None => bus.read(size, physical).ok().map(|v| v as u32),
            },
            Segment::Uncached(physical) => bus.read(size, physical).ok().map(|v| v as u32),
            Segment::Unmapped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(segment(0x0000_1000), Segment::Cached(0x1000));
        assert_eq!(segment(0x8000_1000), Segment::Cached(0x1000));
        assert_eq!(segment(0xA000_1000), Segment::Uncached(0x1000));
        assert_eq!(segment(0xBFC0_0000), Segment::Uncached(0x1FC0_0000));
        assert_eq!(segment(CACHE_CONTROL), Segment::Control);
        assert_eq!(segment(0xC000_0000), Segment::Unmapped);
    }

    #[test]
    fn test_upper_kuseg_is_unmapped() {
        assert_eq!(segment(0x2000_0000), Segment::Unmapped);
        assert_eq!(segment(0x7FFF_FFFC), Segment::Unmapped);
        assert_eq!(segment(0x1FFF_FFFC), Segment::Cached(0x1FFF_FFFC));
    }
}
