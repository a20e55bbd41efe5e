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
//! Address bits 31:29 select how an access is handled:
//!
//! ```text
//! 0  0000_0000  cached         through the cache when CCR.CE is set
//! 1  2000_0000  cache-through  straight to the bus
//! 2  4000_0000  purge          a write invalidates the matching line
//! 3  6000_0000  address array  cache tags and LRU codes
//! 6  C000_0000  data array     cache lines as RAM
//! 7  E000_0000  on-chip I/O    only CCR is modelled
//! 4, 5                         reserved; address error
//! ```
//!
//! The bus sees the low 29 bits. Every helper that can fault raises the
//! exception itself and returns `None`.

use super::cache::Ccr;
use super::exception::Exception;
use super::Sh2;
use crate::core::bus::{Bus, Size};

/// Cache control register
pub const CCR_ADDRESS: u32 = 0xFFFF_FE92;

/// Value returned by reads the hardware leaves undefined
pub const UNDEFINED: u32 = 0;

pub const PHYSICAL_MASK: u32 = 0x1FFF_FFFF;

/// Cache-through alias of area 0
pub const UNCACHED_BASE: u32 = 0x2000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Cached(u32),
    Uncached(u32),
    Purge(u32),
    AddressArray,
    DataArray,
    Io,
    Reserved,
}

pub const fn area(address: u32) -> Area {
    let physical = address & PHYSICAL_MASK;
    match address >> 29 {
        0 => Area::Cached(physical),
        1 => Area::Uncached(physical),
        2 => Area::Purge(physical),
        3 => Area::AddressArray,
        6 => Area::DataArray,
        7 => Area::Io,
        _ => Area::Reserved,
    }
}

impl Sh2 {
    fn address_error(&mut self, bus: &mut dyn Bus, address: u32, what: &str) {
        log::debug!(
            "SH-2: address error on {} 0x{:08X} at PC=0x{:08X}",
            what,
            address,
            self.pc
        );
        self.raise(bus, Exception::AddressError);
    }

    /// Read from the bus, charging its latency
    fn bus_read(&mut self, bus: &mut dyn Bus, size: Size, physical: u32) -> Option<u32> {
        let cycles = bus.timing(physical).cycles;
        let value = bus.read(size, physical).ok()?;
        self.charge(cycles);
        Some(value as u32)
    }

    /// Fetch the instruction at the program counter
    pub(super) fn fetch_instruction(&mut self, bus: &mut dyn Bus) -> Option<u16> {
        let pc = self.pc;
        if pc & 1 != 0 {
            self.address_error(bus, pc, "fetch");
            return None;
        }
        let word = match area(pc) {
            Area::Cached(physical) if self.cache.enabled() => {
                match self.cache.read(bus, Size::Half, physical, true) {
                    Ok((word, cycles)) => {
                        self.charge(cycles);
                        Some(word)
                    }
                    Err(_) => None,
                }
            }
            Area::Cached(physical) | Area::Uncached(physical) => {
                self.bus_read(bus, Size::Half, physical)
            }
            Area::DataArray => Some(self.cache.read_data(Size::Half, pc)),
            _ => None,
        };
        if word.is_none() {
            self.address_error(bus, pc, "fetch");
        }
        word.map(|word| word as u16)
    }

    /// Load `size` bytes from `address`, zero-extended
    pub(super) fn read(&mut self, bus: &mut dyn Bus, size: Size, address: u32) -> Option<u32> {
        if !size.aligned(address as u64) {
            self.address_error(bus, address, "read");
            return None;
        }
        let value = match area(address) {
            Area::Cached(physical) if self.cache.enabled() => {
                match self.cache.read(bus, size, physical, false) {
                    Ok((value, cycles)) => {
                        self.charge(cycles);
                        Some(value)
                    }
                    Err(_) => None,
                }
            }
            Area::Cached(physical) | Area::Uncached(physical) => {
                self.bus_read(bus, size, physical)
            }
            Area::Purge(_) => {
                log::warn!("SH-2: read from purge area 0x{:08X}", address);
                Some(UNDEFINED)
            }
            Area::AddressArray => Some(self.cache.read_address(address)),
            Area::DataArray => Some(self.cache.read_data(size, address)),
            Area::Io => Some(self.io_read(size, address)),
            Area::Reserved => None,
        };
        if value.is_none() {
            self.address_error(bus, address, "read");
        }
        value
    }

    /// Store the low `size` bytes of `value` at `address`
    ///
    /// Cached stores write through: memory is always updated, a resident
    /// line is updated in place.
    pub(super) fn write(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        address: u32,
        value: u32,
    ) -> Option<()> {
        if !size.aligned(address as u64) {
            self.address_error(bus, address, "write");
            return None;
        }
        let value = value & size.mask() as u32;
        let physical = match area(address) {
            Area::Cached(physical) => {
                if self.cache.enabled() {
                    self.cache.write(size, physical, value);
                }
                physical
            }
            Area::Uncached(physical) => physical,
            Area::Purge(physical) => {
                self.cache.purge(physical);
                self.invalidate_code(physical);
                return Some(());
            }
            Area::AddressArray => {
                self.cache.write_address(address, value);
                return Some(());
            }
            Area::DataArray => {
                self.cache.write_data(size, address, value);
                return Some(());
            }
            Area::Io => {
                self.io_write(size, address, value);
                return Some(());
            }
            Area::Reserved => {
                self.address_error(bus, address, "write");
                return None;
            }
        };
        let cycles = bus.timing(physical).cycles;
        if bus.write(size, physical, value as u64).is_err() {
            self.address_error(bus, address, "write");
            return None;
        }
        self.charge(cycles);
        Some(())
    }

    /// Bit position of CCR within an I/O access at `address`, if it covers it
    fn ccr_shift(size: Size, address: u32) -> Option<u32> {
        let base = address & !(size.bytes() - 1);
        let offset = CCR_ADDRESS.wrapping_sub(base);
        (offset < size.bytes()).then(|| 8 * (size.bytes() - 1 - offset))
    }

    fn io_read(&mut self, size: Size, address: u32) -> u32 {
        if let Some(shift) = Self::ccr_shift(size, address) {
            return (self.cache.control().bits() as u32) << shift;
        }
        log::warn!("SH-2: unhandled I/O read 0x{:08X}", address);
        UNDEFINED
    }

    fn io_write(&mut self, size: Size, address: u32, value: u32) {
        if let Some(shift) = Self::ccr_shift(size, address) {
            let control = (value >> shift) as u8;
            self.cache.set_control(control);
            if Ccr::from_bits_truncate(control).contains(Ccr::CP) {
                self.blocks.flush();
            }
            // Blocks are keyed by CE; leave the one that changed it
            self.code_written = true;
            return;
        }
        log::warn!(
            "SH-2: unhandled I/O write 0x{:08X} = 0x{:08X}",
            address,
            value
        );
    }

    /// Debugger read: no exceptions, cache updates or cycle cost
    pub fn peek(&self, bus: &mut dyn Bus, size: Size, address: u32) -> Option<u32> {
        match area(address) {
            Area::Cached(physical) => match self.cache.peek(size, physical) {
                Some(value) if self.cache.enabled() => Some(value),
                _ => bus.read(size, physical).ok().map(|v| v as u32),
            },
            Area::Uncached(physical) => bus.read(size, physical).ok().map(|v| v as u32),
            Area::AddressArray => Some(self.cache.read_address(address)),
            Area::DataArray => Some(self.cache.read_data(size, address)),
            Area::Io if address == CCR_ADDRESS => Some(self.cache.control().bits() as u32),
            Area::Purge(_) | Area::Io | Area::Reserved => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_areas() {
        assert_eq!(area(0x0000_1000), Area::Cached(0x1000));
        assert_eq!(area(0x2600_0000), Area::Uncached(0x0600_0000));
        assert_eq!(area(0x4000_0010), Area::Purge(0x10));
        assert_eq!(area(0x6000_03F0), Area::AddressArray);
        assert_eq!(area(0xC000_0FFC), Area::DataArray);
        assert_eq!(area(CCR_ADDRESS), Area::Io);
        assert_eq!(area(0x8000_0000), Area::Reserved);
        assert_eq!(area(0xA000_0000), Area::Reserved);
    }
}
