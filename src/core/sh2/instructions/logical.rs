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

use super::super::exception::Exception;
use super::super::memory::{area, Area, PHYSICAL_MASK, UNCACHED_BASE};
use super::super::Sh2;
use crate::core::bus::{Bus, Size};

/// Read-modify-write instructions spend three cycles
const RMW_CYCLES: u32 = 2;
/// TAS.B locks the bus for four
const TAS_CYCLES: u32 = 3;

impl Sh2 {
    // === @(R0,GBR) byte operations ===

    pub(crate) fn op_modify_byte(&mut self, bus: &mut dyn Bus, f: impl FnOnce(u32) -> u32) {
        let address = self.gbr.wrapping_add(self.r[0]);
        let Some(value) = self.read(bus, Size::Byte, address) else {
            return;
        };
        self.write(bus, Size::Byte, address, f(value));
        self.charge(RMW_CYCLES);
    }

    pub(crate) fn op_tst_byte(&mut self, bus: &mut dyn Bus, imm: u32) {
        let address = self.gbr.wrapping_add(self.r[0]);
        if let Some(value) = self.read(bus, Size::Byte, address) {
            self.sr.set_t(value & imm == 0);
            self.charge(RMW_CYCLES);
        }
    }

    /// TAS.B @Rn: test the byte and set its bit 7
    ///
    /// The locked cycle bypasses the cache, so the access goes through the
    /// cache-through alias. Only the memory areas can be locked.
    pub(crate) fn op_tas(&mut self, bus: &mut dyn Bus, n: usize) {
        let address = self.r[n];
        if !matches!(area(address), Area::Cached(_) | Area::Uncached(_)) {
            log::debug!("SH-2: TAS.B on non-memory address 0x{:08X}", address);
            self.raise(bus, Exception::AddressError);
            return;
        }
        let through = (address & PHYSICAL_MASK) | UNCACHED_BASE;
        let Some(value) = self.read(bus, Size::Byte, through) else {
            return;
        };
        self.sr.set_t(value == 0);
        self.write(bus, Size::Byte, through, value | 0x80);
        self.charge(TAS_CYCLES);
    }
}
