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

use super::super::memory::Access;
use super::super::Vr4300;
use crate::core::bus::{Bus, Size};
use crate::core::mips::Instruction;

impl Vr4300 {
    // === Store Instructions ===

    pub(crate) fn op_sb(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Byte, self.address(i), self.gpr(rt));
    }

    pub(crate) fn op_sh(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Half, self.address(i), self.gpr(rt));
    }

    pub(crate) fn op_sw(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Word, self.address(i), self.gpr(rt));
    }

    pub(crate) fn op_sd(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        self.write(bus, Size::Dual, self.address(i), self.gpr(rt));
    }

    /// Read-modify-write of the aligned unit containing a partial store
    ///
    /// Store faults (TLB modification, TLBS, AdES) take precedence over
    /// the read, so the address is translated for a store first.
    fn merge(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        address: u64,
        combine: impl FnOnce(u64) -> u64,
    ) {
        if self.translate(address, Access::Store).is_none() {
            return;
        }
        let Some(old) = self.read(bus, size, address) else {
            return;
        };
        self.write(bus, size, address, combine(old));
    }

    /// SWL: Store Word Left
    ///
    /// Stores the high bytes of rt from the addressed byte up to the end
    /// of its aligned word.
    pub(crate) fn op_swl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let shift = 8 * (address & 3) as u32;
        let mask = u32::MAX >> shift;
        let value = (self.gpr(rt) as u32) >> shift;
        self.merge(bus, Size::Word, address & !3, |old| {
            ((old as u32 & !mask) | value) as u64
        });
    }

    /// SWR: Store Word Right
    pub(crate) fn op_swr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let shift = 8 * ((address ^ 3) & 3) as u32;
        let mask = u32::MAX << shift;
        let value = (self.gpr(rt) as u32) << shift;
        self.merge(bus, Size::Word, address & !3, |old| {
            ((old as u32 & !mask) | value) as u64
        });
    }

    /// SDL: Store Doubleword Left
    pub(crate) fn op_sdl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        let address = self.address(i);
        let shift = 8 * (address & 7) as u32;
        let mask = u64::MAX >> shift;
        let value = self.gpr(rt) >> shift;
        self.merge(bus, Size::Dual, address & !7, |old| (old & !mask) | value);
    }

    /// SDR: Store Doubleword Right
    pub(crate) fn op_sdr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        let address = self.address(i);
        let shift = 8 * ((address ^ 7) & 7) as u32;
        let mask = u64::MAX << shift;
        let value = self.gpr(rt) << shift;
        self.merge(bus, Size::Dual, address & !7, |old| (old & !mask) | value);
    }

    /// SC: Store Conditional
    ///
    /// Stores only while the link bit from LL is still set, and reports
    /// the outcome in rt (1 stored, 0 failed). A faulting store leaves rt
    /// untouched.
    pub(crate) fn op_sc(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.store_conditional(bus, Size::Word, rt, i);
    }

    /// SCD: Store Conditional Doubleword
    pub(crate) fn op_scd(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        self.store_conditional(bus, Size::Dual, rt, i);
    }

    fn store_conditional(&mut self, bus: &mut dyn Bus, size: Size, rt: u8, i: Instruction) {
        if !self.scc.ll_bit {
            self.set_gpr(rt, 0);
            return;
        }
        self.scc.ll_bit = false;
        if self
            .write(bus, size, self.address(i), self.gpr(rt))
            .is_some()
        {
            self.set_gpr(rt, 1);
        }
    }
}
