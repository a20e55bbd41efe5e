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
use super::super::R3000a;
use crate::core::bus::{Bus, Size};
use crate::core::mips::Instruction;

impl R3000a {
    // === Load Instructions ===
    //
    // Results go through the load delay slot. A faulting load raises its
    // exception inside `read` and issues nothing.

    /// LB: Load Byte (sign-extended)
    pub(crate) fn op_lb(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Byte, self.address(i)) {
            self.load_gpr(rt, value as u8 as i8 as u32);
        }
    }

    /// LH: Load Halfword (sign-extended)
    pub(crate) fn op_lh(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Half, self.address(i)) {
            self.load_gpr(rt, value as u16 as i16 as u32);
        }
    }

    pub(crate) fn op_lw(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Word, self.address(i)) {
            self.load_gpr(rt, value);
        }
    }

    pub(crate) fn op_lbu(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Byte, self.address(i)) {
            self.load_gpr(rt, value);
        }
    }

    pub(crate) fn op_lhu(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Half, self.address(i)) {
            self.load_gpr(rt, value);
        }
    }

    /// LWL: Load Word Left
    ///
    /// Little-endian: merges the bytes from the start of the aligned word
    /// up to the addressed byte into the high end of rt. The merge sees a
    /// load to rt still in its delay slot, so an LWR/LWL pair needs no
    /// nop between them.
    ///
    /// Format: lwl rt, offset(base)
    pub(crate) fn op_lwl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Word, address & !3) else {
            return;
        };
        let shift = 8 * (3 - (address & 3));
        let mask = u32::MAX >> (24 - 8 * (address & 3));
        let merged = (self.merge_source(rt) & !(mask << shift)) | (data << shift);
        self.load_gpr(rt, merged);
    }

    /// LWR: Load Word Right
    ///
    /// Merges the bytes from the addressed byte to the end of the aligned
    /// word into the low end of rt.
    pub(crate) fn op_lwr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Word, address & !3) else {
            return;
        };
        let shift = 8 * (address & 3);
        let mask = u32::MAX >> shift;
        let merged = (self.merge_source(rt) & !mask) | (data >> shift);
        self.load_gpr(rt, merged);
    }
}
