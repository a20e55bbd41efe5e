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

use super::super::Vr4300;
use super::sext32;
use crate::core::bus::{Bus, Size};
use crate::core::mips::Instruction;

impl Vr4300 {
    // === Load Instructions ===
    //
    // A faulting load raises its exception inside `read` and leaves rt
    // untouched.

    /// LB: Load Byte (sign-extended)
    pub(crate) fn op_lb(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Byte, self.address(i)) {
            self.set_gpr(rt, value as u8 as i8 as i64 as u64);
        }
    }

    /// LH: Load Halfword (sign-extended)
    pub(crate) fn op_lh(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Half, self.address(i)) {
            self.set_gpr(rt, value as u16 as i16 as i64 as u64);
        }
    }

    /// LW: Load Word (sign-extended)
    pub(crate) fn op_lw(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Word, self.address(i)) {
            self.set_gpr(rt, sext32(value as u32));
        }
    }

    pub(crate) fn op_lbu(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Byte, self.address(i)) {
            self.set_gpr(rt, value);
        }
    }

    pub(crate) fn op_lhu(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Half, self.address(i)) {
            self.set_gpr(rt, value);
        }
    }

    /// LWU: Load Word Unsigned (zero-extended)
    pub(crate) fn op_lwu(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        if let Some(value) = self.read(bus, Size::Word, self.address(i)) {
            self.set_gpr(rt, value);
        }
    }

    /// LD: Load Doubleword
    pub(crate) fn op_ld(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        if let Some(value) = self.read(bus, Size::Dual, self.address(i)) {
            self.set_gpr(rt, value);
        }
    }

    /// LWL: Load Word Left
    ///
    /// Merges the bytes from the addressed byte up to the end of its
    /// aligned word into the high end of rt. The result is sign-extended.
    ///
    /// Format: lwl rt, offset(base)
    pub(crate) fn op_lwl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Word, address & !3) else {
            return;
        };
        let shift = 8 * (address & 3) as u32;
        let mask = u32::MAX << shift;
        let merged = (self.gpr(rt) as u32 & !mask) | ((data as u32) << shift);
        self.set_gpr(rt, sext32(merged));
    }

    /// LWR: Load Word Right
    ///
    /// Merges the bytes from the start of the aligned word up to the
    /// addressed byte into the low end of rt. Only a full-word merge
    /// sign-extends; otherwise bits 63:32 of rt are preserved.
    pub(crate) fn op_lwr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Word, address & !3) else {
            return;
        };
        let shift = 8 * ((address ^ 3) & 3) as u32;
        let mask = u32::MAX >> shift;
        let old = self.gpr(rt);
        let merged = (old as u32 & !mask) | ((data as u32) >> shift);
        let value = if address & 3 == 3 {
            sext32(merged)
        } else {
            (old & !0xFFFF_FFFF) | merged as u64
        };
        self.set_gpr(rt, value);
    }

    /// LDL: Load Doubleword Left
    pub(crate) fn op_ldl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Dual, address & !7) else {
            return;
        };
        let shift = 8 * (address & 7) as u32;
        let mask = u64::MAX << shift;
        self.set_gpr(rt, (self.gpr(rt) & !mask) | (data << shift));
    }

    /// LDR: Load Doubleword Right
    pub(crate) fn op_ldr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        let address = self.address(i);
        let Some(data) = self.read(bus, Size::Dual, address & !7) else {
            return;
        };
        let shift = 8 * ((address ^ 7) & 7) as u32;
        let mask = u64::MAX >> shift;
        self.set_gpr(rt, (self.gpr(rt) & !mask) | (data >> shift));
    }

    /// LL: Load Linked
    ///
    /// Records the physical address in LLAddr and sets the link bit that a
    /// later SC tests. ERET clears the bit.
    pub(crate) fn op_ll(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if let Some(value) = self.read(bus, Size::Word, self.address(i)) {
            self.set_gpr(rt, sext32(value as u32));
            self.link();
        }
    }

    /// LLD: Load Linked Doubleword
    pub(crate) fn op_lld(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.require_dword() {
            return;
        }
        if let Some(value) = self.read(bus, Size::Dual, self.address(i)) {
            self.set_gpr(rt, value);
            self.link();
        }
    }

    fn link(&mut self) {
        self.scc.ll_addr = self.last_physical >> 4;
        self.scc.ll_bit = true;
    }
}
