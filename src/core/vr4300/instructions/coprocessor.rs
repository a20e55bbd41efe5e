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

use super::super::exception::{Exception, ExceptionCode};
use super::super::Vr4300;
use super::sext32;
use crate::core::bus::{Bus, Size};
use crate::core::coprocessor::{CommandResult, Coprocessor};
use crate::core::mips::Instruction;

/// FCR31 condition bit tested by BC1F/BC1T
const CONDITION: u32 = 1 << 23;
const FCR31: u8 = 31;

impl Vr4300 {
    /// Raise CpU(1) unless Status.CU1 is set and a unit is attached
    fn cop1_ready(&mut self) -> bool {
        if !self.scc.status.coprocessor_usable(1) {
            self.raise(Exception::coprocessor_unusable(1));
            return false;
        }
        if self.cop1.is_none() {
            log::warn!(
                "VR4300: COP1 instruction at 0x{:016X} with no coprocessor attached",
                self.pc
            );
            self.raise(Exception::coprocessor_unusable(1));
            return false;
        }
        true
    }

    fn with_cop1<R>(&mut self, f: impl FnOnce(&mut dyn Coprocessor) -> R) -> Option<R> {
        if !self.cop1_ready() {
            return None;
        }
        match self.cop1.as_deref_mut() {
            Some(cop1) => Some(f(cop1)),
            None => None,
        }
    }

    // === Moves ===

    pub(crate) fn op_mfc1(&mut self, rt: u8, rd: u8) {
        if let Some(value) = self.with_cop1(|cop1| cop1.read_data(rd)) {
            self.set_gpr(rt, sext32(value as u32));
        }
    }

    pub(crate) fn op_dmfc1(&mut self, rt: u8, rd: u8) {
        if let Some(value) = self.with_cop1(|cop1| cop1.read_data(rd)) {
            self.set_gpr(rt, value);
        }
    }

    pub(crate) fn op_cfc1(&mut self, rt: u8, rd: u8) {
        if let Some(value) = self.with_cop1(|cop1| cop1.read_control(rd)) {
            self.set_gpr(rt, sext32(value));
        }
    }

    pub(crate) fn op_mtc1(&mut self, rt: u8, rd: u8) {
        let value = self.gpr(rt) as u32 as u64;
        self.with_cop1(|cop1| cop1.write_data(rd, value));
    }

    pub(crate) fn op_dmtc1(&mut self, rt: u8, rd: u8) {
        let value = self.gpr(rt);
        self.with_cop1(|cop1| cop1.write_data(rd, value));
    }

    pub(crate) fn op_ctc1(&mut self, rt: u8, rd: u8) {
        let value = self.gpr(rt) as u32;
        self.with_cop1(|cop1| cop1.write_control(rd, value));
    }

    // === Branches and Commands ===

    /// BC1F/BC1T and their likely forms, on the FCR31 condition bit
    pub(crate) fn op_bc1(&mut self, expected: bool, likely: bool, i: Instruction) {
        let Some(condition) = self.with_cop1(|cop1| cop1.read_control(FCR31) & CONDITION != 0)
        else {
            return;
        };
        if likely {
            self.op_branch_likely(condition == expected, i);
        } else {
            self.op_branch(condition == expected, i);
        }
    }

    /// COP1 arithmetic: forwarded to the attached unit
    pub(crate) fn op_cop1(&mut self, command: u32) {
        match self.with_cop1(|cop1| cop1.execute(command)) {
            Some(CommandResult::Done { cycles }) => self.charge(cycles),
            Some(CommandResult::Fault) => {
                self.raise(Exception::new(ExceptionCode::FloatingPoint));
            }
            None => {}
        }
    }

    // === Loads and Stores ===

    pub(crate) fn op_lwc1(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.load_cop1(bus, Size::Word, rt, i);
    }

    pub(crate) fn op_ldc1(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.load_cop1(bus, Size::Dual, rt, i);
    }

    pub(crate) fn op_swc1(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.store_cop1(bus, Size::Word, rt, i);
    }

    pub(crate) fn op_sdc1(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.store_cop1(bus, Size::Dual, rt, i);
    }

    fn load_cop1(&mut self, bus: &mut dyn Bus, size: Size, rt: u8, i: Instruction) {
        if !self.cop1_ready() {
            return;
        }
        if let Some(value) = self.read(bus, size, self.address(i)) {
            if let Some(cop1) = self.cop1.as_deref_mut() {
                cop1.write_data(rt, value);
            }
        }
    }

    fn store_cop1(&mut self, bus: &mut dyn Bus, size: Size, rt: u8, i: Instruction) {
        let Some(value) = self.with_cop1(|cop1| cop1.read_data(rt)) else {
            return;
        };
        self.write(bus, size, self.address(i), value);
    }

    /// COP2/COP3: absent units
    ///
    /// CpU while the unit's CU bit is clear, reserved instruction otherwise.
    pub(crate) fn op_unusable(&mut self, unit: u8) {
        if self.scc.status.coprocessor_usable(unit) {
            self.raise(Exception::new(ExceptionCode::ReservedInstruction));
        } else {
            self.raise(Exception::coprocessor_unusable(unit));
        }
    }
}
