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
use super::super::cop0::reg;
use super::super::exception::{Exception, ExceptionCode};
use super::super::R3000a;
use crate::core::bus::{Bus, Size};
use crate::core::coprocessor::{CommandResult, Coprocessor};
use crate::core::mips::Instruction;

impl R3000a {
    /// COP0 instructions need kernel mode or Status.CU0
    fn cop0_usable(&mut self) -> bool {
        let status = self.cop0.status;
        if !status.user_mode() || status.coprocessor_usable(0) {
            return true;
        }
        self.raise(Exception::coprocessor_unusable(0));
        false
    }

    // === COP0 ===

    /// MFC0: Move From System Control Coprocessor
    ///
    /// The value arrives through the load delay slot. Only registers 0-15
    /// exist; anything above is a reserved instruction.
    pub(crate) fn op_mfc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() {
            return;
        }
        match self.cop0.read(rd) {
            Some(value) => self.load_gpr(rt, value),
            None => self.raise(Exception::new(ExceptionCode::ReservedInstruction)),
        }
    }

    /// MTC0: Move To System Control Coprocessor
    ///
    /// A Status write can change privilege or cache isolation, so the
    /// instruction ends its block.
    pub(crate) fn op_mtc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() {
            return;
        }
        let before = self.cop0.status;
        self.cop0.write(rd, self.gpr(rt));
        if rd == reg::SR && before != self.cop0.status {
            log::trace!(
                "R3000A: SR 0x{:08X} -> 0x{:08X}",
                before.0,
                self.cop0.status.0
            );
        }
    }

    /// RFE: Restore From Exception
    ///
    /// Pops the KU/IE stack. Handlers return with `jr k0; rfe`, so RFE
    /// runs in the delay slot of the jump back to EPC.
    pub(crate) fn op_rfe(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        self.cop0.status.pop();
    }

    // === COP2 (geometry engine) ===

    /// Raise CpU(2) unless Status.CU2 is set and a unit is attached
    fn cop2_ready(&mut self) -> bool {
        if !self.cop0.status.coprocessor_usable(2) {
            self.raise(Exception::coprocessor_unusable(2));
            return false;
        }
        if self.cop2.is_none() {
            log::warn!(
                "R3000A: COP2 instruction at 0x{:08X} with no coprocessor attached",
                self.pc
            );
            self.raise(Exception::coprocessor_unusable(2));
            return false;
        }
        true
    }

    fn with_cop2<R>(&mut self, f: impl FnOnce(&mut dyn Coprocessor) -> R) -> Option<R> {
        if !self.cop2_ready() {
            return None;
        }
        match self.cop2.as_deref_mut() {
            Some(cop2) => Some(f(cop2)),
            None => None,
        }
    }

    pub(crate) fn op_mfc2(&mut self, rt: u8, rd: u8) {
        if let Some(value) = self.with_cop2(|cop2| cop2.read_data(rd)) {
            self.load_gpr(rt, value as u32);
        }
    }

    pub(crate) fn op_cfc2(&mut self, rt: u8, rd: u8) {
        if let Some(value) = self.with_cop2(|cop2| cop2.read_control(rd)) {
            self.load_gpr(rt, value);
        }
    }

    pub(crate) fn op_mtc2(&mut self, rt: u8, rd: u8) {
        let value = self.gpr(rt) as u64;
        self.with_cop2(|cop2| cop2.write_data(rd, value));
    }

    pub(crate) fn op_ctc2(&mut self, rt: u8, rd: u8) {
        let value = self.gpr(rt);
        self.with_cop2(|cop2| cop2.write_control(rd, value));
    }

    /// Geometry command: forwarded to the attached unit
    ///
    /// The R3000A has no exception for a rejected command; it is logged
    /// and dropped.
    pub(crate) fn op_cop2(&mut self, command: u32) {
        match self.with_cop2(|cop2| cop2.execute(command)) {
            Some(CommandResult::Done { cycles }) => self.charge(cycles),
            Some(CommandResult::Fault) => {
                log::warn!(
                    "R3000A: COP2 rejected command 0x{:07X} at 0x{:08X}",
                    command,
                    self.pc
                );
            }
            None => {}
        }
    }

    /// LWC2: load a word straight into a COP2 data register
    pub(crate) fn op_lwc2(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        if !self.cop2_ready() {
            return;
        }
        if let Some(value) = self.read(bus, Size::Word, self.address(i)) {
            if let Some(cop2) = self.cop2.as_deref_mut() {
                cop2.write_data(rt, value as u64);
            }
        }
    }

    pub(crate) fn op_swc2(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let Some(value) = self.with_cop2(|cop2| cop2.read_data(rt)) else {
            return;
        };
        self.write(bus, Size::Word, self.address(i), value as u32);
    }

    /// COP1, COP3 and the LWCz/SWCz forms without a unit behind them
    ///
    /// CpU while the unit's CU bit is clear (COP0 counts as usable in
    /// kernel mode), reserved instruction otherwise.
    pub(crate) fn op_unusable(&mut self, unit: u8) {
        let status = self.cop0.status;
        let usable = status.coprocessor_usable(unit) || (unit == 0 && !status.user_mode());
        if usable {
            self.raise(Exception::new(ExceptionCode::ReservedInstruction));
        } else {
            self.raise(Exception::coprocessor_unusable(unit));
        }
    }
}
