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
use super::super::R3000a;

impl R3000a {
    // === Arithmetic Instructions ===

    /// ADD: Add Word (with overflow exception)
    ///
    /// On signed overflow rd is left unchanged.
    ///
    /// Format: add rd, rs, rt
    pub(crate) fn op_add(&mut self, rd: u8, rs: u8, rt: u8) {
        match (self.gpr(rs) as i32).checked_add(self.gpr(rt) as i32) {
            Some(result) => self.set_gpr(rd, result as u32),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// ADDI: Add Immediate Word (with overflow exception)
    pub(crate) fn op_addi(&mut self, rt: u8, rs: u8, imm: i16) {
        match (self.gpr(rs) as i32).checked_add(imm as i32) {
            Some(result) => self.set_gpr(rt, result as u32),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// ADDIU: Add Immediate Unsigned Word
    ///
    /// The immediate is sign-extended despite the name.
    pub(crate) fn op_addiu(&mut self, rt: u8, rs: u8, imm: i16) {
        self.set_gpr(rt, self.gpr(rs).wrapping_add(imm as i32 as u32));
    }

    pub(crate) fn op_sub(&mut self, rd: u8, rs: u8, rt: u8) {
        match (self.gpr(rs) as i32).checked_sub(self.gpr(rt) as i32) {
            Some(result) => self.set_gpr(rd, result as u32),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// SLT: Set on Less Than (signed)
    pub(crate) fn op_slt(&mut self, rd: u8, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as i32) < (self.gpr(rt) as i32);
        self.set_gpr(rd, result as u32);
    }

    pub(crate) fn op_slti(&mut self, rt: u8, rs: u8, imm: i16) {
        let result = (self.gpr(rs) as i32) < imm as i32;
        self.set_gpr(rt, result as u32);
    }

    /// SLTIU: Set on Less Than Immediate Unsigned
    ///
    /// The immediate is sign-extended, then compared unsigned.
    pub(crate) fn op_sltiu(&mut self, rt: u8, rs: u8, imm: i16) {
        let result = self.gpr(rs) < imm as i32 as u32;
        self.set_gpr(rt, result as u32);
    }
}
