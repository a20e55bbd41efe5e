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

impl Vr4300 {
    // === 32-bit Arithmetic ===

    /// ADD: Add Word (with overflow exception)
    ///
    /// Adds the low 32 bits of two registers. On signed overflow an
    /// arithmetic overflow exception is raised and rd is left unchanged.
    ///
    /// Format: add rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] + rt[31:0])
    pub(crate) fn op_add(&mut self, rd: u8, rs: u8, rt: u8) {
        let a = self.gpr(rs) as i32;
        let b = self.gpr(rt) as i32;
        match a.checked_add(b) {
            Some(result) => self.set_gpr(rd, sext32(result as u32)),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// ADDU: Add Unsigned Word (no overflow exception)
    ///
    /// Format: addu rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] + rt[31:0])
    pub(crate) fn op_addu(&mut self, rd: u8, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as u32).wrapping_add(self.gpr(rt) as u32);
        self.set_gpr(rd, sext32(result));
    }

    /// ADDI: Add Immediate Word (with overflow exception)
    ///
    /// Format: addi rt, rs, imm
    /// Operation: rt = sign_extend(rs[31:0] + sign_extend(imm))
    pub(crate) fn op_addi(&mut self, rt: u8, rs: u8, imm: i16) {
        match (self.gpr(rs) as i32).checked_add(imm as i32) {
            Some(result) => self.set_gpr(rt, sext32(result as u32)),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// ADDIU: Add Immediate Unsigned Word
    ///
    /// The immediate is sign-extended despite the name.
    ///
    /// Format: addiu rt, rs, imm
    /// Operation: rt = sign_extend(rs[31:0] + sign_extend(imm))
    pub(crate) fn op_addiu(&mut self, rt: u8, rs: u8, imm: i16) {
        let result = (self.gpr(rs) as u32).wrapping_add(imm as i32 as u32);
        self.set_gpr(rt, sext32(result));
    }

    /// SUB: Subtract Word (with overflow exception)
    ///
    /// Format: sub rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] - rt[31:0])
    pub(crate) fn op_sub(&mut self, rd: u8, rs: u8, rt: u8) {
        let a = self.gpr(rs) as i32;
        let b = self.gpr(rt) as i32;
        match a.checked_sub(b) {
            Some(result) => self.set_gpr(rd, sext32(result as u32)),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// SUBU: Subtract Unsigned Word
    ///
    /// Format: subu rd, rs, rt
    /// Operation: rd = sign_extend(rs[31:0] - rt[31:0])
    pub(crate) fn op_subu(&mut self, rd: u8, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as u32).wrapping_sub(self.gpr(rt) as u32);
        self.set_gpr(rd, sext32(result));
    }

    /// SLT: Set on Less Than (signed, full 64-bit compare)
    pub(crate) fn op_slt(&mut self, rd: u8, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as i64) < (self.gpr(rt) as i64);
        self.set_gpr(rd, result as u64);
    }

    /// SLTU: Set on Less Than Unsigned
    pub(crate) fn op_sltu(&mut self, rd: u8, rs: u8, rt: u8) {
        let result = self.gpr(rs) < self.gpr(rt);
        self.set_gpr(rd, result as u64);
    }

    // === 64-bit Arithmetic ===
    //
    // Reserved instruction in 32-bit user and supervisor mode.

    /// DADD: Doubleword Add (with overflow exception)
    ///
    /// Format: dadd rd, rs, rt
    /// Operation: rd = rs + rt
    pub(crate) fn op_dadd(&mut self, rd: u8, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        match (self.gpr(rs) as i64).checked_add(self.gpr(rt) as i64) {
            Some(result) => self.set_gpr(rd, result as u64),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// DADDU: Doubleword Add Unsigned
    pub(crate) fn op_daddu(&mut self, rd: u8, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rd, self.gpr(rs).wrapping_add(self.gpr(rt)));
    }

    /// DADDI: Doubleword Add Immediate (with overflow exception)
    pub(crate) fn op_daddi(&mut self, rt: u8, rs: u8, imm: i16) {
        if !self.require_dword() {
            return;
        }
        match (self.gpr(rs) as i64).checked_add(imm as i64) {
            Some(result) => self.set_gpr(rt, result as u64),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// DADDIU: Doubleword Add Immediate Unsigned
    pub(crate) fn op_daddiu(&mut self, rt: u8, rs: u8, imm: i16) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rt, self.gpr(rs).wrapping_add(imm as i64 as u64));
    }

    /// DSUB: Doubleword Subtract (with overflow exception)
    pub(crate) fn op_dsub(&mut self, rd: u8, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        match (self.gpr(rs) as i64).checked_sub(self.gpr(rt) as i64) {
            Some(result) => self.set_gpr(rd, result as u64),
            None => self.raise(Exception::new(ExceptionCode::Overflow)),
        }
    }

    /// DSUBU: Doubleword Subtract Unsigned
    pub(crate) fn op_dsubu(&mut self, rd: u8, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rd, self.gpr(rs).wrapping_sub(self.gpr(rt)));
    }
}
