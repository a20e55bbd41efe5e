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

impl Vr4300 {
    // === Word Shifts ===

    /// SLL: Shift Word Left Logical
    ///
    /// `sll $0, $0, 0` is the canonical NOP.
    pub(crate) fn op_sll(&mut self, rd: u8, rt: u8, sa: u32) {
        self.set_gpr(rd, sext32((self.gpr(rt) as u32) << sa));
    }

    pub(crate) fn op_srl(&mut self, rd: u8, rt: u8, sa: u32) {
        self.set_gpr(rd, sext32((self.gpr(rt) as u32) >> sa));
    }

    /// SRA: Shift Word Right Arithmetic
    ///
    /// Shifts the whole 64-bit register, then sign-extends bits 31:0 of the
    /// result, so bits above 31 of rt can shift into the word.
    pub(crate) fn op_sra(&mut self, rd: u8, rt: u8, sa: u32) {
        let result = (self.gpr(rt) as i64) >> sa;
        self.set_gpr(rd, sext32(result as u32));
    }

    pub(crate) fn op_sllv(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_sll(rd, rt, self.gpr(rs) as u32 & 31);
    }

    pub(crate) fn op_srlv(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_srl(rd, rt, self.gpr(rs) as u32 & 31);
    }

    pub(crate) fn op_srav(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_sra(rd, rt, self.gpr(rs) as u32 & 31);
    }

    // === Doubleword Shifts ===

    pub(crate) fn op_dsll(&mut self, rd: u8, rt: u8, sa: u32) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rd, self.gpr(rt) << sa);
    }

    pub(crate) fn op_dsrl(&mut self, rd: u8, rt: u8, sa: u32) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rd, self.gpr(rt) >> sa);
    }

    pub(crate) fn op_dsra(&mut self, rd: u8, rt: u8, sa: u32) {
        if !self.require_dword() {
            return;
        }
        self.set_gpr(rd, ((self.gpr(rt) as i64) >> sa) as u64);
    }

    pub(crate) fn op_dsllv(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_dsll(rd, rt, self.gpr(rs) as u32 & 63);
    }

    pub(crate) fn op_dsrlv(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_dsrl(rd, rt, self.gpr(rs) as u32 & 63);
    }

    pub(crate) fn op_dsrav(&mut self, rd: u8, rt: u8, rs: u8) {
        self.op_dsra(rd, rt, self.gpr(rs) as u32 & 63);
    }
}
