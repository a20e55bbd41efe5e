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
    // === Logical Instructions ===
    //
    // Full 64-bit operations; immediates are zero-extended.

    pub(crate) fn op_and(&mut self, rd: u8, rs: u8, rt: u8) {
        self.set_gpr(rd, self.gpr(rs) & self.gpr(rt));
    }

    pub(crate) fn op_or(&mut self, rd: u8, rs: u8, rt: u8) {
        self.set_gpr(rd, self.gpr(rs) | self.gpr(rt));
    }

    pub(crate) fn op_xor(&mut self, rd: u8, rs: u8, rt: u8) {
        self.set_gpr(rd, self.gpr(rs) ^ self.gpr(rt));
    }

    pub(crate) fn op_nor(&mut self, rd: u8, rs: u8, rt: u8) {
        self.set_gpr(rd, !(self.gpr(rs) | self.gpr(rt)));
    }

    pub(crate) fn op_andi(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) & imm as u64);
    }

    pub(crate) fn op_ori(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) | imm as u64);
    }

    pub(crate) fn op_xori(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) ^ imm as u64);
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = sign_extend(imm << 16)
    pub(crate) fn op_lui(&mut self, rt: u8, imm: u16) {
        self.set_gpr(rt, sext32((imm as u32) << 16));
    }

    /// SLTI: Set on Less Than Immediate (signed)
    pub(crate) fn op_slti(&mut self, rt: u8, rs: u8, imm: i16) {
        let result = (self.gpr(rs) as i64) < imm as i64;
        self.set_gpr(rt, result as u64);
    }

    /// SLTIU: Set on Less Than Immediate Unsigned
    ///
    /// The immediate is sign-extended, then compared unsigned.
    pub(crate) fn op_sltiu(&mut self, rt: u8, rs: u8, imm: i16) {
        let result = self.gpr(rs) < imm as i64 as u64;
        self.set_gpr(rt, result as u64);
    }
}
