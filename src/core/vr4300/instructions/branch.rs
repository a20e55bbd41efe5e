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
use crate::core::mips::Instruction;

/// Link register for JAL and the REGIMM link branches
const RA: u8 = 31;

impl Vr4300 {
    // === Branch Instructions ===
    //
    // Every branch has one delay slot. The semantic routine only records
    // the decision; the epilogue runs the delay slot and then moves the
    // program counter.

    /// Conditional branch
    ///
    /// Target: address of the delay slot plus the shifted offset.
    pub(crate) fn op_branch(&mut self, condition: bool, i: Instruction) {
        if condition {
            let target = self.pc.wrapping_add(4).wrapping_add(i.branch_offset() as u64);
            self.branch.take(target);
        } else {
            self.branch.not_taken();
        }
    }

    /// Branch likely: the delay slot is nullified when not taken
    pub(crate) fn op_branch_likely(&mut self, condition: bool, i: Instruction) {
        if condition {
            let target = self.pc.wrapping_add(4).wrapping_add(i.branch_offset() as u64);
            self.branch.take(target);
        } else {
            self.branch.discard();
        }
    }

    /// BLTZAL/BGEZAL and their likely forms
    ///
    /// The return address is written whether or not the branch is taken.
    pub(crate) fn op_branch_link(&mut self, condition: bool, i: Instruction, likely: bool) {
        self.set_gpr(RA, self.pc.wrapping_add(8));
        if likely {
            self.op_branch_likely(condition, i);
        } else {
            self.op_branch(condition, i);
        }
    }

    /// J: Jump
    ///
    /// Format: j target
    /// Operation: pc = (delay_slot & 0xFFFF_FFFF_F000_0000) | (target << 2)
    pub(crate) fn op_j(&mut self, target: u32) {
        let region = self.pc.wrapping_add(4) & 0xFFFF_FFFF_F000_0000;
        self.branch.take(region | ((target as u64) << 2));
    }

    /// JAL: Jump And Link
    pub(crate) fn op_jal(&mut self, target: u32) {
        self.set_gpr(RA, self.pc.wrapping_add(8));
        self.op_j(target);
    }

    /// JR: Jump Register
    ///
    /// A misaligned target faults when the instruction there is fetched.
    pub(crate) fn op_jr(&mut self, rs: u8) {
        self.branch.take(self.gpr(rs));
    }

    /// JALR: Jump And Link Register
    ///
    /// The target is read before rd is written, so `jalr rs, rs` jumps to
    /// the old value.
    pub(crate) fn op_jalr(&mut self, rd: u8, rs: u8) {
        let target = self.gpr(rs);
        self.set_gpr(rd, self.pc.wrapping_add(8));
        self.branch.take(target);
    }
}
