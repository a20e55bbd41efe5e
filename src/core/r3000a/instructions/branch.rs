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
use super::super::{Jump, R3000a};
use crate::core::mips::Instruction;

const RA: u8 = 31;

impl R3000a {
    // === Branch Instructions ===
    //
    // The routine records the decision; the epilogue runs the delay slot
    // and then moves the program counter. Taken branches latch their
    // target in TAR.

    fn jump(&mut self, taken: bool, target: u32) {
        if taken {
            self.cop0.tar = target;
        }
        self.jump = Some(Jump { taken, target });
    }

    /// Conditional branch
    ///
    /// Target: address of the delay slot plus the shifted offset.
    pub(crate) fn op_branch(&mut self, condition: bool, i: Instruction) {
        let target = self
            .pc
            .wrapping_add(4)
            .wrapping_add(i.branch_offset() as u32);
        self.jump(condition, target);
    }

    /// BLTZAL/BGEZAL
    ///
    /// The return address is written whether or not the branch is taken.
    pub(crate) fn op_branch_link(&mut self, condition: bool, i: Instruction) {
        self.set_gpr(RA, self.pc.wrapping_add(8));
        self.op_branch(condition, i);
    }

    /// J: Jump
    ///
    /// Format: j target
    /// Operation: pc = (delay_slot & 0xF000_0000) | (target << 2)
    pub(crate) fn op_j(&mut self, target: u32) {
        let region = self.pc.wrapping_add(4) & 0xF000_0000;
        self.jump(true, region | (target << 2));
    }

    pub(crate) fn op_jal(&mut self, target: u32) {
        self.set_gpr(RA, self.pc.wrapping_add(8));
        self.op_j(target);
    }

    /// JR: Jump Register
    ///
    /// A misaligned target faults when the instruction there is fetched.
    pub(crate) fn op_jr(&mut self, rs: u8) {
        self.jump(true, self.gpr(rs));
    }

    /// JALR: Jump And Link Register
    ///
    /// The target is read before rd is written.
    pub(crate) fn op_jalr(&mut self, rd: u8, rs: u8) {
        let target = self.gpr(rs);
        self.set_gpr(rd, self.pc.wrapping_add(8));
        self.jump(true, target);
    }
}
