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

impl R3000a {
    // === Logical Instructions ===
    //
    // Register forms are inlined in the dispatcher; immediates here are
    // zero-extended.

    pub(crate) fn op_andi(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) & imm as u32);
    }

    pub(crate) fn op_ori(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) | imm as u32);
    }

    pub(crate) fn op_xori(&mut self, rt: u8, rs: u8, imm: u16) {
        self.set_gpr(rt, self.gpr(rs) ^ imm as u32);
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = imm << 16
    pub(crate) fn op_lui(&mut self, rt: u8, imm: u16) {
        self.set_gpr(rt, (imm as u32) << 16);
    }
}
