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
    // === Shifts ===
    //
    // The variable forms pass `rs & 31` as the amount.

    /// SLL: Shift Word Left Logical
    ///
    /// `sll $0, $0, 0` is the canonical NOP.
    pub(crate) fn op_sll(&mut self, rd: u8, rt: u8, sa: u32) {
        self.set_gpr(rd, self.gpr(rt) << sa);
    }

    pub(crate) fn op_srl(&mut self, rd: u8, rt: u8, sa: u32) {
        self.set_gpr(rd, self.gpr(rt) >> sa);
    }

    pub(crate) fn op_sra(&mut self, rd: u8, rt: u8, sa: u32) {
        self.set_gpr(rd, ((self.gpr(rt) as i32) >> sa) as u32);
    }
}
