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

use super::super::status::Status;
use super::super::Sh2;
use super::sext8;
use crate::core::bus::{Bus, Size};

impl Sh2 {
    // === Branches ===

    /// BT, BF and their delayed forms
    ///
    /// The displacement is in instructions from PC+4. A branch not taken
    /// costs nothing extra and has no delay slot.
    pub(crate) fn op_bt(&mut self, taken: bool, disp: u32, delayed: bool) {
        if !taken {
            return;
        }
        let target = self.pc.wrapping_add(4).wrapping_add(sext8(disp) << 1);
        if delayed {
            self.delayed_branch(target);
        } else {
            self.immediate_branch(target);
        }
    }

    /// BRA and BSR: 12-bit displacement from PC+4
    pub(crate) fn op_bra(&mut self, disp: u32, link: bool) {
        let offset = ((disp << 20) as i32 >> 19) as u32;
        if link {
            self.pr = self.pc.wrapping_add(4);
        }
        self.delayed_branch(self.pc.wrapping_add(4).wrapping_add(offset));
    }

    /// BRAF and BSRF: PC+4 plus Rm
    pub(crate) fn op_braf(&mut self, m: usize, link: bool) {
        let target = self.pc.wrapping_add(4).wrapping_add(self.r[m]);
        if link {
            self.pr = self.pc.wrapping_add(4);
        }
        self.delayed_branch(target);
    }

    /// RTE: pop PC then SR; the return happens after the delay slot
    pub(crate) fn op_rte(&mut self, bus: &mut dyn Bus) {
        let Some(pc) = self.read(bus, Size::Word, self.r[15]) else {
            return;
        };
        let Some(sr) = self.read(bus, Size::Word, self.r[15].wrapping_add(4)) else {
            return;
        };
        self.r[15] = self.r[15].wrapping_add(8);
        self.sr = Status::from_bits(sr);
        self.delayed_branch(pc);
    }
}
