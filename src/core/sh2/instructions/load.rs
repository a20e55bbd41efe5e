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

use super::super::Sh2;
use crate::core::bus::{Bus, Size};

impl Sh2 {
    // === Loads ===

    /// MOV.W/MOV.L @(disp,PC),Rn
    ///
    /// Word loads are relative to PC+4; long loads to PC+4 with the low
    /// two bits cleared.
    pub(crate) fn op_mov_pc(&mut self, bus: &mut dyn Bus, size: Size, n: usize, disp: u32) {
        let address = match size {
            Size::Half => self.pc_base().wrapping_add(disp * 2),
            _ => (self.pc_base() & !3).wrapping_add(disp * 4),
        };
        if let Some(value) = self.load(bus, size, address) {
            self.r[n] = value;
        }
    }

    pub(crate) fn op_load(&mut self, bus: &mut dyn Bus, size: Size, n: usize, address: u32) {
        if let Some(value) = self.load(bus, size, address) {
            self.r[n] = value;
        }
    }

    /// MOV.x @Rm+,Rn
    ///
    /// When Rn and Rm are the same register the loaded value wins over the
    /// increment.
    pub(crate) fn op_load_post_inc(&mut self, bus: &mut dyn Bus, size: Size, n: usize, m: usize) {
        let Some(value) = self.load(bus, size, self.r[m]) else {
            return;
        };
        if n != m {
            self.r[m] = self.r[m].wrapping_add(size.bytes());
        }
        self.r[n] = value;
    }

    /// LDC.L/LDS.L @Rm+,reg
    pub(crate) fn op_load_control(&mut self, bus: &mut dyn Bus, m: usize, set: fn(&mut Sh2, u32)) {
        let Some(value) = self.read(bus, Size::Word, self.r[m]) else {
            return;
        };
        self.r[m] = self.r[m].wrapping_add(4);
        set(self, value);
    }

    /// SWAP.B: exchange the two low bytes
    pub(crate) fn op_swap_b(&mut self, n: usize, m: usize) {
        let value = self.r[m];
        self.r[n] = (value & 0xFFFF_0000) | (value & 0xFF) << 8 | (value >> 8) & 0xFF;
    }
}
