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
    // === Stores ===

    /// Store the low `size` bytes of Rm at `address`
    pub(crate) fn op_store(&mut self, bus: &mut dyn Bus, size: Size, address: u32, m: usize) {
        self.write(bus, size, address, self.r[m]);
    }

    /// MOV.x Rm,@-Rn
    ///
    /// The value stored is Rm before the decrement, and Rn is only updated
    /// once the store succeeds.
    pub(crate) fn op_store_pre_dec(&mut self, bus: &mut dyn Bus, size: Size, n: usize, m: usize) {
        let address = self.r[n].wrapping_sub(size.bytes());
        if self.write(bus, size, address, self.r[m]).is_some() {
            self.r[n] = address;
        }
    }

    /// STC.L/STS.L reg,@-Rn
    pub(crate) fn op_store_control(&mut self, bus: &mut dyn Bus, value: u32, n: usize) {
        let address = self.r[n].wrapping_sub(4);
        if self.write(bus, Size::Word, address, value).is_some() {
            self.r[n] = address;
        }
    }
}
