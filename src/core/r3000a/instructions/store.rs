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
use super::super::exception::ExceptionCode;
use super::super::R3000a;
use crate::core::bus::{Bus, Size};
use crate::core::mips::Instruction;

impl R3000a {
    // === Store Instructions ===

    pub(crate) fn op_sb(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Byte, self.address(i), self.gpr(rt));
    }

    pub(crate) fn op_sh(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Half, self.address(i), self.gpr(rt));
    }

    pub(crate) fn op_sw(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        self.write(bus, Size::Word, self.address(i), self.gpr(rt));
    }

    /// Read-modify-write of the aligned word containing a partial store
    ///
    /// A privilege violation is reported as a store fault, not a load one.
    fn merge(&mut self, bus: &mut dyn Bus, address: u32, combine: impl FnOnce(u32) -> u32) {
        if self.privileged(address) {
            self.raise_address(ExceptionCode::AddressStore, address);
            return;
        }
        let Some(old) = self.read(bus, Size::Word, address) else {
            return;
        };
        self.write(bus, Size::Word, address, combine(old));
    }

    /// SWL: Store Word Left
    ///
    /// Little-endian: stores the high bytes of rt into the aligned word
    /// from its start up to the addressed byte.
    pub(crate) fn op_swl(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let mask = u32::MAX >> (24 - 8 * (address & 3));
        let value = self.gpr(rt) >> (8 * (3 - (address & 3)));
        self.merge(bus, address & !3, |old| (old & !mask) | value);
    }

    /// SWR: Store Word Right
    pub(crate) fn op_swr(&mut self, bus: &mut dyn Bus, rt: u8, i: Instruction) {
        let address = self.address(i);
        let shift = 8 * (address & 3);
        let mask = u32::MAX << shift;
        let value = self.gpr(rt) << shift;
        self.merge(bus, address & !3, |old| (old & !mask) | value);
    }
}
