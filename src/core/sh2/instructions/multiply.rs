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

/// Extra cycles on top of the base instruction cost
const MUL16_CYCLES: u32 = 1;
const MUL32_CYCLES: u32 = 3;
const MAC_W_CYCLES: u32 = 2;
const MAC_L_CYCLES: u32 = 3;

/// MAC.L accumulator limits with SR.S set
const MAC48_MAX: i64 = 0x0000_7FFF_FFFF_FFFF;
const MAC48_MIN: i64 = -0x0000_8000_0000_0000;

impl Sh2 {
    fn mac64(&self) -> i64 {
        ((self.mach as u64) << 32 | self.macl as u64) as i64
    }

    fn set_mac(&mut self, value: i64) {
        self.mach = (value as u64 >> 32) as u32;
        self.macl = value as u32;
    }

    // === Multiply ===

    /// MUL.L: MACL = Rn * Rm, low 32 bits
    pub(crate) fn op_mul_l(&mut self, n: usize, m: usize) {
        self.macl = self.r[n].wrapping_mul(self.r[m]);
        self.charge(MUL32_CYCLES);
    }

    /// MULS.W: signed 16x16, MACL = product
    pub(crate) fn op_muls(&mut self, n: usize, m: usize) {
        self.macl = (self.r[n] as i16 as i32).wrapping_mul(self.r[m] as i16 as i32) as u32;
        self.charge(MUL16_CYCLES);
    }

    pub(crate) fn op_mulu(&mut self, n: usize, m: usize) {
        self.macl = (self.r[n] & 0xFFFF) * (self.r[m] & 0xFFFF);
        self.charge(MUL16_CYCLES);
    }

    /// DMULS.L: signed 32x32 into MACH:MACL
    pub(crate) fn op_dmuls(&mut self, n: usize, m: usize) {
        self.set_mac((self.r[n] as i32 as i64) * (self.r[m] as i32 as i64));
        self.charge(MUL32_CYCLES);
    }

    pub(crate) fn op_dmulu(&mut self, n: usize, m: usize) {
        self.set_mac(((self.r[n] as u64) * (self.r[m] as u64)) as i64);
        self.charge(MUL32_CYCLES);
    }

    // === Multiply and accumulate ===

    /// Read one MAC operand at Rx, post-incrementing it
    fn mac_operand(&mut self, bus: &mut dyn Bus, size: Size, x: usize) -> Option<i64> {
        let value = self.load(bus, size, self.r[x])?;
        self.r[x] = self.r[x].wrapping_add(size.bytes());
        Some(value as i32 as i64)
    }

    /// MAC.L @Rm+,@Rn+
    ///
    /// With SR.S set the 64-bit accumulator saturates at 48 bits signed.
    pub(crate) fn op_mac_l(&mut self, bus: &mut dyn Bus, n: usize, m: usize) {
        let Some(a) = self.mac_operand(bus, Size::Word, n) else {
            return;
        };
        let Some(b) = self.mac_operand(bus, Size::Word, m) else {
            return;
        };
        let sum = self.mac64().wrapping_add(a * b);
        if self.sr.s() {
            self.set_mac(sum.clamp(MAC48_MIN, MAC48_MAX));
        } else {
            self.set_mac(sum);
        }
        self.charge(MAC_L_CYCLES);
    }

    /// MAC.W @Rm+,@Rn+
    ///
    /// With SR.S set only MACL accumulates, saturating at 32 bits signed;
    /// an overflow sets bit 0 of MACH.
    pub(crate) fn op_mac_w(&mut self, bus: &mut dyn Bus, n: usize, m: usize) {
        let Some(a) = self.mac_operand(bus, Size::Half, n) else {
            return;
        };
        let Some(b) = self.mac_operand(bus, Size::Half, m) else {
            return;
        };
        let product = a * b;
        if self.sr.s() {
            let sum = self.macl as i32 as i64 + product;
            let clamped = sum.clamp(i32::MIN as i64, i32::MAX as i64);
            if clamped != sum {
                self.mach |= 1;
            }
            self.macl = clamped as i32 as u32;
        } else {
            self.set_mac(self.mac64().wrapping_add(product));
        }
        self.charge(MAC_W_CYCLES);
    }
}
