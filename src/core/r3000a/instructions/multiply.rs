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

/// Extra cycles charged on top of the base instruction cost
const MULT_CYCLES: u32 = 6;
const DIV_CYCLES: u32 = 35;

impl R3000a {
    // === Multiply/Divide Instructions ===

    /// MULT: Multiply Word (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (hi, lo) = rs * rt
    pub(crate) fn op_mult(&mut self, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as i32 as i64).wrapping_mul(self.gpr(rt) as i32 as i64);
        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        self.charge(MULT_CYCLES);
    }

    pub(crate) fn op_multu(&mut self, rs: u8, rt: u8) {
        let result = self.gpr(rs) as u64 * self.gpr(rt) as u64;
        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        self.charge(MULT_CYCLES);
    }

    /// DIV: Divide Word (signed)
    ///
    /// Division by zero does not trap: lo becomes -1 or +1 by the sign of
    /// the dividend and hi the dividend. `i32::MIN / -1` yields `i32::MIN`
    /// with a zero remainder.
    pub(crate) fn op_div(&mut self, rs: u8, rt: u8) {
        let dividend = self.gpr(rs) as i32;
        let divisor = self.gpr(rt) as i32;
        if divisor != 0 {
            self.lo = dividend.wrapping_div(divisor) as u32;
            self.hi = dividend.wrapping_rem(divisor) as u32;
        } else {
            self.lo = if dividend < 0 { 1 } else { u32::MAX };
            self.hi = dividend as u32;
        }
        self.charge(DIV_CYCLES);
    }

    pub(crate) fn op_divu(&mut self, rs: u8, rt: u8) {
        let dividend = self.gpr(rs);
        let divisor = self.gpr(rt);
        if divisor != 0 {
            self.lo = dividend / divisor;
            self.hi = dividend % divisor;
        } else {
            self.lo = u32::MAX;
            self.hi = dividend;
        }
        self.charge(DIV_CYCLES);
    }
}
