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
use super::sext32;

/// Extra pipeline cycles charged on top of the base instruction cost
const MULT_CYCLES: u32 = 3;
const DMULT_CYCLES: u32 = 6;
const DIV_CYCLES: u32 = 35;
const DDIV_CYCLES: u32 = 67;

impl Vr4300 {
    // === Multiply/Divide Instructions ===

    /// MULT: Multiply Word (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (hi, lo) = rs[31:0] * rt[31:0], each half sign-extended
    pub(crate) fn op_mult(&mut self, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as i32 as i64).wrapping_mul(self.gpr(rt) as i32 as i64);
        self.lo = sext32(result as u32);
        self.hi = sext32((result >> 32) as u32);
        self.charge(MULT_CYCLES);
    }

    /// MULTU: Multiply Word Unsigned
    pub(crate) fn op_multu(&mut self, rs: u8, rt: u8) {
        let result = (self.gpr(rs) as u32 as u64) * (self.gpr(rt) as u32 as u64);
        self.lo = sext32(result as u32);
        self.hi = sext32((result >> 32) as u32);
        self.charge(MULT_CYCLES);
    }

    /// DIV: Divide Word (signed)
    ///
    /// Division by zero does not trap: lo becomes -1 or +1 by the sign of
    /// the dividend and hi the dividend. `i32::MIN / -1` yields `i32::MIN`.
    pub(crate) fn op_div(&mut self, rs: u8, rt: u8) {
        let dividend = self.gpr(rs) as i32;
        let divisor = self.gpr(rt) as i32;
        if divisor != 0 {
            self.lo = sext32(dividend.wrapping_div(divisor) as u32);
            self.hi = sext32(dividend.wrapping_rem(divisor) as u32);
        } else {
            self.lo = if dividend < 0 { 1 } else { u64::MAX };
            self.hi = sext32(dividend as u32);
        }
        self.charge(DIV_CYCLES);
    }

    /// DIVU: Divide Word Unsigned
    pub(crate) fn op_divu(&mut self, rs: u8, rt: u8) {
        let dividend = self.gpr(rs) as u32;
        let divisor = self.gpr(rt) as u32;
        if divisor != 0 {
            self.lo = sext32(dividend / divisor);
            self.hi = sext32(dividend % divisor);
        } else {
            self.lo = u64::MAX;
            self.hi = sext32(dividend);
        }
        self.charge(DIV_CYCLES);
    }

    pub(crate) fn op_dmult(&mut self, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        let result = (self.gpr(rs) as i64 as i128) * (self.gpr(rt) as i64 as i128);
        self.lo = result as u64;
        self.hi = (result >> 64) as u64;
        self.charge(DMULT_CYCLES);
    }

    pub(crate) fn op_dmultu(&mut self, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        let result = (self.gpr(rs) as u128) * (self.gpr(rt) as u128);
        self.lo = result as u64;
        self.hi = (result >> 64) as u64;
        self.charge(DMULT_CYCLES);
    }

    pub(crate) fn op_ddiv(&mut self, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        let dividend = self.gpr(rs) as i64;
        let divisor = self.gpr(rt) as i64;
        if divisor != 0 {
            self.lo = dividend.wrapping_div(divisor) as u64;
            self.hi = dividend.wrapping_rem(divisor) as u64;
        } else {
            self.lo = if dividend < 0 { 1 } else { u64::MAX };
            self.hi = dividend as u64;
        }
        self.charge(DDIV_CYCLES);
    }

    pub(crate) fn op_ddivu(&mut self, rs: u8, rt: u8) {
        if !self.require_dword() {
            return;
        }
        let dividend = self.gpr(rs);
        let divisor = self.gpr(rt);
        if divisor != 0 {
            self.lo = dividend / divisor;
            self.hi = dividend % divisor;
        } else {
            self.lo = u64::MAX;
            self.hi = dividend;
        }
        self.charge(DDIV_CYCLES);
    }
}
