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

impl Sh2 {
    // === Carry and overflow ===

    /// ADDC: Rn + Rm + T, carry out to T
    pub(crate) fn op_addc(&mut self, n: usize, m: usize) {
        let (sum, c1) = self.r[n].overflowing_add(self.r[m]);
        let (sum, c2) = sum.overflowing_add(self.sr.t() as u32);
        self.r[n] = sum;
        self.sr.set_t(c1 || c2);
    }

    /// ADDV: signed overflow to T
    pub(crate) fn op_addv(&mut self, n: usize, m: usize) {
        let (sum, overflow) = (self.r[n] as i32).overflowing_add(self.r[m] as i32);
        self.r[n] = sum as u32;
        self.sr.set_t(overflow);
    }

    /// SUBC: Rn - Rm - T, borrow out to T
    pub(crate) fn op_subc(&mut self, n: usize, m: usize) {
        let (difference, b1) = self.r[n].overflowing_sub(self.r[m]);
        let (difference, b2) = difference.overflowing_sub(self.sr.t() as u32);
        self.r[n] = difference;
        self.sr.set_t(b1 || b2);
    }

    pub(crate) fn op_subv(&mut self, n: usize, m: usize) {
        let (difference, overflow) = (self.r[n] as i32).overflowing_sub(self.r[m] as i32);
        self.r[n] = difference as u32;
        self.sr.set_t(overflow);
    }

    /// NEGC: 0 - Rm - T, borrow out to T
    pub(crate) fn op_negc(&mut self, n: usize, m: usize) {
        let (negated, b1) = 0u32.overflowing_sub(self.r[m]);
        let (negated, b2) = negated.overflowing_sub(self.sr.t() as u32);
        self.r[n] = negated;
        self.sr.set_t(b1 || b2);
    }

    // === Compare ===

    /// CMP/STR: T when any byte of Rn equals the same byte of Rm
    pub(crate) fn op_cmp_str(&mut self, n: usize, m: usize) {
        let bytes = (self.r[n] ^ self.r[m]).to_be_bytes();
        self.sr.set_t(bytes.contains(&0));
    }

    /// DT: decrement and test
    pub(crate) fn op_dt(&mut self, n: usize) {
        self.r[n] = self.r[n].wrapping_sub(1);
        self.sr.set_t(self.r[n] == 0);
    }

    // === Division ===
    //
    // One-step division: DIV0S or DIV0U sets up Q, M and T, then each DIV1
    // produces one quotient bit into T.

    pub(crate) fn op_div0s(&mut self, n: usize, m: usize) {
        let q = self.r[n] >> 31 != 0;
        let m = self.r[m] >> 31 != 0;
        self.sr.set_q(q);
        self.sr.set_m(m);
        self.sr.set_t(q != m);
    }

    pub(crate) fn op_div0u(&mut self) {
        self.sr.set_q(false);
        self.sr.set_m(false);
        self.sr.set_t(false);
    }

    /// DIV1: one step of non-restoring division of Rn by Rm
    ///
    /// The divisor is subtracted when the previous Q equals M and added
    /// otherwise. Q takes the shifted-out bit combined with the carry or
    /// borrow, and T is set when Q equals M.
    pub(crate) fn op_div1(&mut self, n: usize, m: usize) {
        let old_q = self.sr.q();
        let divisor_negative = self.sr.m();
        let shifted_out = self.r[n] >> 31 != 0;
        let dividend = (self.r[n] << 1) | self.sr.t() as u32;

        let (result, carry) = if old_q == divisor_negative {
            dividend.overflowing_sub(self.r[m])
        } else {
            dividend.overflowing_add(self.r[m])
        };
        self.r[n] = result;

        let q = shifted_out ^ divisor_negative ^ carry;
        self.sr.set_q(q);
        self.sr.set_t(q == divisor_negative);
    }
}
