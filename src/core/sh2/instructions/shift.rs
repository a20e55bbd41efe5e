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
    // === Shifts and rotates ===
    //
    // Single-bit forms move the bit shifted out into T. The 2/8/16-bit
    // forms leave T alone and are handled inline by the dispatcher.

    pub(crate) fn op_shll(&mut self, n: usize) {
        self.sr.set_t(self.r[n] >> 31 != 0);
        self.r[n] <<= 1;
    }

    pub(crate) fn op_shlr(&mut self, n: usize) {
        self.sr.set_t(self.r[n] & 1 != 0);
        self.r[n] >>= 1;
    }

    /// SHAR: arithmetic right shift, sign bit kept
    pub(crate) fn op_shar(&mut self, n: usize) {
        self.sr.set_t(self.r[n] & 1 != 0);
        self.r[n] = ((self.r[n] as i32) >> 1) as u32;
    }

    pub(crate) fn op_rotl(&mut self, n: usize) {
        self.sr.set_t(self.r[n] >> 31 != 0);
        self.r[n] = self.r[n].rotate_left(1);
    }

    pub(crate) fn op_rotr(&mut self, n: usize) {
        self.sr.set_t(self.r[n] & 1 != 0);
        self.r[n] = self.r[n].rotate_right(1);
    }

    /// ROTCL: rotate left through T
    pub(crate) fn op_rotcl(&mut self, n: usize) {
        let carry = self.sr.t() as u32;
        self.sr.set_t(self.r[n] >> 31 != 0);
        self.r[n] = (self.r[n] << 1) | carry;
    }

    pub(crate) fn op_rotcr(&mut self, n: usize) {
        let carry = self.sr.t() as u32;
        self.sr.set_t(self.r[n] & 1 != 0);
        self.r[n] = (self.r[n] >> 1) | carry << 31;
    }
}
