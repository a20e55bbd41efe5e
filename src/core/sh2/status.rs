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
//! Status register (SR)
//!
//! ```text
//!  9  8  7..4  1  0
//!  M  Q   I    S  T
//! ```

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Status(pub u32);

impl Status {
    /// Condition bit
    pub const T: u32 = 1 << 0;
    /// MAC saturation
    pub const S: u32 = 1 << 1;
    /// Interrupt mask level
    pub const I: u32 = 0xF << 4;
    pub const Q: u32 = 1 << 8;
    pub const M: u32 = 1 << 9;
    /// Bits that exist; the rest read as zero
    pub const WRITABLE: u32 = Self::T | Self::S | Self::I | Self::Q | Self::M;

    /// Value after reset: every interrupt masked
    pub const RESET: Status = Status(Self::I);

    /// Build from a register value, dropping bits that do not exist
    pub const fn from_bits(value: u32) -> Self {
        Status(value & Self::WRITABLE)
    }

    #[inline(always)]
    fn bit(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    #[inline(always)]
    fn set(&mut self, mask: u32, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    #[inline(always)]
    pub fn t(self) -> bool {
        self.bit(Self::T)
    }

    #[inline(always)]
    pub fn set_t(&mut self, value: bool) {
        self.set(Self::T, value);
    }

    pub fn s(self) -> bool {
        self.bit(Self::S)
    }

    pub fn q(self) -> bool {
        self.bit(Self::Q)
    }

    pub fn set_q(&mut self, value: bool) {
        self.set(Self::Q, value);
    }

    pub fn m(self) -> bool {
        self.bit(Self::M)
    }

    pub fn set_m(&mut self, value: bool) {
        self.set(Self::M, value);
    }

    /// Interrupt mask level, 0-15
    pub fn level(self) -> u8 {
        ((self.0 & Self::I) >> 4) as u8
    }

    pub fn set_level(&mut self, level: u8) {
        self.0 = (self.0 & !Self::I) | ((level as u32 & 0xF) << 4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_masks_reserved() {
        assert_eq!(Status::from_bits(0xFFFF_FFFF).0, 0x3F3);
    }

    #[test]
    fn test_fields() {
        let mut sr = Status::RESET;
        assert_eq!(sr.level(), 15);
        sr.set_level(3);
        sr.set_t(true);
        sr.set_m(true);
        assert_eq!(sr.0, 0x231);
        assert!(sr.t() && sr.m() && !sr.q() && !sr.s());
    }
}
