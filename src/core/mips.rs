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

//! MIPS instruction word fields
//!
//! Shared by the R3000A and VR4300 decoders. All three encoding formats use
//! the same field positions:
//!
//! ```text
//! R-type: | op (6) | rs (5) | rt (5) | rd (5) | sa (5) | funct (6) |
//! I-type: | op (6) | rs (5) | rt (5) |        immediate (16)      |
//! J-type: | op (6) |               target (26)                   |
//! ```

/// Raw 32-bit instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Primary opcode, bits 31:26
    #[inline(always)]
    pub const fn op(self) -> u32 {
        self.0 >> 26
    }

    /// Bits 25:21
    #[inline(always)]
    pub const fn rs(self) -> u8 {
        ((self.0 >> 21) & 0x1F) as u8
    }

    /// Bits 20:16
    #[inline(always)]
    pub const fn rt(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    /// Bits 15:11
    #[inline(always)]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    /// Shift amount, bits 10:6
    #[inline(always)]
    pub const fn sa(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// Function field, bits 5:0
    #[inline(always)]
    pub const fn funct(self) -> u32 {
        self.0 & 0x3F
    }

    /// Zero-extended immediate
    #[inline(always)]
    pub const fn imm(self) -> u16 {
        self.0 as u16
    }

    /// Sign-extended immediate
    #[inline(always)]
    pub const fn simm(self) -> i16 {
        self.0 as i16
    }

    /// Jump target, bits 25:0
    #[inline(always)]
    pub const fn target(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Coprocessor command, bits 24:0
    #[inline(always)]
    pub const fn command(self) -> u32 {
        self.0 & 0x01FF_FFFF
    }

    /// Coprocessor number for COPz and LWCz/SWCz, bits 27:26
    #[inline(always)]
    pub const fn coprocessor(self) -> u8 {
        ((self.0 >> 26) & 3) as u8
    }

    /// Branch offset in bytes
    #[inline(always)]
    pub const fn branch_offset(self) -> i64 {
        (self.simm() as i64) << 2
    }
}

impl From<u32> for Instruction {
    fn from(word: u32) -> Self {
        Instruction(word)
    }
}
