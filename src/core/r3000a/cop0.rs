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
//! System control coprocessor (COP0)
//!
//! The R3000A has no TLB; COP0 holds the status and cause registers, the
//! exception program counter and the breakpoint unit.

use bincode::{Decode, Encode};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Value returned for registers with no defined contents
pub const UNDEFINED: u32 = 0;

/// COP0 register numbers
pub mod reg {
    /// Breakpoint on execute address
    pub const BPC: u8 = 3;
    /// Breakpoint on data access address
    pub const BDA: u8 = 5;
    /// Target address of the last taken jump
    pub const TAR: u8 = 6;
    /// Breakpoint control
    pub const DCIC: u8 = 7;
    pub const BAD_VADDR: u8 = 8;
    /// Breakpoint on data access mask
    pub const BDAM: u8 = 9;
    /// Breakpoint on execute mask
    pub const BPCM: u8 = 11;
    pub const SR: u8 = 12;
    pub const CAUSE: u8 = 13;
    pub const EPC: u8 = 14;
    pub const PRID: u8 = 15;
}

/// Processor revision reported in PRId
pub const PRID: u32 = 0x0000_0002;

bitflags! {
    /// Breakpoint control register (DCIC)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Dcic: u32 {
        /// Status: some breakpoint hit
        const HIT_ANY = 1 << 0;
        const HIT_CODE = 1 << 1;
        const HIT_DATA = 1 << 2;
        const HIT_READ = 1 << 3;
        const HIT_WRITE = 1 << 4;
        const HIT_TRACE = 1 << 5;
        const REDIRECTION = 3 << 12;
        const UNKNOWN = 3 << 14;
        const MASTER = 1 << 23;
        /// Test enables
        const CODE = 1 << 24;
        const DATA = 1 << 25;
        const READ = 1 << 26;
        const WRITE = 1 << 27;
        const TRACE = 1 << 28;
        /// Privilege enables
        const KERNEL = 1 << 29;
        const USER = 1 << 30;
        /// Trap to the debug vector on a hit
        const TRAP = 1 << 31;
    }
}

/// Status register (SR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Status(pub u32);

impl Status {
    /// Current interrupt enable
    pub const IEC: u32 = 1 << 0;
    /// Current mode is user
    pub const KUC: u32 = 1 << 1;
    /// Isolate cache
    pub const ISC: u32 = 1 << 16;
    /// Swap caches
    pub const SWC: u32 = 1 << 17;
    pub const TS: u32 = 1 << 21;
    pub const BEV: u32 = 1 << 22;
    pub const RE: u32 = 1 << 25;
    /// TS is read-only
    const WRITABLE: u32 = !Self::TS;

    #[inline(always)]
    fn bit(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    pub fn interrupt_enable(self) -> bool {
        self.bit(Self::IEC)
    }

    pub fn user_mode(self) -> bool {
        self.bit(Self::KUC)
    }

    pub fn isolate_cache(self) -> bool {
        self.bit(Self::ISC)
    }

    pub fn bootstrap_vectors(self) -> bool {
        self.bit(Self::BEV)
    }

    /// Interrupt mask, bits 15:8
    pub fn interrupt_mask(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// CU0-CU3 usable bits
    pub fn coprocessor_usable(self, unit: u8) -> bool {
        self.0 & (1 << (28 + (unit & 3))) != 0
    }

    /// Exception entry: push the KU/IE stack and enter kernel mode with
    /// interrupts disabled
    pub fn push(&mut self) {
        let stack = self.0 & 0x3F;
        self.0 = (self.0 & !0x3F) | ((stack << 2) & 0x3F);
    }

    /// RFE: pop the KU/IE stack; the old pair is left in place
    pub fn pop(&mut self) {
        let stack = self.0 & 0x3F;
        self.0 = (self.0 & !0x0F) | (stack >> 2);
    }
}

/// Cause register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Cause(pub u32);

impl Cause {
    pub const BT: u32 = 1 << 30;
    pub const BD: u32 = 1 << 31;
    /// IP0 and IP1 are the only software-writable bits
    const WRITABLE: u32 = 3 << 8;

    pub fn interrupt_pending(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn set_interrupt_pending(&mut self, line: u8, value: bool) {
        let mask = 1 << (8 + (line & 7));
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn exception_code(self) -> u32 {
        (self.0 >> 2) & 0x1F
    }

    pub fn coprocessor_error(self) -> u8 {
        ((self.0 >> 28) & 3) as u8
    }

    pub fn branch_delay(self) -> bool {
        self.0 & Self::BD != 0
    }

    pub fn branch_taken(self) -> bool {
        self.0 & Self::BT != 0
    }

    /// Record an exception; IP bits are preserved
    pub fn enter(&mut self, code: u32, coprocessor: u8, delay_slot: bool, taken: bool) {
        let mut value = self.0 & (0xFF << 8);
        value |= (code & 0x1F) << 2;
        value |= ((coprocessor & 3) as u32) << 28;
        if delay_slot {
            value |= Self::BD;
            if taken {
                value |= Self::BT;
            }
        }
        self.0 = value;
    }
}

/// COP0 register file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Cop0 {
    pub bpc: u32,
    pub bda: u32,
    pub tar: u32,
    #[bincode(with_serde)]
    pub dcic: Dcic,
    pub bad_vaddr: u32,
    pub bdam: u32,
    pub bpcm: u32,
    pub status: Status,
    pub cause: Cause,
    pub epc: u32,
}

impl Cop0 {
    /// Power-on values: BEV set, COP0 and COP2 usable
    pub fn new() -> Self {
        Self {
            bpc: 0,
            bda: 0,
            tar: 0,
            dcic: Dcic::empty(),
            bad_vaddr: 0,
            bdam: 0,
            bpcm: 0,
            status: Status(Status::BEV | 1 << 28 | 1 << 30),
            cause: Cause(0),
            epc: 0,
        }
    }

    /// MFC0 read; `None` for register numbers above 15
    pub fn read(&self, index: u8) -> Option<u32> {
        let value = match index {
            reg::BPC => self.bpc,
            reg::BDA => self.bda,
            reg::TAR => self.tar,
            reg::DCIC => self.dcic.bits(),
            reg::BAD_VADDR => self.bad_vaddr,
            reg::BDAM => self.bdam,
            reg::BPCM => self.bpcm,
            reg::SR => self.status.0,
            reg::CAUSE => self.cause.0,
            reg::EPC => self.epc,
            reg::PRID => PRID,
            0..=15 => {
                log::warn!("R3000A: read of undefined COP0 register {}", index);
                UNDEFINED
            }
            _ => return None,
        };
        Some(value)
    }

    /// MTC0 write; read-only registers ignore the value
    pub fn write(&mut self, index: u8, value: u32) {
        match index {
            reg::BPC => self.bpc = value,
            reg::BDA => self.bda = value,
            reg::DCIC => self.dcic = Dcic::from_bits_truncate(value),
            reg::BDAM => self.bdam = value,
            reg::BPCM => self.bpcm = value,
            reg::SR => {
                self.status.0 = (self.status.0 & !Status::WRITABLE) | (value & Status::WRITABLE)
            }
            reg::CAUSE => {
                self.cause.0 = (self.cause.0 & !Cause::WRITABLE) | (value & Cause::WRITABLE)
            }
            reg::EPC => self.epc = value,
            reg::TAR | reg::BAD_VADDR | reg::PRID => {}
            _ => log::warn!(
                "R3000A: write of undefined COP0 register {} = 0x{:08X}",
                index,
                value
            ),
        }
    }
}

impl Default for Cop0 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_stack_push_and_pop() {
        let mut status = Status(0b00_01_11);
        status.push();
        assert_eq!(status.0 & 0x3F, 0b01_11_00);
        status.pop();
        assert_eq!(status.0 & 0x3F, 0b01_01_11);
    }

    #[test]
    fn test_cause_keeps_pending_interrupts() {
        let mut cause = Cause(0);
        cause.set_interrupt_pending(2, true);
        cause.enter(12, 2, true, true);
        assert_eq!(cause.exception_code(), 12);
        assert_eq!(cause.coprocessor_error(), 2);
        assert!(cause.branch_delay());
        assert!(cause.branch_taken());
        assert_eq!(cause.interrupt_pending(), 1 << 2);
    }

    #[test]
    fn test_read_only_registers() {
        let mut cop0 = Cop0::new();
        cop0.write(reg::PRID, 0xFFFF);
        cop0.write(reg::BAD_VADDR, 0x1234);
        cop0.write(reg::CAUSE, 0xFFFF_FFFF);
        assert_eq!(cop0.read(reg::PRID), Some(PRID));
        assert_eq!(cop0.read(reg::BAD_VADDR), Some(0));
        assert_eq!(cop0.read(reg::CAUSE), Some(0x300));
    }

    #[test]
    fn test_undefined_registers() {
        let cop0 = Cop0::new();
        assert_eq!(cop0.read(0), Some(UNDEFINED));
        assert_eq!(cop0.read(10), Some(UNDEFINED));
        assert_eq!(cop0.read(16), None);
    }

    #[test]
    fn test_dcic_round_trip() {
        let mut cop0 = Cop0::new();
        let value = (Dcic::MASTER | Dcic::CODE | Dcic::KERNEL | Dcic::TRAP).bits();
        cop0.write(reg::DCIC, value);
        assert_eq!(cop0.read(reg::DCIC), Some(value));
    }
}
