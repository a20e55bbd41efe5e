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

//! System control coprocessor (COP0) registers
//!
//! Each register is one integer; sub-fields are read and written through
//! shift/mask accessors.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Value returned for registers and fields with no defined contents
pub const UNDEFINED: u64 = 0;

/// COP0 register numbers
pub mod reg {
    pub const INDEX: u8 = 0;
    pub const RANDOM: u8 = 1;
    pub const ENTRY_LO0: u8 = 2;
    pub const ENTRY_LO1: u8 = 3;
    pub const CONTEXT: u8 = 4;
    pub const PAGE_MASK: u8 = 5;
    pub const WIRED: u8 = 6;
    pub const BAD_VADDR: u8 = 8;
    pub const COUNT: u8 = 9;
    pub const ENTRY_HI: u8 = 10;
    pub const COMPARE: u8 = 11;
    pub const STATUS: u8 = 12;
    pub const CAUSE: u8 = 13;
    pub const EPC: u8 = 14;
    pub const PRID: u8 = 15;
    pub const CONFIG: u8 = 16;
    pub const LL_ADDR: u8 = 17;
    pub const WATCH_LO: u8 = 18;
    pub const WATCH_HI: u8 = 19;
    pub const XCONTEXT: u8 = 20;
    pub const PARITY_ERROR: u8 = 26;
    pub const CACHE_ERROR: u8 = 27;
    pub const TAG_LO: u8 = 28;
    pub const TAG_HI: u8 = 29;
    pub const ERROR_EPC: u8 = 30;
}

/// Processor revision reported in PRId
pub const PRID: u64 = 0x0000_0B22;

/// Bits of Config that always read as set (EC, EP and the fixed pattern)
const CONFIG_FIXED: u32 = 0x7006_E460;
/// Writable bits of Config: CU, K0 and BE
const CONFIG_WRITABLE: u32 = 0x0000_800F;

/// Status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Status(pub u32);

impl Status {
    pub const IE: u32 = 1 << 0;
    pub const EXL: u32 = 1 << 1;
    pub const ERL: u32 = 1 << 2;
    pub const UX: u32 = 1 << 5;
    pub const SX: u32 = 1 << 6;
    pub const KX: u32 = 1 << 7;
    pub const DE: u32 = 1 << 16;
    pub const CE: u32 = 1 << 17;
    pub const CH: u32 = 1 << 18;
    pub const SR: u32 = 1 << 20;
    pub const TS: u32 = 1 << 21;
    pub const BEV: u32 = 1 << 22;
    pub const RE: u32 = 1 << 25;
    pub const FR: u32 = 1 << 26;
    pub const RP: u32 = 1 << 27;

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

    pub fn interrupt_enable(self) -> bool {
        self.bit(Self::IE)
    }

    pub fn exception_level(self) -> bool {
        self.bit(Self::EXL)
    }

    pub fn set_exception_level(&mut self, value: bool) {
        self.set(Self::EXL, value);
    }

    pub fn error_level(self) -> bool {
        self.bit(Self::ERL)
    }

    pub fn set_error_level(&mut self, value: bool) {
        self.set(Self::ERL, value);
    }

    /// KSU field: 0 kernel, 1 supervisor, 2 user
    pub fn privilege(self) -> u32 {
        (self.0 >> 3) & 3
    }

    pub fn user_extended(self) -> bool {
        self.bit(Self::UX)
    }

    pub fn supervisor_extended(self) -> bool {
        self.bit(Self::SX)
    }

    pub fn kernel_extended(self) -> bool {
        self.bit(Self::KX)
    }

    /// Interrupt mask, bits 15:8
    pub fn interrupt_mask(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn bootstrap_vectors(self) -> bool {
        self.bit(Self::BEV)
    }

    pub fn reverse_endian(self) -> bool {
        self.bit(Self::RE)
    }

    pub fn float_registers(self) -> bool {
        self.bit(Self::FR)
    }

    /// CU0-CU3 usable bits
    pub fn coprocessor_usable(self, unit: u8) -> bool {
        self.0 & (1 << (28 + (unit & 3))) != 0
    }
}

/// Cause register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Cause(pub u32);

impl Cause {
    /// Interrupt pending, bits 15:8
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

    pub fn set_exception_code(&mut self, code: u32) {
        self.0 = (self.0 & !0x7C) | ((code & 0x1F) << 2);
    }

    pub fn coprocessor_error(self) -> u8 {
        ((self.0 >> 28) & 3) as u8
    }

    pub fn set_coprocessor_error(&mut self, unit: u8) {
        self.0 = (self.0 & !(3 << 28)) | (((unit & 3) as u32) << 28);
    }

    pub fn branch_delay(self) -> bool {
        self.0 & (1 << 31) != 0
    }

    pub fn set_branch_delay(&mut self, value: bool) {
        if value {
            self.0 |= 1 << 31;
        } else {
            self.0 &= !(1 << 31);
        }
    }
}

/// EntryLo0/EntryLo1 layout: PFN 29:6, C 5:3, D 2, V 1, G 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct EntryLo(pub u32);

impl EntryLo {
    pub const MASK: u32 = 0x3FFF_FFFF;

    pub fn global(self) -> bool {
        self.0 & 1 != 0
    }

    pub fn valid(self) -> bool {
        self.0 & 2 != 0
    }

    pub fn dirty(self) -> bool {
        self.0 & 4 != 0
    }

    pub fn cache_algorithm(self) -> u32 {
        (self.0 >> 3) & 7
    }

    /// Page frame number, bits 29:6
    pub fn frame(self) -> u32 {
        (self.0 >> 6) & 0x00FF_FFFF
    }
}

/// The register file of the system control coprocessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Scc {
    pub index: u32,
    pub random: u32,
    pub entry_lo: [EntryLo; 2],
    pub context: u64,
    pub page_mask: u32,
    pub wired: u32,
    pub bad_vaddr: u64,
    pub count: u32,
    pub entry_hi: u64,
    pub compare: u32,
    pub status: Status,
    pub cause: Cause,
    pub epc: u64,
    pub config: u32,
    pub ll_addr: u32,
    pub watch_lo: u32,
    pub watch_hi: u32,
    pub xcontext: u64,
    pub parity_error: u32,
    pub tag_lo: u32,
    pub error_epc: u64,
    /// Load-linked bit, cleared by ERET and by a store-conditional
    pub ll_bit: bool,
    /// Odd cycle carried between Count increments
    pub count_phase: u32,
}

impl Scc {
    /// Index register probe failure flag
    pub const PROBE_FAILURE: u32 = 1 << 31;

    pub fn new() -> Self {
        Self {
            index: 0,
            random: 31,
            entry_lo: [EntryLo::default(); 2],
            context: 0,
            page_mask: 0,
            wired: 0,
            bad_vaddr: 0,
            count: 0,
            entry_hi: 0,
            compare: 0,
            // BEV and ERL set, kernel mode
            status: Status(Status::BEV | Status::ERL),
            cause: Cause::default(),
            epc: 0,
            // Big-endian, kseg0 uncached
            config: 0x0000_8002,
            ll_addr: 0,
            watch_lo: 0,
            watch_hi: 0,
            xcontext: 0,
            parity_error: 0,
            tag_lo: 0,
            error_epc: 0,
            ll_bit: false,
            count_phase: 0,
        }
    }

    /// ASID of the current address space
    pub fn asid(&self) -> u8 {
        self.entry_hi as u8
    }

    /// Cache algorithm of kseg0 (Config.K0)
    pub fn kseg0_algorithm(&self) -> u32 {
        self.config & 7
    }

    /// Read register `index` as a 64-bit value
    ///
    /// Undefined register numbers read [`UNDEFINED`].
    pub fn read(&self, index: u8) -> u64 {
        match index {
            reg::INDEX => self.index as u64,
            reg::RANDOM => self.random as u64,
            reg::ENTRY_LO0 => self.entry_lo[0].0 as u64,
            reg::ENTRY_LO1 => self.entry_lo[1].0 as u64,
            reg::CONTEXT => self.context,
            reg::PAGE_MASK => self.page_mask as u64,
            reg::WIRED => self.wired as u64,
            reg::BAD_VADDR => self.bad_vaddr,
            reg::COUNT => self.count as u64,
            reg::ENTRY_HI => self.entry_hi,
            reg::COMPARE => self.compare as u64,
            reg::STATUS => self.status.0 as u64,
            reg::CAUSE => self.cause.0 as u64,
            reg::EPC => self.epc,
            reg::PRID => PRID,
            reg::CONFIG => ((self.config & CONFIG_WRITABLE) | CONFIG_FIXED) as u64,
            reg::LL_ADDR => self.ll_addr as u64,
            reg::WATCH_LO => self.watch_lo as u64,
            reg::WATCH_HI => self.watch_hi as u64,
            reg::XCONTEXT => self.xcontext,
            reg::PARITY_ERROR => self.parity_error as u64,
            reg::CACHE_ERROR => 0,
            reg::TAG_LO => self.tag_lo as u64,
            reg::TAG_HI => 0,
            reg::ERROR_EPC => self.error_epc,
            _ => {
                log::warn!("VR4300: read of undefined COP0 register {}", index);
                UNDEFINED
            }
        }
    }

    /// Write register `index`, applying each register's writable mask
    pub fn write(&mut self, index: u8, value: u64) {
        match index {
            reg::INDEX => self.index = (self.index & Self::PROBE_FAILURE) | (value as u32 & 0x3F),
            reg::RANDOM => {}
            reg::ENTRY_LO0 => self.entry_lo[0] = EntryLo(value as u32 & EntryLo::MASK),
            reg::ENTRY_LO1 => self.entry_lo[1] = EntryLo(value as u32 & EntryLo::MASK),
            reg::CONTEXT => {
                self.context = (value & !0x7F_FFFF) | (self.context & 0x7F_FFF0);
            }
            reg::PAGE_MASK => self.page_mask = value as u32 & 0x01FF_E000,
            reg::WIRED => {
                self.wired = value as u32 & 0x3F;
                self.random = 31;
            }
            reg::BAD_VADDR => {}
            reg::COUNT => {
                self.count = value as u32;
                self.count_phase = 0;
            }
            reg::ENTRY_HI => self.entry_hi = value & 0xC000_00FF_FFFF_E0FF,
            reg::COMPARE => {
                self.compare = value as u32;
                self.cause.set_interrupt_pending(7, false);
            }
            reg::STATUS => self.status = Status(value as u32),
            reg::CAUSE => {
                // Only the two software interrupt bits are writable
                self.cause.0 = (self.cause.0 & !0x300) | (value as u32 & 0x300);
            }
            reg::EPC => self.epc = value,
            reg::PRID => {}
            reg::CONFIG => self.config = value as u32 & CONFIG_WRITABLE,
            reg::LL_ADDR => self.ll_addr = value as u32,
            reg::WATCH_LO => self.watch_lo = value as u32 & 0xFFFF_FFFB,
            reg::WATCH_HI => self.watch_hi = value as u32 & 0xF,
            reg::XCONTEXT => {
                self.xcontext = (value & !0x1_FFFF_FFFF) | (self.xcontext & 0x1_FFFF_FFF0);
            }
            reg::PARITY_ERROR => self.parity_error = value as u32 & 0xFF,
            reg::CACHE_ERROR => {}
            reg::TAG_LO => self.tag_lo = value as u32 & 0x0FFF_FFC0,
            reg::TAG_HI => {}
            reg::ERROR_EPC => self.error_epc = value,
            _ => log::warn!("VR4300: write to undefined COP0 register {}", index),
        }
    }

    /// Record a faulting virtual address in BadVAddr, Context, XContext
    /// and EntryHi
    pub fn set_fault_address(&mut self, vaddr: u64, tlb: bool) {
        self.bad_vaddr = vaddr;
        if !tlb {
            return;
        }
        let vpn2 = (vaddr >> 13) & 0x7FF_FFFF;
        self.context = (self.context & !0x7F_FFF0) | ((vpn2 & 0x7_FFFF) << 4);
        let region = vaddr >> 62;
        self.xcontext = (self.xcontext & !0x1_FFFF_FFF0) | (region << 31) | (vpn2 << 4);
        self.entry_hi = (vaddr & 0xC000_00FF_FFFF_E000) | (self.entry_hi & 0xFF);
    }

    /// Advance Random one step, wrapping from Wired back to 31
    pub fn tick_random(&mut self) {
        if self.random <= self.wired {
            self.random = 31;
        } else {
            self.random -= 1;
        }
    }
}

impl Default for Scc {
    fn default() -> Self {
        Self::new()
    }
}
