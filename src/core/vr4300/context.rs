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

//! Privilege mode and address segment map
//!
//! ```text
//! 32-bit kernel                  64-bit kernel
//! 0000_0000 kuseg  mapped        0000_0000_0000_0000 xkuseg mapped
//! 8000_0000 kseg0  cached        4000_0000_0000_0000 xksseg mapped
//! A000_0000 kseg1  uncached      8000_0000_0000_0000 xkphys direct
//! C000_0000 ksseg  mapped        C000_0000_0000_0000 xkseg  mapped
//! E000_0000 kseg3  mapped        FFFF_FFFF_8000_0000 ckseg0..3
//! ```

use super::scc::Status;

/// Privilege mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Kernel,
    Supervisor,
    User,
}

/// How an address reaches the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Not accessible from the current mode; address error
    Invalid,
    /// Translated through the TLB
    Mapped,
    /// Direct mapped through the caches
    Cached(u32),
    /// Direct mapped, bypassing the caches
    Uncached(u32),
}

/// Addressing context derived from Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub mode: Mode,
    /// 64-bit addressing for the current mode (KX, SX or UX)
    pub extended: bool,
    /// kuseg is unmapped while Status.ERL is set
    pub error_level: bool,
    /// Config.K0 selects a cached kseg0
    pub kseg0_cached: bool,
}

impl Context {
    pub fn new(status: Status, kseg0_algorithm: u32) -> Self {
        let mode = if status.exception_level() || status.error_level() {
            Mode::Kernel
        } else {
            match status.privilege() {
                0 => Mode::Kernel,
                1 => Mode::Supervisor,
                // KSU=3 is undefined; it behaves as user mode
                _ => Mode::User,
            }
        };
        let extended = match mode {
            Mode::Kernel => status.kernel_extended(),
            Mode::Supervisor => status.supervisor_extended(),
            Mode::User => status.user_extended(),
        };
        Self {
            mode,
            extended,
            error_level: status.error_level(),
            kseg0_cached: kseg0_algorithm != 2,
        }
    }

    /// Whether 64-bit integer operations are permitted
    pub fn dword_allowed(&self) -> bool {
        self.mode == Mode::Kernel || self.extended
    }

    /// Packed mode bits used to key recompiled blocks
    pub fn bits(&self) -> u32 {
        let mode = match self.mode {
            Mode::Kernel => 0,
            Mode::Supervisor => 1,
            Mode::User => 2,
        };
        mode | (self.extended as u32) << 2 | (self.error_level as u32) << 3
    }

    /// Route `vaddr` to a segment
    pub fn segment(&self, vaddr: u64) -> Segment {
        if self.extended {
            self.segment64(vaddr)
        } else {
            self.segment32(vaddr as u32)
        }
    }

    fn kseg0(&self, physical: u32) -> Segment {
        if self.kseg0_cached {
            Segment::Cached(physical)
        } else {
            Segment::Uncached(physical)
        }
    }

    fn useg(&self, vaddr: u64) -> Segment {
        if self.error_level && self.mode == Mode::Kernel && vaddr <= 0x7FFF_FFFF {
            Segment::Uncached(vaddr as u32)
        } else {
            Segment::Mapped
        }
    }

    fn segment32(&self, vaddr: u32) -> Segment {
        match self.mode {
            Mode::Kernel => match vaddr {
                0x0000_0000..=0x7FFF_FFFF => self.useg(vaddr as u64),
                0x8000_0000..=0x9FFF_FFFF => self.kseg0(vaddr & 0x1FFF_FFFF),
                0xA000_0000..=0xBFFF_FFFF => Segment::Uncached(vaddr & 0x1FFF_FFFF),
                _ => Segment::Mapped,
            },
            Mode::Supervisor => match vaddr {
                0x0000_0000..=0x7FFF_FFFF | 0xC000_0000..=0xDFFF_FFFF => Segment::Mapped,
                _ => Segment::Invalid,
            },
            Mode::User => match vaddr {
                0x0000_0000..=0x7FFF_FFFF => Segment::Mapped,
                _ => Segment::Invalid,
            },
        }
    }

    fn segment64(&self, vaddr: u64) -> Segment {
        match self.mode {
            Mode::Kernel => match vaddr {
                0x0000_0000_0000_0000..=0x0000_00FF_FFFF_FFFF => self.useg(vaddr),
                0x4000_0000_0000_0000..=0x4000_00FF_FFFF_FFFF => Segment::Mapped,
                0x8000_0000_0000_0000..=0xBFFF_FFFF_FFFF_FFFF => xkphys(vaddr),
                0xC000_0000_0000_0000..=0xC000_00FF_7FFF_FFFF => Segment::Mapped,
                0xFFFF_FFFF_8000_0000..=0xFFFF_FFFF_9FFF_FFFF => {
                    self.kseg0(vaddr as u32 & 0x1FFF_FFFF)
                }
                0xFFFF_FFFF_A000_0000..=0xFFFF_FFFF_BFFF_FFFF => {
                    Segment::Uncached(vaddr as u32 & 0x1FFF_FFFF)
                }
                0xFFFF_FFFF_C000_0000..=0xFFFF_FFFF_FFFF_FFFF => Segment::Mapped,
                _ => Segment::Invalid,
            },
            Mode::Supervisor => match vaddr {
                0x0000_0000_0000_0000..=0x0000_00FF_FFFF_FFFF
                | 0x4000_0000_0000_0000..=0x4000_00FF_FFFF_FFFF
                | 0xFFFF_FFFF_C000_0000..=0xFFFF_FFFF_DFFF_FFFF => Segment::Mapped,
                _ => Segment::Invalid,
            },
            Mode::User => match vaddr {
                0x0000_0000_0000_0000..=0x0000_00FF_FFFF_FFFF => Segment::Mapped,
                _ => Segment::Invalid,
            },
        }
    }
}

/// xkphys: bits 61:59 carry the cache algorithm, bits 31:0 the physical
/// address; anything in bits 58:32 is an address error
fn xkphys(vaddr: u64) -> Segment {
    if vaddr & 0x07FF_FFFF_0000_0000 != 0 {
        return Segment::Invalid;
    }
    let physical = vaddr as u32;
    match (vaddr >> 59) & 7 {
        2 => Segment::Uncached(physical),
        _ => Segment::Cached(physical),
    }
}
