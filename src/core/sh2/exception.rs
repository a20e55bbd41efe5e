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
//! Exception processing
//!
//! Entry pushes SR and then the return address on R15, reads the handler
//! address from the vector table at VBR and continues there. No status
//! register holds the cause; the vector number alone tells them apart.

use super::{Branch, Sh2};
use crate::core::bus::{Bus, Size};
use crate::core::debugger::Signal;

pub const VECTOR_POWER_ON_PC: u8 = 0;
pub const VECTOR_POWER_ON_SP: u8 = 1;
pub const VECTOR_ILLEGAL: u8 = 4;
pub const VECTOR_SLOT_ILLEGAL: u8 = 6;
pub const VECTOR_CPU_ADDRESS_ERROR: u8 = 9;
pub const VECTOR_NMI: u8 = 11;

/// Auto-vector of IRL level 1; levels share a vector in pairs
pub const AUTO_VECTOR_BASE: u8 = 64;

/// Vector fetched for an IRL level when no external vector is supplied
pub const fn auto_vector(level: u8) -> u8 {
    AUTO_VECTOR_BASE + (level >> 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    IllegalInstruction,
    /// Illegal instruction or branch in a delay slot
    SlotIllegal,
    AddressError,
    Nmi,
    /// TRAPA #imm
    Trap(u8),
    Interrupt { level: u8, vector: u8 },
}

impl Exception {
    pub const fn vector(self) -> u8 {
        match self {
            Exception::IllegalInstruction => VECTOR_ILLEGAL,
            Exception::SlotIllegal => VECTOR_SLOT_ILLEGAL,
            Exception::AddressError => VECTOR_CPU_ADDRESS_ERROR,
            Exception::Nmi => VECTOR_NMI,
            Exception::Trap(vector) => vector,
            Exception::Interrupt { vector, .. } => vector,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Exception::IllegalInstruction => "general illegal instruction",
            Exception::SlotIllegal => "slot illegal instruction",
            Exception::AddressError => "CPU address error",
            Exception::Nmi => "NMI",
            Exception::Trap(_) => "trap",
            Exception::Interrupt { .. } => "interrupt",
        }
    }

    pub const fn signal(self) -> Option<Signal> {
        match self {
            Exception::IllegalInstruction | Exception::SlotIllegal => Some(Signal::Illegal),
            Exception::AddressError => Some(Signal::Segmentation),
            Exception::Trap(_) => Some(Signal::Trap),
            Exception::Nmi | Exception::Interrupt { .. } => None,
        }
    }
}

impl Sh2 {
    /// Return address pushed for `exception`
    ///
    /// Faults inside a delay slot return to the branch that owns it. An
    /// interrupt that ends SLEEP returns past it.
    fn return_address(&self, exception: Exception) -> u32 {
        let faulting = if self.delay_slot {
            self.pc.wrapping_sub(2)
        } else {
            self.pc
        };
        match exception {
            Exception::Trap(_) => self.pc.wrapping_add(2),
            Exception::Nmi | Exception::Interrupt { .. } if self.sleeping => {
                self.pc.wrapping_add(2)
            }
            Exception::Nmi | Exception::Interrupt { .. } => self.pc,
            Exception::IllegalInstruction | Exception::AddressError => faulting,
            Exception::SlotIllegal => self.pc.wrapping_sub(2),
        }
    }

    /// Stack access during entry; a failure is logged and otherwise ignored
    fn push(&mut self, bus: &mut dyn Bus, value: u32) {
        self.r[15] = self.r[15].wrapping_sub(4);
        let address = self.r[15] & 0x1FFF_FFFF;
        if self.r[15] >> 29 == 0 && self.cache.enabled() {
            self.cache.write(Size::Word, address, value);
        }
        if bus.write(Size::Word, address, value as u64).is_err() {
            log::warn!(
                "SH-2: exception stack write to 0x{:08X} failed",
                self.r[15]
            );
        }
    }

    /// Enter the handler for `exception`
    pub(super) fn raise(&mut self, bus: &mut dyn Bus, exception: Exception) {
        let saved = self.return_address(exception);
        self.push(bus, self.sr.0);
        self.push(bus, saved);

        match exception {
            Exception::Nmi => self.sr.set_level(15),
            Exception::Interrupt { level, .. } => self.sr.set_level(level),
            _ => {}
        }

        let entry = self.vbr.wrapping_add(exception.vector() as u32 * 4);
        let target = match bus.read(Size::Word, entry & 0x1FFF_FFFF) {
            Ok(target) => target as u32,
            Err(_) => {
                log::warn!("SH-2: vector table read at 0x{:08X} failed", entry);
                0
            }
        };
        log::debug!(
            "SH-2: {} (vector {}), saved PC=0x{:08X} handler=0x{:08X}",
            exception.name(),
            exception.vector(),
            saved,
            target
        );
        self.debugger
            .exception(exception.name(), exception.signal(), self.pc as u64);

        self.pc = target;
        self.branch = Branch::Step;
        self.delay_slot = false;
        self.inhibit = false;
        self.sleeping = false;
        self.redirected = true;
    }

    /// Highest request above the current mask, NMI first
    pub(super) fn pending_interrupt(&self) -> Option<Exception> {
        if self.delay_slot || self.inhibit {
            return None;
        }
        if self.nmi {
            return Some(Exception::Nmi);
        }
        if self.irl == 0 {
            return None;
        }
        let level = 15 - self.irl.leading_zeros() as u8;
        (level > self.sr.level()).then(|| Exception::Interrupt {
            level,
            vector: self.vectors[level as usize],
        })
    }

    pub(super) fn interrupt_pending(&self) -> bool {
        self.pending_interrupt().is_some()
    }

    /// Accept the pending request, if any
    pub(super) fn take_interrupt(&mut self, bus: &mut dyn Bus) -> bool {
        let Some(exception) = self.pending_interrupt() else {
            return false;
        };
        if exception == Exception::Nmi {
            self.nmi = false;
        }
        self.raise(bus, exception);
        true
    }
}
