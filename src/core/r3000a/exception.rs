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
//! Exception controller
//!
//! Entry pushes the KU/IE stack, records the cause and EPC, and jumps to
//! one of two vectors: the general vector, or the debug vector used by the
//! breakpoint unit. Both move to the ROM copies while SR.BEV is set.

use super::R3000a;
use crate::core::debugger::Signal;

/// Cause.ExcCode values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExceptionCode {
    Interrupt = 0,
    AddressLoad = 4,
    AddressStore = 5,
    InstructionBus = 6,
    DataBus = 7,
    Syscall = 8,
    Breakpoint = 9,
    ReservedInstruction = 10,
    CoprocessorUnusable = 11,
    Overflow = 12,
}

impl ExceptionCode {
    pub const fn name(self) -> &'static str {
        match self {
            ExceptionCode::Interrupt => "interrupt",
            ExceptionCode::AddressLoad => "address error load",
            ExceptionCode::AddressStore => "address error store",
            ExceptionCode::InstructionBus => "bus error instruction",
            ExceptionCode::DataBus => "bus error data",
            ExceptionCode::Syscall => "system call",
            ExceptionCode::Breakpoint => "breakpoint",
            ExceptionCode::ReservedInstruction => "reserved instruction",
            ExceptionCode::CoprocessorUnusable => "coprocessor unusable",
            ExceptionCode::Overflow => "arithmetic overflow",
        }
    }

    pub const fn signal(self) -> Option<Signal> {
        match self {
            ExceptionCode::Interrupt | ExceptionCode::Syscall => None,
            ExceptionCode::AddressLoad | ExceptionCode::AddressStore => Some(Signal::Segmentation),
            ExceptionCode::InstructionBus | ExceptionCode::DataBus => Some(Signal::Bus),
            ExceptionCode::Breakpoint => Some(Signal::Trap),
            ExceptionCode::ReservedInstruction | ExceptionCode::CoprocessorUnusable => {
                Some(Signal::Illegal)
            }
            ExceptionCode::Overflow => Some(Signal::FloatingPoint),
        }
    }
}

/// A fault on its way to the exception controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    pub code: ExceptionCode,
    pub coprocessor: u8,
    /// Raised by the breakpoint unit; uses the debug vector
    pub debug: bool,
}

impl Exception {
    pub const fn new(code: ExceptionCode) -> Self {
        Self {
            code,
            coprocessor: 0,
            debug: false,
        }
    }

    pub const fn coprocessor_unusable(unit: u8) -> Self {
        Self {
            code: ExceptionCode::CoprocessorUnusable,
            coprocessor: unit,
            debug: false,
        }
    }

    pub const fn debug() -> Self {
        Self {
            code: ExceptionCode::Breakpoint,
            coprocessor: 0,
            debug: true,
        }
    }
}

pub const GENERAL_VECTOR: u32 = 0x8000_0080;
pub const BOOTSTRAP_GENERAL_VECTOR: u32 = 0xBFC0_0180;
pub const DEBUG_VECTOR: u32 = 0x8000_0040;
pub const BOOTSTRAP_DEBUG_VECTOR: u32 = 0xBFC0_0140;

/// Exception vector address
pub const fn vector(exception: Exception, bootstrap: bool) -> u32 {
    match (exception.debug, bootstrap) {
        (false, false) => GENERAL_VECTOR,
        (false, true) => BOOTSTRAP_GENERAL_VECTOR,
        (true, false) => DEBUG_VECTOR,
        (true, true) => BOOTSTRAP_DEBUG_VECTOR,
    }
}

impl R3000a {
    /// Enter the exception handler
    ///
    /// EPC is the faulting instruction, or the branch when the fault hit a
    /// delay slot. Any branch still pending is dropped.
    pub(super) fn raise(&mut self, exception: Exception) {
        let epc = if self.delay_slot {
            self.pc.wrapping_sub(4)
        } else {
            self.pc
        };
        self.cop0.epc = epc;
        self.cop0.cause.enter(
            exception.code as u32,
            exception.coprocessor,
            self.delay_slot,
            self.taken,
        );
        self.cop0.status.push();

        let target = vector(exception, self.cop0.status.bootstrap_vectors());
        log::debug!(
            "R3000A: {} exception, EPC=0x{:08X} vector=0x{:08X}",
            exception.code.name(),
            epc,
            target
        );
        self.debugger
            .exception(exception.code.name(), exception.code.signal(), self.pc as u64);

        self.pc = target;
        self.next_pc = target.wrapping_add(4);
        self.jump = None;
        self.redirected = true;
    }

    /// Raise an address error, recording BadVAddr
    pub(super) fn raise_address(&mut self, code: ExceptionCode, vaddr: u32) {
        self.cop0.bad_vaddr = vaddr;
        self.raise(Exception::new(code));
    }

    pub(super) fn interrupt_pending(&self) -> bool {
        let status = self.cop0.status;
        status.interrupt_enable()
            && self.cop0.cause.interrupt_pending() & status.interrupt_mask() != 0
    }
}
