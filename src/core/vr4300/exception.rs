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
//! Every fault raised by a semantic routine, the address translation unit or
//! a cache funnels through [`Vr4300::raise`]. The vector is a pure function
//! of the exception, the Status register and the addressing width, see
//! [`vector`].

use super::Vr4300;
use crate::core::debugger::Signal;

/// Cause.ExcCode values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExceptionCode {
    Interrupt = 0,
    TlbModification = 1,
    TlbLoad = 2,
    TlbStore = 3,
    AddressLoad = 4,
    AddressStore = 5,
    InstructionBus = 6,
    DataBus = 7,
    Syscall = 8,
    Breakpoint = 9,
    ReservedInstruction = 10,
    CoprocessorUnusable = 11,
    Overflow = 12,
    Trap = 13,
    FloatingPoint = 15,
    Watch = 23,
}

impl ExceptionCode {
    /// Symbolic reason reported to tracers
    pub const fn name(self) -> &'static str {
        match self {
            ExceptionCode::Interrupt => "interrupt",
            ExceptionCode::TlbModification => "tlb modification",
            ExceptionCode::TlbLoad => "tlb load",
            ExceptionCode::TlbStore => "tlb store",
            ExceptionCode::AddressLoad => "address error load",
            ExceptionCode::AddressStore => "address error store",
            ExceptionCode::InstructionBus => "bus error instruction",
            ExceptionCode::DataBus => "bus error data",
            ExceptionCode::Syscall => "system call",
            ExceptionCode::Breakpoint => "breakpoint",
            ExceptionCode::ReservedInstruction => "reserved instruction",
            ExceptionCode::CoprocessorUnusable => "coprocessor unusable",
            ExceptionCode::Overflow => "arithmetic overflow",
            ExceptionCode::Trap => "trap",
            ExceptionCode::FloatingPoint => "floating point",
            ExceptionCode::Watch => "watch",
        }
    }

    /// Signal reported to a remote debugger, if any
    pub const fn signal(self) -> Option<Signal> {
        match self {
            ExceptionCode::Interrupt | ExceptionCode::Syscall => None,
            ExceptionCode::TlbModification
            | ExceptionCode::TlbLoad
            | ExceptionCode::TlbStore
            | ExceptionCode::AddressLoad
            | ExceptionCode::AddressStore => Some(Signal::Segmentation),
            ExceptionCode::InstructionBus | ExceptionCode::DataBus => Some(Signal::Bus),
            ExceptionCode::Breakpoint | ExceptionCode::Trap | ExceptionCode::Watch => {
                Some(Signal::Trap)
            }
            ExceptionCode::ReservedInstruction | ExceptionCode::CoprocessorUnusable => {
                Some(Signal::Illegal)
            }
            ExceptionCode::Overflow | ExceptionCode::FloatingPoint => Some(Signal::FloatingPoint),
        }
    }
}

/// A fault on its way to the exception controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    pub code: ExceptionCode,
    /// Coprocessor number for CpU
    pub coprocessor: u8,
    /// TLB refill: no entry matched the address
    pub tlb_miss: bool,
}

impl Exception {
    pub const fn new(code: ExceptionCode) -> Self {
        Self {
            code,
            coprocessor: 0,
            tlb_miss: false,
        }
    }

    pub const fn coprocessor_unusable(unit: u8) -> Self {
        Self {
            code: ExceptionCode::CoprocessorUnusable,
            coprocessor: unit,
            tlb_miss: false,
        }
    }

    pub const fn tlb_miss(code: ExceptionCode) -> Self {
        Self {
            code,
            coprocessor: 0,
            tlb_miss: true,
        }
    }
}

/// Vector base while Status.BEV is clear
pub const VECTOR_BASE: u64 = 0xFFFF_FFFF_8000_0000;
/// Vector base while Status.BEV is set
pub const BOOTSTRAP_VECTOR_BASE: u64 = 0xFFFF_FFFF_BFC0_0200;

/// Exception vector address
///
/// `exception_level` is Status.EXL at the time of the fault; TLB refills
/// taken while EXL is already set go to the general vector. `extended` is
/// the 64-bit addressing flag of the faulting mode.
pub const fn vector(
    exception: Exception,
    exception_level: bool,
    bootstrap: bool,
    extended: bool,
) -> u64 {
    let base = if bootstrap {
        BOOTSTRAP_VECTOR_BASE
    } else {
        VECTOR_BASE
    };
    let offset = if exception.tlb_miss && !exception_level {
        if extended {
            0x080
        } else {
            0x000
        }
    } else {
        0x180
    };
    base.wrapping_add(offset)
}

impl Vr4300 {
    /// Enter the exception handler
    ///
    /// EPC and Cause.BD are only written when Status.EXL was clear. The
    /// branch state moves to `Exception` so the epilogue leaves the program
    /// counter at the vector.
    pub(super) fn raise(&mut self, exception: Exception) {
        let status = self.scc.status;
        let exception_level = status.exception_level();
        let extended = self.context().extended;
        let in_delay_slot = self.branch.in_delay_slot();

        if !exception_level {
            let epc = if in_delay_slot {
                self.pc.wrapping_sub(4)
            } else {
                self.pc
            };
            self.scc.epc = epc;
            self.scc.cause.set_branch_delay(in_delay_slot);
        }
        self.scc.cause.set_exception_code(exception.code as u32);
        self.scc.cause.set_coprocessor_error(exception.coprocessor);
        self.scc.status.set_exception_level(true);

        let target = vector(
            exception,
            exception_level,
            status.bootstrap_vectors(),
            extended,
        );
        log::debug!(
            "VR4300: {} exception, EPC=0x{:016X} vector=0x{:016X}",
            exception.code.name(),
            self.scc.epc,
            target
        );
        self.debugger
            .exception(exception.code.name(), exception.code.signal(), self.pc);

        self.pc = target;
        self.branch.exception();
    }

    /// Raise an address or TLB fault, recording the faulting address
    pub(super) fn raise_address(&mut self, exception: Exception, vaddr: u64) {
        let tlb = matches!(
            exception.code,
            ExceptionCode::TlbModification | ExceptionCode::TlbLoad | ExceptionCode::TlbStore
        );
        self.scc.set_fault_address(vaddr, tlb);
        self.raise(exception);
    }

    /// Whether an enabled interrupt is waiting to be taken
    pub(super) fn interrupt_pending(&self) -> bool {
        let status = self.scc.status;
        status.interrupt_enable()
            && !status.exception_level()
            && !status.error_level()
            && self.scc.cause.interrupt_pending() & status.interrupt_mask() != 0
    }
}
