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
//! Hardware breakpoint unit
//!
//! Compares the program counter against BPC/BPCM and data addresses against
//! BDA/BDAM. A hit latches the DCIC status bits; with DCIC.TRAP set it also
//! raises a breakpoint exception through the debug vector.

use super::cop0::Dcic;
use super::exception::Exception;
use super::R3000a;

/// Direction of a data access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAccess {
    Read,
    Write,
}

impl R3000a {
    /// DCIC privilege enable for the current mode
    fn breakpoints_armed(&self, test: Dcic) -> bool {
        let dcic = self.cop0.dcic;
        let privilege = if self.cop0.status.user_mode() {
            Dcic::USER
        } else {
            Dcic::KERNEL
        };
        dcic.contains(Dcic::MASTER | test) && dcic.contains(privilege)
    }

    fn breakpoint_hit(&mut self, status: Dcic) -> bool {
        self.cop0.dcic.insert(Dcic::HIT_ANY | status);
        if !self.cop0.dcic.contains(Dcic::TRAP) {
            return false;
        }
        self.raise(Exception::debug());
        true
    }

    /// Execute breakpoint at the program counter
    pub(super) fn code_breakpoint(&mut self) -> bool {
        if !self.breakpoints_armed(Dcic::CODE) {
            return false;
        }
        if (self.pc ^ self.cop0.bpc) & self.cop0.bpcm != 0 {
            return false;
        }
        self.breakpoint_hit(Dcic::HIT_CODE)
    }

    /// Data breakpoint on a load or store address
    pub(super) fn data_breakpoint(&mut self, vaddr: u32, access: DataAccess) -> bool {
        let direction = match access {
            DataAccess::Read => Dcic::READ,
            DataAccess::Write => Dcic::WRITE,
        };
        if !self.breakpoints_armed(Dcic::DATA | direction) {
            return false;
        }
        if (vaddr ^ self.cop0.bda) & self.cop0.bdam != 0 {
            return false;
        }
        let hit = match access {
            DataAccess::Read => Dcic::HIT_READ,
            DataAccess::Write => Dcic::HIT_WRITE,
        };
        self.breakpoint_hit(Dcic::HIT_DATA | hit)
    }
}
