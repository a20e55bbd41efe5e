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

//! Common processor interface
//!
//! The three cores share one execution contract:
//!
//! - [`Processor::step`] runs exactly one instruction through the
//!   interpreter (or delivers one interrupt)
//! - [`Processor::execute`] runs one dispatch unit: a recompiled block when
//!   the recompiler is enabled and no debug hook is attached, otherwise one
//!   interpreted instruction
//! - [`Processor::run`] repeats `execute` until a cycle budget is spent

use crate::core::bus::{Bus, Endian};
use crate::core::debugger::Debugger;
use crate::core::error::{EmulatorError, Result};
use crate::core::save_state::ProcessorState;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Instruction set selector
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Isa {
    /// MIPS R3000A (MIPS I, 32-bit)
    R3000a,
    /// NEC VR4300 (MIPS III, 64-bit)
    Vr4300,
    /// Hitachi SH-2 (SH7604)
    Sh2,
}

impl Isa {
    pub const fn name(self) -> &'static str {
        match self {
            Isa::R3000a => "r3000a",
            Isa::Vr4300 => "vr4300",
            Isa::Sh2 => "sh2",
        }
    }

    /// Byte order of the memory this processor expects
    pub const fn endian(self) -> Endian {
        match self {
            Isa::R3000a => Endian::Little,
            Isa::Vr4300 | Isa::Sh2 => Endian::Big,
        }
    }
}

impl std::fmt::Display for Isa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Isa {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "r3000a" | "r3000" | "psx" => Ok(Isa::R3000a),
            "vr4300" | "n64" => Ok(Isa::Vr4300),
            "sh2" | "sh-2" | "sh7604" => Ok(Isa::Sh2),
            _ => Err(EmulatorError::UnknownIsa(s.to_string())),
        }
    }
}

/// A processor core
pub trait Processor {
    fn isa(&self) -> Isa;

    /// Power-on reset
    fn reset(&mut self);

    /// Address of the next instruction
    fn pc(&self) -> u64;

    /// Cycles consumed since reset
    fn clock(&self) -> u64;

    /// Interpret one instruction, returning the cycles it took
    fn step(&mut self, bus: &mut dyn Bus) -> u32;

    /// Run one dispatch unit, returning the cycles it took
    fn execute(&mut self, bus: &mut dyn Bus) -> u32;

    /// Run until at least `cycles` cycles have elapsed or a breakpoint halts
    /// execution; returns the cycles actually consumed
    fn run(&mut self, bus: &mut dyn Bus, cycles: u64) -> u64 {
        let start = self.clock();
        let target = start.saturating_add(cycles);
        while self.clock() < target && !self.debugger().halted() {
            self.execute(bus);
        }
        self.clock() - start
    }

    /// Drive external interrupt input `line`
    fn set_interrupt(&mut self, line: u8, asserted: bool);

    /// Enable or disable the recompiler
    fn set_recompiler(&mut self, enabled: bool);

    /// Drop every recompiled block
    fn invalidate_blocks(&mut self);

    fn debugger(&self) -> &Debugger;

    fn debugger_mut(&mut self) -> &mut Debugger;

    /// General purpose registers, widened to 64 bits
    fn registers(&self) -> Vec<u64>;

    /// Snapshot every architecturally visible field
    fn save_state(&self) -> ProcessorState;

    /// Restore a snapshot taken by [`Processor::save_state`]
    fn load_state(&mut self, state: &ProcessorState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isa_from_str() {
        assert_eq!("VR4300".parse::<Isa>().unwrap(), Isa::Vr4300);
        assert_eq!("sh-2".parse::<Isa>().unwrap(), Isa::Sh2);
        assert_eq!("psx".parse::<Isa>().unwrap(), Isa::R3000a);
        assert!("z80".parse::<Isa>().is_err());
    }

    #[test]
    fn test_isa_endian() {
        assert_eq!(Isa::R3000a.endian(), Endian::Little);
        assert_eq!(Isa::Vr4300.endian(), Endian::Big);
        assert_eq!(Isa::Sh2.to_string(), "sh2");
    }
}
