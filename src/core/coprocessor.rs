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

//! Attached coprocessor interface
//!
//! Math and geometry coprocessors (the R3000A geometry engine on COP2, the
//! VR4300 floating point unit on COP1) are opaque to the core. The
//! processor checks that the unit is usable, moves operands in and out
//! through these calls, and forwards command words untouched.

/// Outcome of a coprocessor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Completed; charge this many extra cycles
    Done { cycles: u32 },
    /// The unit rejected the command (reported as a coprocessor exception
    /// by processors that have one, ignored otherwise)
    Fault,
}

/// An attached coprocessor
pub trait Coprocessor {
    /// Read data register `index`
    fn read_data(&mut self, index: u8) -> u64;

    /// Write data register `index`
    fn write_data(&mut self, index: u8, value: u64);

    /// Read control register `index`
    fn read_control(&mut self, index: u8) -> u32;

    /// Write control register `index`
    fn write_control(&mut self, index: u8, value: u32);

    /// Execute a command word (the low 25 bits of a COPz instruction, or
    /// the full word for units that decode it themselves)
    fn execute(&mut self, command: u32) -> CommandResult;

    /// Snapshot of the unit's registers for save states
    fn snapshot(&self) -> Vec<u64> {
        Vec::new()
    }

    /// Restore registers from [`Coprocessor::snapshot`] output
    fn restore(&mut self, _registers: &[u64]) {}
}

/// Register-file-only coprocessor
///
/// Stores data and control registers and accepts every command without
/// side effects. Useful for software that only moves values through a
/// coprocessor, and as a test double.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    data: [u64; 32],
    control: [u32; 32],
    /// Commands received, in order
    pub commands: Vec<u32>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            data: [0; 32],
            control: [0; 32],
            commands: Vec::new(),
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Coprocessor for RegisterFile {
    fn read_data(&mut self, index: u8) -> u64 {
        self.data[(index & 31) as usize]
    }

    fn write_data(&mut self, index: u8, value: u64) {
        self.data[(index & 31) as usize] = value;
    }

    fn read_control(&mut self, index: u8) -> u32 {
        self.control[(index & 31) as usize]
    }

    fn write_control(&mut self, index: u8, value: u32) {
        self.control[(index & 31) as usize] = value;
    }

    fn execute(&mut self, command: u32) -> CommandResult {
        self.commands.push(command);
        CommandResult::Done { cycles: 0 }
    }

    fn snapshot(&self) -> Vec<u64> {
        let mut registers = self.data.to_vec();
        registers.extend(self.control.iter().map(|&c| c as u64));
        registers
    }

    fn restore(&mut self, registers: &[u64]) {
        for (slot, value) in self.data.iter_mut().zip(registers.iter()) {
            *slot = *value;
        }
        for (slot, value) in self.control.iter_mut().zip(registers.iter().skip(32)) {
            *slot = *value as u32;
        }
    }
}
