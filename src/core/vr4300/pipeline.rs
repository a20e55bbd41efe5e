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

//! Branch delay state machine
//!
//! A branch decides in its own instruction but takes effect one
//! instruction later. The epilogue after every instruction advances this
//! state and moves the program counter.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum BranchState {
    /// Sequential execution
    #[default]
    Step,
    /// Branch taken; the next instruction is its delay slot
    Take,
    /// Branch not taken; the delay slot still executes
    NotTaken,
    /// Executing the delay slot of a taken branch
    DelaySlotTake,
    /// Executing the delay slot of a branch not taken
    DelaySlotNotTaken,
    /// The program counter was redirected (exception or ERET)
    Exception,
    /// Branch likely not taken: skip the delay slot
    Discard,
}

/// Pending control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Branch {
    pub state: BranchState,
    pub target: u64,
}

impl Branch {
    pub fn take(&mut self, target: u64) {
        self.state = BranchState::Take;
        self.target = target;
    }

    pub fn not_taken(&mut self) {
        self.state = BranchState::NotTaken;
    }

    pub fn discard(&mut self) {
        self.state = BranchState::Discard;
    }

    /// An exception moved the program counter to its vector
    pub fn exception(&mut self) {
        self.state = BranchState::Exception;
    }

    /// The program counter was set directly and must not advance
    pub fn redirect(&mut self) {
        self.state = BranchState::Exception;
    }

    pub fn in_delay_slot(&self) -> bool {
        matches!(
            self.state,
            BranchState::DelaySlotTake | BranchState::DelaySlotNotTaken
        )
    }

    pub fn reset(&mut self) {
        self.state = BranchState::Step;
    }
}

impl Branch {
    /// Advance after an instruction at `pc` completes
    ///
    /// Returns the next program counter and whether control flow left the
    /// sequential path (a branch resolved or the counter was redirected).
    pub fn advance(&mut self, pc: u64) -> (u64, bool) {
        match self.state {
            BranchState::Step => (pc.wrapping_add(4), false),
            BranchState::Take => {
                self.state = BranchState::DelaySlotTake;
                (pc.wrapping_add(4), false)
            }
            BranchState::NotTaken => {
                self.state = BranchState::DelaySlotNotTaken;
                (pc.wrapping_add(4), false)
            }
            BranchState::DelaySlotTake => {
                self.reset();
                (self.target, true)
            }
            BranchState::DelaySlotNotTaken => {
                self.reset();
                (pc.wrapping_add(4), true)
            }
            BranchState::Exception => {
                self.reset();
                (pc, true)
            }
            BranchState::Discard => {
                self.reset();
                (pc.wrapping_add(8), true)
            }
        }
    }
}
