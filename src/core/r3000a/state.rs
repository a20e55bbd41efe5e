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
//! R3000A save state

use super::cop0::Cop0;
use super::icache::ICache;
use super::memory::CacheControl;
use super::{Jump, LoadDelay, R3000a};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Every architecturally visible field of an [`R3000a`], in save order
///
/// States are only taken between instructions, when no load is being
/// issued and no exception redirect is outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct R3000aState {
    pub r: [u32; 32],
    pub hi: u32,
    pub lo: u32,
    pub pc: u32,
    pub next_pc: u32,
    pub delay_slot: bool,
    pub taken: bool,
    pub jump: Option<Jump>,
    pub delayed: Option<LoadDelay>,
    pub cop0: Cop0,
    pub icache: ICache,
    #[bincode(with_serde)]
    pub cache_control: CacheControl,
    pub scratchpad: Vec<u8>,
    /// Registers of the attached COP2 unit, if any
    pub cop2: Option<Vec<u64>>,
    pub clock: u64,
}

impl R3000a {
    pub(super) fn snapshot(&self) -> R3000aState {
        R3000aState {
            r: self.r,
            hi: self.hi,
            lo: self.lo,
            pc: self.pc,
            next_pc: self.next_pc,
            delay_slot: self.delay_slot,
            taken: self.taken,
            jump: self.jump,
            delayed: self.delayed,
            cop0: self.cop0.clone(),
            icache: self.icache.clone(),
            cache_control: self.cache_control,
            scratchpad: self.scratchpad.clone(),
            cop2: self.cop2.as_ref().map(|unit| unit.snapshot()),
            clock: self.clock,
        }
    }

    /// Restore a snapshot; recompiled blocks are dropped
    pub(super) fn restore(&mut self, state: &R3000aState) {
        self.r = state.r;
        self.hi = state.hi;
        self.lo = state.lo;
        self.pc = state.pc;
        self.next_pc = state.next_pc;
        self.delay_slot = state.delay_slot;
        self.taken = state.taken;
        self.jump = state.jump;
        self.redirected = false;
        self.delayed = state.delayed;
        self.loading = None;
        self.cop0 = state.cop0.clone();
        self.icache = state.icache.clone();
        self.cache_control = state.cache_control;
        self.scratchpad = state.scratchpad.clone();
        self.scratchpad.resize(super::memory::SCRATCHPAD_SIZE, 0);
        if let (Some(unit), Some(registers)) = (self.cop2.as_mut(), state.cop2.as_ref()) {
            unit.restore(registers);
        }
        self.clock = state.clock;
        self.code_written = false;
        self.blocks.flush();
        log::info!("R3000A: state restored, PC=0x{:08X}", self.pc);
    }
}
