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

//! VR4300 save state

use super::dcache::DCache;
use super::icache::ICache;
use super::pipeline::Branch;
use super::scc::Scc;
use super::tlb::Tlb;
use super::Vr4300;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Every architecturally visible field of a [`Vr4300`], in save order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Vr4300State {
    pub r: [u64; 32],
    pub lo: u64,
    pub hi: u64,
    pub pc: u64,
    pub branch: Branch,
    pub scc: Scc,
    pub tlb: Tlb,
    pub icache: ICache,
    pub dcache: DCache,
    /// Registers of the attached COP1 unit, if any
    pub cop1: Option<Vec<u64>>,
    pub clock: u64,
    pub last_physical: u32,
}

impl Vr4300 {
    pub(super) fn snapshot(&self) -> Vr4300State {
        Vr4300State {
            r: self.r,
            lo: self.lo,
            hi: self.hi,
            pc: self.pc,
            branch: self.branch,
            scc: self.scc.clone(),
            tlb: self.tlb.clone(),
            icache: self.icache.clone(),
            dcache: self.dcache.clone(),
            cop1: self.cop1.as_ref().map(|unit| unit.snapshot()),
            clock: self.clock,
            last_physical: self.last_physical,
        }
    }

    /// Restore a snapshot; recompiled blocks are dropped
    pub(super) fn restore(&mut self, state: &Vr4300State) {
        self.r = state.r;
        self.lo = state.lo;
        self.hi = state.hi;
        self.pc = state.pc;
        self.branch = state.branch;
        self.scc = state.scc.clone();
        self.tlb = state.tlb.clone();
        self.icache = state.icache.clone();
        self.dcache = state.dcache.clone();
        if let (Some(unit), Some(registers)) = (self.cop1.as_mut(), state.cop1.as_ref()) {
            unit.restore(registers);
        }
        self.clock = state.clock;
        self.last_physical = state.last_physical;
        self.blocks.flush();
        log::info!("VR4300: state restored, PC=0x{:016X}", self.pc);
    }
}
