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
//! SH-2 save state

use super::cache::Cache;
use super::status::Status;
use super::{Branch, Sh2};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Every architecturally visible field of an [`Sh2`], in save order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Sh2State {
    pub r: [u32; 16],
    pub pc: u32,
    pub pr: u32,
    pub gbr: u32,
    pub vbr: u32,
    pub mach: u32,
    pub macl: u32,
    pub sr: Status,
    pub branch: Branch,
    pub target: u32,
    pub delay_slot: bool,
    pub inhibit: bool,
    pub sleeping: bool,
    pub cache: Cache,
    pub irl: u16,
    pub vectors: [u8; 16],
    pub nmi: bool,
    pub clock: u64,
}

impl Sh2 {
    pub(super) fn snapshot(&self) -> Sh2State {
        Sh2State {
            r: self.r,
            pc: self.pc,
            pr: self.pr,
            gbr: self.gbr,
            vbr: self.vbr,
            mach: self.mach,
            macl: self.macl,
            sr: self.sr,
            branch: self.branch,
            target: self.target,
            delay_slot: self.delay_slot,
            inhibit: self.inhibit,
            sleeping: self.sleeping,
            cache: self.cache.clone(),
            irl: self.irl,
            vectors: self.vectors,
            nmi: self.nmi,
            clock: self.clock,
        }
    }

    /// Restore a snapshot; recompiled blocks are dropped
    pub(super) fn restore(&mut self, state: &Sh2State) {
        self.r = state.r;
        self.pc = state.pc;
        self.pr = state.pr;
        self.gbr = state.gbr;
        self.vbr = state.vbr;
        self.mach = state.mach;
        self.macl = state.macl;
        self.sr = Status::from_bits(state.sr.0);
        self.branch = state.branch;
        self.target = state.target;
        self.delay_slot = state.delay_slot;
        self.inhibit = state.inhibit;
        self.sleeping = state.sleeping;
        self.redirected = false;
        self.cache = state.cache.clone();
        self.irl = state.irl;
        self.vectors = state.vectors;
        self.nmi = state.nmi;
        self.clock = state.clock;
        self.code_written = false;
        self.blocks.flush();
        log::info!("SH-2: state restored, PC=0x{:08X}", self.pc);
    }
}
