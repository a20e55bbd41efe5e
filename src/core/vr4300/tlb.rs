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

//! Translation lookaside buffer
//!
//! 32 fully associative entries, each mapping an even/odd pair of pages.
//! Entries are only written by TLBWI/TLBWR and searched linearly; the first
//! matching entry wins.

use super::scc::EntryLo;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Number of entries
pub const ENTRIES: usize = 32;

/// Region and VPN2 bits of EntryHi that take part in a match
const VPN_MASK: u64 = 0xC000_00FF_FFFF_E000;

/// One TLB entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct TlbEntry {
    /// PageMask register image, bits 24:13
    pub page_mask: u32,
    /// Region, VPN2 and ASID
    pub entry_hi: u64,
    /// Even and odd page mappings
    pub entry_lo: [EntryLo; 2],
    /// Set when both EntryLo G bits were set on write
    pub global: bool,
}

impl TlbEntry {
    #[inline(always)]
    fn match_mask(&self) -> u64 {
        !(self.page_mask as u64) & VPN_MASK
    }

    #[inline(always)]
    fn offset_mask(&self) -> u64 {
        ((self.page_mask as u64) >> 1) | 0xFFF
    }

    pub fn asid(&self) -> u8 {
        self.entry_hi as u8
    }

    /// Whether this entry maps `vaddr` in address space `asid`
    pub fn matches(&self, vaddr: u64, asid: u8) -> bool {
        let mask = self.match_mask();
        (self.global || self.asid() == asid) && (vaddr & mask) == (self.entry_hi & mask)
    }

    /// EntryLo selected by the odd-page bit of `vaddr`
    pub fn page(&self, vaddr: u64) -> EntryLo {
        let odd = vaddr & (self.offset_mask() + 1) != 0;
        self.entry_lo[odd as usize]
    }

    /// Physical address of `vaddr` through `lo`
    pub fn physical(&self, lo: EntryLo, vaddr: u64) -> u32 {
        let offset = self.offset_mask();
        let base = (lo.frame() as u64) << 12;
        ((base & !offset) | (vaddr & offset)) as u32
    }
}

/// Why a translation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlbFault {
    /// No entry matched
    Miss,
    /// The matching page has V clear
    Invalid,
    /// Store to a page with D clear
    Modified,
}

/// A successful lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub physical: u32,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Tlb {
    entries: Vec<TlbEntry>,
}

impl Tlb {
    pub fn new() -> Self {
        Self {
            entries: vec![TlbEntry::default(); ENTRIES],
        }
    }

    pub fn entry(&self, index: usize) -> TlbEntry {
        self.entries[index % ENTRIES]
    }

    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    /// Write entry `index` from the EntryHi/EntryLo/PageMask images
    pub fn write(&mut self, index: usize, page_mask: u32, entry_hi: u64, entry_lo: [EntryLo; 2]) {
        let entry = &mut self.entries[index % ENTRIES];
        entry.page_mask = page_mask;
        entry.entry_hi = entry_hi & !((page_mask as u64) & 0x01FF_E000);
        entry.global = entry_lo[0].global() && entry_lo[1].global();
        entry.entry_lo = entry_lo;
        log::trace!(
            "VR4300: TLB[{}] <- hi=0x{:016X} lo0=0x{:08X} lo1=0x{:08X} mask=0x{:08X}",
            index % ENTRIES,
            entry.entry_hi,
            entry_lo[0].0,
            entry_lo[1].0,
            page_mask
        );
    }

    /// TLBP: index of the entry matching EntryHi
    pub fn probe(&self, entry_hi: u64) -> Option<usize> {
        let asid = entry_hi as u8;
        self.entries
            .iter()
            .position(|entry| entry.matches(entry_hi & VPN_MASK, asid))
    }

    /// Translate a mapped address
    pub fn translate(&self, vaddr: u64, asid: u8, store: bool) -> Result<Translation, TlbFault> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.matches(vaddr, asid))
            .ok_or(TlbFault::Miss)?;
        let lo = entry.page(vaddr);
        if !lo.valid() {
            return Err(TlbFault::Invalid);
        }
        if store && !lo.dirty() {
            return Err(TlbFault::Modified);
        }
        Ok(Translation {
            physical: entry.physical(lo, vaddr),
            cached: lo.cache_algorithm() != 2,
        })
    }
}

impl Default for Tlb {
    fn default() -> Self {
        Self::new()
    }
}
