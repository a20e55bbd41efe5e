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

use super::super::context::Mode;
use super::super::exception::{Exception, ExceptionCode};
use super::super::memory::Access;
use super::super::scc::{reg, EntryLo, Scc, Status};
use super::super::{icache, Vr4300};
use super::sext32;
use crate::core::bus::Bus;
use crate::core::mips::Instruction;

/// Cache selected by bits 1:0 of the CACHE op field
const ICACHE: u8 = 0;
const DCACHE: u8 = 1;

impl Vr4300 {
    /// COP0 instructions need kernel mode or Status.CU0
    fn cop0_usable(&mut self) -> bool {
        if self.context().mode == Mode::Kernel || self.scc.status.coprocessor_usable(0) {
            return true;
        }
        self.raise(Exception::coprocessor_unusable(0));
        false
    }

    // === Register Moves ===

    /// MFC0: Move From System Control Coprocessor
    ///
    /// Format: mfc0 rt, rd
    /// Operation: rt = sign_extend(cop0[rd][31:0])
    pub(crate) fn op_mfc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() {
            return;
        }
        self.set_gpr(rt, sext32(self.scc.read(rd) as u32));
    }

    pub(crate) fn op_dmfc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() || !self.require_dword() {
            return;
        }
        self.set_gpr(rt, self.scc.read(rd));
    }

    /// MTC0: Move To System Control Coprocessor
    ///
    /// A Status write can change the addressing mode, so the instruction
    /// ends its block.
    pub(crate) fn op_mtc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() {
            return;
        }
        self.write_cop0(rd, sext32(self.gpr(rt) as u32));
    }

    pub(crate) fn op_dmtc0(&mut self, rt: u8, rd: u8) {
        if !self.cop0_usable() || !self.require_dword() {
            return;
        }
        self.write_cop0(rd, self.gpr(rt));
    }

    fn write_cop0(&mut self, rd: u8, value: u64) {
        let before = self.scc.status;
        self.scc.write(rd, value);
        if rd == reg::STATUS {
            self.status_changed(before);
        }
    }

    fn status_changed(&mut self, before: Status) {
        let after = self.scc.status;
        if before.0 != after.0 {
            log::trace!("VR4300: Status 0x{:08X} -> 0x{:08X}", before.0, after.0);
        }
        if after.reverse_endian() && !before.reverse_endian() {
            log::warn!("VR4300: reverse endian user mode is not supported");
        }
    }

    // === TLB ===

    /// TLBR: read the entry selected by Index into EntryHi/EntryLo/PageMask
    pub(crate) fn op_tlbr(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        let entry = self.tlb.entry((self.scc.index & 0x1F) as usize);
        let global = entry.global as u32;
        self.scc.page_mask = entry.page_mask;
        self.scc.entry_hi = entry.entry_hi;
        self.scc.entry_lo = [
            EntryLo((entry.entry_lo[0].0 & !1) | global),
            EntryLo((entry.entry_lo[1].0 & !1) | global),
        ];
    }

    /// TLBWI: write the entry selected by Index
    pub(crate) fn op_tlbwi(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        let index = (self.scc.index & 0x1F) as usize;
        self.write_tlb(index);
    }

    /// TLBWR: write the entry selected by Random
    pub(crate) fn op_tlbwr(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        let index = self.scc.random as usize;
        self.write_tlb(index);
    }

    fn write_tlb(&mut self, index: usize) {
        let scc = &self.scc;
        self.tlb
            .write(index, scc.page_mask, scc.entry_hi, scc.entry_lo);
    }

    /// TLBP: probe for an entry matching EntryHi
    pub(crate) fn op_tlbp(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        self.scc.index = match self.tlb.probe(self.scc.entry_hi) {
            Some(index) => index as u32,
            None => Scc::PROBE_FAILURE,
        };
    }

    /// ERET: Return From Exception
    ///
    /// Returns to ErrorEPC when Status.ERL is set, otherwise to EPC, and
    /// clears the LL bit. There is no delay slot.
    pub(crate) fn op_eret(&mut self) {
        if !self.cop0_usable() {
            return;
        }
        let before = self.scc.status;
        if before.error_level() {
            self.pc = self.scc.error_epc;
            self.scc.status.set_error_level(false);
        } else {
            self.pc = self.scc.epc;
            self.scc.status.set_exception_level(false);
        }
        self.scc.ll_bit = false;
        self.status_changed(before);
        self.branch.redirect();
    }

    // === Cache Maintenance ===

    /// CACHE: cache maintenance
    ///
    /// Bits 1:0 of the op field pick the cache (secondary caches are
    /// absent and their ops do nothing), bits 4:2 the operation. Index
    /// operations use the virtual address bits as the line index; hit
    /// operations translate the address and act only on a tag match.
    /// Instruction cache changes drop the recompiled blocks of the line.
    pub(crate) fn op_cache(&mut self, bus: &mut dyn Bus, op: u8, i: Instruction) {
        if !self.cop0_usable() {
            return;
        }
        let vaddr = self.address(i);
        let index = vaddr as u32;
        let cache = op & 3;
        let function = op >> 2;

        // Hit operations and fill need a physical address
        let physical = match (cache, function) {
            (ICACHE, 4..=6) | (DCACHE, 3..=6) => {
                match self.translate(vaddr, Access::Load) {
                    Some(resolved) => resolved.physical,
                    None => return,
                }
            }
            _ => 0,
        };

        let result = match (cache, function) {
            (ICACHE, 0) => {
                self.invalidate_icache_line(index);
                Ok(0)
            }
            (ICACHE, 1) => {
                let line = self.icache.line(index);
                self.scc.tag_lo = ((line.tag >> 12) << 8) | ((line.valid as u32) << 7);
                Ok(0)
            }
            (ICACHE, 2) => {
                self.invalidate_icache_line(index);
                let tag_lo = self.scc.tag_lo;
                let line = self.icache.line_mut(index);
                line.tag = ((tag_lo >> 8) & 0xF_FFFF) << 12;
                line.valid = tag_lo & (1 << 7) != 0;
                Ok(0)
            }
            (ICACHE, 4) => {
                if self.icache.line(physical).hit(physical) {
                    self.invalidate_icache_line(physical);
                }
                Ok(0)
            }
            (ICACHE, 5) => {
                self.invalidate_icache_line(physical);
                self.icache.fill(bus, physical)
            }
            (ICACHE, 6) => {
                if self.icache.line(physical).hit(physical) {
                    self.icache.write_back(bus, physical)
                } else {
                    Ok(0)
                }
            }

            (DCACHE, 0) => {
                let line = *self.dcache.line(index);
                let cycles = if line.valid && line.dirty {
                    self.dcache.write_back(bus, index)
                } else {
                    Ok(0)
                };
                self.dcache.line_mut(index).valid = false;
                cycles
            }
            (DCACHE, 1) => {
                let line = self.dcache.line(index);
                let state = (line.valid as u32) << 1 | line.dirty as u32;
                self.scc.tag_lo = ((line.tag >> 12) << 8) | (state << 6);
                Ok(0)
            }
            (DCACHE, 2) => {
                let tag_lo = self.scc.tag_lo;
                let line = self.dcache.line_mut(index);
                line.tag = ((tag_lo >> 8) & 0xF_FFFF) << 12;
                line.valid = tag_lo & (1 << 7) != 0;
                line.dirty = tag_lo & (1 << 6) != 0;
                Ok(0)
            }
            (DCACHE, 3) => self.dcache.create_dirty(bus, physical),
            (DCACHE, 4) => {
                let line = self.dcache.line_mut(physical);
                if line.hit(physical) {
                    line.valid = false;
                }
                Ok(0)
            }
            (DCACHE, 5) => {
                let line = *self.dcache.line(physical);
                let cycles = if line.hit(physical) && line.dirty {
                    self.dcache.write_back(bus, physical)
                } else {
                    Ok(0)
                };
                if line.hit(physical) {
                    self.dcache.line_mut(physical).valid = false;
                }
                cycles
            }
            (DCACHE, 6) => {
                let line = *self.dcache.line(physical);
                if line.hit(physical) && line.dirty {
                    self.dcache.write_back(bus, physical)
                } else {
                    Ok(0)
                }
            }
            _ => {
                log::trace!("VR4300: ignored CACHE op 0x{:02X}", op);
                Ok(0)
            }
        };

        match result {
            Ok(cycles) => self.charge(cycles),
            Err(_) => self.raise(Exception::new(ExceptionCode::DataBus)),
        }
    }

    /// Invalidate the icache line at `address`'s index and the recompiled
    /// blocks translated from it
    fn invalidate_icache_line(&mut self, address: u32) {
        let line = self.icache.line_mut(address);
        if line.valid {
            let base = (line.tag | (address & 0xFE0)) as u64;
            self.blocks.invalidate_range(base..base + icache::LINE_SIZE as u64);
        }
        line.valid = false;
    }
}
