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
//! SH-2 semantic routines
//!
//! One method per [`Opcode`]. The interpreter and recompiled blocks both
//! enter through [`Sh2::execute_opcode`].

use super::decoder::{disp12, disp4, imm8, rm, rn, Opcode};
use super::exception::Exception;
use super::status::Status;
use super::{Branch, Sh2};
use crate::core::bus::{Bus, Size};

mod arithmetic;
mod branch;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;
mod system;

/// Sign-extend an 8-bit immediate
#[inline(always)]
pub(super) const fn sext8(value: u32) -> u32 {
    value as u8 as i8 as i32 as u32
}

/// Sign-extend a loaded value of `size`
#[inline(always)]
pub(super) const fn sext(size: Size, value: u32) -> u32 {
    match size {
        Size::Byte => value as u8 as i8 as i32 as u32,
        Size::Half => value as u16 as i16 as i32 as u32,
        Size::Word | Size::Dual => value,
    }
}

impl Sh2 {
    /// Base of PC-relative operands: the instruction address plus 4
    ///
    /// Inside a delay slot the base is taken from the branch owning it.
    #[inline(always)]
    pub(super) fn pc_base(&self) -> u32 {
        let pc = if self.delay_slot {
            self.pc.wrapping_sub(2)
        } else {
            self.pc
        };
        pc.wrapping_add(4)
    }

    /// Load `size` bytes from `address`, sign-extended
    pub(super) fn load(&mut self, bus: &mut dyn Bus, size: Size, address: u32) -> Option<u32> {
        self.read(bus, size, address).map(|value| sext(size, value))
    }

    /// Transfer to `target` after the delay slot
    pub(super) fn delayed_branch(&mut self, target: u32) {
        self.target = target;
        self.branch = Branch::Slot;
        self.charge(1);
    }

    /// Transfer to `target` after this instruction
    pub(super) fn immediate_branch(&mut self, target: u32) {
        self.target = target;
        self.branch = Branch::Take;
        self.charge(2);
    }

    fn op_invalid(&mut self, bus: &mut dyn Bus, word: u16) {
        log::warn!(
            "SH-2: illegal instruction 0x{:04X} at 0x{:08X}",
            word,
            self.pc
        );
        self.raise(bus, Exception::IllegalInstruction);
    }

    /// Run the semantic routine for `opcode`
    pub(super) fn execute_opcode(&mut self, bus: &mut dyn Bus, opcode: Opcode, word: u16) {
        if self.delay_slot && opcode.illegal_in_slot() {
            log::debug!(
                "SH-2: {} in delay slot at 0x{:08X}",
                opcode.mnemonic(),
                self.pc
            );
            self.raise(bus, Exception::SlotIllegal);
            return;
        }
        self.inhibit = opcode.inhibits_interrupts();

        let (n, m) = (rn(word), rm(word));
        let imm = imm8(word);
        let d = disp4(word);
        let r0 = self.r[0];
        match opcode {
            Opcode::Invalid => self.op_invalid(bus, word),

            // Data transfer
            Opcode::MovImm => self.r[n] = sext8(imm),
            Opcode::MovWPc => self.op_mov_pc(bus, Size::Half, n, imm),
            Opcode::MovLPc => self.op_mov_pc(bus, Size::Word, n, imm),
            Opcode::Mov => self.r[n] = self.r[m],
            Opcode::MovBStore => self.op_store(bus, Size::Byte, self.r[n], m),
            Opcode::MovWStore => self.op_store(bus, Size::Half, self.r[n], m),
            Opcode::MovLStore => self.op_store(bus, Size::Word, self.r[n], m),
            Opcode::MovBLoad => self.op_load(bus, Size::Byte, n, self.r[m]),
            Opcode::MovWLoad => self.op_load(bus, Size::Half, n, self.r[m]),
            Opcode::MovLLoad => self.op_load(bus, Size::Word, n, self.r[m]),
            Opcode::MovBPreDec => self.op_store_pre_dec(bus, Size::Byte, n, m),
            Opcode::MovWPreDec => self.op_store_pre_dec(bus, Size::Half, n, m),
            Opcode::MovLPreDec => self.op_store_pre_dec(bus, Size::Word, n, m),
            Opcode::MovBPostInc => self.op_load_post_inc(bus, Size::Byte, n, m),
            Opcode::MovWPostInc => self.op_load_post_inc(bus, Size::Half, n, m),
            Opcode::MovLPostInc => self.op_load_post_inc(bus, Size::Word, n, m),
            Opcode::MovBStoreR0 => self.op_store(bus, Size::Byte, self.r[n].wrapping_add(r0), m),
            Opcode::MovWStoreR0 => self.op_store(bus, Size::Half, self.r[n].wrapping_add(r0), m),
            Opcode::MovLStoreR0 => self.op_store(bus, Size::Word, self.r[n].wrapping_add(r0), m),
            Opcode::MovBLoadR0 => self.op_load(bus, Size::Byte, n, self.r[m].wrapping_add(r0)),
            Opcode::MovWLoadR0 => self.op_load(bus, Size::Half, n, self.r[m].wrapping_add(r0)),
            Opcode::MovLLoadR0 => self.op_load(bus, Size::Word, n, self.r[m].wrapping_add(r0)),
            Opcode::MovBStoreDispR0 => self.op_store(bus, Size::Byte, self.r[m].wrapping_add(d), 0),
            Opcode::MovWStoreDispR0 => {
                self.op_store(bus, Size::Half, self.r[m].wrapping_add(d * 2), 0)
            }
            Opcode::MovLStoreDisp => {
                self.op_store(bus, Size::Word, self.r[n].wrapping_add(d * 4), m)
            }
            Opcode::MovBLoadDispR0 => self.op_load(bus, Size::Byte, 0, self.r[m].wrapping_add(d)),
            Opcode::MovWLoadDispR0 => {
                self.op_load(bus, Size::Half, 0, self.r[m].wrapping_add(d * 2))
            }
            Opcode::MovLLoadDisp => self.op_load(bus, Size::Word, n, self.r[m].wrapping_add(d * 4)),
            Opcode::MovBStoreGbr => self.op_store(bus, Size::Byte, self.gbr.wrapping_add(imm), 0),
            Opcode::MovWStoreGbr => {
                self.op_store(bus, Size::Half, self.gbr.wrapping_add(imm * 2), 0)
            }
            Opcode::MovLStoreGbr => {
                self.op_store(bus, Size::Word, self.gbr.wrapping_add(imm * 4), 0)
            }
            Opcode::MovBLoadGbr => self.op_load(bus, Size::Byte, 0, self.gbr.wrapping_add(imm)),
            Opcode::MovWLoadGbr => self.op_load(bus, Size::Half, 0, self.gbr.wrapping_add(imm * 2)),
            Opcode::MovLLoadGbr => self.op_load(bus, Size::Word, 0, self.gbr.wrapping_add(imm * 4)),
            Opcode::Mova => self.r[0] = (self.pc_base() & !3).wrapping_add(imm * 4),
            Opcode::Movt => self.r[n] = self.sr.t() as u32,
            Opcode::SwapB => self.op_swap_b(n, m),
            Opcode::SwapW => self.r[n] = self.r[m].rotate_left(16),
            Opcode::Xtrct => self.r[n] = (self.r[m] << 16) | (self.r[n] >> 16),

            // Arithmetic
            Opcode::Add => self.r[n] = self.r[n].wrapping_add(self.r[m]),
            Opcode::AddImm => self.r[n] = self.r[n].wrapping_add(sext8(imm)),
            Opcode::Addc => self.op_addc(n, m),
            Opcode::Addv => self.op_addv(n, m),
            Opcode::CmpEqImm => self.sr.set_t(self.r[0] == sext8(imm)),
            Opcode::CmpEq => self.sr.set_t(self.r[n] == self.r[m]),
            Opcode::CmpHs => self.sr.set_t(self.r[n] >= self.r[m]),
            Opcode::CmpGe => self.sr.set_t(self.r[n] as i32 >= self.r[m] as i32),
            Opcode::CmpHi => self.sr.set_t(self.r[n] > self.r[m]),
            Opcode::CmpGt => self.sr.set_t(self.r[n] as i32 > self.r[m] as i32),
            Opcode::CmpPz => self.sr.set_t(self.r[n] as i32 >= 0),
            Opcode::CmpPl => self.sr.set_t(self.r[n] as i32 > 0),
            Opcode::CmpStr => self.op_cmp_str(n, m),
            Opcode::Div0s => self.op_div0s(n, m),
            Opcode::Div0u => self.op_div0u(),
            Opcode::Div1 => self.op_div1(n, m),
            Opcode::Dt => self.op_dt(n),
            Opcode::ExtsB => self.r[n] = sext(Size::Byte, self.r[m]),
            Opcode::ExtsW => self.r[n] = sext(Size::Half, self.r[m]),
            Opcode::ExtuB => self.r[n] = self.r[m] & 0xFF,
            Opcode::ExtuW => self.r[n] = self.r[m] & 0xFFFF,
            Opcode::Neg => self.r[n] = self.r[m].wrapping_neg(),
            Opcode::Negc => self.op_negc(n, m),
            Opcode::Sub => self.r[n] = self.r[n].wrapping_sub(self.r[m]),
            Opcode::Subc => self.op_subc(n, m),
            Opcode::Subv => self.op_subv(n, m),

            // Multiply
            Opcode::MulL => self.op_mul_l(n, m),
            Opcode::Muls => self.op_muls(n, m),
            Opcode::Mulu => self.op_mulu(n, m),
            Opcode::Dmuls => self.op_dmuls(n, m),
            Opcode::Dmulu => self.op_dmulu(n, m),
            Opcode::MacL => self.op_mac_l(bus, n, m),
            Opcode::MacW => self.op_mac_w(bus, n, m),
            Opcode::Clrmac => {
                self.mach = 0;
                self.macl = 0;
            }

            // Logical
            Opcode::And => self.r[n] &= self.r[m],
            Opcode::AndImm => self.r[0] &= imm,
            Opcode::AndByte => self.op_modify_byte(bus, |value| value & imm),
            Opcode::Not => self.r[n] = !self.r[m],
            Opcode::Or => self.r[n] |= self.r[m],
            Opcode::OrImm => self.r[0] |= imm,
            Opcode::OrByte => self.op_modify_byte(bus, |value| value | imm),
            Opcode::Tas => self.op_tas(bus, n),
            Opcode::Tst => self.sr.set_t(self.r[n] & self.r[m] == 0),
            Opcode::TstImm => self.sr.set_t(self.r[0] & imm == 0),
            Opcode::TstByte => self.op_tst_byte(bus, imm),
            Opcode::Xor => self.r[n] ^= self.r[m],
            Opcode::XorImm => self.r[0] ^= imm,
            Opcode::XorByte => self.op_modify_byte(bus, |value| value ^ imm),

            // Shift
            Opcode::Rotl => self.op_rotl(n),
            Opcode::Rotr => self.op_rotr(n),
            Opcode::Rotcl => self.op_rotcl(n),
            Opcode::Rotcr => self.op_rotcr(n),
            Opcode::Shal | Opcode::Shll => self.op_shll(n),
            Opcode::Shar => self.op_shar(n),
            Opcode::Shlr => self.op_shlr(n),
            Opcode::Shll2 => self.r[n] <<= 2,
            Opcode::Shll8 => self.r[n] <<= 8,
            Opcode::Shll16 => self.r[n] <<= 16,
            Opcode::Shlr2 => self.r[n] >>= 2,
            Opcode::Shlr8 => self.r[n] >>= 8,
            Opcode::Shlr16 => self.r[n] >>= 16,

            // Branch
            Opcode::Bf => self.op_bt(!self.sr.t(), imm, false),
            Opcode::Bfs => self.op_bt(!self.sr.t(), imm, true),
            Opcode::Bt => self.op_bt(self.sr.t(), imm, false),
            Opcode::Bts => self.op_bt(self.sr.t(), imm, true),
            Opcode::Bra => self.op_bra(disp12(word), false),
            Opcode::Bsr => self.op_bra(disp12(word), true),
            Opcode::Braf => self.op_braf(n, false),
            Opcode::Bsrf => self.op_braf(n, true),
            Opcode::Jmp => self.delayed_branch(self.r[n]),
            Opcode::Jsr => {
                self.pr = self.pc.wrapping_add(4);
                self.delayed_branch(self.r[n]);
            }
            Opcode::Rts => self.delayed_branch(self.pr),
            Opcode::Rte => self.op_rte(bus),

            // System control
            Opcode::Clrt => self.sr.set_t(false),
            Opcode::Sett => self.sr.set_t(true),
            Opcode::Nop => {}
            Opcode::Sleep => self.op_sleep(),
            Opcode::Trapa => self.raise(bus, Exception::Trap(imm as u8)),
            Opcode::LdcSr => self.sr = Status::from_bits(self.r[n]),
            Opcode::LdcGbr => self.gbr = self.r[n],
            Opcode::LdcVbr => self.vbr = self.r[n],
            Opcode::LdsMach => self.mach = self.r[n],
            Opcode::LdsMacl => self.macl = self.r[n],
            Opcode::LdsPr => self.pr = self.r[n],
            Opcode::LdcSrPostInc => {
                self.op_load_control(bus, n, |cpu, value| cpu.sr = Status::from_bits(value))
            }
            Opcode::LdcGbrPostInc => self.op_load_control(bus, n, |cpu, value| cpu.gbr = value),
            Opcode::LdcVbrPostInc => self.op_load_control(bus, n, |cpu, value| cpu.vbr = value),
            Opcode::LdsMachPostInc => self.op_load_control(bus, n, |cpu, value| cpu.mach = value),
            Opcode::LdsMaclPostInc => self.op_load_control(bus, n, |cpu, value| cpu.macl = value),
            Opcode::LdsPrPostInc => self.op_load_control(bus, n, |cpu, value| cpu.pr = value),
            Opcode::StcSr => self.r[n] = self.sr.0,
            Opcode::StcGbr => self.r[n] = self.gbr,
            Opcode::StcVbr => self.r[n] = self.vbr,
            Opcode::StsMach => self.r[n] = self.mach,
            Opcode::StsMacl => self.r[n] = self.macl,
            Opcode::StsPr => self.r[n] = self.pr,
            Opcode::StcSrPreDec => self.op_store_control(bus, self.sr.0, n),
            Opcode::StcGbrPreDec => self.op_store_control(bus, self.gbr, n),
            Opcode::StcVbrPreDec => self.op_store_control(bus, self.vbr, n),
            Opcode::StsMachPreDec => self.op_store_control(bus, self.mach, n),
            Opcode::StsMaclPreDec => self.op_store_control(bus, self.macl, n),
            Opcode::StsPrPreDec => self.op_store_control(bus, self.pr, n),
        }
    }
}
