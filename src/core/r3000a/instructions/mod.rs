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
//! R3000A semantic routines
//!
//! One method per [`Opcode`]. The interpreter and recompiled blocks both
//! enter through [`R3000a::execute_opcode`].

use super::decoder::Opcode;
use super::exception::{Exception, ExceptionCode};
use super::{LoadDelay, R3000a};
use crate::core::bus::Bus;
use crate::core::mips::Instruction;

mod arithmetic;
mod branch;
mod coprocessor;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl R3000a {
    #[inline(always)]
    pub(super) fn gpr(&self, index: u8) -> u32 {
        self.r[index as usize]
    }

    /// Register write from an ALU result
    ///
    /// A load still in its delay slot for the same register is cancelled.
    #[inline(always)]
    pub(super) fn set_gpr(&mut self, index: u8, value: u32) {
        if self.delayed.is_some_and(|load| load.register == index) {
            self.delayed = None;
        }
        self.r[index as usize] = value;
    }

    /// Register write through the load delay slot
    pub(super) fn load_gpr(&mut self, index: u8, value: u32) {
        if self.delayed.is_some_and(|load| load.register == index) {
            self.delayed = None;
        }
        self.loading = Some(LoadDelay {
            register: index,
            value,
        });
    }

    /// Register as an LWL/LWR merge sees it: the in-flight load wins
    pub(super) fn merge_source(&self, index: u8) -> u32 {
        match self.delayed {
            Some(load) if load.register == index => load.value,
            _ => self.gpr(index),
        }
    }

    /// Effective address `rs + offset`
    #[inline(always)]
    fn address(&self, i: Instruction) -> u32 {
        self.gpr(i.rs()).wrapping_add(i.simm() as i32 as u32)
    }

    /// Run the semantic routine for `opcode`
    pub(super) fn execute_opcode(&mut self, bus: &mut dyn Bus, opcode: Opcode, word: u32) {
        let i = Instruction(word);
        let (rs, rt, rd, sa) = (i.rs(), i.rt(), i.rd(), i.sa());
        match opcode {
            Opcode::Invalid => self.op_invalid(word),

            Opcode::Sll => self.op_sll(rd, rt, sa),
            Opcode::Srl => self.op_srl(rd, rt, sa),
            Opcode::Sra => self.op_sra(rd, rt, sa),
            Opcode::Sllv => self.op_sll(rd, rt, self.gpr(rs) & 31),
            Opcode::Srlv => self.op_srl(rd, rt, self.gpr(rs) & 31),
            Opcode::Srav => self.op_sra(rd, rt, self.gpr(rs) & 31),

            Opcode::Jr => self.op_jr(rs),
            Opcode::Jalr => self.op_jalr(rd, rs),
            Opcode::Syscall => self.raise(Exception::new(ExceptionCode::Syscall)),
            Opcode::Break => self.raise(Exception::new(ExceptionCode::Breakpoint)),

            Opcode::Mfhi => self.set_gpr(rd, self.hi),
            Opcode::Mthi => self.hi = self.gpr(rs),
            Opcode::Mflo => self.set_gpr(rd, self.lo),
            Opcode::Mtlo => self.lo = self.gpr(rs),
            Opcode::Mult => self.op_mult(rs, rt),
            Opcode::Multu => self.op_multu(rs, rt),
            Opcode::Div => self.op_div(rs, rt),
            Opcode::Divu => self.op_divu(rs, rt),

            Opcode::Add => self.op_add(rd, rs, rt),
            Opcode::Addu => self.set_gpr(rd, self.gpr(rs).wrapping_add(self.gpr(rt))),
            Opcode::Sub => self.op_sub(rd, rs, rt),
            Opcode::Subu => self.set_gpr(rd, self.gpr(rs).wrapping_sub(self.gpr(rt))),
            Opcode::And => self.set_gpr(rd, self.gpr(rs) & self.gpr(rt)),
            Opcode::Or => self.set_gpr(rd, self.gpr(rs) | self.gpr(rt)),
            Opcode::Xor => self.set_gpr(rd, self.gpr(rs) ^ self.gpr(rt)),
            Opcode::Nor => self.set_gpr(rd, !(self.gpr(rs) | self.gpr(rt))),
            Opcode::Slt => self.op_slt(rd, rs, rt),
            Opcode::Sltu => self.set_gpr(rd, (self.gpr(rs) < self.gpr(rt)) as u32),

            Opcode::Bltz => self.op_branch((self.gpr(rs) as i32) < 0, i),
            Opcode::Bgez => self.op_branch(self.gpr(rs) as i32 >= 0, i),
            Opcode::Bltzal => self.op_branch_link((self.gpr(rs) as i32) < 0, i),
            Opcode::Bgezal => self.op_branch_link(self.gpr(rs) as i32 >= 0, i),

            Opcode::J => self.op_j(i.target()),
            Opcode::Jal => self.op_jal(i.target()),
            Opcode::Beq => self.op_branch(self.gpr(rs) == self.gpr(rt), i),
            Opcode::Bne => self.op_branch(self.gpr(rs) != self.gpr(rt), i),
            Opcode::Blez => self.op_branch(self.gpr(rs) as i32 <= 0, i),
            Opcode::Bgtz => self.op_branch(self.gpr(rs) as i32 > 0, i),

            Opcode::Addi => self.op_addi(rt, rs, i.simm()),
            Opcode::Addiu => self.op_addiu(rt, rs, i.simm()),
            Opcode::Slti => self.op_slti(rt, rs, i.simm()),
            Opcode::Sltiu => self.op_sltiu(rt, rs, i.simm()),
            Opcode::Andi => self.op_andi(rt, rs, i.imm()),
            Opcode::Ori => self.op_ori(rt, rs, i.imm()),
            Opcode::Xori => self.op_xori(rt, rs, i.imm()),
            Opcode::Lui => self.op_lui(rt, i.imm()),

            Opcode::Lb => self.op_lb(bus, rt, i),
            Opcode::Lh => self.op_lh(bus, rt, i),
            Opcode::Lwl => self.op_lwl(bus, rt, i),
            Opcode::Lw => self.op_lw(bus, rt, i),
            Opcode::Lbu => self.op_lbu(bus, rt, i),
            Opcode::Lhu => self.op_lhu(bus, rt, i),
            Opcode::Lwr => self.op_lwr(bus, rt, i),
            Opcode::Sb => self.op_sb(bus, rt, i),
            Opcode::Sh => self.op_sh(bus, rt, i),
            Opcode::Swl => self.op_swl(bus, rt, i),
            Opcode::Sw => self.op_sw(bus, rt, i),
            Opcode::Swr => self.op_swr(bus, rt, i),

            Opcode::Mfc0 => self.op_mfc0(rt, rd),
            Opcode::Mtc0 => self.op_mtc0(rt, rd),
            Opcode::Rfe => self.op_rfe(),

            Opcode::Mfc2 => self.op_mfc2(rt, rd),
            Opcode::Cfc2 => self.op_cfc2(rt, rd),
            Opcode::Mtc2 => self.op_mtc2(rt, rd),
            Opcode::Ctc2 => self.op_ctc2(rt, rd),
            Opcode::Cop2 => self.op_cop2(i.command()),
            Opcode::Lwc2 => self.op_lwc2(bus, rt, i),
            Opcode::Swc2 => self.op_swc2(bus, rt, i),

            Opcode::Cop1 | Opcode::Lwc1 | Opcode::Swc1 => self.op_unusable(1),
            Opcode::Cop3 | Opcode::Lwc3 | Opcode::Swc3 => self.op_unusable(3),
            Opcode::Lwc0 | Opcode::Swc0 => self.op_unusable(0),
        }
    }

    /// Undecodable word
    fn op_invalid(&mut self, word: u32) {
        log::debug!(
            "R3000A: reserved instruction 0x{:08X} at 0x{:08X}",
            word,
            self.pc
        );
        self.raise(Exception::new(ExceptionCode::ReservedInstruction));
    }
}
