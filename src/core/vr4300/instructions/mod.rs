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

//! VR4300 semantic routines
//!
//! One method per [`Opcode`], organized by instruction type. The interpreter
//! and recompiled blocks both enter through [`Vr4300::execute_opcode`].

use super::decoder::Opcode;
use super::exception::{Exception, ExceptionCode};
use super::Vr4300;
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
mod system;
mod trap;

/// Sign-extend a 32-bit result into a 64-bit register
#[inline(always)]
pub(super) const fn sext32(value: u32) -> u64 {
    value as i32 as i64 as u64
}

impl Vr4300 {
    #[inline(always)]
    pub(super) fn gpr(&self, index: u8) -> u64 {
        self.r[index as usize]
    }

    /// Register write; r0 is cleared again by the epilogue
    #[inline(always)]
    pub(super) fn set_gpr(&mut self, index: u8, value: u64) {
        self.r[index as usize] = value;
    }

    /// Effective address `rs + offset`
    #[inline(always)]
    fn address(&self, i: Instruction) -> u64 {
        self.gpr(i.rs()).wrapping_add(i.simm() as i64 as u64)
    }

    /// Raise RI unless 64-bit operations are available in this mode
    fn require_dword(&mut self) -> bool {
        if self.context().dword_allowed() {
            return true;
        }
        self.raise(Exception::new(ExceptionCode::ReservedInstruction));
        false
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
            Opcode::Sllv => self.op_sllv(rd, rt, rs),
            Opcode::Srlv => self.op_srlv(rd, rt, rs),
            Opcode::Srav => self.op_srav(rd, rt, rs),
            Opcode::Dsllv => self.op_dsllv(rd, rt, rs),
            Opcode::Dsrlv => self.op_dsrlv(rd, rt, rs),
            Opcode::Dsrav => self.op_dsrav(rd, rt, rs),
            Opcode::Dsll => self.op_dsll(rd, rt, sa),
            Opcode::Dsrl => self.op_dsrl(rd, rt, sa),
            Opcode::Dsra => self.op_dsra(rd, rt, sa),
            Opcode::Dsll32 => self.op_dsll(rd, rt, sa + 32),
            Opcode::Dsrl32 => self.op_dsrl(rd, rt, sa + 32),
            Opcode::Dsra32 => self.op_dsra(rd, rt, sa + 32),

            Opcode::Jr => self.op_jr(rs),
            Opcode::Jalr => self.op_jalr(rd, rs),
            Opcode::Syscall => self.raise(Exception::new(ExceptionCode::Syscall)),
            Opcode::Break => self.raise(Exception::new(ExceptionCode::Breakpoint)),
            Opcode::Sync => {}

            Opcode::Mfhi => self.set_gpr(rd, self.hi),
            Opcode::Mthi => self.hi = self.gpr(rs),
            Opcode::Mflo => self.set_gpr(rd, self.lo),
            Opcode::Mtlo => self.lo = self.gpr(rs),
            Opcode::Mult => self.op_mult(rs, rt),
            Opcode::Multu => self.op_multu(rs, rt),
            Opcode::Div => self.op_div(rs, rt),
            Opcode::Divu => self.op_divu(rs, rt),
            Opcode::Dmult => self.op_dmult(rs, rt),
            Opcode::Dmultu => self.op_dmultu(rs, rt),
            Opcode::Ddiv => self.op_ddiv(rs, rt),
            Opcode::Ddivu => self.op_ddivu(rs, rt),

            Opcode::Add => self.op_add(rd, rs, rt),
            Opcode::Addu => self.op_addu(rd, rs, rt),
            Opcode::Sub => self.op_sub(rd, rs, rt),
            Opcode::Subu => self.op_subu(rd, rs, rt),
            Opcode::And => self.op_and(rd, rs, rt),
            Opcode::Or => self.op_or(rd, rs, rt),
            Opcode::Xor => self.op_xor(rd, rs, rt),
            Opcode::Nor => self.op_nor(rd, rs, rt),
            Opcode::Slt => self.op_slt(rd, rs, rt),
            Opcode::Sltu => self.op_sltu(rd, rs, rt),
            Opcode::Dadd => self.op_dadd(rd, rs, rt),
            Opcode::Daddu => self.op_daddu(rd, rs, rt),
            Opcode::Dsub => self.op_dsub(rd, rs, rt),
            Opcode::Dsubu => self.op_dsubu(rd, rs, rt),

            Opcode::Tge => self.op_trap(self.gpr(rs) as i64 >= self.gpr(rt) as i64),
            Opcode::Tgeu => self.op_trap(self.gpr(rs) >= self.gpr(rt)),
            Opcode::Tlt => self.op_trap((self.gpr(rs) as i64) < self.gpr(rt) as i64),
            Opcode::Tltu => self.op_trap(self.gpr(rs) < self.gpr(rt)),
            Opcode::Teq => self.op_trap(self.gpr(rs) == self.gpr(rt)),
            Opcode::Tne => self.op_trap(self.gpr(rs) != self.gpr(rt)),

            Opcode::Bltz => self.op_branch((self.gpr(rs) as i64) < 0, i),
            Opcode::Bgez => self.op_branch(self.gpr(rs) as i64 >= 0, i),
            Opcode::Bltzl => self.op_branch_likely((self.gpr(rs) as i64) < 0, i),
            Opcode::Bgezl => self.op_branch_likely(self.gpr(rs) as i64 >= 0, i),
            Opcode::Bltzal => self.op_branch_link((self.gpr(rs) as i64) < 0, i, false),
            Opcode::Bgezal => self.op_branch_link(self.gpr(rs) as i64 >= 0, i, false),
            Opcode::Bltzall => self.op_branch_link((self.gpr(rs) as i64) < 0, i, true),
            Opcode::Bgezall => self.op_branch_link(self.gpr(rs) as i64 >= 0, i, true),
            Opcode::Tgei => self.op_trap(self.gpr(rs) as i64 >= i.simm() as i64),
            Opcode::Tgeiu => self.op_trap(self.gpr(rs) >= i.simm() as i64 as u64),
            Opcode::Tlti => self.op_trap((self.gpr(rs) as i64) < i.simm() as i64),
            Opcode::Tltiu => self.op_trap(self.gpr(rs) < i.simm() as i64 as u64),
            Opcode::Teqi => self.op_trap(self.gpr(rs) as i64 == i.simm() as i64),
            Opcode::Tnei => self.op_trap(self.gpr(rs) as i64 != i.simm() as i64),

            Opcode::J => self.op_j(i.target()),
            Opcode::Jal => self.op_jal(i.target()),
            Opcode::Beq => self.op_branch(self.gpr(rs) == self.gpr(rt), i),
            Opcode::Bne => self.op_branch(self.gpr(rs) != self.gpr(rt), i),
            Opcode::Blez => self.op_branch(self.gpr(rs) as i64 <= 0, i),
            Opcode::Bgtz => self.op_branch(self.gpr(rs) as i64 > 0, i),
            Opcode::Beql => self.op_branch_likely(self.gpr(rs) == self.gpr(rt), i),
            Opcode::Bnel => self.op_branch_likely(self.gpr(rs) != self.gpr(rt), i),
            Opcode::Blezl => self.op_branch_likely(self.gpr(rs) as i64 <= 0, i),
            Opcode::Bgtzl => self.op_branch_likely(self.gpr(rs) as i64 > 0, i),

            Opcode::Addi => self.op_addi(rt, rs, i.simm()),
            Opcode::Addiu => self.op_addiu(rt, rs, i.simm()),
            Opcode::Slti => self.op_slti(rt, rs, i.simm()),
            Opcode::Sltiu => self.op_sltiu(rt, rs, i.simm()),
            Opcode::Andi => self.op_andi(rt, rs, i.imm()),
            Opcode::Ori => self.op_ori(rt, rs, i.imm()),
            Opcode::Xori => self.op_xori(rt, rs, i.imm()),
            Opcode::Lui => self.op_lui(rt, i.imm()),
            Opcode::Daddi => self.op_daddi(rt, rs, i.simm()),
            Opcode::Daddiu => self.op_daddiu(rt, rs, i.simm()),

            Opcode::Lb => self.op_lb(bus, rt, i),
            Opcode::Lh => self.op_lh(bus, rt, i),
            Opcode::Lw => self.op_lw(bus, rt, i),
            Opcode::Lbu => self.op_lbu(bus, rt, i),
            Opcode::Lhu => self.op_lhu(bus, rt, i),
            Opcode::Lwu => self.op_lwu(bus, rt, i),
            Opcode::Ld => self.op_ld(bus, rt, i),
            Opcode::Lwl => self.op_lwl(bus, rt, i),
            Opcode::Lwr => self.op_lwr(bus, rt, i),
            Opcode::Ldl => self.op_ldl(bus, rt, i),
            Opcode::Ldr => self.op_ldr(bus, rt, i),
            Opcode::Ll => self.op_ll(bus, rt, i),
            Opcode::Lld => self.op_lld(bus, rt, i),
            Opcode::Sb => self.op_sb(bus, rt, i),
            Opcode::Sh => self.op_sh(bus, rt, i),
            Opcode::Sw => self.op_sw(bus, rt, i),
            Opcode::Sd => self.op_sd(bus, rt, i),
            Opcode::Swl => self.op_swl(bus, rt, i),
            Opcode::Swr => self.op_swr(bus, rt, i),
            Opcode::Sdl => self.op_sdl(bus, rt, i),
            Opcode::Sdr => self.op_sdr(bus, rt, i),
            Opcode::Sc => self.op_sc(bus, rt, i),
            Opcode::Scd => self.op_scd(bus, rt, i),
            Opcode::Cache => self.op_cache(bus, rt, i),

            Opcode::Mfc0 => self.op_mfc0(rt, rd),
            Opcode::Dmfc0 => self.op_dmfc0(rt, rd),
            Opcode::Mtc0 => self.op_mtc0(rt, rd),
            Opcode::Dmtc0 => self.op_dmtc0(rt, rd),
            Opcode::Tlbr => self.op_tlbr(),
            Opcode::Tlbwi => self.op_tlbwi(),
            Opcode::Tlbwr => self.op_tlbwr(),
            Opcode::Tlbp => self.op_tlbp(),
            Opcode::Eret => self.op_eret(),

            Opcode::Mfc1 => self.op_mfc1(rt, rd),
            Opcode::Dmfc1 => self.op_dmfc1(rt, rd),
            Opcode::Cfc1 => self.op_cfc1(rt, rd),
            Opcode::Mtc1 => self.op_mtc1(rt, rd),
            Opcode::Dmtc1 => self.op_dmtc1(rt, rd),
            Opcode::Ctc1 => self.op_ctc1(rt, rd),
            Opcode::Bc1f => self.op_bc1(false, false, i),
            Opcode::Bc1t => self.op_bc1(true, false, i),
            Opcode::Bc1fl => self.op_bc1(false, true, i),
            Opcode::Bc1tl => self.op_bc1(true, true, i),
            Opcode::Cop1 => self.op_cop1(i.command()),
            Opcode::Lwc1 => self.op_lwc1(bus, rt, i),
            Opcode::Ldc1 => self.op_ldc1(bus, rt, i),
            Opcode::Swc1 => self.op_swc1(bus, rt, i),
            Opcode::Sdc1 => self.op_sdc1(bus, rt, i),
            Opcode::Cop2 => self.op_unusable(2),
            Opcode::Cop3 => self.op_unusable(3),
        }
    }

    /// Undecodable word
    fn op_invalid(&mut self, word: u32) {
        log::debug!(
            "VR4300: reserved instruction 0x{:08X} at 0x{:016X}",
            word,
            self.pc
        );
        self.raise(Exception::new(ExceptionCode::ReservedInstruction));
    }
}
