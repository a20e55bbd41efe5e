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

//! VR4300 test modules
//!
//! - `basic`: reset state, arithmetic, register conventions, timing
//! - `branch`: delay slots, likely branches, links
//! - `memory`: loads/stores, unaligned access, LL/SC, data cache, faults
//! - `tlb`: mapped segments, TLB faults and maintenance instructions
//! - `cop0`: Count/Compare, interrupts, ERET, CACHE, COP1 forwarding
//! - `recompiler`: interpreter/recompiler equivalence





#[cfg(test)]
mod recompiler;


use super::scc::Status;
use super::Vr4300;
use crate::core::bus::{Endian, Ram};
use crate::core::processor::Processor;

/// Unmapped uncached segment
pub const KSEG1: u64 = 0xFFFF_FFFF_A000_0000;
/// Unmapped segment, cached when Config.K0 says so
pub const KSEG0: u64 = 0xFFFF_FFFF_8000_0000;
/// Physical load address of test programs
pub const ORIGIN: u32 = 0x1000;
/// General exception vector with BEV clear
pub const GENERAL_VECTOR: u64 = 0xFFFF_FFFF_8000_0180;
/// TLB refill vector with BEV clear
pub const REFILL_VECTOR: u64 = 0xFFFF_FFFF_8000_0000;

/// Kernel mode, 32-bit, BEV and ERL clear, interrupts disabled
pub fn setup(program: &[u32]) -> (Vr4300, Ram) {
    let mut ram = Ram::new(0x10000, Endian::Big);
    ram.load_words(ORIGIN, program).unwrap();
    let mut cpu = Vr4300::new();
    cpu.scc_mut().status = Status(0);
    cpu.set_pc(KSEG1 + ORIGIN as u64);
    (cpu, ram)
}

/// Same as [`setup`] but running from a cached kseg0
pub fn setup_cached(program: &[u32]) -> (Vr4300, Ram) {
    let (mut cpu, ram) = setup(program);
    cpu.scc_mut().config = 3;
    cpu.set_pc(KSEG0 + ORIGIN as u64);
    (cpu, ram)
}

pub fn steps(cpu: &mut Vr4300, ram: &mut Ram, count: usize) {
    for _ in 0..count {
        cpu.step(ram);
    }
}

/// Hand assembler for the instructions the tests use
pub mod asm {
    const fn i(op: u32, rs: u8, rt: u8, imm: u16) -> u32 {
        op << 26 | (rs as u32) << 21 | (rt as u32) << 16 | imm as u32
    }

    const fn r(funct: u32, rs: u8, rt: u8, rd: u8, sa: u32) -> u32 {
        (rs as u32) << 21 | (rt as u32) << 16 | (rd as u32) << 11 | sa << 6 | funct
    }

    const fn cop0(function: u32, rt: u8, rd: u8) -> u32 {
        0x4000_0000 | function << 21 | (rt as u32) << 16 | (rd as u32) << 11
    }

    pub const NOP: u32 = 0;
    pub const SYSCALL: u32 = 0x0000_000C;
    pub const ERET: u32 = 0x4200_0018;
    pub const TLBR: u32 = 0x4200_0001;
    pub const TLBWI: u32 = 0x4200_0002;
    pub const TLBP: u32 = 0x4200_0008;

    pub const fn lui(rt: u8, imm: u16) -> u32 {
        i(0x0F, 0, rt, imm)
    }
    pub const fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
        i(0x0D, rs, rt, imm)
    }
    pub const fn addiu(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x09, rs, rt, imm as u16)
    }
    pub const fn slti(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x0A, rs, rt, imm as u16)
    }
    pub const fn lb(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x20, base, rt, offset as u16)
    }
    pub const fn lw(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x23, base, rt, offset as u16)
    }
    pub const fn lwl(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x22, base, rt, offset as u16)
    }
    pub const fn lwr(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x26, base, rt, offset as u16)
    }
    pub const fn ld(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x37, base, rt, offset as u16)
    }
    pub const fn ll(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x30, base, rt, offset as u16)
    }
    pub const fn sb(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x28, base, rt, offset as u16)
    }
    pub const fn sw(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x2B, base, rt, offset as u16)
    }
    pub const fn swl(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x2A, base, rt, offset as u16)
    }
    pub const fn swr(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x2E, base, rt, offset as u16)
    }
    pub const fn sd(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x3F, base, rt, offset as u16)
    }
    pub const fn sc(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x38, base, rt, offset as u16)
    }
    pub const fn lwc1(ft: u8, offset: i16, base: u8) -> u32 {
        i(0x31, base, ft, offset as u16)
    }
    pub const fn cache(op: u8, offset: i16, base: u8) -> u32 {
        i(0x2F, base, op, offset as u16)
    }
    pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x04, rs, rt, offset as u16)
    }
    pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x05, rs, rt, offset as u16)
    }
    pub const fn bnel(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x15, rs, rt, offset as u16)
    }
    pub const fn bltzal(rs: u8, offset: i16) -> u32 {
        i(0x01, rs, 0x10, offset as u16)
    }
    pub const fn bc1t(offset: i16) -> u32 {
        0x4501_0000 | offset as u16 as u32
    }
    pub const fn j(target: u32) -> u32 {
        0x02 << 26 | (target >> 2) & 0x03FF_FFFF
    }
    pub const fn jal(target: u32) -> u32 {
        0x03 << 26 | (target >> 2) & 0x03FF_FFFF
    }
    pub const fn jr(rs: u8) -> u32 {
        r(0x08, rs, 0, 0, 0)
    }
    pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x20, rs, rt, rd, 0)
    }
    pub const fn addu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x21, rs, rt, rd, 0)
    }
    pub const fn div(rs: u8, rt: u8) -> u32 {
        r(0x1A, rs, rt, 0, 0)
    }
    pub const fn mult(rs: u8, rt: u8) -> u32 {
        r(0x18, rs, rt, 0, 0)
    }
    pub const fn mfhi(rd: u8) -> u32 {
        r(0x10, 0, 0, rd, 0)
    }
    pub const fn mflo(rd: u8) -> u32 {
        r(0x12, 0, 0, rd, 0)
    }
    pub const fn sra(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x03, 0, rt, rd, sa)
    }
    pub const fn dsll32(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x3C, 0, rt, rd, sa)
    }
    pub const fn teq(rs: u8, rt: u8) -> u32 {
        r(0x34, rs, rt, 0, 0)
    }
    pub const fn mfc0(rt: u8, rd: u8) -> u32 {
        cop0(0x00, rt, rd)
    }
    pub const fn mtc0(rt: u8, rd: u8) -> u32 {
        cop0(0x04, rt, rd)
    }
    pub const fn mfc1(rt: u8, fs: u8) -> u32 {
        0x4400_0000 | (rt as u32) << 16 | (fs as u32) << 11
    }
    pub const fn mtc1(rt: u8, fs: u8) -> u32 {
        0x4480_0000 | (rt as u32) << 16 | (fs as u32) << 11
    }
}
