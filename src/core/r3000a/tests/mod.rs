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
//! R3000A test modules
//!
//! - `basic`: reset state, arithmetic, multiply/divide, timing
//! - `branch`: delay slots, links, Cause.BD/BT
//! - `load_delay`: the load delay slot and LWL/LWR merging
//! - `memory`: segments, faults, partial stores, scratchpad, isolation
//! - `cop0`: interrupts, RFE, coprocessor usability, breakpoint unit
//! - `recompiler`: interpreter/recompiler equivalence

#[cfg(test)]
mod basic;






use super::cop0::Status;
use super::memory::CacheControl;
use super::R3000a;
use crate::core::bus::{Endian, Ram};
use crate::core::processor::Processor;

pub const KSEG0: u32 = 0x8000_0000;
pub const KSEG1: u32 = 0xA000_0000;
/// Physical load address of test programs
pub const ORIGIN: u32 = 0x1000;
/// Physical address of test data
pub const DATA: u32 = 0x2000;
pub const GENERAL_VECTOR: u32 = 0x8000_0080;

/// Kernel mode, BEV clear, interrupts disabled, running uncached
pub fn setup(program: &[u32]) -> (R3000a, Ram) {
    let mut ram = Ram::new(0x10000, Endian::Little);
    ram.load_words(ORIGIN, program).unwrap();
    let mut cpu = R3000a::new();
    cpu.cop0_mut().status = Status(0);
    cpu.set_pc(KSEG1 + ORIGIN);
    (cpu, ram)
}

/// Same as [`setup`] but fetching through the instruction cache
pub fn setup_cached(program: &[u32]) -> (R3000a, Ram) {
    let (mut cpu, ram) = setup(program);
    cpu.set_cache_control(CacheControl::CODE);
    cpu.set_pc(KSEG0 + ORIGIN);
    (cpu, ram)
}

/// User mode, running from kuseg
pub fn setup_user(program: &[u32]) -> (R3000a, Ram) {
    let (mut cpu, ram) = setup(program);
    cpu.cop0_mut().status = Status(Status::KUC);
    cpu.set_pc(ORIGIN);
    (cpu, ram)
}

pub fn steps(cpu: &mut R3000a, ram: &mut Ram, count: usize) {
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

    const fn cop(unit: u32, function: u32, rt: u8, rd: u8) -> u32 {
        (0x10 | unit) << 26 | function << 21 | (rt as u32) << 16 | (rd as u32) << 11
    }

    pub const NOP: u32 = 0;
    pub const SYSCALL: u32 = 0x0000_000C;
    pub const BREAK: u32 = 0x0000_000D;
    pub const RFE: u32 = 0x4200_0010;

    pub const fn lui(rt: u8, imm: u16) -> u32 {
        i(0x0F, 0, rt, imm)
    }
    pub const fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
        i(0x0D, rs, rt, imm)
    }
    pub const fn addiu(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x09, rs, rt, imm as u16)
    }
    pub const fn addi(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x08, rs, rt, imm as u16)
    }
    pub const fn sltiu(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x0B, rs, rt, imm as u16)
    }
    pub const fn lb(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x20, base, rt, offset as u16)
    }
    pub const fn lbu(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x24, base, rt, offset as u16)
    }
    pub const fn lh(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x21, base, rt, offset as u16)
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
    pub const fn sb(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x28, base, rt, offset as u16)
    }
    pub const fn sh(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x29, base, rt, offset as u16)
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
    pub const fn lwc2(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x32, base, rt, offset as u16)
    }
    pub const fn swc2(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x3A, base, rt, offset as u16)
    }
    pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x04, rs, rt, offset as u16)
    }
    pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x05, rs, rt, offset as u16)
    }
    pub const fn regimm(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x01, rs, rt, offset as u16)
    }
    pub const fn bltzal(rs: u8, offset: i16) -> u32 {
        regimm(rs, 0x10, offset)
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
    pub const fn jalr(rd: u8, rs: u8) -> u32 {
        r(0x09, rs, 0, rd, 0)
    }
    pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x20, rs, rt, rd, 0)
    }
    pub const fn addu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x21, rs, rt, rd, 0)
    }
    pub const fn sub(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x22, rs, rt, rd, 0)
    }
    pub const fn slt(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x2A, rs, rt, rd, 0)
    }
    pub const fn sra(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x03, 0, rt, rd, sa)
    }
    pub const fn srlv(rd: u8, rt: u8, rs: u8) -> u32 {
        r(0x06, rs, rt, rd, 0)
    }
    pub const fn mult(rs: u8, rt: u8) -> u32 {
        r(0x18, rs, rt, 0, 0)
    }
    pub const fn div(rs: u8, rt: u8) -> u32 {
        r(0x1A, rs, rt, 0, 0)
    }
    pub const fn divu(rs: u8, rt: u8) -> u32 {
        r(0x1B, rs, rt, 0, 0)
    }
    pub const fn mfhi(rd: u8) -> u32 {
        r(0x10, 0, 0, rd, 0)
    }
    pub const fn mflo(rd: u8) -> u32 {
        r(0x12, 0, 0, rd, 0)
    }
    pub const fn mfc0(rt: u8, rd: u8) -> u32 {
        cop(0, 0x00, rt, rd)
    }
    pub const fn mtc0(rt: u8, rd: u8) -> u32 {
        cop(0, 0x04, rt, rd)
    }
    pub const fn mfc2(rt: u8, rd: u8) -> u32 {
        cop(2, 0x00, rt, rd)
    }
    pub const fn mtc2(rt: u8, rd: u8) -> u32 {
        cop(2, 0x04, rt, rd)
    }
    pub const fn cop2(command: u32) -> u32 {
        0x4A00_0000 | command & 0x01FF_FFFF
    }
    pub const fn mfc1(rt: u8, rd: u8) -> u32 {
        cop(1, 0x00, rt, rd)
    }
}
