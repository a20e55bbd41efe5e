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

//! Shared fixtures for the integration tests
//!
//! Hand assemblers for the instructions the tests generate, and builders
//! that place a program in flat memory with the processor pointed at it.

#![allow(dead_code)]

use cpux::core::bus::{Endian, Ram};
use cpux::core::processor::Processor;
use cpux::core::r3000a::R3000a;
use cpux::core::sh2::cache::Ccr;
use cpux::core::sh2::Sh2;
use cpux::core::vr4300::Vr4300;

/// Physical load address of test programs
pub const ORIGIN: u32 = 0x1000;
/// Physical address of test data
pub const DATA: u32 = 0x8000;
/// Initial SH-2 stack pointer
pub const STACK: u32 = 0xF000;
/// Flat memory size
pub const MEMORY: usize = 0x10000;

/// Uncached/cached windows onto physical zero
pub const R3000A_KSEG1: u64 = 0xA000_0000;
pub const VR4300_KSEG1: u64 = 0xFFFF_FFFF_A000_0000;
pub const VR4300_KSEG0: u64 = 0xFFFF_FFFF_8000_0000;
pub const SH2_UNCACHED: u64 = 0x2000_0000;

/// MIPS I/III encodings, shared by the R3000A and the VR4300
pub mod mips {
    const fn i(op: u32, rs: u8, rt: u8, imm: u16) -> u32 {
        op << 26 | (rs as u32) << 21 | (rt as u32) << 16 | imm as u32
    }

    const fn r(funct: u32, rs: u8, rt: u8, rd: u8, sa: u32) -> u32 {
        (rs as u32) << 21 | (rt as u32) << 16 | (rd as u32) << 11 | (sa & 31) << 6 | funct
    }

    pub const NOP: u32 = 0;
    pub const SYSCALL: u32 = 0x0000_000C;
    pub const RFE: u32 = 0x4200_0010;
    pub const ERET: u32 = 0x4200_0018;

    pub const fn lui(rt: u8, imm: u16) -> u32 {
        i(0x0F, 0, rt, imm)
    }
    pub const fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
        i(0x0D, rs, rt, imm)
    }
    pub const fn addiu(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x09, rs, rt, imm as u16)
    }
    pub const fn andi(rt: u8, rs: u8, imm: u16) -> u32 {
        i(0x0C, rs, rt, imm)
    }
    pub const fn slti(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x0A, rs, rt, imm as u16)
    }
    pub const fn lw(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x23, base, rt, offset as u16)
    }
    pub const fn sw(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x2B, base, rt, offset as u16)
    }
    pub const fn ld(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x37, base, rt, offset as u16)
    }
    pub const fn sd(rt: u8, offset: i16, base: u8) -> u32 {
        i(0x3F, base, rt, offset as u16)
    }
    pub const fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x04, rs, rt, offset as u16)
    }
    pub const fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x05, rs, rt, offset as u16)
    }
    pub const fn beql(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x14, rs, rt, offset as u16)
    }
    pub const fn bnel(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x15, rs, rt, offset as u16)
    }
    /// CACHE op,offset(base); `op` takes the rt field
    pub const fn cache(op: u8, offset: i16, base: u8) -> u32 {
        i(0x2F, base, op & 31, offset as u16)
    }
    pub const fn j(target: u32) -> u32 {
        0x02 << 26 | (target >> 2) & 0x03FF_FFFF
    }
    pub const fn jr(rs: u8) -> u32 {
        r(0x08, rs, 0, 0, 0)
    }
    /// ADD, trapping on signed overflow
    pub const fn add(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x20, rs, rt, rd, 0)
    }
    pub const fn addu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x21, rs, rt, rd, 0)
    }
    pub const fn subu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x23, rs, rt, rd, 0)
    }
    pub const fn and(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x24, rs, rt, rd, 0)
    }
    pub const fn or(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x25, rs, rt, rd, 0)
    }
    pub const fn xor(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x26, rs, rt, rd, 0)
    }
    pub const fn slt(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x2A, rs, rt, rd, 0)
    }
    pub const fn sltu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x2B, rs, rt, rd, 0)
    }
    pub const fn sll(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x00, 0, rt, rd, sa)
    }
    pub const fn srl(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x02, 0, rt, rd, sa)
    }
    pub const fn sra(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x03, 0, rt, rd, sa)
    }
    pub const fn multu(rs: u8, rt: u8) -> u32 {
        r(0x19, rs, rt, 0, 0)
    }
    pub const fn mflo(rd: u8) -> u32 {
        r(0x12, 0, 0, rd, 0)
    }
    pub const fn daddu(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x2D, rs, rt, rd, 0)
    }
    pub const fn dsll32(rd: u8, rt: u8, sa: u32) -> u32 {
        r(0x3C, 0, rt, rd, sa)
    }
    pub const fn mfc0(rt: u8, rd: u8) -> u32 {
        0x4000_0000 | (rt as u32) << 16 | (rd as u32) << 11
    }
    pub const fn mtc0(rt: u8, rd: u8) -> u32 {
        0x4080_0000 | (rt as u32) << 16 | (rd as u32) << 11
    }
}

/// SH-2 encodings
pub mod sh2 {
    const fn nm(base: u16, n: u8, m: u8) -> u16 {
        base | ((n & 15) as u16) << 8 | ((m & 15) as u16) << 4
    }

    pub const NOP: u16 = 0x0009;
    pub const RTE: u16 = 0x002B;

    pub const fn mov_imm(n: u8, imm: i8) -> u16 {
        0xE000 | ((n & 15) as u16) << 8 | imm as u8 as u16
    }
    pub const fn add_imm(n: u8, imm: i8) -> u16 {
        0x7000 | ((n & 15) as u16) << 8 | imm as u8 as u16
    }
    pub const fn mov(n: u8, m: u8) -> u16 {
        nm(0x6003, n, m)
    }
    pub const fn add(n: u8, m: u8) -> u16 {
        nm(0x300C, n, m)
    }
    pub const fn sub(n: u8, m: u8) -> u16 {
        nm(0x3008, n, m)
    }
    pub const fn and(n: u8, m: u8) -> u16 {
        nm(0x2009, n, m)
    }
    pub const fn or(n: u8, m: u8) -> u16 {
        nm(0x200B, n, m)
    }
    pub const fn xor(n: u8, m: u8) -> u16 {
        nm(0x200A, n, m)
    }
    pub const fn cmp_eq(n: u8, m: u8) -> u16 {
        nm(0x3000, n, m)
    }
    pub const fn cmp_gt(n: u8, m: u8) -> u16 {
        nm(0x3007, n, m)
    }
    pub const fn addc(n: u8, m: u8) -> u16 {
        nm(0x300E, n, m)
    }
    pub const fn mul_l(n: u8, m: u8) -> u16 {
        nm(0x0007, n, m)
    }
    pub const fn sts_macl(n: u8) -> u16 {
        nm(0x001A, n, 0)
    }
    pub const fn shll8(n: u8) -> u16 {
        nm(0x4018, n, 0)
    }
    /// MOV.L Rm,@Rn
    pub const fn mov_l_store(n: u8, m: u8) -> u16 {
        nm(0x2002, n, m)
    }
    /// MOV.L @Rm,Rn
    pub const fn mov_l_load(n: u8, m: u8) -> u16 {
        nm(0x6002, n, m)
    }
    pub const fn shll(n: u8) -> u16 {
        nm(0x4000, n, 0)
    }
    pub const fn shlr(n: u8) -> u16 {
        nm(0x4001, n, 0)
    }
    pub const fn rotcl(n: u8) -> u16 {
        nm(0x4024, n, 0)
    }
    pub const fn movt(n: u8) -> u16 {
        nm(0x0029, n, 0)
    }
    /// MOV.L Rm,@(disp*4,Rn)
    pub const fn mov_l_store_disp(n: u8, m: u8, disp: u8) -> u16 {
        nm(0x1000, n, m) | (disp & 15) as u16
    }
    /// MOV.L @(disp*4,Rm),Rn
    pub const fn mov_l_load_disp(n: u8, m: u8, disp: u8) -> u16 {
        nm(0x5000, n, m) | (disp & 15) as u16
    }
    /// MOV.B Rm,@Rn
    pub const fn mov_b_store(n: u8, m: u8) -> u16 {
        nm(0x2000, n, m)
    }
    /// MOV.L Rm,@-Rn
    pub const fn mov_l_push(n: u8, m: u8) -> u16 {
        nm(0x2006, n, m)
    }
    /// MOV.L @Rm+,Rn
    pub const fn mov_l_pop(n: u8, m: u8) -> u16 {
        nm(0x6006, n, m)
    }
    /// OR #imm,R0
    pub const fn or_r0(imm: u8) -> u16 {
        0xCB00 | imm as u16
    }
    /// LDC Rm,SR; the register sits in the n field
    pub const fn ldc_sr(m: u8) -> u16 {
        nm(0x400E, m, 0)
    }
    pub const fn trapa(imm: u8) -> u16 {
        0xC300 | imm as u16
    }
    pub const fn bt(disp: i8) -> u16 {
        0x8900 | disp as u8 as u16
    }
    pub const fn bf(disp: i8) -> u16 {
        0x8B00 | disp as u8 as u16
    }
    pub const fn bra(disp: i16) -> u16 {
        0xA000 | (disp as u16 & 0xFFF)
    }
}

/// R3000A in kernel mode running `program` from KSEG1
pub fn r3000a(program: &[u32]) -> (R3000a, Ram) {
    let mut ram = Ram::new(MEMORY, Endian::Little);
    ram.load_words(ORIGIN, program).unwrap();
    let mut cpu = R3000a::new();
    cpu.set_pc((R3000A_KSEG1 as u32) + ORIGIN);
    (cpu, ram)
}

/// VR4300 in 32-bit kernel mode, BEV and ERL clear, running `program` from
/// KSEG0 (cached) or KSEG1
pub fn vr4300(program: &[u32], cached: bool) -> (Vr4300, Ram) {
    let mut ram = Ram::new(MEMORY, Endian::Big);
    ram.load_words(ORIGIN, program).unwrap();
    let mut cpu = Vr4300::new();
    cpu.scc_mut().status = cpux::core::vr4300::scc::Status(0);
    cpu.scc_mut().config = 3;
    let segment = if cached { VR4300_KSEG0 } else { VR4300_KSEG1 };
    cpu.set_pc(segment + ORIGIN as u64);
    (cpu, ram)
}

/// SH-2 with interrupts unmasked, running `program` through the cache or
/// the cache-through area
pub fn sh2(program: &[u16], cached: bool) -> (Sh2, Ram) {
    let mut ram = Ram::new(MEMORY, Endian::Big);
    ram.load_halves(ORIGIN, program).unwrap();
    let mut cpu = Sh2::new();
    cpu.set_sr(cpux::core::sh2::status::Status(0));
    cpu.set_reg(15, STACK);
    if cached {
        cpu.cache_mut().set_control(Ccr::CE.bits());
        cpu.set_pc(ORIGIN);
    } else {
        cpu.set_pc(SH2_UNCACHED as u32 + ORIGIN);
    }
    (cpu, ram)
}

/// Run until the program counter reaches `end`, interpreting or through
/// recompiled blocks
pub fn run_to(cpu: &mut dyn Processor, ram: &mut Ram, end: u64, recompiled: bool) {
    cpu.set_recompiler(recompiled);
    for _ in 0..100_000 {
        if cpu.pc() == end {
            return;
        }
        if recompiled {
            cpu.execute(ram);
        } else {
            cpu.step(ram);
        }
    }
    panic!(
        "stopped at 0x{:X} without reaching 0x{:X} ({})",
        cpu.pc(),
        end,
        if recompiled { "recompiled" } else { "interpreted" }
    );
}

/// Big-endian word at `address`
pub fn be_word(ram: &Ram, address: u32) -> u32 {
    let bytes = &ram.as_bytes()[address as usize..address as usize + 4];
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
