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
//! SH-2 test modules
//!
//! - `basic`: reset, boot, arithmetic, division, multiply-accumulate
//! - `branch`: delay slots, BT/BF, subroutine calls, slot illegal
//! - `memory`: areas, addressing modes, cache and its arrays, TAS
//! - `exception`: traps, interrupts, NMI, SLEEP, address errors
//! - `recompiler`: interpreter/recompiler equivalence






use super::cache::Ccr;
use super::status::Status;
use super::Sh2;
use crate::core::bus::{Endian, Ram};
use crate::core::processor::Processor;

/// Cache-through alias of area 0
pub const UNCACHED: u32 = 0x2000_0000;
/// Physical load address of test programs
pub const ORIGIN: u32 = 0x1000;
/// Physical address of test data
pub const DATA: u32 = 0x2000;
/// Initial stack pointer
pub const STACK: u32 = 0x8000;
/// Handler address installed in every vector
pub const HANDLER: u32 = 0x0600;

/// Interrupts unmasked, VBR at zero, running from the cache-through area
///
/// Every vector table entry points at [`HANDLER`], which holds NOPs.
pub fn setup(program: &[u16]) -> (Sh2, Ram) {
    let mut ram = Ram::new(0x10000, Endian::Big);
    ram.load_words(0, &[HANDLER; 128]).unwrap();
    ram.load_halves(HANDLER, &[asm::NOP; 16]).unwrap();
    ram.load_halves(ORIGIN, program).unwrap();
    let mut cpu = Sh2::new();
    cpu.set_sr(Status(0));
    cpu.set_reg(15, STACK);
    cpu.set_pc(UNCACHED + ORIGIN);
    (cpu, ram)
}

/// Same as [`setup`] but running from area 0 with the cache enabled
pub fn setup_cached(program: &[u16]) -> (Sh2, Ram) {
    let (mut cpu, ram) = setup(program);
    cpu.cache_mut().set_control(Ccr::CE.bits());
    cpu.set_pc(ORIGIN);
    (cpu, ram)
}

pub fn steps(cpu: &mut Sh2, ram: &mut Ram, count: usize) {
    for _ in 0..count {
        cpu.step(ram);
    }
}

/// Hand assembler for the instructions the tests use
pub mod asm {
    const fn nm(base: u16, n: u8, m: u8) -> u16 {
        base | (n as u16) << 8 | (m as u16) << 4
    }

    const fn ni(base: u16, n: u8, imm: u8) -> u16 {
        base | (n as u16) << 8 | imm as u16
    }

    const fn n(base: u16, n: u8) -> u16 {
        base | (n as u16) << 8
    }

    pub const NOP: u16 = 0x0009;
    pub const RTS: u16 = 0x000B;
    pub const RTE: u16 = 0x002B;
    pub const SLEEP: u16 = 0x001B;
    pub const CLRT: u16 = 0x0008;
    pub const SETT: u16 = 0x0018;
    pub const CLRMAC: u16 = 0x0028;
    pub const DIV0U: u16 = 0x0019;
    pub const INVALID: u16 = 0xFFFF;

    pub const fn mov_imm(rn: u8, imm: i8) -> u16 {
        ni(0xE000, rn, imm as u8)
    }
    pub const fn add_imm(rn: u8, imm: i8) -> u16 {
        ni(0x7000, rn, imm as u8)
    }
    pub const fn cmp_eq_imm(imm: i8) -> u16 {
        0x8800 | imm as u8 as u16
    }
    pub const fn mov(rn: u8, rm: u8) -> u16 {
        nm(0x6003, rn, rm)
    }
    pub const fn add(rn: u8, rm: u8) -> u16 {
        nm(0x300C, rn, rm)
    }
    pub const fn addc(rn: u8, rm: u8) -> u16 {
        nm(0x300E, rn, rm)
    }
    pub const fn addv(rn: u8, rm: u8) -> u16 {
        nm(0x300F, rn, rm)
    }
    pub const fn sub(rn: u8, rm: u8) -> u16 {
        nm(0x3008, rn, rm)
    }
    pub const fn subc(rn: u8, rm: u8) -> u16 {
        nm(0x300A, rn, rm)
    }
    pub const fn negc(rn: u8, rm: u8) -> u16 {
        nm(0x600A, rn, rm)
    }
    pub const fn cmp_gt(rn: u8, rm: u8) -> u16 {
        nm(0x3007, rn, rm)
    }
    pub const fn cmp_hi(rn: u8, rm: u8) -> u16 {
        nm(0x3006, rn, rm)
    }
    pub const fn cmp_str(rn: u8, rm: u8) -> u16 {
        nm(0x200C, rn, rm)
    }
    pub const fn div1(rn: u8, rm: u8) -> u16 {
        nm(0x3004, rn, rm)
    }
    pub const fn div0s(rn: u8, rm: u8) -> u16 {
        nm(0x2007, rn, rm)
    }
    pub const fn dmuls(rn: u8, rm: u8) -> u16 {
        nm(0x300D, rn, rm)
    }
    pub const fn mul_l(rn: u8, rm: u8) -> u16 {
        nm(0x0007, rn, rm)
    }
    pub const fn muls(rn: u8, rm: u8) -> u16 {
        nm(0x200F, rn, rm)
    }
    pub const fn mac_w(rn: u8, rm: u8) -> u16 {
        nm(0x400F, rn, rm)
    }
    pub const fn mac_l(rn: u8, rm: u8) -> u16 {
        nm(0x000F, rn, rm)
    }
    pub const fn xtrct(rn: u8, rm: u8) -> u16 {
        nm(0x200D, rn, rm)
    }
    pub const fn swap_b(rn: u8, rm: u8) -> u16 {
        nm(0x6008, rn, rm)
    }
    pub const fn exts_b(rn: u8, rm: u8) -> u16 {
        nm(0x600E, rn, rm)
    }
    pub const fn exts_w(rn: u8, rm: u8) -> u16 {
        nm(0x600F, rn, rm)
    }
    pub const fn extu_w(rn: u8, rm: u8) -> u16 {
        nm(0x600D, rn, rm)
    }
    pub const fn mov_b_store(rn: u8, rm: u8) -> u16 {
        nm(0x2000, rn, rm)
    }
    pub const fn mov_w_store(rn: u8, rm: u8) -> u16 {
        nm(0x2001, rn, rm)
    }
    pub const fn mov_l_store(rn: u8, rm: u8) -> u16 {
        nm(0x2002, rn, rm)
    }
    pub const fn mov_b_load(rn: u8, rm: u8) -> u16 {
        nm(0x6000, rn, rm)
    }
    pub const fn mov_w_load(rn: u8, rm: u8) -> u16 {
        nm(0x6001, rn, rm)
    }
    pub const fn mov_l_load(rn: u8, rm: u8) -> u16 {
        nm(0x6002, rn, rm)
    }
    pub const fn mov_l_post_inc(rn: u8, rm: u8) -> u16 {
        nm(0x6006, rn, rm)
    }
    pub const fn mov_l_pre_dec(rn: u8, rm: u8) -> u16 {
        nm(0x2006, rn, rm)
    }
    pub const fn mov_l_load_r0(rn: u8, rm: u8) -> u16 {
        nm(0x000E, rn, rm)
    }
    pub const fn mov_l_store_disp(rn: u8, rm: u8, disp: u8) -> u16 {
        nm(0x1000, rn, rm) | (disp & 0xF) as u16
    }
    pub const fn mov_l_load_disp(rn: u8, rm: u8, disp: u8) -> u16 {
        nm(0x5000, rn, rm) | (disp & 0xF) as u16
    }
    /// MOV.B R0,@(disp,Rn)
    pub const fn mov_b_store_disp_r0(rn: u8, disp: u8) -> u16 {
        0x8000 | (rn as u16) << 4 | (disp & 0xF) as u16
    }
    /// MOV.W @(disp,Rm),R0
    pub const fn mov_w_load_disp_r0(rm: u8, disp: u8) -> u16 {
        0x8500 | (rm as u16) << 4 | (disp & 0xF) as u16
    }
    pub const fn mov_w_pc(rn: u8, disp: u8) -> u16 {
        ni(0x9000, rn, disp)
    }
    pub const fn mov_l_pc(rn: u8, disp: u8) -> u16 {
        ni(0xD000, rn, disp)
    }
    pub const fn mova(disp: u8) -> u16 {
        0xC700 | disp as u16
    }
    pub const fn mov_l_load_gbr(disp: u8) -> u16 {
        0xC600 | disp as u16
    }
    pub const fn or_byte(imm: u8) -> u16 {
        0xCF00 | imm as u16
    }
    pub const fn tst_byte(imm: u8) -> u16 {
        0xCC00 | imm as u16
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
    pub const fn bts(disp: i8) -> u16 {
        0x8D00 | disp as u8 as u16
    }
    pub const fn bra(disp: i16) -> u16 {
        0xA000 | (disp as u16 & 0xFFF)
    }
    pub const fn bsr(disp: i16) -> u16 {
        0xB000 | (disp as u16 & 0xFFF)
    }
    pub const fn braf(rm: u8) -> u16 {
        n(0x0023, rm)
    }
    pub const fn jmp(rm: u8) -> u16 {
        n(0x402B, rm)
    }
    pub const fn jsr(rm: u8) -> u16 {
        n(0x400B, rm)
    }
    pub const fn dt(rn: u8) -> u16 {
        n(0x4010, rn)
    }
    pub const fn rotcl(rn: u8) -> u16 {
        n(0x4024, rn)
    }
    pub const fn shar(rn: u8) -> u16 {
        n(0x4021, rn)
    }
    pub const fn shll16(rn: u8) -> u16 {
        n(0x4028, rn)
    }
    pub const fn movt(rn: u8) -> u16 {
        n(0x0029, rn)
    }
    pub const fn tas(rn: u8) -> u16 {
        n(0x401B, rn)
    }
    pub const fn ldc_sr(rm: u8) -> u16 {
        n(0x400E, rm)
    }
    pub const fn ldc_gbr(rm: u8) -> u16 {
        n(0x401E, rm)
    }
    pub const fn ldc_vbr(rm: u8) -> u16 {
        n(0x402E, rm)
    }
    pub const fn stc_sr(rn: u8) -> u16 {
        n(0x0002, rn)
    }
    pub const fn sts_pr(rn: u8) -> u16 {
        n(0x002A, rn)
    }
    pub const fn sts_macl(rn: u8) -> u16 {
        n(0x001A, rn)
    }
    pub const fn sts_mach(rn: u8) -> u16 {
        n(0x000A, rn)
    }
    pub const fn lds_macl(rm: u8) -> u16 {
        n(0x401A, rm)
    }
    pub const fn lds_l_macl(rm: u8) -> u16 {
        n(0x4016, rm)
    }
    pub const fn sts_l_pr(rn: u8) -> u16 {
        n(0x4022, rn)
    }
}
