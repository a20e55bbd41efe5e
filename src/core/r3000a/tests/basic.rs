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
use super::super::cop0::{reg, PRID};
use super::super::*;
use super::asm::*;
use super::*;
use crate::core::bus::Ram;
use crate::core::processor::Processor;

#[test]
fn test_reset_state() {
    let cpu = R3000a::new();
    assert_eq!(cpu.pc(), RESET_VECTOR as u64);
    assert_eq!(cpu.next_pc(), RESET_VECTOR + 4);
    assert_eq!(cpu.clock(), 0);
    assert!(cpu.cop0().status.bootstrap_vectors());
    assert!(!cpu.cop0().status.user_mode());
    assert_eq!(cpu.cop0().read(reg::PRID), Some(PRID));
    assert!(cpu.cache_control().is_empty());
}

#[test]
fn test_reset_clears_registers() {
    let (mut cpu, mut ram) = setup(&[addiu(8, 0, 7)]);
    cpu.step(&mut ram);
    assert_eq!(cpu.reg(8), 7);

    cpu.reset();
    assert_eq!(cpu.reg(8), 0);
    assert_eq!(cpu.pc(), RESET_VECTOR as u64);
    assert_eq!(cpu.clock(), 0);
}

#[test]
fn test_lui_ori() {
    let (mut cpu, mut ram) = setup(&[lui(8, 0x8000), ori(8, 8, 0x1234)]);
    steps(&mut cpu, &mut ram, 2);
    assert_eq!(cpu.reg(8), 0x8000_1234);
}

#[test]
fn test_r0_is_hardwired() {
    let (mut cpu, mut ram) = setup(&[addiu(0, 0, 5), addu(8, 0, 0)]);
    steps(&mut cpu, &mut ram, 2);
    assert_eq!(cpu.reg(0), 0);
    assert_eq!(cpu.reg(8), 0);
}

#[test]
fn test_uncached_step_cost() {
    let (mut cpu, mut ram) = setup(&[NOP]);
    let cycles = cpu.step(&mut ram);
    assert_eq!(cycles, CYCLES_PER_INSTRUCTION + Ram::DEFAULT_LATENCY);
    assert_eq!(cpu.clock(), cycles as u64);
    assert_eq!(cpu.pc(), (KSEG1 + ORIGIN + 4) as u64);
}

#[test]
fn test_cached_fetch_charges_line_fill_once() {
    let (mut cpu, mut ram) = setup_cached(&[NOP, NOP, NOP, NOP, NOP]);
    let fill = cpu.step(&mut ram);
    assert_eq!(fill, CYCLES_PER_INSTRUCTION + 4 * Ram::DEFAULT_LATENCY);
    for _ in 0..3 {
        assert_eq!(cpu.step(&mut ram), CYCLES_PER_INSTRUCTION);
    }
    // Next line
    assert_eq!(cpu.step(&mut ram), fill);
}

#[test]
fn test_add_overflow_leaves_destination() {
    let (mut cpu, mut ram) = setup(&[
        lui(8, 0x7FFF),
        ori(8, 8, 0xFFFF),
        addiu(9, 0, 1),
        add(10, 8, 9),
    ]);
    cpu.set_reg(10, 0x55);
    steps(&mut cpu, &mut ram, 4);
    assert_eq!(cpu.reg(10), 0x55);
    assert_eq!(cpu.pc(), GENERAL_VECTOR as u64);
    assert_eq!(cpu.cop0().cause.exception_code(), 12);
    assert_eq!(cpu.cop0().epc, KSEG1 + ORIGIN + 12);
}

#[test]
fn test_addi_overflow_and_sub() {
    let (mut cpu, mut ram) = setup(&[
        addiu(8, 0, 5),
        addiu(9, 0, 7),
        sub(10, 8, 9),
        slt(11, 10, 0),
        sltiu(12, 8, -1),
        lui(13, 0x8000),
        addi(14, 13, -1),
    ]);
    steps(&mut cpu, &mut ram, 7);
    assert_eq!(cpu.reg(10), (-2i32) as u32);
    assert_eq!(cpu.reg(11), 1);
    // -1 sign-extends to 0xFFFF_FFFF, compared unsigned
    assert_eq!(cpu.reg(12), 1);
    assert_eq!(cpu.reg(14), 0);
    assert_eq!(cpu.cop0().cause.exception_code(), 12);
}

#[test]
fn test_shifts() {
    let (mut cpu, mut ram) = setup(&[
        lui(8, 0x8000),
        sra(9, 8, 4),
        addiu(10, 0, 36),
        srlv(11, 8, 10),
    ]);
    steps(&mut cpu, &mut ram, 4);
    assert_eq!(cpu.reg(9), 0xF800_0000);
    // Only the low five bits of rs count
    assert_eq!(cpu.reg(11), 0x0800_0000);
}

#[test]
fn test_mult_signed() {
    let (mut cpu, mut ram) = setup(&[
        addiu(8, 0, -2),
        addiu(9, 0, 3),
        mult(8, 9),
        mflo(10),
        mfhi(11),
    ]);
    steps(&mut cpu, &mut ram, 2);
    let cycles = cpu.step(&mut ram);
    steps(&mut cpu, &mut ram, 2);
    assert_eq!(cpu.reg(10), 0xFFFF_FFFA);
    assert_eq!(cpu.reg(11), 0xFFFF_FFFF);
    assert!(cycles > CYCLES_PER_INSTRUCTION + Ram::DEFAULT_LATENCY);
}

#[test]
fn test_divide_by_zero() {
    let (mut cpu, mut ram) = setup(&[
        addiu(8, 0, -7),
        div(8, 0),
        mflo(9),
        mfhi(10),
        divu(8, 0),
        mflo(11),
        mfhi(12),
    ]);
    steps(&mut cpu, &mut ram, 7);
    assert_eq!(cpu.reg(9), 1);
    assert_eq!(cpu.reg(10), 0xFFFF_FFF9);
    assert_eq!(cpu.reg(11), 0xFFFF_FFFF);
    assert_eq!(cpu.reg(12), 0xFFFF_FFF9);
}

#[test]
fn test_divide_overflow_does_not_trap() {
    let (mut cpu, mut ram) = setup(&[
        lui(8, 0x8000),
        addiu(9, 0, -1),
        div(8, 9),
        mflo(10),
        mfhi(11),
    ]);
    steps(&mut cpu, &mut ram, 5);
    assert_eq!(cpu.reg(10), 0x8000_0000);
    assert_eq!(cpu.reg(11), 0);
    assert_eq!(cpu.pc(), (KSEG1 + ORIGIN + 20) as u64);
}

#[test]
fn test_invalid_opcode_raises_reserved_instruction() {
    let (mut cpu, mut ram) = setup(&[0xFC00_0000]);
    cpu.step(&mut ram);
    assert_eq!(cpu.cop0().cause.exception_code(), 10);
    assert_eq!(cpu.pc(), GENERAL_VECTOR as u64);
}

#[test]
fn test_registers_snapshot() {
    let (mut cpu, mut ram) = setup(&[addiu(31, 0, -1)]);
    cpu.step(&mut ram);
    let registers = cpu.registers();
    assert_eq!(registers.len(), 32);
    assert_eq!(registers[31], 0xFFFF_FFFF);
}
