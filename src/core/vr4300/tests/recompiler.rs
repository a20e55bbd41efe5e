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

use super::super::scc::{EntryLo, Status};
use super::super::*;
use super::asm::*;
use super::*;
use crate::core::bus::Ram;
use crate::core::processor::Processor;

const LIMIT: usize = 100_000;

fn run_interpreted(cpu: &mut Vr4300, ram: &mut Ram, done: impl Fn(&Vr4300) -> bool) {
    for _ in 0..LIMIT {
        if done(cpu) {
            return;
        }
        cpu.step(ram);
    }
    panic!("interpreter did not reach the stop condition");
}

fn run_recompiled(cpu: &mut Vr4300, ram: &mut Ram, done: impl Fn(&Vr4300) -> bool) {
    cpu.set_recompiler(true);
    for _ in 0..LIMIT {
        if done(cpu) {
            return;
        }
        cpu.execute(ram);
    }
    panic!("recompiler did not reach the stop condition");
}

/// Sum loop storing every partial sum; ends in a jump-to-self at +0x2C
fn sum_loop(segment: u16) -> Vec<u32> {
    vec![
        addiu(8, 0, 40),
        addiu(9, 0, 0),
        lui(10, segment),
        ori(10, 10, 0x2000),
        addu(9, 9, 8), // loop
        sw(9, 0, 10),
        lw(11, 0, 10),
        addiu(10, 10, 4),
        addiu(8, 8, -1),
        bne(8, 0, -6),
        addiu(12, 12, 1),
        j(ORIGIN + 0x2C),
        NOP,
    ]
}

fn assert_equivalent(
    build: impl Fn() -> (Vr4300, Ram),
    done: impl Fn(&Vr4300) -> bool + Copy,
) -> Vr4300 {
    let (mut reference, mut reference_ram) = build();
    run_interpreted(&mut reference, &mut reference_ram, done);

    let (mut cpu, mut ram) = build();
    run_recompiled(&mut cpu, &mut ram, done);

    assert_eq!(cpu.save_state(), reference.save_state());
    assert_eq!(ram.as_bytes(), reference_ram.as_bytes());
    cpu
}

#[test]
fn test_uncached_loop_matches_interpreter() {
    let end = KSEG1 + ORIGIN as u64 + 0x2C;
    let cpu = assert_equivalent(|| setup(&sum_loop(0xA000)), |cpu| cpu.pc() == end);
    assert_eq!(cpu.reg(9), 820);
    assert_eq!(cpu.reg(12), 40);
    assert!(cpu.blocks().len() >= 2);
}

#[test]
fn test_cached_loop_matches_interpreter() {
    let end = KSEG0 + ORIGIN as u64 + 0x2C;
    let cpu = assert_equivalent(|| setup_cached(&sum_loop(0x8000)), |cpu| cpu.pc() == end);
    assert_eq!(cpu.reg(9), 820);
    let state = cpu.block_state(true);
    assert!(cpu.blocks().lookup(ORIGIN as u64, state).is_some());
    assert!(cpu.blocks().lookup(ORIGIN as u64 + 0x10, state).is_some());
}

#[test]
fn test_small_code_buffer_flushes() {
    let end = KSEG1 + ORIGIN as u64 + 0x2C;
    let build = || {
        let (cpu, ram) = setup(&sum_loop(0xA000));
        let mut small = Vr4300::with_code_buffer(4096 + 64);
        small.load_state(&cpu.save_state()).unwrap();
        (small, ram)
    };
    let cpu = assert_equivalent(build, |cpu| cpu.pc() == end);
    assert!(cpu.blocks().flushes() > 1);
}

#[test]
fn test_timer_interrupt_lands_at_same_instruction() {
    let build = || {
        let (mut cpu, mut ram) = setup(&[addiu(8, 8, 1), j(ORIGIN), NOP]);
        ram.load_words(
            0x180,
            &[
                addiu(16, 16, 1),
                mfc0(26, scc::reg::COUNT),
                addiu(26, 26, 37),
                mtc0(26, scc::reg::COMPARE),
                ERET,
            ],
        )
        .unwrap();
        cpu.scc_mut().status = Status(Status::IE | 0x8000);
        cpu.scc_mut().compare = 50;
        (cpu, ram)
    };
    let cpu = assert_equivalent(build, |cpu| {
        cpu.pc() == GENERAL_VECTOR && cpu.reg(16) == 3
    });
    assert_eq!(cpu.scc().cause.exception_code(), 0);
}

#[test]
fn test_fetch_fault_matches_interpreter() {
    let program = [lui(8, 0x0040), jr(8), addiu(9, 0, 1)];
    let cpu = assert_equivalent(|| setup(&program), |cpu| cpu.pc() == REFILL_VECTOR);
    assert_eq!(cpu.reg(9), 1);
    assert_eq!(cpu.scc().bad_vaddr, 0x0040_0000);
    assert_eq!(cpu.scc().epc, 0x0040_0000);
}

#[test]
fn test_delay_slot_exception_matches_interpreter() {
    let program = [addiu(8, 0, 1), beq(0, 0, 4), SYSCALL];
    let cpu = assert_equivalent(|| setup(&program), |cpu| cpu.pc() == GENERAL_VECTOR);
    assert!(cpu.scc().cause.branch_delay());
    assert_eq!(cpu.scc().epc, KSEG1 + ORIGIN as u64 + 4);
}

#[test]
fn test_icache_invalidate_drops_blocks() {
    let subroutine = ORIGIN + 0x100;
    let (mut cpu, mut ram) = setup_cached(&[
        lui(16, 0x8000),
        ori(16, 16, subroutine as u16),
        jal(subroutine),
        NOP,
        cache(0x10, 0, 16),
        j(ORIGIN + 0x14),
        NOP,
    ]);
    ram.load_words(subroutine, &[addiu(8, 8, 1), jr(31), NOP])
        .unwrap();
    let end = KSEG0 + ORIGIN as u64 + 0x14;
    run_recompiled(&mut cpu, &mut ram, |cpu| cpu.pc() == end);

    let state = cpu.block_state(true);
    assert_eq!(cpu.reg(8), 1);
    assert!(cpu.blocks().lookup(ORIGIN as u64, state).is_some());
    assert!(cpu.blocks().lookup(subroutine as u64, state).is_none());
    assert!(!cpu.icache().line(subroutine).valid);
}

#[test]
fn test_stale_icache_runs_cached_word() {
    let (mut cpu, mut ram) = setup_cached(&[addiu(8, 0, 1), addiu(9, 0, 2), j(ORIGIN + 8), NOP]);
    cpu.step(&mut ram);
    ram.load_words(ORIGIN + 4, &[addiu(9, 0, 3)]).unwrap();

    cpu.set_recompiler(true);
    cpu.execute(&mut ram);
    assert_eq!(cpu.reg(9), 2);
    assert_eq!(cpu.pc(), KSEG0 + ORIGIN as u64 + 8);
}

#[test]
fn test_breakpoint_halts_recompiled_run() {
    let (mut cpu, mut ram) = setup(&sum_loop(0xA000));
    let stop = KSEG1 + ORIGIN as u64 + 0x18;
    cpu.debugger_mut().breakpoints_mut().insert(stop);
    cpu.set_recompiler(true);
    cpu.run(&mut ram, 1_000_000);

    assert!(cpu.debugger().halted());
    assert_eq!(cpu.pc(), stop);
    assert_eq!(cpu.reg(9), 40);
}

#[test]
fn test_block_state_tracks_mode() {
    let (mut cpu, mut ram) = setup_cached(&sum_loop(0x8000));
    cpu.set_recompiler(true);
    cpu.execute(&mut ram);
    let kernel = cpu.block_state(true);

    cpu.scc_mut().status = Status(1 << 29);
    assert_ne!(cpu.block_state(true), kernel);
    assert_ne!(cpu.block_state(false), kernel);
}

#[test]
fn test_delay_slot_on_next_page_follows_tlb() {
    // Virtual 0x0000 -> 0x1000 and 0x1000 -> 0x3000; physical 0x2000 holds
    // a decoy that a linear read past the branch would pick up
    let build = || {
        let (mut cpu, mut ram) = setup(&[]);
        ram.load_words(0x1FF8, &[addiu(9, 0, 7), beq(0, 0, 2)]).unwrap();
        ram.load_words(0x2000, &[addiu(8, 0, 2)]).unwrap();
        ram.load_words(0x3000, &[addiu(8, 0, 1), NOP, j(0x1008), NOP])
            .unwrap();
        let page = |frame: u32| EntryLo(frame << 6 | 2 << 3 | 1 << 2 | 1 << 1 | 1);
        cpu.tlb_mut().write(0, 0, 0, [page(1), page(3)]);
        cpu.set_pc(0x0FF8);
        (cpu, ram)
    };
    let cpu = assert_equivalent(build, |cpu| cpu.pc() == 0x1008);
    assert_eq!(cpu.reg(8), 1);
    assert_eq!(cpu.reg(9), 7);
}
