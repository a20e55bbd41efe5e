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

//! Interpreter/recompiler equivalence
//!
//! Random programs run once through the interpreter and once through
//! recompiled blocks; the final processor state and memory must be
//! identical. The plain generators emit straight-line code with short
//! forward branches. The system generators add exceptions and interrupts
//! taken mid-block, cache maintenance, cache control writes, branch-likely
//! annulment and, on the VR4300, code running from TLB-mapped pages that
//! are not physically contiguous.

mod common;

use common::*;
use cpux::core::bus::Ram;
use cpux::core::processor::Processor;
use cpux::core::r3000a::R3000a;
use cpux::core::sh2::Sh2;
use cpux::core::vr4300::scc::EntryLo;
use cpux::core::vr4300::Vr4300;
use proptest::prelude::*;

/// One generated operation: a selector and raw operand material
type Op = (u8, u8, u8, u8, u16);

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 1..48)
}

fn assert_equivalent<P: Processor>(build: impl Fn() -> (P, Ram), end: u64) {
    let (mut reference, mut reference_ram) = build();
    run_to(&mut reference, &mut reference_ram, end, false);

    let (mut cpu, mut ram) = build();
    run_to(&mut cpu, &mut ram, end, true);

    assert_eq!(cpu.save_state(), reference.save_state());
    assert_eq!(ram.as_bytes(), reference_ram.as_bytes());
}

// === MIPS ===

const R3000A_KSEG0: u32 = 0x8000_0000;

/// R3000A general exception handler at 0x8000_0080: resume past the
/// faulting instruction
const R3000A_HANDLER: [u32; 5] = {
    use common::mips::*;
    [mfc0(26, 14), NOP, addiu(26, 26, 4), jr(26), RFE]
};

/// VR4300 general exception handler at 0x8000_0180
///
/// Interrupts come from the timer: Compare is cleared and the interrupted
/// instruction runs again. Anything else resumes past the faulting
/// instruction.
const VR4300_HANDLER: [u32; 10] = {
    use common::mips::*;
    [
        mfc0(26, 13),
        andi(26, 26, 0x7C),
        beq(26, 0, 5),
        NOP,
        mfc0(26, 14),
        addiu(26, 26, 4),
        mtc0(26, 14),
        ERET,
        mtc0(0, 11),
        ERET,
    ]
};

/// Status with IE and the timer interrupt unmasked
const VR4300_TIMER_ENABLED: u32 = 1 << 15 | 1;

/// VR4300 mapped pages: the odd half of the pair at 0x0040_0000 and the
/// even half of the pair at 0x0040_2000, backed by frames with a decoy
/// between them
const MAPPED_FIRST: u32 = 0x0040_1000;
const MAPPED_SECOND: u32 = 0x0040_2000;
const FIRST_FRAME: u32 = 0x3000;
const DECOY_FRAME: u32 = 0x4000;
const SECOND_FRAME: u32 = 0x5000;
const PAGE: u32 = 0x1000;

/// CACHE operations the generator draws from: index and hit invalidates
/// of the instruction cache, then data cache write-back and invalidate
const CACHE_OPS: [u8; 6] = [0x00, 0x10, 0x01, 0x11, 0x15, 0x19];

/// Where a generated MIPS program works
#[derive(Debug, Clone, Copy)]
struct Mips {
    /// Data area, held in r16
    data: u32,
    /// Start of the program, held in r18 for instruction cache operations
    code: u32,
    /// VR4300: doubleword operations and the MIPS III system kinds
    wide: bool,
    /// Exceptions, interrupts and cache control
    system: bool,
}

/// MIPS body over r1-r15
///
/// r16 points at the data area; r17-r19 are scratch for the system kinds.
fn mips_body(ops: &[Op], target: Mips) -> Vec<u32> {
    use common::mips::*;

    let plain = if target.wide { 16 } else { 14 };
    let system = match (target.system, target.wide) {
        (false, _) => 0,
        (true, false) => 3,
        (true, true) => 5,
    };
    let mut program = vec![
        lui(16, (target.data >> 16) as u16),
        ori(16, 16, target.data as u16),
    ];
    if target.system {
        program.extend([lui(18, (target.code >> 16) as u16), ori(18, 18, target.code as u16)]);
    }
    for &(kind, a, b, c, imm) in ops {
        let (rd, rs, rt) = (a % 15 + 1, b % 15 + 1, c % 15 + 1);
        let offset = (imm & 0xFC) as i16;
        let alu = addu(rd, rs, rt);
        let kind = kind % (plain + system);
        if kind >= plain {
            let extra = kind - plain;
            if target.wide {
                vr4300_system(&mut program, extra, (rd, rs, rt), imm);
            } else {
                r3000a_system(&mut program, extra, (rd, rs, rt), imm);
            }
            continue;
        }
        match kind {
            0 => program.push(addiu(rd, rs, imm as i16)),
            1 => program.push(ori(rd, rs, imm)),
            2 => program.push(andi(rd, rs, imm)),
            3 => program.push(lui(rd, imm)),
            4 => program.push(subu(rd, rs, rt)),
            5 => program.push(xor(rd, rs, rt)),
            6 => program.push(or(rd, rs, rt)),
            7 => program.push(and(rd, rs, rt)),
            8 => program.push(slt(rd, rs, rt)),
            9 => program.push(sltu(rd, rs, rt)),
            10 => program.push(match imm % 3 {
                0 => sll(rd, rt, imm as u32),
                1 => srl(rd, rt, imm as u32),
                _ => sra(rd, rt, imm as u32),
            }),
            11 => program.extend([sw(rt, offset, 16), lw(rd, offset, 16)]),
            12 => program.extend([multu(rs, rt), mflo(rd)]),
            // Branch over one instruction; the delay slot always runs
            13 => {
                let branch = if imm & 1 == 0 { beq(rs, rt, 1) } else { bne(rs, rt, 1) };
                program.extend([branch, alu, slti(rd, rt, imm as i16)]);
            }
            14 => program.extend([sd(rt, offset & 0xF8, 16), ld(rd, offset & 0xF8, 16)]),
            _ => program.extend([dsll32(rd, rt, imm as u32), daddu(rd, rd, rs)]),
        }
    }
    program
}

fn r3000a_system(program: &mut Vec<u32>, kind: u8, (rd, rs, rt): (u8, u8, u8), imm: u16) {
    use common::mips::*;

    match kind {
        0 => program.push(add(rd, rs, rt)),
        1 => program.push(SYSCALL),
        // Cache control: code cache and scratchpad on or off
        _ => {
            let control = imm & 0x0888;
            program.extend([lui(17, 0xFFFE), ori(19, 0, control), sw(19, 0x130, 17)]);
        }
    }
}

fn vr4300_system(program: &mut Vec<u32>, kind: u8, (rd, rs, rt): (u8, u8, u8), imm: u16) {
    use common::mips::*;

    match kind {
        0 => program.push(add(rd, rs, rt)),
        1 => program.push(SYSCALL),
        // The delay slot only runs when the branch is taken
        2 => {
            let branch = if imm & 1 == 0 { beql(rs, rt, 1) } else { bnel(rs, rt, 1) };
            program.extend([branch, addu(rd, rs, rt), slti(rd, rt, imm as i16)]);
        }
        3 => {
            let op = CACHE_OPS[imm as usize % CACHE_OPS.len()];
            let base = if op & 3 == 0 { 18 } else { 16 };
            let offset = if op & 3 == 0 { imm & 0x1E0 } else { imm & 0xF0 };
            program.push(cache(op, offset as i16, base));
        }
        // Timer interrupt a few instructions ahead
        _ => program.extend([
            mfc0(17, 9),
            addiu(17, 17, (imm & 0x1F) as i16 + 1),
            mtc0(17, 11),
        ]),
    }
}

/// Append `j end; nop` and the self-loop at `end`; returns the address of
/// `end` for a program starting at `origin`
fn mips_finish(program: &mut Vec<u32>, origin: u32) -> u32 {
    use common::mips::*;

    let end = origin + (program.len() as u32 + 2) * 4;
    program.extend([j(end), NOP, j(end), NOP]);
    end
}

/// R3000A running `program` from KSEG0 with the exception handler in place
/// and BEV clear
fn r3000a_system_setup(program: &[u32]) -> (R3000a, Ram) {
    let (mut cpu, mut ram) = r3000a(program);
    ram.load_words(0x80, &R3000A_HANDLER).unwrap();
    cpu.cop0_mut().status = cpux::core::r3000a::cop0::Status(0);
    cpu.set_pc(R3000A_KSEG0 + ORIGIN);
    (cpu, ram)
}

/// VR4300 with the exception handler in place and the timer interrupt
/// enabled
fn vr4300_system_setup(program: &[u32], cached: bool) -> (Vr4300, Ram) {
    let (mut cpu, mut ram) = vr4300(program, cached);
    ram.load_words(0x180, &VR4300_HANDLER).unwrap();
    cpu.scc_mut().status = cpux::core::vr4300::scc::Status(VR4300_TIMER_ENABLED);
    (cpu, ram)
}

/// Start of a mapped program whose first `split` words end the first page
fn mapped_origin(split: usize) -> u32 {
    MAPPED_SECOND - 4 * split as u32
}

/// VR4300 running `program` from mapped kuseg pages
///
/// The first `split` words sit at the end of the first page, the rest at
/// the start of the second. The frame that physically follows the first
/// page holds different code.
fn vr4300_mapped_setup(program: &[u32], split: usize, cached: bool) -> (Vr4300, Ram) {
    use common::mips::*;

    let (mut cpu, mut ram) = vr4300_system_setup(&[], cached);
    let head = split.min(program.len());
    let first = FIRST_FRAME + PAGE - 4 * split as u32;
    ram.load_words(first, &program[..head]).unwrap();
    ram.load_words(SECOND_FRAME, &program[head..]).unwrap();
    ram.load_words(DECOY_FRAME, &[addiu(1, 1, 0x55); 64]).unwrap();

    let coherency = if cached { 3 } else { 2 };
    let page = |frame: u32| EntryLo((frame >> 12) << 6 | coherency << 3 | 1 << 2 | 1 << 1 | 1);
    let unused = EntryLo(1);
    let first_pair = (MAPPED_FIRST & !(2 * PAGE - 1)) as u64;
    cpu.tlb_mut().write(0, 0, first_pair, [unused, page(FIRST_FRAME)]);
    cpu.tlb_mut().write(1, 0, MAPPED_SECOND as u64, [page(SECOND_FRAME), unused]);
    cpu.set_pc(mapped_origin(split) as u64);
    (cpu, ram)
}

// === SH-2 ===

const SH2_TRAP: u8 = 32;
const SH2_IRQ_LEVEL: u8 = 5;
const SH2_IRQ_VECTOR: u8 = 70;
const SH2_TRAP_HANDLER: u32 = 0x400;
const SH2_IRQ_HANDLER: u32 = 0x440;

/// SR with every interrupt level masked
const SH2_MASKED: u32 = 0xF0;

/// Level 5 handler: mask every level in the saved SR so the still-asserted
/// request is not taken again after RTE. R0 is preserved on the stack.
const SH2_IRQ_CODE: [u16; 7] = {
    use common::sh2::*;
    [
        mov_l_push(15, 0),
        mov_l_load_disp(0, 15, 2),
        or_r0(0xF0),
        mov_l_store_disp(15, 0, 2),
        mov_l_pop(0, 15),
        RTE,
        NOP,
    ]
};

fn sh2_body(ops: &[Op], system: bool) -> Vec<u16> {
    use common::sh2::*;

    let kinds = if system { 16 } else { 13 };
    let mut program = Vec::new();
    for &(kind, a, b, _, imm) in ops {
        // R14 holds the data pointer, R15 the stack
        let (n, m) = (a % 14, b % 14);
        let disp = imm as u8 & 15;
        match kind % kinds {
            0 => program.push(mov_imm(n, imm as i8)),
            1 => program.push(add_imm(n, imm as i8)),
            2 => program.push(add(n, m)),
            3 => program.push(sub(n, m)),
            4 => program.push(xor(n, m)),
            5 => program.push(and(n, m)),
            6 => program.push(or(n, m)),
            7 => program.push(match imm % 4 {
                0 => shll(n),
                1 => shlr(n),
                2 => rotcl(n),
                _ => movt(n),
            }),
            8 => program.extend([addc(n, m), mov(m, n)]),
            9 => program.extend([mov_l_store_disp(14, m, disp), mov_l_load_disp(n, 14, disp)]),
            10 => program.extend([mul_l(n, m), sts_macl(n)]),
            // Conditional skip of one instruction
            11 => {
                let compare = if imm & 1 == 0 { cmp_eq(n, m) } else { cmp_gt(n, m) };
                let branch = if imm & 2 == 0 { bt(0) } else { bf(0) };
                program.extend([compare, branch, add_imm(n, 1)]);
            }
            // Delayed skip of one instruction
            12 => program.extend([bra(1), add(n, m), add_imm(m, -1)]),
            13 => program.push(trapa(SH2_TRAP)),
            // Unmask: the pending request is taken after the next instruction
            14 => program.extend([mov_imm(n, 0), ldc_sr(n), add_imm(m, 1)]),
            // CCR at 0xFFFF_FE92: toggle the cache, sometimes with a purge
            _ => program.extend([
                mov_imm(13, -1),
                shll8(13),
                add_imm(13, -110),
                mov_imm(12, (imm & 0x11) as i8),
                mov_b_store(13, 12),
            ]),
        }
    }
    program
}

/// Append `bra end; nop` and the self-loop at `end`; returns the offset
/// of `end` from ORIGIN
fn sh2_finish(program: &mut Vec<u16>) -> u32 {
    use common::sh2::*;

    let end = (program.len() as u32 + 2) * 2;
    program.extend([bra(0), NOP, bra(-2), NOP]);
    end
}

/// SH-2 with trap and interrupt handlers installed and a level 5 request
/// held against a fully masked SR
fn sh2_system_setup(program: &[u16], cached: bool) -> (Sh2, Ram) {
    use common::sh2::*;

    let base = if cached { 0 } else { SH2_UNCACHED as u32 };
    let (mut cpu, mut ram) = sh2(program, cached);
    ram.load_halves(SH2_TRAP_HANDLER, &[RTE, NOP]).unwrap();
    ram.load_halves(SH2_IRQ_HANDLER, &SH2_IRQ_CODE).unwrap();
    ram.load_words(SH2_TRAP as u32 * 4, &[base + SH2_TRAP_HANDLER]).unwrap();
    ram.load_words(SH2_IRQ_VECTOR as u32 * 4, &[base + SH2_IRQ_HANDLER]).unwrap();
    cpu.set_sr(cpux::core::sh2::status::Status(SH2_MASKED));
    cpu.set_interrupt_vector(SH2_IRQ_LEVEL, SH2_IRQ_VECTOR);
    cpu.set_interrupt(SH2_IRQ_LEVEL, true);
    cpu.set_reg(14, base + DATA);
    (cpu, ram)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn r3000a_recompiler_matches_interpreter(ops in ops()) {
        let target = Mips { data: 0xA000_0000 | DATA, code: 0, wide: false, system: false };
        let mut program = mips_body(&ops, target);
        let end = mips_finish(&mut program, ORIGIN);
        assert_equivalent(|| r3000a(&program), R3000A_KSEG1 + end as u64);
    }

    #[test]
    fn vr4300_recompiler_matches_interpreter(ops in ops(), cached in any::<bool>()) {
        let segment = if cached { 0x8000_0000 } else { 0xA000_0000 };
        let target = Mips { data: segment | DATA, code: 0, wide: true, system: false };
        let mut program = mips_body(&ops, target);
        let end = mips_finish(&mut program, ORIGIN) as u64;
        let base = if cached { VR4300_KSEG0 } else { VR4300_KSEG1 };
        assert_equivalent(|| vr4300(&program, cached), base + end);
    }

    #[test]
    fn sh2_recompiler_matches_interpreter(ops in ops(), cached in any::<bool>()) {
        let mut program = sh2_body(&ops, false);
        let end = sh2_finish(&mut program);
        let base = if cached { 0 } else { SH2_UNCACHED as u32 };
        let build = || {
            let (mut cpu, ram) = sh2(&program, cached);
            cpu.set_reg(14, base + DATA);
            (cpu, ram)
        };
        assert_equivalent(build, (base + ORIGIN + end) as u64);
    }

    #[test]
    fn r3000a_recompiler_matches_interpreter_with_exceptions(ops in ops()) {
        let code = R3000A_KSEG0 + ORIGIN;
        let target = Mips { data: 0xA000_0000 | DATA, code, wide: false, system: true };
        let mut program = mips_body(&ops, target);
        let end = mips_finish(&mut program, ORIGIN);
        assert_equivalent(|| r3000a_system_setup(&program), (R3000A_KSEG0 + end) as u64);
    }

    #[test]
    fn vr4300_recompiler_matches_interpreter_with_exceptions(
        ops in ops(),
        cached in any::<bool>(),
    ) {
        let segment = if cached { 0x8000_0000 } else { 0xA000_0000 };
        let code = segment | ORIGIN;
        let target = Mips { data: segment | DATA, code, wide: true, system: true };
        let mut program = mips_body(&ops, target);
        let end = mips_finish(&mut program, ORIGIN) as u64;
        let base = if cached { VR4300_KSEG0 } else { VR4300_KSEG1 };
        assert_equivalent(|| vr4300_system_setup(&program, cached), base + end);
    }

    #[test]
    fn vr4300_recompiler_matches_interpreter_across_mapped_pages(
        ops in ops(),
        cached in any::<bool>(),
        split in 1usize..64,
    ) {
        let segment = if cached { 0x8000_0000 } else { 0xA000_0000 };
        let origin = mapped_origin(split);
        let target = Mips { data: segment | DATA, code: origin, wide: true, system: true };
        let mut program = mips_body(&ops, target);
        let end = mips_finish(&mut program, origin) as u64;
        assert_equivalent(|| vr4300_mapped_setup(&program, split, cached), end);
    }

    #[test]
    fn sh2_recompiler_matches_interpreter_with_exceptions(
        ops in ops(),
        cached in any::<bool>(),
    ) {
        let mut program = sh2_body(&ops, true);
        let end = sh2_finish(&mut program);
        let base = if cached { 0 } else { SH2_UNCACHED as u32 };
        assert_equivalent(|| sh2_system_setup(&program, cached), (base + ORIGIN + end) as u64);
    }
}
