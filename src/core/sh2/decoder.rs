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
//! SH-2 instruction decoder
//!
//! Instructions are 16 bits wide, so the whole encoding space fits one
//! table. It is built at compile time from four format tables, consulted in
//! order:
//!
//! | Format    | Key                          | Example          |
//! |-----------|------------------------------|------------------|
//! | `nm`      | bits 15:12 and 3:0           | `ADD Rm,Rn`      |
//! | `md`/`i`  | bits 15:8                    | `BT disp`        |
//! | `n`/`m`   | bits 15:12 and 7:0           | `JMP @Rm`        |
//! | `0`       | all 16 bits                  | `RTS`            |

use crate::core::opcode::opcode_table;

opcode_table! {
    /// One variant per semantic routine
    pub enum Opcode {
        Invalid => "invalid",
        // nm format
        MovBStoreR0 => "mov.b Rm,@(R0,Rn)",
        MovWStoreR0 => "mov.w Rm,@(R0,Rn)",
        MovLStoreR0 => "mov.l Rm,@(R0,Rn)",
        MulL => "mul.l",
        MovBLoadR0 => "mov.b @(R0,Rm),Rn",
        MovWLoadR0 => "mov.w @(R0,Rm),Rn",
        MovLLoadR0 => "mov.l @(R0,Rm),Rn",
        MacL => "mac.l",
        MovLStoreDisp => "mov.l Rm,@(disp,Rn)",
        MovBStore => "mov.b Rm,@Rn",
        MovWStore => "mov.w Rm,@Rn",
        MovLStore => "mov.l Rm,@Rn",
        MovBPreDec => "mov.b Rm,@-Rn",
        MovWPreDec => "mov.w Rm,@-Rn",
        MovLPreDec => "mov.l Rm,@-Rn",
        Div0s => "div0s",
        Tst => "tst",
        And => "and",
        Xor => "xor",
        Or => "or",
        CmpStr => "cmp/str",
        Xtrct => "xtrct",
        Mulu => "mulu.w",
        Muls => "muls.w",
        CmpEq => "cmp/eq",
        CmpHs => "cmp/hs",
        CmpGe => "cmp/ge",
        Div1 => "div1",
        Dmulu => "dmulu.l",
        CmpHi => "cmp/hi",
        CmpGt => "cmp/gt",
        Sub => "sub",
        Subc => "subc",
        Subv => "subv",
        Add => "add",
        Dmuls => "dmuls.l",
        Addc => "addc",
        Addv => "addv",
        MacW => "mac.w",
        MovLLoadDisp => "mov.l @(disp,Rm),Rn",
        MovBLoad => "mov.b @Rm,Rn",
        MovWLoad => "mov.w @Rm,Rn",
        MovLLoad => "mov.l @Rm,Rn",
        Mov => "mov",
        MovBPostInc => "mov.b @Rm+,Rn",
        MovWPostInc => "mov.w @Rm+,Rn",
        MovLPostInc => "mov.l @Rm+,Rn",
        Not => "not",
        SwapB => "swap.b",
        SwapW => "swap.w",
        Negc => "negc",
        Neg => "neg",
        ExtuB => "extu.b",
        ExtuW => "extu.w",
        ExtsB => "exts.b",
        ExtsW => "exts.w",
        AddImm => "add #imm,Rn",
        MovWPc => "mov.w @(disp,PC),Rn",
        Bra => "bra",
        Bsr => "bsr",
        MovLPc => "mov.l @(disp,PC),Rn",
        MovImm => "mov #imm,Rn",
        // md, nd4, d8 and i formats
        MovBStoreDispR0 => "mov.b R0,@(disp,Rn)",
        MovWStoreDispR0 => "mov.w R0,@(disp,Rn)",
        MovBLoadDispR0 => "mov.b @(disp,Rm),R0",
        MovWLoadDispR0 => "mov.w @(disp,Rm),R0",
        CmpEqImm => "cmp/eq #imm,R0",
        Bt => "bt",
        Bf => "bf",
        Bts => "bt/s",
        Bfs => "bf/s",
        MovBStoreGbr => "mov.b R0,@(disp,GBR)",
        MovWStoreGbr => "mov.w R0,@(disp,GBR)",
        MovLStoreGbr => "mov.l R0,@(disp,GBR)",
        Trapa => "trapa",
        MovBLoadGbr => "mov.b @(disp,GBR),R0",
        MovWLoadGbr => "mov.w @(disp,GBR),R0",
        MovLLoadGbr => "mov.l @(disp,GBR),R0",
        Mova => "mova",
        TstImm => "tst #imm,R0",
        AndImm => "and #imm,R0",
        XorImm => "xor #imm,R0",
        OrImm => "or #imm,R0",
        TstByte => "tst.b #imm,@(R0,GBR)",
        AndByte => "and.b #imm,@(R0,GBR)",
        XorByte => "xor.b #imm,@(R0,GBR)",
        OrByte => "or.b #imm,@(R0,GBR)",
        // n and m formats
        StcSr => "stc SR,Rn",
        Bsrf => "bsrf",
        StsMach => "sts MACH,Rn",
        StcGbr => "stc GBR,Rn",
        StsMacl => "sts MACL,Rn",
        StcVbr => "stc VBR,Rn",
        Braf => "braf",
        Movt => "movt",
        StsPr => "sts PR,Rn",
        Shll => "shll",
        Shlr => "shlr",
        StsMachPreDec => "sts.l MACH,@-Rn",
        StcSrPreDec => "stc.l SR,@-Rn",
        Rotl => "rotl",
        Rotr => "rotr",
        LdsMachPostInc => "lds.l @Rm+,MACH",
        LdcSrPostInc => "ldc.l @Rm+,SR",
        Shll2 => "shll2",
        Shlr2 => "shlr2",
        LdsMach => "lds Rm,MACH",
        Jsr => "jsr",
        LdcSr => "ldc Rm,SR",
        Dt => "dt",
        CmpPz => "cmp/pz",
        StsMaclPreDec => "sts.l MACL,@-Rn",
        StcGbrPreDec => "stc.l GBR,@-Rn",
        CmpPl => "cmp/pl",
        LdsMaclPostInc => "lds.l @Rm+,MACL",
        LdcGbrPostInc => "ldc.l @Rm+,GBR",
        Shll8 => "shll8",
        Shlr8 => "shlr8",
        LdsMacl => "lds Rm,MACL",
        Tas => "tas.b",
        LdcGbr => "ldc Rm,GBR",
        Shal => "shal",
        Shar => "shar",
        StsPrPreDec => "sts.l PR,@-Rn",
        StcVbrPreDec => "stc.l VBR,@-Rn",
        Rotcl => "rotcl",
        Rotcr => "rotcr",
        LdsPrPostInc => "lds.l @Rm+,PR",
        LdcVbrPostInc => "ldc.l @Rm+,VBR",
        Shll16 => "shll16",
        Shlr16 => "shlr16",
        LdsPr => "lds Rm,PR",
        Jmp => "jmp",
        LdcVbr => "ldc Rm,VBR",
        // zero-operand format
        Clrt => "clrt",
        Nop => "nop",
        Rts => "rts",
        Sett => "sett",
        Div0u => "div0u",
        Sleep => "sleep",
        Clrmac => "clrmac",
        Rte => "rte",
    }
}

impl Opcode {
    /// Branches executing the following instruction before the transfer
    pub const fn is_delayed_branch(self) -> bool {
        matches!(
            self,
            Opcode::Bra
                | Opcode::Bsr
                | Opcode::Braf
                | Opcode::Bsrf
                | Opcode::Jmp
                | Opcode::Jsr
                | Opcode::Rts
                | Opcode::Rte
                | Opcode::Bts
                | Opcode::Bfs
        )
    }

    /// Any control transfer, delayed or not
    pub const fn is_branch(self) -> bool {
        self.is_delayed_branch() || matches!(self, Opcode::Bt | Opcode::Bf)
    }

    /// Raises a slot illegal instruction exception when found in a delay slot
    pub const fn illegal_in_slot(self) -> bool {
        self.is_branch() || matches!(self, Opcode::Trapa | Opcode::Invalid)
    }

    /// Translation stops after these: they always leave the instruction
    /// stream
    pub const fn ends_block(self) -> bool {
        matches!(self, Opcode::Trapa | Opcode::Sleep | Opcode::Invalid)
    }

    /// Load/store/control-register moves after which interrupts are held
    /// off for one instruction
    pub const fn inhibits_interrupts(self) -> bool {
        matches!(
            self,
            Opcode::LdcSr
                | Opcode::LdcGbr
                | Opcode::LdcVbr
                | Opcode::LdcSrPostInc
                | Opcode::LdcGbrPostInc
                | Opcode::LdcVbrPostInc
                | Opcode::LdsMach
                | Opcode::LdsMacl
                | Opcode::LdsPr
                | Opcode::LdsMachPostInc
                | Opcode::LdsMaclPostInc
                | Opcode::LdsPrPostInc
                | Opcode::StcSr
                | Opcode::StcGbr
                | Opcode::StcVbr
                | Opcode::StcSrPreDec
                | Opcode::StcGbrPreDec
                | Opcode::StcVbrPreDec
                | Opcode::StsMach
                | Opcode::StsMacl
                | Opcode::StsPr
                | Opcode::StsMachPreDec
                | Opcode::StsMaclPreDec
                | Opcode::StsPrPreDec
        )
    }
}

/// Operand fields
#[inline(always)]
pub const fn rn(word: u16) -> usize {
    (word >> 8 & 0xF) as usize
}

#[inline(always)]
pub const fn rm(word: u16) -> usize {
    (word >> 4 & 0xF) as usize
}

#[inline(always)]
pub const fn imm8(word: u16) -> u32 {
    (word & 0xFF) as u32
}

#[inline(always)]
pub const fn disp4(word: u16) -> u32 {
    (word & 0xF) as u32
}

#[inline(always)]
pub const fn disp12(word: u16) -> u32 {
    (word & 0xFFF) as u32
}

/// `nm` format, keyed by bits 15:12 and 3:0
const NM: [Opcode; 256] = {
    use Opcode::*;
    let mut t = [Invalid; 256];
    t[0x04] = MovBStoreR0;
    t[0x05] = MovWStoreR0;
    t[0x06] = MovLStoreR0;
    t[0x07] = MulL;
    t[0x0C] = MovBLoadR0;
    t[0x0D] = MovWLoadR0;
    t[0x0E] = MovLLoadR0;
    t[0x0F] = MacL;
    t[0x20] = MovBStore;
    t[0x21] = MovWStore;
    t[0x22] = MovLStore;
    t[0x24] = MovBPreDec;
    t[0x25] = MovWPreDec;
    t[0x26] = MovLPreDec;
    t[0x27] = Div0s;
    t[0x28] = Tst;
    t[0x29] = And;
    t[0x2A] = Xor;
    t[0x2B] = Or;
    t[0x2C] = CmpStr;
    t[0x2D] = Xtrct;
    t[0x2E] = Mulu;
    t[0x2F] = Muls;
    t[0x30] = CmpEq;
    t[0x32] = CmpHs;
    t[0x33] = CmpGe;
    t[0x34] = Div1;
    t[0x35] = Dmulu;
    t[0x36] = CmpHi;
    t[0x37] = CmpGt;
    t[0x38] = Sub;
    t[0x3A] = Subc;
    t[0x3B] = Subv;
    t[0x3C] = Add;
    t[0x3D] = Dmuls;
    t[0x3E] = Addc;
    t[0x3F] = Addv;
    t[0x4F] = MacW;
    t[0x60] = MovBLoad;
    t[0x61] = MovWLoad;
    t[0x62] = MovLLoad;
    t[0x63] = Mov;
    t[0x64] = MovBPostInc;
    t[0x65] = MovWPostInc;
    t[0x66] = MovLPostInc;
    t[0x67] = Not;
    t[0x68] = SwapB;
    t[0x69] = SwapW;
    t[0x6A] = Negc;
    t[0x6B] = Neg;
    t[0x6C] = ExtuB;
    t[0x6D] = ExtuW;
    t[0x6E] = ExtsB;
    t[0x6F] = ExtsW;
    let mut low = 0;
    while low < 16 {
        t[0x10 | low] = MovLStoreDisp;
        t[0x50 | low] = MovLLoadDisp;
        t[0x70 | low] = AddImm;
        t[0x90 | low] = MovWPc;
        t[0xA0 | low] = Bra;
        t[0xB0 | low] = Bsr;
        t[0xD0 | low] = MovLPc;
        t[0xE0 | low] = MovImm;
        low += 1;
    }
    t
};

/// `md`, `nd4`, `d8` and `i` formats, keyed by bits 15:8
const HIGH_BYTE: [Opcode; 256] = {
    use Opcode::*;
    let mut t = [Invalid; 256];
    t[0x80] = MovBStoreDispR0;
    t[0x81] = MovWStoreDispR0;
    t[0x84] = MovBLoadDispR0;
    t[0x85] = MovWLoadDispR0;
    t[0x88] = CmpEqImm;
    t[0x89] = Bt;
    t[0x8B] = Bf;
    t[0x8D] = Bts;
    t[0x8F] = Bfs;
    t[0xC0] = MovBStoreGbr;
    t[0xC1] = MovWStoreGbr;
    t[0xC2] = MovLStoreGbr;
    t[0xC3] = Trapa;
    t[0xC4] = MovBLoadGbr;
    t[0xC5] = MovWLoadGbr;
    t[0xC6] = MovLLoadGbr;
    t[0xC7] = Mova;
    t[0xC8] = TstImm;
    t[0xC9] = AndImm;
    t[0xCA] = XorImm;
    t[0xCB] = OrImm;
    t[0xCC] = TstByte;
    t[0xCD] = AndByte;
    t[0xCE] = XorByte;
    t[0xCF] = OrByte;
    t
};

/// `n` and `m` formats, keyed by bits 15:12 and 7:0
const SINGLE: [Opcode; 4096] = {
    use Opcode::*;
    let mut t = [Invalid; 4096];
    t[0x002] = StcSr;
    t[0x003] = Bsrf;
    t[0x00A] = StsMach;
    t[0x012] = StcGbr;
    t[0x01A] = StsMacl;
    t[0x022] = StcVbr;
    t[0x023] = Braf;
    t[0x029] = Movt;
    t[0x02A] = StsPr;
    t[0x400] = Shll;
    t[0x401] = Shlr;
    t[0x402] = StsMachPreDec;
    t[0x403] = StcSrPreDec;
    t[0x404] = Rotl;
    t[0x405] = Rotr;
    t[0x406] = LdsMachPostInc;
    t[0x407] = LdcSrPostInc;
    t[0x408] = Shll2;
    t[0x409] = Shlr2;
    t[0x40A] = LdsMach;
    t[0x40B] = Jsr;
    t[0x40E] = LdcSr;
    t[0x410] = Dt;
    t[0x411] = CmpPz;
    t[0x412] = StsMaclPreDec;
    t[0x413] = StcGbrPreDec;
    t[0x415] = CmpPl;
    t[0x416] = LdsMaclPostInc;
    t[0x417] = LdcGbrPostInc;
    t[0x418] = Shll8;
    t[0x419] = Shlr8;
    t[0x41A] = LdsMacl;
    t[0x41B] = Tas;
    t[0x41E] = LdcGbr;
    t[0x420] = Shal;
    t[0x421] = Shar;
    t[0x422] = StsPrPreDec;
    t[0x423] = StcVbrPreDec;
    t[0x424] = Rotcl;
    t[0x425] = Rotcr;
    t[0x426] = LdsPrPostInc;
    t[0x427] = LdcVbrPostInc;
    t[0x428] = Shll16;
    t[0x429] = Shlr16;
    t[0x42A] = LdsPr;
    t[0x42B] = Jmp;
    t[0x42E] = LdcVbr;
    t
};

const fn zero_operand(word: u16) -> Opcode {
    match word {
        0x0008 => Opcode::Clrt,
        0x0009 => Opcode::Nop,
        0x000B => Opcode::Rts,
        0x0018 => Opcode::Sett,
        0x0019 => Opcode::Div0u,
        0x001B => Opcode::Sleep,
        0x0028 => Opcode::Clrmac,
        0x002B => Opcode::Rte,
        _ => Opcode::Invalid,
    }
}

const fn classify(word: u16) -> Opcode {
    let nm = NM[((word >> 8 & 0xF0) | (word & 0x0F)) as usize];
    if !matches!(nm, Opcode::Invalid) {
        return nm;
    }
    let high = HIGH_BYTE[(word >> 8) as usize];
    if !matches!(high, Opcode::Invalid) {
        return high;
    }
    let single = SINGLE[((word >> 4 & 0xF00) | (word & 0xFF)) as usize];
    if !matches!(single, Opcode::Invalid) {
        return single;
    }
    zero_operand(word)
}

#[allow(long_running_const_eval)]
static DECODE: [Opcode; 0x10000] = {
    let mut t = [Opcode::Invalid; 0x10000];
    let mut word = 0usize;
    while word < 0x10000 {
        t[word] = classify(word as u16);
        word += 1;
    }
    t
};

/// Decode one instruction
#[inline(always)]
pub fn decode(word: u16) -> Opcode {
    DECODE[word as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_opcode_is_reachable() {
        let reached: HashSet<Opcode> = (0..=u16::MAX).map(decode).collect();
        for opcode in Opcode::ALL {
            assert!(reached.contains(opcode), "{} unreachable", opcode);
        }
    }

    #[test]
    fn test_invalid_count() {
        // 65536 patterns minus the ones owned by a valid instruction
        let invalid = (0..=u16::MAX)
            .filter(|&w| decode(w) == Opcode::Invalid)
            .count();
        assert!(invalid > 0);
        assert!(invalid < 0x10000 / 2);
        assert_eq!(decode(0x0000), Opcode::Invalid);
        assert_eq!(decode(0xFFFF), Opcode::Invalid);
    }

    #[test]
    fn test_formats() {
        assert_eq!(decode(0x0009), Opcode::Nop);
        assert_eq!(decode(0x000B), Opcode::Rts);
        assert_eq!(decode(0x002B), Opcode::Rte);
        assert_eq!(decode(0x312C), Opcode::Add);
        assert_eq!(decode(0x7F01), Opcode::AddImm);
        assert_eq!(decode(0xE3FF), Opcode::MovImm);
        assert_eq!(decode(0x8901), Opcode::Bt);
        assert_eq!(decode(0x8D01), Opcode::Bts);
        assert_eq!(decode(0xA123), Opcode::Bra);
        assert_eq!(decode(0xC320), Opcode::Trapa);
        assert_eq!(decode(0x432B), Opcode::Jmp);
        assert_eq!(decode(0x4316), Opcode::LdsMaclPostInc);
        assert_eq!(decode(0x1234), Opcode::MovLStoreDisp);
        assert_eq!(decode(0x5234), Opcode::MovLLoadDisp);
        assert_eq!(decode(0x0123), Opcode::Braf);
    }

    #[test]
    fn test_reserved_patterns() {
        // Holes inside otherwise populated rows
        assert_eq!(decode(0x3121), Opcode::Invalid);
        assert_eq!(decode(0x8200), Opcode::Invalid);
        assert_eq!(decode(0x4314), Opcode::Invalid);
        assert_eq!(decode(0xF000), Opcode::Invalid);
        assert_eq!(decode(0x0108), Opcode::Invalid);
    }

    #[test]
    fn test_classification() {
        assert!(Opcode::Bra.is_delayed_branch());
        assert!(Opcode::Rte.is_delayed_branch());
        assert!(!Opcode::Bt.is_delayed_branch());
        assert!(Opcode::Bt.is_branch());
        assert!(Opcode::Trapa.illegal_in_slot());
        assert!(Opcode::Invalid.illegal_in_slot());
        assert!(!Opcode::Add.illegal_in_slot());
        assert!(Opcode::LdcSr.inhibits_interrupts());
        assert!(!Opcode::Mov.inhibits_interrupts());
    }

    #[test]
    fn test_index_round_trip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_index(opcode.index()), Some(*opcode));
        }
    }
}
