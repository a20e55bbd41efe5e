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

//! MIPS III instruction decoder
//!
//! Decoding walks const tables: the primary opcode table, then the SPECIAL
//! (funct), REGIMM (rt), COP0 (rs, then funct), COP1 (rs) and BC1 (rt)
//! tables. Every slot starts as [`Opcode::Invalid`], so every 32-bit word
//! decodes to exactly one handler.

use crate::core::mips::Instruction;
use crate::core::opcode::opcode_table;

opcode_table! {
    /// One variant per semantic routine
    pub enum Opcode {
        Invalid => "invalid",
        // SPECIAL
        Sll => "sll",
        Srl => "srl",
        Sra => "sra",
        Sllv => "sllv",
        Srlv => "srlv",
        Srav => "srav",
        Jr => "jr",
        Jalr => "jalr",
        Syscall => "syscall",
        Break => "break",
        Sync => "sync",
        Mfhi => "mfhi",
        Mthi => "mthi",
        Mflo => "mflo",
        Mtlo => "mtlo",
        Dsllv => "dsllv",
        Dsrlv => "dsrlv",
        Dsrav => "dsrav",
        Mult => "mult",
        Multu => "multu",
        Div => "div",
        Divu => "divu",
        Dmult => "dmult",
        Dmultu => "dmultu",
        Ddiv => "ddiv",
        Ddivu => "ddivu",
        Add => "add",
        Addu => "addu",
        Sub => "sub",
        Subu => "subu",
        And => "and",
        Or => "or",
        Xor => "xor",
        Nor => "nor",
        Slt => "slt",
        Sltu => "sltu",
        Dadd => "dadd",
        Daddu => "daddu",
        Dsub => "dsub",
        Dsubu => "dsubu",
        Tge => "tge",
        Tgeu => "tgeu",
        Tlt => "tlt",
        Tltu => "tltu",
        Teq => "teq",
        Tne => "tne",
        Dsll => "dsll",
        Dsrl => "dsrl",
        Dsra => "dsra",
        Dsll32 => "dsll32",
        Dsrl32 => "dsrl32",
        Dsra32 => "dsra32",
        // REGIMM
        Bltz => "bltz",
        Bgez => "bgez",
        Bltzl => "bltzl",
        Bgezl => "bgezl",
        Tgei => "tgei",
        Tgeiu => "tgeiu",
        Tlti => "tlti",
        Tltiu => "tltiu",
        Teqi => "teqi",
        Tnei => "tnei",
        Bltzal => "bltzal",
        Bgezal => "bgezal",
        Bltzall => "bltzall",
        Bgezall => "bgezall",
        // Primary
        J => "j",
        Jal => "jal",
        Beq => "beq",
        Bne => "bne",
        Blez => "blez",
        Bgtz => "bgtz",
        Addi => "addi",
        Addiu => "addiu",
        Slti => "slti",
        Sltiu => "sltiu",
        Andi => "andi",
        Ori => "ori",
        Xori => "xori",
        Lui => "lui",
        Beql => "beql",
        Bnel => "bnel",
        Blezl => "blezl",
        Bgtzl => "bgtzl",
        Daddi => "daddi",
        Daddiu => "daddiu",
        Ldl => "ldl",
        Ldr => "ldr",
        Lb => "lb",
        Lh => "lh",
        Lwl => "lwl",
        Lw => "lw",
        Lbu => "lbu",
        Lhu => "lhu",
        Lwr => "lwr",
        Lwu => "lwu",
        Sb => "sb",
        Sh => "sh",
        Swl => "swl",
        Sw => "sw",
        Sdl => "sdl",
        Sdr => "sdr",
        Swr => "swr",
        Cache => "cache",
        Ll => "ll",
        Lwc1 => "lwc1",
        Lld => "lld",
        Ldc1 => "ldc1",
        Ld => "ld",
        Sc => "sc",
        Swc1 => "swc1",
        Scd => "scd",
        Sdc1 => "sdc1",
        Sd => "sd",
        // COP0
        Mfc0 => "mfc0",
        Dmfc0 => "dmfc0",
        Mtc0 => "mtc0",
        Dmtc0 => "dmtc0",
        Tlbr => "tlbr",
        Tlbwi => "tlbwi",
        Tlbwr => "tlbwr",
        Tlbp => "tlbp",
        Eret => "eret",
        // COP1
        Mfc1 => "mfc1",
        Dmfc1 => "dmfc1",
        Cfc1 => "cfc1",
        Mtc1 => "mtc1",
        Dmtc1 => "dmtc1",
        Ctc1 => "ctc1",
        Bc1f => "bc1f",
        Bc1t => "bc1t",
        Bc1fl => "bc1fl",
        Bc1tl => "bc1tl",
        Cop1 => "cop1",
        // COP2 and COP3, including their loads and stores
        Cop2 => "cop2",
        Cop3 => "cop3",
    }
}

impl Opcode {
    /// Control transfer with a delay slot
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::Jr
                | Opcode::Jalr
                | Opcode::J
                | Opcode::Jal
                | Opcode::Beq
                | Opcode::Bne
                | Opcode::Blez
                | Opcode::Bgtz
                | Opcode::Beql
                | Opcode::Bnel
                | Opcode::Blezl
                | Opcode::Bgtzl
                | Opcode::Bltz
                | Opcode::Bgez
                | Opcode::Bltzl
                | Opcode::Bgezl
                | Opcode::Bltzal
                | Opcode::Bgezal
                | Opcode::Bltzall
                | Opcode::Bgezall
                | Opcode::Bc1f
                | Opcode::Bc1t
                | Opcode::Bc1fl
                | Opcode::Bc1tl
        )
    }

    /// Instructions after which translation must stop: they redirect the
    /// program counter without a delay slot or change the translation
    /// context or cache contents
    pub const fn ends_block(self) -> bool {
        matches!(
            self,
            Opcode::Eret
                | Opcode::Mtc0
                | Opcode::Dmtc0
                | Opcode::Tlbwi
                | Opcode::Tlbwr
                | Opcode::Cache
                | Opcode::Syscall
                | Opcode::Break
        )
    }
}

/// Decode table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Leaf(Opcode),
    Special,
    Regimm,
    Cop0,
    Cop1,
}

const PRIMARY: [Group; 64] = {
    use Group::Leaf;
    let mut t = [Leaf(Opcode::Invalid); 64];
    t[0x00] = Group::Special;
    t[0x01] = Group::Regimm;
    t[0x02] = Leaf(Opcode::J);
    t[0x03] = Leaf(Opcode::Jal);
    t[0x04] = Leaf(Opcode::Beq);
    t[0x05] = Leaf(Opcode::Bne);
    t[0x06] = Leaf(Opcode::Blez);
    t[0x07] = Leaf(Opcode::Bgtz);
    t[0x08] = Leaf(Opcode::Addi);
    t[0x09] = Leaf(Opcode::Addiu);
    t[0x0A] = Leaf(Opcode::Slti);
    t[0x0B] = Leaf(Opcode::Sltiu);
    t[0x0C] = Leaf(Opcode::Andi);
    t[0x0D] = Leaf(Opcode::Ori);
    t[0x0E] = Leaf(Opcode::Xori);
    t[0x0F] = Leaf(Opcode::Lui);
    t[0x10] = Group::Cop0;
    t[0x11] = Group::Cop1;
    t[0x12] = Leaf(Opcode::Cop2);
    t[0x13] = Leaf(Opcode::Cop3);
    t[0x14] = Leaf(Opcode::Beql);
    t[0x15] = Leaf(Opcode::Bnel);
    t[0x16] = Leaf(Opcode::Blezl);
    t[0x17] = Leaf(Opcode::Bgtzl);
    t[0x18] = Leaf(Opcode::Daddi);
    t[0x19] = Leaf(Opcode::Daddiu);
    t[0x1A] = Leaf(Opcode::Ldl);
    t[0x1B] = Leaf(Opcode::Ldr);
    t[0x20] = Leaf(Opcode::Lb);
    t[0x21] = Leaf(Opcode::Lh);
    t[0x22] = Leaf(Opcode::Lwl);
    t[0x23] = Leaf(Opcode::Lw);
    t[0x24] = Leaf(Opcode::Lbu);
    t[0x25] = Leaf(Opcode::Lhu);
    t[0x26] = Leaf(Opcode::Lwr);
    t[0x27] = Leaf(Opcode::Lwu);
    t[0x28] = Leaf(Opcode::Sb);
    t[0x29] = Leaf(Opcode::Sh);
    t[0x2A] = Leaf(Opcode::Swl);
    t[0x2B] = Leaf(Opcode::Sw);
    t[0x2C] = Leaf(Opcode::Sdl);
    t[0x2D] = Leaf(Opcode::Sdr);
    t[0x2E] = Leaf(Opcode::Swr);
    t[0x2F] = Leaf(Opcode::Cache);
    t[0x30] = Leaf(Opcode::Ll);
    t[0x31] = Leaf(Opcode::Lwc1);
    t[0x32] = Leaf(Opcode::Cop2);
    t[0x33] = Leaf(Opcode::Cop3);
    t[0x34] = Leaf(Opcode::Lld);
    t[0x35] = Leaf(Opcode::Ldc1);
    t[0x36] = Leaf(Opcode::Cop2);
    t[0x37] = Leaf(Opcode::Ld);
    t[0x38] = Leaf(Opcode::Sc);
    t[0x39] = Leaf(Opcode::Swc1);
    t[0x3A] = Leaf(Opcode::Cop2);
    t[0x3B] = Leaf(Opcode::Cop3);
    t[0x3C] = Leaf(Opcode::Scd);
    t[0x3D] = Leaf(Opcode::Sdc1);
    t[0x3E] = Leaf(Opcode::Cop2);
    t[0x3F] = Leaf(Opcode::Sd);
    t
};

const SPECIAL: [Opcode; 64] = {
    let mut t = [Opcode::Invalid; 64];
    t[0x00] = Opcode::Sll;
    t[0x02] = Opcode::Srl;
    t[0x03] = Opcode::Sra;
    t[0x04] = Opcode::Sllv;
    t[0x06] = Opcode::Srlv;
    t[0x07] = Opcode::Srav;
    t[0x08] = Opcode::Jr;
    t[0x09] = Opcode::Jalr;
    t[0x0C] = Opcode::Syscall;
    t[0x0D] = Opcode::Break;
    t[0x0F] = Opcode::Sync;
    t[0x10] = Opcode::Mfhi;
    t[0x11] = Opcode::Mthi;
    t[0x12] = Opcode::Mflo;
    t[0x13] = Opcode::Mtlo;
    t[0x14] = Opcode::Dsllv;
    t[0x16] = Opcode::Dsrlv;
    t[0x17] = Opcode::Dsrav;
    t[0x18] = Opcode::Mult;
    t[0x19] = Opcode::Multu;
    t[0x1A] = Opcode::Div;
    t[0x1B] = Opcode::Divu;
    t[0x1C] = Opcode::Dmult;
    t[0x1D] = Opcode::Dmultu;
    t[0x1E] = Opcode::Ddiv;
    t[0x1F] = Opcode::Ddivu;
    t[0x20] = Opcode::Add;
    t[0x21] = Opcode::Addu;
    t[0x22] = Opcode::Sub;
    t[0x23] = Opcode::Subu;
    t[0x24] = Opcode::And;
    t[0x25] = Opcode::Or;
    t[0x26] = Opcode::Xor;
    t[0x27] = Opcode::Nor;
    t[0x2A] = Opcode::Slt;
    t[0x2B] = Opcode::Sltu;
    t[0x2C] = Opcode::Dadd;
    t[0x2D] = Opcode::Daddu;
    t[0x2E] = Opcode::Dsub;
    t[0x2F] = Opcode::Dsubu;
    t[0x30] = Opcode::Tge;
    t[0x31] = Opcode::Tgeu;
    t[0x32] = Opcode::Tlt;
    t[0x33] = Opcode::Tltu;
    t[0x34] = Opcode::Teq;
    t[0x36] = Opcode::Tne;
    t[0x38] = Opcode::Dsll;
    t[0x3A] = Opcode::Dsrl;
    t[0x3B] = Opcode::Dsra;
    t[0x3C] = Opcode::Dsll32;
    t[0x3E] = Opcode::Dsrl32;
    t[0x3F] = Opcode::Dsra32;
    t
};

const REGIMM: [Opcode; 32] = {
    let mut t = [Opcode::Invalid; 32];
    t[0x00] = Opcode::Bltz;
    t[0x01] = Opcode::Bgez;
    t[0x02] = Opcode::Bltzl;
    t[0x03] = Opcode::Bgezl;
    t[0x08] = Opcode::Tgei;
    t[0x09] = Opcode::Tgeiu;
    t[0x0A] = Opcode::Tlti;
    t[0x0B] = Opcode::Tltiu;
    t[0x0C] = Opcode::Teqi;
    t[0x0E] = Opcode::Tnei;
    t[0x10] = Opcode::Bltzal;
    t[0x11] = Opcode::Bgezal;
    t[0x12] = Opcode::Bltzall;
    t[0x13] = Opcode::Bgezall;
    t
};

/// COP0 by rs; rs 16..31 selects the function table
const COP0: [Opcode; 32] = {
    let mut t = [Opcode::Invalid; 32];
    t[0x00] = Opcode::Mfc0;
    t[0x01] = Opcode::Dmfc0;
    t[0x04] = Opcode::Mtc0;
    t[0x05] = Opcode::Dmtc0;
    t
};

const COP0_FUNCTION: [Opcode; 64] = {
    let mut t = [Opcode::Invalid; 64];
    t[0x01] = Opcode::Tlbr;
    t[0x02] = Opcode::Tlbwi;
    t[0x06] = Opcode::Tlbwr;
    t[0x08] = Opcode::Tlbp;
    t[0x18] = Opcode::Eret;
    t
};

/// COP1 by rs; rs 8 selects BC1, rs 16..31 are coprocessor commands
const COP1: [Opcode; 32] = {
    let mut t = [Opcode::Invalid; 32];
    t[0x00] = Opcode::Mfc1;
    t[0x01] = Opcode::Dmfc1;
    t[0x02] = Opcode::Cfc1;
    t[0x04] = Opcode::Mtc1;
    t[0x05] = Opcode::Dmtc1;
    t[0x06] = Opcode::Ctc1;
    let mut rs = 0x10;
    while rs < 0x20 {
        t[rs] = Opcode::Cop1;
        rs += 1;
    }
    t
};

/// BC1 by the low two bits of rt (nd, tf)
const BC1: [Opcode; 4] = [Opcode::Bc1f, Opcode::Bc1t, Opcode::Bc1fl, Opcode::Bc1tl];

/// Decode one instruction word
pub fn decode(word: u32) -> Opcode {
    let i = Instruction(word);
    match PRIMARY[i.op() as usize] {
        Group::Leaf(opcode) => opcode,
        Group::Special => SPECIAL[i.funct() as usize],
        Group::Regimm => REGIMM[i.rt() as usize],
        Group::Cop0 => {
            if i.rs() & 0x10 != 0 {
                COP0_FUNCTION[i.funct() as usize]
            } else {
                COP0[i.rs() as usize]
            }
        }
        Group::Cop1 => {
            if i.rs() == 0x08 {
                BC1[(i.rt() & 3) as usize]
            } else {
                COP1[i.rs() as usize]
            }
        }
    }
}
