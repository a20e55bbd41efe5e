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
//! MIPS I instruction decoder
//!
//! Primary opcode table, then SPECIAL (funct), REGIMM (rt), COP0 and COP2
//! (rs) tables. REGIMM only decodes bit 16 (condition) and bit 20 (link);
//! every other rt pattern aliases BLTZ or BGEZ as on the real part.

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
        Mfhi => "mfhi",
        Mthi => "mthi",
        Mflo => "mflo",
        Mtlo => "mtlo",
        Mult => "mult",
        Multu => "multu",
        Div => "div",
        Divu => "divu",
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
        // REGIMM
        Bltz => "bltz",
        Bgez => "bgez",
        Bltzal => "bltzal",
        Bgezal => "bgezal",
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
        Lb => "lb",
        Lh => "lh",
        Lwl => "lwl",
        Lw => "lw",
        Lbu => "lbu",
        Lhu => "lhu",
        Lwr => "lwr",
        Sb => "sb",
        Sh => "sh",
        Swl => "swl",
        Sw => "sw",
        Swr => "swr",
        // COP0
        Mfc0 => "mfc0",
        Mtc0 => "mtc0",
        Rfe => "rfe",
        // COP2
        Mfc2 => "mfc2",
        Cfc2 => "cfc2",
        Mtc2 => "mtc2",
        Ctc2 => "ctc2",
        Cop2 => "cop2",
        Lwc2 => "lwc2",
        Swc2 => "swc2",
        // COP1 and COP3 instructions, LWCz/SWCz for z != 2
        Cop1 => "cop1",
        Cop3 => "cop3",
        Lwc0 => "lwc0",
        Lwc1 => "lwc1",
        Lwc3 => "lwc3",
        Swc0 => "swc0",
        Swc1 => "swc1",
        Swc3 => "swc3",
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
                | Opcode::Bltz
                | Opcode::Bgez
                | Opcode::Bltzal
                | Opcode::Bgezal
        )
    }

    /// Translation stops after these: they change the privilege state the
    /// block was built under or always raise an exception
    pub const fn ends_block(self) -> bool {
        matches!(
            self,
            Opcode::Mtc0 | Opcode::Rfe | Opcode::Syscall | Opcode::Break
        )
    }

    /// Writes its destination through the load delay slot
    pub const fn is_delayed_load(self) -> bool {
        matches!(
            self,
            Opcode::Lb
                | Opcode::Lh
                | Opcode::Lwl
                | Opcode::Lw
                | Opcode::Lbu
                | Opcode::Lhu
                | Opcode::Lwr
                | Opcode::Mfc0
                | Opcode::Mfc2
                | Opcode::Cfc2
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
    Cop2,
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
    t[0x11] = Leaf(Opcode::Cop1);
    t[0x12] = Group::Cop2;
    t[0x13] = Leaf(Opcode::Cop3);
    t[0x20] = Leaf(Opcode::Lb);
    t[0x21] = Leaf(Opcode::Lh);
    t[0x22] = Leaf(Opcode::Lwl);
    t[0x23] = Leaf(Opcode::Lw);
    t[0x24] = Leaf(Opcode::Lbu);
    t[0x25] = Leaf(Opcode::Lhu);
    t[0x26] = Leaf(Opcode::Lwr);
    t[0x28] = Leaf(Opcode::Sb);
    t[0x29] = Leaf(Opcode::Sh);
    t[0x2A] = Leaf(Opcode::Swl);
    t[0x2B] = Leaf(Opcode::Sw);
    t[0x2E] = Leaf(Opcode::Swr);
    t[0x30] = Leaf(Opcode::Lwc0);
    t[0x31] = Leaf(Opcode::Lwc1);
    t[0x32] = Leaf(Opcode::Lwc2);
    t[0x33] = Leaf(Opcode::Lwc3);
    t[0x38] = Leaf(Opcode::Swc0);
    t[0x39] = Leaf(Opcode::Swc1);
    t[0x3A] = Leaf(Opcode::Swc2);
    t[0x3B] = Leaf(Opcode::Swc3);
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
    t[0x10] = Opcode::Mfhi;
    t[0x11] = Opcode::Mthi;
    t[0x12] = Opcode::Mflo;
    t[0x13] = Opcode::Mtlo;
    t[0x18] = Opcode::Mult;
    t[0x19] = Opcode::Multu;
    t[0x1A] = Opcode::Div;
    t[0x1B] = Opcode::Divu;
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
    t
};

/// REGIMM by rt: bit 0 selects BGEZ, rt 16 and 17 link
const REGIMM: [Opcode; 32] = {
    let mut t = [Opcode::Bltz; 32];
    let mut rt = 0;
    while rt < 32 {
        if rt & 1 != 0 {
            t[rt] = Opcode::Bgez;
        }
        rt += 1;
    }
    t[0x10] = Opcode::Bltzal;
    t[0x11] = Opcode::Bgezal;
    t
};

/// COP0 by rs; rs 16 with funct 0x10 is RFE
const COP0: [Opcode; 32] = {
    let mut t = [Opcode::Invalid; 32];
    t[0x00] = Opcode::Mfc0;
    t[0x04] = Opcode::Mtc0;
    t
};

/// COP2 by rs; rs 16..31 are geometry commands
const COP2: [Opcode; 32] = {
    let mut t = [Opcode::Invalid; 32];
    t[0x00] = Opcode::Mfc2;
    t[0x02] = Opcode::Cfc2;
    t[0x04] = Opcode::Mtc2;
    t[0x06] = Opcode::Ctc2;
    let mut rs = 0x10;
    while rs < 0x20 {
        t[rs] = Opcode::Cop2;
        rs += 1;
    }
    t
};

/// Decode one instruction word
pub fn decode(word: u32) -> Opcode {
    let i = Instruction(word);
    match PRIMARY[i.op() as usize] {
        Group::Leaf(opcode) => opcode,
        Group::Special => SPECIAL[i.funct() as usize],
        Group::Regimm => REGIMM[i.rt() as usize],
        Group::Cop0 => {
            if i.rs() & 0x10 != 0 {
                if i.funct() == 0x10 {
                    Opcode::Rfe
                } else {
                    Opcode::Invalid
                }
            } else {
                COP0[i.rs() as usize]
            }
        }
        Group::Cop2 => COP2[i.rs() as usize],
    }
}
