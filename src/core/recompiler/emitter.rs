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

//! Threaded-code builder
//!
//! Blocks are byte streams of host operations. Each operation is a tag byte
//! followed by a little-endian payload. Forward references to the block exit
//! go through [`Label`]s whose offsets are patched in [`Emitter::finish`].
//!
//! | Tag | Operation  | Payload                  |
//! |-----|------------|--------------------------|
//! | 1   | `Call`     | opcode: u16, word: u32   |
//! | 2   | `Fetch`    | address: u64, exit: u32  |
//! | 3   | `Step`     | cycles: u32              |
//! | 4   | `Epilogue` | exit: u32                |
//! | 5   | `Exit`     |                          |

/// One decoded host operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Run the semantic routine for `opcode` on instruction `word`
    Call { opcode: u16, word: u32 },
    /// Perform the instruction fetch at `address`; jump to `exit` on a fault
    Fetch { address: u64, exit: u32 },
    /// Charge `cycles`
    Step { cycles: u32 },
    /// Shared per-instruction epilogue; jump to `exit` when it asks to leave
    Epilogue { exit: u32 },
    /// Leave the block
    Exit,
}

const TAG_CALL: u8 = 1;
const TAG_FETCH: u8 = 2;
const TAG_STEP: u8 = 3;
const TAG_EPILOGUE: u8 = 4;
const TAG_EXIT: u8 = 5;

/// Forward reference to an offset in the block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Error from [`Emitter::finish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnboundLabel(pub usize);

#[derive(Debug, Default)]
pub struct Emitter {
    code: Vec<u8>,
    labels: Vec<Option<u32>>,
    relocations: Vec<(usize, Label)>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes emitted so far
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current offset
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.code.len() as u32);
    }

    pub fn call(&mut self, opcode: u16, word: u32) {
        self.code.push(TAG_CALL);
        self.code.extend_from_slice(&opcode.to_le_bytes());
        self.code.extend_from_slice(&word.to_le_bytes());
    }

    pub fn fetch(&mut self, address: u64, exit: Label) {
        self.code.push(TAG_FETCH);
        self.code.extend_from_slice(&address.to_le_bytes());
        self.reference(exit);
    }

    pub fn step(&mut self, cycles: u32) {
        self.code.push(TAG_STEP);
        self.code.extend_from_slice(&cycles.to_le_bytes());
    }

    pub fn epilogue(&mut self, exit: Label) {
        self.code.push(TAG_EPILOGUE);
        self.reference(exit);
    }

    pub fn exit(&mut self) {
        self.code.push(TAG_EXIT);
    }

    /// Patch every label reference and return the finished code
    pub fn finish(mut self) -> Result<Vec<u8>, UnboundLabel> {
        for &(at, label) in &self.relocations {
            let target = self.labels[label.0].ok_or(UnboundLabel(label.0))?;
            self.code[at..at + 4].copy_from_slice(&target.to_le_bytes());
        }
        Ok(self.code)
    }

    fn reference(&mut self, label: Label) {
        self.relocations.push((self.code.len(), label));
        self.code.extend_from_slice(&[0; 4]);
    }
}

/// Sequential decoder over finished code
pub struct Reader<'a> {
    code: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, position: 0 }
    }

    /// Continue decoding at byte `offset`
    pub fn seek(&mut self, offset: u32) {
        self.position = offset as usize;
    }

    fn bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.code.get(self.position..self.position + N)?;
        self.position += N;
        slice.try_into().ok()
    }

    fn u16(&mut self) -> Option<u16> {
        self.bytes::<2>().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.bytes::<4>().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.bytes::<8>().map(u64::from_le_bytes)
    }
}

impl Iterator for Reader<'_> {
    type Item = Op;

    /// Next operation, or `None` at the end of the code or on a malformed
    /// tag
    fn next(&mut self) -> Option<Op> {
        let [tag] = self.bytes::<1>()?;
        match tag {
            TAG_CALL => {
                let opcode = self.u16()?;
                let word = self.u32()?;
                Some(Op::Call { opcode, word })
            }
            TAG_FETCH => {
                let address = self.u64()?;
                let exit = self.u32()?;
                Some(Op::Fetch { address, exit })
            }
            TAG_STEP => Some(Op::Step { cycles: self.u32()? }),
            TAG_EPILOGUE => Some(Op::Epilogue { exit: self.u32()? }),
            TAG_EXIT => Some(Op::Exit),
            _ => None,
        }
    }
}
