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

//! Bump allocator backing the block code buffer

use std::ops::Range;

/// Fixed-capacity code arena
///
/// Space is handed out front to back and only ever reclaimed all at once
/// by [`BumpAllocator::reset`].
#[derive(Debug)]
pub struct BumpAllocator {
    buffer: Vec<u8>,
    offset: usize,
}

impl BumpAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            offset: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes still free
    pub fn available(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Copy `code` into the arena and return where it landed, or `None` if
    /// it does not fit
    pub fn store(&mut self, code: &[u8]) -> Option<Range<usize>> {
        if code.len() > self.available() {
            return None;
        }
        let start = self.offset;
        let end = start + code.len();
        self.buffer[start..end].copy_from_slice(code);
        self.offset = end;
        Some(start..end)
    }

    /// Bytes previously returned by [`BumpAllocator::store`]
    pub fn get(&self, range: Range<usize>) -> &[u8] {
        &self.buffer[range]
    }

    /// Release everything
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
