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

//! Bus/memory port shared by every processor
//!
//! All fetches, loads and stores leave the processor through the [`Bus`]
//! trait. Processors apply their own segment, TLB and cache policy before
//! calling it, so the addresses seen here are always physical.
//!
//! # Example
//!
//! ```
//! use cpux::core::bus::{Bus, Endian, Ram, Size};
//!
//! let mut ram = Ram::new(0x1000, Endian::Big);
//! ram.write(Size::Word, 0x10, 0x1234_5678).unwrap();
//! assert_eq!(ram.read(Size::Byte, 0x10).unwrap(), 0x12);
//! assert_eq!(ram.read(Size::Half, 0x12).unwrap(), 0x5678);
//! ```

use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};

/// Access width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    /// 8 bits
    Byte,
    /// 16 bits
    Half,
    /// 32 bits
    Word,
    /// 64 bits
    Dual,
}

impl Size {
    /// Width in bytes
    #[inline(always)]
    pub const fn bytes(self) -> u32 {
        match self {
            Size::Byte => 1,
            Size::Half => 2,
            Size::Word => 4,
            Size::Dual => 8,
        }
    }

    /// Width for a byte count, if it names one
    pub const fn from_bytes(bytes: u32) -> Option<Size> {
        match bytes {
            1 => Some(Size::Byte),
            2 => Some(Size::Half),
            4 => Some(Size::Word),
            8 => Some(Size::Dual),
            _ => None,
        }
    }

    /// Mask covering the value bits of this width
    #[inline(always)]
    pub const fn mask(self) -> u64 {
        match self {
            Size::Byte => 0xFF,
            Size::Half => 0xFFFF,
            Size::Word => 0xFFFF_FFFF,
            Size::Dual => u64::MAX,
        }
    }

    /// Whether `address` is naturally aligned for this width
    #[inline(always)]
    pub const fn aligned(self, address: u64) -> bool {
        address & (self.bytes() as u64 - 1) == 0
    }
}

/// Byte order of a memory device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Cost of one access to a region
///
/// `cycles` is charged per bus transaction of `width`; cache line fills
/// issue `line_size / width` transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTiming {
    pub cycles: u32,
    pub width: Size,
}

impl BusTiming {
    /// Cycles needed to move `bytes` bytes over this bus
    pub fn burst(&self, bytes: u32) -> u32 {
        let transfers = bytes.div_ceil(self.width.bytes()).max(1);
        transfers * self.cycles
    }
}

/// Memory port consumed by the processor cores
///
/// Implemented by the surrounding system. An `Err` from `read` or `write`
/// means nothing answered at that address; processors convert it into
/// their bus-error exception.
pub trait Bus {
    /// Read `size` bytes at physical `address`, zero-extended into a u64
    fn read(&mut self, size: Size, address: u32) -> Result<u64>;

    /// Write the low `size` bytes of `data` at physical `address`
    fn write(&mut self, size: Size, address: u32, data: u64) -> Result<()>;

    /// Latency and width of the region containing `address`
    fn timing(&self, address: u32) -> BusTiming;
}

/// Access counters kept by [`Ram`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub reads: u64,
    pub writes: u64,
}

/// Flat memory device
///
/// Addresses past the end of the backing store are rejected so that tests
/// and the runner can observe bus-error exceptions.
pub struct Ram {
    data: Vec<u8>,
    endian: Endian,
    timing: BusTiming,
    /// Transaction counters, reset with [`Ram::reset_stats`]
    pub stats: BusStats,
}

impl Ram {
    /// Default latency per transaction
    pub const DEFAULT_LATENCY: u32 = 4;

    /// Create zero-filled memory of `size` bytes
    pub fn new(size: usize, endian: Endian) -> Self {
        Self::with_timing(
            size,
            endian,
            BusTiming {
                cycles: Self::DEFAULT_LATENCY,
                width: Size::Word,
            },
        )
    }

    /// Create memory with explicit access timing
    pub fn with_timing(size: usize, endian: Endian, timing: BusTiming) -> Self {
        Self {
            data: vec![0; size],
            endian,
            timing,
            stats: BusStats::default(),
        }
    }

    /// Size of the backing store in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy `image` into memory starting at `offset`
    pub fn load(&mut self, offset: u32, image: &[u8]) -> Result<()> {
        let start = offset as usize;
        let end = start
            .checked_add(image.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(EmulatorError::ImageTooLarge {
                size: image.len(),
                offset,
                capacity: self.data.len(),
            })?;
        self.data[start..end].copy_from_slice(image);
        Ok(())
    }

    /// Write a sequence of 32-bit words in device byte order
    pub fn load_words(&mut self, offset: u32, words: &[u32]) -> Result<()> {
        let mut image = Vec::with_capacity(words.len() * 4);
        for word in words {
            match self.endian {
                Endian::Little => image.extend_from_slice(&word.to_le_bytes()),
                Endian::Big => image.extend_from_slice(&word.to_be_bytes()),
            }
        }
        self.load(offset, &image)
    }

    /// Write a sequence of 16-bit halfwords in device byte order
    pub fn load_halves(&mut self, offset: u32, halves: &[u16]) -> Result<()> {
        let mut image = Vec::with_capacity(halves.len() * 2);
        for half in halves {
            match self.endian {
                Endian::Little => image.extend_from_slice(&half.to_le_bytes()),
                Endian::Big => image.extend_from_slice(&half.to_be_bytes()),
            }
        }
        self.load(offset, &image)
    }

    pub fn reset_stats(&mut self) {
        self.stats = BusStats::default();
    }

    fn range(&self, size: Size, address: u32) -> Result<std::ops::Range<usize>> {
        let start = address as usize;
        let end = start + size.bytes() as usize;
        if end > self.data.len() {
            return Err(EmulatorError::InvalidMemoryAccess { address });
        }
        Ok(start..end)
    }
}

impl Bus for Ram {
    fn read(&mut self, size: Size, address: u32) -> Result<u64> {
        let range = self.range(size, address)?;
        self.stats.reads += 1;
        let bytes = &self.data[range];
        let value = match self.endian {
            Endian::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64),
            Endian::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        };
        Ok(value)
    }

    fn write(&mut self, size: Size, address: u32, data: u64) -> Result<()> {
        let range = self.range(size, address)?;
        self.stats.writes += 1;
        let count = size.bytes() as usize;
        let endian = self.endian;
        for (i, byte) in self.data[range].iter_mut().enumerate() {
            let shift = match endian {
                Endian::Little => i * 8,
                Endian::Big => (count - 1 - i) * 8,
            };
            *byte = (data >> shift) as u8;
        }
        Ok(())
    }

    fn timing(&self, _address: u32) -> BusTiming {
        self.timing
    }
}
