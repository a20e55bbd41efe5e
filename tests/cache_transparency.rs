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

//! Cache transparency
//!
//! Writing V to A and reading A back yields V whether or not the line is
//! resident, across the evictions, writebacks and refills a random access
//! stream forces. The model is a plain byte array.

mod common;

use common::MEMORY;
use cpux::core::bus::{Bus, Endian, Ram, Size};
use cpux::core::sh2::cache::{Cache, Ccr};
use cpux::core::vr4300::dcache::{DCache, LINES, LINE_SIZE};
use proptest::prelude::*;

/// Accesses stay in the low 32 KiB: four times the VR4300 data cache and
/// eight times the SH-2 cache
const SPAN: u32 = 0x8000;

#[derive(Debug, Clone)]
enum Access {
    Read(Size, u32),
    Write(Size, u32, u64),
    /// SH-2 only: associative purge of the line
    Purge(u32),
}

fn size(selector: u8, widest: Size) -> Size {
    match selector % 4 {
        0 => Size::Byte,
        1 => Size::Half,
        2 => Size::Word,
        _ => widest,
    }
}

fn accesses(widest: Size) -> impl Strategy<Value = Vec<Access>> {
    let access = (any::<u8>(), any::<u8>(), 0..SPAN, any::<u64>()).prop_map(
        move |(kind, width, address, value)| {
            let size = size(width, widest);
            let address = address & !(size.bytes() - 1);
            match kind % 5 {
                0 | 1 => Access::Read(size, address),
                2 | 3 => Access::Write(size, address, value & size.mask()),
                _ => Access::Purge(address),
            }
        },
    );
    prop::collection::vec(access, 1..400)
}

fn model_read(model: &[u8], size: Size, address: u32) -> u64 {
    let start = address as usize;
    model[start..start + size.bytes() as usize]
        .iter()
        .fold(0, |acc, &b| acc << 8 | b as u64)
}

fn model_write(model: &mut [u8], size: Size, address: u32, value: u64) {
    let count = size.bytes() as usize;
    let start = address as usize;
    for (i, byte) in model[start..start + count].iter_mut().enumerate() {
        *byte = (value >> ((count - 1 - i) * 8)) as u8;
    }
}

/// Memory with a recognizable non-zero pattern
fn patterned() -> (Ram, Vec<u8>) {
    let model: Vec<u8> = (0..MEMORY).map(|i| (i * 7 + 3) as u8).collect();
    let mut ram = Ram::new(MEMORY, Endian::Big);
    ram.load(0, &model).unwrap();
    (ram, model)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn vr4300_write_back_cache_is_transparent(stream in accesses(Size::Dual)) {
        let (mut ram, mut model) = patterned();
        let mut cache = DCache::new();

        for access in &stream {
            match *access {
                Access::Read(size, address) => {
                    let (value, _) = cache.read(&mut ram, size, address).unwrap();
                    prop_assert_eq!(value, model_read(&model, size, address), "{:?}", access);
                }
                Access::Write(size, address, value) => {
                    cache.write(&mut ram, size, address, value).unwrap();
                    model_write(&mut model, size, address, value);
                }
                Access::Purge(_) => {}
            }
        }

        // Memory catches up once every dirty line is written back
        for index in 0..LINES as u32 {
            let line = *cache.line(index * LINE_SIZE);
            if line.valid && line.dirty {
                cache.write_back(&mut ram, index * LINE_SIZE).unwrap();
            }
        }
        prop_assert_eq!(ram.as_bytes(), &model[..]);
    }

    #[test]
    fn sh2_write_through_cache_is_transparent(
        stream in accesses(Size::Word),
        two_way in any::<bool>(),
    ) {
        let (mut ram, mut model) = patterned();
        let mut cache = Cache::new();
        let mut control = Ccr::CE;
        if two_way {
            control |= Ccr::TW;
        }
        cache.set_control(control.bits());

        for access in &stream {
            match *access {
                Access::Read(size, address) => {
                    let (value, _) = cache.read(&mut ram, size, address, false).unwrap();
                    let expected = model_read(&model, size, address);
                    prop_assert_eq!(value as u64, expected, "{:?}", access);
                }
                Access::Write(size, address, value) => {
                    cache.write(size, address, value as u32);
                    ram.write(size, address, value).unwrap();
                    model_write(&mut model, size, address, value);
                }
                Access::Purge(address) => cache.purge(address),
            }
        }
        prop_assert_eq!(ram.as_bytes(), &model[..]);
    }
}
