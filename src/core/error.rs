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

/// Emulator error types
///
/// Guest-visible faults (address errors, TLB misses, reserved instructions)
/// never show up here: they are delivered as exceptions inside the processor.
/// This type only covers host-side failures.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Image too large: {size} bytes at offset 0x{offset:08X} (memory is {capacity} bytes)")]
    ImageTooLarge {
        size: usize,
        offset: u32,
        capacity: usize,
    },

    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    #[error("Unknown instruction set: {0}")]
    UnknownIsa(String),

    #[error("Invalid configuration value for `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Save state encode error: {0}")]
    StateEncode(#[from] bincode::error::EncodeError),

    #[error("Save state decode error: {0}")]
    StateDecode(#[from] bincode::error::DecodeError),

    #[error("Save state version mismatch: found {found}, expected {expected}")]
    StateVersion { expected: u32, found: u32 },

    #[error("Save state belongs to {found}, cannot restore into {expected}")]
    StateIsa {
        expected: &'static str,
        found: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
