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

//! Save state container
//!
//! Each processor defines *what* it saves (its `state` module); this module
//! wraps that snapshot with a version number and metadata and encodes it
//! with bincode.
//!
//! # Version Compatibility
//!
//! Save states carry [`SAVE_STATE_VERSION`]. Loading a save state with a
//! different version fails with [`EmulatorError::StateVersion`].
//!
//! # Example
//!
//! ```no_run
//! use cpux::core::processor::Processor;
//! use cpux::core::save_state::SaveState;
//! use cpux::core::vr4300::Vr4300;
//!
//! let mut cpu = Vr4300::new();
//! let state = SaveState::capture(&cpu);
//! state.save_to_file("vr4300.state").unwrap();
//!
//! let loaded = SaveState::load_from_file("vr4300.state").unwrap();
//! loaded.apply(&mut cpu).unwrap();
//! ```

use crate::core::error::{EmulatorError, Result};
use crate::core::processor::{Isa, Processor};
use crate::core::r3000a::state::R3000aState;
use crate::core::sh2::state::Sh2State;
use crate::core::vr4300::state::Vr4300State;
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Save state version for compatibility checking
///
/// Incremented whenever a processor's saved field list changes.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Snapshot of one processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ProcessorState {
    R3000a(Box<R3000aState>),
    Vr4300(Box<Vr4300State>),
    Sh2(Box<Sh2State>),
}

impl ProcessorState {
    pub fn isa(&self) -> Isa {
        match self {
            ProcessorState::R3000a(_) => Isa::R3000a,
            ProcessorState::Vr4300(_) => Isa::Vr4300,
            ProcessorState::Sh2(_) => Isa::Sh2,
        }
    }
}

/// Save state metadata
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// When the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Processor the snapshot belongs to
    pub isa: Isa,

    /// Processor clock at save time
    pub cycles: u64,
}

/// Complete save state
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    pub metadata: SaveStateMetadata,

    pub processor: ProcessorState,
}

impl SaveState {
    /// Snapshot `processor`
    pub fn capture(processor: &dyn Processor) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                isa: processor.isa(),
                cycles: processor.clock(),
            },
            processor: processor.save_state(),
        }
    }

    /// Restore this snapshot into `processor`
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::StateIsa`] if the snapshot was taken from a
    /// different processor.
    pub fn apply(&self, processor: &mut dyn Processor) -> Result<()> {
        let found = self.processor.isa();
        if found != processor.isa() {
            return Err(EmulatorError::StateIsa {
                expected: processor.isa().name(),
                found: found.name(),
            });
        }
        processor.load_state(&self.processor)?;
        log::info!(
            "Save state: restored {} snapshot taken at cycle {}",
            found,
            self.metadata.cycles
        );
        Ok(())
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode from bytes and verify version compatibility
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the version is incompatible.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (SaveState, usize) =
            bincode::decode_from_slice(bytes, config::standard())?;

        // Version check
        if state.version != SAVE_STATE_VERSION {
            return Err(EmulatorError::StateVersion {
                expected: SAVE_STATE_VERSION,
                found: state.version,
            });
        }

        Ok(state)
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be created
    /// - Serialization fails
    /// - Write operation fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened
    /// - File cannot be read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }
}
