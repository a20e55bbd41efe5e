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

//! Runner configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. a TOML file ([`Config::from_file`]), or [`Config::default`]
//! 2. `CPUX_*` environment variables, including those from a `.env` file
//!    ([`Config::apply_environment`])
//! 3. command-line flags, applied by the binary
//!
//! # Example
//!
//! ```
//! use cpux::core::config::Config;
//! use cpux::core::processor::Isa;
//!
//! let config: Config = "isa = \"sh2\"\ncycles = 5000".parse().unwrap();
//! assert_eq!(config.isa, Isa::Sh2);
//! assert_eq!(config.entry(), 0x2000_0000);
//! assert!(config.big_endian());
//! ```

use crate::core::bus::{BusTiming, Endian, Ram, Size};
use crate::core::error::{EmulatorError, Result};
use crate::core::processor::Isa;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "CPUX_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Processor to emulate
    pub isa: Isa,

    /// Run through the recompiler
    pub jit: bool,

    /// Size of the flat memory in bytes
    pub memory_size: usize,

    /// Cycles per bus transaction
    pub memory_latency: u32,

    /// Bus width in bytes (1, 2, 4 or 8)
    pub memory_width: u32,

    /// Physical address the image is loaded at
    pub load_address: u32,

    /// Initial program counter; defaults to the uncached alias of
    /// `load_address`
    pub entry_point: Option<u64>,

    /// Cycle budget for a run
    pub cycles: u64,

    /// Cycles the processor runs between scheduler synchronizations
    pub slice: u32,

    /// Instruction trace output
    pub trace: Option<PathBuf>,

    /// Recompiler code buffer size in bytes; defaults per processor
    pub jit_buffer_size: Option<usize>,

    /// Memory byte order; defaults to the processor's
    pub big_endian: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            isa: Isa::R3000a,
            jit: false,
            memory_size: 8 * 1024 * 1024,
            memory_latency: Ram::DEFAULT_LATENCY,
            memory_width: 4,
            load_address: 0,
            entry_point: None,
            cycles: 1_000_000,
            slice: 1024,
            trace: None,
            jit_buffer_size: None,
            big_endian: None,
        }
    }
}

impl FromStr for Config {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = text.parse()?;
        log::info!("Config: loaded {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `CPUX_*` variables from the process environment
    ///
    /// A `.env` file in the working directory is read first; variables
    /// already set in the environment take precedence over it.
    pub fn apply_environment(&mut self) -> Result<()> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Config: read {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Config: failed to read .env file: {}", e),
        }
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the full variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("ISA") {
            self.isa = value.parse()?;
        }
        if let Some(value) = var("JIT") {
            self.jit = parse_bool("jit", &value)?;
        }
        if let Some(value) = var("MEMORY_SIZE") {
            self.memory_size = parse_number("memory_size", &value)? as usize;
        }
        if let Some(value) = var("MEMORY_LATENCY") {
            self.memory_latency = parse_number("memory_latency", &value)? as u32;
        }
        if let Some(value) = var("MEMORY_WIDTH") {
            self.memory_width = parse_number("memory_width", &value)? as u32;
        }
        if let Some(value) = var("LOAD_ADDRESS") {
            self.load_address = parse_number("load_address", &value)? as u32;
        }
        if let Some(value) = var("ENTRY_POINT") {
            self.entry_point = Some(parse_number("entry_point", &value)?);
        }
        if let Some(value) = var("CYCLES") {
            self.cycles = parse_number("cycles", &value)?;
        }
        if let Some(value) = var("SLICE") {
            self.slice = parse_number("slice", &value)? as u32;
        }
        if let Some(value) = var("TRACE") {
            self.trace = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        if let Some(value) = var("JIT_BUFFER_SIZE") {
            self.jit_buffer_size = Some(parse_number("jit_buffer_size", &value)? as usize);
        }
        if let Some(value) = var("BIG_ENDIAN") {
            self.big_endian = Some(parse_bool("big_endian", &value)?);
        }
        self.validate()
    }

    /// Reject settings the runner cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 || self.memory_size as u64 > 1 << 32 {
            return Err(invalid("memory_size", "must be between 1 byte and 4 GiB"));
        }
        if Size::from_bytes(self.memory_width).is_none() {
            return Err(invalid("memory_width", "must be 1, 2, 4 or 8"));
        }
        if self.memory_latency == 0 {
            return Err(invalid("memory_latency", "must be at least one cycle"));
        }
        if self.load_address as usize >= self.memory_size {
            return Err(invalid(
                "load_address",
                format!("0x{:08X} is past the end of memory", self.load_address),
            ));
        }
        if self.slice == 0 {
            return Err(invalid("slice", "must be at least one cycle"));
        }
        Ok(())
    }

    /// Memory byte order
    pub fn big_endian(&self) -> bool {
        self.big_endian.unwrap_or(self.isa.endian() == Endian::Big)
    }

    pub fn endian(&self) -> Endian {
        if self.big_endian() {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Bus timing of the flat memory
    pub fn timing(&self) -> BusTiming {
        BusTiming {
            cycles: self.memory_latency,
            width: Size::from_bytes(self.memory_width).unwrap_or(Size::Word),
        }
    }

    /// Initial program counter
    ///
    /// Without an explicit entry point the image runs uncached: KSEG1 on
    /// the MIPS cores, the cache-through area on the SH-2.
    pub fn entry(&self) -> u64 {
        if let Some(entry) = self.entry_point {
            return entry;
        }
        let load = self.load_address as u64;
        match self.isa {
            Isa::R3000a => 0xA000_0000 | (load & 0x1FFF_FFFF),
            Isa::Vr4300 => 0xFFFF_FFFF_A000_0000 | (load & 0x1FFF_FFFF),
            Isa::Sh2 => 0x2000_0000 | (load & 0x1FFF_FFFF),
        }
    }

    /// Zero-filled memory matching these settings
    pub fn memory(&self) -> Ram {
        Ram::with_timing(self.memory_size, self.endian(), self.timing())
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> EmulatorError {
    EmulatorError::InvalidConfig {
        key,
        reason: reason.into(),
    }
}

/// Decimal or `0x`-prefixed hexadecimal, `_` separators allowed
fn parse_number(key: &'static str, value: &str) -> Result<u64> {
    let cleaned = value.trim().replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|e| invalid(key, format!("`{}`: {}", value, e)))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, format!("`{}` is not a boolean", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.entry(), 0xA000_0000);
        assert!(!config.big_endian());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = r#"
            isa = "vr4300"
            jit = true
            memory_size = 65536
            load_address = 0x1000
            trace = "trace.log"
        "#
        .parse()
        .unwrap();
        assert_eq!(config.isa, Isa::Vr4300);
        assert!(config.jit);
        assert_eq!(config.entry(), 0xFFFF_FFFF_A000_1000);
        assert_eq!(config.trace, Some(PathBuf::from("trace.log")));
        assert_eq!(config.endian(), Endian::Big);
        // Unset fields keep their defaults
        assert_eq!(config.cycles, Config::default().cycles);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: Result<Config> = "isa = \"sh2\"\nturbo = true".parse();
        assert!(matches!(result, Err(EmulatorError::ConfigParse(_))));
    }

    #[test]
    fn test_invalid_width_is_rejected() {
        let result: Result<Config> = "memory_width = 3".parse();
        assert!(matches!(
            result,
            Err(EmulatorError::InvalidConfig {
                key: "memory_width",
                ..
            })
        ));
    }

    #[test]
    fn test_load_address_past_memory() {
        let result: Result<Config> = "memory_size = 4096\nload_address = 4096".parse();
        assert!(matches!(
            result,
            Err(EmulatorError::InvalidConfig {
                key: "load_address",
                ..
            })
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(overrides(&[
                ("CPUX_ISA", "sh2"),
                ("CPUX_JIT", "yes"),
                ("CPUX_MEMORY_SIZE", "0x2_0000"),
                ("CPUX_ENTRY_POINT", "0x600"),
                ("CPUX_BIG_ENDIAN", "false"),
            ]))
            .unwrap();
        assert_eq!(config.isa, Isa::Sh2);
        assert!(config.jit);
        assert_eq!(config.memory_size, 0x20000);
        assert_eq!(config.entry(), 0x600);
        assert!(!config.big_endian());
    }

    #[test]
    fn test_bad_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(overrides(&[("CPUX_CYCLES", "lots")]));
        assert!(matches!(
            result,
            Err(EmulatorError::InvalidConfig { key: "cycles", .. })
        ));
        let result = config.apply_overrides(overrides(&[("CPUX_ISA", "z80")]));
        assert!(matches!(result, Err(EmulatorError::UnknownIsa(_))));
    }

    #[test]
    fn test_memory_matches_settings() {
        let text = "isa = \"sh2\"\nmemory_size = 1024\nmemory_latency = 7\nmemory_width = 2";
        let config: Config = text.parse().unwrap();
        let ram = config.memory();
        assert_eq!(ram.len(), 1024);
        assert_eq!(ram.endian(), Endian::Big);
        assert_eq!(
            crate::core::bus::Bus::timing(&ram, 0),
            BusTiming {
                cycles: 7,
                width: Size::Half
            }
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpux.toml");
        std::fs::write(&path, "isa = \"r3000a\"\ncycles = 42\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.cycles, 42);
    }
}
