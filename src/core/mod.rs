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

//! Core emulation components
//!
//! Shared infrastructure:
//! - Bus/memory port and flat RAM
//! - Processor trait, save states, debug hooks
//! - Threaded-code recompiler
//! - Scheduler and system integration
//!
//! Processors:
//! - MIPS R3000A
//! - NEC VR4300
//! - Hitachi SH-2

pub mod bus;
pub mod config;
pub mod coprocessor;
pub mod debugger;
pub mod error;
pub mod mips;
pub(crate) mod opcode;
pub mod processor;
pub mod r3000a;
pub mod recompiler;
pub mod save_state;
pub mod sh2;
pub mod system;
pub mod timing;
pub mod vr4300;

// Re-export commonly used types
pub use bus::{Bus, Ram};
pub use config::Config;
pub use error::{EmulatorError, Result};
pub use processor::{Isa, Processor};
pub use r3000a::R3000a;
pub use save_state::SaveState;
pub use sh2::Sh2;
pub use system::System;
pub use vr4300::Vr4300;
