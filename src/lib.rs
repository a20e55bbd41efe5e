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

//! Processor emulation core library
//!
//! Interpreters and a threaded-code recompiler for the MIPS R3000A, the
//! NEC VR4300 and the Hitachi SH-2, with their caches, TLB and exception
//! handling. Processors talk to memory through the [`core::bus::Bus`]
//! trait.
//!
//! # Example
//!
//! ```
//! use cpux::core::bus::{Endian, Ram};
//! use cpux::core::processor::Processor;
//! use cpux::core::r3000a::R3000a;
//!
//! let mut ram = Ram::new(0x1000, Endian::Little);
//! // addiu $t0, $zero, 5 ; j 4 ; nop
//! ram.load_words(0, &[0x2408_0005, 0x0800_0001, 0]).unwrap();
//!
//! let mut cpu = R3000a::new();
//! cpu.set_pc(0xA000_0000);
//! cpu.run(&mut ram, 50);
//! assert_eq!(cpu.reg(8), 5);
//! ```

pub mod core;
