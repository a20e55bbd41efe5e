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

//! System tests
//!
//! - `basic`: construction from a config, image loading, dumps, tracing
//! - `execution`: slices, components, scheduled interrupts, save states


use crate::core::config::Config;

/// Config with 64 KiB of memory for `isa`
pub fn small_config(isa: &str) -> Config {
    format!("isa = \"{}\"\nmemory_size = 0x10000\nslice = 256", isa)
        .parse()
        .unwrap()
}
