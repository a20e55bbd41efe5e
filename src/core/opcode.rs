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

//! Opcode enum generator shared by the decoders
//!
//! Each ISA lists its handlers once; the macro produces the enum together
//! with the index conversions the recompiler uses to store an opcode in a
//! block and the mnemonic table used by tracing and tests.

/// Declare an opcode enum
///
/// ```ignore
/// opcode_table! {
///     pub enum Opcode {
///         Invalid => "invalid",
///         Add => "add",
///     }
/// }
/// ```
macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $mnemonic:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            /// Every opcode, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Number of opcodes
            pub const COUNT: usize = Self::ALL.len();

            /// Assembler mnemonic
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $($name::$variant => $mnemonic),+
                }
            }

            /// Dense index used in recompiled blocks
            #[inline(always)]
            pub const fn index(self) -> u16 {
                self as u16
            }

            /// Inverse of [`Self::index`]
            #[inline(always)]
            pub fn from_index(index: u16) -> Option<Self> {
                Self::ALL.get(index as usize).copied()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    };
}

pub(crate) use opcode_table;
