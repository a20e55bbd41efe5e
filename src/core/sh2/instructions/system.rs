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

use super::super::{Branch, Sh2};

impl Sh2 {
    /// SLEEP: halt until an interrupt or NMI is accepted
    ///
    /// Modelled by branching back onto the instruction, so each pass costs
    /// one cycle. The interrupt returns past it.
    pub(crate) fn op_sleep(&mut self) {
        if !self.sleeping {
            log::trace!("SH-2: sleep at 0x{:08X}", self.pc);
        }
        self.sleeping = true;
        self.target = self.pc;
        self.branch = Branch::Take;
    }
}
