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

use super::super::exception::{Exception, ExceptionCode};
use super::super::Vr4300;

impl Vr4300 {
    /// Conditional trap (TGE, TEQI and friends)
    pub(crate) fn op_trap(&mut self, condition: bool) {
        if condition {
            self.raise(Exception::new(ExceptionCode::Trap));
        }
    }
}
