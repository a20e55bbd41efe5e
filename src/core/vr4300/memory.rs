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

//! Memory access path
//!
//! Segment routing, then the TLB for mapped segments, then the caches or the
//! bus. Every helper that can fault raises the exception itself and returns
//! `None`, so semantic routines only need an early return.

use super::context::{Context, Segment};
use super::exception::{Exception, ExceptionCode};
use super::tlb::TlbFault;
use super::Vr4300;
use crate::core::bus::{Bus, Size};

/// Kind of memory access, for fault selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Fetch,
    Load,
    Store,
}

impl Access {
    fn address_error(self) -> ExceptionCode {
        match self {
            Access::Fetch | Access::Load => ExceptionCode::AddressLoad,
            Access::Store => ExceptionCode::AddressStore,
        }
    }

    fn tlb_error(self) -> ExceptionCode {
        match self {
            Access::Fetch | Access::Load => ExceptionCode::TlbLoad,
            Access::Store => ExceptionCode::TlbStore,
        }
    }
}

/// Physical target of an access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub physical: u32,
    pub cached: bool,
}

impl Vr4300 {
    /// Current addressing context
    pub(super) fn context(&self) -> Context {
        Context::new(self.scc.status, self.scc.kseg0_algorithm())
    }

    /// Translate `vaddr` without side effects
    pub(super) fn resolve(&self, vaddr: u64, access: Access) -> Result<Resolved, Exception> {
        let context = self.context();
        let vaddr = if context.extended {
            vaddr
        } else {
            vaddr as u32 as i32 as i64 as u64
        };
        match context.segment(vaddr) {
            Segment::Invalid => Err(Exception::new(access.address_error())),
            Segment::Cached(physical) => Ok(Resolved {
                physical,
                cached: true,
            }),
            Segment::Uncached(physical) => Ok(Resolved {
                physical,
                cached: false,
            }),
            Segment::Mapped => self
                .tlb
                .translate(vaddr, self.scc.asid(), access == Access::Store)
                .map(|t| Resolved {
                    physical: t.physical,
                    cached: t.cached,
                })
                .map_err(|fault| match fault {
                    TlbFault::Miss => Exception::tlb_miss(access.tlb_error()),
                    TlbFault::Invalid => Exception::new(access.tlb_error()),
                    TlbFault::Modified => Exception::new(ExceptionCode::TlbModification),
                }),
        }
    }

    /// Translate `vaddr`, raising the fault on failure
    pub(super) fn translate(&mut self, vaddr: u64, access: Access) -> Option<Resolved> {
        match self.resolve(vaddr, access) {
            Ok(resolved) => Some(resolved),
            Err(exception) => {
                self.raise_address(exception, vaddr);
                None
            }
        }
    }

    /// Fetch the instruction word at the program counter
    pub(super) fn fetch_instruction(&mut self, bus: &mut dyn Bus) -> Option<u32> {
        let vaddr = self.pc;
        if vaddr & 3 != 0 {
            self.raise_address(Exception::new(ExceptionCode::AddressLoad), vaddr);
            return None;
        }
        let resolved = self.translate(vaddr, Access::Fetch)?;
        let result = if resolved.cached {
            self.icache.fetch(bus, resolved.physical)
        } else {
            let cycles = bus.timing(resolved.physical).cycles;
            bus.read(Size::Word, resolved.physical)
                .map(|word| (word as u32, cycles))
        };
        match result {
            Ok((word, cycles)) => {
                self.charge(cycles);
                Some(word)
            }
            Err(_) => {
                self.raise(Exception::new(ExceptionCode::InstructionBus));
                None
            }
        }
    }

    /// Watchpoint check on a data access
    fn watch(&mut self, physical: u32, access: Access) -> bool {
        let watch = self.scc.watch_lo;
        let armed = match access {
            Access::Load => watch & 2 != 0,
            Access::Store => watch & 1 != 0,
            Access::Fetch => false,
        };
        if armed && !self.scc.status.exception_level() && (physical & !7) == (watch & !7) {
            self.raise(Exception::new(ExceptionCode::Watch));
            return true;
        }
        false
    }

    /// Load `size` bytes from `vaddr`, zero-extended
    pub(super) fn read(&mut self, bus: &mut dyn Bus, size: Size, vaddr: u64) -> Option<u64> {
        if !size.aligned(vaddr) {
            self.raise_address(Exception::new(ExceptionCode::AddressLoad), vaddr);
            return None;
        }
        let resolved = self.translate(vaddr, Access::Load)?;
        if self.watch(resolved.physical, Access::Load) {
            return None;
        }
        self.last_physical = resolved.physical;
        let result = if resolved.cached {
            self.dcache.read(bus, size, resolved.physical)
        } else {
            let cycles = bus.timing(resolved.physical).cycles;
            bus.read(size, resolved.physical).map(|value| (value, cycles))
        };
        match result {
            Ok((value, cycles)) => {
                self.charge(cycles);
                Some(value)
            }
            Err(_) => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                None
            }
        }
    }

    /// Store the low `size` bytes of `value` at `vaddr`
    pub(super) fn write(
        &mut self,
        bus: &mut dyn Bus,
        size: Size,
        vaddr: u64,
        value: u64,
    ) -> Option<()> {
        if !size.aligned(vaddr) {
            self.raise_address(Exception::new(ExceptionCode::AddressStore), vaddr);
            return None;
        }
        let resolved = self.translate(vaddr, Access::Store)?;
        if self.watch(resolved.physical, Access::Store) {
            return None;
        }
        let value = value & size.mask();
        let result = if resolved.cached {
            self.dcache.write(bus, size, resolved.physical, value)
        } else {
            let cycles = bus.timing(resolved.physical).cycles;
            bus.write(size, resolved.physical, value).map(|_| cycles)
        };
        match result {
            Ok(cycles) => {
                self.charge(cycles);
                Some(())
            }
            Err(_) => {
                self.raise(Exception::new(ExceptionCode::DataBus));
                None
            }
        }
    }

    /// Debugger read: observes memory through the data cache without
    /// filling lines, raising exceptions or charging cycles
    pub fn peek(&self, bus: &mut dyn Bus, size: Size, vaddr: u64) -> Option<u64> {
        let resolved = self.resolve(vaddr, Access::Load).ok()?;
        if resolved.cached {
            if let Some(value) = self.dcache.peek(size, resolved.physical) {
                return Some(value);
            }
        }
        bus.read(size, resolved.physical).ok()
    }
}
