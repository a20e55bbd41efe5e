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

//! System integration
//!
//! A [`System`] owns one processor, the flat memory it runs against and
//! the [`Scheduler`] that keeps other [`Component`]s in step with it. The
//! processor runs in slices; after each slice every component catches up
//! and due events fire. Events registered with
//! [`System::schedule_interrupt`] assert a processor interrupt line when
//! they fire.

#[cfg(test)]
mod tests;

use crate::core::bus::Ram;
use crate::core::config::Config;
use crate::core::debugger::FileTracer;
use crate::core::error::Result;
use crate::core::processor::{Isa, Processor};
use crate::core::r3000a::R3000a;
use crate::core::save_state::SaveState;
use crate::core::sh2::Sh2;
use crate::core::timing::{Component, EventHandle, Scheduler, TickCount};
use crate::core::vr4300::Vr4300;
use std::path::Path;

/// Default cycles between synchronizations
pub const DEFAULT_SLICE: u32 = 1024;

/// Processor, memory and scheduler
///
/// # Example
/// ```
/// use cpux::core::config::Config;
/// use cpux::core::system::System;
///
/// let config: Config = "memory_size = 4096".parse().unwrap();
/// let mut system = System::new(&config).unwrap();
/// // addiu $t0, $t0, 1 ; j 0 ; nop
/// system.load_words(0, &[0x2508_0001, 0x0800_0000, 0]).unwrap();
/// assert!(system.run(100) >= 100);
/// ```
pub struct System {
    processor: Box<dyn Processor>,
    memory: Ram,
    scheduler: Scheduler,
    components: Vec<Box<dyn Component>>,
    /// Events that raise an interrupt line when they fire
    interrupts: Vec<(EventHandle, u8)>,
    slice: u32,
}

impl System {
    /// Build the processor and memory described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut processor = create_processor(config);
        processor.set_recompiler(config.jit);
        if let Some(path) = &config.trace {
            let tracer = FileTracer::create(path)?;
            processor.debugger_mut().set_tracer(Some(Box::new(tracer)));
            log::info!("System: tracing to {}", path.display());
        }
        log::info!(
            "System: {} with {} KiB of memory, entry 0x{:08X}, recompiler {}",
            config.isa,
            config.memory_size / 1024,
            config.entry(),
            if config.jit { "on" } else { "off" }
        );
        let mut system = Self::with_parts(processor, config.memory());
        system.slice = config.slice;
        Ok(system)
    }

    /// Assemble a system around an already configured processor
    pub fn with_parts(processor: Box<dyn Processor>, memory: Ram) -> Self {
        Self {
            processor,
            memory,
            scheduler: Scheduler::new(),
            components: Vec::new(),
            interrupts: Vec::new(),
            slice: DEFAULT_SLICE,
        }
    }

    /// Copy a raw image file into memory at `address`
    ///
    /// Returns the image size.
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P, address: u32) -> Result<usize> {
        let image = std::fs::read(path.as_ref())?;
        self.memory.load(address, &image)?;
        log::info!(
            "System: loaded {} ({} bytes) at 0x{:08X}",
            path.as_ref().display(),
            image.len(),
            address
        );
        Ok(image.len())
    }

    /// Store instruction words in the memory's byte order
    pub fn load_words(&mut self, address: u32, words: &[u32]) -> Result<()> {
        self.memory.load_words(address, words)
    }

    /// Attach a component driven by the scheduler
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        log::debug!("System: attached {}", component.name());
        self.components.push(component);
    }

    /// Assert interrupt `line` `ticks` cycles from now, then every
    /// `interval` cycles if it is non-zero
    pub fn schedule_interrupt(
        &mut self,
        name: &'static str,
        line: u8,
        ticks: TickCount,
        interval: TickCount,
    ) -> EventHandle {
        let events = self.scheduler.events_mut();
        let handle = events.register_periodic_event(name, interval);
        events.schedule(handle, ticks);
        self.interrupts.push((handle, line));
        handle
    }

    /// Release an interrupt line asserted by an event
    pub fn acknowledge_interrupt(&mut self, line: u8) {
        self.processor.set_interrupt(line, false);
    }

    /// Run for at least `cycles` cycles
    ///
    /// Stops early when the debugger halts the processor. Returns the
    /// cycles actually run.
    pub fn run(&mut self, cycles: u64) -> u64 {
        let mut spent = 0;
        while spent < cycles {
            let budget = (cycles - spent).min(self.slice as u64);
            let elapsed = self.processor.run(&mut self.memory, budget);
            if elapsed > 0 {
                spent += elapsed;
                self.synchronize(elapsed);
            }
            if self.processor.debugger().halted() {
                log::info!(
                    "System: halted at 0x{:08X} after {} cycles",
                    self.processor.pc(),
                    spent
                );
                break;
            }
        }
        spent
    }

    /// Interpret one instruction and synchronize
    pub fn step(&mut self) -> u32 {
        let elapsed = self.processor.step(&mut self.memory);
        self.synchronize(elapsed as u64);
        elapsed
    }

    fn synchronize(&mut self, elapsed: u64) {
        // Slices are bounded, but a single instruction may report any count
        let mut remaining = elapsed;
        while remaining > 0 {
            let chunk = remaining.min(u32::MAX as u64) as u32;
            remaining -= chunk as u64;
            let fired = self.scheduler.synchronize(chunk, &mut self.components);
            for handle in fired {
                if let Some(&(_, line)) = self.interrupts.iter().find(|(h, _)| *h == handle) {
                    log::trace!("System: event {} asserts line {}", handle, line);
                    self.processor.set_interrupt(line, true);
                }
            }
        }
    }

    pub fn pc(&self) -> u64 {
        self.processor.pc()
    }

    /// Cycles synchronized since the system was built
    pub fn cycles(&self) -> u64 {
        self.scheduler.cycles()
    }

    pub fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    pub fn processor_mut(&mut self) -> &mut dyn Processor {
        self.processor.as_mut()
    }

    pub fn memory(&self) -> &Ram {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Ram {
        &mut self.memory
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Snapshot the processor
    pub fn save_state(&self) -> SaveState {
        SaveState::capture(self.processor.as_ref())
    }

    /// Restore a processor snapshot
    pub fn load_state(&mut self, state: &SaveState) -> Result<()> {
        state.apply(self.processor.as_mut())
    }

    /// Processor registers as pretty-printed JSON
    pub fn register_dump(&self) -> Result<String> {
        let dump = serde_json::json!({
            "isa": self.processor.isa(),
            "pc": self.processor.pc(),
            "clock": self.processor.clock(),
            "registers": self.processor.registers(),
        });
        Ok(serde_json::to_string_pretty(&dump)?)
    }
}

/// Build the processor for `config` with its program counter at the entry
/// point
pub fn create_processor(config: &Config) -> Box<dyn Processor> {
    let entry = config.entry();
    match config.isa {
        Isa::R3000a => {
            let mut cpu = match config.jit_buffer_size {
                Some(size) => R3000a::with_code_buffer(size),
                None => R3000a::new(),
            };
            cpu.set_pc(entry as u32);
            Box::new(cpu)
        }
        Isa::Vr4300 => {
            let mut cpu = match config.jit_buffer_size {
                Some(size) => Vr4300::with_code_buffer(size),
                None => Vr4300::new(),
            };
            cpu.set_pc(entry);
            Box::new(cpu)
        }
        Isa::Sh2 => {
            let mut cpu = match config.jit_buffer_size {
                Some(size) => Sh2::with_code_buffer(size),
                None => Sh2::new(),
            };
            cpu.set_pc(entry as u32);
            Box::new(cpu)
        }
    }
}
