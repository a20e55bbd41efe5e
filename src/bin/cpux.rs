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

//! Command-line runner
//!
//! Loads a raw binary image into flat memory, runs the selected processor
//! for a cycle budget and prints its registers.

use clap::Parser;
use cpux::core::config::Config;
use cpux::core::error::Result;
use cpux::core::processor::Isa;
use cpux::core::save_state::SaveState;
use cpux::core::system::System;
use log::{error, info};
use std::path::PathBuf;

/// Processor emulation runner
#[derive(Parser)]
#[command(name = "cpux")]
#[command(version, about = "Run a raw binary on an emulated processor", long_about = None)]
struct Args {
    /// Raw binary image to load
    image: PathBuf,

    /// TOML configuration file
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Processor to emulate
    #[arg(short, long, value_enum)]
    isa: Option<Isa>,

    /// Run through the recompiler
    #[arg(short, long)]
    jit: bool,

    /// Cycle budget
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// Physical load address (decimal or 0x-prefixed)
    #[arg(short, long, value_parser = parse_address::<u32>)]
    load_address: Option<u32>,

    /// Initial program counter (decimal or 0x-prefixed)
    #[arg(short, long, value_parser = parse_address::<u64>)]
    entry: Option<u64>,

    /// Write an instruction trace to this file
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Restore this save state before running
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write a save state after running
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write the final registers as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn parse_address<T: TryFrom<u64>>(value: &str) -> std::result::Result<T, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    }
    .map_err(|e| e.to_string())?;
    T::try_from(parsed).map_err(|_| format!("{} is out of range", value))
}

fn config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_environment()?;

    if let Some(isa) = args.isa {
        config.isa = isa;
    }
    if args.jit {
        config.jit = true;
    }
    if let Some(cycles) = args.cycles {
        config.cycles = cycles;
    }
    if let Some(address) = args.load_address {
        config.load_address = address;
    }
    if let Some(entry) = args.entry {
        config.entry_point = Some(entry);
    }
    if let Some(trace) = &args.trace {
        config.trace = Some(trace.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_registers(system: &System) {
    let processor = system.processor();
    println!(
        "{} @ 0x{:016X}, {} cycles",
        processor.isa(),
        processor.pc(),
        processor.clock()
    );
    for (row, chunk) in processor.registers().chunks(4).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(col, value)| format!("r{:<2} 0x{:016X}", row * 4 + col, value))
            .collect();
        println!("  {}", line.join("  "));
    }
}

fn run(args: &Args) -> Result<()> {
    let config = config(args)?;
    let mut system = System::new(&config)?;
    system.load_image(&args.image, config.load_address)?;

    if let Some(path) = &args.resume {
        let state = SaveState::load_from_file(path)?;
        system.load_state(&state)?;
        info!("Resumed from {}", path.display());
    }

    let spent = system.run(config.cycles);
    info!(
        "Ran {} cycles, PC: 0x{:08X}{}",
        spent,
        system.pc(),
        if system.processor().debugger().halted() {
            " (halted)"
        } else {
            ""
        }
    );
    print_registers(&system);

    if let Some(path) = &args.dump {
        std::fs::write(path, system.register_dump()?)?;
        info!("Register dump written to {}", path.display());
    }
    if let Some(path) = &args.save {
        system.save_state().save_to_file(path)?;
        info!("Save state written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    // .env may set RUST_LOG as well as CPUX_* overrides
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("cpux v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}
