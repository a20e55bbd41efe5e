use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development tasks for cpux")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Processor families; also the test and benchmark name filters
#[derive(Clone, Copy, ValueEnum)]
enum Isa {
    R3000a,
    Vr4300,
    Sh2,
}

impl Isa {
    fn filter(self) -> &'static str {
        match self {
            Isa::R3000a => "r3000a",
            Isa::Vr4300 => "vr4300",
            Isa::Sh2 => "sh2",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Format check, clippy, tests, doc tests and the release equivalence run
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy on every target
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run unit and integration tests, optionally for one processor
    Test {
        #[arg(short, long, value_enum)]
        isa: Option<Isa>,
        /// Doc tests only
        #[arg(long)]
        doc: bool,
    },
    /// Interpreter/recompiler equivalence properties in release mode
    Equivalence {
        #[arg(short, long, value_enum)]
        isa: Option<Isa>,
    },
    /// Criterion benchmarks
    Bench {
        #[arg(short, long, value_enum)]
        isa: Option<Isa>,
    },
    /// Run a raw image through the cpux runner
    Run {
        image: String,
        #[arg(short, long, value_enum, default_value = "r3000a")]
        isa: Isa,
        #[arg(short = 'n', long, default_value = "1000000")]
        cycles: u64,
        /// Initial program counter, passed through unparsed
        #[arg(short, long)]
        entry: Option<String>,
        #[arg(long)]
        jit: bool,
        /// Write the final registers as JSON
        #[arg(long)]
        dump: Option<String>,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Ci { verbose } => ci(verbose),
        Commands::Fmt { check } => fmt(check),
        Commands::Clippy { fix } => clippy(fix),
        Commands::Test { isa, doc } if doc => doc_tests(isa),
        Commands::Test { isa, .. } => tests(isa),
        Commands::Equivalence { isa } => equivalence(isa),
        Commands::Bench { isa } => bench(isa),
        Commands::Run {
            image,
            isa,
            cycles,
            entry,
            jit,
            dump,
        } => run(&image, isa, cycles, entry.as_deref(), jit, dump.as_deref()),
    }
}

fn ci(verbose: bool) -> Result<()> {
    println!("{}", "=== cpux CI ===".bold().blue());
    let start = Instant::now();

    task("Format check", || fmt(true), verbose)?;
    task("Clippy", || clippy(false), verbose)?;
    task("Tests", || tests(None), verbose)?;
    task("Doc tests", || doc_tests(None), verbose)?;
    task("Equivalence", || equivalence(None), verbose)?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn cargo() -> Command {
    Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
}

fn fmt(check: bool) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["fmt", "--all"]);
    if check {
        cmd.args(["--", "--check"]);
    }
    execute(&mut cmd)
}

fn clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["clippy", "--workspace", "--all-targets"]);
    if fix {
        cmd.args(["--fix", "--allow-dirty"]);
    } else {
        cmd.args(["--", "-D", "warnings"]);
    }
    execute(&mut cmd)
}

/// Library and integration tests; module paths and integration test names
/// both carry the processor name
fn tests(isa: Option<Isa>) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["test", "--lib", "--tests", "--bins"]);
    if let Some(isa) = isa {
        cmd.args(["--", isa.filter()]);
    }
    execute(&mut cmd)
}

fn doc_tests(isa: Option<Isa>) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["test", "--doc"]);
    if let Some(isa) = isa {
        cmd.args(["--", isa.filter()]);
    }
    execute(&mut cmd)
}

fn equivalence(isa: Option<Isa>) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["test", "--release", "--test", "jit_equivalence"]);
    if let Some(isa) = isa {
        cmd.args(["--", isa.filter()]);
    }
    execute(&mut cmd)
}

fn bench(isa: Option<Isa>) -> Result<()> {
    let mut cmd = cargo();
    cmd.args(["bench", "--bench", "cpu_bench"]);
    if let Some(isa) = isa {
        cmd.args(["--", isa.filter()]);
    }
    execute(&mut cmd)
}

fn run(
    image: &str,
    isa: Isa,
    cycles: u64,
    entry: Option<&str>,
    jit: bool,
    dump: Option<&str>,
) -> Result<()> {
    if !std::path::Path::new(image).exists() {
        println!("{} Image not found: {}", "✗".red().bold(), image.yellow());
        bail!("image not found");
    }
    println!(
        "{} {} on {} for {} cycles ({})",
        "→".blue(),
        image.cyan(),
        isa.filter().bold(),
        cycles,
        if jit { "recompiler".green() } else { "interpreter".yellow() }
    );

    let mut cmd = cargo();
    cmd.args(["run", "--release", "--bin", "cpux", "--"])
        .arg(image)
        .args(["--isa", isa.filter(), "-n"])
        .arg(cycles.to_string());
    if let Some(entry) = entry {
        cmd.args(["--entry", entry]);
    }
    if let Some(dump) = dump {
        cmd.args(["--dump", dump]);
    }
    if jit {
        cmd.arg("--jit");
    }

    let start = Instant::now();
    execute(&mut cmd)?;
    println!(
        "{} Finished in {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn task(name: &str, body: impl FnOnce() -> Result<()>, verbose: bool) -> Result<()> {
    println!("{} {}", "→".blue(), name.bold());
    let start = Instant::now();
    match body() {
        Ok(()) => {
            if verbose {
                println!("{} {} ({:.2}s)", "✓".green(), name, start.elapsed().as_secs_f64());
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), name);
            Err(e)
        }
    }
}

fn execute(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    if !status.success() {
        bail!("{:?} failed: {}", cmd, status);
    }
    Ok(())
}
