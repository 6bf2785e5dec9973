//! qrun Demo Suite
//!
//! Small programs that walk through the runtime:
//!
//! - **Bell**: repeated Bell-pair shots through a session
//! - **Scheduler**: priority ordering and failure isolation
//! - **Checkpoint**: op-count checkpoints and resonance zones

use std::collections::BTreeMap;
use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use qrun_hal::Instruction;
use qrun_runtime::{ExecutionReport, RuntimeConfig, init_tracing};

/// Bell pair on qubits 0 and 1, measured into bits 0 and 1.
pub fn bell_program() -> Vec<Instruction> {
    vec![
        Instruction::H(0),
        Instruction::Cnot {
            control: 0,
            target: 1,
        },
        Instruction::Measure { qubit: 0, clbit: 0 },
        Instruction::Measure { qubit: 1, clbit: 1 },
    ]
}

/// Count classical outcomes across reports. Reports whose value does not
/// fit in 64 bits are skipped.
pub fn histogram<'a>(reports: impl IntoIterator<Item = &'a ExecutionReport>) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for value in reports.into_iter().filter_map(ExecutionReport::classical_value) {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Load configuration for a demo and install logging from it.
///
/// `verbose` raises the level to debug unless `RUST_LOG` is set.
pub fn setup(config_file: Option<&Path>, verbose: bool) -> anyhow::Result<RuntimeConfig> {
    let mut config = RuntimeConfig::load(config_file)?;
    if verbose {
        config.logging.level = "debug".to_string();
    }
    init_tracing(&config.logging)?;
    Ok(config)
}

/// Create a progress bar for demo operations.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print a failure message.
pub fn print_failure(message: &str) {
    println!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
