//! Bell State Demo
//!
//! Runs repeated Bell-pair shots through a session and prints the outcome
//! histogram.

use std::path::PathBuf;

use clap::Parser;

use qrun_demos::{
    bell_program, create_progress_bar, histogram, print_header, print_info, print_result,
    print_section, print_success, setup,
};
use qrun_runtime::{Program, Session};
use qrun_sched::ExecHint;

#[derive(Parser, Debug)]
#[command(name = "demo-bell")]
#[command(about = "Sample Bell pairs through a qrun session")]
struct Args {
    /// Number of shots
    #[arg(short, long, default_value = "200")]
    shots: usize,

    /// Seed for reproducible outcomes
    #[arg(long)]
    seed: Option<u64>,

    /// Use the stabilizer simulator instead of the dense one
    #[arg(long)]
    clifford: bool,

    /// Configuration file (YAML)
    #[arg(short, long, env = "QRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = setup(args.config.as_deref(), args.verbose)?;
    if args.seed.is_some() {
        config.memory.seed = args.seed;
    }

    print_header("Bell State Demo");

    let hint = if args.clifford {
        ExecHint::Clifford
    } else {
        ExecHint::Dense
    };

    print_section("Setup");
    print_result("Shots", args.shots);
    print_result("Simulator", if args.clifford { "stabilizer" } else { "dense" });
    print_result(
        "Seed",
        config
            .memory
            .seed
            .map_or_else(|| "entropy".to_string(), |s| s.to_string()),
    );

    let session = Session::new(config)?;
    let pb = create_progress_bar(args.shots as u64, "submitting shots");
    for shot in 0..args.shots {
        session.submit_program(
            Program::new(format!("bell-{shot}"), 2, bell_program()).with_hint(hint),
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    let summary = session.run();

    print_section("Results");
    print_result("Completed", summary.completed);
    print_result("Failed", summary.failed);

    let reports = session.reports();
    for (value, count) in histogram(&reports) {
        let share = count as f64 / reports.len().max(1) as f64;
        print_result(
            &format!("|{value:02b}⟩"),
            format!("{count:>5}  ({:.1}%)", share * 100.0),
        );
    }

    println!();
    print_success("Bell demo complete!");
    print_info("Only |00⟩ and |11⟩ appear: the two qubits are perfectly correlated.");
    Ok(())
}
