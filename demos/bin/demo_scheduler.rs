//! Scheduler Demo
//!
//! Queues mixed-priority programs and plain tasks, including ones that
//! fail, and shows the order they ran in.

use std::path::PathBuf;

use clap::Parser;

use qrun_demos::{
    bell_program, print_failure, print_header, print_info, print_result, print_section,
    print_success, setup,
};
use qrun_hal::Instruction;
use qrun_runtime::patterns::{grover2, qft2};
use qrun_runtime::{Program, Session};
use qrun_sched::{ExecHint, Priority, Task, TaskStatus};

#[derive(Parser, Debug)]
#[command(name = "demo-scheduler")]
#[command(about = "Demonstrate priority scheduling of quantum tasks")]
struct Args {
    /// Drain on a background worker instead of the main thread
    #[arg(long)]
    background: bool,

    /// Configuration file (YAML)
    #[arg(short, long, env = "QRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = setup(args.config.as_deref(), args.verbose)?;

    print_header("Scheduler Demo");
    let session = Session::new(config)?;

    print_section("Queue");
    let mut grover = grover2(0, 1);
    grover.push(Instruction::Measure { qubit: 0, clbit: 0 });
    grover.push(Instruction::Measure { qubit: 1, clbit: 1 });

    let submissions = [
        Program::new("bell", 2, bell_program()).with_priority(Priority::LOW),
        Program::new("grover", 2, grover).with_priority(Priority::HIGH),
        Program::new("qft", 2, qft2(1, 0)),
        // T is not Clifford: this one fails on the stabilizer path.
        Program::new("bad-clifford", 1, vec![Instruction::H(0), Instruction::T(0)])
            .with_hint(ExecHint::Clifford)
            .with_priority(5),
    ];
    for program in submissions {
        print_result(
            &program.name,
            format!("priority {:>3}, hint {:?}", program.priority.value(), program.hint),
        );
        session.submit_program(program);
    }
    session.submit(
        Task::new("classical-postprocess", || {
            tracing::info!("post-processing on the CPU");
            Ok(())
        })
        .with_priority(Priority::DEFAULT),
    );
    session.submit(Task::new("broken", || {
        Err(anyhow::anyhow!("intentional failure"))
    }));

    if args.background {
        print_info("Draining on the background worker");
        session.run_async()?;
        session.wait();
    } else {
        let summary = session.run();
        print_result("Completed", summary.completed);
        print_result("Failed", summary.failed);
    }

    print_section("Execution Order");
    for (i, record) in session.history().iter().enumerate() {
        let line = format!(
            "{:>2}. {:<22} priority {:>3}  {} µs",
            i + 1,
            record.name,
            record.priority.value(),
            record.duration().num_microseconds().unwrap_or(i64::MAX)
        );
        match &record.status {
            TaskStatus::Failed { reason } => print_failure(&format!("{line}  ({reason})")),
            _ => print_success(&line),
        }
    }

    print_section("Program Reports");
    for report in session.reports() {
        print_result(
            report.task.as_deref().unwrap_or("?"),
            format!(
                "{} · value {} · {} instructions",
                report.strategy,
                report
                    .classical_value()
                    .map_or_else(|| "wide".to_string(), |v| v.to_string()),
                report.gate_counts.values().sum::<usize>()
            ),
        );
    }

    println!();
    print_success("Scheduler demo complete!");
    Ok(())
}
