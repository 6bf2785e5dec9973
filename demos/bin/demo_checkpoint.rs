//! Checkpoint Demo
//!
//! Runs gates on a long-lived register, checkpointing it whenever the
//! configured op threshold is crossed, then restores the last checkpoint
//! and a resonance zone into fresh registers.

use std::path::PathBuf;

use clap::Parser;

use qrun_demos::{print_header, print_info, print_result, print_section, print_success, setup};
use qrun_runtime::Session;

#[derive(Parser, Debug)]
#[command(name = "demo-checkpoint")]
#[command(about = "Demonstrate register checkpoints and resonance zones")]
struct Args {
    /// Qubits in the working register
    #[arg(short = 'n', long, default_value = "4")]
    qubits: usize,

    /// Layers of gates to run
    #[arg(short, long, default_value = "6")]
    layers: usize,

    /// Checkpoint every this many operations (overrides config)
    #[arg(long)]
    every: Option<usize>,

    /// Checkpoint directory (overrides config)
    #[arg(long)]
    dir: Option<PathBuf>,

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
    if let Some(every) = args.every {
        config.checkpoint.op_threshold = every;
    }
    if let Some(dir) = args.dir {
        config.checkpoint.directory = dir;
    }

    print_header("Checkpoint Demo");
    let session = Session::new(config)?;
    let memory = session.memory();

    print_section("Policy");
    print_result("Op threshold", session.config().checkpoint.op_threshold);
    print_result(
        "Time threshold",
        format!("{} s", session.config().checkpoint.time_threshold_secs),
    );
    print_result("Directory", session.config().checkpoint.directory.display());

    let q = memory.create_qregister(args.qubits)?;
    print_result("Register", format!("{q} ({} qubits)", args.qubits));

    print_section("Running");
    let mut written = 0;
    for layer in 0..args.layers {
        memory.with_qreg(q, |r| -> qrun_mem::MemResult<()> {
            for qubit in 0..args.qubits {
                r.ry(qubit, 0.3 * (layer + 1) as f64)?;
            }
            for qubit in 1..args.qubits {
                r.cnot(qubit - 1, qubit)?;
            }
            Ok(())
        })??;

        if session.checkpoint(q)? {
            written += 1;
            print_success(&format!("layer {layer}: checkpoint written"));
        } else {
            print_result(&format!("layer {layer}"), "no checkpoint due");
        }

        if layer == args.layers / 2 {
            memory.save_resonance_zone(q, "midpoint")?;
            print_info(&format!("layer {layer}: saved resonance zone \"midpoint\""));
        }
    }
    print_result("Checkpoints written", written);

    print_section("Restore");
    let path = session.checkpoint_path(q);
    if written > 0 {
        let restored = memory.create_qregister(args.qubits)?;
        memory.load_state_from_file(restored, &path)?;
        let nnz = memory.with_qreg(restored, |r| r.nnz())?;
        print_result("Restored from", path.display());
        print_result("Non-zero amplitudes", nnz);
        memory.release_qregister(restored)?;
    }

    if memory.has_resonance_zone("midpoint") {
        let zone = memory.create_qregister(args.qubits)?;
        memory.load_resonance_zone(zone, "midpoint")?;
        let p0 = memory
            .export_state(zone)?
            .first()
            .map_or(0.0, |a| a.norm_sqr());
        print_result("Midpoint P(|0…0⟩)", format!("{p0:.4}"));
        memory.release_qregister(zone)?;
    }

    memory.release_qregister(q)?;
    print_result("Memory in use", format!("{} bytes", memory.memory_usage()));

    println!();
    print_success("Checkpoint demo complete!");
    Ok(())
}
