//! Integration tests for the demo suite.

use qrun_demos::{bell_program, histogram};
use qrun_runtime::{Program, RuntimeConfig, Session};
use qrun_sched::ExecHint;

fn seeded_session(seed: u64) -> Session {
    let mut config = RuntimeConfig::default();
    config.memory.seed = Some(seed);
    Session::new(config).unwrap()
}

#[test]
fn test_bell_histogram_only_correlated_outcomes() {
    for hint in [ExecHint::Dense, ExecHint::Clifford] {
        let session = seeded_session(21);
        for shot in 0..64 {
            session.submit_program(
                Program::new(format!("bell-{shot}"), 2, bell_program()).with_hint(hint),
            );
        }
        let summary = session.run();
        assert_eq!(summary.completed, 64);

        let counts = histogram(&session.reports());
        assert_eq!(counts.values().sum::<usize>(), 64);
        for outcome in counts.keys() {
            assert!(*outcome == 0b00 || *outcome == 0b11, "{hint:?}: {outcome:#b}");
        }
    }
}

#[test]
fn test_bell_program_shape() {
    let program = bell_program();
    assert_eq!(program.len(), 4);
    assert!(program.iter().all(|i| i.is_clifford()));
}

#[test]
fn test_checkpoint_directory_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "checkpoint:\n  op_threshold: 1\n  directory: {}\n",
        dir.path().display()
    );
    let config = RuntimeConfig::from_yaml(&yaml).unwrap();
    let session = Session::new(config).unwrap();

    let q = session.memory().create_qregister(1).unwrap();
    session.memory().with_qreg(q, |r| r.h(0)).unwrap().unwrap();
    assert!(session.checkpoint(q).unwrap());
    assert!(session.checkpoint_path(q).starts_with(dir.path()));
}
