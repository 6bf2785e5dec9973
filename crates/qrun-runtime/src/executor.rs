//! Running instruction lists against registers.

use std::collections::BTreeMap;
use std::sync::Arc;

use qrun_hal::Instruction;
use qrun_mem::{CRegId, MemResult, MemoryManager, QRegId, QRegister};
use qrun_state::Tableau;
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};
use crate::strategy::ExecutionStrategy;

/// One measurement outcome and where it was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub qubit: usize,
    pub clbit: usize,
    pub value: u8,
}

/// What happened when a program ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Task the program belonged to, when run through a session.
    pub task: Option<String>,
    /// Label of the strategy that ran the program.
    pub strategy: String,
    /// Measurements in program order. Empty for remote execution.
    pub measurements: Vec<MeasurementRecord>,
    /// Instruction counts by mnemonic.
    pub gate_counts: BTreeMap<String, usize>,
}

impl ExecutionReport {
    /// Final classical value, bit `clbit` weighted 2^clbit. Later
    /// measurements into the same bit overwrite earlier ones.
    ///
    /// `None` if a bit at index 64 or above ends up set.
    pub fn classical_value(&self) -> Option<u64> {
        let mut bits = BTreeMap::new();
        for m in &self.measurements {
            bits.insert(m.clbit, m.value);
        }
        bits.into_iter()
            .filter(|&(_, v)| v == 1)
            .try_fold(0u64, |acc, (clbit, _)| {
                u32::try_from(clbit)
                    .ok()
                    .and_then(|shift| 1u64.checked_shl(shift))
                    .map(|weight| acc | weight)
            })
    }
}

/// Apply one instruction to a register. Returns the outcome of a
/// measurement.
pub fn apply_instruction(reg: &mut QRegister, instruction: &Instruction) -> MemResult<Option<u8>> {
    match *instruction {
        Instruction::H(q) => reg.h(q)?,
        Instruction::X(q) => reg.x(q)?,
        Instruction::Y(q) => reg.y(q)?,
        Instruction::Z(q) => reg.z(q)?,
        Instruction::S(q) => reg.s(q)?,
        Instruction::T(q) => reg.t(q)?,
        Instruction::Rx(q, theta) => reg.rx(q, theta)?,
        Instruction::Ry(q, theta) => reg.ry(q, theta)?,
        Instruction::Rz(q, theta) => reg.rz(q, theta)?,
        Instruction::Cnot { control, target } => reg.cnot(control, target)?,
        Instruction::Cz { control, target } => reg.cz(control, target)?,
        Instruction::Ccnot { c1, c2, target } => reg.ccnot(c1, c2, target)?,
        Instruction::Swap(a, b) => reg.swap(a, b)?,
        Instruction::Measure { qubit, .. } => return Ok(Some(reg.measure(qubit)?)),
        Instruction::Reset => reg.reset_state(),
    }
    Ok(None)
}

fn apply_to_tableau(
    tableau: &mut Tableau,
    index: usize,
    instruction: &Instruction,
) -> RuntimeResult<Option<u8>> {
    match *instruction {
        Instruction::H(q) => tableau.apply_h(q)?,
        Instruction::X(q) => tableau.apply_x(q)?,
        Instruction::Y(q) => tableau.apply_y(q)?,
        Instruction::Z(q) => tableau.apply_z(q)?,
        Instruction::S(q) => tableau.apply_s(q)?,
        Instruction::Cnot { control, target } => tableau.apply_cnot(control, target)?,
        Instruction::Cz { control, target } => tableau.apply_cz(control, target)?,
        Instruction::Swap(a, b) => tableau.apply_swap(a, b)?,
        Instruction::Measure { qubit, .. } => return Ok(Some(tableau.measure(qubit)?)),
        Instruction::Reset => tableau.reset(),
        other => {
            return Err(RuntimeError::NonClifford {
                index,
                instruction: other.to_string(),
            });
        }
    }
    Ok(None)
}

/// Runs programs for task bodies against manager-owned registers.
#[derive(Debug, Clone)]
pub struct Executor {
    memory: Arc<MemoryManager>,
}

impl Executor {
    pub fn new(memory: Arc<MemoryManager>) -> Self {
        Self { memory }
    }

    /// Run `program` under `strategy`.
    ///
    /// Local strategies write every measurement into `creg`. The dense path
    /// evolves the quantum register itself; the stabilizer path simulates
    /// on a scratch tableau of the same width and leaves the register's
    /// state untouched.
    pub fn execute(
        &self,
        strategy: &ExecutionStrategy,
        program: &[Instruction],
        qreg: QRegId,
        creg: CRegId,
    ) -> RuntimeResult<ExecutionReport> {
        let mut report = ExecutionReport {
            strategy: strategy.label(),
            gate_counts: count_gates(program),
            ..ExecutionReport::default()
        };

        match strategy {
            ExecutionStrategy::LocalDense => {
                self.check_qubits(program, qreg)?;
                self.check_clbits(program, creg)?;
                report.measurements = self.run_dense(program, qreg)?;
            }
            ExecutionStrategy::LocalStabilizer => {
                check_clifford(program)?;
                self.check_qubits(program, qreg)?;
                self.check_clbits(program, creg)?;
                report.measurements = self.run_stabilizer(program, qreg)?;
            }
            ExecutionStrategy::RemoteBackend(backend) => {
                tracing::info!(
                    "Submitting {} instructions to backend {}",
                    program.len(),
                    backend.name()
                );
                backend.execute(program)?;
            }
        }

        if !report.measurements.is_empty() {
            self.memory.with_creg(creg, |c| {
                for m in &report.measurements {
                    c.set(m.clbit, m.value == 1)?;
                }
                Ok::<_, qrun_mem::MemError>(())
            })??;
        }

        tracing::debug!(
            "Program of {} instructions finished on {} with {} measurements",
            program.len(),
            report.strategy,
            report.measurements.len()
        );
        Ok(report)
    }

    fn check_qubits(&self, program: &[Instruction], qreg: QRegId) -> RuntimeResult<()> {
        let width = self.memory.with_qreg(qreg, |r| r.num_qubits())?;
        for (index, instruction) in program.iter().enumerate() {
            if let Some(&qubit) = instruction.qubits().iter().find(|&&q| q >= width) {
                return Err(RuntimeError::QubitOutOfRange {
                    index,
                    qubit,
                    width,
                });
            }
        }
        Ok(())
    }

    fn check_clbits(&self, program: &[Instruction], creg: CRegId) -> RuntimeResult<()> {
        let len = self.memory.with_creg(creg, |c| c.len())?;
        for instruction in program {
            if let Instruction::Measure { clbit, .. } = *instruction {
                if clbit >= len {
                    return Err(RuntimeError::ClbitOutOfRange { clbit, len });
                }
            }
        }
        Ok(())
    }

    fn run_dense(
        &self,
        program: &[Instruction],
        qreg: QRegId,
    ) -> RuntimeResult<Vec<MeasurementRecord>> {
        let handle = self.memory.qreg(qreg)?;
        let mut reg = handle.lock();
        let mut records = Vec::new();
        for instruction in program {
            let outcome = apply_instruction(&mut reg, instruction)?;
            push_record(&mut records, instruction, outcome);
        }
        Ok(records)
    }

    fn run_stabilizer(
        &self,
        program: &[Instruction],
        qreg: QRegId,
    ) -> RuntimeResult<Vec<MeasurementRecord>> {
        let width = self.memory.with_qreg(qreg, |r| r.num_qubits())?;
        let mut tableau = match self.memory.config().seed {
            Some(seed) => Tableau::seeded(width, seed ^ qreg.0 as u64),
            None => Tableau::new(width),
        };
        let mut records = Vec::new();
        for (index, instruction) in program.iter().enumerate() {
            let outcome = apply_to_tableau(&mut tableau, index, instruction)?;
            push_record(&mut records, instruction, outcome);
        }
        Ok(records)
    }
}

fn push_record(records: &mut Vec<MeasurementRecord>, instruction: &Instruction, outcome: Option<u8>) {
    if let (Instruction::Measure { qubit, clbit }, Some(value)) = (*instruction, outcome) {
        records.push(MeasurementRecord {
            qubit,
            clbit,
            value,
        });
    }
}

/// Reject the first non-Clifford instruction.
pub fn check_clifford(program: &[Instruction]) -> RuntimeResult<()> {
    match program.iter().position(|i| !i.is_clifford()) {
        Some(index) => Err(RuntimeError::NonClifford {
            index,
            instruction: program[index].to_string(),
        }),
        None => Ok(()),
    }
}

fn count_gates(program: &[Instruction]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for instruction in program {
        *counts.entry(instruction.name().to_string()).or_insert(0) += 1;
    }
    counts
}
