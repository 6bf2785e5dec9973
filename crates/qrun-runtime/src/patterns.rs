//! Two-qubit composite routines.

use std::f64::consts::FRAC_PI_2;

use qrun_hal::Instruction;
use qrun_mem::{MemResult, QRegister};

use crate::executor::apply_instruction;

/// Controlled phase `diag(1, 1, 1, e^{iφ})`, up to global phase.
pub fn controlled_phase(control: usize, target: usize, phi: f64) -> Vec<Instruction> {
    vec![
        Instruction::Rz(control, phi / 2.0),
        Instruction::Cnot { control, target },
        Instruction::Rz(target, -phi / 2.0),
        Instruction::Cnot { control, target },
        Instruction::Rz(target, phi / 2.0),
    ]
}

/// Quantum Fourier transform on `(hi, lo)`, `hi` the more significant
/// qubit, with the closing swap so outputs come back in input order.
pub fn qft2(hi: usize, lo: usize) -> Vec<Instruction> {
    let mut program = vec![Instruction::H(hi)];
    program.extend(controlled_phase(lo, hi, FRAC_PI_2));
    program.push(Instruction::H(lo));
    program.push(Instruction::Swap(hi, lo));
    program
}

/// One Grover iteration marking |11⟩ on `(a, b)`. From |00⟩ it reaches
/// |11⟩ with certainty.
pub fn grover2(a: usize, b: usize) -> Vec<Instruction> {
    let oracle = Instruction::Cz {
        control: a,
        target: b,
    };
    vec![
        Instruction::H(a),
        Instruction::H(b),
        oracle,
        // diffusion
        Instruction::H(a),
        Instruction::H(b),
        Instruction::X(a),
        Instruction::X(b),
        oracle,
        Instruction::X(a),
        Instruction::X(b),
        Instruction::H(a),
        Instruction::H(b),
    ]
}

fn apply_all(reg: &mut QRegister, program: &[Instruction]) -> MemResult<()> {
    for instruction in program {
        apply_instruction(reg, instruction)?;
    }
    Ok(())
}

pub fn apply_qft2(reg: &mut QRegister, hi: usize, lo: usize) -> MemResult<()> {
    apply_all(reg, &qft2(hi, lo))
}

pub fn apply_grover2(reg: &mut QRegister, a: usize, b: usize) -> MemResult<()> {
    apply_all(reg, &grover2(a, b))
}
