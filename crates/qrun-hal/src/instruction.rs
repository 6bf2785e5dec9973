//! Gate-level instruction set shared by local simulation and backends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One operation on a register's qubits.
///
/// Qubit operands index into a single quantum register; `Measure` writes
/// its outcome to bit `clbit` of the paired classical register.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    H(usize),
    X(usize),
    Y(usize),
    Z(usize),
    S(usize),
    T(usize),
    Rx(usize, f64),
    Ry(usize, f64),
    Rz(usize, f64),
    Cnot { control: usize, target: usize },
    Cz { control: usize, target: usize },
    Ccnot { c1: usize, c2: usize, target: usize },
    Swap(usize, usize),
    Measure { qubit: usize, clbit: usize },
    /// Return the whole register to |0…0⟩.
    Reset,
}

impl Instruction {
    /// Whether a stabilizer simulator can run this instruction.
    ///
    /// Rotations are treated as non-Clifford regardless of angle.
    pub fn is_clifford(&self) -> bool {
        !matches!(
            self,
            Instruction::T(_)
                | Instruction::Rx(..)
                | Instruction::Ry(..)
                | Instruction::Rz(..)
                | Instruction::Ccnot { .. }
        )
    }

    /// Qubits the instruction touches, in operand order.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Instruction::H(q)
            | Instruction::X(q)
            | Instruction::Y(q)
            | Instruction::Z(q)
            | Instruction::S(q)
            | Instruction::T(q)
            | Instruction::Rx(q, _)
            | Instruction::Ry(q, _)
            | Instruction::Rz(q, _) => vec![q],
            Instruction::Cnot { control, target } | Instruction::Cz { control, target } => {
                vec![control, target]
            }
            Instruction::Ccnot { c1, c2, target } => vec![c1, c2, target],
            Instruction::Swap(a, b) => vec![a, b],
            Instruction::Measure { qubit, .. } => vec![qubit],
            Instruction::Reset => Vec::new(),
        }
    }

    /// Lower-case mnemonic.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::H(_) => "h",
            Instruction::X(_) => "x",
            Instruction::Y(_) => "y",
            Instruction::Z(_) => "z",
            Instruction::S(_) => "s",
            Instruction::T(_) => "t",
            Instruction::Rx(..) => "rx",
            Instruction::Ry(..) => "ry",
            Instruction::Rz(..) => "rz",
            Instruction::Cnot { .. } => "cx",
            Instruction::Cz { .. } => "cz",
            Instruction::Ccnot { .. } => "ccx",
            Instruction::Swap(..) => "swap",
            Instruction::Measure { .. } => "measure",
            Instruction::Reset => "reset",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Rx(q, theta) | Instruction::Ry(q, theta) | Instruction::Rz(q, theta) => {
                write!(f, "{}({theta}) q[{q}]", self.name())
            }
            Instruction::Measure { qubit, clbit } => write!(f, "measure q[{qubit}] -> c[{clbit}]"),
            Instruction::Reset => write!(f, "reset q"),
            _ => {
                let operands: Vec<String> =
                    self.qubits().iter().map(|q| format!("q[{q}]")).collect();
                write!(f, "{} {}", self.name(), operands.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clifford_classification() {
        assert!(Instruction::H(0).is_clifford());
        assert!(Instruction::S(0).is_clifford());
        assert!(
            Instruction::Cnot {
                control: 0,
                target: 1
            }
            .is_clifford()
        );
        assert!(Instruction::Measure { qubit: 0, clbit: 0 }.is_clifford());
        assert!(!Instruction::T(0).is_clifford());
        assert!(!Instruction::Rz(0, 0.5).is_clifford());
        assert!(
            !Instruction::Ccnot {
                c1: 0,
                c2: 1,
                target: 2
            }
            .is_clifford()
        );
    }

    #[test]
    fn test_qubits() {
        assert_eq!(
            Instruction::Ccnot {
                c1: 2,
                c2: 0,
                target: 1
            }
            .qubits(),
            vec![2, 0, 1]
        );
        assert!(Instruction::Reset.qubits().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Instruction::Cnot {
                control: 0,
                target: 1
            }
            .to_string(),
            "cx q[0], q[1]"
        );
        assert_eq!(Instruction::Rz(2, 0.5).to_string(), "rz(0.5) q[2]");
        assert_eq!(
            Instruction::Measure { qubit: 1, clbit: 0 }.to_string(),
            "measure q[1] -> c[0]"
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Instruction::Swap(0, 3)).unwrap();
        assert_eq!(json, r#"{"swap":[0,3]}"#);
        let back: Instruction = serde_json::from_str(r#"{"measure":{"qubit":1,"clbit":2}}"#).unwrap();
        assert_eq!(back, Instruction::Measure { qubit: 1, clbit: 2 });
    }
}
