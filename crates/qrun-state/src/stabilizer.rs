//! Stabilizer tableau for Clifford-only circuits.
//!
//! Aaronson–Gottesman representation (arXiv:quant-ph/0406196): rows
//! `0..n` are destabilizers, rows `n..2n` stabilizers, row `2n` is scratch
//! space for deterministic measurements. Each row is an n-qubit Pauli
//! string encoded by its X bits, Z bits and a sign bit.
//!
//! Gates cost O(n), measurements O(n²); memory is O(n²) bits instead of
//! the 2^n amplitudes of [`StateEngine`](crate::StateEngine).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{StateError, StateResult};

/// Stabilizer state of `n` qubits.
#[derive(Debug, Clone)]
pub struct Tableau {
    num_qubits: usize,
    x: Vec<Vec<bool>>,
    z: Vec<Vec<bool>>,
    r: Vec<bool>,
    rng: StdRng,
}

impl Tableau {
    /// |0…0⟩ with random measurement outcomes drawn from OS entropy.
    pub fn new(num_qubits: usize) -> Self {
        Self::with_rng(num_qubits, StdRng::from_entropy())
    }

    /// |0…0⟩ with a deterministic measurement RNG.
    pub fn seeded(num_qubits: usize, seed: u64) -> Self {
        Self::with_rng(num_qubits, StdRng::seed_from_u64(seed))
    }

    fn with_rng(num_qubits: usize, rng: StdRng) -> Self {
        let rows = 2 * num_qubits + 1;
        let mut tableau = Self {
            num_qubits,
            x: vec![vec![false; num_qubits]; rows],
            z: vec![vec![false; num_qubits]; rows],
            r: vec![false; rows],
            rng,
        };
        tableau.reset();
        tableau
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Return to |0…0⟩: destabilizers X_i, stabilizers Z_i.
    pub fn reset(&mut self) {
        let n = self.num_qubits;
        for row in 0..2 * n + 1 {
            self.x[row].fill(false);
            self.z[row].fill(false);
            self.r[row] = false;
        }
        for i in 0..n {
            self.x[i][i] = true;
            self.z[n + i][i] = true;
        }
    }

    fn rows(&self) -> std::ops::Range<usize> {
        0..2 * self.num_qubits
    }

    pub fn apply_h(&mut self, a: usize) -> StateResult<()> {
        self.check(a)?;
        for i in self.rows() {
            self.r[i] ^= self.x[i][a] && self.z[i][a];
            let tmp = self.x[i][a];
            self.x[i][a] = self.z[i][a];
            self.z[i][a] = tmp;
        }
        Ok(())
    }

    pub fn apply_s(&mut self, a: usize) -> StateResult<()> {
        self.check(a)?;
        for i in self.rows() {
            self.r[i] ^= self.x[i][a] && self.z[i][a];
            self.z[i][a] ^= self.x[i][a];
        }
        Ok(())
    }

    pub fn apply_x(&mut self, a: usize) -> StateResult<()> {
        self.check(a)?;
        for i in self.rows() {
            self.r[i] ^= self.z[i][a];
        }
        Ok(())
    }

    pub fn apply_y(&mut self, a: usize) -> StateResult<()> {
        self.check(a)?;
        for i in self.rows() {
            self.r[i] ^= self.x[i][a] ^ self.z[i][a];
        }
        Ok(())
    }

    pub fn apply_z(&mut self, a: usize) -> StateResult<()> {
        self.check(a)?;
        for i in self.rows() {
            self.r[i] ^= self.x[i][a];
        }
        Ok(())
    }

    pub fn apply_cnot(&mut self, control: usize, target: usize) -> StateResult<()> {
        self.check_pair(control, target)?;
        let (a, b) = (control, target);
        for i in self.rows() {
            self.r[i] ^= self.x[i][a] && self.z[i][b] && (self.x[i][b] == self.z[i][a]);
            self.x[i][b] ^= self.x[i][a];
            self.z[i][a] ^= self.z[i][b];
        }
        Ok(())
    }

    pub fn apply_cz(&mut self, control: usize, target: usize) -> StateResult<()> {
        self.check_pair(control, target)?;
        self.apply_h(target)?;
        self.apply_cnot(control, target)?;
        self.apply_h(target)
    }

    pub fn apply_swap(&mut self, a: usize, b: usize) -> StateResult<()> {
        self.check_pair(a, b)?;
        self.apply_cnot(a, b)?;
        self.apply_cnot(b, a)?;
        self.apply_cnot(a, b)
    }

    /// Measure qubit `a` in the Z basis, collapsing the tableau.
    pub fn measure(&mut self, a: usize) -> StateResult<u8> {
        self.check(a)?;
        let n = self.num_qubits;

        if let Some(p) = (n..2 * n).find(|&p| self.x[p][a]) {
            // Random outcome: some stabilizer anticommutes with Z_a.
            for i in self.rows() {
                if i != p && self.x[i][a] {
                    self.rowsum(i, p);
                }
            }
            self.copy_row(p - n, p);
            self.x[p].fill(false);
            self.z[p].fill(false);
            self.z[p][a] = true;
            self.r[p] = self.rng.gen_bool(0.5);
            return Ok(u8::from(self.r[p]));
        }

        let scratch = 2 * n;
        self.x[scratch].fill(false);
        self.z[scratch].fill(false);
        self.r[scratch] = false;
        for i in 0..n {
            if self.x[i][a] {
                self.rowsum(scratch, i + n);
            }
        }
        Ok(u8::from(self.r[scratch]))
    }

    fn copy_row(&mut self, dst: usize, src: usize) {
        let (x, z) = (self.x[src].clone(), self.z[src].clone());
        self.x[dst] = x;
        self.z[dst] = z;
        self.r[dst] = self.r[src];
    }

    /// Row `h` ← row `h` · row `i`, tracking the sign.
    fn rowsum(&mut self, h: usize, i: usize) {
        let mut exponent: i32 = 2 * i32::from(self.r[h]) + 2 * i32::from(self.r[i]);
        for j in 0..self.num_qubits {
            exponent += phase_exponent(self.x[i][j], self.z[i][j], self.x[h][j], self.z[h][j]);
        }
        self.r[h] = exponent.rem_euclid(4) == 2;
        for j in 0..self.num_qubits {
            self.x[h][j] ^= self.x[i][j];
            self.z[h][j] ^= self.z[i][j];
        }
    }

    fn check(&self, q: usize) -> StateResult<()> {
        if q >= self.num_qubits {
            return Err(StateError::QubitOutOfRange {
                qubit: q,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    fn check_pair(&self, a: usize, b: usize) -> StateResult<()> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Err(StateError::DuplicateQubit(a));
        }
        Ok(())
    }
}

/// Exponent of i picked up when multiplying Pauli (x1,z1) by (x2,z2).
fn phase_exponent(x1: bool, z1: bool, x2: bool, z2: bool) -> i32 {
    let (x2, z2) = (i32::from(x2), i32::from(z2));
    match (x1, z1) {
        (false, false) => 0,
        (true, true) => z2 - x2,
        (true, false) => z2 * (2 * x2 - 1),
        (false, true) => x2 * (1 - 2 * z2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_state_measures_zero() {
        let mut t = Tableau::seeded(3, 1);
        for q in 0..3 {
            assert_eq!(t.measure(q).unwrap(), 0);
        }
    }

    #[test]
    fn test_x_flips() {
        let mut t = Tableau::seeded(2, 1);
        t.apply_x(1).unwrap();
        assert_eq!(t.measure(0).unwrap(), 0);
        assert_eq!(t.measure(1).unwrap(), 1);
    }

    #[test]
    fn test_hzh_is_x() {
        let mut t = Tableau::seeded(1, 1);
        t.apply_h(0).unwrap();
        t.apply_z(0).unwrap();
        t.apply_h(0).unwrap();
        assert_eq!(t.measure(0).unwrap(), 1);
    }

    #[test]
    fn test_ss_is_z() {
        // H S S H |0⟩ = H Z H |0⟩ = X |0⟩
        let mut t = Tableau::seeded(1, 1);
        t.apply_h(0).unwrap();
        t.apply_s(0).unwrap();
        t.apply_s(0).unwrap();
        t.apply_h(0).unwrap();
        assert_eq!(t.measure(0).unwrap(), 1);
    }

    #[test]
    fn test_bell_correlation() {
        for seed in 0..20 {
            let mut t = Tableau::seeded(2, seed);
            t.apply_h(0).unwrap();
            t.apply_cnot(0, 1).unwrap();
            let a = t.measure(0).unwrap();
            let b = t.measure(1).unwrap();
            assert_eq!(a, b);
            // Repeat measurement is stable.
            assert_eq!(t.measure(0).unwrap(), a);
        }
    }

    #[test]
    fn test_swap_and_cz() {
        let mut t = Tableau::seeded(2, 3);
        t.apply_x(0).unwrap();
        t.apply_swap(0, 1).unwrap();
        assert_eq!(t.measure(0).unwrap(), 0);
        assert_eq!(t.measure(1).unwrap(), 1);

        // CZ between |+⟩ and |1⟩ acts as Z on the first qubit.
        let mut t = Tableau::seeded(2, 3);
        t.apply_h(0).unwrap();
        t.apply_x(1).unwrap();
        t.apply_cz(0, 1).unwrap();
        t.apply_h(0).unwrap();
        assert_eq!(t.measure(0).unwrap(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut t = Tableau::seeded(1, 0);
        assert!(matches!(
            t.apply_h(1),
            Err(StateError::QubitOutOfRange { qubit: 1, .. })
        ));
        assert!(matches!(
            Tableau::seeded(2, 0).apply_cnot(0, 0),
            Err(StateError::DuplicateQubit(0))
        ));
    }
}
