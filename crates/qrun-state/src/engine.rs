//! Statevector simulation engine.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_4;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::{StateError, StateResult};
use crate::kernel::{self, PairKernel, PhaseKernel};

/// Magnitude below which an amplitude counts as zero.
///
/// Sparse storage drops such entries, `compress()` prunes them, and
/// measurement branches whose probability falls below this value are
/// never sampled.
pub const EPSILON: f64 = 1e-12;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Storage currently backing a [`StateEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Full 2^n amplitude array.
    Dense,
    /// Map of near-nonzero amplitudes.
    Sparse,
}

#[derive(Debug, Clone)]
enum Amplitudes {
    Dense(Vec<Complex64>),
    Sparse(FxHashMap<usize, Complex64>),
}

impl Amplitudes {
    fn get(&self, index: usize) -> Complex64 {
        match self {
            Amplitudes::Dense(v) => v[index],
            Amplitudes::Sparse(m) => m.get(&index).copied().unwrap_or(ZERO),
        }
    }

    /// Iterate the near-nonzero entries, whatever the storage.
    fn nonzero(&self) -> Box<dyn Iterator<Item = (usize, Complex64)> + '_> {
        match self {
            Amplitudes::Dense(v) => Box::new(
                v.iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, a)| a.norm() >= EPSILON),
            ),
            Amplitudes::Sparse(m) => Box::new(m.iter().map(|(&i, &a)| (i, a))),
        }
    }
}

fn put_sparse(map: &mut FxHashMap<usize, Complex64>, index: usize, value: Complex64) {
    if value.norm() < EPSILON {
        map.remove(&index);
    } else {
        map.insert(index, value);
    }
}

/// One n-qubit quantum state.
///
/// Bit `q` of an amplitude index is the value of qubit `q`. The engine
/// starts in |0…0⟩ with dense storage and owns the RNG used for
/// measurement, so a seeded engine replays the same outcomes.
#[derive(Debug, Clone)]
pub struct StateEngine {
    num_qubits: usize,
    amps: Amplitudes,
    rng: StdRng,
}

impl StateEngine {
    /// Create a |0…0⟩ state whose measurements draw from OS entropy.
    ///
    /// # Panics
    ///
    /// Panics if `2^num_qubits` does not fit in `usize`.
    pub fn new(num_qubits: usize) -> Self {
        Self::with_rng(num_qubits, StdRng::from_entropy())
    }

    /// Create a |0…0⟩ state with a deterministic measurement RNG.
    pub fn seeded(num_qubits: usize, seed: u64) -> Self {
        Self::with_rng(num_qubits, StdRng::seed_from_u64(seed))
    }

    /// Create a |0…0⟩ state that starts in sparse storage.
    ///
    /// Unlike `seeded` followed by `compress`, this never allocates the
    /// dense array, so wide but sparse states (GHZ-like) stay cheap.
    pub fn sparse_seeded(num_qubits: usize, seed: u64) -> Self {
        let mut map = FxHashMap::default();
        map.insert(0, ONE);
        Self {
            num_qubits,
            amps: Amplitudes::Sparse(map),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn with_rng(num_qubits: usize, rng: StdRng) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            num_qubits,
            amps: Amplitudes::Dense(amplitudes),
            rng,
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert-space dimension, 2^n.
    pub fn dimension(&self) -> usize {
        1 << self.num_qubits
    }

    /// Current storage kind.
    pub fn representation(&self) -> Representation {
        match self.amps {
            Amplitudes::Dense(_) => Representation::Dense,
            Amplitudes::Sparse(_) => Representation::Sparse,
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.representation() == Representation::Sparse
    }

    /// Read one amplitude. Out-of-range indices read as zero.
    pub fn amplitude(&self, index: usize) -> Complex64 {
        if index >= self.dimension() {
            return ZERO;
        }
        self.amps.get(index)
    }

    /// Count of near-nonzero amplitudes.
    pub fn nnz(&self) -> usize {
        match &self.amps {
            Amplitudes::Dense(_) => self.amps.nonzero().count(),
            Amplitudes::Sparse(m) => m.len(),
        }
    }

    /// Σ‖amplitude‖².
    pub fn norm_sqr(&self) -> f64 {
        self.amps.nonzero().map(|(_, a)| a.norm_sqr()).sum()
    }

    // =========================================================================
    // Gates
    // =========================================================================

    pub fn apply_h(&mut self, q: usize) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::hadamard()));
        Ok(())
    }

    pub fn apply_x(&mut self, q: usize) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::pauli_x()));
        Ok(())
    }

    pub fn apply_y(&mut self, q: usize) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::pauli_y()));
        Ok(())
    }

    pub fn apply_z(&mut self, q: usize) -> StateResult<()> {
        let mask = self.check(q)?;
        self.apply_phase(&PhaseKernel::new(mask, -ONE));
        Ok(())
    }

    pub fn apply_rx(&mut self, q: usize, theta: f64) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::rx(theta)));
        Ok(())
    }

    pub fn apply_ry(&mut self, q: usize, theta: f64) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::ry(theta)));
        Ok(())
    }

    pub fn apply_rz(&mut self, q: usize, theta: f64) -> StateResult<()> {
        self.check(q)?;
        self.apply_pair(&PairKernel::single(q, kernel::rz(theta)));
        Ok(())
    }

    /// Phase gate S = diag(1, i).
    pub fn apply_s(&mut self, q: usize) -> StateResult<()> {
        let mask = self.check(q)?;
        self.apply_phase(&PhaseKernel::new(mask, Complex64::new(0.0, 1.0)));
        Ok(())
    }

    /// T = diag(1, e^{iπ/4}).
    pub fn apply_t(&mut self, q: usize) -> StateResult<()> {
        let mask = self.check(q)?;
        self.apply_phase(&PhaseKernel::new(mask, Complex64::from_polar(1.0, FRAC_PI_4)));
        Ok(())
    }

    pub fn apply_cnot(&mut self, control: usize, target: usize) -> StateResult<()> {
        self.check_distinct(&[control, target])?;
        let k = PairKernel::controlled(1 << control, target, kernel::pauli_x());
        self.apply_pair(&k);
        Ok(())
    }

    pub fn apply_cz(&mut self, control: usize, target: usize) -> StateResult<()> {
        self.check_distinct(&[control, target])?;
        self.apply_phase(&PhaseKernel::new((1 << control) | (1 << target), -ONE));
        Ok(())
    }

    /// Toffoli gate.
    pub fn apply_ccnot(&mut self, c1: usize, c2: usize, target: usize) -> StateResult<()> {
        self.check_distinct(&[c1, c2, target])?;
        let k = PairKernel::controlled((1 << c1) | (1 << c2), target, kernel::pauli_x());
        self.apply_pair(&k);
        Ok(())
    }

    pub fn apply_swap(&mut self, a: usize, b: usize) -> StateResult<()> {
        self.check_distinct(&[a, b])?;
        self.apply_pair(&PairKernel::exchange(a, b));
        Ok(())
    }

    fn apply_pair(&mut self, k: &PairKernel) {
        match &mut self.amps {
            Amplitudes::Dense(v) => {
                for i in 0..v.len() {
                    if k.selects(i) {
                        let j = i ^ k.flip;
                        let (a, b) = k.mix(v[i], v[j]);
                        v[i] = a;
                        v[j] = b;
                    }
                }
            }
            Amplitudes::Sparse(m) => {
                let bases: FxHashSet<usize> = m.keys().filter_map(|&i| k.base_of(i)).collect();
                for i in bases {
                    let j = i ^ k.flip;
                    let a = m.get(&i).copied().unwrap_or(ZERO);
                    let b = m.get(&j).copied().unwrap_or(ZERO);
                    let (a, b) = k.mix(a, b);
                    put_sparse(m, i, a);
                    put_sparse(m, j, b);
                }
            }
        }
    }

    fn apply_phase(&mut self, k: &PhaseKernel) {
        match &mut self.amps {
            Amplitudes::Dense(v) => {
                for (i, amp) in v.iter_mut().enumerate() {
                    if k.hits(i) {
                        *amp *= k.phase;
                    }
                }
            }
            Amplitudes::Sparse(m) => {
                for (&i, amp) in m.iter_mut() {
                    if k.hits(i) {
                        *amp *= k.phase;
                    }
                }
            }
        }
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// P(qubit q reads 1).
    pub fn probability_of_one(&self, q: usize) -> StateResult<f64> {
        let mask = self.check(q)?;
        Ok(self
            .amps
            .nonzero()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Measure one qubit in the computational basis and collapse the state.
    pub fn measure(&mut self, q: usize) -> StateResult<u8> {
        let mask = self.check(q)?;
        let p1 = self.probability_of_one(q)?;
        let p0 = 1.0 - p1;

        let outcome = if p1 < EPSILON {
            0
        } else if p0 < EPSILON {
            1
        } else {
            let r: f64 = self.rng.r#gen();
            u8::from(r < p1)
        };

        let (pattern, probability) = if outcome == 1 { (mask, p1) } else { (0, p0) };
        self.collapse(mask, pattern, probability);
        trace!(qubit = q, outcome, p1, "measured qubit");
        Ok(outcome)
    }

    /// Jointly measure `qubits` with a single draw.
    ///
    /// Bit `j` of the returned value is the outcome of `qubits[j]`. The
    /// distribution equals measuring the qubits one at a time in order.
    pub fn measure_many(&mut self, qubits: &[usize]) -> StateResult<usize> {
        self.check_distinct(qubits)?;
        if qubits.is_empty() {
            return Ok(0);
        }

        let outcome_of = |index: usize| -> usize {
            qubits
                .iter()
                .enumerate()
                .fold(0, |acc, (j, &q)| acc | (((index >> q) & 1) << j))
        };

        let mut distribution: BTreeMap<usize, f64> = BTreeMap::new();
        for (i, a) in self.amps.nonzero() {
            *distribution.entry(outcome_of(i)).or_insert(0.0) += a.norm_sqr();
        }
        distribution.retain(|_, p| *p >= EPSILON);

        let total: f64 = distribution.values().sum();
        let r: f64 = self.rng.r#gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (&value, &p) in &distribution {
            cumulative += p;
            chosen = Some((value, p));
            if r < cumulative {
                break;
            }
        }
        // An all-zero state has nothing to sample; report |0…0⟩ untouched.
        let Some((value, probability)) = chosen else {
            return Ok(0);
        };

        let mut mask = 0;
        let mut pattern = 0;
        for (j, &q) in qubits.iter().enumerate() {
            mask |= 1 << q;
            if (value >> j) & 1 == 1 {
                pattern |= 1 << q;
            }
        }
        self.collapse(mask, pattern, probability);
        trace!(?qubits, value, probability, "joint measurement");
        Ok(value)
    }

    /// Keep amplitudes with `index & mask == pattern` and renormalize.
    fn collapse(&mut self, mask: usize, pattern: usize, probability: f64) {
        let scale = 1.0 / probability.sqrt();
        match &mut self.amps {
            Amplitudes::Dense(v) => {
                for (i, amp) in v.iter_mut().enumerate() {
                    if i & mask == pattern {
                        *amp *= scale;
                    } else {
                        *amp = ZERO;
                    }
                }
            }
            Amplitudes::Sparse(m) => {
                m.retain(|&i, _| i & mask == pattern);
                for amp in m.values_mut() {
                    *amp *= scale;
                }
            }
        }
    }

    /// Restore |0…0⟩, keeping the current representation and RNG stream.
    pub fn reset(&mut self) {
        match &mut self.amps {
            Amplitudes::Dense(v) => {
                v.fill(ZERO);
                v[0] = ONE;
            }
            Amplitudes::Sparse(m) => {
                m.clear();
                m.insert(0, ONE);
            }
        }
    }

    // =========================================================================
    // Representation switching
    // =========================================================================

    /// Switch to sparse storage, dropping amplitudes below [`EPSILON`].
    ///
    /// This is a declared approximation: the dropped mass is not
    /// redistributed.
    pub fn compress(&mut self) {
        let map: FxHashMap<usize, Complex64> = self.amps.nonzero().collect();
        debug!(
            num_qubits = self.num_qubits,
            nnz = map.len(),
            "compressed state to sparse"
        );
        self.amps = Amplitudes::Sparse(map);
    }

    /// Switch to dense storage. Absent sparse keys become zero.
    pub fn decompress(&mut self) {
        if let Amplitudes::Sparse(m) = &self.amps {
            let mut v = vec![ZERO; self.dimension()];
            for (&i, &a) in m {
                v[i] = a;
            }
            debug!(num_qubits = self.num_qubits, "decompressed state to dense");
            self.amps = Amplitudes::Dense(v);
        }
    }

    /// Copy the state out as a full dense vector, without changing storage.
    pub fn to_dense_vec(&self) -> Vec<Complex64> {
        match &self.amps {
            Amplitudes::Dense(v) => v.clone(),
            Amplitudes::Sparse(m) => {
                let mut v = vec![ZERO; self.dimension()];
                for (&i, &a) in m {
                    v[i] = a;
                }
                v
            }
        }
    }

    /// Replace the state with `amplitudes`, switching to dense storage.
    ///
    /// Fails without touching the state if the length is not 2^n.
    pub fn load_dense(&mut self, amplitudes: Vec<Complex64>) -> StateResult<()> {
        if amplitudes.len() != self.dimension() {
            return Err(StateError::LengthMismatch {
                expected: self.dimension(),
                found: amplitudes.len(),
            });
        }
        self.amps = Amplitudes::Dense(amplitudes);
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn check(&self, q: usize) -> StateResult<usize> {
        if q >= self.num_qubits {
            return Err(StateError::QubitOutOfRange {
                qubit: q,
                num_qubits: self.num_qubits,
            });
        }
        Ok(1 << q)
    }

    fn check_distinct(&self, qubits: &[usize]) -> StateResult<()> {
        let mut seen = 0usize;
        for &q in qubits {
            let mask = self.check(q)?;
            if seen & mask != 0 {
                return Err(StateError::DuplicateQubit(q));
            }
            seen |= mask;
        }
        Ok(())
    }
}
