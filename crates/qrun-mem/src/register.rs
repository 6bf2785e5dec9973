//! Quantum and classical registers.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use num_complex::Complex64;
use qrun_state::StateEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MemError, MemResult};
use crate::persist;

/// Manager-issued identifier of a quantum register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QRegId(pub usize);

impl fmt::Display for QRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Manager-issued identifier of a classical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CRegId(pub usize);

impl fmt::Display for CRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Whether a register has built its amplitude storage yet.
#[derive(Debug)]
enum EngineSlot {
    Unmaterialized,
    Materialized(StateEngine),
}

/// A quantum register: identity, usage metrics and a lazily built engine.
///
/// No amplitude memory is allocated until the first gate, measurement,
/// compression or persistence call. Read accessors answer for |0…0⟩
/// without materializing.
#[derive(Debug)]
pub struct QRegister {
    id: QRegId,
    num_qubits: usize,
    engine: EngineSlot,
    seed: Option<u64>,
    op_count: usize,
    started: Instant,
    created_at: DateTime<Utc>,
}

impl QRegister {
    pub(crate) fn new(id: QRegId, num_qubits: usize, seed: Option<u64>) -> Self {
        Self {
            id,
            num_qubits,
            engine: EngineSlot::Unmaterialized,
            seed,
            op_count: 0,
            started: Instant::now(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> QRegId {
        self.id
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes the register holds once materialized.
    pub fn dimension(&self) -> usize {
        1 << self.num_qubits
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.engine, EngineSlot::Materialized(_))
    }

    /// Run `f` on the engine, materializing it on first use.
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut StateEngine) -> R) -> R {
        match &mut self.engine {
            EngineSlot::Materialized(engine) => f(engine),
            EngineSlot::Unmaterialized => {
                let mut engine = match self.seed {
                    Some(seed) => StateEngine::seeded(self.num_qubits, seed),
                    None => StateEngine::new(self.num_qubits),
                };
                debug!(register = %self.id, qubits = self.num_qubits, "materialized state engine");
                let out = f(&mut engine);
                self.engine = EngineSlot::Materialized(engine);
                out
            }
        }
    }

    // =========================================================================
    // Gates and measurement (each counts as an operation)
    // =========================================================================

    pub fn h(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_h(q))?)
    }

    pub fn x(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_x(q))?)
    }

    pub fn y(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_y(q))?)
    }

    pub fn z(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_z(q))?)
    }

    pub fn rx(&mut self, q: usize, theta: f64) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_rx(q, theta))?)
    }

    pub fn ry(&mut self, q: usize, theta: f64) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_ry(q, theta))?)
    }

    pub fn rz(&mut self, q: usize, theta: f64) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_rz(q, theta))?)
    }

    pub fn s(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_s(q))?)
    }

    pub fn t(&mut self, q: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_t(q))?)
    }

    pub fn cnot(&mut self, control: usize, target: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_cnot(control, target))?)
    }

    pub fn cz(&mut self, control: usize, target: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_cz(control, target))?)
    }

    pub fn ccnot(&mut self, c1: usize, c2: usize, target: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_ccnot(c1, c2, target))?)
    }

    pub fn swap(&mut self, a: usize, b: usize) -> MemResult<()> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.apply_swap(a, b))?)
    }

    pub fn measure(&mut self, q: usize) -> MemResult<u8> {
        self.op_count += 1;
        Ok(self.with_engine(|e| e.measure(q))?)
    }

    /// Joint measurement; counts one operation per measured qubit.
    pub fn measure_many(&mut self, qubits: &[usize]) -> MemResult<usize> {
        self.op_count += qubits.len();
        Ok(self.with_engine(|e| e.measure_many(qubits))?)
    }

    // =========================================================================
    // State management
    // =========================================================================

    /// Return to |0…0⟩ and restart the metrics window.
    pub fn reset(&mut self) {
        if let EngineSlot::Materialized(engine) = &mut self.engine {
            engine.reset();
        }
        self.reset_metrics();
    }

    /// Return to |0…0⟩ as one counted operation, keeping the metrics window.
    pub fn reset_state(&mut self) {
        self.op_count += 1;
        if let EngineSlot::Materialized(engine) = &mut self.engine {
            engine.reset();
        }
    }

    /// Replace the state with a fresh `num_qubits`-qubit |0…0⟩. The
    /// manager checks the width; see [`MemoryManager::resize_qregister`].
    ///
    /// [`MemoryManager::resize_qregister`]: crate::MemoryManager::resize_qregister
    pub(crate) fn resize(&mut self, num_qubits: usize) {
        self.num_qubits = num_qubits;
        self.engine = EngineSlot::Unmaterialized;
    }

    pub fn amplitude(&self, index: usize) -> Complex64 {
        match &self.engine {
            EngineSlot::Materialized(engine) => engine.amplitude(index),
            EngineSlot::Unmaterialized if index == 0 => Complex64::new(1.0, 0.0),
            EngineSlot::Unmaterialized => Complex64::new(0.0, 0.0),
        }
    }

    pub fn nnz(&self) -> usize {
        match &self.engine {
            EngineSlot::Materialized(engine) => engine.nnz(),
            EngineSlot::Unmaterialized => 1,
        }
    }

    pub fn is_sparse(&self) -> bool {
        match &self.engine {
            EngineSlot::Materialized(engine) => engine.is_sparse(),
            EngineSlot::Unmaterialized => false,
        }
    }

    pub fn compress(&mut self) {
        self.with_engine(StateEngine::compress);
    }

    pub fn decompress(&mut self) {
        self.with_engine(StateEngine::decompress);
    }

    /// Copy of the full amplitude vector. Does not materialize.
    pub fn export_state(&self) -> Vec<Complex64> {
        match &self.engine {
            EngineSlot::Materialized(engine) => engine.to_dense_vec(),
            EngineSlot::Unmaterialized => {
                let mut state = vec![Complex64::new(0.0, 0.0); self.dimension()];
                state[0] = Complex64::new(1.0, 0.0);
                state
            }
        }
    }

    /// Overwrite the state. The register is untouched unless the length
    /// matches.
    pub fn import_state(&mut self, state: &[Complex64]) -> MemResult<()> {
        self.check_length(state.len())?;
        self.with_engine(|e| e.load_dense(state.to_vec()))?;
        Ok(())
    }

    fn check_length(&self, found: usize) -> MemResult<()> {
        if found != self.dimension() {
            return Err(MemError::LengthMismatch {
                expected: self.dimension(),
                found,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the state to `path` in the saved-state format. Forces dense
    /// storage first.
    pub fn save_to_file(&mut self, path: &Path) -> MemResult<()> {
        let state = self.with_engine(|e| {
            e.decompress();
            e.to_dense_vec()
        });
        persist::write_file(path, &state)?;
        debug!(register = %self.id, path = %path.display(), "saved state");
        Ok(())
    }

    /// Load a state saved by [`save_to_file`](Self::save_to_file).
    ///
    /// Fails without mutating the register if the file is unreadable,
    /// malformed, or holds a different number of amplitudes.
    pub fn load_from_file(&mut self, path: &Path) -> MemResult<()> {
        let state = persist::read_file(path)?;
        self.check_length(state.len())?;
        self.with_engine(|e| e.load_dense(state))?;
        debug!(register = %self.id, path = %path.display(), "loaded state");
        Ok(())
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Operations since creation or the last metrics reset.
    pub fn ops(&self) -> usize {
        self.op_count
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn reset_metrics(&mut self) {
        self.op_count = 0;
        self.started = Instant::now();
    }
}

/// A fixed-width classical bit register.
#[derive(Debug, Clone)]
pub struct CRegister {
    id: CRegId,
    bits: Vec<bool>,
}

impl CRegister {
    pub(crate) fn new(id: CRegId, len: usize) -> Self {
        Self {
            id,
            bits: vec![false; len],
        }
    }

    pub fn id(&self) -> CRegId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    pub fn set(&mut self, index: usize, bit: bool) -> MemResult<()> {
        let len = self.bits.len();
        let slot = self
            .bits
            .get_mut(index)
            .ok_or(MemError::BitOutOfRange { index, len })?;
        *slot = bit;
        Ok(())
    }

    /// Bits read as an integer, bit `j` weighted 2^j.
    ///
    /// `None` if a set bit lies at index 64 or above. Unset high bits are
    /// fine, so wide registers holding small values still convert.
    pub fn value(&self) -> Option<u64> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit)
            .try_fold(0u64, |acc, (j, _)| {
                u32::try_from(j)
                    .ok()
                    .and_then(|shift| 1u64.checked_shl(shift))
                    .map(|weight| acc | weight)
            })
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_materialization() {
        let mut reg = QRegister::new(QRegId(0), 3, Some(1));
        assert!(!reg.is_materialized());
        assert_eq!(reg.nnz(), 1);
        assert_eq!(reg.amplitude(0), Complex64::new(1.0, 0.0));
        assert_eq!(reg.export_state().len(), 8);
        assert!(!reg.is_materialized());

        reg.x(0).unwrap();
        assert!(reg.is_materialized());
        assert_eq!(reg.amplitude(1), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_op_counter() {
        let mut reg = QRegister::new(QRegId(0), 2, Some(1));
        reg.h(0).unwrap();
        reg.cnot(0, 1).unwrap();
        reg.measure_many(&[0, 1]).unwrap();
        assert_eq!(reg.ops(), 4);

        reg.reset();
        assert_eq!(reg.ops(), 0);
        assert_eq!(reg.amplitude(0), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_failed_gate_still_counts() {
        let mut reg = QRegister::new(QRegId(0), 1, Some(1));
        assert!(matches!(reg.h(5), Err(MemError::State(_))));
        assert_eq!(reg.ops(), 1);
    }

    #[test]
    fn test_resize_replaces_state() {
        let mut reg = QRegister::new(QRegId(0), 1, Some(1));
        reg.x(0).unwrap();
        reg.resize(3);
        assert_eq!(reg.num_qubits(), 3);
        assert_eq!(reg.export_state().len(), 8);
        assert_eq!(reg.amplitude(0), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_import_rejects_mismatch() {
        let mut reg = QRegister::new(QRegId(0), 2, Some(1));
        reg.x(1).unwrap();
        let err = reg.import_state(&[Complex64::new(1.0, 0.0); 2]).unwrap_err();
        assert!(matches!(
            err,
            MemError::LengthMismatch {
                expected: 4,
                found: 2
            }
        ));
        assert_eq!(reg.amplitude(2), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_wide_cregister_value() {
        let mut c = CRegister::new(CRegId(0), 100);
        c.set(3, true).unwrap();
        assert_eq!(c.value(), Some(0b1000));
        c.set(63, true).unwrap();
        assert_eq!(c.value(), Some((1 << 63) | 0b1000));
        c.set(70, true).unwrap();
        assert_eq!(c.value(), None);
        assert_eq!(c.get(70), Some(true));
        c.clear();
        assert_eq!(c.value(), Some(0));
    }

    #[test]
    fn test_cregister_bits() {
        let mut c = CRegister::new(CRegId(0), 3);
        c.set(0, true).unwrap();
        c.set(2, true).unwrap();
        assert_eq!(c.value(), Some(0b101));
        assert_eq!(c.get(1), Some(false));
        assert!(matches!(
            c.set(3, true),
            Err(MemError::BitOutOfRange { index: 3, len: 3 })
        ));
        c.clear();
        assert_eq!(c.value(), Some(0));
    }
}
