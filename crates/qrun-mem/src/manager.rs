//! Register tables, the resonance-zone cache and checkpointing.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use num_complex::Complex64;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{MemError, MemResult};
use crate::register::{CRegId, CRegister, QRegId, QRegister};

/// Shared handle to a live quantum register.
pub type QRegHandle = Arc<Mutex<QRegister>>;

/// Shared handle to a live classical register.
pub type CRegHandle = Arc<Mutex<CRegister>>;

/// Memory manager limits and seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Widest quantum register the manager will create.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,

    /// Base seed for register engines. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_qubits() -> usize {
    30
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            seed: None,
        }
    }
}

/// Id-indexed slots with a smallest-first free pool.
#[derive(Debug)]
struct SlotTable<T> {
    slots: Vec<Option<Arc<Mutex<T>>>>,
    allocs: Vec<usize>,
    free: BinaryHeap<Reverse<usize>>,
}

impl<T> SlotTable<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            allocs: Vec::new(),
            free: BinaryHeap::new(),
        }
    }

    fn next_id(&self) -> usize {
        match self.free.peek() {
            Some(Reverse(id)) => *id,
            None => self.slots.len(),
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(usize) -> T) -> usize {
        let id = match self.free.pop() {
            Some(Reverse(id)) => id,
            None => {
                self.slots.push(None);
                self.allocs.push(0);
                self.slots.len() - 1
            }
        };
        self.slots[id] = Some(Arc::new(Mutex::new(build(id))));
        self.allocs[id] += 1;
        id
    }

    fn get(&self, id: usize) -> Option<&Arc<Mutex<T>>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn is_live(&self, id: usize) -> bool {
        self.get(id).is_some()
    }

    fn release(&mut self, id: usize) -> bool {
        match self.slots.get_mut(id).and_then(Option::take) {
            Some(_) => {
                self.free.push(Reverse(id));
                true
            }
            None => false,
        }
    }

    fn live(&self) -> impl Iterator<Item = &Arc<Mutex<T>>> {
        self.slots.iter().flatten()
    }

    fn live_count(&self) -> usize {
        self.live().count()
    }

    fn allocs(&self, id: usize) -> usize {
        self.allocs.get(id).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
struct Tables {
    qregs: SlotTable<QRegister>,
    cregs: SlotTable<CRegister>,
    seed_sequence: u64,
}

/// Owner of every register, the resonance-zone cache and the checkpoint
/// policy.
///
/// All methods take `&self`; wrap the manager in an `Arc` to share it
/// between task bodies. The id tables sit behind one lock, each register
/// behind its own, and the resonance cache behind a third.
#[derive(Debug)]
pub struct MemoryManager {
    config: MemoryConfig,
    tables: Mutex<Tables>,
    resonance: Mutex<FxHashMap<String, Arc<[Complex64]>>>,
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl MemoryManager {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            tables: Mutex::new(Tables {
                qregs: SlotTable::new(),
                cregs: SlotTable::new(),
                seed_sequence: 0,
            }),
            resonance: Mutex::new(FxHashMap::default()),
        }
    }

    /// A manager whose registers draw reproducible measurement outcomes.
    pub fn seeded(seed: u64) -> Self {
        Self::new(MemoryConfig {
            seed: Some(seed),
            ..MemoryConfig::default()
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    #[instrument(skip(self))]
    pub fn create_qregister(&self, num_qubits: usize) -> MemResult<QRegId> {
        self.check_width(num_qubits)?;
        let mut tables = self.tables.lock();
        let id = self.insert_qregister(&mut tables, num_qubits);
        debug!(register = %id, "created quantum register");
        Ok(id)
    }

    pub fn create_cregister(&self, num_bits: usize) -> CRegId {
        let id = CRegId(
            self.tables
                .lock()
                .cregs
                .insert_with(|id| CRegister::new(CRegId(id), num_bits)),
        );
        debug!(register = %id, bits = num_bits, "created classical register");
        id
    }

    /// Create one quantum register per entry of `sizes`. Nothing is created
    /// if any size exceeds the limit.
    pub fn create_qregisters(&self, sizes: &[usize]) -> MemResult<Vec<QRegId>> {
        for &n in sizes {
            self.check_width(n)?;
        }
        let mut tables = self.tables.lock();
        Ok(sizes
            .iter()
            .map(|&n| self.insert_qregister(&mut tables, n))
            .collect())
    }

    pub fn create_cregisters(&self, sizes: &[usize]) -> Vec<CRegId> {
        let mut tables = self.tables.lock();
        sizes
            .iter()
            .map(|&n| CRegId(tables.cregs.insert_with(|id| CRegister::new(CRegId(id), n))))
            .collect()
    }

    fn check_width(&self, num_qubits: usize) -> MemResult<()> {
        // 2^n amplitudes must stay addressable whatever the configured limit.
        let max = self.config.max_qubits.min(usize::BITS as usize - 1);
        if num_qubits > max {
            return Err(MemError::TooManyQubits {
                requested: num_qubits,
                max,
            });
        }
        Ok(())
    }

    /// Replace register `id` with a fresh `num_qubits`-qubit |0…0⟩, subject
    /// to the same width limit as creation. The register keeps its id and
    /// metrics.
    pub fn resize_qregister(&self, id: QRegId, num_qubits: usize) -> MemResult<()> {
        self.check_width(num_qubits)?;
        self.with_qreg(id, |reg| reg.resize(num_qubits))?;
        debug!(register = %id, qubits = num_qubits, "resized quantum register");
        Ok(())
    }

    fn insert_qregister(&self, tables: &mut Tables, num_qubits: usize) -> QRegId {
        let seed = self
            .config
            .seed
            .map(|base| base.wrapping_add(tables.seed_sequence));
        tables.seed_sequence += 1;
        QRegId(
            tables
                .qregs
                .insert_with(|id| QRegister::new(QRegId(id), num_qubits, seed)),
        )
    }

    // =========================================================================
    // Release
    // =========================================================================

    pub fn release_qregister(&self, id: QRegId) -> MemResult<()> {
        if !self.tables.lock().qregs.release(id.0) {
            return Err(MemError::QRegisterNotFound(id));
        }
        debug!(register = %id, "released quantum register");
        Ok(())
    }

    pub fn release_cregister(&self, id: CRegId) -> MemResult<()> {
        if !self.tables.lock().cregs.release(id.0) {
            return Err(MemError::CRegisterNotFound(id));
        }
        debug!(register = %id, "released classical register");
        Ok(())
    }

    /// Release every id, or none of them if any is not live or repeated.
    pub fn release_qregisters(&self, ids: &[QRegId]) -> MemResult<()> {
        let mut tables = self.tables.lock();
        let mut seen = FxHashSet::default();
        for &id in ids {
            if !tables.qregs.is_live(id.0) || !seen.insert(id) {
                return Err(MemError::QRegisterNotFound(id));
            }
        }
        for &id in ids {
            tables.qregs.release(id.0);
        }
        Ok(())
    }

    /// Release every id, or none of them if any is not live or repeated.
    pub fn release_cregisters(&self, ids: &[CRegId]) -> MemResult<()> {
        let mut tables = self.tables.lock();
        let mut seen = FxHashSet::default();
        for &id in ids {
            if !tables.cregs.is_live(id.0) || !seen.insert(id) {
                return Err(MemError::CRegisterNotFound(id));
            }
        }
        for &id in ids {
            tables.cregs.release(id.0);
        }
        Ok(())
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn qreg(&self, id: QRegId) -> MemResult<QRegHandle> {
        self.tables
            .lock()
            .qregs
            .get(id.0)
            .cloned()
            .ok_or(MemError::QRegisterNotFound(id))
    }

    pub fn creg(&self, id: CRegId) -> MemResult<CRegHandle> {
        self.tables
            .lock()
            .cregs
            .get(id.0)
            .cloned()
            .ok_or(MemError::CRegisterNotFound(id))
    }

    /// Run `f` on the locked register. The table lock is not held while `f`
    /// runs.
    pub fn with_qreg<R>(&self, id: QRegId, f: impl FnOnce(&mut QRegister) -> R) -> MemResult<R> {
        let handle = self.qreg(id)?;
        let mut reg = handle.lock();
        Ok(f(&mut reg))
    }

    pub fn with_creg<R>(&self, id: CRegId, f: impl FnOnce(&mut CRegister) -> R) -> MemResult<R> {
        let handle = self.creg(id)?;
        let mut reg = handle.lock();
        Ok(f(&mut reg))
    }

    pub fn qreg_allocs(&self, id: QRegId) -> usize {
        self.tables.lock().qregs.allocs(id.0)
    }

    pub fn creg_allocs(&self, id: CRegId) -> usize {
        self.tables.lock().cregs.allocs(id.0)
    }

    /// The id the next quantum allocation will receive.
    pub fn next_qreg_id(&self) -> QRegId {
        QRegId(self.tables.lock().qregs.next_id())
    }

    pub fn live_qregisters(&self) -> usize {
        self.tables.lock().qregs.live_count()
    }

    pub fn live_cregisters(&self) -> usize {
        self.tables.lock().cregs.live_count()
    }

    /// Estimated bytes held by live registers: 16 bytes per amplitude of
    /// every quantum register plus one `bool` per classical bit.
    pub fn memory_usage(&self) -> usize {
        let (qregs, cregs): (Vec<QRegHandle>, Vec<CRegHandle>) = {
            let tables = self.tables.lock();
            (
                tables.qregs.live().cloned().collect(),
                tables.cregs.live().cloned().collect(),
            )
        };
        let quantum: usize = qregs
            .iter()
            .map(|r| r.lock().dimension() * std::mem::size_of::<Complex64>())
            .sum();
        let classical: usize = cregs
            .iter()
            .map(|r| r.lock().len() * std::mem::size_of::<bool>())
            .sum();
        quantum + classical
    }

    // =========================================================================
    // State transfer
    // =========================================================================

    pub fn export_state(&self, id: QRegId) -> MemResult<Vec<Complex64>> {
        self.with_qreg(id, |reg| reg.export_state())
    }

    pub fn import_state(&self, id: QRegId, state: &[Complex64]) -> MemResult<()> {
        self.with_qreg(id, |reg| reg.import_state(state))?
    }

    /// Store a copy of the register's state under `key`, replacing any
    /// previous entry.
    pub fn save_resonance_zone(&self, id: QRegId, key: &str) -> MemResult<()> {
        let state: Arc<[Complex64]> = self.export_state(id)?.into();
        debug!(register = %id, key, amplitudes = state.len(), "saved resonance zone");
        self.resonance.lock().insert(key.to_owned(), state);
        Ok(())
    }

    /// Overwrite the register with the state stored under `key`.
    pub fn load_resonance_zone(&self, id: QRegId, key: &str) -> MemResult<()> {
        let state = self
            .resonance
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| MemError::ResonanceKeyMissing(key.to_owned()))?;
        self.import_state(id, &state)?;
        debug!(register = %id, key, "loaded resonance zone");
        Ok(())
    }

    pub fn has_resonance_zone(&self, key: &str) -> bool {
        self.resonance.lock().contains_key(key)
    }

    pub fn save_state_to_file(&self, id: QRegId, path: &Path) -> MemResult<()> {
        self.with_qreg(id, |reg| reg.save_to_file(path))?
    }

    pub fn load_state_from_file(&self, id: QRegId, path: &Path) -> MemResult<()> {
        self.with_qreg(id, |reg| reg.load_from_file(path))?
    }

    /// Save the register to `path` and restart its metrics if it has run at
    /// least `op_threshold` operations or `time_threshold` has elapsed.
    ///
    /// Returns whether a checkpoint was written.
    pub fn checkpoint_if_needed(
        &self,
        id: QRegId,
        op_threshold: usize,
        time_threshold: Duration,
        path: &Path,
    ) -> MemResult<bool> {
        let handle = self.qreg(id)?;
        let mut reg = handle.lock();
        let ops = reg.ops();
        let elapsed = reg.elapsed();
        if ops < op_threshold && elapsed < time_threshold {
            return Ok(false);
        }
        reg.save_to_file(path)?;
        reg.reset_metrics();
        info!(
            register = %id,
            ops,
            elapsed_secs = elapsed.as_secs_f64(),
            path = %path.display(),
            "checkpoint written"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_table_smallest_free_first() {
        let mut table: SlotTable<u8> = SlotTable::new();
        for _ in 0..4 {
            table.insert_with(|_| 0);
        }
        assert!(table.release(3));
        assert!(table.release(1));
        assert_eq!(table.next_id(), 1);
        assert_eq!(table.insert_with(|_| 0), 1);
        assert_eq!(table.insert_with(|_| 0), 3);
        assert_eq!(table.insert_with(|_| 0), 4);
        assert_eq!(table.allocs(1), 2);
        assert_eq!(table.allocs(4), 1);
        assert_eq!(table.allocs(99), 0);
    }

    #[test]
    fn test_slot_table_double_release() {
        let mut table: SlotTable<u8> = SlotTable::new();
        table.insert_with(|_| 0);
        assert!(table.release(0));
        assert!(!table.release(0));
        assert!(!table.release(7));
    }

    #[test]
    fn test_width_limit() {
        let mm = MemoryManager::new(MemoryConfig {
            max_qubits: 4,
            seed: Some(0),
        });
        assert!(mm.create_qregister(4).is_ok());
        assert!(matches!(
            mm.create_qregister(5),
            Err(MemError::TooManyQubits {
                requested: 5,
                max: 4
            })
        ));
        assert!(mm.create_qregisters(&[1, 9]).is_err());
        assert_eq!(mm.live_qregisters(), 1);
    }

    #[test]
    fn test_resize_respects_width_limit() {
        let mm = MemoryManager::new(MemoryConfig {
            max_qubits: 4,
            seed: Some(0),
        });
        let q = mm.create_qregister(2).unwrap();
        mm.with_qreg(q, |r| r.x(0)).unwrap().unwrap();

        assert!(matches!(
            mm.resize_qregister(q, 64),
            Err(MemError::TooManyQubits {
                requested: 64,
                max: 4
            })
        ));
        // A rejected resize leaves the register as it was.
        assert_eq!(mm.with_qreg(q, |r| r.num_qubits()).unwrap(), 2);
        assert_eq!(mm.export_state(q).unwrap()[1], Complex64::new(1.0, 0.0));
        assert_eq!(mm.memory_usage(), 4 * 16);

        mm.resize_qregister(q, 4).unwrap();
        assert_eq!(mm.with_qreg(q, |r| r.dimension()).unwrap(), 16);
        assert_eq!(mm.export_state(q).unwrap()[0], Complex64::new(1.0, 0.0));
        assert!(matches!(
            mm.resize_qregister(QRegId(9), 1),
            Err(MemError::QRegisterNotFound(QRegId(9)))
        ));
    }

    #[test]
    fn test_width_capped_by_address_space() {
        let mm = MemoryManager::new(MemoryConfig {
            max_qubits: 200,
            seed: None,
        });
        assert!(matches!(
            mm.create_qregister(64),
            Err(MemError::TooManyQubits { requested: 64, .. })
        ));
    }

    #[test]
    fn test_seeded_registers_differ() {
        let mm = MemoryManager::seeded(5);
        let a = mm.create_qregister(1).unwrap();
        let b = mm.create_qregister(1).unwrap();
        let mut outcomes = (Vec::new(), Vec::new());
        for _ in 0..32 {
            outcomes.0.push(
                mm.with_qreg(a, |r| {
                    r.reset();
                    r.h(0).and_then(|_| r.measure(0))
                })
                .unwrap()
                .unwrap(),
            );
            outcomes.1.push(
                mm.with_qreg(b, |r| {
                    r.reset();
                    r.h(0).and_then(|_| r.measure(0))
                })
                .unwrap()
                .unwrap(),
            );
        }
        assert_ne!(outcomes.0, outcomes.1);
    }
}
