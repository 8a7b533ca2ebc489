//! Quanta, quantum sets and the allocation budget
//!
//! All allocations are fallible: memory is reserved with `try_reserve_exact`
//! and charged against an optional per-chain budget before being handed out.

use std::mem;

use crate::error::{Result, ScullError};

/// Tracks bytes held by one chain against an optional limit
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    limit: Option<u64>,
    used: u64,
}

impl MemoryBudget {
    pub fn new(limit: Option<u64>) -> Self {
        Self { limit, used: 0 }
    }

    /// Account for `bytes` more, failing if that would cross the limit
    pub fn charge(&mut self, bytes: u64) -> Result<()> {
        let next = self.used.checked_add(bytes).ok_or(ScullError::OutOfMemory)?;
        if let Some(limit) = self.limit {
            if next > limit {
                return Err(ScullError::OutOfMemory);
            }
        }
        self.used = next;
        Ok(())
    }

    pub fn release(&mut self, bytes: u64) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn clear(&mut self) {
        self.used = 0;
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }
}

/// Reserve a zeroed buffer of `len` elements without aborting on failure
fn try_alloc<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| ScullError::OutOfMemory)?;
    buf.resize(len, fill);
    Ok(buf)
}

// =============================================================================
// Quantum
// =============================================================================

/// A fixed-size, zero-filled block of storage
pub struct Quantum {
    bytes: Box<[u8]>,
}

impl Quantum {
    pub(crate) fn zeroed(size: usize, budget: &mut MemoryBudget) -> Result<Self> {
        budget.charge(size as u64)?;
        match try_alloc(size, 0u8) {
            Ok(bytes) => Ok(Self {
                bytes: bytes.into_boxed_slice(),
            }),
            Err(e) => {
                budget.release(size as u64);
                Err(e)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Address of the backing block (diagnostics only)
    pub fn addr(&self) -> usize {
        self.bytes.as_ptr() as usize
    }
}

impl std::fmt::Debug for Quantum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quantum")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// QuantumSet
// =============================================================================

/// Fixed-length table of lazily allocated quanta
#[derive(Debug)]
pub struct QuantumSet {
    slots: Vec<Option<Quantum>>,
}

impl QuantumSet {
    /// Bytes charged for the slot table of a set with `len` slots
    pub fn table_bytes(len: usize) -> u64 {
        (len as u64).saturating_mul(mem::size_of::<Option<Quantum>>() as u64)
    }

    /// Allocate a set with every slot empty
    pub(crate) fn new(len: usize, budget: &mut MemoryBudget) -> Result<Self> {
        let bytes = Self::table_bytes(len);
        budget.charge(bytes)?;

        let mut slots = Vec::new();
        if slots.try_reserve_exact(len).is_err() {
            budget.release(bytes);
            return Err(ScullError::OutOfMemory);
        }
        slots.resize_with(len, || None);
        Ok(Self { slots })
    }

    /// Number of slots (fixed for the life of the set)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Quantum> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Return the quantum in `slot`, allocating a zeroed one if absent
    pub(crate) fn get_or_alloc(
        &mut self,
        slot: usize,
        quantum_size: usize,
        budget: &mut MemoryBudget,
    ) -> Result<&mut Quantum> {
        let len = self.slots.len();
        let entry = self.slots.get_mut(slot).ok_or_else(|| {
            ScullError::InvalidArgument(format!("slot {} outside quantum set of {}", slot, len))
        })?;

        match entry {
            Some(quantum) => Ok(quantum),
            empty => Ok(empty.insert(Quantum::zeroed(quantum_size, budget)?)),
        }
    }

    /// Allocated quanta with their slot index
    pub fn allocated(&self) -> impl Iterator<Item = (usize, &Quantum)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.as_ref().map(|q| (i, q)))
    }

    pub fn quantum_count(&self) -> usize {
        self.slots.iter().filter(|q| q.is_some()).count()
    }
}
