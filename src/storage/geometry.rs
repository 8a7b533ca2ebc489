//! Segment geometry and offset translation
//!
//! A byte offset is split three ways: which segment, which quantum slot inside
//! that segment's quantum set, and which byte inside the quantum.
//!
//! ```text
//!  offset ─┬─ / itemsize ──────────────► segment
//!          └─ % itemsize ─┬─ / quantum ► slot
//!                         └─ % quantum ► byte in quantum
//! ```

use crate::error::{Result, ScullError};

/// Largest accepted quantum order (`page_size << 10`)
pub const MAX_ORDER: u32 = 10;

/// Largest accepted number of slots in a quantum set
pub const MAX_QSET: usize = 1 << 20;

/// Capacity layout of a segment, fixed when the segment is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    page_size: usize,
    order: u32,
    qset: usize,
}

/// A translated offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Segment index in the chain
    pub segment: u64,
    /// Quantum slot inside the segment's quantum set
    pub slot: usize,
    /// Byte offset inside the quantum
    pub offset: usize,
}

impl Geometry {
    /// Build a geometry, rejecting out-of-range order or qset values
    pub fn new(page_size: usize, order: u32, qset: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(ScullError::InvalidArgument("page size must be non-zero".to_string()));
        }
        if order > MAX_ORDER {
            return Err(ScullError::InvalidArgument(format!(
                "order {} exceeds maximum {}",
                order, MAX_ORDER
            )));
        }
        if qset == 0 || qset > MAX_QSET {
            return Err(ScullError::InvalidArgument(format!(
                "qset {} outside 1..={}",
                qset, MAX_QSET
            )));
        }
        let quantum = (page_size as u64)
            .checked_mul(1u64 << order)
            .filter(|q| usize::try_from(*q).is_ok())
            .ok_or_else(|| ScullError::InvalidArgument("quantum size overflows".to_string()))?;
        quantum
            .checked_mul(qset as u64)
            .ok_or_else(|| ScullError::InvalidArgument("segment size overflows".to_string()))?;

        Ok(Self { page_size, order, qset })
    }

    /// Same base unit, different order/qset
    pub fn with(&self, order: u32, qset: usize) -> Result<Self> {
        Self::new(self.page_size, order, qset)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn qset(&self) -> usize {
        self.qset
    }

    /// Bytes in one quantum
    pub fn quantum_size(&self) -> usize {
        self.page_size << self.order
    }

    /// Bytes addressable through one segment
    pub fn itemsize(&self) -> u64 {
        self.quantum_size() as u64 * self.qset as u64
    }

    /// Translate a logical byte offset
    pub fn position(&self, offset: u64) -> Position {
        let quantum = self.quantum_size() as u64;
        let itemsize = self.itemsize();
        let rest = offset % itemsize;

        Position {
            segment: offset / itemsize,
            slot: (rest / quantum) as usize,
            offset: (rest % quantum) as usize,
        }
    }
}
