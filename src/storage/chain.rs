//! Segment chain
//!
//! The device's growable address space. Segments live in an arena indexed by
//! segment number; index 0 is the head and survives every reset.

use std::mem;

use tracing::trace;

use crate::error::{Result, ScullError};

use super::{Geometry, MemoryBudget, Position, Quantum, QuantumSet};

/// One link of the chain: an optional quantum set plus the geometry it was
/// created with
#[derive(Debug)]
pub struct SegmentNode {
    quantum_set: Option<QuantumSet>,
    geometry: Geometry,
}

impl SegmentNode {
    fn new(geometry: Geometry) -> Self {
        Self {
            quantum_set: None,
            geometry,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn quantum_set(&self) -> Option<&QuantumSet> {
        self.quantum_set.as_ref()
    }
}

/// Ordered, strictly-owned sequence of segments
///
/// ## Invariants
/// - There is always at least the head segment
/// - Segment `i` is stored at arena index `i`; no gaps, no aliasing
/// - A quantum set keeps its slot count for its whole lifetime
#[derive(Debug)]
pub struct SegmentChain {
    /// Arena of segments, head first
    nodes: Vec<SegmentNode>,

    /// Geometry given to newly created segments
    geometry: Geometry,

    /// Bytes held by non-head segments, slot tables and quanta
    budget: MemoryBudget,
}

impl SegmentChain {
    /// Create a chain holding only an empty head segment
    pub fn new(geometry: Geometry, memory_limit: Option<u64>) -> Self {
        Self {
            nodes: vec![SegmentNode::new(geometry)],
            geometry,
            budget: MemoryBudget::new(memory_limit),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Bytes charged for each segment linked in after the head
    pub fn node_bytes() -> u64 {
        mem::size_of::<SegmentNode>() as u64
    }

    /// Number of segments currently linked, head included
    pub fn segment_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &SegmentNode> {
        self.nodes.iter()
    }

    /// Find segment `segment` without growing the chain
    pub fn locate(&self, segment: u64) -> Option<&SegmentNode> {
        usize::try_from(segment).ok().and_then(|i| self.nodes.get(i))
    }

    /// Find segment `segment`, linking in empty segments up to it as needed
    pub fn locate_or_extend(&mut self, segment: u64) -> Result<&mut SegmentNode> {
        let index = self.extend_to(segment)?;
        Ok(&mut self.nodes[index])
    }

    fn extend_to(&mut self, segment: u64) -> Result<usize> {
        let index = usize::try_from(segment).map_err(|_| ScullError::OutOfMemory)?;
        let len = self.nodes.len();
        if index < len {
            return Ok(index);
        }

        let missing = index
            .checked_add(1)
            .map(|n| n - len)
            .ok_or(ScullError::OutOfMemory)?;
        let bytes = (missing as u64).saturating_mul(Self::node_bytes());
        self.budget.charge(bytes)?;
        if self.nodes.try_reserve_exact(missing).is_err() {
            self.budget.release(bytes);
            return Err(ScullError::OutOfMemory);
        }
        let geometry = self.geometry;
        self.nodes
            .extend(std::iter::repeat_with(|| SegmentNode::new(geometry)).take(missing));

        trace!(segments = self.nodes.len(), "extended segment chain");
        Ok(index)
    }

    /// Quantum backing `pos`, or `None` if that region is a hole
    pub fn quantum(&self, pos: Position) -> Option<&Quantum> {
        self.locate(pos.segment)?.quantum_set()?.get(pos.slot)
    }

    /// Quantum backing `pos`, creating the segment, its quantum set and the
    /// quantum itself as needed.
    ///
    /// Allocations made before a failure are kept, so a retry picks up where
    /// the failed call stopped.
    pub fn quantum_or_alloc(&mut self, pos: Position) -> Result<&mut Quantum> {
        let index = self.extend_to(pos.segment)?;
        let budget = &mut self.budget;
        let node = &mut self.nodes[index];
        let geometry = node.geometry;

        let set = match &mut node.quantum_set {
            Some(set) => set,
            empty => {
                trace!(segment = index, qset = geometry.qset(), "allocating quantum set");
                empty.insert(QuantumSet::new(geometry.qset(), budget)?)
            }
        };
        set.get_or_alloc(pos.slot, geometry.quantum_size(), budget)
    }

    /// Free every quantum and every segment but the head, and adopt `geometry`
    ///
    /// The head is never charged, so the budget drops back to zero.
    pub fn reset(&mut self, geometry: Geometry) {
        self.nodes.truncate(1);
        self.nodes.shrink_to_fit();
        if let Some(head) = self.nodes.first_mut() {
            head.quantum_set = None;
            head.geometry = geometry;
        }
        self.geometry = geometry;
        self.budget.clear();
    }

    // =========================================================================
    // Accounting
    // =========================================================================

    pub fn quantum_count(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(SegmentNode::quantum_set)
            .map(QuantumSet::quantum_count)
            .sum()
    }

    /// Bytes currently held by non-head segments, slot tables and quanta
    pub fn allocated_bytes(&self) -> u64 {
        self.budget.used()
    }

    pub fn memory_limit(&self) -> Option<u64> {
        self.budget.limit()
    }

    pub fn set_memory_limit(&mut self, limit: Option<u64>) {
        self.budget.set_limit(limit);
    }
}
