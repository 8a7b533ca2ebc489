//! Segment Storage Tests
//!
//! Tests verify:
//! - Offset translation into (segment, slot, byte)
//! - Geometry validation
//! - Lazy chain growth and hole detection
//! - Quantum zero-fill and allocation accounting
//! - Reset back to a single head segment
//! - Memory budget enforcement without rollback

use scullmem::storage::{Geometry, Position, QuantumSet, SegmentChain, MAX_ORDER, MAX_QSET};
use scullmem::ScullError;

fn small_geometry() -> Geometry {
    // 4096-byte quanta, 2 per segment => 8192-byte segments
    Geometry::new(4096, 0, 2).unwrap()
}

// =============================================================================
// Geometry Tests
// =============================================================================

#[test]
fn test_geometry_sizes() {
    let geometry = Geometry::new(4096, 2, 10).unwrap();

    assert_eq!(geometry.quantum_size(), 16384);
    assert_eq!(geometry.itemsize(), 163840);
}

#[test]
fn test_position_translation() {
    let geometry = small_geometry();

    assert_eq!(
        geometry.position(0),
        Position { segment: 0, slot: 0, offset: 0 }
    );
    assert_eq!(
        geometry.position(4090),
        Position { segment: 0, slot: 0, offset: 4090 }
    );
    assert_eq!(
        geometry.position(4096),
        Position { segment: 0, slot: 1, offset: 0 }
    );
    assert_eq!(
        geometry.position(10000),
        Position { segment: 1, slot: 0, offset: 1808 }
    );
}

#[test]
fn test_geometry_rejects_out_of_range_values() {
    assert!(matches!(
        Geometry::new(4096, MAX_ORDER + 1, 10),
        Err(ScullError::InvalidArgument(_))
    ));
    assert!(matches!(
        Geometry::new(4096, 0, 0),
        Err(ScullError::InvalidArgument(_))
    ));
    assert!(matches!(
        Geometry::new(4096, 0, MAX_QSET + 1),
        Err(ScullError::InvalidArgument(_))
    ));
    assert!(matches!(
        Geometry::new(0, 0, 1),
        Err(ScullError::InvalidArgument(_))
    ));
}

// =============================================================================
// Chain Growth Tests
// =============================================================================

#[test]
fn test_new_chain_has_only_head() {
    let chain = SegmentChain::new(small_geometry(), None);

    assert_eq!(chain.segment_count(), 1);
    assert_eq!(chain.quantum_count(), 0);
    assert_eq!(chain.allocated_bytes(), 0);
    assert!(chain.locate(0).is_some());
    assert!(chain.locate(0).unwrap().quantum_set().is_none());
}

#[test]
fn test_locate_without_extend_stops_at_end() {
    let chain = SegmentChain::new(small_geometry(), None);

    assert!(chain.locate(1).is_none());
    assert!(chain.locate(u64::MAX).is_none());
    assert_eq!(chain.segment_count(), 1);
}

#[test]
fn test_locate_or_extend_links_intermediate_segments() {
    let mut chain = SegmentChain::new(small_geometry(), None);

    let node = chain.locate_or_extend(3).unwrap();
    assert!(node.quantum_set().is_none());
    assert_eq!(node.geometry(), small_geometry());

    assert_eq!(chain.segment_count(), 4);
    // extension charges the new segments only, no quantum storage
    assert_eq!(chain.allocated_bytes(), 3 * SegmentChain::node_bytes());
    assert_eq!(chain.quantum_count(), 0);
}

#[test]
fn test_quantum_lookup_reports_holes() {
    let mut chain = SegmentChain::new(small_geometry(), None);
    let geometry = chain.geometry();

    chain.quantum_or_alloc(geometry.position(4096)).unwrap();

    assert!(chain.quantum(geometry.position(4096)).is_some());
    // same segment, other slot: hole
    assert!(chain.quantum(geometry.position(0)).is_none());
    // segment never created: hole
    assert!(chain.quantum(geometry.position(8192)).is_none());
}

#[test]
fn test_quantum_is_zero_filled() {
    let mut chain = SegmentChain::new(small_geometry(), None);
    let pos = chain.geometry().position(100);

    let quantum = chain.quantum_or_alloc(pos).unwrap();

    assert_eq!(quantum.len(), 4096);
    assert!(quantum.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn test_quantum_or_alloc_reuses_existing_quantum() {
    let mut chain = SegmentChain::new(small_geometry(), None);
    let pos = chain.geometry().position(10);

    chain.quantum_or_alloc(pos).unwrap().as_mut_slice()[10] = 7;
    let bytes_after_first = chain.allocated_bytes();

    let quantum = chain.quantum_or_alloc(pos).unwrap();
    assert_eq!(quantum.as_slice()[10], 7);
    assert_eq!(chain.allocated_bytes(), bytes_after_first);
    assert_eq!(chain.quantum_count(), 1);
}

#[test]
fn test_allocation_accounting() {
    let mut chain = SegmentChain::new(small_geometry(), None);

    chain.quantum_or_alloc(chain.geometry().position(0)).unwrap();
    chain.quantum_or_alloc(chain.geometry().position(4096)).unwrap();

    assert_eq!(
        chain.allocated_bytes(),
        QuantumSet::table_bytes(2) + 2 * 4096
    );
    assert_eq!(chain.quantum_count(), 2);
}

// =============================================================================
// Reset Tests
// =============================================================================

#[test]
fn test_reset_frees_everything_and_adopts_geometry() {
    let mut chain = SegmentChain::new(small_geometry(), None);
    chain.quantum_or_alloc(chain.geometry().position(50_000)).unwrap();
    assert!(chain.segment_count() > 1);

    let fresh = Geometry::new(4096, 1, 8).unwrap();
    chain.reset(fresh);

    assert_eq!(chain.segment_count(), 1);
    assert_eq!(chain.quantum_count(), 0);
    assert_eq!(chain.allocated_bytes(), 0);
    assert_eq!(chain.geometry(), fresh);
    assert_eq!(chain.locate(0).unwrap().geometry(), fresh);
}

#[test]
fn test_segments_created_after_reset_use_new_geometry() {
    let mut chain = SegmentChain::new(small_geometry(), None);
    let fresh = Geometry::new(4096, 1, 3).unwrap();
    chain.reset(fresh);

    let node = chain.locate_or_extend(2).unwrap();
    assert_eq!(node.geometry(), fresh);

    let quantum = chain.quantum_or_alloc(fresh.position(0)).unwrap();
    assert_eq!(quantum.len(), 8192);
}

// =============================================================================
// Memory Budget Tests
// =============================================================================

#[test]
fn test_budget_failure_keeps_partial_allocations() {
    let table = QuantumSet::table_bytes(2);
    let nodes = 3 * SegmentChain::node_bytes();
    let mut chain = SegmentChain::new(small_geometry(), Some(nodes + table));
    let pos = chain.geometry().position(3 * 8192);

    // slot table fits, quantum does not
    assert!(matches!(
        chain.quantum_or_alloc(pos),
        Err(ScullError::OutOfMemory)
    ));

    assert_eq!(chain.segment_count(), 4);
    assert!(chain.locate(3).unwrap().quantum_set().is_some());
    assert_eq!(chain.quantum_count(), 0);
    assert_eq!(chain.allocated_bytes(), nodes + table);
}

#[test]
fn test_retry_after_budget_raise_does_not_double_allocate() {
    let table = QuantumSet::table_bytes(2);
    let node = SegmentChain::node_bytes();
    let mut chain = SegmentChain::new(small_geometry(), Some(node + table));
    let pos = chain.geometry().position(8192 + 4096);

    assert!(chain.quantum_or_alloc(pos).is_err());

    chain.set_memory_limit(None);
    chain.quantum_or_alloc(pos).unwrap();

    assert_eq!(chain.segment_count(), 2);
    assert_eq!(chain.quantum_count(), 1);
    assert_eq!(chain.allocated_bytes(), node + table + 4096);
}

#[test]
fn test_zero_budget_fails_before_any_storage() {
    let mut chain = SegmentChain::new(small_geometry(), Some(0));

    assert!(matches!(
        chain.quantum_or_alloc(chain.geometry().position(0)),
        Err(ScullError::OutOfMemory)
    ));
    assert!(chain.locate(0).unwrap().quantum_set().is_none());
    assert_eq!(chain.allocated_bytes(), 0);
}

#[test]
fn test_budget_limits_chain_growth() {
    let geometry = Geometry::new(4096, 0, 1).unwrap();
    let mut chain = SegmentChain::new(geometry, Some(16384));
    let far = geometry.position(4096 * 2_000_000);

    assert!(matches!(
        chain.quantum_or_alloc(far),
        Err(ScullError::OutOfMemory)
    ));
    assert!(matches!(
        chain.locate_or_extend(far.segment),
        Err(ScullError::OutOfMemory)
    ));

    assert_eq!(chain.segment_count(), 1);
    assert_eq!(chain.allocated_bytes(), 0);

    // near growth still fits
    chain.quantum_or_alloc(geometry.position(4096)).unwrap();
    assert_eq!(chain.segment_count(), 2);
    assert_eq!(
        chain.allocated_bytes(),
        SegmentChain::node_bytes() + QuantumSet::table_bytes(1) + 4096
    );
}

#[test]
fn test_reset_returns_growth_charge() {
    let node = SegmentChain::node_bytes();
    let mut chain = SegmentChain::new(small_geometry(), Some(4 * node));

    chain.locate_or_extend(4).unwrap();
    assert_eq!(chain.allocated_bytes(), 4 * node);
    assert!(chain.locate_or_extend(5).is_err());

    chain.reset(small_geometry());
    assert_eq!(chain.allocated_bytes(), 0);
    chain.locate_or_extend(4).unwrap();
    assert_eq!(chain.segment_count(), 5);
}
