//! Storage Module
//!
//! Segmented in-memory storage: the address space behind every device.
//!
//! ## Responsibilities
//! - Translate byte offsets into (segment, slot, byte)
//! - Grow the chain lazily on write, never on read
//! - Allocate quantum sets and quanta on first touch, zero-filled
//! - Reset to a single empty head segment on trim
//!
//! ## Layout
//! ```text
//!  SegmentChain
//!  ┌────────────┐   ┌────────────┐   ┌────────────┐
//!  │ segment 0  │──►│ segment 1  │──►│ segment 2  │
//!  │  (head)    │   │            │   │            │
//!  └─────┬──────┘   └─────┬──────┘   └────────────┘
//!        │                │            no qset yet
//!        ▼                ▼
//!  ┌───┬───┬───┐    ┌───┬───┬───┐
//!  │ q │ - │ q │    │ - │ q │ - │    QuantumSet (qset slots)
//!  └─┬─┴───┴─┬─┘    └───┴─┬─┴───┘
//!    ▼       ▼            ▼
//!  [quantum] [quantum]  [quantum]    page_size << order bytes each
//! ```

mod chain;
mod geometry;
mod quantum;

pub use chain::{SegmentChain, SegmentNode};
pub use geometry::{Geometry, Position, MAX_ORDER, MAX_QSET};
pub use quantum::{MemoryBudget, Quantum, QuantumSet};
