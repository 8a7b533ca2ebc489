//! # scullmem
//!
//! An in-memory, growable byte device with:
//! - Segmented storage: a chain of fixed-size quantum sets, allocated lazily
//! - Byte-stream handles (read/write/seek, `std::io` compatible)
//! - One coarse, interruptible lock per device
//! - A deferred-completion queue for asynchronous requests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          DeviceTable  (shared GeometryParams / control)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │ DeviceFile  │          │CompletionQueue│
//!   │ (position)  │          │  (worker)     │
//!   └──────┬──────┘          └──────┬────────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │    Device    │
//!               │   (Mutex)    │
//!               └──────┬───────┘
//!                      ▼
//!               ┌──────────────┐
//!               │ SegmentChain │
//!               │ QuantumSets  │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod control;
pub mod device;
pub mod aio;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ScullError};
pub use config::Config;
pub use device::{AccessMode, Device, DeviceFile, Interrupt};
pub use registry::DeviceTable;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scullmem
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
