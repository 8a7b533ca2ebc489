//! Device Module
//!
//! The byte-addressable device and its file-like handles.
//!
//! ## Responsibilities
//! - Serialize all access to a segment chain under one lock
//! - Clamp transfers to the logical size and to quantum boundaries
//! - Track the logical size (high-water mark of writes)
//! - Trim back to an empty head segment, unless mapped
//!
//! ## Offsets
//! ```text
//!  0                    size                     MAX_OFFSET
//!  ├──── data / holes ────┤──── reads return 0 ─────┤
//!  └──────────── writes allowed anywhere ───────────┘
//! ```

mod dev;
mod file;
mod interrupt;
mod status;

pub use dev::{Device, Mapping, MAX_OFFSET};
pub use file::DeviceFile;
pub use interrupt::Interrupt;
pub use status::{DeviceStatus, QuantumStatus, SegmentStatus};

/// How a device is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    /// Truncates the device on open
    WriteOnly,
    ReadWrite,
}
