//! Device implementation
//!
//! One segment chain behind one coarse lock.

use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::control::GeometryParams;
use crate::error::{Result, ScullError};
use crate::storage::{Geometry, SegmentChain};

use super::{AccessMode, DeviceFile, DeviceStatus, Interrupt};

/// Largest byte offset a device accepts (signed file-offset range)
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// How long a lock wait sleeps between interrupt checks
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// An in-memory, growable byte device
///
/// ## Concurrency
/// - `chain`: every read, write, trim and status snapshot holds this lock
/// - `size`: only written with `chain` held; atomic so that lock-free seeks
///   see either the old or the new value, never a torn one
/// - `mappings`: maintained by [`Mapping`] guards; trim refuses while non-zero
pub struct Device {
    /// Position in the owning table (used in logs and reports)
    index: usize,

    /// Segment storage, serialized by one exclusive lock
    chain: Mutex<SegmentChain>,

    /// High-water mark of bytes written
    size: AtomicU64,

    /// Number of live mappings
    mappings: AtomicUsize,

    /// Geometry a trim adopts
    params: Arc<GeometryParams>,
}

impl Device {
    /// Create a device whose first segments use `geometry`
    pub fn new(
        index: usize,
        geometry: Geometry,
        params: Arc<GeometryParams>,
        memory_limit: Option<u64>,
    ) -> Self {
        debug!(
            device = index,
            order = geometry.order(),
            qset = geometry.qset(),
            "device created"
        );
        Self {
            index,
            chain: Mutex::new(SegmentChain::new(geometry, memory_limit)),
            size: AtomicU64::new(0),
            mappings: AtomicUsize::new(0),
            params,
        }
    }

    /// Standalone device whose defaults are its initial geometry
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self::new(0, geometry, Arc::new(GeometryParams::new(geometry)), None)
    }

    /// Acquire the device lock, giving up if `interrupt` is raised first
    fn lock(&self, interrupt: &Interrupt) -> Result<MutexGuard<'_, SegmentChain>> {
        loop {
            if interrupt.take() {
                debug!(device = self.index, "lock wait interrupted");
                return Err(ScullError::Interrupted);
            }
            if let Some(guard) = self.chain.try_lock_for(LOCK_POLL_INTERVAL) {
                return Ok(guard);
            }
        }
    }

    // =========================================================================
    // Data Transfer
    // =========================================================================

    /// Read up to `buf.len()` bytes at `offset`
    ///
    /// Never crosses the logical size or a quantum boundary. Returns 0 at or
    /// past the end and for holes; holes are not zero-filled.
    pub fn read(&self, offset: u64, buf: &mut [u8], interrupt: &Interrupt) -> Result<usize> {
        let chain = self.lock(interrupt)?;

        let size = self.size.load(Ordering::Acquire);
        if offset >= size {
            return Ok(0);
        }
        let count = (buf.len() as u64).min(size - offset) as usize;

        let pos = chain.geometry().position(offset);
        let Some(quantum) = chain.quantum(pos) else {
            trace!(device = self.index, offset, "read hit a hole");
            return Ok(0);
        };

        let count = count.min(quantum.len() - pos.offset);
        buf[..count].copy_from_slice(&quantum.as_slice()[pos.offset..pos.offset + count]);

        trace!(device = self.index, offset, count, "read");
        Ok(count)
    }

    /// Write up to `data.len()` bytes at `offset`
    ///
    /// Allocates segments, the quantum set and the target quantum as needed
    /// and stops at the end of that quantum. Allocations are kept if a later
    /// one fails.
    pub fn write(&self, offset: u64, data: &[u8], interrupt: &Interrupt) -> Result<usize> {
        let mut chain = self.lock(interrupt)?;

        if data.is_empty() {
            return Ok(0);
        }
        if offset >= MAX_OFFSET {
            return Err(ScullError::InvalidArgument(format!(
                "offset {} beyond maximum",
                offset
            )));
        }

        let pos = chain.geometry().position(offset);
        let quantum = match chain.quantum_or_alloc(pos) {
            Ok(q) => q,
            Err(e) => {
                debug!(device = self.index, offset, error = %e, "write allocation failed");
                return Err(e);
            }
        };

        let count = data
            .len()
            .min(quantum.len() - pos.offset)
            .min((MAX_OFFSET - offset) as usize);
        quantum.as_mut_slice()[pos.offset..pos.offset + count].copy_from_slice(&data[..count]);

        self.size.fetch_max(offset + count as u64, Ordering::AcqRel);

        trace!(device = self.index, offset, count, "write");
        Ok(count)
    }

    /// Compute a new file position; takes no lock
    pub fn seek(&self, current: u64, target: SeekFrom) -> Result<u64> {
        let (base, delta) = match target {
            SeekFrom::Start(offset) => (0i128, i128::from(offset)),
            SeekFrom::Current(delta) => (i128::from(current), i128::from(delta)),
            SeekFrom::End(delta) => (
                i128::from(self.size.load(Ordering::Acquire)),
                i128::from(delta),
            ),
        };

        let next = base + delta;
        if next < 0 {
            return Err(ScullError::InvalidArgument(format!(
                "seek to negative offset {}",
                next
            )));
        }
        if next > i128::from(MAX_OFFSET) {
            return Err(ScullError::InvalidArgument(format!(
                "seek offset {} beyond maximum",
                next
            )));
        }
        Ok(next as u64)
    }

    // =========================================================================
    // Trim
    // =========================================================================

    /// Drop all storage and adopt the current default geometry
    pub fn trim(&self, interrupt: &Interrupt) -> Result<()> {
        let mut chain = self.lock(interrupt)?;
        self.trim_locked(&mut chain)
    }

    /// Trim with the lock already held
    fn trim_locked(&self, chain: &mut SegmentChain) -> Result<()> {
        let mappings = self.mappings.load(Ordering::Acquire);
        if mappings > 0 {
            debug!(device = self.index, mappings, "trim refused: device is mapped");
            return Err(ScullError::Busy);
        }

        let geometry = self.params.current();
        let freed = chain.allocated_bytes();
        chain.reset(geometry);
        self.size.store(0, Ordering::Release);

        debug!(
            device = self.index,
            freed,
            order = geometry.order(),
            qset = geometry.qset(),
            "device trimmed"
        );
        Ok(())
    }

    // =========================================================================
    // Open / Map
    // =========================================================================

    /// Open a byte-stream handle. Write-only opens trim the device first.
    pub fn open(self: &Arc<Self>, mode: AccessMode) -> Result<DeviceFile> {
        self.open_interruptible(mode, Interrupt::new())
    }

    /// Like [`Device::open`], with a caller-provided interrupt token that the
    /// returned handle keeps using
    pub fn open_interruptible(
        self: &Arc<Self>,
        mode: AccessMode,
        interrupt: Interrupt,
    ) -> Result<DeviceFile> {
        if mode == AccessMode::WriteOnly {
            let mut chain = self.lock(&interrupt)?;
            if let Err(e) = self.trim_locked(&mut chain) {
                debug!(device = self.index, error = %e, "trim on open skipped");
            }
        }

        trace!(device = self.index, ?mode, "device opened");
        Ok(DeviceFile::new(Arc::clone(self), mode, interrupt))
    }

    /// Register an active mapping; trims fail with `Busy` until it is dropped
    pub fn map(self: &Arc<Self>) -> Mapping {
        let count = self.mappings.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(device = self.index, mappings = count, "mapping added");
        Mapping {
            device: Arc::clone(self),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn index(&self) -> usize {
        self.index
    }

    /// Logical size (high-water mark of bytes written)
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.load(Ordering::Acquire)
    }

    /// Geometry of the current segments
    pub fn geometry(&self) -> Geometry {
        self.chain.lock().geometry()
    }

    pub fn params(&self) -> &Arc<GeometryParams> {
        &self.params
    }

    pub fn set_memory_limit(&self, limit: Option<u64>) {
        self.chain.lock().set_memory_limit(limit);
    }

    /// Snapshot of size, geometry and allocated quanta
    pub fn status(&self, interrupt: &Interrupt) -> Result<DeviceStatus> {
        let chain = self.lock(interrupt)?;
        Ok(DeviceStatus::capture(
            self.index,
            &chain,
            self.size.load(Ordering::Acquire),
            self.mappings.load(Ordering::Acquire),
        ))
    }
}

/// An active mapping of a device; released on drop
pub struct Mapping {
    device: Arc<Device>,
}

impl Mapping {
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        let previous = self.device.mappings.fetch_sub(1, Ordering::AcqRel);
        trace!(
            device = self.device.index,
            mappings = previous.saturating_sub(1),
            "mapping released"
        );
    }
}
