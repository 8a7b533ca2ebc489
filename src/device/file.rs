//! Byte-stream handle
//!
//! A `DeviceFile` is one open of a device: it owns a file position and an
//! interrupt token, and forwards reads and writes to the shared device.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;

use super::{AccessMode, Device, Interrupt};

/// An open handle onto a [`Device`]
pub struct DeviceFile {
    device: Arc<Device>,
    mode: AccessMode,
    pos: u64,
    interrupt: Interrupt,
}

impl DeviceFile {
    pub(crate) fn new(device: Arc<Device>, mode: AccessMode, interrupt: Interrupt) -> Self {
        Self {
            device,
            mode,
            pos: 0,
            interrupt,
        }
    }

    /// Read at the current position and advance by the bytes read
    ///
    /// At most one quantum's worth per call; 0 at end of data or in a hole.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.device.read(self.pos, buf, &self.interrupt)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Write at the current position and advance by the bytes written
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self.device.write(self.pos, data, &self.interrupt)?;
        self.pos += n as u64;
        Ok(n)
    }

    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        self.pos = self.device.seek(self.pos, target)?;
        Ok(self.pos)
    }

    /// Close the handle. Nothing to undo: storage belongs to the device.
    pub fn release(self) {
        trace!(device = self.device.index(), pos = self.pos, "device released");
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Token that interrupts this handle's lock waits when raised
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}

// =============================================================================
// std::io adapters
// =============================================================================

impl io::Read for DeviceFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        DeviceFile::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Write for DeviceFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        DeviceFile::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for DeviceFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        DeviceFile::seek(self, pos).map_err(io::Error::from)
    }
}
