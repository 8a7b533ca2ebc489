//! Asynchronous request types

use crate::device::{Device, Interrupt};
use crate::error::{Result, ScullError};

/// Whether the submitter waits for the result or gets notified later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronicity {
    /// Result is returned from `submit`
    Synchronous,
    /// `submit` returns a token; the result arrives through the callback
    Asynchronous,
}

/// Caller memory for one transfer
#[derive(Debug)]
pub enum IoBuffer<'a> {
    /// Destination of a read
    Read(&'a mut [u8]),
    /// Source of a write
    Write(&'a [u8]),
}

impl IoBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            IoBuffer::Read(buf) => buf.len(),
            IoBuffer::Write(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_write(&self) -> bool {
        matches!(self, IoBuffer::Write(_))
    }
}

/// One read or write against a device
#[derive(Debug)]
pub struct IoRequest<'a> {
    pub buffer: IoBuffer<'a>,
    /// Bytes requested; may not exceed the buffer
    pub len: usize,
    pub offset: u64,
    pub mode: Synchronicity,
}

impl<'a> IoRequest<'a> {
    /// Asynchronous read filling `buf` from `offset`
    pub fn read(buf: &'a mut [u8], offset: u64) -> Self {
        let len = buf.len();
        Self {
            buffer: IoBuffer::Read(buf),
            len,
            offset,
            mode: Synchronicity::Asynchronous,
        }
    }

    /// Asynchronous write of `data` at `offset`
    pub fn write(data: &'a [u8], offset: u64) -> Self {
        Self {
            len: data.len(),
            buffer: IoBuffer::Write(data),
            offset,
            mode: Synchronicity::Asynchronous,
        }
    }

    /// Override the requested length
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn synchronous(mut self) -> Self {
        self.mode = Synchronicity::Synchronous;
        self
    }

    /// Run the transfer now, while the caller's buffer is still borrowed
    pub(crate) fn perform(self, device: &Device, interrupt: &Interrupt) -> Result<usize> {
        let available = self.buffer.len();
        if self.len > available {
            return Err(ScullError::BoundaryFault {
                requested: self.len,
                available,
            });
        }

        match self.buffer {
            IoBuffer::Read(buf) => device.read(self.offset, &mut buf[..self.len], interrupt),
            IoBuffer::Write(data) => device.write(self.offset, &data[..self.len], interrupt),
        }
    }
}

/// Identifies a queued request in its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Delivered to the submitter's callback exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub token: RequestToken,
    pub result: Result<usize>,
}

/// Outcome of `CompletionQueue::submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The result is final; no callback will run
    Completed(Result<usize>),
    /// The callback will receive the result after the queue delay
    Queued(RequestToken),
}

impl Submission {
    pub fn is_queued(&self) -> bool {
        matches!(self, Submission::Queued(_))
    }
}
