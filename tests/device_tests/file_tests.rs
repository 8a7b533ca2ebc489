//! Device File Tests
//!
//! Tests verify:
//! - Position tracking across read/write/seek
//! - Write-only open truncates (and ignores busy devices)
//! - std::io::{Read, Write, Seek} adapters
//! - Error mapping into std::io::ErrorKind

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use scullmem::storage::Geometry;
use scullmem::{AccessMode, Device, Interrupt};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_device() -> Arc<Device> {
    Arc::new(Device::with_geometry(Geometry::new(4096, 0, 2).unwrap()))
}

// =============================================================================
// Position Tests
// =============================================================================

#[test]
fn test_position_advances_by_bytes_transferred() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadWrite).unwrap();

    assert_eq!(file.position(), 0);
    assert_eq!(file.write(b"hello world").unwrap(), 11);
    assert_eq!(file.position(), 11);

    file.seek(SeekFrom::Start(6)).unwrap();
    let mut buf = [0u8; 5];
    assert_eq!(file.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf, b"world");
    assert_eq!(file.position(), 11);
}

#[test]
fn test_short_write_advances_only_written_bytes() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadWrite).unwrap();

    file.seek(SeekFrom::Start(4000)).unwrap();
    assert_eq!(file.write(&[1u8; 500]).unwrap(), 96);
    assert_eq!(file.position(), 4096);
}

#[test]
fn test_handles_have_independent_positions() {
    let device = setup_device();
    let mut writer = device.open(AccessMode::ReadWrite).unwrap();
    let mut reader = device.open(AccessMode::ReadOnly).unwrap();

    writer.write(b"abcdef").unwrap();

    let mut buf = [0u8; 3];
    reader.read(&mut buf).unwrap();
    assert_eq!(&buf, b"abc");
    assert_eq!(reader.position(), 3);
    assert_eq!(writer.position(), 6);
}

#[test]
fn test_seek_end_tracks_other_handles_writes() {
    let device = setup_device();
    let mut a = device.open(AccessMode::ReadWrite).unwrap();
    let mut b = device.open(AccessMode::ReadWrite).unwrap();

    a.write(&[0u8; 100]).unwrap();
    assert_eq!(b.seek(SeekFrom::End(0)).unwrap(), 100);
    assert!(b.seek(SeekFrom::End(-101)).is_err());
    // failed seek leaves the position alone
    assert_eq!(b.position(), 100);
}

// =============================================================================
// Open Mode Tests
// =============================================================================

#[test]
fn test_write_only_open_truncates() {
    let device = setup_device();
    device.open(AccessMode::ReadWrite).unwrap().write(b"data").unwrap();
    assert_eq!(device.size(), 4);

    let file = device.open(AccessMode::WriteOnly).unwrap();

    assert_eq!(file.mode(), AccessMode::WriteOnly);
    assert_eq!(device.size(), 0);
}

#[test]
fn test_read_open_does_not_truncate() {
    let device = setup_device();
    device.open(AccessMode::ReadWrite).unwrap().write(b"data").unwrap();

    device.open(AccessMode::ReadOnly).unwrap().release();
    device.open(AccessMode::ReadWrite).unwrap().release();

    assert_eq!(device.size(), 4);
}

#[test]
fn test_write_only_open_ignores_busy_device() {
    let device = setup_device();
    device.open(AccessMode::ReadWrite).unwrap().write(b"data").unwrap();
    let _mapping = device.map();

    let file = device.open(AccessMode::WriteOnly);

    assert!(file.is_ok());
    assert_eq!(device.size(), 4);
}

#[test]
fn test_interrupted_write_only_open_fails() {
    let device = setup_device();
    let interrupt = Interrupt::new();
    interrupt.raise();

    let result = device.open_interruptible(AccessMode::WriteOnly, interrupt);

    assert!(matches!(result, Err(scullmem::ScullError::Interrupted)));
}

// =============================================================================
// std::io Adapter Tests
// =============================================================================

#[test]
fn test_write_all_and_read_exact_across_quanta() {
    let device = setup_device();
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 256) as u8).collect();

    let mut file = device.open(AccessMode::ReadWrite).unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    assert_eq!(device.size(), 20_000);

    file.rewind().unwrap();
    let mut back = vec![0u8; 20_000];
    file.read_exact(&mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn test_read_to_end_stops_at_size() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadWrite).unwrap();
    file.write_all(&[5u8; 6000]).unwrap();

    file.rewind().unwrap();
    let mut back = Vec::new();
    io::Read::read_to_end(&mut file, &mut back).unwrap();

    assert_eq!(back.len(), 6000);
}

#[test]
fn test_read_exact_over_hole_is_eof() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadWrite).unwrap();
    file.seek(SeekFrom::Start(9000)).unwrap();
    file.write_all(b"tail").unwrap();

    file.rewind().unwrap();
    let mut buf = [0u8; 16];
    let err = file.read_exact(&mut buf).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_io_seek_negative_is_invalid_input() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadOnly).unwrap();

    let err = io::Seek::seek(&mut file, SeekFrom::Current(-1)).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_io_interrupted_kind() {
    let device = setup_device();
    let mut file = device.open(AccessMode::ReadWrite).unwrap();
    file.interrupt().raise();

    let err = io::Write::write(&mut file, b"x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Interrupted);

    // write_all retries Interrupted transparently
    file.interrupt().raise();
    file.write_all(b"xyz").unwrap();
    assert_eq!(device.size(), 3);
}
