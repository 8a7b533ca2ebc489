//! sculld
//!
//! Drives an in-process device table from the command line.

use std::io::{Read, SeekFrom, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam::channel::unbounded;
use scullmem::aio::IoRequest;
use scullmem::{AccessMode, Config, DeviceTable, Interrupt};
use tracing_subscriber::{fmt, EnvFilter};

/// scullmem device driver
#[derive(Parser, Debug)]
#[command(name = "sculld")]
#[command(about = "Segmented in-memory byte devices")]
#[command(version)]
struct Args {
    /// Quantum order (quantum = page size << order)
    #[arg(short, long, default_value = "0")]
    order: u32,

    /// Quanta per segment
    #[arg(short, long, default_value = "1000")]
    qset: usize,

    /// Number of devices in the table
    #[arg(short, long, default_value = "4")]
    devices: usize,

    /// Per-device memory limit in bytes
    #[arg(long)]
    memory_limit: Option<u64>,

    /// Async completion delay in milliseconds
    #[arg(long, default_value = "10")]
    delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a byte pattern and verify it reads back
    Fill {
        /// Device index
        #[arg(long, default_value = "0")]
        device: usize,

        /// Starting offset
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Number of bytes to write
        #[arg(long, default_value = "10000")]
        bytes: usize,
    },

    /// Concurrent writers and readers on one device
    Stress {
        #[arg(long, default_value = "4")]
        threads: usize,

        /// Operations per thread
        #[arg(long, default_value = "1000")]
        ops: usize,
    },

    /// Asynchronous submissions through the completion queue
    Aio {
        #[arg(long, default_value = "16")]
        requests: usize,
    },

    /// Print the status report
    Status,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scullmem=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    tracing::info!("sculld v{}", scullmem::VERSION);

    let config = Config::builder()
        .order(args.order)
        .qset(args.qset)
        .device_count(args.devices)
        .memory_limit(args.memory_limit)
        .completion_delay(Duration::from_millis(args.delay_ms))
        .build();

    let table = match DeviceTable::new(config) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            tracing::error!("Failed to create devices: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Fill { device, offset, bytes } => fill(&table, device, offset, bytes),
        Commands::Stress { threads, ops } => stress(&table, threads, ops),
        Commands::Aio { requests } => aio(&table, requests),
        Commands::Status => Ok(()),
    };
    if let Err(e) = outcome {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }

    match table.report(&Interrupt::new()) {
        Ok(report) => print!("{}", report),
        Err(e) => tracing::error!("Report failed: {}", e),
    }
    table.shutdown();
}

fn pattern(len: usize, seed: u64) -> Vec<u8> {
    (0..len)
        .map(|i| ((i as u64).wrapping_mul(31).wrapping_add(seed) % 251) as u8)
        .collect()
}

fn fill(table: &DeviceTable, device: usize, offset: u64, bytes: usize) -> std::io::Result<()> {
    let data = pattern(bytes, offset);
    let mut file = table.open(device, AccessMode::ReadWrite)?;

    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&data)?;

    let mut back = vec![0u8; bytes];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut back)?;
    file.release();

    if back != data {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "read-back mismatch",
        ));
    }
    tracing::info!(device, offset, bytes, "fill verified");
    Ok(())
}

fn stress(table: &Arc<DeviceTable>, threads: usize, ops: usize) -> std::io::Result<()> {
    let device = Arc::clone(table.device(0)?);
    let quantum = device.geometry().quantum_size();
    let start = Instant::now();

    let failures: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let device = Arc::clone(&device);
                scope.spawn(move || {
                    let interrupt = Interrupt::new();
                    let mut failures = 0;
                    let mut state = t as u64 + 1;
                    for _ in 0..ops {
                        state = state
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(1442695040888963407);
                        // each thread owns every `threads`-th quantum
                        let slot = (state >> 33) % 64 * threads as u64 + t as u64;
                        let offset = slot * quantum as u64;
                        let data = pattern(64, offset);

                        let mut back = [0u8; 64];
                        let ok = device.write(offset, &data, &interrupt) == Ok(64)
                            && device.read(offset, &mut back, &interrupt) == Ok(64)
                            && back[..] == data[..];
                        if !ok {
                            failures += 1;
                        }
                    }
                    failures
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap_or(ops)).sum()
    });

    tracing::info!(
        threads,
        ops,
        failures,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stress finished"
    );
    if failures > 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} operations failed", failures),
        ));
    }
    Ok(())
}

fn aio(table: &DeviceTable, requests: usize) -> std::io::Result<()> {
    let device = table.device(0)?;
    let queue = table.queue();
    let interrupt = Interrupt::new();
    let (tx, rx) = unbounded();

    let mut queued = 0;
    for i in 0..requests {
        let data = pattern(128, i as u64);
        let tx = tx.clone();
        let submission = queue.submit(
            device,
            IoRequest::write(&data, (i * 128) as u64),
            &interrupt,
            move |completion| {
                let _ = tx.send(completion);
            },
        );
        if submission.is_queued() {
            queued += 1;
        }
    }
    drop(tx);

    let mut delivered = 0;
    while delivered < queued {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(completion) => {
                tracing::debug!(token = completion.token.id(), result = ?completion.result, "completed");
                delivered += 1;
            }
            Err(_) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "completions not delivered",
                ))
            }
        }
    }

    tracing::info!(requests, queued, delivered, "aio finished");
    Ok(())
}
