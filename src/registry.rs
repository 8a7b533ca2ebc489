//! Device table
//!
//! The fixed set of devices created at startup. All devices share one
//! [`GeometryParams`], so a control command changes what every device adopts
//! at its next trim. Asynchronous requests against any device go through the
//! table's [`CompletionQueue`].

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aio::CompletionQueue;
use crate::config::Config;
use crate::control::{ControlCommand, GeometryParams};
use crate::device::{AccessMode, Device, DeviceFile, Interrupt};
use crate::error::{Result, ScullError};

/// Fixed table of devices
pub struct DeviceTable {
    devices: Vec<Arc<Device>>,
    params: Arc<GeometryParams>,
    queue: CompletionQueue,
    config: Config,
}

impl DeviceTable {
    /// Create `config.device_count` devices with the configured geometry
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let geometry = config.geometry()?;
        let params = Arc::new(GeometryParams::new(geometry));

        let devices = (0..config.device_count)
            .map(|i| {
                Arc::new(Device::new(
                    i,
                    geometry,
                    Arc::clone(&params),
                    config.memory_limit,
                ))
            })
            .collect();
        let queue = CompletionQueue::new(config.completion_delay)?;

        info!(
            devices = config.device_count,
            quantum = geometry.quantum_size(),
            qset = geometry.qset(),
            delay_ms = config.completion_delay.as_millis() as u64,
            "device table initialized"
        );
        Ok(Self {
            devices,
            params,
            queue,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn device(&self, index: usize) -> Result<&Arc<Device>> {
        self.devices.get(index).ok_or(ScullError::NoDevice(index))
    }

    pub fn devices(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.iter()
    }

    /// Open device `index`
    pub fn open(&self, index: usize, mode: AccessMode) -> Result<DeviceFile> {
        self.device(index)?.open(mode)
    }

    pub fn params(&self) -> &Arc<GeometryParams> {
        &self.params
    }

    /// Completion queue for asynchronous requests, using the configured delay
    pub fn queue(&self) -> &CompletionQueue {
        &self.queue
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode and run a raw control command
    pub fn control(&self, code: u32, arg: i64) -> Result<i64> {
        let command = ControlCommand::decode(code, arg)?;
        self.params.apply(command)
    }

    /// Status text for every device, in table order
    pub fn report(&self, interrupt: &Interrupt) -> Result<String> {
        let mut out = String::new();
        for device in &self.devices {
            let status = device.status(interrupt)?;
            let _ = write!(out, "{}", status);
        }
        Ok(out)
    }

    /// Trim every device. Mapped devices are skipped and returned.
    pub fn shutdown(&self) -> Vec<usize> {
        let interrupt = Interrupt::new();
        let mut busy = Vec::new();

        for device in &self.devices {
            match device.trim(&interrupt) {
                Ok(()) => {}
                Err(ScullError::Busy) => {
                    warn!(device = device.index(), "device still mapped at shutdown");
                    busy.push(device.index());
                }
                Err(e) => {
                    warn!(device = device.index(), error = %e, "trim failed at shutdown");
                    busy.push(device.index());
                }
            }
        }

        debug!(busy = busy.len(), "device table shut down");
        busy
    }
}
