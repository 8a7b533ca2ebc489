//! Configuration for scullmem
//!
//! Centralized configuration with sensible defaults. The geometry fields are
//! the initial values of the control plane and what a reset restores.

use std::time::Duration;

use crate::error::{Result, ScullError};
use crate::storage::Geometry;

/// Main configuration for a device table
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Geometry Configuration
    // -------------------------------------------------------------------------
    /// Base allocation unit in bytes. A quantum is `page_size << order`.
    pub page_size: usize,

    /// Default quantum order
    pub order: u32,

    /// Default number of quantum slots per segment
    pub qset: usize,

    // -------------------------------------------------------------------------
    // Device Table Configuration
    // -------------------------------------------------------------------------
    /// Number of devices in the table
    pub device_count: usize,

    /// Per-device allocation budget in bytes (`None` = unlimited)
    pub memory_limit: Option<u64>,

    // -------------------------------------------------------------------------
    // Async Configuration
    // -------------------------------------------------------------------------
    /// Delay before an asynchronous request's completion is delivered
    pub completion_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 4096,
            order: 0,
            qset: 1000,
            device_count: 4,
            memory_limit: None,
            completion_delay: Duration::from_millis(10),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Initial geometry described by this config
    pub fn geometry(&self) -> Result<Geometry> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(ScullError::Config(format!(
                "page size must be a power of two, got {}",
                self.page_size
            )));
        }
        Geometry::new(self.page_size, self.order, self.qset)
            .map_err(|e| ScullError::Config(e.to_string()))
    }

    /// Check the whole config for consistency
    pub fn validate(&self) -> Result<()> {
        self.geometry()?;
        if self.device_count == 0 {
            return Err(ScullError::Config("device count must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base allocation unit (in bytes)
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the default quantum order
    pub fn order(mut self, order: u32) -> Self {
        self.config.order = order;
        self
    }

    /// Set the default quantum-set length
    pub fn qset(mut self, qset: usize) -> Self {
        self.config.qset = qset;
        self
    }

    /// Set the number of devices in the table
    pub fn device_count(mut self, count: usize) -> Self {
        self.config.device_count = count;
        self
    }

    /// Cap the bytes each device may allocate
    pub fn memory_limit(mut self, limit: Option<u64>) -> Self {
        self.config.memory_limit = limit;
        self
    }

    /// Set the async completion delay
    pub fn completion_delay(mut self, delay: Duration) -> Self {
        self.config.completion_delay = delay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
