//! Current geometry defaults
//!
//! Shared by every device of a table. Only a trim reads these values, so a
//! change never reaches segments that already exist.

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, ScullError};
use crate::storage::Geometry;

use super::ControlCommand;

/// Which geometry value a control operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Quantum order (`quantum = page_size << order`)
    Order,
    /// Quantum-set length
    Qset,
}

/// The mutable "current defaults" value object
#[derive(Debug)]
pub struct GeometryParams {
    current: RwLock<Geometry>,
    defaults: Geometry,
}

impl GeometryParams {
    pub fn new(defaults: Geometry) -> Self {
        Self {
            current: RwLock::new(defaults),
            defaults,
        }
    }

    /// Geometry the next trim will adopt
    pub fn current(&self) -> Geometry {
        *self.current.read()
    }

    /// Geometry restored by `reset`
    pub fn defaults(&self) -> Geometry {
        self.defaults
    }

    pub fn get(&self, param: Param) -> i64 {
        read_param(&self.current.read(), param)
    }

    pub fn set(&self, param: Param, value: i64) -> Result<()> {
        self.replace(param, value).map(|_| ())
    }

    /// Store `*value` and hand the previous value back through it
    pub fn exchange(&self, param: Param, value: &mut i64) -> Result<()> {
        *value = self.replace(param, *value)?;
        Ok(())
    }

    /// Store `value` and return the previous one
    pub fn shift(&self, param: Param, value: i64) -> Result<i64> {
        self.replace(param, value)
    }

    pub fn reset(&self) {
        *self.current.write() = self.defaults;
        debug!(
            order = self.defaults.order(),
            qset = self.defaults.qset(),
            "geometry reset to defaults"
        );
    }

    /// Execute a decoded control command
    ///
    /// Returns 0 for reset/set, the value for get, and the previous value for
    /// exchange/shift.
    pub fn apply(&self, command: ControlCommand) -> Result<i64> {
        match command {
            ControlCommand::Reset => {
                self.reset();
                Ok(0)
            }
            ControlCommand::Set(param, value) => self.set(param, value).map(|_| 0),
            ControlCommand::Get(param) => Ok(self.get(param)),
            ControlCommand::Exchange(param, value) | ControlCommand::Shift(param, value) => {
                self.shift(param, value)
            }
        }
    }

    fn replace(&self, param: Param, value: i64) -> Result<i64> {
        let mut current = self.current.write();
        let previous = read_param(&current, param);

        let next = match param {
            Param::Order => {
                let order = u32::try_from(value)
                    .map_err(|_| ScullError::InvalidArgument(format!("bad order {}", value)))?;
                current.with(order, current.qset())?
            }
            Param::Qset => {
                let qset = usize::try_from(value)
                    .map_err(|_| ScullError::InvalidArgument(format!("bad qset {}", value)))?;
                current.with(current.order(), qset)?
            }
        };
        *current = next;

        debug!(?param, previous, value, "geometry parameter changed");
        Ok(previous)
    }
}

fn read_param(geometry: &Geometry, param: Param) -> i64 {
    match param {
        Param::Order => i64::from(geometry.order()),
        Param::Qset => geometry.qset() as i64,
    }
}
