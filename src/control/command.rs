//! Control command codes
//!
//! Numbering follows the classic `'k'` ioctl table: Set and Tell both store,
//! Get and Query both read.

use crate::error::{Result, ScullError};

use super::Param;

/// Magic byte identifying scull control commands
pub const IOC_MAGIC: u8 = b'k';

/// Highest command number accepted by the decoder
pub const IOC_MAXNR: u8 = IOC_H_QSET;

pub const IOC_RESET: u8 = 0;
pub const IOC_S_ORDER: u8 = 1;
pub const IOC_S_QSET: u8 = 2;
pub const IOC_T_ORDER: u8 = 3;
pub const IOC_T_QSET: u8 = 4;
pub const IOC_G_ORDER: u8 = 5;
pub const IOC_G_QSET: u8 = 6;
pub const IOC_Q_ORDER: u8 = 7;
pub const IOC_Q_QSET: u8 = 8;
pub const IOC_X_ORDER: u8 = 9;
pub const IOC_X_QSET: u8 = 10;
pub const IOC_H_ORDER: u8 = 11;
pub const IOC_H_QSET: u8 = 12;

/// Build a raw command code from its number
pub const fn command_code(nr: u8) -> u32 {
    ((IOC_MAGIC as u32) << 8) | nr as u32
}

/// A decoded control-plane request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Restore both parameters to their defaults
    Reset,
    Set(Param, i64),
    Get(Param),
    /// Store the argument, return the previous value
    Exchange(Param, i64),
    /// Same as exchange, by-value flavor
    Shift(Param, i64),
}

impl ControlCommand {
    /// Decode a raw command code and its argument
    pub fn decode(code: u32, arg: i64) -> Result<Self> {
        let magic = (code >> 8) as u8;
        let nr = (code & 0xff) as u8;
        if code >> 16 != 0 || magic != IOC_MAGIC || nr > IOC_MAXNR {
            return Err(ScullError::UnsupportedCommand(code));
        }

        let command = match nr {
            IOC_RESET => ControlCommand::Reset,
            IOC_S_ORDER | IOC_T_ORDER => ControlCommand::Set(Param::Order, arg),
            IOC_S_QSET | IOC_T_QSET => ControlCommand::Set(Param::Qset, arg),
            IOC_G_ORDER | IOC_Q_ORDER => ControlCommand::Get(Param::Order),
            IOC_G_QSET | IOC_Q_QSET => ControlCommand::Get(Param::Qset),
            IOC_X_ORDER => ControlCommand::Exchange(Param::Order, arg),
            IOC_X_QSET => ControlCommand::Exchange(Param::Qset, arg),
            IOC_H_ORDER => ControlCommand::Shift(Param::Order, arg),
            IOC_H_QSET => ControlCommand::Shift(Param::Qset, arg),
            _ => return Err(ScullError::UnsupportedCommand(code)),
        };
        Ok(command)
    }

    /// Raw code for this command (argument not included)
    pub fn code(&self) -> u32 {
        let nr = match self {
            ControlCommand::Reset => IOC_RESET,
            ControlCommand::Set(Param::Order, _) => IOC_S_ORDER,
            ControlCommand::Set(Param::Qset, _) => IOC_S_QSET,
            ControlCommand::Get(Param::Order) => IOC_G_ORDER,
            ControlCommand::Get(Param::Qset) => IOC_G_QSET,
            ControlCommand::Exchange(Param::Order, _) => IOC_X_ORDER,
            ControlCommand::Exchange(Param::Qset, _) => IOC_X_QSET,
            ControlCommand::Shift(Param::Order, _) => IOC_H_ORDER,
            ControlCommand::Shift(Param::Qset, _) => IOC_H_QSET,
        };
        command_code(nr)
    }
}
