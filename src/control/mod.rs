//! Control Module
//!
//! The configuration-exchange surface: two process-wide geometry values
//! (quantum order, quantum-set length) that future trims adopt.
//!
//! ## Command Format
//! ```text
//! ┌──────────────┬──────────────┐
//! │ Magic 'k'(1) │  Number (1)  │   + i64 argument
//! └──────────────┴──────────────┘
//! ```
//!
//! | nr | command          | result          |
//! |----|------------------|-----------------|
//! | 0  | RESET            | 0               |
//! | 1  | S ORDER / 2 QSET | 0               |
//! | 3  | T ORDER / 4 QSET | 0               |
//! | 5  | G ORDER / 6 QSET | value           |
//! | 7  | Q ORDER / 8 QSET | value           |
//! | 9  | X ORDER / 10 QSET| previous value  |
//! | 11 | H ORDER / 12 QSET| previous value  |

mod command;
mod params;

pub use command::{command_code, ControlCommand, IOC_MAGIC, IOC_MAXNR};
pub use command::{
    IOC_G_ORDER, IOC_G_QSET, IOC_H_ORDER, IOC_H_QSET, IOC_Q_ORDER, IOC_Q_QSET, IOC_RESET,
    IOC_S_ORDER, IOC_S_QSET, IOC_T_ORDER, IOC_T_QSET, IOC_X_ORDER, IOC_X_QSET,
};
pub use params::{GeometryParams, Param};
