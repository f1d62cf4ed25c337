use thiserror::Error;

use crate::bus::Device;

/// A lock that can be waited on with a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    Status,
    Bus,
}

/*
 * Nothing here is fatal. Every task logs the error, skips the rest of its
 * current cycle and tries again on the next one.
 */
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("timed out waiting for the {0:?} lock")]
    LockTimeout(Resource),
    #[error("bus exchange with {0:?} failed")]
    Bus(Device),
    #[error("motor controller reported floor {0}, which is not in the shaft")]
    BadFloor(u8),
}

pub type Result<T> = core::result::Result<T, Error>;
