/*
 * Control logic for a single elevator car on a shared I2C bus.
 *
 * Everything here is `no_std` and independent of the board: the tasks are
 * plain async functions generic over `embedded_hal_async::i2c::I2c`, and the
 * firmware in `main.rs` binds them to STM32 peripherals and embassy executors.
 * On the host the same code runs under `embassy_futures::block_on` in tests.
 *
 * Data flow: interrupt -> `irq::PanelSignal` -> `panel::GatedPanel` reads the
 * bus -> `elevator::ElevatorStatus::add_request` -> direction recompute ->
 * `control::ControlTask` commands the next floor -> arrival clears the request.
 */
#![no_std]

#[cfg(test)]
extern crate std;

mod fmt;

pub mod bus;
pub mod config;
pub mod control;
pub mod elevator;
pub mod error;
pub mod irq;
pub mod panel;

pub use error::{Error, Resource, Result};
