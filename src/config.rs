/*
 * Fixed parameters of the installation.
 *
 * The shaft geometry and the bus map are compile-time constants. Timings live
 * in `Config`, which each task receives at construction so that tests can run
 * the same loops with millisecond timeouts.
 */

use embassy_time::Duration;

/// Number of floors served, ground floor is 0.
pub const FLOOR_COUNT: usize = 11;
pub const TOP_FLOOR: u8 = (FLOOR_COUNT - 1) as u8;

pub const BUS_FREQUENCY_HZ: u32 = 100_000;

pub const MOTOR_ADDRESS: u8 = 0x1e;
pub const PANEL1_ADDRESS: u8 = 0x1d;
pub const PANEL2_ADDRESS: u8 = 0x1c;

/// Panel reply meaning "nothing queued".
pub const NO_REQUEST: u8 = 0xff;
/// Byte written to a panel before reading its reply.
pub const PANEL_PROBE: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on waiting for the status lock or the bus lock.
    pub lock_timeout: Duration,
    /// How long the gated panel waits for an interrupt before looping.
    pub signal_timeout: Duration,
    pub panel_poll: Duration,
    pub control_poll: Duration,
    /// Time the car holds at a floor it stopped at for passengers.
    pub passenger_dwell: Duration,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            lock_timeout: Duration::from_millis(500),
            signal_timeout: Duration::from_millis(500),
            panel_poll: Duration::from_millis(50),
            control_poll: Duration::from_millis(100),
            passenger_dwell: Duration::from_millis(10_000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
