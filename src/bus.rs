/*
 * The shared two-wire bus.
 *
 * Three devices hang off one I2C bus: the motor controller and two call
 * panels. Every conversation is a single write-then-read, and `SharedBus`
 * makes sure only one of them is on the wire at a time. The bus lock is held
 * for exactly one exchange; a caller that needs a command followed by an
 * acknowledgement simply makes two exchanges.
 *
 * Failures are counted per device and handed back to the caller, who logs
 * them and tries again on its next cycle.
 */

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, with_timeout};
use embedded_hal_async::i2c::I2c;
use enum_ordinalize::Ordinalize;

use crate::config::{NO_REQUEST, PANEL_PROBE};
use crate::elevator::Floor;
use crate::error::{Error, Resource, Result};

/// A device on the bus, by its 7-bit address.
#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Device {
    Panel2 = 0x1c,
    Panel1 = 0x1d,
    Motor = 0x1e,
}

impl Device {
    pub fn address(self) -> u8 {
        self.ordinal()
    }

    fn slot(self) -> usize {
        match self {
            Device::Panel2 => 0,
            Device::Panel1 => 1,
            Device::Motor => 2,
        }
    }
}

/// What the motor controller says the car is doing (second reply byte).
#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i8)]
pub enum Motion {
    Down = -1,
    Stopped = 0,
    Up = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorReport {
    /// Raw floor byte, not yet checked against the shaft.
    pub floor: u8,
    /// `None` when the controller sent something other than 0xff/0x00/0x01.
    pub motion: Option<Motion>,
}

impl MotorReport {
    fn decode(reply: [u8; 2]) -> Self {
        MotorReport {
            floor: reply[0],
            motion: Motion::from_ordinal(reply[1] as i8),
        }
    }
}

pub struct SharedBus<I2C> {
    bus: Mutex<CriticalSectionRawMutex, I2C>,
    lock_timeout: Duration,
    failures: [AtomicU32; Device::VARIANT_COUNT],
}

impl<I2C: I2c> SharedBus<I2C> {
    pub fn new(i2c: I2C, lock_timeout: Duration) -> Self {
        SharedBus {
            bus: Mutex::new(i2c),
            lock_timeout,
            failures: [const { AtomicU32::new(0) }; Device::VARIANT_COUNT],
        }
    }

    /// One write-then-read with `device`, holding the bus for its duration.
    pub async fn exchange(&self, device: Device, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let mut bus = with_timeout(self.lock_timeout, self.bus.lock())
            .await
            .map_err(|_| Error::LockTimeout(Resource::Bus))?;
        let result = bus.write_read(device.address(), tx, rx).await;
        drop(bus);

        result.map_err(|_| {
            let count = self.failures[device.slot()].fetch_add(1, Ordering::Relaxed) + 1;
            warn!("exchange with {} failed ({} so far)", device, count);
            Error::Bus(device)
        })
    }

    /// Sends the car towards `floor` and returns where it is now.
    pub async fn command_floor(&self, floor: Floor) -> Result<MotorReport> {
        let mut reply = [0u8; 2];
        self.exchange(Device::Motor, &[floor.number()], &mut reply)
            .await?;
        Ok(MotorReport::decode(reply))
    }

    /// Probes a call panel. `None` means it has nothing queued.
    pub async fn read_panel(&self, panel: Device) -> Result<Option<u8>> {
        let mut reply = [NO_REQUEST];
        self.exchange(panel, &[PANEL_PROBE], &mut reply).await?;
        Ok(match reply[0] {
            NO_REQUEST => None,
            floor => Some(floor),
        })
    }

    /// Failed exchanges with `device` since boot.
    pub fn failures(&self, device: Device) -> u32 {
        self.failures[device.slot()].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use std::vec::Vec;

    /// Replies with fixed bytes, or fails every exchange.
    struct Canned {
        reply: Vec<u8>,
        broken: bool,
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl ErrorType for Canned {
        type Error = ErrorKind;
    }

    impl I2c for Canned {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> core::result::Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buffer) => buffer.copy_from_slice(&self.reply[..buffer.len()]),
                }
            }
            Ok(())
        }
    }

    fn bus(reply: &[u8], broken: bool) -> SharedBus<Canned> {
        let canned = Canned {
            reply: reply.to_vec(),
            broken,
            writes: Vec::new(),
        };
        SharedBus::new(canned, Duration::from_millis(20))
    }

    #[test]
    fn device_addresses() {
        use crate::config::{MOTOR_ADDRESS, PANEL1_ADDRESS, PANEL2_ADDRESS};
        assert_eq!(Device::Motor.address(), MOTOR_ADDRESS);
        assert_eq!(Device::Panel1.address(), PANEL1_ADDRESS);
        assert_eq!(Device::Panel2.address(), PANEL2_ADDRESS);
    }

    #[test]
    fn motor_report_decodes_motion() {
        assert_eq!(MotorReport::decode([3, 0xff]).motion, Some(Motion::Down));
        assert_eq!(MotorReport::decode([3, 0x00]).motion, Some(Motion::Stopped));
        assert_eq!(MotorReport::decode([3, 0x01]).motion, Some(Motion::Up));
        assert_eq!(MotorReport::decode([3, 0x07]).motion, None);
        assert_eq!(MotorReport::decode([3, 0x01]).floor, 3);
    }

    #[test]
    fn command_floor_writes_the_target() {
        let bus = bus(&[4, 0x01], false);
        let report = block_on(bus.command_floor(Floor::new(5).unwrap())).unwrap();
        assert_eq!(report, MotorReport { floor: 4, motion: Some(Motion::Up) });

        let canned = block_on(bus.bus.lock());
        assert_eq!(canned.writes, [(0x1e, std::vec![5])]);
    }

    #[test]
    fn panel_sentinel_means_nothing_queued() {
        assert_eq!(block_on(bus(&[0xff], false).read_panel(Device::Panel1)), Ok(None));
        assert_eq!(block_on(bus(&[6], false).read_panel(Device::Panel2)), Ok(Some(6)));
    }

    #[test]
    fn failures_are_counted_per_device() {
        let bus = bus(&[0], true);
        assert_eq!(
            block_on(bus.read_panel(Device::Panel1)),
            Err(Error::Bus(Device::Panel1))
        );
        assert_eq!(
            block_on(bus.read_panel(Device::Panel1)),
            Err(Error::Bus(Device::Panel1))
        );
        assert_eq!(bus.failures(Device::Panel1), 2);
        assert_eq!(bus.failures(Device::Motor), 0);
    }

    #[test]
    fn busy_bus_times_out() {
        let bus = bus(&[0], false);
        let _held = block_on(bus.bus.lock());
        assert_eq!(
            block_on(bus.read_panel(Device::Panel1)),
            Err(Error::LockTimeout(Resource::Bus))
        );
        assert_eq!(bus.failures(Device::Panel1), 0);
    }
}
