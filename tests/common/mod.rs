/*
 * A simulated shaft behind the I2C bus: a motor controller that moves the
 * car one floor per command, and two panels replaying queued requests.
 */
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_time::Duration;
use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
use embedded_hal_async::i2c::I2c;

use liftctl::config::{Config, MOTOR_ADDRESS, NO_REQUEST, PANEL1_ADDRESS, PANEL2_ADDRESS};

#[derive(Default)]
pub struct Shaft {
    pub car: u8,
    pub panel1: VecDeque<u8>,
    pub panel2: VecDeque<u8>,
    /// Addresses whose next exchange fails, one entry per failure.
    pub failing: Vec<u8>,
    /// Every floor sent to the motor controller, in order.
    pub commands: Vec<u8>,
    pub panel1_reads: usize,
    pub panel2_reads: usize,
}

impl Shaft {
    fn motor(&mut self, target: u8, reply: &mut [u8]) {
        self.commands.push(target);
        let motion = if target > self.car {
            self.car += 1;
            0x01
        } else if target < self.car {
            self.car -= 1;
            0xff
        } else {
            0x00
        };
        reply[0] = self.car;
        if let Some(byte) = reply.get_mut(1) {
            *byte = motion;
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeBus(pub Rc<RefCell<Shaft>>);

impl FakeBus {
    pub fn shaft(&self) -> std::cell::RefMut<'_, Shaft> {
        self.0.borrow_mut()
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), ErrorKind> {
        let mut shaft = self.0.borrow_mut();
        if let Some(position) = shaft.failing.iter().position(|a| *a == address) {
            shaft.failing.remove(position);
            return Err(ErrorKind::Other);
        }

        let mut written = Vec::new();
        for operation in operations {
            match operation {
                Operation::Write(bytes) => written.extend_from_slice(bytes),
                Operation::Read(reply) => match address {
                    MOTOR_ADDRESS => shaft.motor(written[0], reply),
                    PANEL1_ADDRESS => {
                        shaft.panel1_reads += 1;
                        reply[0] = shaft.panel1.pop_front().unwrap_or(NO_REQUEST);
                    }
                    PANEL2_ADDRESS => {
                        shaft.panel2_reads += 1;
                        reply[0] = shaft.panel2.pop_front().unwrap_or(NO_REQUEST);
                    }
                    _ => return Err(ErrorKind::Other),
                },
            }
        }
        Ok(())
    }
}

pub fn quick_config() -> Config {
    Config {
        lock_timeout: Duration::from_millis(20),
        signal_timeout: Duration::from_millis(10),
        panel_poll: Duration::from_millis(1),
        control_poll: Duration::from_millis(1),
        passenger_dwell: Duration::from_millis(5),
    }
}
