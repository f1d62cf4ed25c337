/*
 * The motor controller task.
 *
 * Each pass asks the status record for the next floor, sends it to the motor
 * controller and reads back where the car actually is. When the car turns up
 * at a new floor (or is holding at one) that floor's request is cleared, and
 * if it had been pending the car is told to stay put and we wait for the
 * passengers before polling again.
 */

use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;

use crate::bus::SharedBus;
use crate::config::Config;
use crate::elevator::{ElevatorStatus, Floor};
use crate::error::{Error, Result};

/// What one pass of the control loop ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Car commanded to `target`; it reported being at `at`.
    Travelling { target: Floor, at: Floor },
    /// Stopped at a requested floor; hold for the passenger dwell.
    Dwell(Floor),
}

pub struct ControlTask<'a, I2C> {
    bus: &'a SharedBus<I2C>,
    status: &'a ElevatorStatus,
    config: Config,
    last_floor: Floor,
}

impl<'a, I2C: I2c> ControlTask<'a, I2C> {
    pub fn new(bus: &'a SharedBus<I2C>, status: &'a ElevatorStatus, config: Config) -> Self {
        ControlTask {
            bus,
            status,
            config,
            last_floor: Floor::GROUND,
        }
    }

    pub async fn step(&mut self) -> Result<Outcome> {
        let target = self.status.next_floor().await?;
        let report = self.bus.command_floor(target).await?;
        trace!("motor at {} moving {}", report.floor, report.motion);

        let at = Floor::new(report.floor).ok_or(Error::BadFloor(report.floor))?;

        // Holding in place means a request for this very floor gets served
        // without the car having to leave and come back.
        let holding = target == self.last_floor;
        if at == self.last_floor && !holding {
            return Ok(Outcome::Travelling { target, at });
        }

        let served = self.status.arrive(at.number()).await?;
        self.last_floor = at;
        if !served.is_pending() {
            return Ok(Outcome::Travelling { target, at });
        }

        info!("stopping at floor {}", at);
        if let Err(e) = self.bus.command_floor(at).await {
            // The car was already sent here; the dwell still happens.
            warn!("stop command for floor {} failed: {}", at, e);
        }
        Ok(Outcome::Dwell(at))
    }

    pub async fn run(&mut self) -> ! {
        info!("control loop running");
        loop {
            let pause = match self.step().await {
                Ok(Outcome::Dwell(_)) => self.config.passenger_dwell,
                Ok(Outcome::Travelling { .. }) => self.config.control_poll,
                Err(e) => {
                    warn!("control cycle skipped: {}", e);
                    self.config.control_poll
                }
            };
            Timer::after(pause).await;
        }
    }
}
