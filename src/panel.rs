/*
 * The two call panels.
 *
 * Panel 1 has no request line, so it is probed on a fixed cadence. It runs
 * at the same priority as the control task and the two take turns on the bus.
 *
 * Panel 2 raises an interrupt when it has something queued, so its task
 * sleeps on the `PanelSignal` and touches the bus only when there is real
 * work. It runs at a higher priority than everything else; its footprint on
 * the bus lock is one exchange per request.
 *
 * A panel hands over a request only once, so if the status lock cannot be
 * had in time the floor is held back and admitted before the next read.
 */

use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;

use crate::bus::{Device, SharedBus};
use crate::config::Config;
use crate::elevator::ElevatorStatus;
use crate::error::Result;
use crate::irq::PanelSignal;

/// A request read from a panel that has not made it into the table yet.
struct Backlog(Option<u8>);

impl Backlog {
    async fn admit(&mut self, status: &ElevatorStatus, floor: u8) -> Result<()> {
        self.0 = Some(floor);
        self.flush(status).await
    }

    async fn flush(&mut self, status: &ElevatorStatus) -> Result<()> {
        if let Some(floor) = self.0 {
            status.add_request(floor).await?;
            self.0 = None;
        }
        Ok(())
    }
}

pub struct PolledPanel<'a, I2C> {
    bus: &'a SharedBus<I2C>,
    status: &'a ElevatorStatus,
    config: Config,
    backlog: Backlog,
}

impl<'a, I2C: I2c> PolledPanel<'a, I2C> {
    pub fn new(bus: &'a SharedBus<I2C>, status: &'a ElevatorStatus, config: Config) -> Self {
        PolledPanel {
            bus,
            status,
            config,
            backlog: Backlog(None),
        }
    }

    /// One probe of panel 1. Returns the floor read, if any.
    pub async fn step(&mut self) -> Result<Option<u8>> {
        self.backlog.flush(self.status).await?;

        let request = self.bus.read_panel(Device::Panel1).await?;
        if let Some(floor) = request {
            self.backlog.admit(self.status, floor).await?;
        }
        Ok(request)
    }

    pub async fn run(&mut self) -> ! {
        info!("panel 1 polling");
        loop {
            if let Err(e) = self.step().await {
                warn!("panel 1 cycle skipped: {}", e);
            }
            Timer::after(self.config.panel_poll).await;
        }
    }
}

pub struct GatedPanel<'a, I2C> {
    bus: &'a SharedBus<I2C>,
    status: &'a ElevatorStatus,
    signal: &'a PanelSignal,
    config: Config,
    backlog: Backlog,
    retry: bool,
}

impl<'a, I2C: I2c> GatedPanel<'a, I2C> {
    pub fn new(
        bus: &'a SharedBus<I2C>,
        status: &'a ElevatorStatus,
        signal: &'a PanelSignal,
        config: Config,
    ) -> Self {
        GatedPanel {
            bus,
            status,
            signal,
            config,
            backlog: Backlog(None),
            retry: false,
        }
    }

    /*
     * Waits (bounded) for an edge, then reads panel 2 once. After a failed
     * read the next pass reads again without waiting for another edge; the
     * panel still holds the request.
     */
    pub async fn step(&mut self) -> Result<Option<u8>> {
        self.backlog.flush(self.status).await?;

        if !self.retry && !self.signal.acquire(self.config.signal_timeout).await {
            return Ok(None);
        }

        self.retry = true;
        let request = self.bus.read_panel(Device::Panel2).await?;
        self.retry = false;
        if let Some(floor) = request {
            self.backlog.admit(self.status, floor).await?;
        }
        Ok(request)
    }

    pub async fn run(&mut self) -> ! {
        info!("panel 2 waiting for requests");
        loop {
            if let Err(e) = self.step().await {
                warn!("panel 2 cycle skipped: {}", e);
                // Back off so a dead bus does not starve the lower priorities.
                Timer::after(self.config.panel_poll).await;
            }
        }
    }
}
