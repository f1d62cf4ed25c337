#![no_std]
#![no_main]

// https://github.com/embassy-rs/embassy/blob/main/examples/stm32f4/src/bin/multiprio.rs
// https://dev.to/theembeddedrustacean/embedded-rust-embassy-gpio-button-controlled-blinking-3ee6

use embassy_executor::{Executor, InterruptExecutor};
use embassy_stm32::exti::{Channel, ExtiInput};
use embassy_stm32::gpio::{Pin, Pull};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, peripherals};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_halt as _};

use liftctl::bus::SharedBus;
use liftctl::config::{self, Config};
use liftctl::control::ControlTask;
use liftctl::elevator::ElevatorStatus;
use liftctl::irq::{self, Edge, PanelSignal};
use liftctl::panel::{GatedPanel, PolledPanel};

type Bus = SharedBus<I2c<'static, Async>>;

const CONFIG: Config = Config::new();

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

static STATUS: StaticCell<ElevatorStatus> = StaticCell::new();
static BUS: StaticCell<Bus> = StaticCell::new();
static PANEL2_SIGNAL: StaticCell<PanelSignal> = StaticCell::new();

// Panel 2 and its bridge preempt the thread-mode tasks. UART4 is unused on
// this board, so its vector drives the high priority executor.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn UART4() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

// Panel 2's request line, PA0, active low. The EXTI handler in embassy-stm32
// clears the pending bit before it wakes the waiter.
struct RequestLine(ExtiInput<'static>);

impl Edge for RequestLine {
    async fn falling_edge(&mut self) {
        self.0.wait_for_falling_edge().await
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let peripherals = embassy_stm32::init(Default::default());
    defmt::info!("liftctl: {} floors", config::FLOOR_COUNT);

    let i2c = I2c::new(
        peripherals.I2C1,
        peripherals.PB6,
        peripherals.PB7,
        Irqs,
        peripherals.DMA1_CH6,
        peripherals.DMA1_CH7,
        Hertz(config::BUS_FREQUENCY_HZ),
        Default::default(),
    );
    let line = RequestLine(ExtiInput::new(
        peripherals.PA0.degrade(),
        peripherals.EXTI0.degrade(),
        Pull::Up,
    ));

    let status: &'static ElevatorStatus = STATUS.init(ElevatorStatus::new(CONFIG.lock_timeout));
    let bus: &'static Bus = BUS.init(SharedBus::new(i2c, CONFIG.lock_timeout));
    let signal: &'static PanelSignal = PANEL2_SIGNAL.init(PanelSignal::new());

    interrupt::UART4.set_priority(Priority::P6);
    let spawner = EXECUTOR_HIGH.start(interrupt::UART4);
    spawner.must_spawn(panel2_bridge_task(line, signal));
    spawner.must_spawn(panel2_task(bus, status, signal));

    // panel1_task and control_task share a priority and alternate on the bus.
    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(control_task(bus, status));
        spawner.must_spawn(panel1_task(bus, status));
    })
}

#[embassy_executor::task]
async fn control_task(bus: &'static Bus, status: &'static ElevatorStatus) -> ! {
    ControlTask::new(bus, status, CONFIG).run().await
}

#[embassy_executor::task]
async fn panel1_task(bus: &'static Bus, status: &'static ElevatorStatus) -> ! {
    PolledPanel::new(bus, status, CONFIG).run().await
}

#[embassy_executor::task]
async fn panel2_task(
    bus: &'static Bus,
    status: &'static ElevatorStatus,
    signal: &'static PanelSignal,
) -> ! {
    GatedPanel::new(bus, status, signal, CONFIG).run().await
}

#[embassy_executor::task]
async fn panel2_bridge_task(mut line: RequestLine, signal: &'static PanelSignal) -> ! {
    irq::bridge(&mut line, signal).await
}
