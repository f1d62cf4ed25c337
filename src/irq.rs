/*
 * The interrupt bridge between panel 2's request line and its reader task.
 *
 * Panel 2 pulls a GPIO line low when it has a request queued. The bridge
 * does no bus I/O at all: on each falling edge it releases one unit of a
 * capacity-one `PanelSignal`, and the gated panel task does the reading.
 * Only the bridge releases; the reader never puts a unit back.
 * Releasing is the only thing in this crate that may run in interrupt
 * context. Two edges before the task wakes collapse into one unit, which is
 * fine because the panel always reports its most recent request.
 */

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};

pub struct PanelSignal {
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl PanelSignal {
    pub const fn new() -> Self {
        PanelSignal {
            signal: Signal::new(),
        }
    }

    /// Hands one unit to the waiting task. Never blocks; safe from an ISR.
    pub fn release(&self) {
        self.signal.signal(());
    }

    /// Waits up to `timeout` for a unit. `false` means the wait expired.
    pub async fn acquire(&self, timeout: Duration) -> bool {
        with_timeout(timeout, self.signal.wait()).await.is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }
}

impl Default for PanelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A request line that can be waited on for its next falling edge. The
/// board implements this on top of its EXTI input, whose handler clears the
/// pending flag before waking us.
#[allow(async_fn_in_trait)]
pub trait Edge {
    async fn falling_edge(&mut self);
}

/// Releases `signal` once per falling edge on `line`, forever.
pub async fn bridge<E: Edge>(line: &mut E, signal: &PanelSignal) -> ! {
    loop {
        line.falling_edge().await;
        signal.release();
        trace!("panel 2 edge");
    }
}
