/*
 * The shared elevator status: one `ElevatorState` behind one mutex.
 *
 * All three tasks hold a `&ElevatorStatus`. Every operation takes the lock
 * with a bounded wait, does its read-modify-write including the direction
 * recompute, and lets go, so whenever the lock is free the direction agrees
 * with the request table. Floor numbers arriving from the bus are validated
 * here, before the lock is taken.
 */

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{Duration, with_timeout};

use super::{Direction, ElevatorState, Floor, FloorRequest};
use crate::error::{Error, Resource, Result};

pub struct ElevatorStatus {
    state: Mutex<CriticalSectionRawMutex, ElevatorState>,
    lock_timeout: Duration,
}

impl ElevatorStatus {
    pub const fn new(lock_timeout: Duration) -> Self {
        ElevatorStatus {
            state: Mutex::new(ElevatorState::new()),
            lock_timeout,
        }
    }

    pub(crate) async fn lock(&self) -> Result<MutexGuard<'_, CriticalSectionRawMutex, ElevatorState>> {
        with_timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| Error::LockTimeout(Resource::Status))
    }

    /// Records a stop request. Numbers outside the shaft are ignored.
    pub async fn add_request(&self, number: u8) -> Result<()> {
        let Some(floor) = Floor::new(number) else {
            debug!("ignoring request for floor {}", number);
            return Ok(());
        };

        let mut state = self.lock().await?;
        let before = state.direction();
        let after = state.add_request(floor);
        drop(state);

        info!("floor {} requested", number);
        if before != after {
            debug!("direction {} -> {}", before, after);
        }
        Ok(())
    }

    /// Clears a stop request and returns whether it had been pending.
    /// Numbers outside the shaft read as `Cleared` and change nothing.
    pub async fn clear_request(&self, number: u8) -> Result<FloorRequest> {
        let Some(floor) = Floor::new(number) else {
            return Ok(FloorRequest::Cleared);
        };

        let mut state = self.lock().await?;
        Ok(state.clear_request(floor))
    }

    /*
     * The motor controller reported the car at `number`. Moves the current
     * floor and clears its request in one go; the returned flag tells the
     * control task whether to stop for passengers.
     */
    pub async fn arrive(&self, number: u8) -> Result<FloorRequest> {
        let floor = Floor::new(number).ok_or(Error::BadFloor(number))?;

        let mut state = self.lock().await?;
        let served = state.arrive(floor);
        trace!("at floor {}, heading {}", number, state.direction());
        Ok(served)
    }

    pub async fn recompute(&self) -> Result<Direction> {
        Ok(self.lock().await?.recompute())
    }

    pub async fn next_floor(&self) -> Result<Floor> {
        Ok(self.lock().await?.next_floor())
    }

    /// A copy of the record as of the moment the lock was held.
    pub async fn snapshot(&self) -> Result<ElevatorState> {
        Ok(self.lock().await?.clone())
    }
}
