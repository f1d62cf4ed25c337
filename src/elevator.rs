/*
 * The request table and the direction engine.
 *
 * `ElevatorState` is the plain record: where the car is, which way it is
 * heading and which floors still want a stop. It knows nothing about locks;
 * `ElevatorStatus` in the `status` submodule wraps it in the mutex that all
 * three tasks share.
 */

pub mod status;
pub use status::ElevatorStatus;

use core::mem;

use crate::config::{FLOOR_COUNT, TOP_FLOOR};

/// A floor number known to be inside the shaft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Floor(u8);

impl Floor {
    pub const GROUND: Floor = Floor(0);
    pub const TOP: Floor = Floor(TOP_FLOOR);

    pub const fn new(number: u8) -> Option<Floor> {
        if (number as usize) < FLOOR_COUNT {
            Some(Floor(number))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub fn above(self) -> Option<Floor> {
        Floor::new(self.0.checked_add(1)?)
    }

    pub fn below(self) -> Option<Floor> {
        Floor::new(self.0.checked_sub(1)?)
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Stop,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FloorRequest {
    #[default]
    Cleared,
    Pending,
}

impl FloorRequest {
    pub fn is_pending(self) -> bool {
        self == FloorRequest::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ElevatorState {
    current_floor: Floor,
    direction: Direction,
    requests: [FloorRequest; FLOOR_COUNT],
}

impl ElevatorState {
    /// Parked at the ground floor with nothing requested.
    pub const fn new() -> Self {
        ElevatorState {
            current_floor: Floor::GROUND,
            direction: Direction::Stop,
            requests: [FloorRequest::Cleared; FLOOR_COUNT],
        }
    }

    pub fn current_floor(&self) -> Floor {
        self.current_floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn request(&self, floor: Floor) -> FloorRequest {
        self.requests[floor.index()]
    }

    pub fn pending_floors(&self) -> impl Iterator<Item = Floor> + '_ {
        self.requests
            .iter()
            .enumerate()
            .filter(|(_, request)| request.is_pending())
            .filter_map(|(number, _)| Floor::new(number as u8))
    }

    fn pending_above(&self) -> bool {
        self.requests[self.current_floor.index() + 1..]
            .iter()
            .any(|request| request.is_pending())
    }

    fn pending_below(&self) -> bool {
        self.requests[..self.current_floor.index()]
            .iter()
            .any(|request| request.is_pending())
    }

    /*
     * Keep going the way we are going while anything is left in that
     * direction; only turn around once it is exhausted. A closer request
     * behind the car never wins over one ahead of it. With nothing left at all
     * the car heads back to the ground floor and parks there.
     */
    pub fn recompute(&mut self) -> Direction {
        let keep_climbing = matches!(self.direction, Direction::Up | Direction::Stop);

        self.direction = if keep_climbing && self.pending_above() {
            Direction::Up
        } else if self.pending_below() {
            Direction::Down
        } else if self.current_floor == Floor::GROUND {
            Direction::Stop
        } else {
            Direction::Down
        };

        self.direction
    }

    /// Marks `floor` as wanting a stop. Asking twice is the same as asking once.
    pub fn add_request(&mut self, floor: Floor) -> Direction {
        self.requests[floor.index()] = FloorRequest::Pending;
        self.recompute()
    }

    /// Clears `floor` and returns what it was before.
    pub fn clear_request(&mut self, floor: Floor) -> FloorRequest {
        let previous = mem::replace(&mut self.requests[floor.index()], FloorRequest::Cleared);
        self.recompute();
        previous
    }

    /// The car is confirmed at `floor`: record it and serve any stop there.
    pub fn arrive(&mut self, floor: Floor) -> FloorRequest {
        self.current_floor = floor;
        self.clear_request(floor)
    }

    /*
     * The floor the motor should be sent to next: one step in the current
     * direction. At a shaft limit, or when stopped, the car holds where it is
     * and the direction is forced to `Stop`. The engine then runs again so a
     * request that a stale direction was hiding is picked up on the next poll
     * instead of being stranded.
     */
    pub fn next_floor(&mut self) -> Floor {
        let step = match self.direction {
            Direction::Up => self.current_floor.above(),
            Direction::Down => self.current_floor.below(),
            Direction::Stop => None,
        };

        match step {
            Some(floor) => floor,
            None => {
                self.direction = Direction::Stop;
                self.recompute();
                self.current_floor
            }
        }
    }
}

impl Default for ElevatorState {
    fn default() -> Self {
        Self::new()
    }
}
