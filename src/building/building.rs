use crossbeam_channel as cbc;
use serde;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::building::dispatch::Dispatcher;
use crate::elevator::actor::{self as elevator_actor, ElevatorHandle};
use crate::elevator::fsm::elevatorfsm::{Elevator, ElevatorEvent, ElevatorInfo, ElevatorSettings};
use crate::occupant::actor::{self as occupant_actor, OccupantHandle};
use crate::occupant::occupant::{Occupant, OccupantEvent};
use crate::request::BoardRequest;
use crate::util::constants as setting;
use crate::util::error::{Error, Result};
use crate::util::id::IdGenerator;

/// Everything needed to put up a building.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BuildingConfig {
    pub floor_count: u8,
    pub elevator_count: usize,
    pub max_weight: f64,
    pub floor_height: f64,
    pub speed: f64,
    /// Wall-clock period between elevator ticks.
    pub tick_interval: Duration,
    /// Simulated time per tick. Equal to `tick_interval` unless the simulation is sped up.
    pub tick: Duration,
    pub door_open_time: Duration,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            floor_count: setting::ELEV_NUM_FLOORS,
            elevator_count: setting::ELEV_COUNT,
            max_weight: setting::MAX_WEIGHT,
            floor_height: setting::FLOOR_HEIGHT,
            speed: setting::ELEV_SPEED,
            tick_interval: Duration::from_millis(setting::TICK_INTERVAL_MS),
            tick: Duration::from_millis(setting::TICK_INTERVAL_MS),
            door_open_time: Duration::from_millis(setting::DOOR_OPEN_TIME_MS),
        }
    }
}

impl BuildingConfig {
    pub fn elevator_settings(&self) -> ElevatorSettings {
        ElevatorSettings {
            floor_count: self.floor_count,
            floor_height: self.floor_height,
            speed: self.speed,
            max_weight: self.max_weight,
            tick: self.tick,
            door_open_time: self.door_open_time,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.floor_count < 2 {
            return Err(Error::out_of_range("floor_count", self.floor_count, "must be greater than 1"));
        }
        if self.elevator_count < 1 {
            return Err(Error::out_of_range(
                "elevator_count",
                self.elevator_count,
                "must be greater than 0",
            ));
        }
        if self.tick_interval == Duration::from_millis(0) {
            return Err(Error::out_of_range(
                "tick_interval",
                format!("{:?}", self.tick_interval),
                "must be non-zero",
            ));
        }
        self.elevator_settings().validate()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BuildingInfo {
    pub floor_count: u8,
    pub floor_height: f64,
    pub elevator_count: usize,
    pub occupant_count: usize,
}

struct Session {
    handle: OccupantHandle,
    join: thread::JoinHandle<()>,
}

/// Owns the elevator and occupant threads. Dropping the building stops them all.
pub struct Building {
    config: BuildingConfig,
    ids: IdGenerator,
    dispatcher: Dispatcher,
    elevator_threads: Vec<thread::JoinHandle<()>>,
    occupants: Mutex<HashMap<usize, Session>>,
}

impl Building {
    pub fn new(config: BuildingConfig) -> Result<Building> {
        config.validate()?;
        let ids = IdGenerator::new();
        let settings = config.elevator_settings();

        let mut handles = Vec::with_capacity(config.elevator_count);
        let mut elevator_threads = Vec::with_capacity(config.elevator_count);
        for _ in 0..config.elevator_count {
            let elevator = Elevator::new(ids.next_id(), settings)?;
            let (handle, join) = match elevator_actor::spawn(elevator, config.tick_interval) {
                Ok(started) => started,
                Err(e) => {
                    stop_elevators(&handles, elevator_threads);
                    return Err(e);
                }
            };
            handles.push(handle);
            elevator_threads.push(join);
        }
        log::info!(
            "building up with {} floors and {} elevators",
            config.floor_count,
            config.elevator_count
        );

        Ok(Building {
            config,
            ids,
            dispatcher: Dispatcher::new(handles),
            elevator_threads,
            occupants: Mutex::new(HashMap::new()),
        })
    }

    pub fn floor_count(&self) -> u8 {
        self.config.floor_count
    }

    pub fn elevators(&self) -> &[ElevatorHandle] {
        self.dispatcher.elevators()
    }

    pub fn list_elevators(&self) -> Result<Vec<ElevatorInfo>> {
        self.elevators().iter().map(|e| e.info()).collect()
    }

    pub fn info(&self) -> BuildingInfo {
        BuildingInfo {
            floor_count: self.config.floor_count,
            floor_height: self.config.floor_height,
            elevator_count: self.elevators().len(),
            occupant_count: self.sessions().len(),
        }
    }

    /// Routes a call from outside any car to one of the elevators.
    pub fn dispatch(&self, request: BoardRequest) -> Result<usize> {
        if request.floor < 1 || request.floor > self.config.floor_count {
            return Err(Error::FloorOutOfRange {
                floor: request.floor,
                floor_count: self.config.floor_count,
            });
        }
        if !request.direction.is_travel() {
            return Err(Error::InvalidDirection(request.direction));
        }
        self.dispatcher.dispatch(request)
    }

    /// Every event of every elevator, until the receiver is dropped.
    pub fn subscribe_elevator_events(&self) -> Result<cbc::Receiver<ElevatorEvent>> {
        let (tx, rx) = cbc::unbounded::<ElevatorEvent>();
        let subscriber_id = self.ids.next_id();
        for elevator in self.elevators() {
            elevator.subscribe(subscriber_id, tx.clone())?;
        }
        Ok(rx)
    }

    /// Starts a session for a new occupant on the ground floor.
    pub fn add_occupant(&self, weight: f64) -> Result<(OccupantHandle, cbc::Receiver<OccupantEvent>)> {
        let id = self.ids.next_id();
        let (elevator_events_tx, elevator_events_rx) = cbc::unbounded::<ElevatorEvent>();
        let (events_tx, events_rx) = cbc::unbounded::<OccupantEvent>();
        let occupant = Occupant::new(
            id,
            weight,
            self.config.floor_count,
            self.dispatcher.clone(),
            elevator_events_tx,
            events_tx,
        )?;
        let (handle, join) = occupant_actor::spawn(occupant, elevator_events_rx)?;
        self.sessions().insert(
            id,
            Session {
                handle: handle.clone(),
                join,
            },
        );
        log::info!("occupant {} entered the building", id);
        Ok((handle, events_rx))
    }

    pub fn occupant(&self, id: usize) -> Option<OccupantHandle> {
        self.sessions().get(&id).map(|s| s.handle.clone())
    }

    pub fn occupant_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.sessions().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ends a session. Returns false if there was no such occupant.
    pub fn remove_occupant(&self, id: usize) -> bool {
        let session = self.sessions().remove(&id);
        match session {
            Some(session) => {
                session.handle.shutdown();
                if session.join.join().is_err() {
                    log::error!("occupant {} panicked", id);
                }
                log::info!("occupant {} left the building", id);
                true
            }
            None => false,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<usize, Session>> {
        match self.occupants.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Building {
    fn drop(&mut self) {
        let sessions: Vec<Session> = self.sessions().drain().map(|(_, s)| s).collect();
        for session in sessions.iter() {
            session.handle.shutdown();
        }
        for session in sessions {
            let _ = session.join.join();
        }
        let threads = std::mem::take(&mut self.elevator_threads);
        stop_elevators(self.dispatcher.elevators(), threads);
        log::info!("building shut down");
    }
}

fn stop_elevators(handles: &[ElevatorHandle], threads: Vec<thread::JoinHandle<()>>) {
    for handle in handles {
        handle.shutdown();
    }
    for join in threads {
        if join.join().is_err() {
            log::error!("an elevator thread panicked");
        }
    }
}
