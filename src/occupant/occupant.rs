use crossbeam_channel as cbc;
use serde;

use crate::building::dispatch::Dispatcher;
use crate::elevator::actor::ElevatorHandle;
use crate::elevator::fsm::elevatorfsm::{ElevatorEvent, Passenger, State as ElevatorState};
use crate::request::{BoardRequest, Direction, DisembarkRequest};
use crate::util::constants as setting;
use crate::util::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum State {
    None,
    Waiting,
    Riding,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OccupantEvent {
    StateChanged {
        occupant_id: usize,
        previous: State,
        current: State,
    },
    CurrentFloorChanged {
        occupant_id: usize,
        floor: u8,
    },
    RequestedFloorChanged {
        occupant_id: usize,
        floor: Option<u8>,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OccupantInfo {
    pub id: usize,
    pub weight: f64,
    pub current_floor: u8,
    pub requested_floor: Option<u8>,
    pub state: State,
    pub elevator_id: Option<usize>,
}

/// A rider. Listens to every elevator while waiting and to its own car while riding.
/// * `elevator_events_tx` the inbox handed to elevators when subscribing
/// * `events_tx` where this occupant's own changes are published
pub struct Occupant {
    id: usize,
    weight: f64,
    floor_count: u8,
    current_floor: u8,
    requested_floor: Option<u8>,
    requested_dirn: Direction,
    state: State,
    elevator: Option<ElevatorHandle>,
    dispatcher: Dispatcher,
    elevator_events_tx: cbc::Sender<ElevatorEvent>,
    events_tx: cbc::Sender<OccupantEvent>,
}

impl Occupant {
    pub fn new(
        id: usize,
        weight: f64,
        floor_count: u8,
        dispatcher: Dispatcher,
        elevator_events_tx: cbc::Sender<ElevatorEvent>,
        events_tx: cbc::Sender<OccupantEvent>,
    ) -> Result<Occupant> {
        if !(weight > 0.0) {
            return Err(Error::out_of_range("weight", weight, "must be greater than 0"));
        }
        Ok(Occupant {
            id,
            weight,
            floor_count,
            current_floor: setting::GROUND_FLOOR,
            requested_floor: None,
            requested_dirn: Direction::None,
            state: State::None,
            elevator: None,
            dispatcher,
            elevator_events_tx,
            events_tx,
        })
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn get_info(&self) -> OccupantInfo {
        OccupantInfo {
            id: self.id,
            weight: self.weight,
            current_floor: self.current_floor,
            requested_floor: self.requested_floor,
            state: self.state,
            elevator_id: self.elevator.as_ref().map(|e| e.id()),
        }
    }

    /// Calls an elevator to the current floor. Returns the id of the elevator
    /// the call was dispatched to.
    pub fn request_elevator(&mut self, dirn: Direction) -> Result<usize> {
        if !dirn.is_travel() {
            return Err(Error::InvalidDirection(dirn));
        }
        if self.state != State::None {
            return Err(Error::invalid_operation(format!(
                "occupant {} is already {:?}",
                self.id, self.state
            )));
        }

        for elevator in self.dispatcher.elevators() {
            elevator.subscribe(self.id, self.elevator_events_tx.clone())?;
        }
        match self.dispatcher.dispatch(BoardRequest::new(self.current_floor, dirn)) {
            Ok(elevator_id) => {
                self.requested_dirn = dirn;
                self.set_state(State::Waiting);
                log::info!(
                    "occupant {} waiting on floor {} to go {:?}",
                    self.id,
                    self.current_floor,
                    dirn
                );
                Ok(elevator_id)
            }
            Err(e) => {
                self.unsubscribe_all(None);
                Err(e)
            }
        }
    }

    /// Picks a destination from inside the car.
    pub fn request_floor(&mut self, floor: u8) -> Result<()> {
        let elevator = match (&self.elevator, self.state) {
            (Some(elevator), State::Riding) => elevator.clone(),
            _ => {
                return Err(Error::invalid_operation(format!(
                    "occupant {} cannot request a floor outside of an elevator",
                    self.id
                )))
            }
        };
        if floor < 1 || floor > self.floor_count {
            return Err(Error::FloorOutOfRange {
                floor,
                floor_count: self.floor_count,
            });
        }

        self.set_requested_floor(Some(floor));
        if floor == self.current_floor {
            // already there; if the car is moving the exit is queued instead
            if let Ok(exit_floor) = elevator.exit(self.id, Some(floor)) {
                self.finish_ride(exit_floor);
            }
            return Ok(());
        }
        elevator.add_disembark_request(DisembarkRequest::new(floor))
    }

    pub fn on_elevator_event(&mut self, event: ElevatorEvent) {
        if self.state == State::Riding && !self.is_riding_in(event.elevator_id()) {
            // queued by another car before we boarded
            return;
        }
        match event {
            ElevatorEvent::StateChanged {
                elevator_id,
                current: ElevatorState::DoorsOpen,
                floor,
                ..
            } => match self.state {
                State::Waiting if floor == self.current_floor => self.try_board(elevator_id),
                State::Riding if self.requested_floor == Some(floor) => self.try_leave(floor),
                _ => {}
            },
            ElevatorEvent::FloorChanged { floor, .. } if self.state == State::Riding => {
                self.set_current_floor(floor);
            }
            _ => {}
        }
    }

    /// Stops listening to every elevator. Called when the session ends.
    pub fn leave(&mut self) {
        if self.state == State::Riding {
            log::warn!("occupant {} left while riding", self.id);
        }
        self.unsubscribe_all(None);
    }

    fn is_riding_in(&self, elevator_id: usize) -> bool {
        self.elevator.as_ref().map(|e| e.id()) == Some(elevator_id)
    }

    fn try_board(&mut self, elevator_id: usize) {
        let elevator = match self.dispatcher.elevator(elevator_id) {
            Some(e) => e.clone(),
            None => return,
        };
        let passenger = Passenger {
            id: self.id,
            weight: self.weight,
            floor: self.current_floor,
            dirn: self.requested_dirn,
        };
        match elevator.enter(passenger) {
            Ok(()) => {
                self.unsubscribe_all(Some(elevator_id));
                self.elevator = Some(elevator);
                self.set_state(State::Riding);
                log::info!("occupant {} boarded elevator {}", self.id, elevator_id);
            }
            Err(e) => log::info!("occupant {} keeps waiting: {}", self.id, e),
        }
    }

    /// `floor` is where the doors opened. The car may have moved on since,
    /// so the floor reported by the exit is the one that counts.
    fn try_leave(&mut self, floor: u8) {
        let elevator = match &self.elevator {
            Some(e) => e.clone(),
            None => return,
        };
        match elevator.exit(self.id, self.requested_floor) {
            Ok(exit_floor) => {
                if exit_floor != floor {
                    log::debug!(
                        "occupant {} got off on floor {} instead of {}",
                        self.id,
                        exit_floor,
                        floor
                    );
                }
                self.finish_ride(exit_floor)
            }
            Err(e) => log::info!("occupant {} could not exit: {}", self.id, e),
        }
    }

    fn finish_ride(&mut self, floor: u8) {
        self.unsubscribe_all(None);
        self.elevator = None;
        self.requested_dirn = Direction::None;
        self.set_current_floor(floor);
        self.set_requested_floor(None);
        self.set_state(State::None);
        log::info!("occupant {} arrived on floor {}", self.id, floor);
    }

    fn unsubscribe_all(&self, except: Option<usize>) {
        for elevator in self.dispatcher.elevators() {
            if Some(elevator.id()) == except {
                continue;
            }
            if let Err(e) = elevator.unsubscribe(self.id) {
                log::debug!("occupant {}: {}", self.id, e);
            }
        }
    }

    fn set_state(&mut self, state: State) {
        if self.state == state {
            return;
        }
        let previous = self.state;
        self.state = state;
        self.emit(OccupantEvent::StateChanged {
            occupant_id: self.id,
            previous,
            current: state,
        });
    }

    fn set_current_floor(&mut self, floor: u8) {
        if self.current_floor == floor {
            return;
        }
        self.current_floor = floor;
        self.emit(OccupantEvent::CurrentFloorChanged {
            occupant_id: self.id,
            floor,
        });
    }

    fn set_requested_floor(&mut self, floor: Option<u8>) {
        if self.requested_floor == floor {
            return;
        }
        self.requested_floor = floor;
        self.emit(OccupantEvent::RequestedFloorChanged {
            occupant_id: self.id,
            floor,
        });
    }

    fn emit(&self, event: OccupantEvent) {
        // nobody listening is fine
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::elevator::actor;
    use crate::elevator::fsm::elevatorfsm::{Elevator, ElevatorSettings};
    use std::thread;
    use std::time::Duration;

    /// Elevators that never tick, so they only change on commands.
    fn still_elevators(count: usize) -> (Dispatcher, Vec<thread::JoinHandle<()>>) {
        let settings = ElevatorSettings {
            floor_count: 6,
            ..ElevatorSettings::default()
        };
        let mut handles = Vec::new();
        let mut threads = Vec::new();
        for id in 1..=count {
            let elevator = Elevator::new(id, settings).unwrap();
            let (handle, join) = actor::spawn(elevator, Duration::from_secs(3600)).unwrap();
            handles.push(handle);
            threads.push(join);
        }
        (Dispatcher::new(handles), threads)
    }

    fn stop(dispatcher: Dispatcher, threads: Vec<thread::JoinHandle<()>>) {
        for elevator in dispatcher.elevators() {
            elevator.shutdown();
        }
        for join in threads {
            join.join().unwrap();
        }
    }

    fn doors_open(elevator_id: usize, floor: u8) -> ElevatorEvent {
        ElevatorEvent::StateChanged {
            elevator_id,
            previous: ElevatorState::DoorsClosed,
            current: ElevatorState::DoorsOpen,
            floor,
        }
    }

    /// An occupant riding elevator 2 of two, plus its elevator event inbox.
    fn riding_in_second(dispatcher: &Dispatcher) -> (Occupant, cbc::Receiver<ElevatorEvent>) {
        let (elevator_events_tx, elevator_events_rx) = cbc::unbounded::<ElevatorEvent>();
        let (events_tx, _) = cbc::unbounded::<OccupantEvent>();
        let mut occupant = Occupant::new(10, 150.0, 6, dispatcher.clone(), elevator_events_tx, events_tx).unwrap();
        occupant.request_elevator(Direction::Up).unwrap();
        assert_eq!(occupant.get_state(), State::Waiting);
        occupant.on_elevator_event(doors_open(2, 1));
        assert_eq!(occupant.get_state(), State::Riding);
        assert_eq!(occupant.get_info().elevator_id, Some(2));
        (occupant, elevator_events_rx)
    }

    fn lone_occupant(weight: f64) -> Result<Occupant> {
        let (elevator_events_tx, _) = cbc::unbounded::<ElevatorEvent>();
        let (events_tx, _) = cbc::unbounded::<OccupantEvent>();
        Occupant::new(1, weight, 10, Dispatcher::new(Vec::new()), elevator_events_tx, events_tx)
    }

    #[test]
    fn it_rejects_non_positive_weight() {
        for weight in [0.0, -0.1].iter() {
            match lone_occupant(*weight) {
                Err(Error::OutOfRange { name, .. }) => assert_eq!(name, "weight"),
                Err(e) => panic!("unexpected error {}", e),
                Ok(_) => panic!("occupant with weight {} was created", weight),
            }
        }
    }

    #[test]
    fn it_starts_idle_on_the_ground_floor() {
        let occupant = lone_occupant(150.0).unwrap();
        let info = occupant.get_info();
        assert_eq!(info.state, State::None);
        assert_eq!(info.current_floor, 1);
        assert_eq!(info.requested_floor, None);
        assert_eq!(info.elevator_id, None);
    }

    #[test]
    fn it_rejects_a_request_without_direction() {
        let mut occupant = lone_occupant(150.0).unwrap();
        assert_eq!(
            occupant.request_elevator(Direction::None),
            Err(Error::InvalidDirection(Direction::None))
        );
        assert_eq!(occupant.get_state(), State::None);
    }

    #[test]
    fn it_cannot_request_a_floor_outside_an_elevator() {
        let mut occupant = lone_occupant(150.0).unwrap();
        match occupant.request_floor(5) {
            Err(Error::InvalidOperation(_)) => {}
            other => panic!("expected invalid operation, got {:?}", other),
        }
        assert_eq!(occupant.get_info().requested_floor, None);
    }

    #[test]
    fn it_stays_idle_when_dispatch_fails() {
        let mut occupant = lone_occupant(150.0).unwrap();
        assert!(occupant.request_elevator(Direction::Up).is_err());
        assert_eq!(occupant.get_state(), State::None);
    }

    #[test]
    fn it_ignores_doors_opening_elsewhere() {
        let mut occupant = lone_occupant(150.0).unwrap();
        occupant.on_elevator_event(ElevatorEvent::StateChanged {
            elevator_id: 1,
            previous: ElevatorState::Moving,
            current: ElevatorState::DoorsOpen,
            floor: 1,
        });
        assert_eq!(occupant.get_state(), State::None);
    }

    #[test]
    fn it_stops_listening_to_the_other_elevators_once_aboard() {
        let (dispatcher, threads) = still_elevators(2);
        let (mut occupant, inbox) = riding_in_second(&dispatcher);

        // commands to one elevator are handled in order, so the unsubscribe
        // is done before this entry opens the first car's doors
        let first = &dispatcher.elevators()[0];
        let other = Passenger {
            id: 11,
            weight: 80.0,
            floor: 1,
            dirn: Direction::Up,
        };
        assert_eq!(first.enter(other), Ok(()));
        let seen: Vec<usize> = inbox.try_iter().map(|event| event.elevator_id()).collect();
        assert!(seen.contains(&2));
        assert!(!seen.contains(&1));

        // a late doors-open from the first car does not pull the occupant out
        occupant.on_elevator_event(doors_open(1, 1));
        assert_eq!(occupant.get_state(), State::Riding);
        assert_eq!(occupant.get_info().elevator_id, Some(2));
        stop(dispatcher, threads);
    }

    #[test]
    fn it_gets_off_on_the_floor_the_car_is_on() {
        let (dispatcher, threads) = still_elevators(2);
        let (mut occupant, _inbox) = riding_in_second(&dispatcher);
        occupant.request_floor(3).unwrap();
        assert_eq!(occupant.get_info().requested_floor, Some(3));

        // the car never left floor 1, whatever the event says
        occupant.on_elevator_event(doors_open(2, 3));
        let info = occupant.get_info();
        assert_eq!(info.state, State::None);
        assert_eq!(info.current_floor, 1);
        assert_eq!(info.elevator_id, None);
        stop(dispatcher, threads);
    }
}
