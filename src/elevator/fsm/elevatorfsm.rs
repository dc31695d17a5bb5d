use crossbeam_channel as cbc;
use serde;
use std::time::Duration;

use crate::elevator::fsm::door_timer::{DoorTimer, TimerCommand};
use crate::elevator::fsm::request_list::RequestList;
use crate::request::{BoardRequest, Direction, DisembarkRequest, Request};
use crate::util::constants as setting;
use crate::util::error::{Error, Result};

#[path = "./request_selector.rs"]
mod request_selector;

use request_selector::Sweep;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum State {
    Ready,
    DoorsOpen,
    DoorsClosed,
    Moving,
}

/// Published after every transition, in the order they happened.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ElevatorEvent {
    StateChanged {
        elevator_id: usize,
        previous: State,
        current: State,
        floor: u8,
    },
    FloorChanged {
        elevator_id: usize,
        floor: u8,
    },
    DirectionChanged {
        elevator_id: usize,
        direction: Direction,
    },
}

impl ElevatorEvent {
    pub fn elevator_id(&self) -> usize {
        match *self {
            ElevatorEvent::StateChanged { elevator_id, .. }
            | ElevatorEvent::FloorChanged { elevator_id, .. }
            | ElevatorEvent::DirectionChanged { elevator_id, .. } => elevator_id,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    OnTick,
    OnBoardRequest { request: BoardRequest },
    OnDisembarkRequest { request: DisembarkRequest },
}

/// Snapshot of an elevator, as handed to the dispatcher and to clients.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElevatorInfo {
    pub id: usize,
    pub state: State,
    pub dirn: Direction,
    pub floor: u8,
    pub occupant_count: usize,
    /// Rounded percent of max weight.
    pub capacity: f64,
    pub full: bool,
    pub requests: RequestList,
}

/// An occupant stepping into the car.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Passenger {
    pub id: usize,
    pub weight: f64,
    pub floor: u8,
    /// Direction the occupant called the elevator for.
    pub dirn: Direction,
}

/// Physical constants every elevator of a building shares.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElevatorSettings {
    pub floor_count: u8,
    /// feet
    pub floor_height: f64,
    /// feet per second
    pub speed: f64,
    pub max_weight: f64,
    /// Simulated time that passes on every tick.
    pub tick: Duration,
    pub door_open_time: Duration,
}

impl Default for ElevatorSettings {
    fn default() -> Self {
        ElevatorSettings {
            floor_count: setting::ELEV_NUM_FLOORS,
            floor_height: setting::FLOOR_HEIGHT,
            speed: setting::ELEV_SPEED,
            max_weight: setting::MAX_WEIGHT,
            tick: Duration::from_millis(setting::TICK_INTERVAL_MS),
            door_open_time: Duration::from_millis(setting::DOOR_OPEN_TIME_MS),
        }
    }
}

impl ElevatorSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_weight > 0.0) {
            return Err(Error::out_of_range("max_weight", self.max_weight, "must be greater than 0"));
        }
        if self.floor_count < 2 {
            return Err(Error::out_of_range("floor_count", self.floor_count, "must be greater than 1"));
        }
        if !(self.floor_height > 0.0) {
            return Err(Error::out_of_range("floor_height", self.floor_height, "must be greater than 0"));
        }
        if !(self.speed > 0.0) {
            return Err(Error::out_of_range("speed", self.speed, "must be greater than 0"));
        }
        if self.tick == Duration::from_millis(0) {
            return Err(Error::out_of_range("tick", format!("{:?}", self.tick), "must be non-zero"));
        }
        Ok(())
    }
}

/// Contains all we need to know about one car.
/// * `height` feet above the ground floor, the current floor is derived from it
/// * `current_request` the request being serviced, if any
/// * `clock` simulated time, advanced by one tick per `Event::OnTick`
/// * `entry_refused` set when someone was too heavy to board, cleared on the next exit
#[derive(Debug)]
pub struct Elevator {
    id: usize,
    settings: ElevatorSettings,
    state: State,
    dirn: Direction,
    height: f64,
    occupants: Vec<Passenger>,
    requests: RequestList,
    current_request: Option<Request>,
    door_timer: DoorTimer,
    clock: Duration,
    reselect_pending: bool,
    entry_refused: bool,
    subscribers: Vec<(usize, cbc::Sender<ElevatorEvent>)>,
    outbox: Vec<ElevatorEvent>,
}

impl Elevator {
    pub fn new(id: usize, settings: ElevatorSettings) -> Result<Elevator> {
        settings.validate()?;
        Ok(Elevator {
            id,
            settings,
            state: State::Ready,
            dirn: Direction::None,
            height: 0.0,
            occupants: Vec::new(),
            requests: RequestList::new(),
            current_request: None,
            door_timer: DoorTimer::new(settings.door_open_time),
            clock: Duration::from_millis(0),
            reselect_pending: false,
            entry_refused: false,
            subscribers: Vec::new(),
            outbox: Vec::new(),
        })
    }

    /// Takes the elevator from one state to the next and publishes what changed
    pub fn on_event(&mut self, event: Event) {
        match event {
            Event::OnTick => self.on_tick(),
            Event::OnBoardRequest { request } => self.on_board_request(request),
            Event::OnDisembarkRequest { request } => self.on_disembark_request(request),
        }
        self.publish();
    }

    pub fn get_id(&self) -> usize {
        self.id
    }
    pub fn get_state(&self) -> State {
        self.state
    }
    pub fn get_dirn(&self) -> Direction {
        self.dirn
    }
    pub fn get_height(&self) -> f64 {
        self.height
    }
    pub fn get_requests(&self) -> &RequestList {
        &self.requests
    }
    pub fn get_occupants(&self) -> &[Passenger] {
        &self.occupants
    }

    pub fn get_floor(&self) -> u8 {
        let floor = (self.height / self.settings.floor_height + setting::HEIGHT_EPSILON).floor();
        let floor = (floor.max(0.0) as u64 + 1).min(u64::from(self.settings.floor_count));
        floor as u8
    }

    pub fn occupants_weight(&self) -> f64 {
        self.occupants.iter().map(|o| o.weight).sum()
    }

    pub fn capacity(&self) -> f64 {
        (self.occupants_weight() / self.settings.max_weight * 100.0).round()
    }

    /// Full cars only take disembark requests. A refused entry only counts
    /// while someone is aboard to free up room.
    pub fn is_full(&self) -> bool {
        self.capacity() >= setting::FULL_CAPACITY_PERCENT || (self.entry_refused && !self.occupants.is_empty())
    }

    pub fn get_info(&self) -> ElevatorInfo {
        ElevatorInfo {
            id: self.id,
            state: self.state,
            dirn: self.dirn,
            floor: self.get_floor(),
            occupant_count: self.occupants.len(),
            capacity: self.capacity(),
            full: self.is_full(),
            requests: self.requests.clone(),
        }
    }

    pub fn subscribe(&mut self, subscriber_id: usize, tx: cbc::Sender<ElevatorEvent>) {
        self.unsubscribe(subscriber_id);
        self.subscribers.push((subscriber_id, tx));
    }

    pub fn unsubscribe(&mut self, subscriber_id: usize) {
        self.subscribers.retain(|(id, _)| *id != subscriber_id);
    }

    pub fn can_enter(&self, passenger: &Passenger) -> bool {
        self.state != State::Moving
            && passenger.floor == self.get_floor()
            && self.occupants_weight() + passenger.weight <= self.settings.max_weight
    }

    pub fn can_exit(&self, occupant_id: usize) -> bool {
        self.state != State::Moving && self.occupants.iter().any(|o| o.id == occupant_id)
    }

    pub fn enter(&mut self, passenger: Passenger) -> Result<()> {
        let result = self.try_enter(passenger);
        self.publish();
        result
    }

    /// Returns the floor the occupant got off on. `destination` is put back
    /// in the queue if the exit is refused while moving.
    pub fn exit(&mut self, occupant_id: usize, destination: Option<u8>) -> Result<u8> {
        let result = self.try_exit(occupant_id, destination);
        self.publish();
        result
    }

    fn try_enter(&mut self, passenger: Passenger) -> Result<()> {
        if self.occupants.iter().any(|o| o.id == passenger.id) {
            return Err(Error::invalid_operation(format!(
                "occupant {} is already in elevator {}",
                passenger.id, self.id
            )));
        }
        if self.state == State::Moving {
            self.requeue_board(&passenger, false);
            return Err(Error::invalid_operation(format!(
                "occupant {} may not enter moving elevator {}",
                passenger.id, self.id
            )));
        }
        if passenger.floor != self.get_floor() {
            self.requeue_board(&passenger, false);
            return Err(Error::invalid_operation(format!(
                "occupant {} is on floor {}, elevator {} is on floor {}",
                passenger.id,
                passenger.floor,
                self.id,
                self.get_floor()
            )));
        }
        if passenger.weight > self.settings.max_weight {
            // will never fit, waiting for an exit would not help
            return Err(Error::invalid_operation(format!(
                "occupant {} weighs more than the {} max weight of elevator {}",
                passenger.id, self.settings.max_weight, self.id
            )));
        }
        if self.occupants_weight() + passenger.weight > self.settings.max_weight {
            self.entry_refused = true;
            self.requeue_board(&passenger, true);
            return Err(Error::invalid_operation(format!(
                "occupant {} would take elevator {} over its max weight of {}",
                passenger.id, self.id, self.settings.max_weight
            )));
        }

        self.open_doors();
        self.occupants.push(passenger);
        self.requests.clear_board_on_floor(self.get_floor());
        self.reselect_pending = true;
        log::debug!(
            "elevator {}: occupant {} entered on floor {} ({}% capacity)",
            self.id,
            passenger.id,
            self.get_floor(),
            self.capacity()
        );
        Ok(())
    }

    fn try_exit(&mut self, occupant_id: usize, destination: Option<u8>) -> Result<u8> {
        if self.state == State::Moving {
            if let Some(floor) = destination {
                self.on_disembark_request(DisembarkRequest::new(floor));
            }
            return Err(Error::invalid_operation(format!(
                "occupant {} may not exit moving elevator {}",
                occupant_id, self.id
            )));
        }
        let position = match self.occupants.iter().position(|o| o.id == occupant_id) {
            Some(p) => p,
            None => {
                return Err(Error::invalid_operation(format!(
                    "occupant {} is not in elevator {}",
                    occupant_id, self.id
                )))
            }
        };

        self.open_doors();
        self.occupants.remove(position);
        self.requests.clear_disembark_on_floor(self.get_floor());
        self.requests.unflag_all_board();
        self.entry_refused = false;
        self.reselect_pending = true;
        log::debug!(
            "elevator {}: occupant {} exited on floor {}",
            self.id,
            occupant_id,
            self.get_floor()
        );
        Ok(self.get_floor())
    }

    fn requeue_board(&mut self, passenger: &Passenger, flagged: bool) {
        if !passenger.dirn.is_travel() || !self.is_valid_floor(passenger.floor) {
            return;
        }
        let mut request = BoardRequest::new(passenger.floor, passenger.dirn);
        if flagged {
            request = request.flagged();
        }
        self.requests.add_board(request);
        self.reselect_pending = true;
    }

    fn is_valid_floor(&self, floor: u8) -> bool {
        floor >= 1 && floor <= self.settings.floor_count
    }

    fn on_board_request(&mut self, request: BoardRequest) {
        if !self.is_valid_floor(request.floor) || !request.direction.is_travel() {
            log::warn!("elevator {}: ignoring invalid board request {:?}", self.id, request);
            return;
        }
        if self.requests.add_board(request) {
            log::debug!("elevator {}: queued {:?}", self.id, request);
            self.reselect_pending = true;
        }
    }

    fn on_disembark_request(&mut self, request: DisembarkRequest) {
        if !self.is_valid_floor(request.floor) {
            log::warn!("elevator {}: ignoring invalid disembark request {:?}", self.id, request);
            return;
        }
        if self.requests.add_disembark(request) {
            log::debug!("elevator {}: queued {:?}", self.id, request);
            self.reselect_pending = true;
        }
    }

    fn on_tick(&mut self) {
        self.clock += self.settings.tick;
        if self.reselect_pending {
            self.reselect_pending = false;
            self.choose_next_request();
        }

        if self.has_reached_request() {
            self.on_arrival();
        } else if self.state == State::Moving {
            self.advance();
        } else if self.state == State::DoorsOpen && self.door_timer.did_expire(self.clock) {
            self.set_state(State::DoorsClosed);
        } else if self.state == State::DoorsClosed || self.state == State::Ready {
            self.choose_next_request();
            match self.current_request {
                Some(request) if self.is_at_floor(request.floor()) => self.on_arrival(),
                Some(request) => self.start_moving(request),
                None => {
                    if self.occupants.is_empty() {
                        self.set_direction(Direction::None);
                        self.set_state(State::Ready);
                    }
                }
            }
        }
    }

    fn has_reached_request(&self) -> bool {
        match self.current_request {
            Some(request) => self.state != State::DoorsOpen && self.is_at_floor(request.floor()),
            None => false,
        }
    }

    fn on_arrival(&mut self) {
        let floor = self.get_floor();
        self.requests.clear_disembark_on_floor(floor);
        if !self.is_full() {
            self.requests.clear_board_on_floor(floor);
        }
        self.current_request = None;
        log::debug!("elevator {}: arrived at floor {}", self.id, floor);
        self.open_doors();
        self.choose_next_request();
    }

    fn open_doors(&mut self) {
        self.door_timer.on_command(TimerCommand::Start, self.clock);
        self.set_state(State::DoorsOpen);
    }

    fn start_moving(&mut self, request: Request) {
        let dirn = if self.target_height(request.floor()) > self.height {
            Direction::Up
        } else {
            Direction::Down
        };
        self.door_timer.on_command(TimerCommand::Cancel, self.clock);
        self.set_direction(dirn);
        self.set_state(State::Moving);
    }

    fn advance(&mut self) {
        let request = match self.current_request {
            Some(r) => r,
            None => {
                log::warn!("elevator {}: moving without a request, stopping", self.id);
                self.set_state(State::DoorsClosed);
                return;
            }
        };
        let before = self.get_floor();
        let target = self.target_height(request.floor());
        let step = self.settings.speed * self.settings.tick.as_secs_f64();
        self.height = if target > self.height {
            (self.height + step).min(target)
        } else {
            (self.height - step).max(target)
        };
        let after = self.get_floor();

        if after > before {
            for floor in before + 1..=after {
                self.outbox.push(ElevatorEvent::FloorChanged { elevator_id: self.id, floor });
            }
        } else if after < before {
            for floor in (after..before).rev() {
                self.outbox.push(ElevatorEvent::FloorChanged { elevator_id: self.id, floor });
            }
        }
    }

    /// Picks the request to service next. While moving, the current request is
    /// only swapped for a nearer one ahead, so the trip is never abandoned.
    fn choose_next_request(&mut self) {
        let floor = self.get_floor();
        let sweep = Sweep {
            floor,
            direction: self.dirn,
            moving: self.state == State::Moving,
        };
        let full = self.is_full();
        let next = request_selector::next_request(&sweep, &mut self.requests, full);

        if sweep.moving {
            if let Some(candidate) = next {
                let nearer = match self.current_request {
                    Some(current) => {
                        self.distance_to(candidate.floor()) < self.distance_to(current.floor())
                    }
                    None => true,
                };
                if nearer && request_selector::is_ahead(&sweep, candidate.floor()) {
                    log::debug!("elevator {}: stopping on the way at floor {}", self.id, candidate.floor());
                    self.current_request = Some(candidate);
                }
            }
            return;
        }

        self.current_request = next;
        if let Some(request) = next {
            let dirn = match Direction::between(floor, request.floor()) {
                Direction::None => match request {
                    Request::Board(board) => board.direction,
                    Request::Disembark(_) => self.dirn,
                },
                dirn => dirn,
            };
            self.set_direction(dirn);
        }
    }

    fn target_height(&self, floor: u8) -> f64 {
        f64::from(floor.saturating_sub(1)) * self.settings.floor_height
    }

    fn is_at_floor(&self, floor: u8) -> bool {
        (self.height - self.target_height(floor)).abs() < setting::HEIGHT_EPSILON
    }

    fn distance_to(&self, floor: u8) -> f64 {
        (self.target_height(floor) - self.height).abs()
    }

    fn set_state(&mut self, state: State) {
        if self.state == state {
            return;
        }
        let previous = self.state;
        self.state = state;
        log::debug!(
            "elevator {}: {:?} -> {:?} on floor {}",
            self.id,
            previous,
            state,
            self.get_floor()
        );
        self.outbox.push(ElevatorEvent::StateChanged {
            elevator_id: self.id,
            previous,
            current: state,
            floor: self.get_floor(),
        });
    }

    fn set_direction(&mut self, dirn: Direction) {
        if self.dirn == dirn {
            return;
        }
        self.dirn = dirn;
        self.outbox.push(ElevatorEvent::DirectionChanged {
            elevator_id: self.id,
            direction: dirn,
        });
    }

    /// Sends everything queued in the outbox. Subscribers that hung up are dropped.
    fn publish(&mut self) {
        if self.outbox.is_empty() {
            return;
        }
        let events: Vec<ElevatorEvent> = self.outbox.drain(..).collect();
        let id = self.id;
        self.subscribers.retain(|(subscriber_id, tx)| {
            for event in events.iter() {
                if tx.send(event.clone()).is_err() {
                    log::warn!("elevator {}: subscriber {} hung up, dropping it", id, subscriber_id);
                    return false;
                }
            }
            true
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// One floor per tick, doors close two ticks after opening.
    fn settings() -> ElevatorSettings {
        ElevatorSettings {
            floor_count: 10,
            floor_height: 9.0,
            speed: 18.0,
            max_weight: 1000.0,
            tick: Duration::from_millis(500),
            door_open_time: Duration::from_millis(1000),
        }
    }

    fn initialize_elevator(floor: u8) -> (Elevator, cbc::Receiver<ElevatorEvent>) {
        let (events_tx, events_rx) = cbc::unbounded::<ElevatorEvent>();
        let mut elevator = Elevator::new(1, settings()).unwrap();
        elevator.height = f64::from(floor - 1) * 9.0;
        elevator.subscribe(100, events_tx);
        (elevator, events_rx)
    }

    fn passenger(id: usize, weight: f64, floor: u8) -> Passenger {
        Passenger {
            id,
            weight,
            floor,
            dirn: Direction::Up,
        }
    }

    fn tick(elevator: &mut Elevator, n: usize) {
        for _ in 0..n {
            elevator.on_event(Event::OnTick);
        }
    }

    /// Ticks until the doors open, returns the floor they opened on.
    fn tick_until_doors_open(elevator: &mut Elevator, events: &cbc::Receiver<ElevatorEvent>) -> u8 {
        for _ in 0..100 {
            elevator.on_event(Event::OnTick);
            while let Ok(event) = events.try_recv() {
                if let ElevatorEvent::StateChanged { current: State::DoorsOpen, floor, .. } = event {
                    return floor;
                }
            }
        }
        panic!("doors never opened");
    }

    fn drain(events: &cbc::Receiver<ElevatorEvent>) -> Vec<ElevatorEvent> {
        events.try_iter().collect()
    }

    #[test]
    fn it_rejects_non_positive_max_weight() {
        for weight in [0.0, -0.1].iter() {
            let mut s = settings();
            s.max_weight = *weight;
            match Elevator::new(1, s) {
                Err(Error::OutOfRange { name, .. }) => assert_eq!(name, "max_weight"),
                other => panic!("expected out of range, got {:?}", other),
            }
        }
    }

    #[test]
    fn it_starts_ready_on_ground_floor() {
        let elevator = Elevator::new(7, settings()).unwrap();
        assert_eq!(elevator.get_state(), State::Ready);
        assert_eq!(elevator.get_dirn(), Direction::None);
        assert_eq!(elevator.get_floor(), 1);
        assert!(!elevator.is_full());
    }

    #[test]
    fn it_goes_up_when_request_is_above() {
        let (mut elevator, events) = initialize_elevator(2);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(4, Direction::Down),
        });
        tick(&mut elevator, 1);
        assert_eq!(elevator.get_state(), State::Moving);
        assert_eq!(elevator.get_dirn(), Direction::Up);
        assert_eq!(
            drain(&events)[0],
            ElevatorEvent::DirectionChanged { elevator_id: 1, direction: Direction::Up }
        );
    }

    #[test]
    fn it_goes_down_when_request_is_below() {
        let (mut elevator, _events) = initialize_elevator(6);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(2, Direction::Up),
        });
        tick(&mut elevator, 1);
        assert_eq!(elevator.get_state(), State::Moving);
        assert_eq!(elevator.get_dirn(), Direction::Down);
    }

    #[test]
    fn it_opens_door_at_requested_floor() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(4, Direction::Up),
        });
        tick(&mut elevator, 5);
        assert_eq!(elevator.get_state(), State::DoorsOpen);
        assert_eq!(elevator.get_floor(), 4);
        assert!(elevator.get_requests().is_empty());

        let events = drain(&events);
        let floors: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ElevatorEvent::FloorChanged { floor, .. } => Some(*floor),
                _ => None,
            })
            .collect();
        assert_eq!(floors, vec![2, 3, 4]);
        assert_eq!(
            events.last(),
            Some(&ElevatorEvent::StateChanged {
                elevator_id: 1,
                previous: State::Moving,
                current: State::DoorsOpen,
                floor: 4,
            })
        );
    }

    #[test]
    fn it_opens_the_door_when_request_on_current_floor() {
        let (mut elevator, events) = initialize_elevator(3);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(3, Direction::Down),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 3);
        assert_eq!(elevator.get_dirn(), Direction::Down);
        assert_eq!(elevator.get_height(), 18.0);
    }

    #[test]
    fn it_goes_to_ready_when_no_requests_found() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(2, Direction::Up),
        });
        tick_until_doors_open(&mut elevator, &events);
        tick(&mut elevator, 2);
        assert_eq!(elevator.get_state(), State::DoorsClosed);
        tick(&mut elevator, 1);
        assert_eq!(elevator.get_state(), State::Ready);
        assert_eq!(elevator.get_dirn(), Direction::None);
    }

    #[test]
    fn it_stays_closed_while_riders_have_not_chosen() {
        let (mut elevator, _events) = initialize_elevator(1);
        elevator.enter(passenger(1, 150.0, 1)).unwrap();
        tick(&mut elevator, 3);
        assert_eq!(elevator.get_state(), State::DoorsClosed);
        assert_eq!(elevator.get_occupants().len(), 1);
    }

    #[test]
    fn it_refuses_entry_while_moving() {
        let (mut elevator, _events) = initialize_elevator(1);
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(5),
        });
        tick(&mut elevator, 1);
        assert_eq!(elevator.get_state(), State::Moving);
        let p = passenger(1, 150.0, elevator.get_floor());
        assert!(!elevator.can_enter(&p));
        match elevator.enter(p) {
            Err(Error::InvalidOperation(_)) => {}
            other => panic!("expected invalid operation, got {:?}", other),
        }
        assert!(elevator.get_occupants().is_empty());
    }

    #[test]
    fn it_refuses_entry_from_another_floor() {
        let (mut elevator, _events) = initialize_elevator(1);
        assert!(elevator.enter(passenger(1, 150.0, 4)).is_err());
        // the car is sent to fetch the occupant instead
        assert!(elevator.get_requests().has_board_on_floor(4));
    }

    #[test]
    fn it_refuses_exit_while_moving_and_keeps_the_destination() {
        let (mut elevator, _events) = initialize_elevator(1);
        elevator.enter(passenger(1, 150.0, 1)).unwrap();
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(6),
        });
        tick(&mut elevator, 4);
        assert_eq!(elevator.get_state(), State::Moving);
        assert!(!elevator.can_exit(1));
        assert!(elevator.exit(1, Some(6)).is_err());
        assert_eq!(elevator.get_occupants().len(), 1);
        assert!(elevator.get_requests().has_disembark_on_floor(6));
    }

    #[test]
    fn it_refuses_entry_over_max_weight() {
        let (mut elevator, _events) = initialize_elevator(1);
        for id in 0..6 {
            elevator.enter(passenger(id, 150.0, 1)).unwrap();
        }
        assert_eq!(elevator.capacity(), 90.0);
        assert!(!elevator.is_full());

        let heavy = passenger(42, 150.0, 1);
        assert!(!elevator.can_enter(&heavy));
        assert!(elevator.enter(heavy).is_err());
        assert!(elevator.occupants_weight() <= 1000.0);
        assert!(elevator.is_full());
        assert!(elevator.get_requests().board()[0].flagged_for_later);
    }

    #[test]
    fn it_keeps_serving_calls_after_refusing_someone_too_heavy() {
        let (mut elevator, events) = initialize_elevator(1);
        assert!(elevator.enter(passenger(1, 1200.0, 1)).is_err());
        assert!(!elevator.is_full());
        assert!(elevator.get_requests().is_empty());

        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(4, Direction::Down),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 4);
        assert!(!elevator.get_requests().has_board_on_floor(4));
    }

    #[test]
    fn it_defers_board_requests_until_someone_exits() {
        let (mut elevator, events) = initialize_elevator(1);
        for id in 0..5 {
            elevator.enter(passenger(id, 200.0, 1)).unwrap();
        }
        assert_eq!(elevator.capacity(), 100.0);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(3, Direction::Up),
        });
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(6),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 6);
        assert!(elevator.get_requests().board()[0].flagged_for_later);

        assert_eq!(elevator.exit(0, Some(6)), Ok(6));
        assert!(!elevator.is_full());
        assert!(!elevator.get_requests().board()[0].flagged_for_later);
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 3);
    }

    #[test]
    fn it_stops_on_nearest_floor_ahead_first() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.enter(passenger(1, 150.0, 1)).unwrap();
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(5),
        });
        tick(&mut elevator, 3);
        assert_eq!(elevator.get_state(), State::Moving);
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(3),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 3);
        tick(&mut elevator, 2);
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 5);
    }

    #[test]
    fn it_picks_up_along_the_way() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(5, Direction::Up),
        });
        // one tick to depart, one to reach floor 2
        tick(&mut elevator, 2);
        assert_eq!(elevator.get_floor(), 2);
        assert_eq!(elevator.get_state(), State::Moving);

        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(3, Direction::Up),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 3);
        assert_eq!(elevator.get_dirn(), Direction::Up);
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 5);
    }

    #[test]
    fn it_defers_the_floor_just_ahead_to_the_return_sweep() {
        let (mut elevator, events) = initialize_elevator(6);
        // half a floor per tick
        elevator.settings.speed = 9.0;
        elevator.enter(passenger(1, 150.0, 6)).unwrap();
        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(1),
        });
        tick(&mut elevator, 3);
        tick(&mut elevator, 1);
        assert_eq!(elevator.get_state(), State::Moving);
        // between floors 6 and 5, reported as floor 5
        assert_eq!(elevator.get_height(), 40.5);
        assert_eq!(elevator.get_floor(), 5);

        elevator.on_event(Event::OnDisembarkRequest {
            request: DisembarkRequest::new(5),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 1);
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 5);
    }

    #[test]
    fn it_services_next_request_after_doors_closed() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(2, Direction::Up),
        });
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(4, Direction::Down),
        });
        assert_eq!(tick_until_doors_open(&mut elevator, &events), 2);
        tick(&mut elevator, 3);
        assert_eq!(elevator.get_state(), State::Moving);
    }

    #[test]
    fn it_drops_subscribers_that_hung_up() {
        let (mut elevator, events) = initialize_elevator(1);
        let (gone_tx, gone_rx) = cbc::unbounded::<ElevatorEvent>();
        elevator.subscribe(200, gone_tx);
        drop(gone_rx);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(3, Direction::Up),
        });
        tick(&mut elevator, 1);
        assert_eq!(elevator.subscribers.len(), 1);
        assert!(!drain(&events).is_empty());
    }

    #[test]
    fn it_stops_publishing_after_unsubscribe() {
        let (mut elevator, events) = initialize_elevator(1);
        elevator.unsubscribe(100);
        elevator.on_event(Event::OnBoardRequest {
            request: BoardRequest::new(3, Direction::Up),
        });
        tick(&mut elevator, 2);
        assert!(drain(&events).is_empty());
    }
}
