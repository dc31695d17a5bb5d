use crate::elevator::actor::ElevatorHandle;
use crate::elevator::fsm::elevatorfsm::{ElevatorInfo, State};
use crate::request::{BoardRequest, Direction};
use crate::util::error::{Error, Result};

/// Sends board requests to the elevator best placed to serve them.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    elevators: Vec<ElevatorHandle>,
}

impl Dispatcher {
    pub fn new(elevators: Vec<ElevatorHandle>) -> Dispatcher {
        Dispatcher { elevators }
    }

    pub fn elevators(&self) -> &[ElevatorHandle] {
        &self.elevators
    }

    pub fn elevator(&self, id: usize) -> Option<&ElevatorHandle> {
        self.elevators.iter().find(|e| e.id() == id)
    }

    /// Queues `request` on the chosen elevator and returns its id.
    pub fn dispatch(&self, request: BoardRequest) -> Result<usize> {
        let infos = self
            .elevators
            .iter()
            .map(|e| e.info())
            .collect::<Result<Vec<ElevatorInfo>>>()?;
        let index = choose_elevator(&infos, &request)
            .ok_or_else(|| Error::invalid_operation("building has no elevators"))?;
        let elevator = &self.elevators[index];
        log::debug!(
            "dispatching {:?} from floor {} to elevator {}",
            request.direction,
            request.floor,
            elevator.id()
        );
        elevator.add_board_request(request)?;
        Ok(elevator.id())
    }
}

/// Picks the index of the elevator that should serve `request`.
///
/// An elevator already heading the requested way that has not passed the
/// floor wins. Otherwise the nearest one that is not full, and the first
/// elevator when every car is full.
pub fn choose_elevator(elevators: &[ElevatorInfo], request: &BoardRequest) -> Option<usize> {
    if elevators.is_empty() {
        return None;
    }

    let along_the_way = elevators
        .iter()
        .enumerate()
        .filter(|(_, e)| is_on_the_way(e, request))
        .min_by_key(|(_, e)| distance(e, request));
    if let Some((index, _)) = along_the_way {
        return Some(index);
    }

    let nearest = elevators
        .iter()
        .enumerate()
        .min_by_key(|(_, e)| distance(e, request))
        .map(|(index, _)| index)?;
    if !elevators[nearest].full {
        return Some(nearest);
    }

    let nearest_with_room = elevators
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.full)
        .min_by_key(|(_, e)| distance(e, request))
        .map(|(index, _)| index);
    Some(nearest_with_room.unwrap_or(0))
}

fn is_on_the_way(elevator: &ElevatorInfo, request: &BoardRequest) -> bool {
    if elevator.state != State::Moving || elevator.dirn != request.direction {
        return false;
    }
    match request.direction {
        Direction::Up => elevator.floor < request.floor,
        Direction::Down => elevator.floor > request.floor,
        Direction::None => false,
    }
}

fn distance(elevator: &ElevatorInfo, request: &BoardRequest) -> u8 {
    if elevator.floor > request.floor {
        elevator.floor - request.floor
    } else {
        request.floor - elevator.floor
    }
}
