use crossbeam_channel as cbc;
use std::thread;

use crate::elevator::fsm::elevatorfsm::ElevatorEvent;
use crate::occupant::occupant::{Occupant, OccupantInfo};
use crate::request::Direction;
use crate::util::error::{Error, Result};

pub enum Command {
    RequestElevator {
        dirn: Direction,
        reply: cbc::Sender<Result<usize>>,
    },
    RequestFloor {
        floor: u8,
        reply: cbc::Sender<Result<()>>,
    },
    GetInfo {
        reply: cbc::Sender<OccupantInfo>,
    },
    Shutdown,
}

/// What a client holds on to for the length of a session.
#[derive(Clone, Debug)]
pub struct OccupantHandle {
    id: usize,
    tx: cbc::Sender<Command>,
}

impl OccupantHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the id of the elevator the call went to.
    pub fn request_elevator(&self, dirn: Direction) -> Result<usize> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::RequestElevator { dirn, reply })?;
        rx.recv().map_err(|_| self.disconnected())?
    }

    pub fn request_floor(&self, floor: u8) -> Result<()> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::RequestFloor { floor, reply })?;
        rx.recv().map_err(|_| self.disconnected())?
    }

    pub fn info(&self) -> Result<OccupantInfo> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::GetInfo { reply })?;
        rx.recv().map_err(|_| self.disconnected())
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| self.disconnected())
    }

    fn disconnected(&self) -> Error {
        Error::Disconnected(format!("occupant {}", self.id))
    }
}

/// Starts the occupant thread. `elevator_events` must be the receiving end of
/// the sender the occupant subscribes with.
pub fn spawn(
    occupant: Occupant,
    elevator_events: cbc::Receiver<ElevatorEvent>,
) -> Result<(OccupantHandle, thread::JoinHandle<()>)> {
    let id = occupant.get_id();
    let (tx, rx) = cbc::unbounded::<Command>();
    let join = thread::Builder::new()
        .name(format!("occupant-{}", id))
        .spawn(move || run(occupant, rx, elevator_events))
        .map_err(|e| Error::Disconnected(format!("occupant {} failed to start: {}", id, e)))?;
    Ok((OccupantHandle { id, tx }, join))
}

pub fn run(mut occupant: Occupant, commands: cbc::Receiver<Command>, elevator_events: cbc::Receiver<ElevatorEvent>) {
    log::debug!("occupant {} started", occupant.get_id());
    loop {
        cbc::select! {
            recv(commands) -> msg => {
                match msg {
                    Ok(Command::RequestElevator { dirn, reply }) => {
                        let _ = reply.send(occupant.request_elevator(dirn));
                    }
                    Ok(Command::RequestFloor { floor, reply }) => {
                        let _ = reply.send(occupant.request_floor(floor));
                    }
                    Ok(Command::GetInfo { reply }) => {
                        let _ = reply.send(occupant.get_info());
                    }
                    Ok(Command::Shutdown) | Err(_) => break,
                }
            },
            recv(elevator_events) -> msg => {
                match msg {
                    Ok(event) => occupant.on_elevator_event(event),
                    Err(_) => break,
                }
            }
        }
    }
    occupant.leave();
    log::debug!("occupant {} stopped", occupant.get_id());
}
