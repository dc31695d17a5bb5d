//! Runs one elevator on its own thread. Ticks and commands from the outside
//! are processed one at a time, so the state machine never needs a lock.
use crossbeam_channel as cbc;
use std::thread;
use std::time::Duration;

use crate::elevator::fsm::elevatorfsm::{Elevator, ElevatorEvent, ElevatorInfo, Event, Passenger};
use crate::request::{BoardRequest, DisembarkRequest};
use crate::util::error::{Error, Result};

pub enum Command {
    AddBoardRequest(BoardRequest),
    AddDisembarkRequest(DisembarkRequest),
    Enter {
        passenger: Passenger,
        reply: cbc::Sender<Result<()>>,
    },
    Exit {
        occupant_id: usize,
        destination: Option<u8>,
        reply: cbc::Sender<Result<u8>>,
    },
    CanEnter {
        passenger: Passenger,
        reply: cbc::Sender<bool>,
    },
    GetInfo {
        reply: cbc::Sender<ElevatorInfo>,
    },
    Subscribe {
        subscriber_id: usize,
        tx: cbc::Sender<ElevatorEvent>,
    },
    Unsubscribe {
        subscriber_id: usize,
    },
    Shutdown,
}

/// Cheap to clone, every clone talks to the same elevator thread.
#[derive(Clone, Debug)]
pub struct ElevatorHandle {
    id: usize,
    tx: cbc::Sender<Command>,
}

impl ElevatorHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn add_board_request(&self, request: BoardRequest) -> Result<()> {
        self.send(Command::AddBoardRequest(request))
    }

    pub fn add_disembark_request(&self, request: DisembarkRequest) -> Result<()> {
        self.send(Command::AddDisembarkRequest(request))
    }

    pub fn enter(&self, passenger: Passenger) -> Result<()> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::Enter { passenger, reply })?;
        rx.recv().map_err(|_| self.disconnected())?
    }

    /// Returns the floor the occupant got off on.
    pub fn exit(&self, occupant_id: usize, destination: Option<u8>) -> Result<u8> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::Exit {
            occupant_id,
            destination,
            reply,
        })?;
        rx.recv().map_err(|_| self.disconnected())?
    }

    pub fn can_enter(&self, passenger: Passenger) -> Result<bool> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::CanEnter { passenger, reply })?;
        rx.recv().map_err(|_| self.disconnected())
    }

    pub fn info(&self) -> Result<ElevatorInfo> {
        let (reply, rx) = cbc::bounded(1);
        self.send(Command::GetInfo { reply })?;
        rx.recv().map_err(|_| self.disconnected())
    }

    pub fn subscribe(&self, subscriber_id: usize, tx: cbc::Sender<ElevatorEvent>) -> Result<()> {
        self.send(Command::Subscribe { subscriber_id, tx })
    }

    pub fn unsubscribe(&self, subscriber_id: usize) -> Result<()> {
        self.send(Command::Unsubscribe { subscriber_id })
    }

    pub fn shutdown(&self) {
        // already gone is fine
        let _ = self.tx.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| self.disconnected())
    }

    fn disconnected(&self) -> Error {
        Error::Disconnected(format!("elevator {}", self.id))
    }
}

/// Starts the elevator thread. `tick_interval` is the wall-clock period of the ticker.
pub fn spawn(elevator: Elevator, tick_interval: Duration) -> Result<(ElevatorHandle, thread::JoinHandle<()>)> {
    let id = elevator.get_id();
    let (tx, rx) = cbc::unbounded::<Command>();
    let join = thread::Builder::new()
        .name(format!("elevator-{}", id))
        .spawn(move || run(elevator, rx, tick_interval))
        .map_err(|e| Error::Disconnected(format!("elevator {} failed to start: {}", id, e)))?;
    Ok((ElevatorHandle { id, tx }, join))
}

/// The elevator loop. The ticker holds at most one pending tick, so a slow
/// iteration skips ticks instead of piling them up.
pub fn run(mut elevator: Elevator, commands: cbc::Receiver<Command>, tick_interval: Duration) {
    let ticker = cbc::tick(tick_interval);
    log::info!("elevator {} started", elevator.get_id());
    loop {
        cbc::select! {
            recv(commands) -> msg => {
                match msg {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(command) => on_command(&mut elevator, command),
                }
            },
            recv(ticker) -> _ => {
                elevator.on_event(Event::OnTick);
            }
        }
    }
    log::info!("elevator {} stopped", elevator.get_id());
}

fn on_command(elevator: &mut Elevator, command: Command) {
    match command {
        Command::AddBoardRequest(request) => elevator.on_event(Event::OnBoardRequest { request }),
        Command::AddDisembarkRequest(request) => elevator.on_event(Event::OnDisembarkRequest { request }),
        Command::Enter { passenger, reply } => {
            let result = elevator.enter(passenger);
            if let Err(e) = &result {
                log::warn!("{}", e);
            }
            let _ = reply.send(result);
        }
        Command::Exit {
            occupant_id,
            destination,
            reply,
        } => {
            let result = elevator.exit(occupant_id, destination);
            if let Err(e) = &result {
                log::warn!("{}", e);
            }
            let _ = reply.send(result);
        }
        Command::CanEnter { passenger, reply } => {
            let _ = reply.send(elevator.can_enter(&passenger));
        }
        Command::GetInfo { reply } => {
            let _ = reply.send(elevator.get_info());
        }
        Command::Subscribe { subscriber_id, tx } => elevator.subscribe(subscriber_id, tx),
        Command::Unsubscribe { subscriber_id } => elevator.unsubscribe(subscriber_id),
        Command::Shutdown => {}
    }
}
