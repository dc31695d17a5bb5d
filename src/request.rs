//! Floor requests: calls made from a floor and destinations chosen inside a car.
use serde;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    None,
    Up,
    Down,
}

impl Direction {
    /// Direction of travel needed to get from `from` to `to`.
    pub fn between(from: u8, to: u8) -> Direction {
        if to > from {
            Direction::Up
        } else if to < from {
            Direction::Down
        } else {
            Direction::None
        }
    }

    pub fn is_travel(self) -> bool {
        self != Direction::None
    }
}

/// A call for an elevator made from a floor.
///
/// `flagged_for_later` marks a request skipped because its elevator is full.
/// It is not part of the request's identity.
#[derive(Copy, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BoardRequest {
    pub floor: u8,
    pub direction: Direction,
    pub flagged_for_later: bool,
}

impl BoardRequest {
    pub fn new(floor: u8, direction: Direction) -> BoardRequest {
        BoardRequest {
            floor,
            direction,
            flagged_for_later: false,
        }
    }

    pub fn flagged(mut self) -> BoardRequest {
        self.flagged_for_later = true;
        self
    }
}

impl PartialEq for BoardRequest {
    fn eq(&self, other: &Self) -> bool {
        self.floor == other.floor && self.direction == other.direction
    }
}

impl Eq for BoardRequest {}

/// A destination selected from inside a car.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DisembarkRequest {
    pub floor: u8,
}

impl DisembarkRequest {
    pub fn new(floor: u8) -> DisembarkRequest {
        DisembarkRequest { floor }
    }
}

/// The request an elevator is currently servicing. A board request never
/// equals a disembark request, even on the same floor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Request {
    Board(BoardRequest),
    Disembark(DisembarkRequest),
}

impl Request {
    pub fn floor(&self) -> u8 {
        match self {
            Request::Board(r) => r.floor,
            Request::Disembark(r) => r.floor,
        }
    }
}

impl From<BoardRequest> for Request {
    fn from(r: BoardRequest) -> Self {
        Request::Board(r)
    }
}

impl From<DisembarkRequest> for Request {
    fn from(r: DisembarkRequest) -> Self {
        Request::Disembark(r)
    }
}
