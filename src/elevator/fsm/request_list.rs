//! Pending board and disembark requests of a single elevator.
use serde;
use std::vec::Vec;

use crate::request::{BoardRequest, DisembarkRequest};

/// Utility struct for managing the requests queued on one elevator
///
/// # Example
/// ```rust
/// use elevator::elevator::fsm::request_list::RequestList;
/// use elevator::request::{BoardRequest, Direction};
/// let mut requests = RequestList::new();
/// requests.add_board(BoardRequest::new(3, Direction::Up));
/// assert!(requests.has_board_on_floor(3));
/// ```
///
#[derive(PartialEq, Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct RequestList {
    board: Vec<BoardRequest>,
    disembark: Vec<DisembarkRequest>,
}

impl RequestList {
    pub fn new() -> RequestList {
        RequestList {
            board: Vec::new(),
            disembark: Vec::new(),
        }
    }

    pub fn board(&self) -> &[BoardRequest] {
        &self.board
    }

    pub fn disembark(&self) -> &[DisembarkRequest] {
        &self.disembark
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty() && self.disembark.is_empty()
    }

    /// Adds a board request unless an equal one is queued. Returns true if it was added.
    ///
    /// A queued flagged request is kept flagged: it is released by the next exit.
    pub fn add_board(&mut self, request: BoardRequest) -> bool {
        if self.board.contains(&request) {
            return false;
        }
        self.board.push(request);
        true
    }

    /// Adds a disembark request unless one for the same floor is queued.
    pub fn add_disembark(&mut self, request: DisembarkRequest) -> bool {
        if self.disembark.contains(&request) {
            return false;
        }
        self.disembark.push(request);
        true
    }

    pub fn has_board_on_floor(&self, floor: u8) -> bool {
        self.board.iter().any(|r| r.floor == floor)
    }

    pub fn has_disembark_on_floor(&self, floor: u8) -> bool {
        self.disembark.iter().any(|r| r.floor == floor)
    }

    /// Clears every board request on the specified floor
    ///
    /// `floor` - Floor to clear
    pub fn clear_board_on_floor(&mut self, floor: u8) -> usize {
        let before = self.board.len();
        self.board.retain(|r| r.floor != floor);
        before - self.board.len()
    }

    /// Clears the disembark request on the specified floor
    pub fn clear_disembark_on_floor(&mut self, floor: u8) -> usize {
        let before = self.disembark.len();
        self.disembark.retain(|r| r.floor != floor);
        before - self.disembark.len()
    }

    /// Marks every board request as deferred until capacity frees up.
    pub fn flag_all_board(&mut self) {
        for r in self.board.iter_mut() {
            r.flagged_for_later = true;
        }
    }

    pub fn unflag_all_board(&mut self) {
        for r in self.board.iter_mut() {
            r.flagged_for_later = false;
        }
    }

    /// Board requests that may be serviced right now.
    pub fn eligible_board(&self) -> impl Iterator<Item = &BoardRequest> {
        self.board.iter().filter(|r| !r.flagged_for_later)
    }
}
