use crate::elevator::fsm::request_list::RequestList;
use crate::request::{Direction, Request};

/// Where the car is and which way it is committed, as seen by the selector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sweep {
    pub floor: u8,
    pub direction: Direction,
    pub moving: bool,
}

/// Picks the request to service next, SCAN style: finish the current sweep
/// before reversing. When `full`, board requests are flagged and skipped.
pub fn next_request(sweep: &Sweep, requests: &mut RequestList, full: bool) -> Option<Request> {
    if full {
        requests.flag_all_board();
    }
    let board = best(sweep, requests.eligible_board().map(|r| Request::Board(*r)));
    let disembark = best(sweep, requests.disembark().iter().map(|r| Request::Disembark(*r)));

    match (board, disembark) {
        (Some(b), Some(d)) => {
            if rank(sweep, b.floor()) < rank(sweep, d.floor()) {
                Some(b)
            } else {
                Some(d)
            }
        }
        (b, d) => d.or(b),
    }
}

/// True if `floor` can still be served without reversing.
pub fn is_ahead(sweep: &Sweep, floor: u8) -> bool {
    match sweep.direction {
        Direction::Up => {
            if sweep.moving {
                floor > sweep.floor
            } else {
                floor >= sweep.floor
            }
        }
        Direction::Down => {
            if sweep.moving {
                floor < sweep.floor
            } else {
                floor <= sweep.floor
            }
        }
        Direction::None => true,
    }
}

fn best<I: Iterator<Item = Request>>(sweep: &Sweep, candidates: I) -> Option<Request> {
    candidates.min_by_key(|r| rank(sweep, r.floor()))
}

/// Requests ahead come before requests behind, nearer before farther. Ahead
/// that is ascending order going up, behind is descending order going up.
fn rank(sweep: &Sweep, floor: u8) -> (bool, u8) {
    let distance = if floor > sweep.floor {
        floor - sweep.floor
    } else {
        sweep.floor - floor
    };
    (!is_ahead(sweep, floor), distance)
}
