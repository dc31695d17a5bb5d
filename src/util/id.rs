use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out unique ids for elevators and occupants of one building.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicUsize,
}

impl IdGenerator {
    pub fn new() -> IdGenerator {
        IdGenerator::starting_at(1)
    }

    pub fn starting_at(first: usize) -> IdGenerator {
        IdGenerator {
            next: AtomicUsize::new(first),
        }
    }

    pub fn next_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator::new()
    }
}
