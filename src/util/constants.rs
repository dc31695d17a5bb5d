pub const ELEV_NUM_FLOORS: u8 = 10;
pub const ELEV_COUNT: usize = 2;
pub const MAX_WEIGHT: f64 = 1000.0;
pub const OCCUPANT_WEIGHT: f64 = 150.0;

/// Ground floor, where every occupant starts.
pub const GROUND_FLOOR: u8 = 1;

pub const TICK_INTERVAL_MS: u64 = 500;
pub const DOOR_OPEN_TIME_MS: u64 = 1000;
/// feet per second
pub const ELEV_SPEED: f64 = 3.0;
/// feet
pub const FLOOR_HEIGHT: f64 = 9.0;

/// Capacity (rounded percent) at which board requests are deferred.
pub const FULL_CAPACITY_PERCENT: f64 = 100.0;

pub const HEIGHT_EPSILON: f64 = 1e-9;
