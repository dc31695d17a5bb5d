use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerCommand {
    Start,
    Cancel,
}

/// Door timer running on the elevator's simulated clock. `now` is the time
/// elapsed since the elevator started, advanced one tick at a time.
#[derive(Clone, Copy, Debug)]
pub struct DoorTimer {
    opened_at: Option<Duration>,
    timeout_time: Duration,
}

impl DoorTimer {
    pub fn new(timeout_time: Duration) -> DoorTimer {
        DoorTimer {
            opened_at: None,
            timeout_time,
        }
    }

    pub fn on_command(&mut self, command: TimerCommand, now: Duration) {
        match command {
            TimerCommand::Start => self.start(now),
            TimerCommand::Cancel => self.cancel(),
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.opened_at = Some(now);
    }

    pub fn cancel(&mut self) {
        self.opened_at = None;
    }

    pub fn did_expire(&mut self, now: Duration) -> bool {
        match self.opened_at {
            Some(start) if now.saturating_sub(start) >= self.timeout_time => {
                self.opened_at = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_expires_once_after_timeout() {
        let mut timer = DoorTimer::new(Duration::from_millis(1000));
        timer.on_command(TimerCommand::Start, Duration::from_millis(500));
        assert!(!timer.did_expire(Duration::from_millis(1000)));
        assert!(timer.did_expire(Duration::from_millis(1500)));
        assert!(!timer.did_expire(Duration::from_millis(2000)));
        assert!(!timer.did_expire(Duration::from_secs(60)));
    }

    #[test]
    fn it_restarts_from_the_latest_start() {
        let mut timer = DoorTimer::new(Duration::from_millis(1000));
        timer.start(Duration::from_millis(0));
        timer.start(Duration::from_millis(800));
        assert!(!timer.did_expire(Duration::from_millis(1500)));
        assert!(timer.did_expire(Duration::from_millis(1800)));
    }

    #[test]
    fn it_never_expires_when_cancelled() {
        let mut timer = DoorTimer::new(Duration::from_millis(10));
        timer.start(Duration::from_millis(0));
        timer.on_command(TimerCommand::Cancel, Duration::from_millis(5));
        assert!(!timer.did_expire(Duration::from_secs(60)));
    }
}
