use crate::Delay;
use spin_sleep::SpinSleeper;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// A [Delay] that busy-waits instead of yielding to the scheduler.
///
/// It spins for the whole of any sub-second wait.
pub struct SpinDelay {
    sleeper: SpinSleeper,
}

impl SpinDelay {
    pub fn new() -> Self {
        Self {
            sleeper: SpinSleeper::new(999_999_999),
        }
    }
}

impl Default for SpinDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SpinDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpinDelay({}ns)", self.sleeper.native_accuracy_ns())
    }
}

impl Delay for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        self.sleeper.sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeper.sleep(Duration::from_millis(ms as u64));
    }
}
