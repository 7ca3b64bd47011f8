use chrono::{DateTime, Utc};
use ekklesia_application::Clock;

/// Wall-clock [`Clock`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
