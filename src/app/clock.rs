use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::Instant;

/// Wall-clock time anchored to the uptime counter by the last time sync.
pub struct WallClock {
    anchor: Mutex<CriticalSectionRawMutex, Cell<Option<(u64, Instant)>>>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
        }
    }

    /// Record that it was `unix_seconds` at uptime `at`.
    pub fn set(&self, unix_seconds: u64, at: Instant) {
        self.anchor.lock(|anchor| anchor.set(Some((unix_seconds, at))));
    }

    /// Unix seconds at uptime `at`, if the clock was ever synced.
    pub fn unix_time_at(&self, at: Instant) -> Option<u64> {
        let (unix_seconds, anchor) = self.anchor.lock(Cell::get)?;
        let elapsed = at.checked_duration_since(anchor).unwrap_or_default();
        Some(unix_seconds + elapsed.as_secs())
    }

    pub fn unix_time(&self) -> Option<u64> {
        self.unix_time_at(Instant::now())
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use embassy_time::Duration;

    use super::*;

    #[test]
    fn unsynced_clock_has_no_time() {
        let clock = WallClock::new();
        assert_eq!(clock.unix_time_at(Instant::from_secs(10)), None);
    }

    #[test]
    fn advances_with_uptime() {
        let clock = WallClock::new();
        let anchor = Instant::from_secs(100);
        clock.set(1_700_000_000, anchor);

        assert_eq!(clock.unix_time_at(anchor), Some(1_700_000_000));
        assert_eq!(
            clock.unix_time_at(anchor + Duration::from_secs(90)),
            Some(1_700_000_090)
        );
        assert_eq!(
            clock.unix_time_at(Instant::from_secs(50)),
            Some(1_700_000_000)
        );
    }
}
