use time::OffsetDateTime;
use wdm_api::MINUTES_PER_DAY;

/// Local wall clock driving schedules and change stamps.
///
/// A reading of zero means the clock has not been synchronised yet.
pub trait Clock {
    /// Local Unix seconds
    fn now_unix(&self) -> u32;

    fn set_local_unix(&mut self, local: u32);

    /// Advances the clock by one second.
    fn tick(&mut self);

    /// 0 = Monday .. 6 = Sunday
    fn weekday(&self) -> u8 {
        weekday_of(self.now_unix())
    }

    fn minute_of_day(&self) -> u16 {
        minute_of_day_of(self.now_unix())
    }

    fn second(&self) -> u8 {
        (self.now_unix() % 60) as u8
    }

    fn is_set(&self) -> bool {
        self.now_unix() != 0
    }
}

pub fn weekday_of(local: u32) -> u8 {
    match OffsetDateTime::from_unix_timestamp(local as i64) {
        Ok(datetime) => datetime.weekday().number_days_from_monday(),
        // 1970-01-01 was a Thursday
        Err(_) => ((local / 86_400 + 3) % 7) as u8,
    }
}

pub fn minute_of_day_of(local: u32) -> u16 {
    ((local / 60) % MINUTES_PER_DAY as u32) as u16
}

/// Ticker-driven clock. Stays at zero until it is set.
#[derive(Debug, Clone, Default)]
pub struct SoftClock {
    local: u32,
}

impl SoftClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(local: u32) -> Self {
        Self { local }
    }
}

impl Clock for SoftClock {
    fn now_unix(&self) -> u32 {
        self.local
    }

    fn set_local_unix(&mut self, local: u32) {
        log::info!("Clock set to {}", local);
        self.local = local;
    }

    fn tick(&mut self) {
        if self.local != 0 {
            self.local = self.local.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-03 07:30:00, a Wednesday
    const WEDNESDAY_0730: u32 = 1_704_267_000;

    #[test]
    fn test_weekday_and_minute() {
        assert_eq!(weekday_of(0), 3);
        assert_eq!(weekday_of(WEDNESDAY_0730), 2);
        assert_eq!(minute_of_day_of(WEDNESDAY_0730), 450);
    }

    #[test]
    fn test_day_rollover_uses_new_day() {
        let midnight = WEDNESDAY_0730 - 450 * 60 + 86_400;
        assert_eq!(weekday_of(midnight - 1), 2);
        assert_eq!(minute_of_day_of(midnight - 1), 1439);
        assert_eq!(weekday_of(midnight), 3);
        assert_eq!(minute_of_day_of(midnight), 0);
    }

    #[test]
    fn test_soft_clock_only_ticks_once_set() {
        let mut clock = SoftClock::new();
        clock.tick();
        assert!(!clock.is_set());

        clock.set_local_unix(WEDNESDAY_0730);
        clock.tick();
        assert_eq!(clock.now_unix(), WEDNESDAY_0730 + 1);
        assert_eq!(clock.second(), 1);
    }
}
