use std::time::{Instant, SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time-of-day source for the clock face.
///
/// Starts from a wall-clock reading (UTC) or an explicit time, then advances with the
/// monotonic clock, optionally sped up by `time_scale`.
#[derive(Debug, Clone)]
pub struct DayClock {
    origin_seconds: f64,
    origin: Instant,
    time_scale: f64,
}

impl DayClock {
    /// Real time, starting from the current UTC time of day.
    pub fn wall() -> Self {
        Self::starting_at(wall_seconds_of_day(), 1.0)
    }

    /// Starts at `seconds_of_day` and runs `time_scale` times faster than real time.
    pub fn starting_at(seconds_of_day: f64, time_scale: f64) -> Self {
        Self {
            origin_seconds: seconds_of_day.rem_euclid(SECONDS_PER_DAY),
            origin: Instant::now(),
            time_scale,
        }
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Current time of day in seconds, in `[0, 86400)`.
    pub fn seconds_of_day(&self) -> f64 {
        self.seconds_at(Instant::now())
    }

    pub fn seconds_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.origin).as_secs_f64();
        (self.origin_seconds + elapsed * self.time_scale).rem_euclid(SECONDS_PER_DAY)
    }
}

fn wall_seconds_of_day() -> f64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64().rem_euclid(SECONDS_PER_DAY),
        Err(e) => {
            log::warn!("system clock before unix epoch ({e}); starting at midnight");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_at_given_time() {
        let clock = DayClock::starting_at(3_600.0, 1.0);
        assert_eq!(clock.seconds_at(clock.origin), 3_600.0);
    }

    #[test]
    fn scaled_time_advances_faster() {
        let clock = DayClock::starting_at(0.0, 60.0);
        let t = clock.seconds_at(clock.origin + Duration::from_secs(2));
        assert!((t - 120.0).abs() < 1e-9);
    }

    #[test]
    fn wraps_at_midnight() {
        let clock = DayClock::starting_at(86_399.0, 1.0);
        let t = clock.seconds_at(clock.origin + Duration::from_secs(3));
        assert!((t - 2.0).abs() < 1e-9);
        assert_eq!(DayClock::starting_at(-1.0, 1.0).seconds_at(Instant::now()).floor(), 86_399.0);
    }

    #[test]
    fn wall_clock_is_within_a_day() {
        let t = DayClock::wall().seconds_of_day();
        assert!((0.0..SECONDS_PER_DAY).contains(&t));
    }
}
