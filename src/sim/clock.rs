use super::types::{DT_HOURS, STEPS_PER_DAY};

/// Calendar position of one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTime {
    /// Step index from the start of the run.
    pub step: usize,
    /// Day index from the start of the run.
    pub day: usize,
    /// Slot within the day, `0..STEPS_PER_DAY`.
    pub slot: usize,
    /// Hour of the day in `[0, 24)`.
    pub time_of_day: f64,
    /// `0` = Monday through `6` = Sunday.
    pub weekday: u8,
}

impl SimTime {
    /// Whether this step opens a new day.
    pub fn is_day_start(&self) -> bool {
        self.slot == 0
    }

    /// Hours since the start of the run.
    pub fn hours_elapsed(&self) -> f64 {
        self.step as f64 * DT_HOURS
    }
}

/// A simulation clock that walks fixed half-hour steps over whole days.
///
/// # Examples
///
/// ```
/// use ev_roi_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(2, 6);
/// let mut days = Vec::new();
///
/// clock.run(|t| if t.is_day_start() { days.push(t.weekday) });
/// assert_eq!(days, vec![6, 0]);
/// ```
pub struct Clock {
    /// Next step to hand out.
    current: usize,
    /// Total steps in the run.
    total: usize,
    start_weekday: u8,
}

impl Clock {
    /// Creates a clock covering `days` whole days.
    ///
    /// # Arguments
    ///
    /// * `days` - Number of days to cover
    /// * `start_weekday` - Weekday of day 0 (`0` = Monday)
    pub fn new(days: usize, start_weekday: u8) -> Self {
        Self {
            current: 0,
            total: days * STEPS_PER_DAY,
            start_weekday: start_weekday % 7,
        }
    }

    /// Total number of steps the clock covers.
    pub fn total_steps(&self) -> usize {
        self.total
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(time)` - The position of the step just handed out
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<SimTime> {
        if self.current >= self.total {
            return None;
        }
        let step = self.current;
        self.current += 1;
        let day = step / STEPS_PER_DAY;
        let slot = step % STEPS_PER_DAY;
        Some(SimTime {
            step,
            day,
            slot,
            time_of_day: slot as f64 * DT_HOURS,
            weekday: ((usize::from(self.start_weekday) + day) % 7) as u8,
        })
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(SimTime)) {
        while let Some(time) = self.tick() {
            f(time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_whole_days() {
        let clock = Clock::new(3, 0);
        assert_eq!(clock.total_steps(), 144);
    }

    #[test]
    fn tick_reports_time_of_day() {
        let mut clock = Clock::new(1, 0);
        let first = clock.tick();
        let second = clock.tick();
        assert_eq!(first.map(|t| t.time_of_day), Some(0.0));
        assert_eq!(second.map(|t| t.time_of_day), Some(0.5));
    }

    #[test]
    fn weekday_wraps_after_sunday() {
        let mut clock = Clock::new(3, 5);
        let mut weekdays = Vec::new();
        clock.run(|t| {
            if t.is_day_start() {
                weekdays.push(t.weekday);
            }
        });
        assert_eq!(weekdays, vec![5, 6, 0]);
    }

    #[test]
    fn last_step_is_late_evening() {
        let mut clock = Clock::new(1, 0);
        let mut last = None;
        clock.run(|t| last = Some(t));
        assert_eq!(last.map(|t| t.time_of_day), Some(23.5));
        assert_eq!(last.map(|t| t.step), Some(47));
    }

    #[test]
    fn empty_clock() {
        let mut clock = Clock::new(0, 0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }
}
