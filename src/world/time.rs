/// Calendar time of the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameTime {
    pub year: i32,
    /// 1-based month
    pub month: u32,
    /// 1-based day of month
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && !(year % 100 == 0 && year % 400 != 0)
}

impl GameTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self { year, month, day, hour, minute, second }
    }

    /// Fraction of the day used to rotate the sun, offset so that 06:00 is 0.
    pub fn daylight(&self) -> f64 {
        let seconds = (((self.hour + 18) % 24) * 60 + self.minute) * 60 + self.second;
        seconds as f64 / 86_400.0
    }

    /// Fraction of the current day elapsed since midnight.
    pub fn day_fraction(&self) -> f64 {
        ((self.hour * 60 + self.minute) * 60 + self.second) as f64 / 86_400.0
    }

    fn days_in_month(&self) -> u32 {
        if self.month == 2 && is_leap_year(self.year) {
            29
        } else {
            MONTH_DAYS[(self.month as usize).saturating_sub(1).min(11)]
        }
    }

    /// Move the clock forward, rolling over days, months and years.
    pub fn advance_seconds(&mut self, seconds: u64) {
        let total = self.second as u64 + seconds;
        self.second = (total % 60) as u32;
        let total = self.minute as u64 + total / 60;
        self.minute = (total % 60) as u32;
        let total = self.hour as u64 + total / 60;
        self.hour = (total % 24) as u32;

        let mut days = total / 24;
        while days > 0 {
            days -= 1;
            self.day += 1;
            if self.day > self.days_in_month() {
                self.day = 1;
                self.month += 1;
                if self.month > 12 {
                    self.month = 1;
                    self.year += 1;
                }
            }
        }
    }
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(1999, 1, 1, 12, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daylight_offset() {
        assert_eq!(GameTime::new(1999, 1, 1, 6, 0, 0).daylight(), 0.0);
        assert_eq!(GameTime::new(1999, 1, 1, 18, 0, 0).daylight(), 0.5);
    }

    #[test]
    fn test_rollover_leap_year() {
        let mut time = GameTime::new(2000, 2, 28, 23, 59, 30);
        time.advance_seconds(60);
        assert_eq!((time.month, time.day, time.hour, time.minute, time.second), (2, 29, 0, 0, 30));

        let mut time = GameTime::new(1999, 12, 31, 23, 0, 0);
        time.advance_seconds(3600);
        assert_eq!((time.year, time.month, time.day, time.hour), (2000, 1, 1, 0));
    }

    #[test]
    fn test_leap_rules() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(1996));
        assert!(!is_leap_year(1999));
    }
}
