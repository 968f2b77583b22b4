//! World clock and season derivation.
//!
//! The day counter is the single source of truth for simulated time; the
//! season is always derived from it, never stored. A year is 365 days:
//! Spring, Summer and Autumn last 90 days each and Winter takes the
//! remaining 95.

use stoneage_types::Season;

/// Days in one simulated year.
pub const DAYS_PER_YEAR: u64 = 365;

/// Days in each of the first three seasons.
const DAYS_PER_SEASON: u64 = 90;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Day counter would overflow.
    #[error("day counter overflow: cannot advance beyond u64::MAX")]
    DayOverflow,
}

/// Season of a given day.
pub const fn season_for_day(day: u64) -> Season {
    let day_of_year = day % DAYS_PER_YEAR;
    if day_of_year < DAYS_PER_SEASON {
        Season::Spring
    } else if day_of_year < DAYS_PER_SEASON * 2 {
        Season::Summer
    } else if day_of_year < DAYS_PER_SEASON * 3 {
        Season::Autumn
    } else {
        Season::Winter
    }
}

/// World clock tracking the current day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldClock {
    day: u64,
}

impl WorldClock {
    /// A clock at day 0.
    pub const fn new() -> Self {
        Self { day: 0 }
    }

    /// A clock at an explicit day (state restoration and tests).
    pub const fn from_day(day: u64) -> Self {
        Self { day }
    }

    /// Advance by one day. Returns the new day.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::DayOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.day = self.day.checked_add(1).ok_or(ClockError::DayOverflow)?;
        Ok(self.day)
    }

    /// Current day.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// Current season.
    pub const fn season(&self) -> Season {
        season_for_day(self.day)
    }

    /// Whole years elapsed.
    pub const fn year(&self) -> u64 {
        self.day / DAYS_PER_YEAR
    }

    /// Whether `self.day` is a multiple of `interval`. A zero interval never
    /// matches.
    pub const fn is_every(&self, interval: u64) -> bool {
        match self.day.checked_rem(interval) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}
