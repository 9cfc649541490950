// League calendar: season bounds, Monday-anchored scoring weeks, draft gate.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

/// One scoring week, inclusive of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeek {
    pub number: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScoringWeek {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone)]
pub struct LeagueCalendar {
    season_start: NaiveDate,
    season_end: NaiveDate,
    draft_completed_at: Option<DateTime<Utc>>,
    weeks: Vec<ScoringWeek>,
}

impl LeagueCalendar {
    /// Build a calendar. Week 1 runs from `season_start` to the first Sunday;
    /// every later week runs Monday through Sunday, the last one clipped to
    /// `season_end`.
    pub fn new(season_start: NaiveDate, season_end: NaiveDate, draft_completed_at: Option<DateTime<Utc>>) -> Self {
        let mut weeks = Vec::new();
        let mut start = season_start;
        let mut number = 1;
        while start <= season_end {
            let to_sunday = 6 - start.weekday().num_days_from_monday() as i64;
            let end = (start + Duration::days(to_sunday)).min(season_end);
            weeks.push(ScoringWeek { number, start, end });
            start = end + Duration::days(1);
            number += 1;
        }
        LeagueCalendar {
            season_start,
            season_end,
            draft_completed_at,
            weeks,
        }
    }

    pub fn season_start(&self) -> NaiveDate {
        self.season_start
    }

    pub fn season_end(&self) -> NaiveDate {
        self.season_end
    }

    pub fn weeks(&self) -> &[ScoringWeek] {
        &self.weeks
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.season_start <= date && date <= self.season_end
    }

    pub fn week_of(&self, date: NaiveDate) -> Option<&ScoringWeek> {
        self.weeks.iter().find(|w| w.contains(date))
    }

    /// The week containing `today`; the first week before the season and the
    /// last week after it.
    pub fn current_week(&self, today: NaiveDate) -> Option<&ScoringWeek> {
        if today < self.season_start {
            return self.weeks.first();
        }
        self.week_of(today).or_else(|| self.weeks.last())
    }

    /// Whether rosters exist yet. A calendar with no draft time is always open.
    pub fn is_draft_complete(&self, now: DateTime<Utc>) -> bool {
        self.draft_completed_at.map_or(true, |at| at <= now)
    }

    /// First day of the week after `date`'s, if the season has one.
    pub fn next_week_start(&self, date: NaiveDate) -> Option<NaiveDate> {
        let days = 7 - date.weekday().num_days_from_monday() as i64;
        let next = date + Duration::days(days);
        debug_assert_eq!(next.weekday(), Weekday::Mon);
        self.contains(next).then_some(next)
    }
}
