use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use thiserror::Error;

pub const REPORT_USAGE: &str = "** Peer Report Slash Command Help **

  /peer-report [YYYY/MM/DD]

  - The date is optional.

  - Without a date the report starts from this week's Monday.

  - The report covers the given date up to now.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("`{input}` is not a date in YYYY/MM/DD form")]
    InvalidDateFormat { input: String },
}

impl DateError {
    pub fn user_message(&self) -> String {
        format!("Not a valid date.\n\n{REPORT_USAGE}")
    }
}

/// Turns the optional `/peer-report` argument into the start of the report window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateResolver {
    offset: FixedOffset,
}

impl DateResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar date it currently is at the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    pub fn resolve(
        &self,
        argument: Option<&str>,
        today: NaiveDate,
    ) -> Result<DateTime<Utc>, DateError> {
        let argument = argument.map(str::trim).filter(|value| !value.is_empty());
        let date = match argument {
            None => most_recent_monday(today),
            Some(input) => parse_report_date(input)
                .ok_or_else(|| DateError::InvalidDateFormat { input: input.to_owned() })?,
        };

        Ok(self.midnight(date))
    }

    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::default());
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&(local - shift))
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

pub fn most_recent_monday(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// Strict `YYYY/MM/DD`: four-digit year, two-digit month and day.
pub fn parse_report_date(input: &str) -> Option<NaiveDate> {
    let mut parts = input.split('/');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let digits =
        |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
    if !(digits(year, 4) && digits(month, 2) && digits(day, 2)) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
