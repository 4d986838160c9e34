use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::dimension::SurrogateKey;

/// Row of `dim_date`. Keyed on the full source timestamp; the calendar
/// columns come from its date part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRow {
    pub date_id: SurrogateKey,
    pub date: NaiveDateTime,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub month_name: String,
    pub day: u32,
    pub day_name: String,
    /// Monday = 0 .. Sunday = 6.
    pub week_day: u32,
}

impl DateRow {
    pub fn derive(date_id: SurrogateKey, timestamp: NaiveDateTime) -> Self {
        let date = timestamp.date();
        Self {
            date_id,
            date: timestamp,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            month_name: date.format("%B").to_string(),
            day: date.day(),
            day_name: date.format("%A").to_string(),
            week_day: date.weekday().num_days_from_monday(),
        }
    }
}
