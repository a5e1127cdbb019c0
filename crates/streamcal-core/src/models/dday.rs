use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum DDayType {
    Birthday,
    Debut,
    Anniversary,
    #[serde(other)]
    Event,
}

impl DDayType {
    /// Birthdays and anniversaries come back every year on the same day.
    pub fn is_yearly(&self) -> bool {
        !matches!(self, DDayType::Event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DDayItem {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(rename = "type")]
    pub kind: DDayType,
}

impl DDayItem {
    /// Date the marker falls on in `year`, or `None` if a one-off event is in another year.
    pub fn occurrence_in(&self, year: i32) -> Option<NaiveDate> {
        if !self.kind.is_yearly() {
            return (self.date.year() == year).then_some(self.date);
        }
        if year < self.date.year() {
            return None;
        }
        NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.occurrence_in(date.year()) == Some(date)
    }

    /// Countdown label relative to `today`: `D-3`, `D-Day` or `D+12`.
    ///
    /// Yearly markers count down to the next occurrence; one-off events count
    /// up once they have passed.
    pub fn label(&self, today: NaiveDate) -> String {
        let target = if self.kind.is_yearly() {
            self.occurrence_in(today.year())
                .filter(|d| *d >= today)
                .or_else(|| self.occurrence_in(today.year() + 1))
                .unwrap_or(self.date)
        } else {
            self.date
        };
        let days = (target - today).num_days();
        match days {
            0 => "D-Day".to_string(),
            d if d > 0 => format!("D-{}", d),
            d => format!("D+{}", -d),
        }
    }
}
