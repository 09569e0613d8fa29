use calamine::Data;
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

static EMPTY_CELL: Data = Data::Empty;

/// A sheet as loaded: header row plus data rows, cells passed through verbatim.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl Table {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<Data>>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Index of the column whose header is exactly `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `idx` in `row`; short rows read as empty.
    pub fn cell(row: &[Data], idx: usize) -> &Data {
        row.get(idx).unwrap_or(&EMPTY_CELL)
    }
}

/// Calendar year-month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    #[cfg(test)]
    pub(crate) fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(dt: &NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Channel value before output typing. Integral values group as numbers,
/// anything else is kept as its text so the coercer can reject it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelId {
    Number(i64),
    Label(String),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Number(n) => write!(f, "{}", n),
            ChannelId::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub date: Option<NaiveDateTime>,
    pub month: Option<Month>,
    pub programme: String,
    pub territory: String,
    pub channel: Option<ChannelId>,
    pub viewers: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    /// Position in join output order, used for first-occurrence tie-breaks.
    pub row: usize,
    pub producer: String,
    pub viewing: NormalizedRecord,
}

/// One (Producer, Month, Channel) group before output typing.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub producer: String,
    pub month: Month,
    pub channel: ChannelId,
    pub top_programme: String,
    pub highest_viewers: f64,
    pub sum_of_viewers: f64,
    pub cumulative_viewers: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    #[serde(rename = "Producer")]
    #[tabled(rename = "Producer")]
    pub producer: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Channel")]
    #[tabled(rename = "Channel")]
    pub channel: i64,
    #[serde(rename = "Top_Programme")]
    #[tabled(rename = "Top_Programme")]
    pub top_programme: String,
    #[serde(rename = "Highest_Viewers")]
    #[tabled(rename = "Highest_Viewers")]
    pub highest_viewers: i64,
    #[serde(rename = "Sum_of_Viewers")]
    #[tabled(rename = "Sum_of_Viewers")]
    pub sum_of_viewers: i64,
    #[serde(rename = "Cumulative_Viewers")]
    #[tabled(rename = "Cumulative_Viewers")]
    pub cumulative_viewers: i64,
}
