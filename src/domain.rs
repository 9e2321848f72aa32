use std::io::Error;

use derive_setters::Setters;

use crate::table::ColumnId;

pub const DEFAULT_FEED_URL: &str = "https://data.covid19india.org/data.json";

pub const HELP_TEXT: &str = "covview - statewise COVID-19 statistics

  1-6        Sort by column (again to flip order)
  Left/Right Previous / next page
  Home/End   First / last page (also g / G)
  Up/Down    Move row cursor
  p          Cycle page size (5, 10, 15)
  c          Copy selected row to clipboard
  r          Re-fetch the feed
  ?          Toggle this help
  Esc        Close popup
  q          Quit
";

#[derive(Debug)]
pub enum CovError {
    IoError(Error),
    HttpError(reqwest::Error),
    BadStatus(u16),
    ParseError(serde_json::Error),
    InvalidPageSize(usize),
}

impl From<Error> for CovError {
    fn from(err: Error) -> Self {
        CovError::IoError(err)
    }
}

impl From<reqwest::Error> for CovError {
    fn from(err: reqwest::Error) -> Self {
        CovError::HttpError(err)
    }
}

impl From<serde_json::Error> for CovError {
    fn from(err: serde_json::Error) -> Self {
        CovError::ParseError(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    SortBy(ColumnId),
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    CyclePageSize,
    MoveUp,
    MoveDown,
    CopyRow,
    Refresh,
    Help,
    Exit,
}

#[derive(Debug, Clone, Setters)]
pub struct CovConfig {
    pub url: String,
    pub event_poll_time: u64,
    pub page_size: usize,
}

impl Default for CovConfig {
    fn default() -> Self {
        CovConfig {
            url: DEFAULT_FEED_URL.to_string(),
            event_poll_time: 100,
            page_size: 10,
        }
    }
}
