use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::domain::CovError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One row of state-level statistics, or the aggregate "Total" pseudo-row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Record {
    #[serde(default)]
    pub statecode: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub confirmed: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub recovered: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub deaths: u64,
    #[serde(default)]
    pub lastupdatedtime: String,
}

#[derive(Debug, Deserialize)]
struct StatewiseFeed {
    #[serde(default)]
    statewise: Vec<Record>,
}

// Counters arrive as strings in the feed. Anything that does not parse as a
// non-negative integer becomes 0 rather than failing the whole response.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
}

pub struct FeedClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Result<Self, CovError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(FeedClient {
            client,
            url: url.into(),
        })
    }

    /// Single attempt, no retry. Records are returned in feed order.
    pub fn fetch(&self) -> Result<Vec<Record>, CovError> {
        debug!("Fetching {} ...", self.url);
        let start_time = Instant::now();

        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CovError::BadStatus(status.as_u16()));
        }
        let body = response.text()?;
        let records = parse_feed(&body)?;

        info!(
            "Fetched {} statewise records in {}ms",
            records.len(),
            start_time.elapsed().as_millis()
        );
        Ok(records)
    }
}

pub fn parse_feed(body: &str) -> Result<Vec<Record>, CovError> {
    let feed: StatewiseFeed = serde_json::from_str(body)?;
    Ok(feed.statewise)
}

pub type FetchResult = (u64, Result<Vec<Record>, CovError>);

/// Handle to one in-flight fetch. The model compares the generation of a
/// completion against its current one and drops stale results.
pub struct FetchHandle {
    pub generation: u64,
    rx: Receiver<FetchResult>,
}

impl FetchHandle {
    pub fn try_recv(&self) -> Option<FetchResult> {
        self.rx.try_recv().ok()
    }
}

pub fn spawn_fetch(client: FeedClient, generation: u64) -> FetchHandle {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = client.fetch();
        // The receiver is gone when the view was torn down; drop the result.
        let _ = tx.send((generation, result));
    });
    FetchHandle { generation, rx }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/statewise.json");

    #[test]
    fn parses_the_statewise_collection() {
        let records = parse_feed(FIXTURE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, "Total");
        assert_eq!(records[0].confirmed, 100);
        assert_eq!(records[0].recovered, 90);
        assert_eq!(records[0].deaths, 5);
        assert_eq!(records[1].statecode, "KA");
        assert_eq!(records[1].state, "Karnataka");
    }

    #[test]
    fn unparsable_counters_become_zero() {
        let body = r#"{"statewise": [
            {"statecode": "XX", "state": "Xanadu", "confirmed": "abc",
             "recovered": "", "lastupdatedtime": "t"}
        ]}"#;
        let records = parse_feed(body).unwrap();
        assert_eq!(records[0].confirmed, 0);
        assert_eq!(records[0].recovered, 0);
        assert_eq!(records[0].deaths, 0);
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let result = parse_feed("not json");
        assert!(matches!(result, Err(CovError::ParseError(_))));
    }

    #[test]
    fn missing_statewise_key_yields_no_records() {
        let records = parse_feed("{}").unwrap();
        assert!(records.is_empty());
    }
}
