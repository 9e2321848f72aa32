use std::time::{Duration, Instant};

use arboard::Clipboard;
use tracing::{error, info, trace};

use crate::domain::{CovConfig, CovError, HELP_TEXT, Message};
use crate::feed::{FeedClient, FetchHandle, Record, spawn_fetch};
use crate::table::{self, COLUMNS, PAGE_SIZES, PageState, SortState, Totals};

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3000);
pub const FETCH_FAILED_TEXT: &str = "Failed to fetch data, contact admin!";

#[derive(Debug, PartialEq)]
pub enum Status {
    IDLE,
    LOADING,
    LOADED,
    FAILED,
    QUITTING,
}

#[derive(Debug)]
struct Notification {
    text: String,
    raised_at: Instant,
}

pub struct Model {
    config: CovConfig,
    pub status: Status,
    records: Vec<Record>,
    sort: SortState,
    page: PageState,
    cursor_row: usize,
    totals: Totals,
    notification: Option<Notification>,
    fetch: Option<FetchHandle>,
    fetch_gen: u64,
    clipboard: Option<Clipboard>,
    show_popup: bool,
    popup_message: String,
}

impl Model {
    pub fn init(config: &CovConfig) -> Result<Self, CovError> {
        if !PAGE_SIZES.contains(&config.page_size) {
            return Err(CovError::InvalidPageSize(config.page_size));
        }
        Ok(Model {
            config: config.clone(),
            status: Status::IDLE,
            records: Vec::new(),
            sort: SortState::default(),
            page: PageState::new(config.page_size),
            cursor_row: 0,
            totals: Totals::default(),
            notification: None,
            fetch: None,
            fetch_gen: 0,
            clipboard: None,
            show_popup: false,
            popup_message: String::new(),
        })
    }

    /// Kick off one background fetch. A fetch already in flight is superseded:
    /// its handle is dropped and its completion discarded by generation.
    pub fn start_fetch(&mut self) -> Result<(), CovError> {
        let client = FeedClient::new(self.config.url.clone())?;
        self.fetch_gen += 1;
        self.fetch = Some(spawn_fetch(client, self.fetch_gen));
        self.status = Status::LOADING;
        trace!("Started fetch generation {}", self.fetch_gen);
        Ok(())
    }

    /// Called once per event-loop iteration: applies a finished fetch and
    /// expires the transient notification.
    pub fn poll(&mut self) {
        let completed = self.fetch.as_ref().and_then(|handle| handle.try_recv());
        if let Some((generation, result)) = completed {
            self.fetch = None;
            self.apply_fetch(generation, result);
        }

        if let Some(notification) = &self.notification
            && notification.raised_at.elapsed() >= NOTIFICATION_TTL
        {
            self.notification = None;
        }
    }

    pub(crate) fn apply_fetch(&mut self, generation: u64, result: Result<Vec<Record>, CovError>) {
        if generation != self.fetch_gen {
            trace!("Dropping stale fetch result (generation {})", generation);
            return;
        }
        match result {
            Ok(records) => {
                info!("Loaded {} records", records.len());
                self.totals = table::aggregate(&records);
                self.records = records;
                self.page.page_index = 0;
                self.cursor_row = 0;
                self.status = Status::LOADED;
            }
            Err(e) => {
                error!("Fetch failed: {:?}", e);
                self.records.clear();
                self.totals = Totals::default();
                self.status = Status::FAILED;
                self.notify(FETCH_FAILED_TEXT);
            }
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notification = Some(Notification {
            text: text.into(),
            raised_at: Instant::now(),
        });
    }

    pub fn update(&mut self, message: Message) -> Result<(), CovError> {
        trace!("Update: {:?} in {:?}", message, self.status);
        if self.show_popup {
            match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.show_popup = false,
                _ => (),
            }
            return Ok(());
        }
        match message {
            Message::Quit => self.quit(),
            Message::Refresh => self.start_fetch()?,
            Message::Help => self.show_help(),
            msg if self.status == Status::LOADED => self.update_loaded(msg),
            _ => (),
        }
        Ok(())
    }

    // Sort, page and cursor changes only apply to a loaded record list.
    fn update_loaded(&mut self, message: Message) {
        match message {
            Message::SortBy(column) => {
                self.sort.request(column);
                self.cursor_row = 0;
            }
            Message::FirstPage => self.page.page_index = 0,
            Message::PrevPage => self.page.page_index = self.page.page_index.saturating_sub(1),
            Message::NextPage => {
                self.page.page_index = std::cmp::min(self.page.page_index + 1, self.last_page())
            }
            Message::LastPage => self.page.page_index = self.last_page(),
            Message::CyclePageSize => {
                self.page.cycle_size();
                self.cursor_row = 0;
            }
            Message::MoveUp => self.cursor_row = self.cursor_row.saturating_sub(1),
            Message::MoveDown => {
                let len = self.current_page_len();
                if len > 0 {
                    self.cursor_row = std::cmp::min(self.cursor_row + 1, len - 1);
                }
            }
            Message::CopyRow => self.copy_row(),
            _ => (),
        }
        let len = self.current_page_len();
        self.cursor_row = std::cmp::min(self.cursor_row, len.saturating_sub(1));
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn show_help(&mut self) {
        self.popup_message = HELP_TEXT.to_string();
        self.show_popup = true;
    }

    fn last_page(&self) -> usize {
        table::page_count(self.records.len(), self.page.page_size) - 1
    }

    fn current_page_len(&self) -> usize {
        table::paginate(&self.records, self.page).len()
    }

    /// The records of the current page, sorted fresh from feed order so that
    /// ties keep their original relative position.
    pub fn visible_page(&self) -> Vec<Record> {
        let mut sorted = self.records.clone();
        table::sort_records(&mut sorted, self.sort);
        table::paginate(&sorted, self.page).to_vec()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn nrecords(&self) -> usize {
        self.records.len()
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_ref().map(|n| n.text.as_str())
    }

    pub fn popup(&self) -> Option<&str> {
        self.show_popup.then_some(self.popup_message.as_str())
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_row(&mut self) {
        let page = self.visible_page();
        let Some(record) = page.get(self.cursor_row) else {
            return;
        };
        let content = COLUMNS
            .iter()
            .map(|c| Self::wrap_cell_content(&c.key.cell(record)))
            .collect::<Vec<String>>()
            .join(",");

        // The clipboard is opened lazily; some terminals have none at all.
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    trace!("Clipboard unavailable: {:?}", e);
                    self.notify("Clipboard unavailable");
                    return;
                }
            }
        }
        let result = self
            .clipboard
            .as_mut()
            .map(|clipboard| clipboard.set_text(content));
        match result {
            Some(Ok(())) => self.notify("Copied row to clipboard"),
            Some(Err(e)) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.notify("Copy failed");
            }
            None => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnId, SortOrder};

    fn record(code: &str, state: &str, confirmed: u64) -> Record {
        Record {
            statecode: code.to_string(),
            state: state.to_string(),
            confirmed,
            recovered: 0,
            deaths: 0,
            lastupdatedtime: "t".to_string(),
        }
    }

    fn loaded_model(nrecords: usize) -> Model {
        let mut model = Model::init(&CovConfig::default()).unwrap();
        let records: Vec<Record> = (0..nrecords)
            .map(|i| record(&format!("S{i:02}"), &format!("State{i:02}"), i as u64))
            .collect();
        model.apply_fetch(0, Ok(records));
        model
    }

    #[test]
    fn failed_fetch_leaves_a_stable_empty_model() {
        let mut model = Model::init(&CovConfig::default()).unwrap();
        model.apply_fetch(0, Err(CovError::BadStatus(500)));

        assert_eq!(model.status, Status::FAILED);
        assert_eq!(model.nrecords(), 0);
        assert_eq!(model.notification(), Some(FETCH_FAILED_TEXT));
        assert_eq!(model.totals(), Totals::default());

        // Page and sort messages are ignored outside LOADED and must not panic.
        model.update(Message::NextPage).unwrap();
        model.update(Message::SortBy(ColumnId::Confirmed)).unwrap();
        assert!(model.visible_page().is_empty());
        assert_eq!(model.page().page_index, 0);
    }

    #[test]
    fn stale_fetch_results_are_dropped() {
        let mut model = Model::init(&CovConfig::default()).unwrap();
        model.fetch_gen = 2;
        model.apply_fetch(1, Ok(vec![record("KA", "Karnataka", 10)]));
        assert_eq!(model.status, Status::IDLE);
        assert_eq!(model.nrecords(), 0);
    }

    #[test]
    fn successful_fetch_loads_and_aggregates() {
        let mut model = Model::init(&CovConfig::default()).unwrap();
        let records = vec![
            Record {
                statecode: "TT".to_string(),
                state: "Total".to_string(),
                confirmed: 100,
                recovered: 90,
                deaths: 5,
                lastupdatedtime: "t".to_string(),
            },
            record("KA", "Karnataka", 10),
        ];
        model.apply_fetch(0, Ok(records));

        assert_eq!(model.status, Status::LOADED);
        assert_eq!(
            model.totals(),
            Totals {
                confirmed: 100,
                recovered: 90,
                deaths: 5
            }
        );
        let visible: Vec<String> = model
            .visible_page()
            .iter()
            .map(|r| r.state.clone())
            .collect();
        assert!(visible.contains(&"Karnataka".to_string()));
    }

    #[test]
    fn page_navigation_clamps_at_the_boundaries() {
        let mut model = loaded_model(12);
        assert_eq!(model.last_page(), 1);

        model.update(Message::PrevPage).unwrap();
        assert_eq!(model.page().page_index, 0);

        model.update(Message::NextPage).unwrap();
        model.update(Message::NextPage).unwrap();
        assert_eq!(model.page().page_index, 1);

        model.update(Message::LastPage).unwrap();
        assert_eq!(model.page().page_index, 1);
        assert_eq!(model.visible_page().len(), 2);

        model.update(Message::FirstPage).unwrap();
        assert_eq!(model.page().page_index, 0);
    }

    #[test]
    fn cycling_page_size_resets_the_page_index() {
        let mut model = loaded_model(30);
        model.update(Message::LastPage).unwrap();
        assert!(model.page().page_index > 0);

        model.update(Message::CyclePageSize).unwrap();
        assert_eq!(model.page().page_index, 0);
        assert_eq!(model.page().page_size, 15);
    }

    #[test]
    fn sorting_again_flips_the_order() {
        let mut model = loaded_model(3);
        model.update(Message::SortBy(ColumnId::Confirmed)).unwrap();
        assert_eq!(model.sort().order, SortOrder::ASC);
        model.update(Message::SortBy(ColumnId::Confirmed)).unwrap();
        assert_eq!(model.sort().order, SortOrder::DESC);
        assert_eq!(model.visible_page()[0].confirmed, 2);
    }

    #[test]
    fn cursor_stays_within_the_visible_page() {
        let mut model = loaded_model(7);
        // All 7 records fit one page of 10; the cursor must stop at the last row.
        for _ in 0..20 {
            model.update(Message::MoveDown).unwrap();
        }
        assert_eq!(model.cursor_row(), 6);
        model.update(Message::CyclePageSize).unwrap();
        assert_eq!(model.cursor_row(), 0);
    }

    #[test]
    fn notification_expires_after_the_ttl() {
        let mut model = Model::init(&CovConfig::default()).unwrap();
        model.apply_fetch(0, Err(CovError::BadStatus(500)));
        model.notification.as_mut().unwrap().raised_at =
            Instant::now() - NOTIFICATION_TTL - Duration::from_millis(1);
        model.poll();
        assert_eq!(model.notification(), None);
    }

    #[test]
    fn init_rejects_page_sizes_outside_the_fixed_set() {
        let config = CovConfig::default().page_size(7);
        assert!(matches!(
            Model::init(&config),
            Err(CovError::InvalidPageSize(7))
        ));
    }

    #[test]
    fn popup_blocks_table_messages_until_closed() {
        let mut model = loaded_model(5);
        model.update(Message::Help).unwrap();
        assert!(model.popup().is_some());
        model.update(Message::NextPage).unwrap();
        assert_eq!(model.page().page_index, 0);
        model.update(Message::Exit).unwrap();
        assert!(model.popup().is_none());
    }
}
