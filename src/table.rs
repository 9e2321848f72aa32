use std::cmp::Ordering;

use crate::feed::Record;

pub const PAGE_SIZES: [usize; 3] = [5, 10, 15];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnId {
    StateCode,
    State,
    Confirmed,
    Recovered,
    Deaths,
    LastUpdated,
}

pub struct Column {
    pub key: ColumnId,
    pub label: &'static str,
    pub sortable: bool,
}

// Drives header rendering, cell extraction and comparator selection.
pub const COLUMNS: [Column; 6] = [
    Column { key: ColumnId::StateCode, label: "State Code", sortable: true },
    Column { key: ColumnId::State, label: "State", sortable: true },
    Column { key: ColumnId::Confirmed, label: "Confirmed", sortable: true },
    Column { key: ColumnId::Recovered, label: "Recovered", sortable: true },
    Column { key: ColumnId::Deaths, label: "Deceased", sortable: true },
    Column { key: ColumnId::LastUpdated, label: "Date time", sortable: true },
];

impl ColumnId {
    pub fn cell(&self, record: &Record) -> String {
        match self {
            ColumnId::StateCode => record.statecode.clone(),
            ColumnId::State => record.state.clone(),
            ColumnId::Confirmed => record.confirmed.to_string(),
            ColumnId::Recovered => record.recovered.to_string(),
            ColumnId::Deaths => record.deaths.to_string(),
            ColumnId::LastUpdated => record.lastupdatedtime.clone(),
        }
    }

    // Counter columns compare on the parsed integers. The upstream view
    // compared the raw strings, which orders "9" after "10"; that is
    // corrected here.
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            ColumnId::StateCode => a.statecode.cmp(&b.statecode),
            ColumnId::State => a.state.cmp(&b.state),
            ColumnId::Confirmed => a.confirmed.cmp(&b.confirmed),
            ColumnId::Recovered => a.recovered.cmp(&b.recovered),
            ColumnId::Deaths => a.deaths.cmp(&b.deaths),
            ColumnId::LastUpdated => a.lastupdatedtime.cmp(&b.lastupdatedtime),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    ASC,
    DESC,
}

#[derive(Debug, Clone, Copy)]
pub struct SortState {
    pub column: ColumnId,
    pub order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        SortState {
            column: ColumnId::State,
            order: SortOrder::ASC,
        }
    }
}

impl SortState {
    // Requesting the active column flips the order, a new column starts ascending.
    pub fn request(&mut self, column: ColumnId) {
        if self.column == column {
            self.order = match self.order {
                SortOrder::ASC => SortOrder::DESC,
                SortOrder::DESC => SortOrder::ASC,
            };
        } else {
            self.column = column;
            self.order = SortOrder::ASC;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageState {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        PageState {
            page_index: 0,
            page_size,
        }
    }

    pub fn set_size(&mut self, page_size: usize) {
        self.page_size = page_size;
        self.page_index = 0;
    }

    pub fn cycle_size(&mut self) {
        let next = PAGE_SIZES
            .iter()
            .position(|&s| s == self.page_size)
            .map(|i| PAGE_SIZES[(i + 1) % PAGE_SIZES.len()])
            .unwrap_or(PAGE_SIZES[0]);
        self.set_size(next);
    }
}

pub fn compare(a: &Record, b: &Record, column: ColumnId, order: SortOrder) -> Ordering {
    let ord = column.compare(a, b);
    match order {
        SortOrder::ASC => ord,
        SortOrder::DESC => ord.reverse(),
    }
}

// Stable: records with equal keys keep their feed order.
pub fn sort_records(records: &mut [Record], sort: SortState) {
    records.sort_by(|a, b| compare(a, b, sort.column, sort.order));
}

pub fn paginate(sorted: &[Record], page: PageState) -> &[Record] {
    let begin = page.page_index.saturating_mul(page.page_size);
    if begin >= sorted.len() {
        return &[];
    }
    let end = std::cmp::min(begin + page.page_size, sorted.len());
    &sorted[begin..end]
}

pub fn page_count(nrecords: usize, page_size: usize) -> usize {
    std::cmp::max(1, nrecords.div_ceil(page_size))
}

pub const TOTAL_SENTINEL: &str = "Total";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
}

// Missing sentinel yields zero totals instead of an error.
pub fn aggregate(records: &[Record]) -> Totals {
    records
        .iter()
        .find(|r| r.state == TOTAL_SENTINEL)
        .map(|r| Totals {
            confirmed: r.confirmed,
            recovered: r.recovered,
            deaths: r.deaths,
        })
        .unwrap_or_default()
}
