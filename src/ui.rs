use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{BarChart, Block, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::domain::CovConfig;
use crate::model::{Model, Status};
use crate::table::{COLUMNS, SortOrder, page_count};

pub const CHART_HEIGHT: u16 = 8;
pub const STATUSLINE_HEIGHT: u16 = 1;

const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Length(10),
    Constraint::Length(24),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(10),
    Constraint::Length(20),
];

pub struct TableUI;

impl TableUI {
    pub fn new(_cfg: &CovConfig) -> Self {
        Self
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let [table_area, chart_area, status_area] = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(CHART_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_table(model, frame, table_area);
        self.draw_chart(model, frame, chart_area);
        self.draw_statusline(model, frame, status_area);

        if let Some(message) = model.popup() {
            self.draw_popup(message, frame);
        }
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let sort = model.sort();
        let header = Row::new(COLUMNS.iter().enumerate().map(|(idx, column)| {
            let mut label = format!("{} {}", idx + 1, column.label);
            if column.key == sort.column {
                label.push_str(match sort.order {
                    SortOrder::ASC => " ▲",
                    SortOrder::DESC => " ▼",
                });
            }
            Cell::from(Line::from(label).right_aligned())
        }))
        .style(Style::new().bold());

        let records = model.visible_page();
        let rows = records.iter().map(|record| {
            Row::new(
                COLUMNS
                    .iter()
                    .map(|column| Cell::from(Line::from(column.key.cell(record)).right_aligned())),
            )
        });

        let title = Line::from(" Covid data State Wise ".bold());
        let instructions = Line::from(vec![
            " Sort ".into(),
            "<1-6>".blue().bold(),
            " Page ".into(),
            "<←/→>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(header)
            .block(block)
            .row_highlight_style(Style::new().reversed());

        let mut state = TableState::default().with_selected(Some(model.cursor_row()));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_chart(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let totals = model.totals();
        let bars = [
            ("Total Confirmed", totals.confirmed),
            ("Total Recovered", totals.recovered),
            ("Total Deceased", totals.deaths),
        ];
        let chart = BarChart::default()
            .block(Block::bordered().title(Line::from(" Total Number of Covid Cases ".bold())))
            .bar_width(15)
            .bar_gap(3)
            .bar_style(Style::new().fg(Color::Blue))
            .value_style(Style::new().fg(Color::Black).bg(Color::Blue))
            .data(&bars[..]);
        frame.render_widget(chart, area);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        // An active notification takes over the whole status line.
        let line = if let Some(text) = model.notification() {
            Line::from(Span::from(text).style(Style::new().fg(Color::White).bg(Color::Red)))
        } else {
            match model.status {
                Status::IDLE | Status::LOADING => Line::from("Loading ..."),
                Status::FAILED => Line::from("Fetch failed, press <r> to retry".red()),
                _ => {
                    let page = model.page();
                    Line::from(format!(
                        "Page {}/{} | {} rows/page | {} records",
                        page.page_index + 1,
                        page_count(model.nrecords(), page.page_size),
                        page.page_size,
                        model.nrecords(),
                    ))
                }
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_popup(&self, message: &str, frame: &mut Frame) {
        let height = message.lines().count() as u16 + 2;
        let width = message.lines().map(|l| l.len()).max().unwrap_or(0) as u16 + 4;
        let area = popup_area(frame.area(), width, height);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
