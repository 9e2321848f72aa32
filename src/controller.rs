use std::time::Duration;
use tracing::trace;

use crate::domain::{CovConfig, CovError, Message};
use crate::model::Model;
use crate::table::COLUMNS;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &CovConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, _model: &Model) -> Result<Option<Message>, CovError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                COLUMNS
                    .get(idx)
                    .filter(|column| column.sortable)
                    .map(|column| Message::SortBy(column.key))
            }
            KeyCode::Left => Some(Message::PrevPage),
            KeyCode::Right => Some(Message::NextPage),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::End | KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Up => Some(Message::MoveUp),
            KeyCode::Down => Some(Message::MoveDown),
            KeyCode::Char('p') => Some(Message::CyclePageSize),
            KeyCode::Char('c') => Some(Message::CopyRow),
            KeyCode::Char('r') => Some(Message::Refresh),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
