//! In-memory journal retaining lines for callers that inspect them afterwards.

use super::Journal;
use crate::models::ChangeAction;
use chrono::{DateTime, Local};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalLine {
    Operation(String),
    Error(String),
    Change {
        user: String,
        filename: String,
        action: ChangeAction,
        at: DateTime<Local>,
    },
}

#[derive(Debug, Default)]
pub struct MemoryJournal {
    lines: Mutex<Vec<JournalLine>>,
}

impl MemoryJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: JournalLine) {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> Vec<JournalLine> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                JournalLine::Operation(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                JournalLine::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// `(user, filename, action)` for every change line, in order.
    #[must_use]
    pub fn changes(&self) -> Vec<(String, String, ChangeAction)> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                JournalLine::Change {
                    user,
                    filename,
                    action,
                    ..
                } => Some((user, filename, action)),
                _ => None,
            })
            .collect()
    }
}

impl Journal for MemoryJournal {
    fn operation(&self, message: &str) {
        log::info!("{message}");
        self.push(JournalLine::Operation(message.to_string()));
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
        self.push(JournalLine::Error(message.to_string()));
    }

    fn change(&self, user: &str, filename: &str, action: ChangeAction, at: DateTime<Local>) {
        self.push(JournalLine::Change {
            user: user.to_string(),
            filename: filename.to_string(),
            action,
            at,
        });
    }
}
