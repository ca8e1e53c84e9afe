//! Per-item feedback channel.
//!
//! Archiver, WorkingSet and CommitEngine never print or log on their own
//! behalf for per-file outcomes; they hand [`Event`]s to a [`Reporter`]
//! supplied by the caller. [`LogReporter`] forwards them to the log.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::logging::{log_item_change, log_item_failure};

/// Something that happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The file was left alone and will not be processed
    Skipped { path: PathBuf, reason: String },

    /// The filesystem was (or, in dry-run, would be) changed
    Changed {
        operation: &'static str,
        path: PathBuf,
        details: Option<String>,
    },

    /// An operation on the file failed; it stays where it was
    Failed {
        operation: &'static str,
        path: PathBuf,
        error: String,
    },

    /// Informational, nothing was wrong
    Notice { path: PathBuf, message: String },
}

impl Event {
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped { path, .. }
            | Self::Changed { path, .. }
            | Self::Failed { path, .. }
            | Self::Notice { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Skipped { .. } | Self::Failed { .. })
    }
}

/// Receives per-item events
pub trait Reporter {
    fn report(&mut self, event: Event);

    fn skipped(&mut self, path: &Path, reason: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(Event::Skipped {
            path: path.to_path_buf(),
            reason: reason.into(),
        });
    }

    fn changed(&mut self, operation: &'static str, path: &Path, details: Option<String>)
    where
        Self: Sized,
    {
        self.report(Event::Changed {
            operation,
            path: path.to_path_buf(),
            details,
        });
    }

    fn failed(&mut self, operation: &'static str, path: &Path, error: &dyn std::fmt::Display)
    where
        Self: Sized,
    {
        self.report(Event::Failed {
            operation,
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn notice(&mut self, path: &Path, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(Event::Notice {
            path: path.to_path_buf(),
            message: message.into(),
        });
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: Event) {
        (**self).report(event);
    }
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, event: Event) {
        match event {
            Event::Skipped { path, reason } => warn!("Skipping {}: {}", path.display(), reason),
            Event::Changed {
                operation,
                path,
                details,
            } => log_item_change(operation, &path, details.as_deref()),
            Event::Failed {
                operation,
                path,
                error,
            } => log_item_failure(operation, &path, &error),
            Event::Notice { path, message } => info!("{}: {}", path.display(), message),
        }
    }
}

/// Keeps every event, in order
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub events: Vec<Event>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_failure())
    }

    pub fn changes(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Changed { .. }))
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, event: Event) {
        LogReporter.report(event.clone());
        self.events.push(event);
    }
}
