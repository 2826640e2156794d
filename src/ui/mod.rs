//! Progress reporting for the update steps
//!
//! The replacement engine, tree strategies and launcher never log through a
//! global. They receive a [`Reporter`] and send leveled messages to it:
//! - [`TracingReporter`] forwards to `tracing` (console and log file)
//! - `SilentReporter` drops everything, for tests
//!
//! Reporter methods return nothing, so a reporting problem can never abort
//! an in-progress replacement.

pub mod summary;

use tracing::{debug, error, info, warn};

/// Sink for leveled progress messages
pub trait Reporter {
    /// A step of the update started or finished
    fn step(&self, message: &str);

    /// Per-entry detail, only interesting when debugging
    fn detail(&self, message: &str);

    /// Something went wrong but the update continues
    fn warn(&self, message: &str);

    /// The application directory may be left in an indeterminate state
    fn critical(&self, message: &str);
}

/// Reporter backed by the `tracing` subscriber installed in `main`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn step(&self, message: &str) {
        info!("{message}");
    }

    fn detail(&self, message: &str) {
        debug!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn critical(&self, message: &str) {
        error!("CRITICAL: {message}");
    }
}

/// No-op reporter
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

#[cfg(test)]
impl Reporter for SilentReporter {
    fn step(&self, _message: &str) {}

    fn detail(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn critical(&self, _message: &str) {}
}

/// Reporter that keeps every message, for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: std::cell::RefCell<Vec<(Level, String)>>,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Step,
    Detail,
    Warn,
    Critical,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push(Level::Step, message);
    }

    fn detail(&self, message: &str) {
        self.push(Level::Detail, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn critical(&self, message: &str) {
        self.push(Level::Critical, message);
    }
}
