//! User-facing host: dialogs and long-running indicators

use async_trait::async_trait;
use colored::Colorize;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// What the adapter may show to the user
#[async_trait]
pub trait Host: Send + Sync {
    async fn show_warning_message(&self, message: &str);

    async fn show_information_message(&self, message: &str);

    /// A slow task titled `title` has started
    fn progress_started(&self, title: &str);

    /// The task started by `progress_started` has finished
    fn progress_finished(&self, title: &str);
}

/// Run `task` behind the host's busy indicator
pub async fn long_running<F, T>(host: &dyn Host, title: &str, task: F) -> T
where
    F: Future<Output = T>,
{
    host.progress_started(title);
    let result = task.await;
    host.progress_finished(title);
    result
}

/// Host that talks to a terminal via stderr
pub struct TerminalHost {
    color: bool,
    quiet: bool,
    started: Mutex<Option<Instant>>,
}

impl TerminalHost {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            color,
            quiet,
            started: Mutex::new(None),
        }
    }

    fn paint(&self, text: &str, warn: bool) -> String {
        match (self.color, warn) {
            (false, _) => text.to_string(),
            (true, true) => text.yellow().to_string(),
            (true, false) => text.green().to_string(),
        }
    }
}

#[async_trait]
impl Host for TerminalHost {
    async fn show_warning_message(&self, message: &str) {
        eprintln!("{} {}", self.paint("⚠", true), message);
    }

    async fn show_information_message(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", self.paint("ℹ", false), message);
        }
    }

    fn progress_started(&self, title: &str) {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        if !self.quiet {
            eprintln!("{}", title);
        }
    }

    fn progress_finished(&self, title: &str) {
        let started = self
            .started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(started) = started {
            tracing::debug!(title, elapsed_ms = started.elapsed().as_millis() as u64, "long-running task finished");
        }
    }
}
