//! Fan-out/fan-in helpers.
//!
//! Sub-queries run concurrently and each outcome is captured on its own, so
//! one failing query never cancels or poisons the others.

use anyhow::Result;
use futures::future::join_all;
use std::future::Future;

/// Run every future to completion and keep each result separately.
pub async fn settle_all<T, F>(futures: impl IntoIterator<Item = F>) -> Vec<Result<T>>
where
    F: Future<Output = Result<T>>,
{
    join_all(futures).await
}

/// Collects secondary outcomes: failures fall back to defaults and are only
/// remembered for logging.
#[derive(Debug, Default)]
pub struct FanIn {
    label: String,
    failures: Vec<String>,
}

impl FanIn {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            failures: Vec::new(),
        }
    }

    pub fn secondary<T: Default>(&mut self, what: &str, res: Result<T>) -> T {
        self.secondary_opt(what, res).unwrap_or_default()
    }

    pub fn secondary_opt<T>(&mut self, what: &str, res: Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("[fanout] {} {what} defaulted: {e:#}", self.label);
                self.failures.push(format!("{what}: {e:#}"));
                None
            }
        }
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn finish(self) {
        if !self.failures.is_empty() {
            log::info!(
                "[fanout] {} completed with {} defaulted sub-queries",
                self.label,
                self.failures.len()
            );
        }
    }
}

/// First failure message among settled results, if any
pub fn first_error<T>(results: &[Result<T>]) -> Option<String> {
    results
        .iter()
        .find_map(|r| r.as_ref().err().map(|e| format!("{e:#}")))
}
