//! Outcome of processing an ordered batch of rows

use std::fmt::{self, Debug, Display};
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// What to do with the rest of a batch after a row fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Stop at the first failure; later rows are reported as skipped
    #[default]
    FailFast,
    /// Attempt every row and collect all failures
    ContinueOnError,
}

/// A row that was attempted and failed
#[derive(Debug)]
pub struct RowFailure<K> {
    pub key: K,
    pub error: DomainError,
}

/// Per-row accounting for one batch, in input order
#[derive(Debug)]
pub struct BatchReport<K> {
    pub succeeded: Vec<K>,
    pub failed: Vec<RowFailure<K>>,
    /// Rows never attempted because an earlier row failed
    pub skipped: Vec<K>,
}

impl<K> Default for BatchReport<K> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<K> BatchReport<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one row, telling the caller whether to go on
    pub fn record(
        &mut self,
        key: K,
        result: Result<(), DomainError>,
        mode: BatchMode,
    ) -> ControlFlow<()> {
        match result {
            Ok(()) => {
                self.succeeded.push(key);
                ControlFlow::Continue(())
            }
            Err(error) => {
                self.failed.push(RowFailure { key, error });
                match mode {
                    BatchMode::FailFast => ControlFlow::Break(()),
                    BatchMode::ContinueOnError => ControlFlow::Continue(()),
                }
            }
        }
    }

    pub fn skip_remaining(&mut self, keys: impl IntoIterator<Item = K>) {
        self.skipped.extend(keys);
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn first_error(&self) -> Option<&DomainError> {
        self.failed.first().map(|f| &f.error)
    }

    /// `Ok` when every row succeeded, otherwise a `BatchError` carrying the
    /// full report
    pub fn into_result(self) -> Result<Self, BatchError<K>> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(BatchError { report: self })
        }
    }
}

/// A batch in which at least one row failed.
///
/// Only `BatchReport::into_result` builds one, and only from a report with a
/// failure, so the first failure is always present.
#[derive(Debug)]
pub struct BatchError<K> {
    report: BatchReport<K>,
}

impl<K> BatchError<K> {
    fn first_failure(&self) -> &RowFailure<K> {
        &self.report.failed[0]
    }

    /// Error of the first failed row
    pub fn first_error(&self) -> &DomainError {
        &self.first_failure().error
    }

    pub fn report(&self) -> &BatchReport<K> {
        &self.report
    }

    pub fn into_report(self) -> BatchReport<K> {
        self.report
    }
}

impl<K: Display> Display for BatchError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first_failure();
        write!(
            f,
            "batch failed at {}: {} ({} succeeded, {} failed, {} skipped)",
            first.key,
            first.error,
            self.report.succeeded.len(),
            self.report.failed.len(),
            self.report.skipped.len()
        )
    }
}

impl<K: Debug + Display> std::error::Error for BatchError<K> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_fast_stops_and_skips() {
        let mut report = BatchReport::new();
        let keys = ["a", "b", "c"];
        let results = [Ok(()), Err(DomainError::not_found("b")), Ok(())];

        let mut rows = keys.iter().zip(results);
        while let Some((key, result)) = rows.next() {
            if report.record(*key, result, BatchMode::FailFast).is_break() {
                report.skip_remaining(rows.by_ref().map(|(k, _)| *k));
                break;
            }
        }

        assert_eq!(report.succeeded, vec!["a"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "b");
        assert_eq!(report.skipped, vec!["c"]);
        assert_eq!(report.attempted(), 2);

        let err = report.into_result().unwrap_err();
        assert!(err.first_error().is_not_found());
        assert_eq!(
            err.to_string(),
            "batch failed at b: Not found: b (1 succeeded, 1 failed, 1 skipped)"
        );
    }

    #[test]
    fn test_continue_on_error_attempts_everything() {
        let mut report = BatchReport::new();
        assert!(report
            .record("a", Err(DomainError::internal("x")), BatchMode::ContinueOnError)
            .is_continue());
        assert!(report.record("b", Ok(()), BatchMode::ContinueOnError).is_continue());

        assert_eq!(report.attempted(), 2);
        assert!(report.skipped.is_empty());
        assert!(!report.is_complete());
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_all_succeeded() {
        let mut report = BatchReport::new();
        let _ = report.record(1, Ok(()), BatchMode::FailFast);
        let _ = report.record(2, Ok(()), BatchMode::FailFast);

        let report = report.into_result().unwrap();
        assert!(report.is_complete());
        assert!(report.first_error().is_none());
    }

    #[test]
    fn test_error_keeps_every_failure_in_order() {
        let mut report = BatchReport::new();
        let _ = report.record("a", Ok(()), BatchMode::ContinueOnError);
        let _ = report.record("b", Err(DomainError::unsupported("b")), BatchMode::ContinueOnError);
        let _ = report.record("c", Err(DomainError::not_found("c")), BatchMode::ContinueOnError);

        let err = report.into_result().unwrap_err();
        assert!(err.first_error().is_unsupported());
        assert_eq!(err.report().failed.len(), 2);
        assert_eq!(err.report().succeeded, vec!["a"]);
        assert!(std::error::Error::source(&err).is_some());

        let keys: Vec<_> = err.into_report().failed.into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_empty_report_is_not_an_error() {
        assert!(BatchReport::<&str>::new().into_result().is_ok());
    }
}
