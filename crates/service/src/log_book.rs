//! Append-only diagnostics sink
//!
//! Internal failures are written here in full before being collapsed to an
//! opaque result at the public boundary. Each entry is one line: the error's
//! complete cause chain, then the reporting component in braces.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;

/// Summarize an error and its full `source()` chain as a single line
pub fn chain_summary(err: &(dyn Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];

    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }

    parts.join(": ")
}

/// Append-only failure journal
pub struct LogBook {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LogBook {
    /// Journal into any byte sink
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Journal onto the standard error stream
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Record one failure: `"<chain-summary> {<component>}"` plus newline,
    /// appended as raw bytes. Also mirrored through `tracing`.
    ///
    /// A failing sink has nowhere left to report; write errors are dropped.
    pub fn record_failure(&self, component: &str, err: &(dyn Error + 'static)) {
        let line = format!("{} {{{}}}", chain_summary(err), component);
        error!("{}", line);

        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.write_all(line.as_bytes());
            let _ = sink.write_all(b"\n");
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CaptureSink;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner failure")]
    struct Inner;

    #[test]
    fn chain_summary_joins_all_causes() {
        let err = Outer(Inner);
        assert_eq!(chain_summary(&err), "outer failure: inner failure");
    }

    #[test]
    fn record_failure_appends_one_tagged_line() {
        let sink = CaptureSink::default();
        let log_book = LogBook::new(Box::new(sink.clone()));

        log_book.record_failure("state_service::tests", &Outer(Inner));

        assert_eq!(
            sink.contents(),
            "outer failure: inner failure {state_service::tests}\n"
        );
    }
}
