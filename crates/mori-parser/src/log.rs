//! Sinks for recoverable document problems found during a parse.

use crate::error::ParseError;

/// Receives problems the parser can step over: unknown tags, misplaced
/// directives, duplicate note names.
///
/// Returning `Err` aborts the parse with that error.
pub trait ParseLog {
    fn report(&mut self, message: &str) -> Result<(), ParseError>;
}

/// Forwards every report to `tracing` and keeps going.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ParseLog for TracingLog {
    fn report(&mut self, message: &str) -> Result<(), ParseError> {
        tracing::warn!(target: "mori::parse", "{message}");
        Ok(())
    }
}

/// Fails on the first report.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictLog;

impl ParseLog for StrictLog {
    fn report(&mut self, message: &str) -> Result<(), ParseError> {
        Err(ParseError::Validation(message.to_string()))
    }
}

impl<F> ParseLog for F
where
    F: FnMut(&str),
{
    fn report(&mut self, message: &str) -> Result<(), ParseError> {
        self(message);
        Ok(())
    }
}
