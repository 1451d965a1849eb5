use miette::Diagnostic;
use thiserror::Error;

/// Errors surfaced by the document parser.
///
/// Recoverable document problems go to the [`crate::ParseLog`] sink instead;
/// these are what a sink (or the parser itself) turns into a failed parse.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ParseError {
    #[error("malformed directive: {0}")]
    #[diagnostic(code(mori::parse::directive))]
    Directive(String),

    #[error("document failed validation: {0}")]
    #[diagnostic(
        code(mori::parse::validation),
        help("fix the directive paragraph named in the message and validate again")
    )]
    Validation(String),

    #[error("internal parser failure: {0}")]
    #[diagnostic(code(mori::parse::internal))]
    Internal(String),

    #[error("invalid directive prefix {prefix:?}")]
    #[diagnostic(code(mori::parse::config))]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: regex::Error,
    },
}
