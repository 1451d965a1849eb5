//! mori-parser
//!
//! Linearizes a paragraph snapshot into render-ready entries: paragraphs,
//! image blocks, author notes, buttons, comment summaries and data blobs,
//! each tagged with running word and char counters, plus a table of contents.
//!
//! Paragraphs whose whole content is `#magicmori<tag>[ value]` are directives
//! rather than text. See [`directive`] for the grammar.

use std::panic::{self, AssertUnwindSafe};

use mori_core::{Paragraph, SmolStr};

pub mod config;
pub mod directive;
pub mod entry;
pub mod error;
pub mod log;
pub mod ordinal;
mod parser;

pub use config::ParserConfig;
pub use directive::{Directive, DirectiveSyntax, parse_button};
pub use entry::{
    AuthorNoteEntry, ButtonEntry, CommentSummaryEntry, Counters, DataEntry, Entry, EntryKind,
    ImagesEntry, ParagraphEntry, ParsedData, PreviewEntry, TocEntry, TocKind, Totals,
};
pub use error::ParseError;
pub use log::{ParseLog, StrictLog, TracingLog};
pub use ordinal::{ListKind, fill_ordinalities};

/// Parse with the default configuration, logging document problems through
/// `tracing`.
///
/// Normalizes every paragraph's modifiers in place; clone first to keep the
/// input untouched.
pub fn parse(
    paragraphs: &mut [Paragraph],
    active_layers: &[SmolStr],
) -> Result<ParsedData, ParseError> {
    parse_with(
        paragraphs,
        active_layers,
        &ParserConfig::default(),
        &mut TracingLog,
    )
}

/// Like [`parse`], but the first document problem fails the parse with
/// [`ParseError::Validation`].
pub fn validate(
    paragraphs: &mut [Paragraph],
    active_layers: &[SmolStr],
) -> Result<ParsedData, ParseError> {
    parse_with(
        paragraphs,
        active_layers,
        &ParserConfig::default(),
        &mut StrictLog,
    )
}

/// Parse with an explicit configuration and log sink.
///
/// A panic inside the pass is caught and returned as [`ParseError::Internal`].
pub fn parse_with(
    paragraphs: &mut [Paragraph],
    active_layers: &[SmolStr],
    config: &ParserConfig,
    log: &mut dyn ParseLog,
) -> Result<ParsedData, ParseError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        parser::Parser::new(config, active_layers, log)?.run(paragraphs)
    }));
    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(target: "mori::parse", "parser panicked: {message}");
            Err(ParseError::Internal(message))
        }
    }
}
