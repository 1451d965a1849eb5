use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Parser settings. Every field has a default, so a partial JSON object is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Max chars of a heading's own text kept in its TOC entry.
    pub toc_snippet_len: usize,
    /// Max chars of the following paragraph kept as a TOC lead-in.
    pub lead_in_len: usize,
    /// Paragraph id given to the synthetic cover entry.
    pub cover_id: SmolStr,
    /// Text that marks a paragraph as a directive.
    pub directive_prefix: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            toc_snippet_len: 80,
            lead_in_len: 120,
            cover_id: SmolStr::new_static("cover"),
            directive_prefix: "#magicmori".to_string(),
        }
    }
}
