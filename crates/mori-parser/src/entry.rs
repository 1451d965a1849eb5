//! Render-ready document entries.

use mori_core::{ParagraphType, WidgetData};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Reader progress counted before an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub words_so_far: usize,
    pub chars_so_far: usize,
    /// Chars excluding content of layered paragraphs.
    pub base_chars_so_far: usize,
}

/// One item of the linearized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(flatten)]
    pub counters: Counters,
    #[serde(flatten)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntryKind {
    Paragraph(ParagraphEntry),
    Images(ImagesEntry),
    AuthorNote(AuthorNoteEntry),
    Button(ButtonEntry),
    CommentSummary(CommentSummaryEntry),
    Preview(PreviewEntry),
    Terminator,
    Data(DataEntry),
}

impl Entry {
    pub fn paragraph(&self) -> Option<&ParagraphEntry> {
        match &self.kind {
            EntryKind::Paragraph(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphEntry {
    pub para_id: SmolStr,
    /// Index into the parsed paragraph slice. `None` for the cover.
    pub para_index: Option<usize>,
    pub para_type: ParagraphType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_level: Option<u8>,
    /// List number, filled in after the main pass for numbered paragraphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default)]
    pub is_cover: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<SmolStr>,
}

/// A paragraph that holds nothing but image widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesEntry {
    pub para_id: SmolStr,
    pub images: Vec<WidgetData>,
}

/// Paragraphs gathered between a start and a stop directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorNoteEntry {
    pub name: SmolStr,
    pub para_ids: Vec<SmolStr>,
    pub para_count: usize,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonEntry {
    pub name: SmolStr,
    pub icon: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flyout_text: Option<String>,
    #[serde(default)]
    pub reactions: Vec<SmolStr>,
    #[serde(default)]
    pub matches: Vec<SmolStr>,
}

/// Comment threads anchored in the stretch of document before a heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummaryEntry {
    pub thread_ids: Vec<SmolStr>,
    pub comment_count: usize,
    /// Heading that closes the stretch; `None` at the end of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_para_id: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub para_id: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntry {
    pub para_id: SmolStr,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TocKind {
    Chapter,
    Section,
    Scene,
}

impl TocKind {
    pub fn for_paragraph(ty: ParagraphType) -> Option<TocKind> {
        match ty {
            ParagraphType::Chapter => Some(TocKind::Chapter),
            ParagraphType::Section => Some(TocKind::Section),
            ParagraphType::Scene => Some(TocKind::Scene),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    #[serde(rename = "type")]
    pub kind: TocKind,
    pub para_id: SmolStr,
    pub para_index: usize,
    /// Position of the heading's entry in [`ParsedData::entries`].
    pub entry_index: usize,
    pub text: String,
    pub lead_in: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub words: usize,
    pub chars: usize,
    pub base_chars: usize,
}

/// Output of one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    pub entries: Vec<Entry>,
    pub toc: Vec<TocEntry>,
    pub totals: Totals,
}

impl ParsedData {
    pub fn paragraph_entries(&self) -> impl Iterator<Item = &ParagraphEntry> {
        self.entries.iter().filter_map(Entry::paragraph)
    }
}
