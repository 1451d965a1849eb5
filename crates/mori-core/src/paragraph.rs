//! The paragraph: a content string plus its modifier list.

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::text;
use crate::types::{LayerData, Modifier, ModifierData, ModifierType};

/// Paragraph kind. Drives split continuation, TOC membership, and alignment rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParagraphType {
    #[default]
    Plain,
    Title,
    Section,
    Chapter,
    Scene,
    ChatLeft,
    ChatRight,
    ChatHeader,
    Reference,
}

impl ParagraphType {
    /// Type of the paragraph created to the right of a split.
    pub fn continuation(self) -> ParagraphType {
        match self {
            Self::ChatLeft => Self::ChatRight,
            Self::ChatRight | Self::ChatHeader => Self::ChatLeft,
            Self::Reference => Self::Reference,
            Self::Plain | Self::Title | Self::Section | Self::Chapter | Self::Scene => Self::Plain,
        }
    }

    pub fn is_heading(self) -> bool {
        matches!(self, Self::Title | Self::Section | Self::Chapter | Self::Scene)
    }

    pub fn is_chat(self) -> bool {
        matches!(self, Self::ChatLeft | Self::ChatRight | Self::ChatHeader)
    }
}

/// A unit of text with interval-tagged annotations.
///
/// `modifiers` is kept sorted by [`crate::compare_modifiers`] and normalized by
/// [`crate::clean_up_modifiers`] after every bulk mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub id: SmolStr,
    #[serde(rename = "type", default)]
    pub ty: ParagraphType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_level: Option<u8>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl Paragraph {
    pub fn new(id: impl Into<SmolStr>, ty: ParagraphType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ty,
            content: content.into(),
            tab_level: None,
            modifiers: Vec::new(),
        }
    }

    /// Plain paragraph with the given content.
    pub fn plain(id: impl Into<SmolStr>, content: impl Into<String>) -> Self {
        Self::new(id, ParagraphType::Plain, content)
    }

    pub fn with_tab_level(mut self, tab_level: u8) -> Self {
        self.tab_level = Some(tab_level);
        self
    }

    /// Content length in chars, the bound of every non-sentinel modifier.
    pub fn content_len(&self) -> i32 {
        text::char_len(&self.content) as i32
    }

    /// Content with widget placeholders removed.
    pub fn plain_text(&self) -> String {
        text::plain_text(&self.content)
    }

    pub fn word_count(&self) -> usize {
        text::word_count(&self.content)
    }

    /// Content of `start..end` in char offsets.
    pub fn slice(&self, start: i32, end: i32) -> &str {
        text::char_slice(&self.content, start.max(0) as usize, end.max(0) as usize)
    }

    /// Layer this paragraph belongs to, if it carries a layer flag.
    pub fn layer_id(&self) -> Option<&SmolStr> {
        self.modifiers.iter().find_map(|m| match &m.data {
            ModifierData::Layer(LayerData { layer_id }) => Some(layer_id),
            _ => None,
        })
    }

    pub fn is_bulleted(&self) -> bool {
        self.modifiers.iter().any(|m| m.ty() == ModifierType::Bullet)
    }
}

/// Source of fresh paragraph and reply ids.
pub trait IdGen {
    fn next_id(&mut self) -> SmolStr;
}

impl<F> IdGen for F
where
    F: FnMut() -> SmolStr,
{
    fn next_id(&mut self) -> SmolStr {
        self()
    }
}

/// Monotonic id generator producing `{prefix}-{n}`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: SmolStr,
    next: usize,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn starting_at(prefix: impl Into<SmolStr>, next: usize) -> Self {
        Self {
            prefix: prefix.into(),
            next,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("p")
    }
}

impl IdGen for SequentialIds {
    fn next_id(&mut self) -> SmolStr {
        let id = format_smolstr!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
