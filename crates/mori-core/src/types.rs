//! Modifier types and their typed payloads.
//!
//! A [`Modifier`] is an interval over paragraph content (or the `(-1, -1)`
//! sentinel for paragraph-level flags) carrying a [`ModifierData`]. The data is
//! a sum type with one variant per modifier type, so a payload can never have
//! the wrong shape for its tag.
//!
//! [`ModifierType`] is the fieldless tag. The fixed type sets the editing
//! algorithms depend on (never-split, word-only, copy-on-split, ...) are
//! methods on it.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ModifierError;

/// Bound value used for both ends of a paragraph-level flag.
pub const SENTINEL: i32 = -1;

/// Per-draft undo counters identifying one authoring session.
pub type UndoCount = BTreeMap<SmolStr, SmolStr>;

/// Tag naming a modifier's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierType {
    // === Style spans ===
    Bold,
    Italic,
    Underline,
    Strike,
    Sup,
    Sub,
    Monospace,
    Highlight,

    // === Paragraph flags ===
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Bullet,
    Number,
    Indent,
    Layer,
    Question,
    Response,
    Nav,

    // === Widgets ===
    Image,
    Location,
    Emoji,

    // === Annotations ===
    TagComment,
    TagCommentMuted,
    Mention,
    Typo,

    // === Track changes ===
    Ui,
    Ud,
    Uc,
    Up,
    Ai,
    Ad,
    Ac,
    Ap,
    Noop,

    // === Paragraph compare markers ===
    Add,
    Del,
    Madd,
    Mdel,
}

impl ModifierType {
    pub const ALL: [ModifierType; 39] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strike,
        Self::Sup,
        Self::Sub,
        Self::Monospace,
        Self::Highlight,
        Self::AlignLeft,
        Self::AlignCenter,
        Self::AlignRight,
        Self::AlignJustify,
        Self::Bullet,
        Self::Number,
        Self::Indent,
        Self::Layer,
        Self::Question,
        Self::Response,
        Self::Nav,
        Self::Image,
        Self::Location,
        Self::Emoji,
        Self::TagComment,
        Self::TagCommentMuted,
        Self::Mention,
        Self::Typo,
        Self::Ui,
        Self::Ud,
        Self::Uc,
        Self::Up,
        Self::Ai,
        Self::Ad,
        Self::Ac,
        Self::Ap,
        Self::Noop,
        Self::Add,
        Self::Del,
        Self::Madd,
        Self::Mdel,
    ];

    /// Wire name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strike => "strike",
            Self::Sup => "sup",
            Self::Sub => "sub",
            Self::Monospace => "monospace",
            Self::Highlight => "highlight",
            Self::AlignLeft => "alignLeft",
            Self::AlignCenter => "alignCenter",
            Self::AlignRight => "alignRight",
            Self::AlignJustify => "alignJustify",
            Self::Bullet => "bullet",
            Self::Number => "number",
            Self::Indent => "indent",
            Self::Layer => "layer",
            Self::Question => "question",
            Self::Response => "response",
            Self::Nav => "nav",
            Self::Image => "image",
            Self::Location => "location",
            Self::Emoji => "emoji",
            Self::TagComment => "tagComment",
            Self::TagCommentMuted => "tagCommentMuted",
            Self::Mention => "mention",
            Self::Typo => "typo",
            Self::Ui => "ui",
            Self::Ud => "ud",
            Self::Uc => "uc",
            Self::Up => "up",
            Self::Ai => "ai",
            Self::Ad => "ad",
            Self::Ac => "ac",
            Self::Ap => "ap",
            Self::Noop => "noop",
            Self::Add => "add",
            Self::Del => "del",
            Self::Madd => "madd",
            Self::Mdel => "mdel",
        }
    }

    pub fn is_style(self) -> bool {
        matches!(
            self,
            Self::Bold
                | Self::Italic
                | Self::Underline
                | Self::Strike
                | Self::Sup
                | Self::Sub
                | Self::Monospace
                | Self::Highlight
        )
    }

    /// Paragraph-level flags, positioned at the sentinel range.
    pub fn is_paragraph_flag(self) -> bool {
        matches!(
            self,
            Self::AlignLeft
                | Self::AlignCenter
                | Self::AlignRight
                | Self::AlignJustify
                | Self::Bullet
                | Self::Number
                | Self::Indent
                | Self::Layer
                | Self::Question
                | Self::Response
                | Self::Nav
        )
    }

    pub fn is_alignment(self) -> bool {
        matches!(
            self,
            Self::AlignLeft | Self::AlignCenter | Self::AlignRight | Self::AlignJustify
        )
    }

    /// Flags duplicated onto the right piece of a split.
    pub fn is_copy_flag(self) -> bool {
        self.is_alignment()
            || matches!(
                self,
                Self::Bullet | Self::Number | Self::Indent | Self::Response
            )
    }

    pub fn is_widget(self) -> bool {
        matches!(self, Self::Image | Self::Location | Self::Emoji)
    }

    /// Types that are never split across a paragraph split nor merged with a
    /// contiguous neighbour of the same type.
    pub fn never_split_or_merge(self) -> bool {
        self.is_widget() || self == Self::Nav
    }

    /// Types bound to a single word: dropped, not split, when a split lands inside.
    pub fn is_word_only(self) -> bool {
        matches!(self, Self::Typo | Self::Mention)
    }

    pub fn allows_zero_length(self) -> bool {
        self.is_word_only() || self.is_widget()
    }

    pub fn is_tag_comment(self) -> bool {
        matches!(self, Self::TagComment | Self::TagCommentMuted)
    }

    pub fn is_track_change(self) -> bool {
        matches!(
            self,
            Self::Ui | Self::Ud | Self::Uc | Self::Up | Self::Ai | Self::Ad | Self::Ac | Self::Ap
        )
    }

    pub fn is_unaccepted(self) -> bool {
        matches!(self, Self::Ui | Self::Ud | Self::Uc | Self::Up)
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Ai | Self::Ad | Self::Ac | Self::Ap)
    }

    /// Whole-paragraph delete markers.
    pub fn is_paragraph_delete(self) -> bool {
        matches!(self, Self::Up | Self::Ap)
    }

    pub fn is_diff(self) -> bool {
        matches!(self, Self::Add | Self::Del | Self::Madd | Self::Mdel)
    }

    /// The accepted counterpart of an unaccepted track change.
    pub fn accepted_counterpart(self) -> Option<ModifierType> {
        match self {
            Self::Ui => Some(Self::Ai),
            Self::Ud => Some(Self::Ad),
            Self::Uc => Some(Self::Ac),
            Self::Up => Some(Self::Ap),
            _ => None,
        }
    }

    /// Types that cannot be stored without a payload.
    pub fn requires_payload(self) -> bool {
        self.is_track_change()
            || self.is_tag_comment()
            || self.is_widget()
            || matches!(
                self,
                Self::Noop | Self::Mention | Self::Layer | Self::Madd | Self::Mdel
            )
    }
}

impl fmt::Display for ModifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModifierType {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| ModifierError::UnknownType(s.to_string()))
    }
}

// === Payloads ===

/// Snapshot of what a change-type edit touched, used to undo one category of
/// change without disturbing others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertData {
    /// Modifier types the change altered.
    pub types: Vec<ModifierType>,
    /// Modifiers of those types over the changed span before the change.
    #[serde(default)]
    pub prior: Vec<Modifier>,
}

impl RevertData {
    pub fn for_types(types: impl IntoIterator<Item = ModifierType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            prior: Vec::new(),
        }
    }

    pub fn names(&self, ty: ModifierType) -> bool {
        self.types.contains(&ty)
    }
}

/// Payload of track-change markers and `noop` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcData {
    pub author_id: SmolStr,
    #[serde(default)]
    pub undo_count: UndoCount,
    pub edit_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_data: Option<RevertData>,
}

impl TcData {
    pub fn new(author_id: impl Into<SmolStr>, undo_count: UndoCount, edit_time: i64) -> Self {
        Self {
            author_id: author_id.into(),
            undo_count,
            edit_time,
            create_time: None,
            revert: None,
            revert_data: None,
        }
    }

    /// Two markers belong to the same edit session iff author and the full
    /// undo-count map are equal.
    pub fn same_session(&self, other: &TcData) -> bool {
        self.author_id == other.author_id && self.undo_count == other.undo_count
    }

    pub fn same_revert(&self, other: &TcData) -> bool {
        self.revert == other.revert && self.revert_data == other.revert_data
    }
}

/// Payload of comment anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCommentData {
    pub author_id: SmolStr,
    #[serde(default)]
    pub undo_count: UndoCount,
    pub thread_id: SmolStr,
    #[serde(default)]
    pub reply_id: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
}

impl TagCommentData {
    pub fn same_session(&self, other: &TagCommentData) -> bool {
        self.author_id == other.author_id && self.undo_count == other.undo_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionData {
    pub user_id: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
}

/// Payload shared by image, location and emoji widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    pub id: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerData {
    pub layer_id: SmolStr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HighlightData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<SmolStr>,
}

/// Payload of `add`/`del` compare markers. `None` is the "unknown source" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<SmolStr>,
}

impl DiffData {
    pub fn is_unknown(&self) -> bool {
        self.author_id.is_none()
    }
}

/// Payload of `madd`/`mdel` markers: the style that was added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDiffData {
    pub style: ModifierType,
}

// === Modifier data ===

/// Typed payload of a modifier, one variant per [`ModifierType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModifierData {
    Bold,
    Italic,
    Underline,
    Strike,
    Sup,
    Sub,
    Monospace,
    Highlight(HighlightData),

    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Bullet,
    Number,
    Indent,
    Layer(LayerData),
    Question,
    Response,
    Nav,

    Image(WidgetData),
    Location(WidgetData),
    Emoji(WidgetData),

    TagComment(TagCommentData),
    TagCommentMuted(TagCommentData),
    Mention(MentionData),
    Typo,

    Ui(TcData),
    Ud(TcData),
    Uc(TcData),
    Up(TcData),
    Ai(TcData),
    Ad(TcData),
    Ac(TcData),
    Ap(TcData),
    Noop(TcData),

    Add(DiffData),
    Del(DiffData),
    Madd(StyleDiffData),
    Mdel(StyleDiffData),
}

impl ModifierData {
    pub fn ty(&self) -> ModifierType {
        match self {
            Self::Bold => ModifierType::Bold,
            Self::Italic => ModifierType::Italic,
            Self::Underline => ModifierType::Underline,
            Self::Strike => ModifierType::Strike,
            Self::Sup => ModifierType::Sup,
            Self::Sub => ModifierType::Sub,
            Self::Monospace => ModifierType::Monospace,
            Self::Highlight(_) => ModifierType::Highlight,
            Self::AlignLeft => ModifierType::AlignLeft,
            Self::AlignCenter => ModifierType::AlignCenter,
            Self::AlignRight => ModifierType::AlignRight,
            Self::AlignJustify => ModifierType::AlignJustify,
            Self::Bullet => ModifierType::Bullet,
            Self::Number => ModifierType::Number,
            Self::Indent => ModifierType::Indent,
            Self::Layer(_) => ModifierType::Layer,
            Self::Question => ModifierType::Question,
            Self::Response => ModifierType::Response,
            Self::Nav => ModifierType::Nav,
            Self::Image(_) => ModifierType::Image,
            Self::Location(_) => ModifierType::Location,
            Self::Emoji(_) => ModifierType::Emoji,
            Self::TagComment(_) => ModifierType::TagComment,
            Self::TagCommentMuted(_) => ModifierType::TagCommentMuted,
            Self::Mention(_) => ModifierType::Mention,
            Self::Typo => ModifierType::Typo,
            Self::Ui(_) => ModifierType::Ui,
            Self::Ud(_) => ModifierType::Ud,
            Self::Uc(_) => ModifierType::Uc,
            Self::Up(_) => ModifierType::Up,
            Self::Ai(_) => ModifierType::Ai,
            Self::Ad(_) => ModifierType::Ad,
            Self::Ac(_) => ModifierType::Ac,
            Self::Ap(_) => ModifierType::Ap,
            Self::Noop(_) => ModifierType::Noop,
            Self::Add(_) => ModifierType::Add,
            Self::Del(_) => ModifierType::Del,
            Self::Madd(_) => ModifierType::Madd,
            Self::Mdel(_) => ModifierType::Mdel,
        }
    }

    /// Build data from a type name and an optional JSON payload, the shape
    /// modifiers take on the transport boundary.
    pub fn from_parts(
        type_name: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<Self, ModifierError> {
        let ty: ModifierType = type_name.parse()?;
        let mut object = match payload {
            Some(serde_json::Value::Object(map)) => map,
            Some(serde_json::Value::Null) | None => {
                if ty.requires_payload() {
                    return Err(ModifierError::MissingPayload(ty));
                }
                serde_json::Map::new()
            }
            Some(other) => {
                return Err(ModifierError::PayloadMismatch {
                    ty,
                    reason: format!("expected an object, got {other}"),
                });
            }
        };
        object.insert("type".into(), serde_json::Value::from(ty.name()));
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            ModifierError::PayloadMismatch {
                ty,
                reason: e.to_string(),
            }
        })
    }

    /// Wrap a track-change payload in the variant for `ty`.
    pub fn track_change(ty: ModifierType, tc: TcData) -> Option<Self> {
        match ty {
            ModifierType::Ui => Some(Self::Ui(tc)),
            ModifierType::Ud => Some(Self::Ud(tc)),
            ModifierType::Uc => Some(Self::Uc(tc)),
            ModifierType::Up => Some(Self::Up(tc)),
            ModifierType::Ai => Some(Self::Ai(tc)),
            ModifierType::Ad => Some(Self::Ad(tc)),
            ModifierType::Ac => Some(Self::Ac(tc)),
            ModifierType::Ap => Some(Self::Ap(tc)),
            ModifierType::Noop => Some(Self::Noop(tc)),
            _ => None,
        }
    }

    pub fn tc(&self) -> Option<&TcData> {
        match self {
            Self::Ui(tc)
            | Self::Ud(tc)
            | Self::Uc(tc)
            | Self::Up(tc)
            | Self::Ai(tc)
            | Self::Ad(tc)
            | Self::Ac(tc)
            | Self::Ap(tc)
            | Self::Noop(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn tc_mut(&mut self) -> Option<&mut TcData> {
        match self {
            Self::Ui(tc)
            | Self::Ud(tc)
            | Self::Uc(tc)
            | Self::Up(tc)
            | Self::Ai(tc)
            | Self::Ad(tc)
            | Self::Ac(tc)
            | Self::Ap(tc)
            | Self::Noop(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn tag_comment(&self) -> Option<&TagCommentData> {
        match self {
            Self::TagComment(data) | Self::TagCommentMuted(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_comment_mut(&mut self) -> Option<&mut TagCommentData> {
        match self {
            Self::TagComment(data) | Self::TagCommentMuted(data) => Some(data),
            _ => None,
        }
    }

    /// Re-tag a track-change payload as another track-change type.
    ///
    /// Returns the data unchanged when either side is not a track change.
    pub fn relabel(self, ty: ModifierType) -> Self {
        let Some(tc) = self.tc() else {
            return self;
        };
        Self::track_change(ty, tc.clone()).unwrap_or(self)
    }

    /// Timestamps used as the tertiary sort key.
    fn timestamp_key(&self) -> (i64, i64) {
        if let Some(tc) = self.tc() {
            return (tc.create_time.unwrap_or(tc.edit_time), tc.edit_time);
        }
        if let Some(comment) = self.tag_comment() {
            return (comment.create_time.unwrap_or(0), 0);
        }
        (0, 0)
    }

    /// Name of the inner style for compare markers, empty otherwise.
    fn subtype_name(&self) -> &'static str {
        match self {
            Self::Madd(diff) | Self::Mdel(diff) => diff.style.name(),
            _ => "",
        }
    }
}

// === Modifier ===

/// An interval-tagged annotation over paragraph content.
///
/// `start..end` is half-open over char offsets, or `(-1, -1)` for
/// paragraph-level flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub start: i32,
    pub end: i32,
    pub data: ModifierData,
}

impl Modifier {
    pub fn new(start: i32, end: i32, data: ModifierData) -> Self {
        Self { start, end, data }
    }

    /// A paragraph-level flag at the sentinel range.
    pub fn flag(data: ModifierData) -> Self {
        Self::new(SENTINEL, SENTINEL, data)
    }

    pub fn ty(&self) -> ModifierType {
        self.data.ty()
    }

    pub fn is_sentinel(&self) -> bool {
        self.start == SENTINEL
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Same data over a different range.
    pub fn with_range(&self, start: i32, end: i32) -> Self {
        Self::new(start, end, self.data.clone())
    }

    /// Whether this modifier shares at least one char with `start..end`.
    ///
    /// A zero-length modifier counts as overlapping when it sits strictly
    /// inside the range or at its start.
    pub fn overlaps(&self, start: i32, end: i32) -> bool {
        if self.is_sentinel() || start >= end {
            return false;
        }
        if self.start == self.end {
            return self.start >= start && self.start < end;
        }
        self.start < end && self.end > start
    }

    pub fn contains_pos(&self, pos: i32) -> bool {
        self.is_sentinel() || (self.start <= pos && pos < self.end)
    }

    pub fn tc(&self) -> Option<&TcData> {
        self.data.tc()
    }
}

/// Deterministic order over modifiers: start, end, track-change timestamps,
/// type name, then compare-marker style name.
pub fn compare_modifiers(a: &Modifier, b: &Modifier) -> Ordering {
    a.start
        .cmp(&b.start)
        .then(a.end.cmp(&b.end))
        .then_with(|| a.data.timestamp_key().cmp(&b.data.timestamp_key()))
        .then_with(|| a.ty().name().cmp(b.ty().name()))
        .then_with(|| a.data.subtype_name().cmp(b.data.subtype_name()))
}
