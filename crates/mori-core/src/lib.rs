//! mori-core: the rich-text paragraph model.
//!
//! This crate provides:
//! - `Paragraph` - content string plus a sorted list of interval `Modifier`s
//! - the modifier store (add, query, clip, merge, normalize)
//! - structural edits: insert/remove content, split, merge, dupe
//! - track changes: reconciliation, accept/reject, display projections
//! - flattening into non-overlapping runs and HTML export
//!
//! Offsets are char offsets. Paragraph-level flags sit at the `(-1, -1)`
//! sentinel range.

pub mod content;
pub mod error;
pub mod flatten;
pub mod html;
pub mod paragraph;
pub mod split;
pub mod store;
pub mod text;
pub mod track_changes;
pub mod types;

pub use error::ModifierError;
pub use flatten::{ContentRun, RenderPriority, get_modifiers_for_content, get_uncollapsed_modifiers};
pub use html::{convert_paras_to_html, convert_to_html};
pub use paragraph::{IdGen, Paragraph, ParagraphType, SequentialIds};
pub use smol_str::SmolStr;
pub use split::{dupe, merge_paragraphs, split_paragraph};
pub use store::{
    can_merge, clean_up_modifiers, merge_adjacent_modifiers, remove_modifiers_in_range,
    sort_modifiers,
};
pub use track_changes::{
    EditSession, PMOD_REVERT, Projection, Reconciliation, StripMode, TrackedEdit,
    VisibilityFilter, accept_all_modifiers, accept_modifier, convert_para_diff_mods_to_tc_mods,
    delete_tracked_range, fixup_track_changes_mods_for_diff_mods, insert_tracked_text, reconcile,
    reject_all_modifiers, reject_modifier, strip_accepted_modifiers, strip_modifiers,
    strip_non_blame_modifiers, strip_redline_modifiers, track_user_edit,
};
pub use types::{
    DiffData, HighlightData, LayerData, MentionData, Modifier, ModifierData, ModifierType,
    RevertData, SENTINEL, StyleDiffData, TagCommentData, TcData, UndoCount, WidgetData,
    compare_modifiers,
};
