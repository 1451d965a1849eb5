//! Track changes: reconciling pending edit markers, accept/reject, display
//! projections, and conversion of compare markers into tracked edits.
//!
//! Every tracked edit becomes a new marker that is reconciled against the
//! markers already on the paragraph before anything is inserted. The rules are
//! an explicit `(new, existing)` dispatch table, see [`action`].

use std::collections::HashSet;

use smol_str::SmolStr;

use crate::error::ModifierError;
use crate::paragraph::Paragraph;
use crate::store::remove_modifiers_in_range;
use crate::types::{
    Modifier, ModifierData, ModifierType, RevertData, SENTINEL, TcData, UndoCount,
};

/// Revert tag carried by change markers produced from style compare markers.
pub const PMOD_REVERT: &str = "pmod";

fn now_millis() -> i64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Who is editing: an author plus the per-draft undo counters that scope one
/// authoring session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    pub author_id: SmolStr,
    pub undo_count: UndoCount,
    /// Fixed edit time in epoch millis. `None` stamps edits with the current time.
    pub edit_time: Option<i64>,
}

impl EditSession {
    pub fn new(author_id: impl Into<SmolStr>, undo_count: UndoCount) -> Self {
        Self {
            author_id: author_id.into(),
            undo_count,
            edit_time: None,
        }
    }

    pub fn at(mut self, edit_time: i64) -> Self {
        self.edit_time = Some(edit_time);
        self
    }

    /// A tracked edit of `ty` over `start..end` in this session.
    pub fn edit(&self, ty: ModifierType, start: i32, end: i32) -> TrackedEdit {
        TrackedEdit {
            author_id: self.author_id.clone(),
            ty,
            start,
            end,
            undo_count: self.undo_count.clone(),
            revert: None,
            revert_data: None,
            edit_time: self.edit_time,
        }
    }
}

/// One edit performed while change tracking is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEdit {
    pub author_id: SmolStr,
    pub ty: ModifierType,
    pub start: i32,
    pub end: i32,
    pub undo_count: UndoCount,
    pub revert: Option<SmolStr>,
    pub revert_data: Option<RevertData>,
    pub edit_time: Option<i64>,
}

impl TrackedEdit {
    pub fn with_revert(mut self, revert: impl Into<SmolStr>, data: Option<RevertData>) -> Self {
        self.revert = Some(revert.into());
        self.revert_data = data;
        self
    }

    fn into_modifier(self) -> Result<Modifier, ModifierError> {
        let tc = TcData {
            author_id: self.author_id,
            undo_count: self.undo_count,
            edit_time: self.edit_time.unwrap_or_else(now_millis),
            create_time: None,
            revert: self.revert,
            revert_data: self.revert_data,
        };
        if !self.ty.is_track_change() {
            return Err(ModifierError::NotTrackChange(self.ty));
        }
        let data = ModifierData::track_change(self.ty, tc)
            .ok_or(ModifierError::NotTrackChange(self.ty))?;
        Ok(Modifier::new(self.start, self.end, data))
    }
}

// === Reconciliation ===

/// What a new marker does to one existing marker it meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Leave both alone.
    Keep,
    /// Extend the existing marker over the new one; nothing is inserted.
    Absorb,
    /// Cut the new range out of the existing marker.
    Clip,
    /// Turn a paragraph delete into a range delete over the content, then clip.
    DowngradeThenClip,
    /// The new delete removes text the same session inserted: the overlap is
    /// physically deleted and no delete marker is recorded for it.
    Cancel,
    /// The overlap is already deleted; drop it from the new marker.
    Drop,
    /// The overlap is covered by a `noop` placeholder instead of the new marker.
    Placeholder,
    /// The new change lands on the same session's own insert; drop the overlap.
    AbsorbInto,
}

/// The reconciliation dispatch table.
pub(crate) fn action(new: ModifierType, existing: ModifierType, same_session: bool) -> Action {
    use ModifierType::*;
    match (new, existing) {
        (Ui, Ui) if same_session => Action::Absorb,
        (Ui, Ui | Ud | Uc | Ai | Ad | Ac) => Action::Clip,
        (Ui, Up | Ap) => Action::DowngradeThenClip,

        (Ud, Ui) if same_session => Action::Cancel,
        (Ud, Ud | Up) => Action::Drop,
        (Ud, Uc | Ai | Ad | Ac | Ap) => Action::Placeholder,

        (Uc, Ui) if same_session => Action::AbsorbInto,
        (Uc, Ud | Up | Ap) => Action::Placeholder,

        _ => Action::Keep,
    }
}

/// Outcome of reconciling one new marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Markers to insert. Empty when the edit was absorbed.
    pub insert: Vec<Modifier>,
    /// Ranges of pending inserted text the edit cancelled; the caller deletes
    /// this text, after inserting `insert`.
    pub cancelled: Vec<(i32, i32)>,
}

type Span = (i32, i32);

fn span_of(m: &Modifier, content_len: i32) -> Span {
    if m.is_sentinel() {
        (0, content_len)
    } else {
        (m.start, m.end)
    }
}

fn intersect(a: Span, b: Span) -> Option<Span> {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    (start < end).then_some((start, end))
}

fn subtract(from: Span, cut: Span) -> Vec<Span> {
    if intersect(from, cut).is_none() {
        return vec![from];
    }
    let mut out = Vec::with_capacity(2);
    if from.0 < cut.0 {
        out.push((from.0, cut.0));
    }
    if cut.1 < from.1 {
        out.push((cut.1, from.1));
    }
    out
}

fn touches(a: Span, b: Span) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Reconcile `new` against `existing`, walking existing markers newest-first.
///
/// `existing` is edited in place (absorbed, clipped, downgraded). The new
/// marker is carried as a set of fragments that shrink as existing markers
/// claim parts of it; whatever survives is returned for insertion. Sentinel
/// markers and markers that are not pending are returned as-is.
pub fn reconcile(existing: &mut Vec<Modifier>, new: Modifier, content_len: i32) -> Reconciliation {
    let mut out = Reconciliation::default();
    let new_ty = new.ty();
    let Some(new_tc) = new.tc().cloned() else {
        out.insert.push(new);
        return out;
    };
    if new.is_sentinel() || !new_ty.is_unaccepted() {
        out.insert.push(new);
        return out;
    }
    if new.start >= new.end {
        return out;
    }

    let mut fragments: Vec<Span> = vec![(new.start, new.end)];
    let mut i = existing.len();
    while i > 0 && !fragments.is_empty() {
        i -= 1;
        let act = match existing[i].tc() {
            Some(old_tc) if existing[i].ty() != ModifierType::Noop => {
                action(new_ty, existing[i].ty(), new_tc.same_session(old_tc))
            }
            _ => continue,
        };
        let mut span = span_of(&existing[i], content_len);

        match act {
            Action::Keep => {}
            Action::Absorb => {
                if existing[i].is_sentinel() {
                    continue;
                }
                while let Some(pos) = fragments.iter().position(|&f| touches(span, f)) {
                    let f = fragments.remove(pos);
                    let m = &mut existing[i];
                    m.start = m.start.min(f.0);
                    m.end = m.end.max(f.1);
                    if let Some(tc) = m.data.tc_mut() {
                        tc.edit_time = tc.edit_time.max(new_tc.edit_time);
                    }
                    span = (m.start, m.end);
                }
            }
            Action::Clip | Action::DowngradeThenClip => {
                if !fragments.iter().any(|&f| intersect(span, f).is_some()) {
                    continue;
                }
                let mut m = existing.remove(i);
                if act == Action::DowngradeThenClip {
                    let downgraded = match m.ty() {
                        ModifierType::Ap => ModifierType::Ad,
                        _ => ModifierType::Ud,
                    };
                    m.data = m.data.relabel(downgraded);
                }
                let mut pieces = vec![span];
                for &f in &fragments {
                    pieces = pieces.into_iter().flat_map(|p| subtract(p, f)).collect();
                }
                for (start, end) in pieces.into_iter().rev() {
                    existing.insert(i, m.with_range(start, end));
                }
            }
            Action::Cancel | Action::Drop | Action::Placeholder | Action::AbsorbInto => {
                let mut rest = Vec::with_capacity(fragments.len());
                for f in fragments.drain(..) {
                    let Some(overlap) = intersect(f, span) else {
                        rest.push(f);
                        continue;
                    };
                    match act {
                        Action::Cancel => out.cancelled.push(overlap),
                        Action::Placeholder => out.insert.push(Modifier::new(
                            overlap.0,
                            overlap.1,
                            ModifierData::Noop(new_tc.clone()),
                        )),
                        _ => {}
                    }
                    rest.extend(subtract(f, overlap));
                }
                fragments = rest;
            }
        }
    }

    out.insert
        .extend(fragments.into_iter().map(|(s, e)| new.with_range(s, e)));
    out
}

/// Record a tracked edit on `p`.
///
/// The content edit itself (for inserts) must already have happened. Returns
/// how many markers were inserted; `0` means the edit was absorbed into
/// existing markers. A delete over the same session's pending insert removes
/// that text outright.
pub fn track_user_edit(p: &mut Paragraph, edit: TrackedEdit) -> Result<usize, ModifierError> {
    let len = p.content_len();
    let new = edit.into_modifier().inspect_err(|e| {
        tracing::warn!(para = %p.id, error = %e, "rejected tracked edit");
    })?;
    if !new.is_sentinel() {
        let err = if new.end < new.start {
            Some(ModifierError::InvertedRange {
                start: new.start,
                end: new.end,
            })
        } else if new.start < 0 || new.end > len {
            Some(ModifierError::OutOfBounds {
                start: new.start,
                end: new.end,
                len,
            })
        } else {
            None
        };
        if let Some(err) = err {
            tracing::warn!(para = %p.id, error = %err, "rejected tracked edit");
            return Err(err);
        }
    }

    let ty = new.ty();
    let Reconciliation {
        insert,
        mut cancelled,
    } = reconcile(&mut p.modifiers, new, len);
    let inserted = insert.len();
    p.modifiers.extend(insert);
    cancelled.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end) in cancelled {
        p.remove_content_raw(start, end);
    }
    p.clean_up();
    tracing::debug!(para = %p.id, %ty, inserted, "tracked edit");
    Ok(inserted)
}

/// Insert `text` at `pos` and mark it as a pending insert.
pub fn insert_tracked_text(
    p: &mut Paragraph,
    pos: i32,
    text: &str,
    session: &EditSession,
) -> Result<usize, ModifierError> {
    p.insert_content(pos, text)?;
    let added = crate::text::char_len(text) as i32;
    track_user_edit(p, session.edit(ModifierType::Ui, pos, pos + added))
}

/// Mark `start..end` as a pending delete. Text stays until accepted, except
/// text the same session inserted, which is removed immediately.
pub fn delete_tracked_range(
    p: &mut Paragraph,
    start: i32,
    end: i32,
    session: &EditSession,
) -> Result<usize, ModifierError> {
    track_user_edit(p, session.edit(ModifierType::Ud, start, end))
}

// === Accept / reject ===

fn pending_at(p: &Paragraph, idx: usize) -> Result<ModifierType, ModifierError> {
    let m = p
        .modifiers
        .get(idx)
        .ok_or(ModifierError::IndexOutOfRange(idx))?;
    if m.ty().is_unaccepted() {
        Ok(m.ty())
    } else {
        Err(ModifierError::NotPending(idx))
    }
}

fn accept_at(p: &mut Paragraph, idx: usize) -> Result<(), ModifierError> {
    let ty = pending_at(p, idx)?;
    let Some(accepted) = ty.accepted_counterpart() else {
        return Err(ModifierError::NotPending(idx));
    };
    let m = &mut p.modifiers[idx];
    m.data = m.data.clone().relabel(accepted);
    if ty == ModifierType::Ud {
        if let Some(tc) = m.data.tc_mut() {
            tc.revert = None;
            tc.revert_data = None;
        }
        let (start, end) = (m.start, m.end);
        p.remove_content_raw(start, end);
    }
    Ok(())
}

/// Accept the pending marker at `idx`. Accepting a delete removes its text.
pub fn accept_modifier(p: &mut Paragraph, idx: usize) -> Result<(), ModifierError> {
    accept_at(p, idx).inspect_err(|e| {
        tracing::warn!(para = %p.id, error = %e, "cannot accept");
    })?;
    p.clean_up();
    Ok(())
}

/// Accept every pending marker, normalizing once at the end.
pub fn accept_all_modifiers(p: &mut Paragraph) -> Result<usize, ModifierError> {
    let mut accepted = 0;
    while let Some(idx) = p.modifiers.iter().position(|m| m.ty().is_unaccepted()) {
        accept_at(p, idx)?;
        accepted += 1;
    }
    p.clean_up();
    tracing::debug!(para = %p.id, accepted, "accepted all changes");
    Ok(accepted)
}

fn reject_at(p: &mut Paragraph, idx: usize) -> Result<(), ModifierError> {
    let ty = pending_at(p, idx)?;
    match ty {
        ModifierType::Ui => {
            let (start, end) = (p.modifiers[idx].start, p.modifiers[idx].end);
            p.modifiers.remove(idx);
            p.remove_content_raw(start, end);
        }
        ModifierType::Uc => {
            let m = p.modifiers.remove(idx);
            let revert = m.tc().and_then(|tc| tc.revert_data.clone());
            if let Some(revert) = revert {
                remove_modifiers_in_range(&mut p.modifiers, m.start, m.end, Some(revert.types.as_slice()));
                p.modifiers.extend(revert.prior);
            }
        }
        _ => {
            p.modifiers.remove(idx);
        }
    }
    Ok(())
}

/// Reject the pending marker at `idx`: pending inserts lose their text,
/// pending deletes are dropped, and pending changes restore the modifiers they
/// replaced.
pub fn reject_modifier(p: &mut Paragraph, idx: usize) -> Result<(), ModifierError> {
    reject_at(p, idx).inspect_err(|e| {
        tracing::warn!(para = %p.id, error = %e, "cannot reject");
    })?;
    p.clean_up();
    Ok(())
}

pub fn reject_all_modifiers(p: &mut Paragraph) -> Result<usize, ModifierError> {
    let mut rejected = 0;
    while let Some(idx) = p.modifiers.iter().position(|m| m.ty().is_unaccepted()) {
        reject_at(p, idx)?;
        rejected += 1;
    }
    p.clean_up();
    Ok(rejected)
}

// === Display projections ===

/// Which track-change markers a projection may act on.
///
/// Undo ids are the values of a marker's undo-count map; draft ids are its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityFilter {
    /// When set, only markers carrying one of these undo ids are visible.
    pub allow_undo_ids: Option<HashSet<SmolStr>>,
    pub block_undo_ids: HashSet<SmolStr>,
    pub excluded_authors: HashSet<SmolStr>,
    pub excluded_draft_id: Option<SmolStr>,
}

impl VisibilityFilter {
    pub fn is_visible(&self, tc: &TcData) -> bool {
        if self.excluded_authors.contains(&tc.author_id) {
            return false;
        }
        if let Some(draft) = &self.excluded_draft_id {
            if tc.undo_count.contains_key(draft) {
                return false;
            }
        }
        if tc
            .undo_count
            .values()
            .any(|id| self.block_undo_ids.contains(id))
        {
            return false;
        }
        match &self.allow_undo_ids {
            Some(allow) => tc.undo_count.values().any(|id| allow.contains(id)),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripMode {
    /// Show the document as if every change were applied.
    Redline,
    /// Apply accepted changes, leave pending ones marked.
    Accepted,
    /// Apply all deletes but keep insert and change markers for attribution.
    NonBlame,
}

impl StripMode {
    /// Delete markers whose text this mode removes.
    fn realizes(self, ty: ModifierType) -> bool {
        use ModifierType::*;
        match self {
            Self::Redline | Self::NonBlame => matches!(ty, Ud | Ad | Up | Ap),
            Self::Accepted => matches!(ty, Ad | Ap),
        }
    }

    /// Insert and change markers this mode drops.
    fn drops(self, ty: ModifierType) -> bool {
        use ModifierType::*;
        match self {
            Self::Redline => matches!(ty, Ui | Uc | Ai | Ac),
            Self::Accepted => matches!(ty, Ai | Ac),
            Self::NonBlame => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The paragraph is deleted as a whole in this view.
    Removed,
    Paragraph(Paragraph),
}

impl Projection {
    pub fn paragraph(&self) -> Option<&Paragraph> {
        match self {
            Self::Removed => None,
            Self::Paragraph(p) => Some(p),
        }
    }
}

/// Project `p` for display under `mode`. Markers hidden by `filter` are left
/// untouched; `noop` placeholders are always dropped.
pub fn strip_modifiers(p: &Paragraph, mode: StripMode, filter: &VisibilityFilter) -> Projection {
    let acts_on = |m: &Modifier| m.tc().is_some_and(|tc| filter.is_visible(tc));

    let removed = p
        .modifiers
        .iter()
        .any(|m| m.ty().is_paragraph_delete() && mode.realizes(m.ty()) && acts_on(m));
    if removed {
        return Projection::Removed;
    }

    let mut out = p.clone();
    let mut deletes: Vec<Span> = Vec::new();
    out.modifiers.retain(|m| {
        let ty = m.ty();
        if ty == ModifierType::Noop {
            return false;
        }
        if !ty.is_track_change() || !acts_on(m) {
            return true;
        }
        if mode.realizes(ty) {
            if !m.is_sentinel() {
                deletes.push((m.start, m.end));
            }
            return false;
        }
        !mode.drops(ty)
    });

    deletes.sort();
    let mut merged: Vec<Span> = Vec::with_capacity(deletes.len());
    for d in deletes {
        match merged.last_mut() {
            Some(last) if d.0 <= last.1 => last.1 = last.1.max(d.1),
            _ => merged.push(d),
        }
    }
    for (start, end) in merged.into_iter().rev() {
        out.remove_content_raw(start, end);
    }
    out.clean_up();
    Projection::Paragraph(out)
}

pub fn strip_redline_modifiers(p: &Paragraph, filter: &VisibilityFilter) -> Projection {
    strip_modifiers(p, StripMode::Redline, filter)
}

pub fn strip_accepted_modifiers(p: &Paragraph, filter: &VisibilityFilter) -> Projection {
    strip_modifiers(p, StripMode::Accepted, filter)
}

pub fn strip_non_blame_modifiers(p: &Paragraph, filter: &VisibilityFilter) -> Projection {
    strip_modifiers(p, StripMode::NonBlame, filter)
}

// === Compare markers ===

const DIFF_TYPES: [ModifierType; 4] = [
    ModifierType::Add,
    ModifierType::Del,
    ModifierType::Madd,
    ModifierType::Mdel,
];

fn style_data(style: ModifierType) -> Option<ModifierData> {
    ModifierData::from_parts(style.name(), None).ok()
}

/// Replay compare markers as tracked edits by `session`.
///
/// `add` becomes an insert, `del` a delete (a paragraph delete when it covers
/// all of non-empty content), and `madd`/`mdel` a change tagged
/// [`PMOD_REVERT`] naming the style. With `auto_accept` the accepted
/// counterparts are recorded instead. Returns how many markers were inserted.
///
/// On error `p` is left as it was.
pub fn convert_para_diff_mods_to_tc_mods(
    p: &mut Paragraph,
    session: &EditSession,
    auto_accept: bool,
) -> Result<usize, ModifierError> {
    let mut work = p.clone();
    let inserted = replay_diff_mods(&mut work, session, auto_accept)?;
    *p = work;
    Ok(inserted)
}

fn replay_diff_mods(
    p: &mut Paragraph,
    session: &EditSession,
    auto_accept: bool,
) -> Result<usize, ModifierError> {
    let pick = |ty: ModifierType| {
        if auto_accept {
            ty.accepted_counterpart().unwrap_or(ty)
        } else {
            ty
        }
    };
    let diffs = p.remove_modifiers_by_type(&DIFF_TYPES);
    let mut inserted = 0;
    for m in diffs {
        let len = p.content_len();
        let edit = match &m.data {
            ModifierData::Add(_) => session.edit(pick(ModifierType::Ui), m.start, m.end),
            ModifierData::Del(_) => {
                let whole = m.is_sentinel() || (len > 0 && m.start == 0 && m.end == len);
                if whole {
                    session.edit(pick(ModifierType::Up), SENTINEL, SENTINEL)
                } else {
                    session.edit(pick(ModifierType::Ud), m.start, m.end)
                }
            }
            ModifierData::Madd(diff) => session
                .edit(pick(ModifierType::Uc), m.start, m.end)
                .with_revert(PMOD_REVERT, Some(RevertData::for_types([diff.style]))),
            ModifierData::Mdel(diff) => {
                let mut revert = RevertData::for_types([diff.style]);
                revert
                    .prior
                    .extend(style_data(diff.style).map(|d| Modifier::new(m.start, m.end, d)));
                session
                    .edit(pick(ModifierType::Uc), m.start, m.end)
                    .with_revert(PMOD_REVERT, Some(revert))
            }
            _ => continue,
        };
        inserted += track_user_edit(p, edit)?;
    }
    Ok(inserted)
}

/// Drop compare markers that fall inside text already marked pending, so a
/// compare pass never reports a change inside a pending edit.
pub fn fixup_track_changes_mods_for_diff_mods(p: &mut Paragraph) {
    let len = p.content_len();
    let pending: Vec<Modifier> = p
        .modifiers
        .iter()
        .filter(|m| m.ty().is_unaccepted())
        .cloned()
        .collect();
    for m in &pending {
        let (start, end) = span_of(m, len);
        remove_modifiers_in_range(&mut p.modifiers, start, end, Some(&DIFF_TYPES[..]));
        if m.is_sentinel() {
            p.modifiers
                .retain(|d| !(d.is_sentinel() && d.ty().is_diff()));
        }
    }
    p.clean_up();
}

#[cfg(test)]
mod tests;
