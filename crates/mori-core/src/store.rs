//! Modifier store: add, query, remove, sort, merge and normalize.
//!
//! The modifier list is a sorted `Vec` maintained with linear scans. Merging
//! and clipping are easiest to reason about this way, and correctness rests
//! entirely on [`compare_modifiers`] and [`can_merge`].

use std::collections::HashSet;

use crate::error::ModifierError;
use crate::paragraph::Paragraph;
use crate::types::{Modifier, ModifierData, ModifierType, SENTINEL, compare_modifiers};

/// Sort modifiers in place by the canonical comparator. Stable.
pub fn sort_modifiers(mods: &mut [Modifier]) {
    mods.sort_by(compare_modifiers);
}

/// Whether `later` may be folded into `earlier` (which sorts first).
///
/// Both must share a type outside the never-merge set and touch or overlap.
/// Change markers (`uc`/`ac`) never merge: each one carries its own revert
/// record. Other track changes and comments must come from the same session
/// (and for track changes carry the same revert info); compare style markers
/// must name the same style; everything else needs identical payloads.
pub fn can_merge(earlier: &Modifier, later: &Modifier) -> bool {
    let ty = earlier.ty();
    if ty != later.ty() || ty.never_split_or_merge() || is_change(ty) {
        return false;
    }
    if earlier.is_sentinel() != later.is_sentinel() {
        return false;
    }
    if !earlier.is_sentinel() && later.start > earlier.end {
        return false;
    }
    match (&earlier.data, &later.data) {
        (a, b) if a.tc().is_some() => match (a.tc(), b.tc()) {
            (Some(a), Some(b)) => a.same_session(b) && a.same_revert(b),
            _ => false,
        },
        (a, b) if a.tag_comment().is_some() => match (a.tag_comment(), b.tag_comment()) {
            (Some(a), Some(b)) => a.same_session(b),
            _ => false,
        },
        (ModifierData::Madd(a), ModifierData::Madd(b))
        | (ModifierData::Mdel(a), ModifierData::Mdel(b)) => a.style == b.style,
        (a, b) => a == b,
    }
}

/// Fold touching or overlapping mergeable modifiers together until nothing
/// changes. The earlier entry is extended to cover both and the later one is
/// dropped. Leaves the list sorted.
pub fn merge_adjacent_modifiers(mods: &mut Vec<Modifier>) {
    sort_modifiers(mods);
    loop {
        let mut changed = false;
        let mut i = 0;
        while i < mods.len() {
            let mut j = i + 1;
            while j < mods.len() {
                if !mods[i].is_sentinel() && mods[j].start > mods[i].end {
                    break;
                }
                if can_merge(&mods[i], &mods[j]) {
                    let later = mods.remove(j);
                    let earlier = &mut mods[i];
                    earlier.end = earlier.end.max(later.end);
                    if let (Some(keep), Some(drop)) = (earlier.data.tc_mut(), later.tc()) {
                        keep.edit_time = keep.edit_time.max(drop.edit_time);
                    }
                    changed = true;
                    continue;
                }
                j += 1;
            }
            i += 1;
        }
        if !changed {
            break;
        }
        sort_modifiers(mods);
    }
}

fn is_change(ty: ModifierType) -> bool {
    matches!(ty, ModifierType::Uc | ModifierType::Ac)
}

/// Keep only the last-added of any entries sharing a type and span. Change
/// markers are exempt since several may cover one range, one per category.
fn fold_same_span(mods: &mut Vec<Modifier>) {
    let mut seen = HashSet::new();
    let mut keep = vec![true; mods.len()];
    for (i, m) in mods.iter().enumerate().rev() {
        if !is_change(m.ty()) && !seen.insert((m.ty(), m.start, m.end)) {
            keep[i] = false;
        }
    }
    let mut keep = keep.into_iter();
    mods.retain(|_| keep.next().unwrap_or(true));
}

/// Idempotent normalizer run after any bulk mutation.
///
/// Clamps ends to `content_len`, then drops entries that are inverted, empty
/// for types that need length, negative, or start past the content. Sentinel
/// flags are kept as-is. Entries sharing a type and span collapse to the one
/// added last. Finally sorts and merges.
pub fn clean_up_modifiers(mods: &mut Vec<Modifier>, content_len: i32) {
    for m in mods.iter_mut() {
        if m.is_sentinel() {
            m.end = SENTINEL;
        } else if m.end > content_len {
            m.end = content_len;
        }
    }
    mods.retain(|m| {
        if m.is_sentinel() {
            return true;
        }
        if m.start < 0 || m.start > content_len || m.start > m.end {
            return false;
        }
        m.start < m.end || m.ty().allows_zero_length()
    });
    fold_same_span(mods);
    sort_modifiers(mods);
    mods.dedup();
    merge_adjacent_modifiers(mods);
    // Merging can grow a span onto one that differs only in payload.
    fold_same_span(mods);
}

/// Whether `m` is selected by a type filter.
///
/// Change markers (`uc`/`ac`) carrying revert data are matched by the types
/// that data names rather than by their own tag, so undoing one category of
/// change leaves other categories alone.
fn matches_filter(m: &Modifier, types: Option<&[ModifierType]>) -> bool {
    let Some(types) = types else {
        return true;
    };
    if is_change(m.ty()) {
        if let Some(revert) = m.tc().and_then(|tc| tc.revert_data.as_ref()) {
            return revert.types.iter().any(|ty| types.contains(ty));
        }
    }
    types.contains(&m.ty())
}

/// Clip every matching modifier against `start..end`.
///
/// Modifiers straddling a boundary keep their surviving left and/or right
/// remnants; modifiers wholly inside are removed. Returns the originals that
/// were touched. Afterwards no matching modifier overlaps the range.
pub fn remove_modifiers_in_range(
    mods: &mut Vec<Modifier>,
    start: i32,
    end: i32,
    types: Option<&[ModifierType]>,
) -> Vec<Modifier> {
    let mut kept = Vec::with_capacity(mods.len());
    let mut right_remnants = Vec::new();
    let mut touched = Vec::new();

    for m in mods.drain(..) {
        if !m.overlaps(start, end) || !matches_filter(&m, types) {
            kept.push(m);
            continue;
        }
        if m.start < start {
            kept.push(m.with_range(m.start, start));
        }
        if m.end > end {
            right_remnants.push(m.with_range(end, m.end));
        }
        touched.push(m);
    }

    kept.extend(right_remnants);
    sort_modifiers(&mut kept);
    *mods = kept;
    touched
}

impl Paragraph {
    /// Add a modifier, merging it with contiguous compatible neighbours.
    ///
    /// An existing modifier with the same type and range has its payload
    /// replaced instead of being duplicated. Compare markers (`add`/`del`)
    /// keep their payload when the new one names an unknown source.
    pub fn add_modifier(
        &mut self,
        start: i32,
        end: i32,
        data: ModifierData,
    ) -> Result<(), ModifierError> {
        self.insert_modifier(start, end, data, true)
    }

    /// Add a modifier without merging it into its neighbours.
    pub fn add_modifier_unmerged(
        &mut self,
        start: i32,
        end: i32,
        data: ModifierData,
    ) -> Result<(), ModifierError> {
        self.insert_modifier(start, end, data, false)
    }

    /// Add a modifier given as a type name plus optional JSON payload.
    pub fn add_modifier_raw(
        &mut self,
        type_name: &str,
        start: i32,
        end: i32,
        payload: Option<serde_json::Value>,
    ) -> Result<(), ModifierError> {
        let data = ModifierData::from_parts(type_name, payload).inspect_err(|e| {
            tracing::warn!(para = %self.id, error = %e, "rejected modifier");
        })?;
        self.add_modifier(start, end, data)
    }

    fn insert_modifier(
        &mut self,
        start: i32,
        end: i32,
        data: ModifierData,
        merge: bool,
    ) -> Result<(), ModifierError> {
        if end < start {
            let err = ModifierError::InvertedRange { start, end };
            tracing::warn!(para = %self.id, ty = %data.ty(), error = %err, "rejected modifier");
            return Err(err);
        }

        let ty = data.ty();
        if let Some(existing) = self
            .modifiers
            .iter_mut()
            .find(|m| m.ty() == ty && m.start == start && m.end == end)
        {
            let keep_existing = matches!(&data, ModifierData::Add(d) | ModifierData::Del(d) if d.is_unknown());
            if !keep_existing {
                existing.data = data;
            }
            return Ok(());
        }

        self.modifiers.push(Modifier::new(start, end, data));
        if merge {
            merge_adjacent_modifiers(&mut self.modifiers);
        } else {
            sort_modifiers(&mut self.modifiers);
        }
        Ok(())
    }

    pub fn find_modifiers_by_type(&self, ty: ModifierType) -> Vec<&Modifier> {
        self.modifiers.iter().filter(|m| m.ty() == ty).collect()
    }

    /// The single modifier of `ty`. Warns when more than one exists and
    /// returns the first.
    pub fn find_one_modifier_by_type(&self, ty: ModifierType) -> Option<&Modifier> {
        let found = self.find_modifiers_by_type(ty);
        if found.len() > 1 {
            tracing::warn!(para = %self.id, %ty, count = found.len(), "expected one modifier");
        }
        found.into_iter().next()
    }

    pub fn has_modifier(&self, ty: ModifierType) -> bool {
        self.modifiers.iter().any(|m| m.ty() == ty)
    }

    /// Whether a modifier of `ty` covers `pos`. Paragraph flags cover every position.
    pub fn has_modifier_at_pos(&self, ty: ModifierType, pos: i32) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.ty() == ty && m.contains_pos(pos))
    }

    /// Remove every modifier whose type is in `types`, returned in original order.
    pub fn remove_modifiers_by_type(&mut self, types: &[ModifierType]) -> Vec<Modifier> {
        let (removed, kept) = std::mem::take(&mut self.modifiers)
            .into_iter()
            .partition(|m| types.contains(&m.ty()));
        self.modifiers = kept;
        removed
    }

    /// Run [`clean_up_modifiers`] against this paragraph's content length.
    pub fn clean_up(&mut self) {
        let len = self.content_len();
        clean_up_modifiers(&mut self.modifiers, len);
    }
}
