//! Flattening the overlapping modifier set into non-overlapping runs.

use std::collections::{BTreeSet, HashMap};

use crate::paragraph::Paragraph;
use crate::store::sort_modifiers;
use crate::types::{Modifier, ModifierType, SENTINEL};

/// Split every ranged modifier at every boundary that falls strictly inside it.
///
/// Afterwards any two ranged entries are either disjoint or cover exactly the
/// same range. Sentinel flags are kept only when their type is listed in
/// `keep_sentinel`.
pub fn get_uncollapsed_modifiers(p: &Paragraph, keep_sentinel: &[ModifierType]) -> Vec<Modifier> {
    let boundaries: BTreeSet<i32> = p
        .modifiers
        .iter()
        .filter(|m| !m.is_sentinel())
        .flat_map(|m| [m.start, m.end])
        .collect();

    let mut out = Vec::with_capacity(p.modifiers.len());
    for m in &p.modifiers {
        if m.is_sentinel() {
            if keep_sentinel.contains(&m.ty()) {
                out.push(m.clone());
            }
            continue;
        }
        if m.end - m.start <= 1 {
            out.push(m.clone());
            continue;
        }
        let mut start = m.start;
        for &b in boundaries.range(m.start + 1..m.end) {
            out.push(m.with_range(start, b));
            start = b;
        }
        out.push(m.with_range(start, m.end));
    }
    sort_modifiers(&mut out);
    out
}

/// Explicit ordering of modifier types inside a run, outermost first.
///
/// Built once and passed by reference wherever runs are produced.
#[derive(Debug, Clone)]
pub struct RenderPriority {
    rank: HashMap<ModifierType, usize>,
}

impl RenderPriority {
    pub fn new(order: impl IntoIterator<Item = ModifierType>) -> Self {
        let rank = order.into_iter().enumerate().map(|(i, ty)| (ty, i)).collect();
        Self { rank }
    }

    /// Position of `ty`; unlisted types sort after every listed one.
    pub fn rank(&self, ty: ModifierType) -> usize {
        self.rank.get(&ty).copied().unwrap_or(self.rank.len())
    }

    pub fn sort(&self, types: &mut [ModifierType]) {
        types.sort_by(|a, b| {
            self.rank(*a)
                .cmp(&self.rank(*b))
                .then_with(|| a.name().cmp(b.name()))
        });
    }
}

impl Default for RenderPriority {
    fn default() -> Self {
        use ModifierType::*;
        Self::new([
            Ui, Ud, Uc, Ai, Ad, Ac, Add, Del, Madd, Mdel, TagComment, TagCommentMuted, Mention,
            Typo, Highlight, Bold, Italic, Underline, Strike, Sup, Sub, Monospace, Image,
            Location, Emoji,
        ])
    }
}

/// A maximal stretch of content under one set of active modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRun {
    pub start: i32,
    pub end: i32,
    /// Active types in render priority order.
    pub types: Vec<ModifierType>,
    /// Full modifiers for the types the caller asked to see in detail.
    pub specials: Vec<Modifier>,
}

/// Group the modifiers of `p` into runs that tile `0..content_len` exactly.
///
/// Paragraph flags, when present, come first as one pseudo-run at `(-1, -1)`.
/// Modifiers whose type is in `include_specials` are also reported whole in
/// each run they cover.
pub fn get_modifiers_for_content(
    p: &Paragraph,
    include_specials: &[ModifierType],
    priority: &RenderPriority,
) -> Vec<ContentRun> {
    let len = p.content_len();
    let mut runs = Vec::new();

    let flags: Vec<&Modifier> = p.modifiers.iter().filter(|m| m.is_sentinel()).collect();
    if !flags.is_empty() {
        let mut types: Vec<ModifierType> = flags.iter().map(|m| m.ty()).collect();
        priority.sort(&mut types);
        types.dedup();
        runs.push(ContentRun {
            start: SENTINEL,
            end: SENTINEL,
            types,
            specials: flags
                .iter()
                .filter(|m| include_specials.contains(&m.ty()))
                .map(|m| (*m).clone())
                .collect(),
        });
    }
    if len == 0 {
        return runs;
    }

    let pieces = get_uncollapsed_modifiers(p, &[]);
    let mut cuts: BTreeSet<i32> = BTreeSet::from([0, len]);
    for m in &pieces {
        cuts.extend([m.start.clamp(0, len), m.end.clamp(0, len)]);
    }

    let cuts: Vec<i32> = cuts.into_iter().collect();
    for window in cuts.windows(2) {
        let (start, end) = (window[0], window[1]);
        let active: Vec<&Modifier> = pieces
            .iter()
            .filter(|m| m.start < m.end && m.start <= start && end <= m.end)
            .collect();
        let mut types: Vec<ModifierType> = active.iter().map(|m| m.ty()).collect();
        priority.sort(&mut types);
        types.dedup();
        let specials = active
            .iter()
            .filter(|m| include_specials.contains(&m.ty()))
            .map(|m| (*m).clone())
            .collect();
        runs.push(ContentRun {
            start,
            end,
            types,
            specials,
        });
    }
    runs
}
