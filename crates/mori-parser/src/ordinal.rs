//! List numbering over the parsed entry sequence.

use crate::entry::{Entry, EntryKind};

/// List membership of a paragraph entry, looked up from its source paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Number,
    Bullet,
    None,
}

/// Assign `ordinal` to every numbered paragraph entry.
///
/// Keeps one counter per indent depth. A non-list paragraph clears the stack,
/// a shallower paragraph drops the deeper counters, and a deeper one pushes
/// fresh zeros. Bullets hold their depth without taking a number. Entries
/// other than paragraphs are transparent.
pub fn fill_ordinalities(entries: &mut [Entry], list_kind: impl Fn(usize) -> ListKind) {
    let mut stack: Vec<u32> = Vec::new();
    for entry in entries.iter_mut() {
        let EntryKind::Paragraph(para) = &mut entry.kind else {
            continue;
        };
        let kind = para.para_index.map_or(ListKind::None, &list_kind);
        if kind == ListKind::None {
            stack.clear();
            continue;
        }
        let level = usize::from(para.tab_level.unwrap_or(0));
        stack.truncate(level + 1);
        while stack.len() < level + 1 {
            stack.push(0);
        }
        if kind == ListKind::Number {
            stack[level] += 1;
            para.ordinal = Some(stack[level]);
        }
    }
}
