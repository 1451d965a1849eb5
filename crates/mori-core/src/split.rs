//! Structural paragraph operations: split, merge and duplicate.

use crate::paragraph::{IdGen, Paragraph, ParagraphType};
use crate::store::{clean_up_modifiers, sort_modifiers};
use crate::text;
use crate::types::{Modifier, ModifierData, ModifierType};

/// Split `p` at char position `split_pos` into `(left, right)`.
///
/// A negative `split_pos` counts from the end. Splitting at 0 yields a fresh
/// empty leading paragraph and the original unchanged, except that chapter
/// paragraphs gain a zero-length bold marker at position 0.
///
/// Otherwise the left piece keeps the id and the right piece gets a fresh id
/// and the continuation type. Copy-set flags are duplicated to the right, a
/// `question` flag gives the right piece a `response` flag, and ranged
/// modifiers are partitioned around the split point.
pub fn split_paragraph(
    p: &Paragraph,
    split_pos: i32,
    ids: &mut impl IdGen,
) -> (Paragraph, Paragraph) {
    let len = p.content_len();
    let pos = if split_pos < 0 {
        (len + split_pos).max(0)
    } else {
        split_pos.min(len)
    };

    if pos == 0 {
        let leading = Paragraph::new(ids.next_id(), ParagraphType::Plain, "");
        let mut original = p.clone();
        if original.ty == ParagraphType::Chapter {
            // Zero-length bold at the head of a chapter heading; survives until
            // the next clean-up pass.
            original.modifiers.push(Modifier::new(0, 0, ModifierData::Bold));
            sort_modifiers(&mut original.modifiers);
        }
        return (leading, original);
    }

    let mut left = Paragraph {
        id: p.id.clone(),
        ty: p.ty,
        content: text::char_slice(&p.content, 0, pos as usize).to_string(),
        tab_level: p.tab_level,
        modifiers: Vec::new(),
    };
    let mut right = Paragraph {
        id: ids.next_id(),
        ty: p.ty.continuation(),
        content: text::char_slice(&p.content, pos as usize, len as usize).to_string(),
        tab_level: p.tab_level,
        modifiers: Vec::new(),
    };

    for m in &p.modifiers {
        let ty = m.ty();
        if m.is_sentinel() {
            left.modifiers.push(m.clone());
            if ty.is_copy_flag() {
                right.modifiers.push(m.clone());
            }
            continue;
        }
        if m.start >= pos {
            right.modifiers.push(m.with_range(m.start - pos, m.end - pos));
            continue;
        }
        if m.end <= pos {
            left.modifiers.push(m.clone());
            continue;
        }

        // m.start < pos < m.end
        if ty.is_word_only() {
            continue;
        }
        left.modifiers.push(m.with_range(m.start, pos));
        let mut tail = m.with_range(0, m.end - pos);
        if let Some(comment) = tail.data.tag_comment_mut() {
            comment.reply_id = ids.next_id();
        }
        right.modifiers.push(tail);
    }

    if p.has_modifier(ModifierType::Question) && !right.has_modifier(ModifierType::Response) {
        right.modifiers.push(Modifier::flag(ModifierData::Response));
    }
    if p.ty.is_heading() || p.ty.is_chat() {
        right.modifiers.retain(|m| !m.ty().is_alignment());
    }

    sort_modifiers(&mut left.modifiers);
    let right_len = right.content_len();
    clean_up_modifiers(&mut right.modifiers, right_len);

    tracing::debug!(para = %p.id, pos, right = %right.id, "split paragraph");
    (left, right)
}

/// Replace a whole-paragraph delete flag with a range delete over the content.
fn downgrade_paragraph_delete(p: &mut Paragraph) {
    let len = p.content_len();
    for m in p.modifiers.iter_mut() {
        let downgraded = match m.ty() {
            ModifierType::Up => ModifierType::Ud,
            ModifierType::Ap => ModifierType::Ad,
            _ => continue,
        };
        m.data = m.data.clone().relabel(downgraded);
        m.start = 0;
        m.end = len;
    }
}

fn has_paragraph_delete(p: &Paragraph) -> bool {
    p.modifiers.iter().any(|m| m.ty().is_paragraph_delete())
}

/// Merge `p2` onto the end of `p1`.
///
/// `p2`'s modifiers are rebased by `p1`'s content length. When only one side
/// is deleted as a whole paragraph, that side's delete flag is downgraded to a
/// range delete first. A never-merge modifier that a split cut in two (same
/// payload on both sides of the seam) is joined back into one.
///
/// With `keep_p1_state` unset the merged paragraph takes `p2`'s type (and
/// `p2`'s tab level unless `p1` has one). With it set, `p1`'s type and tab
/// level win and only copy-set flags of `p2` survive, plus numbering and
/// bullets whenever `p2` is indented and `p1` is not.
pub fn merge_paragraphs(p1: &Paragraph, p2: &Paragraph, keep_p1_state: bool) -> Paragraph {
    let mut first = p1.clone();
    let mut second = p2.clone();
    match (has_paragraph_delete(&first), has_paragraph_delete(&second)) {
        (true, false) => downgrade_paragraph_delete(&mut first),
        (false, true) => downgrade_paragraph_delete(&mut second),
        _ => {}
    }

    let offset = first.content_len();
    let list_passes = p2.tab_level.is_some() && p1.tab_level.is_none();
    let mut merged = first;
    merged.content.push_str(&second.content);

    for m in second.modifiers {
        if m.is_sentinel() {
            let ty = m.ty();
            let keep = !keep_p1_state
                || ty.is_copy_flag()
                || (matches!(ty, ModifierType::Number | ModifierType::Bullet) && list_passes);
            if keep {
                merged.modifiers.push(m);
            }
            continue;
        }
        let m = m.with_range(m.start + offset, m.end + offset);
        if m.ty().never_split_or_merge()
            && m.start == offset
            && m.end > offset
            && let Some(head) = merged
                .modifiers
                .iter_mut()
                .find(|h| h.end == offset && h.start < offset && h.data == m.data)
        {
            head.end = m.end;
            continue;
        }
        merged.modifiers.push(m);
    }

    if !keep_p1_state {
        merged.ty = p2.ty;
        merged.tab_level = p1.tab_level.or(p2.tab_level);
    }
    if merged.id.is_empty() {
        merged.id = p2.id.clone();
    }

    merged.clean_up();
    tracing::debug!(first = %p1.id, second = %p2.id, "merged paragraphs");
    merged
}

/// Drop render-only annotations from a duplicated fragment.
fn strip_render_only(p: &mut Paragraph) {
    p.modifiers.retain(|m| m.ty() != ModifierType::Typo);
    for m in p.modifiers.iter_mut() {
        if let ModifierData::TagCommentMuted(comment) = &m.data {
            m.data = ModifierData::TagComment(comment.clone());
        }
    }
    p.clean_up();
}

/// Extract `start..start + length` of `p` as a standalone paragraph with a
/// fresh id.
///
/// Invalid bounds fall back to a full clone (also with a fresh id) and are
/// logged.
pub fn dupe(p: &Paragraph, start: i32, length: i32, ids: &mut impl IdGen) -> Paragraph {
    let len = p.content_len();
    if start < 0 || length < 0 || start > len || start + length > len {
        tracing::warn!(para = %p.id, start, length, len, "invalid dupe range, cloning whole paragraph");
        let mut copy = p.clone();
        copy.id = ids.next_id();
        strip_render_only(&mut copy);
        return copy;
    }

    let tail = if start == 0 {
        let mut copy = p.clone();
        copy.id = ids.next_id();
        copy
    } else {
        split_paragraph(p, start, ids).1
    };
    let mut piece = if length == tail.content_len() {
        tail
    } else {
        split_paragraph(&tail, length, ids).0
    };
    strip_render_only(&mut piece);
    piece
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paragraph::SequentialIds;
    use crate::types::{TagCommentData, TcData, UndoCount, WidgetData};

    fn ids() -> SequentialIds {
        SequentialIds::new("n")
    }

    fn comment(reply: &str) -> ModifierData {
        ModifierData::TagComment(TagCommentData {
            author_id: "a".into(),
            undo_count: UndoCount::new(),
            thread_id: "t1".into(),
            reply_id: reply.into(),
            create_time: None,
        })
    }

    #[test]
    fn test_split_bold_at_end_of_span() {
        let mut p = Paragraph::plain("p", "Hello world");
        p.add_modifier(0, 5, ModifierData::Bold).unwrap();
        let (left, right) = split_paragraph(&p, 5, &mut ids());
        assert_eq!(left.content, "Hello");
        assert_eq!(left.modifiers, vec![Modifier::new(0, 5, ModifierData::Bold)]);
        assert_eq!(right.content, " world");
        assert!(!right.has_modifier(ModifierType::Bold));
        assert_eq!(left.id, "p");
        assert_eq!(right.id, "n-0");
    }

    #[test]
    fn test_split_straddling_span_is_clipped_both_sides() {
        let mut p = Paragraph::plain("p", "Hello world");
        p.add_modifier(2, 9, ModifierData::Italic).unwrap();
        p.add_modifier(8, 11, ModifierData::Underline).unwrap();
        let (left, right) = split_paragraph(&p, 6, &mut ids());
        assert_eq!(left.modifiers, vec![Modifier::new(2, 6, ModifierData::Italic)]);
        assert_eq!(
            right.modifiers,
            vec![
                Modifier::new(0, 3, ModifierData::Italic),
                Modifier::new(2, 5, ModifierData::Underline),
            ]
        );
    }

    #[test]
    fn test_split_negative_position_counts_from_end() {
        let p = Paragraph::plain("p", "abcdef");
        let (left, right) = split_paragraph(&p, -2, &mut ids());
        assert_eq!(left.content, "abcd");
        assert_eq!(right.content, "ef");
    }

    #[test]
    fn test_split_at_zero() {
        let p = Paragraph::plain("p", "abc");
        let (left, right) = split_paragraph(&p, 0, &mut ids());
        assert_eq!(left.content, "");
        assert_eq!(left.id, "n-0");
        assert_eq!(right, p);

        let chapter = Paragraph::new("c", ParagraphType::Chapter, "One");
        let (_, right) = split_paragraph(&chapter, 0, &mut ids());
        assert_eq!(right.modifiers, vec![Modifier::new(0, 0, ModifierData::Bold)]);
    }

    #[test]
    fn test_split_copies_flags_and_answers_questions() {
        let mut p = Paragraph::plain("p", "Why? Because.");
        p.add_modifier(-1, -1, ModifierData::Bullet).unwrap();
        p.add_modifier(-1, -1, ModifierData::Question).unwrap();
        p.add_modifier(-1, -1, ModifierData::Nav).unwrap();
        let (left, right) = split_paragraph(&p, 4, &mut ids());
        assert!(left.has_modifier(ModifierType::Nav));
        assert!(left.has_modifier(ModifierType::Question));
        assert!(right.has_modifier(ModifierType::Bullet));
        assert!(right.has_modifier(ModifierType::Response));
        assert!(!right.has_modifier(ModifierType::Question));
        assert!(!right.has_modifier(ModifierType::Nav));
    }

    #[test]
    fn test_split_heading_strips_alignment_from_right() {
        let mut p = Paragraph::new("p", ParagraphType::ChatLeft, "hi there");
        p.add_modifier(-1, -1, ModifierData::AlignCenter).unwrap();
        let (left, right) = split_paragraph(&p, 2, &mut ids());
        assert!(left.has_modifier(ModifierType::AlignCenter));
        assert!(!right.has_modifier(ModifierType::AlignCenter));
        assert_eq!(right.ty, ParagraphType::ChatRight);
    }

    #[test]
    fn test_split_word_only_and_never_split() {
        let widget = ModifierData::Emoji(WidgetData {
            id: "e".into(),
            url: None,
            width: None,
            height: None,
        });
        let mut p = Paragraph::plain("p", "abcdefgh");
        p.add_modifier(2, 6, ModifierData::Typo).unwrap();
        p.add_modifier(3, 4, widget.clone()).unwrap();
        let (left, right) = split_paragraph(&p, 4, &mut ids());
        assert_eq!(left.modifiers, vec![Modifier::new(3, 4, widget)]);
        assert!(right.modifiers.is_empty());
    }

    #[test]
    fn test_split_straddling_widget_is_clipped_and_rejoined() {
        let image = ModifierData::Image(WidgetData {
            id: "img".into(),
            url: None,
            width: None,
            height: None,
        });
        let mut p = Paragraph::plain("p", "abcdefg");
        p.add_modifier(2, 5, image.clone()).unwrap();
        let (left, right) = split_paragraph(&p, 3, &mut ids());
        assert_eq!(left.modifiers, vec![Modifier::new(2, 3, image.clone())]);
        assert_eq!(right.modifiers, vec![Modifier::new(0, 2, image.clone())]);

        let merged = merge_paragraphs(&left, &right, false);
        assert_eq!(merged.modifiers, vec![Modifier::new(2, 5, image)]);
    }

    #[test]
    fn test_merge_keeps_distinct_widgets_apart() {
        let image = |id: &str| {
            ModifierData::Image(WidgetData {
                id: id.into(),
                url: None,
                width: None,
                height: None,
            })
        };
        let mut a = Paragraph::plain("a", "ab");
        a.add_modifier(1, 2, image("one")).unwrap();
        let mut b = Paragraph::plain("b", "cd");
        b.add_modifier(0, 1, image("two")).unwrap();
        let merged = merge_paragraphs(&a, &b, false);
        assert_eq!(
            merged.modifiers,
            vec![
                Modifier::new(1, 2, image("one")),
                Modifier::new(2, 3, image("two")),
            ]
        );
    }

    #[test]
    fn test_split_comment_gets_fresh_reply_id() {
        let mut p = Paragraph::plain("p", "abcdef");
        p.add_modifier(1, 5, comment("r0")).unwrap();
        let (left, right) = split_paragraph(&p, 3, &mut ids());
        assert_eq!(left.modifiers[0].data.tag_comment().unwrap().reply_id, "r0");
        assert_eq!(right.modifiers[0].data.tag_comment().unwrap().reply_id, "n-1");
    }

    #[test]
    fn test_merge_rebases_and_takes_second_type() {
        let mut a = Paragraph::new("a", ParagraphType::Chapter, "Hello");
        a.add_modifier(0, 5, ModifierData::Bold).unwrap();
        let mut b = Paragraph::plain("b", " world").with_tab_level(1);
        b.add_modifier(1, 6, ModifierData::Italic).unwrap();
        let merged = merge_paragraphs(&a, &b, false);
        assert_eq!(merged.content, "Hello world");
        assert_eq!(merged.id, "a");
        assert_eq!(merged.ty, ParagraphType::Plain);
        assert_eq!(merged.tab_level, Some(1));
        assert_eq!(
            merged.modifiers,
            vec![
                Modifier::new(0, 5, ModifierData::Bold),
                Modifier::new(6, 11, ModifierData::Italic),
            ]
        );
    }

    #[test]
    fn test_merge_keep_first_state_filters_flags() {
        let a = Paragraph::new("a", ParagraphType::Section, "x");
        let mut b = Paragraph::plain("b", "y").with_tab_level(2);
        b.add_modifier(-1, -1, ModifierData::Number).unwrap();
        b.add_modifier(-1, -1, ModifierData::Question).unwrap();
        b.add_modifier(-1, -1, ModifierData::Indent).unwrap();
        let merged = merge_paragraphs(&a, &b, true);
        assert_eq!(merged.ty, ParagraphType::Section);
        assert_eq!(merged.tab_level, None);
        assert!(merged.has_modifier(ModifierType::Number));
        assert!(merged.has_modifier(ModifierType::Indent));
        assert!(!merged.has_modifier(ModifierType::Question));

        let a = a.with_tab_level(1);
        let merged = merge_paragraphs(&a, &b, true);
        assert!(merged.has_modifier(ModifierType::Number));
        assert!(!merged.has_modifier(ModifierType::Question));
    }

    #[test]
    fn test_merge_keep_first_state_keeps_list_flags_without_tab_levels() {
        let a = Paragraph::plain("a", "x");
        let mut b = Paragraph::plain("b", "y");
        b.add_modifier(-1, -1, ModifierData::Number).unwrap();
        b.add_modifier(-1, -1, ModifierData::Bullet).unwrap();
        let merged = merge_paragraphs(&a, &b, true);
        assert!(merged.has_modifier(ModifierType::Number));
        assert!(merged.has_modifier(ModifierType::Bullet));
    }

    #[test]
    fn test_merge_downgrades_one_sided_paragraph_delete() {
        let tc = TcData::new("a", UndoCount::new(), 1);
        let mut a = Paragraph::plain("a", "abc");
        a.add_modifier(-1, -1, ModifierData::Up(tc.clone())).unwrap();
        let b = Paragraph::plain("b", "def");
        let merged = merge_paragraphs(&a, &b, false);
        assert!(!merged.has_modifier(ModifierType::Up));
        assert_eq!(merged.modifiers, vec![Modifier::new(0, 3, ModifierData::Ud(tc))]);
    }

    #[test]
    fn test_merge_adopts_second_id_when_first_lacks_one() {
        let a = Paragraph::plain("", "a");
        let b = Paragraph::plain("b", "b");
        assert_eq!(merge_paragraphs(&a, &b, false).id, "b");
    }

    #[test]
    fn test_split_then_merge_round_trip() {
        let mut p = Paragraph::plain("p", "The quick brown fox");
        p.add_modifier(0, 9, ModifierData::Bold).unwrap();
        p.add_modifier(4, 15, ModifierData::Italic).unwrap();
        p.add_modifier(-1, -1, ModifierData::AlignRight).unwrap();
        p.add_modifier(
            10,
            14,
            ModifierData::Emoji(WidgetData {
                id: "e".into(),
                url: None,
                width: None,
                height: None,
            }),
        )
        .unwrap();
        for k in 0..=p.content_len() {
            let (left, right) = split_paragraph(&p, k, &mut ids());
            let mut merged = merge_paragraphs(&left, &right, false);
            merged.clean_up();
            assert_eq!(merged.content, p.content, "split at {k}");
            assert_eq!(merged.modifiers, p.modifiers, "split at {k}");
        }
    }

    #[test]
    fn test_dupe_extracts_fragment() {
        let mut p = Paragraph::plain("p", "Hello brave world");
        p.add_modifier(0, 11, ModifierData::Bold).unwrap();
        p.add_modifier(6, 9, ModifierData::Typo).unwrap();
        p.add_modifier(6, 11, ModifierData::TagCommentMuted(TagCommentData {
            author_id: "a".into(),
            undo_count: UndoCount::new(),
            thread_id: "t".into(),
            reply_id: "r".into(),
            create_time: None,
        }))
        .unwrap();
        let piece = dupe(&p, 6, 5, &mut ids());
        assert_eq!(piece.content, "brave");
        assert!(piece.has_modifier(ModifierType::Bold));
        assert!(piece.has_modifier(ModifierType::TagComment));
        assert!(!piece.has_modifier(ModifierType::TagCommentMuted));
        assert!(!piece.has_modifier(ModifierType::Typo));
        assert_ne!(piece.id, p.id);
    }

    #[test]
    fn test_dupe_invalid_range_clones() {
        let p = Paragraph::plain("p", "abc");
        let copy = dupe(&p, 2, 5, &mut ids());
        assert_eq!(copy.content, "abc");
        assert_eq!(copy.id, "n-0");
        let copy = dupe(&p, -1, 1, &mut ids());
        assert_eq!(copy.content, "abc");
    }
}
