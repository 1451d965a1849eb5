use super::*;
use crate::types::WidgetData;

const PENDING: [ModifierType; 3] = [ModifierType::Ui, ModifierType::Ud, ModifierType::Uc];
const MARKERS: [ModifierType; 8] = [
    ModifierType::Ui,
    ModifierType::Ud,
    ModifierType::Uc,
    ModifierType::Up,
    ModifierType::Ai,
    ModifierType::Ad,
    ModifierType::Ac,
    ModifierType::Ap,
];

fn session(author: &str) -> EditSession {
    let mut undo = UndoCount::new();
    undo.insert("draft".into(), format!("{author}-1").into());
    EditSession::new(author, undo).at(100)
}

fn tc(author: &str) -> TcData {
    let s = session(author);
    TcData::new(s.author_id, s.undo_count, 100)
}

fn marker(ty: ModifierType, start: i32, end: i32, author: &str) -> Modifier {
    Modifier::new(start, end, ModifierData::track_change(ty, tc(author)).unwrap())
}

fn types(p: &Paragraph) -> Vec<(ModifierType, i32, i32)> {
    p.modifiers.iter().map(|m| (m.ty(), m.start, m.end)).collect()
}

fn expected_action(new: ModifierType, existing: ModifierType, same: bool) -> Action {
    use ModifierType::*;
    match new {
        Ui => match existing {
            Ui if same => Action::Absorb,
            Up | Ap => Action::DowngradeThenClip,
            _ => Action::Clip,
        },
        Ud => match existing {
            Ui if same => Action::Cancel,
            Ui => Action::Keep,
            Ud | Up => Action::Drop,
            _ => Action::Placeholder,
        },
        Uc => match existing {
            Ui if same => Action::AbsorbInto,
            Ud | Up | Ap => Action::Placeholder,
            _ => Action::Keep,
        },
        _ => Action::Keep,
    }
}

#[test]
fn test_dispatch_table_is_exhaustive() {
    for new in PENDING {
        for existing in MARKERS {
            for same in [true, false] {
                assert_eq!(
                    action(new, existing, same),
                    expected_action(new, existing, same),
                    "new={new} existing={existing} same={same}"
                );
            }
        }
    }
}

#[test]
fn test_session_requires_whole_undo_map() {
    let a = tc("a");
    let mut b = tc("a");
    assert!(a.same_session(&b));
    b.undo_count.insert("other".into(), "x".into());
    assert!(!a.same_session(&b));
}

#[test]
fn test_same_session_inserts_merge_into_one() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abc");
    assert_eq!(insert_tracked_text(&mut p, 3, "de", &s).unwrap(), 1);
    assert_eq!(insert_tracked_text(&mut p, 5, "fg", &s).unwrap(), 0);
    assert_eq!(insert_tracked_text(&mut p, 4, "X", &s).unwrap(), 0);
    assert_eq!(p.content, "abcdXefg");
    assert_eq!(types(&p), vec![(ModifierType::Ui, 3, 8)]);
}

#[test]
fn test_overlapping_same_session_ui_reconcile_to_one() {
    let mut existing = vec![marker(ModifierType::Ui, 2, 6, "a")];
    let out = reconcile(&mut existing, marker(ModifierType::Ui, 4, 9, "a"), 10);
    assert!(out.insert.is_empty());
    assert_eq!(existing, vec![marker(ModifierType::Ui, 2, 9, "a")]);
}

#[test]
fn test_insert_inside_foreign_change_splits_it() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Uc, 0, 6, "b"));
    insert_tracked_text(&mut p, 3, "XY", &session("a")).unwrap();
    assert_eq!(p.content, "abcXYdef");
    assert_eq!(
        types(&p),
        vec![
            (ModifierType::Uc, 0, 3),
            (ModifierType::Ui, 3, 5),
            (ModifierType::Uc, 5, 8),
        ]
    );
}

#[test]
fn test_foreign_inserts_are_clipped_not_merged() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ui, 0, 6, "b"));
    insert_tracked_text(&mut p, 6, "g", &session("a")).unwrap();
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ui, 0, 6), (ModifierType::Ui, 6, 7)]
    );
    assert_eq!(p.modifiers[1].tc().unwrap().author_id, "a");
}

#[test]
fn test_insert_into_deleted_paragraph_downgrades_it() {
    let mut p = Paragraph::plain("p", "abc");
    p.modifiers.push(marker(ModifierType::Up, SENTINEL, SENTINEL, "b"));
    insert_tracked_text(&mut p, 3, "d", &session("a")).unwrap();
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ud, 0, 3), (ModifierType::Ui, 3, 4)]
    );
}

#[test]
fn test_delete_cancels_own_insert() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abc");
    insert_tracked_text(&mut p, 3, "XYZ", &s).unwrap();
    assert_eq!(delete_tracked_range(&mut p, 4, 6, &s).unwrap(), 0);
    assert_eq!(p.content, "abcX");
    assert_eq!(types(&p), vec![(ModifierType::Ui, 3, 4)]);
}

#[test]
fn test_delete_spanning_own_insert_marks_only_old_text() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abc");
    insert_tracked_text(&mut p, 3, "XY", &s).unwrap();
    delete_tracked_range(&mut p, 1, 5, &s).unwrap();
    assert_eq!(p.content, "abc");
    assert_eq!(types(&p), vec![(ModifierType::Ud, 1, 3)]);
}

#[test]
fn test_delete_over_foreign_insert_keeps_both() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ui, 2, 4, "b"));
    delete_tracked_range(&mut p, 0, 6, &session("a")).unwrap();
    assert_eq!(p.content, "abcdef");
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ud, 0, 6), (ModifierType::Ui, 2, 4)]
    );
}

#[test]
fn test_double_delete_is_dropped() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ud, 0, 3, "b"));
    assert_eq!(delete_tracked_range(&mut p, 1, 5, &session("a")).unwrap(), 1);
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ud, 0, 3), (ModifierType::Ud, 3, 5)]
    );
}

#[test]
fn test_delete_over_accepted_text_leaves_placeholder() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ai, 0, 4, "b"));
    delete_tracked_range(&mut p, 2, 6, &session("a")).unwrap();
    assert_eq!(
        types(&p),
        vec![
            (ModifierType::Ai, 0, 4),
            (ModifierType::Noop, 2, 4),
            (ModifierType::Ud, 4, 6),
        ]
    );
}

#[test]
fn test_change_on_own_insert_is_absorbed() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abcde");
    p.modifiers.push(marker(ModifierType::Ui, 0, 5, "a"));
    let edit = s
        .edit(ModifierType::Uc, 1, 3)
        .with_revert("bold", Some(RevertData::for_types([ModifierType::Bold])));
    assert_eq!(track_user_edit(&mut p, edit).unwrap(), 0);
    assert_eq!(types(&p), vec![(ModifierType::Ui, 0, 5)]);
}

#[test]
fn test_tracked_edit_rejects_bad_input() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abc");
    assert_eq!(
        track_user_edit(&mut p, s.edit(ModifierType::Bold, 0, 1)),
        Err(ModifierError::NotTrackChange(ModifierType::Bold))
    );
    assert!(matches!(
        track_user_edit(&mut p, s.edit(ModifierType::Ud, 1, 9)),
        Err(ModifierError::OutOfBounds { .. })
    ));
    assert!(p.modifiers.is_empty());
}

#[test]
fn test_accept_relabels_and_realizes_deletes() {
    let mut p = Paragraph::plain("p", "Hello cruel world");
    p.modifiers.push(marker(ModifierType::Ud, 5, 11, "a"));
    p.modifiers.push(marker(ModifierType::Ui, 12, 17, "a"));
    p.clean_up();

    accept_modifier(&mut p, 1).unwrap();
    assert_eq!(types(&p), vec![(ModifierType::Ud, 5, 11), (ModifierType::Ai, 12, 17)]);

    accept_modifier(&mut p, 0).unwrap();
    assert_eq!(p.content, "Hello world");
    assert_eq!(types(&p), vec![(ModifierType::Ai, 6, 11)]);

    assert_eq!(accept_modifier(&mut p, 0), Err(ModifierError::NotPending(0)));
    assert_eq!(accept_modifier(&mut p, 7), Err(ModifierError::IndexOutOfRange(7)));
}

#[test]
fn test_accept_all_then_strip_accepted_leaves_no_markers() {
    let mut p = Paragraph::plain("p", "one two three");
    p.add_modifier(0, 3, ModifierData::Bold).unwrap();
    p.modifiers.push(marker(ModifierType::Ud, 3, 7, "a"));
    p.modifiers.push(marker(ModifierType::Ui, 8, 13, "b"));
    p.modifiers.push(marker(ModifierType::Noop, 0, 2, "c"));
    p.clean_up();

    assert_eq!(accept_all_modifiers(&mut p).unwrap(), 2);
    let stripped = strip_accepted_modifiers(&p, &VisibilityFilter::default());
    let out = stripped.paragraph().unwrap();
    assert_eq!(out.content, "one three");
    assert!(out.modifiers.iter().all(|m| m.tc().is_none()));
    assert!(out.has_modifier(ModifierType::Bold));
}

#[test]
fn test_reject_insert_removes_text() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "ac");
    insert_tracked_text(&mut p, 1, "b", &s).unwrap();
    reject_modifier(&mut p, 0).unwrap();
    assert_eq!(p.content, "ac");
    assert!(p.modifiers.is_empty());
}

#[test]
fn test_reject_change_restores_prior_style() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.add_modifier(0, 2, ModifierData::Bold).unwrap();
    p.add_modifier(4, 6, ModifierData::Bold).unwrap();
    let revert = RevertData {
        types: vec![ModifierType::Bold],
        prior: vec![Modifier::new(2, 4, ModifierData::Bold)],
    };
    let edit = session("a")
        .edit(ModifierType::Uc, 2, 4)
        .with_revert("unbold", Some(revert));
    track_user_edit(&mut p, edit).unwrap();

    assert_eq!(reject_all_modifiers(&mut p).unwrap(), 1);
    assert_eq!(p.modifiers, vec![Modifier::new(0, 6, ModifierData::Bold)]);
}

#[test]
fn test_reject_delete_keeps_text() {
    let mut p = Paragraph::plain("p", "abc");
    delete_tracked_range(&mut p, 0, 2, &session("a")).unwrap();
    reject_all_modifiers(&mut p).unwrap();
    assert_eq!(p.content, "abc");
    assert!(p.modifiers.is_empty());
}

fn redline_sample() -> Paragraph {
    let mut p = Paragraph::plain("p", "Hello cruel world");
    p.modifiers.push(marker(ModifierType::Ud, 5, 11, "a"));
    p.modifiers.push(marker(ModifierType::Ui, 11, 17, "b"));
    p.clean_up();
    p
}

#[test]
fn test_strip_modes() {
    let p = redline_sample();
    let all = VisibilityFilter::default();

    let redline = strip_redline_modifiers(&p, &all);
    let redline = redline.paragraph().unwrap();
    assert_eq!(redline.content, "Hello world");
    assert!(redline.modifiers.is_empty());

    let blame = strip_non_blame_modifiers(&p, &all);
    let blame = blame.paragraph().unwrap();
    assert_eq!(blame.content, "Hello world");
    assert_eq!(types(blame), vec![(ModifierType::Ui, 5, 11)]);

    let accepted = strip_accepted_modifiers(&p, &all);
    assert_eq!(accepted.paragraph(), Some(&p));
}

#[test]
fn test_strip_respects_visibility_filter() {
    let p = redline_sample();
    let filter = VisibilityFilter {
        excluded_authors: HashSet::from(["a".into()]),
        ..Default::default()
    };
    let out = strip_redline_modifiers(&p, &filter);
    let out = out.paragraph().unwrap();
    assert_eq!(out.content, "Hello cruel world");
    assert_eq!(types(out), vec![(ModifierType::Ud, 5, 11)]);
}

#[test]
fn test_visibility_filter_undo_and_draft_ids() {
    let t = tc("a");
    assert!(VisibilityFilter::default().is_visible(&t));

    let allow = VisibilityFilter {
        allow_undo_ids: Some(HashSet::from(["b-1".into()])),
        ..Default::default()
    };
    assert!(!allow.is_visible(&t));

    let block = VisibilityFilter {
        block_undo_ids: HashSet::from(["a-1".into()]),
        ..Default::default()
    };
    assert!(!block.is_visible(&t));

    let draft = VisibilityFilter {
        excluded_draft_id: Some("draft".into()),
        ..Default::default()
    };
    assert!(!draft.is_visible(&t));
}

#[test]
fn test_paragraph_delete_projects_to_removed() {
    let mut p = Paragraph::plain("p", "gone");
    p.modifiers.push(marker(ModifierType::Up, SENTINEL, SENTINEL, "a"));
    let all = VisibilityFilter::default();
    assert_eq!(strip_redline_modifiers(&p, &all), Projection::Removed);
    assert!(matches!(
        strip_accepted_modifiers(&p, &all),
        Projection::Paragraph(_)
    ));

    let mut accepted = p.clone();
    accept_all_modifiers(&mut accepted).unwrap();
    assert_eq!(strip_accepted_modifiers(&accepted, &all), Projection::Removed);
}

#[test]
fn test_strip_keeps_non_track_change_modifiers() {
    let mut p = Paragraph::plain("p", "\u{FFFC} hi");
    p.add_modifier(
        0,
        1,
        ModifierData::Image(WidgetData {
            id: "img".into(),
            url: None,
            width: None,
            height: None,
        }),
    )
    .unwrap();
    let out = strip_redline_modifiers(&p, &VisibilityFilter::default());
    assert_eq!(out.paragraph(), Some(&p));
}

#[test]
fn test_convert_diff_markers() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.add_modifier(0, 2, ModifierData::Add(Default::default())).unwrap();
    p.add_modifier(
        2,
        4,
        ModifierData::Madd(crate::types::StyleDiffData {
            style: ModifierType::Bold,
        }),
    )
    .unwrap();
    p.add_modifier(4, 6, ModifierData::Del(Default::default())).unwrap();

    let inserted = convert_para_diff_mods_to_tc_mods(&mut p, &session("a"), false).unwrap();
    assert_eq!(inserted, 3);
    assert_eq!(
        types(&p),
        vec![
            (ModifierType::Ui, 0, 2),
            (ModifierType::Uc, 2, 4),
            (ModifierType::Ud, 4, 6),
        ]
    );
    let change = p.modifiers[1].tc().unwrap();
    assert_eq!(change.revert.as_deref(), Some(PMOD_REVERT));
    assert!(change.revert_data.as_ref().unwrap().names(ModifierType::Bold));
}

#[test]
fn test_convert_whole_delete_becomes_paragraph_delete() {
    let mut p = Paragraph::plain("p", "abc");
    p.add_modifier(0, 3, ModifierData::Del(Default::default())).unwrap();
    convert_para_diff_mods_to_tc_mods(&mut p, &session("a"), true).unwrap();
    assert_eq!(types(&p), vec![(ModifierType::Ap, SENTINEL, SENTINEL)]);
}

#[test]
fn test_fixup_drops_diff_markers_inside_pending_text() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ui, 0, 3, "a"));
    p.modifiers.push(Modifier::new(1, 5, ModifierData::Add(Default::default())));
    p.modifiers.push(Modifier::new(0, 2, ModifierData::Del(Default::default())));
    fixup_track_changes_mods_for_diff_mods(&mut p);
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ui, 0, 3), (ModifierType::Add, 3, 5)]
    );
}

fn bold_change(s: &EditSession, start: i32, end: i32) -> TrackedEdit {
    s.edit(ModifierType::Uc, start, end)
        .with_revert("bold", Some(RevertData::for_types([ModifierType::Bold])))
}

#[test]
fn test_change_over_pending_delete_leaves_placeholder() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ud, 1, 4, "b"));
    assert_eq!(track_user_edit(&mut p, bold_change(&session("a"), 0, 6)).unwrap(), 3);
    assert_eq!(
        types(&p),
        vec![
            (ModifierType::Uc, 0, 1),
            (ModifierType::Noop, 1, 4),
            (ModifierType::Ud, 1, 4),
            (ModifierType::Uc, 4, 6),
        ]
    );
}

#[test]
fn test_change_over_deleted_paragraph_leaves_placeholder() {
    for deleted in [ModifierType::Up, ModifierType::Ap] {
        let mut p = Paragraph::plain("p", "abc");
        p.modifiers.push(marker(deleted, SENTINEL, SENTINEL, "b"));
        assert_eq!(track_user_edit(&mut p, bold_change(&session("a"), 0, 2)).unwrap(), 1);
        assert_eq!(
            types(&p),
            vec![(deleted, SENTINEL, SENTINEL), (ModifierType::Noop, 0, 2)],
            "existing={deleted}"
        );
    }
}

#[test]
fn test_overlapping_changes_both_survive() {
    let s = session("a");
    let mut p = Paragraph::plain("p", "abcdefgh");
    assert_eq!(track_user_edit(&mut p, bold_change(&s, 0, 5)).unwrap(), 1);
    assert_eq!(track_user_edit(&mut p, bold_change(&s, 3, 8)).unwrap(), 1);
    assert_eq!(
        types(&p),
        vec![(ModifierType::Uc, 0, 5), (ModifierType::Uc, 3, 8)]
    );
}

#[test]
fn test_insert_into_accepted_paragraph_delete_downgrades_it() {
    let mut p = Paragraph::plain("p", "abc");
    p.modifiers.push(marker(ModifierType::Ap, SENTINEL, SENTINEL, "b"));
    assert_eq!(insert_tracked_text(&mut p, 3, "d", &session("a")).unwrap(), 1);
    assert_eq!(
        types(&p),
        vec![(ModifierType::Ad, 0, 3), (ModifierType::Ui, 3, 4)]
    );
}

#[test]
fn test_insert_inside_foreign_delete_splits_it() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(marker(ModifierType::Ud, 0, 6, "b"));
    insert_tracked_text(&mut p, 3, "XY", &session("a")).unwrap();
    assert_eq!(p.content, "abcXYdef");
    assert_eq!(
        types(&p),
        vec![
            (ModifierType::Ud, 0, 3),
            (ModifierType::Ui, 3, 5),
            (ModifierType::Ud, 5, 8),
        ]
    );
}

#[test]
fn test_delete_inside_deleted_paragraph_is_dropped() {
    let mut p = Paragraph::plain("p", "abc");
    p.modifiers.push(marker(ModifierType::Up, SENTINEL, SENTINEL, "b"));
    assert_eq!(delete_tracked_range(&mut p, 0, 2, &session("a")).unwrap(), 0);
    assert_eq!(p.content, "abc");
    assert_eq!(types(&p), vec![(ModifierType::Up, SENTINEL, SENTINEL)]);
}

#[test]
fn test_failed_conversion_leaves_paragraph_unchanged() {
    let mut p = Paragraph::plain("p", "abcdef");
    p.modifiers.push(Modifier::new(0, 2, ModifierData::Add(Default::default())));
    p.modifiers.push(Modifier::new(4, 9, ModifierData::Del(Default::default())));
    let before = p.clone();
    assert!(matches!(
        convert_para_diff_mods_to_tc_mods(&mut p, &session("a"), false),
        Err(ModifierError::OutOfBounds { .. })
    ));
    assert_eq!(p, before);
}
