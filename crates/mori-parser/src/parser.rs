//! The single forward pass from paragraphs to entries.

use std::collections::HashSet;

use mori_core::{ModifierData, ModifierType, Paragraph, ParagraphType, SmolStr, WidgetData, text};

use crate::config::ParserConfig;
use crate::directive::{Directive, DirectiveSyntax};
use crate::entry::{
    AuthorNoteEntry, CommentSummaryEntry, Counters, DataEntry, Entry, EntryKind, ImagesEntry,
    ParagraphEntry, ParsedData, PreviewEntry, TocEntry, TocKind, Totals,
};
use crate::error::ParseError;
use crate::log::ParseLog;
use crate::ordinal::{ListKind, fill_ordinalities};

/// An author note between its start and stop directives.
#[derive(Debug)]
struct OpenNote {
    name: SmolStr,
    para_ids: Vec<SmolStr>,
    multi: bool,
    answers: Vec<String>,
}

impl OpenNote {
    fn into_entry(self) -> AuthorNoteEntry {
        AuthorNoteEntry {
            name: self.name,
            para_count: self.para_ids.len(),
            para_ids: self.para_ids,
            multi: self.multi,
            answers: self.answers,
        }
    }
}

/// Comment anchors seen since the last chapter or section.
#[derive(Debug, Default)]
struct CommentTally {
    thread_ids: Vec<SmolStr>,
    anchors: HashSet<(SmolStr, SmolStr)>,
}

impl CommentTally {
    fn collect(&mut self, p: &Paragraph) {
        for data in p.modifiers.iter().filter_map(|m| m.data.tag_comment()) {
            if !self.thread_ids.contains(&data.thread_id) {
                self.thread_ids.push(data.thread_id.clone());
            }
            self.anchors
                .insert((data.thread_id.clone(), data.reply_id.clone()));
        }
    }

    fn take(&mut self, end_para_id: Option<SmolStr>) -> CommentSummaryEntry {
        let tally = std::mem::take(self);
        CommentSummaryEntry {
            comment_count: tally.anchors.len(),
            thread_ids: tally.thread_ids,
            end_para_id,
        }
    }

    fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

pub(crate) struct Parser<'a> {
    config: &'a ParserConfig,
    syntax: DirectiveSyntax,
    active_layers: &'a [SmolStr],
    log: &'a mut dyn ParseLog,
    entries: Vec<Entry>,
    toc: Vec<TocEntry>,
    counters: Counters,
    note: Option<OpenNote>,
    note_names: HashSet<SmolStr>,
    comments: CommentTally,
    /// TOC entry still waiting for the text of the paragraph after its heading.
    awaiting_lead_in: Option<usize>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        config: &'a ParserConfig,
        active_layers: &'a [SmolStr],
        log: &'a mut dyn ParseLog,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            config,
            syntax: DirectiveSyntax::new(&config.directive_prefix)?,
            active_layers,
            log,
            entries: Vec::new(),
            toc: Vec::new(),
            counters: Counters::default(),
            note: None,
            note_names: HashSet::new(),
            comments: CommentTally::default(),
            awaiting_lead_in: None,
        })
    }

    pub(crate) fn run(mut self, paragraphs: &mut [Paragraph]) -> Result<ParsedData, ParseError> {
        tracing::debug!(paragraphs = paragraphs.len(), "parsing document");
        for p in paragraphs.iter_mut() {
            p.clean_up();
        }

        self.push(EntryKind::Paragraph(ParagraphEntry {
            para_id: self.config.cover_id.clone(),
            para_index: None,
            para_type: ParagraphType::Title,
            tab_level: None,
            ordinal: None,
            is_cover: true,
            layer: None,
        }));

        for (index, p) in paragraphs.iter().enumerate() {
            if let Some(layer) = p.layer_id()
                && !self.active_layers.contains(layer)
            {
                tracing::trace!(para = %p.id, %layer, "skipping inactive layer");
                continue;
            }
            if let Some((tag, value)) = self.syntax.split(&p.content) {
                self.directive(p, tag, value)?;
                continue;
            }
            if let Some(note) = &mut self.note {
                note.para_ids.push(p.id.clone());
                continue;
            }
            self.paragraph(index, p);
        }

        if let Some(note) = self.note.take() {
            self.log
                .report(&format!("author note `{}` is never stopped", note.name))?;
            self.push(EntryKind::AuthorNote(note.into_entry()));
        }
        if !self.comments.is_empty() {
            let summary = self.comments.take(None);
            self.push(EntryKind::CommentSummary(summary));
        }
        self.push(EntryKind::Terminator);

        fill_ordinalities(&mut self.entries, |index| {
            let p = &paragraphs[index];
            if p.has_modifier(ModifierType::Number) {
                ListKind::Number
            } else if p.has_modifier(ModifierType::Bullet) {
                ListKind::Bullet
            } else {
                ListKind::None
            }
        });

        Ok(ParsedData {
            entries: self.entries,
            toc: self.toc,
            totals: Totals {
                words: self.counters.words_so_far,
                chars: self.counters.chars_so_far,
                base_chars: self.counters.base_chars_so_far,
            },
        })
    }

    fn push(&mut self, kind: EntryKind) {
        self.entries.push(Entry {
            counters: self.counters,
            kind,
        });
    }

    fn paragraph(&mut self, index: usize, p: &Paragraph) {
        let plain = p.plain_text();

        if matches!(p.ty, ParagraphType::Chapter | ParagraphType::Section) {
            let summary = self.comments.take(Some(p.id.clone()));
            self.push(EntryKind::CommentSummary(summary));
        }
        self.comments.collect(p);

        if !plain.trim().is_empty()
            && let Some(toc_index) = self.awaiting_lead_in.take()
        {
            self.toc[toc_index].lead_in = text::lead_text(&plain, self.config.lead_in_len);
        }

        let images: Vec<WidgetData> = p
            .modifiers
            .iter()
            .filter_map(|m| match &m.data {
                ModifierData::Image(widget) => Some(widget.clone()),
                _ => None,
            })
            .collect();
        if !images.is_empty() && plain.trim().is_empty() {
            self.push(EntryKind::Images(ImagesEntry {
                para_id: p.id.clone(),
                images,
            }));
            return;
        }

        if let Some(kind) = TocKind::for_paragraph(p.ty) {
            self.toc.push(TocEntry {
                kind,
                para_id: p.id.clone(),
                para_index: index,
                entry_index: self.entries.len(),
                text: text::lead_text(&plain, self.config.toc_snippet_len),
                lead_in: String::new(),
                summary: None,
                counters: self.counters,
            });
            self.awaiting_lead_in = Some(self.toc.len() - 1);
        }

        let layer = p.layer_id().cloned();
        self.push(EntryKind::Paragraph(ParagraphEntry {
            para_id: p.id.clone(),
            para_index: Some(index),
            para_type: p.ty,
            tab_level: p.tab_level,
            ordinal: None,
            is_cover: false,
            layer: layer.clone(),
        }));

        let chars = text::char_len(&plain);
        self.counters.words_so_far += text::word_count(&plain);
        self.counters.chars_so_far += chars;
        if layer.is_none() {
            self.counters.base_chars_so_far += chars;
        }
    }

    fn directive(&mut self, p: &Paragraph, tag: &str, value: &str) -> Result<(), ParseError> {
        let directive = match Directive::parse(tag, value) {
            Ok(directive) => directive,
            Err(err) => {
                return self.log.report(&format!("paragraph {}: {err}", p.id));
            }
        };
        tracing::trace!(para = %p.id, tag, "directive");

        match directive {
            Directive::Start(name) => {
                if let Some(open) = &self.note {
                    let message = format!(
                        "paragraph {}: cannot start `{name}` inside open note `{}`",
                        p.id, open.name
                    );
                    return self.log.report(&message);
                }
                if !self.note_names.insert(name.clone()) {
                    return self
                        .log
                        .report(&format!("paragraph {}: note name `{name}` reused", p.id));
                }
                self.note = Some(OpenNote {
                    name,
                    para_ids: Vec::new(),
                    multi: false,
                    answers: Vec::new(),
                });
            }
            Directive::Stop => match self.note.take() {
                Some(note) => self.push(EntryKind::AuthorNote(note.into_entry())),
                None => {
                    return self
                        .log
                        .report(&format!("paragraph {}: stop without an open note", p.id));
                }
            },
            Directive::Multi => match &mut self.note {
                Some(note) => note.multi = true,
                None => {
                    return self
                        .log
                        .report(&format!("paragraph {}: multi outside a note", p.id));
                }
            },
            Directive::Answer(answer) => match &mut self.note {
                Some(note) => note.answers.push(answer),
                None => {
                    return self
                        .log
                        .report(&format!("paragraph {}: answer outside a note", p.id));
                }
            },
            Directive::Preview => self.push(EntryKind::Preview(PreviewEntry {
                para_id: p.id.clone(),
            })),
            Directive::ChapterInfo(summary) => {
                let chapter = self
                    .toc
                    .iter_mut()
                    .rev()
                    .find(|entry| entry.kind == TocKind::Chapter);
                match chapter {
                    Some(entry) => entry.summary = Some(summary),
                    None => {
                        return self.log.report(&format!(
                            "paragraph {}: chapterinfo before any chapter",
                            p.id
                        ));
                    }
                }
            }
            Directive::Button(button) => self.push(EntryKind::Button(button)),
            Directive::Data(value) => self.push(EntryKind::Data(DataEntry {
                para_id: p.id.clone(),
                value,
            })),
        }
        Ok(())
    }
}
