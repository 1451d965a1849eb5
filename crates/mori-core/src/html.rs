//! Minimal HTML export of paragraph text and basic styles.

use pulldown_cmark_escape::escape_html;

use crate::paragraph::Paragraph;
use crate::text;
use crate::types::ModifierType;

struct TaggedSpan {
    start: i32,
    end: i32,
    open: String,
    close: String,
}

fn tag_for(ty: ModifierType) -> Option<&'static str> {
    match ty {
        ModifierType::Bold => Some("b"),
        ModifierType::Italic => Some("i"),
        ModifierType::Strike => Some("s"),
        ModifierType::Underline => Some("u"),
        _ => None,
    }
}

/// Render `p` as HTML, mapping bold, italic, strike and underline to tags.
///
/// Each styled range splits the spans it partially covers so that every tag
/// pair wraps whole spans and the output nests correctly. Bulleted paragraphs
/// are wrapped in `<li>`.
pub fn convert_to_html(p: &Paragraph) -> String {
    let len = p.content_len();
    let mut spans = Vec::new();
    if len > 0 {
        spans.push(TaggedSpan {
            start: 0,
            end: len,
            open: String::new(),
            close: String::new(),
        });
    }

    for m in p.modifiers.iter().filter(|m| !m.is_sentinel() && m.start < m.end) {
        let Some(tag) = tag_for(m.ty()) else {
            continue;
        };
        let mut next = Vec::with_capacity(spans.len() + 2);
        for span in spans {
            let from = span.start.max(m.start);
            let to = span.end.min(m.end);
            if from >= to {
                next.push(span);
                continue;
            }
            if span.start < from {
                next.push(TaggedSpan {
                    start: span.start,
                    end: from,
                    open: span.open.clone(),
                    close: span.close.clone(),
                });
            }
            next.push(TaggedSpan {
                start: from,
                end: to,
                open: format!("{}<{tag}>", span.open),
                close: format!("</{tag}>{}", span.close),
            });
            if to < span.end {
                next.push(TaggedSpan {
                    start: to,
                    end: span.end,
                    open: span.open,
                    close: span.close,
                });
            }
        }
        spans = next;
    }

    let mut html = String::with_capacity(p.content.len() + spans.len() * 8);
    for span in &spans {
        html.push_str(&span.open);
        let slice = text::char_slice(&p.content, span.start as usize, span.end as usize);
        escape_html(&mut html, slice).expect("writing to a String cannot fail");
        html.push_str(&span.close);
    }
    if p.is_bulleted() {
        html = format!("<li>{html}</li>");
    }
    html
}

/// Render paragraphs in order, separated by `<br/>` except before a bullet.
pub fn convert_paras_to_html(paras: &[Paragraph]) -> String {
    let mut html = String::new();
    for (i, p) in paras.iter().enumerate() {
        if i > 0 && !p.is_bulleted() {
            html.push_str("<br/>");
        }
        html.push_str(&convert_to_html(p));
    }
    html
}
