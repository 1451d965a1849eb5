//! Content edits that keep modifier offsets consistent.

use crate::error::ModifierError;
use crate::paragraph::Paragraph;
use crate::text;

impl Paragraph {
    fn check_range(&self, start: i32, end: i32) -> Result<(), ModifierError> {
        let len = self.content_len();
        if end < start {
            return Err(ModifierError::InvertedRange { start, end });
        }
        if start < 0 || end > len {
            return Err(ModifierError::OutOfBounds { start, end, len });
        }
        Ok(())
    }

    /// Insert `text` at char position `pos`.
    ///
    /// Modifiers starting at or after `pos` shift right. Modifiers containing
    /// `pos`, or ending exactly at it, grow to cover the new text, so typing at
    /// the end of a span continues it. Never-split types ending at `pos` do not grow.
    pub fn insert_content(&mut self, pos: i32, text: &str) -> Result<(), ModifierError> {
        self.check_range(pos, pos).inspect_err(|e| {
            tracing::warn!(para = %self.id, error = %e, "rejected insert");
        })?;
        let added = text::char_len(text) as i32;
        if added == 0 {
            return Ok(());
        }
        text::splice(&mut self.content, pos as usize, pos as usize, text);

        for m in self.modifiers.iter_mut().filter(|m| !m.is_sentinel()) {
            if m.start >= pos {
                m.start += added;
                m.end += added;
            } else if m.end > pos || (m.end == pos && !m.ty().never_split_or_merge()) {
                m.end += added;
            }
        }
        tracing::trace!(para = %self.id, pos, added, "inserted content");
        Ok(())
    }

    /// Delete the chars in `start..end`, returning the removed text.
    ///
    /// Modifiers are shifted and shrunk; those that vanish are dropped and the
    /// list is normalized.
    pub fn remove_content(&mut self, start: i32, end: i32) -> Result<String, ModifierError> {
        self.check_range(start, end).inspect_err(|e| {
            tracing::warn!(para = %self.id, error = %e, "rejected removal");
        })?;
        let removed = self.remove_content_raw(start, end);
        self.clean_up();
        Ok(removed)
    }

    /// Delete without normalizing, for callers that batch a clean-up at the end.
    /// The range must already be validated.
    pub(crate) fn remove_content_raw(&mut self, start: i32, end: i32) -> String {
        if start >= end {
            return String::new();
        }
        let removed = text::splice(&mut self.content, start as usize, end as usize, "");
        let width = end - start;
        let shift = |x: i32| {
            if x <= start {
                x
            } else if x >= end {
                x - width
            } else {
                start
            }
        };

        self.modifiers.retain(|m| {
            if m.is_sentinel() {
                return true;
            }
            let inside = start <= m.start && m.end <= end;
            let point_on_edge = m.start == m.end && (m.start == start || m.start == end);
            !inside || point_on_edge
        });
        for m in self.modifiers.iter_mut().filter(|m| !m.is_sentinel()) {
            m.start = shift(m.start);
            m.end = shift(m.end);
        }
        tracing::trace!(para = %self.id, start, end, "removed content");
        removed
    }
}
