//! The embedded directive mini-language.
//!
//! A directive is a paragraph whose whole (trimmed) content is
//! `<prefix><tag>[ <value>]`, e.g. `#magicmoristart Q1`.

use regex::Regex;
use smol_str::SmolStr;

use crate::entry::ButtonEntry;
use crate::error::ParseError;

/// Matcher for directive paragraphs under a configured prefix.
#[derive(Debug, Clone)]
pub struct DirectiveSyntax {
    re: Regex,
}

impl DirectiveSyntax {
    pub fn new(prefix: &str) -> Result<Self, ParseError> {
        let pattern = format!(r"(?s)^{}([a-z]+)(?:\s+(.*))?$", regex::escape(prefix));
        Regex::new(&pattern)
            .map(|re| Self { re })
            .map_err(|source| ParseError::InvalidPrefix {
                prefix: prefix.to_string(),
                source,
            })
    }

    /// Split a directive paragraph into tag and value. `None` for ordinary text.
    pub fn split<'t>(&self, content: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.re.captures(content.trim())?;
        let tag = caps.get(1)?.as_str();
        let value = caps.get(2).map_or("", |m| m.as_str().trim());
        Some((tag, value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Open an author note with the given name.
    Start(SmolStr),
    Stop,
    Multi,
    Answer(String),
    Preview,
    ChapterInfo(String),
    Button(ButtonEntry),
    Data(serde_json::Value),
}

impl Directive {
    pub fn parse(tag: &str, value: &str) -> Result<Self, ParseError> {
        let directive = match tag {
            "start" => {
                if value.is_empty() {
                    return Err(ParseError::Directive("start needs a note name".into()));
                }
                Directive::Start(value.into())
            }
            "stop" => Directive::Stop,
            "multi" => Directive::Multi,
            "answer" => Directive::Answer(value.to_string()),
            "preview" => Directive::Preview,
            "chapterinfo" => {
                if value.is_empty() {
                    return Err(ParseError::Directive("chapterinfo needs a summary".into()));
                }
                Directive::ChapterInfo(value.to_string())
            }
            "button" => Directive::Button(parse_button(value)?),
            "data" => Directive::Data(serde_json::from_str(value).map_err(|e| {
                ParseError::Directive(format!("data is not valid JSON: {e}"))
            })?),
            other => {
                return Err(ParseError::Directive(format!("unknown directive `{other}`")));
            }
        };
        Ok(directive)
    }
}

fn list(s: &str) -> Vec<SmolStr> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SmolStr::from)
        .collect()
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse `name,icon[,note[,noteText]]>[flyoutText]|[sub,sub,...]>[match,...]`.
///
/// The flyout section is optional, as is the `|` inside it; without a `|` the
/// whole section is flyout text.
pub fn parse_button(spec: &str) -> Result<ButtonEntry, ParseError> {
    let mut sections = spec.splitn(3, '>');
    let head = sections.next().unwrap_or_default();
    let flyout = sections.next();
    let matches = sections.next();

    let mut fields = head.splitn(4, ',').map(str::trim);
    let name = fields.next().filter(|s| !s.is_empty());
    let icon = fields.next().filter(|s| !s.is_empty());
    let (Some(name), Some(icon)) = (name, icon) else {
        return Err(ParseError::Directive(format!(
            "button `{spec}` needs at least a name and an icon"
        )));
    };
    let note = non_empty(fields.next()).map(SmolStr::from);
    let note_text = non_empty(fields.next()).map(str::to_string);

    let (flyout_text, reactions) = match flyout {
        Some(section) => match section.split_once('|') {
            Some((text, subs)) => (non_empty(Some(text)).map(str::to_string), list(subs)),
            None => (non_empty(Some(section)).map(str::to_string), Vec::new()),
        },
        None => (None, Vec::new()),
    };

    Ok(ButtonEntry {
        name: name.into(),
        icon: icon.into(),
        note,
        note_text,
        flyout_text,
        reactions,
        matches: matches.map(list).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax() -> DirectiveSyntax {
        DirectiveSyntax::new("#magicmori").unwrap()
    }

    #[test]
    fn test_split_directives() {
        let s = syntax();
        assert_eq!(s.split("#magicmoristart Q1"), Some(("start", "Q1")));
        assert_eq!(s.split("  #magicmoristop  "), Some(("stop", "")));
        assert_eq!(
            s.split("#magicmorianswer two\nlines"),
            Some(("answer", "two\nlines"))
        );
        assert_eq!(s.split("plain text"), None);
        assert_eq!(s.split("say #magicmoristop"), None);
    }

    #[test]
    fn test_prefix_is_literal() {
        let s = DirectiveSyntax::new("$$mm.").unwrap();
        assert_eq!(s.split("$$mm.stop"), Some(("stop", "")));
        assert_eq!(s.split("$$mmxstop"), None);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert!(matches!(
            Directive::parse("blink", ""),
            Err(ParseError::Directive(_))
        ));
        assert!(Directive::parse("start", "").is_err());
        assert!(Directive::parse("data", "{nope").is_err());
        assert_eq!(
            Directive::parse("data", r#"{"a":1}"#).unwrap(),
            Directive::Data(serde_json::json!({ "a": 1 }))
        );
    }

    #[test]
    fn test_button_full_grammar() {
        let button =
            parse_button("like, heart, fav, Tap to like>Pick one|joy, wow ,sad>happy,glad").unwrap();
        assert_eq!(
            button,
            ButtonEntry {
                name: "like".into(),
                icon: "heart".into(),
                note: Some("fav".into()),
                note_text: Some("Tap to like".into()),
                flyout_text: Some("Pick one".into()),
                reactions: vec!["joy".into(), "wow".into(), "sad".into()],
                matches: vec!["happy".into(), "glad".into()],
            }
        );
    }

    #[test]
    fn test_button_minimal_and_note_text_with_commas() {
        let button = parse_button("ok,check").unwrap();
        assert_eq!(button.name, "ok");
        assert_eq!(button.note, None);
        assert!(button.reactions.is_empty());

        let button = parse_button("a,b,c,one, two").unwrap();
        assert_eq!(button.note_text.as_deref(), Some("one, two"));

        let button = parse_button("a,b>just text").unwrap();
        assert_eq!(button.flyout_text.as_deref(), Some("just text"));
        assert!(button.reactions.is_empty());
    }

    #[test]
    fn test_button_requires_icon() {
        assert!(parse_button("lonely").is_err());
        assert!(parse_button(",icon").is_err());
    }
}
