//! Highlight transformation for `==text==` syntax.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

fn mark_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"==([^=\s](?:[^=]*?[^=\s])?)==").expect("valid regex"))
}

/// Wraps `==text==` runs in `<mark>`
#[derive(Debug, Default)]
pub struct MarkTransformer;

impl MarkTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform text events outside code blocks
    ///
    /// Expects adjacent text events to be merged already, so a marker pair
    /// is never split across events.
    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut in_code_block = false;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    out.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    out.push(event);
                }
                Event::Text(ref text) if !in_code_block && text.contains("==") => {
                    out.extend(split_marks(text));
                }
                other => out.push(other),
            }
        }

        out
    }
}

fn split_marks(text: &str) -> Vec<Event<'static>> {
    let mut events = Vec::new();
    let mut last = 0;

    for caps in mark_regex().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            events.push(owned_text(&text[last..whole.start()]));
        }
        events.push(Event::InlineHtml(CowStr::Borrowed("<mark>")));
        events.push(owned_text(inner.as_str()));
        events.push(Event::InlineHtml(CowStr::Borrowed("</mark>")));
        last = whole.end();
    }

    if last < text.len() {
        events.push(owned_text(&text[last..]));
    }
    events
}

fn owned_text(text: &str) -> Event<'static> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}
