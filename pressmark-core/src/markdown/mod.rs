//! Markdown rendering with the post body extensions.

pub mod containers;
pub mod mark;

use pulldown_cmark::{html, Event, Options, Parser, TextMergeStream};

pub use containers::{expand_containers, Container, Speaker};
pub use mark::MarkTransformer;

/// Markdown renderer for post bodies
///
/// Enables tables, footnotes, strikethrough and task lists, expands
/// `:::` containers and renders `==text==` as `<mark>`. Raw HTML passes
/// through. Fenced code keeps its full info string in the class, so
/// ```` ```rust:src/main.rs ```` renders as `language-rust:src/main.rs`.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options }
    }

    /// Convert markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let expanded = expand_containers(markdown);

        let parser = Parser::new_ext(&expanded, self.options);
        let events: Vec<Event> = TextMergeStream::new(parser).collect();

        let events = MarkTransformer::new().transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
