//! Code block annotation for the site's highlighter.
//!
//! Fenced blocks render as `<pre><code class="language-<lang>[:<file>]">`.
//! The class is rewritten into the highlighter's vocabulary and the file
//! path moves to `data-*` attributes on the `<pre>`.

use tracing::debug;

use crate::html::HtmlFragment;

const LANGUAGE_PREFIX: &str = "language-";

/// Language and optional file path parsed from a code class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLabel<'a> {
    pub language: &'a str,
    pub file_path: Option<&'a str>,
}

impl<'a> CodeLabel<'a> {
    /// Parse the `language-…` token of a class attribute
    pub fn from_class(class: &'a str) -> Option<Self> {
        let token = class
            .split_whitespace()
            .find_map(|t| t.strip_prefix(LANGUAGE_PREFIX))?;
        let (language, file_path) = match token.split_once(':') {
            Some((language, path)) => (language, Some(path).filter(|p| !p.is_empty())),
            None => (token, None),
        };
        if language.is_empty() {
            return None;
        }
        Some(Self {
            language,
            file_path,
        })
    }

    /// Class value understood by the highlighter
    pub fn class_value(&self) -> String {
        if self.language == "mermaid" {
            "mermaid".to_string()
        } else if self.language == "diff" || self.language.starts_with("diff-") {
            format!("{}{} diff-highlight line-numbers", LANGUAGE_PREFIX, self.language)
        } else {
            format!("{}{} line-numbers", LANGUAGE_PREFIX, self.language)
        }
    }
}

/// Rewrite every `<pre><code class="language-…">` in the fragment
pub fn annotate_code_blocks(fragment: &mut HtmlFragment) {
    for code in fragment.select("code") {
        let dom = fragment.dom_mut();
        let Some(pre) = dom.parent(code).filter(|p| dom.tag_name(*p) == Some("pre")) else {
            continue;
        };
        let Some(class) = dom.get_attr(code, "class").map(str::to_string) else {
            continue;
        };
        let Some(label) = CodeLabel::from_class(&class) else {
            continue;
        };

        debug!(language = label.language, file = ?label.file_path, "annotating code block");
        dom.set_attr(code, "class", label.class_value());
        if let Some(path) = label.file_path {
            dom.set_attr(pre, "data-file", path);
            dom.set_attr(pre, "data-label", path);
            dom.set_attr(pre, "data-lang", label.language);
        }

        let text = dom.text_content(code);
        dom.set_text(code, text);
    }
}
