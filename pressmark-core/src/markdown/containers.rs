//! Fenced container blocks (`::: kind params` ... `:::`).
//!
//! Containers are expanded before Markdown parsing: each opening and closing
//! marker becomes a standalone raw HTML block, so the content between them
//! is still parsed as Markdown. Markers inside fenced code are left alone.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::warn;

/// Person shown next to a speech balloon
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Speaker {
    pub name: String,
    pub image: String,
    /// Place the speaker on the right
    pub opposite: bool,
}

/// The known container kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    /// Collapsible `<details>` with a summary line
    Detail { summary: String },
    Note { kind: String },
    Sticky { kind: String },
    Label { title: String },
    Speech(Speaker),
}

impl Container {
    /// Parse the name and parameters of an opening marker
    pub fn from_marker(name: &str, params: &str) -> Option<Self> {
        let params = params.trim().to_string();
        let container = match name {
            "detail" => Container::Detail { summary: params },
            "note" => Container::Note { kind: params },
            "sticky" => Container::Sticky { kind: params },
            "label" => Container::Label { title: params },
            "speech" => {
                let speaker = if params.is_empty() {
                    Speaker::default()
                } else {
                    serde_json::from_str(&params).unwrap_or_else(|e| {
                        warn!(%params, error = %e, "invalid speech container parameters");
                        Speaker::default()
                    })
                };
                Container::Speech(speaker)
            }
            _ => return None,
        };
        Some(container)
    }

    pub fn open_html(&self) -> String {
        match self {
            Container::Detail { summary } => {
                format!("<details><summary>{}</summary>", html_escape(summary))
            }
            Container::Note { kind } => format!(
                r#"<div class="note {}"><div class="note-body">"#,
                html_escape(kind)
            ),
            Container::Sticky { kind } => format!(
                r#"<div class="wp-block-cocoon-blocks-sticky-box blank-box block-box sticky {}">"#,
                html_escape(kind)
            ),
            Container::Label { title } => format!(
                concat!(
                    r#"<div class="wp-block-cocoon-blocks-label-box-1 label-box block-box">"#,
                    r#"<div class="label-box-label block-box-label box-label">"#,
                    r#"<span class="label-box-label-text block-box-label-text box-label-text">{}</span></div>"#,
                    r#"<div class="label-box-content block-box-content box-content">"#
                ),
                html_escape(title)
            ),
            Container::Speech(speaker) => {
                let position = if speaker.opposite { "sbp-r" } else { "sbp-l" };
                format!(
                    concat!(
                        r#"<div class="wp-block-cocoon-blocks-balloon-ex-box-1 speech-wrap sb-id-1 sbs-stn {} sbis-cb cf block-box">"#,
                        r#"<div class="speech-person"><figure class="speech-icon">"#,
                        r#"<img src="{}" alt="{}" class="speech-icon-image"></figure>"#,
                        r#"<div class="speech-name">{}</div></div>"#,
                        r#"<div class="speech-balloon">"#
                    ),
                    position,
                    html_escape(&speaker.image),
                    html_escape(&speaker.name),
                    html_escape(&speaker.name)
                )
            }
        }
    }

    pub fn close_html(&self) -> &'static str {
        match self {
            Container::Detail { .. } => "</details>",
            Container::Sticky { .. } => "</div>",
            Container::Note { .. } | Container::Label { .. } | Container::Speech(_) => {
                "</div></div>"
            }
        }
    }
}

fn open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ {0,3}:{3,}[ \t]*(?P<name>[A-Za-z]+)(?:[ \t]+(?P<params>.*))?$")
            .expect("valid regex")
    })
}

fn close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}:{3,}[ \t]*$").expect("valid regex"))
}

/// An open code fence: marker character and run length
struct Fence {
    marker: char,
    len: usize,
}

fn fence_marker(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some(Fence { marker, len })
}

/// Expand container markers into raw HTML blocks
///
/// Unknown container names pass through as text. Containers still open at
/// the end of the document are closed there.
pub fn expand_containers(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut stack: Vec<Container> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in markdown.lines() {
        if let Some(open) = &fence {
            if let Some(close) = fence_marker(line) {
                let rest = line.trim().trim_start_matches(open.marker);
                if close.marker == open.marker && close.len >= open.len && rest.trim().is_empty()
                {
                    fence = None;
                }
            }
            out.push(line.to_string());
            continue;
        }

        if let Some(open) = fence_marker(line) {
            fence = Some(open);
            out.push(line.to_string());
            continue;
        }

        if close_regex().is_match(line) {
            if let Some(container) = stack.pop() {
                push_html_block(&mut out, container.close_html());
                continue;
            }
        } else if let Some(caps) = open_regex().captures(line) {
            let name = caps.name("name").map(|m| m.as_str()).unwrap_or("");
            let params = caps.name("params").map(|m| m.as_str()).unwrap_or("");
            if let Some(container) = Container::from_marker(name, params) {
                push_html_block(&mut out, &container.open_html());
                stack.push(container);
                continue;
            }
        }

        out.push(line.to_string());
    }

    while let Some(container) = stack.pop() {
        push_html_block(&mut out, container.close_html());
    }

    let mut result = out.join("\n");
    if markdown.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn push_html_block(out: &mut Vec<String>, html: &str) {
    out.push(String::new());
    out.push(html.to_string());
    out.push(String::new());
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
