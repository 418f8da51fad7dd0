//! Frontmatter parsing from markdown files.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Extension of documents the parser accepts
pub const MARKDOWN_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Not a Markdown file: {0}")]
    Format(String),

    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping of keys to values")]
    NotAMapping,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z")
            .expect("valid regex")
    })
}

/// A document as read from disk
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub raw_text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Read the document at `path`
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let raw_text = std::fs::read_to_string(path)?;
        Ok(Self::new(path, raw_text))
    }

    /// Directory local references resolve against
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Base filename without extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_markdown(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
    }

    /// Split into metadata and body, rejecting non-Markdown paths
    pub fn parse(&self) -> Result<ParsedDocument, FrontmatterError> {
        if !self.is_markdown() {
            let name = self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string());
            return Err(FrontmatterError::Format(name));
        }
        parse_frontmatter(&self.raw_text)
    }
}

/// Metadata and body of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    /// Front matter in source order
    pub metadata: Mapping,
    pub body: String,
}

impl ParsedDocument {
    /// String value of a metadata key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Reassemble the document text
    ///
    /// Empty metadata yields the body unchanged, so documents without front
    /// matter survive a parse/serialize cycle byte for byte.
    pub fn to_source(&self) -> Result<String, FrontmatterError> {
        if self.metadata.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.metadata)?;
        Ok(format!("---\n{}---\n{}", yaml, self.body))
    }
}

/// Parse frontmatter from markdown content
///
/// Returns the metadata mapping and the markdown body. If no frontmatter is
/// present, the metadata is empty and the full content is the body.
///
/// # Example
///
/// ```
/// use pressmark_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ntags: [rust]\n---\n# Hello World\n";
///
/// let doc = parse_frontmatter(content).unwrap();
/// assert_eq!(doc.get_str("title"), Some("My Post"));
/// assert!(doc.body.starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<ParsedDocument, FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok(ParsedDocument {
            metadata: Mapping::new(),
            body: content.to_string(),
        });
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    let metadata = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(FrontmatterError::NotAMapping),
    };

    Ok(ParsedDocument {
        metadata,
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Post
slug: test-post
categories:
  - rust
  - programming
status: draft
---

# Hello World

This is the content."#;

        let doc = parse_frontmatter(content).unwrap();
        assert_eq!(doc.get_str("title"), Some("Test Post"));
        assert_eq!(doc.get_str("slug"), Some("test-post"));
        let keys: Vec<&str> = doc.metadata.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["title", "slug", "categories", "status"]);
        assert!(doc.body.contains("# Hello World"));
        assert!(doc.body.contains("This is the content."));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let doc = parse_frontmatter(content).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, content);
    }

    #[test]
    fn test_parse_empty_frontmatter() {
        let doc = parse_frontmatter("---\n---\nBody text\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "Body text\n");
    }

    #[test]
    fn test_parse_crlf_frontmatter() {
        let doc = parse_frontmatter("---\r\ntitle: Windows\r\n---\r\nBody").unwrap();
        assert_eq!(doc.get_str("title"), Some("Windows"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::YamlError(_))
        ));
    }

    #[test]
    fn test_scalar_frontmatter_is_rejected() {
        let content = "---\njust a string\n---\nBody";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::NotAMapping)
        ));
    }

    #[test]
    fn test_roundtrip_without_metadata() {
        let content = "Plain body\n\nwith paragraphs\n";
        let doc = parse_frontmatter(content).unwrap();
        assert_eq!(doc.to_source().unwrap(), content);
    }

    #[test]
    fn test_roundtrip_with_metadata() {
        let content = "---\ntitle: Round Trip\ntags:\n- a\n- b\nfeatured_media: 12\n---\nBody\n";
        let doc = parse_frontmatter(content).unwrap();
        let reparsed = parse_frontmatter(&doc.to_source().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_source_document_rejects_other_extensions() {
        let doc = SourceDocument::new("notes/readme.txt", "hello");
        match doc.parse() {
            Err(FrontmatterError::Format(name)) => assert_eq!(name, "readme.txt"),
            other => panic!("Expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_document_paths() {
        let doc = SourceDocument::new("posts/hello-world.md", "body");
        assert_eq!(doc.stem(), "hello-world");
        assert_eq!(doc.dir(), Path::new("posts"));
        assert!(doc.parse().is_ok());
    }
}
