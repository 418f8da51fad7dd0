//! # pressmark-core
//!
//! Core library for publishing Markdown documents to a WordPress-style REST
//! API.
//!
//! A publish run parses the document's front matter, resolves taxonomy slugs
//! to remote ids, renders the body, rewrites the HTML (image upload and
//! resizing, code block annotation, link cards) and creates or updates the
//! post matching the document's slug.

pub mod check;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod html;
pub mod image;
pub mod markdown;
pub mod media;
pub mod pipeline;
pub mod process;
pub mod publisher;
pub mod remote;
pub mod resolver;
pub mod slug;

#[cfg(test)]
mod testing;

pub use check::{check_document, CheckReport};
pub use config::{Config, ConfigError};
pub use error::PublishError;
pub use frontmatter::{parse_frontmatter, FrontmatterError, ParsedDocument, SourceDocument};
pub use markdown::MarkdownRenderer;
pub use media::MediaUploader;
pub use pipeline::Publisher;
pub use publisher::PostPayload;
pub use remote::{RemoteApi, RemoteError, RestClient, WebFetcher};
pub use self::image::compute_display_size;
pub use slug::slugify;
