//! Top-level error type for a publish run.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::frontmatter::FrontmatterError;
use crate::remote::RemoteError;

/// Every failure that aborts a publish
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Document(#[from] FrontmatterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A slug matched zero or several items in its collection
    #[error("Expected exactly one {collection} item with slug '{slug}', found {matches}")]
    Resolution {
        collection: String,
        slug: String,
        matches: usize,
    },

    #[error("Local file not found: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Failed to generate thumbnail for {}: {message}", path.display())]
    Thumbnail { path: PathBuf, message: String },

    #[error("Failed to read image dimensions of {reference}: {message}")]
    ImageProbe { reference: String, message: String },

    /// A front matter field has a shape the pipeline cannot use
    #[error("Invalid front matter field '{key}': {message}")]
    InvalidField { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PublishError>;
