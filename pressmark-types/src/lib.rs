//! Shared types for pressmark
//!
//! This crate provides the handles exchanged with the remote REST API:
//! items returned by collection lookups and the names of the collections
//! the publishing pipeline talks to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub u64);

impl RemoteId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        RemoteId(id)
    }
}

impl From<RemoteId> for u64 {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generic handle for a post, taxonomy term, or media item.
///
/// The numeric id is the identity; the slug is the lookup key and is unique
/// within a collection. Fields the API returns beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: RemoteId,

    #[serde(default)]
    pub slug: String,

    /// Public URL of a media item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Permalink of a post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl RemoteItem {
    pub fn new(id: u64, slug: impl Into<String>) -> Self {
        Self {
            id: RemoteId(id),
            slug: slug.into(),
            source_url: None,
            link: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Well-known collection names
pub mod collection {
    pub const POSTS: &str = "posts";
    pub const MEDIA: &str = "media";
}

/// Post lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
}

impl PostStatus {
    pub const ALL: [PostStatus; 5] = [
        PostStatus::Publish,
        PostStatus::Future,
        PostStatus::Draft,
        PostStatus::Pending,
        PostStatus::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Future => "future",
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Private => "private",
        }
    }

    /// Comma-separated status filter matching every lifecycle state
    pub fn all_query_value() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
