//! Slug-keyed upload to the remote media library.

use pressmark_types::{collection, RemoteItem};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{PublishError, Result};
use crate::remote::{find_by_slug, Lookup, MediaUpload, RemoteApi, RemoteError};

/// Uploads local files unless an item with the same slug already exists
pub struct MediaUploader<'a> {
    api: &'a dyn RemoteApi,
    config: &'a MediaConfig,
}

impl<'a> MediaUploader<'a> {
    pub fn new(api: &'a dyn RemoteApi, config: &'a MediaConfig) -> Self {
        Self { api, config }
    }

    /// Return the media item stored under `slug`, uploading `path` first if
    /// there is none
    ///
    /// The file is only read when the lookup misses, so an existing item is
    /// reused even if the local file has since been removed.
    pub async fn upload_or_reuse(&self, slug: &str, path: &Path) -> Result<RemoteItem> {
        match find_by_slug(self.api, collection::MEDIA, slug, &[]).await? {
            Lookup::Found(item) => {
                debug!(slug, id = %item.id, "reusing media");
                return Ok(item);
            }
            Lookup::Ambiguous(mut items) => {
                warn!(slug, matches = items.len(), "several media items share a slug, using the first");
                return Ok(items.remove(0));
            }
            Lookup::Missing => {}
        }

        if !path.is_file() {
            return Err(PublishError::LocalFileMissing(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let upload = MediaUpload {
            file_name: format!("{}{}", slug, ext),
            content_type: self.config.media_type(&ext),
            bytes,
        };

        let size = upload.bytes.len();
        let item = self.api.upload_media(upload).await?;
        info!(slug, id = %item.id, bytes = size, path = %path.display(), "uploaded media");
        Ok(item)
    }

    /// Public URL of an uploaded item, after URL rewriting
    pub fn public_url(&self, item: &RemoteItem) -> Result<String> {
        let url = item.source_url.as_deref().ok_or_else(|| {
            PublishError::Remote(RemoteError::InvalidResponse {
                url: format!("{}/{}", collection::MEDIA, item.id),
                message: "media item has no source_url".to_string(),
            })
        })?;
        Ok(self.config.rewrite_url(url))
    }
}
