//! Post payload assembly and idempotent upsert by slug.

use pressmark_types::{collection, PostStatus, RemoteId, RemoteItem};
use serde_json::Value;
use serde_yaml::Mapping;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::frontmatter::SourceDocument;
use crate::media::MediaUploader;
use crate::remote::{find_by_slug, JsonObject, Lookup, RemoteApi};
use crate::resolver::ResolvedField;
use crate::slug::slugify;

const SLUG: &str = "slug";
const CONTENT: &str = "content";
const FEATURED_MEDIA: &str = "featured_media";

/// Body of the create or update call
///
/// Always carries a non-empty `slug`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPayload {
    fields: JsonObject,
}

impl PostPayload {
    /// Build from front matter, falling back to `slugify(fallback_slug)` when
    /// the document names no slug. Numeric slugs are sent as strings.
    pub fn from_metadata(metadata: &Mapping, fallback_slug: &str) -> Result<Self> {
        let mut fields = JsonObject::new();
        for (key, value) in metadata {
            let Some(key) = key.as_str() else {
                return Err(PublishError::InvalidField {
                    key: format!("{:?}", key),
                    message: "front matter keys must be strings".to_string(),
                });
            };
            let json = serde_json::to_value(value).map_err(|e| PublishError::InvalidField {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            fields.insert(key.to_string(), json);
        }

        let explicit = match fields.get(SLUG) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let slug = match explicit {
            Some(slug) => slug,
            None => {
                let slug = slugify(fallback_slug);
                if slug.is_empty() {
                    return Err(PublishError::InvalidField {
                        key: SLUG.to_string(),
                        message: format!(
                            "no slug in front matter and none can be derived from {:?}",
                            fallback_slug
                        ),
                    });
                }
                slug
            }
        };
        fields.insert(SLUG.to_string(), Value::String(slug));

        Ok(Self { fields })
    }

    pub fn slug(&self) -> &str {
        self.fields
            .get(SLUG)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn set_content(&mut self, html: impl Into<String>) {
        self.set(CONTENT, Value::String(html.into()));
    }

    /// Replace reference fields with their resolved ids
    pub fn apply_references(&mut self, resolved: &[ResolvedField]) {
        for field in resolved {
            let ids = field.ids.iter().map(|id| Value::from(id.as_u64())).collect();
            self.set(field.key.clone(), Value::Array(ids));
        }
    }

    /// Usable `featured_media` id: absent, null, zero and non-numeric values
    /// count as none
    pub fn featured_media(&self) -> Option<RemoteId> {
        self.fields
            .get(FEATURED_MEDIA)
            .and_then(Value::as_u64)
            .filter(|id| *id != 0)
            .map(RemoteId)
    }

    pub fn set_featured_media(&mut self, id: RemoteId) {
        self.set(FEATURED_MEDIA, Value::from(id.as_u64()));
    }

    pub fn as_object(&self) -> &JsonObject {
        &self.fields
    }
}

/// Fill in `featured_media` when the document does not set a usable one
///
/// Looks for `<doc dir>/<doc stem><ext>` over the configured extensions in
/// order and uploads the first hit. Otherwise the configured default id is
/// used, or the field is dropped.
pub async fn resolve_featured_image(
    payload: &mut PostPayload,
    doc: &SourceDocument,
    config: &Config,
    uploader: &MediaUploader<'_>,
) -> Result<()> {
    if let Some(id) = payload.featured_media() {
        debug!(%id, "featured image set in front matter");
        return Ok(());
    }

    let stem = doc.stem();
    let candidate = config
        .media
        .extensions
        .iter()
        .map(|ext| doc.dir().join(format!("{}{}", stem, ext)))
        .find(|path| path.is_file());

    if let Some(path) = candidate {
        let slug = config.media.featured_image_slug(payload.slug());
        let item = uploader.upload_or_reuse(&slug, &path).await?;
        debug!(path = %path.display(), id = %item.id, "featured image");
        payload.set_featured_media(item.id);
    } else if let Some(id) = config.media.default_featured_id {
        debug!(id, "default featured image");
        payload.set_featured_media(RemoteId(id));
    } else {
        payload.remove(FEATURED_MEDIA);
    }
    Ok(())
}

/// Update the post with the payload's slug, or create it
///
/// The lookup spans every post status, so drafts and scheduled posts are
/// updated rather than duplicated.
pub async fn publish(api: &dyn RemoteApi, payload: &PostPayload) -> Result<RemoteItem> {
    let slug = payload.slug();
    let statuses = PostStatus::all_query_value();

    match find_by_slug(api, collection::POSTS, slug, &[("status", statuses.as_str())]).await? {
        Lookup::Found(existing) => {
            let item = api
                .update(collection::POSTS, existing.id, payload.as_object())
                .await?;
            info!(slug, id = %item.id, "updated post");
            Ok(item)
        }
        Lookup::Missing => {
            let item = api.create(collection::POSTS, payload.as_object()).await?;
            info!(slug, id = %item.id, "created post");
            Ok(item)
        }
        Lookup::Ambiguous(items) => Err(PublishError::Resolution {
            collection: collection::POSTS.to_string(),
            slug: slug.to_string(),
            matches: items.len(),
        }),
    }
}
