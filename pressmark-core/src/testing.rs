//! In-memory remote API and fetcher for tests.

use async_trait::async_trait;
use pressmark_types::{collection, RemoteId, RemoteItem};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::remote::{JsonObject, MediaUpload, RemoteApi, RemoteError, WebFetcher};

pub const MEDIA_HOST: &str = "https://blog.test/uploads";

#[derive(Default)]
struct State {
    items: HashMap<String, Vec<RemoteItem>>,
    next_id: u64,
    list_calls: usize,
    uploads: Vec<MediaUpload>,
    created: Vec<(String, JsonObject)>,
    updated: Vec<(String, RemoteId, JsonObject)>,
}

/// Remote collections held in memory
///
/// Created items get ids from 1000 upward; uploaded media are served from
/// [`MEDIA_HOST`] under their announced file name.
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    pub fn insert(&self, collection: &str, item: RemoteItem) {
        let mut state = self.state.lock().unwrap();
        state
            .items
            .entry(collection.to_string())
            .or_default()
            .push(item);
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn uploads(&self) -> Vec<MediaUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn created(&self) -> Vec<(String, JsonObject)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updated(&self) -> Vec<(String, RemoteId, JsonObject)> {
        self.state.lock().unwrap().updated.clone()
    }

    fn store(&self, collection: &str, mut item: RemoteItem) -> RemoteItem {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        item.id = RemoteId(state.next_id);
        state
            .items
            .entry(collection.to_string())
            .or_default()
            .push(item.clone());
        item
    }
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn list(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<RemoteItem>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        let slug = query.iter().find(|(k, _)| *k == "slug").map(|(_, v)| *v);
        Ok(state
            .items
            .get(collection)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| slug.map_or(true, |s| item.slug == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection: &str,
        payload: &JsonObject,
    ) -> Result<RemoteItem, RemoteError> {
        let slug = payload
            .get("slug")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.state
            .lock()
            .unwrap()
            .created
            .push((collection.to_string(), payload.clone()));
        let link = format!("https://blog.test/{}/", slug);
        Ok(self.store(collection, RemoteItem::new(0, slug).with_link(link)))
    }

    async fn update(
        &self,
        collection: &str,
        id: RemoteId,
        payload: &JsonObject,
    ) -> Result<RemoteItem, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state
            .updated
            .push((collection.to_string(), id, payload.clone()));
        let existing = state
            .items
            .get(collection)
            .and_then(|items| items.iter().find(|item| item.id == id))
            .cloned();
        existing.ok_or_else(|| RemoteError::Status {
            method: "POST",
            url: format!("{}/{}/", collection, id),
            status: 404,
            message: "no such item".to_string(),
        })
    }

    async fn upload_media(&self, upload: MediaUpload) -> Result<RemoteItem, RemoteError> {
        let slug = upload
            .file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&upload.file_name)
            .to_string();
        let url = format!("{}/{}", MEDIA_HOST, upload.file_name);
        self.state.lock().unwrap().uploads.push(upload);
        Ok(self.store(
            collection::MEDIA,
            RemoteItem::new(0, slug).with_source_url(url),
        ))
    }
}

/// Canned page bodies and byte prefixes keyed by URL
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    resources: HashMap<String, Vec<u8>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_resource(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.resources.insert(url.to_string(), bytes);
        self
    }
}

fn not_found(url: &str) -> RemoteError {
    RemoteError::Status {
        method: "GET",
        url: url.to_string(),
        status: 404,
        message: "not found".to_string(),
    }
}

#[async_trait]
impl WebFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, RemoteError> {
        self.pages.get(url).cloned().ok_or_else(|| not_found(url))
    }

    async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Vec<u8>, RemoteError> {
        let bytes = self.resources.get(url).ok_or_else(|| not_found(url))?;
        Ok(bytes[..bytes.len().min(limit)].to_vec())
    }
}
