//! Publish orchestration.
//!
//! parse → (resolve references ∥ render) → post-process → featured image →
//! upsert. Any step except link cards aborts the run; media uploaded before
//! a failure stay in the library and are reused on retry.

use pressmark_types::RemoteItem;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::frontmatter::SourceDocument;
use crate::markdown::MarkdownRenderer;
use crate::media::MediaUploader;
use crate::process::{annotate_code_html, post_process, ProcessContext};
use crate::publisher::{publish, resolve_featured_image, PostPayload};
use crate::remote::{RemoteApi, WebFetcher};
use crate::resolver::resolve_references;

/// Publishes documents against one remote site
pub struct Publisher<'a> {
    config: &'a Config,
    api: &'a dyn RemoteApi,
    fetcher: &'a dyn WebFetcher,
    renderer: MarkdownRenderer,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a Config, api: &'a dyn RemoteApi, fetcher: &'a dyn WebFetcher) -> Self {
        Self {
            config,
            api,
            fetcher,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Read and publish the document at `path`
    pub async fn publish_file(&self, path: &Path) -> Result<RemoteItem> {
        let doc = SourceDocument::read(path)?;
        self.publish_document(&doc).await
    }

    /// Create or update the post for `doc`
    pub async fn publish_document(&self, doc: &SourceDocument) -> Result<RemoteItem> {
        info!(path = %doc.path.display(), "publishing");

        debug!("parsing document");
        let parsed = doc.parse()?;
        let mut payload = PostPayload::from_metadata(&parsed.metadata, &doc.stem())?;
        let post_slug = payload.slug().to_string();

        debug!(slug = %post_slug, "resolving references and rendering");
        let (resolved, html) = tokio::join!(
            resolve_references(self.api, &self.config.slug_keys, &parsed.metadata),
            async { self.renderer.render(&parsed.body) }
        );
        payload.apply_references(&resolved?);

        debug!("post-processing html");
        let ctx = ProcessContext {
            config: self.config,
            api: self.api,
            fetcher: self.fetcher,
            doc_dir: doc.dir(),
            post_slug: &post_slug,
        };
        let content = post_process(&html, &ctx).await?;
        payload.set_content(content);

        debug!("resolving featured image");
        let uploader = MediaUploader::new(self.api, &self.config.media);
        resolve_featured_image(&mut payload, doc, self.config, &uploader).await?;

        debug!("upserting post");
        publish(self.api, &payload).await
    }

    /// Render the body locally with only the code pass applied
    pub fn render_preview(&self, doc: &SourceDocument) -> Result<String> {
        let parsed = doc.parse()?;
        Ok(render_local(&self.renderer, &parsed.body))
    }
}

/// Render and annotate code without touching the network
pub fn render_local(renderer: &MarkdownRenderer, body: &str) -> String {
    annotate_code_html(&renderer.render(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::testing::{FakeFetcher, FakeRemote, MEDIA_HOST};
    use image::{Rgb, RgbImage};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    const PAGE: &str =
        r#"<html><head><meta property="og:title" content="Docs"></head><body></body></html>"#;

    fn write_doc(dir: &Path, name: &str, text: &str) -> SourceDocument {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        SourceDocument::read(&path).unwrap()
    }

    #[tokio::test]
    async fn test_full_publish() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]))
            .save(dir.path().join("fig.png"))
            .unwrap();
        RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]))
            .save(dir.path().join("hello.png"))
            .unwrap();
        let doc = write_doc(
            dir.path(),
            "hello.md",
            concat!(
                "---\ntitle: Hello\ntags: [rust]\n---\n",
                "![Figure](fig.png)\n\n",
                "```rust:main.rs\nfn main() {}\n```\n\n",
                "https://docs.test/\n\n",
                "<https://docs.test/>\n"
            ),
        );

        let remote = FakeRemote::new();
        remote.insert("tags", RemoteItem::new(3, "rust"));
        let fetcher = FakeFetcher::new().with_page("https://docs.test/", PAGE);
        let config = Config::for_site("https://blog.test");

        let item = Publisher::new(&config, &remote, &fetcher)
            .publish_document(&doc)
            .await
            .unwrap();
        assert_eq!(item.slug, "hello");
        assert_eq!(item.link.as_deref(), Some("https://blog.test/hello/"));

        let created = remote.created();
        assert_eq!(created.len(), 1);
        let payload = &created[0].1;
        assert_eq!(payload.get("title"), Some(&json!("Hello")));
        assert_eq!(payload.get("tags"), Some(&json!([3])));
        assert!(payload.get("featured_media").and_then(Value::as_u64).is_some());

        let content = payload.get("content").and_then(Value::as_str).unwrap();
        assert!(content.contains(&format!(r#"<img src="{}/hello-fig.png" alt="Figure">"#, MEDIA_HOST)));
        assert!(content.contains(r#"<pre data-file="main.rs" data-label="main.rs" data-lang="rust">"#));
        assert!(content.contains("blogcard-wrap"));
        // a bare URL is plain text, not a link
        assert!(content.contains("<p>https://docs.test/</p>"));

        let names: Vec<String> = remote.uploads().into_iter().map(|u| u.file_name).collect();
        assert_eq!(names, vec!["hello-fig.png", "hello-featured-image.png"]);
    }

    #[tokio::test]
    async fn test_republish_updates_and_reuses_media() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]))
            .save(dir.path().join("dot.png"))
            .unwrap();
        let doc = write_doc(dir.path(), "again.md", "![](dot.png)\n");

        let remote = FakeRemote::new();
        let fetcher = FakeFetcher::new();
        let config = Config::for_site("https://blog.test");
        let publisher = Publisher::new(&config, &remote, &fetcher);

        let first = publisher.publish_document(&doc).await.unwrap();
        let second = publisher.publish_document(&doc).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(remote.created().len(), 1);
        assert_eq!(remote.updated().len(), 1);
        assert_eq!(remote.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_reference_aborts_before_upload() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]))
            .save(dir.path().join("dot.png"))
            .unwrap();
        let doc = write_doc(
            dir.path(),
            "bad.md",
            "---\ncategories: [missing]\n---\n![](dot.png)\n",
        );

        let remote = FakeRemote::new();
        let fetcher = FakeFetcher::new();
        let config = Config::for_site("https://blog.test");

        let err = Publisher::new(&config, &remote, &fetcher)
            .publish_document(&doc)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Resolution { .. }));
        assert!(remote.uploads().is_empty());
        assert!(remote.created().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_markdown() {
        let dir = TempDir::new().unwrap();
        let doc = write_doc(dir.path(), "notes.txt", "hello");
        let remote = FakeRemote::new();
        let fetcher = FakeFetcher::new();
        let config = Config::for_site("https://blog.test");

        let err = Publisher::new(&config, &remote, &fetcher)
            .publish_document(&doc)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Document(_)));
        assert_eq!(remote.list_calls(), 0);
    }

    #[test]
    fn test_render_preview() {
        let remote = FakeRemote::new();
        let fetcher = FakeFetcher::new();
        let config = Config::for_site("https://blog.test");
        let doc = SourceDocument::new("p.md", "---\ntitle: T\n---\n```mermaid\ngraph TD;\n```\n");

        let html = Publisher::new(&config, &remote, &fetcher)
            .render_preview(&doc)
            .unwrap();
        assert_eq!(html, "<pre><code class=\"mermaid\">graph TD;\n</code></pre>\n");
        assert_eq!(remote.list_calls(), 0);
    }
}
