//! Image pass: probe, resize, upload and rewrite `<img>` elements.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use super::ProcessContext;
use crate::error::{PublishError, Result};
use crate::html::{HtmlFragment, NodeId};
use crate::image::{
    compute_display_size, probe_bytes, probe_local, thumbnail_path, write_thumbnail,
    ImageDescriptor, Size,
};
use crate::media::MediaUploader;

fn remote_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?:").expect("valid regex"))
}

/// Whether an image source refers to another server
pub fn is_remote(src: &str) -> bool {
    remote_regex().is_match(src)
}

/// Process every `<img>` in document order
///
/// Elements without a usable `src` are left untouched.
pub async fn process_images(fragment: &mut HtmlFragment, ctx: &ProcessContext<'_>) -> Result<()> {
    let uploader = MediaUploader::new(ctx.api, &ctx.config.media);
    let settings = &ctx.config.image;

    for img in fragment.select("img") {
        let Some(src) = fragment
            .dom()
            .get_attr(img, "src")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let url = if is_remote(&src) {
            process_remote(fragment, img, &src, ctx).await?;
            src
        } else {
            process_local(fragment, img, &src, ctx, &uploader).await?
        };

        let dom = fragment.dom_mut();
        if settings.add_title_attribute && dom.get_attr(img, "title").is_none() {
            if let Some(alt) = dom.get_attr(img, "alt").map(str::to_string) {
                dom.set_attr(img, "title", alt);
            }
        }
        if settings.linkable {
            let link = dom.create_element("a", &[("href", url.as_str())]);
            dom.wrap(img, link);
        }
    }
    Ok(())
}

async fn process_remote(
    fragment: &mut HtmlFragment,
    img: NodeId,
    src: &str,
    ctx: &ProcessContext<'_>,
) -> Result<()> {
    let settings = &ctx.config.image;
    if !settings.resize && !settings.add_size_attributes {
        return Ok(());
    }

    let prefix = ctx.fetcher.fetch_prefix(src, ctx.config.http.probe_bytes).await?;
    let (width, height) = probe_bytes(src, &prefix)?;
    let descriptor = ImageDescriptor {
        reference: src.to_string(),
        is_remote: true,
        width,
        height,
    };
    let fitted = compute_display_size(descriptor.size(), ctx.max_size());
    debug!(
        src,
        width,
        height,
        display_width = fitted.0,
        display_height = fitted.1,
        "remote image"
    );

    let size = if settings.resize {
        fitted
    } else {
        descriptor.size()
    };
    set_size(fragment, img, size);
    Ok(())
}

/// Upload a local image (or its resized copy) and point `src` at it.
/// Returns the public URL.
async fn process_local(
    fragment: &mut HtmlFragment,
    img: NodeId,
    src: &str,
    ctx: &ProcessContext<'_>,
    uploader: &MediaUploader<'_>,
) -> Result<String> {
    let settings = &ctx.config.image;
    let path = ctx.doc_dir.join(src);
    if !path.is_file() {
        return Err(PublishError::LocalFileMissing(path));
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let image_slug = ctx.config.media.attached_image_slug(&stem, ctx.post_slug);

    let sizes = if settings.resize || settings.add_size_attributes {
        let natural = probe_local(&path)?;
        Some((natural, compute_display_size(natural, ctx.max_size())))
    } else {
        None
    };

    let item = match sizes {
        Some((natural, fitted)) if settings.resize && fitted != natural => {
            let thumbnail = thumbnail_path(&path, fitted);
            write_thumbnail(&path, &thumbnail, fitted, settings)?;
            let slug = ctx
                .config
                .media
                .thumbnail_slug(&image_slug, fitted.0, fitted.1);
            debug!(src, width = fitted.0, height = fitted.1, %slug, "uploading resized image");
            uploader.upload_or_reuse(&slug, &thumbnail).await?
        }
        _ => {
            debug!(src, slug = %image_slug, "uploading image");
            uploader.upload_or_reuse(&image_slug, &path).await?
        }
    };
    let url = uploader.public_url(&item)?;

    fragment.dom_mut().set_attr(img, "src", url.as_str());
    if let Some((natural, fitted)) = sizes {
        set_size(fragment, img, if settings.resize { fitted } else { natural });
    }
    Ok(url)
}

fn set_size(fragment: &mut HtmlFragment, img: NodeId, (width, height): Size) {
    let dom = fragment.dom_mut();
    dom.set_attr(img, "width", width.to_string());
    dom.set_attr(img, "height", height.to_string());
}

/// Local path an image source resolves to; `None` for remote or empty sources
pub fn local_path(doc_dir: &Path, src: &str) -> Option<std::path::PathBuf> {
    let src = src.trim();
    (!src.is_empty() && !is_remote(src)).then(|| doc_dir.join(src))
}
