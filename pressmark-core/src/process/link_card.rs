//! Link card pass: standalone links become preview cards.
//!
//! A link is standalone when it is the only child node of its paragraph.
//! The target page's Open Graph metadata fills the card. Failures leave the
//! link as it was.

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use super::ProcessContext;
use crate::html::{escape_attr, escape_text, parse_html, HtmlFragment, NodeId};
use crate::remote::{RemoteError, WebFetcher};

#[derive(Error, Debug)]
pub enum LinkCardError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Fetch(#[from] RemoteError),

    #[error("Page has no og:title")]
    MissingTitle,
}

/// Preview data for one link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCardData {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Origin shown in the card footer, e.g. `https://example.com`
    pub domain: String,
    pub host: String,
}

impl LinkCardData {
    /// Card markup; the favicon comes from `favicon_service` + host
    pub fn to_html(&self, favicon_service: &str) -> String {
        let url = escape_attr(&self.url);
        let figure = self
            .image_url
            .as_deref()
            .map(|image| {
                format!(
                    concat!(
                        r#"<figure class="blogcard-thumbnail internal-blogcard-thumbnail">"#,
                        r#"<img src="{}" alt="" class="internal-blogcard-thumb-image" width="160" height="90" loading="lazy" decoding="async">"#,
                        r#"</figure>"#
                    ),
                    escape_attr(image)
                )
            })
            .unwrap_or_default();
        let favicon = format!("{}{}", favicon_service, self.host);

        format!(
            concat!(
                r#"<a href="{url}" title="{title_attr}" class="blogcard-wrap internal-blogcard-wrap a-wrap cf">"#,
                r#"<div class="blogcard internal-blogcard ib-left cf">"#,
                r#"<div class="blogcard-label internal-blogcard-label"><span class="fa"></span></div>"#,
                r#"{figure}"#,
                r#"<div class="blogcard-content internal-blogcard-content">"#,
                r#"<div class="blogcard-title internal-blogcard-title">{title}</div>"#,
                r#"<div class="blogcard-snippet internal-blogcard-snippet">{description}</div>"#,
                r#"</div>"#,
                r#"<div class="blogcard-footer internal-blogcard-footer cf">"#,
                r#"<div class="blogcard-site internal-blogcard-site">"#,
                r#"<div class="blogcard-favicon internal-blogcard-favicon">"#,
                r#"<img src="{favicon}" alt="" class="blogcard-favicon-image internal-blogcard-favicon-image" width="16" height="16" loading="lazy" decoding="async">"#,
                r#"</div>"#,
                r#"<div class="blogcard-domain internal-blogcard-domain">{domain}</div>"#,
                r#"</div></div></div></a>"#
            ),
            url = url,
            title_attr = escape_attr(&self.title),
            figure = figure,
            title = escape_text(&self.title),
            description = escape_text(self.description.as_deref().unwrap_or("")),
            favicon = escape_attr(&favicon),
            domain = escape_text(&self.domain),
        )
    }
}

/// Fetch `href` and read its Open Graph title, description and image
pub async fn fetch_link_card(
    fetcher: &dyn WebFetcher,
    href: &str,
) -> Result<LinkCardData, LinkCardError> {
    let url = Url::parse(href).map_err(|e| LinkCardError::InvalidUrl(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(LinkCardError::UnsupportedScheme(url.scheme().to_string()));
    }

    let page = fetcher.fetch_text(href).await?;
    let dom = parse_html(&page);

    let mut title = None;
    let mut description = None;
    let mut image_url = None;
    for meta in dom.elements_by_tag(dom.document(), "meta") {
        let (Some(property), Some(content)) =
            (dom.get_attr(meta, "property"), dom.get_attr(meta, "content"))
        else {
            continue;
        };
        let slot = match property {
            "og:title" => &mut title,
            "og:description" => &mut description,
            "og:image" => &mut image_url,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(content.to_string());
        }
    }

    Ok(LinkCardData {
        url: href.to_string(),
        title: title.ok_or(LinkCardError::MissingTitle)?,
        description,
        image_url,
        domain: url.origin().ascii_serialization(),
        host: url.host_str().unwrap_or_default().to_string(),
    })
}

/// Replace every standalone link with a card
pub async fn insert_link_cards(fragment: &mut HtmlFragment, ctx: &ProcessContext<'_>) {
    for anchor in fragment.select("a") {
        let Some(href) = standalone_href(fragment, anchor) else {
            continue;
        };

        match fetch_link_card(ctx.fetcher, &href).await {
            Ok(card) => {
                debug!(%href, title = %card.title, "link card");
                let html = card.to_html(&ctx.config.link_card.favicon_service);
                fragment.replace_with_html(anchor, &html);
            }
            Err(e) => warn!(%href, error = %e, "leaving link without a card"),
        }
    }
}

/// `href` of an anchor that is the only child node of a `<p>`
fn standalone_href(fragment: &HtmlFragment, anchor: NodeId) -> Option<String> {
    let dom = fragment.dom();
    let parent = dom.parent(anchor)?;
    if dom.tag_name(parent) != Some("p") || dom.children(parent).count() != 1 {
        return None;
    }
    dom.get_attr(anchor, "href").map(str::to_string)
}
