//! HTML post-processing passes.
//!
//! Each pass snapshots its matching elements before mutating, so rewriting
//! one element never changes which elements the pass visits.

pub mod code;
pub mod images;
pub mod link_card;

use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::html::HtmlFragment;
use crate::image::Size;
use crate::remote::{RemoteApi, WebFetcher};

pub use code::{annotate_code_blocks, CodeLabel};
pub use images::process_images;
pub use link_card::{fetch_link_card, insert_link_cards, LinkCardData, LinkCardError};

/// What the passes need from the surrounding publish run
pub struct ProcessContext<'a> {
    pub config: &'a Config,
    pub api: &'a dyn RemoteApi,
    pub fetcher: &'a dyn WebFetcher,
    /// Directory local image sources resolve against
    pub doc_dir: &'a Path,
    pub post_slug: &'a str,
}

impl ProcessContext<'_> {
    pub fn max_size(&self) -> Size {
        (self.config.image.max_width, self.config.image.max_height)
    }
}

/// Run the image, code and link card passes over rendered HTML
pub async fn post_process(html: &str, ctx: &ProcessContext<'_>) -> Result<String> {
    let mut fragment = HtmlFragment::parse(html);

    debug!("image pass");
    process_images(&mut fragment, ctx).await?;

    debug!("code pass");
    annotate_code_blocks(&mut fragment);

    if ctx.config.link_card.enabled {
        debug!("link card pass");
        insert_link_cards(&mut fragment, ctx).await;
    }

    Ok(fragment.to_html())
}

/// Code pass alone, for local previews
pub fn annotate_code_html(html: &str) -> String {
    let mut fragment = HtmlFragment::parse(html);
    annotate_code_blocks(&mut fragment);
    fragment.to_html()
}
