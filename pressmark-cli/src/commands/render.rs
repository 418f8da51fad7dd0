//! Local preview rendering.

use anyhow::{Context, Result};
use pressmark_core::pipeline::render_local;
use pressmark_core::{MarkdownRenderer, SourceDocument};
use std::path::Path;

/// Print the body HTML after the code pass only. Never touches the network.
pub fn render_document(file: &Path) -> Result<()> {
    let doc = SourceDocument::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed = doc
        .parse()
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    print!("{}", render_local(&MarkdownRenderer::new(), &parsed.body));
    Ok(())
}
