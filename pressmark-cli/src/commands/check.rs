//! Local image report for a document.

use anyhow::{Context, Result};
use pressmark_core::{MarkdownRenderer, SourceDocument};
use std::path::Path;

pub fn check_document(file: &Path, json: bool) -> Result<()> {
    let doc = SourceDocument::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let report = pressmark_core::check_document(&doc, &MarkdownRenderer::new())
        .with_context(|| format!("Failed to check {}", file.display()))?;

    if json {
        let payload = serde_json::to_string_pretty(&report)?;
        println!("{}", payload);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
