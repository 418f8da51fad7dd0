//! Local asset report for a document.
//!
//! Lists the local images the rendered body references (and whether each
//! exists) alongside every image file under the document's directory (and
//! whether the body uses it). No network access.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;
use crate::frontmatter::SourceDocument;
use crate::html::HtmlFragment;
use crate::markdown::MarkdownRenderer;
use crate::process::images::local_path;

/// Extensions of files listed from the document directory
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "gif"];

/// A local image referenced from the body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencedImage {
    /// Path relative to the document directory
    pub file: String,
    pub path: PathBuf,
    pub exists: bool,
}

/// An image file found under the document directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceImage {
    pub file: String,
    pub path: PathBuf,
    pub referenced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub dir: PathBuf,
    pub referenced: Vec<ReferencedImage>,
    pub workspace: Vec<WorkspaceImage>,
}

impl CheckReport {
    pub fn missing_count(&self) -> usize {
        self.referenced.iter().filter(|r| !r.exists).count()
    }

    pub fn unreferenced_count(&self) -> usize {
        self.workspace.iter().filter(|w| !w.referenced).count()
    }

    /// Plain text rendering for the terminal
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let found = self.referenced.len() - self.missing_count();
        let used = self.workspace.len() - self.unreferenced_count();

        let _ = writeln!(out, "Directory: {}", self.dir.display());
        let _ = writeln!(
            out,
            "Referenced images: {} found, {} missing",
            found,
            self.missing_count()
        );
        let _ = writeln!(
            out,
            "Workspace images: {} referenced, {} unreferenced",
            used,
            self.unreferenced_count()
        );

        out.push_str("\nReferenced\n");
        for image in &self.referenced {
            let mark = if image.exists { "ok" } else { "missing" };
            let _ = writeln!(out, "  {:<8} {}", mark, image.file);
        }

        out.push_str("\nWorkspace\n");
        for image in &self.workspace {
            let mark = if image.referenced { "used" } else { "unused" };
            let _ = writeln!(out, "  {:<8} {}", mark, image.file);
        }
        out
    }
}

/// Build the asset report for `doc`
pub fn check_document(doc: &SourceDocument, renderer: &MarkdownRenderer) -> Result<CheckReport> {
    let parsed = doc.parse()?;
    let dir = doc.dir().to_path_buf();
    let base = normalize(&dir);
    let fragment = HtmlFragment::parse(&renderer.render(&parsed.body));

    let referenced: Vec<ReferencedImage> = fragment
        .select("img")
        .into_iter()
        .filter_map(|img| fragment.dom().get_attr(img, "src"))
        .filter_map(|src| local_path(&dir, src))
        .map(|path| {
            let path = normalize(&path);
            ReferencedImage {
                file: relative(&path, &base),
                exists: path.is_file(),
                path,
            }
        })
        .collect();

    let root = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir.as_path()
    };
    let workspace = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e))
        })
        .map(|entry| {
            let path = normalize(entry.path());
            WorkspaceImage {
                file: relative(&path, &base),
                referenced: referenced.iter().any(|r| r.path == path),
                path,
            }
        })
        .collect();

    Ok(CheckReport {
        dir,
        referenced,
        workspace,
    })
}

/// Drop `.` components so joined and walked paths compare equal
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn relative(path: &Path, dir: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
