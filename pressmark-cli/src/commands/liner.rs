//! Single-line escaping of stdin.

use anyhow::{Context, Result};
use std::io::Read;

/// Collapse `text` into one line: CRLF becomes LF, then every LF becomes the
/// two characters `\n`. With `html`, double quotes become `\"` as well.
pub fn to_single_line(text: &str, html: bool) -> String {
    let line = text.replace("\r\n", "\n").replace('\n', "\\n");
    if html {
        line.replace('"', "\\\"")
    } else {
        line
    }
}

pub fn liner(html: bool) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    print!("{}", to_single_line(&input, html));
    Ok(())
}
