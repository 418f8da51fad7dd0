use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn pressmark() -> Command {
    Command::cargo_bin("pressmark").expect("binary exists")
}

#[test]
fn liner_escapes_newlines() {
    pressmark()
        .arg("liner")
        .write_stdin("first\r\nsecond\n")
        .assert()
        .success()
        .stdout("first\\nsecond\\n");
}

#[test]
fn liner_html_escapes_quotes() {
    pressmark()
        .args(["liner", "--html"])
        .write_stdin("<p class=\"x\">\n</p>")
        .assert()
        .success()
        .stdout("<p class=\\\"x\\\">\\n</p>");
}

#[test]
fn render_prints_annotated_html() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("post.md");
    fs::write(
        &doc,
        "---\ntitle: Preview\ntags: [unresolved]\n---\n# Hi\n\n```rust:src/lib.rs\nfn a() {}\n```\n",
    )?;

    pressmark()
        .current_dir(dir.path())
        .arg("render")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Hi</h1>"))
        .stdout(predicate::str::contains(
            r#"<pre data-file="src/lib.rs" data-label="src/lib.rs" data-lang="rust">"#,
        ))
        .stdout(predicate::str::contains(
            r#"<code class="language-rust line-numbers">"#,
        ));
    Ok(())
}

#[test]
fn render_rejects_non_markdown() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("notes.txt");
    fs::write(&doc, "plain")?;

    pressmark()
        .arg("render")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
    Ok(())
}

#[test]
fn check_reports_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("used.png"), b"png")?;
    fs::write(dir.path().join("stale.jpg"), b"jpg")?;
    let doc = dir.path().join("post.md");
    fs::write(&doc, "![one](used.png)\n\n![two](gone.gif)\n")?;

    let assert = pressmark()
        .args(["check", "--json"])
        .arg(&doc)
        .assert()
        .success();

    let report: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let referenced = report["referenced"].as_array().expect("referenced list");
    assert_eq!(referenced.len(), 2);
    assert_eq!(referenced[0]["file"], "used.png");
    assert_eq!(referenced[0]["exists"], true);
    assert_eq!(referenced[1]["exists"], false);

    let workspace = report["workspace"].as_array().expect("workspace list");
    assert_eq!(workspace.len(), 2);
    assert_eq!(workspace[0]["file"], "stale.jpg");
    assert_eq!(workspace[0]["referenced"], false);
    assert_eq!(workspace[1]["file"], "used.png");
    assert_eq!(workspace[1]["referenced"], true);
    Ok(())
}

#[test]
fn check_reports_text() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("post.md");
    fs::write(&doc, "![gone](gone.png)\n")?;

    pressmark()
        .arg("check")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("Referenced images: 0 found, 1 missing"))
        .stdout(predicate::str::contains("missing  gone.png"));
    Ok(())
}

#[test]
fn post_fails_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let doc = dir.path().join("post.md");
    fs::write(&doc, "Body\n")?;

    pressmark()
        .current_dir(dir.path())
        .arg("post")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn post_rejects_config_without_site_url() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("site.yml");
    fs::write(&config, "site:\n  url: \"\"\n")?;
    let doc = dir.path().join("post.md");
    fs::write(&doc, "Body\n")?;

    pressmark()
        .arg("--config")
        .arg(&config)
        .arg("post")
        .arg(&doc)
        .env("PRESSMARK_PASSWORD", "secret")
        .assert()
        .failure()
        .stderr(predicate::str::contains("site.url"));
    Ok(())
}
