//! Publish a document to the configured site.

use anyhow::{Context, Result};
use pressmark_core::{Config, Publisher, RestClient};
use pressmark_types::RemoteItem;
use std::path::Path;

/// Load the config, apply the password override and publish `file`.
pub async fn post_document(config_path: &Path, file: &Path, password: Option<String>) -> Result<()> {
    let mut config = Config::from_file(config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_path.display()
        )
    })?;
    if let Some(password) = password {
        config.auth.password = password;
    }

    let client = RestClient::new(&config).context("Failed to create HTTP client")?;
    let item = Publisher::new(&config, &client, &client)
        .publish_file(file)
        .await
        .with_context(|| format!("Failed to publish {}", file.display()))?;

    println!("{}", summary(&item));
    Ok(())
}

fn summary(item: &RemoteItem) -> String {
    match &item.link {
        Some(link) => format!("Published post {} ({}): {}", item.id, item.slug, link),
        None => format!("Published post {} ({})", item.id, item.slug),
    }
}
