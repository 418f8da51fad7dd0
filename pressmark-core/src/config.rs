//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::slug::slugify;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Main configuration struct matching the pressmark.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Front matter keys whose values are slug lists resolved against the
    /// collection of the same name
    #[serde(default = "default_slug_keys")]
    pub slug_keys: Vec<String>,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub link_card: LinkCardConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

fn default_slug_keys() -> Vec<String> {
    vec!["categories".to_string(), "tags".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root, e.g. `https://blog.example.com`
    pub url: String,

    #[serde(default = "default_api_path")]
    pub api_path: String,
}

fn default_api_path() -> String {
    String::from("wp-json/wp/v2")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Candidate extensions for the featured image, in lookup order
    #[serde(default = "default_media_extensions")]
    pub extensions: Vec<String>,

    /// Extension (with leading dot) to MIME type
    #[serde(default = "default_media_types")]
    pub types: HashMap<String, String>,

    #[serde(default = "default_attached_slug")]
    pub attached_slug: String,

    #[serde(default = "default_featured_slug")]
    pub featured_slug: String,

    #[serde(default = "default_thumbnail_slug")]
    pub thumbnail_slug: String,

    #[serde(default)]
    pub url_rewrite: Option<UrlRewrite>,

    #[serde(default)]
    pub default_featured_id: Option<u64>,
}

fn default_media_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_media_types() -> HashMap<String, String> {
    [
        (".jpg", "image/jpeg"),
        (".jpeg", "image/jpeg"),
        (".png", "image/png"),
        (".gif", "image/gif"),
        (".webp", "image/webp"),
        (".svg", "image/svg+xml"),
    ]
    .iter()
    .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
    .collect()
}

fn default_attached_slug() -> String {
    String::from("{post}-{image}")
}

fn default_featured_slug() -> String {
    String::from("{post}-featured-image")
}

fn default_thumbnail_slug() -> String {
    String::from("{slug}-{width}x{height}")
}

/// Prefix replacement applied to uploaded media URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRewrite {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// 0 leaves the axis unconstrained
    #[serde(default)]
    pub max_width: u32,

    #[serde(default)]
    pub max_height: u32,

    #[serde(default)]
    pub resize: bool,

    #[serde(default)]
    pub add_size_attributes: bool,

    #[serde(default)]
    pub add_title_attribute: bool,

    #[serde(default)]
    pub linkable: bool,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default)]
    pub png_palette: bool,
}

fn default_jpeg_quality() -> u8 {
    80
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Favicon endpoint; the link's domain is appended
    #[serde(default = "default_favicon_service")]
    pub favicon_service: String,
}

fn default_favicon_service() -> String {
    String::from("https://www.google.com/s2/favicons?domain=")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bytes requested when probing remote image dimensions
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_probe_bytes() -> usize {
    64 * 1024
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.site.url.trim().is_empty() {
            return Err(ConfigError::MissingField("site.url".to_string()));
        }
        Ok(config)
    }

    /// Minimal configuration pointing at `site_url` with every default
    pub fn for_site(site_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                url: site_url.into(),
                api_path: default_api_path(),
            },
            auth: AuthConfig::default(),
            slug_keys: default_slug_keys(),
            media: MediaConfig::default(),
            image: ImageConfig::default(),
            link_card: LinkCardConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// REST endpoint base, e.g. `https://example.com/wp-json/wp/v2`
    pub fn api_base(&self) -> String {
        format!(
            "{}/{}",
            self.site.url.trim_end_matches('/'),
            self.site.api_path.trim_matches('/')
        )
    }
}

impl MediaConfig {
    /// Slug for an image referenced from a post body
    pub fn attached_image_slug(&self, image_stem: &str, post_slug: &str) -> String {
        slugify(
            &self
                .attached_slug
                .replace("{post}", post_slug)
                .replace("{image}", image_stem),
        )
    }

    /// Slug for a resized copy of an attached image
    pub fn thumbnail_slug(&self, image_slug: &str, width: u32, height: u32) -> String {
        slugify(
            &self
                .thumbnail_slug
                .replace("{slug}", image_slug)
                .replace("{width}", &width.to_string())
                .replace("{height}", &height.to_string()),
        )
    }

    /// Slug for a post's featured image
    pub fn featured_image_slug(&self, post_slug: &str) -> String {
        slugify(&self.featured_slug.replace("{post}", post_slug))
    }

    /// MIME type for an extension given with or without its leading dot
    pub fn media_type(&self, ext: &str) -> String {
        let key = format!(".{}", ext.trim_start_matches('.').to_lowercase());
        self.types
            .get(&key)
            .cloned()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    /// Apply the configured URL rewrite to an uploaded media URL
    pub fn rewrite_url(&self, url: &str) -> String {
        match &self.url_rewrite {
            Some(rule) if !rule.from.is_empty() && url.starts_with(&rule.from) => {
                format!("{}{}", rule.to, &url[rule.from.len()..])
            }
            _ => url.to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            extensions: default_media_extensions(),
            types: default_media_types(),
            attached_slug: default_attached_slug(),
            featured_slug: default_featured_slug(),
            thumbnail_slug: default_thumbnail_slug(),
            url_rewrite: None,
            default_featured_id: None,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 0,
            max_height: 0,
            resize: false,
            add_size_attributes: false,
            add_title_attribute: false,
            linkable: false,
            jpeg_quality: default_jpeg_quality(),
            png_palette: false,
        }
    }
}

impl Default for LinkCardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            favicon_service: default_favicon_service(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            probe_bytes: default_probe_bytes(),
        }
    }
}
