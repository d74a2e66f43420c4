use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::i18n;

/// Password used when site.toml does not set one.
pub const DEFAULT_PASSWORD: &str = "admin";

/// Upload handling settings (`[upload]` table).
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Optimized images are downscaled to at most this width (never enlarged)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// JPEG quality (1-100) of optimized images
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Category stored when an upload does not name one
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Title stored when an upload does not name one
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            quality: default_quality(),
            max_bytes: default_max_bytes(),
            default_category: default_category(),
            default_title: default_title(),
        }
    }
}

/// Site configuration loaded from site.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    /// Site title shown in page headers
    #[serde(default = "default_site_title")]
    pub title: String,

    /// Admin password
    #[serde(default = "default_password")]
    pub password: String,

    /// Flat JSON metadata file (relative to site root)
    #[serde(default = "default_data")]
    pub data: PathBuf,

    /// Directory of static files served as-is (relative to site root)
    #[serde(default = "default_public")]
    pub public: PathBuf,

    /// Directory optimized uploads are written to (relative to site root)
    #[serde(default = "default_uploads")]
    pub uploads: PathBuf,

    /// Theme: a local directory, or "default" for the built-in theme
    #[serde(default = "default_theme")]
    pub theme: String,

    /// UI language code ("en" or "zh_CN")
    #[serde(default = "default_language")]
    pub language: String,

    /// strftime pattern for lightbox dates
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Whether to minify rendered HTML (defaults to true)
    #[serde(default = "default_minify")]
    pub minify: bool,

    #[serde(default)]
    pub upload: UploadConfig,
}

impl Site {
    /// Load and validate site.toml. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let site: Site = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(path = %path.display(), "no site config found, using defaults");
            toml::from_str("")?
        };

        site.validate()?;

        if site.password == DEFAULT_PASSWORD {
            tracing::warn!("admin password is the default, set `password` in site config");
        }

        Ok(site)
    }

    pub fn validate(&self) -> Result<()> {
        validate_date_format(&self.date_format)?;

        if !(1..=100).contains(&self.upload.quality) {
            return Err(Error::Other(format!(
                "upload.quality must be between 1 and 100, got {}",
                self.upload.quality
            )));
        }

        if self.upload.max_width == 0 {
            return Err(Error::Other("upload.max_width must be positive".to_string()));
        }

        if !i18n::is_supported(&self.language) {
            tracing::warn!(
                language = %self.language,
                fallback = i18n::DEFAULT_LANGUAGE,
                "unsupported language"
            );
        }

        Ok(())
    }
}

/// Reject strftime patterns chrono cannot format (formatting them would panic).
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::Other(format!("invalid date_format: {:?}", format)));
    }
    Ok(())
}

fn default_site_title() -> String {
    "Folio".to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_data() -> PathBuf {
    PathBuf::from("data/db.json")
}

fn default_public() -> PathBuf {
    PathBuf::from("public")
}

fn default_uploads() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_language() -> String {
    "zh_CN".to_string()
}

fn default_date_format() -> String {
    "%Y/%-m/%-d".to_string()
}

fn default_minify() -> bool {
    true
}

fn default_max_width() -> u32 {
    2500
}

fn default_quality() -> u8 {
    85
}

fn default_max_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_category() -> String {
    crate::photos::FALLBACK_CATEGORY.to_string()
}

fn default_title() -> String {
    "Untitled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let site: Site = toml::from_str("").unwrap();

        assert_eq!(site.title, "Folio");
        assert_eq!(site.password, "admin");
        assert_eq!(site.data, PathBuf::from("data/db.json"));
        assert_eq!(site.public, PathBuf::from("public"));
        assert_eq!(site.uploads, PathBuf::from("public/uploads"));
        assert_eq!(site.theme, "default");
        assert_eq!(site.language, "zh_CN");
        assert!(site.minify);
        assert_eq!(site.upload.max_width, 2500);
        assert_eq!(site.upload.quality, 85);
        assert_eq!(site.upload.default_category, "other");
        assert_eq!(site.upload.default_title, "Untitled");
        site.validate().unwrap();
    }

    #[test]
    fn full_config() {
        let toml = r#"
            title = "Light & Shadow"
            password = "hunter2"
            data = "meta/photos.json"
            uploads = "public/img"
            theme = "themes/dark"
            language = "en"
            date_format = "%d.%m.%Y"
            minify = false

            [upload]
            max_width = 1600
            quality = 70
            default_category = "nature"
        "#;
        let site: Site = toml::from_str(toml).unwrap();

        assert_eq!(site.title, "Light & Shadow");
        assert_eq!(site.password, "hunter2");
        assert_eq!(site.data, PathBuf::from("meta/photos.json"));
        assert_eq!(site.uploads, PathBuf::from("public/img"));
        assert_eq!(site.theme, "themes/dark");
        assert_eq!(site.language, "en");
        assert!(!site.minify);
        assert_eq!(site.upload.max_width, 1600);
        assert_eq!(site.upload.quality, 70);
        assert_eq!(site.upload.max_bytes, 25 * 1024 * 1024);
        assert_eq!(site.upload.default_category, "nature");
        site.validate().unwrap();
    }

    #[test]
    fn invalid_date_format_fails_validation() {
        let site: Site = toml::from_str(r#"date_format = "%Y-%Q""#).unwrap();
        assert!(site.validate().is_err());
    }

    #[test]
    fn quality_out_of_range_fails_validation() {
        let site: Site = toml::from_str("[upload]\nquality = 0").unwrap();
        assert!(site.validate().is_err());
    }

    #[test]
    fn unknown_field_type_fails() {
        let result: std::result::Result<Site, _> = toml::from_str("minify = \"yes\"");
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::load(&dir.path().join("site.toml")).unwrap();
        assert_eq!(site.title, "Folio");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, "title = \"Mine\"\n").unwrap();

        let site = Site::load(&path).unwrap();
        assert_eq!(site.title, "Mine");
    }
}
