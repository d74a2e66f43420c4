//! Photo library: metadata store plus the uploads directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::config::{Site, UploadConfig};
use crate::error::{Error, Result};
use crate::photos::{Exif, Photo};
use crate::processing;
use crate::store::{PhotoUpdate, Store};

/// URL prefix uploads are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Caller-supplied details for a new upload. Blank values fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub title: Option<String>,
    pub category: Option<String>,
    pub series: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Library {
    store: Store,
    uploads_dir: PathBuf,
    upload: UploadConfig,
}

impl Library {
    pub fn new(store: Store, uploads_dir: PathBuf, upload: UploadConfig) -> Self {
        Self {
            store,
            uploads_dir,
            upload,
        }
    }

    /// Library rooted at `site_dir` as configured by site.toml.
    pub fn for_site(site_dir: &Path, site: &Site) -> Self {
        Self::new(
            Store::new(site_dir.join(&site.data)),
            site_dir.join(&site.uploads),
            site.upload.clone(),
        )
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.upload.max_bytes
    }

    /// Process an uploaded image and record it.
    ///
    /// EXIF extraction failure is not fatal; optimization failure is and
    /// leaves nothing behind.
    pub fn add(&self, data: &[u8], details: NewPhoto) -> Result<Photo> {
        if data.is_empty() {
            return Err(Error::EmptyUpload);
        }
        if data.len() as u64 > self.upload.max_bytes {
            return Err(Error::UploadTooLarge {
                limit: self.upload.max_bytes,
            });
        }

        let exif = processing::extract_exif(data).unwrap_or_else(|| {
            tracing::warn!("EXIF extraction failed, continuing upload");
            Exif::default()
        });

        let optimized =
            processing::optimize(data, self.upload.max_width, self.upload.quality)?;

        let taken = self.store.ids()?;
        let now = Utc::now();
        let mut millis = now.timestamp_millis();
        while taken.contains(&millis.to_string()) {
            millis += 1;
        }

        let filename = format!("opt_{}.jpg", millis);
        fs::create_dir_all(&self.uploads_dir)?;
        let file_path = self.uploads_dir.join(&filename);
        fs::write(&file_path, &optimized)?;

        let photo = Photo {
            id: millis.to_string(),
            url: format!("{}{}", UPLOADS_URL_PREFIX, filename),
            category: Some(
                non_blank(details.category)
                    .unwrap_or_else(|| self.upload.default_category.clone()),
            ),
            title: non_blank(details.title)
                .unwrap_or_else(|| self.upload.default_title.clone()),
            series: details.series.unwrap_or_default().trim().to_string(),
            date: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            exif: Some(exif),
        };

        if let Err(e) = self.store.insert(photo.clone()) {
            let _ = fs::remove_file(&file_path);
            return Err(e);
        }

        tracing::info!(
            id = %photo.id,
            url = %photo.url,
            bytes = optimized.len(),
            "photo added"
        );

        Ok(photo)
    }

    pub fn edit(&self, id: &str, update: PhotoUpdate) -> Result<Photo> {
        let photo = self.store.update(id, update)?;
        tracing::info!(id, "photo updated");
        Ok(photo)
    }

    /// Remove the record, then its stored file. A file that cannot be
    /// unlinked is left behind with a warning; the record is already gone.
    pub fn remove(&self, id: &str) -> Result<Option<Photo>> {
        let photo = self.store.remove(id)?;

        if let Some(path) = photo.as_ref().and_then(|p| self.upload_path(&p.url)) {
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed upload"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove upload")
                }
            }
        }

        tracing::info!(id, "photo removed");
        Ok(photo)
    }

    /// Resolve an `/uploads/{file}` URL to a path inside the uploads directory.
    pub fn upload_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOADS_URL_PREFIX)?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.uploads_dir.join(name))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
