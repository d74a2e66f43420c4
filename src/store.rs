//! Flat JSON metadata store.
//!
//! Records are kept oldest-first on disk in a single pretty-printed array.
//! Every write rewrites the whole file through a temporary sibling and a
//! rename. Writes work on the raw records, so entries this version cannot
//! read and fields it does not know survive untouched.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::photos::{self, Photo, record_id};

/// Partial edit of a photo record; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub series: Option<String>,
}

impl PhotoUpdate {
    fn apply(self, record: &mut Value) -> Result<()> {
        let Value::Object(fields) = record else {
            return Err(Error::Other("photo record is not an object".to_string()));
        };

        for (key, value) in [
            ("title", self.title),
            ("category", self.category),
            ("series", self.series),
        ] {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All readable records in on-disk (oldest-first) order. A missing file
    /// is empty.
    pub fn load(&self) -> Result<Vec<Photo>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path)?;
        photos::parse_collection(&bytes)
    }

    /// The collection as served to the front end.
    pub fn list_newest_first(&self) -> Result<Vec<Photo>> {
        let mut photos = self.load()?;
        photos.reverse();
        Ok(photos)
    }

    /// Every record id on disk, unreadable records included.
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self.load_records()?.iter().filter_map(record_id).collect())
    }

    pub fn insert(&self, photo: Photo) -> Result<()> {
        let mut records = self.load_records()?;
        tracing::debug!(id = %photo.id, total = records.len() + 1, "inserting photo");
        records.push(serde_json::to_value(photo)?);
        self.save(&records)
    }

    pub fn update(&self, id: &str, update: PhotoUpdate) -> Result<Photo> {
        let mut records = self.load_records()?;
        let position = find(&records, id)?;

        update.apply(&mut records[position])?;
        let updated: Photo = serde_json::from_value(records[position].clone())?;

        self.save(&records)?;
        tracing::debug!(id, "updated photo");
        Ok(updated)
    }

    /// Remove a record and return it. The record may be one `load` skips.
    pub fn remove(&self, id: &str) -> Result<Option<Photo>> {
        let mut records = self.load_records()?;
        let position = find(&records, id)?;

        let removed = records.remove(position);
        self.save(&records)?;
        tracing::debug!(id, remaining = records.len(), "removed photo");
        Ok(serde_json::from_value(removed).ok())
    }

    fn load_records(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path)?;
        photos::parse_records(&bytes)
    }

    fn save(&self, records: &[Value]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

fn find(records: &[Value], id: &str) -> Result<usize> {
    records
        .iter()
        .position(|r| record_id(r).as_deref() == Some(id))
        .ok_or_else(|| Error::PhotoNotFound { id: id.to_string() })
}
