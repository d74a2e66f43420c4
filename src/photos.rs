use std::fmt::Write;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Category bucket used by gallery grouping when a photo has none.
pub const FALLBACK_CATEGORY: &str = "other";

/// A single photo record as stored by the backend and served by the
/// collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    /// Opaque unique identifier
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    /// Path to the stored image asset (e.g., "/uploads/opt_1700000000000.jpg")
    pub url: String,

    /// Lowercase tag, absent on records written by older tools
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,

    /// Named series; empty means "no series"
    #[serde(default, deserialize_with = "lenient_text")]
    pub series: String,

    /// ISO-8601 timestamp of the upload
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_exif",
        skip_serializing_if = "Option::is_none"
    )]
    pub exif: Option<Exif>,
}

/// Camera settings recorded at upload time. Any field may be absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exif {
    /// Camera model (e.g., "X100V")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,

    /// Aperture (e.g., "f/2.8")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,

    /// Shutter speed (e.g., "1/250s")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub shutter: Option<String>,

    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// Focal length (e.g., "35mm")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub focal: Option<String>,
}

impl Exif {
    /// Display items in fixed order: camera, lens, aperture, shutter, ISO, focal.
    /// Empty and absent fields are dropped.
    pub fn summary_items(&self) -> Vec<String> {
        let iso = self.iso.filter(|&iso| iso > 0).map(|iso| format!("ISO {}", iso));

        [
            self.camera.clone(),
            self.lens.clone(),
            self.aperture.clone(),
            self.shutter.clone(),
            iso,
            self.focal.clone(),
        ]
        .into_iter()
        .flatten()
        .filter(|item| !item.is_empty())
        .collect()
    }
}

/// What the lightbox metadata panel shows for a photo's EXIF data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum ExifSummary {
    /// No EXIF record at all; rendered as the "no data" placeholder.
    Missing,
    /// Summary items (may be empty when every field was blank).
    Items(Vec<String>),
}

impl ExifSummary {
    pub fn of(photo: &Photo) -> Self {
        match &photo.exif {
            Some(exif) => ExifSummary::Items(exif.summary_items()),
            None => ExifSummary::Missing,
        }
    }
}

impl Photo {
    /// Grouping key: lowercased category, or [`FALLBACK_CATEGORY`].
    pub fn category_key(&self) -> String {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c.to_lowercase(),
            _ => FALLBACK_CATEGORY.to_string(),
        }
    }

    pub fn series_name(&self) -> Option<&str> {
        Some(self.series.as_str()).filter(|s| !s.is_empty())
    }

    /// Format the photo date with a strftime pattern.
    ///
    /// Returns an empty string when the date is absent or unparseable.
    /// Also empty when the pattern asks for fields the date lacks (an offset
    /// on a plain date).
    pub fn display_date(&self, format: &str) -> String {
        let Some(raw) = self.date.as_deref() else {
            return String::new();
        };

        let mut out = String::new();
        let written = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            write!(out, "{}", dt.format(format))
        } else if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            // Plain dates read as midnight; offset fields still fail below
            write!(out, "{}", dt.format(format))
        } else {
            tracing::debug!(id = %self.id, date = raw, "unparseable photo date");
            return String::new();
        };

        match written {
            Ok(()) => out,
            Err(_) => {
                tracing::debug!(id = %self.id, format, "date format not applicable to photo date");
                String::new()
            }
        }
    }
}

/// Decode a collection body into raw records, without interpreting them.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Value>> {
    match serde_json::from_slice(bytes)? {
        Value::Array(records) => Ok(records),
        _ => Err(Error::Other("collection is not a JSON array".to_string())),
    }
}

/// Id of a raw record, numeric ids included.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a collection body (JSON array of photo records).
///
/// Records missing an `id` or `url` are skipped with a warning; malformed
/// optional fields are treated as absent.
pub fn parse_collection(bytes: &[u8]) -> Result<Vec<Photo>> {
    let records = parse_records(bytes)?;

    let mut photos = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Photo>(record) {
            Ok(photo) => photos.push(photo),
            Err(e) => tracing::warn!(position, error = %e, "skipping malformed photo record"),
        }
    }

    Ok(photos)
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid photo id: {}", other))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_string(d)?.unwrap_or_default())
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_exif<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Exif>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_case::test_case;

    /// Build a photo with the given id and category, nothing else set.
    pub(crate) fn photo(id: &str, category: &str) -> Photo {
        Photo {
            id: id.to_string(),
            url: format!("/uploads/{}.jpg", id),
            category: Some(category.to_string()),
            title: format!("Photo {}", id),
            series: String::new(),
            date: None,
            exif: None,
        }
    }

    #[test]
    fn exif_summary_skips_empty_fields() {
        let exif = Exif {
            camera: Some("X100".to_string()),
            lens: Some(String::new()),
            aperture: Some(String::new()),
            shutter: Some("1/200s".to_string()),
            iso: Some(400),
            focal: Some("35mm".to_string()),
        };

        assert_eq!(exif.summary_items(), vec!["X100", "1/200s", "ISO 400", "35mm"]);
    }

    #[test]
    fn exif_summary_full_order() {
        let exif = Exif {
            camera: Some("A7".to_string()),
            lens: Some("FE 50mm".to_string()),
            aperture: Some("f/1.8".to_string()),
            shutter: Some("1/60s".to_string()),
            iso: Some(100),
            focal: Some("50mm".to_string()),
        };

        assert_eq!(
            exif.summary_items(),
            vec!["A7", "FE 50mm", "f/1.8", "1/60s", "ISO 100", "50mm"]
        );
    }

    #[test]
    fn exif_zero_iso_is_absent() {
        let exif = Exif {
            iso: Some(0),
            ..Default::default()
        };
        assert!(exif.summary_items().is_empty());
    }

    #[test]
    fn exif_summary_missing_vs_empty() {
        let mut p = photo("1", "nature");
        assert_eq!(ExifSummary::of(&p), ExifSummary::Missing);

        p.exif = Some(Exif::default());
        assert_eq!(ExifSummary::of(&p), ExifSummary::Items(vec![]));
    }

    #[test_case(Some("Nature"), "nature" ; "lowercased")]
    #[test_case(Some("urban"), "urban" ; "already lowercase")]
    #[test_case(Some(""), "other" ; "empty string")]
    #[test_case(None, "other" ; "absent")]
    fn category_key(category: Option<&str>, expected: &str) {
        let mut p = photo("1", "x");
        p.category = category.map(str::to_string);
        assert_eq!(p.category_key(), expected);
    }

    #[test_case(Some("2024-03-05T10:20:30.000Z"), "2024/3/5" ; "rfc3339")]
    #[test_case(Some("2023-12-31"), "2023/12/31" ; "plain date")]
    #[test_case(Some("yesterday"), "" ; "garbage")]
    #[test_case(None, "" ; "absent")]
    fn display_date(date: Option<&str>, expected: &str) {
        let mut p = photo("1", "nature");
        p.date = date.map(str::to_string);
        assert_eq!(p.display_date("%Y/%-m/%-d"), expected);
    }

    #[test_case("2023-12-31", "%Y-%m-%d %H:%M", "2023-12-31 00:00" ; "plain date with time fields")]
    #[test_case("2023-12-31", "%Y %z", "" ; "plain date with offset field")]
    #[test_case("2024-03-05T10:20:30+08:00", "%Y-%m-%d %H:%M %z", "2024-03-05 10:20 +0800" ; "timestamp keeps own offset")]
    fn display_date_patterns(date: &str, format: &str, expected: &str) {
        let mut p = photo("1", "nature");
        p.date = Some(date.to_string());
        assert_eq!(p.display_date(format), expected);
    }

    #[test]
    fn parse_tolerates_malformed_optional_fields() {
        let body = br#"[
            {"id": "1", "url": "/uploads/a.jpg", "title": "A", "category": "nature",
             "series": null, "date": 42, "exif": "broken"},
            {"id": 2, "url": "/uploads/b.jpg",
             "exif": {"camera": "X100", "iso": "200", "lens": 5}}
        ]"#;

        let photos = parse_collection(body).unwrap();
        assert_eq!(photos.len(), 2);

        assert_eq!(photos[0].series, "");
        assert_eq!(photos[0].series_name(), None);
        assert_eq!(photos[0].date.as_deref(), Some("42"));
        assert_eq!(photos[0].exif, None);

        assert_eq!(photos[1].id, "2");
        assert_eq!(photos[1].title, "");
        assert_eq!(photos[1].category, None);
        let exif = photos[1].exif.as_ref().unwrap();
        assert_eq!(exif.iso, Some(200));
        assert_eq!(exif.lens.as_deref(), Some("5"));
    }

    #[test]
    fn parse_skips_records_without_url() {
        let body = br#"[{"id": "1"}, {"id": "2", "url": "/uploads/2.jpg"}]"#;
        let photos = parse_collection(body).unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].id, "2");
    }

    #[test]
    fn parse_rejects_non_array() {
        assert!(parse_collection(br#"{"photos": []}"#).is_err());
        assert!(parse_collection(b"not json").is_err());
    }

    #[test]
    fn serialize_omits_absent_fields() {
        let p = photo("7", "urban");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["series"], "");
        assert!(json.get("exif").is_none());
        assert!(json.get("date").is_none());
    }
}
