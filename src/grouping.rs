//! Gallery page render order.
//!
//! Photos are bucketed by category (priority categories first, then the rest
//! alphabetically) and by named series. The flattened order of all emitted
//! groups is the index space the lightbox navigates on the gallery page.

use std::collections::HashMap;

use serde::Serialize;

use crate::lightbox::IndexSpace;
use crate::photos::Photo;

/// Categories shown first, in this order, with their section titles.
pub const PRIORITY_CATEGORIES: [(&str, &str); 3] = [
    ("nature", "Nature 自然"),
    ("urban", "Urban 城市"),
    ("portrait", "Portrait 人像"),
];

/// Heading painted between category groups and series groups.
pub const SERIES_HEADING: &str = "Featured Collections 精选系列";

const SERIES_TITLE_PREFIX: &str = "· ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Category,
    Series,
}

/// A titled, ordered bucket of photos painted as one section.
#[derive(Debug, Clone, Serialize)]
pub struct RenderGroup {
    pub title: String,
    pub kind: GroupKind,
    /// Position of the group's first photo in [`GalleryLayout::ordered`]
    pub start: usize,
    pub photos: Vec<Photo>,
}

/// Render groups for the gallery page plus the flattened render order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GalleryLayout {
    pub categories: Vec<RenderGroup>,
    pub series: Vec<RenderGroup>,
    /// Every emitted group's photos concatenated in emission order
    pub ordered: Vec<Photo>,
}

impl GalleryLayout {
    /// Group photos into render order. Input order is preserved inside groups.
    pub fn build(photos: &[Photo]) -> Self {
        let mut by_category: HashMap<String, Vec<Photo>> = HashMap::new();
        let mut series_index: HashMap<&str, usize> = HashMap::new();
        let mut by_series: Vec<(&str, Vec<Photo>)> = Vec::new();

        for photo in photos {
            by_category
                .entry(photo.category_key())
                .or_default()
                .push(photo.clone());

            if let Some(name) = photo.series_name() {
                let slot = *series_index.entry(name).or_insert_with(|| {
                    by_series.push((name, Vec::new()));
                    by_series.len() - 1
                });
                by_series[slot].1.push(photo.clone());
            }
        }

        let mut layout = GalleryLayout::default();

        for (key, title) in PRIORITY_CATEGORIES {
            if let Some(group) = by_category.remove(key) {
                layout.push(title.to_string(), GroupKind::Category, group);
            }
        }

        let mut leftovers: Vec<(String, Vec<Photo>)> = by_category
            .into_iter()
            .map(|(key, group)| (capitalize(&key), group))
            .collect();
        leftovers.sort_by(|a, b| a.0.cmp(&b.0));

        for (title, group) in leftovers {
            layout.push(title, GroupKind::Category, group);
        }

        for (name, group) in by_series {
            layout.push(format!("{}{}", SERIES_TITLE_PREFIX, name), GroupKind::Series, group);
        }

        tracing::debug!(
            categories = layout.categories.len(),
            series = layout.series.len(),
            ordered = layout.ordered.len(),
            "built gallery layout"
        );

        layout
    }

    fn push(&mut self, title: String, kind: GroupKind, photos: Vec<Photo>) {
        if photos.is_empty() {
            return;
        }

        let group = RenderGroup {
            title,
            kind,
            start: self.ordered.len(),
            photos,
        };
        self.ordered.extend(group.photos.iter().cloned());

        match kind {
            GroupKind::Category => self.categories.push(group),
            GroupKind::Series => self.series.push(group),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// All groups in emission order.
    #[cfg(test)]
    pub fn groups(&self) -> impl Iterator<Item = &RenderGroup> {
        self.categories.iter().chain(self.series.iter())
    }

    /// Heading to paint before the series groups, if there are any.
    pub fn series_heading(&self) -> Option<&'static str> {
        (!self.series.is_empty()).then_some(SERIES_HEADING)
    }
}

impl IndexSpace for GalleryLayout {
    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn get(&self, index: usize) -> Option<&Photo> {
        self.ordered.get(index)
    }
}

/// Upper-case the first letter, keep the rest as-is.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
