//! Home page category filter and layout toggle.

use std::fmt;

use serde::Serialize;

use crate::lightbox::IndexSpace;
use crate::photos::Photo;

/// Filter value meaning "show everything".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    /// Exact, case-sensitive match against the stored category
    Category(String),
}

impl Filter {
    pub fn parse(value: &str) -> Self {
        if value == ALL || value.is_empty() {
            Filter::All
        } else {
            Filter::Category(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Filter::All => ALL,
            Filter::Category(c) => c,
        }
    }

    pub fn matches(&self, photo: &Photo) -> bool {
        match self {
            Filter::All => true,
            Filter::Category(c) => photo.category.as_deref() == Some(c.as_str()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Grid,
    Masonry,
}

impl View {
    pub fn parse(value: &str) -> Self {
        match value {
            "masonry" => View::Masonry,
            _ => View::Grid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Grid => "grid",
            View::Masonry => "masonry",
        }
    }
}

/// Exactly one active filter and one active view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeState {
    pub filter: Filter,
    pub view: View,
}

impl HomeState {
    pub fn select_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn select_view(&mut self, view: View) {
        self.view = view;
    }

    /// Query string that reproduces this state, e.g. `filter=nature&view=masonry`.
    pub fn query(&self) -> String {
        format!(
            "filter={}&view={}",
            crate::util::url_encode(self.filter.as_str()),
            self.view.as_str()
        )
    }
}

/// Photos matching the active filter, in fetch order. This is the home
/// page's lightbox index space.
#[derive(Debug, Clone)]
pub struct VisibleSubset<'a> {
    items: Vec<&'a Photo>,
}

impl<'a> VisibleSubset<'a> {
    pub fn of(photos: &'a [Photo], filter: &Filter) -> Self {
        Self {
            items: photos.iter().filter(|p| filter.matches(p)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Photo> + '_ {
        self.items.iter().copied()
    }
}

impl IndexSpace for VisibleSubset<'_> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&Photo> {
        self.items.get(index).copied()
    }
}

/// Filter buttons: `all`, then each distinct stored category in first-seen order.
pub fn filter_options(photos: &[Photo]) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    for category in photos.iter().filter_map(|p| p.category.as_deref()) {
        if !category.is_empty() && !options.iter().any(|o| o == category) {
            options.push(category.to_string());
        }
    }
    options
}
