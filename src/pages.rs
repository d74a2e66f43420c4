//! Page state for the home grid and the gallery sections.
//!
//! Each page owns the loaded collection, derives its lightbox index space
//! from it, and drives one shared [`Lightbox`]. Nothing here touches markup.

use serde::Serialize;

use crate::error::Result;
use crate::filter::{self, Filter, HomeState, View, VisibleSubset};
use crate::grouping::GalleryLayout;
use crate::lightbox::{Event, Lightbox, Slide};
use crate::photos::Photo;

/// Outcome of loading the collection for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ready,
    /// Not an error: the collection has no photos
    Empty,
    /// Load or parse failure; terminal for this page load
    Failed,
}

fn load_status(collection: Result<Vec<Photo>>, page: &'static str) -> (Status, Vec<Photo>) {
    match collection {
        Ok(photos) if photos.is_empty() => (Status::Empty, photos),
        Ok(photos) => (Status::Ready, photos),
        Err(e) => {
            tracing::error!(page, error = %e, "failed to load photos");
            (Status::Failed, Vec::new())
        }
    }
}

/// Gallery page: category and series sections, lightbox over render order.
#[derive(Debug, Clone)]
pub struct GalleryPage {
    status: Status,
    layout: GalleryLayout,
    lightbox: Lightbox,
}

impl GalleryPage {
    pub fn load(collection: Result<Vec<Photo>>, date_format: &str) -> Self {
        let (status, photos) = load_status(collection, "gallery");
        Self {
            status,
            layout: GalleryLayout::build(&photos),
            lightbox: Lightbox::new(date_format),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn layout(&self) -> &GalleryLayout {
        &self.layout
    }

    #[cfg(test)]
    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn scroll_locked(&self) -> bool {
        self.lightbox.scroll_locked()
    }

    /// Open the lightbox at a render-order index. No lightbox on an empty page.
    pub fn open(&mut self, index: usize) -> Option<Slide> {
        if self.status != Status::Ready {
            return None;
        }
        self.lightbox.open(&self.layout, index)
    }

    pub fn handle(&mut self, event: Event) {
        self.lightbox.handle(&self.layout, event);
    }

    pub fn slide(&self) -> Option<Slide> {
        self.lightbox.slide(&self.layout)
    }
}

/// Home page: flat grid, category filter, grid/masonry toggle, lightbox over
/// the visible subset.
#[derive(Debug, Clone)]
pub struct HomePage {
    status: Status,
    photos: Vec<Photo>,
    state: HomeState,
    lightbox: Lightbox,
}

impl HomePage {
    pub fn load(collection: Result<Vec<Photo>>, date_format: &str) -> Self {
        let (status, photos) = load_status(collection, "home");
        Self {
            status,
            photos,
            state: HomeState::default(),
            lightbox: Lightbox::new(date_format),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    #[cfg(test)]
    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn scroll_locked(&self) -> bool {
        self.lightbox.scroll_locked()
    }

    /// Switch the filter. The index space changes, so an open lightbox closes.
    pub fn select_filter(&mut self, filter: Filter) {
        self.lightbox.close();
        self.state.select_filter(filter);
    }

    pub fn select_view(&mut self, view: View) {
        self.state.select_view(view);
    }

    pub fn visible(&self) -> VisibleSubset<'_> {
        VisibleSubset::of(&self.photos, &self.state.filter)
    }

    pub fn filter_options(&self) -> Vec<String> {
        filter::filter_options(&self.photos)
    }

    /// Open the lightbox at an index into the visible subset.
    pub fn open(&mut self, index: usize) -> Option<Slide> {
        let visible = VisibleSubset::of(&self.photos, &self.state.filter);
        self.lightbox.open(&visible, index)
    }

    pub fn handle(&mut self, event: Event) {
        let visible = VisibleSubset::of(&self.photos, &self.state.filter);
        self.lightbox.handle(&visible, event);
    }

    pub fn slide(&self) -> Option<Slide> {
        self.lightbox.slide(&self.visible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lightbox::Key;
    use crate::photos::tests::photo;

    const FORMAT: &str = "%Y/%-m/%-d";

    fn sample() -> Vec<Photo> {
        let mut photos = vec![photo("1", "nature"), photo("2", "urban"), photo("3", "nature")];
        photos[2].series = "Alps".to_string();
        photos
    }

    #[test]
    fn failed_load_is_terminal() {
        let mut page = GalleryPage::load(Err(Error::Other("boom".to_string())), FORMAT);
        assert_eq!(page.status(), Status::Failed);
        assert!(page.layout().is_empty());
        assert!(page.open(0).is_none());

        let home = HomePage::load(Err(Error::Other("boom".to_string())), FORMAT);
        assert_eq!(home.status(), Status::Failed);
        assert_eq!(home.visible().iter().count(), 0);
    }

    #[test]
    fn empty_collection_skips_lightbox() {
        let mut page = GalleryPage::load(Ok(Vec::new()), FORMAT);
        assert_eq!(page.status(), Status::Empty);
        assert!(page.open(0).is_none());
        assert!(!page.lightbox().is_open());
    }

    #[test]
    fn gallery_lightbox_follows_render_order() {
        let mut page = GalleryPage::load(Ok(sample()), FORMAT);
        assert_eq!(page.status(), Status::Ready);

        // Render order is [1, 3, 2, 3]
        let slide = page.open(1).unwrap();
        assert_eq!(slide.id, "3");
        page.handle(Event::Key(Key::ArrowRight));
        assert_eq!(page.slide().unwrap().id, "2");
        page.handle(Event::NextControl);
        assert_eq!(page.slide().unwrap().id, "3");
        assert_eq!(page.slide().unwrap().total, 4);
    }

    #[test]
    fn home_lightbox_follows_filter() {
        let mut home = HomePage::load(Ok(sample()), FORMAT);
        home.select_filter(Filter::parse("nature"));

        let slide = home.open(1).unwrap();
        assert_eq!(slide.id, "3");
        assert_eq!(slide.total, 2);

        home.handle(Event::NextControl);
        assert_eq!(home.slide().unwrap().id, "1");
    }

    #[test]
    fn changing_filter_closes_lightbox() {
        let mut home = HomePage::load(Ok(sample()), FORMAT);
        home.open(2);
        assert!(home.lightbox().is_open());
        assert!(home.scroll_locked());

        home.select_filter(Filter::parse("urban"));
        assert!(!home.lightbox().is_open());
        assert!(!home.scroll_locked());
    }

    #[test]
    fn view_toggle_keeps_lightbox() {
        let mut home = HomePage::load(Ok(sample()), FORMAT);
        home.open(0);
        home.select_view(View::Masonry);
        assert_eq!(home.state().view, View::Masonry);
        assert_eq!(home.slide().unwrap().id, "1");
    }

    #[test]
    fn filter_options_from_collection() {
        let home = HomePage::load(Ok(sample()), FORMAT);
        assert_eq!(home.filter_options(), vec!["all", "nature", "urban"]);
    }
}
