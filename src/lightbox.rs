//! Modal image viewer shared by the home and gallery pages.
//!
//! The lightbox never owns the photos it shows. Every operation takes the
//! current index space (render order on the gallery page, the filtered
//! subset on the home page) so the same component serves both pages.

use serde::Serialize;

use crate::photos::{ExifSummary, Photo};
use crate::zoom::{Point, Zoom};

/// Horizontal travel (in device pixels) a touch must exceed to navigate.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Ordered list of photos the lightbox navigates.
pub trait IndexSpace {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Photo>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexSpace for [Photo] {
    fn len(&self) -> usize {
        <[Photo]>::len(self)
    }

    fn get(&self, index: usize) -> Option<&Photo> {
        <[Photo]>::get(self, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Input delivered to an open lightbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    CloseControl,
    /// Click that landed on the backdrop itself
    Backdrop,
    /// Click on the image, panel or controls; never dismisses
    ContentClick,
    PrevControl,
    NextControl,
    InfoToggle,
    Key(Key),
    TouchStart { x: f64 },
    TouchEnd { x: f64 },
    Wheel { delta_y: f64 },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    DoubleClick,
}

#[derive(Debug, Clone)]
struct Session {
    index: usize,
    zoom: Zoom,
    info_visible: bool,
}

/// What the paint step needs to draw the open lightbox.
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    pub index: usize,
    pub total: usize,
    pub prev: usize,
    pub next: usize,
    pub id: String,
    pub src: String,
    pub title: String,
    pub date: String,
    pub exif: ExifSummary,
    pub info_visible: bool,
    pub transform: String,
    pub scale: f64,
    /// Wheel notches in from 1×
    pub zoom_level: u32,
    pub can_zoom_in: bool,
}

#[derive(Debug, Clone)]
pub struct Lightbox {
    session: Option<Session>,
    scroll_locked: bool,
    touch_start: Option<f64>,
    date_format: String,
}

impl Lightbox {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            session: None,
            scroll_locked: false,
            touch_start: None,
            date_format: date_format.into(),
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    #[cfg(test)]
    pub fn zoom(&self) -> Option<&Zoom> {
        self.session.as_ref().map(|s| &s.zoom)
    }

    #[cfg(test)]
    pub fn info_visible(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.info_visible)
    }

    /// Whether page scrolling is suspended.
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Open the photo at `index mod N`. No-op on an empty index space.
    ///
    /// Zoom is reset and the metadata panel collapsed on every open.
    pub fn open<S: IndexSpace + ?Sized>(&mut self, space: &S, index: usize) -> Option<Slide> {
        let total = space.len();
        if total == 0 {
            return None;
        }

        let index = index % total;
        self.session = Some(Session {
            index,
            zoom: Zoom::default(),
            info_visible: false,
        });
        self.scroll_locked = true;
        self.touch_start = None;

        tracing::trace!(index, total, "lightbox opened");

        self.slide(space)
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::trace!("lightbox closed");
        }
        self.scroll_locked = false;
        self.touch_start = None;
    }

    pub fn next<S: IndexSpace + ?Sized>(&mut self, space: &S) -> Option<Slide> {
        let current = self.index()?;
        let total = space.len();
        if total == 0 {
            return None;
        }
        self.open(space, (current % total + 1) % total)
    }

    pub fn prev<S: IndexSpace + ?Sized>(&mut self, space: &S) -> Option<Slide> {
        let current = self.index()?;
        let total = space.len();
        if total == 0 {
            return None;
        }
        self.open(space, (current % total + total - 1) % total)
    }

    pub fn toggle_info(&mut self) {
        if let Some(session) = &mut self.session {
            session.info_visible = !session.info_visible;
        }
    }

    /// Dispatch one input. Everything is ignored while closed.
    pub fn handle<S: IndexSpace + ?Sized>(&mut self, space: &S, event: Event) {
        let Some(session) = &mut self.session else {
            return;
        };

        match event {
            Event::CloseControl | Event::Backdrop | Event::Key(Key::Escape) => self.close(),
            Event::ContentClick | Event::Key(Key::Other) => {}
            Event::NextControl | Event::Key(Key::ArrowRight) => {
                self.next(space);
            }
            Event::PrevControl | Event::Key(Key::ArrowLeft) => {
                self.prev(space);
            }
            Event::InfoToggle => self.toggle_info(),
            Event::TouchStart { x } => self.touch_start = Some(x),
            Event::TouchEnd { x } => {
                let Some(start) = self.touch_start.take() else {
                    return;
                };
                if session.zoom.is_zoomed() {
                    return;
                }
                if x < start - SWIPE_THRESHOLD {
                    self.next(space);
                } else if x > start + SWIPE_THRESHOLD {
                    self.prev(space);
                }
            }
            Event::Wheel { delta_y } => session.zoom.wheel(delta_y),
            Event::PointerDown(p) => {
                session.zoom.press(p);
            }
            Event::PointerMove(p) => session.zoom.drag(p),
            Event::PointerUp => session.zoom.release(),
            Event::DoubleClick => session.zoom.double_activate(),
        }
    }

    /// View model of the currently open photo.
    pub fn slide<S: IndexSpace + ?Sized>(&self, space: &S) -> Option<Slide> {
        let session = self.session.as_ref()?;
        let total = space.len();
        let photo = space.get(session.index)?;

        Some(Slide {
            index: session.index,
            total,
            prev: (session.index + total - 1) % total,
            next: (session.index + 1) % total,
            id: photo.id.clone(),
            src: photo.url.clone(),
            title: photo.title.clone(),
            date: photo.display_date(&self.date_format),
            exif: ExifSummary::of(photo),
            info_visible: session.info_visible,
            transform: session.zoom.transform(),
            scale: session.zoom.scale(),
            zoom_level: session.zoom.level(),
            can_zoom_in: !session.zoom.at_max(),
        })
    }
}
