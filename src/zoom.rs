//! Zoom and pan state for the image shown in the lightbox.

use serde::Serialize;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 5.0;

/// Scale factor applied per wheel notch.
const WHEEL_STEP: f64 = 1.1;

/// Scale a double-activation jumps to from 1×.
const DOUBLE_ACTIVATE_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Continuous zoom state, scoped to one opened image.
#[derive(Debug, Clone, PartialEq)]
pub struct Zoom {
    scale: f64,
    offset: Point,
    /// `pointer - offset` captured on press; `Some` while panning
    anchor: Option<Point>,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            offset: Point::ORIGIN,
            anchor: None,
        }
    }
}

impl Zoom {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[cfg(test)]
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_SCALE
    }

    #[cfg(test)]
    pub fn is_panning(&self) -> bool {
        self.anchor.is_some()
    }

    /// Wheel notches in from 1× that produce the current scale.
    pub fn level(&self) -> u32 {
        (self.scale.ln() / WHEEL_STEP.ln()).round() as u32
    }

    pub fn at_max(&self) -> bool {
        self.scale >= MAX_SCALE
    }

    /// One discrete wheel event. Negative delta zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        let scaled = if delta_y < 0.0 {
            self.scale * WHEEL_STEP
        } else {
            self.scale / WHEEL_STEP
        };
        self.scale = scaled.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Pointer press. Starts panning only when zoomed in.
    ///
    /// Returns whether the press was captured for panning.
    pub fn press(&mut self, pointer: Point) -> bool {
        if !self.is_zoomed() {
            return false;
        }

        self.anchor = Some(Point::new(pointer.x - self.offset.x, pointer.y - self.offset.y));
        true
    }

    /// Pointer move. Ignored unless a press started panning.
    pub fn drag(&mut self, pointer: Point) {
        if let Some(anchor) = self.anchor {
            self.offset = Point::new(pointer.x - anchor.x, pointer.y - anchor.y);
        }
    }

    pub fn release(&mut self) {
        self.anchor = None;
    }

    /// Double click/tap: 1× jumps to 2×, anything else collapses to 1× at the origin.
    pub fn double_activate(&mut self) {
        if self.scale == MIN_SCALE {
            self.scale = DOUBLE_ACTIVATE_SCALE;
        } else {
            self.scale = MIN_SCALE;
            self.offset = Point::ORIGIN;
        }
    }

    /// CSS transform: translation in untransformed pixels, then scale.
    pub fn transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.offset.x, self.offset.y, self.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn starts_at_identity() {
        let zoom = Zoom::default();
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.offset(), Point::ORIGIN);
        assert_eq!(zoom.transform(), "translate(0px, 0px) scale(1)");
    }

    #[test]
    fn wheel_in_multiplies() {
        let mut zoom = Zoom::default();
        zoom.wheel(-100.0);
        assert!((zoom.scale() - 1.1).abs() < 1e-9);
        zoom.wheel(-1.0);
        assert!((zoom.scale() - 1.21).abs() < 1e-9);
    }

    #[test]
    fn wheel_scale_stays_clamped() {
        let mut zoom = Zoom::default();
        for _ in 0..100 {
            zoom.wheel(-1.0);
            assert!((MIN_SCALE..=MAX_SCALE).contains(&zoom.scale()));
        }
        assert_eq!(zoom.scale(), MAX_SCALE);

        for _ in 0..100 {
            zoom.wheel(1.0);
            assert!((MIN_SCALE..=MAX_SCALE).contains(&zoom.scale()));
        }
        assert_eq!(zoom.scale(), MIN_SCALE);
    }

    #[test]
    fn zero_delta_zooms_out() {
        let mut zoom = Zoom::default();
        zoom.wheel(-1.0);
        zoom.wheel(-1.0);
        zoom.wheel(0.0);
        assert!((zoom.scale() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn press_ignored_at_unit_scale() {
        let mut zoom = Zoom::default();
        assert!(!zoom.press(Point::new(10.0, 10.0)));
        zoom.drag(Point::new(50.0, 50.0));
        assert_eq!(zoom.offset(), Point::ORIGIN);
    }

    #[test]
    fn drag_follows_pointer_from_anchor() {
        let mut zoom = Zoom::default();
        zoom.double_activate();

        assert!(zoom.press(Point::new(100.0, 100.0)));
        zoom.drag(Point::new(130.0, 90.0));
        assert_eq!(zoom.offset(), Point::new(30.0, -10.0));
        zoom.drag(Point::new(140.0, 120.0));
        assert_eq!(zoom.offset(), Point::new(40.0, 20.0));
        zoom.release();

        // Second drag continues from the current offset
        assert!(zoom.press(Point::new(0.0, 0.0)));
        zoom.drag(Point::new(5.0, 5.0));
        assert_eq!(zoom.offset(), Point::new(45.0, 25.0));
        zoom.release();

        zoom.drag(Point::new(500.0, 500.0));
        assert_eq!(zoom.offset(), Point::new(45.0, 25.0));
        assert_eq!(zoom.transform(), "translate(45px, 25px) scale(2)");
    }

    #[test_case(0 ; "from one")]
    #[test_case(1 ; "one notch in")]
    #[test_case(7 ; "several notches in")]
    #[test_case(40 ; "max")]
    fn double_activate_toggles(notches: usize) {
        let mut zoom = Zoom::default();
        for _ in 0..notches {
            zoom.wheel(-1.0);
        }
        let was_unit = zoom.scale() == MIN_SCALE;

        zoom.double_activate();

        if was_unit {
            assert_eq!(zoom.scale(), 2.0);
        } else {
            assert_eq!(zoom.scale(), 1.0);
            assert_eq!(zoom.offset(), Point::ORIGIN);
        }
    }

    #[test]
    fn double_activate_from_two_resets_offset() {
        let mut zoom = Zoom::default();
        zoom.double_activate();
        zoom.press(Point::new(0.0, 0.0));
        zoom.drag(Point::new(12.0, 8.0));
        zoom.release();

        zoom.double_activate();
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.offset(), Point::ORIGIN);
    }

    #[test]
    fn release_ends_pan() {
        let mut zoom = Zoom::default();
        zoom.double_activate();
        zoom.press(Point::new(1.0, 1.0));
        assert!(zoom.is_panning());
        zoom.release();
        assert!(!zoom.is_panning());
    }

    #[test_case(0, 0 ; "unit")]
    #[test_case(1, 1 ; "one notch")]
    #[test_case(5, 5 ; "five notches")]
    #[test_case(40, 17 ; "clamped at max")]
    fn level_counts_notches(notches: usize, expected: u32) {
        let mut zoom = Zoom::default();
        for _ in 0..notches {
            zoom.wheel(-1.0);
        }
        assert_eq!(zoom.level(), expected);
        assert_eq!(zoom.at_max(), notches >= 17);
    }
}
