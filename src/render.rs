//! Paint page state into HTML through the theme's templates.
//!
//! The lightbox is link-driven: every control is an anchor carrying
//! `photo=`, `zoom=` and `info=` query parameters, so pages work without
//! scripts. `static/lightbox.js` layers keys and gestures on top.

use serde::Serialize;
use tera::Context;

use crate::config::Site;
use crate::error::Result;
use crate::filter::{self, View};
use crate::grouping::{GroupKind, RenderGroup};
use crate::i18n::{self, Translations};
use crate::lightbox::Slide;
use crate::minify;
use crate::pages::{GalleryPage, HomePage, Status};
use crate::photos::Photo;
use crate::theme::{Theme, templates};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Debug, Serialize)]
struct SiteContext<'a> {
    title: &'a str,
    language: &'a str,
    version: &'static str,
}

/// A filter or view button.
#[derive(Debug, Serialize)]
struct Toggle {
    value: String,
    label: String,
    href: String,
    active: bool,
}

/// A thumbnail linking into the lightbox.
#[derive(Debug, Serialize)]
struct Tile<'a> {
    photo: &'a Photo,
    index: usize,
    href: String,
}

#[derive(Debug, Serialize)]
struct Section<'a> {
    title: &'a str,
    kind: GroupKind,
    tiles: Vec<Tile<'a>>,
}

#[derive(Debug, Serialize)]
struct LightboxContext {
    slide: Slide,
    close_href: String,
    prev_href: String,
    next_href: String,
    info_href: String,
    zoom_in_href: Option<String>,
    zoom_out_href: Option<String>,
    /// Current state; the script appends `&key=` to it
    self_href: String,
}

impl LightboxContext {
    /// `base` is the page URL ready for one more query parameter.
    fn new(slide: Slide, base: &str) -> Self {
        let here = |zoom: u32, info: bool| {
            let mut href = format!("{}photo={}", base, slide.index);
            if zoom > 0 {
                href.push_str(&format!("&zoom={}", zoom));
            }
            if info {
                href.push_str("&info=1");
            }
            href
        };
        let (level, info) = (slide.zoom_level, slide.info_visible);

        Self {
            close_href: base.trim_end_matches(['?', '&']).to_string(),
            prev_href: format!("{}photo={}", base, slide.prev),
            next_href: format!("{}photo={}", base, slide.next),
            info_href: here(level, !info),
            zoom_in_href: slide.can_zoom_in.then(|| here(level + 1, info)),
            zoom_out_href: (level > 0).then(|| here(level - 1, info)),
            self_href: here(level, info),
            slide,
        }
    }
}

fn section<'a>(group: &'a RenderGroup, base: &str) -> Section<'a> {
    Section {
        title: &group.title,
        kind: group.kind,
        tiles: group
            .photos
            .iter()
            .enumerate()
            .map(|(i, photo)| Tile {
                photo,
                index: group.start + i,
                href: format!("{}photo={}", base, group.start + i),
            })
            .collect(),
    }
}

#[derive(Debug)]
pub struct Renderer {
    theme: Theme,
    translations: Translations,
    language: String,
    title: String,
    minify: bool,
}

impl Renderer {
    pub fn new(theme: Theme, site: &Site) -> Self {
        let language = if i18n::is_supported(&site.language) {
            site.language.clone()
        } else {
            i18n::DEFAULT_LANGUAGE.to_string()
        };

        Self {
            theme,
            translations: i18n::translations(&language),
            language,
            title: site.title.clone(),
            minify: site.minify,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn home(&self, page: &HomePage) -> Result<String> {
        let state = page.state();
        let base = format!("/?{}&", state.query());

        let filters = page
            .filter_options()
            .into_iter()
            .map(|value| {
                let mut next = state.clone();
                next.select_filter(filter::Filter::parse(&value));
                Toggle {
                    label: if value == filter::ALL {
                        self.t("filter_all")
                    } else {
                        value.clone()
                    },
                    href: format!("/?{}", next.query()),
                    active: value == state.filter.as_str(),
                    value,
                }
            })
            .collect::<Vec<_>>();

        let views = [View::Grid, View::Masonry]
            .into_iter()
            .map(|view| {
                let mut next = state.clone();
                next.select_view(view);
                Toggle {
                    value: view.as_str().to_string(),
                    label: self.t(&format!("view_{}", view.as_str())),
                    href: format!("/?{}", next.query()),
                    active: view == state.view,
                }
            })
            .collect::<Vec<_>>();

        let tiles = page
            .visible()
            .iter()
            .enumerate()
            .map(|(index, photo)| Tile {
                photo,
                index,
                href: format!("{}photo={}", base, index),
            })
            .collect::<Vec<_>>();

        let mut context = self.context(page.status());
        context.insert("filters", &filters);
        context.insert("views", &views);
        context.insert("view", state.view.as_str());
        context.insert("tiles", &tiles);
        context.insert("scroll_locked", &page.scroll_locked());
        context.insert(
            "lightbox",
            &page.slide().map(|slide| LightboxContext::new(slide, &base)),
        );

        self.render(templates::INDEX, &context)
    }

    pub fn gallery(&self, page: &GalleryPage) -> Result<String> {
        let base = "/gallery?";
        let layout = page.layout();

        let categories: Vec<Section> = layout
            .categories
            .iter()
            .map(|group| section(group, base))
            .collect();
        let series: Vec<Section> = layout
            .series
            .iter()
            .map(|group| section(group, base))
            .collect();

        let mut context = self.context(page.status());
        context.insert("categories", &categories);
        context.insert("series_heading", &layout.series_heading());
        context.insert("series", &series);
        context.insert("scroll_locked", &page.scroll_locked());
        context.insert(
            "lightbox",
            &page.slide().map(|slide| LightboxContext::new(slide, base)),
        );

        self.render(templates::GALLERY, &context)
    }

    pub fn login(&self, failed: bool) -> Result<String> {
        let mut context = self.context(Status::Ready);
        context.insert("failed", &failed);
        self.render(templates::LOGIN, &context)
    }

    fn t(&self, key: &str) -> String {
        self.translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn context(&self, status: Status) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteContext {
                title: &self.title,
                language: &self.language,
                version: VERSION,
            },
        );
        context.insert("t", &self.translations);
        context.insert("status", &status);
        context
    }

    fn render(&self, template: &str, context: &Context) -> Result<String> {
        let html = self.theme.templates.render(template, context)?;
        if self.minify {
            minify::html(&html)
        } else {
            Ok(html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter::Filter;
    use crate::lightbox::Event;
    use crate::photos::Exif;
    use crate::photos::tests::photo;
    use crate::theme::DEFAULT_THEME;
    use std::path::Path;

    const FORMAT: &str = "%Y/%-m/%-d";

    fn renderer(language: &str) -> Renderer {
        let mut site: Site = toml::from_str("").unwrap();
        site.language = language.to_string();
        site.minify = false;
        let theme = Theme::resolve(Path::new("/nonexistent"), DEFAULT_THEME).unwrap();
        Renderer::new(theme, &site)
    }

    fn sample() -> Vec<Photo> {
        let mut photos = vec![photo("1", "nature"), photo("2", "urban"), photo("3", "nature")];
        photos[2].series = "Alps".to_string();
        photos[0].date = Some("2024-03-05T10:00:00.000Z".to_string());
        photos[0].exif = Some(Exif {
            camera: Some("X100V".to_string()),
            iso: Some(200),
            ..Default::default()
        });
        photos
    }

    #[test]
    fn failed_page_shows_placeholder() {
        let page = GalleryPage::load(Err(Error::Other("bad json".to_string())), FORMAT);
        let html = renderer("en").gallery(&page).unwrap();
        assert!(html.contains("Failed to load, please try again later."));
    }

    #[test]
    fn empty_page_shows_placeholder() {
        let page = HomePage::load(Ok(Vec::new()), FORMAT);
        let html = renderer("zh_CN").home(&page).unwrap();
        assert!(html.contains("暂无作品"));
        assert!(!html.contains("class=\"lightbox"));
    }

    #[test]
    fn gallery_sections_in_render_order() {
        let page = GalleryPage::load(Ok(sample()), FORMAT);
        let html = renderer("en").gallery(&page).unwrap();

        let nature = html.find("Nature 自然").unwrap();
        let urban = html.find("Urban 城市").unwrap();
        let heading = html.find("Featured Collections 精选系列").unwrap();
        let series = html.find("· Alps").unwrap();
        assert!(nature < urban && urban < heading && heading < series);

        // Series copy of photo 3 links to its own render-order slot
        assert!(html.contains("/gallery?photo=3"));
    }

    #[test]
    fn open_lightbox_links_wrap() {
        let mut page = GalleryPage::load(Ok(sample()), FORMAT);
        page.open(0);
        page.handle(Event::InfoToggle);
        let html = renderer("en").gallery(&page).unwrap();

        assert!(html.contains("X100V"));
        assert!(html.contains("ISO 200"));
        assert!(html.contains("2024/3/5"));
        assert!(html.contains("/gallery?photo=3"));
        assert!(html.contains("/gallery?photo=1"));
    }

    #[test]
    fn zoom_links_track_level() {
        let mut page = GalleryPage::load(Ok(sample()), FORMAT);
        page.open(2);
        let html = renderer("en").gallery(&page).unwrap();
        assert!(html.contains("/gallery?photo=2&amp;zoom=1\""));
        assert!(!html.contains("lightbox-zoom-out"));
        assert!(html.contains("data-self=\"/gallery?photo=2\""));
        assert!(html.contains("class=\"scroll-locked\""));

        page.handle(Event::Wheel { delta_y: -1.0 });
        page.handle(Event::InfoToggle);
        let html = renderer("en").gallery(&page).unwrap();
        assert!(html.contains("/gallery?photo=2&amp;zoom=2&amp;info=1"));
        assert!(html.contains("/gallery?photo=2&amp;info=1"));
        assert!(html.contains("/gallery?photo=2&amp;zoom=1\""), "info toggle keeps zoom");
    }

    #[test]
    fn missing_exif_placeholder() {
        let mut page = GalleryPage::load(Ok(sample()), FORMAT);
        page.open(1);
        page.handle(Event::InfoToggle);
        let html = renderer("en").gallery(&page).unwrap();
        assert!(html.contains("No EXIF Data"));
    }

    #[test]
    fn home_marks_active_filter_and_view() {
        let mut page = HomePage::load(Ok(sample()), FORMAT);
        page.select_filter(Filter::parse("urban"));
        page.select_view(View::Masonry);
        let html = renderer("en").home(&page).unwrap();

        assert!(html.contains("view-masonry"));
        assert!(html.contains("/?filter=urban&amp;view=masonry&amp;photo=0"));
        assert!(html.contains("data-category=\"urban\""));
        assert!(html.contains("<span class=\"photo-category\">urban</span>"));
        assert!(!html.contains("data-category=\"nature\""));
        assert!(!html.contains("Photo 1"));
        assert!(html.contains("Photo 2"));
    }

    #[test]
    fn titles_are_escaped() {
        let mut photos = sample();
        photos[0].title = "<script>alert(1)</script>".to_string();
        let page = HomePage::load(Ok(photos), FORMAT);
        let html = renderer("en").home(&page).unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn login_failure_message() {
        let r = renderer("en");
        assert!(!r.login(false).unwrap().contains("Wrong password"));
        assert!(r.login(true).unwrap().contains("Wrong password"));
    }

    #[test]
    fn unsupported_language_falls_back() {
        let r = renderer("fr");
        assert_eq!(r.language, "en");
        assert_eq!(r.t("nav_home"), "Home");
    }
}
