use std::path::{Component, Path, PathBuf};

use include_dir::{Dir, include_dir};
use tera::Tera;

use crate::error::{Error, Result};
use crate::util::escape_html;

/// The built-in theme, embedded at compile time.
static DEFAULT: Dir = include_dir!("$CARGO_MANIFEST_DIR/theme");

/// Name of the built-in theme in site.toml.
pub const DEFAULT_THEME: &str = "default";

/// Well-known template names.
pub mod templates {
    /// Home page with filter and view toggles (required)
    pub const INDEX: &str = "index.html";
    /// Category and series sections (required)
    pub const GALLERY: &str = "gallery.html";
    /// Admin password form (required)
    pub const LOGIN: &str = "login.html";

    pub const REQUIRED: [&str; 3] = [INDEX, GALLERY, LOGIN];
}

/// Source of static assets for a theme.
#[derive(Debug)]
pub enum StaticSource {
    /// Static files in a local directory
    Directory(PathBuf),
    /// Static files embedded at compile time
    Builtin(&'static Dir<'static>),
    /// No static files
    None,
}

/// A loaded theme: templates plus static assets served under `/static/`.
#[derive(Debug)]
pub struct Theme {
    pub templates: Tera,
    pub static_source: StaticSource,
}

impl Theme {
    /// Resolve a theme name: a directory under `site_dir` wins over the
    /// built-in theme of the same name.
    pub fn resolve(site_dir: &Path, name: &str) -> Result<Self> {
        let local = site_dir.join(name);
        if local.is_dir() {
            tracing::debug!(path = %local.display(), "using local theme");
            return Self::load(&local);
        }

        if name == DEFAULT_THEME {
            return Self::from_builtin(&DEFAULT);
        }

        Err(Error::ThemeNotFound {
            name: name.to_string(),
        })
    }

    /// Load a theme from a directory with a `templates/` subdirectory.
    pub fn load(theme_dir: &Path) -> Result<Self> {
        let glob_pattern = format!("{}/**/*.html", theme_dir.join("templates").display());
        let mut templates = Tera::new(&glob_pattern)?;
        templates.set_escape_fn(escape_html);
        check_required(&templates)?;

        let static_dir = theme_dir.join("static");
        let static_source = if static_dir.is_dir() {
            StaticSource::Directory(static_dir)
        } else {
            StaticSource::None
        };

        tracing::info!(
            path = %theme_dir.display(),
            has_static = !matches!(static_source, StaticSource::None),
            "theme loaded"
        );

        Ok(Self {
            templates,
            static_source,
        })
    }

    /// Load a theme from an embedded directory.
    pub fn from_builtin(dir: &'static Dir<'static>) -> Result<Self> {
        let templates_dir = dir.get_dir("templates").ok_or(Error::MissingTemplate {
            name: templates::INDEX,
        })?;

        // Added together: templates may extend one another
        let mut raw = Vec::new();
        for file in templates_dir.files() {
            let Some(name) = file.path().file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(".html") {
                continue;
            }
            let Some(content) = file.contents_utf8() else {
                continue;
            };
            raw.push((name, content));
        }

        let mut templates = Tera::default();
        templates.add_raw_templates(raw)?;
        templates.set_escape_fn(escape_html);
        check_required(&templates)?;

        let static_source = dir
            .get_dir("static")
            .map(StaticSource::Builtin)
            .unwrap_or(StaticSource::None);

        tracing::info!(
            theme = DEFAULT_THEME,
            has_static = !matches!(static_source, StaticSource::None),
            "theme loaded"
        );

        Ok(Self {
            templates,
            static_source,
        })
    }

    /// Read a static asset by its path below `static/`. Rejects anything
    /// that would leave the static root.
    pub fn static_file(&self, name: &str) -> Option<Vec<u8>> {
        let relative = safe_relative(name)?;
        match &self.static_source {
            StaticSource::Directory(dir) => {
                let path = dir.join(&relative);
                path.is_file().then(|| std::fs::read(&path).ok()).flatten()
            }
            StaticSource::Builtin(dir) => {
                // Entries in a sub-Dir keep their path from the embed root
                let full = dir.path().join(&relative);
                dir.get_file(&full).map(|f| f.contents().to_vec())
            }
            StaticSource::None => None,
        }
    }
}

fn check_required(templates: &Tera) -> Result<()> {
    for name in templates::REQUIRED {
        if !templates.get_template_names().any(|n| n == name) {
            return Err(Error::MissingTemplate { name });
        }
    }
    Ok(())
}

/// A relative path made only of normal components.
pub fn safe_relative(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains('\\') {
        return None;
    }
    let path = Path::new(name);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_temp_theme(templates: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let templates_dir = dir.path().join("templates");
        fs::create_dir(&templates_dir).unwrap();

        for (name, content) in templates {
            fs::write(templates_dir.join(name), content).unwrap();
        }

        dir
    }

    const COMPLETE: [(&str, &str); 3] = [
        ("index.html", "<html>home</html>"),
        ("gallery.html", "<html>gallery</html>"),
        ("login.html", "<html>login</html>"),
    ];

    #[test]
    fn builtin_theme_is_complete() {
        let theme = Theme::resolve(Path::new("/nonexistent"), DEFAULT_THEME).unwrap();
        assert!(matches!(theme.static_source, StaticSource::Builtin(_)));
        assert!(theme.static_file("style.css").is_some());
        assert!(theme.static_file("lightbox.js").is_some());
        assert!(theme.static_file("missing.css").is_none());
    }

    #[test]
    fn load_local_theme() {
        let dir = create_temp_theme(&COMPLETE);
        fs::create_dir(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/site.css"), "body{}").unwrap();

        let theme = Theme::load(dir.path()).unwrap();
        assert!(matches!(theme.static_source, StaticSource::Directory(_)));
        assert_eq!(theme.static_file("site.css").unwrap(), b"body{}");
    }

    #[test]
    fn local_directory_overrides_builtin() {
        let site = tempfile::tempdir().unwrap();
        let theme_dir = site.path().join(DEFAULT_THEME).join("templates");
        fs::create_dir_all(&theme_dir).unwrap();
        for (name, content) in COMPLETE {
            fs::write(theme_dir.join(name), content).unwrap();
        }

        let theme = Theme::resolve(site.path(), DEFAULT_THEME).unwrap();
        assert!(matches!(theme.static_source, StaticSource::None));
    }

    #[test]
    fn missing_required_template_fails() {
        let dir = create_temp_theme(&[("index.html", "<html></html>")]);
        let err = Theme::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingTemplate { name: "gallery.html" }));
    }

    #[test]
    fn unknown_theme_name() {
        let site = tempfile::tempdir().unwrap();
        let err = Theme::resolve(site.path(), "fancy").unwrap_err();
        assert!(matches!(err, Error::ThemeNotFound { .. }));
    }

    #[test]
    fn static_paths_cannot_escape() {
        assert!(safe_relative("css/site.css").is_some());
        assert!(safe_relative("../site.toml").is_none());
        assert!(safe_relative("/etc/passwd").is_none());
        assert!(safe_relative("a\\b").is_none());
        assert!(safe_relative("").is_none());
    }
}
