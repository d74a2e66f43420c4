//! HTML minification for rendered pages.

use crate::error::{Error, Result};

/// Minify a rendered page, including inline styles.
pub fn html(input: &str) -> Result<String> {
    let cfg = minify_html::Cfg {
        minify_css: true,
        keep_closing_tags: true,
        ..Default::default()
    };

    let bytes = minify_html::minify(input.as_bytes(), &cfg);
    String::from_utf8(bytes).map_err(|e| Error::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        let input = r#"
            <html>
                <head>
                    <title>Folio</title>
                </head>
                <body>
                    <p>Nature   自然</p>
                </body>
            </html>
        "#;
        let output = html(input).unwrap();
        assert!(!output.contains("    "));
        assert!(output.contains("<title>Folio</title>"));
        assert!(output.contains("自然"));
    }

    #[test]
    fn keeps_links_intact() {
        let output = html(r#"<a href="/gallery?photo=2&amp;info=1">x</a>"#).unwrap();
        assert!(output.contains("photo=2"));
        assert!(output.contains("info=1"));
    }
}
