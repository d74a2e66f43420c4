//! Utility functions.

use std::collections::HashMap;

/// URL-encode a string for use in URL paths and query values.
/// Encodes spaces and other special characters while preserving alphanumerics,
/// hyphens, underscores, periods, and tildes.
pub fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => {
                result.push(c);
            }
            _ => {
                for byte in c.to_string().as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}

/// Decode URL-encoded query values (e.g., %20 -> space, + -> space).
pub fn url_decode(s: &str) -> String {
    decode(s, true)
}

/// Decode a URL path. `+` is literal in paths.
pub fn url_decode_path(s: &str) -> String {
    decode(s, false)
}

fn decode(s: &str, plus_as_space: bool) -> String {
    let mut result = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();

    while let Some(b) = bytes.next() {
        if b == b'%' {
            match (bytes.next(), bytes.next()) {
                (Some(h1), Some(h2)) => {
                    let hex = [h1, h2];
                    match u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or(""), 16) {
                        Ok(byte) => result.push(byte),
                        Err(_) => {
                            result.push(b'%');
                            result.extend_from_slice(&hex);
                        }
                    }
                }
                (Some(h1), None) => {
                    result.push(b'%');
                    result.push(h1);
                }
                _ => result.push(b'%'),
            }
        } else if b == b'+' && plus_as_space {
            result.push(b' ');
        } else {
            result.push(b);
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Parse `a=1&b=two` (query strings and form bodies). Later keys win.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (url_decode(k), url_decode(v)),
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

/// HTML-escape template output. Unlike Tera's default, `/` is left alone so
/// URLs and dates stay readable in the markup.
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

/// Find a cookie value in a `Cookie:` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
