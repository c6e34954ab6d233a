//! Filesystem-safe names for table ids.

use crate::error::{DatasetError, Result};
use md5::{Digest, Md5};

/// ASCII slug: transliterate, replace every run of characters outside
/// `[-a-zA-Z0-9]` with a single `-`, trim dashes at both ends.
pub fn slugify(text: &str, lowercase: bool) -> String {
    let text = text.replace('\'', "-");
    let mut text = deunicode::deunicode(&text);
    if lowercase {
        text = text.to_lowercase();
    }
    text.retain(|c| c != '\'');

    // digit groups: "1,000" -> "1000"
    let chars: Vec<char> = text.chars().collect();
    let mut cleaned = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        let between_digits = c == ','
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if !between_digits {
            cleaned.push(c);
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

/// Path component of an `http(s)` URL, without query or fragment.
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let Some(start) = rest.find('/') else {
        return "";
    };
    let path = &rest[start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn md5_hex(text: &str) -> String {
    format!("{:x}", Md5::digest(text.as_bytes()))
}

/// Filesystem-friendly id for a table.
///
/// DBpedia/Wikipedia URLs become the slug of their resource path plus the
/// MD5 of the whole id, so distinct URLs never collide. Other URLs are not
/// supported. Plain ids are slugified with their case preserved.
pub fn get_friendly_fs_id(id: &str) -> Result<String> {
    if id.starts_with("http://") || id.starts_with("https://") {
        let marker = if id.contains("dbpedia.org") {
            "/resource/"
        } else if id.contains("wikipedia.org") {
            "/wiki/"
        } else {
            return Err(DatasetError::UnsupportedFormat {
                kind: "table id url",
                tag: id.to_string(),
            });
        };
        let path = url_path(id).replace(marker, "").replace('/', "_");
        return Ok(format!(
            "{}_{}",
            slugify(&path, true).replace('-', "_"),
            md5_hex(id)
        ));
    }
    Ok(slugify(&id.replace('/', "_"), false).replace('-', "_"))
}
