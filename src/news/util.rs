//! Utility functions for news feed processing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use tracing::debug;

use super::types::DEFAULT_SOURCE_NAME;
use crate::TARGET_WEB_REQUEST;

static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").unwrap());
static XML_ENCODING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9_.:-]+)["']"#).unwrap());

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Parse a date string in the formats feeds actually use.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    // RSS 2.0 pubDate
    if let Ok(date) = DateTime::parse_from_rfc2822(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    for format in &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z", "%a, %d %b %Y %H:%M:%S %z"] {
        if let Ok(date) = DateTime::parse_from_str(date_str, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    // Zone-less timestamps are taken as UTC
    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive.and_utc());
        }
    }

    for format in &["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(date_str, format) {
            return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Unwraps every `<![CDATA[...]]>` section, keeping its content.
pub fn strip_cdata(text: &str) -> String {
    CDATA.replace_all(text, "$1").into_owned()
}

/// Removes anything that looks like a markup tag.
pub fn strip_tags(text: &str) -> String {
    TAGS.replace_all(text, "").into_owned()
}

/// Decodes the predefined XML entities, `&nbsp;` and numeric references.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_default()
    });

    // &amp; goes last so "&amp;lt;" stays "&lt;"
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Title text: CDATA unwrapped, entities decoded, whitespace collapsed.
pub fn clean_title(raw: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_cdata(raw)))
}

/// Description text reduced to plain prose.
pub fn clean_description(raw: &str) -> String {
    let unwrapped = decode_entities(&strip_cdata(raw));
    collapse_whitespace(&strip_tags(&unwrapped))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Cuts `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate_summary(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(3);
    let cut: String = text.chars().take(keep).collect();
    format!("{}...", cut.trim_end())
}

/// Key used for deduplication: lowercase, no fragment, no query, one trailing slash dropped.
pub fn normalize_url(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let without_fragment = lowered.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    without_query
        .strip_suffix('/')
        .unwrap_or(without_query)
        .to_string()
}

/// Publisher name guessed from an article link, e.g. `https://www.bbc.co.uk/x` -> `Bbc`.
pub fn source_from_link(link: &str) -> String {
    let host = url::Url::parse(link)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string));

    let Some(host) = host else {
        return DEFAULT_SOURCE_NAME.to_string();
    };

    let label = host
        .strip_prefix("www.")
        .unwrap_or(&host)
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => DEFAULT_SOURCE_NAME.to_string(),
    }
}

/// Response body after decompression and charset decoding.
#[derive(Debug, Clone)]
pub struct DecodedBody {
    pub text: String,
    pub encoding: &'static str,
    pub notes: Vec<String>,
}

/// Turns raw response bytes into text. Handles bodies that are still
/// compressed after transport decoding and non-UTF-8 charsets.
pub fn decode_body(
    bytes: &[u8],
    content_encoding: Option<&str>,
    content_type: Option<&str>,
    feed_url: &str,
) -> DecodedBody {
    let mut notes = Vec::new();

    let decompressed = if content_encoding == Some("br") {
        let mut decoded = Vec::new();
        let mut reader = brotli::Decompressor::new(bytes, 4096);
        if reader.read_to_end(&mut decoded).is_ok() && !decoded.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Decompressed brotli content from {}", feed_url);
            notes.push("Content was brotli compressed".to_string());
            decoded
        } else {
            try_decompressions(bytes, feed_url, &mut notes)
        }
    } else {
        try_decompressions(bytes, feed_url, &mut notes)
    };

    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_xml_declaration(&decompressed));

    if let Some(label) = declared.as_deref() {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (decoded, _, had_errors) = encoding.decode(&decompressed);
                if had_errors {
                    notes.push(format!("Malformed {} sequences replaced", encoding.name()));
                }
                return DecodedBody {
                    text: decoded.into_owned(),
                    encoding: encoding.name(),
                    notes,
                };
            }
            None => notes.push(format!("Unsupported charset: {}", label)),
        }
    }

    match String::from_utf8(decompressed) {
        Ok(text) => DecodedBody {
            text,
            encoding: encoding_rs::UTF_8.name(),
            notes,
        },
        Err(err) => {
            debug!(target: TARGET_WEB_REQUEST, "Body from {} is not UTF-8, falling back to windows-1252", feed_url);
            notes.push("Auto-detected encoding: windows-1252".to_string());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            DecodedBody {
                text: decoded.into_owned(),
                encoding: encoding_rs::WINDOWS_1252.name(),
                notes,
            }
        }
    }
}

/// Inflates gzip or zlib payloads identified by their magic bytes; anything
/// else is returned unchanged.
fn try_decompressions(bytes: &[u8], feed_url: &str, notes: &mut Vec<String>) -> Vec<u8> {
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut decoded = Vec::new();
        if decoder.read_to_end(&mut decoded).is_ok() && !decoded.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Decompressed gzip content from {}", feed_url);
            notes.push("Content was gzip compressed".to_string());
            return decoded;
        }
    }

    if bytes.len() > 1 && bytes[0] == 0x78 && (u16::from(bytes[0]) << 8 | u16::from(bytes[1])) % 31 == 0 {
        let mut decoder = flate2::read::ZlibDecoder::new(bytes);
        let mut decoded = Vec::new();
        if decoder.read_to_end(&mut decoded).is_ok() && !decoded.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Decompressed zlib content from {}", feed_url);
            notes.push("Content was zlib compressed".to_string());
            return decoded;
        }
    }

    bytes.to_vec()
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find(|part| part.to_lowercase().starts_with("charset="))
        .and_then(|part| part.split('=').nth(1))
        .map(|charset| charset.trim().trim_matches('"').to_string())
        .filter(|charset| !charset.is_empty())
}

fn charset_from_xml_declaration(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(200)];
    let head = String::from_utf8_lossy(head);
    XML_ENCODING
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
