//! Data models for scraped articles, failures and feed entries.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticlePage`]: A fetched article page decoded to text
//! - [`ArticleRecord`]: Fields extracted from one article page
//! - [`FailureRecord`]: An article ID whose fetch was rejected by the server
//! - [`FeedEntry`]: One entry of the PTS news feed
//!
//! The serialized field names of [`ArticleRecord`] and [`FailureRecord`] form
//! the schema of the `news*.json` and `failed*.json` output files.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of leading bytes inspected for a `<meta charset>` declaration.
const META_SNIFF_LEN: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// An article page decoded to text.
///
/// Only lives for the duration of one extraction call.
#[derive(Debug)]
pub struct ArticlePage {
    /// The decoded HTML document.
    pub html: String,
    /// The encoding the bytes were decoded with.
    pub encoding: &'static Encoding,
}

impl ArticlePage {
    /// Decode raw response bytes into a page.
    ///
    /// The encoding is chosen from, in order: a byte-order mark, the charset
    /// declared by the server, a `<meta charset>` in the first kilobyte of the
    /// document, and finally UTF-8. Malformed sequences are replaced rather
    /// than rejected.
    pub fn decode(bytes: &[u8], declared: Option<&str>) -> Self {
        let guess = declared
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .or_else(|| sniff_meta_charset(bytes))
            .unwrap_or(UTF_8);
        let (html, encoding, _had_errors) = guess.decode(bytes);
        ArticlePage {
            html: html.into_owned(),
            encoding,
        }
    }

    /// Wrap an already decoded UTF-8 document.
    #[cfg(test)]
    pub fn from_html(html: impl Into<String>) -> Self {
        ArticlePage {
            html: html.into(),
            encoding: UTF_8,
        }
    }
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_LEN)]);
    META_CHARSET
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
}

/// The fields extracted from a single article page.
///
/// Field order matches the output file: `author`, `text`, `published-date`,
/// `title`, `href`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Reporter names joined with `", "`, a report-type marker, or `null`.
    pub author: Option<String>,
    /// Body paragraphs separated by a blank line.
    pub text: String,
    /// The publish date exactly as it appears on the page.
    #[serde(rename = "published-date")]
    pub published_date: String,
    /// The article headline.
    pub title: String,
    /// The URL the article was scraped from.
    pub href: String,
}

/// An article ID the server answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FailureRecord {
    pub id: u64,
    pub href: String,
    /// The HTTP error message, e.g. `404 Client Error: Not Found for url: ...`.
    pub reason: String,
}

/// One feed entry, reduced to what the search console shows.
///
/// Fields missing from the entry are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// The entry's summary (`<description>` in RSS).
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_defaults_to_utf8() {
        let page = ArticlePage::decode("<h1>公視新聞</h1>".as_bytes(), None);
        assert_eq!(page.encoding, UTF_8);
        assert_eq!(page.html, "<h1>公視新聞</h1>");
    }

    #[test]
    fn test_decode_uses_declared_charset() {
        let (bytes, _, _) = encoding_rs::BIG5.encode("<p>新聞</p>");
        let page = ArticlePage::decode(&bytes, Some("big5"));
        assert_eq!(page.encoding, encoding_rs::BIG5);
        assert_eq!(page.html, "<p>新聞</p>");
    }

    #[test]
    fn test_decode_sniffs_meta_charset() {
        let html = r#"<html><head><meta charset="big5"></head><body><p>報導</p></body></html>"#;
        let (bytes, _, _) = encoding_rs::BIG5.encode(html);
        let page = ArticlePage::decode(&bytes, None);
        assert_eq!(page.encoding, encoding_rs::BIG5);
        assert!(page.html.contains("<p>報導</p>"));
    }

    #[test]
    fn test_decode_ignores_unknown_label() {
        let page = ArticlePage::decode(b"<p>ok</p>", Some("not-a-charset"));
        assert_eq!(page.encoding, UTF_8);
    }

    #[test]
    fn test_article_record_field_names() {
        let record = ArticleRecord {
            author: None,
            text: "內文".to_string(),
            published_date: "2021/3/4 09: 15".to_string(),
            title: "標題".to_string(),
            href: "https://news.pts.org.tw/article/1".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"author":null,"text":"內文","published-date":"2021/3/4 09: 15","title":"標題","href":"https://news.pts.org.tw/article/1"}"#
        );
    }

    #[test]
    fn test_failure_record_field_names() {
        let record = FailureRecord {
            id: 706842,
            href: "https://news.pts.org.tw/article/706842".to_string(),
            reason: "404 Client Error: Not Found for url: https://news.pts.org.tw/article/706842"
                .to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 706842);
        assert_eq!(value["href"], "https://news.pts.org.tw/article/706842");
        assert!(value["reason"].as_str().unwrap().starts_with("404 Client Error"));
    }
}
