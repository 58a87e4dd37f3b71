//! PTS (公視新聞網) article page extractor.
//!
//! Article pages at `https://news.pts.org.tw/article/{id}` come in two
//! historical layouts:
//!
//! - **Old**: the publish date sits in its own `div.article-info__date` and the
//!   reporters are links inside `div.article-reporter`.
//! - **New**: one free-text info block carries the publish time, the update
//!   time and the byline, e.g. `記者王小明 / 綜合報導發布時間：2021/3/4 09: 15`.
//!
//! The layout is detected once per page ([`Layout::detect`]) and threaded
//! through the date and author rules. Every field degrades to a placeholder
//! instead of failing, so extraction is a pure, infallible function of the page.

use crate::models::{ArticlePage, ArticleRecord};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

pub const PUBLISH_TIME_LABEL: &str = "發布時間：";
pub const UPDATE_TIME_LABEL: &str = "更新時間：";
pub const LOCAL_REPORT_MARKER: &str = "地方報導";
pub const COMPREHENSIVE_REPORT_MARKER: &str = "綜合報導";
pub const IMAGE_CAPTION_MARKER: &str = "圖 /";

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const DATE_NOT_FOUND: &str = "Published date not found";
pub const TEXT_NOT_FOUND: &str = "Text not found";

/// Pages whose info block has no parsable publish time but does contain a
/// known date literal, keyed by article URL.
///
/// Technical debt: this covers a single malformed legacy page and must not
/// grow into a general date parser.
const LEGACY_DATE_OVERRIDES: &[(&str, &str)] =
    &[("https://news.pts.org.tw/article/787", "2011/8/2 14:30")];

// The site renders minutes after a literal space ("09: 15").
const TIMESTAMP: &str = r"\d{4}/\d{1,2}/\d{1,2} \d{2}: \d{2}";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static ARTICLE_TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.article-title"));
static ANY_H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static OLD_DATE: Lazy<Selector> = Lazy::new(|| selector("div.article-info__date"));
static DIV: Lazy<Selector> = Lazy::new(|| selector("div"));
static REPORTER_LINKS: Lazy<Selector> = Lazy::new(|| selector("div.article-reporter a"));
static NEW_CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.post-article"));
static OLD_CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.article-content"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));

static PUBLISH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{}\s*({TIMESTAMP})",
        regex::escape(PUBLISH_TIME_LABEL)
    ))
    .expect("publish date pattern is valid")
});

static LABELLED_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:{}|{})\s*{TIMESTAMP}",
        regex::escape(UPDATE_TIME_LABEL),
        regex::escape(PUBLISH_TIME_LABEL)
    ))
    .expect("timestamp label pattern is valid")
});

static BYLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(.*?)\s*/\s*({}|{})",
        regex::escape(LOCAL_REPORT_MARKER),
        regex::escape(COMPREHENSIVE_REPORT_MARKER)
    ))
    .expect("byline pattern is valid")
});

static NAME_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("name separator pattern is valid"));

/// Page structure, decided once per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Legacy page with a dedicated date element; holds its trimmed text.
    Old { date: String },
    /// Current page; holds the flattened text of the info block, if the page
    /// has one.
    New { info: Option<String> },
}

impl Layout {
    pub fn detect(document: &Html) -> Self {
        if let Some(date) = document.select(&OLD_DATE).next() {
            return Layout::Old {
                date: element_text(date).trim().to_string(),
            };
        }

        // First match in document order, so an enclosing wrapper wins over
        // the innermost block.
        let info = document
            .select(&DIV)
            .find(|div| element_text(*div).contains(PUBLISH_TIME_LABEL))
            .map(flattened_text);
        Layout::New { info }
    }
}

/// The fields of one article page, before it is tagged with its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub author: Option<String>,
    pub text: String,
    pub published_date: String,
}

impl ExtractedArticle {
    pub fn into_record(self, href: impl Into<String>) -> ArticleRecord {
        ArticleRecord {
            author: self.author,
            text: self.text,
            published_date: self.published_date,
            title: self.title,
            href: href.into(),
        }
    }
}

/// Extract title, publish date, author and body text from a PTS article page.
///
/// `href` is only consulted for the legacy date override table.
#[instrument(level = "debug", skip(page), fields(encoding = page.encoding.name()))]
pub fn extract_article(page: &ArticlePage, href: &str) -> ExtractedArticle {
    let document = Html::parse_document(&page.html);
    let layout = Layout::detect(&document);
    let published_date = extract_date(&layout, href);
    let author = extract_author(&document, &layout, &published_date);
    let article = ExtractedArticle {
        title: extract_title(&document),
        author,
        text: extract_text(&document),
        published_date,
    };
    debug!(?layout, title = %article.title, "Extracted article fields");
    article
}

fn extract_title(document: &Html) -> String {
    document
        .select(&ARTICLE_TITLE)
        .next()
        .or_else(|| document.select(&ANY_H1).next())
        .map(|h1| element_text(h1).trim().to_string())
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string())
}

fn extract_date(layout: &Layout, href: &str) -> String {
    match layout {
        Layout::Old { date } => date.clone(),
        Layout::New { info: Some(info) } => {
            if let Some(caps) = PUBLISH_DATE.captures(info) {
                return caps[1].to_string();
            }
            legacy_date_override(href)
                .filter(|date| info.contains(date))
                .unwrap_or(info.as_str())
                .to_string()
        }
        Layout::New { info: None } => DATE_NOT_FOUND.to_string(),
    }
}

fn legacy_date_override(href: &str) -> Option<&'static str> {
    LEGACY_DATE_OVERRIDES
        .iter()
        .find(|(url, _)| *url == href)
        .map(|(_, date)| *date)
}

fn extract_author(document: &Html, layout: &Layout, published_date: &str) -> Option<String> {
    let reporters = document
        .select(&REPORTER_LINKS)
        .map(|a| element_text(a).trim().to_string())
        .collect::<Vec<_>>();
    if !reporters.is_empty() {
        return Some(reporters.join(", "));
    }

    match layout {
        Layout::New { info: Some(info) } => author_from_info(info, published_date),
        _ => None,
    }
}

fn author_from_info(info: &str, published_date: &str) -> Option<String> {
    let section = info
        .strip_prefix(published_date)
        .map(str::trim)
        .unwrap_or(info);

    if let Some(caps) = BYLINE.captures(section) {
        let candidate = LABELLED_TIMESTAMP.replace_all(caps[1].trim(), "");
        let names = NAME_SEPARATORS
            .split(candidate.trim())
            .filter(|name| !name.is_empty())
            .join(", ");
        return (!names.is_empty()).then_some(names);
    }

    [LOCAL_REPORT_MARKER, COMPREHENSIVE_REPORT_MARKER]
        .into_iter()
        .find(|marker| info.contains(marker))
        .map(str::to_string)
}

fn extract_text(document: &Html) -> String {
    let Some(container) = document
        .select(&NEW_CONTENT)
        .next()
        .or_else(|| document.select(&OLD_CONTENT).next())
    else {
        return TEXT_NOT_FOUND.to_string();
    };

    let mut paragraphs = container.select(&PARAGRAPH).peekable();
    let lines: Vec<String> = if paragraphs.peek().is_some() {
        paragraphs
            .map(flattened_text)
            .filter(|line| is_body_line(line))
            .collect()
    } else {
        container
            .text()
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|line| is_body_line(line))
            .map(str::to_string)
            .collect()
    };

    if lines.is_empty() {
        TEXT_NOT_FOUND.to_string()
    } else {
        lines.join("\n\n")
    }
}

fn is_body_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with(IMAGE_CAPTION_MARKER)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Every descendant text node trimmed, empty ones dropped, concatenated
/// without a separator.
fn flattened_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
