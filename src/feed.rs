//! PTS RSS feed retrieval and keyword search.
//!
//! Parsing is delegated to `feed-rs`, so RSS 0.9x/1.0/2.0, Atom and JSON Feed
//! documents are all accepted, along with namespaced extensions such as
//! `<media:title>` or `<dc:creator>`. Each entry is reduced to a
//! [`FeedEntry`]; everything else in the feed is ignored.

use crate::fetch::Fetch;
use crate::models::FeedEntry;
use feed_rs::model::Entry;
use feed_rs::parser::{self, ParseFeedError};
use tracing::{debug, error, info, instrument};

pub const DEFAULT_FEED_URL: &str = "https://news.pts.org.tw/xml/newsfeed.xml";

/// Parse a feed document into its entries, in feed order.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, ParseFeedError> {
    let feed = parser::parse(xml)?;
    Ok(feed.entries.iter().map(to_feed_entry).collect())
}

fn to_feed_entry(entry: &Entry) -> FeedEntry {
    FeedEntry {
        title: entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        link: entry_link(entry),
        summary: entry
            .summary
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
    }
}

/// The entry's alternate link, else its first non-empty link.
fn entry_link(entry: &Entry) -> String {
    let mut links = entry.links.iter().filter(|l| !l.href.trim().is_empty());
    links
        .clone()
        .find(|l| {
            l.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| links.next())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default()
}

/// Fetch and parse the feed at `url`.
///
/// Failures are logged and yield an empty list; the caller treats "no
/// entries" and "no feed" the same way.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_feed<F: Fetch>(fetcher: &F, url: &str) -> Vec<FeedEntry> {
    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Error fetching RSS feed");
            return Vec::new();
        }
    };

    match parse_feed(&body.bytes) {
        Ok(entries) => {
            info!(count = entries.len(), "Fetched RSS feed");
            entries
        }
        Err(e) => {
            error!(error = %e, "Error parsing RSS feed");
            Vec::new()
        }
    }
}

/// Entries whose title or summary contains `keyword`, ignoring case.
pub fn search_entries<'a>(entries: &'a [FeedEntry], keyword: &str) -> Vec<&'a FeedEntry> {
    let keyword = keyword.to_lowercase();
    let found = entries
        .iter()
        .filter(|entry| {
            entry.title.to_lowercase().contains(&keyword)
                || entry.summary.to_lowercase().contains(&keyword)
        })
        .collect::<Vec<_>>();
    debug!(%keyword, matches = found.len(), "Searched feed entries");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DEFAULT_TIMEOUT, HttpFetcher};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>公視新聞網</title>
    <link>https://news.pts.org.tw/</link>
    <atom:link href="https://news.pts.org.tw/xml/newsfeed.xml" rel="self"/>
    <item>
      <title>Rust 1.80 Released</title>
      <link>https://news.pts.org.tw/article/1</link>
      <description><![CDATA[<p>New <b>LazyLock</b> type</p>]]></description>
    </item>
    <language>zh-tw</language>
    <item>
      <title>颱風動態&amp;豪雨特報</title>
      <link>https://news.pts.org.tw/article/2</link>
      <description>中央氣象署發布海上颱風警報</description>
      <pubDate>Mon, 01 Jul 2024 10:00:00 +0800</pubDate>
    </item>
    <item>
      <link>https://news.pts.org.tw/article/3</link>
    </item>
  </channel>
</rss>"#;

    fn entry(title: &str, summary: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: String::new(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_parse_feed_items() {
        let entries = parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Rust 1.80 Released");
        assert!(entries[0].summary.contains("<b>LazyLock</b>"));
        assert_eq!(entries[0].link, "https://news.pts.org.tw/article/1");
        assert_eq!(entries[1].title, "颱風動態&豪雨特報");
        assert_eq!(entries[1].link, "https://news.pts.org.tw/article/2");
        assert_eq!(entries[2].title, "");
        assert_eq!(entries[2].summary, "");
    }

    #[test]
    fn test_parse_feed_without_items() {
        let xml = "<rss><channel><title>empty</title></channel></rss>";
        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(b"<html><body>not a feed").is_err());
    }

    #[test]
    fn test_parse_feed_tolerates_namespaced_item_children() {
        let xml = r#"<rss version="2.0"
            xmlns:media="http://search.yahoo.com/mrss/"
            xmlns:dc="http://purl.org/dc/elements/1.1/">
          <channel>
            <title>公視新聞網</title>
            <item>
              <title>颱風動態</title>
              <media:title>颱風動態（影音）</media:title>
              <dc:creator>王小明</dc:creator>
              <link>https://news.pts.org.tw/article/1</link>
              <description>豪雨特報</description>
            </item>
            <item>
              <title>選舉速報</title>
              <link>https://news.pts.org.tw/article/2</link>
              <description>投票率</description>
            </item>
          </channel>
        </rss>"#;

        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "颱風動態");
        assert_eq!(entries[0].link, "https://news.pts.org.tw/article/1");
        assert_eq!(entries[0].summary, "豪雨特報");
        assert_eq!(entries[1].title, "選舉速報");
    }

    #[test]
    fn test_parse_atom_feed() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
          <title>公視新聞網</title>
          <id>urn:pts:news</id>
          <updated>2024-07-01T02:00:00Z</updated>
          <entry>
            <title>颱風動態</title>
            <id>urn:pts:article:1</id>
            <updated>2024-07-01T02:00:00Z</updated>
            <link rel="related" href="https://news.pts.org.tw/related/1"/>
            <link rel="alternate" href="https://news.pts.org.tw/article/1"/>
            <summary>中央氣象署發布海上颱風警報</summary>
          </entry>
        </feed>"#;

        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "颱風動態");
        assert_eq!(entries[0].link, "https://news.pts.org.tw/article/1");
        assert_eq!(entries[0].summary, "中央氣象署發布海上颱風警報");
    }

    #[test]
    fn test_parse_rdf_feed() {
        let xml = r#"<?xml version="1.0"?>
        <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                 xmlns="http://purl.org/rss/1.0/">
          <channel rdf:about="https://news.pts.org.tw/">
            <title>公視新聞網</title>
            <link>https://news.pts.org.tw/</link>
            <description>新聞</description>
          </channel>
          <item rdf:about="https://news.pts.org.tw/article/1">
            <title>颱風動態</title>
            <link>https://news.pts.org.tw/article/1</link>
            <description>豪雨特報</description>
          </item>
        </rdf:RDF>"#;

        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "颱風動態");
        assert_eq!(entries[0].link, "https://news.pts.org.tw/article/1");
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_summary() {
        let entries = vec![
            entry("Rust Weekly", "systems news"),
            entry("颱風動態", "RUSTY pipes found"),
            entry("選舉", "投票率"),
        ];

        let found = search_entries(&entries, "rust");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "Rust Weekly");
        assert_eq!(found[1].title, "颱風動態");

        let found = search_entries(&entries, "投票");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "選舉");

        assert!(search_entries(&entries, "missing").is_empty());
    }

    #[test]
    fn test_search_empty_entries() {
        assert!(search_entries(&[], "anything").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/xml/newsfeed.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(FEED)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).unwrap();
        let entries = fetch_feed(&fetcher, &format!("{}/xml/newsfeed.xml", server.url())).await;

        assert_eq!(entries.len(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_feed_failure_yields_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/xml/newsfeed.xml")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).unwrap();
        let entries = fetch_feed(&fetcher, &format!("{}/xml/newsfeed.xml", server.url())).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_feed_unparsable_yields_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/xml/newsfeed.xml")
            .with_status(200)
            .with_body("<html>maintenance")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT).unwrap();
        let entries = fetch_feed(&fetcher, &format!("{}/xml/newsfeed.xml", server.url())).await;
        assert!(entries.is_empty());
    }
}
