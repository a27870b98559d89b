// src/feed/mod.rs
//! Tolerant multi-dialect feed parser.
//!
//! A document is tried against a closed set of shapes in a fixed priority
//! order. A shape matches only if its root element fits, it decodes, and it
//! holds at least one item: a permissive decode that finds nothing must not
//! mask the shape that actually fits.

pub(crate) mod formats;
pub mod time;

pub use time::parse_time;

use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::feed::formats::{first_text, AtomDoc, AtomEntry, RdfDoc, RssDoc, RssItem};
use crate::ingest::error::FeedError;
use crate::ingest::types::{Entry, Feed};

/// Document shapes, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    Rss,
    Atom,
    BareChannel,
    Rdf,
}

impl FeedFormat {
    pub const PRIORITY: [FeedFormat; 4] = [
        FeedFormat::Rss,
        FeedFormat::Atom,
        FeedFormat::BareChannel,
        FeedFormat::Rdf,
    ];

    /// Local name of the root element this shape requires.
    pub fn root_element(self) -> &'static str {
        match self {
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "feed",
            FeedFormat::BareChannel => "channel",
            FeedFormat::Rdf => "RDF",
        }
    }
}

/// Parse result with the bookkeeping the fetcher logs and counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub format: FeedFormat,
    pub entries: Vec<Entry>,
    /// Items dropped for lack of any usable link.
    pub skipped: usize,
    /// Entries kept without a parseable timestamp.
    pub undated: usize,
}

/// Parse raw feed bytes into normalized entries.
pub fn parse_feed(raw: &[u8], feed: &Feed) -> Result<Vec<Entry>, FeedError> {
    parse_feed_detailed(raw, feed).map(|p| p.entries)
}

pub fn parse_feed_detailed(raw: &[u8], feed: &Feed) -> Result<ParsedFeed, FeedError> {
    crate::metrics::ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let xml = prepare_document(raw);
    let root = match root_local_name(&xml) {
        Ok(r) => r,
        Err(reason) => {
            tracing::debug!(feed = %feed.title, %reason, "no readable root element");
            return Err(FeedError::UnrecognizedFormat);
        }
    };

    for format in FeedFormat::PRIORITY {
        if format.root_element() != root {
            continue;
        }
        match decode(format, &xml, feed) {
            Ok(Some(parsed)) => {
                histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                counter!("feed_items_skipped_total").increment(parsed.skipped as u64);
                counter!("feed_items_undated_total").increment(parsed.undated as u64);
                if parsed.skipped > 0 || parsed.undated > 0 {
                    tracing::debug!(
                        feed = %feed.title,
                        skipped = parsed.skipped,
                        undated = parsed.undated,
                        "lenient item handling"
                    );
                }
                return Ok(parsed);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(feed = %feed.title, ?format, error = %e, "shape did not decode");
            }
        }
    }

    Err(FeedError::UnrecognizedFormat)
}

/// `Ok(None)` means the shape decoded but held zero items.
fn decode(
    format: FeedFormat,
    xml: &str,
    feed: &Feed,
) -> Result<Option<ParsedFeed>, quick_xml::DeError> {
    let parsed = match format {
        FeedFormat::Rss => {
            let doc: RssDoc = quick_xml::de::from_str(xml)?;
            from_rss_items(format, doc.channel.items, feed)
        }
        FeedFormat::Atom => {
            let doc: AtomDoc = quick_xml::de::from_str(xml)?;
            from_atom_entries(doc.entries, feed)
        }
        FeedFormat::BareChannel => {
            let doc: formats::RssChannel = quick_xml::de::from_str(xml)?;
            from_rss_items(format, doc.items, feed)
        }
        FeedFormat::Rdf => {
            let doc: RdfDoc = quick_xml::de::from_str(xml)?;
            from_rss_items(format, doc.items, feed)
        }
    };
    Ok(parsed)
}

fn from_rss_items(format: FeedFormat, items: Vec<RssItem>, feed: &Feed) -> Option<ParsedFeed> {
    if items.is_empty() {
        return None;
    }
    let total = items.len();
    let entries: Vec<Entry> = items.iter().filter_map(|it| rss_entry(it, feed)).collect();
    Some(finish(format, total, entries))
}

fn from_atom_entries(items: Vec<AtomEntry>, feed: &Feed) -> Option<ParsedFeed> {
    if items.is_empty() {
        return None;
    }
    let total = items.len();
    let entries: Vec<Entry> = items.iter().filter_map(|it| atom_entry(it, feed)).collect();
    Some(finish(FeedFormat::Atom, total, entries))
}

fn finish(format: FeedFormat, total: usize, entries: Vec<Entry>) -> ParsedFeed {
    let undated = entries.iter().filter(|e| e.published.is_none()).count();
    ParsedFeed {
        format,
        skipped: total - entries.len(),
        undated,
        entries,
    }
}

fn rss_entry(item: &RssItem, feed: &Feed) -> Option<Entry> {
    let mut link = first_text(&item.link);
    if link.is_empty() {
        link = first_text(&item.guid);
    }
    if link.is_empty() {
        return None;
    }

    let mut date = first_text(&item.pub_date);
    if date.is_empty() {
        date = first_text(&item.dc_date);
    }

    Some(make_entry(feed, first_text(&item.title), link, date))
}

fn atom_entry(item: &AtomEntry, feed: &Feed) -> Option<Entry> {
    let mut link = item
        .links
        .iter()
        .find(|l| l.is_alternate())
        .map(|l| l.href.trim())
        .unwrap_or_default();
    if link.is_empty() {
        link = item.links.first().map(|l| l.href.trim()).unwrap_or_default();
    }
    if link.is_empty() {
        link = first_text(&item.id);
    }
    if link.is_empty() {
        return None;
    }

    let mut date = first_text(&item.published);
    if date.is_empty() {
        date = first_text(&item.updated);
    }

    Some(make_entry(feed, first_text(&item.title), link, date))
}

fn make_entry(feed: &Feed, title: &str, url: &str, date: &str) -> Entry {
    Entry {
        source_name: feed.title.clone(),
        source_url: feed.site_url.clone(),
        title: title.to_string(),
        url: url.to_string(),
        published: parse_time(date),
    }
}

/// Decode bytes leniently and neutralize HTML entities that are not legal
/// XML, so one `&nbsp;` does not sink the whole document.
fn prepare_document(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let s = String::from_utf8_lossy(raw);
    scrub_html_entities_for_xml(&s)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Local name of the first element, so `rdf:RDF` reads as `RDF`.
fn root_local_name(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err("document has no elements".to_string()),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> Feed {
        Feed::new("Blog", "https://blog.test/feed", "https://blog.test")
    }

    #[test]
    fn root_detection_skips_prolog_and_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<!-- generated -->
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"></rdf:RDF>"#;
        assert_eq!(root_local_name(xml).unwrap(), "RDF");
        assert!(root_local_name("plain text").is_err());
    }

    #[test]
    fn html_entities_do_not_break_decoding() {
        let xml = br#"<rss><channel><item><title>A&nbsp;B &mdash; C</title><link>https://blog.test/a</link></item></channel></rss>"#;
        let entries = parse_feed(xml, &feed()).unwrap();
        assert_eq!(entries[0].title, "A B - C");
    }

    #[test]
    fn bom_is_stripped() {
        let mut raw = b"\xEF\xBB\xBF".to_vec();
        raw.extend_from_slice(
            br#"<rss><channel><item><link>https://blog.test/a</link></item></channel></rss>"#,
        );
        let parsed = parse_feed_detailed(&raw, &feed()).unwrap();
        assert_eq!(parsed.format, FeedFormat::Rss);
        assert_eq!(parsed.undated, 1);
    }

    #[test]
    fn rss_without_items_is_unrecognized() {
        let xml = br#"<rss><channel><title>Empty</title></channel></rss>"#;
        assert!(matches!(
            parse_feed(xml, &feed()),
            Err(FeedError::UnrecognizedFormat)
        ));
    }
}
