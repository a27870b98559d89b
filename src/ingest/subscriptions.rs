// src/ingest/subscriptions.rs
//! Subscription list loading from an OPML outline file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::types::Feed;

#[derive(Debug, Deserialize)]
struct Opml {
    #[serde(default)]
    body: OpmlBody,
}

#[derive(Debug, Default, Deserialize)]
struct OpmlBody {
    #[serde(rename = "outline", default)]
    outlines: Vec<Outline>,
}

#[derive(Debug, Default, Deserialize)]
struct Outline {
    #[serde(rename = "@text", default)]
    text: String,
    #[serde(rename = "@title", default)]
    title: String,
    #[serde(rename = "@xmlUrl", default)]
    xml_url: String,
    #[serde(rename = "@htmlUrl", default)]
    html_url: String,
    #[serde(rename = "outline", default)]
    children: Vec<Outline>,
}

/// Read an OPML file and return its feeds, first occurrence per feed URL.
pub fn load_subscriptions(path: &Path) -> Result<Vec<Feed>> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("reading subscriptions from {}", path.display()))?;
    let feeds = parse_opml(&xml)
        .with_context(|| format!("parsing subscriptions in {}", path.display()))?;
    Ok(dedup_feeds(feeds))
}

/// Every outline with an `xmlUrl`, at any nesting depth, in document order.
pub fn parse_opml(xml: &str) -> Result<Vec<Feed>> {
    let opml: Opml = quick_xml::de::from_str(xml).context("decoding OPML")?;
    let mut feeds = Vec::new();
    collect(&opml.body.outlines, &mut feeds);
    Ok(feeds)
}

fn collect(outlines: &[Outline], out: &mut Vec<Feed>) {
    for o in outlines {
        let feed_url = o.xml_url.trim();
        if !feed_url.is_empty() {
            let title = match o.title.trim() {
                "" => o.text.trim(),
                t => t,
            };
            out.push(Feed::new(title, feed_url, o.html_url.trim()));
        }
        collect(&o.children, out);
    }
}

pub fn dedup_feeds(feeds: Vec<Feed>) -> Vec<Feed> {
    let mut seen = HashSet::new();
    feeds
        .into_iter()
        .filter(|f| seen.insert(f.feed_url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_text() {
        let xml = r#"<opml version="1.0"><body>
            <outline text="Only Text" xmlUrl="https://a.test/feed" htmlUrl="https://a.test"/>
        </body></opml>"#;
        let feeds = parse_opml(xml).unwrap();
        assert_eq!(feeds, vec![Feed::new("Only Text", "https://a.test/feed", "https://a.test")]);
    }

    #[test]
    fn dedup_keeps_first() {
        let feeds = vec![
            Feed::new("First", "https://a.test/feed", ""),
            Feed::new("Second", "https://a.test/feed", ""),
            Feed::new("Other", "https://b.test/feed", ""),
        ];
        let titles: Vec<String> = dedup_feeds(feeds).into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["First", "Other"]);
    }
}
