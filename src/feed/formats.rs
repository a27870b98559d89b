// src/feed/formats.rs
//! Serde shapes for the feed dialects we understand. Fields are all optional
//! and defaulted: real-world feeds omit almost anything.
//!
//! quick-xml matches elements by local name, so `<atom:link>` lands on `link`
//! and `<media:title>` on `title`. Every element field is therefore a list and
//! readers take the first non-empty value.

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;

/// Text content of an element. Attributes are ignored
/// (`<guid isPermaLink="false">`, `<title type="html">`); text nested in child
/// elements (`<title type="xhtml"><div>..</div></title>`) is joined in.
#[derive(Debug, Default)]
pub(crate) struct Text {
    pub value: String,
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TextVisitor)
    }
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Text;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("element text")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Text, E> {
        Ok(Text {
            value: v.to_string(),
        })
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Text, E> {
        Ok(Text { value: v })
    }

    fn visit_unit<E: de::Error>(self) -> Result<Text, E> {
        Ok(Text::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Text, A::Error> {
        let mut value = String::new();
        while let Some(key) = map.next_key::<String>()? {
            if key.starts_with('@') {
                map.next_value::<IgnoredAny>()?;
                continue;
            }
            // `$text` for direct content, an element name for nested markup.
            let part = if key == "$text" {
                map.next_value::<String>()?
            } else {
                map.next_value::<Text>()?.value
            };
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(part);
        }
        Ok(Text { value })
    }
}

/// First non-empty value among repeated elements.
pub(crate) fn first_text(values: &[Text]) -> &str {
    values
        .iter()
        .map(|t| t.value.trim())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

// --- RSS 2.0 (<rss><channel><item>) and bare <channel> ---

#[derive(Debug, Deserialize)]
pub(crate) struct RssDoc {
    #[serde(default)]
    pub channel: RssChannel,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RssChannel {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RssItem {
    #[serde(default)]
    pub title: Vec<Text>,
    #[serde(default)]
    pub link: Vec<Text>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Vec<Text>,
    /// RSS 1.0 items date themselves with Dublin Core (`dc:date`) instead of
    /// pubDate.
    #[serde(rename = "date", alias = "dc:date", default)]
    pub dc_date: Vec<Text>,
    #[serde(default)]
    pub guid: Vec<Text>,
}

// --- RDF-wrapped RSS (<rdf:RDF><item>) ---

#[derive(Debug, Deserialize)]
pub(crate) struct RdfDoc {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

// --- Atom (<feed><entry>) ---

#[derive(Debug, Deserialize)]
pub(crate) struct AtomDoc {
    #[serde(rename = "entry", default)]
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AtomEntry {
    #[serde(default)]
    pub title: Vec<Text>,
    #[serde(rename = "link", default)]
    pub links: Vec<AtomLink>,
    #[serde(default)]
    pub updated: Vec<Text>,
    #[serde(default)]
    pub published: Vec<Text>,
    #[serde(default)]
    pub id: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AtomLink {
    #[serde(rename = "@href", default)]
    pub href: String,
    #[serde(rename = "@rel", default)]
    pub rel: Option<String>,
}

impl AtomLink {
    /// No rel, empty rel and `alternate` all point at the article itself.
    pub fn is_alternate(&self) -> bool {
        matches!(
            self.rel.as_deref().map(str::trim),
            None | Some("") | Some("alternate")
        )
    }
}
