// tests/feed_links.rs
//
// Link selection and item skipping for RSS and Atom.

use engblogs::feed::parse_feed_detailed;
use engblogs::Feed;

fn meta() -> Feed {
    Feed::new("Blog", "https://blog.test/feed", "https://blog.test")
}

fn atom(entries: &str) -> String {
    format!(r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom">{entries}</feed>"#)
}

#[test]
fn atom_without_alternate_uses_the_only_link() {
    let xml = atom(
        r#"<entry><title>Related only</title>
           <link rel="related" href="https://blog.test/related-only"/>
           <id>tag:blog.test,2024:1</id>
           <updated>2024-01-08T00:00:00Z</updated></entry>"#,
    );
    let parsed = parse_feed_detailed(xml.as_bytes(), &meta()).unwrap();
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.entries[0].url, "https://blog.test/related-only");
}

#[test]
fn atom_link_without_rel_counts_as_alternate() {
    let xml = atom(
        r#"<entry><title>Two links</title>
           <link rel="self" href="https://blog.test/self"/>
           <link href="https://blog.test/article"/>
           </entry>"#,
    );
    let parsed = parse_feed_detailed(xml.as_bytes(), &meta()).unwrap();
    assert_eq!(parsed.entries[0].url, "https://blog.test/article");
}

#[test]
fn atom_without_links_falls_back_to_id() {
    let xml = atom(
        r#"<entry><title>Id only</title>
           <id> https://blog.test/by-id </id>
           <updated>2024-01-08T00:00:00Z</updated></entry>"#,
    );
    let parsed = parse_feed_detailed(xml.as_bytes(), &meta()).unwrap();
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.entries[0].url, "https://blog.test/by-id");
}

#[test]
fn atom_without_link_or_id_is_skipped() {
    let xml = atom(
        r#"<entry><title>Nothing to point at</title><updated>2024-01-08T00:00:00Z</updated></entry>
           <entry><title>Fine</title><link href="https://blog.test/fine"/></entry>"#,
    );
    let parsed = parse_feed_detailed(xml.as_bytes(), &meta()).unwrap();
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.entries[0].title, "Fine");
}

#[test]
fn atom_falls_back_to_updated_when_published_missing() {
    let xml = atom(
        r#"<entry><title>Updated only</title><link href="https://blog.test/u"/>
           <updated>2024-01-08T06:00:00Z</updated></entry>"#,
    );
    let parsed = parse_feed_detailed(xml.as_bytes(), &meta()).unwrap();
    assert_eq!(
        parsed.entries[0].published.map(|p| p.to_rfc3339()),
        Some("2024-01-08T06:00:00+00:00".to_string())
    );
}

#[test]
fn rss_link_falls_back_to_guid_then_skips() {
    let xml = br#"<rss version="2.0"><channel>
        <item><title>Guid only</title><link>   </link><guid>https://blog.test/guid-only</guid></item>
        <item><title>Nothing</title><description>no link, no guid</description></item>
    </channel></rss>"#;
    let parsed = parse_feed_detailed(xml, &meta()).unwrap();
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.entries[0].url, "https://blog.test/guid-only");
}

#[test]
fn a_feed_whose_items_are_all_skipped_is_still_recognized() {
    let xml = br#"<rss><channel><item><title>No link</title></item></channel></rss>"#;
    let parsed = parse_feed_detailed(xml, &meta()).expect("shape matched");
    assert!(parsed.entries.is_empty());
    assert_eq!(parsed.skipped, 1);
}
