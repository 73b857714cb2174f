//! RSS feed reader for the podcast episodes.

use chrono::NaiveDate;

use crate::{
    document::{Document, Element},
    error::{CatalogueError, Result},
    models::PodcastRecord,
};

/// Parse an RFC 822 `pubDate` by its leading `"Mon, 07 Oct 2024"` part.
pub fn parse_air_date(pub_date: &str) -> Result<NaiveDate> {
    let prefix: String = pub_date.trim().chars().take(16).collect();
    NaiveDate::parse_from_str(&prefix, "%a, %d %b %Y")
        .map_err(|e| CatalogueError::parse(format!("bad pubDate {pub_date:?}: {e}")))
}

fn parse_count(el: &Element, attr: &str) -> Result<u64> {
    let raw = el.required_attr(attr)?;
    raw.trim().parse().map_err(|_| {
        CatalogueError::parse(format!("<{}> {attr}={raw:?} is not a count", el.name))
    })
}

fn parse_item(item: &Element) -> Result<PodcastRecord> {
    let title = item
        .child("title")
        .map(Element::text)
        .ok_or_else(|| CatalogueError::parse("feed item has no title"))?;

    let pub_date = item
        .child("pubdate")
        .map(Element::text)
        .ok_or_else(|| CatalogueError::parse(format!("feed item {title:?} has no pubDate")))?;

    let media = item
        .child("media:content")
        .ok_or_else(|| CatalogueError::parse(format!("feed item {title:?} has no media:content")))?;

    Ok(PodcastRecord {
        air_date: parse_air_date(&pub_date)?,
        url: media.required_attr("url")?.to_string(),
        size: parse_count(media, "fileSize")?,
        duration_secs: parse_count(media, "duration")?,
        title,
    })
}

/// Every `<item>` in the feed, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<PodcastRecord>> {
    let doc = Document::parse(xml);
    let items = doc.find_all(Some("item"), &[]);
    tracing::debug!("podcast feed: {} item(s)", items.len());
    items.into_iter().map(parse_item).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:media="http://search.yahoo.com/mrss/" version="2.0">
  <channel>
    <title>Kermode and Mayo's Film Review</title>
    <item>
      <title>Kermode &amp; Mayo: 11 Oct 24</title>
      <pubDate>Fri, 11 Oct 2024 14:00:00 +0100</pubDate>
      <link>http://www.bbc.co.uk/programmes/b00lvdrj</link>
      <media:content url="http://open.live.bbc.co.uk/mediaselector/kermode_20241011.mp3" fileSize="98765432" type="audio/mpeg" medium="audio" expression="full" duration="6120"/>
    </item>
    <item>
      <title><![CDATA[Kermode and Mayo: 07 Oct 24]]></title>
      <pubDate>Mon, 07 Oct 2024 10:00:00 GMT</pubDate>
      <media:content url="http://open.live.bbc.co.uk/mediaselector/kermode_20241007.mp3" fileSize="0" duration="59"/>
    </item>
  </channel>
</rss>"#;
}
