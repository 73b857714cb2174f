//! Scraper for the programme's paginated clip listing pages.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    error::{CatalogueError, Result},
    models::{ClipRecord, ListingPage},
};

static RE_PID: once_cell::sync::Lazy<Regex> =
    once_cell::sync::Lazy::new(|| Regex::new(r"/(\w+)#").unwrap());
static RE_THUMB_SIZE: once_cell::sync::Lazy<Regex> =
    once_cell::sync::Lazy::new(|| Regex::new(r"/\d{3,}x\d{3,}/").unwrap());

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CatalogueError::parse(format!("selector {css:?}: {e:?}")))
}

/// Pull the clip pid out of a structured reference such as
/// `/programmes/p01abcd3#programme`.
pub fn extract_pid(reference: &str) -> Result<String> {
    RE_PID
        .captures(reference)
        .map(|c| c[1].to_string())
        .ok_or_else(|| CatalogueError::PatternMismatch {
            pattern: r"/(\w+)#",
            input: reference.to_string(),
        })
}

/// Swap the `/WIDTHxHEIGHT/` segment of an ichef image URL for the target size.
pub fn rewrite_thumbnail(src: &str, width: u32, height: u32) -> String {
    RE_THUMB_SIZE
        .replace(src, format!("/{width}x{height}/").as_str())
        .into_owned()
}

/// Parse the duration label shown on a clip (`"Duration: 12:34"`) into seconds.
pub fn parse_duration(text: &str) -> Result<u32> {
    let bad = || CatalogueError::parse(format!("malformed clip duration {text:?}"));

    let mm_ss = text.split_whitespace().nth(1).ok_or_else(bad)?;
    let (minutes, seconds) = mm_ss.split_once(':').ok_or_else(bad)?;
    let minutes: u32 = minutes.parse().map_err(|_| bad())?;
    let seconds: u32 = seconds.parse().map_err(|_| bad())?;
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(bad)
}

/// Parse one clip listing page.
///
/// Missing pagination or entry structure is an error rather than an empty
/// page, so layout changes upstream surface immediately.
pub fn parse_listing(html: &str, page: u32, thumb_size: (u32, u32)) -> Result<ListingPage> {
    let document = Html::parse_document(html);

    let pagination_sel = selector("div.pagination")?;
    let next_disabled_sel = selector("li.next.disabled")?;
    let entry_sel = selector("li[content]")?;

    let pagination = document
        .select(&pagination_sel)
        .next()
        .ok_or_else(|| CatalogueError::parse("clip page has no pagination block"))?;
    let has_next = pagination.select(&next_disabled_sel).next().is_none();

    let mut clips = Vec::new();
    for li in document.select(&entry_sel) {
        let Some(reference) = li.value().attr("content") else {
            continue;
        };
        if !RE_PID.is_match(reference) {
            continue;
        }
        clips.push(parse_entry(li, reference, thumb_size)?);
    }

    tracing::debug!(
        "clip page {page}: {} clip(s), has_next={has_next}",
        clips.len()
    );

    Ok(ListingPage {
        page,
        has_next,
        clips,
    })
}

fn parse_entry(li: ElementRef<'_>, reference: &str, thumb_size: (u32, u32)) -> Result<ClipRecord> {
    let title_sel = selector(r#"span[property="dc:title"]"#)?;
    let duration_sel = selector("span.duration")?;
    let img_sel = selector("span.depiction img")?;

    let pid = extract_pid(reference)?;

    let title = li
        .select(&title_sel)
        .next()
        .map(element_text)
        .ok_or_else(|| CatalogueError::parse(format!("clip {pid} has no title")))?;

    let duration_text = li
        .select(&duration_sel)
        .next()
        .map(element_text)
        .ok_or_else(|| CatalogueError::parse(format!("clip {pid} has no duration")))?;

    let thumb_src = li
        .select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| CatalogueError::parse(format!("clip {pid} has no depiction image")))?;

    Ok(ClipRecord {
        duration_secs: parse_duration(&duration_text)?,
        thumbnail: rewrite_thumbnail(thumb_src, thumb_size.0, thumb_size.1),
        title,
        pid,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn clip_li(pid: &str, title: &str, duration: &str) -> String {
        format!(
            r#"<li typeof="po:Clip" about="/programmes/{pid}#programme" content="/programmes/{pid}#programme">
  <span class="depiction"><img src="http://ichef.bbci.co.uk/images/ic/272x153/{pid}.jpg" alt=""></span>
  <span property="dc:title">{title}</span>
  <span class="duration">Duration: {duration}</span>
</li>"#
        )
    }

    pub fn clip_page(next_disabled: bool, items: &[String]) -> String {
        let next_class = if next_disabled { "next disabled" } else { "next" };
        format!(
            r#"<html><body>
<div class="pagination"><ol><li class="previous">Prev</li><li class="{next_class}"><a href="?page=2">Next</a></li></ol></div>
<ul class="clips">
<li class="nav">not a clip</li>
{}
</ul>
</body></html>"#,
            items.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("Duration: 12:34").unwrap(), 754);
        assert_eq!(parse_duration("Duration: 00:09").unwrap(), 9);
    }

    #[test]
    fn rejects_malformed_durations() {
        for bad in ["Duration: ab:09", "Duration: 12", "12:34", "Duration: 1:x", "Duration: 99999999:00"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.kind(), "parse", "{bad}");
        }
    }

    #[test]
    fn thumbnail_rewrite_is_idempotent() {
        let src = "http://ichef.bbci.co.uk/images/ic/272x153/p01abcd3.jpg";
        let once = rewrite_thumbnail(src, 640, 360);
        assert_eq!(once, "http://ichef.bbci.co.uk/images/ic/640x360/p01abcd3.jpg");
        assert_eq!(rewrite_thumbnail(&once, 640, 360), once);
    }

    #[test]
    fn thumbnail_without_size_segment_is_unchanged() {
        let src = "http://example.com/img/p01.jpg";
        assert_eq!(rewrite_thumbnail(src, 640, 360), src);
    }

    #[test]
    fn extracts_pid_or_reports_mismatch() {
        assert_eq!(extract_pid("/programmes/p01abcd3#programme").unwrap(), "p01abcd3");
        let err = extract_pid("no-anchor-here").unwrap_err();
        assert_eq!(err.kind(), "pattern_mismatch");
    }

    #[test]
    fn parses_listing_entries_in_order() {
        let html = clip_page(
            false,
            &[
                clip_li("p01aaaa1", "Mark reviews Gravity", "12:34"),
                clip_li("p01bbbb2", "Simon &amp; Mark", "00:09"),
            ],
        );
        let page = parse_listing(&html, 1, (640, 360)).unwrap();
        assert!(page.has_next);
        assert_eq!(page.clips.len(), 2);
        assert_eq!(page.clips[0].pid, "p01aaaa1");
        assert_eq!(page.clips[0].title, "Mark reviews Gravity");
        assert_eq!(page.clips[0].duration_secs, 754);
        assert_eq!(
            page.clips[0].thumbnail,
            "http://ichef.bbci.co.uk/images/ic/640x360/p01aaaa1.jpg"
        );
        assert_eq!(page.clips[1].title, "Simon & Mark");
        assert_eq!(page.clips[1].duration_secs, 9);
    }

    #[test]
    fn disabled_next_means_no_next_page() {
        let html = clip_page(true, &[clip_li("p01aaaa1", "Last", "01:00")]);
        let page = parse_listing(&html, 7, (640, 360)).unwrap();
        assert!(!page.has_next);
        assert!(page.has_previous());
    }

    #[test]
    fn missing_pagination_is_a_parse_error() {
        let html = format!("<ul>{}</ul>", clip_li("p01aaaa1", "x", "01:00"));
        let err = parse_listing(&html, 1, (640, 360)).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn entry_without_duration_is_a_parse_error() {
        let li = r#"<li content="/programmes/p01cccc3#programme"><span property="dc:title">t</span></li>"#;
        let html = clip_page(false, &[li.to_string()]);
        let err = parse_listing(&html, 1, (640, 360)).unwrap_err();
        assert!(err.to_string().contains("p01cccc3 has no duration"));
    }
}
