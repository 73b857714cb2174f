use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Catalogue records ─────────────────────────────────────────────────────────

/// One clip scraped from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub pid: String,
    pub title: String,
    pub duration_secs: u32,
    pub thumbnail: String,
}

/// Synthetic pagination entry injected alongside the clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "page", rename_all = "lowercase")]
pub enum PageMarker {
    Next(u32),
    Previous(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipEntry {
    Page(PageMarker),
    Clip(ClipRecord),
}

/// Everything one clip listing document yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub page: u32,
    pub has_next: bool,
    pub clips: Vec<ClipRecord>,
}

impl ListingPage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Markers first (next, then previous), then clips in page order.
    pub fn into_entries(self) -> Vec<ClipEntry> {
        let mut entries = Vec::with_capacity(self.clips.len() + 2);
        if let Some(next) = self.page.checked_add(1).filter(|_| self.has_next) {
            entries.push(ClipEntry::Page(PageMarker::Next(next)));
        }
        if self.has_previous() {
            entries.push(ClipEntry::Page(PageMarker::Previous(self.page - 1)));
        }
        entries.extend(self.clips.into_iter().map(ClipEntry::Clip));
        entries
    }
}

/// One podcast episode from the RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastRecord {
    pub title: String,
    pub air_date: NaiveDate,
    pub url: String,
    pub size: u64,
    pub duration_secs: u64,
}

/// CDN connection picked out of a media selection document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConnection {
    pub protocol: String,
    pub server: String,
    pub identifier: String,
    pub auth: String,
}

// ── Host runtime records ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub is_playable: bool,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ItemInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_info: Option<StreamInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// `dd.mm.yyyy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamInfo {
    Video { duration: u32 },
    Audio { codec: String, language: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMethod {
    PlaylistOrder,
    Date,
    Duration,
    Title,
    Size,
}

/// A directory the host should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Listing {
    pub items: Vec<ListItem>,
    #[serde(default)]
    pub sort_methods: Vec<SortMethod>,
    /// Replace the current listing instead of pushing a new one.
    #[serde(default)]
    pub update_listing: bool,
}

/// What a dispatched route hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Directory(Listing),
    Resolved { url: String },
}
