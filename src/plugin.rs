//! Plugin surface the host navigates: routes, dispatch and list items.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    clips,
    config::AppConfig,
    error::{CatalogueError, Result},
    fetch::Fetcher,
    models::{
        ClipEntry, ClipRecord, ItemInfo, ListItem, Listing, Outcome, PageMarker, PodcastRecord,
        SortMethod, StreamInfo,
    },
    podcasts, resolver,
    strings::{self, StringTable},
};

// ── Routes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Podcasts,
    Clips { page: u32 },
    PlayClip { pid: String },
}

impl Route {
    /// Parse a plugin path such as `/clips/page/2`.
    pub fn parse(path: &str) -> Result<Route> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Ok(Route::Index),
            ["podcasts"] => Ok(Route::Podcasts),
            ["clips"] => Ok(Route::Clips { page: 1 }),
            ["clips", "page", page] => {
                let page = page
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| {
                        CatalogueError::BadRequest(format!("page {page:?} is not a positive number"))
                    })?;
                Ok(Route::Clips { page })
            }
            ["clip", pid] => {
                if pid.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    Ok(Route::PlayClip {
                        pid: (*pid).to_string(),
                    })
                } else {
                    Err(CatalogueError::BadRequest(format!("invalid clip id {pid:?}")))
                }
            }
            _ => Err(CatalogueError::UnknownRoute(path.to_string())),
        }
    }

    /// The plugin path for this route (`url_for`).
    pub fn path(&self) -> String {
        match self {
            Route::Index => "/".to_string(),
            Route::Podcasts => "/podcasts".to_string(),
            Route::Clips { page } => format!("/clips/page/{page}"),
            Route::PlayClip { pid } => format!("/clip/{pid}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

/// Handlers for every route. Holds only immutable state, so one instance is
/// shared by all requests.
#[derive(Clone)]
pub struct Catalogue {
    config: Arc<AppConfig>,
    fetcher: Arc<dyn Fetcher>,
    strings: Arc<StringTable>,
}

impl fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalogue")
            .field("config", &self.config)
            .field("strings", &self.strings)
            .finish_non_exhaustive()
    }
}

impl Catalogue {
    pub fn new(config: Arc<AppConfig>, fetcher: Arc<dyn Fetcher>, strings: Arc<StringTable>) -> Self {
        Self {
            config,
            fetcher,
            strings,
        }
    }

    pub async fn dispatch(&self, route: &Route) -> Result<Outcome> {
        tracing::debug!("dispatch {route}");
        match route {
            Route::Index => Ok(Outcome::Directory(self.index())),
            Route::Podcasts => self.podcasts().await.map(Outcome::Directory),
            Route::Clips { page } => self.clips(*page).await.map(Outcome::Directory),
            Route::PlayClip { pid } => {
                let url = self.play_clip(pid).await?;
                Ok(Outcome::Resolved { url })
            }
        }
    }

    pub fn index(&self) -> Listing {
        let entry = |label: u32, route: Route| ListItem {
            label: self.strings.get(label).to_string(),
            path: route.path(),
            ..Default::default()
        };
        Listing {
            items: vec![
                entry(strings::PODCASTS, Route::Podcasts),
                entry(strings::CLIPS, Route::Clips { page: 1 }),
            ],
            ..Default::default()
        }
    }

    /// Raw clip entries for one page: pagination markers then clips.
    pub async fn list_clips(&self, page: u32) -> Result<Vec<ClipEntry>> {
        let html = self
            .fetcher
            .fetch_text(&self.config.clip_page_endpoint(page))
            .await?;
        let listing = clips::parse_listing(
            &html,
            page,
            (self.config.thumb_width, self.config.thumb_height),
        )?;
        Ok(listing.into_entries())
    }

    pub async fn clips(&self, page: u32) -> Result<Listing> {
        let items = self
            .list_clips(page)
            .await?
            .into_iter()
            .map(|entry| match entry {
                ClipEntry::Page(marker) => self.page_item(marker),
                ClipEntry::Clip(clip) => self.clip_item(clip),
            })
            .collect();

        Ok(Listing {
            items,
            sort_methods: vec![
                SortMethod::PlaylistOrder,
                SortMethod::Duration,
                SortMethod::Title,
            ],
            update_listing: page > 1,
        })
    }

    pub async fn list_podcasts(&self) -> Result<Vec<PodcastRecord>> {
        let xml = self.fetcher.fetch_text(&self.config.podcast_feed_url).await?;
        podcasts::parse_feed(&xml)
    }

    pub async fn podcasts(&self) -> Result<Listing> {
        let items = self
            .list_podcasts()
            .await?
            .into_iter()
            .map(|p| self.podcast_item(p))
            .collect();

        Ok(Listing {
            items,
            sort_methods: vec![
                SortMethod::Date,
                SortMethod::Duration,
                SortMethod::Title,
                SortMethod::Size,
            ],
            update_listing: false,
        })
    }

    pub async fn play_clip(&self, pid: &str) -> Result<String> {
        resolver::resolve_playback_url(self.fetcher.as_ref(), &self.config, pid).await
    }

    fn album(&self) -> Option<String> {
        Some(self.strings.get(strings::ALBUM).to_string())
    }

    fn page_item(&self, marker: PageMarker) -> ListItem {
        let (label, page) = match marker {
            PageMarker::Next(page) => (
                format!("{} ({page}) >>", self.strings.get(strings::NEXT_PAGE)),
                page,
            ),
            PageMarker::Previous(page) => (
                format!("<< {} ({page})", self.strings.get(strings::PREVIOUS_PAGE)),
                page,
            ),
        };
        ListItem {
            label,
            path: Route::Clips { page }.path(),
            ..Default::default()
        }
    }

    fn clip_item(&self, clip: ClipRecord) -> ListItem {
        ListItem {
            label: clip.title.clone(),
            thumbnail: Some(clip.thumbnail),
            is_playable: true,
            path: Route::PlayClip { pid: clip.pid }.path(),
            info: Some(ItemInfo {
                title: clip.title,
                album: self.album(),
                ..Default::default()
            }),
            stream_info: Some(StreamInfo::Video {
                duration: clip.duration_secs,
            }),
            properties: BTreeMap::new(),
        }
    }

    fn podcast_item(&self, podcast: PodcastRecord) -> ListItem {
        ListItem {
            label: podcast.title.clone(),
            thumbnail: Some(self.config.podcast_thumb.clone()),
            is_playable: true,
            path: podcast.url,
            info: Some(ItemInfo {
                title: podcast.title,
                album: self.album(),
                date: Some(podcast.air_date.format("%d.%m.%Y").to_string()),
                size: Some(podcast.size),
                duration: Some(podcast.duration_secs),
            }),
            stream_info: Some(StreamInfo::Audio {
                codec: "mp3".to_string(),
                language: "en".to_string(),
            }),
            properties: BTreeMap::from([("mimetype".to_string(), "audio/mpeg".to_string())]),
        }
    }
}
