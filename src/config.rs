use anyhow::Context;
use serde::Deserialize;

/// Application configuration, loaded from environment variables / .env.
///
/// Endpoint templates use named placeholders (`{page}`, `{pid}`, `{vpid}`)
/// which are substituted verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Clip listing page, templated on `{page}`.
    #[serde(default = "default_clip_page_url")]
    pub clip_page_url: String,

    /// iPlayer playlist document, templated on `{pid}`.
    #[serde(default = "default_playlist_url")]
    pub playlist_url: String,

    /// Media selector document, templated on `{vpid}`.
    #[serde(default = "default_media_selector_url")]
    pub media_selector_url: String,

    #[serde(default = "default_podcast_feed_url")]
    pub podcast_feed_url: String,

    /// Artwork shown for every podcast episode.
    #[serde(default = "default_podcast_thumb")]
    pub podcast_thumb: String,

    /// Flash player asset the RTMP server verifies against (`swfurl=`).
    #[serde(default = "default_swf_url")]
    pub swf_url: String,

    /// `service` attribute of the media element to stream from.
    #[serde(default = "default_stream_service")]
    pub stream_service: String,

    /// `supplier` attribute of the CDN connection to use.
    #[serde(default = "default_stream_supplier")]
    pub stream_supplier: String,

    #[serde(default = "default_thumb_width")]
    pub thumb_width: u32,

    #[serde(default = "default_thumb_height")]
    pub thumb_height: u32,

    /// Per-request timeout for outbound fetches.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional HTTP proxy for all outbound fetches.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Number of times to retry a failed fetch (0 = no retries).
    /// Each retry waits 2^n seconds (2s, 4s, 8s, …).
    #[serde(default)]
    pub fetch_retries: u32,

    /// Optional JSON file overriding the built-in label strings.
    #[serde(default)]
    pub strings_path: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_clip_page_url() -> String {
    "http://bbc.co.uk/programmes/b00lvdrj/clips/?page={page}".to_string()
}
fn default_playlist_url() -> String {
    "http://bbc.co.uk/iplayer/playlist/{pid}".to_string()
}
fn default_media_selector_url() -> String {
    "http://open.live.bbc.co.uk/mediaselector/5/select/version/2.0/mediaset/pc/vpid/{vpid}"
        .to_string()
}
fn default_podcast_feed_url() -> String {
    "http://downloads.bbc.co.uk/podcasts/fivelive/kermode/rss.xml".to_string()
}
fn default_podcast_thumb() -> String {
    "http://ichef.bbci.co.uk/podcasts/artwork/478/kermode.jpg".to_string()
}
fn default_swf_url() -> String {
    "http://emp.bbci.co.uk/emp/releases/smp-flash/revisions/1.8.12/1.8.12_smp.swf".to_string()
}
fn default_stream_service() -> String {
    "iplayer_streaming_h264_flv_high".to_string()
}
fn default_stream_supplier() -> String {
    "akamai".to_string()
}
fn default_thumb_width() -> u32 {
    640
}
fn default_thumb_height() -> u32 {
    360
}
fn default_http_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            clip_page_url: default_clip_page_url(),
            playlist_url: default_playlist_url(),
            media_selector_url: default_media_selector_url(),
            podcast_feed_url: default_podcast_feed_url(),
            podcast_thumb: default_podcast_thumb(),
            swf_url: default_swf_url(),
            stream_service: default_stream_service(),
            stream_supplier: default_stream_supplier(),
            thumb_width: default_thumb_width(),
            thumb_height: default_thumb_height(),
            http_timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
            proxy: None,
            fetch_retries: 0,
            strings_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (ignore errors — it may not exist)
        let _ = dotenvy::dotenv();

        envy::from_env::<AppConfig>().context("Failed to load config from environment")
    }

    pub fn clip_page_endpoint(&self, page: u32) -> String {
        self.clip_page_url.replace("{page}", &page.to_string())
    }

    pub fn playlist_endpoint(&self, pid: &str) -> String {
        self.playlist_url.replace("{pid}", pid)
    }

    pub fn media_selector_endpoint(&self, vpid: &str) -> String {
        self.media_selector_url.replace("{vpid}", vpid)
    }
}
