//! Clip pid → playable RTMP descriptor.
//!
//! The BBC splits "a playable clip" across three documents: the iPlayer
//! playlist maps the pid to a version pid (vpid), the media selector maps
//! the vpid to a set of CDN connections, and one connection is picked by
//! service and supplier. Each stage feeds the next; nothing is cached.

use url::Url;

use crate::{
    config::AppConfig,
    document::{Document, Element},
    error::{CatalogueError, ResolutionError, Result},
    fetch::Fetcher,
    models::StreamConnection,
};

/// Path every on-demand RTMP stream is served under.
const RTMP_APPLICATION: &str = "ondemand";

/// Read the programme item's `identifier` (the vpid) from a playlist document.
pub fn programme_vpid(xml: &str, pid: &str) -> Result<String> {
    let doc = Document::parse(xml);
    let items = doc.find_all(Some("item"), &[("kind", "programme")]);
    let programme = first_candidate(&items, "programme item", pid).ok_or_else(|| {
        ResolutionError::NoProgramme {
            pid: pid.to_string(),
        }
    })?;
    Ok(programme.required_attr("identifier")?.to_string())
}

/// Pick the `supplier` connection under the `service` media element.
pub fn select_connection(
    xml: &str,
    vpid: &str,
    service: &str,
    supplier: &str,
) -> Result<StreamConnection> {
    let doc = Document::parse(xml);

    let media = doc.find_all(Some("media"), &[("service", service)]);
    let media = first_candidate(&media, "media element", vpid).ok_or_else(|| {
        ResolutionError::NoMediaService {
            vpid: vpid.to_string(),
            service: service.to_string(),
        }
    })?;

    let connections = media.find_all(None, &[("supplier", supplier)]);
    let connection = first_candidate(&connections, "connection", vpid).ok_or_else(|| {
        ResolutionError::NoConnection {
            vpid: vpid.to_string(),
            service: service.to_string(),
            supplier: supplier.to_string(),
        }
    })?;

    Ok(StreamConnection {
        protocol: connection.required_attr("protocol")?.to_string(),
        server: connection.required_attr("server")?.to_string(),
        identifier: connection.required_attr("identifier")?.to_string(),
        auth: connection.required_attr("authstring")?.to_string(),
    })
}

/// First match in document order wins; extra matches are only logged.
fn first_candidate<'a>(found: &[&'a Element], what: &str, key: &str) -> Option<&'a Element> {
    if found.len() > 1 {
        tracing::warn!(
            "{} {what} candidates for {key}, using the first in document order",
            found.len()
        );
    }
    found.first().copied()
}

impl StreamConnection {
    /// `<protocol>://<server>/ondemand?<auth>`
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}://{}/{RTMP_APPLICATION}",
            self.protocol, self.server
        ))
        .map_err(|e| {
            CatalogueError::parse(format!(
                "connection {}://{} is not a valid URL: {e}",
                self.protocol, self.server
            ))
        })?;
        url.set_query(Some(&self.auth));
        Ok(url)
    }

    /// The librtmp-style descriptor the player opens: base URL followed by
    /// space-separated `key=value` options.
    pub fn playback_descriptor(&self, swf_url: &str) -> Result<String> {
        Ok(format!(
            "{} playpath={}?{} swfurl={swf_url} swfvfy=1 timeout=180",
            self.base_url()?,
            self.identifier,
            self.auth,
        ))
    }
}

/// Run the playlist → media selector → connection chain for one pid.
pub async fn resolve_playback_url(
    fetcher: &dyn Fetcher,
    config: &AppConfig,
    pid: &str,
) -> Result<String> {
    tracing::info!("Resolving clip {pid}");

    let playlist = fetcher.fetch_text(&config.playlist_endpoint(pid)).await?;
    let vpid = programme_vpid(&playlist, pid)?;
    tracing::debug!("clip {pid}: programme vpid {vpid}");

    let selection = fetcher
        .fetch_text(&config.media_selector_endpoint(&vpid))
        .await?;
    let connection = select_connection(
        &selection,
        &vpid,
        &config.stream_service,
        &config.stream_supplier,
    )?;
    tracing::debug!(
        "clip {pid}: {} connection via {}",
        config.stream_supplier,
        connection.server
    );

    let descriptor = connection.playback_descriptor(&config.swf_url)?;
    tracing::info!("Resolved clip {pid} to {}", connection.server);
    Ok(descriptor)
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const PLAYLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<playlist xmlns="http://bbc.co.uk/2008/emp/playlist" revision="1">
  <id>tag:bbc.co.uk,2008:pips:b00xyz12:playlist</id>
  <item kind="ident" identifier="ident01"><title>ident</title></item>
  <item kind="programme" duration="754" identifier="p01abcd3" group="b00xyz12">
    <title>Mark reviews Gravity</title>
    <mediator identifier="p01abcd3" name="pips"/>
  </item>
</playlist>"#;

    pub const MEDIA_SELECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mediaSelection xmlns="http://bbc.co.uk/2008/mp/mediaselection">
  <media kind="video" width="640" height="360" bitrate="396" encoding="h264" service="iplayer_streaming_h264_flv_lo">
    <connection priority="10" kind="akamai" supplier="akamai" server="wrong.edgefcs.net" identifier="lo" authString="lo" protocol="rtmp"/>
  </media>
  <media kind="video" width="640" height="360" bitrate="800" encoding="h264" service="iplayer_streaming_h264_flv_high">
    <connection priority="20" kind="limelight" supplier="limelight" server="bbc.fcod.llnwd.net" identifier="ll" authString="ll" protocol="rtmp"/>
    <connection priority="10" kind="akamai" supplier="akamai" server="cp123.live.edgefcs.net" application="ondemand" identifier="stream1" authString="auth=1&amp;token=abc" protocol="rtmp"/>
  </media>
</mediaSelection>"#;

    pub const SWF_URL: &str =
        "http://emp.bbci.co.uk/emp/releases/smp-flash/revisions/1.8.12/1.8.12_smp.swf";
}
