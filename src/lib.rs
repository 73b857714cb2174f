//! Catalogue client for the BBC's Kermode and Mayo's Film Review.
//!
//! Lists clips scraped from the programme's clip pages and episodes from its
//! podcast feed, and resolves a clip pid to an RTMP playback descriptor by
//! walking the iPlayer playlist and media selector documents. The plugin
//! routes are served over HTTP as JSON for a host media player to render.

pub mod clips;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod models;
pub mod plugin;
pub mod podcasts;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod strings;
