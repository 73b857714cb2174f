//! Localized label table, looked up by numeric id.

use std::collections::HashMap;

use anyhow::Context;

pub const ALBUM: u32 = 30000;
pub const NEXT_PAGE: u32 = 30001;
pub const PREVIOUS_PAGE: u32 = 30002;
pub const PODCASTS: u32 = 30003;
pub const CLIPS: u32 = 30004;

#[derive(Debug, Clone)]
pub struct StringTable {
    labels: HashMap<u32, String>,
}

impl Default for StringTable {
    fn default() -> Self {
        let labels = [
            (ALBUM, "Kermode and Mayo's Film Review"),
            (NEXT_PAGE, "Next page"),
            (PREVIOUS_PAGE, "Previous page"),
            (PODCASTS, "Podcasts"),
            (CLIPS, "Clips"),
        ]
        .into_iter()
        .map(|(id, s)| (id, s.to_string()))
        .collect();
        Self { labels }
    }
}

impl StringTable {
    /// Built-in labels, overridden by any entries in the JSON file at `path`
    /// (`{"30001": "Page suivante"}`).
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut table = Self::default();
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return Ok(table);
        };

        let raw = std::fs::read_to_string(path).with_context(|| format!("read strings {path}"))?;
        let overrides: HashMap<String, String> =
            serde_json::from_str(&raw).with_context(|| format!("parse strings {path}"))?;
        for (id, label) in overrides {
            let id: u32 = id
                .parse()
                .with_context(|| format!("string id {id:?} in {path} is not a number"))?;
            table.labels.insert(id, label);
        }
        tracing::info!("Loaded label overrides from {path}");
        Ok(table)
    }

    /// Label for `id`, or an empty string when the table has none.
    pub fn get(&self, id: u32) -> &str {
        self.labels.get(&id).map(String::as_str).unwrap_or_default()
    }
}
