use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Construction-time settings for the renderer and its driving loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Gamma exponent applied once to every finished frame.
    pub gamma: f32,
    /// Use the cheaper fade-through-black transition when swapping
    /// playlists.
    pub use_fast_fades: bool,
    /// Frame rate the driving loop should aim for. A hint passed through to
    /// the effect parameters each tick.
    pub target_frame_rate: f32,
    /// Name of the playlist to display first. May be omitted when only one
    /// playlist is defined.
    pub active_playlist: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gamma: 2.2,
            use_fast_fades: false,
            target_frame_rate: 60.0,
            active_playlist: None,
        }
    }
}

impl RendererConfig {
    /// Loads settings from a JSON file. Missing fields fall back to the
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_installation() {
        let config = RendererConfig::default();

        assert_eq!(config.gamma, 2.2);
        assert!(!config.use_fast_fades);
        assert_eq!(config.target_frame_rate, 60.0);
        assert_eq!(config.active_playlist, None);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: RendererConfig =
            serde_json::from_str(r#"{ "gamma": 1.8, "active_playlist": "on" }"#).unwrap();

        assert_eq!(config.gamma, 1.8);
        assert_eq!(config.active_playlist.as_deref(), Some("on"));
        assert_eq!(config.target_frame_rate, 60.0);
    }
}
