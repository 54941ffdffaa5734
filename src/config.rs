//! Application configuration.
//!
//! The configuration is loaded from a JSON file (by default
//! `$XDG_CONFIG_HOME/desktab/config.json`).  Every section and every field
//! is optional, so a minimal `{}` file is valid and anything missing falls
//! back to the compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "overlay": {
//!     "fade_out_ms": 150,
//!     "shift_animation_ms": 300,
//!     "default_columns": 5
//!   },
//!   "host": {
//!     "restricted_prefixes": ["chrome://", "about:"],
//!     "restricted_popup": "popup.html"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overlay layout and animation settings.
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Host-side (coordinator) settings.
    #[serde(default)]
    pub host: HostConfig,
}

/// Overlay layout and animation settings.
///
/// Durations are in **milliseconds**, lengths in surface pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Fade-in when the overlay appears.
    pub fade_in_ms: u64,
    /// Exit transition before the overlay is removed.  `0` hides instantly.
    pub fade_out_ms: u64,
    /// How long shifted cards take to glide to their slot during a drag.
    pub shift_animation_ms: u64,
    /// Column count used for up/down movement before the surface has
    /// reported the grid width.
    pub default_columns: usize,
    /// Minimum card width of the grid template.
    pub card_min_width: f64,
    /// Gap between cards.
    pub card_gap: f64,
    /// Inner padding on each side of the grid.
    pub grid_padding: f64,
    /// Used for the header's rough memory estimate.
    pub estimated_ram_per_tab_mb: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fade_in_ms: 250,
            fade_out_ms: 200,
            shift_animation_ms: 400,
            default_columns: 4,
            card_min_width: 140.0,
            card_gap: 16.0,
            grid_padding: 24.0,
            estimated_ram_per_tab_mb: 50,
        }
    }
}

impl OverlayConfig {
    /// Number of grid columns that fit in `grid_width`.  Never less than 1.
    pub fn columns_for_width(&self, grid_width: f64) -> usize {
        let usable = grid_width - 2.0 * self.grid_padding;
        let pitch = self.card_min_width + self.card_gap;
        if !usable.is_finite() || pitch <= 0.0 {
            return self.default_columns.max(1);
        }
        ((usable / pitch).floor().max(0.0) as usize).max(1)
    }
}

/// Host-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// URL prefixes where the overlay can never be injected.
    pub restricted_prefixes: Vec<String>,
    /// Origins where the overlay can never be injected.
    pub restricted_origins: Vec<String>,
    /// Informational popup shown instead of the overlay on restricted pages.
    pub restricted_popup: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            restricted_prefixes: [
                "chrome://",
                "chrome-extension://",
                "chrome-devtools://",
                "edge://",
                "about:",
                "chrome-error://",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            restricted_origins: vec!["https://chromewebstore.google.com".into()],
            restricted_popup: "popup.html".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
