//! TLE (Two-Line Element) data management module
//!
//! Fetching, caching and parsing of satellite element sets from Celestrak,
//! arbitrary URLs, local files or inline text.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod fetcher;
pub mod parser;
pub mod systems;
pub mod types;

pub use fetcher::start_tle_worker;
pub use systems::process_fetch_results_system;
pub use types::{
    ElementSetLoader, FetchChannels, FetchCommand, FetchResultMsg, LoadTicket, TleSource, TleText,
    TraceId,
};

/// Element set source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TleConfig {
    pub use_cache: bool,
    pub cache_expiration_days: i64,
    /// Celestrak GP query endpoint
    pub base_url: String,
}

impl Default for TleConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_expiration_days: 7,
            base_url: "https://celestrak.org/NORAD/elements/gp.php".into(),
        }
    }
}

/// Plugin for TLE data management and processing
pub struct TlePlugin;

impl Plugin for TlePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, process_fetch_results_system);
    }
}
